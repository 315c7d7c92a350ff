// Visitable node types: ids, names, and the `AnyNode` wrapper handed to callbacks.
//
// Leaf types (no child nodes) come first so `is_leaf` is a range check.
use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::ast::codec::{SnapshotOptions, ToRecord};
use crate::ast::js::*;
use crate::ast::jsx::*;
use crate::ast::layout::NodeLayout;
use crate::ast::ts::*;
use crate::ast::Span;
use crate::core::error::{Error, ErrorKind};

macro_rules! node_types {
    (
        $lt:lifetime;
        leaf: [$($leaf:ident),* $(,)?];
        branch: [$($branch:ident),* $(,)?];
    ) => {
        #[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
        #[repr(u8)]
        pub enum NodeType {
            $( $leaf, )*
            $( $branch, )*
        }

        impl NodeType {
            pub const ALL: &'static [NodeType] = &[
                $( NodeType::$leaf, )*
                $( NodeType::$branch, )*
            ];
            pub const COUNT: usize = Self::ALL.len();
            pub const LEAF_COUNT: usize = [$( NodeType::$leaf, )*].len();

            pub fn id(self) -> usize {
                self as usize
            }

            pub fn from_id(id: usize) -> Option<Self> {
                Self::ALL.get(id).copied()
            }

            pub fn name(self) -> &'static str {
                match self {
                    $( NodeType::$leaf => stringify!($leaf), )*
                    $( NodeType::$branch => stringify!($branch), )*
                }
            }

            pub fn is_leaf(self) -> bool {
                self.id() < Self::LEAF_COUNT
            }

            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $( stringify!($leaf) => Some(NodeType::$leaf), )*
                    $( stringify!($branch) => Some(NodeType::$branch), )*
                    _ => None,
                }
            }

            pub fn layout(self) -> NodeLayout {
                match self {
                    $( NodeType::$leaf => $leaf::LAYOUT, )*
                    $( NodeType::$branch => $branch::LAYOUT, )*
                }
            }
        }

        /// Any visitable node, as handed to visitor callbacks.
        pub enum AnyNode<$lt> {
            $( $leaf($leaf<$lt>), )*
            $( $branch($branch<$lt>), )*
        }

        impl<$lt> AnyNode<$lt> {
            pub fn node_type(&self) -> NodeType {
                match self {
                    $( AnyNode::$leaf(_) => NodeType::$leaf, )*
                    $( AnyNode::$branch(_) => NodeType::$branch, )*
                }
            }

            pub fn pos(&self) -> u32 {
                match self {
                    $( AnyNode::$leaf(node) => node.pos(), )*
                    $( AnyNode::$branch(node) => node.pos(), )*
                }
            }

            pub fn span(&self) -> Result<Span, Error> {
                match self {
                    $( AnyNode::$leaf(node) => node.span(), )*
                    $( AnyNode::$branch(node) => node.span(), )*
                }
            }
        }

        impl<$lt> ToRecord for AnyNode<$lt> {
            fn to_record_with(&self, options: &SnapshotOptions) -> Result<Value, Error> {
                match self {
                    $( AnyNode::$leaf(node) => node.to_record_with(options), )*
                    $( AnyNode::$branch(node) => node.to_record_with(options), )*
                }
            }
        }

        $(
            impl<$lt> From<$leaf<$lt>> for AnyNode<$lt> {
                fn from(node: $leaf<$lt>) -> Self {
                    AnyNode::$leaf(node)
                }
            }
        )*
        $(
            impl<$lt> From<$branch<$lt>> for AnyNode<$lt> {
                fn from(node: $branch<$lt>) -> Self {
                    AnyNode::$branch(node)
                }
            }
        )*
    };
}

node_types! { 'a;
    leaf: [
        IdentifierName,
        IdentifierReference,
        BindingIdentifier,
        LabelIdentifier,
        PrivateIdentifier,
        ThisExpression,
        Super,
        Elision,
        EmptyStatement,
        DebuggerStatement,
        Hashbang,
        TemplateElement,
        BooleanLiteral,
        NullLiteral,
        NumericLiteral,
        StringLiteral,
        BigIntLiteral,
        RegExpLiteral,
        JSXIdentifier,
        JSXText,
        JSXOpeningFragment,
        JSXClosingFragment,
        JSXEmptyExpression,
        TSAnyKeyword,
        TSStringKeyword,
        TSBooleanKeyword,
        TSNumberKeyword,
        TSNeverKeyword,
        TSIntrinsicKeyword,
        TSUnknownKeyword,
        TSNullKeyword,
        TSUndefinedKeyword,
        TSVoidKeyword,
        TSSymbolKeyword,
        TSThisType,
        TSObjectKeyword,
        TSBigIntKeyword,
        JSDocUnknownType,
    ];
    branch: [
        Program,
        ArrayExpression,
        ObjectExpression,
        ObjectProperty,
        TemplateLiteral,
        TaggedTemplateExpression,
        ComputedMemberExpression,
        StaticMemberExpression,
        PrivateFieldExpression,
        CallExpression,
        NewExpression,
        MetaProperty,
        SpreadElement,
        UpdateExpression,
        UnaryExpression,
        BinaryExpression,
        PrivateInExpression,
        LogicalExpression,
        ConditionalExpression,
        AssignmentExpression,
        ArrayAssignmentTarget,
        ObjectAssignmentTarget,
        AssignmentTargetRest,
        AssignmentTargetWithDefault,
        AssignmentTargetPropertyIdentifier,
        AssignmentTargetPropertyProperty,
        SequenceExpression,
        AwaitExpression,
        ChainExpression,
        ParenthesizedExpression,
        V8IntrinsicExpression,
        Directive,
        BlockStatement,
        VariableDeclaration,
        VariableDeclarator,
        ExpressionStatement,
        IfStatement,
        DoWhileStatement,
        WhileStatement,
        ForStatement,
        ForInStatement,
        ForOfStatement,
        ContinueStatement,
        BreakStatement,
        ReturnStatement,
        WithStatement,
        SwitchStatement,
        SwitchCase,
        LabeledStatement,
        ThrowStatement,
        TryStatement,
        CatchClause,
        AssignmentPattern,
        ObjectPattern,
        BindingProperty,
        ArrayPattern,
        BindingRestElement,
        Function,
        FormalParameters,
        FunctionBody,
        ArrowFunctionExpression,
        YieldExpression,
        Class,
        ClassBody,
        MethodDefinition,
        PropertyDefinition,
        StaticBlock,
        AccessorProperty,
        Decorator,
        ImportExpression,
        ImportDeclaration,
        ImportSpecifier,
        ImportDefaultSpecifier,
        ImportNamespaceSpecifier,
        ImportAttribute,
        ExportNamedDeclaration,
        ExportDefaultDeclaration,
        ExportAllDeclaration,
        ExportSpecifier,
        JSXElement,
        JSXOpeningElement,
        JSXClosingElement,
        JSXFragment,
        JSXNamespacedName,
        JSXMemberExpression,
        JSXExpressionContainer,
        JSXAttribute,
        JSXSpreadAttribute,
        JSXSpreadChild,
        TSEnumDeclaration,
        TSEnumBody,
        TSEnumMember,
        TSTypeAnnotation,
        TSLiteralType,
        TSThisParameter,
        TSConditionalType,
        TSUnionType,
        TSIntersectionType,
        TSParenthesizedType,
        TSTypeOperator,
        TSArrayType,
        TSIndexedAccessType,
        TSTupleType,
        TSNamedTupleMember,
        TSOptionalType,
        TSRestType,
        TSTypeReference,
        TSQualifiedName,
        TSTypeParameterInstantiation,
        TSTypeParameter,
        TSTypeParameterDeclaration,
        TSTypeAliasDeclaration,
        TSClassImplements,
        TSInterfaceDeclaration,
        TSInterfaceBody,
        TSInterfaceHeritage,
        TSPropertySignature,
        TSIndexSignature,
        TSIndexSignatureName,
        TSCallSignatureDeclaration,
        TSMethodSignature,
        TSConstructSignatureDeclaration,
        TSTypePredicate,
        TSModuleDeclaration,
        TSModuleBlock,
        TSTypeLiteral,
        TSInferType,
        TSTypeQuery,
        TSImportType,
        TSFunctionType,
        TSConstructorType,
        TSMappedType,
        TSTemplateLiteralType,
        TSAsExpression,
        TSSatisfiesExpression,
        TSTypeAssertion,
        TSNonNullExpression,
        TSInstantiationExpression,
        TSImportEqualsDeclaration,
        TSExternalModuleReference,
        TSExportAssignment,
        TSNamespaceExportDeclaration,
        JSDocNullableType,
        JSDocNonNullableType,
    ];
}

/// Words needed for one bit per node type.
pub const BITMAP_WORDS: usize = NodeType::COUNT.div_ceil(32);

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NodeType {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self, Error> {
        NodeType::from_name(name).ok_or_else(|| {
            Error::new(ErrorKind::Usage)
                .with_message(format!("unknown node type `{name}`"))
                .with_hint("Run `rawtree layout` to list node types.")
        })
    }
}

impl Serialize for NodeType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'a> fmt::Debug for AnyNode<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.node_type(), self.pos())
    }
}
