//! Purpose: Views and unions for TypeScript and JSDoc type nodes.
//! Exports: One view per TS node type, `TSEnumBody`, and the TS unions (`TSType`,
//! `TSTupleElement`, `TSTypeName`, `TSSignature`, ...).
//! Role: Reached from the TS discriminants of `Expression`, `Statement`, `Declaration`,
//! `ClassElement`, and from type annotation slots inside JS nodes.
//! Invariants: Keyword types carry only a span; every other TS node lists its children in walk
//! order.

use crate::ast::codec::{Boxed, Inline, Opt, Seq, Str};
use crate::ast::enums::*;
use crate::ast::js::*;
use crate::ast::unions::*;

define_views! { 'a;
    // Enums

    node TSEnumDeclaration [80] {
        is_const as "const" @ 76: bool,
        declare @ 77: bool,
    } {
        id @ 8: Inline<BindingIdentifier<'a>>,
        body @ 40: Inline<TSEnumBody<'a>>,
    }

    node TSEnumBody [32] {} {
        members @ 8: Seq<Inline<TSEnumMember<'a>>, 40>,
    }

    node TSEnumMember [40] {} {
        id @ 8: TSEnumMemberName<'a>,
        initializer @ 24: Opt<Expression<'a>>,
    }

    // Annotations and literal types

    /// `: T` after a binding, parameter, or return position.
    node TSTypeAnnotation [24] {} {
        type_annotation as "typeAnnotation" @ 8: TSType<'a>,
    }

    node TSLiteralType [24] {} {
        literal @ 8: TSLiteral<'a>,
    }

    /// `this: T` as a leading function parameter.
    node TSThisParameter [24] {} {
        type_annotation as "typeAnnotation" @ 16: Opt<Boxed<TSTypeAnnotation<'a>>>,
    }

    // Composite types

    /// `C extends E ? T : F`
    node TSConditionalType [80] {} {
        check_type as "checkType" @ 8: TSType<'a>,
        extends_type as "extendsType" @ 24: TSType<'a>,
        true_type as "trueType" @ 40: TSType<'a>,
        false_type as "falseType" @ 56: TSType<'a>,
    }

    node TSUnionType [40] {} {
        types @ 8: Seq<TSType<'a>, 16>,
    }

    node TSIntersectionType [40] {} {
        types @ 8: Seq<TSType<'a>, 16>,
    }

    node TSParenthesizedType [24] {} {
        type_annotation as "typeAnnotation" @ 8: TSType<'a>,
    }

    node TSTypeOperator [32] {
        operator @ 24: TSTypeOperatorOperator,
    } {
        type_annotation as "typeAnnotation" @ 8: TSType<'a>,
    }

    node TSArrayType [24] {} {
        element_type as "elementType" @ 8: TSType<'a>,
    }

    /// `T[K]`
    node TSIndexedAccessType [40] {} {
        object_type as "objectType" @ 8: TSType<'a>,
        index_type as "indexType" @ 24: TSType<'a>,
    }

    node TSTupleType [40] {} {
        element_types as "elementTypes" @ 8: Seq<TSTupleElement<'a>, 16>,
    }

    /// `[name?: T]`
    node TSNamedTupleMember [56] {
        optional @ 48: bool,
    } {
        label @ 8: Inline<IdentifierName<'a>>,
        element_type as "elementType" @ 32: TSTupleElement<'a>,
    }

    node TSOptionalType [24] {} {
        type_annotation as "typeAnnotation" @ 8: TSType<'a>,
    }

    node TSRestType [24] {} {
        type_annotation as "typeAnnotation" @ 8: TSType<'a>,
    }

    // Keyword types

    node TSAnyKeyword [8] {} {}

    node TSStringKeyword [8] {} {}

    node TSBooleanKeyword [8] {} {}

    node TSNumberKeyword [8] {} {}

    node TSNeverKeyword [8] {} {}

    node TSIntrinsicKeyword [8] {} {}

    node TSUnknownKeyword [8] {} {}

    node TSNullKeyword [8] {} {}

    node TSUndefinedKeyword [8] {} {}

    node TSVoidKeyword [8] {} {}

    node TSSymbolKeyword [8] {} {}

    node TSThisType [8] {} {}

    node TSObjectKeyword [8] {} {}

    node TSBigIntKeyword [8] {} {}

    // References and generics

    node TSTypeReference [32] {} {
        type_name as "typeName" @ 8: TSTypeName<'a>,
        type_arguments as "typeArguments" @ 24: Opt<Boxed<TSTypeParameterInstantiation<'a>>>,
    }

    /// `A.B`
    node TSQualifiedName [48] {} {
        left @ 8: TSTypeName<'a>,
        right @ 24: Inline<IdentifierName<'a>>,
    }

    /// `<A, B>` at a use site.
    node TSTypeParameterInstantiation [40] {} {
        params @ 8: Seq<TSType<'a>, 16>,
    }

    node TSTypeParameter [80] {
        is_in as "in" @ 72: bool,
        is_out as "out" @ 73: bool,
        is_const as "const" @ 74: bool,
    } {
        name @ 8: Inline<BindingIdentifier<'a>>,
        constraint @ 40: Opt<TSType<'a>>,
        default @ 56: Opt<TSType<'a>>,
    }

    /// `<T extends U = V>` at a declaration site.
    node TSTypeParameterDeclaration [40] {} {
        params @ 8: Seq<Inline<TSTypeParameter<'a>>, 80>,
    }

    // Declarations

    node TSTypeAliasDeclaration [72] {
        declare @ 68: bool,
    } {
        id @ 8: Inline<BindingIdentifier<'a>>,
        type_parameters as "typeParameters" @ 40: Opt<Boxed<TSTypeParameterDeclaration<'a>>>,
        type_annotation as "typeAnnotation" @ 48: TSType<'a>,
    }

    node TSClassImplements [32] {} {
        expression @ 8: TSTypeName<'a>,
        type_arguments as "typeArguments" @ 24: Opt<Boxed<TSTypeParameterInstantiation<'a>>>,
    }

    node TSInterfaceDeclaration [96] {
        declare @ 84: bool,
    } {
        id @ 8: Inline<BindingIdentifier<'a>>,
        type_parameters as "typeParameters" @ 40: Opt<Boxed<TSTypeParameterDeclaration<'a>>>,
        extends @ 48: Seq<Inline<TSInterfaceHeritage<'a>>, 32>,
        body @ 72: Boxed<TSInterfaceBody<'a>>,
    }

    node TSInterfaceBody [40] {} {
        body @ 8: Seq<TSSignature<'a>, 16>,
    }

    node TSInterfaceHeritage [32] {} {
        expression @ 8: Expression<'a>,
        type_arguments as "typeArguments" @ 24: Opt<Boxed<TSTypeParameterInstantiation<'a>>>,
    }

    // Signatures

    node TSPropertySignature [40] {
        computed @ 32: bool,
        optional @ 33: bool,
        readonly @ 34: bool,
    } {
        key @ 8: PropertyKey<'a>,
        type_annotation as "typeAnnotation" @ 24: Opt<Boxed<TSTypeAnnotation<'a>>>,
    }

    /// `[key: string]: T`
    node TSIndexSignature [56] {
        readonly @ 40: bool,
        is_static as "static" @ 41: bool,
    } {
        parameters @ 8: Seq<Inline<TSIndexSignatureName<'a>>, 32>,
        type_annotation as "typeAnnotation" @ 32: Boxed<TSTypeAnnotation<'a>>,
    }

    node TSIndexSignatureName [32] {} {
        name @ 8: Str,
        type_annotation as "typeAnnotation" @ 24: Boxed<TSTypeAnnotation<'a>>,
    }

    node TSCallSignatureDeclaration [64] {} {
        type_parameters as "typeParameters" @ 8: Opt<Boxed<TSTypeParameterDeclaration<'a>>>,
        params @ 24: Boxed<FormalParameters<'a>>,
        return_type as "returnType" @ 32: Opt<Boxed<TSTypeAnnotation<'a>>>,
    }

    node TSMethodSignature [72] {
        computed @ 60: bool,
        optional @ 61: bool,
        kind @ 62: TSMethodSignatureKind,
    } {
        key @ 8: PropertyKey<'a>,
        type_parameters as "typeParameters" @ 24: Opt<Boxed<TSTypeParameterDeclaration<'a>>>,
        this_param as "thisParam" @ 32: Opt<Boxed<TSThisParameter<'a>>>,
        params @ 40: Boxed<FormalParameters<'a>>,
        return_type as "returnType" @ 48: Opt<Boxed<TSTypeAnnotation<'a>>>,
    }

    node TSConstructSignatureDeclaration [40] {} {
        type_parameters as "typeParameters" @ 8: Opt<Boxed<TSTypeParameterDeclaration<'a>>>,
        params @ 16: Boxed<FormalParameters<'a>>,
        return_type as "returnType" @ 24: Opt<Boxed<TSTypeAnnotation<'a>>>,
    }

    /// `x is T`, `asserts x`
    node TSTypePredicate [40] {
        asserts @ 32: bool,
    } {
        parameter_name as "parameterName" @ 8: TSTypePredicateName<'a>,
        type_annotation as "typeAnnotation" @ 24: Opt<Boxed<TSTypeAnnotation<'a>>>,
    }

    // Namespaces

    /// `namespace A.B {}` nests: the body of `A` is the declaration of `B`.
    node TSModuleDeclaration [88] {
        kind @ 84: TSModuleDeclarationKind,
        declare @ 85: bool,
    } {
        id @ 8: TSModuleDeclarationName<'a>,
        body @ 64: Opt<TSModuleDeclarationBody<'a>>,
    }

    node TSModuleBlock [72] {} {
        body @ 32: Seq<Statement<'a>, 16>,
    }

    // Type-level expressions

    node TSTypeLiteral [40] {} {
        members @ 8: Seq<TSSignature<'a>, 16>,
    }

    node TSInferType [16] {} {
        type_parameter as "typeParameter" @ 8: Boxed<TSTypeParameter<'a>>,
    }

    /// `typeof x`
    node TSTypeQuery [32] {} {
        expr_name as "exprName" @ 8: TSTypeQueryExprName<'a>,
        type_arguments as "typeArguments" @ 24: Opt<Boxed<TSTypeParameterInstantiation<'a>>>,
    }

    /// `import("x").Y<Z>`
    node TSImportType [64] {} {
        argument @ 8: TSType<'a>,
        options @ 24: Opt<Boxed<ObjectExpression<'a>>>,
        qualifier @ 32: Opt<TSTypeName<'a>>,
        type_arguments as "typeArguments" @ 48: Opt<Boxed<TSTypeParameterInstantiation<'a>>>,
    }

    node TSFunctionType [40] {} {
        type_parameters as "typeParameters" @ 8: Opt<Boxed<TSTypeParameterDeclaration<'a>>>,
        params @ 24: Boxed<FormalParameters<'a>>,
        return_type as "returnType" @ 32: Boxed<TSTypeAnnotation<'a>>,
    }

    node TSConstructorType [40] {
        is_abstract as "abstract" @ 32: bool,
    } {
        type_parameters as "typeParameters" @ 8: Opt<Boxed<TSTypeParameterDeclaration<'a>>>,
        params @ 16: Boxed<FormalParameters<'a>>,
        return_type as "returnType" @ 24: Boxed<TSTypeAnnotation<'a>>,
    }

    /// `{ readonly [K in T]?: V }`
    node TSMappedType [56] {
        optional @ 52: Option<TSMappedTypeModifierOperator>,
        readonly @ 53: Option<TSMappedTypeModifierOperator>,
    } {
        name_type as "nameType" @ 16: Opt<TSType<'a>>,
        type_annotation as "typeAnnotation" @ 32: Opt<TSType<'a>>,
    }

    node TSTemplateLiteralType [72] {} {
        quasis @ 8: Seq<Inline<TemplateElement<'a>>, 48>,
        types @ 32: Seq<TSType<'a>, 16>,
    }

    // Expressions and module items

    /// `x as T`
    node TSAsExpression [40] {} {
        expression @ 8: Expression<'a>,
        type_annotation as "typeAnnotation" @ 24: TSType<'a>,
    }

    /// `x satisfies T`
    node TSSatisfiesExpression [40] {} {
        expression @ 8: Expression<'a>,
        type_annotation as "typeAnnotation" @ 24: TSType<'a>,
    }

    /// `<T>x`
    node TSTypeAssertion [40] {} {
        type_annotation as "typeAnnotation" @ 8: TSType<'a>,
        expression @ 24: Expression<'a>,
    }

    /// `x!`
    node TSNonNullExpression [24] {} {
        expression @ 8: Expression<'a>,
    }

    /// `f<T>` without a call.
    node TSInstantiationExpression [32] {} {
        expression @ 8: Expression<'a>,
        type_arguments as "typeArguments" @ 24: Boxed<TSTypeParameterInstantiation<'a>>,
    }

    /// `import x = require("y")`, `import x = A.B`
    node TSImportEqualsDeclaration [64] {
        import_kind as "importKind" @ 56: ImportOrExportKind,
    } {
        id @ 8: Inline<BindingIdentifier<'a>>,
        module_reference as "moduleReference" @ 40: TSModuleReference<'a>,
    }

    node TSExternalModuleReference [56] {} {
        expression @ 8: Inline<StringLiteral<'a>>,
    }

    /// `export = x`
    node TSExportAssignment [24] {} {
        expression @ 8: Expression<'a>,
    }

    /// `export as namespace x`
    node TSNamespaceExportDeclaration [32] {} {
        id @ 8: Inline<IdentifierName<'a>>,
    }

    // JSDoc

    /// `?T` or `T?`
    node JSDocNullableType [32] {
        postfix @ 24: bool,
    } {
        type_annotation as "typeAnnotation" @ 8: TSType<'a>,
    }

    /// `!T` or `T!`
    node JSDocNonNullableType [32] {
        postfix @ 24: bool,
    } {
        type_annotation as "typeAnnotation" @ 8: TSType<'a>,
    }

    node JSDocUnknownType [8] {} {}
}

define_unions! { 'a;
    /// Any type. Absent is discriminant 38; 25 is unassigned.
    union TSType [none = 38] {
        0 => TSAnyKeyword(boxed TSAnyKeyword),
        1 => TSBigIntKeyword(boxed TSBigIntKeyword),
        2 => TSBooleanKeyword(boxed TSBooleanKeyword),
        3 => TSIntrinsicKeyword(boxed TSIntrinsicKeyword),
        4 => TSNeverKeyword(boxed TSNeverKeyword),
        5 => TSNullKeyword(boxed TSNullKeyword),
        6 => TSNumberKeyword(boxed TSNumberKeyword),
        7 => TSObjectKeyword(boxed TSObjectKeyword),
        8 => TSStringKeyword(boxed TSStringKeyword),
        9 => TSSymbolKeyword(boxed TSSymbolKeyword),
        10 => TSThisType(boxed TSThisType),
        11 => TSUndefinedKeyword(boxed TSUndefinedKeyword),
        12 => TSUnknownKeyword(boxed TSUnknownKeyword),
        13 => TSVoidKeyword(boxed TSVoidKeyword),
        14 => TSArrayType(boxed TSArrayType),
        15 => TSConditionalType(boxed TSConditionalType),
        16 => TSConstructorType(boxed TSConstructorType),
        17 => TSFunctionType(boxed TSFunctionType),
        18 => TSImportType(boxed TSImportType),
        19 => TSIndexedAccessType(boxed TSIndexedAccessType),
        20 => TSInferType(boxed TSInferType),
        21 => TSIntersectionType(boxed TSIntersectionType),
        22 => TSLiteralType(boxed TSLiteralType),
        23 => TSMappedType(boxed TSMappedType),
        24 => TSNamedTupleMember(boxed TSNamedTupleMember),
        26 => TSTemplateLiteralType(boxed TSTemplateLiteralType),
        27 => TSTupleType(boxed TSTupleType),
        28 => TSTypeLiteral(boxed TSTypeLiteral),
        29 => TSTypeOperator(boxed TSTypeOperator),
        30 => TSTypePredicate(boxed TSTypePredicate),
        31 => TSTypeQuery(boxed TSTypeQuery),
        32 => TSTypeReference(boxed TSTypeReference),
        33 => TSUnionType(boxed TSUnionType),
        34 => TSParenthesizedType(boxed TSParenthesizedType),
        35 => JSDocNullableType(boxed JSDocNullableType),
        36 => JSDocNonNullableType(boxed JSDocNonNullableType),
        37 => JSDocUnknownType(boxed JSDocUnknownType),
    }

    union TSTupleElement [] {
        64 => TSOptionalType(boxed TSOptionalType),
        65 => TSRestType(boxed TSRestType),
        ..TSType,
    }

    /// Absent is discriminant 2.
    union TSTypeName [none = 2] {
        0 => IdentifierReference(boxed IdentifierReference),
        1 => QualifiedName(boxed TSQualifiedName),
    }

    union TSTypeQueryExprName [] {
        2 => TSImportType(boxed TSImportType),
        ..TSTypeName,
    }

    union TSModuleReference [] {
        2 => ExternalModuleReference(boxed TSExternalModuleReference),
        ..TSTypeName,
    }

    union TSSignature [] {
        0 => TSIndexSignature(boxed TSIndexSignature),
        1 => TSPropertySignature(boxed TSPropertySignature),
        2 => TSCallSignatureDeclaration(boxed TSCallSignatureDeclaration),
        3 => TSConstructSignatureDeclaration(boxed TSConstructSignatureDeclaration),
        4 => TSMethodSignature(boxed TSMethodSignature),
    }

    union TSTypePredicateName [] {
        0 => Identifier(boxed IdentifierName),
        1 => This(inline TSThisType),
    }

    /// Payload stored inline.
    union TSModuleDeclarationName [] {
        0 => Identifier(inline BindingIdentifier),
        1 => StringLiteral(inline StringLiteral),
    }

    /// Absent is discriminant 2.
    union TSModuleDeclarationBody [none = 2] {
        0 => TSModuleDeclaration(boxed TSModuleDeclaration),
        1 => TSModuleBlock(boxed TSModuleBlock),
    }

    union TSEnumMemberName [] {
        0 => Identifier(boxed IdentifierName),
        1 => String(boxed StringLiteral),
        2 => ComputedString(boxed StringLiteral),
        3 => ComputedTemplateString(boxed TemplateLiteral),
    }

    union TSLiteral [] {
        0 => BooleanLiteral(boxed BooleanLiteral),
        1 => NumericLiteral(boxed NumericLiteral),
        2 => BigIntLiteral(boxed BigIntLiteral),
        3 => StringLiteral(boxed StringLiteral),
        4 => TemplateLiteral(boxed TemplateLiteral),
        5 => UnaryExpression(boxed UnaryExpression),
    }
}

impl<'a> TSType<'a> {
    /// True for the span-only keyword types (`any`, `string`, `this`, ...).
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TSType::TSAnyKeyword(_)
                | TSType::TSBigIntKeyword(_)
                | TSType::TSBooleanKeyword(_)
                | TSType::TSIntrinsicKeyword(_)
                | TSType::TSNeverKeyword(_)
                | TSType::TSNullKeyword(_)
                | TSType::TSNumberKeyword(_)
                | TSType::TSObjectKeyword(_)
                | TSType::TSStringKeyword(_)
                | TSType::TSSymbolKeyword(_)
                | TSType::TSThisType(_)
                | TSType::TSUndefinedKeyword(_)
                | TSType::TSUnknownKeyword(_)
                | TSType::TSVoidKeyword(_)
        )
    }
}

impl<'a> TSModuleDeclaration<'a> {
    /// Follows `namespace A.B.C {}` down to the block that holds the statements.
    pub fn innermost_block(&self) -> Result<Option<&TSModuleBlock<'a>>, crate::core::error::Error> {
        let mut body = self.body()?.as_ref();
        loop {
            match body {
                None => return Ok(None),
                Some(TSModuleDeclarationBody::TSModuleBlock(block)) => return Ok(Some(&**block)),
                Some(TSModuleDeclarationBody::TSModuleDeclaration(inner)) => {
                    body = inner.body()?.as_ref();
                }
            }
        }
    }
}
