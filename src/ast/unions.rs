//! Purpose: Tagged unions over JavaScript nodes.
//! Exports: `Expression`, `Statement`, and every union built on them.
//! Role: A one-byte discriminant at +0 selects the variant; its payload sits at +8.
//! Invariants: Shared variant sets (`Expression`, `MemberExpression`, `Declaration`, ...) are
//! declared once and reused through `..Shared` entries; decoding never duplicates their tables.
//! Invariants: Discriminants not listed here are fatal.

use crate::ast::js::*;
use crate::ast::jsx::{JSXElement, JSXFragment};
use crate::ast::ts::*;

define_unions! { 'a;
    union MemberExpression [] {
        48 => ComputedMemberExpression(boxed ComputedMemberExpression),
        49 => StaticMemberExpression(boxed StaticMemberExpression),
        50 => PrivateFieldExpression(boxed PrivateFieldExpression),
    }

    /// Any expression. Absent is discriminant 51.
    union Expression [none = 51] {
        0 => BooleanLiteral(boxed BooleanLiteral),
        1 => NullLiteral(boxed NullLiteral),
        2 => NumericLiteral(boxed NumericLiteral),
        3 => BigIntLiteral(boxed BigIntLiteral),
        4 => RegExpLiteral(boxed RegExpLiteral),
        5 => StringLiteral(boxed StringLiteral),
        6 => TemplateLiteral(boxed TemplateLiteral),
        7 => Identifier(boxed IdentifierReference),
        8 => MetaProperty(boxed MetaProperty),
        9 => Super(boxed Super),
        10 => ArrayExpression(boxed ArrayExpression),
        11 => ArrowFunctionExpression(boxed ArrowFunctionExpression),
        12 => AssignmentExpression(boxed AssignmentExpression),
        13 => AwaitExpression(boxed AwaitExpression),
        14 => BinaryExpression(boxed BinaryExpression),
        15 => CallExpression(boxed CallExpression),
        16 => ChainExpression(boxed ChainExpression),
        17 => ClassExpression(boxed Class),
        18 => ConditionalExpression(boxed ConditionalExpression),
        19 => FunctionExpression(boxed Function),
        20 => ImportExpression(boxed ImportExpression),
        21 => LogicalExpression(boxed LogicalExpression),
        22 => NewExpression(boxed NewExpression),
        23 => ObjectExpression(boxed ObjectExpression),
        24 => ParenthesizedExpression(boxed ParenthesizedExpression),
        25 => SequenceExpression(boxed SequenceExpression),
        26 => TaggedTemplateExpression(boxed TaggedTemplateExpression),
        27 => ThisExpression(boxed ThisExpression),
        28 => UnaryExpression(boxed UnaryExpression),
        29 => UpdateExpression(boxed UpdateExpression),
        30 => YieldExpression(boxed YieldExpression),
        31 => PrivateInExpression(boxed PrivateInExpression),
        32 => JSXElement(boxed JSXElement),
        33 => JSXFragment(boxed JSXFragment),
        34 => TSAsExpression(boxed TSAsExpression),
        35 => TSSatisfiesExpression(boxed TSSatisfiesExpression),
        36 => TSTypeAssertion(boxed TSTypeAssertion),
        37 => TSNonNullExpression(boxed TSNonNullExpression),
        38 => TSInstantiationExpression(boxed TSInstantiationExpression),
        39 => V8IntrinsicExpression(boxed V8IntrinsicExpression),
        ..MemberExpression,
    }

    union Argument [] {
        64 => SpreadElement(boxed SpreadElement),
        ..Expression,
    }

    union ArrayExpressionElement [] {
        64 => SpreadElement(boxed SpreadElement),
        65 => Elision(inline Elision),
        ..Expression,
    }

    union PropertyKey [] {
        64 => StaticIdentifier(boxed IdentifierName),
        65 => PrivateIdentifier(boxed PrivateIdentifier),
        ..Expression,
    }

    union ObjectPropertyKind [] {
        0 => ObjectProperty(boxed ObjectProperty),
        1 => SpreadProperty(boxed SpreadElement),
    }

    union SimpleAssignmentTarget [] {
        0 => AssignmentTargetIdentifier(boxed IdentifierReference),
        1 => TSAsExpression(boxed TSAsExpression),
        2 => TSSatisfiesExpression(boxed TSSatisfiesExpression),
        3 => TSNonNullExpression(boxed TSNonNullExpression),
        4 => TSTypeAssertion(boxed TSTypeAssertion),
        ..MemberExpression,
    }

    union AssignmentTargetPattern [] {
        8 => ArrayAssignmentTarget(boxed ArrayAssignmentTarget),
        9 => ObjectAssignmentTarget(boxed ObjectAssignmentTarget),
    }

    union AssignmentTarget [none = 51] {
        ..SimpleAssignmentTarget,
        ..AssignmentTargetPattern,
    }

    union AssignmentTargetMaybeDefault [none = 51] {
        16 => AssignmentTargetWithDefault(boxed AssignmentTargetWithDefault),
        ..AssignmentTarget,
    }

    union AssignmentTargetProperty [] {
        0 => AssignmentTargetPropertyIdentifier(boxed AssignmentTargetPropertyIdentifier),
        1 => AssignmentTargetPropertyProperty(boxed AssignmentTargetPropertyProperty),
    }

    union ChainElement [] {
        0 => CallExpression(boxed CallExpression),
        1 => TSNonNullExpression(boxed TSNonNullExpression),
        ..MemberExpression,
    }

    union ForStatementInit [none = 65] {
        64 => VariableDeclaration(boxed VariableDeclaration),
        ..Expression,
    }

    union ForStatementLeft [] {
        16 => VariableDeclaration(boxed VariableDeclaration),
        ..AssignmentTarget,
    }

    union Declaration [none = 31] {
        32 => VariableDeclaration(boxed VariableDeclaration),
        33 => FunctionDeclaration(boxed Function),
        34 => ClassDeclaration(boxed Class),
        35 => TSTypeAliasDeclaration(boxed TSTypeAliasDeclaration),
        36 => TSInterfaceDeclaration(boxed TSInterfaceDeclaration),
        37 => TSEnumDeclaration(boxed TSEnumDeclaration),
        38 => TSModuleDeclaration(boxed TSModuleDeclaration),
        39 => TSImportEqualsDeclaration(boxed TSImportEqualsDeclaration),
    }

    union ModuleDeclaration [] {
        64 => ImportDeclaration(boxed ImportDeclaration),
        65 => ExportAllDeclaration(boxed ExportAllDeclaration),
        66 => ExportDefaultDeclaration(boxed ExportDefaultDeclaration),
        67 => ExportNamedDeclaration(boxed ExportNamedDeclaration),
        68 => TSExportAssignment(boxed TSExportAssignment),
        69 => TSNamespaceExportDeclaration(boxed TSNamespaceExportDeclaration),
    }

    /// Any statement. Absent is discriminant 70.
    union Statement [none = 70] {
        0 => BlockStatement(boxed BlockStatement),
        1 => BreakStatement(boxed BreakStatement),
        2 => ContinueStatement(boxed ContinueStatement),
        3 => DebuggerStatement(boxed DebuggerStatement),
        4 => DoWhileStatement(boxed DoWhileStatement),
        5 => EmptyStatement(boxed EmptyStatement),
        6 => ExpressionStatement(boxed ExpressionStatement),
        7 => ForInStatement(boxed ForInStatement),
        8 => ForOfStatement(boxed ForOfStatement),
        9 => ForStatement(boxed ForStatement),
        10 => IfStatement(boxed IfStatement),
        11 => LabeledStatement(boxed LabeledStatement),
        12 => ReturnStatement(boxed ReturnStatement),
        13 => SwitchStatement(boxed SwitchStatement),
        14 => ThrowStatement(boxed ThrowStatement),
        15 => TryStatement(boxed TryStatement),
        16 => WhileStatement(boxed WhileStatement),
        17 => WithStatement(boxed WithStatement),
        ..Declaration,
        ..ModuleDeclaration,
    }

    union BindingPatternKind [] {
        0 => BindingIdentifier(boxed BindingIdentifier),
        1 => ObjectPattern(boxed ObjectPattern),
        2 => ArrayPattern(boxed ArrayPattern),
        3 => AssignmentPattern(boxed AssignmentPattern),
    }

    union ClassElement [] {
        0 => StaticBlock(boxed StaticBlock),
        1 => MethodDefinition(boxed MethodDefinition),
        2 => PropertyDefinition(boxed PropertyDefinition),
        3 => AccessorProperty(boxed AccessorProperty),
        4 => TSIndexSignature(boxed TSIndexSignature),
    }

    union ImportDeclarationSpecifier [] {
        0 => ImportSpecifier(boxed ImportSpecifier),
        1 => ImportDefaultSpecifier(boxed ImportDefaultSpecifier),
        2 => ImportNamespaceSpecifier(boxed ImportNamespaceSpecifier),
    }

    /// Payload stored inline.
    union ImportAttributeKey [] {
        0 => Identifier(inline IdentifierName),
        1 => StringLiteral(inline StringLiteral),
    }

    /// Payload stored inline. Absent is discriminant 3.
    union ModuleExportName [none = 3] {
        0 => IdentifierName(inline IdentifierName),
        1 => IdentifierReference(inline IdentifierReference),
        2 => StringLiteral(inline StringLiteral),
    }

    union ExportDefaultDeclarationKind [] {
        64 => FunctionDeclaration(boxed Function),
        65 => ClassDeclaration(boxed Class),
        66 => TSInterfaceDeclaration(boxed TSInterfaceDeclaration),
        ..Expression,
    }
}

impl<'a> Expression<'a> {
    /// Strips any number of wrapping parentheses.
    pub fn without_parentheses(&self) -> Result<&Expression<'a>, crate::core::error::Error> {
        let mut expr = self;
        while let Expression::ParenthesizedExpression(inner) = expr {
            expr = inner.expression()?;
        }
        Ok(expr)
    }

    pub fn is_member_expression(&self) -> bool {
        matches!(self, Expression::MemberExpression(_))
    }
}

impl<'a> ModuleExportName<'a> {
    /// The exported or imported name, unquoted.
    pub fn name(&self) -> Result<&'a str, crate::core::error::Error> {
        match self {
            ModuleExportName::IdentifierName(ident) => ident.name().copied(),
            ModuleExportName::IdentifierReference(ident) => ident.name().copied(),
            ModuleExportName::StringLiteral(literal) => literal.value().copied(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::codec::{SnapshotOptions, ToRecord};
    use crate::ast::catalog::UNION_LAYOUTS;
    use crate::ast::jsx::*;
    use crate::ast::layout::{UnionLayout, VariantLayout};
    use crate::ast::module_record::*;
    use crate::core::error::ErrorKind;
    use crate::core::raw::{RawTransfer, decode};
    use crate::core::writer::BufferWriter;
    use serde_json::json;

    /// One union slot per discriminant, each boxing a zeroed 256-byte record.
    fn slots() -> RawTransfer {
        let mut bytes = vec![0u8; 1 << 16];
        let mut writer = BufferWriter::new(&mut bytes, "").expect("writer");
        let target = writer.alloc(256).expect("target");
        let table = writer.alloc(16 * 256).expect("table");
        for discriminant in 0..=255u8 {
            writer
                .put_union(table + discriminant as u32 * 16, discriminant, target)
                .expect("slot");
        }
        writer.finish(table).expect("finish");
        decode(bytes, "").expect("decode")
    }

    fn own_discriminants(layout: &UnionLayout) -> Vec<u8> {
        layout.variants.iter().map(|v| v.discriminant).collect()
    }

    #[test]
    fn expression_dispatches_every_discriminant() {
        let ast = slots();
        let mut accepted = Vec::new();
        for discriminant in 0..=255u8 {
            let pos = ast.data_pos() + discriminant as u32 * 16;
            match Expression::decode_at(&ast, pos) {
                Ok(expr) => {
                    accepted.push(discriminant);
                    let expected = Expression::LAYOUT
                        .variant(discriminant)
                        .or_else(|| MemberExpression::LAYOUT.variant(discriminant))
                        .expect("listed variant");
                    assert_eq!(expr.variant_name(), expected.variant);
                }
                Err(err) => {
                    assert_eq!(err.kind(), ErrorKind::Discriminant);
                    assert_eq!(err.union_name(), Some("Expression"));
                    assert_eq!(err.discriminant(), Some(discriminant));
                    assert!(!Expression::accepts(discriminant));
                }
            }
        }
        let mut expected = own_discriminants(&Expression::LAYOUT);
        expected.extend(own_discriminants(&MemberExpression::LAYOUT));
        assert_eq!(accepted, expected);
        assert_eq!(accepted.len(), 43);
    }

    /// Own variant first, then the shared sets in declaration order.
    fn resolve(layout: &UnionLayout, discriminant: u8) -> Option<&'static VariantLayout> {
        layout.variant(discriminant).or_else(|| {
            layout.inherits.iter().find_map(|name| {
                let shared = UNION_LAYOUTS
                    .iter()
                    .find(|candidate| candidate.name == *name)
                    .expect("inherited union is catalogued");
                resolve(shared, discriminant)
            })
        })
    }

    fn sweep(
        ast: &RawTransfer,
        name: &'static str,
        accepts: fn(u8) -> bool,
        decode: impl Fn(u32) -> Result<&'static str, crate::core::error::Error>,
    ) {
        let layout = UNION_LAYOUTS
            .iter()
            .find(|layout| layout.name == name)
            .expect("catalogued");
        for discriminant in 0..=255u8 {
            let expected = resolve(layout, discriminant);
            assert_eq!(accepts(discriminant), expected.is_some(), "{name} {discriminant}");
            match decode(ast.data_pos() + discriminant as u32 * 16) {
                Ok(variant) => {
                    assert_eq!(Some(variant), expected.map(|v| v.variant), "{name} {discriminant}")
                }
                Err(err) => {
                    assert!(expected.is_none(), "{name} {discriminant}: {err}");
                    assert_eq!(err.kind(), ErrorKind::Discriminant);
                    assert_eq!(err.union_name(), Some(name));
                    assert_eq!(err.discriminant(), Some(discriminant));
                }
            }
            if layout.none == Some(discriminant) {
                assert!(expected.is_none(), "{name} none byte {discriminant} is a variant");
            }
        }
    }

    macro_rules! sweep_all {
        ($ast:ident; $($union:ident),* $(,)?) => {{
            let mut swept = Vec::new();
            $(
                sweep(&$ast, $union::NAME, $union::accepts, |pos| {
                    $union::decode_at(&$ast, pos).map(|value| value.variant_name())
                });
                swept.push($union::NAME);
            )*
            swept
        }};
    }

    #[test]
    fn every_catalogued_union_matches_its_table() {
        let ast = slots();
        let mut swept = sweep_all!(ast;
            MemberExpression, Expression, Argument, ArrayExpressionElement, PropertyKey,
            ObjectPropertyKind, SimpleAssignmentTarget, AssignmentTargetPattern, AssignmentTarget,
            AssignmentTargetMaybeDefault, AssignmentTargetProperty, ChainElement, ForStatementInit,
            ForStatementLeft, Declaration, ModuleDeclaration, Statement, BindingPatternKind,
            ClassElement, ImportDeclarationSpecifier, ImportAttributeKey, ModuleExportName,
            ExportDefaultDeclarationKind, JSXElementName, JSXMemberExpressionObject, JSXExpression,
            JSXAttributeItem, JSXAttributeName, JSXAttributeValue, JSXChild, TSType,
            TSTupleElement, TSTypeName, TSTypeQueryExprName, TSModuleReference, TSSignature,
            TSTypePredicateName, TSModuleDeclarationName, TSModuleDeclarationBody,
            TSEnumMemberName, TSLiteral, ImportImportName, ExportImportName, ExportExportName,
            ExportLocalName,
        );
        let mut catalogued: Vec<_> = UNION_LAYOUTS.iter().map(|layout| layout.name).collect();
        swept.sort_unstable();
        catalogued.sort_unstable();
        assert_eq!(swept, catalogued);
    }

    #[test]
    fn shared_sets_delegate() {
        let ast = slots();
        let at = |d: u32| ast.data_pos() + d * 16;
        match Argument::decode_at(&ast, at(14)).unwrap() {
            Argument::Expression(Expression::BinaryExpression(_)) => {}
            other => panic!("unexpected {other:?}"),
        }
        match Argument::decode_at(&ast, at(49)).unwrap() {
            Argument::Expression(Expression::MemberExpression(
                MemberExpression::StaticMemberExpression(_),
            )) => {}
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(Argument::decode_at(&ast, at(64)).unwrap().variant_name(), "SpreadElement");
        assert_eq!(PropertyKey::decode_at(&ast, at(64)).unwrap().variant_name(), "StaticIdentifier");
        assert_eq!(
            ForStatementLeft::decode_at(&ast, at(9)).unwrap().variant_name(),
            "ObjectAssignmentTarget"
        );
        assert_eq!(
            AssignmentTargetMaybeDefault::decode_at(&ast, at(0)).unwrap().variant_name(),
            "AssignmentTargetIdentifier"
        );
        assert_eq!(
            Statement::decode_at(&ast, at(66)).unwrap().variant_name(),
            "ExportDefaultDeclaration"
        );
        assert_eq!(
            ChainElement::decode_at(&ast, at(1)).unwrap().variant_name(),
            "TSNonNullExpression"
        );
        assert!(ChainElement::decode_at(&ast, at(2)).is_err());
        assert_eq!(
            SimpleAssignmentTarget::decode_at(&ast, at(4)).unwrap().variant_name(),
            "TSTypeAssertion"
        );
    }

    #[test]
    fn statement_accepts_declarations_and_module_items() {
        for discriminant in (0..=17).chain(32..=39).chain(64..=69) {
            assert!(Statement::accepts(discriminant), "{discriminant}");
        }
        for discriminant in [18, 31, 40, 63, 70] {
            assert!(!Statement::accepts(discriminant), "{discriminant}");
        }
        assert_eq!(Statement::NONE, Some(70));
        assert_eq!(Statement::LAYOUT.inherits, ["Declaration", "ModuleDeclaration"]);
    }

    #[test]
    fn inline_payload_sits_after_discriminant() {
        let mut bytes = vec![0u8; 1024];
        let source = "default";
        let mut writer = BufferWriter::new(&mut bytes, source).expect("writer");
        let slot = writer.alloc(56).expect("slot");
        writer.put_tag(slot, 0).expect("tag");
        writer.put_span(slot + 8, 0, 7).expect("span");
        writer.put_source_str(slot + 16, 0, 7).expect("name");
        writer.finish(slot).expect("finish");
        let ast = decode(bytes, source).expect("decode");

        let name = ModuleExportName::decode_at(&ast, ast.data_pos()).unwrap();
        assert_eq!(name.name().unwrap(), "default");
        let record = name.to_record().unwrap();
        assert_eq!(record["type"], json!("IdentifierName"));
        assert_eq!(record["name"], json!("default"));
    }

    #[test]
    fn parentheses_are_stripped() {
        let mut bytes = vec![0u8; 1024];
        let mut writer = BufferWriter::new(&mut bytes, "").expect("writer");
        let outer = writer.alloc(16).expect("outer");
        let paren = writer.alloc(ParenthesizedExpression::SIZE).expect("paren");
        let this = writer.alloc(ThisExpression::SIZE).expect("this");
        writer.put_union(outer, 24, paren).expect("outer slot");
        writer.put_union(paren + 8, 27, this).expect("inner slot");
        writer.finish(outer).expect("finish");
        let ast = decode(bytes, "").expect("decode");

        let expr = Expression::decode_at(&ast, ast.data_pos()).unwrap();
        assert_eq!(expr.without_parentheses().unwrap().variant_name(), "ThisExpression");
        assert!(!expr.is_member_expression());
    }

    #[test]
    fn snapshot_options_control_parens_and_ranges() {
        let mut bytes = vec![0u8; 1024];
        let mut writer = BufferWriter::new(&mut bytes, "(this)").expect("writer");
        let outer = writer.alloc(16).expect("outer");
        let paren = writer.alloc(ParenthesizedExpression::SIZE).expect("paren");
        writer.put_span(paren, 0, 6).expect("paren span");
        let this = writer.alloc(ThisExpression::SIZE).expect("this");
        writer.put_span(this, 1, 5).expect("this span");
        writer.put_union(outer, 24, paren).expect("outer slot");
        writer.put_union(paren + 8, 27, this).expect("inner slot");
        writer.finish(outer).expect("finish");
        let ast = decode(bytes, "(this)").expect("decode");
        let expr = Expression::decode_at(&ast, ast.data_pos()).unwrap();

        let kept = expr.to_record().unwrap();
        assert_eq!(kept["type"], json!("ParenthesizedExpression"));
        assert_eq!(kept["expression"]["type"], json!("ThisExpression"));
        assert!(kept.get("range").is_none());

        let options = SnapshotOptions::new()
            .with_range(true)
            .with_preserve_parens(false);
        let stripped = expr.to_record_with(&options).unwrap();
        assert_eq!(
            stripped,
            json!({"type": "ThisExpression", "start": 1, "end": 5, "range": [1, 5]})
        );

        let ranged = expr
            .to_record_with(&SnapshotOptions::new().with_range(true))
            .unwrap();
        assert_eq!(ranged["range"], json!([0, 6]));
        assert_eq!(ranged["expression"]["range"], json!([1, 5]));
    }
}
