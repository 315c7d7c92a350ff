//! Purpose: Views over JavaScript node records.
//! Exports: One view per JS node type plus the plain records nested inside them
//! (`BindingPattern`, `CatchParameter`, `FormalParameter`, `TemplateElementValue`, `RegExp`,
//! `WithClause`).
//! Role: Field offsets and strides here are the layout contract with the producer.
//! Invariants: Fields are listed in walk order; snapshots follow the same order.

use crate::ast::codec::{Boxed, Inline, Opt, Seq, Str};
use crate::ast::enums::*;
use crate::ast::layout::Sentinel;
use crate::ast::ts::*;
use crate::ast::unions::*;

define_views! { 'a;
    // Program

    node Program [128] {
        source_type as "sourceType" @ 125: ModuleKind,
    } {
        hashbang @ 48: Opt<Inline<Hashbang<'a>>>,
        directives @ 72: Seq<Inline<Directive<'a>>, 72>,
        body @ 96: Seq<Statement<'a>, 16>,
    }

    // Identifiers

    node IdentifierName [24] {} {
        name @ 8: Str,
    }

    node IdentifierReference [32] {} {
        name @ 8: Str,
    }

    node BindingIdentifier [32, niche = Sentinel::NullPointer { offset: 8 }] {} {
        name @ 8: Str,
    }

    node LabelIdentifier [24, niche = Sentinel::NullPointer { offset: 8 }] {} {
        name @ 8: Str,
    }

    node PrivateIdentifier [24] {} {
        name @ 8: Str,
    }

    // Literals

    node BooleanLiteral [12] {
        value @ 8: bool,
    } {}

    node NullLiteral [8] {} {}

    node NumericLiteral [40] {
        value @ 8: f64,
    } {
        raw @ 16: Opt<Str>,
    }

    /// Present/absent is encoded in the `lossy` byte: 2 means no literal.
    node StringLiteral [48, niche = Sentinel::Byte { offset: 40, value: 2 }] {
        lossy @ 40: bool,
    } {
        value @ 8: Str,
        raw @ 24: Opt<Str>,
    }

    node BigIntLiteral [48] {} {
        bigint @ 8: Str,
        raw @ 24: Opt<Str>,
    }

    node RegExpLiteral [56] {} {
        regex @ 8: Inline<RegExp<'a>>,
        raw @ 40: Opt<Str>,
    }

    record RegExp [32] {
        flags @ 24: RegExpFlags,
    } {
        pattern @ 0: Str,
    }

    node TemplateLiteral [56] {} {
        quasis @ 8: Seq<Inline<TemplateElement<'a>>, 48>,
        expressions @ 32: Seq<Expression<'a>, 16>,
    }

    node TaggedTemplateExpression [88] {} {
        tag @ 8: Expression<'a>,
        type_arguments as "typeArguments" @ 24: Opt<Boxed<TSTypeParameterInstantiation<'a>>>,
        quasi @ 32: Inline<TemplateLiteral<'a>>,
    }

    node TemplateElement [48] {
        tail @ 40: bool,
    } {
        value @ 8: Inline<TemplateElementValue<'a>>,
    }

    /// `cooked` is absent for templates with invalid escapes.
    record TemplateElementValue [32] {} {
        raw @ 0: Str,
        cooked @ 16: Opt<Str>,
    }

    // Expressions

    node ThisExpression [8] {} {}

    node Super [8] {} {}

    node Elision [8] {} {}

    node ArrayExpression [32] {} {
        elements @ 8: Seq<ArrayExpressionElement<'a>, 16>,
    }

    node ObjectExpression [32] {} {
        properties @ 8: Seq<ObjectPropertyKind<'a>, 16>,
    }

    node ObjectProperty [48] {
        kind @ 40: PropertyKind,
        method @ 41: bool,
        shorthand @ 42: bool,
        computed @ 43: bool,
    } {
        key @ 8: PropertyKey<'a>,
        value @ 24: Expression<'a>,
    }

    /// `a[b]`
    node ComputedMemberExpression [48] {
        optional @ 40: bool,
    } {
        object @ 8: Expression<'a>,
        expression as "property" @ 24: Expression<'a>,
    }

    /// `a.b`
    node StaticMemberExpression [56] {
        optional @ 48: bool,
    } {
        object @ 8: Expression<'a>,
        property @ 24: Inline<IdentifierName<'a>>,
    }

    /// `a.#b`
    node PrivateFieldExpression [56] {
        optional @ 48: bool,
    } {
        object @ 8: Expression<'a>,
        field as "property" @ 24: Inline<PrivateIdentifier<'a>>,
    }

    node CallExpression [64] {
        optional @ 56: bool,
    } {
        callee @ 8: Expression<'a>,
        type_arguments as "typeArguments" @ 24: Opt<Boxed<TSTypeParameterInstantiation<'a>>>,
        arguments @ 32: Seq<Argument<'a>, 16>,
    }

    node NewExpression [64] {} {
        callee @ 8: Expression<'a>,
        type_arguments as "typeArguments" @ 24: Opt<Boxed<TSTypeParameterInstantiation<'a>>>,
        arguments @ 32: Seq<Argument<'a>, 16>,
    }

    /// `new.target`, `import.meta`
    node MetaProperty [56] {} {
        meta @ 8: Inline<IdentifierName<'a>>,
        property @ 32: Inline<IdentifierName<'a>>,
    }

    node SpreadElement [24] {} {
        argument @ 8: Expression<'a>,
    }

    node UpdateExpression [32] {
        operator @ 24: UpdateOperator,
        prefix @ 25: bool,
    } {
        argument @ 8: SimpleAssignmentTarget<'a>,
    }

    node UnaryExpression [32] {
        operator @ 24: UnaryOperator,
    } {
        argument @ 8: Expression<'a>,
    }

    node BinaryExpression [48] {
        operator @ 40: BinaryOperator,
    } {
        left @ 8: Expression<'a>,
        right @ 24: Expression<'a>,
    }

    /// `#field in object`
    node PrivateInExpression [48] {} {
        left @ 8: Inline<PrivateIdentifier<'a>>,
        right @ 32: Expression<'a>,
    }

    node LogicalExpression [48] {
        operator @ 40: LogicalOperator,
    } {
        left @ 8: Expression<'a>,
        right @ 24: Expression<'a>,
    }

    node ConditionalExpression [56] {} {
        test @ 8: Expression<'a>,
        consequent @ 24: Expression<'a>,
        alternate @ 40: Expression<'a>,
    }

    node AssignmentExpression [48] {
        operator @ 40: AssignmentOperator,
    } {
        left @ 8: AssignmentTarget<'a>,
        right @ 24: Expression<'a>,
    }

    node ArrayAssignmentTarget [72] {} {
        elements @ 8: Seq<Opt<AssignmentTargetMaybeDefault<'a>>, 16>,
        rest @ 32: Opt<Inline<AssignmentTargetRest<'a>>>,
    }

    node ObjectAssignmentTarget [56] {} {
        properties @ 8: Seq<AssignmentTargetProperty<'a>, 16>,
        rest @ 32: Opt<Inline<AssignmentTargetRest<'a>>>,
    }

    /// Stored inline; absent when the target discriminant holds the reserved 51.
    node AssignmentTargetRest [24, niche = Sentinel::Byte { offset: 8, value: 51 }] {} {
        target as "argument" @ 8: AssignmentTarget<'a>,
    }

    node AssignmentTargetWithDefault [40] {} {
        binding as "left" @ 8: AssignmentTarget<'a>,
        init as "right" @ 24: Expression<'a>,
    }

    /// `{ a = 1 } = obj`
    node AssignmentTargetPropertyIdentifier [56] {} {
        binding as "key" @ 8: Inline<IdentifierReference<'a>>,
        init @ 40: Opt<Expression<'a>>,
    }

    /// `{ a: b } = obj`
    node AssignmentTargetPropertyProperty [48] {
        computed @ 40: bool,
    } {
        name as "key" @ 8: PropertyKey<'a>,
        binding as "value" @ 24: AssignmentTargetMaybeDefault<'a>,
    }

    node SequenceExpression [32] {} {
        expressions @ 8: Seq<Expression<'a>, 16>,
    }

    node AwaitExpression [24] {} {
        argument @ 8: Expression<'a>,
    }

    node ChainExpression [24] {} {
        expression @ 8: ChainElement<'a>,
    }

    node ParenthesizedExpression [24] {} {
        expression @ 8: Expression<'a>,
    }

    /// `%DebugPrint(x)`
    node V8IntrinsicExpression [56] {} {
        name @ 8: Inline<IdentifierName<'a>>,
        arguments @ 32: Seq<Argument<'a>, 16>,
    }

    // Statements

    node Directive [72] {} {
        expression @ 8: Inline<StringLiteral<'a>>,
        directive @ 56: Str,
    }

    node Hashbang [24, niche = Sentinel::NullPointer { offset: 8 }] {} {
        value @ 8: Str,
    }

    node BlockStatement [32] {} {
        body @ 8: Seq<Statement<'a>, 16>,
    }

    node VariableDeclaration [40] {
        kind @ 32: VariableDeclarationKind,
        declare @ 33: bool,
    } {
        declarations @ 8: Seq<Inline<VariableDeclarator<'a>>, 64>,
    }

    node VariableDeclarator [64] {
        definite @ 57: bool,
    } {
        id @ 8: Inline<BindingPattern<'a>>,
        init @ 40: Opt<Expression<'a>>,
    }

    node EmptyStatement [8] {} {}

    node ExpressionStatement [24] {} {
        expression @ 8: Expression<'a>,
    }

    node IfStatement [56] {} {
        test @ 8: Expression<'a>,
        consequent @ 24: Statement<'a>,
        alternate @ 40: Opt<Statement<'a>>,
    }

    node DoWhileStatement [40] {} {
        body @ 8: Statement<'a>,
        test @ 24: Expression<'a>,
    }

    node WhileStatement [40] {} {
        test @ 8: Expression<'a>,
        body @ 24: Statement<'a>,
    }

    node ForStatement [72] {} {
        init @ 8: Opt<ForStatementInit<'a>>,
        test @ 24: Opt<Expression<'a>>,
        update @ 40: Opt<Expression<'a>>,
        body @ 56: Statement<'a>,
    }

    node ForInStatement [56] {} {
        left @ 8: ForStatementLeft<'a>,
        right @ 24: Expression<'a>,
        body @ 40: Statement<'a>,
    }

    node ForOfStatement [64] {
        is_await as "await" @ 60: bool,
    } {
        left @ 8: ForStatementLeft<'a>,
        right @ 24: Expression<'a>,
        body @ 40: Statement<'a>,
    }

    node ContinueStatement [32] {} {
        label @ 8: Opt<Inline<LabelIdentifier<'a>>>,
    }

    node BreakStatement [32] {} {
        label @ 8: Opt<Inline<LabelIdentifier<'a>>>,
    }

    node ReturnStatement [24] {} {
        argument @ 8: Opt<Expression<'a>>,
    }

    node WithStatement [40] {} {
        object @ 8: Expression<'a>,
        body @ 24: Statement<'a>,
    }

    node SwitchStatement [48] {} {
        discriminant @ 8: Expression<'a>,
        cases @ 24: Seq<Inline<SwitchCase<'a>>, 48>,
    }

    /// `test` is absent for `default:`.
    node SwitchCase [48] {} {
        test @ 8: Opt<Expression<'a>>,
        consequent @ 24: Seq<Statement<'a>, 16>,
    }

    node LabeledStatement [48] {} {
        label @ 8: Inline<LabelIdentifier<'a>>,
        body @ 32: Statement<'a>,
    }

    node ThrowStatement [24] {} {
        argument @ 8: Expression<'a>,
    }

    node TryStatement [32] {} {
        block @ 8: Boxed<BlockStatement<'a>>,
        handler @ 16: Opt<Boxed<CatchClause<'a>>>,
        finalizer @ 24: Opt<Boxed<BlockStatement<'a>>>,
    }

    node CatchClause [56] {} {
        param @ 8: Opt<Inline<CatchParameter<'a>>>,
        body @ 48: Boxed<BlockStatement<'a>>,
    }

    record CatchParameter [40, niche = Sentinel::Byte { offset: 32, value: 2 }] {
        start @ 0: u32,
        end @ 4: u32,
    } {
        pattern @ 8: Inline<BindingPattern<'a>>,
    }

    node DebuggerStatement [8] {} {}

    // Patterns

    /// A binding target plus its optional marker; the marker byte doubles as the niche.
    record BindingPattern [32, niche = Sentinel::Byte { offset: 24, value: 2 }] {
        optional @ 24: bool,
    } {
        kind @ 0: BindingPatternKind<'a>,
        type_annotation as "typeAnnotation" @ 16: Opt<Boxed<TSTypeAnnotation<'a>>>,
    }

    node AssignmentPattern [56] {} {
        left @ 8: Inline<BindingPattern<'a>>,
        right @ 40: Expression<'a>,
    }

    node ObjectPattern [40] {} {
        properties @ 8: Seq<Inline<BindingProperty<'a>>, 64>,
        rest @ 32: Opt<Boxed<BindingRestElement<'a>>>,
    }

    node BindingProperty [64] {
        shorthand @ 56: bool,
        computed @ 57: bool,
    } {
        key @ 8: PropertyKey<'a>,
        value @ 24: Inline<BindingPattern<'a>>,
    }

    /// Holes are absent elements.
    node ArrayPattern [40] {} {
        elements @ 8: Seq<Opt<Inline<BindingPattern<'a>>>, 32>,
        rest @ 32: Opt<Boxed<BindingRestElement<'a>>>,
    }

    node BindingRestElement [40] {} {
        argument @ 8: Inline<BindingPattern<'a>>,
    }

    // Functions

    /// Declarations and expressions share this record; `type` tells them apart.
    node Function [88] {
        function_type as "type" @ 84: FunctionType,
        generator @ 85: bool,
        is_async as "async" @ 86: bool,
        declare @ 87: bool,
    } {
        id @ 8: Opt<Inline<BindingIdentifier<'a>>>,
        type_parameters as "typeParameters" @ 40: Opt<Boxed<TSTypeParameterDeclaration<'a>>>,
        params @ 56: Boxed<FormalParameters<'a>>,
        return_type as "returnType" @ 64: Opt<Boxed<TSTypeAnnotation<'a>>>,
        body @ 72: Opt<Boxed<FunctionBody<'a>>>,
    }

    node FormalParameters [48] {
        kind @ 40: FormalParameterKind,
    } {
        items @ 8: Seq<Inline<FormalParameter<'a>>, 72>,
        rest @ 32: Opt<Boxed<BindingRestElement<'a>>>,
    }

    record FormalParameter [72] {
        start @ 0: u32,
        end @ 4: u32,
    } {
        decorators @ 8: Seq<Inline<Decorator<'a>>, 24>,
        pattern @ 32: Inline<BindingPattern<'a>>,
    }

    node FunctionBody [56] {} {
        directives @ 8: Seq<Inline<Directive<'a>>, 72>,
        statements as "body" @ 32: Seq<Statement<'a>, 16>,
    }

    /// With `expression` set, the body holds a single expression statement.
    node ArrowFunctionExpression [48] {
        expression @ 44: bool,
        is_async as "async" @ 45: bool,
    } {
        type_parameters as "typeParameters" @ 8: Opt<Boxed<TSTypeParameterDeclaration<'a>>>,
        params @ 16: Boxed<FormalParameters<'a>>,
        return_type as "returnType" @ 24: Opt<Boxed<TSTypeAnnotation<'a>>>,
        body @ 32: Boxed<FunctionBody<'a>>,
    }

    node YieldExpression [32] {
        delegate @ 24: bool,
    } {
        argument @ 8: Opt<Expression<'a>>,
    }

    // Classes

    node Class [136] {
        class_type as "type" @ 132: ClassType,
        is_abstract as "abstract" @ 133: bool,
        declare @ 134: bool,
    } {
        decorators @ 8: Seq<Inline<Decorator<'a>>, 24>,
        id @ 32: Opt<Inline<BindingIdentifier<'a>>>,
        type_parameters as "typeParameters" @ 64: Opt<Boxed<TSTypeParameterDeclaration<'a>>>,
        super_class as "superClass" @ 72: Opt<Expression<'a>>,
        super_type_arguments as "superTypeArguments" @ 88: Opt<Boxed<TSTypeParameterInstantiation<'a>>>,
        implements @ 96: Seq<Inline<TSClassImplements<'a>>, 32>,
        body @ 120: Boxed<ClassBody<'a>>,
    }

    node ClassBody [32] {} {
        body @ 8: Seq<ClassElement<'a>, 16>,
    }

    node MethodDefinition [64] {
        method_type as "type" @ 56: MethodDefinitionType,
        kind @ 57: MethodDefinitionKind,
        computed @ 58: bool,
        is_static as "static" @ 59: bool,
        is_override as "override" @ 60: bool,
        optional @ 61: bool,
        accessibility @ 62: Option<TSAccessibility>,
    } {
        decorators @ 8: Seq<Inline<Decorator<'a>>, 24>,
        key @ 32: PropertyKey<'a>,
        value @ 48: Boxed<Function<'a>>,
    }

    node PropertyDefinition [88] {
        property_type as "type" @ 72: PropertyDefinitionType,
        computed @ 73: bool,
        is_static as "static" @ 74: bool,
        declare @ 75: bool,
        is_override as "override" @ 76: bool,
        optional @ 77: bool,
        definite @ 78: bool,
        readonly @ 79: bool,
        accessibility @ 80: Option<TSAccessibility>,
    } {
        decorators @ 8: Seq<Inline<Decorator<'a>>, 24>,
        key @ 32: PropertyKey<'a>,
        type_annotation as "typeAnnotation" @ 48: Opt<Boxed<TSTypeAnnotation<'a>>>,
        value @ 56: Opt<Expression<'a>>,
    }

    node StaticBlock [32] {} {
        body @ 8: Seq<Statement<'a>, 16>,
    }

    /// `accessor x = 1`
    node AccessorProperty [80] {
        accessor_type as "type" @ 72: AccessorPropertyType,
        computed @ 73: bool,
        is_static as "static" @ 74: bool,
        is_override as "override" @ 75: bool,
        definite @ 76: bool,
        accessibility @ 77: Option<TSAccessibility>,
    } {
        decorators @ 8: Seq<Inline<Decorator<'a>>, 24>,
        key @ 32: PropertyKey<'a>,
        type_annotation as "typeAnnotation" @ 48: Opt<Boxed<TSTypeAnnotation<'a>>>,
        value @ 56: Opt<Expression<'a>>,
    }

    node Decorator [24] {} {
        expression @ 8: Expression<'a>,
    }

    // Modules

    /// `import(source, options)`
    node ImportExpression [48] {
        phase @ 40: Option<ImportPhase>,
    } {
        source @ 8: Expression<'a>,
        options @ 24: Opt<Expression<'a>>,
    }

    /// `specifiers` is absent for `import "x"`, and empty for `import {} from "x"`.
    node ImportDeclaration [96] {
        phase @ 88: Option<ImportPhase>,
        import_kind as "importKind" @ 89: ImportOrExportKind,
    } {
        specifiers @ 8: Opt<Seq<ImportDeclarationSpecifier<'a>, 16>>,
        source @ 32: Inline<StringLiteral<'a>>,
        with_clause as "attributes" @ 80: Opt<Boxed<WithClause<'a>>>,
    }

    node ImportSpecifier [104] {
        import_kind as "importKind" @ 96: ImportOrExportKind,
    } {
        imported @ 8: ModuleExportName<'a>,
        local @ 64: Inline<BindingIdentifier<'a>>,
    }

    node ImportDefaultSpecifier [40] {} {
        local @ 8: Inline<BindingIdentifier<'a>>,
    }

    node ImportNamespaceSpecifier [40] {} {
        local @ 8: Inline<BindingIdentifier<'a>>,
    }

    record WithClause [56] {} {
        attributes @ 32: Seq<Inline<ImportAttribute<'a>>, 112>,
    }

    node ImportAttribute [112] {} {
        key @ 8: ImportAttributeKey<'a>,
        value @ 64: Inline<StringLiteral<'a>>,
    }

    node ExportNamedDeclaration [112] {
        export_kind as "exportKind" @ 104: ImportOrExportKind,
    } {
        declaration @ 8: Opt<Declaration<'a>>,
        specifiers @ 24: Seq<Inline<ExportSpecifier<'a>>, 128>,
        source @ 48: Opt<Inline<StringLiteral<'a>>>,
        with_clause as "attributes" @ 96: Opt<Boxed<WithClause<'a>>>,
    }

    node ExportDefaultDeclaration [80] {} {
        declaration @ 64: ExportDefaultDeclarationKind<'a>,
    }

    /// `export * as ns from "x"`
    node ExportAllDeclaration [128] {
        export_kind as "exportKind" @ 120: ImportOrExportKind,
    } {
        exported @ 8: Opt<ModuleExportName<'a>>,
        source @ 64: Inline<StringLiteral<'a>>,
        with_clause as "attributes" @ 112: Opt<Boxed<WithClause<'a>>>,
    }

    node ExportSpecifier [128] {
        export_kind as "exportKind" @ 120: ImportOrExportKind,
    } {
        local @ 8: ModuleExportName<'a>,
        exported @ 64: ModuleExportName<'a>,
    }
}

impl<'a> Function<'a> {
    pub fn is_declaration(&self) -> Result<bool, crate::core::error::Error> {
        Ok(self.function_type()? == FunctionType::FunctionDeclaration)
    }
}

impl<'a> ArrowFunctionExpression<'a> {
    /// The expression of a concise body (`x => x + 1`).
    pub fn concise_body(&self) -> Result<Option<&Expression<'a>>, crate::core::error::Error> {
        if !self.expression()? {
            return Ok(None);
        }
        let body = self.body()?;
        match body.statements()?.first() {
            Some(Statement::ExpressionStatement(statement)) => statement.expression().map(Some),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::codec::{ToRecord, View};
    use crate::core::error::ErrorKind;
    use crate::core::raw::{RawTransfer, decode, tally};
    use crate::core::writer::BufferWriter;
    use serde_json::json;

    fn build(source: &str, fill: impl FnOnce(&mut BufferWriter<'_>) -> u32) -> RawTransfer {
        let mut bytes = vec![0u8; 4096];
        let mut writer = BufferWriter::new(&mut bytes, source).expect("writer");
        let root = fill(&mut writer);
        writer.finish(root).expect("finish");
        decode(bytes, source).expect("decode")
    }

    fn identifier(w: &mut BufferWriter<'_>, pos: u32, start: u32, len: u32) {
        w.put_span(pos, start, start + len).expect("span");
        w.put_source_str(pos + 8, start, len).expect("name");
    }

    #[test]
    fn binary_expression_fields_at_declared_offsets() {
        // a === b
        let ast = build("a === b", |w| {
            let node = w.alloc(BinaryExpression::SIZE).expect("node");
            w.put_span(node, 0, 7).expect("span");
            let left = w.alloc(IdentifierReference::SIZE).expect("left");
            identifier(w, left, 0, 1);
            let right = w.alloc(IdentifierReference::SIZE).expect("right");
            identifier(w, right, 6, 1);
            w.put_union(node + 8, 7, left).expect("left slot");
            w.put_union(node + 24, 7, right).expect("right slot");
            w.put_u8(node + 40, 2).expect("operator");
            node
        });
        let node = BinaryExpression::new(&ast, ast.data_pos());
        assert_eq!(node.span().unwrap(), crate::ast::Span::new(0, 7));
        assert_eq!(node.operator().unwrap(), BinaryOperator::StrictEquality);
        match node.left().unwrap() {
            Expression::Identifier(ident) => assert_eq!(*ident.name().unwrap(), "a"),
            other => panic!("unexpected {other:?}"),
        }
        match node.right().unwrap() {
            Expression::Identifier(ident) => {
                assert_eq!(*ident.name().unwrap(), "b");
                assert_eq!(ident.start().unwrap(), 6);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn field_reads_are_memoized() {
        let ast = build("a", |w| {
            let node = w.alloc(ExpressionStatement::SIZE).expect("node");
            w.put_span(node, 0, 1).expect("span");
            let ident = w.alloc(IdentifierReference::SIZE).expect("ident");
            identifier(w, ident, 0, 1);
            w.put_union(node + 8, 7, ident).expect("expr");
            node
        });
        let statement = ExpressionStatement::new(&ast, ast.data_pos());
        tally::reset();
        let first = statement.expression().unwrap() as *const Expression<'_>;
        let reads = tally::reads();
        assert!(reads > 0);
        let second = statement.expression().unwrap() as *const Expression<'_>;
        assert_eq!(tally::reads(), reads);
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn constructing_a_view_reads_nothing() {
        let ast = build("", |w| w.alloc(Function::SIZE).expect("node"));
        tally::reset();
        let _function = Function::new(&ast, ast.data_pos());
        assert_eq!(tally::reads(), 0);
        assert_eq!(tally::views(), 1);
    }

    #[test]
    fn optional_fields_present_and_absent() {
        let ast = build("return;return x", |w| {
            let pair = w.alloc(ReturnStatement::SIZE * 2).expect("nodes");
            let bare = pair;
            w.put_span(bare, 0, 7).expect("span");
            w.put_tag(bare + 8, 51).expect("none");
            let with_arg = pair + ReturnStatement::SIZE;
            w.put_span(with_arg, 7, 15).expect("span");
            let ident = w.alloc(IdentifierReference::SIZE).expect("ident");
            identifier(w, ident, 14, 1);
            w.put_union(with_arg + 8, 7, ident).expect("arg");
            pair
        });
        let bare = ReturnStatement::new(&ast, ast.data_pos());
        assert!(bare.argument().unwrap().is_none());
        let with_arg = ReturnStatement::new(&ast, ast.data_pos() + ReturnStatement::SIZE);
        assert_eq!(
            with_arg.argument().unwrap().as_ref().map(|e| e.variant_name()),
            Some("Identifier")
        );
    }

    #[test]
    fn inline_identifier_niche() {
        let ast = build("break;", |w| {
            let node = w.alloc(BreakStatement::SIZE).expect("node");
            w.put_span(node, 0, 6).expect("span");
            node
        });
        let node = BreakStatement::new(&ast, ast.data_pos());
        assert!(node.label().unwrap().is_none());
        assert_eq!(BindingIdentifier::LAYOUT.sentinel, Some(Sentinel::NullPointer { offset: 8 }));
    }

    #[test]
    fn sequences_empty_and_populated() {
        let ast = build("a,b,c", |w| {
            let pair = w.alloc(SequenceExpression::SIZE * 2).expect("nodes");
            w.put_span(pair, 0, 0).expect("span");
            w.put_vec(pair + 8, 0, 0).expect("empty");
            let full = pair + SequenceExpression::SIZE;
            w.put_span(full, 0, 5).expect("span");
            let first = w.alloc_vec(full + 8, 16, 3).expect("vec");
            for index in 0..3 {
                let ident = w.alloc(IdentifierReference::SIZE).expect("ident");
                identifier(w, ident, index * 2, 1);
                w.put_union(first + index * 16, 7, ident).expect("elem");
            }
            pair
        });
        let empty = SequenceExpression::new(&ast, ast.data_pos());
        assert!(empty.expressions().unwrap().is_empty());
        let full = SequenceExpression::new(&ast, ast.data_pos() + SequenceExpression::SIZE);
        let names: Vec<&str> = full
            .expressions()
            .unwrap()
            .iter()
            .map(|expr| match expr {
                Expression::Identifier(ident) => *ident.name().unwrap(),
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn unknown_expression_discriminant_fails() {
        let ast = build("", |w| {
            let node = w.alloc(ExpressionStatement::SIZE).expect("node");
            w.put_tag(node + 8, 45).expect("unassigned");
            node
        });
        let statement = ExpressionStatement::new(&ast, ast.data_pos());
        let err = statement.expression().expect_err("unassigned variant");
        assert_eq!(err.kind(), ErrorKind::Discriminant);
        assert_eq!(err.message(), Some("Unexpected discriminant 45 for Expression"));
    }

    #[test]
    fn binding_type_annotation_is_read() {
        // let x: string
        let ast = build("let x: string", |w| {
            let node = w.alloc(VariableDeclarator::SIZE).expect("node");
            w.put_span(node, 4, 13).expect("span");
            let ident = w.alloc(BindingIdentifier::SIZE).expect("ident");
            identifier(w, ident, 4, 1);
            w.put_union(node + 8, 0, ident).expect("kind");
            let annotation = w.alloc(TSTypeAnnotation::SIZE).expect("annotation");
            w.put_span(annotation, 5, 13).expect("annotation span");
            let keyword = w.alloc(TSStringKeyword::SIZE).expect("keyword");
            w.put_span(keyword, 7, 13).expect("keyword span");
            w.put_union(annotation + 8, 8, keyword).expect("type");
            w.put_ptr(node + 8 + 16, annotation).expect("annotation ptr");
            w.put_tag(node + 40, 51).expect("no init");
            node
        });
        let declarator = VariableDeclarator::new(&ast, ast.data_pos());
        let pattern = declarator.id().unwrap();
        let annotation = pattern.type_annotation().unwrap().as_ref().expect("annotation");
        assert_eq!(annotation.type_annotation().unwrap().variant_name(), "TSStringKeyword");
        assert!(declarator.init().unwrap().is_none());
        assert!(!declarator.definite().unwrap());
        let record = declarator.to_record().unwrap();
        assert_eq!(
            record["id"]["typeAnnotation"]["typeAnnotation"]["type"],
            json!("TSStringKeyword")
        );
    }

    #[test]
    fn function_snapshot_uses_estree_type() {
        let ast = build("function f() {}", |w| {
            let node = w.alloc(Function::SIZE).expect("fn");
            w.put_span(node, 0, 15).expect("span");
            identifier(w, node + 8, 9, 1);
            let params = w.alloc(FormalParameters::SIZE).expect("params");
            w.put_span(params, 10, 12).expect("span");
            w.put_vec(params + 8, 0, 0).expect("items");
            w.put_ptr(node + 56, params).expect("params ptr");
            let body = w.alloc(FunctionBody::SIZE).expect("body");
            w.put_span(body, 13, 15).expect("span");
            w.put_ptr(node + 72, body).expect("body ptr");
            w.put_u8(node + 84, 0).expect("type");
            node
        });
        let function = Function::new(&ast, ast.data_pos());
        assert!(function.is_declaration().unwrap());
        let record = function.to_record().unwrap();
        assert_eq!(record["type"], json!("FunctionDeclaration"));
        assert_eq!(record["id"]["name"], json!("f"));
        assert_eq!(record["async"], json!(false));
        assert_eq!(record["params"]["items"], json!([]));
        assert_eq!(record["params"]["rest"], json!(null));
        assert_eq!(record["body"]["body"], json!([]));
    }

    #[test]
    fn layout_lists_declared_fields() {
        let layout = ForOfStatement::LAYOUT;
        assert_eq!(layout.size, 64);
        let names: Vec<&str> = layout.fields.iter().map(|field| field.name).collect();
        assert_eq!(names, ["await", "left", "right", "body"]);
        assert_eq!(layout.field("right").map(|field| field.offset), Some(24));
        assert_eq!(<Program<'_> as View<'_>>::NAME, "Program");
    }
}
