//! Purpose: The full layout table: every node, plain record, and union in one place.
//! Exports: `RECORD_LAYOUTS`, `UNION_LAYOUTS`, `LayoutEntry`, `LayoutTable`, `lookup`,
//! `table`, `fingerprint`.
//! Role: Backs `rawtree layout`; the fingerprint pairs a decoder build with its producer.
//! Invariants: Entries are copies of the `LAYOUT` constants the views decode with.

use std::fmt::Write as _;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::ast::NodeType;
use crate::ast::js::{
    BindingPattern, CatchParameter, FormalParameter, RegExp, TemplateElementValue, WithClause,
};
use crate::ast::jsx::*;
use crate::ast::layout::{NodeLayout, Payload, Slot, SlotKind, UnionLayout};
use crate::ast::module_record::*;
use crate::ast::root::{Comment, Diagnostic, ErrorLabel, RawTransferData};
use crate::ast::ts::*;
use crate::ast::unions::*;
use crate::core::error::{Error, ErrorKind};
use crate::core::format::{LAYOUT_VERSION, UNION_PAYLOAD, UNION_SIZE};

/// Records without a node type: embedded structs and the root/module/diagnostic records.
pub static RECORD_LAYOUTS: &[NodeLayout] = &[
    RegExp::LAYOUT,
    TemplateElementValue::LAYOUT,
    CatchParameter::LAYOUT,
    BindingPattern::LAYOUT,
    FormalParameter::LAYOUT,
    WithClause::LAYOUT,
    NameSpan::LAYOUT,
    SourceSpan::LAYOUT,
    ImportEntry::LAYOUT,
    ExportEntry::LAYOUT,
    StaticImport::LAYOUT,
    StaticExport::LAYOUT,
    DynamicImport::LAYOUT,
    EcmaScriptModule::LAYOUT,
    RawTransferData::LAYOUT,
    Comment::LAYOUT,
    Diagnostic::LAYOUT,
    ErrorLabel::LAYOUT,
];

pub static UNION_LAYOUTS: &[UnionLayout] = &[
    MemberExpression::LAYOUT,
    Expression::LAYOUT,
    Argument::LAYOUT,
    ArrayExpressionElement::LAYOUT,
    PropertyKey::LAYOUT,
    ObjectPropertyKind::LAYOUT,
    SimpleAssignmentTarget::LAYOUT,
    AssignmentTargetPattern::LAYOUT,
    AssignmentTarget::LAYOUT,
    AssignmentTargetMaybeDefault::LAYOUT,
    AssignmentTargetProperty::LAYOUT,
    ChainElement::LAYOUT,
    ForStatementInit::LAYOUT,
    ForStatementLeft::LAYOUT,
    Declaration::LAYOUT,
    ModuleDeclaration::LAYOUT,
    Statement::LAYOUT,
    BindingPatternKind::LAYOUT,
    ClassElement::LAYOUT,
    ImportDeclarationSpecifier::LAYOUT,
    ImportAttributeKey::LAYOUT,
    ModuleExportName::LAYOUT,
    ExportDefaultDeclarationKind::LAYOUT,
    JSXElementName::LAYOUT,
    JSXMemberExpressionObject::LAYOUT,
    JSXExpression::LAYOUT,
    JSXAttributeItem::LAYOUT,
    JSXAttributeName::LAYOUT,
    JSXAttributeValue::LAYOUT,
    JSXChild::LAYOUT,
    TSType::LAYOUT,
    TSTupleElement::LAYOUT,
    TSTypeName::LAYOUT,
    TSTypeQueryExprName::LAYOUT,
    TSModuleReference::LAYOUT,
    TSSignature::LAYOUT,
    TSTypePredicateName::LAYOUT,
    TSModuleDeclarationName::LAYOUT,
    TSModuleDeclarationBody::LAYOUT,
    TSEnumMemberName::LAYOUT,
    TSLiteral::LAYOUT,
    ImportImportName::LAYOUT,
    ExportImportName::LAYOUT,
    ExportExportName::LAYOUT,
    ExportLocalName::LAYOUT,
];

#[derive(Clone, Copy, Debug, Serialize)]
#[serde(tag = "kind", content = "layout", rename_all = "snake_case")]
pub enum LayoutEntry {
    Node(NodeLayout),
    Record(NodeLayout),
    Union(UnionLayout),
}

impl LayoutEntry {
    pub fn name(&self) -> &'static str {
        match self {
            LayoutEntry::Node(layout) | LayoutEntry::Record(layout) => layout.name,
            LayoutEntry::Union(layout) => layout.name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LayoutTable {
    pub version: u32,
    pub nodes: Vec<NodeLayout>,
    pub records: &'static [NodeLayout],
    pub unions: &'static [UnionLayout],
}

pub fn table() -> LayoutTable {
    LayoutTable {
        version: LAYOUT_VERSION,
        nodes: NodeType::ALL.iter().map(|node_type| node_type.layout()).collect(),
        records: RECORD_LAYOUTS,
        unions: UNION_LAYOUTS,
    }
}

/// Finds a node, record, or union by name.
pub fn lookup(name: &str) -> Option<LayoutEntry> {
    if let Some(node_type) = NodeType::from_name(name) {
        return Some(LayoutEntry::Node(node_type.layout()));
    }
    if let Some(record) = RECORD_LAYOUTS.iter().find(|layout| layout.name == name) {
        return Some(LayoutEntry::Record(*record));
    }
    UNION_LAYOUTS
        .iter()
        .find(|layout| layout.name == name)
        .map(|layout| LayoutEntry::Union(*layout))
}

/// Every name `lookup` accepts, nodes first.
pub fn names() -> impl Iterator<Item = &'static str> {
    NodeType::ALL
        .iter()
        .map(|node_type| node_type.name())
        .chain(RECORD_LAYOUTS.iter().map(|layout| layout.name))
        .chain(UNION_LAYOUTS.iter().map(|layout| layout.name))
}

/// Width of a slot, resolving inline records and unions through the table.
///
/// A union whose variants are all boxed or unit is a discriminant word plus a pointer.
/// Inline payloads widen it to the largest payload record.
pub fn slot_width(slot: &Slot) -> Option<u32> {
    if let Some(width) = slot.width() {
        return Some(width);
    }
    match slot.kind {
        SlotKind::Record(name) => record_size(name),
        SlotKind::Union(name) => union_width(name),
        SlotKind::Scalar(_) | SlotKind::Str => None,
    }
}

fn record_size(name: &str) -> Option<u32> {
    match lookup(name)? {
        LayoutEntry::Node(layout) | LayoutEntry::Record(layout) => Some(layout.size),
        LayoutEntry::Union(_) => None,
    }
}

fn union_width(name: &str) -> Option<u32> {
    let Some(LayoutEntry::Union(layout)) = lookup(name) else {
        return None;
    };
    let mut width = UNION_SIZE;
    for variant in layout.variants {
        if variant.payload == Payload::Inline {
            width = width.max(UNION_PAYLOAD + record_size(variant.target?)?);
        }
    }
    for inherited in layout.inherits {
        width = width.max(union_width(inherited)?);
    }
    Some(width)
}

/// Checks that every field of every record ends inside the record.
pub fn check_fields() -> Result<(), Error> {
    let table = table();
    for layout in table.nodes.iter().chain(table.records.iter()) {
        for field in layout.fields {
            let width = slot_width(&field.slot).ok_or_else(|| {
                Error::new(ErrorKind::Internal)
                    .with_message(format!("{}.{} has no known width", layout.name, field.name))
            })?;
            if field.offset + width > layout.size {
                return Err(Error::new(ErrorKind::Internal).with_message(format!(
                    "{}.{} at {}..{} overruns the {} byte record",
                    layout.name,
                    field.name,
                    field.offset,
                    field.offset + width,
                    layout.size
                )));
            }
        }
    }
    Ok(())
}

/// Hex SHA-256 of the serialized table. Changes whenever any offset, stride, sentinel,
/// or discriminant changes. An inconsistent table has no fingerprint.
pub fn fingerprint() -> Result<String, Error> {
    check_fields()?;
    let bytes = serde_json::to_vec(&table()).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to serialize layout table")
            .with_source(err)
    })?;
    let digest = Sha256::digest(&bytes);
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(hex, "{byte:02x}");
    }
    Ok(hex)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::ast::layout::Sentinel;

    #[test]
    fn names_are_unique() {
        let mut seen = HashSet::new();
        for name in names() {
            assert!(seen.insert(name), "duplicate layout name {name}");
        }
        assert_eq!(seen.len(), NodeType::COUNT + RECORD_LAYOUTS.len() + UNION_LAYOUTS.len());
    }

    #[test]
    fn every_referenced_layout_exists() {
        let table = table();
        let fields = table
            .nodes
            .iter()
            .chain(table.records.iter())
            .flat_map(|layout| layout.fields.iter());
        for field in fields {
            match field.slot.kind {
                SlotKind::Record(name) | SlotKind::Union(name) => {
                    assert!(lookup(name).is_some(), "{name} missing from the table");
                }
                SlotKind::Scalar(_) | SlotKind::Str => {}
            }
        }
        for layout in UNION_LAYOUTS {
            for inherited in layout.inherits {
                assert!(matches!(lookup(inherited), Some(LayoutEntry::Union(_))));
            }
            for variant in layout.variants {
                if let Some(target) = variant.target {
                    assert!(lookup(target).is_some(), "{target} missing from the table");
                }
            }
        }
    }

    #[test]
    fn fields_fit_inside_their_record() {
        check_fields().expect("every field ends inside its record");
        let Some(LayoutEntry::Node(declarator)) = lookup("VariableDeclarator") else {
            panic!("VariableDeclarator is a node");
        };
        let init = declarator.field("init").expect("init");
        assert_eq!(slot_width(&init.slot), Some(16));
        // Inline identifier payloads widen the slot past a bare discriminant and pointer.
        assert_eq!(union_width("ModuleExportName"), Some(UNION_PAYLOAD + 48));
        assert_eq!(union_width("Statement"), Some(UNION_SIZE));
    }

    #[test]
    fn lookup_reports_sentinels_and_variants() {
        let Some(LayoutEntry::Node(if_statement)) = lookup("IfStatement") else {
            panic!("IfStatement is a node");
        };
        let alternate = if_statement.field("alternate").expect("alternate");
        assert_eq!(alternate.offset, 40);
        assert_eq!(alternate.slot.sentinel, Some(Sentinel::Byte { offset: 0, value: 70 }));

        let Some(LayoutEntry::Union(expression)) = lookup("Expression") else {
            panic!("Expression is a union");
        };
        assert_eq!(expression.none, Some(51));
        let literal = expression.variant(2).expect("numeric literal");
        assert_eq!(literal.target, Some("NumericLiteral"));
        assert_eq!(literal.payload, Payload::Boxed);
        assert_eq!(expression.inherits, ["MemberExpression"]);

        assert!(matches!(lookup("NameSpan"), Some(LayoutEntry::Record(_))));
        assert!(matches!(lookup("TSAsExpression"), Some(LayoutEntry::Node(_))));
        let Some(LayoutEntry::Union(ts_type)) = lookup("TSType") else {
            panic!("TSType is a union");
        };
        assert_eq!(ts_type.none, Some(38));
        assert!(ts_type.variant(25).is_none());
    }

    #[test]
    fn fingerprint_is_stable_hex() {
        let first = fingerprint().expect("fingerprint");
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(first, fingerprint().expect("fingerprint"));
    }
}
