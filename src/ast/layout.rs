//! Purpose: Runtime description of the transfer layout: records, fields, unions, sentinels.
//! Exports: `NodeLayout`, `FieldLayout`, `UnionLayout`, `VariantLayout`, `Slot`, `Sentinel`.
//! Role: Generated from the same declarations as the views, so it cannot drift from them.
//! Invariants: Field offsets are relative to the record start; union payloads sit at +8.

use serde::Serialize;

use crate::ast::NodeType;
use crate::core::format::{BOX_SIZE, STR_SIZE, VEC_SIZE};
use crate::core::error::Error;
use crate::core::raw::RawTransfer;

/// Byte pattern that marks an optional slot as absent.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Sentinel {
    /// Both u32 words at `offset` are zero.
    NullPointer { offset: u32 },
    /// The byte at `offset` equals `value`.
    Byte { offset: u32, value: u8 },
}

impl Sentinel {
    pub fn is_none(self, ast: &RawTransfer, pos: u32) -> Result<bool, Error> {
        match self {
            Sentinel::NullPointer { offset } => ast.is_null(ast.locate(pos, offset)?),
            Sentinel::Byte { offset, value } => Ok(ast.read_u8(ast.locate(pos, offset)?)? == value),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum SlotKind {
    Scalar(&'static str),
    Str,
    Record(&'static str),
    Union(&'static str),
}

/// Shape of one field slot.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct Slot {
    pub kind: SlotKind,
    pub boxed: bool,
    /// Set when the slot itself is optional.
    pub sentinel: Option<Sentinel>,
    /// Element stride when the slot is a vec.
    pub stride: Option<u32>,
    /// Set when vec elements are optional.
    pub element_sentinel: Option<Sentinel>,
}

impl Slot {
    pub const fn new(kind: SlotKind) -> Self {
        Self {
            kind,
            boxed: false,
            sentinel: None,
            stride: None,
            element_sentinel: None,
        }
    }

    pub const fn boxed(self) -> Self {
        Self {
            boxed: true,
            ..self
        }
    }

    pub const fn optional(self, sentinel: Sentinel) -> Self {
        Self {
            sentinel: Some(sentinel),
            ..self
        }
    }

    pub const fn sequence(self, stride: u32) -> Self {
        Self {
            stride: Some(stride),
            element_sentinel: self.sentinel,
            sentinel: None,
            ..self
        }
    }

    pub fn is_optional(&self) -> bool {
        self.sentinel.is_some()
    }

    /// Bytes the slot occupies in its record. Inline records and unions report `None`; their
    /// width depends on other layouts.
    pub fn width(&self) -> Option<u32> {
        if self.stride.is_some() {
            return Some(VEC_SIZE);
        }
        if self.boxed {
            return Some(BOX_SIZE);
        }
        match self.kind {
            SlotKind::Str => Some(STR_SIZE),
            SlotKind::Scalar("u32") => Some(4),
            SlotKind::Scalar("u64" | "f64") => Some(8),
            SlotKind::Scalar(_) => Some(1),
            SlotKind::Record(_) | SlotKind::Union(_) => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct FieldLayout {
    pub name: &'static str,
    pub offset: u32,
    pub slot: Slot,
}

/// Layout of a node or plain record.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct NodeLayout {
    pub name: &'static str,
    /// Present for visitable node types.
    pub node_type: Option<NodeType>,
    pub size: u32,
    /// Nodes start with a `(start, end)` u32 pair not listed in `fields`.
    pub spanned: bool,
    /// Sentinel used when the record appears inline inside an optional slot.
    pub sentinel: Option<Sentinel>,
    pub fields: &'static [FieldLayout],
}

impl NodeLayout {
    pub fn field(&self, name: &str) -> Option<&'static FieldLayout> {
        self.fields.iter().find(|field| field.name == name)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Payload {
    Boxed,
    Inline,
    Unit,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct VariantLayout {
    pub discriminant: u8,
    pub variant: &'static str,
    pub target: Option<&'static str>,
    pub payload: Payload,
}

/// Discriminant table of one union. Variants inherited from another union are listed by
/// name in `inherits` and resolved through that union's own table.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct UnionLayout {
    pub name: &'static str,
    pub none: Option<u8>,
    pub payload_offset: u32,
    pub variants: &'static [VariantLayout],
    pub inherits: &'static [&'static str],
}

impl UnionLayout {
    pub fn variant(&self, discriminant: u8) -> Option<&'static VariantLayout> {
        self.variants
            .iter()
            .find(|variant| variant.discriminant == discriminant)
    }
}

#[cfg(test)]
mod tests {
    use super::{Sentinel, Slot, SlotKind};

    #[test]
    fn sequence_moves_sentinel_to_elements() {
        let element = Slot::new(SlotKind::Union("Expression"))
            .optional(Sentinel::Byte { offset: 0, value: 51 });
        let seq = element.sequence(16);
        assert_eq!(seq.stride, Some(16));
        assert!(!seq.is_optional());
        assert_eq!(
            seq.element_sentinel,
            Some(Sentinel::Byte { offset: 0, value: 51 })
        );
    }

    #[test]
    fn slot_widths_follow_slot_shape() {
        assert_eq!(Slot::new(SlotKind::Str).width(), Some(16));
        assert_eq!(Slot::new(SlotKind::Record("Directive")).sequence(72).width(), Some(24));
        assert_eq!(Slot::new(SlotKind::Record("Function")).boxed().width(), Some(8));
        assert_eq!(Slot::new(SlotKind::Scalar("f64")).width(), Some(8));
        assert_eq!(Slot::new(SlotKind::Scalar("BinaryOperator")).width(), Some(1));
        assert_eq!(Slot::new(SlotKind::Union("Expression")).width(), None);
    }

    #[test]
    fn optional_vec_keeps_both_levels() {
        let slot = Slot::new(SlotKind::Record("Directive"))
            .sequence(72)
            .optional(Sentinel::NullPointer { offset: 0 });
        assert!(slot.is_optional());
        assert_eq!(slot.element_sentinel, None);
    }
}
