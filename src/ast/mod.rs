//! Purpose: Typed lazy views over every record in a transfer buffer.
//! Exports: Node views (`js`, `jsx`, `ts`), unions, scalar enums, root/module/diagnostic records,
//! `NodeType`, `AnyNode`, and the layout table (`layout`, `catalog`).
//! Role: Sits between the primitive decoders in `core::raw` and callers or the walker.
//! Invariants: Constructing a view decodes nothing; each field decodes at most once.
//! Invariants: Every declared offset and discriminant also appears in the layout table.

#[macro_use]
mod macros;

pub mod catalog;
pub mod codec;
pub mod enums;
pub mod js;
pub mod jsx;
pub mod layout;
pub mod module_record;
mod node_type;
pub mod root;
pub mod ts;
pub mod unions;

use serde::Serialize;

use crate::core::error::Error;

pub use codec::{SnapshotOptions, ToRecord, View};
pub use enums::*;
pub use js::*;
pub use jsx::*;
pub use module_record::*;
pub use node_type::{AnyNode, BITMAP_WORDS, NodeType};
pub use root::*;
pub use ts::*;
pub use unions::*;

/// Source range in UTF-8 byte offsets.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slices `source`; `None` when the range is out of bounds or splits a character.
    pub fn source_text<'s>(&self, source: &'s str) -> Option<&'s str> {
        source.get(self.start as usize..self.end as usize)
    }
}

pub(crate) fn union_mismatch(name: &'static str, discriminant: u8, pos: u32) -> Error {
    tracing::trace!(union = name, discriminant, pos, "unexpected discriminant");
    Error::unexpected_discriminant(name, discriminant).with_offset(pos as u64)
}
