//! Purpose: Eager depth-first traversal with per-node-type enter/exit callbacks.
//! Exports: `Visitor`, `Hooks`, `Callback`, `traverse`.
//! Role: The walk itself lives in the generated `walk_at` functions; this module owns the
//! registration bitmaps they consult.
//! Invariants: A view is constructed only for node types with a registered callback.
//! Invariants: Callback errors propagate out of `traverse` unchanged and stop the walk.

use crate::ast::js::Program;
use crate::ast::{AnyNode, NodeType};
use crate::core::error::Error;

pub use crate::ast::BITMAP_WORDS;

/// A visitor callback. Returning `Err` abandons the traversal.
pub type Callback<'a> = Box<dyn FnMut(&AnyNode<'a>) -> Result<(), Error> + 'a>;

/// An optional enter/exit pair for one node type.
#[derive(Default)]
pub struct Hooks<'a> {
    enter: Option<Callback<'a>>,
    exit: Option<Callback<'a>>,
}

impl<'a> Hooks<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(mut self, f: impl FnMut(&AnyNode<'a>) -> Result<(), Error> + 'a) -> Self {
        self.enter = Some(Box::new(f));
        self
    }

    pub fn exit(mut self, f: impl FnMut(&AnyNode<'a>) -> Result<(), Error> + 'a) -> Self {
        self.exit = Some(Box::new(f));
        self
    }
}

type Bitmap = [u32; BITMAP_WORDS];

fn set_bit(bitmap: &mut Bitmap, node_type: NodeType) {
    let id = node_type.id();
    bitmap[id >> 5] |= 1 << (id & 31);
}

fn has_bit(bitmap: &Bitmap, node_type: NodeType) -> bool {
    let id = node_type.id();
    bitmap[id >> 5] & (1 << (id & 31)) != 0
}

/// Compiled visitor registration: one bit per node type in each of the enter and exit
/// bitmaps, plus the callbacks indexed by node-type id.
pub struct Visitor<'a> {
    enter_bits: Bitmap,
    exit_bits: Bitmap,
    enter: Vec<Option<Callback<'a>>>,
    exit: Vec<Option<Callback<'a>>>,
}

impl<'a> Default for Visitor<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Visitor<'a> {
    pub fn new() -> Self {
        Self {
            enter_bits: [0; BITMAP_WORDS],
            exit_bits: [0; BITMAP_WORDS],
            enter: (0..NodeType::COUNT).map(|_| None).collect(),
            exit: (0..NodeType::COUNT).map(|_| None).collect(),
        }
    }

    /// Builds a visitor from `(node type name, hooks)` pairs.
    pub fn from_hooks<I, S>(hooks: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (S, Hooks<'a>)>,
        S: AsRef<str>,
    {
        let mut visitor = Self::new();
        for (name, pair) in hooks {
            visitor.on(name.as_ref(), pair)?;
        }
        Ok(visitor)
    }

    /// Registers the hooks for a node type by name. Unknown names are usage errors.
    pub fn on(&mut self, name: &str, hooks: Hooks<'a>) -> Result<&mut Self, Error> {
        let node_type: NodeType = name.parse()?;
        if let Some(f) = hooks.enter {
            self.set_enter(node_type, f);
        }
        if let Some(f) = hooks.exit {
            self.set_exit(node_type, f);
        }
        Ok(self)
    }

    /// Registers a pre-order callback, replacing any earlier one for `node_type`.
    pub fn on_enter(
        &mut self,
        node_type: NodeType,
        f: impl FnMut(&AnyNode<'a>) -> Result<(), Error> + 'a,
    ) -> &mut Self {
        self.set_enter(node_type, Box::new(f));
        self
    }

    /// Registers a post-order callback, replacing any earlier one for `node_type`.
    pub fn on_exit(
        &mut self,
        node_type: NodeType,
        f: impl FnMut(&AnyNode<'a>) -> Result<(), Error> + 'a,
    ) -> &mut Self {
        self.set_exit(node_type, Box::new(f));
        self
    }

    fn set_enter(&mut self, node_type: NodeType, f: Callback<'a>) {
        set_bit(&mut self.enter_bits, node_type);
        self.enter[node_type.id()] = Some(f);
    }

    fn set_exit(&mut self, node_type: NodeType, f: Callback<'a>) {
        set_bit(&mut self.exit_bits, node_type);
        self.exit[node_type.id()] = Some(f);
    }

    /// True when either callback is registered for `node_type`.
    #[inline]
    pub fn wants(&self, node_type: NodeType) -> bool {
        has_bit(&self.enter_bits, node_type) || has_bit(&self.exit_bits, node_type)
    }

    pub fn is_empty(&self) -> bool {
        self.enter_bits.iter().chain(self.exit_bits.iter()).all(|word| *word == 0)
    }

    /// Node types with at least one callback, in id order.
    pub fn registered(&self) -> Vec<NodeType> {
        NodeType::ALL
            .iter()
            .copied()
            .filter(|node_type| self.wants(*node_type))
            .collect()
    }

    pub(crate) fn enter(&mut self, node: &AnyNode<'a>) -> Result<(), Error> {
        match self.enter.get_mut(node.node_type().id()) {
            Some(Some(f)) => f(node),
            _ => Ok(()),
        }
    }

    pub(crate) fn exit(&mut self, node: &AnyNode<'a>) -> Result<(), Error> {
        match self.exit.get_mut(node.node_type().id()) {
            Some(Some(f)) => f(node),
            _ => Ok(()),
        }
    }
}

impl std::fmt::Debug for Visitor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Visitor")
            .field("enter_bits", &self.enter_bits)
            .field("exit_bits", &self.exit_bits)
            .finish()
    }
}

/// Walks `program` depth-first, calling enter before and exit after each registered
/// node's children. Unregistered nodes are still descended into.
pub fn traverse<'a>(program: &Program<'a>, visitor: &mut Visitor<'a>) -> Result<(), Error> {
    if visitor.is_empty() {
        return Ok(());
    }
    tracing::debug!(
        registered = visitor.registered().len(),
        pos = program.pos(),
        "traversing program"
    );
    Program::walk_at(program.transfer(), program.pos(), visitor)
}
