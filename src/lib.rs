//! Purpose: Lazy, zero-copy decoding of raw-transfer syntax tree buffers.
//! Exports: `api` (stable surface), `ast` (views and layout table), `core` (buffers,
//! primitive decoders, pool, errors), `traverse` (eager visitor).
//! Role: Library behind the `rawtree` CLI; callers normally go through `api`.
//! Invariants: Decoding never mutates the buffer and never reads outside it.
//! Invariants: Views borrow their transfer, so none survive `RawTransfer::dispose`.
pub mod api;
pub mod ast;
pub mod core;
mod fixture;
pub mod traverse;
