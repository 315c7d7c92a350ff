//! Purpose: Define the stable public Rust API boundary for rawtree.
//! Exports: `decode`, the transfer handle, buffer pool, views, visitor, and errors.
//! Role: Public, additive-only surface used by the CLI and integration tests.
//! Invariants: Every view returned through this module borrows its `RawTransfer`.
//! Invariants: Layout internals are reachable only through `layout` and `catalog`.

use std::fs::File;
use std::path::Path;

use fs2::FileExt;
use memmap2::Mmap;

pub use crate::ast::catalog::{self, LayoutEntry, LayoutTable};
pub use crate::ast::layout;
pub use crate::ast::*;
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::format::{DEFAULT_BUFFER_SIZE, LAYOUT_VERSION};
pub use crate::core::pool::{BufferHandle, BufferPool, PoolOptions};
pub use crate::core::raw::{RawTransfer, Storage, decode};
pub use crate::core::writer::BufferWriter;
pub use crate::fixture::{const_program_source, write_const_program};
pub use crate::traverse::{Callback, Hooks, Visitor, traverse};

/// Shared lock on a mapped buffer file, released on drop.
#[derive(Debug)]
pub struct BufferLock {
    file: File,
}

impl Drop for BufferLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// Maps a buffer file and decodes it against `source`.
///
/// Keep the returned lock alive as long as the transfer: a concurrent `sample --out` waits
/// on it before rewriting the file.
pub fn decode_file(
    path: &Path,
    source: impl Into<String>,
) -> Result<(RawTransfer, BufferLock), Error> {
    let file = File::open(path).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to open buffer file")
            .with_path(path)
            .with_source(err)
    })?;
    FileExt::lock_shared(&file).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to lock buffer file")
            .with_path(path)
            .with_source(err)
    })?;
    let lock = BufferLock { file };
    // SAFETY: the shared lock excludes cooperating writers; the map is read-only.
    let map = unsafe { Mmap::map(&lock.file) }.map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to map buffer file")
            .with_path(path)
            .with_source(err)
    })?;
    let transfer = decode(map, source).map_err(|err| err.with_path(path))?;
    tracing::debug!(path = %path.display(), "mapped buffer file");
    Ok((transfer, lock))
}
