//! Purpose: Own one decoded transfer buffer and provide the primitive field decoders.
//! Exports: `Storage`, `RawTransfer`, `decode`.
//! Role: Every view reads through `RawTransfer`; nothing else touches raw bytes.
//! Invariants: All reads are bounds-checked and return `Result`; no read panics.
//! Invariants: Offset arithmetic goes through `locate`, so corrupt pointers never wrap.
//! Invariants: The buffer is never mutated after `decode`; `RawTransfer` is `Sync`.
//! Invariants: Views borrow the `RawTransfer`, so none can outlive `dispose`.

use bstr::ByteSlice;
use memmap2::Mmap;

use crate::core::error::{Error, ErrorKind};
use crate::core::format::{SHORT_STRING_LEN, STR_LEN, STR_PTR, metadata_pos};
use crate::core::pool::BufferHandle;

/// Backing bytes for a transfer.
pub enum Storage {
    Pooled(BufferHandle),
    Mapped(Mmap),
    Owned(Box<[u8]>),
}

impl Storage {
    pub fn as_slice(&self) -> &[u8] {
        match self {
            Storage::Pooled(handle) => handle.bytes(),
            Storage::Mapped(map) => map,
            Storage::Owned(bytes) => bytes,
        }
    }

    fn release(self) {
        if let Storage::Pooled(handle) = self {
            handle.dispose();
        }
    }
}

impl From<BufferHandle> for Storage {
    fn from(handle: BufferHandle) -> Self {
        Storage::Pooled(handle)
    }
}

impl From<Mmap> for Storage {
    fn from(map: Mmap) -> Self {
        Storage::Mapped(map)
    }
}

impl From<Box<[u8]>> for Storage {
    fn from(bytes: Box<[u8]>) -> Self {
        Storage::Owned(bytes)
    }
}

impl From<Vec<u8>> for Storage {
    fn from(bytes: Vec<u8>) -> Self {
        Storage::Owned(bytes.into_boxed_slice())
    }
}

/// A completed transfer buffer plus the source text it was produced from.
pub struct RawTransfer {
    storage: Storage,
    source: String,
    source_is_ascii: bool,
    data_pos: u32,
}

/// Wraps a filled buffer and locates its root record.
pub fn decode(storage: impl Into<Storage>, source: impl Into<String>) -> Result<RawTransfer, Error> {
    RawTransfer::new(storage.into(), source.into())
}

impl RawTransfer {
    pub fn new(storage: Storage, source: String) -> Result<Self, Error> {
        let len = storage.as_slice().len();
        let meta = metadata_pos(len)?;
        if source.len() > meta as usize {
            return Err(Error::new(ErrorKind::Usage).with_message(format!(
                "source text of {} bytes does not fit a {len} byte buffer",
                source.len()
            )));
        }
        let source_is_ascii = source.is_ascii();
        let mut transfer = Self {
            storage,
            source,
            source_is_ascii,
            data_pos: 0,
        };
        let data_pos = transfer.read_u32(meta)?;
        if data_pos >= meta {
            return Err(Error::out_of_bounds(data_pos as u64, 0, len)
                .with_message(format!("root pointer {data_pos} is past the metadata slot at {meta}")));
        }
        transfer.data_pos = data_pos;
        tracing::debug!(
            data_pos = transfer.data_pos,
            buffer_len = len,
            source_len = transfer.source.len(),
            source_is_ascii,
            "decoded transfer metadata"
        );
        Ok(transfer)
    }

    /// Offset of the root `RawTransferData` record.
    pub fn data_pos(&self) -> u32 {
        self.data_pos
    }

    pub fn bytes(&self) -> &[u8] {
        self.storage.as_slice()
    }

    pub fn source_text(&self) -> &str {
        &self.source
    }

    pub fn source_len(&self) -> u32 {
        self.source.len() as u32
    }

    pub fn source_is_ascii(&self) -> bool {
        self.source_is_ascii
    }

    /// Returns pooled storage to its pool. Borrowed views make later reads impossible.
    pub fn dispose(self) {
        tracing::debug!(data_pos = self.data_pos, "disposing transfer");
        self.storage.release();
    }

    /// Offset `offset` bytes past `pos`. Sums beyond 32 bits are `Bounds` errors.
    #[inline]
    pub fn locate(&self, pos: u32, offset: u32) -> Result<u32, Error> {
        pos.checked_add(offset).ok_or_else(|| {
            Error::out_of_bounds(pos as u64 + offset as u64, 0, self.bytes().len())
                .with_message(format!("offset {offset} past {pos} overflows 32 bits"))
        })
    }

    fn slice(&self, pos: u32, width: u32) -> Result<&[u8], Error> {
        let bytes = self.bytes();
        #[cfg(test)]
        tally::count_read();
        let start = pos as usize;
        start
            .checked_add(width as usize)
            .and_then(|end| bytes.get(start..end))
            .ok_or_else(|| Error::out_of_bounds(pos as u64, width as u64, bytes.len()))
    }

    fn array<const N: usize>(&self, pos: u32) -> Result<[u8; N], Error> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.slice(pos, N as u32)?);
        Ok(out)
    }

    pub fn read_u8(&self, pos: u32) -> Result<u8, Error> {
        Ok(self.slice(pos, 1)?[0])
    }

    pub fn read_bool(&self, pos: u32) -> Result<bool, Error> {
        Ok(self.read_u8(pos)? == 1)
    }

    pub fn read_u32(&self, pos: u32) -> Result<u32, Error> {
        self.array::<4>(pos).map(u32::from_le_bytes)
    }

    pub fn read_u64(&self, pos: u32) -> Result<u64, Error> {
        self.array::<8>(pos).map(u64::from_le_bytes)
    }

    pub fn read_f64(&self, pos: u32) -> Result<f64, Error> {
        self.array::<8>(pos).map(f64::from_le_bytes)
    }

    /// Reads `N` consecutive u32 values, e.g. a `(start, end)` pair.
    pub fn read_tuple<const N: usize>(&self, pos: u32) -> Result<[u32; N], Error> {
        let bytes = self.slice(pos, 4 * N as u32)?;
        let mut out = [0u32; N];
        for (slot, chunk) in out.iter_mut().zip(bytes.chunks_exact(4)) {
            let mut word = [0u8; 4];
            word.copy_from_slice(chunk);
            *slot = u32::from_le_bytes(word);
        }
        Ok(out)
    }

    /// Reads a 64-bit pointer slot. Offsets fit in the low word and must land inside the
    /// buffer.
    pub fn read_ptr(&self, pos: u32) -> Result<u32, Error> {
        let ptr = self.read_u32(pos)?;
        let len = self.bytes().len();
        if ptr as usize >= len {
            return Err(Error::out_of_bounds(ptr as u64, 0, len)
                .with_message(format!("pointer {ptr} at {pos} is outside the buffer")));
        }
        Ok(ptr)
    }

    /// Checks that `count` records of `stride` bytes starting at `ptr` fit the buffer.
    pub fn check_run(&self, ptr: u32, count: u32, stride: u32) -> Result<(), Error> {
        let len = self.bytes().len() as u64;
        let end = ptr as u64 + count as u64 * stride as u64;
        if end > len {
            return Err(Error::out_of_bounds(ptr as u64, end - ptr as u64, len as usize));
        }
        Ok(())
    }

    /// True when both words of a pointer-shaped slot are zero.
    pub fn is_null(&self, pos: u32) -> Result<bool, Error> {
        Ok(self.read_u64(pos)? == 0)
    }

    /// Reads a string slot.
    ///
    /// Pure-ASCII sources are served straight from the cached text when the bytes lie in
    /// the copy of the source at the start of the buffer. Other strings are validated as
    /// UTF-8 in place; nothing is copied either way.
    pub fn read_str(&self, pos: u32) -> Result<&str, Error> {
        let len = self.read_u32(self.locate(pos, STR_LEN)?)?;
        if len == 0 {
            return Ok("");
        }
        let ptr = self.read_u32(self.locate(pos, STR_PTR)?)?;
        if self.source_is_ascii && ptr < self.source_len() {
            let start = ptr as usize;
            if let Some(text) = self.source.get(start..start + len as usize) {
                return Ok(text);
            }
        }
        let bytes = self.slice(ptr, len)?;
        decode_utf8(bytes, ptr)
    }
}

fn decode_utf8(bytes: &[u8], ptr: u32) -> Result<&str, Error> {
    if bytes.len() <= SHORT_STRING_LEN {
        let mut ascii = true;
        for &byte in bytes {
            if byte >= 0x80 {
                ascii = false;
                break;
            }
        }
        if ascii {
            // SAFETY: every byte is below 0x80, and ASCII is valid UTF-8.
            return Ok(unsafe { std::str::from_utf8_unchecked(bytes) });
        }
    }
    std::str::from_utf8(bytes).map_err(|err| {
        tracing::trace!(ptr, len = bytes.len(), "invalid UTF-8 in string slot");
        Error::new(ErrorKind::Utf8)
            .with_message(format!(
                "invalid UTF-8 in string: {:?}",
                bytes.to_str_lossy()
            ))
            .with_offset(ptr as u64 + err.valid_up_to() as u64)
            .with_source(err)
    })
}

impl std::fmt::Debug for RawTransfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawTransfer")
            .field("buffer_len", &self.bytes().len())
            .field("source_len", &self.source.len())
            .field("data_pos", &self.data_pos)
            .finish()
    }
}

/// Test-only counters for primitive reads and view constructions.
#[cfg(test)]
pub(crate) mod tally {
    use std::cell::Cell;

    thread_local! {
        static READS: Cell<usize> = const { Cell::new(0) };
        static VIEWS: Cell<usize> = const { Cell::new(0) };
    }

    pub(crate) fn count_read() {
        READS.with(|reads| reads.set(reads.get() + 1));
    }

    pub(crate) fn count_view() {
        VIEWS.with(|views| views.set(views.get() + 1));
    }

    pub(crate) fn reads() -> usize {
        READS.with(Cell::get)
    }

    pub(crate) fn views() -> usize {
        VIEWS.with(Cell::get)
    }

    pub(crate) fn reset() {
        READS.with(|reads| reads.set(0));
        VIEWS.with(|views| views.set(0));
    }
}

#[cfg(test)]
mod tests {
    use super::{RawTransfer, Storage, decode, tally};
    use crate::core::error::ErrorKind;
    use crate::core::writer::BufferWriter;

    fn transfer_with(source: &str, fill: impl FnOnce(&mut BufferWriter<'_>) -> u32) -> RawTransfer {
        let mut bytes = vec![0u8; 1024];
        let mut writer = BufferWriter::new(&mut bytes, source).expect("writer");
        let root = fill(&mut writer);
        writer.finish(root).expect("finish");
        decode(bytes, source).expect("decode")
    }

    #[test]
    fn reads_fixed_width_scalars() {
        let transfer = transfer_with("", |w| {
            let pos = w.alloc(32).expect("alloc");
            w.put_u8(pos, 7).expect("u8");
            w.put_bool(pos + 1, true).expect("bool");
            w.put_u32(pos + 4, 0xDEAD_BEEF).expect("u32");
            w.put_u64(pos + 8, (3u64 << 32) | 5).expect("u64");
            w.put_f64(pos + 16, 1.5).expect("f64");
            w.put_span(pos + 24, 10, 20).expect("span");
            pos
        });
        let pos = transfer.data_pos();
        assert_eq!(transfer.read_u8(pos).expect("u8"), 7);
        assert!(transfer.read_bool(pos + 1).expect("bool"));
        assert!(!transfer.read_bool(pos + 2).expect("bool"));
        assert_eq!(transfer.read_u32(pos + 4).expect("u32"), 0xDEAD_BEEF);
        assert_eq!(transfer.read_u64(pos + 8).expect("u64"), (3u64 << 32) | 5);
        assert_eq!(transfer.read_f64(pos + 16).expect("f64"), 1.5);
        assert_eq!(transfer.read_tuple::<2>(pos + 24).expect("tuple"), [10, 20]);
    }

    #[test]
    fn ascii_source_strings_come_from_source_text() {
        let source = "let answer = 42;";
        let transfer = transfer_with(source, |w| {
            let pos = w.alloc(16).expect("alloc");
            w.put_source_str(pos, 4, 6).expect("str");
            pos
        });
        let text = transfer.read_str(transfer.data_pos()).expect("str");
        assert_eq!(text, "answer");
        assert_eq!(text.as_ptr(), transfer.source_text()[4..].as_ptr());
    }

    #[test]
    fn strings_outside_source_are_decoded_in_place() {
        let long = "é".repeat(40);
        let transfer = transfer_with("x", |w| {
            let pos = w.alloc(48).expect("alloc");
            w.put_str(pos, "héllo").expect("short");
            w.put_str(pos + 16, &long).expect("long");
            w.put_str(pos + 32, "").expect("empty");
            pos
        });
        let pos = transfer.data_pos();
        assert_eq!(transfer.read_str(pos).expect("short"), "héllo");
        assert_eq!(transfer.read_str(pos + 16).expect("long"), long);
        assert_eq!(transfer.read_str(pos + 32).expect("empty"), "");
    }

    #[test]
    fn empty_string_does_not_read_pointer() {
        let transfer = transfer_with("", |w| {
            let pos = w.alloc(16).expect("alloc");
            // Garbage pointer with zero length.
            w.put_u32(pos, u32::MAX).expect("ptr");
            pos
        });
        assert_eq!(transfer.read_str(transfer.data_pos()).expect("str"), "");
    }

    #[test]
    fn invalid_utf8_is_a_catchable_error() {
        let transfer = transfer_with("", |w| {
            let pos = w.alloc(16).expect("alloc");
            let bytes = w.put_bytes(&[b'a', 0xFF, 0xFE]).expect("bytes");
            w.put_u32(pos, bytes).expect("ptr");
            w.put_u32(pos + 8, 3).expect("len");
            pos
        });
        let err = transfer.read_str(transfer.data_pos()).expect_err("utf8");
        assert_eq!(err.kind(), ErrorKind::Utf8);
        assert!(err.offset().is_some());
    }

    #[test]
    fn reads_past_end_are_bounds_errors() {
        let transfer = transfer_with("", |w| w.alloc(8).expect("alloc"));
        let err = transfer.read_u64(1020).expect_err("bounds");
        assert_eq!(err.kind(), ErrorKind::Bounds);
        assert_eq!(err.offset(), Some(1020));
    }

    #[test]
    fn rejects_oversized_source() {
        let bytes = vec![0u8; 64];
        let source = "x".repeat(60);
        let err = RawTransfer::new(Storage::from(bytes), source).expect_err("too long");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn root_pointer_past_metadata_is_rejected() {
        let mut bytes = vec![0u8; 1024];
        bytes[1008..1012].copy_from_slice(&u32::MAX.to_le_bytes());
        let err = decode(bytes, "").expect_err("root pointer");
        assert_eq!(err.kind(), ErrorKind::Bounds);
        assert_eq!(err.offset(), Some(u32::MAX as u64));
    }

    #[test]
    fn offsets_near_u32_max_are_bounds_errors() {
        let transfer = transfer_with("", |w| w.alloc(8).expect("alloc"));
        let err = transfer.locate(u32::MAX - 4, 8).expect_err("overflow");
        assert_eq!(err.kind(), ErrorKind::Bounds);
        assert_eq!(transfer.locate(16, 8).expect("in range"), 24);
        let err = transfer.read_str(u32::MAX - 4).expect_err("str slot");
        assert_eq!(err.kind(), ErrorKind::Bounds);
        let err = transfer.read_u64(u32::MAX).expect_err("u64");
        assert_eq!(err.kind(), ErrorKind::Bounds);
    }

    #[test]
    fn tally_counts_primitive_reads() {
        let transfer = transfer_with("", |w| w.alloc(8).expect("alloc"));
        tally::reset();
        transfer.read_u32(transfer.data_pos()).expect("u32");
        transfer.read_u8(transfer.data_pos()).expect("u8");
        assert_eq!(tally::reads(), 2);
    }
}
