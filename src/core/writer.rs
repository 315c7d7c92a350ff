//! Purpose: Lay out records the way the producer does, for fixtures and tests.
//! Exports: `BufferWriter`.
//! Role: Mirror of the producer side of the transfer format; decoders never use it.
//! Invariants: Source bytes occupy offset 0..source_len; records follow, 8-byte aligned.
//! Invariants: Every allocation is zero-filled, so reused pool buffers write deterministically.
//! Invariants: Allocation never reaches the metadata slot at `len - 16`.

use crate::core::error::{Error, ErrorKind};
use crate::core::format::{
    STR_LEN, STR_PTR, UNION_PAYLOAD, VEC_CAP, VEC_LEN, VEC_PTR, align_up, metadata_pos,
};

/// Bump allocator over a transfer buffer.
pub struct BufferWriter<'b> {
    bytes: &'b mut [u8],
    source_len: u32,
    cursor: u32,
    limit: u32,
}

impl<'b> BufferWriter<'b> {
    /// Copies `source` to the start of the buffer and positions the cursor after it.
    pub fn new(bytes: &'b mut [u8], source: &str) -> Result<Self, Error> {
        let limit = metadata_pos(bytes.len())?;
        if source.len() > limit as usize {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("source text does not fit the buffer"));
        }
        bytes[..source.len()].copy_from_slice(source.as_bytes());
        let source_len = source.len() as u32;
        Ok(Self {
            bytes,
            source_len,
            cursor: align_up(source_len, 8),
            limit,
        })
    }

    pub fn source_len(&self) -> u32 {
        self.source_len
    }

    /// Bytes used so far, source text included.
    pub fn used(&self) -> u32 {
        self.cursor
    }

    /// Reserves `size` zeroed bytes and returns their offset.
    pub fn alloc(&mut self, size: u32) -> Result<u32, Error> {
        let pos = align_up(self.cursor, 8);
        let end = pos as u64 + size as u64;
        if end > self.limit as u64 {
            return Err(Error::new(ErrorKind::Bounds)
                .with_message(format!("allocation of {size} bytes overflows the buffer"))
                .with_offset(pos as u64));
        }
        let end = end as u32;
        self.bytes[pos as usize..end as usize].fill(0);
        self.cursor = end;
        Ok(pos)
    }

    fn span_mut(&mut self, pos: u32, width: usize) -> Result<&mut [u8], Error> {
        let len = self.bytes.len();
        let start = pos as usize;
        self.bytes
            .get_mut(start..start + width)
            .ok_or_else(|| Error::out_of_bounds(pos as u64, width as u64, len))
    }

    pub fn put_u8(&mut self, pos: u32, value: u8) -> Result<(), Error> {
        self.span_mut(pos, 1)?[0] = value;
        Ok(())
    }

    pub fn put_bool(&mut self, pos: u32, value: bool) -> Result<(), Error> {
        self.put_u8(pos, u8::from(value))
    }

    pub fn put_u32(&mut self, pos: u32, value: u32) -> Result<(), Error> {
        self.span_mut(pos, 4)?.copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    pub fn put_u64(&mut self, pos: u32, value: u64) -> Result<(), Error> {
        self.span_mut(pos, 8)?.copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    pub fn put_f64(&mut self, pos: u32, value: f64) -> Result<(), Error> {
        self.span_mut(pos, 8)?.copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    pub fn put_span(&mut self, pos: u32, start: u32, end: u32) -> Result<(), Error> {
        self.put_u32(pos, start)?;
        self.put_u32(pos + 4, end)
    }

    /// Copies raw bytes into the arena and returns their offset.
    pub fn put_bytes(&mut self, data: &[u8]) -> Result<u32, Error> {
        let pos = self.alloc(data.len() as u32)?;
        self.bytes[pos as usize..pos as usize + data.len()].copy_from_slice(data);
        Ok(pos)
    }

    /// Writes a string slot whose bytes are copied into the arena.
    pub fn put_str(&mut self, pos: u32, text: &str) -> Result<(), Error> {
        if text.is_empty() {
            return self.put_str_slot(pos, 1, 0);
        }
        let ptr = self.put_bytes(text.as_bytes())?;
        self.put_str_slot(pos, ptr, text.len() as u32)
    }

    /// Writes a string slot pointing into the source text copy.
    pub fn put_source_str(&mut self, pos: u32, start: u32, len: u32) -> Result<(), Error> {
        if start + len > self.source_len {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("source string range exceeds the source text"));
        }
        self.put_str_slot(pos, start, len)
    }

    fn put_str_slot(&mut self, pos: u32, ptr: u32, len: u32) -> Result<(), Error> {
        self.put_u64(pos + STR_PTR, ptr as u64)?;
        self.put_u64(pos + STR_LEN, len as u64)
    }

    pub fn put_ptr(&mut self, pos: u32, target: u32) -> Result<(), Error> {
        self.put_u64(pos, target as u64)
    }

    /// Writes a boxed union slot: discriminant, then pointer to the payload record.
    pub fn put_union(&mut self, pos: u32, discriminant: u8, target: u32) -> Result<(), Error> {
        self.put_u8(pos, discriminant)?;
        self.put_ptr(pos + UNION_PAYLOAD, target)
    }

    /// Writes only the discriminant, for inline payloads and reserved "none" values.
    pub fn put_tag(&mut self, pos: u32, discriminant: u8) -> Result<(), Error> {
        self.put_u8(pos, discriminant)
    }

    pub fn put_vec(&mut self, pos: u32, ptr: u32, len: u32) -> Result<(), Error> {
        self.put_u64(pos + VEC_PTR, ptr as u64)?;
        self.put_u64(pos + VEC_LEN, len as u64)?;
        self.put_u64(pos + VEC_CAP, len as u64)
    }

    /// Allocates `len` zeroed elements and writes the vec slot; returns the first element.
    ///
    /// Empty vecs get a dangling non-null pointer, like an unallocated Rust `Vec`.
    pub fn alloc_vec(&mut self, pos: u32, stride: u32, len: u32) -> Result<u32, Error> {
        if len == 0 {
            self.put_vec(pos, 8, 0)?;
            return Ok(8);
        }
        let ptr = self.alloc(stride * len)?;
        self.put_vec(pos, ptr, len)?;
        Ok(ptr)
    }

    /// Points the metadata slot at the root record.
    pub fn finish(self, root: u32) -> Result<(), Error> {
        let meta = self.limit;
        tracing::debug!(root, used = self.cursor, "finished transfer buffer");
        self.bytes[meta as usize..meta as usize + 4].copy_from_slice(&root.to_le_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::BufferWriter;
    use crate::core::error::ErrorKind;

    #[test]
    fn source_is_copied_and_records_follow_aligned() {
        let mut bytes = vec![0xAAu8; 256];
        let mut writer = BufferWriter::new(&mut bytes, "abc").expect("writer");
        let pos = writer.alloc(4).expect("alloc");
        assert_eq!(pos, 8);
        assert_eq!(writer.alloc(1).expect("alloc"), 16);
        writer.finish(pos).expect("finish");
        assert_eq!(&bytes[..3], b"abc");
        assert_eq!(&bytes[8..12], &[0, 0, 0, 0]);
        assert_eq!(&bytes[240..244], &8u32.to_le_bytes());
    }

    #[test]
    fn allocation_stops_before_metadata() {
        let mut bytes = vec![0u8; 64];
        let mut writer = BufferWriter::new(&mut bytes, "").expect("writer");
        writer.alloc(48).expect("fits");
        let err = writer.alloc(1).expect_err("overflow");
        assert_eq!(err.kind(), ErrorKind::Bounds);
    }

    #[test]
    fn empty_vec_gets_dangling_pointer() {
        let mut bytes = vec![0u8; 128];
        let mut writer = BufferWriter::new(&mut bytes, "").expect("writer");
        let slot = writer.alloc(24).expect("alloc");
        writer.alloc_vec(slot, 16, 0).expect("vec");
        assert_eq!(&bytes[0..8], &8u64.to_le_bytes());
        assert_eq!(&bytes[8..16], &0u64.to_le_bytes());
    }
}
