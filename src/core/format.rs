//! Purpose: Centralize the raw-transfer buffer geometry shared by readers and writers.
//! Exports: Slot widths and sub-offsets, metadata placement, buffer size limits.
//! Role: Single home for byte-level constants; node field offsets live with the views.
//! Invariants: Values must match the producer's layout version exactly.
//! Invariants: All offsets fit in u32; buffers never exceed `MAX_BUFFER_SIZE`.

use crate::core::error::{Error, ErrorKind};

/// Bumped whenever a slot shape, sentinel, or field offset changes.
pub const LAYOUT_VERSION: u32 = 1;

/// Default reservation: large enough that every offset fits in 32 bits.
pub const DEFAULT_BUFFER_SIZE: usize = 1 << 31;
pub const MIN_BUFFER_SIZE: usize = 64;
pub const MAX_BUFFER_SIZE: usize = 1 << 32;
pub const BUFFER_ALIGN: usize = 16;

/// The metadata pointer sits this many bytes before the end of the buffer.
pub const METADATA_FROM_END: usize = 16;

pub const STR_SIZE: u32 = 16;
pub const STR_PTR: u32 = 0;
pub const STR_LEN: u32 = 8;

pub const VEC_SIZE: u32 = 24;
pub const VEC_PTR: u32 = 0;
pub const VEC_LEN: u32 = 8;
pub const VEC_CAP: u32 = 16;

pub const BOX_SIZE: u32 = 8;

pub const UNION_SIZE: u32 = 16;
pub const UNION_PAYLOAD: u32 = 8;

/// Span records: `start` and `end` as u32.
pub const SPAN_START: u32 = 0;
pub const SPAN_END: u32 = 4;

/// Strings at or below this many bytes are checked with a plain ASCII loop before any
/// UTF-8 validation call.
pub const SHORT_STRING_LEN: usize = 50;

/// Offset of the root metadata slot for a buffer of `len` bytes.
pub fn metadata_pos(len: usize) -> Result<u32, Error> {
    check_buffer_size(len)?;
    Ok((len - METADATA_FROM_END) as u32)
}

pub fn check_buffer_size(len: usize) -> Result<(), Error> {
    if len < MIN_BUFFER_SIZE {
        return Err(Error::new(ErrorKind::Usage).with_message(format!(
            "buffer of {len} bytes is smaller than the {MIN_BUFFER_SIZE} byte minimum"
        )));
    }
    if len > MAX_BUFFER_SIZE {
        return Err(Error::new(ErrorKind::Usage)
            .with_message(format!("buffer of {len} bytes does not fit 32-bit offsets")));
    }
    if len % BUFFER_ALIGN != 0 {
        return Err(Error::new(ErrorKind::Usage).with_message(format!(
            "buffer size {len} is not a multiple of {BUFFER_ALIGN}"
        )));
    }
    Ok(())
}

pub const fn align_up(value: u32, align: u32) -> u32 {
    (value + align - 1) & !(align - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_sits_sixteen_bytes_before_end() {
        assert_eq!(metadata_pos(1024).expect("pos"), 1008);
        assert_eq!(
            metadata_pos(DEFAULT_BUFFER_SIZE).expect("pos") as usize,
            DEFAULT_BUFFER_SIZE - 16
        );
    }

    #[test]
    fn rejects_unusable_buffer_sizes() {
        for len in [0, 32, 1000, MAX_BUFFER_SIZE + 16] {
            let err = check_buffer_size(len).expect_err("size should be rejected");
            assert_eq!(err.kind(), ErrorKind::Usage);
        }
    }

    #[test]
    fn align_up_rounds_to_power_of_two() {
        assert_eq!(align_up(0, 8), 0);
        assert_eq!(align_up(1, 8), 8);
        assert_eq!(align_up(12, 4), 12);
        assert_eq!(align_up(13, 8), 16);
    }
}
