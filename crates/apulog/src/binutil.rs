//! Little-endian byte readers and writers used by the trace codec.
use crate::error::FormatError;

fn out_of_range(
    bytes: &[u8],
    off: usize,
    needed: usize,
    context: &'static str,
) -> FormatError {
    FormatError::OffsetOutOfRange {
        offset: off,
        needed,
        available: bytes.len().saturating_sub(off),
        context,
    }
}

/// Read a 32-bit little-endian unsigned integer from `bytes` at `off`.
///
/// `context` names the header field or command being read and is carried in
/// the error when the buffer is too short.
pub fn read_u32_le_at(bytes: &[u8], off: usize, context: &'static str) -> Result<u32, FormatError> {
    let slice = read_slice(bytes, off, 4, context)?;
    let mut tmp: [u8; 4] = [0; 4];
    tmp.copy_from_slice(slice);
    Ok(u32::from_le_bytes(tmp))
}

/// Read a 16-bit little-endian unsigned integer from `bytes` at `off`.
pub fn read_u16_le_at(bytes: &[u8], off: usize, context: &'static str) -> Result<u16, FormatError> {
    let slice = read_slice(bytes, off, 2, context)?;
    Ok(u16::from_le_bytes([slice[0], slice[1]]))
}

/// Read a single byte from `bytes` at `off`.
pub fn read_u8_at(bytes: &[u8], off: usize, context: &'static str) -> Result<u8, FormatError> {
    bytes
        .get(off)
        .copied()
        .ok_or_else(|| out_of_range(bytes, off, 1, context))
}

/// Return a borrowed slice of length `len` starting at `off` from `bytes`.
///
/// Returns `Err(FormatError::OffsetOutOfRange)` when the requested range
/// exceeds the available buffer. `available` in the error is the number of
/// bytes remaining after `off`.
pub fn read_slice<'a>(
    bytes: &'a [u8],
    off: usize,
    len: usize,
    context: &'static str,
) -> Result<&'a [u8], FormatError> {
    match off.checked_add(len) {
        Some(end) if end <= bytes.len() => Ok(&bytes[off..end]),
        _ => Err(out_of_range(bytes, off, len, context)),
    }
}

/// Write a 32-bit little-endian unsigned integer `v` into `buf` at `off`.
///
/// Does not perform bounds checking; callers must ensure the destination
/// range is valid.
pub fn write_u32(buf: &mut [u8], off: usize, v: u32) {
    buf[off..off + 4].copy_from_slice(&v.to_le_bytes());
}

/// Write a 16-bit little-endian unsigned integer `v` into `buf` at `off`.
pub fn write_u16(buf: &mut [u8], off: usize, v: u16) {
    buf[off..off + 2].copy_from_slice(&v.to_le_bytes());
}

/// Write a single byte `v` into `buf` at `off`.
pub fn write_u8(buf: &mut [u8], off: usize, v: u8) {
    buf[off] = v;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian() {
        let bytes = [0x78, 0x56, 0x34, 0x12, 0xFF];
        assert_eq!(read_u32_le_at(&bytes, 0, "t").unwrap(), 0x1234_5678);
        assert_eq!(read_u16_le_at(&bytes, 2, "t").unwrap(), 0x1234);
        assert_eq!(read_u8_at(&bytes, 4, "t").unwrap(), 0xFF);
    }

    #[test]
    fn short_reads_report_context() {
        let bytes = [0u8; 3];
        match read_u32_le_at(&bytes, 1, "total_samples") {
            Err(FormatError::OffsetOutOfRange {
                offset,
                needed,
                available,
                context,
            }) => {
                assert_eq!(offset, 1);
                assert_eq!(needed, 4);
                assert_eq!(available, 2);
                assert_eq!(context, "total_samples");
            }
            other => panic!("expected OffsetOutOfRange, got {:?}", other),
        }
        assert!(read_u8_at(&bytes, 3, "t").is_err());
        assert!(read_slice(&bytes, usize::MAX, 2, "t").is_err());
    }

    #[test]
    fn writes_little_endian() {
        let mut buf = [0u8; 8];
        write_u32(&mut buf, 0, 0xAABB_CCDD);
        write_u16(&mut buf, 4, 0x1122);
        write_u8(&mut buf, 6, 0x33);
        assert_eq!(buf, [0xDD, 0xCC, 0xBB, 0xAA, 0x22, 0x11, 0x33, 0x00]);
    }
}
