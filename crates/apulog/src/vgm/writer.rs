//! Trace encoder: raw event log to VGM bytes.
use crate::binutil::{write_u8, write_u16, write_u32};
use crate::error::{FormatError, Result};
use crate::vgm::event::{RawEvent, split_clock};
use crate::vgm::header::{HEADER_SIZE, HeaderField, VGM_IDENT, VGM_VERSION};

/// Longest wait a single `0x61` command can carry.
pub const MAX_WAIT_CHUNK: u32 = 0xFFFF;

/// Encode a raw event log as a VGM 1.61 trace.
///
/// The header is built from scratch: version, clock, data offset, total
/// sample count and EOF offset are all derived from `events`. Waits are
/// written as `0x61` commands split into chunks of at most
/// [`MAX_WAIT_CHUNK`] samples; a zero wait is kept as `61 00 00` so that
/// the zero-time boundary it marks survives a round trip.
///
/// # Errors
///
/// Fails with a `ProtocolError` if the log does not start with a clock
/// event, and with `SampleCountMismatch` if the waits overflow the 32-bit
/// total sample field.
pub fn encode(events: &[RawEvent]) -> Result<Vec<u8>> {
    let (clock, body) = split_clock(events, RawEvent::clock)?;

    let mut buf = vec![0u8; HEADER_SIZE];
    buf[0..4].copy_from_slice(VGM_IDENT);
    write_u32(&mut buf, HeaderField::Version.offset(), VGM_VERSION);
    write_u32(&mut buf, HeaderField::NesApuClock.offset(), clock.hz());
    write_u32(
        &mut buf,
        HeaderField::DataOffset.offset(),
        (HEADER_SIZE - HeaderField::DataOffset.offset()) as u32,
    );

    let mut total: u64 = 0;
    for event in body {
        match event {
            RawEvent::Clock(_) => {}
            RawEvent::Wait(n) => {
                total += *n as u64;
                let mut remaining = *n;
                while remaining > MAX_WAIT_CHUNK {
                    push_wait(&mut buf, MAX_WAIT_CHUNK);
                    remaining -= MAX_WAIT_CHUNK;
                }
                push_wait(&mut buf, remaining);
            }
            RawEvent::RegisterWrite { register, value } => {
                buf.extend_from_slice(&[0xB4, *register, *value]);
            }
            RawEvent::RawData { kind, bytes } => {
                buf.extend_from_slice(&[0x67, 0x66, *kind]);
                buf.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
                buf.extend_from_slice(bytes);
            }
        }
    }
    buf.push(0x66);

    let total_samples = u32::try_from(total).map_err(|_| FormatError::SampleCountMismatch {
        declared: u32::MAX,
        actual: total,
    })?;
    write_u32(&mut buf, HeaderField::TotalSamples.offset(), total_samples);
    let eof = (buf.len() - HeaderField::EofOffset.offset()) as u32;
    write_u32(&mut buf, HeaderField::EofOffset.offset(), eof);

    log::debug!(
        "encoded {} events into {} bytes ({} samples)",
        events.len(),
        buf.len(),
        total
    );
    Ok(buf)
}

fn push_wait(buf: &mut Vec<u8>, n: u32) {
    let at = buf.len();
    buf.resize(at + 3, 0);
    write_u8(buf, at, 0x61);
    write_u16(buf, at + 1, n as u16);
}
