//! Trace decoder: VGM bytes to a raw event log.
//!
//! Only the opcodes an NES APU dump can legitimately contain are accepted:
//!
//! | Opcode | Length | Meaning |
//! |--------|--------|---------|
//! | `0x61 nn nn` | 3 | wait `nnnn` samples |
//! | `0x62` | 1 | wait 735 samples (one 60 Hz frame) |
//! | `0x63` | 1 | wait 882 samples (one 50 Hz frame) |
//! | `0x66` | 1 | end of sound data |
//! | `0x67 0x66 tt ss ss ss ss ...` | 7 + size | data block |
//! | `0x7n` | 1 | wait `n + 1` samples |
//! | `0xB4 rr vv` | 3 | write `vv` to APU register `rr` |
//!
//! Anything else is rejected with [`FormatError::UnknownOpcode`].
use crate::binutil::{read_slice, read_u8_at, read_u16_le_at, read_u32_le_at};
use crate::error::FormatError;
use crate::vgm::event::RawEvent;
use crate::vgm::header::{VgmHeader, command_byte};

/// A single command of the stream, before wait coalescing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command<'a> {
    Wait(u32),
    Write { register: u8, value: u8 },
    Data { kind: u8, bytes: &'a [u8] },
    End,
}

/// Decode the command at `off`, returning it with the number of bytes consumed.
pub(crate) fn parse_command(bytes: &[u8], off: usize) -> Result<(Command<'_>, usize), FormatError> {
    let opcode = command_byte(bytes, off)?;
    match opcode {
        0x61 => {
            let n = read_u16_le_at(bytes, off + 1, "wait")?;
            Ok((Command::Wait(n as u32), 3))
        }
        0x62 => Ok((Command::Wait(735), 1)),
        0x63 => Ok((Command::Wait(882), 1)),
        0x66 => Ok((Command::End, 1)),
        0x67 => {
            if read_u8_at(bytes, off + 1, "data_block")? != 0x66 {
                return Err(FormatError::MalformedDataBlock { offset: off });
            }
            let kind = read_u8_at(bytes, off + 2, "data_block")?;
            let size = read_u32_le_at(bytes, off + 3, "data_block")? as usize;
            let data = read_slice(bytes, off + 7, size, "data_block")?;
            Ok((Command::Data { kind, bytes: data }, 7 + size))
        }
        0x70..=0x7F => Ok((Command::Wait((opcode & 0x0F) as u32 + 1), 1)),
        0xB4 => {
            let args = read_slice(bytes, off + 1, 2, "apu_write")?;
            Ok((
                Command::Write {
                    register: args[0],
                    value: args[1],
                },
                3,
            ))
        }
        _ => Err(FormatError::UnknownOpcode {
            opcode,
            offset: off,
        }),
    }
}

/// Decode a VGM 1.61 trace into a raw event log.
///
/// The first event is always [`RawEvent::Clock`]. Adjacent waits are
/// coalesced into one. The register byte of `0xB4` writes is not checked
/// here; out-of-table registers are rejected by the disassembler.
///
/// # Errors
///
/// Returns a [`FormatError`] if the header is inconsistent with the byte
/// stream, an opcode is unknown, the stream is truncated, or the waits do
/// not add up to the declared total sample count.
pub fn decode(bytes: &[u8]) -> Result<Vec<RawEvent>, FormatError> {
    let header = VgmHeader::parse(bytes)?;
    let clock = header.validate(bytes.len())?;

    let mut events = vec![RawEvent::Clock(clock)];
    let mut pending_wait: Option<u64> = None;
    let mut total: u64 = 0;
    let mut off = header.data_start;

    loop {
        let (cmd, consumed) = parse_command(bytes, off)?;
        log::trace!("0x{:06X}: {:?}", off, cmd);
        off += consumed;

        match cmd {
            Command::Wait(n) => {
                total += n as u64;
                *pending_wait.get_or_insert(0) += n as u64;
            }
            Command::Write { register, value } => {
                flush_wait(&mut events, &mut pending_wait);
                events.push(RawEvent::RegisterWrite { register, value });
            }
            Command::Data { kind, bytes } => {
                flush_wait(&mut events, &mut pending_wait);
                events.push(RawEvent::RawData {
                    kind,
                    bytes: bytes.to_vec(),
                });
            }
            Command::End => {
                flush_wait(&mut events, &mut pending_wait);
                break;
            }
        }
    }

    if total != header.total_samples as u64 {
        return Err(FormatError::SampleCountMismatch {
            declared: header.total_samples,
            actual: total,
        });
    }

    log::debug!(
        "decoded {} events, {} samples at {}",
        events.len(),
        total,
        clock
    );
    Ok(events)
}

// A coalesced wait can only exceed u32 when the sample total check is about to fail.
fn flush_wait(events: &mut Vec<RawEvent>, pending: &mut Option<u64>) {
    if let Some(n) = pending.take() {
        events.push(RawEvent::Wait(u32::try_from(n).unwrap_or(u32::MAX)));
    }
}
