//! Trace sanitizing and truncation.
use crate::binutil::{read_u8_at, read_u32_le_at, write_u32};
use crate::error::{FormatError, Result};
use crate::vgm::event::RawEvent;
use crate::vgm::header::{CLOCK_MASK, HeaderField, VgmHeader, command_byte};
use crate::vgm::{decode, encode};

/// Which APU channels [`simplify`] strips from a trace.
///
/// The status (0x15) and frame-counter (0x17) registers are always kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimplifyOptions {
    pub drop_pulse1: bool,
    pub drop_pulse2: bool,
    pub drop_triangle: bool,
    pub drop_noise: bool,
    pub drop_dmc: bool,
}

impl Default for SimplifyOptions {
    fn default() -> Self {
        SimplifyOptions {
            drop_pulse1: false,
            drop_pulse2: false,
            drop_triangle: false,
            drop_noise: false,
            drop_dmc: true,
        }
    }
}

impl SimplifyOptions {
    /// Whether writes to `register` survive simplification.
    pub fn keeps_register(&self, register: u8) -> bool {
        match register {
            0x15 | 0x17 => true,
            0x00..=0x03 => !self.drop_pulse1,
            0x04..=0x07 => !self.drop_pulse2,
            0x08..=0x0B => !self.drop_triangle,
            0x0C..=0x0F => !self.drop_noise,
            0x10..=0x13 => !self.drop_dmc,
            _ => false,
        }
    }
}

/// Sanitize a raw trace so that [`decode`] accepts it.
///
/// Header edits: loop offset, loop length and global rate are zeroed, the
/// volume/loop-base/loop-modifier bytes are zeroed and the feature flag
/// bits are stripped from the clock field.
///
/// Command stream edits: expansion-chip writes (`0x54`, `0xA0`), embedded
/// data blocks and APU writes to registers rejected by `options` are
/// removed. The EOF offset (and the GD3 offset, when present) are moved
/// back by the number of deleted bytes.
///
/// Returns the cleaned trace and the number of removed commands.
pub fn simplify(
    bytes: &[u8],
    options: &SimplifyOptions,
) -> std::result::Result<(Vec<u8>, usize), FormatError> {
    let header = VgmHeader::parse(bytes)?;

    let mut out = bytes.to_vec();
    for field in [
        HeaderField::LoopOffset,
        HeaderField::LoopSamples,
        HeaderField::Rate,
    ] {
        write_u32(&mut out, field.offset(), 0);
    }
    write_u32(&mut out, HeaderField::Volume.offset(), 0);
    write_u32(
        &mut out,
        HeaderField::NesApuClock.offset(),
        header.nes_apu_clock & CLOCK_MASK,
    );

    // Spans to delete, in stream order.
    let mut removed: Vec<(usize, usize)> = Vec::new();
    let mut off = header.data_start;
    loop {
        let opcode = command_byte(bytes, off)?;
        let (len, remove) = match opcode {
            0x54 | 0xA0 => (3, true),
            0x61 => (3, false),
            0x62 | 0x63 | 0x70..=0x7F => (1, false),
            0x66 => break,
            0x67 => (7 + read_u32_le_at(bytes, off + 3, "data_block")? as usize, true),
            0xB4 => {
                let register = read_u8_at(bytes, off + 1, "apu_write")?;
                (3, !options.keeps_register(register))
            }
            _ => {
                return Err(FormatError::UnknownOpcode {
                    opcode,
                    offset: off,
                });
            }
        };
        if remove {
            log::trace!(
                "0x{:06X}: removing opcode 0x{:02X} ({} bytes)",
                off,
                opcode,
                len
            );
            removed.push((off, len));
        }
        off += len;
    }

    let deleted: usize = removed.iter().map(|&(_, len)| len).sum();
    let mut cleaned = Vec::with_capacity(out.len().saturating_sub(deleted));
    let mut cursor = 0;
    for &(start, len) in &removed {
        cleaned.extend_from_slice(&out[cursor..start]);
        cursor = start + len;
    }
    cleaned.extend_from_slice(out.get(cursor..).unwrap_or_default());

    let eof = header.eof_offset.wrapping_sub(deleted as u32);
    write_u32(&mut cleaned, HeaderField::EofOffset.offset(), eof);
    if header.gd3_offset != 0 {
        let gd3 = header.gd3_offset.wrapping_sub(deleted as u32);
        write_u32(&mut cleaned, HeaderField::Gd3Offset.offset(), gd3);
    }

    log::debug!(
        "simplify removed {} commands ({} bytes)",
        removed.len(),
        deleted
    );
    Ok((cleaned, removed.len()))
}

/// Cut a trace down to at most `max_events` events.
///
/// The clock event is always kept; `start` skips that many events after it
/// before counting. The result is re-encoded with a fresh header.
pub fn shorten(bytes: &[u8], max_events: usize, start: Option<usize>) -> Result<Vec<u8>> {
    let events = decode(bytes)?;
    let (clock, body) = events.split_at(1.min(events.len()));
    let skip = start.unwrap_or(0).min(body.len());
    let kept: Vec<RawEvent> = clock
        .iter()
        .chain(body[skip..].iter().take(max_events))
        .cloned()
        .collect();
    encode(&kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::ClockRate;

    #[test]
    fn default_keeps_everything_but_dmc() {
        let opts = SimplifyOptions::default();
        for reg in 0x00..=0x0F {
            assert!(opts.keeps_register(reg));
        }
        for reg in 0x10..=0x13 {
            assert!(!opts.keeps_register(reg));
        }
        assert!(opts.keeps_register(0x15));
        assert!(opts.keeps_register(0x17));
        assert!(!opts.keeps_register(0x14));
        assert!(!opts.keeps_register(0x16));
        assert!(!opts.keeps_register(0x20));
    }

    #[test]
    fn drop_switches() {
        let opts = SimplifyOptions {
            drop_triangle: true,
            drop_dmc: false,
            ..Default::default()
        };
        assert!(!opts.keeps_register(0x0A));
        assert!(opts.keeps_register(0x12));
    }

    #[test]
    fn shorten_keeps_clock() {
        let events = vec![
            RawEvent::Clock(ClockRate::NTSC),
            RawEvent::RegisterWrite {
                register: 0x15,
                value: 0x0F,
            },
            RawEvent::Wait(10),
            RawEvent::RegisterWrite {
                register: 0x00,
                value: 0x3F,
            },
            RawEvent::Wait(20),
        ];
        let bytes = encode(&events).unwrap();
        let short = shorten(&bytes, 2, Some(1)).unwrap();
        assert_eq!(decode(&short).unwrap(), vec![
            RawEvent::Clock(ClockRate::NTSC),
            RawEvent::Wait(10),
            RawEvent::RegisterWrite {
                register: 0x00,
                value: 0x3F,
            },
        ]);
    }
}
