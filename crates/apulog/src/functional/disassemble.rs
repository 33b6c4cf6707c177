//! Register disassembler: physical register writes to function writes and back.
use std::collections::HashSet;

use crate::chip::state::RegisterFile;
use crate::chip::{Channel, functions_at, lookup};
use crate::error::ProtocolError;
use crate::functional::event::{FunctionWrite, FunctionalEvent};
use crate::vgm::{RawEvent, split_clock};

/// Split every register write into one write per function at that register.
///
/// Each emitted value is the masked field shifted down to bit 0. The atom
/// index restarts at zero after every wait and advances when a register
/// already written in the current atom is written again. Embedded data
/// blocks carry no APU state and are dropped.
///
/// # Errors
///
/// `MissingClock`/`MisplacedClock` for a malformed log, `UnknownRegister`
/// for a write outside the APU's audio registers.
pub fn to_functional(events: &[RawEvent]) -> Result<Vec<FunctionalEvent>, ProtocolError> {
    let (clock, body) = split_clock(events, RawEvent::clock)?;

    let mut out = Vec::with_capacity(events.len() * 2);
    out.push(FunctionalEvent::Clock(clock));

    let mut atom = 0u32;
    let mut touched: HashSet<(Channel, u8)> = HashSet::new();
    for event in body {
        match event {
            RawEvent::Clock(_) => {}
            RawEvent::Wait(n) => {
                out.push(FunctionalEvent::Wait(*n));
                atom = 0;
                touched.clear();
            }
            RawEvent::RegisterWrite { register, value } => {
                let (channel, offset) = Channel::from_register(*register)
                    .ok_or(ProtocolError::UnknownRegister(*register))?;
                if !touched.insert((channel, offset)) {
                    atom += 1;
                    touched.clear();
                    touched.insert((channel, offset));
                }
                let specs = functions_at(channel, offset).unwrap_or_default();
                for spec in specs {
                    out.push(FunctionalEvent::FunctionWrite(FunctionWrite {
                        channel,
                        function: spec.function,
                        value: spec.extract(*value),
                        atom,
                        offset,
                    }));
                }
            }
            RawEvent::RawData { kind, bytes } => {
                log::trace!("dropping data block kind 0x{:02X} ({} bytes)", kind, bytes.len());
            }
        }
    }

    log::debug!(
        "disassembled {} raw events into {} functional events",
        events.len(),
        out.len()
    );
    Ok(out)
}

/// Reassemble function writes into physical register writes.
///
/// Uses a fresh [`RegisterFile`]; see [`to_raw_with`].
pub fn to_raw(events: &[FunctionalEvent]) -> Result<Vec<RawEvent>, ProtocolError> {
    let mut registers = RegisterFile::new();
    to_raw_with(&mut registers, events)
}

/// Reassemble function writes into physical register writes using `registers`
/// as the shadow state.
///
/// Writes sharing a `(channel, offset, atom)` key are merged and only the
/// final byte is emitted, in first-write order, when the next wait (or the
/// end of the log) closes the atom run. `registers` holds the final shadow
/// state on return.
///
/// # Errors
///
/// - `UnknownFunction` when the channel does not implement the function.
/// - `OffsetMismatch` when the event's offset disagrees with the table.
/// - `InvalidFunctionValue` when the value does not fit the field.
pub fn to_raw_with(
    registers: &mut RegisterFile,
    events: &[FunctionalEvent],
) -> Result<Vec<RawEvent>, ProtocolError> {
    let (clock, body) = split_clock(events, FunctionalEvent::clock)?;

    let mut out = vec![RawEvent::Clock(clock)];
    let mut pending: Vec<((Channel, u8, u32), u8, u8)> = Vec::new();

    for event in body {
        match event {
            FunctionalEvent::Clock(_) => {}
            FunctionalEvent::Wait(n) => {
                flush(&mut out, &mut pending);
                out.push(RawEvent::Wait(*n));
            }
            FunctionalEvent::FunctionWrite(write) => {
                let (register, byte) = assemble(registers, write)?;
                let key = (write.channel, write.offset, write.atom);
                match pending.iter_mut().find(|(k, _, _)| *k == key) {
                    Some(slot) => slot.2 = byte,
                    None => pending.push((key, register, byte)),
                }
            }
        }
    }
    flush(&mut out, &mut pending);

    log::debug!(
        "assembled {} functional events into {} raw events",
        events.len(),
        out.len()
    );
    Ok(out)
}

/// Validate one function write and merge it into the shadow registers.
pub(crate) fn assemble(
    registers: &mut RegisterFile,
    write: &FunctionWrite,
) -> Result<(u8, u8), ProtocolError> {
    let (offset, spec) =
        lookup(write.channel, write.function).ok_or(ProtocolError::UnknownFunction {
            channel: write.channel,
            function: write.function,
        })?;
    if offset != write.offset {
        return Err(ProtocolError::OffsetMismatch {
            channel: write.channel,
            function: write.function,
            expected: offset,
            actual: write.offset,
        });
    }
    let range = spec.value_range();
    if write.value as u16 >= range {
        return Err(ProtocolError::InvalidFunctionValue {
            channel: write.channel,
            function: write.function,
            value: write.value,
            range,
        });
    }
    Ok(registers.apply(write.channel, offset, spec, write.value))
}

fn flush(out: &mut Vec<RawEvent>, pending: &mut Vec<((Channel, u8, u32), u8, u8)>) {
    out.extend(
        pending
            .drain(..)
            .map(|(_, register, value)| RawEvent::RegisterWrite { register, value }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::{ClockRate, Function};

    fn write(register: u8, value: u8) -> RawEvent {
        RawEvent::RegisterWrite { register, value }
    }

    #[test]
    fn splits_register_into_functions() {
        let events = vec![RawEvent::Clock(ClockRate::NTSC), write(0x00, 0xBF)];
        let functional = to_functional(&events).unwrap();
        assert_eq!(
            functional,
            vec![
                FunctionalEvent::Clock(ClockRate::NTSC),
                FunctionalEvent::write(Channel::Pulse1, Function::Duty, 2, 0, 0),
                FunctionalEvent::write(Channel::Pulse1, Function::LengthHalt, 1, 0, 0),
                FunctionalEvent::write(Channel::Pulse1, Function::ConstantVolume, 1, 0, 0),
                FunctionalEvent::write(Channel::Pulse1, Function::Volume, 15, 0, 0),
            ]
        );
    }

    #[test]
    fn atoms_advance_on_repeated_register() {
        let events = vec![
            RawEvent::Clock(ClockRate::NTSC),
            write(0x0A, 0x10),
            write(0x0B, 0x08),
            write(0x0A, 0x20),
            RawEvent::Wait(1),
            write(0x0A, 0x30),
        ];
        let atoms: Vec<u32> = to_functional(&events)
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                FunctionalEvent::FunctionWrite(w) if w.function == Function::TimerLow => {
                    Some(w.atom)
                }
                _ => None,
            })
            .collect();
        assert_eq!(atoms, vec![0, 1, 0]);
    }

    #[test]
    fn raw_round_trip_is_exact() {
        let events = vec![
            RawEvent::Clock(ClockRate::PAL),
            write(0x15, 0x0F),
            write(0x00, 0x3F),
            write(0x02, 0xAB),
            write(0x03, 0x09),
            write(0x02, 0xAC),
            RawEvent::Wait(100),
            write(0x0C, 0x30),
            write(0x17, 0x80),
            RawEvent::Wait(7),
        ];
        let functional = to_functional(&events).unwrap();
        assert_eq!(to_raw(&functional).unwrap(), events);
    }

    #[test]
    fn intra_atom_writes_collapse() {
        let events = vec![
            FunctionalEvent::Clock(ClockRate::NTSC),
            FunctionalEvent::write(Channel::Pulse1, Function::Duty, 2, 0, 0),
            FunctionalEvent::write(Channel::Pulse1, Function::Volume, 9, 0, 0),
            FunctionalEvent::write(Channel::Pulse1, Function::Volume, 4, 0, 0),
            FunctionalEvent::Wait(1),
        ];
        let mut registers = RegisterFile::new();
        let raw = to_raw_with(&mut registers, &events).unwrap();
        assert_eq!(
            raw,
            vec![
                RawEvent::Clock(ClockRate::NTSC),
                write(0x00, 0x84),
                RawEvent::Wait(1)
            ]
        );
        assert_eq!(registers.read(0x00), Some(0x84));
    }

    #[test]
    fn rejects_bad_writes() {
        let clock = FunctionalEvent::Clock(ClockRate::NTSC);
        let cases = [
            (
                FunctionalEvent::write(Channel::Pulse1, Function::Volume, 16, 0, 0),
                ProtocolError::InvalidFunctionValue {
                    channel: Channel::Pulse1,
                    function: Function::Volume,
                    value: 16,
                    range: 16,
                },
            ),
            (
                FunctionalEvent::write(Channel::Triangle, Function::Duty, 1, 0, 0),
                ProtocolError::UnknownFunction {
                    channel: Channel::Triangle,
                    function: Function::Duty,
                },
            ),
            (
                FunctionalEvent::write(Channel::Noise, Function::NoisePeriod, 1, 0, 3),
                ProtocolError::OffsetMismatch {
                    channel: Channel::Noise,
                    function: Function::NoisePeriod,
                    expected: 2,
                    actual: 3,
                },
            ),
        ];
        for (event, expected) in cases {
            assert_eq!(to_raw(&[clock.clone(), event]).unwrap_err(), expected);
        }
        assert_eq!(
            to_functional(&[RawEvent::Clock(ClockRate::NTSC), write(0x16, 0)]).unwrap_err(),
            ProtocolError::UnknownRegister(0x16)
        );
    }
}
