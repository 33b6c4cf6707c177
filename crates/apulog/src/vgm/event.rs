//! Raw register-write events decoded from a trace.
use std::fmt;

use crate::chip::ClockRate;
use crate::error::ProtocolError;

/// One entry of a raw event log.
///
/// A well-formed log starts with exactly one [`RawEvent::Clock`] and never
/// contains another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawEvent {
    /// Master clock of the APU that produced the log.
    Clock(ClockRate),
    /// Advance time by this many 44.1 kHz samples.
    Wait(u32),
    /// Physical write of `value` to APU register `register` (0x00..=0x17).
    RegisterWrite { register: u8, value: u8 },
    /// Opaque embedded data block tagged with its kind byte.
    RawData { kind: u8, bytes: Vec<u8> },
}

impl RawEvent {
    pub fn clock(&self) -> Option<ClockRate> {
        match self {
            RawEvent::Clock(rate) => Some(*rate),
            _ => None,
        }
    }
}

impl fmt::Display for RawEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawEvent::Clock(rate) => write!(f, "clock,{}", rate.hz()),
            RawEvent::Wait(n) => write!(f, "wait,{}", n),
            RawEvent::RegisterWrite { register, value } => {
                write!(f, "apu,{:02x},{:02x}", register, value)
            }
            RawEvent::RawData { kind, bytes } => {
                write!(f, "ram,{:02x},{} bytes", kind, bytes.len())
            }
        }
    }
}

/// Split a log into its leading clock and the remaining events.
///
/// Fails with `MissingClock` if the first event is not a clock and with
/// `MisplacedClock` if any later event is.
pub(crate) fn split_clock<E>(
    events: &[E],
    clock_of: impl Fn(&E) -> Option<ClockRate>,
) -> Result<(ClockRate, &[E]), ProtocolError> {
    let (first, rest) = events.split_first().ok_or(ProtocolError::MissingClock)?;
    let clock = clock_of(first).ok_or(ProtocolError::MissingClock)?;
    if let Some(pos) = rest.iter().position(|e| clock_of(e).is_some()) {
        return Err(ProtocolError::MisplacedClock(pos + 1));
    }
    Ok((clock, rest))
}
