use std::fmt;

use crate::chip::{Channel, ClockRate, Function};

/// A write to one named function of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionWrite {
    pub channel: Channel,
    pub function: Function,
    /// Field value, already shifted down to bit 0.
    pub value: u8,
    /// Atom group within the current zero-time run of writes.
    pub atom: u32,
    /// Register offset within the channel's block.
    pub offset: u8,
}

/// One entry of a functional event log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunctionalEvent {
    Clock(ClockRate),
    Wait(u32),
    FunctionWrite(FunctionWrite),
}

impl FunctionalEvent {
    pub fn clock(&self) -> Option<ClockRate> {
        match self {
            FunctionalEvent::Clock(rate) => Some(*rate),
            _ => None,
        }
    }

    /// Shorthand for a write event.
    pub fn write(channel: Channel, function: Function, value: u8, atom: u32, offset: u8) -> Self {
        FunctionalEvent::FunctionWrite(FunctionWrite {
            channel,
            function,
            value,
            atom,
            offset,
        })
    }
}

impl fmt::Display for FunctionalEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionalEvent::Clock(rate) => write!(f, "clock,{}", rate.hz()),
            FunctionalEvent::Wait(n) => write!(f, "wait,{}", n),
            FunctionalEvent::FunctionWrite(w) => write!(
                f,
                "apu,{},{},{},{},{}",
                w.channel, w.function, w.value, w.atom, w.offset
            ),
        }
    }
}
