//! Compact functional log: writes that do not change state are pruned.
//!
//! The compact form drops atom and offset bookkeeping and keeps a write only
//! when it changes the function's value, with a few exceptions that have a
//! side effect even when rewritten with the same value:
//!
//! - length-counter loads of the four voices (reload the counter),
//! - channel enables of the four voices (clearing zeroes the counter),
//! - the frame-counter mode (resets the sequencer),
//! - a pulse timer low byte while that pulse's sweep is enabled.
//!
//! DMC enable and frame IRQ inhibit writes are always dropped.
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::chip::{Channel, ClockRate, Function, offset_of};
use crate::error::ProtocolError;
use crate::functional::event::{FunctionWrite, FunctionalEvent};
use crate::vgm::split_clock;

/// One entry of a compact log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompactEvent {
    Clock(ClockRate),
    Wait(u32),
    Write {
        channel: Channel,
        function: Function,
        value: u8,
    },
}

impl CompactEvent {
    pub fn clock(&self) -> Option<ClockRate> {
        match self {
            CompactEvent::Clock(rate) => Some(*rate),
            _ => None,
        }
    }
}

impl fmt::Display for CompactEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompactEvent::Clock(rate) => write!(f, "clock,{}", rate.hz()),
            CompactEvent::Wait(n) => write!(f, "w,{}", n),
            CompactEvent::Write {
                channel,
                function,
                value,
            } => write!(f, "{}_{},{}", channel, function, value),
        }
    }
}

fn is_dropped(channel: Channel, function: Function) -> bool {
    matches!(
        (channel, function),
        (Channel::Status, Function::EnableDmc) | (Channel::FrameCounter, Function::FrameIrqInhibit)
    )
}

fn is_volatile(channel: Channel, function: Function) -> bool {
    match (channel, function) {
        (Channel::Pulse1 | Channel::Pulse2 | Channel::Triangle | Channel::Noise, Function::LengthLoad) => {
            true
        }
        (Channel::Status, f) => f
            .enabled_channel()
            .is_some_and(|c| c != Channel::Dmc),
        (Channel::FrameCounter, Function::FrameMode) => true,
        _ => false,
    }
}

/// Prune a functional log down to its state-changing writes.
///
/// Function values start at zero, except the channel enables which start at one.
pub fn to_compact(events: &[FunctionalEvent]) -> Result<Vec<CompactEvent>, ProtocolError> {
    let (clock, body) = split_clock(events, FunctionalEvent::clock)?;

    let mut state: HashMap<(Channel, Function), u8> = HashMap::new();
    for channel in [
        Channel::Pulse1,
        Channel::Pulse2,
        Channel::Triangle,
        Channel::Noise,
        Channel::Dmc,
    ] {
        if let Some(enable) = Function::enable_for(channel) {
            state.insert((Channel::Status, enable), 1);
        }
    }

    let mut out = vec![CompactEvent::Clock(clock)];
    for event in body {
        match event {
            FunctionalEvent::Clock(_) => {}
            FunctionalEvent::Wait(n) => out.push(CompactEvent::Wait(*n)),
            FunctionalEvent::FunctionWrite(w) => {
                let key = (w.channel, w.function);
                let previous = state.get(&key).copied().unwrap_or(0);
                let sweeping = w.function == Function::TimerLow
                    && matches!(w.channel, Channel::Pulse1 | Channel::Pulse2)
                    && state.get(&(w.channel, Function::SweepEnable)) == Some(&1);
                let keep = previous != w.value || is_volatile(w.channel, w.function) || sweeping;
                if keep && !is_dropped(w.channel, w.function) {
                    out.push(CompactEvent::Write {
                        channel: w.channel,
                        function: w.function,
                        value: w.value,
                    });
                }
                state.insert(key, w.value);
            }
        }
    }

    log::debug!(
        "compacted {} functional events into {}",
        events.len(),
        out.len()
    );
    Ok(out)
}

/// Rebuild atom groups and register offsets for a compact log.
///
/// A new atom starts when the written register changes or when a function
/// already written in the current atom is written again.
///
/// # Errors
///
/// `UnknownFunction` when a write names a function its channel does not own.
pub fn from_compact(events: &[CompactEvent]) -> Result<Vec<FunctionalEvent>, ProtocolError> {
    let (clock, body) = split_clock(events, CompactEvent::clock)?;

    let mut out = vec![FunctionalEvent::Clock(clock)];
    let mut last_register: Option<(Channel, u8)> = None;
    let mut atom = 0u32;
    let mut atom_functions: HashSet<(Channel, Function)> = HashSet::new();

    for event in body {
        match *event {
            CompactEvent::Clock(_) => {}
            CompactEvent::Wait(n) => {
                out.push(FunctionalEvent::Wait(n));
                last_register = None;
                atom = 0;
                atom_functions.clear();
            }
            CompactEvent::Write {
                channel,
                function,
                value,
            } => {
                let offset = offset_of(channel, function)
                    .ok_or(ProtocolError::UnknownFunction { channel, function })?;
                let moved = last_register.is_some_and(|r| r != (channel, offset));
                if moved || atom_functions.contains(&(channel, function)) {
                    atom += 1;
                    atom_functions.clear();
                }
                atom_functions.insert((channel, function));
                last_register = Some((channel, offset));
                out.push(FunctionalEvent::FunctionWrite(FunctionWrite {
                    channel,
                    function,
                    value,
                    atom,
                    offset,
                }));
            }
        }
    }
    Ok(out)
}
