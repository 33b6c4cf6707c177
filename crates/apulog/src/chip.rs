//! NES APU description and emulation.
//!
//! [`function`] holds the static register function table that every
//! conversion in this crate goes through; [`state`] holds the register
//! shadow used by the disassembler and the timing emulator.
pub mod function;
pub mod state;

pub use function::{
    Channel, ClockRate, Function, FunctionSpec, LENGTH_COUNTER_TABLE, NTSC_CLOCK, PAL_CLOCK,
    Region, SAMPLE_RATE, bitmask, functions_at, lookup, offset_of, value_range,
};
