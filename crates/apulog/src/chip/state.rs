//! Chip state tracking.
//!
//! # Architecture
//!
//! - **RegisterFile**: last-known byte per physical register, owned by one
//!   disassembly call at a time
//! - **FrameSequencer**: integer-phase sub-audio clock producing quarter and
//!   half frame ticks
//! - **Envelope**, **LengthCounter**: hardware counters shared by several voices
//! - **PulseChannel**, **TriangleChannel**, **NoiseChannel**: per-voice state
//! - **NesApuState**: the four voices plus the sequencer, advanced one
//!   44.1 kHz sample at a time
//!
//! # Examples
//!
//! ```
//! use apulog::chip::state::NesApuState;
//! use apulog::chip::{Channel, ClockRate, Function};
//! use apulog::functional::FunctionWrite;
//!
//! let mut apu = NesApuState::new(ClockRate::NTSC);
//! apu.write(&FunctionWrite {
//!     channel: Channel::Noise,
//!     function: Function::LengthLoad,
//!     value: 1,
//!     atom: 0,
//!     offset: 3,
//! })
//! .unwrap();
//! apu.step();
//! assert_eq!(apu.noise().length.value(), 254);
//! ```
mod channel;
mod envelope;
mod nes_apu;
mod registers;
mod sequencer;

pub use channel::{
    LengthCounter, MIN_PULSE_PERIOD, NoiseChannel, PULSE_PERIOD_LIMIT, PulseChannel,
    TriangleChannel,
};
pub use envelope::Envelope;
pub use nes_apu::{NesApuState, RawFrame};
pub use registers::{REGISTER_COUNT, RegisterFile};
pub use sequencer::{FrameSequencer, FrameTick};
