//! Binary trace codec.
//!
//! Reads and writes VGM 1.61 files that carry a single NES APU. The decoder
//! validates the header strictly and produces a [`RawEvent`] log; the
//! encoder rebuilds a fresh header from such a log. [`simplify`] prepares
//! raw dumps for decoding and [`shorten`] cuts a trace to a prefix.
//!
//! ```
//! use apulog::chip::ClockRate;
//! use apulog::vgm::{RawEvent, decode, encode};
//!
//! let events = vec![
//!     RawEvent::Clock(ClockRate::NTSC),
//!     RawEvent::RegisterWrite { register: 0x15, value: 0x01 },
//!     RawEvent::Wait(735),
//! ];
//! let bytes = encode(&events).unwrap();
//! assert_eq!(decode(&bytes).unwrap(), events);
//! ```
mod event;
pub mod header;
mod parser;
mod simplify;
mod writer;

pub use event::RawEvent;
pub(crate) use event::split_clock;
pub use header::{HeaderField, VgmHeader};
pub use parser::decode;
pub use simplify::{SimplifyOptions, shorten, simplify};
pub use writer::{MAX_WAIT_CHUNK, encode};
