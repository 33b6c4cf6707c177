//! Functional event logs.
//!
//! A functional log names *what* each register write does instead of *which
//! byte* it stored: `pulse1 volume = 15` rather than `$4000 = $3F`. It is
//! produced by [`to_functional`], inverted by [`to_raw`], replayed by the
//! timing emulator, and pruned into a [`CompactEvent`] log by [`to_compact`].
mod compact;
mod disassemble;
mod event;

pub use compact::{CompactEvent, from_compact, to_compact};
pub use disassemble::{to_functional, to_raw, to_raw_with};
pub use event::{FunctionWrite, FunctionalEvent};
