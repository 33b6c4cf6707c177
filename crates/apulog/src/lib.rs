#![doc = include_str!("../README.md")]
//!
//! Errors are split by cause: [`FormatError`] for malformed traces,
//! [`ProtocolError`] for event logs that break the register function table
//! and [`ApulogError`] for conversions that can fail either way. The crate
//! logs through the `log` facade and never installs a logger.
pub mod binutil;
pub mod chip;
pub mod cycle;
pub mod error;
pub mod functional;
pub mod render;
pub mod score;
pub mod vgm;

pub use cycle::{FrameRate, Representation, cycle, cycle_with};
pub use error::{ApulogError, FormatError, ProtocolError, Result};
