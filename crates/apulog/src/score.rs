//! Score representations derived from a functional log.
//!
//! ```text
//! FunctionalEvent log --emulate--> RawScore --raw_to_expressive--> ExpressiveScore
//!        ^                            |  ^                             |   |
//!        +----------encode------------+  +-----expressive_to_raw-------+   |
//!                                                   downsample / reduced / notation
//! ```
//!
//! A [`RawScore`] is what the chip plays at every 44.1 kHz sample. An
//! [`ExpressiveScore`] quantizes it to MIDI pitches and may be resampled to
//! a lower frame rate, either explicitly or by [`estimate_rate`].
mod encode;
mod expressive;
mod notation;
mod raw;
mod reduced;
mod tempo;

pub use encode::encode;
pub use expressive::{
    ExpressiveFrame, ExpressiveScore, ReducerConfig, downsample, expressive_to_raw,
    frequency_to_midi, midi_to_period, period_to_frequency, raw_to_expressive,
};
pub use notation::{
    CC_TIMBRE, CC_VELOCITY, ControlEvent, Notation, NoteRecord, from_notation, to_notation,
};
pub use raw::{RawScore, emulate};
pub use reduced::{BlendedScore, DEFAULT_VELOCITY, SeparatedScore};
pub use tempo::{estimate_rate, onsets};
