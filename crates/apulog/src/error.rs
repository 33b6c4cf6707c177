//! Error types shared by every conversion in this crate.
//!
//! Three families exist and none of them is recovered from inside the crate:
//!
//! - [`FormatError`]: the binary trace is malformed or uses a feature this
//!   crate does not support. The whole trace is rejected.
//! - [`ProtocolError`]: an event log names a register, channel/function pair
//!   or value that the function table does not allow.
//! - [`ApulogError::InsufficientData`]: tempo estimation had too few note
//!   intervals to work with. Callers may retry with an explicit rate.
use thiserror::Error;

use crate::chip::{Channel, Function};

/// Convenient result alias for conversions that may fail in more than one way.
pub type Result<T> = std::result::Result<T, ApulogError>;

/// Errors raised while reading or sanitizing a binary trace.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// An attempted read was outside the available buffer range.
    ///
    /// `context` names the logical field or command being read.
    #[error(
        "offset out of range at {context}: 0x{offset:X} (needed {needed} bytes, available {available})"
    )]
    OffsetOutOfRange {
        offset: usize,
        needed: usize,
        available: usize,
        context: &'static str,
    },

    /// The four-byte magic tag did not read `"Vgm "`.
    #[error("invalid ident: {0:?}")]
    InvalidIdent([u8; 4]),

    /// The header declares a version other than 1.61.
    #[error("unsupported version: 0x{0:03X}")]
    UnsupportedVersion(u32),

    /// The EOF offset stored in the header disagrees with the byte length.
    #[error("eof offset mismatch: header declares {declared} bytes, input has {actual}")]
    EofMismatch { declared: usize, actual: usize },

    /// The APU clock field is not one of the known master clocks.
    #[error("unsupported APU clock rate {0} Hz")]
    UnsupportedClock(u32),

    /// Expansion-audio or dual-chip flag bits are set on the clock field.
    #[error("unsupported clock feature flags 0x{0:08X}")]
    UnsupportedFeature(u32),

    /// The global playback-rate field is nonzero.
    #[error("unsupported global rate {0} (must be zero)")]
    UnsupportedRate(u32),

    /// An opcode byte was not recognized.
    #[error("unknown opcode 0x{opcode:02X} at offset 0x{offset:X}")]
    UnknownOpcode { opcode: u8, offset: usize },

    /// An embedded data block did not carry the `0x66` compatibility marker.
    #[error("malformed data block at offset 0x{offset:X}")]
    MalformedDataBlock { offset: usize },

    /// The waits in the command stream do not add up to the declared length.
    #[error("wait total {actual} does not match declared total samples {declared}")]
    SampleCountMismatch { declared: u32, actual: u64 },
}

/// Errors raised when an event log violates the register function table.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProtocolError {
    /// The register index does not belong to any emulated channel.
    #[error("unknown register 0x{0:02X}")]
    UnknownRegister(u8),

    /// The function is not implemented by the channel's registers.
    #[error("channel {channel} has no function {function}")]
    UnknownFunction { channel: Channel, function: Function },

    /// A functional write names an offset other than the one owning its function.
    #[error("{channel}_{function} lives at offset {expected}, event says {actual}")]
    OffsetMismatch {
        channel: Channel,
        function: Function,
        expected: u8,
        actual: u8,
    },

    /// A value does not fit into the bit width of its function.
    #[error("{channel}_{function}: value {value} outside [0, {range})")]
    InvalidFunctionValue {
        channel: Channel,
        function: Function,
        value: u8,
        range: u16,
    },

    /// An event log did not start with a clock event.
    #[error("event log must start with a clock event")]
    MissingClock,

    /// A clock event appeared after the first position.
    #[error("clock event at position {0}; only the first event may set the clock")]
    MisplacedClock(usize),

    /// A notation record names a channel that carries no notes.
    #[error("channel {0} cannot carry notes")]
    NotAVoice(Channel),

    /// A notation control event uses a controller other than velocity or timbre.
    #[error("unsupported controller {controller} on channel {channel}")]
    UnknownController { channel: Channel, controller: u8 },

    /// A score was handed to a conversion expecting a different sample rate.
    #[error("expected a score at {expected} Hz, got {actual} Hz")]
    SampleRateMismatch { expected: f64, actual: f64 },
}

/// Crate-level error type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApulogError {
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Tempo estimation found fewer usable note intervals than required.
    #[error("too few intervals ({intervals}, need {required}) to estimate tempo")]
    InsufficientData { intervals: usize, required: usize },

    /// A reducer setting cannot describe a usable frame rate.
    #[error("invalid reducer setting: {0}")]
    InvalidConfig(&'static str),
}
