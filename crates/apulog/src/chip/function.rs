//! Register function table for the NES APU.
//!
//! Every physical APU register packs one or more named *functions* into
//! disjoint bit fields. This module describes that packing as static data:
//! which channel owns a register, which `(function, bitmask)` pairs live at
//! each register offset, and how many ticks a length-counter load buys.
//!
//! Pulse 1 and pulse 2 share a single table. No per-channel bit logic lives
//! anywhere else in the crate; decoders, encoders and the emulator all go
//! through [`functions_at`] and [`lookup`].
//!
//! # Register Layout
//!
//! | Base | Channel | Offsets |
//! |------|---------|---------|
//! | 0x00 | Pulse 1 | 0..=3 |
//! | 0x04 | Pulse 2 | 0..=3 |
//! | 0x08 | Triangle | 0..=3 (offset 1 unused) |
//! | 0x0C | Noise | 0..=3 (offset 1 unused) |
//! | 0x10 | DMC | 0..=3 |
//! | 0x15 | Status / channel enable | 0 |
//! | 0x17 | Frame counter | 0 |
use std::fmt;

/// Master clock rate of region A consoles (21.477272 MHz / 12, rounded).
pub const NTSC_CLOCK: u32 = 1_789_773;

/// Master clock rate of region B consoles.
pub const PAL_CLOCK: u32 = 1_662_607;

/// Output sample rate of every sample-indexed representation.
pub const SAMPLE_RATE: u32 = 44_100;

/// Length-counter lookup, indexed by the 5-bit length-load field.
///
/// Each value is the number of half-frame ticks before the counter reaches zero.
pub const LENGTH_COUNTER_TABLE: [u8; 32] = [
    10, 254, 20, 2, 40, 4, 80, 6, 160, 8, 60, 10, 14, 12, 26, 14, 12, 16, 24, 18, 48, 20, 96, 22,
    192, 24, 72, 26, 16, 28, 32, 30,
];

/// Console region, derived from the master clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    /// ~1.789 MHz, 60 Hz video.
    Ntsc,
    /// ~1.663 MHz, 50 Hz video.
    Pal,
}

/// A validated APU master clock rate in Hz.
///
/// Only the two known master clocks are accepted; `1_789_772` is tolerated
/// as a truncated spelling of the region A clock found in real dumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClockRate(u32);

impl ClockRate {
    pub const NTSC: ClockRate = ClockRate(NTSC_CLOCK);
    pub const PAL: ClockRate = ClockRate(PAL_CLOCK);

    /// Validate a raw clock value (flag bits already stripped).
    pub fn new(hz: u32) -> Option<Self> {
        match hz {
            1_789_772 | NTSC_CLOCK | PAL_CLOCK => Some(ClockRate(hz)),
            _ => None,
        }
    }

    /// Clock frequency in Hz.
    pub fn hz(self) -> u32 {
        self.0
    }

    pub fn region(self) -> Region {
        if self.0.abs_diff(NTSC_CLOCK) < 2 {
            Region::Ntsc
        } else {
            Region::Pal
        }
    }
}

impl Default for ClockRate {
    fn default() -> Self {
        ClockRate::NTSC
    }
}

impl fmt::Display for ClockRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Hz", self.0)
    }
}

/// An APU channel, including the two control-only pseudo channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    Pulse1,
    Pulse2,
    Triangle,
    Noise,
    /// Sample playback; decoded but never emulated.
    Dmc,
    /// Channel-enable register (0x15).
    Status,
    /// Frame-counter register (0x17).
    FrameCounter,
}

impl Channel {
    pub const ALL: [Channel; 7] = [
        Channel::Pulse1,
        Channel::Pulse2,
        Channel::Triangle,
        Channel::Noise,
        Channel::Dmc,
        Channel::Status,
        Channel::FrameCounter,
    ];

    /// The four channels that appear in score matrices, in column order.
    pub const VOICES: [Channel; 4] = [
        Channel::Pulse1,
        Channel::Pulse2,
        Channel::Triangle,
        Channel::Noise,
    ];

    /// First register index owned by this channel.
    pub const fn base_register(self) -> u8 {
        match self {
            Channel::Pulse1 => 0x00,
            Channel::Pulse2 => 0x04,
            Channel::Triangle => 0x08,
            Channel::Noise => 0x0C,
            Channel::Dmc => 0x10,
            Channel::Status => 0x15,
            Channel::FrameCounter => 0x17,
        }
    }

    /// Number of consecutive registers this channel owns.
    pub const fn register_count(self) -> u8 {
        match self {
            Channel::Status | Channel::FrameCounter => 1,
            _ => 4,
        }
    }

    /// Split a register index into its owning channel and offset.
    ///
    /// Registers 0x14 and 0x16 (and anything above 0x17) are not APU audio
    /// registers and return `None`.
    pub fn from_register(register: u8) -> Option<(Channel, u8)> {
        let channel = match register {
            0x00..=0x03 => Channel::Pulse1,
            0x04..=0x07 => Channel::Pulse2,
            0x08..=0x0B => Channel::Triangle,
            0x0C..=0x0F => Channel::Noise,
            0x10..=0x13 => Channel::Dmc,
            0x15 => Channel::Status,
            0x17 => Channel::FrameCounter,
            _ => return None,
        };
        Some((channel, register - channel.base_register()))
    }

    /// Column of this channel in a score matrix, if it is a voice.
    pub fn voice_index(self) -> Option<usize> {
        Channel::VOICES.iter().position(|&c| c == self)
    }

    /// Two-letter code used in text dumps.
    pub fn code(self) -> &'static str {
        match self {
            Channel::Pulse1 => "p1",
            Channel::Pulse2 => "p2",
            Channel::Triangle => "tr",
            Channel::Noise => "no",
            Channel::Dmc => "dm",
            Channel::Status => "ch",
            Channel::FrameCounter => "fc",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A named hardware function implemented by a bit field of one register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Function {
    /// Pulse duty cycle.
    Duty,
    /// Length-counter halt; doubles as envelope loop and, on the triangle,
    /// linear-counter control.
    LengthHalt,
    ConstantVolume,
    /// Volume, or envelope divider period when not in constant-volume mode.
    Volume,
    SweepEnable,
    SweepPeriod,
    SweepNegate,
    SweepShift,
    TimerLow,
    /// Length-counter load index into [`LENGTH_COUNTER_TABLE`].
    LengthLoad,
    TimerHigh,
    LinearReload,
    NoiseLoop,
    NoisePeriod,
    DmcIrq,
    DmcLoop,
    DmcFrequency,
    DmcLoadCounter,
    DmcSampleAddress,
    DmcSampleLength,
    EnableDmc,
    EnableNoise,
    EnableTriangle,
    EnablePulse2,
    EnablePulse1,
    FrameMode,
    FrameIrqInhibit,
}

impl Function {
    /// Two-letter code used in text dumps.
    pub fn code(self) -> &'static str {
        match self {
            Function::Duty => "du",
            Function::LengthHalt => "lh",
            Function::ConstantVolume => "cv",
            Function::Volume => "vo",
            Function::SweepEnable => "se",
            Function::SweepPeriod => "sp",
            Function::SweepNegate => "sn",
            Function::SweepShift => "ss",
            Function::TimerLow => "tl",
            Function::LengthLoad => "ll",
            Function::TimerHigh => "th",
            Function::LinearReload => "lr",
            Function::NoiseLoop => "nl",
            Function::NoisePeriod => "np",
            Function::DmcIrq => "iq",
            Function::DmcLoop => "lo",
            Function::DmcFrequency => "fr",
            Function::DmcLoadCounter => "lc",
            Function::DmcSampleAddress => "sa",
            Function::DmcSampleLength => "sl",
            Function::EnableDmc => "dm",
            Function::EnableNoise => "no",
            Function::EnableTriangle => "tr",
            Function::EnablePulse2 => "p2",
            Function::EnablePulse1 => "p1",
            Function::FrameMode => "mo",
            Function::FrameIrqInhibit => "iq",
        }
    }

    /// For channel-enable functions, the channel they gate.
    pub fn enabled_channel(self) -> Option<Channel> {
        match self {
            Function::EnablePulse1 => Some(Channel::Pulse1),
            Function::EnablePulse2 => Some(Channel::Pulse2),
            Function::EnableTriangle => Some(Channel::Triangle),
            Function::EnableNoise => Some(Channel::Noise),
            Function::EnableDmc => Some(Channel::Dmc),
            _ => None,
        }
    }

    /// The enable function gating `channel`, if any.
    pub fn enable_for(channel: Channel) -> Option<Function> {
        match channel {
            Channel::Pulse1 => Some(Function::EnablePulse1),
            Channel::Pulse2 => Some(Function::EnablePulse2),
            Channel::Triangle => Some(Function::EnableTriangle),
            Channel::Noise => Some(Function::EnableNoise),
            Channel::Dmc => Some(Function::EnableDmc),
            _ => None,
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One bit field of a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionSpec {
    pub function: Function,
    pub mask: u8,
}

impl FunctionSpec {
    const fn new(function: Function, mask: u8) -> Self {
        FunctionSpec { function, mask }
    }

    /// Right shift that moves the field down to bit 0.
    pub fn shift(self) -> u32 {
        self.mask.trailing_zeros()
    }

    /// Number of distinct values the field can hold.
    pub fn value_range(self) -> u16 {
        1 << self.mask.count_ones()
    }

    /// Extract this field from a full register byte.
    pub fn extract(self, byte: u8) -> u8 {
        (byte & self.mask) >> self.shift()
    }

    /// Replace this field inside `byte` with `value`.
    pub fn insert(self, byte: u8, value: u8) -> u8 {
        (byte & !self.mask) | ((value << self.shift()) & self.mask)
    }
}

use Function::*;

const PULSE_TABLE: [&[FunctionSpec]; 4] = [
    &[
        FunctionSpec::new(Duty, 0b1100_0000),
        FunctionSpec::new(LengthHalt, 0b0010_0000),
        FunctionSpec::new(ConstantVolume, 0b0001_0000),
        FunctionSpec::new(Volume, 0b0000_1111),
    ],
    &[
        FunctionSpec::new(SweepEnable, 0b1000_0000),
        FunctionSpec::new(SweepPeriod, 0b0111_0000),
        FunctionSpec::new(SweepNegate, 0b0000_1000),
        FunctionSpec::new(SweepShift, 0b0000_0111),
    ],
    &[FunctionSpec::new(TimerLow, 0b1111_1111)],
    &[
        FunctionSpec::new(LengthLoad, 0b1111_1000),
        FunctionSpec::new(TimerHigh, 0b0000_0111),
    ],
];

const TRIANGLE_TABLE: [&[FunctionSpec]; 4] = [
    &[
        FunctionSpec::new(LengthHalt, 0b1000_0000),
        FunctionSpec::new(LinearReload, 0b0111_1111),
    ],
    &[],
    &[FunctionSpec::new(TimerLow, 0b1111_1111)],
    &[
        FunctionSpec::new(LengthLoad, 0b1111_1000),
        FunctionSpec::new(TimerHigh, 0b0000_0111),
    ],
];

const NOISE_TABLE: [&[FunctionSpec]; 4] = [
    &[
        FunctionSpec::new(LengthHalt, 0b0010_0000),
        FunctionSpec::new(ConstantVolume, 0b0001_0000),
        FunctionSpec::new(Volume, 0b0000_1111),
    ],
    &[],
    &[
        FunctionSpec::new(NoiseLoop, 0b1000_0000),
        FunctionSpec::new(NoisePeriod, 0b0000_1111),
    ],
    &[FunctionSpec::new(LengthLoad, 0b1111_1000)],
];

const DMC_TABLE: [&[FunctionSpec]; 4] = [
    &[
        FunctionSpec::new(DmcIrq, 0b1000_0000),
        FunctionSpec::new(DmcLoop, 0b0100_0000),
        FunctionSpec::new(DmcFrequency, 0b0000_1111),
    ],
    &[FunctionSpec::new(DmcLoadCounter, 0b0111_1111)],
    &[FunctionSpec::new(DmcSampleAddress, 0b1111_1111)],
    &[FunctionSpec::new(DmcSampleLength, 0b1111_1111)],
];

const STATUS_TABLE: [&[FunctionSpec]; 1] = [&[
    FunctionSpec::new(EnableDmc, 0b0001_0000),
    FunctionSpec::new(EnableNoise, 0b0000_1000),
    FunctionSpec::new(EnableTriangle, 0b0000_0100),
    FunctionSpec::new(EnablePulse2, 0b0000_0010),
    FunctionSpec::new(EnablePulse1, 0b0000_0001),
]];

const FRAME_COUNTER_TABLE: [&[FunctionSpec]; 1] = [&[
    FunctionSpec::new(FrameMode, 0b1000_0000),
    FunctionSpec::new(FrameIrqInhibit, 0b0100_0000),
]];

fn table(channel: Channel) -> &'static [&'static [FunctionSpec]] {
    match channel {
        Channel::Pulse1 | Channel::Pulse2 => &PULSE_TABLE,
        Channel::Triangle => &TRIANGLE_TABLE,
        Channel::Noise => &NOISE_TABLE,
        Channel::Dmc => &DMC_TABLE,
        Channel::Status => &STATUS_TABLE,
        Channel::FrameCounter => &FRAME_COUNTER_TABLE,
    }
}

/// Every `(function, bitmask)` pair stored at `offset` of `channel`'s registers.
///
/// Returns `None` when the offset is outside the channel's register block.
/// An existing but unused register (triangle/noise offset 1) yields an empty slice.
pub fn functions_at(channel: Channel, offset: u8) -> Option<&'static [FunctionSpec]> {
    table(channel).get(offset as usize).copied()
}

/// Find the register offset and bit field that implement `function` on `channel`.
pub fn lookup(channel: Channel, function: Function) -> Option<(u8, FunctionSpec)> {
    table(channel)
        .iter()
        .enumerate()
        .find_map(|(offset, specs)| {
            specs
                .iter()
                .find(|spec| spec.function == function)
                .map(|spec| (offset as u8, *spec))
        })
}

/// Bit mask of `function` on `channel`.
pub fn bitmask(channel: Channel, function: Function) -> Option<u8> {
    lookup(channel, function).map(|(_, spec)| spec.mask)
}

/// Register offset of `function` on `channel`.
pub fn offset_of(channel: Channel, function: Function) -> Option<u8> {
    lookup(channel, function).map(|(offset, _)| offset)
}

/// Number of distinct values `function` accepts on `channel` (`2^popcount(mask)`).
pub fn value_range(channel: Channel, function: Function) -> Option<u16> {
    lookup(channel, function).map(|(_, spec)| spec.value_range())
}
