//! Frame sequencer with an exact integer phase.

use crate::chip::function::{Region, SAMPLE_RATE};

/// Clock edges produced by the frame sequencer for one output sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameTick {
    /// Envelopes and the triangle linear counter advance.
    pub quarter: bool,
    /// Length counters and sweep units advance.
    pub half: bool,
}

/// Sub-audio clock that drives envelopes, sweeps and length counters.
///
/// The step rate (steps per second) depends on the region and on the
/// selected mode. The phase is an integer accumulator measured in
/// `1 / (SAMPLE_RATE * step_rate)` seconds: each sample adds the step rate
/// and a step fires once the phase exceeds [`SAMPLE_RATE`]. Every step is a
/// quarter frame; every second step is also a half frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSequencer {
    four_step_rate: u32,
    five_step_rate: u32,
    step_rate: u32,
    phase: u32,
    steps: u32,
    mode_written: bool,
}

impl FrameSequencer {
    pub fn new(region: Region) -> Self {
        let (four_step_rate, five_step_rate) = match region {
            Region::Ntsc => (240, 192),
            Region::Pal => (200, 160),
        };
        Self {
            four_step_rate,
            five_step_rate,
            step_rate: four_step_rate,
            phase: 0,
            steps: 0,
            mode_written: false,
        }
    }

    /// Current step rate in Hz.
    pub fn step_rate(&self) -> u32 {
        self.step_rate
    }

    /// Select 4-step (`false`) or 5-step (`true`) mode.
    ///
    /// Resets the phase; the next [`clock`](Self::clock) fires both a
    /// quarter and a half frame.
    pub fn set_mode(&mut self, five_step: bool) {
        self.step_rate = if five_step {
            self.five_step_rate
        } else {
            self.four_step_rate
        };
        self.phase = 0;
        self.steps = 0;
        self.mode_written = true;
    }

    /// Advance by one output sample.
    pub fn clock(&mut self) -> FrameTick {
        let mut tick = FrameTick::default();
        if self.mode_written {
            tick.quarter = true;
            tick.half = true;
            self.mode_written = false;
        }
        self.phase += self.step_rate;
        if self.phase > SAMPLE_RATE {
            self.phase -= SAMPLE_RATE;
            tick.quarter = true;
            tick.half |= self.steps % 2 == 1;
            self.steps += 1;
        }
        tick
    }
}
