//! Per-channel state of the emulated voices.
//!
//! Counters that the hardware lets run below zero are kept saturated at
//! zero; every audibility test only asks whether they are positive.

use super::envelope::Envelope;
use crate::chip::function::LENGTH_COUNTER_TABLE;

/// Lowest pulse period that still produces sound.
pub const MIN_PULSE_PERIOD: u16 = 8;

/// Pulse periods (and sweep targets) at or above this value are muted.
pub const PULSE_PERIOD_LIMIT: i32 = 0x800;

/// Length counter plus the enable bit from the status register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthCounter {
    pub enabled: bool,
    pub halt: bool,
    counter: u8,
}

impl Default for LengthCounter {
    fn default() -> Self {
        Self {
            enabled: true,
            halt: false,
            counter: 0,
        }
    }
}

impl LengthCounter {
    pub fn value(&self) -> u8 {
        self.counter
    }

    /// Load from [`LENGTH_COUNTER_TABLE`]; ignored while the channel is disabled.
    pub fn load(&mut self, index: u8) {
        if self.enabled {
            self.counter = LENGTH_COUNTER_TABLE[(index & 0x1F) as usize];
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.counter = 0;
        }
    }

    /// Half-frame clock.
    pub fn clock(&mut self) {
        if !self.halt {
            self.counter = self.counter.saturating_sub(1);
        }
    }
}

/// Replace the high three bits of an 11-bit period.
pub(crate) fn with_timer_high(timer: u16, high: u8) -> u16 {
    (timer & 0x0FF) | ((high as u16 & 0x07) << 8)
}

/// Replace the low byte of an 11-bit period.
pub(crate) fn with_timer_low(timer: u16, low: u8) -> u16 {
    (timer & 0x700) | low as u16
}

/// One of the two pulse channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PulseChannel {
    /// Pulse 1 negates with one's complement, pulse 2 with two's complement.
    pub ones_complement: bool,
    pub duty: u8,
    pub constant_volume: bool,
    pub volume: u8,
    pub sweep_enabled: bool,
    pub sweep_period: u8,
    pub sweep_negate: bool,
    pub sweep_shift: u8,
    pub timer: u16,
    /// Period the sweep unit would move to next.
    pub sweep_target: i32,
    sweep_divider: i32,
    sweep_reload: bool,
    pub length: LengthCounter,
    pub envelope: Envelope,
}

impl PulseChannel {
    pub fn new(ones_complement: bool) -> Self {
        Self {
            ones_complement,
            duty: 0,
            constant_volume: false,
            volume: 0,
            sweep_enabled: false,
            sweep_period: 0,
            sweep_negate: false,
            sweep_shift: 0,
            timer: 0,
            sweep_target: 0,
            sweep_divider: 1,
            sweep_reload: false,
            length: LengthCounter::default(),
            envelope: Envelope::default(),
        }
    }

    /// Recompute the sweep target from the current period.
    pub fn update_sweep_target(&mut self) {
        let timer = self.timer as i32;
        let mut delta = timer >> self.sweep_shift;
        if self.sweep_negate {
            if self.ones_complement {
                delta += 1;
            }
            delta = -delta;
        }
        self.sweep_target = timer + delta;
    }

    pub fn enable_sweep(&mut self, enabled: bool) {
        self.sweep_enabled = enabled;
        self.sweep_reload = true;
        self.update_sweep_target();
    }

    pub fn set_timer(&mut self, timer: u16) {
        self.timer = timer;
        self.update_sweep_target();
    }

    /// Half-frame clock of the sweep unit.
    pub fn clock_sweep(&mut self) {
        if !self.sweep_enabled {
            return;
        }
        self.sweep_divider -= 1;
        if self.sweep_divider <= 0 {
            self.update_sweep_target();
            if self.timer >= MIN_PULSE_PERIOD
                && self.sweep_target < PULSE_PERIOD_LIMIT
                && self.sweep_shift > 0
            {
                self.timer = self.sweep_target.max(0) as u16;
            }
            self.sweep_divider = self.sweep_period as i32 + 1;
        }
        if self.sweep_reload {
            self.sweep_divider = self.sweep_period as i32 + 1;
            self.sweep_reload = false;
        }
    }

    /// Whether the channel produces sound, and at what volume.
    pub fn output_volume(&self) -> Option<u8> {
        if self.length.value() == 0 {
            return None;
        }
        let volume = self.envelope.volume(self.constant_volume, self.volume);
        (volume > 0
            && self.timer >= MIN_PULSE_PERIOD
            && self.sweep_target < PULSE_PERIOD_LIMIT)
            .then_some(volume)
    }
}

/// The triangle channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriangleChannel {
    pub linear_reload_value: u8,
    linear_counter: u8,
    pub linear_reload: bool,
    pub timer: u16,
    pub length: LengthCounter,
}

impl TriangleChannel {
    pub fn linear_counter(&self) -> u8 {
        self.linear_counter
    }

    /// Quarter-frame clock of the linear counter.
    pub fn clock_linear(&mut self) {
        if self.linear_reload {
            self.linear_counter = self.linear_reload_value;
        } else {
            self.linear_counter = self.linear_counter.saturating_sub(1);
        }
        if !self.length.halt {
            self.linear_reload = false;
        }
    }

    pub fn is_audible(&self) -> bool {
        self.length.value().min(self.linear_counter) > 0
    }
}

/// The noise channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoiseChannel {
    pub constant_volume: bool,
    pub volume: u8,
    pub loop_mode: bool,
    pub period: u8,
    pub length: LengthCounter,
    pub envelope: Envelope,
}

impl NoiseChannel {
    pub fn output_volume(&self) -> Option<u8> {
        if self.length.value() == 0 {
            return None;
        }
        let volume = self.envelope.volume(self.constant_volume, self.volume);
        (volume > 0).then_some(volume)
    }
}
