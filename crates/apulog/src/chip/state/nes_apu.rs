//! NES APU timing emulator.
//!
//! Replays function writes against the four voices and reports, once per
//! 44.1 kHz sample, what each voice is playing. No waveform is synthesized;
//! the output is the per-sample parameter frame stored in a raw score.
//!
//! Per sample the order is fixed:
//!
//! 1. the frame sequencer advances and may fire quarter/half frames,
//! 2. writes scheduled at this sample are applied,
//! 3. the audible state is sampled.
//!
//! DMC writes, the DMC enable bit and the frame IRQ inhibit bit are accepted
//! and ignored.

use super::channel::{NoiseChannel, PulseChannel, TriangleChannel, with_timer_high, with_timer_low};
use super::sequencer::{FrameSequencer, FrameTick};
use crate::chip::function::lookup;
use crate::chip::{Channel, ClockRate, Function};
use crate::error::ProtocolError;
use crate::functional::FunctionWrite;

/// One sample of a raw score: `[channel][field]`.
///
/// Pulses: `[period_hi, period_lo, volume, duty]`. Triangle:
/// `[period_hi, period_lo, 0, 0]`. Noise: `[0, 16 - period, volume, loop]`.
pub type RawFrame = [[u8; 4]; 4];

/// Emulated NES APU (pulse 1, pulse 2, triangle, noise).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NesApuState {
    clock: ClockRate,
    pulses: [PulseChannel; 2],
    triangle: TriangleChannel,
    noise: NoiseChannel,
    sequencer: FrameSequencer,
}

impl NesApuState {
    /// Create an emulator in power-on state for the given master clock.
    ///
    /// All four voices start enabled with zeroed registers.
    pub fn new(clock: ClockRate) -> Self {
        Self {
            clock,
            pulses: [PulseChannel::new(true), PulseChannel::new(false)],
            triangle: TriangleChannel::default(),
            noise: NoiseChannel::default(),
            sequencer: FrameSequencer::new(clock.region()),
        }
    }

    pub fn clock(&self) -> ClockRate {
        self.clock
    }

    pub fn noise(&self) -> &NoiseChannel {
        &self.noise
    }

    /// Advance the frame sequencer by one sample and clock the units it fires.
    pub fn step(&mut self) -> FrameTick {
        let tick = self.sequencer.clock();
        if tick.quarter {
            self.triangle.clock_linear();
            for pulse in &mut self.pulses {
                pulse.envelope.clock(pulse.volume, pulse.length.halt);
            }
            self.noise
                .envelope
                .clock(self.noise.volume, self.noise.length.halt);
        }
        if tick.half {
            for pulse in &mut self.pulses {
                pulse.length.clock();
            }
            self.triangle.length.clock();
            self.noise.length.clock();
            for pulse in &mut self.pulses {
                pulse.clock_sweep();
            }
        }
        tick
    }

    /// Apply one function write.
    ///
    /// # Errors
    ///
    /// `UnknownFunction` if the channel does not own the function and
    /// `InvalidFunctionValue` if the value does not fit its field.
    pub fn write(&mut self, write: &FunctionWrite) -> Result<(), ProtocolError> {
        let FunctionWrite {
            channel,
            function,
            value,
            ..
        } = *write;
        let (_, spec) = lookup(channel, function)
            .ok_or(ProtocolError::UnknownFunction { channel, function })?;
        if value as u16 >= spec.value_range() {
            return Err(ProtocolError::InvalidFunctionValue {
                channel,
                function,
                value,
                range: spec.value_range(),
            });
        }
        let flag = value != 0;

        match channel {
            Channel::Pulse1 | Channel::Pulse2 => {
                let pulse = &mut self.pulses[(channel == Channel::Pulse2) as usize];
                match function {
                    Function::Duty => pulse.duty = value,
                    Function::LengthHalt => pulse.length.halt = flag,
                    Function::ConstantVolume => pulse.constant_volume = flag,
                    Function::Volume => pulse.volume = value,
                    Function::SweepEnable => pulse.enable_sweep(flag),
                    Function::SweepPeriod => pulse.sweep_period = value,
                    Function::SweepNegate => pulse.sweep_negate = flag,
                    Function::SweepShift => pulse.sweep_shift = value,
                    Function::TimerLow => pulse.set_timer(with_timer_low(pulse.timer, value)),
                    Function::TimerHigh => pulse.set_timer(with_timer_high(pulse.timer, value)),
                    Function::LengthLoad => {
                        pulse.length.load(value);
                        pulse.envelope.start = true;
                    }
                    _ => {}
                }
            }
            Channel::Triangle => {
                let triangle = &mut self.triangle;
                match function {
                    Function::LengthHalt => triangle.length.halt = flag,
                    Function::LinearReload => triangle.linear_reload_value = value,
                    Function::TimerLow => triangle.timer = with_timer_low(triangle.timer, value),
                    Function::TimerHigh => triangle.timer = with_timer_high(triangle.timer, value),
                    Function::LengthLoad => {
                        triangle.length.load(value);
                        triangle.linear_reload = true;
                    }
                    _ => {}
                }
            }
            Channel::Noise => {
                let noise = &mut self.noise;
                match function {
                    Function::LengthHalt => noise.length.halt = flag,
                    Function::ConstantVolume => noise.constant_volume = flag,
                    Function::Volume => noise.volume = value,
                    Function::NoiseLoop => noise.loop_mode = flag,
                    Function::NoisePeriod => noise.period = value,
                    Function::LengthLoad => {
                        noise.length.load(value);
                        noise.envelope.start = true;
                    }
                    _ => {}
                }
            }
            Channel::Status => match function.enabled_channel() {
                Some(Channel::Pulse1) => self.pulses[0].length.set_enabled(flag),
                Some(Channel::Pulse2) => self.pulses[1].length.set_enabled(flag),
                Some(Channel::Triangle) => self.triangle.length.set_enabled(flag),
                Some(Channel::Noise) => self.noise.length.set_enabled(flag),
                _ => {}
            },
            Channel::FrameCounter => {
                if function == Function::FrameMode {
                    self.sequencer.set_mode(flag);
                }
            }
            Channel::Dmc => {}
        }
        Ok(())
    }

    /// Sample the audible state of all four voices.
    pub fn frame(&self) -> RawFrame {
        let mut frame: RawFrame = [[0; 4]; 4];
        for (slot, pulse) in frame.iter_mut().zip(&self.pulses) {
            if let Some(volume) = pulse.output_volume() {
                slot[0] = (pulse.timer >> 8) as u8;
                slot[1] = (pulse.timer & 0xFF) as u8;
                slot[2] = volume;
            }
            slot[3] = pulse.duty;
        }
        if self.triangle.is_audible() {
            frame[2][0] = (self.triangle.timer >> 8) as u8;
            frame[2][1] = (self.triangle.timer & 0xFF) as u8;
        }
        if let Some(volume) = self.noise.output_volume() {
            frame[3][1] = 16 - self.noise.period;
            frame[3][2] = volume;
        }
        frame[3][3] = self.noise.loop_mode as u8;
        frame
    }
}
