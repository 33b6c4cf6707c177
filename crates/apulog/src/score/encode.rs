//! Score encoder: a raw score back to a functional log.
//!
//! This is a best-effort inverse of [`emulate`](super::emulate). Channel
//! on/off transitions, duty, volume, noise loop/period and the 11-bit
//! periods are reproduced. Sweep glides are not re-derived, so swept notes
//! come back as steps. Volume is only written while nonzero so that no
//! spurious envelope restart is introduced.
use crate::chip::{Channel, Function, SAMPLE_RATE, offset_of};
use crate::error::ProtocolError;
use crate::functional::FunctionalEvent;
use crate::score::raw::RawScore;

struct Writer {
    events: Vec<FunctionalEvent>,
}

impl Writer {
    fn push(
        &mut self,
        channel: Channel,
        function: Function,
        value: u8,
        atom: u32,
    ) -> Result<(), ProtocolError> {
        let offset = offset_of(channel, function)
            .ok_or(ProtocolError::UnknownFunction { channel, function })?;
        self.events
            .push(FunctionalEvent::write(channel, function, value, atom, offset));
        Ok(())
    }

    fn enable(&mut self, channel: Channel, on: bool) -> Result<(), ProtocolError> {
        match Function::enable_for(channel) {
            Some(function) => self.push(Channel::Status, function, on as u8, 0),
            None => Ok(()),
        }
    }

    /// High period bits; a physical write here also loads the length counter.
    fn timer_high(&mut self, channel: Channel, high: u8) -> Result<(), ProtocolError> {
        self.push(channel, Function::TimerHigh, high, 0)?;
        self.push(channel, Function::LengthLoad, 0, 0)
    }
}

#[derive(Default)]
struct PulseMemory {
    timer: u16,
    timer_low: u8,
    timer_high: u8,
    duty: u8,
    volume: u8,
}

/// Encode a raw score as a functional log.
///
/// The log opens with a fixed preamble that disables all four voices, puts
/// pulses and noise in constant-volume halted mode, sets the pulse sweep
/// shift to 7 (keeping low notes from being muted by the sweep target),
/// and halts the triangle with a full linear counter.
///
/// At 44.1 kHz every frame is followed by a one-sample wait. At other rates
/// frame `i` ends at sample `floor(44100 * (i + 1) / rate)`, capped at
/// `sample_count`, and any samples left after the last frame become a final
/// wait.
pub fn encode(score: &RawScore) -> Result<Vec<FunctionalEvent>, ProtocolError> {
    let mut w = Writer {
        events: vec![FunctionalEvent::Clock(score.clock)],
    };

    for channel in Channel::VOICES {
        w.enable(channel, false)?;
    }
    let mut atom = 1;
    for pulse in [Channel::Pulse1, Channel::Pulse2] {
        w.push(pulse, Function::Duty, 0, atom)?;
        w.push(pulse, Function::LengthHalt, 1, atom)?;
        w.push(pulse, Function::ConstantVolume, 1, atom)?;
        w.push(pulse, Function::Volume, 0, atom)?;
        w.push(pulse, Function::SweepShift, 7, atom + 1)?;
        atom += 2;
    }
    w.push(Channel::Triangle, Function::LengthHalt, 1, atom)?;
    w.push(Channel::Triangle, Function::LinearReload, 127, atom)?;
    w.push(Channel::Noise, Function::LengthHalt, 1, atom + 1)?;
    w.push(Channel::Noise, Function::ConstantVolume, 1, atom + 1)?;
    w.push(Channel::Noise, Function::Volume, 0, atom + 1)?;

    let native = score.is_native_rate();
    let mut pulses = [PulseMemory::default(), PulseMemory::default()];
    let mut triangle_timer: u16 = 0;
    let mut noise_volume: u8 = 0;
    let mut noise_period: u8 = 0;
    let mut noise_loop: u8 = 0;
    let mut sample: usize = 0;

    for (i, frame) in score.frames.iter().enumerate() {
        for (index, memory) in pulses.iter_mut().enumerate() {
            let channel = Channel::VOICES[index];
            let [high, low, volume, duty] = frame[index];
            let timer = ((high as u16) << 8) | low as u16;

            let retrigger = memory.timer == 0 && timer != 0;
            if retrigger {
                w.enable(channel, true)?;
            } else if memory.timer != 0 && timer == 0 {
                w.enable(channel, false)?;
            }
            if duty != memory.duty {
                w.push(channel, Function::Duty, duty, 0)?;
                memory.duty = duty;
            }
            if volume > 0 && volume != memory.volume {
                w.push(channel, Function::Volume, volume, 0)?;
            }
            memory.volume = volume;
            if low != memory.timer_low {
                w.push(channel, Function::TimerLow, low, 0)?;
                memory.timer_low = low;
            }
            if retrigger || high != memory.timer_high {
                w.timer_high(channel, high)?;
                memory.timer_high = high;
            }
            memory.timer = timer;
        }

        let [high, low, _, _] = frame[2];
        let timer = ((high as u16) << 8) | low as u16;
        if triangle_timer == 0 && timer != 0 {
            w.enable(Channel::Triangle, true)?;
        } else if triangle_timer != 0 && timer == 0 {
            w.enable(Channel::Triangle, false)?;
        }
        if timer != triangle_timer {
            w.push(Channel::Triangle, Function::TimerLow, low, 0)?;
            w.timer_high(Channel::Triangle, high)?;
        }
        triangle_timer = timer;

        let [_, period, volume, looping] = frame[3];
        if noise_period == 0 && period != 0 {
            w.enable(Channel::Noise, true)?;
        } else if noise_period != 0 && period == 0 {
            w.enable(Channel::Noise, false)?;
        }
        if volume > 0 && volume != noise_volume {
            w.push(Channel::Noise, Function::Volume, volume, 0)?;
        }
        noise_volume = volume;
        if looping != noise_loop {
            w.push(Channel::Noise, Function::NoiseLoop, looping, 0)?;
            noise_loop = looping;
        }
        if period > 0 && period != noise_period {
            w.push(Channel::Noise, Function::NoisePeriod, 16 - period.min(16), 0)?;
            w.push(Channel::Noise, Function::LengthLoad, 0, 0)?;
        }
        noise_period = period;

        let wait = if native {
            1
        } else {
            let boundary = (SAMPLE_RATE as f64 * (i + 1) as f64 / score.rate).floor() as usize;
            boundary.min(score.sample_count).saturating_sub(sample)
        };
        w.events.push(FunctionalEvent::Wait(wait as u32));
        sample += wait;
    }

    if score.sample_count > sample {
        w.events
            .push(FunctionalEvent::Wait((score.sample_count - sample) as u32));
    }

    log::debug!(
        "encoded {} frames into {} functional events",
        score.frames.len(),
        w.events.len()
    );
    Ok(w.events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::ClockRate;
    use crate::chip::state::RawFrame;
    use crate::score::emulate;

    fn score(frames: Vec<RawFrame>, rate: f64, sample_count: usize) -> RawScore {
        RawScore {
            clock: ClockRate::NTSC,
            rate,
            sample_count,
            frames,
        }
    }

    #[test]
    fn native_rate_waits_one_sample_per_frame() {
        let frames = vec![[[0; 4]; 4]; 5];
        let events = encode(&score(frames, 44_100.0, 5)).unwrap();
        let waits: Vec<u32> = events
            .iter()
            .filter_map(|e| match e {
                FunctionalEvent::Wait(n) => Some(*n),
                _ => None,
            })
            .collect();
        assert_eq!(waits, vec![1; 5]);
    }

    #[test]
    fn low_rate_waits_follow_frame_boundaries() {
        let frames = vec![[[0; 4]; 4]; 3];
        let events = encode(&score(frames, 100.0, 1500)).unwrap();
        let waits: Vec<u32> = events
            .iter()
            .filter_map(|e| match e {
                FunctionalEvent::Wait(n) => Some(*n),
                _ => None,
            })
            .collect();
        assert_eq!(waits, vec![441, 441, 441, 177]);
    }

    #[test]
    fn triangle_waits_for_linear_counter() {
        let mut frames = vec![[[0u8; 4]; 4]; 400];
        for frame in frames.iter_mut() {
            frame[2] = [0, 0x80, 0, 0];
        }
        let replayed = emulate(&encode(&score(frames, 44_100.0, 400)).unwrap()).unwrap();
        // The linear counter reloads on the first quarter frame.
        assert_eq!(replayed.frames[0][2], [0, 0, 0, 0]);
        assert_eq!(replayed.frames[399][2], [0, 0x80, 0, 0]);
    }

    #[test]
    fn emulating_an_encoded_score_reproduces_it() {
        let mut frames = vec![[[0u8; 4]; 4]; 8];
        for (i, frame) in frames.iter_mut().enumerate() {
            frame[0] = if (2..6).contains(&i) { [1, 0x20, 12, 2] } else { [0, 0, 0, 2] };
            frame[1][3] = 1;
            frame[3] = if i < 4 { [0, 13, 6, 1] } else { [0, 0, 0, 1] };
        }
        let original = score(frames, 44_100.0, 8);
        let replayed = emulate(&encode(&original).unwrap()).unwrap();
        assert_eq!(replayed, original);
    }

    #[test]
    fn writer_rejects_pairs_outside_the_table() {
        let mut w = Writer { events: Vec::new() };
        assert_eq!(
            w.push(Channel::Triangle, Function::Duty, 0, 0),
            Err(ProtocolError::UnknownFunction {
                channel: Channel::Triangle,
                function: Function::Duty,
            })
        );
        assert!(w.events.is_empty());
        w.enable(Channel::Noise, true).unwrap();
        assert_eq!(
            w.events,
            vec![FunctionalEvent::write(Channel::Status, Function::EnableNoise, 1, 0, 0)]
        );
    }
}
