//! Raw score: per-sample hardware parameters of the four voices.
use crate::chip::state::{NesApuState, RawFrame};
use crate::chip::{ClockRate, SAMPLE_RATE};
use crate::error::ProtocolError;
use crate::functional::{FunctionWrite, FunctionalEvent};
use crate::vgm::split_clock;

/// Per-sample parameter matrix produced by the timing emulator.
///
/// `frames[i][channel]` holds, for the pulses, `[period_hi, period_lo,
/// volume, duty]`; for the triangle `[period_hi, period_lo, 0, 0]`; for
/// the noise `[0, 16 - period, volume, loop]`. A silent voice has zero
/// period and volume but still reports its timbre field.
///
/// Emulated scores are at 44.1 kHz with one frame per sample. A score
/// rebuilt from a downsampled expressive score keeps the lower `rate`, and
/// `sample_count` still counts 44.1 kHz samples.
#[derive(Debug, Clone, PartialEq)]
pub struct RawScore {
    pub clock: ClockRate,
    pub rate: f64,
    pub sample_count: usize,
    pub frames: Vec<RawFrame>,
}

impl RawScore {
    /// Whether frames are at the native 44.1 kHz sample rate.
    pub fn is_native_rate(&self) -> bool {
        is_native_rate(self.rate)
    }

    /// 11-bit period of a pulse or triangle channel at frame `index`.
    pub fn period(&self, index: usize, channel: usize) -> Option<u16> {
        let slot = self.frames.get(index)?.get(channel)?;
        Some(((slot[0] as u16) << 8) | slot[1] as u16)
    }
}

pub(crate) fn is_native_rate(rate: f64) -> bool {
    (rate - SAMPLE_RATE as f64).abs() < 1e-6
}

/// Replay a functional log through the timing emulator.
///
/// Writes take effect at the sample where they occur, after that sample's
/// frame-sequencer tick and before its state is recorded. Writes after the
/// final wait never reach an output sample and are only validated.
///
/// # Errors
///
/// A malformed log (clock missing or misplaced) or any write outside the
/// function table is a `ProtocolError`.
pub fn emulate(events: &[FunctionalEvent]) -> Result<RawScore, ProtocolError> {
    let (clock, body) = split_clock(events, FunctionalEvent::clock)?;

    let sample_count: usize = body
        .iter()
        .map(|e| match e {
            FunctionalEvent::Wait(n) => *n as usize,
            _ => 0,
        })
        .sum();

    let mut apu = NesApuState::new(clock);
    let mut frames: Vec<RawFrame> = Vec::with_capacity(sample_count);
    let mut pending: Vec<FunctionWrite> = Vec::new();

    for event in body {
        match event {
            FunctionalEvent::Clock(_) => {}
            FunctionalEvent::FunctionWrite(write) => pending.push(*write),
            FunctionalEvent::Wait(0) => {}
            FunctionalEvent::Wait(n) => {
                apu.step();
                for write in pending.drain(..) {
                    apu.write(&write)?;
                }
                frames.push(apu.frame());
                for _ in 1..*n {
                    apu.step();
                    frames.push(apu.frame());
                }
            }
        }
    }
    if !pending.is_empty() {
        let mut scratch = apu.clone();
        for write in &pending {
            scratch.write(write)?;
        }
    }

    log::debug!(
        "emulated {} samples at {} from {} events",
        frames.len(),
        clock,
        events.len()
    );
    Ok(RawScore {
        clock,
        rate: SAMPLE_RATE as f64,
        sample_count,
        frames,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::{Channel, Function, offset_of};

    fn w(channel: Channel, function: Function, value: u8) -> FunctionalEvent {
        let offset = offset_of(channel, function).unwrap();
        FunctionalEvent::write(channel, function, value, 0, offset)
    }

    #[test]
    fn writes_land_on_their_sample() {
        let events = vec![
            FunctionalEvent::Clock(ClockRate::NTSC),
            FunctionalEvent::Wait(2),
            w(Channel::Noise, Function::ConstantVolume, 1),
            w(Channel::Noise, Function::Volume, 5),
            FunctionalEvent::Wait(0),
            w(Channel::Noise, Function::LengthLoad, 1),
            FunctionalEvent::Wait(2),
        ];
        let score = emulate(&events).unwrap();
        assert_eq!(score.sample_count, 4);
        assert_eq!(score.frames.len(), 4);
        assert_eq!(score.frames[1][3], [0, 0, 0, 0]);
        assert_eq!(score.frames[2][3], [0, 16, 5, 0]);
        assert_eq!(score.frames[3][3], [0, 16, 5, 0]);
    }

    #[test]
    fn trailing_writes_are_validated() {
        let events = vec![
            FunctionalEvent::Clock(ClockRate::NTSC),
            FunctionalEvent::Wait(1),
            FunctionalEvent::write(Channel::Triangle, Function::Volume, 1, 0, 0),
        ];
        assert!(matches!(
            emulate(&events),
            Err(ProtocolError::UnknownFunction { .. })
        ));
    }

    #[test]
    fn empty_log_is_empty_score() {
        let score = emulate(&[FunctionalEvent::Clock(ClockRate::PAL)]).unwrap();
        assert_eq!(score.sample_count, 0);
        assert!(score.frames.is_empty());
        assert!(score.is_native_rate());
    }
}
