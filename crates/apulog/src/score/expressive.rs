//! Expressive score: MIDI pitch, velocity and timbre per voice.
use std::ops::RangeInclusive;

use crate::chip::{ClockRate, SAMPLE_RATE};
use crate::error::{ApulogError, ProtocolError, Result};
use crate::score::raw::{RawScore, is_native_rate};
use crate::score::tempo;

/// One frame of an expressive score: `[channel][pitch, velocity, timbre]`.
pub type ExpressiveFrame = [[u8; 3]; 4];

/// MIDI-quantized score.
///
/// Pitch 0 means silence. For the noise channel the "pitch" is the
/// inverted noise period (1..=16) carried over from the raw score.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressiveScore {
    pub rate: f64,
    pub sample_count: usize,
    pub frames: Vec<ExpressiveFrame>,
}

/// Tunables of the pitch/tempo reducer.
#[derive(Debug, Clone, PartialEq)]
pub struct ReducerConfig {
    /// Pitches outside this range are zeroed.
    pub midi_range: RangeInclusive<u8>,
    /// Onset intervals must be strictly longer than this many samples.
    pub min_interval_samples: usize,
    /// Fewest qualifying intervals tempo estimation accepts.
    pub min_intervals: usize,
    pub rate_min: f64,
    pub rate_max: f64,
    pub rate_step: f64,
}

impl Default for ReducerConfig {
    fn default() -> Self {
        Self {
            midi_range: 21..=108,
            min_interval_samples: 44,
            min_intervals: 10,
            rate_min: 1.0,
            rate_max: 24.0,
            rate_step: 0.001,
        }
    }
}

impl ReducerConfig {
    /// Check that the candidate rate grid is finite, positive and ascending.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` naming the first bad setting.
    pub fn validate(&self) -> Result<()> {
        let Self {
            rate_min,
            rate_max,
            rate_step,
            ..
        } = *self;
        if !(rate_step.is_finite() && rate_step > 0.0) {
            return Err(ApulogError::InvalidConfig("rate_step must be positive"));
        }
        if !(rate_min.is_finite() && rate_min > 0.0) {
            return Err(ApulogError::InvalidConfig("rate_min must be positive"));
        }
        if !(rate_max.is_finite() && rate_max >= rate_min) {
            return Err(ApulogError::InvalidConfig(
                "rate_max must not be below rate_min",
            ));
        }
        Ok(())
    }
}

fn require_native(rate: f64) -> std::result::Result<(), ProtocolError> {
    if is_native_rate(rate) {
        Ok(())
    } else {
        Err(ProtocolError::SampleRateMismatch {
            expected: SAMPLE_RATE as f64,
            actual: rate,
        })
    }
}

/// Frequency in Hz of a pulse (`divisor` 16) or triangle (`divisor` 32) period.
pub fn period_to_frequency(clock: ClockRate, period: u16, divisor: f64) -> f64 {
    clock.hz() as f64 / (divisor * (period as f64 + 1.0))
}

/// Nearest MIDI pitch of `frequency`, or 0 outside `range`.
pub fn frequency_to_midi(frequency: f64, range: &RangeInclusive<u8>) -> u8 {
    let m = (69.0 + 12.0 * (frequency / 440.0).log2()).round();
    if m >= *range.start() as f64 && m <= *range.end() as f64 {
        m as u8
    } else {
        0
    }
}

/// Nearest period producing MIDI pitch `pitch`; pitch 0 is period 0.
pub fn midi_to_period(clock: ClockRate, pitch: u8, divisor: f64) -> u16 {
    if pitch == 0 {
        return 0;
    }
    let f = 440.0 * 2f64.powf((pitch as f64 - 69.0) / 12.0);
    let t = (clock.hz() as f64 / (divisor * f) - 1.0).round();
    t.clamp(0.0, u16::MAX as f64) as u16
}

const DIVISORS: [f64; 3] = [16.0, 16.0, 32.0];

/// Quantize a 44.1 kHz raw score to MIDI pitches.
///
/// Pulses and triangle get the nearest MIDI pitch of their period (zeroed
/// outside `config.midi_range`); noise keeps its inverted period as pitch.
/// Velocity is the volume wherever the pitch is nonzero. Timbre is copied.
pub fn raw_to_expressive(
    raw: &RawScore,
    config: &ReducerConfig,
) -> std::result::Result<ExpressiveScore, ProtocolError> {
    require_native(raw.rate)?;

    let frames = raw
        .frames
        .iter()
        .map(|frame| {
            let mut out: ExpressiveFrame = [[0; 3]; 4];
            for (channel, divisor) in DIVISORS.iter().enumerate() {
                let [high, low, _, _] = frame[channel];
                let period = ((high as u16) << 8) | low as u16;
                let f = period_to_frequency(raw.clock, period, *divisor);
                out[channel][0] = frequency_to_midi(f, &config.midi_range);
            }
            out[3][0] = frame[3][1];
            for channel in 0..4 {
                out[channel][1] = if out[channel][0] > 0 { frame[channel][2] } else { 0 };
                out[channel][2] = frame[channel][3];
            }
            out
        })
        .collect();

    Ok(ExpressiveScore {
        rate: raw.rate,
        sample_count: raw.sample_count,
        frames,
    })
}

/// Rebuild a raw score from MIDI pitches.
///
/// The score keeps its rate; [`encode`](super::encode) spreads lower-rate
/// frames back over 44.1 kHz samples.
pub fn expressive_to_raw(score: &ExpressiveScore, clock: ClockRate) -> RawScore {
    let frames = score
        .frames
        .iter()
        .map(|frame| {
            let mut out = [[0u8; 4]; 4];
            for (channel, divisor) in DIVISORS.iter().enumerate() {
                let t = midi_to_period(clock, frame[channel][0], *divisor);
                out[channel][0] = ((t & 0x700) >> 8) as u8;
                out[channel][1] = (t & 0xFF) as u8;
            }
            for channel in 0..4 {
                out[channel][2] = frame[channel][1];
                out[channel][3] = frame[channel][2];
            }
            out[3][1] = frame[3][0];
            out
        })
        .collect();

    RawScore {
        clock,
        rate: score.rate,
        sample_count: score.sample_count,
        frames,
    }
}

/// Most frequent value; ties go to the smallest.
fn mode(values: impl Iterator<Item = u8>) -> u8 {
    let mut counts = [0usize; 256];
    for v in values {
        counts[v as usize] += 1;
    }
    let mut best = 0usize;
    for (value, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = value;
        }
    }
    best as u8
}

/// Resample a 44.1 kHz expressive score to `rate` frames per second.
///
/// With `None` the rate is estimated from note onsets (see
/// [`tempo::estimate_rate`]). A rate of 44.1 kHz returns the score as is.
///
/// Window `i` covers samples `floor(i * 44100 / rate)` up to
/// `floor((i + 1) * 44100 / rate)`. Per channel, if any sample in the window
/// sounds, each field is the mode over the sounding samples; otherwise pitch
/// and velocity are zero and timbre is the mode over the whole window.
///
/// # Errors
///
/// `SampleRateMismatch` if the input is not at 44.1 kHz, `InvalidConfig`
/// for a nonpositive `rate` or a bad rate grid in `config`,
/// `InsufficientData` if the rate must be estimated and too few onsets exist.
pub fn downsample(
    score: &ExpressiveScore,
    rate: Option<f64>,
    config: &ReducerConfig,
) -> Result<ExpressiveScore> {
    require_native(score.rate)?;
    config.validate()?;
    let rate = match rate {
        Some(rate) if is_native_rate(rate) => return Ok(score.clone()),
        Some(rate) if !(rate.is_finite() && rate > 0.0) => {
            return Err(ApulogError::InvalidConfig("frame rate must be positive"));
        }
        Some(rate) => rate,
        None => tempo::estimate_rate(score, config)?,
    };

    let ndown = (score.sample_count as f64 * rate / SAMPLE_RATE as f64).floor() as usize;
    let boundary = |i: usize| (i as f64 * SAMPLE_RATE as f64 / rate).floor() as usize;
    let len = score.frames.len();
    let frames = (0..ndown)
        .map(|i| {
            let lo = boundary(i).min(len);
            let hi = boundary(i + 1).min(len);
            let slice = &score.frames[lo..hi];
            let mut out: ExpressiveFrame = [[0; 3]; 4];
            for (channel, slot) in out.iter_mut().enumerate() {
                let sounding = || slice.iter().map(move |f| f[channel]).filter(|c| c[0] != 0);
                if sounding().next().is_some() {
                    for (field, value) in slot.iter_mut().enumerate() {
                        *value = mode(sounding().map(|c| c[field]));
                    }
                } else {
                    slot[2] = mode(slice.iter().map(|f| f[channel][2]));
                }
            }
            out
        })
        .collect();

    log::debug!("downsampled {} samples to {} frames at {:.3} Hz", len, ndown, rate);
    Ok(ExpressiveScore {
        rate,
        sample_count: score.sample_count,
        frames,
    })
}
