//! Tempo estimation from note onsets.
use std::collections::BTreeMap;

use crate::chip::SAMPLE_RATE;
use crate::error::{ApulogError, Result};
use crate::score::expressive::{ExpressiveScore, ReducerConfig};

/// Sample indices where each channel starts a new note.
///
/// A note starts wherever the pitch is nonzero and differs from the pitch
/// of the previous sample.
pub fn onsets(score: &ExpressiveScore) -> [Vec<usize>; 4] {
    let mut onsets: [Vec<usize>; 4] = Default::default();
    let mut last = [0u8; 4];
    for (i, frame) in score.frames.iter().enumerate() {
        for channel in 0..4 {
            let note = frame[channel][0];
            if note > 0 && note != last[channel] {
                onsets[channel].push(i);
            }
            last[channel] = note;
        }
    }
    onsets
}

/// Histogram of onset-to-onset intervals longer than the configured minimum.
fn intervals(score: &ExpressiveScore, config: &ReducerConfig) -> BTreeMap<usize, usize> {
    let mut histogram = BTreeMap::new();
    for channel in onsets(score) {
        for pair in channel.windows(2) {
            let interval = pair[1] - pair[0];
            if interval > config.min_interval_samples {
                *histogram.entry(interval).or_insert(0) += 1;
            }
        }
    }
    histogram
}

/// Quantization remainder of `seconds` on a grid of `rate` frames per second.
fn remainder(seconds: f64, rate: f64) -> f64 {
    let quotient = (seconds * rate + 1e-8).floor();
    (seconds - quotient / rate).max(0.0)
}

/// Estimate the frame rate that best divides the note intervals.
///
/// Every candidate from `rate_min` to `rate_max` in steps of `rate_step` is
/// scored by the total remainder of all intervals, weighted by how often
/// each occurs. The lowest total wins; on a tie the slower rate is kept.
///
/// # Errors
///
/// `InvalidConfig` when the candidate grid is empty or unbounded,
/// `InsufficientData` when fewer than `min_intervals` intervals qualify.
pub fn estimate_rate(score: &ExpressiveScore, config: &ReducerConfig) -> Result<f64> {
    config.validate()?;
    let histogram = intervals(score, config);
    let total: usize = histogram.values().sum();
    if total < config.min_intervals {
        return Err(ApulogError::InsufficientData {
            intervals: total,
            required: config.min_intervals,
        });
    }

    let intervals: Vec<(f64, f64)> = histogram
        .into_iter()
        .map(|(samples, count)| (samples as f64 / SAMPLE_RATE as f64, count as f64))
        .collect();

    let candidates = ((config.rate_max - config.rate_min) / config.rate_step).round() as usize + 1;
    let mut best = (config.rate_min, f64::INFINITY);
    for k in 0..candidates {
        let rate = config.rate_min + k as f64 * config.rate_step;
        let error: f64 = intervals
            .iter()
            .map(|&(seconds, count)| remainder(seconds, rate) * count)
            .sum();
        if error < best.1 {
            best = (rate, error);
        }
    }

    log::debug!(
        "estimated {:.3} Hz from {} intervals (error {:.6})",
        best.0,
        total,
        best.1
    );
    Ok(best.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn melody(notes: usize, spacing: usize) -> ExpressiveScore {
        let mut frames = vec![[[0u8; 3]; 4]; notes * spacing];
        for (i, frame) in frames.iter_mut().enumerate() {
            let pitch = if (i / spacing) % 2 == 0 { 60 } else { 64 };
            frame[0] = [pitch, 15, 2];
        }
        ExpressiveScore {
            rate: SAMPLE_RATE as f64,
            sample_count: notes * spacing,
            frames,
        }
    }

    #[test]
    fn onsets_skip_repeats_and_silence() {
        let mut score = melody(3, 100);
        score.frames[150][0] = [0, 0, 0];
        let onsets = onsets(&score);
        assert_eq!(onsets[0], vec![0, 100, 151, 200]);
        assert!(onsets[1].is_empty());
    }

    #[test]
    fn recovers_twenty_hertz() {
        let score = melody(16, 2205);
        let rate = estimate_rate(&score, &ReducerConfig::default()).unwrap();
        assert!((rate - 20.0).abs() < 0.001, "got {rate}");
    }

    #[test]
    fn too_few_intervals() {
        let score = melody(5, 2205);
        match estimate_rate(&score, &ReducerConfig::default()) {
            Err(ApulogError::InsufficientData {
                intervals,
                required,
            }) => {
                assert_eq!(intervals, 4);
                assert_eq!(required, 10);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn short_intervals_do_not_count() {
        let score = melody(40, 40);
        assert!(matches!(
            estimate_rate(&score, &ReducerConfig::default()),
            Err(ApulogError::InsufficientData { intervals: 0, .. })
        ));
    }

    #[test]
    fn rejects_degenerate_rate_grids() {
        let score = melody(16, 2205);
        for config in [
            ReducerConfig {
                rate_step: 0.0,
                ..ReducerConfig::default()
            },
            ReducerConfig {
                rate_step: -0.001,
                ..ReducerConfig::default()
            },
            ReducerConfig {
                rate_min: 24.0,
                rate_max: 1.0,
                ..ReducerConfig::default()
            },
            ReducerConfig {
                rate_min: 0.0,
                ..ReducerConfig::default()
            },
            ReducerConfig {
                rate_max: f64::NAN,
                ..ReducerConfig::default()
            },
        ] {
            assert!(
                matches!(
                    estimate_rate(&score, &config),
                    Err(ApulogError::InvalidConfig(_))
                ),
                "{config:?}"
            );
        }
    }

    #[test]
    fn single_candidate_grid() {
        let score = melody(16, 2205);
        let config = ReducerConfig {
            rate_min: 20.0,
            rate_max: 20.0,
            ..ReducerConfig::default()
        };
        assert_eq!(estimate_rate(&score, &config), Ok(20.0));
    }

    #[test]
    fn remainder_clamps_rounding_noise() {
        assert_eq!(remainder(0.05, 20.0), 0.0);
        assert!(remainder(0.05, 19.0) > 0.0);
    }
}
