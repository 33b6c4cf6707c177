//! Lossy projections of an expressive score.
//!
//! Both keep only pitches. [`SeparatedScore`] keeps one pitch per voice;
//! [`BlendedScore`] forgets which melodic voice played what and keeps the
//! sorted set of sounding pulse/triangle pitches. Neither inverse can
//! restore velocity or timbre, and the blended inverse reassigns pitches
//! to voices in ascending order.
use crate::score::expressive::{ExpressiveFrame, ExpressiveScore};

/// Velocity given to re-expanded pulse and noise notes.
pub const DEFAULT_VELOCITY: u8 = 15;

/// One pitch per voice per frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SeparatedScore {
    pub rate: f64,
    pub sample_count: usize,
    pub frames: Vec<[u8; 4]>,
}

/// Sorted nonzero pitches of the three melodic voices per frame.
#[derive(Debug, Clone, PartialEq)]
pub struct BlendedScore {
    pub rate: f64,
    pub sample_count: usize,
    pub frames: Vec<Vec<u8>>,
}

fn voiced(channel: usize, pitch: u8) -> [u8; 3] {
    let velocity = if pitch > 0 && channel != 2 {
        DEFAULT_VELOCITY
    } else {
        0
    };
    [pitch, velocity, 0]
}

impl SeparatedScore {
    pub fn from_expressive(score: &ExpressiveScore) -> Self {
        Self {
            rate: score.rate,
            sample_count: score.sample_count,
            frames: score
                .frames
                .iter()
                .map(|frame| frame.map(|slot| slot[0]))
                .collect(),
        }
    }

    /// Re-expand with full velocity on sounding pulse/noise notes.
    pub fn to_expressive(&self) -> ExpressiveScore {
        let frames = self
            .frames
            .iter()
            .map(|pitches| {
                let mut frame: ExpressiveFrame = [[0; 3]; 4];
                for (channel, (slot, &pitch)) in frame.iter_mut().zip(pitches).enumerate() {
                    *slot = voiced(channel, pitch);
                }
                frame
            })
            .collect();
        ExpressiveScore {
            rate: self.rate,
            sample_count: self.sample_count,
            frames,
        }
    }
}

impl BlendedScore {
    pub fn from_expressive(score: &ExpressiveScore) -> Self {
        let frames = score
            .frames
            .iter()
            .map(|frame| {
                let mut pitches: Vec<u8> = frame[..3]
                    .iter()
                    .map(|slot| slot[0])
                    .filter(|&p| p > 0)
                    .collect();
                pitches.sort_unstable();
                pitches
            })
            .collect();
        Self {
            rate: score.rate,
            sample_count: score.sample_count,
            frames,
        }
    }

    /// Hand pitches to pulse 1, pulse 2 and triangle in ascending order.
    ///
    /// Pitches beyond the third are dropped.
    pub fn to_expressive(&self) -> ExpressiveScore {
        let frames = self
            .frames
            .iter()
            .map(|pitches| {
                let mut frame: ExpressiveFrame = [[0; 3]; 4];
                for (channel, &pitch) in pitches.iter().take(3).enumerate() {
                    frame[channel] = voiced(channel, pitch);
                }
                frame
            })
            .collect();
        ExpressiveScore {
            rate: self.rate,
            sample_count: self.sample_count,
            frames,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expressive(frames: Vec<ExpressiveFrame>) -> ExpressiveScore {
        ExpressiveScore {
            rate: 24.0,
            sample_count: frames.len() * 1837,
            frames,
        }
    }

    #[test]
    fn separated_keeps_pitch_only() {
        let score = expressive(vec![[[60, 9, 1], [0, 0, 2], [45, 1, 0], [12, 4, 1]]]);
        let separated = SeparatedScore::from_expressive(&score);
        assert_eq!(separated.frames, vec![[60, 0, 45, 12]]);
        let back = separated.to_expressive();
        assert_eq!(back.frames[0], [[60, 15, 0], [0, 0, 0], [45, 0, 0], [12, 15, 0]]);
        assert_eq!(back.rate, 24.0);
    }

    #[test]
    fn blended_sorts_and_ignores_noise() {
        let score = expressive(vec![
            [[72, 9, 1], [0, 0, 2], [48, 1, 0], [12, 4, 1]],
            [[0, 0, 0], [0, 0, 0], [0, 0, 0], [5, 4, 1]],
        ]);
        let blended = BlendedScore::from_expressive(&score);
        assert_eq!(blended.frames, vec![vec![48, 72], vec![]]);
        let back = blended.to_expressive();
        assert_eq!(back.frames[0][0], [48, 15, 0]);
        assert_eq!(back.frames[0][1], [72, 15, 0]);
        assert_eq!(back.frames[0][2], [0, 0, 0]);
        assert_eq!(back.frames[1], [[0; 3]; 4]);
    }

    #[test]
    fn blended_round_trip_is_idempotent() {
        let blended = BlendedScore {
            rate: 24.0,
            sample_count: 3 * 1837,
            frames: vec![vec![40, 52, 64], vec![67], vec![]],
        };
        let again = BlendedScore::from_expressive(&blended.to_expressive());
        assert_eq!(again, blended);
    }
}
