//! Envelope generator shared by the pulse and noise channels.

/// 15-step decay envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Envelope {
    /// Set by a length-counter load; restarts the decay on the next quarter frame.
    pub start: bool,
    divider: u8,
    decay: u8,
}

impl Envelope {
    /// Current decay level (0..=15).
    pub fn decay(&self) -> u8 {
        self.decay
    }

    /// Quarter-frame clock.
    ///
    /// `period` is the channel's volume field, `looping` its length-halt bit.
    pub fn clock(&mut self, period: u8, looping: bool) {
        if self.start {
            self.start = false;
            self.decay = 15;
            self.divider = 0;
            return;
        }
        self.divider += 1;
        if self.divider > period {
            self.divider = 0;
            if looping && self.decay == 0 {
                self.decay = 15;
            } else if self.decay > 0 {
                self.decay -= 1;
            }
        }
    }

    /// Output volume: the volume field in constant mode, the decay level otherwise.
    pub fn volume(&self, constant: bool, volume: u8) -> u8 {
        if constant { volume } else { self.decay }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decays_once_per_period() {
        let mut env = Envelope {
            start: true,
            ..Default::default()
        };
        env.clock(1, false);
        assert_eq!(env.decay(), 15);
        env.clock(1, false);
        assert_eq!(env.decay(), 15);
        env.clock(1, false);
        assert_eq!(env.decay(), 14);
        for _ in 0..40 {
            env.clock(1, false);
        }
        assert_eq!(env.decay(), 0);
    }

    #[test]
    fn loops_at_zero() {
        let mut env = Envelope::default();
        env.clock(0, true);
        assert_eq!(env.decay(), 15);
        assert_eq!(env.volume(true, 3), 3);
        assert_eq!(env.volume(false, 3), 15);
    }
}
