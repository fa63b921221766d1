//! Lucky wheel: weighted multiplier bonus unlocked by play

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::outcome::BAND_EPSILON;

/// One wheel segment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelSegment {
    /// Bet multiplier paid when the wheel stops here
    pub multiplier: f64,
    pub probability: f64,
}

/// Result of a lucky spin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LuckySpinOutcome {
    pub multiplier: f64,
    pub payout: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LuckyWheel {
    segments: Vec<WheelSegment>,
}

impl LuckyWheel {
    /// Build a wheel; probabilities must sum to 1.0 and multipliers be positive
    pub fn new(segments: Vec<WheelSegment>) -> ConfigResult<Self> {
        if segments.is_empty() {
            return Err(ConfigError::InvalidParam("lucky wheel has no segments".into()));
        }
        for segment in &segments {
            if !(segment.multiplier.is_finite() && segment.multiplier > 0.0) {
                return Err(ConfigError::InvalidParam(format!(
                    "lucky wheel multiplier {} must be positive",
                    segment.multiplier
                )));
            }
            if !(0.0..=1.0).contains(&segment.probability) {
                return Err(ConfigError::InvalidParam(format!(
                    "lucky wheel probability {} must be within [0, 1]",
                    segment.probability
                )));
            }
        }
        let sum: f64 = segments.iter().map(|s| s.probability).sum();
        if (sum - 1.0).abs() > BAND_EPSILON {
            return Err(ConfigError::InvalidParam(format!(
                "lucky wheel probabilities sum to {sum}, expected 1.0"
            )));
        }
        Ok(Self { segments })
    }

    /// x2 / x3 / x5 / x10 at 70 / 20 / 9 / 1 %
    pub fn classic() -> Self {
        Self {
            segments: vec![
                WheelSegment {
                    multiplier: 2.0,
                    probability: 0.70,
                },
                WheelSegment {
                    multiplier: 3.0,
                    probability: 0.20,
                },
                WheelSegment {
                    multiplier: 5.0,
                    probability: 0.09,
                },
                WheelSegment {
                    multiplier: 10.0,
                    probability: 0.01,
                },
            ],
        }
    }

    pub fn segments(&self) -> &[WheelSegment] {
        &self.segments
    }

    /// Segment multiplier for a uniform draw in `[0, 1)`
    pub fn multiplier_for(&self, draw: f64) -> f64 {
        let mut cumulative = 0.0;
        for segment in &self.segments {
            cumulative += segment.probability;
            if draw <= cumulative {
                return segment.multiplier;
            }
        }
        self.segments.last().map_or(1.0, |s| s.multiplier)
    }

    pub fn spin<R: Rng + ?Sized>(&self, bet: f64, rng: &mut R) -> LuckySpinOutcome {
        let multiplier = self.multiplier_for(rng.random::<f64>());
        LuckySpinOutcome {
            multiplier,
            payout: bet * multiplier,
        }
    }

    /// Mean multiplier paid by the wheel
    pub fn expected_multiplier(&self) -> f64 {
        self.segments.iter().map(|s| s.multiplier * s.probability).sum()
    }
}

impl Default for LuckyWheel {
    fn default() -> Self {
        Self::classic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_classic_wheel_is_valid() {
        let wheel = LuckyWheel::new(LuckyWheel::classic().segments().to_vec());
        assert!(wheel.is_ok());
        assert_relative_eq!(LuckyWheel::classic().expected_multiplier(), 2.55, epsilon = 1e-9);
    }

    #[test]
    fn test_multiplier_for_draw() {
        let wheel = LuckyWheel::classic();
        assert_eq!(wheel.multiplier_for(0.0), 2.0);
        assert_eq!(wheel.multiplier_for(0.70), 2.0);
        assert_eq!(wheel.multiplier_for(0.71), 3.0);
        assert_eq!(wheel.multiplier_for(0.95), 5.0);
        assert_eq!(wheel.multiplier_for(0.995), 10.0);
    }

    #[test]
    fn test_rejects_bad_wheels() {
        assert!(LuckyWheel::new(vec![]).is_err());
        let segment = |multiplier, probability| WheelSegment {
            multiplier,
            probability,
        };
        assert!(LuckyWheel::new(vec![segment(2.0, 0.5)]).is_err());
        assert!(LuckyWheel::new(vec![segment(0.0, 1.0)]).is_err());
    }

    #[test]
    fn test_spin_pays_bet_times_multiplier() {
        let wheel = LuckyWheel::classic();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..100 {
            let outcome = wheel.spin(4.0, &mut rng);
            assert!([2.0, 3.0, 5.0, 10.0].contains(&outcome.multiplier));
            assert_relative_eq!(outcome.payout, 4.0 * outcome.multiplier);
        }
    }
}
