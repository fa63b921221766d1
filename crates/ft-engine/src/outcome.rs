//! Outcome categories and the probability bands that select them

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Tolerance for the band sum check
pub const BAND_EPSILON: f64 = 1e-9;

/// Coarse class of a spin result, decided before the grid is generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeCategory {
    Loss,
    Small,
    Medium,
    Big,
    Mega,
}

impl OutcomeCategory {
    /// All categories, rarest first (the classification walk order)
    pub const ALL: [OutcomeCategory; 5] = [
        OutcomeCategory::Mega,
        OutcomeCategory::Big,
        OutcomeCategory::Medium,
        OutcomeCategory::Small,
        OutcomeCategory::Loss,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            OutcomeCategory::Loss => "loss",
            OutcomeCategory::Small => "small",
            OutcomeCategory::Medium => "medium",
            OutcomeCategory::Big => "big",
            OutcomeCategory::Mega => "mega",
        }
    }

    /// Stable index for per-category tables
    pub fn index(&self) -> usize {
        match self {
            OutcomeCategory::Loss => 0,
            OutcomeCategory::Small => 1,
            OutcomeCategory::Medium => 2,
            OutcomeCategory::Big => 3,
            OutcomeCategory::Mega => 4,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

impl fmt::Display for OutcomeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Probability of each outcome category.
///
/// Bands must each lie in `[0, 1]` and sum to 1.0; they are never
/// normalized, a definition that does not add up is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryBands {
    pub mega: f64,
    pub big: f64,
    pub medium: f64,
    pub small: f64,
    pub loss: f64,
}

impl CategoryBands {
    pub fn new(mega: f64, big: f64, medium: f64, small: f64, loss: f64) -> Self {
        Self {
            mega,
            big,
            medium,
            small,
            loss,
        }
    }

    /// Bands of the classic Fortune Tiger table
    pub fn fortune_tiger() -> Self {
        Self::new(0.001, 0.05, 0.15, 0.40, 0.399)
    }

    pub fn probability(&self, category: OutcomeCategory) -> f64 {
        match category {
            OutcomeCategory::Mega => self.mega,
            OutcomeCategory::Big => self.big,
            OutcomeCategory::Medium => self.medium,
            OutcomeCategory::Small => self.small,
            OutcomeCategory::Loss => self.loss,
        }
    }

    pub fn sum(&self) -> f64 {
        self.mega + self.big + self.medium + self.small + self.loss
    }

    /// Probability that a spin is classified as any win
    pub fn win_probability(&self) -> f64 {
        1.0 - self.loss
    }

    pub fn validate(&self) -> ConfigResult<()> {
        for category in OutcomeCategory::ALL {
            let value = self.probability(category);
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidBand {
                    category: category.name(),
                    value,
                });
            }
        }

        let sum = self.sum();
        if (sum - 1.0).abs() > BAND_EPSILON {
            return Err(ConfigError::BandsDoNotSumToOne { sum });
        }
        Ok(())
    }

    /// Map a uniform draw in `[0, 1)` to a category.
    ///
    /// Walks mega, big, medium, small with a cumulative upper bound; a draw
    /// equal to a bound belongs to the rarer category. Zero-width bands never
    /// match.
    pub fn classify(&self, draw: f64) -> OutcomeCategory {
        let mut upper = 0.0;
        let mut last_open = None;

        for category in OutcomeCategory::ALL {
            let width = self.probability(category);
            if width <= 0.0 {
                continue;
            }
            upper += width;
            last_open = Some(category);
            if category != OutcomeCategory::Loss && draw <= upper {
                return category;
            }
        }

        // Rounding can leave a sliver above the last bound
        if self.loss > 0.0 {
            OutcomeCategory::Loss
        } else {
            last_open.unwrap_or(OutcomeCategory::Loss)
        }
    }
}

impl Default for CategoryBands {
    fn default() -> Self {
        Self::fortune_tiger()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bands_are_valid() {
        let bands = CategoryBands::default();
        assert!(bands.validate().is_ok());
        assert!((bands.win_probability() - 0.601).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_bad_sum() {
        let bands = CategoryBands::new(0.0, 0.1, 0.2, 0.3, 0.3);
        match bands.validate() {
            Err(ConfigError::BandsDoNotSumToOne { sum }) => assert!((sum - 0.9).abs() < 1e-9),
            other => panic!("expected BandsDoNotSumToOne, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_negative_band() {
        let bands = CategoryBands::new(-0.1, 0.2, 0.2, 0.3, 0.4);
        assert!(matches!(
            bands.validate(),
            Err(ConfigError::InvalidBand { category: "mega", .. })
        ));
    }

    #[test]
    fn test_classify_walk_order() {
        let bands = CategoryBands::fortune_tiger();
        assert_eq!(bands.classify(0.0), OutcomeCategory::Mega);
        assert_eq!(bands.classify(0.0005), OutcomeCategory::Mega);
        assert_eq!(bands.classify(0.02), OutcomeCategory::Big);
        assert_eq!(bands.classify(0.1), OutcomeCategory::Medium);
        assert_eq!(bands.classify(0.5), OutcomeCategory::Small);
        assert_eq!(bands.classify(0.7), OutcomeCategory::Loss);
        assert_eq!(bands.classify(0.999_999), OutcomeCategory::Loss);
    }

    #[test]
    fn test_boundary_goes_to_rarer_category() {
        let bands = CategoryBands::new(0.25, 0.25, 0.0, 0.25, 0.25);
        assert_eq!(bands.classify(0.25), OutcomeCategory::Mega);
        assert_eq!(bands.classify(0.50), OutcomeCategory::Big);
        // Medium has zero width and is skipped
        assert_eq!(bands.classify(0.50001), OutcomeCategory::Small);
        assert_eq!(bands.classify(0.75), OutcomeCategory::Small);
        assert_eq!(bands.classify(0.75001), OutcomeCategory::Loss);
    }

    #[test]
    fn test_zero_loss_never_classifies_loss() {
        let bands = CategoryBands::new(0.0, 0.0, 0.5, 0.5, 0.0);
        assert_eq!(bands.classify(0.3), OutcomeCategory::Medium);
        assert_eq!(bands.classify(0.999_999_999), OutcomeCategory::Small);
    }

    #[test]
    fn test_category_names_roundtrip() {
        for category in OutcomeCategory::ALL {
            assert_eq!(OutcomeCategory::from_name(category.name()), Some(category));
        }
        assert_eq!(OutcomeCategory::from_name("jackpot"), None);
    }
}
