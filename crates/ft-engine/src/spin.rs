//! Spin request and spin result

use serde::{Deserialize, Serialize};

use crate::config::WinTierThresholds;
use crate::outcome::OutcomeCategory;
use crate::paytable::{Evaluation, Grid, LineWin};

/// Presentation speed. Carried through the result, never changes the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimingProfile {
    /// Normal gameplay timing
    #[default]
    Normal,
    /// Fast/Turbo mode
    Turbo,
}

impl TimingProfile {
    /// Suggested reel spin duration for a front end (ms)
    pub fn reel_spin_duration_ms(&self) -> u32 {
        match self {
            TimingProfile::Normal => 2000,
            TimingProfile::Turbo => 500,
        }
    }
}

/// Parameters of a single spin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpinConfig {
    /// Stake, must be positive
    pub bet: f64,
    /// Free spins left including this one; 0 for a paid spin
    #[serde(default)]
    pub free_spins_remaining: u32,
    /// Win multiplier, 1.0 outside free spins
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    #[serde(default)]
    pub timing: TimingProfile,
}

fn default_multiplier() -> f64 {
    1.0
}

impl SpinConfig {
    /// Paid spin at `bet`
    pub fn new(bet: f64) -> Self {
        Self {
            bet,
            free_spins_remaining: 0,
            multiplier: 1.0,
            timing: TimingProfile::Normal,
        }
    }

    /// Mark as a free spin with `remaining` spins left (this one included)
    pub fn with_free_spins(mut self, remaining: u32, multiplier: f64) -> Self {
        self.free_spins_remaining = remaining;
        self.multiplier = multiplier;
        self
    }

    pub fn with_timing(mut self, timing: TimingProfile) -> Self {
        self.timing = timing;
        self
    }

    pub fn is_free_spin(&self) -> bool {
        self.free_spins_remaining > 0
    }
}

/// Free spins awarded by a scatter trigger
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FreeSpinAward {
    pub spins: u32,
    pub multiplier: f64,
}

/// Presentation tier of an actual payout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WinTier {
    #[default]
    None,
    Normal,
    Big,
    Mega,
}

impl WinTier {
    /// Tier of `win` at stake `bet`
    pub fn classify(win: f64, bet: f64, thresholds: &WinTierThresholds) -> Self {
        if win <= 0.0 || bet <= 0.0 {
            return WinTier::None;
        }
        let ratio = win / bet;
        if ratio >= thresholds.mega_win {
            WinTier::Mega
        } else if ratio >= thresholds.big_win {
            WinTier::Big
        } else {
            WinTier::Normal
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            WinTier::None => "none",
            WinTier::Normal => "normal",
            WinTier::Big => "big",
            WinTier::Mega => "mega",
        }
    }
}

/// Complete spin result. Built fresh for every spin and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinResult {
    /// Final grid, reel-major
    pub grid: Grid,
    pub bet: f64,
    /// Total win, multiplier applied
    pub total_win: f64,
    /// Winning payline indices in declared order
    pub winning_lines: Vec<usize>,
    pub line_wins: Vec<LineWin>,
    /// Category the grid was generated for
    pub category: OutcomeCategory,
    /// Bonus scatters anywhere on the grid
    pub scatter_count: usize,
    /// Free spins awarded by this spin
    pub free_spins: Option<FreeSpinAward>,
    /// Is this a free spin (within a bonus round)?
    pub is_free_spin: bool,
    pub multiplier: f64,
    pub win_tier: WinTier,
    pub timing: TimingProfile,
}

impl SpinResult {
    pub(crate) fn from_evaluation(
        grid: Grid,
        category: OutcomeCategory,
        config: &SpinConfig,
        evaluation: Evaluation,
        thresholds: &WinTierThresholds,
    ) -> Self {
        Self {
            win_tier: WinTier::classify(evaluation.total_win, config.bet, thresholds),
            grid,
            bet: config.bet,
            total_win: evaluation.total_win,
            winning_lines: evaluation.winning_lines,
            line_wins: evaluation.line_wins,
            category,
            scatter_count: 0,
            free_spins: None,
            is_free_spin: config.is_free_spin(),
            multiplier: config.multiplier,
            timing: config.timing,
        }
    }

    pub(crate) fn with_scatters(mut self, count: usize, award: Option<FreeSpinAward>) -> Self {
        self.scatter_count = count;
        self.free_spins = award;
        self
    }

    /// Check if this is a win
    pub fn is_win(&self) -> bool {
        self.total_win > 0.0
    }

    /// Win-to-bet ratio
    pub fn win_ratio(&self) -> f64 {
        if self.bet > 0.0 {
            self.total_win / self.bet
        } else {
            0.0
        }
    }

    pub fn triggers_free_spins(&self) -> bool {
        self.free_spins.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spin_config_builders() {
        let paid = SpinConfig::new(5.0);
        assert!(!paid.is_free_spin());
        assert_eq!(paid.multiplier, 1.0);

        let free = SpinConfig::new(5.0)
            .with_free_spins(4, 3.0)
            .with_timing(TimingProfile::Turbo);
        assert!(free.is_free_spin());
        assert_eq!(free.multiplier, 3.0);
        assert_eq!(free.timing, TimingProfile::Turbo);
        assert!(
            free.timing.reel_spin_duration_ms() < TimingProfile::Normal.reel_spin_duration_ms()
        );
    }

    #[test]
    fn test_win_tier_thresholds() {
        let t = WinTierThresholds::default();
        assert_eq!(WinTier::classify(0.0, 1.0, &t), WinTier::None);
        assert_eq!(WinTier::classify(2.0, 1.0, &t), WinTier::Normal);
        assert_eq!(WinTier::classify(10.0, 1.0, &t), WinTier::Big);
        assert_eq!(WinTier::classify(45.0, 1.0, &t), WinTier::Mega);
        assert_eq!(WinTier::classify(45.0, 5.0, &t), WinTier::Normal);
    }

    #[test]
    fn test_spin_config_json_defaults() {
        let config: SpinConfig = serde_json::from_str(r#"{"bet": 2.5}"#).unwrap();
        assert_eq!(config, SpinConfig::new(2.5));
    }
}
