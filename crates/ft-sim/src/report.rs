//! Simulation tallies and the final report

use std::fmt;

use ft_engine::{GameDefinition, OutcomeCategory, SpinResult};
use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::error::SimResult;

/// Raw counters of one chunk
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tally {
    pub rounds: u64,
    /// Paid and free spins
    pub spins: u64,
    pub free_spins: u64,
    pub total_bet: f64,
    pub total_win: f64,
    /// Spins that paid something
    pub hits: u64,
    /// Rounds that paid something, free spins included
    pub round_hits: u64,
    pub feature_triggers: u64,
    /// Rounds cut short by the free spin cap
    pub capped_rounds: u64,
    pub category_spins: [u64; 5],
    pub category_wins: [f64; 5],
    /// Sum of squared round returns, in bet multiples
    pub round_return_sq: f64,
    pub max_round_return: f64,
}

impl Tally {
    pub fn record_spin(&mut self, result: &SpinResult) {
        self.spins += 1;
        if result.is_free_spin {
            self.free_spins += 1;
        }
        if result.is_win() {
            self.hits += 1;
        }
        if result.triggers_free_spins() {
            self.feature_triggers += 1;
        }
        let slot = result.category.index();
        self.category_spins[slot] += 1;
        self.category_wins[slot] += result.total_win;
        self.total_win += result.total_win;
    }

    pub fn finish_round(&mut self, bet: f64, round_win: f64) {
        let ratio = round_win / bet;
        self.rounds += 1;
        self.total_bet += bet;
        if round_win > 0.0 {
            self.round_hits += 1;
        }
        self.round_return_sq += ratio * ratio;
        self.max_round_return = self.max_round_return.max(ratio);
    }

    pub fn merge(&mut self, other: &Tally) {
        self.rounds += other.rounds;
        self.spins += other.spins;
        self.free_spins += other.free_spins;
        self.total_bet += other.total_bet;
        self.total_win += other.total_win;
        self.hits += other.hits;
        self.round_hits += other.round_hits;
        self.feature_triggers += other.feature_triggers;
        self.capped_rounds += other.capped_rounds;
        for (mine, theirs) in self.category_spins.iter_mut().zip(other.category_spins) {
            *mine += theirs;
        }
        for (mine, theirs) in self.category_wins.iter_mut().zip(other.category_wins) {
            *mine += theirs;
        }
        self.round_return_sq += other.round_return_sq;
        self.max_round_return = self.max_round_return.max(other.max_round_return);
    }
}

/// Per-category breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub category: OutcomeCategory,
    pub spins: u64,
    /// Share of all spins
    pub frequency: f64,
    /// Configured band probability
    pub expected_frequency: f64,
    pub total_win: f64,
    /// Contribution to RTP
    pub rtp_share: f64,
}

/// Result of a batch simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimReport {
    pub game_id: String,
    pub seed: u64,
    pub bet: f64,
    /// Paid rounds
    pub rounds: u64,
    pub free_spins: u64,
    pub total_bet: f64,
    pub total_win: f64,
    pub rtp: f64,
    pub target_rtp: f64,
    /// Fraction of spins that paid
    pub hit_rate: f64,
    /// Fraction of paid rounds that paid, bonus included
    pub round_hit_rate: f64,
    pub feature_triggers: u64,
    /// Triggers per paid round
    pub trigger_rate: f64,
    pub capped_rounds: u64,
    /// Largest round return, in bet multiples
    pub max_win_ratio: f64,
    /// Standard deviation of the round return, in bet multiples
    pub std_dev: f64,
    pub categories: Vec<CategoryStats>,
}

fn ratio(a: f64, b: f64) -> f64 {
    if b > 0.0 { a / b } else { 0.0 }
}

impl SimReport {
    pub fn from_tally(definition: &GameDefinition, config: &SimConfig, tally: &Tally) -> Self {
        let rounds = tally.rounds as f64;
        let spins = tally.spins as f64;
        let rtp = ratio(tally.total_win, tally.total_bet);
        let mean_sq = ratio(tally.round_return_sq, rounds);
        let std_dev = (mean_sq - rtp * rtp).max(0.0).sqrt();

        let categories = OutcomeCategory::ALL
            .into_iter()
            .map(|category| {
                let slot = category.index();
                CategoryStats {
                    category,
                    spins: tally.category_spins[slot],
                    frequency: ratio(tally.category_spins[slot] as f64, spins),
                    expected_frequency: definition.bands.probability(category),
                    total_win: tally.category_wins[slot],
                    rtp_share: ratio(tally.category_wins[slot], tally.total_bet),
                }
            })
            .collect();

        Self {
            game_id: definition.id.clone(),
            seed: config.seed,
            bet: config.bet,
            rounds: tally.rounds,
            free_spins: tally.free_spins,
            total_bet: tally.total_bet,
            total_win: tally.total_win,
            rtp,
            target_rtp: definition.target_rtp,
            hit_rate: ratio(tally.hits as f64, spins),
            round_hit_rate: ratio(tally.round_hits as f64, rounds),
            feature_triggers: tally.feature_triggers,
            trigger_rate: ratio(tally.feature_triggers as f64, rounds),
            capped_rounds: tally.capped_rounds,
            max_win_ratio: tally.max_round_return,
            std_dev,
            categories,
        }
    }

    /// Measured minus declared RTP
    pub fn rtp_deviation(&self) -> f64 {
        self.rtp - self.target_rtp
    }

    pub fn within_tolerance(&self, tolerance: f64) -> bool {
        self.rtp_deviation().abs() <= tolerance
    }

    /// Standard error of the measured RTP
    pub fn standard_error(&self) -> f64 {
        if self.rounds == 0 {
            0.0
        } else {
            self.std_dev / (self.rounds as f64).sqrt()
        }
    }

    /// 95 % confidence interval of the RTP
    pub fn confidence_interval(&self) -> (f64, f64) {
        let margin = 1.96 * self.standard_error();
        (self.rtp - margin, self.rtp + margin)
    }

    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for SimReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (low, high) = self.confidence_interval();
        writeln!(f, "Game:            {}", self.game_id)?;
        writeln!(f, "Rounds:          {} (+{} free spins)", self.rounds, self.free_spins)?;
        writeln!(f, "Wagered / won:   {:.2} / {:.2}", self.total_bet, self.total_win)?;
        writeln!(
            f,
            "RTP:             {:.4} (target {:.4}, 95% CI {:.4}..{:.4})",
            self.rtp, self.target_rtp, low, high
        )?;
        writeln!(
            f,
            "Hit rate:        {:.2}% per spin, {:.2}% per round",
            self.hit_rate * 100.0,
            self.round_hit_rate * 100.0
        )?;
        writeln!(
            f,
            "Free spin bonus: {} triggers (1 in {:.0})",
            self.feature_triggers,
            if self.trigger_rate > 0.0 { 1.0 / self.trigger_rate } else { 0.0 }
        )?;
        writeln!(f, "Max win:         {:.2}x", self.max_win_ratio)?;
        writeln!(f, "Std deviation:   {:.3}", self.std_dev)?;
        writeln!(f, "Categories:")?;
        for c in &self.categories {
            writeln!(
                f,
                "  {:<7} {:>7.3}% (band {:>7.3}%)  rtp share {:.4}",
                c.category.name(),
                c.frequency * 100.0,
                c.expected_frequency * 100.0,
                c.rtp_share
            )?;
        }
        Ok(())
    }
}
