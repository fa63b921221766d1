//! Player session: balance, free spins, lucky spin unlocks, history and stats.
//!
//! Every transition takes `&self` and returns the next state, so callers can
//! keep, compare or discard states freely.

use std::collections::VecDeque;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::BetError;
use crate::lucky::{LuckySpinOutcome, LuckyWheel};
use crate::outcome::OutcomeCategory;
use crate::spin::{SpinConfig, SpinResult, WinTier};

/// Number of spin records kept in the history
pub const DEFAULT_HISTORY_LEN: usize = 50;

/// A lucky spin unlocks every this many spins
pub const DEFAULT_LUCKY_SPIN_EVERY: u32 = 10;

/// One settled spin in the history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinRecord {
    /// 1-based spin number within the session
    pub number: u64,
    pub bet: f64,
    pub win: f64,
    pub multiplier: f64,
    pub category: OutcomeCategory,
    pub win_tier: WinTier,
    pub free_spin: bool,
    pub winning_lines: Vec<usize>,
}

/// Session statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_spins: u64,
    pub free_spins_played: u64,
    /// Stake debited by paid spins
    pub total_bet: f64,
    /// Winnings credited by spins, free spins included
    pub total_win: f64,
    pub wins: u64,
    pub losses: u64,
    pub max_win: f64,
    pub features_triggered: u64,
    pub lucky_spins: u64,
    pub lucky_winnings: f64,
}

impl SessionStats {
    /// Return to player over the session, as a fraction
    pub fn rtp(&self) -> f64 {
        if self.total_bet > 0.0 {
            self.total_win / self.total_bet
        } else {
            0.0
        }
    }

    /// Fraction of spins that paid something
    pub fn hit_rate(&self) -> f64 {
        if self.total_spins > 0 {
            self.wins as f64 / self.total_spins as f64
        } else {
            0.0
        }
    }

    /// Net result for the player, lucky spins included
    pub fn profit(&self) -> f64 {
        self.total_win + self.lucky_winnings - self.total_bet
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub balance: f64,
    pub free_spins_remaining: u32,
    /// Multiplier applied to pending free spins
    pub free_spin_multiplier: f64,
    pub lucky_spin_available: bool,
    pub lucky_spin_every: u32,
    /// Bet of the last paid spin; free spins and the lucky wheel play at it
    #[serde(default)]
    pub stake: Option<f64>,
    pub history_len: usize,
    pub stats: SessionStats,
    pub history: VecDeque<SpinRecord>,
}

impl SessionState {
    /// Fresh session with `balance` credits
    pub fn new(balance: f64) -> Self {
        Self {
            balance,
            free_spins_remaining: 0,
            free_spin_multiplier: 1.0,
            lucky_spin_available: false,
            lucky_spin_every: DEFAULT_LUCKY_SPIN_EVERY,
            stake: None,
            history_len: DEFAULT_HISTORY_LEN,
            stats: SessionStats::default(),
            history: VecDeque::new(),
        }
    }

    pub fn with_history_len(mut self, len: usize) -> Self {
        self.history_len = len;
        self
    }

    /// 0 disables the lucky spin
    pub fn with_lucky_spin_every(mut self, every: u32) -> Self {
        self.lucky_spin_every = every;
        self
    }

    pub fn in_free_spins(&self) -> bool {
        self.free_spins_remaining > 0
    }

    /// Start a spin at `bet`.
    ///
    /// A pending free spin is consumed without debiting the balance and
    /// carries the free-spin multiplier; it must be played at the stake of
    /// the paid spin that awarded it. Otherwise the bet is debited.
    pub fn begin_spin(&self, bet: f64) -> Result<(SessionState, SpinConfig), BetError> {
        if !(bet.is_finite() && bet > 0.0) {
            return Err(BetError::NonPositive { bet });
        }

        let mut next = self.clone();
        if self.in_free_spins() {
            if let Some(stake) = self.stake.filter(|&stake| stake != bet) {
                return Err(BetError::StakeMismatch { bet, stake });
            }
            next.free_spins_remaining -= 1;
            let config = SpinConfig::new(bet)
                .with_free_spins(self.free_spins_remaining, self.free_spin_multiplier);
            return Ok((next, config));
        }

        if bet > self.balance {
            return Err(BetError::InsufficientBalance {
                bet,
                balance: self.balance,
            });
        }
        next.balance -= bet;
        next.stake = Some(bet);
        Ok((next, SpinConfig::new(bet)))
    }

    /// Apply a spin result: credit the win, grant free spins, record stats
    pub fn settle(&self, result: &SpinResult) -> SessionState {
        let mut next = self.clone();
        next.balance += result.total_win;

        if let Some(award) = result.free_spins {
            next.free_spins_remaining += award.spins;
            next.free_spin_multiplier = award.multiplier;
            next.stats.features_triggered += 1;
        }
        if next.free_spins_remaining == 0 {
            next.free_spin_multiplier = 1.0;
        }

        let stats = &mut next.stats;
        stats.total_spins += 1;
        if result.is_free_spin {
            stats.free_spins_played += 1;
        } else {
            stats.total_bet += result.bet;
        }
        stats.total_win += result.total_win;
        if result.is_win() {
            stats.wins += 1;
        } else {
            stats.losses += 1;
        }
        stats.max_win = stats.max_win.max(result.total_win);

        if next.lucky_spin_every > 0 && stats.total_spins % u64::from(next.lucky_spin_every) == 0 {
            next.lucky_spin_available = true;
        }

        next.history.push_back(SpinRecord {
            number: next.stats.total_spins,
            bet: result.bet,
            win: result.total_win,
            multiplier: result.multiplier,
            category: result.category,
            win_tier: result.win_tier,
            free_spin: result.is_free_spin,
            winning_lines: result.winning_lines.clone(),
        });
        while next.history.len() > next.history_len {
            next.history.pop_front();
        }
        next
    }

    /// Spin the lucky wheel at the last paid stake and credit the payout
    pub fn claim_lucky_spin<R: Rng + ?Sized>(
        &self,
        wheel: &LuckyWheel,
        rng: &mut R,
    ) -> Result<(SessionState, LuckySpinOutcome), BetError> {
        let locked = BetError::LuckySpinLocked {
            every: self.lucky_spin_every,
        };
        if !self.lucky_spin_available {
            return Err(locked);
        }
        let Some(stake) = self.stake else {
            return Err(locked);
        };

        let outcome = wheel.spin(stake, rng);
        let mut next = self.clone();
        next.balance += outcome.payout;
        next.lucky_spin_available = false;
        next.stats.lucky_spins += 1;
        next.stats.lucky_winnings += outcome.payout;
        Ok((next, outcome))
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spin::FreeSpinAward;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn result(config: &SpinConfig, win: f64, award: Option<FreeSpinAward>) -> SpinResult {
        SpinResult {
            grid: vec![vec![1; 3]; 3],
            bet: config.bet,
            total_win: win,
            winning_lines: if win > 0.0 { vec![0] } else { vec![] },
            line_wins: vec![],
            category: if win > 0.0 { OutcomeCategory::Small } else { OutcomeCategory::Loss },
            scatter_count: 0,
            free_spins: award,
            is_free_spin: config.is_free_spin(),
            multiplier: config.multiplier,
            win_tier: if win > 0.0 { WinTier::Normal } else { WinTier::None },
            timing: config.timing,
        }
    }

    #[test]
    fn test_paid_spin_debits_and_credits() {
        let session = SessionState::new(100.0);
        let (spinning, config) = session.begin_spin(10.0).unwrap();
        assert_relative_eq!(spinning.balance, 90.0);
        assert!(!config.is_free_spin());

        let settled = spinning.settle(&result(&config, 25.0, None));
        assert_relative_eq!(settled.balance, 115.0);
        assert_eq!(settled.stats.total_spins, 1);
        assert_eq!(settled.stats.wins, 1);
        assert_relative_eq!(settled.stats.rtp(), 2.5);
        assert_relative_eq!(settled.stats.profit(), 15.0);
        // Original state untouched
        assert_relative_eq!(session.balance, 100.0);
    }

    #[test]
    fn test_bet_rejections() {
        let session = SessionState::new(5.0);
        assert_eq!(session.begin_spin(0.0).unwrap_err(), BetError::NonPositive { bet: 0.0 });
        assert!(matches!(session.begin_spin(-1.0), Err(BetError::NonPositive { .. })));
        assert!(matches!(session.begin_spin(f64::NAN), Err(BetError::NonPositive { .. })));
        assert_eq!(
            session.begin_spin(6.0).unwrap_err(),
            BetError::InsufficientBalance {
                bet: 6.0,
                balance: 5.0
            }
        );
    }

    #[test]
    fn test_free_spins_lifecycle() {
        let award = FreeSpinAward {
            spins: 2,
            multiplier: 3.0,
        };
        let session = SessionState::new(10.0);

        let (s, config) = session.begin_spin(10.0).unwrap();
        let s = s.settle(&result(&config, 0.0, Some(award)));
        assert_eq!(s.free_spins_remaining, 2);
        assert_eq!(s.stats.features_triggered, 1);

        // Balance is zero but free spins still play
        let (s, config) = s.begin_spin(10.0).unwrap();
        assert!(config.is_free_spin());
        assert_eq!(config.free_spins_remaining, 2);
        assert_eq!(config.multiplier, 3.0);
        assert_relative_eq!(s.balance, 0.0);
        let s = s.settle(&result(&config, 30.0, None));
        assert_eq!(s.free_spins_remaining, 1);
        assert_eq!(s.free_spin_multiplier, 3.0);

        let (s, config) = s.begin_spin(10.0).unwrap();
        assert_eq!(config.free_spins_remaining, 1);
        let s = s.settle(&result(&config, 0.0, None));
        assert_eq!(s.free_spins_remaining, 0);
        assert_eq!(s.free_spin_multiplier, 1.0);

        assert_eq!(s.stats.free_spins_played, 2);
        assert_relative_eq!(s.stats.total_bet, 10.0);
        assert_relative_eq!(s.balance, 30.0);
        assert!(matches!(s.begin_spin(40.0), Err(BetError::InsufficientBalance { .. })));
    }

    #[test]
    fn test_free_spins_play_at_the_triggering_stake() {
        let award = FreeSpinAward {
            spins: 10,
            multiplier: 3.0,
        };
        let session = SessionState::new(1.0);

        let (s, config) = session.begin_spin(1.0).unwrap();
        let mut s = s.settle(&result(&config, 0.0, Some(award)));
        assert_eq!(s.stake, Some(1.0));

        assert_eq!(
            s.begin_spin(1_000_000.0).unwrap_err(),
            BetError::StakeMismatch {
                bet: 1_000_000.0,
                stake: 1.0
            }
        );
        assert_eq!(s.free_spins_remaining, 10);

        while s.in_free_spins() {
            let (next, config) = s.begin_spin(1.0).unwrap();
            assert_eq!(config.bet, 1.0);
            s = next.settle(&result(&config, 3.0, None));
        }
        assert_relative_eq!(s.balance, 30.0);
        assert_eq!(s.stats.free_spins_played, 10);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut session = SessionState::new(1000.0).with_history_len(5);
        for _ in 0..12 {
            let (s, config) = session.begin_spin(1.0).unwrap();
            session = s.settle(&result(&config, 0.0, None));
        }
        assert_eq!(session.history.len(), 5);
        assert_eq!(session.history.front().map(|r| r.number), Some(8));
        assert_eq!(session.history.back().map(|r| r.number), Some(12));
        assert_eq!(session.stats.losses, 12);
        assert_eq!(session.stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_lucky_spin_unlocks_and_pays() {
        let wheel = LuckyWheel::classic();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut session = SessionState::new(100.0);

        for _ in 0..9 {
            let (s, config) = session.begin_spin(1.0).unwrap();
            session = s.settle(&result(&config, 0.0, None));
        }
        assert!(!session.lucky_spin_available);
        assert!(matches!(
            session.claim_lucky_spin(&wheel, &mut rng),
            Err(BetError::LuckySpinLocked { every: 10 })
        ));

        let (s, config) = session.begin_spin(5.0).unwrap();
        session = s.settle(&result(&config, 0.0, None));
        assert!(session.lucky_spin_available);

        let (after, outcome) = session.claim_lucky_spin(&wheel, &mut rng).unwrap();
        assert!(!after.lucky_spin_available);
        assert_relative_eq!(after.balance, session.balance + outcome.payout);
        // Paid at the last paid stake, not at the earlier 1-credit bets
        assert_relative_eq!(outcome.payout, 5.0 * outcome.multiplier);
        assert_eq!(after.stats.lucky_spins, 1);
    }
}
