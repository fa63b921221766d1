//! Simulation configuration

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Batch simulation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Paid rounds to play
    pub spins: u64,
    pub bet: f64,
    /// Base seed; chunk `i` plays on stream `i` of this seed
    pub seed: u64,
    /// Worker threads, 0 = one per logical core
    pub threads: usize,
    /// Rounds per chunk
    pub chunk_size: u64,
    /// Free spins played per round before the round is cut short
    pub max_free_spins_per_round: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            spins: 1_000_000,
            bet: 1.0,
            seed: 0,
            threads: 0,
            chunk_size: 10_000,
            max_free_spins_per_round: 1_000,
        }
    }
}

impl SimConfig {
    pub fn new(spins: u64) -> Self {
        Self {
            spins,
            ..Self::default()
        }
    }

    pub fn with_bet(mut self, bet: f64) -> Self {
        self.bet = bet;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn effective_threads(&self) -> usize {
        if self.threads == 0 {
            num_cpus::get()
        } else {
            self.threads
        }
    }

    /// `(chunk index, rounds)` covering exactly `spins` rounds
    pub fn chunks(&self) -> Vec<(u64, u64)> {
        let size = self.chunk_size.max(1);
        (0..self.spins.div_ceil(size))
            .map(|i| (i, size.min(self.spins - i * size)))
            .collect()
    }

    pub fn validate(&self) -> SimResult<()> {
        if self.spins == 0 {
            return Err(SimError::InvalidConfig("spins must be at least 1".into()));
        }
        if !(self.bet.is_finite() && self.bet > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "bet must be positive, got {}",
                self.bet
            )));
        }
        if self.chunk_size == 0 {
            return Err(SimError::InvalidConfig("chunk_size must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunks_cover_all_spins() {
        let config = SimConfig::new(25_001).with_chunk_size(10_000);
        assert_eq!(config.chunks(), vec![(0, 10_000), (1, 10_000), (2, 5_001)]);

        let exact = SimConfig::new(20_000).with_chunk_size(10_000);
        assert_eq!(exact.chunks().len(), 2);
    }

    #[test]
    fn test_validation() {
        assert!(SimConfig::default().validate().is_ok());
        assert!(SimConfig::new(0).validate().is_err());
        assert!(SimConfig::new(10).with_bet(0.0).validate().is_err());
        assert!(SimConfig::new(10).with_chunk_size(0).validate().is_err());
    }

    #[test]
    fn test_effective_threads() {
        assert_eq!(SimConfig::default().with_threads(3).effective_threads(), 3);
        assert!(SimConfig::default().effective_threads() >= 1);
    }
}
