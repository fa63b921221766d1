//! Parallel batch runner

use std::time::Instant;

use ft_engine::{OutcomeEngine, SpinConfig};
use log::{info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::config::SimConfig;
use crate::error::SimResult;
use crate::report::{SimReport, Tally};

/// Plays paid rounds, and the free spins they award, against one engine
pub struct Simulator<'a> {
    engine: &'a OutcomeEngine,
    config: SimConfig,
}

impl<'a> Simulator<'a> {
    pub fn new(engine: &'a OutcomeEngine, config: SimConfig) -> SimResult<Self> {
        config.validate()?;
        Ok(Self { engine, config })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Run every chunk on a dedicated pool and merge the tallies in chunk order
    pub fn run(&self) -> SimResult<SimReport> {
        let started = Instant::now();
        let chunks = self.config.chunks();
        let threads = self.config.effective_threads();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()?;

        let tallies: Vec<Tally> = pool.install(|| {
            chunks
                .par_iter()
                .map(|&(index, rounds)| self.run_chunk(index, rounds))
                .collect()
        });

        let mut total = Tally::default();
        for tally in &tallies {
            total.merge(tally);
        }

        if total.capped_rounds > 0 {
            warn!(
                "{}: {} rounds hit the cap of {} free spins",
                self.engine.id(),
                total.capped_rounds,
                self.config.max_free_spins_per_round
            );
        }

        let report = SimReport::from_tally(self.engine.definition(), &self.config, &total);
        info!(
            "{}: {} rounds in {} chunks on {} threads, RTP {:.4} (target {:.4}) in {:.2?}",
            report.game_id,
            report.rounds,
            chunks.len(),
            threads,
            report.rtp,
            report.target_rtp,
            started.elapsed()
        );
        Ok(report)
    }

    fn run_chunk(&self, index: u64, rounds: u64) -> Tally {
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        rng.set_stream(index);

        let mut tally = Tally::default();
        for _ in 0..rounds {
            self.play_round(&mut rng, &mut tally);
        }
        tally
    }

    /// One paid spin followed by any free spins it awards
    fn play_round(&self, rng: &mut ChaCha8Rng, tally: &mut Tally) {
        let bet = self.config.bet;
        let paid = self.engine.spin(&SpinConfig::new(bet), rng);
        tally.record_spin(&paid);

        let mut round_win = paid.total_win;
        let (mut remaining, mut multiplier) = paid
            .free_spins
            .map_or((0, 1.0), |award| (award.spins, award.multiplier));
        let mut played = 0;

        while remaining > 0 {
            if played >= self.config.max_free_spins_per_round {
                tally.capped_rounds += 1;
                break;
            }
            let config = SpinConfig::new(bet).with_free_spins(remaining, multiplier);
            remaining -= 1;
            played += 1;

            let free = self.engine.spin(&config, rng);
            tally.record_spin(&free);
            round_win += free.total_win;
            if let Some(award) = free.free_spins {
                remaining += award.spins;
                multiplier = award.multiplier;
            }
        }

        tally.finish_round(bet, round_win);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ft_engine::GameVariant;

    #[test]
    fn test_report_is_independent_of_thread_count() {
        let engine = GameVariant::FortuneTiger.engine().unwrap();
        let base = SimConfig::new(20_000).with_seed(5).with_chunk_size(1_000);

        let single = Simulator::new(&engine, base.clone().with_threads(1))
            .unwrap()
            .run()
            .unwrap();
        let multi = Simulator::new(&engine, base.with_threads(4))
            .unwrap()
            .run()
            .unwrap();
        assert_eq!(single, multi);
    }

    #[test]
    fn test_different_seeds_differ() {
        let engine = GameVariant::DragonGold.engine().unwrap();
        let run = |seed| {
            Simulator::new(&engine, SimConfig::new(5_000).with_seed(seed).with_threads(2))
                .unwrap()
                .run()
                .unwrap()
        };
        assert_ne!(run(1).total_win, run(2).total_win);
    }

    #[test]
    fn test_report_totals_are_consistent() {
        let engine = GameVariant::ZodiacFortune.engine().unwrap();
        let report = Simulator::new(&engine, SimConfig::new(10_000).with_bet(2.0).with_threads(2))
            .unwrap()
            .run()
            .unwrap();

        assert_eq!(report.rounds, 10_000);
        assert!((report.total_bet - 20_000.0).abs() < 1e-6);
        let spins: u64 = report.categories.iter().map(|c| c.spins).sum();
        assert_eq!(spins, report.rounds + report.free_spins);
        let won: f64 = report.categories.iter().map(|c| c.total_win).sum();
        assert!((won - report.total_win).abs() < 1e-6);
        assert!(report.hit_rate > 0.0 && report.hit_rate < 1.0);
        assert!(report.to_json().unwrap().contains("\"game_id\": \"zodiac-fortune\""));
    }

    #[test]
    fn test_rejects_invalid_config() {
        let engine = GameVariant::NeonNight.engine().unwrap();
        assert!(Simulator::new(&engine, SimConfig::new(0)).is_err());
    }
}
