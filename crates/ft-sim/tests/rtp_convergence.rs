//! Long-run RTP of the bundled games
//!
//! Every bundled definition declares a target RTP; a few hundred thousand
//! simulated rounds must land within tolerance of it.

use ft_engine::{GameVariant, OutcomeCategory};
use ft_sim::{SimConfig, Simulator};

const ROUNDS: u64 = 300_000;
const TOLERANCE: f64 = 0.04;

fn simulate(variant: GameVariant) -> ft_sim::SimReport {
    let engine = variant.engine().expect("bundled game must build");
    let config = SimConfig::new(ROUNDS).with_seed(0x5EED).with_chunk_size(10_000);
    Simulator::new(&engine, config)
        .and_then(|sim| sim.run())
        .expect("simulation must run")
}

fn assert_converges(variant: GameVariant) {
    let report = simulate(variant);
    assert!(
        report.within_tolerance(TOLERANCE),
        "{}: measured RTP {:.4}, target {:.4} (std error {:.4})",
        report.game_id,
        report.rtp,
        report.target_rtp,
        report.standard_error()
    );
    assert_eq!(report.capped_rounds, 0);

    // Paid-round category frequencies follow the bands
    for stats in &report.categories {
        if stats.category == OutcomeCategory::Mega {
            continue;
        }
        assert!(
            (stats.frequency - stats.expected_frequency).abs() < 0.01,
            "{}: {} frequency {:.4}, band {:.4}",
            report.game_id,
            stats.category,
            stats.frequency,
            stats.expected_frequency
        );
    }
}

#[test]
fn fortune_tiger_rtp() {
    assert_converges(GameVariant::FortuneTiger);
}

#[test]
fn zodiac_fortune_rtp() {
    assert_converges(GameVariant::ZodiacFortune);
}

#[test]
fn dragon_gold_rtp() {
    assert_converges(GameVariant::DragonGold);
}

#[test]
fn pirate_rtp() {
    assert_converges(GameVariant::Pirate);
}

#[test]
fn neon_night_rtp() {
    assert_converges(GameVariant::NeonNight);
}

#[test]
fn bonus_games_trigger_free_spins() {
    for variant in [GameVariant::FortuneTiger, GameVariant::DragonGold] {
        let report = simulate(variant);
        assert!(report.feature_triggers > 0, "{variant} never triggered");
        assert!(report.free_spins >= report.feature_triggers * 10);
    }
    let neon = simulate(GameVariant::NeonNight);
    assert_eq!(neon.feature_triggers, 0);
    assert_eq!(neon.free_spins, 0);
}
