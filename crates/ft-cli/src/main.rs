//! Fortune slot command line
//!
//! Usage:
//!   ft list                     - List bundled games
//!   ft show <game>              - Print a game definition
//!   ft validate <file>...       - Validate definition files
//!   ft spin <game>              - Play a session
//!   ft simulate <game>          - Measure long-run RTP
//!
//! `<game>` is a bundled id (e.g. `fortune-tiger`) or a path to a
//! `.json` / `.yaml` definition.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use ft_engine::{
    BetError, GameDefinition, GameVariant, LuckyWheel, OutcomeEngine, SessionState, SpinResult,
    TimingProfile,
};
use ft_sim::{SimConfig, Simulator};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

#[derive(Parser)]
#[command(name = "ft", version, about = "Fortune slot engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List bundled games
    List,
    /// Print a game definition and its derived limits
    Show {
        game: String,
        /// JSON instead of YAML
        #[arg(long)]
        json: bool,
    },
    /// Validate definition files
    Validate {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Play a session
    Spin {
        game: String,
        #[arg(short, long, default_value_t = 1.0)]
        bet: f64,
        /// Paid or free spins to play
        #[arg(short, long, default_value_t = 10)]
        count: u32,
        #[arg(long, default_value_t = 100.0)]
        balance: f64,
        /// Seed for a reproducible session
        #[arg(short, long)]
        seed: Option<u64>,
        /// Claim lucky spins as soon as they unlock
        #[arg(long)]
        lucky: bool,
        #[arg(long)]
        turbo: bool,
        #[arg(long)]
        json: bool,
    },
    /// Measure long-run RTP, hit rate and volatility
    Simulate {
        game: String,
        #[arg(short = 'n', long, default_value_t = 1_000_000)]
        spins: u64,
        #[arg(short, long, default_value_t = 1.0)]
        bet: f64,
        #[arg(short, long, default_value_t = 0)]
        seed: u64,
        /// Worker threads (0 = all cores)
        #[arg(short, long, default_value_t = 0)]
        threads: usize,
        #[arg(long, default_value_t = 10_000)]
        chunk_size: u64,
        /// Fail when the measured RTP is further than this from the target
        #[arg(long)]
        tolerance: Option<f64>,
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::List => list_games(),
        Commands::Show { game, json } => show_game(&game, json),
        Commands::Validate { files } => validate_files(&files),
        Commands::Spin {
            game,
            bet,
            count,
            balance,
            seed,
            lucky,
            turbo,
            json,
        } => {
            let timing = if turbo {
                TimingProfile::Turbo
            } else {
                TimingProfile::Normal
            };
            play_session(&game, bet, count, balance, seed, lucky, timing, json)
        }
        Commands::Simulate {
            game,
            spins,
            bet,
            seed,
            threads,
            chunk_size,
            tolerance,
            json,
        } => {
            let config = SimConfig::new(spins)
                .with_bet(bet)
                .with_seed(seed)
                .with_threads(threads)
                .with_chunk_size(chunk_size);
            simulate(&game, config, tolerance, json)
        }
    }
}

fn load_definition(game: &str) -> Result<GameDefinition> {
    match GameVariant::from_id(game) {
        Some(variant) => variant
            .definition()
            .with_context(|| format!("bundled game '{game}' is invalid")),
        None => GameDefinition::load(game).with_context(|| {
            format!("'{game}' is neither a bundled game nor a readable definition file")
        }),
    }
}

fn load_engine(game: &str) -> Result<OutcomeEngine> {
    let definition = load_definition(game)?;
    OutcomeEngine::new(definition).with_context(|| format!("game '{game}' cannot be played"))
}

fn list_games() -> Result<()> {
    println!(
        "{:<16} {:<18} {:<8} {:>6} {:>8}  bonus",
        "id", "name", "vol", "rtp", "symbols"
    );
    for variant in GameVariant::ALL {
        let d = variant.definition()?;
        let bonus = d.bonus.map_or_else(
            || "-".to_string(),
            |b| {
                format!(
                    "{}x {} -> {} free spins x{}",
                    b.min_count,
                    d.symbol_name(b.symbol),
                    b.free_spins,
                    b.multiplier
                )
            },
        );
        println!(
            "{:<16} {:<18} {:<8} {:>5.1}% {:>8}  {}",
            d.id,
            d.name,
            d.volatility.label(),
            d.target_rtp * 100.0,
            d.symbols.len(),
            bonus
        );
    }
    Ok(())
}

fn show_game(game: &str, json: bool) -> Result<()> {
    let engine = load_engine(game)?;
    let definition = engine.definition();

    if json {
        println!("{}", definition.to_json()?);
        return Ok(());
    }

    print!("{}", definition.to_yaml()?);
    let (run, candidates) = engine.small_win_plan();
    println!("# mega symbol: {}", definition.symbol_name(engine.mega_symbol()));
    println!("# max payout: {}x bet", engine.max_payout(1.0, 1.0));
    println!(
        "# small wins: {} of a kind from {}",
        run,
        candidates
            .iter()
            .map(|&id| definition.symbol_name(id))
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(())
}

fn validate_files(files: &[PathBuf]) -> Result<()> {
    let mut failures = 0;
    for path in files {
        let outcome = GameDefinition::load(path)
            .map_err(anyhow::Error::from)
            .and_then(|d| OutcomeEngine::new(d).map_err(anyhow::Error::from));
        match outcome {
            Ok(engine) => println!("ok    {} ({})", path.display(), engine.id()),
            Err(e) => {
                failures += 1;
                println!("FAIL  {}: {e:#}", path.display());
            }
        }
    }
    if failures > 0 {
        bail!("{failures} of {} definitions failed validation", files.len());
    }
    Ok(())
}

fn render_grid(engine: &OutcomeEngine, result: &SpinResult) -> String {
    let definition = engine.definition();
    let label = |id| definition.symbols.get(id).map_or("?", |s| s.label());
    (0..definition.grid.rows as usize)
        .map(|row| {
            result
                .grid
                .iter()
                .map(|column| column.get(row).map_or("?", |&id| label(id)))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[allow(clippy::too_many_arguments)]
fn play_session(
    game: &str,
    bet: f64,
    count: u32,
    balance: f64,
    seed: Option<u64>,
    lucky: bool,
    timing: TimingProfile,
    json: bool,
) -> Result<()> {
    let engine = load_engine(game)?;
    let wheel = LuckyWheel::classic();
    let mut rng = match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_os_rng(),
    };

    let mut session = SessionState::new(balance);
    let mut results = Vec::new();

    for _ in 0..count {
        let (spinning, config) = match session.begin_spin(bet) {
            Ok(started) => started,
            Err(e @ BetError::InsufficientBalance { .. }) => {
                log::info!("Session over: {e}");
                break;
            }
            Err(e) => return Err(e.into()),
        };
        let result = engine.spin(&config.with_timing(timing), &mut rng);
        session = spinning.settle(&result);

        if !json {
            print_spin(&engine, &result, &session);
        }

        if lucky && session.lucky_spin_available {
            let (next, outcome) = session.claim_lucky_spin(&wheel, &mut rng)?;
            session = next;
            if !json {
                println!("Lucky wheel: x{} pays {:.2}\n", outcome.multiplier, outcome.payout);
            }
        }
        results.push(result);
    }

    if json {
        let output = serde_json::json!({ "spins": results, "session": session });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let stats = &session.stats;
    println!("Balance: {:.2}", session.balance);
    println!(
        "Spins: {} ({} free)  wins: {}  hit rate: {:.1}%",
        stats.total_spins,
        stats.free_spins_played,
        stats.wins,
        stats.hit_rate() * 100.0
    );
    println!(
        "Wagered: {:.2}  won: {:.2}  RTP: {:.1}%  profit: {:.2}",
        stats.total_bet,
        stats.total_win,
        stats.rtp() * 100.0,
        stats.profit()
    );
    Ok(())
}

fn print_spin(engine: &OutcomeEngine, result: &SpinResult, session: &SessionState) {
    let tag = if result.is_free_spin {
        format!(" [free x{}]", result.multiplier)
    } else {
        String::new()
    };
    println!("{}", render_grid(engine, result));
    if result.is_win() {
        println!(
            "WIN {:.2} ({}) on lines {:?}{}",
            result.total_win,
            result.win_tier.name(),
            result.winning_lines,
            tag
        );
    } else {
        println!("no win{tag}");
    }
    if let Some(award) = result.free_spins {
        println!("FREE SPINS: {} at x{}", award.spins, award.multiplier);
    }
    println!("balance {:.2}\n", session.balance);
}

fn simulate(game: &str, config: SimConfig, tolerance: Option<f64>, json: bool) -> Result<()> {
    let engine = load_engine(game)?;
    let report = Simulator::new(&engine, config)
        .and_then(|sim| sim.run())
        .context("simulation failed")?;

    if json {
        println!("{}", report.to_json()?);
    } else {
        print!("{report}");
    }

    if let Some(tolerance) = tolerance {
        if !report.within_tolerance(tolerance) {
            bail!(
                "measured RTP {:.4} is {:+.4} from target {:.4} (tolerance {})",
                report.rtp,
                report.rtp_deviation(),
                report.target_rtp,
                tolerance
            );
        }
    }
    Ok(())
}
