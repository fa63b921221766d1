//! Outcome Engine: classify, generate, evaluate, detect bonus

use log::{debug, info, warn};
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::GameDefinition;
use crate::error::{ConfigError, ConfigResult};
use crate::outcome::OutcomeCategory;
use crate::paytable::{Evaluation, Grid, evaluate_grid};
use crate::spin::{FreeSpinAward, SpinConfig, SpinResult};
use crate::symbols::SymbolId;

/// Maximum number of single-cell repairs before a loss grid falls back
pub const LOSS_REPAIR_LIMIT: usize = 64;

/// Node budget of the fallback losing-grid search
const FALLBACK_SEARCH_BUDGET: usize = 200_000;

/// Spin outcome engine for one validated game definition.
///
/// Immutable after construction, so a single engine can be shared between
/// threads; every spin takes the random source from the caller.
#[derive(Debug, Clone)]
pub struct OutcomeEngine {
    definition: GameDefinition,
    /// Symbol IDs in sampler order
    symbol_ids: Vec<SymbolId>,
    /// Base draw over the full symbol set
    sampler: WeightedIndex<u32>,
    /// Symbol whose uniform grid pays the most
    mega_symbol: SymbolId,
    /// Evaluated payout multiplier of the uniform mega grid
    max_multiplier: f64,
    /// Leading run written by small-win grids
    small_run: usize,
    small_candidates: Vec<SymbolId>,
    small_sampler: WeightedIndex<u32>,
    /// Precomputed grid that wins on no payline
    fallback_loss: Grid,
}

impl OutcomeEngine {
    /// Validate `definition` and precompute everything a spin needs
    pub fn new(definition: GameDefinition) -> ConfigResult<Self> {
        definition.validate()?;

        let symbol_ids = definition.symbols.ids();
        let sampler = weighted(definition.symbols.weights())?;

        let (mega_symbol, line_pay) =
            find_mega_symbol(&definition).ok_or(ConfigError::NoPayingSymbol)?;
        let (small_run, small_candidates) = plan_small_wins(&definition)?;
        let small_sampler = weighted(
            small_candidates
                .iter()
                .map(|&id| definition.symbols.get(id).map_or(1, |s| s.weight)),
        )?;
        let fallback_loss = LosingGridSearch::new(&definition)
            .run()
            .ok_or(ConfigError::NoLosingGrid)?;

        let mut engine = Self {
            definition,
            symbol_ids,
            sampler,
            mega_symbol,
            max_multiplier: 0.0,
            small_run,
            small_candidates,
            small_sampler,
            fallback_loss,
        };
        engine.max_multiplier = engine
            .evaluate(&engine.uniform_grid(mega_symbol), 1.0, 1.0)
            .total_win;

        info!(
            "Outcome engine ready: {} ({} symbols, {} paylines, mega symbol {} at {}x per line, max {}x)",
            engine.definition.id,
            engine.symbol_ids.len(),
            engine.definition.paylines.len(),
            engine.definition.symbol_name(mega_symbol),
            line_pay,
            engine.max_multiplier
        );
        Ok(engine)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // ACCESSORS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn definition(&self) -> &GameDefinition {
        &self.definition
    }

    pub fn id(&self) -> &str {
        &self.definition.id
    }

    pub fn mega_symbol(&self) -> SymbolId {
        self.mega_symbol
    }

    /// Run length and candidate symbols used for small wins
    pub fn small_win_plan(&self) -> (usize, &[SymbolId]) {
        (self.small_run, &self.small_candidates)
    }

    pub fn fallback_loss_grid(&self) -> &Grid {
        &self.fallback_loss
    }

    /// Largest payout any grid can produce at this bet and multiplier
    pub fn max_payout(&self, bet: f64, multiplier: f64) -> f64 {
        bet * self.max_multiplier * multiplier
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SPIN EXECUTION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Draw the outcome category for the next spin
    pub fn classify<R: Rng + ?Sized>(&self, rng: &mut R) -> OutcomeCategory {
        self.definition.bands.classify(rng.random::<f64>())
    }

    /// Execute a random spin. Never touches a balance.
    pub fn spin<R: Rng + ?Sized>(&self, config: &SpinConfig, rng: &mut R) -> SpinResult {
        let category = self.classify(rng);
        self.spin_forced(category, config, rng)
    }

    /// Execute a spin with the category decided by the caller
    pub fn spin_forced<R: Rng + ?Sized>(
        &self,
        category: OutcomeCategory,
        config: &SpinConfig,
        rng: &mut R,
    ) -> SpinResult {
        let grid = self.generate_grid(category, rng);
        self.resolve(category, grid, config)
    }

    /// Reproducible spin from a 64-bit seed
    pub fn spin_seeded(&self, config: &SpinConfig, seed: u64) -> SpinResult {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.spin(config, &mut rng)
    }

    /// Evaluate `grid` against this game's paylines and paytable
    pub fn evaluate(&self, grid: &[Vec<SymbolId>], bet: f64, multiplier: f64) -> Evaluation {
        evaluate_grid(
            grid,
            &self.definition.paylines,
            &self.definition.paytable,
            bet,
            multiplier,
        )
    }

    /// Bonus scatters anywhere on the grid
    pub fn scatter_count(&self, grid: &[Vec<SymbolId>]) -> usize {
        match &self.definition.bonus {
            Some(bonus) => grid.iter().flatten().filter(|&&s| s == bonus.symbol).count(),
            None => 0,
        }
    }

    fn free_spin_award(&self, scatters: usize, config: &SpinConfig) -> Option<FreeSpinAward> {
        let bonus = self.definition.bonus.as_ref()?;
        if scatters < bonus.min_count as usize {
            return None;
        }
        if config.is_free_spin() && !bonus.retrigger {
            return None;
        }
        Some(FreeSpinAward {
            spins: bonus.free_spins,
            multiplier: bonus.multiplier,
        })
    }

    fn resolve(&self, category: OutcomeCategory, grid: Grid, config: &SpinConfig) -> SpinResult {
        let evaluation = self.evaluate(&grid, config.bet, config.multiplier);
        let scatters = self.scatter_count(&grid);
        let award = self.free_spin_award(scatters, config);

        let result = SpinResult::from_evaluation(
            grid,
            category,
            config,
            evaluation,
            &self.definition.win_tiers,
        )
        .with_scatters(scatters, award);

        debug!(
            "{} spin: category={} win={:.2} lines={:?} scatters={} free_spins={:?}",
            self.definition.id,
            category,
            result.total_win,
            result.winning_lines,
            scatters,
            result.free_spins.map(|a| a.spins)
        );
        result
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // GRID GENERATION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Generate a grid for `category`
    pub fn generate_grid<R: Rng + ?Sized>(&self, category: OutcomeCategory, rng: &mut R) -> Grid {
        match category {
            OutcomeCategory::Mega => self.uniform_grid(self.mega_symbol),
            OutcomeCategory::Big => self.generate_big_grid(rng),
            OutcomeCategory::Medium => self.generate_medium_grid(rng),
            OutcomeCategory::Small => self.generate_small_grid(rng),
            OutcomeCategory::Loss => self.generate_losing_grid(rng),
        }
    }

    fn draw_symbol<R: Rng + ?Sized>(&self, rng: &mut R) -> SymbolId {
        self.symbol_ids[self.sampler.sample(rng)]
    }

    fn fill_grid<F>(&self, mut cell: F) -> Grid
    where
        F: FnMut() -> SymbolId,
    {
        let reels = self.definition.grid.reels as usize;
        let rows = self.definition.grid.rows as usize;
        (0..reels)
            .map(|_| (0..rows).map(|_| cell()).collect())
            .collect()
    }

    fn generate_random_grid<R: Rng + ?Sized>(&self, rng: &mut R) -> Grid {
        self.fill_grid(|| self.draw_symbol(rng))
    }

    fn uniform_grid(&self, symbol: SymbolId) -> Grid {
        self.fill_grid(|| symbol)
    }

    fn generate_big_grid<R: Rng + ?Sized>(&self, rng: &mut R) -> Grid {
        let generation = &self.definition.generation;
        let chosen = generation
            .big_symbols
            .choose(rng)
            .copied()
            .unwrap_or(self.mega_symbol);

        self.fill_grid(|| {
            if rng.random_bool(generation.big_bias) {
                chosen
            } else {
                self.draw_symbol(rng)
            }
        })
    }

    fn generate_medium_grid<R: Rng + ?Sized>(&self, rng: &mut R) -> Grid {
        let biased = &self.definition.generation.medium_symbols;

        self.fill_grid(|| {
            let draw = rng.random::<f64>();
            let mut cumulative = 0.0;
            for b in biased {
                cumulative += b.probability;
                if draw < cumulative {
                    return b.symbol;
                }
            }
            self.draw_symbol(rng)
        })
    }

    fn generate_small_grid<R: Rng + ?Sized>(&self, rng: &mut R) -> Grid {
        let mut grid = self.generate_random_grid(rng);
        let Some(line) = self.definition.paylines.choose(rng) else {
            return grid;
        };
        let symbol = self.small_candidates[self.small_sampler.sample(rng)];

        for &(row, reel) in line.cells.iter().take(self.small_run) {
            grid[reel as usize][row as usize] = symbol;
        }
        grid
    }

    fn generate_losing_grid<R: Rng + ?Sized>(&self, rng: &mut R) -> Grid {
        let mut grid = self.generate_random_grid(rng);

        for _ in 0..LOSS_REPAIR_LIMIT {
            let evaluation = self.evaluate(&grid, 1.0, 1.0);
            let Some(&(row, reel)) = evaluation
                .line_wins
                .first()
                .and_then(|win| win.positions.choose(rng))
            else {
                return grid;
            };
            grid[reel as usize][row as usize] = self.draw_symbol(rng);
        }

        if self.evaluate(&grid, 1.0, 1.0).is_win() {
            warn!(
                "{}: loss grid still wins after {} repairs, using fallback grid",
                self.definition.id, LOSS_REPAIR_LIMIT
            );
            return self.fallback_loss.clone();
        }
        grid
    }
}

fn weighted<I>(weights: I) -> ConfigResult<WeightedIndex<u32>>
where
    I: IntoIterator<Item = u32>,
{
    WeightedIndex::new(weights)
        .map_err(|e| ConfigError::InvalidParam(format!("symbol weights: {e}")))
}

/// Symbol with the highest full-line pay; first declared wins ties
fn find_mega_symbol(def: &GameDefinition) -> Option<(SymbolId, f64)> {
    let line_length = def.line_length();
    let mut best: Option<(SymbolId, f64)> = None;

    for symbol in def.symbols.iter() {
        let pay = def.paytable.pay(symbol.id, line_length);
        if best.is_none_or(|(_, best_pay)| pay > best_pay) {
            best = Some((symbol.id, pay));
        }
    }
    best.filter(|&(_, pay)| pay > 0.0)
}

/// Shortest paying run and the symbols that pay at it.
///
/// Plain symbols are preferred; the wild and the bonus scatter are only used
/// when nothing else pays.
fn plan_small_wins(def: &GameDefinition) -> ConfigResult<(usize, Vec<SymbolId>)> {
    let paytable = &def.paytable;
    let scatter = def.bonus.map(|b| b.symbol);
    let min_run = (paytable.min_match as usize).max(1);

    for plain_only in [true, false] {
        for run in min_run..=def.line_length() {
            let candidates: Vec<SymbolId> = def
                .symbols
                .iter()
                .map(|s| s.id)
                .filter(|&id| !plain_only || (!paytable.is_wild(id) && Some(id) != scatter))
                .filter(|&id| paytable.pay(id, run) > 0.0)
                .collect();
            if !candidates.is_empty() {
                return Ok((run, candidates));
            }
        }
    }
    Err(ConfigError::NoPayingSymbol)
}

/// Depth-first search for a grid on which no payline pays
struct LosingGridSearch<'a> {
    def: &'a GameDefinition,
    /// Assignment order, `(row, reel)`
    cells: Vec<(u8, u8)>,
    /// Paylines through each cell of `cells`
    lines_through: Vec<Vec<usize>>,
    candidates: Vec<SymbolId>,
    grid: Vec<Vec<Option<SymbolId>>>,
    budget: usize,
}

impl<'a> LosingGridSearch<'a> {
    fn new(def: &'a GameDefinition) -> Self {
        let reels = def.grid.reels;
        let rows = def.grid.rows;
        let cells: Vec<(u8, u8)> = (0..reels)
            .flat_map(|reel| (0..rows).map(move |row| (row, reel)))
            .collect();
        let lines_through: Vec<Vec<usize>> = cells
            .iter()
            .map(|cell| {
                def.paylines
                    .iter()
                    .enumerate()
                    .filter(|(_, line)| line.cells.contains(cell))
                    .map(|(i, _)| i)
                    .collect()
            })
            .collect();

        // Plain symbols first, then the scatter, the wild last
        let scatter = def.bonus.map(|b| b.symbol);
        let rank = |id: SymbolId| {
            if def.paytable.is_wild(id) {
                2
            } else if Some(id) == scatter {
                1
            } else {
                0
            }
        };
        let mut candidates = def.symbols.ids();
        candidates.sort_by_key(|&id| rank(id));

        Self {
            def,
            cells,
            lines_through,
            candidates,
            grid: vec![vec![None; rows as usize]; reels as usize],
            budget: FALLBACK_SEARCH_BUDGET,
        }
    }

    fn run(mut self) -> Option<Grid> {
        if !self.assign(0) {
            return None;
        }
        self.grid
            .into_iter()
            .map(|column| column.into_iter().collect::<Option<Vec<_>>>())
            .collect()
    }

    fn assign(&mut self, index: usize) -> bool {
        let Some(&(row, reel)) = self.cells.get(index) else {
            return true;
        };

        for i in 0..self.candidates.len() {
            if self.budget == 0 {
                return false;
            }
            self.budget -= 1;

            self.grid[reel as usize][row as usize] = Some(self.candidates[i]);
            if !self.forces_a_win(index) && self.assign(index + 1) {
                return true;
            }
        }
        self.grid[reel as usize][row as usize] = None;
        false
    }

    /// Will some payline through `cells[index]` pay whatever fills the rest?
    ///
    /// A partial run with a non-wild target already pays at least its current
    /// tier, schedules being non-decreasing. An all-wild prefix is only judged
    /// once its line is complete.
    fn forces_a_win(&self, index: usize) -> bool {
        let paytable = &self.def.paytable;
        self.lines_through[index].iter().any(|&line| {
            let cells = &self.def.paylines[line].cells;
            let symbols = cells
                .iter()
                .map(|&(row, reel)| self.grid[reel as usize][row as usize]);
            let complete = symbols.clone().all(|s| s.is_some());

            paytable.leading_run(symbols).is_some_and(|run| {
                paytable.run_pay(&run) > 0.0 && (complete || !paytable.is_wild(run.symbol))
            })
        })
    }
}
