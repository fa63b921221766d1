//! Paytable, paylines and win evaluation

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::config::GridSpec;
use crate::error::{ConfigError, ConfigResult};
use crate::symbols::{SymbolId, SymbolSet};

/// Symbol grid, reel-major: `grid[reel][row]`
pub type Grid = Vec<Vec<SymbolId>>;

/// Symbol at `(row, reel)`, `None` when outside the grid
pub fn cell_at(grid: &[Vec<SymbolId>], row: u8, reel: u8) -> Option<SymbolId> {
    grid.get(reel as usize)
        .and_then(|column| column.get(row as usize))
        .copied()
}

/// A payline: ordered `(row, reel)` cells, evaluated left to right
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payline {
    pub cells: Vec<(u8, u8)>,
}

impl Payline {
    pub fn new(cells: Vec<(u8, u8)>) -> Self {
        Self { cells }
    }

    /// Straight line across every reel
    pub fn row(row: u8, reels: u8) -> Self {
        Self {
            cells: (0..reels).map(|reel| (row, reel)).collect(),
        }
    }

    /// Top-left to bottom-right
    pub fn diagonal(size: u8) -> Self {
        Self {
            cells: (0..size).map(|i| (i, i)).collect(),
        }
    }

    /// Bottom-left to top-right
    pub fn anti_diagonal(size: u8) -> Self {
        Self {
            cells: (0..size).map(|i| (size - 1 - i, i)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Check bounds and duplicate cells; `line` is only used for error reporting
    pub fn validate(&self, line: usize, grid: &GridSpec) -> ConfigResult<()> {
        if self.cells.is_empty() {
            return Err(ConfigError::EmptyPayline { line });
        }

        let mut seen = HashSet::with_capacity(self.cells.len());
        for &(row, reel) in &self.cells {
            if !grid.contains(row, reel) {
                return Err(ConfigError::PaylineOutOfBounds {
                    line,
                    row,
                    reel,
                    rows: grid.rows,
                    reels: grid.reels,
                });
            }
            if !seen.insert((row, reel)) {
                return Err(ConfigError::DuplicatePaylineCell { line, row, reel });
            }
        }
        Ok(())
    }
}

/// The five lines of the classic 3×3 layout: three rows, then both diagonals
pub fn classic_3x3_paylines() -> Vec<Payline> {
    vec![
        Payline::row(0, 3),
        Payline::row(1, 3),
        Payline::row(2, 3),
        Payline::diagonal(3),
        Payline::anti_diagonal(3),
    ]
}

/// Bet multipliers per match length. Index 0 = one of a kind, 1 = two, ...
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaySchedule(pub Vec<f64>);

impl PaySchedule {
    pub fn new(pays: &[f64]) -> Self {
        Self(pays.to_vec())
    }

    /// Multiplier for `count` matching symbols; zero where undefined
    pub fn pay(&self, count: usize) -> f64 {
        match count {
            0 => 0.0,
            n => self.0.get(n - 1).copied().unwrap_or(0.0),
        }
    }

    /// Must be finite, non-negative and non-decreasing
    fn validate(&self, symbol: SymbolId) -> ConfigResult<()> {
        let mut previous = 0.0;
        for (i, &pay) in self.0.iter().enumerate() {
            if !pay.is_finite() || pay < 0.0 {
                return Err(ConfigError::InvalidSchedule {
                    symbol,
                    reason: format!("{}-of-a-kind pays {}", i + 1, pay),
                });
            }
            if pay < previous {
                return Err(ConfigError::InvalidSchedule {
                    symbol,
                    reason: format!("{}-of-a-kind pays less than {}-of-a-kind", i + 1, i),
                });
            }
            previous = pay;
        }
        Ok(())
    }
}

/// Leading run of a payline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRun {
    /// Paying symbol: the first non-wild, or the wild itself for an all-wild run
    pub symbol: SymbolId,
    /// Cells in the run, wilds included
    pub length: usize,
    pub wilds: usize,
}

fn default_min_match() -> u8 {
    2
}

/// Paytable: pay schedule per symbol plus the wild and minimum run rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayTable {
    pub pays: BTreeMap<SymbolId, PaySchedule>,
    /// Substitutes for any symbol on a payline
    #[serde(default)]
    pub wild: Option<SymbolId>,
    /// Shortest leading run that can pay
    #[serde(default = "default_min_match")]
    pub min_match: u8,
}

impl Default for PayTable {
    fn default() -> Self {
        Self {
            pays: BTreeMap::new(),
            wild: None,
            min_match: default_min_match(),
        }
    }
}

impl PayTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pay(mut self, symbol: SymbolId, schedule: PaySchedule) -> Self {
        self.pays.insert(symbol, schedule);
        self
    }

    pub fn with_wild(mut self, wild: SymbolId) -> Self {
        self.wild = Some(wild);
        self
    }

    pub fn with_min_match(mut self, min_match: u8) -> Self {
        self.min_match = min_match;
        self
    }

    pub fn schedule(&self, symbol: SymbolId) -> Option<&PaySchedule> {
        self.pays.get(&symbol)
    }

    /// Multiplier for `count` of `symbol`, zero for symbols without a schedule
    pub fn pay(&self, symbol: SymbolId, count: usize) -> f64 {
        self.schedule(symbol).map_or(0.0, |s| s.pay(count))
    }

    pub fn is_wild(&self, symbol: SymbolId) -> bool {
        self.wild == Some(symbol)
    }

    /// Leading run over a sequence of cells. A `None` cell ends the run.
    pub fn leading_run<I>(&self, cells: I) -> Option<LineRun>
    where
        I: IntoIterator<Item = Option<SymbolId>>,
    {
        let mut target = None;
        let mut length = 0;
        let mut wilds = 0;

        for cell in cells {
            let Some(symbol) = cell else { break };
            if self.is_wild(symbol) {
                wilds += 1;
                length += 1;
                continue;
            }
            match target {
                None => target = Some(symbol),
                Some(t) if t == symbol => {}
                Some(_) => break,
            }
            length += 1;
        }

        let symbol = target.or(self.wild)?;
        (length > 0).then_some(LineRun {
            symbol,
            length,
            wilds,
        })
    }

    /// Bet multiplier earned by a run, zero below `min_match`
    pub fn run_pay(&self, run: &LineRun) -> f64 {
        if run.length < self.min_match as usize {
            return 0.0;
        }
        self.pay(run.symbol, run.length)
    }

    /// Validate against the symbol set and the payline length
    pub fn validate(&self, symbols: &SymbolSet, line_length: usize) -> ConfigResult<()> {
        if let Some(wild) = self.wild {
            symbols.require(wild, "paytable wild")?;
        }
        for (&symbol, schedule) in &self.pays {
            symbols.require(symbol, "paytable")?;
            schedule.validate(symbol)?;
        }
        if self.min_match == 0 || self.min_match as usize > line_length {
            return Err(ConfigError::InvalidParam(format!(
                "min_match {} must be between 1 and the payline length {}",
                self.min_match, line_length
            )));
        }
        Ok(())
    }
}

/// A win on a single payline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineWin {
    /// Index into the declared payline list
    pub line_index: usize,
    pub symbol: SymbolId,
    pub match_count: usize,
    /// Paytable multiplier before bet and spin multiplier
    pub pay_multiplier: f64,
    pub win_amount: f64,
    /// Cells of the winning run, `(row, reel)`
    pub positions: Vec<(u8, u8)>,
    pub wild_count: usize,
}

/// Result of evaluating a grid
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub total_win: f64,
    /// Winning payline indices in declared order
    pub winning_lines: Vec<usize>,
    pub line_wins: Vec<LineWin>,
}

impl Evaluation {
    /// Check if this is a winning spin
    pub fn is_win(&self) -> bool {
        self.total_win > 0.0
    }

    pub fn win_count(&self) -> usize {
        self.line_wins.len()
    }
}

/// Evaluate every payline of `grid` and stack the wins.
///
/// Each line pays `bet × schedule(symbol)[run] × multiplier` for its leading
/// run. Pure: the same inputs always give the same evaluation.
pub fn evaluate_grid(
    grid: &[Vec<SymbolId>],
    paylines: &[Payline],
    paytable: &PayTable,
    bet: f64,
    multiplier: f64,
) -> Evaluation {
    let mut line_wins = Vec::new();

    for (line_index, payline) in paylines.iter().enumerate() {
        let cells = payline
            .cells
            .iter()
            .map(|&(row, reel)| cell_at(grid, row, reel));
        let Some(run) = paytable.leading_run(cells) else {
            continue;
        };

        let pay = paytable.run_pay(&run);
        if pay <= 0.0 {
            continue;
        }

        line_wins.push(LineWin {
            line_index,
            symbol: run.symbol,
            match_count: run.length,
            pay_multiplier: pay,
            win_amount: bet * pay * multiplier,
            positions: payline.cells[..run.length].to_vec(),
            wild_count: run.wilds,
        });
    }

    Evaluation {
        total_win: line_wins.iter().map(|w| w.win_amount).sum(),
        winning_lines: line_wins.iter().map(|w| w.line_index).collect(),
        line_wins,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: SymbolId = 1;
    const B: SymbolId = 2;
    const W: SymbolId = 9;

    fn table() -> PayTable {
        PayTable::new()
            .with_pay(A, PaySchedule::new(&[0.0, 1.0, 5.0]))
            .with_pay(B, PaySchedule::new(&[0.0, 0.0, 2.0]))
            .with_pay(W, PaySchedule::new(&[0.0, 2.0, 10.0]))
            .with_wild(W)
    }

    fn run(table: &PayTable, cells: &[SymbolId]) -> Option<LineRun> {
        table.leading_run(cells.iter().map(|&s| Some(s)))
    }

    #[test]
    fn test_payline_shapes() {
        assert_eq!(Payline::row(1, 3).cells, vec![(1, 0), (1, 1), (1, 2)]);
        assert_eq!(Payline::diagonal(3).cells, vec![(0, 0), (1, 1), (2, 2)]);
        assert_eq!(Payline::anti_diagonal(3).cells, vec![(2, 0), (1, 1), (0, 2)]);
        assert_eq!(classic_3x3_paylines().len(), 5);
    }

    #[test]
    fn test_payline_validation() {
        let grid = GridSpec::classic_3x3();
        assert!(Payline::row(0, 3).validate(0, &grid).is_ok());
        assert!(matches!(
            Payline::new(vec![(0, 0), (3, 1)]).validate(4, &grid),
            Err(ConfigError::PaylineOutOfBounds { line: 4, row: 3, reel: 1, .. })
        ));
        assert!(matches!(
            Payline::new(vec![(0, 0), (0, 0)]).validate(0, &grid),
            Err(ConfigError::DuplicatePaylineCell { .. })
        ));
        assert!(matches!(
            Payline::new(vec![]).validate(2, &grid),
            Err(ConfigError::EmptyPayline { line: 2 })
        ));
    }

    #[test]
    fn test_schedule_pay() {
        let schedule = PaySchedule::new(&[0.0, 1.5, 4.0]);
        assert_eq!(schedule.pay(0), 0.0);
        assert_eq!(schedule.pay(1), 0.0);
        assert_eq!(schedule.pay(2), 1.5);
        assert_eq!(schedule.pay(3), 4.0);
        assert_eq!(schedule.pay(4), 0.0);
    }

    #[test]
    fn test_schedule_validation() {
        assert!(PaySchedule::new(&[0.0, 1.0, 1.0]).validate(1).is_ok());
        assert!(PaySchedule::new(&[0.0, 2.0, 1.0]).validate(1).is_err());
        assert!(PaySchedule::new(&[-1.0]).validate(1).is_err());
        assert!(PaySchedule::new(&[f64::NAN]).validate(1).is_err());
    }

    #[test]
    fn test_leading_run_with_wilds() {
        let t = table();
        assert_eq!(
            run(&t, &[W, A, A]),
            Some(LineRun {
                symbol: A,
                length: 3,
                wilds: 1,
            })
        );
        assert_eq!(
            run(&t, &[A, W, A]),
            Some(LineRun {
                symbol: A,
                length: 3,
                wilds: 1,
            })
        );
        assert_eq!(
            run(&t, &[A, A, B]),
            Some(LineRun {
                symbol: A,
                length: 2,
                wilds: 0,
            })
        );
        assert_eq!(
            run(&t, &[W, W, W]),
            Some(LineRun {
                symbol: W,
                length: 3,
                wilds: 3,
            })
        );
        assert_eq!(
            run(&t, &[W, B, A]),
            Some(LineRun {
                symbol: B,
                length: 2,
                wilds: 1,
            })
        );
    }

    #[test]
    fn test_run_without_wild_symbol() {
        let t = PayTable::new().with_pay(A, PaySchedule::new(&[0.0, 1.0, 5.0]));
        assert_eq!(run(&t, &[B, A, A]).map(|r| r.length), Some(1));
        assert_eq!(t.leading_run([None, Some(A)]), None);
    }

    #[test]
    fn test_partial_and_full_pays() {
        let t = table();
        // B has no two-of-a-kind tier
        assert_eq!(t.run_pay(&run(&t, &[B, B, A]).unwrap()), 0.0);
        assert_eq!(t.run_pay(&run(&t, &[A, A, B]).unwrap()), 1.0);
        assert_eq!(t.run_pay(&run(&t, &[A, A, A]).unwrap()), 5.0);
        assert_eq!(t.run_pay(&run(&t, &[W, W, W]).unwrap()), 10.0);
        // Single symbol is below min_match
        assert_eq!(t.run_pay(&run(&t, &[A, B, B]).unwrap()), 0.0);
    }

    #[test]
    fn test_evaluate_stacks_lines() {
        let t = table();
        let grid = vec![vec![A, A, B], vec![A, A, B], vec![A, B, B]];
        let lines = classic_3x3_paylines();

        let eval = evaluate_grid(&grid, &lines, &t, 2.0, 1.0);
        // row 0: A A A -> 5, row 1: A A B -> 1, row 2: B B B -> 2,
        // diagonal: A A B -> 1, anti-diagonal: B A A -> 0
        assert_eq!(eval.winning_lines, vec![0, 1, 2, 3]);
        assert!((eval.total_win - 2.0 * (5.0 + 1.0 + 2.0 + 1.0)).abs() < 1e-9);
        assert_eq!(eval.line_wins[0].positions, vec![(0, 0), (0, 1), (0, 2)]);
        assert_eq!(eval.line_wins[1].positions, vec![(1, 0), (1, 1)]);
    }

    #[test]
    fn test_multiplier_scales_wins() {
        let t = table();
        let grid = vec![vec![A, B, B]; 3];
        let lines = vec![Payline::row(0, 3)];
        let base = evaluate_grid(&grid, &lines, &t, 1.0, 1.0);
        let tripled = evaluate_grid(&grid, &lines, &t, 1.0, 3.0);
        assert!((tripled.total_win - 3.0 * base.total_win).abs() < 1e-9);
    }

    #[test]
    fn test_short_grid_is_not_a_panic() {
        let t = table();
        let grid = vec![vec![A], vec![A]];
        let eval = evaluate_grid(&grid, &[Payline::row(0, 3)], &t, 1.0, 1.0);
        assert_eq!(eval.winning_lines, vec![0]);
        assert_eq!(eval.line_wins[0].match_count, 2);
    }
}
