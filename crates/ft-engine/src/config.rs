//! Game definition: grid, symbols, paytable, paylines and generation profile

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::outcome::CategoryBands;
use crate::paytable::{PayTable, Payline};
use crate::symbols::{SymbolId, SymbolSet};

/// Grid specification (reels × rows)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Number of reels (columns)
    pub reels: u8,
    /// Number of visible rows per reel
    pub rows: u8,
}

impl GridSpec {
    pub fn new(reels: u8, rows: u8) -> Self {
        Self { reels, rows }
    }

    /// Classic 3×3 layout used by every bundled game
    pub fn classic_3x3() -> Self {
        Self { reels: 3, rows: 3 }
    }

    /// Total grid positions
    pub fn total_positions(&self) -> usize {
        self.reels as usize * self.rows as usize
    }

    pub fn contains(&self, row: u8, reel: u8) -> bool {
        row < self.rows && reel < self.reels
    }
}

impl Default for GridSpec {
    fn default() -> Self {
        Self::classic_3x3()
    }
}

/// Volatility label. Informational; the bands decide the real behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Volatility {
    Low,
    #[default]
    Medium,
    High,
}

impl Volatility {
    pub fn label(&self) -> &'static str {
        match self {
            Volatility::Low => "low",
            Volatility::Medium => "medium",
            Volatility::High => "high",
        }
    }
}

/// Thresholds for presentation win tiers, in bet multiples
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WinTierThresholds {
    /// Minimum ratio for "big win"
    pub big_win: f64,
    /// Minimum ratio for "mega win"
    pub mega_win: f64,
}

impl Default for WinTierThresholds {
    fn default() -> Self {
        Self {
            big_win: 10.0,
            mega_win: 30.0,
        }
    }
}

impl WinTierThresholds {
    fn validate(&self) -> ConfigResult<()> {
        if !(self.big_win.is_finite() && self.big_win > 0.0 && self.mega_win >= self.big_win) {
            return Err(ConfigError::InvalidParam(format!(
                "win tiers need 0 < big_win ({}) <= mega_win ({})",
                self.big_win, self.mega_win
            )));
        }
        Ok(())
    }
}

/// Symbol with a per-cell placement probability
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiasedSymbol {
    pub symbol: SymbolId,
    pub probability: f64,
}

/// How the big and medium categories bias their grids
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationProfile {
    /// One of these fills the big-win grid
    #[serde(default)]
    pub big_symbols: Vec<SymbolId>,
    /// Per-cell probability of placing the chosen big symbol
    #[serde(default = "default_big_bias")]
    pub big_bias: f64,
    /// Per-cell cumulative bias for medium grids
    #[serde(default)]
    pub medium_symbols: Vec<BiasedSymbol>,
}

fn default_big_bias() -> f64 {
    0.6
}

impl Default for GenerationProfile {
    fn default() -> Self {
        Self {
            big_symbols: Vec::new(),
            big_bias: default_big_bias(),
            medium_symbols: Vec::new(),
        }
    }
}

impl GenerationProfile {
    /// Total medium bias; the remainder is a base draw
    pub fn medium_total(&self) -> f64 {
        self.medium_symbols.iter().map(|b| b.probability).sum()
    }

    fn validate(&self, symbols: &SymbolSet, bands: &CategoryBands) -> ConfigResult<()> {
        for &id in &self.big_symbols {
            symbols.require(id, "big_symbols")?;
        }
        if bands.big > 0.0 && self.big_symbols.is_empty() {
            return Err(ConfigError::InvalidParam(
                "big band is non-zero but big_symbols is empty".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.big_bias) {
            return Err(ConfigError::InvalidParam(format!(
                "big_bias {} must be within [0, 1]",
                self.big_bias
            )));
        }

        for biased in &self.medium_symbols {
            symbols.require(biased.symbol, "medium_symbols")?;
            if !(0.0..=1.0).contains(&biased.probability) {
                return Err(ConfigError::InvalidParam(format!(
                    "medium probability {} for symbol {} must be within [0, 1]",
                    biased.probability, biased.symbol
                )));
            }
        }
        if bands.medium > 0.0 && self.medium_symbols.is_empty() {
            return Err(ConfigError::InvalidParam(
                "medium band is non-zero but medium_symbols is empty".into(),
            ));
        }
        let total = self.medium_total();
        if total > 1.0 + f64::EPSILON {
            return Err(ConfigError::InvalidParam(format!(
                "medium_symbols probabilities sum to {total}, above 1.0"
            )));
        }
        Ok(())
    }
}

/// Scatter-triggered free spins
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScatterBonus {
    /// Counted anywhere on the grid
    pub symbol: SymbolId,
    #[serde(default = "default_min_count")]
    pub min_count: u8,
    #[serde(default = "default_free_spins")]
    pub free_spins: u32,
    /// Win multiplier applied during the awarded spins
    #[serde(default = "default_bonus_multiplier")]
    pub multiplier: f64,
    /// Whether free spins can award more free spins
    #[serde(default)]
    pub retrigger: bool,
}

fn default_min_count() -> u8 {
    3
}

fn default_free_spins() -> u32 {
    10
}

fn default_bonus_multiplier() -> f64 {
    3.0
}

impl ScatterBonus {
    pub fn new(symbol: SymbolId) -> Self {
        Self {
            symbol,
            min_count: default_min_count(),
            free_spins: default_free_spins(),
            multiplier: default_bonus_multiplier(),
            retrigger: false,
        }
    }

    fn validate(
        &self,
        symbols: &SymbolSet,
        paytable: &PayTable,
        grid: &GridSpec,
    ) -> ConfigResult<()> {
        symbols.require(self.symbol, "bonus")?;
        if paytable.is_wild(self.symbol) {
            return Err(ConfigError::InvalidParam(
                "the bonus scatter cannot also be the wild".into(),
            ));
        }
        if self.min_count == 0 || self.min_count as usize > grid.total_positions() {
            return Err(ConfigError::InvalidParam(format!(
                "bonus min_count {} must be between 1 and {}",
                self.min_count,
                grid.total_positions()
            )));
        }
        if self.free_spins == 0 {
            return Err(ConfigError::InvalidParam("bonus awards zero free spins".into()));
        }
        if !(self.multiplier.is_finite() && self.multiplier > 0.0) {
            return Err(ConfigError::InvalidParam(format!(
                "bonus multiplier {} must be positive",
                self.multiplier
            )));
        }
        Ok(())
    }
}

/// Complete definition of one game variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameDefinition {
    /// Stable identifier, e.g. "fortune-tiger"
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub volatility: Volatility,
    /// Declared long-run return to player, e.g. 0.96
    pub target_rtp: f64,
    #[serde(default)]
    pub grid: GridSpec,
    pub symbols: SymbolSet,
    pub paytable: PayTable,
    pub paylines: Vec<Payline>,
    pub bands: CategoryBands,
    #[serde(default)]
    pub generation: GenerationProfile,
    #[serde(default)]
    pub bonus: Option<ScatterBonus>,
    #[serde(default)]
    pub win_tiers: WinTierThresholds,
}

impl GameDefinition {
    /// Length shared by every payline (0 when there are none)
    pub fn line_length(&self) -> usize {
        self.paylines.first().map_or(0, Payline::len)
    }

    pub fn symbol_name(&self, id: SymbolId) -> &str {
        self.symbols.get(id).map_or("?", |s| s.name.as_str())
    }

    /// Check every structural invariant of the definition
    pub fn validate(&self) -> ConfigResult<()> {
        if self.grid.reels == 0 || self.grid.rows == 0 {
            return Err(ConfigError::InvalidParam(format!(
                "grid {}x{} has no cells",
                self.grid.reels, self.grid.rows
            )));
        }
        if !(self.target_rtp.is_finite() && self.target_rtp > 0.0) {
            return Err(ConfigError::InvalidParam(format!(
                "target_rtp {} must be positive",
                self.target_rtp
            )));
        }

        self.symbols.validate()?;
        self.validate_paylines()?;
        self.paytable.validate(&self.symbols, self.line_length())?;
        self.bands.validate()?;
        self.generation.validate(&self.symbols, &self.bands)?;
        if let Some(bonus) = &self.bonus {
            bonus.validate(&self.symbols, &self.paytable, &self.grid)?;
        }
        self.win_tiers.validate()
    }

    fn validate_paylines(&self) -> ConfigResult<()> {
        if self.paylines.is_empty() {
            return Err(ConfigError::InvalidParam("no paylines defined".into()));
        }

        let expected = self.line_length();
        for (line, payline) in self.paylines.iter().enumerate() {
            payline.validate(line, &self.grid)?;
            if payline.len() != expected {
                return Err(ConfigError::RaggedPaylines {
                    line,
                    len: payline.len(),
                    expected,
                });
            }
        }
        Ok(())
    }
}
