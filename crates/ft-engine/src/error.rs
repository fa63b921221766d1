//! Error types for game configuration and bet handling

use thiserror::Error;

use crate::symbols::SymbolId;

/// Configuration error raised while loading or validating a game definition.
///
/// Always fatal: a definition that fails validation must not be used to
/// build an [`OutcomeEngine`](crate::OutcomeEngine).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Category probabilities do not add up to 1.0
    #[error("Category bands sum to {sum}, expected 1.0")]
    BandsDoNotSumToOne { sum: f64 },

    /// A single band is negative, above 1.0 or not finite
    #[error("Category band '{category}' has invalid probability {value}")]
    InvalidBand { category: &'static str, value: f64 },

    /// Payline without cells
    #[error("Payline {line} is empty")]
    EmptyPayline { line: usize },

    /// Payline coordinate outside the grid
    #[error("Payline {line} cell (row {row}, reel {reel}) is outside the {rows}x{reels} grid")]
    PaylineOutOfBounds {
        line: usize,
        row: u8,
        reel: u8,
        rows: u8,
        reels: u8,
    },

    /// Payline visits the same cell twice
    #[error("Payline {line} visits cell (row {row}, reel {reel}) twice")]
    DuplicatePaylineCell { line: usize, row: u8, reel: u8 },

    /// Paylines of different lengths
    #[error("Payline {line} has {len} cells, expected {expected}")]
    RaggedPaylines {
        line: usize,
        len: usize,
        expected: usize,
    },

    /// Reference to a symbol that is not in the symbol set
    #[error("{context} references undefined symbol {symbol}")]
    UnknownSymbol { context: String, symbol: SymbolId },

    /// Same symbol id declared twice
    #[error("Symbol {0} is defined more than once")]
    DuplicateSymbol(SymbolId),

    /// Symbol that can never be drawn
    #[error("Symbol {symbol} has zero draw weight")]
    ZeroWeight { symbol: SymbolId },

    /// Negative, non-finite or decreasing pay schedule
    #[error("Pay schedule for symbol {symbol} is invalid: {reason}")]
    InvalidSchedule { symbol: SymbolId, reason: String },

    /// Any other out-of-range parameter
    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    /// Definition exceeds the loader limits
    #[error("{what} exceeds the limit: {got} > {max}")]
    LimitExceeded {
        what: &'static str,
        got: usize,
        max: usize,
    },

    /// Nothing on the paytable pays on a full line
    #[error("No symbol pays on a full payline")]
    NoPayingSymbol,

    /// Every grid wins on some payline, so a loss cannot be produced
    #[error("No losing grid exists for this paytable and payline set")]
    NoLosingGrid,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File extension not recognised by the loader
    #[error("Unsupported definition format: {0}")]
    UnsupportedFormat(String),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Bet rejected by the session before the engine is invoked
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BetError {
    #[error("Bet must be a positive amount, got {bet}")]
    NonPositive { bet: f64 },

    #[error("Insufficient balance: bet {bet}, balance {balance}")]
    InsufficientBalance { bet: f64, balance: f64 },

    #[error("Lucky spin is not available yet (unlocks every {every} spins)")]
    LuckySpinLocked { every: u32 },

    #[error("Free spins play at the triggering stake {stake}, got {bet}")]
    StakeMismatch { bet: f64, stake: f64 },
}
