//! # ft-sim — Batch simulator for Fortune slot games
//!
//! Plays millions of rounds against an [`OutcomeEngine`](ft_engine::OutcomeEngine)
//! and reports the measured return to player, hit rate and volatility.
//!
//! Rounds are split into fixed-size chunks, each with its own ChaCha8 stream
//! derived from the base seed, so a report depends only on the seed and the
//! configuration and never on the number of worker threads.

pub mod config;
pub mod error;
pub mod report;
pub mod runner;

pub use config::*;
pub use error::*;
pub use report::*;
pub use runner::*;
