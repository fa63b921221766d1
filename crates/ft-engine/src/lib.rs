//! # ft-engine — Spin outcome engine for Fortune slot games
//!
//! Decides what lands on a 3×3 (or larger) grid for a given bet: an outcome
//! category is drawn from configured probability bands, a grid matching that
//! category is generated, and the grid is evaluated against the paylines.
//!
//! ## Features
//!
//! - **Category bands**: mega / big / medium / small / loss, validated at load
//! - **Line evaluation**: leading runs with wild substitution and partial tiers
//! - **Scatter bonus**: free spins with a win multiplier
//! - **Session state**: balance, free spins, lucky wheel, history, stats
//! - **Bundled variants**: five games as embedded YAML definitions
//!
//! ## Architecture
//!
//! ```text
//! GameDefinition (JSON / YAML)
//!     │  validate
//!     v
//! OutcomeEngine ── classify ── generate_grid ── evaluate_grid ── bonus
//!     │
//!     v
//! SpinResult ──> SessionState::settle
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod lucky;
pub mod outcome;
pub mod parser;
pub mod paytable;
pub mod session;
pub mod spin;
pub mod symbols;
pub mod variants;

pub use config::*;
pub use engine::*;
pub use error::*;
pub use lucky::*;
pub use outcome::*;
pub use parser::*;
pub use paytable::*;
pub use session::*;
pub use spin::*;
pub use symbols::*;
pub use variants::*;
