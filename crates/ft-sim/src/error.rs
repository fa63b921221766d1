//! Error types for batch simulation

use thiserror::Error;

/// Simulation errors
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for simulation operations
pub type SimResult<T> = Result<T, SimError>;
