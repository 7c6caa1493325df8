use thiserror::Error;

/// Failures surfaced by the drill engine and its store
#[derive(Error, Debug)]
pub enum DrillError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, DrillError>;
