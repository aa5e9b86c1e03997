//! Error types for the pipeline

use thiserror::Error;

/// Pipeline-wide error type
#[derive(Error, Debug)]
pub enum BrandLensError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid input: {0}")]
    Input(String),
}

impl BrandLensError {
    pub fn config(msg: impl Into<String>) -> Self {
        BrandLensError::Config(msg.into())
    }

    pub fn io(msg: impl Into<String>) -> Self {
        BrandLensError::Io(msg.into())
    }

    pub fn csv(msg: impl Into<String>) -> Self {
        BrandLensError::Csv(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        BrandLensError::Parse(msg.into())
    }

    pub fn input(msg: impl Into<String>) -> Self {
        BrandLensError::Input(msg.into())
    }
}

/// Result type alias for pipeline operations
pub type BrandLensResult<T> = Result<T, BrandLensError>;
