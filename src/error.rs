// src/error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
    #[error("Label query cannot be empty")]
    EmptyQuery,
    #[error("Temp file {0:?} is the store file itself")]
    TempIsStore(std::path::PathBuf),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeneratorError {
    #[error("Password length must be at least 1 (got {0})")]
    InvalidLength(usize),
}

/// Problems with what the user typed. Reported and the menu carries on.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("Input closed")]
    Closed,
    #[error("{0} is required")]
    Empty(&'static str),
    #[error("{what} is longer than {max} characters")]
    TooLong { what: &'static str, max: usize },
    #[error("Not a number: {0:?}")]
    NotANumber(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
    #[error("Generator error: {0}")]
    Generator(#[from] GeneratorError),
    #[error("Input error: {0}")]
    Input(#[from] InputError),
    #[error("Console I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CLI error: {0}")]
    Cli(String),
}

// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
pub type StoreResult<T> = Result<T, StoreError>;
pub type GeneratorResult<T> = Result<T, GeneratorError>;
