use thiserror::Error;

use crate::fetcher::FetchError;

#[derive(Error, Debug)]
pub enum CoracleError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, CoracleError>;
