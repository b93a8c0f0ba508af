use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Remote list rejected the change: {0}")]
    RemoteMutation(String),

    #[error("Remote list disagrees with local lookup: {0}")]
    Lookup(String),

    #[error("Unexpected response from remote service: {0}")]
    InvalidResponse(String),
}

impl AppError {
    /// Errors that leave the remote session unusable. Everything else is
    /// recovered per address.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::Auth(_))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
