use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to produce a catalog from the workbook.
///
/// Cloneable so the catalog cache can hand the same outcome to every caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("data file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("data file '{}' is unreadable: {reason}", .path.display())]
    Unreadable { path: PathBuf, reason: String },
}

/// Why a login attempt was refused.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("user id not found")]
    UnknownIdentity,

    #[error("wrong password")]
    WrongSecret,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("login failed: {0}")]
    Auth(AuthFailure),

    #[error("free search limit of {limit} reached; unlock more searches to continue")]
    QuotaExceeded { limit: u32 },

    #[error("login required")]
    LoginRequired,

    #[error("invalid embed key")]
    InvalidEmbedKey,

    #[error("no credentials are configured for this mode")]
    CredentialsUnavailable,
}

impl From<AuthFailure> for AccessError {
    fn from(reason: AuthFailure) -> Self {
        AccessError::Auth(reason)
    }
}

#[derive(Error, Debug)]
pub enum KaraokeError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("An unexpected error occurred: {0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, KaraokeError>;
