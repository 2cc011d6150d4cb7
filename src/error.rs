//! Error taxonomy for a cross-posting run.

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CrossPostError>;

#[derive(Debug, Error)]
pub enum CrossPostError {
    /// Unknown account, missing secret, unreadable config file
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Source platform session could not be loaded
    #[error("session error: {0}")]
    Session(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// No content identifier could be extracted from a reference
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    #[error("media resolution failed: {0}")]
    MediaResolution(String),

    #[error("media upload rejected ({status}): {body}")]
    Upload { status: StatusCode, body: String },

    #[error("post creation rejected ({status}): {body}")]
    Publish { status: StatusCode, body: String },

    #[error("dedup ledger I/O error: {0}")]
    LedgerIo(#[source] std::io::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed response from an external service
    #[error("parse error: {0}")]
    Parse(String),
}
