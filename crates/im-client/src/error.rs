//! Infrastructure Manager client error types

use thiserror::Error;

/// Errors raised by the IM client.
///
/// A non-2xx answer from the IM service is not an error at this level: it is
/// returned as [`crate::ImResponse::Failure`]. Only local validation problems
/// and conditions the client cannot interpret end up here.
#[derive(Error, Debug)]
pub enum ImError {
    #[error("Auth IDs must be unique: {0}")]
    DuplicateAuthId(String),

    #[error("Invalid auth line {line}: {reason}")]
    InvalidAuthLine { line: usize, reason: String },

    #[error("Invalid template type '{value}'. Only {accepted} are accepted.")]
    InvalidTemplateType {
        value: String,
        accepted: &'static str,
    },

    #[error("Invalid resource URL: {0}")]
    InvalidResourceUrl(String),

    #[error("Environment variable not set: {0}")]
    MissingEnvVar(String),

    #[error(
        "Auth file not found. Checked: $IM_AUTH_FILE, ./auth.dat, ./.im/auth.dat, \
        <config dir>/im-client/auth.dat"
    )]
    AuthFileNotFound,

    #[error("API error: {0}")]
    Api(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ImError>;
