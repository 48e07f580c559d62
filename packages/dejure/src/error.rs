//! Error types for the dejure linker.
//!
//! Uses the dual-error pattern: `DejureError` for library consumers, and
//! specific error types for the individual pipeline stages. Only setup
//! errors ever reach a caller of [`crate::Annotator::annotate`]; fetch,
//! integrity and cache errors are turned into a fallback result.

use thiserror::Error;

/// Invalid configuration, detected when an option is assigned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Option value outside its declared set.
    #[error("Invalid value '{value}' for option {option}. Expected one of: {}", .allowed.join(", "))]
    InvalidOption {
        option: &'static str,
        value: String,
        allowed: &'static [&'static str],
    },

    /// Cache driver token without a backend.
    #[error("Cache driver '{0}' cannot be initiated. Expected one of: memory, file")]
    UnsupportedCacheDriver(String),

    /// Required setting not provided.
    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    /// Numeric or boolean setting that does not parse.
    #[error("Invalid value '{value}' for {name}")]
    InvalidValue { name: &'static str, value: String },
}

/// Failure talking to the annotation service.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Configured base URL does not form a valid request URL.
    #[error("Invalid service URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Connection could not be established or broke down.
    #[error("Transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// Request did not complete within the request timeout.
    #[error("Request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    /// Reading the response body exceeded the stream timeout.
    #[error("Response stream exceeded {timeout_ms} ms")]
    StreamTimeout { timeout_ms: u128 },

    /// Service answered with a status other than 200.
    #[error("Unexpected response status: {0}")]
    Status(u16),

    /// Body could not be read or was not valid UTF-8.
    #[error("Invalid response body: {0}")]
    InvalidBody(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e)
        } else {
            Self::Transport(e)
        }
    }
}

/// Annotated text that is not a safe superset of the original.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntegrityError {
    /// Response shorter than the input, which indicates truncation.
    #[error("Response truncated: {candidate} bytes returned for {original} bytes sent")]
    Truncated { original: usize, candidate: usize },

    /// Text outside the inserted links differs from the input.
    #[error("Response content differs from the original text outside of dejure.org links")]
    ContentMismatch,
}

/// Cache backend failure.
#[derive(Debug, Error)]
pub enum CacheError {
    /// IO error.
    #[error("Cache IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored entry could not be (de)serialized.
    #[error("Cache entry serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Lock around an in-memory store was poisoned.
    #[error("Cache lock poisoned: {0}")]
    Poisoned(String),
}

/// Main error type for the dejure library.
#[derive(Debug, Error)]
pub enum DejureError {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// HTTP client could not be built.
    #[error("HTTP client setup failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Cache setup or maintenance failed.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Result type alias for dejure operations.
pub type Result<T> = std::result::Result<T, DejureError>;
