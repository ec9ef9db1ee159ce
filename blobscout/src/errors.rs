/// Error types for blobscout.
///
/// Errors fall into three groups that the run orchestrator treats differently:
///
/// 1. **Fatal before work starts**: `InvalidPattern` and `ConfigError`. These are
///    produced by [`SearchConfig::validate`](crate::config::SearchConfig::validate)
///    and no thread is ever spawned.
/// 2. **Fatal during the run**: `ListFailed`, `WorkersExhausted` and
///    `WorkerPanicked`. The shared cancellation token is tripped and no report
///    is produced.
/// 3. **Per-object**: `FetchFailed`, `DecompressFailed` and `IoError` raised
///    while scanning a single object. These are logged by the worker that hit
///    them and never fail the run on their own.
///
/// `Cancelled` is what a worker or the discoverer returns after observing the
/// cancellation token; it is expected and never reported to the user.
use thiserror::Error;

/// Result type for search operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Errors that can occur during a search run
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Error listing objects under prefix '{prefix}': {reason}")]
    ListFailed { prefix: String, reason: String },
    #[error("Error fetching object {key}: {reason}")]
    FetchFailed { key: String, reason: String },
    #[error("Error decompressing object {key}: {reason}")]
    DecompressFailed { key: String, reason: String },
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Search cancelled")]
    Cancelled,
    #[error("All workers exited with {pending} discovered objects still unprocessed")]
    WorkersExhausted { pending: u64 },
    #[error("A search thread panicked")]
    WorkerPanicked,
}

impl SearchError {
    pub fn invalid_pattern(pattern: impl Into<String>) -> Self {
        Self::InvalidPattern(pattern.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn list_failed(prefix: impl Into<String>, reason: impl ToString) -> Self {
        Self::ListFailed {
            prefix: prefix.into(),
            reason: reason.to_string(),
        }
    }

    pub fn fetch_failed(key: impl Into<String>, reason: impl ToString) -> Self {
        Self::FetchFailed {
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    pub fn decompress_failed(key: impl Into<String>, reason: impl ToString) -> Self {
        Self::DecompressFailed {
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error must abort the whole run.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::InvalidPattern(_)
            | Self::ConfigError(_)
            | Self::ListFailed { .. }
            | Self::WorkersExhausted { .. }
            | Self::WorkerPanicked => true,
            Self::FetchFailed { .. }
            | Self::DecompressFailed { .. }
            | Self::IoError(_)
            | Self::Cancelled => false,
        }
    }
}
