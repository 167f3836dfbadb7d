/// Error types for the journal core, the trade store and the HTTP surface.
/// Degenerate inputs (empty snapshots, zero denominators) are never errors:
/// the metrics engine returns zeroed aggregates for those instead.
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    /// A record violates the caller contract (missing or non-finite numbers,
    /// legs from different groups, broken Closed invariant).
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("DCA group has no legs")]
    EmptyGroup,

    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    #[error("trade not found: {0}")]
    NotFound(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(String),
}

impl From<serde_json::Error> for JournalError {
    fn from(e: serde_json::Error) -> Self {
        JournalError::Parse(e.to_string())
    }
}

impl From<rusqlite::Error> for JournalError {
    fn from(e: rusqlite::Error) -> Self {
        JournalError::Database(e.to_string())
    }
}

impl From<csv::Error> for JournalError {
    fn from(e: csv::Error) -> Self {
        JournalError::Io(e.to_string())
    }
}

impl From<std::io::Error> for JournalError {
    fn from(e: std::io::Error) -> Self {
        JournalError::Io(e.to_string())
    }
}

pub type JournalResult<T> = Result<T, JournalError>;
