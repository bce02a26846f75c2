use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database lock poisoned")]
    LockPoisoned,

    #[error("Invalid stored record: {0}")]
    InvalidRecord(String),
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Rate limited: retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("HTTP client error: {0}")]
    Client(String),
}

/// Reasons a whole refresh cycle is abandoned
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("End-of-life feed unavailable: {0}")]
    Eol(#[source] SourceError),

    #[error("Failed to store versions: {0}")]
    Store(#[from] StoreError),
}
