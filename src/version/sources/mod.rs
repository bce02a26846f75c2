//! Upstream feed clients

pub mod endoflife;
pub mod github;

use std::time::Duration;

use reqwest::Client;

use crate::version::error::SourceError;

pub use endoflife::EndOfLifeFeed;
pub use github::GitHubTags;

/// Builds the HTTP client shared by the feed clients
///
/// Every request carries the identifying user agent and is bounded by `timeout`.
fn build_client(user_agent: &str, timeout: Duration) -> Result<Client, SourceError> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()
        .map_err(|e| SourceError::Client(e.to_string()))
}

/// Extracts the retry-after header in seconds, if present
fn retry_after_secs(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}
