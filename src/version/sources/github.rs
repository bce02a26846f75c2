//! GitHub git refs API tag source

use std::time::Duration;

use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::version::error::SourceError;
use crate::version::source::{TagRef, TagSource};

use super::{build_client, retry_after_secs};

/// Tag source backed by `GET /repos/{owner}/{repo}/git/refs/tags`
pub struct GitHubTags {
    client: reqwest::Client,
    base_url: String,
    repository: String,
}

impl GitHubTags {
    pub fn new(
        base_url: &str,
        repository: &str,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        Ok(Self {
            client: build_client(user_agent, timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            repository: repository.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl TagSource for GitHubTags {
    async fn fetch_tags(&self) -> Result<Vec<TagRef>, SourceError> {
        let url = format!("{}/repos/{}/git/refs/tags", self.base_url, self.repository);
        debug!("Fetching tags: {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?;

        let status = response.status();

        // GitHub reports exhausted anonymous quota as 403 with zero remaining
        let quota_exhausted = status == StatusCode::FORBIDDEN
            && response
                .headers()
                .get("x-ratelimit-remaining")
                .is_some_and(|v| v.as_bytes() == b"0");

        if status == StatusCode::TOO_MANY_REQUESTS || quota_exhausted {
            return Err(SourceError::RateLimited {
                retry_after_secs: retry_after_secs(&response),
            });
        }

        if !status.is_success() {
            warn!("GitHub API returned status {}: {}", status, url);
            return Err(SourceError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        let tags: Vec<TagRef> = response.json().await.map_err(|e| {
            warn!("Failed to parse GitHub tags response: {}", e);
            SourceError::InvalidResponse(e.to_string())
        })?;

        debug!("Found {} tags in {}", tags.len(), self.repository);

        Ok(tags)
    }
}
