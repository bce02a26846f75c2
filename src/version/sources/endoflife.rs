//! endoflife.date release cycle feed

use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::version::error::SourceError;
use crate::version::source::{EndOfLife, EolDates, EolSource};

use super::{build_client, retry_after_secs};

/// EOL source backed by `GET /api/{product}.json`
pub struct EndOfLifeFeed {
    client: reqwest::Client,
    base_url: String,
    product: String,
}

impl EndOfLifeFeed {
    pub fn new(
        base_url: &str,
        product: &str,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        Ok(Self {
            client: build_client(user_agent, timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            product: product.to_string(),
        })
    }
}

/// One entry of the feed
#[derive(Debug, Deserialize)]
struct Cycle {
    cycle: String,
    eol: EolField,
}

/// The feed publishes either a date or a boolean
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EolField {
    Date(NaiveDate),
    Flag(bool),
}

fn into_eol_dates(cycles: Vec<Cycle>) -> EolDates {
    cycles
        .into_iter()
        .filter_map(|c| {
            let eol = match c.eol {
                EolField::Date(date) => EndOfLife::On(date),
                EolField::Flag(true) => EndOfLife::Reached,
                // No end of life scheduled yet
                EolField::Flag(false) => return None,
            };
            Some((c.cycle, eol))
        })
        .collect()
}

#[async_trait::async_trait]
impl EolSource for EndOfLifeFeed {
    async fn fetch_eol_dates(&self) -> Result<EolDates, SourceError> {
        let url = format!("{}/api/{}.json", self.base_url, self.product);
        debug!("Fetching end-of-life dates: {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SourceError::RateLimited {
                retry_after_secs: retry_after_secs(&response),
            });
        }

        if !status.is_success() {
            warn!("endoflife.date returned status {}: {}", status, url);
            return Err(SourceError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        let cycles: Vec<Cycle> = response
            .json()
            .await
            .map_err(|e| SourceError::InvalidResponse(e.to_string()))?;

        let dates = into_eol_dates(cycles);
        debug!("Found end-of-life data for {} cycles", dates.len());

        Ok(dates)
    }
}
