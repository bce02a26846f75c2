//! Traits for the two upstream feeds a refresh cycle reads

use chrono::NaiveDate;
use indexmap::IndexMap;
#[cfg(test)]
use mockall::automock;
use serde::Deserialize;

use crate::version::error::SourceError;

/// One git ref as listed by the source-control API
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TagRef {
    #[serde(rename = "ref")]
    pub reference: String,
}

impl TagRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
        }
    }
}

/// End-of-life state of one release cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndOfLife {
    /// Support ends after this date
    On(NaiveDate),
    /// Support already ended, no date published
    Reached,
}

impl EndOfLife {
    /// Whether `today` is past the end of support
    pub fn is_past(&self, today: NaiveDate) -> bool {
        match self {
            EndOfLife::On(date) => today > *date,
            EndOfLife::Reached => true,
        }
    }
}

/// Series label ("3.12") to end-of-life, in feed order
pub type EolDates = IndexMap<String, EndOfLife>;

/// Lists version tags from source control
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait TagSource: Send + Sync {
    /// Fetches every tag ref of the repository
    ///
    /// Callers treat an error as "no update signal" for the cycle.
    async fn fetch_tags(&self) -> Result<Vec<TagRef>, SourceError>;
}

/// Reads end-of-life dates per release cycle
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait EolSource: Send + Sync {
    /// Fetches the cycle to end-of-life mapping
    ///
    /// An error aborts the refresh cycle.
    async fn fetch_eol_dates(&self) -> Result<EolDates, SourceError>;
}
