//! Source test utilities

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;

use python_versions::config::{AppConfig, SourcesConfig};
use python_versions::service::server::App;
use python_versions::version::error::SourceError;
use python_versions::version::source::{EndOfLife, EolDates, EolSource, TagRef, TagSource};

/// Tag source returning a fixed listing, or failing when none is set
pub struct FakeTags {
    refs: Option<Vec<String>>,
}

#[allow(dead_code)]
impl FakeTags {
    pub fn with_tags(tags: &[&str]) -> Self {
        Self {
            refs: Some(tags.iter().map(|t| format!("refs/tags/{}", t)).collect()),
        }
    }

    pub fn failing() -> Self {
        Self { refs: None }
    }
}

#[async_trait]
impl TagSource for FakeTags {
    async fn fetch_tags(&self) -> Result<Vec<TagRef>, SourceError> {
        match &self.refs {
            Some(refs) => Ok(refs.iter().map(TagRef::new).collect()),
            None => Err(SourceError::InvalidResponse("tags unavailable".to_string())),
        }
    }
}

/// EOL source whose answer can be swapped between cycles
pub struct FakeEol {
    dates: Mutex<Option<EolDates>>,
}

#[allow(dead_code)]
impl FakeEol {
    pub fn with_dates(entries: &[(&str, &str)]) -> Self {
        let dates = entries
            .iter()
            .map(|(cycle, date)| {
                (
                    cycle.to_string(),
                    EndOfLife::On(date.parse::<NaiveDate>().unwrap()),
                )
            })
            .collect();
        Self {
            dates: Mutex::new(Some(dates)),
        }
    }

    pub fn failing() -> Self {
        Self {
            dates: Mutex::new(None),
        }
    }

    pub fn set_failing(&self) {
        *self.dates.lock().unwrap() = None;
    }
}

#[async_trait]
impl EolSource for FakeEol {
    async fn fetch_eol_dates(&self) -> Result<EolDates, SourceError> {
        self.dates
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| SourceError::InvalidResponse("eol unavailable".to_string()))
    }
}

/// Build an app whose feed clients point at `base_url`
#[allow(dead_code)]
pub fn build_app(base_url: &str, db_path: &Path) -> App {
    let config = AppConfig {
        sources: SourcesConfig {
            tags_base_url: base_url.to_string(),
            eol_base_url: base_url.to_string(),
            timeout_ms: 5_000,
            ..SourcesConfig::default()
        },
        ..AppConfig::default()
    };
    App::build(config, db_path).unwrap()
}
