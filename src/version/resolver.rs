//! Merges the tag listing and the end-of-life feed into version records
//!
//! Tags are parsed as PEP 440 versions so that pre-release ordering follows
//! CPython's own rules (`3.12.0a1 < 3.12.0rc1 < 3.12.0`).

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use pep508_rs::pep440_rs::{PrereleaseKind, Version};
use tracing::{debug, warn};

use crate::config::TrackingConfig;
use crate::version::source::{EolDates, TagRef};
use crate::version::types::{ReleaseLevel, Series, SupportStatus, VersionRecord};

/// Prefix every release tag ref carries
const VERSION_TAG_PREFIX: &str = "refs/tags/v";

/// A tag that parsed into a usable version
#[derive(Debug, Clone, PartialEq, Eq)]
struct ParsedTag {
    series: Series,
    patch: u32,
    version: Version,
}

impl ParsedTag {
    fn from_version(version: Version) -> Option<Self> {
        let release = version.release();
        let major = u32::try_from(*release.first()?).ok()?;
        let minor = u32::try_from(*release.get(1)?).ok()?;
        let patch = u32::try_from(release.get(2).copied().unwrap_or(0)).ok()?;
        Some(Self {
            series: Series::new(major, minor),
            patch,
            version,
        })
    }

    fn from_tag(tag: &TagRef) -> Option<Self> {
        let raw = tag.reference.strip_prefix(VERSION_TAG_PREFIX)?;
        let version = Version::from_str(raw).ok()?;
        Self::from_version(version)
    }

    fn level(&self) -> ReleaseLevel {
        match self.version.pre().map(|pre| pre.kind) {
            None if self.version.any_prerelease() => ReleaseLevel::Alpha,
            None => ReleaseLevel::Final,
            Some(PrereleaseKind::Alpha) => ReleaseLevel::Alpha,
            Some(PrereleaseKind::Beta) => ReleaseLevel::Beta,
            Some(PrereleaseKind::Rc) => ReleaseLevel::ReleaseCandidate,
        }
    }
}

/// Parse every tag that looks like a release; anything else is dropped
fn parse_tags(tags: &[TagRef]) -> Vec<ParsedTag> {
    let parsed: Vec<_> = tags.iter().filter_map(ParsedTag::from_tag).collect();
    debug!(
        "Parsed {} of {} tags as versions",
        parsed.len(),
        tags.len()
    );
    parsed
}

/// Highest version within each series
fn latest_per_series(parsed: Vec<ParsedTag>) -> HashMap<Series, ParsedTag> {
    let mut latest: HashMap<Series, ParsedTag> = HashMap::new();
    for tag in parsed {
        let newer = latest
            .get(&tag.series)
            .is_none_or(|current| tag.version > current.version);
        if newer {
            latest.insert(tag.series, tag);
        }
    }
    latest
}

/// Builds the record set of one refresh cycle
#[derive(Debug, Clone)]
pub struct VersionResolver {
    active_series: Vec<Series>,
    pre_release: Option<ParsedTag>,
}

impl VersionResolver {
    /// Invalid entries are logged and skipped
    pub fn new(tracking: &TrackingConfig) -> Self {
        let active_series = tracking
            .active_series
            .iter()
            .filter_map(|s| {
                s.parse::<Series>()
                    .inspect_err(|e| warn!("Ignoring active series: {}", e))
                    .ok()
            })
            .collect();

        let pre_release = if tracking.pre_release.is_empty() {
            None
        } else {
            let parsed = Version::from_str(&tracking.pre_release)
                .ok()
                .and_then(ParsedTag::from_version);
            if parsed.is_none() {
                warn!(
                    "Ignoring unparsable pre-release version '{}'",
                    tracking.pre_release
                );
            }
            parsed
        };

        Self {
            active_series,
            pre_release,
        }
    }

    pub fn active_series(&self) -> &[Series] {
        &self.active_series
    }

    /// Tag refs standing in for the stored final release of each active series
    ///
    /// Used in place of the tag listing when it cannot be fetched, so the
    /// end-of-life feed still re-derives the status of known releases.
    pub fn baseline_tags(&self, stored: &[VersionRecord]) -> Vec<TagRef> {
        stored
            .iter()
            .filter(|r| r.level == ReleaseLevel::Final && r.status != SupportStatus::Prerelease)
            .filter(|r| self.active_series.contains(&r.series()))
            .map(|r| TagRef::new(format!("{}{}", VERSION_TAG_PREFIX, r.full_version())))
            .collect()
    }

    /// Resolve raw tags and end-of-life dates into the records to upsert
    ///
    /// Emits at most one final release per active series, in allow-list
    /// order, followed by the synthesized pre-release. Series past their
    /// end of life are left out so that a stored record from an earlier
    /// cycle stays untouched.
    pub fn resolve(
        &self,
        tags: &[TagRef],
        eol_dates: &EolDates,
        now: DateTime<Utc>,
    ) -> Vec<VersionRecord> {
        let today = now.date_naive();
        let mut latest = latest_per_series(parse_tags(tags));
        let mut records = Vec::new();

        for series in &self.active_series {
            let Some(tag) = latest.remove(series) else {
                continue;
            };

            // Pre-releases never take part in end-of-life status
            if tag.version.any_prerelease() {
                debug!("Skipping {}: latest tag {} is a pre-release", series, tag.version);
                continue;
            }

            let status = match eol_dates.get(&series.to_string()) {
                None => SupportStatus::Feature,
                Some(eol) if eol.is_past(today) => {
                    debug!("Skipping {}: past end of life", series);
                    continue;
                }
                Some(_) => SupportStatus::Bugfix,
            };

            records.push(VersionRecord::new(
                series.major,
                series.minor,
                tag.patch,
                ReleaseLevel::Final,
                status,
                now,
            ));
        }

        if let Some(pre) = &self.pre_release {
            let level = match pre.level() {
                ReleaseLevel::Final => ReleaseLevel::Alpha,
                level => level,
            };
            records.push(VersionRecord::new(
                pre.series.major,
                pre.series.minor,
                pre.patch,
                level,
                SupportStatus::Prerelease,
                now,
            ));
        }

        records
    }
}
