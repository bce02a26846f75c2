//! Record types shared by the resolver, the store and the read path

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Release maturity of a version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReleaseLevel {
    Alpha,
    Beta,
    ReleaseCandidate,
    Final,
}

impl ReleaseLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseLevel::Alpha => "alpha",
            ReleaseLevel::Beta => "beta",
            ReleaseLevel::ReleaseCandidate => "release-candidate",
            ReleaseLevel::Final => "final",
        }
    }
}

impl FromStr for ReleaseLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "alpha" => Ok(ReleaseLevel::Alpha),
            "beta" => Ok(ReleaseLevel::Beta),
            "release-candidate" => Ok(ReleaseLevel::ReleaseCandidate),
            "final" => Ok(ReleaseLevel::Final),
            other => Err(format!("unknown release level: {}", other)),
        }
    }
}

/// Support lifecycle stage of a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SupportStatus {
    Feature,
    Prerelease,
    Bugfix,
    Security,
    EndOfLife,
}

impl SupportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SupportStatus::Feature => "feature",
            SupportStatus::Prerelease => "prerelease",
            SupportStatus::Bugfix => "bugfix",
            SupportStatus::Security => "security",
            SupportStatus::EndOfLife => "end-of-life",
        }
    }
}

impl FromStr for SupportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "feature" => Ok(SupportStatus::Feature),
            "prerelease" => Ok(SupportStatus::Prerelease),
            "bugfix" => Ok(SupportStatus::Bugfix),
            "security" => Ok(SupportStatus::Security),
            "end-of-life" => Ok(SupportStatus::EndOfLife),
            other => Err(format!("unknown support status: {}", other)),
        }
    }
}

/// A `(major, minor)` pair, the unit of lifecycle tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Series {
    pub major: u32,
    pub minor: u32,
}

impl Series {
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for Series {
    type Err = String;

    /// Parses "3.12"; anything else is rejected
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (major, minor) = s
            .split_once('.')
            .ok_or_else(|| format!("invalid series: {}", s))?;
        let major = major
            .parse()
            .map_err(|_| format!("invalid series: {}", s))?;
        let minor = minor
            .parse()
            .map_err(|_| format!("invalid series: {}", s))?;
        Ok(Series { major, minor })
    }
}

/// One tracked release, replaced wholesale on every refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub name: String,
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub level: ReleaseLevel,
    pub status: SupportStatus,
    pub last_updated: DateTime<Utc>,
}

impl VersionRecord {
    pub fn new(
        major: u32,
        minor: u32,
        patch: u32,
        level: ReleaseLevel,
        status: SupportStatus,
        last_updated: DateTime<Utc>,
    ) -> Self {
        Self {
            name: format!("Python {}.{}.{}", major, minor, patch),
            major,
            minor,
            patch,
            level,
            status,
            last_updated,
        }
    }

    pub fn series(&self) -> Series {
        Series::new(self.major, self.minor)
    }

    /// "major.minor.patch"
    pub fn full_version(&self) -> String {
        format!("{}.{}.{}", self.major, self.minor, self.patch)
    }
}
