//! Typed decode of build-script request fields
//!
//! HTML forms send checkboxes as `"on"` when ticked and omit them otherwise.
//! Decoding goes through serde so every field has an explicit type and default
//! instead of being coerced loosely at the handler. The `check-options`
//! command runs the same decode and validation from the command line.

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::version::types::VersionRecord;

pub const DEFAULT_SELECTED_VERSION: &str = "3.13.0";
pub const DEFAULT_PREFIX_PATH: &str = "/opt/python/";

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("Malformed build options: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Unknown Python version: {0}")]
    UnknownVersion(String),
}

/// Options for the generated build script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuildOptions {
    pub selected_version: String,
    pub prefix_path: String,
    #[serde(rename = "installOSPackages", deserialize_with = "checkbox")]
    pub install_os_packages: bool,
    #[serde(deserialize_with = "checkbox")]
    pub enable_speed_optimization: bool,
    #[serde(deserialize_with = "checkbox")]
    pub enable_shared_libraries: bool,
    #[serde(rename = "useAllCPUs", deserialize_with = "checkbox")]
    pub use_all_cpus: bool,
    #[serde(deserialize_with = "checkbox")]
    pub run_post_test: bool,
    #[serde(deserialize_with = "checkbox")]
    pub update_packages: bool,
    #[serde(deserialize_with = "checkbox")]
    pub add_soft_links: bool,
    #[serde(rename = "disableGIL", deserialize_with = "checkbox")]
    pub disable_gil: bool,
    #[serde(rename = "enableJIT", deserialize_with = "checkbox")]
    pub enable_jit: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            selected_version: DEFAULT_SELECTED_VERSION.to_string(),
            prefix_path: DEFAULT_PREFIX_PATH.to_string(),
            install_os_packages: false,
            enable_speed_optimization: false,
            enable_shared_libraries: false,
            use_all_cpus: false,
            run_post_test: false,
            update_packages: false,
            add_soft_links: false,
            disable_gil: false,
            enable_jit: false,
        }
    }
}

/// Accepts form checkbox strings as well as JSON booleans
fn checkbox<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Bool(b) => Ok(b),
        Raw::Text(s) => match s.to_ascii_lowercase().as_str() {
            "on" | "true" | "1" | "yes" => Ok(true),
            "off" | "false" | "0" | "no" | "" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "invalid checkbox value: {}",
                other
            ))),
        },
    }
}

impl BuildOptions {
    /// Decode submitted form fields, then check every value
    ///
    /// Absent checkboxes are false; absent text fields take their defaults.
    pub fn from_form<I, K, V>(fields: I) -> Result<Self, OptionsError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map: serde_json::Map<String, serde_json::Value> = fields
            .into_iter()
            .map(|(k, v)| (k.into(), serde_json::Value::String(v.into())))
            .collect();

        let options: BuildOptions = serde_json::from_value(serde_json::Value::Object(map))?;
        options.validate()?;
        Ok(options)
    }

    fn validate(&self) -> Result<(), OptionsError> {
        let parts: Vec<&str> = self.selected_version.split('.').collect();
        if parts.len() != 3 || parts.iter().any(|p| p.parse::<u32>().is_err()) {
            return Err(OptionsError::InvalidField {
                field: "selectedVersion",
                reason: format!("expected major.minor.patch, got '{}'", self.selected_version),
            });
        }

        if !Path::new(&self.prefix_path).is_absolute() {
            return Err(OptionsError::InvalidField {
                field: "prefixPath",
                reason: format!("must be an absolute path, got '{}'", self.prefix_path),
            });
        }

        Ok(())
    }

    /// Reject a selected version that is not among the known records
    pub fn validate_against(&self, records: &[VersionRecord]) -> Result<(), OptionsError> {
        if records
            .iter()
            .any(|r| r.full_version() == self.selected_version)
        {
            Ok(())
        } else {
            Err(OptionsError::UnknownVersion(self.selected_version.clone()))
        }
    }
}
