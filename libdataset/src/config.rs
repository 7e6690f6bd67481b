//! Provisioning configuration.
//!
//! Environment variables:
//! - `LIBDATASET_CONFIG`: path of a YAML file to load. Built-in defaults are
//!   used when unset.
//! - `LIBDATASET_STREAM_BASE`: overrides `stream_base` from the file.
//!
//! Example file:
//!
//! ```yaml
//! stream_base: unix:///run/provisioner/streams
//! tunables:
//!   volume:
//!     volblocksize: { type: size, min: 4096, max: 131072, power_of_two: true }
//!     compression: { type: choice, values: [off, lz4, zstd] }
//! ```
//!
//! A kind missing under `tunables` keeps its built-in whitelist; a kind that
//! is present replaces it entirely.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::property::TunableTable;

pub const CONFIG_ENV: &str = "LIBDATASET_CONFIG";
pub const STREAM_BASE_ENV: &str = "LIBDATASET_STREAM_BASE";

static DEFAULT_STREAM_BASE: &str = "unix:///run/libdataset/streams";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProvisionConfig {
    /// Prefix of the stream locators handed out for streamed replies.
    pub stream_base: String,
    /// Recognized tunables per dataset kind.
    pub tunables: TunableTable,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            stream_base: DEFAULT_STREAM_BASE.to_owned(),
            tunables: TunableTable::default(),
        }
    }
}

impl ProvisionConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&raw).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        serde_yaml::from_str(raw).context("Failed to parse provisioning config")
    }

    /// Load the configuration named by the environment.
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        if let Ok(base) = std::env::var(STREAM_BASE_ENV) {
            config.stream_base = base;
        }
        Ok(config)
    }
}
