//! Tunable whitelist and typed property values.
//!
//! Which tunables a backend recognizes, and what values they accept, is
//! backend-specific, so the whitelist is data: a [`TunableTable`] mapping
//! each [`DatasetKind`] to a set of property names and their [`ValueRule`].
//! The built-in table mirrors the common ZFS tunables and can be replaced
//! through [`ProvisionConfig`](crate::config::ProvisionConfig).

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DatasetError;
use crate::types::{DatasetKind, PropertyValue, is_user_property};

pub const VOLBLOCKSIZE: &str = "volblocksize";

// ---------------------------------------------------------------------------
// Typed values
// ---------------------------------------------------------------------------

/// A tunable value after it has been checked against its [`ValueRule`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum TunableValue {
    Bool(bool),
    Size(u64),
    Text(String),
}

impl TunableValue {
    pub fn as_size(&self) -> Option<u64> {
        match self {
            Self::Size(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for TunableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(true) => f.write_str("on"),
            Self::Bool(false) => f.write_str("off"),
            Self::Size(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Parse a byte size such as `8192`, `8K`, `128KB` or `1G`.
///
/// Suffixes are binary and case-insensitive; fractional values are not
/// accepted.
pub fn parse_size(s: &str) -> Option<u64> {
    let s = s.trim();
    let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (digits, suffix) = s.split_at(split);
    if digits.is_empty() {
        return None;
    }
    let n: u64 = digits.parse().ok()?;
    let shift = match suffix.to_ascii_uppercase().as_str() {
        "" | "B" => 0,
        "K" | "KB" => 10,
        "M" | "MB" => 20,
        "G" | "GB" => 30,
        "T" | "TB" => 40,
        "P" | "PB" => 50,
        _ => return None,
    };
    n.checked_mul(1u64 << shift)
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Accepted value shape of a single tunable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValueRule {
    /// `true`/`false` or `"on"`/`"off"`.
    Bool,
    /// A byte count, optionally bounded and/or restricted to powers of two.
    Size {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<u64>,
        #[serde(default)]
        power_of_two: bool,
    },
    /// One of a fixed set of strings.
    Choice { values: Vec<String> },
    /// Any string.
    Text,
}

impl ValueRule {
    const fn size() -> Self {
        Self::Size {
            min: None,
            max: None,
            power_of_two: false,
        }
    }

    fn choice(values: &[&str]) -> Self {
        Self::Choice {
            values: values.iter().map(|v| (*v).to_owned()).collect(),
        }
    }

    /// Check `value` against this rule.
    pub fn parse(&self, name: &str, value: &PropertyValue) -> Result<TunableValue, DatasetError> {
        let invalid = || DatasetError::InvalidArgument(format!("{name}: unsupported value {value}"));
        match (self, value) {
            (Self::Bool, PropertyValue::Bool(b)) => Ok(TunableValue::Bool(*b)),
            (Self::Bool, PropertyValue::Text(s)) => match s.as_str() {
                "on" => Ok(TunableValue::Bool(true)),
                "off" => Ok(TunableValue::Bool(false)),
                _ => Err(invalid()),
            },
            (
                Self::Size {
                    min,
                    max,
                    power_of_two,
                },
                _,
            ) => {
                let n = match value {
                    PropertyValue::Int(i) => u64::try_from(*i).ok(),
                    PropertyValue::Text(s) => parse_size(s),
                    _ => None,
                }
                .ok_or_else(invalid)?;
                if min.is_some_and(|m| n < m)
                    || max.is_some_and(|m| n > m)
                    || (*power_of_two && !n.is_power_of_two())
                {
                    return Err(invalid());
                }
                Ok(TunableValue::Size(n))
            }
            (Self::Choice { values }, PropertyValue::Text(s)) if values.contains(s) => {
                Ok(TunableValue::Text(s.clone()))
            }
            (Self::Text, PropertyValue::Text(s)) => Ok(TunableValue::Text(s.clone())),
            _ => Err(invalid()),
        }
    }
}

// ---------------------------------------------------------------------------
// Whitelist
// ---------------------------------------------------------------------------

/// Per-kind whitelist of recognized tunables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TunableTable {
    #[serde(default = "builtin_filesystem")]
    pub filesystem: BTreeMap<String, ValueRule>,
    #[serde(default = "builtin_volume")]
    pub volume: BTreeMap<String, ValueRule>,
}

impl Default for TunableTable {
    fn default() -> Self {
        Self {
            filesystem: builtin_filesystem(),
            volume: builtin_volume(),
        }
    }
}

const CHECKSUMS: &[&str] = &[
    "on", "off", "fletcher2", "fletcher4", "sha256", "sha512", "skein", "edonr", "blake3",
];
const COMPRESSIONS: &[&str] = &["on", "off", "lzjb", "gzip", "lz4", "zle", "zstd"];
const SYNC_MODES: &[&str] = &["standard", "always", "disabled"];

fn common_rules() -> BTreeMap<String, ValueRule> {
    BTreeMap::from([
        ("checksum".to_owned(), ValueRule::choice(CHECKSUMS)),
        ("compression".to_owned(), ValueRule::choice(COMPRESSIONS)),
        (
            "copies".to_owned(),
            ValueRule::Size {
                min: Some(1),
                max: Some(3),
                power_of_two: false,
            },
        ),
        ("readonly".to_owned(), ValueRule::Bool),
        ("refreservation".to_owned(), ValueRule::size()),
        ("reservation".to_owned(), ValueRule::size()),
        ("sync".to_owned(), ValueRule::choice(SYNC_MODES)),
    ])
}

fn builtin_filesystem() -> BTreeMap<String, ValueRule> {
    let mut rules = common_rules();
    rules.extend([
        ("atime".to_owned(), ValueRule::Bool),
        ("canmount".to_owned(), ValueRule::choice(&["on", "off", "noauto"])),
        ("devices".to_owned(), ValueRule::Bool),
        ("exec".to_owned(), ValueRule::Bool),
        ("mountpoint".to_owned(), ValueRule::Text),
        ("quota".to_owned(), ValueRule::size()),
        (
            "recordsize".to_owned(),
            ValueRule::Size {
                min: Some(512),
                max: Some(1 << 20),
                power_of_two: true,
            },
        ),
        ("refquota".to_owned(), ValueRule::size()),
        ("setuid".to_owned(), ValueRule::Bool),
        ("xattr".to_owned(), ValueRule::choice(&["on", "off", "sa", "dir"])),
    ]);
    rules
}

fn builtin_volume() -> BTreeMap<String, ValueRule> {
    let mut rules = common_rules();
    rules.extend([
        ("logbias".to_owned(), ValueRule::choice(&["latency", "throughput"])),
        (
            VOLBLOCKSIZE.to_owned(),
            ValueRule::Size {
                min: Some(512),
                max: Some(128 * 1024),
                power_of_two: true,
            },
        ),
    ]);
    rules
}

impl TunableTable {
    /// All rules recognized for `kind`.
    pub fn rules(&self, kind: DatasetKind) -> &BTreeMap<String, ValueRule> {
        match kind {
            DatasetKind::Filesystem => &self.filesystem,
            DatasetKind::Volume => &self.volume,
        }
    }

    pub fn rule(&self, kind: DatasetKind, name: &str) -> Option<&ValueRule> {
        self.rules(kind).get(name)
    }
}

// ---------------------------------------------------------------------------
// Partitioned property set
// ---------------------------------------------------------------------------

/// Properties split into checked tunables and opaque annotations.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PropertySet {
    pub tunables: BTreeMap<String, TunableValue>,
    pub user: BTreeMap<String, PropertyValue>,
}

impl PropertySet {
    /// Partition a raw property mapping for a dataset of `kind`.
    ///
    /// Fails with [`DatasetError::InvalidArgument`] on the first key that is
    /// neither whitelisted nor namespaced. Values are checked against their
    /// rules only once every key is known.
    pub fn partition(
        table: &TunableTable,
        kind: DatasetKind,
        raw: Option<&BTreeMap<String, PropertyValue>>,
    ) -> Result<Self, DatasetError> {
        let mut set = Self::default();
        let Some(raw) = raw else {
            return Ok(set);
        };

        if let Some(unknown) = raw
            .keys()
            .find(|name| table.rule(kind, name).is_none() && !is_user_property(name))
        {
            return Err(DatasetError::InvalidArgument(unknown.clone()));
        }

        for (name, value) in raw {
            match table.rule(kind, name) {
                Some(rule) => {
                    let parsed = rule.parse(name, value)?;
                    set.tunables.insert(name.clone(), parsed);
                }
                None => {
                    set.user.insert(name.clone(), value.clone());
                }
            }
        }
        Ok(set)
    }

    pub fn is_empty(&self) -> bool {
        self.tunables.is_empty() && self.user.is_empty()
    }

    pub fn tunable(&self, name: &str) -> Option<&TunableValue> {
        self.tunables.get(name)
    }
}
