//! Core data model: dataset kinds, raw creation arguments, loosely typed
//! property values, and the dataset descriptor reported by a backend.
//!
//! Everything here is [`Serialize`]/[`Deserialize`] so it can be carried in a
//! [`Request`](crate::message::Request) payload or a
//! [`Response`](crate::message::Response).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DatasetError;
use crate::property::TunableValue;

/// Separator that marks a property name as a user-defined annotation,
/// e.g. `"com.example:owner"`.
pub const USER_PROPERTY_SEPARATOR: char = ':';

/// Returns `true` when `name` is a user-defined (namespaced) property.
pub fn is_user_property(name: &str) -> bool {
    name.contains(USER_PROPERTY_SEPARATOR)
}

// ---------------------------------------------------------------------------
// Dataset kind
// ---------------------------------------------------------------------------

/// The two kinds of dataset a backend can create.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    /// A dataset exposing a hierarchical file namespace.
    Filesystem,
    /// A fixed-size block device.
    Volume,
}

impl DatasetKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Filesystem => "filesystem",
            Self::Volume => "volume",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetKind {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "filesystem" => Ok(Self::Filesystem),
            "volume" => Ok(Self::Volume),
            _ => Err(DatasetError::MissingOrInvalidArgument("type".to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// Property values
// ---------------------------------------------------------------------------

/// A loosely typed property value as supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Raw arguments of a dataset creation request, exactly as they arrive in
/// the request payload. Nothing here is trusted until it has been through
/// [`Validator::validate`](crate::validate::Validator::validate).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CreateArgs {
    /// Full dataset name, e.g. `"tank/home/alice"`.
    #[serde(default)]
    pub name: String,
    /// Dataset kind; `"filesystem"` or `"volume"`.
    #[serde(default, rename = "type")]
    pub kind: String,
    /// Volume size in bytes. Ignored for filesystems.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volsize: Option<i64>,
    /// Tunables and user-defined annotations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, PropertyValue>>,
}

impl CreateArgs {
    pub fn filesystem(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: DatasetKind::Filesystem.as_str().to_owned(),
            ..Default::default()
        }
    }

    pub fn volume(name: impl Into<String>, volsize: i64) -> Self {
        Self {
            name: name.into(),
            kind: DatasetKind::Volume.as_str().to_owned(),
            volsize: Some(volsize),
            ..Default::default()
        }
    }

    /// Add a single property, creating the mapping if needed.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Dataset descriptor
// ---------------------------------------------------------------------------

/// Effective property set of a dataset.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DatasetProperties {
    /// Backend tunables: defaults merged with the requested values.
    #[serde(default)]
    pub tunables: BTreeMap<String, TunableValue>,
    /// User-defined annotations, stored exactly as requested.
    #[serde(default)]
    pub user_defined: BTreeMap<String, PropertyValue>,
}

/// A dataset as reported by the storage backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dataset {
    pub name: String,
    pub kind: DatasetKind,
    /// Size in bytes; only set for volumes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volsize: Option<u64>,
    #[serde(default)]
    pub properties: DatasetProperties,
}

/// Result of a successful creation: a point-in-time snapshot of the new
/// dataset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatasetResult {
    pub dataset: Dataset,
}
