//! Storage backend contract.
//!
//! A backend owns the dataset namespace and is the sole authority on whether
//! a name exists. The provisioning layer never pre-checks existence; it
//! issues one [`DatasetBackend::create_dataset`] call and trusts its outcome.

pub mod memory;

use nix::errno::Errno;
use thiserror::Error;

use crate::property::PropertySet;
use crate::types::Dataset;
use crate::validate::KindSpec;

pub use memory::MemoryBackend;

/// Failure reported by a backend.
///
/// `errno` carries the failure category when the backend has one; the
/// [`Dispatcher`](crate::dispatch::Dispatcher) maps on it. The message is
/// passed to callers verbatim for categories it does not recognize.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct BackendError {
    errno: Option<Errno>,
    message: String,
}

impl BackendError {
    /// A categorized failure with extra context, e.g. the offending name.
    pub fn os(errno: Errno, detail: impl std::fmt::Display) -> Self {
        Self {
            errno: Some(errno),
            message: format!("{detail}: {}", errno.desc()),
        }
    }

    /// An uncategorized failure.
    pub fn other(message: impl Into<String>) -> Self {
        Self {
            errno: None,
            message: message.into(),
        }
    }

    pub fn errno(&self) -> Option<Errno> {
        self.errno
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<Errno> for BackendError {
    fn from(errno: Errno) -> Self {
        Self {
            errno: Some(errno),
            message: errno.desc().to_owned(),
        }
    }
}

/// A storage engine able to create filesystems and volumes.
///
/// `create_dataset` may block for as long as physical allocation takes; the
/// [`DatasetProvider`](crate::provider::DatasetProvider) runs it on the
/// blocking pool when called asynchronously. Implementations must make the
/// create atomic per name: of several concurrent creators of one name, at
/// most one succeeds and the others fail with `EEXIST`.
pub trait DatasetBackend: Send + Sync {
    /// Create `name` with the given kind and properties and report the
    /// resulting dataset.
    fn create_dataset(
        &self,
        name: &str,
        spec: &KindSpec,
        properties: &PropertySet,
    ) -> Result<Dataset, BackendError>;
}
