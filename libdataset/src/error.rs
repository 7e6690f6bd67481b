//! Caller-facing error taxonomy.
//!
//! Every failure of a creation request ends up as a [`DatasetError`].
//! Validation failures are produced by the
//! [`Validator`](crate::validate::Validator); backend failures are mapped
//! once by the [`Dispatcher`](crate::dispatch::Dispatcher). The enum is
//! [`Serialize`]/[`Deserialize`] so it can travel inside a
//! [`Response`](crate::message::Response).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for dataset provisioning.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum DatasetError {
    /// A structurally required field is absent.
    #[error("missing arg: {0}")]
    MissingArgument(String),

    /// A field is absent or its value is invalid for the requested kind.
    #[error("missing or invalid arg: {0}")]
    MissingOrInvalidArgument(String),

    /// A supplied value is syntactically or semantically wrong.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The requested name collides with an existing dataset.
    #[error("dataset {0} already exists")]
    AlreadyExists(String),

    /// A parent of the requested name does not exist.
    #[error("dataset {0} not found")]
    NotFound(String),

    /// Any other backend failure; the message is passed through verbatim.
    #[error("backend error: {0}")]
    Backend(String),

    /// The request could not be delivered to or answered by the handler.
    #[error("transport error: {0}")]
    Transport(String),

    /// The completion of an accepted request was lost.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DatasetError {
    /// Create a [`DatasetError::Backend`] from anything that implements
    /// [`std::fmt::Display`].
    pub fn backend<E: std::fmt::Display>(e: E) -> Self {
        Self::Backend(e.to_string())
    }

    /// Create a [`DatasetError::Transport`] from anything that implements
    /// [`std::fmt::Display`].
    pub fn transport<E: std::fmt::Display>(e: E) -> Self {
        Self::Transport(e.to_string())
    }

    /// Create a [`DatasetError::Internal`] from anything that implements
    /// [`std::fmt::Display`].
    pub fn internal<E: std::fmt::Display>(e: E) -> Self {
        Self::Internal(e.to_string())
    }

    /// `true` for errors that blame the caller's arguments.
    pub fn is_argument_error(&self) -> bool {
        matches!(
            self,
            Self::MissingArgument(_) | Self::MissingOrInvalidArgument(_) | Self::InvalidArgument(_)
        )
    }
}
