//! Result delivery handle.
//!
//! A [`Reply`] is either already resolved or will be resolved later, in which
//! case it carries the [`StreamRef`] a transport hands to the caller so the
//! eventual outcome can be matched to the request.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::error::DatasetError;

/// Locator of the stream on which a pending outcome will be delivered,
/// e.g. `unix:///run/libdataset/streams/<request-id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamRef(String);

impl StreamRef {
    pub fn new(base: &str, id: Uuid) -> Self {
        Self(format!("{}/{id}", base.trim_end_matches('/')))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How the caller wants the outcome of an accepted request delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Wait for the backend and return the outcome directly.
    Immediate,
    /// Return at once; the outcome follows on the stream for this request id.
    Stream(Uuid),
}

/// Outcome of an accepted request, resolved now or later.
#[derive(Debug)]
pub enum Reply<T> {
    Ready(T),
    Pending {
        stream: StreamRef,
        rx: oneshot::Receiver<Result<T, DatasetError>>,
    },
}

impl<T> Reply<T> {
    /// The stream locator, if the outcome is not available yet.
    pub fn stream_ref(&self) -> Option<&StreamRef> {
        match self {
            Self::Ready(_) => None,
            Self::Pending { stream, .. } => Some(stream),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Wait for the outcome.
    ///
    /// Dropping a pending reply does not cancel the underlying work.
    pub async fn resolve(self) -> Result<T, DatasetError> {
        match self {
            Self::Ready(value) => Ok(value),
            Self::Pending { stream, rx } => rx.await.map_err(|_| {
                DatasetError::Internal(format!("stream {stream} closed before completion"))
            })?,
        }
    }
}
