//! Request/response envelope.
//!
//! A [`Request`] names a task and carries its arguments as a JSON payload;
//! the handler for that task parses them with [`Request::unmarshal_args`].
//! A [`Response`] carries exactly one [`Outcome`]: the created dataset, a
//! stream locator for an outcome still in flight, or an error.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DatasetError;
use crate::reply::StreamRef;
use crate::types::DatasetResult;

/// Task name routed to the dataset creation handler.
pub const CREATE_TASK: &str = "dataset-create";

/// An addressed, typed request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Request {
    pub id: Uuid,
    pub task: String,
    /// Where a streamed outcome should be delivered. Requests without a hook
    /// are answered directly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_hook: Option<String>,
    #[serde(default)]
    pub args: serde_json::Value,
}

impl Request {
    pub fn new<A: Serialize>(task: impl Into<String>, args: &A) -> Result<Self, DatasetError> {
        Ok(Self {
            id: Uuid::new_v4(),
            task: task.into(),
            response_hook: None,
            args: serde_json::to_value(args).map_err(DatasetError::internal)?,
        })
    }

    pub fn with_response_hook(mut self, hook: impl Into<String>) -> Self {
        self.response_hook = Some(hook.into());
        self
    }

    /// Parse the payload into the task's argument type.
    pub fn unmarshal_args<T: DeserializeOwned>(&self) -> Result<T, DatasetError> {
        T::deserialize(&self.args).map_err(|e| DatasetError::InvalidArgument(format!("args: {e}")))
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.task, self.id)
    }
}

/// What a request produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Outcome {
    /// A dataset was successfully created.
    Created(DatasetResult),
    /// The outcome will be delivered later on this stream.
    Streaming(StreamRef),
    /// The request failed.
    Error(DatasetError),
}

/// Answer to a [`Request`], carrying the request's id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Response {
    pub id: Uuid,
    pub outcome: Outcome,
}

impl Response {
    pub fn new(id: Uuid, outcome: Outcome) -> Self {
        Self { id, outcome }
    }

    pub fn error(id: Uuid, err: DatasetError) -> Self {
        Self::new(id, Outcome::Error(err))
    }

    pub fn result(&self) -> Option<&DatasetResult> {
        match &self.outcome {
            Outcome::Created(r) => Some(r),
            _ => None,
        }
    }

    pub fn stream_ref(&self) -> Option<&StreamRef> {
        match &self.outcome {
            Outcome::Streaming(s) => Some(s),
            _ => None,
        }
    }

    pub fn error_ref(&self) -> Option<&DatasetError> {
        match &self.outcome {
            Outcome::Error(e) => Some(e),
            _ => None,
        }
    }

    /// Collapse the response into the created dataset or an error. A
    /// streaming response is not a result yet and is reported as
    /// [`DatasetError::Transport`].
    pub fn into_result(self) -> Result<DatasetResult, DatasetError> {
        match self.outcome {
            Outcome::Created(r) => Ok(r),
            Outcome::Error(e) => Err(e),
            Outcome::Streaming(s) => Err(DatasetError::Transport(format!(
                "outcome pending on stream {s}"
            ))),
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Outcome::Created(r) => write!(f, "Created({}, {})", self.id, r.dataset.name),
            Outcome::Streaming(s) => write!(f, "Streaming({}, {s})", self.id),
            Outcome::Error(e) => write!(f, "Error({}, {e})", self.id),
        }
    }
}
