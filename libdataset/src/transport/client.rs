//! Client handle used to submit requests to a running
//! [`DatasetServer`](crate::transport::DatasetServer).

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument};

use crate::error::DatasetError;
use crate::message::{CREATE_TASK, Request, Response};
use crate::transport::Call;
use crate::types::{CreateArgs, DatasetResult};

/// Sending half of an in-process dataset server. Cheap to clone.
#[derive(Debug, Clone)]
pub struct DatasetClient {
    tx: mpsc::Sender<Call>,
}

impl DatasetClient {
    pub(crate) fn new(tx: mpsc::Sender<Call>) -> Self {
        Self { tx }
    }

    /// Send a request and wait for its response.
    #[instrument(skip_all, fields(request = %request))]
    pub async fn request(&self, request: Request) -> Result<Response, DatasetError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send((request, reply_tx))
            .await
            .map_err(|_| DatasetError::Transport("server is not running".into()))?;

        let response = reply_rx
            .await
            .map_err(|_| DatasetError::Transport("server dropped the request".into()))?;
        debug!(%response, "response received");
        Ok(response)
    }

    /// Create a dataset and wait for the result.
    pub async fn create(&self, args: &CreateArgs) -> Result<DatasetResult, DatasetError> {
        let request = Request::new(CREATE_TASK, args)?;
        self.request(request).await?.into_result()
    }
}
