//! Dataset creation handler.
//!
//! [`DatasetProvider`] composes the [`Validator`] and the [`Dispatcher`]
//! into the one operation exposed to transports: create a dataset and
//! return its description, either directly or through a stream.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::oneshot;
use tracing::{debug, instrument};

use crate::backend::DatasetBackend;
use crate::config::ProvisionConfig;
use crate::dispatch::Dispatcher;
use crate::error::DatasetError;
use crate::reply::{Delivery, Reply, StreamRef};
use crate::types::{CreateArgs, DatasetResult};
use crate::validate::Validator;

/// Provisioning service seam consumed by the transport.
#[async_trait]
pub trait DatasetProvisioner: Send + Sync {
    /// Create a dataset.
    ///
    /// Validation runs before anything else and its errors are always
    /// returned directly. Once the request is accepted, `delivery` decides
    /// whether the reply waits for the backend or resolves later.
    async fn create_with(
        &self,
        args: CreateArgs,
        delivery: Delivery,
    ) -> Result<Reply<DatasetResult>, DatasetError>;
}

/// The default [`DatasetProvisioner`], backed by any [`DatasetBackend`].
#[derive(Debug, Clone)]
pub struct DatasetProvider {
    validator: Validator,
    dispatcher: Dispatcher,
    stream_base: String,
}

impl DatasetProvider {
    pub fn new(backend: Arc<dyn DatasetBackend>, config: &ProvisionConfig) -> Self {
        Self {
            validator: Validator::new(Arc::new(config.tunables.clone())),
            dispatcher: Dispatcher::new(backend),
            stream_base: config.stream_base.clone(),
        }
    }

    /// Validate and create on the calling thread.
    #[instrument(skip_all, fields(name = %args.name, kind = %args.kind))]
    pub fn create(&self, args: &CreateArgs) -> Result<DatasetResult, DatasetError> {
        let cmd = self.validator.validate(args).inspect_err(|e| {
            debug!(error = %e, "request rejected");
        })?;
        self.dispatcher.dispatch(&cmd)
    }
}

#[async_trait]
impl DatasetProvisioner for DatasetProvider {
    #[instrument(skip_all, fields(name = %args.name, kind = %args.kind, ?delivery))]
    async fn create_with(
        &self,
        args: CreateArgs,
        delivery: Delivery,
    ) -> Result<Reply<DatasetResult>, DatasetError> {
        let cmd = self.validator.validate(&args).inspect_err(|e| {
            debug!(error = %e, "request rejected");
        })?;

        let dispatcher = self.dispatcher.clone();
        let work = move || dispatcher.dispatch(&cmd);

        match delivery {
            Delivery::Immediate => {
                let result = tokio::task::spawn_blocking(work)
                    .await
                    .map_err(DatasetError::internal)??;
                Ok(Reply::Ready(result))
            }
            Delivery::Stream(id) => {
                let stream = StreamRef::new(&self.stream_base, id);
                let (tx, rx) = oneshot::channel();
                let stream_log = stream.clone();
                tokio::task::spawn_blocking(move || {
                    if tx.send(work()).is_err() {
                        debug!(stream = %stream_log, "reply dropped before completion");
                    }
                });
                debug!(%stream, "creation continues in background");
                Ok(Reply::Pending { stream, rx })
            }
        }
    }
}
