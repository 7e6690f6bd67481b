//! Request server that dispatches incoming envelopes to a
//! [`DatasetProvisioner`].

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::DatasetError;
use crate::message::{CREATE_TASK, Outcome, Request, Response};
use crate::provider::DatasetProvisioner;
use crate::reply::Delivery;
use crate::transport::Call;
use crate::transport::client::DatasetClient;
use crate::types::CreateArgs;

/// A streamed outcome, addressed to the response hook of its request.
#[derive(Debug, Clone, PartialEq)]
pub struct HookDelivery {
    pub hook: String,
    pub response: Response,
}

/// Accepts requests from [`DatasetClient`]s and routes them by task name.
///
/// Requests carrying a response hook are answered at once with a stream
/// locator; their final [`Response`] is pushed to `hooks` when the backend
/// finishes.
pub struct DatasetServer<T> {
    handler: Arc<T>,
    hooks: mpsc::UnboundedSender<HookDelivery>,
}

impl<T> DatasetServer<T>
where
    T: DatasetProvisioner + 'static,
{
    pub fn new(handler: Arc<T>, hooks: mpsc::UnboundedSender<HookDelivery>) -> Self {
        Self { handler, hooks }
    }

    /// Start serving on the current tokio runtime.
    ///
    /// `buffer` bounds the number of requests queued ahead of the serve
    /// loop. The loop ends once every client has been dropped.
    pub fn spawn(self, buffer: usize) -> (DatasetClient, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(buffer);
        let handle = tokio::spawn(self.serve(rx));
        (DatasetClient::new(tx), handle)
    }

    /// Receive calls until the channel closes, handling each on its own task.
    pub async fn serve(self, mut rx: mpsc::Receiver<Call>) {
        info!("dataset server started");
        while let Some((request, reply_tx)) = rx.recv().await {
            let handler = Arc::clone(&self.handler);
            let hooks = self.hooks.clone();
            tokio::spawn(async move {
                let id = request.id;
                let response = Self::dispatch(&handler, &hooks, request).await;
                if reply_tx.send(response).is_err() {
                    warn!(%id, "caller went away before the response was ready");
                }
            });
        }
        info!("dataset server stopped");
    }

    /// Map a request to its handler by task name.
    #[instrument(skip_all, fields(request = %request))]
    async fn dispatch(
        handler: &Arc<T>,
        hooks: &mpsc::UnboundedSender<HookDelivery>,
        request: Request,
    ) -> Response {
        match request.task.as_str() {
            CREATE_TASK => {}
            other => {
                return failed(
                    request.id,
                    DatasetError::InvalidArgument(format!("unknown task: {other}")),
                );
            }
        }
        Self::create(handler, hooks, request).await
    }

    async fn create(
        handler: &Arc<T>,
        hooks: &mpsc::UnboundedSender<HookDelivery>,
        request: Request,
    ) -> Response {
        let id = request.id;
        let args: CreateArgs = match request.unmarshal_args() {
            Ok(args) => args,
            Err(e) => return failed(id, e),
        };

        let delivery = match request.response_hook {
            Some(_) => Delivery::Stream(id),
            None => Delivery::Immediate,
        };

        let reply = match handler.create_with(args, delivery).await {
            Ok(reply) => reply,
            Err(e) => return failed(id, e),
        };

        let Some(stream) = reply.stream_ref().cloned() else {
            return match reply.resolve().await {
                Ok(result) => Response::new(id, Outcome::Created(result)),
                Err(e) => failed(id, e),
            };
        };

        let hook = request.response_hook.unwrap_or_default();
        let hooks = hooks.clone();
        tokio::spawn(async move {
            let outcome = match reply.resolve().await {
                Ok(result) => Outcome::Created(result),
                Err(e) => Outcome::Error(e),
            };
            debug!(%id, %hook, "delivering streamed outcome");
            let delivery = HookDelivery {
                hook,
                response: Response::new(id, outcome),
            };
            if hooks.send(delivery).is_err() {
                warn!(%id, "response hook channel closed, outcome dropped");
            }
        });

        Response::new(id, Outcome::Streaming(stream))
    }
}

/// Error response for `id`. Caller mistakes log at debug, the rest at warn.
fn failed(id: Uuid, err: DatasetError) -> Response {
    if err.is_argument_error() {
        debug!(%id, error = %err, "request rejected");
    } else {
        warn!(%id, error = %err, "request failed");
    }
    Response::error(id, err)
}
