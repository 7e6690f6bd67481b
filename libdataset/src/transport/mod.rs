//! In-process transport for dataset requests.
//!
//! [`DatasetServer`](server::DatasetServer) accepts [`Request`](crate::message::Request)s
//! over a tokio channel and handles each on its own task;
//! [`DatasetClient`](client::DatasetClient) is the sending half.

pub mod client;
pub mod server;

use tokio::sync::oneshot;

use crate::message::{Request, Response};

/// A request paired with the channel its response goes back on.
pub(crate) type Call = (Request, oneshot::Sender<Response>);

pub use client::DatasetClient;
pub use server::{DatasetServer, HookDelivery};
