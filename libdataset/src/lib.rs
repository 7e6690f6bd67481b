//! # libdataset — dataset provisioning requests
//!
//! `libdataset` validates requests to create storage datasets (filesystems
//! and block volumes), dispatches them to a storage backend, and normalizes
//! backend failures into a small, stable error taxonomy. Results are
//! returned directly or, for long-running creations, through a stream
//! reference resolved later. The crate runs on the Tokio runtime, logs
//! through `tracing` and reports errors with `thiserror` enums.
//!
//! ## Module overview
//!
//! | Module | Purpose |
//! |---|---|
//! | [`types`] | Data model: `CreateArgs`, `DatasetKind`, `Dataset`, `DatasetResult`. |
//! | [`error`] | [`DatasetError`] taxonomy returned to callers. |
//! | [`property`] | Tunable whitelist (`TunableTable`) and typed values. |
//! | [`validate`] | [`Validator`]: raw arguments → `CreateCommand`. |
//! | [`backend`] | [`DatasetBackend`] contract and the in-memory backend. |
//! | [`dispatch`] | [`Dispatcher`]: backend call and errno mapping. |
//! | [`reply`] | [`Reply`] handle for immediate or streamed outcomes. |
//! | [`provider`] | [`DatasetProvider`]: the exposed create operation. |
//! | [`message`] | [`Request`]/[`Response`] envelope. |
//! | [`transport`] | In-process server and client over Tokio channels. |
//! | [`config`] | [`ProvisionConfig`] loaded from YAML and environment. |

pub mod backend;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod message;
pub mod property;
pub mod provider;
pub mod reply;
pub mod transport;
pub mod types;
pub mod validate;

// Re-export the most commonly used items at crate root for convenience.
pub use backend::{BackendError, DatasetBackend, MemoryBackend};
pub use config::ProvisionConfig;
pub use dispatch::Dispatcher;
pub use error::DatasetError;
pub use message::{CREATE_TASK, Outcome, Request, Response};
pub use provider::{DatasetProvider, DatasetProvisioner};
pub use reply::{Delivery, Reply, StreamRef};
pub use transport::{DatasetClient, DatasetServer, HookDelivery};
pub use types::*;
pub use validate::{CreateCommand, KindSpec, Validator};
