//! Backend dispatch and error normalization.

use std::sync::Arc;

use nix::errno::Errno;
use tracing::{debug, instrument, warn};

use crate::backend::{BackendError, DatasetBackend};
use crate::error::DatasetError;
use crate::types::DatasetResult;
use crate::validate::CreateCommand;

/// Issues the single backend call for a validated [`CreateCommand`].
///
/// There is no retry here: re-creating a dataset that a previous attempt
/// already created fails with [`DatasetError::AlreadyExists`], so only the
/// caller can tell whether a retry makes sense.
#[derive(Clone)]
pub struct Dispatcher {
    backend: Arc<dyn DatasetBackend>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn DatasetBackend>) -> Self {
        Self { backend }
    }

    /// Create the dataset described by `cmd`.
    ///
    /// Blocks for as long as the backend does.
    #[instrument(skip_all, fields(name = %cmd.name(), kind = %cmd.kind()))]
    pub fn dispatch(&self, cmd: &CreateCommand) -> Result<DatasetResult, DatasetError> {
        match self
            .backend
            .create_dataset(cmd.name(), cmd.spec(), cmd.properties())
        {
            Ok(dataset) => {
                debug!(name = %dataset.name, "backend reported dataset");
                Ok(DatasetResult { dataset })
            }
            Err(e) => {
                let mapped = map_backend_error(cmd.name(), e);
                warn!(error = %mapped, "dataset creation failed");
                Err(mapped)
            }
        }
    }
}

/// Translate a backend failure for `name` into the caller-facing taxonomy.
pub fn map_backend_error(name: &str, err: BackendError) -> DatasetError {
    match err.errno() {
        Some(Errno::EEXIST) => DatasetError::AlreadyExists(name.to_owned()),
        Some(Errno::EINVAL) => DatasetError::InvalidArgument(err.message().to_owned()),
        Some(Errno::ENOENT) => DatasetError::NotFound(name.to_owned()),
        _ => DatasetError::backend(err),
    }
}
