//! Request validation.
//!
//! [`Validator::validate`] turns raw [`CreateArgs`] into a [`CreateCommand`]
//! that the [`Dispatcher`](crate::dispatch::Dispatcher) can hand to the
//! backend without further checks. Validation is pure: it never consults the
//! backend, so the outcome for a given request depends only on the request
//! and the [`TunableTable`].

use std::sync::Arc;

use crate::error::DatasetError;
use crate::property::{PropertySet, TunableTable, VOLBLOCKSIZE};
use crate::types::{CreateArgs, DatasetKind};

/// Kind of the dataset to create, with the fields each kind requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindSpec {
    Filesystem,
    Volume { size: u64 },
}

impl KindSpec {
    pub const fn kind(&self) -> DatasetKind {
        match self {
            Self::Filesystem => DatasetKind::Filesystem,
            Self::Volume { .. } => DatasetKind::Volume,
        }
    }

    pub const fn size(&self) -> Option<u64> {
        match self {
            Self::Filesystem => None,
            Self::Volume { size } => Some(*size),
        }
    }
}

/// A well-formed creation request.
///
/// Only [`Validator::validate`] constructs one, so holding a `CreateCommand`
/// means the name is non-empty, the kind is known, a volume carries a
/// positive size and every property has been partitioned.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateCommand {
    name: String,
    spec: KindSpec,
    properties: PropertySet,
}

impl CreateCommand {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spec(&self) -> &KindSpec {
        &self.spec
    }

    pub fn kind(&self) -> DatasetKind {
        self.spec.kind()
    }

    pub fn properties(&self) -> &PropertySet {
        &self.properties
    }
}

/// Checks creation requests against the tunable whitelist.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    table: Arc<TunableTable>,
}

impl Validator {
    pub fn new(table: Arc<TunableTable>) -> Self {
        Self { table }
    }

    /// Validate `args`, failing on the first violated rule.
    ///
    /// Rules are checked in a fixed order: name, kind, volume size,
    /// properties, then size/block-size consistency.
    pub fn validate(&self, args: &CreateArgs) -> Result<CreateCommand, DatasetError> {
        if args.name.is_empty() {
            return Err(DatasetError::MissingArgument("name".to_owned()));
        }

        let kind: DatasetKind = args.kind.parse()?;

        let spec = match kind {
            DatasetKind::Filesystem => KindSpec::Filesystem,
            DatasetKind::Volume => match args.volsize.and_then(|s| u64::try_from(s).ok()) {
                Some(size) if size > 0 => KindSpec::Volume { size },
                _ => return Err(DatasetError::MissingOrInvalidArgument("volsize".to_owned())),
            },
        };

        let properties = PropertySet::partition(&self.table, kind, args.properties.as_ref())?;

        if let KindSpec::Volume { size } = spec {
            let block = properties.tunable(VOLBLOCKSIZE).and_then(|v| v.as_size());
            if block.is_some_and(|b| b == 0 || size % b != 0) {
                return Err(DatasetError::MissingOrInvalidArgument("volsize".to_owned()));
            }
        }

        Ok(CreateCommand {
            name: args.name.clone(),
            spec,
            properties,
        })
    }
}
