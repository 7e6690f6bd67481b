//! In-memory reference backend.
//!
//! [`MemoryBackend`] implements [`DatasetBackend`] with ZFS naming rules:
//! datasets live under pools registered with [`MemoryBackend::add_pool`],
//! names are `/`-separated paths, a parent must exist and be a filesystem,
//! and a volume's size must be a multiple of its block size. Failures are
//! reported with the errno a ZFS kernel module would return.

use std::collections::BTreeMap;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use nix::errno::Errno;
use tracing::{debug, info, instrument};

use crate::backend::{BackendError, DatasetBackend};
use crate::property::{PropertySet, TunableValue, VOLBLOCKSIZE};
use crate::types::{Dataset, DatasetKind, DatasetProperties};
use crate::validate::KindSpec;

/// Longest accepted dataset name, in bytes.
pub const MAX_NAME_LEN: usize = 255;

/// Block size applied to volumes that do not request one.
pub const DEFAULT_VOLBLOCKSIZE: u64 = 8192;

const DEFAULT_RECORDSIZE: u64 = 128 * 1024;

/// Backend keeping all datasets in a concurrent map.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    datasets: DashMap<String, Dataset>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pool, i.e. a root filesystem dataset.
    pub fn add_pool(&self, pool: &str) -> Result<Dataset, BackendError> {
        check_name(pool)?;
        if pool.contains('/') {
            return Err(BackendError::os(Errno::EINVAL, pool));
        }
        let dataset = Dataset {
            name: pool.to_owned(),
            kind: DatasetKind::Filesystem,
            volsize: None,
            properties: DatasetProperties {
                tunables: defaults(pool, &KindSpec::Filesystem),
                user_defined: BTreeMap::new(),
            },
        };
        match self.datasets.entry(pool.to_owned()) {
            Entry::Occupied(_) => Err(BackendError::os(Errno::EEXIST, pool)),
            Entry::Vacant(slot) => {
                slot.insert(dataset.clone());
                info!(%pool, "pool registered");
                Ok(dataset)
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Dataset> {
        self.datasets.get(name).map(|r| r.clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.datasets.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

/// Check the syntax of a full dataset name.
fn check_name(name: &str) -> Result<(), BackendError> {
    let valid_component = |c: &str| {
        !c.is_empty()
            && c != "."
            && c != ".."
            && c
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.' | ':' | ' '))
    };
    if name.len() > MAX_NAME_LEN || !name.split('/').all(valid_component) {
        return Err(BackendError::os(Errno::EINVAL, name));
    }
    Ok(())
}

/// Properties every new dataset of `spec` starts with.
fn defaults(name: &str, spec: &KindSpec) -> BTreeMap<String, TunableValue> {
    let mut props = BTreeMap::from([
        ("compression".to_owned(), TunableValue::Text("off".to_owned())),
        ("readonly".to_owned(), TunableValue::Bool(false)),
    ]);
    match spec {
        KindSpec::Filesystem => props.extend([
            ("atime".to_owned(), TunableValue::Bool(true)),
            ("canmount".to_owned(), TunableValue::Text("on".to_owned())),
            ("mountpoint".to_owned(), TunableValue::Text(format!("/{name}"))),
            ("recordsize".to_owned(), TunableValue::Size(DEFAULT_RECORDSIZE)),
        ]),
        KindSpec::Volume { .. } => props.extend([(
            VOLBLOCKSIZE.to_owned(),
            TunableValue::Size(DEFAULT_VOLBLOCKSIZE),
        )]),
    }
    props
}

impl DatasetBackend for MemoryBackend {
    #[instrument(skip(self, properties), fields(kind = %spec.kind()))]
    fn create_dataset(
        &self,
        name: &str,
        spec: &KindSpec,
        properties: &PropertySet,
    ) -> Result<Dataset, BackendError> {
        check_name(name)?;

        // Pools are never created through this path.
        let Some((parent, _)) = name.rsplit_once('/') else {
            let errno = if self.contains(name) {
                Errno::EEXIST
            } else {
                Errno::ENOENT
            };
            return Err(BackendError::os(errno, name));
        };

        match self.datasets.get(parent).map(|p| p.kind) {
            None => return Err(BackendError::os(Errno::ENOENT, parent)),
            Some(DatasetKind::Volume) => return Err(BackendError::os(Errno::ENOTDIR, parent)),
            Some(DatasetKind::Filesystem) => {}
        }

        let mut tunables = defaults(name, spec);
        tunables.extend(
            properties
                .tunables
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );

        if let KindSpec::Volume { size } = spec {
            let block = tunables
                .get(VOLBLOCKSIZE)
                .and_then(TunableValue::as_size)
                .unwrap_or(DEFAULT_VOLBLOCKSIZE);
            if block == 0 || size % block != 0 {
                return Err(BackendError::os(
                    Errno::EINVAL,
                    format!("{name}: volsize {size} is not a multiple of volblocksize {block}"),
                ));
            }
        }

        let dataset = Dataset {
            name: name.to_owned(),
            kind: spec.kind(),
            volsize: spec.size(),
            properties: DatasetProperties {
                tunables,
                user_defined: properties.user.clone(),
            },
        };

        match self.datasets.entry(name.to_owned()) {
            Entry::Occupied(_) => {
                debug!(%name, "dataset already exists");
                Err(BackendError::os(Errno::EEXIST, name))
            }
            Entry::Vacant(slot) => {
                slot.insert(dataset.clone());
                info!(%name, "dataset created");
                Ok(dataset)
            }
        }
    }
}
