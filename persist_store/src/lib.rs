//! # Persistent Property Store
//!
//! Durable storage for `persist.` properties.
//!
//! ## Philosophy
//!
//! - **Two layouts, one interface**: the canonical protobuf file and the legacy
//!   one-file-per-property directory both implement [`PersistentBackend`].
//! - **Probe once**: [`PersistentStore::probe`] picks the layout from what is on
//!   disk and the caller keeps that choice for the rest of the process.
//! - **Replace, never patch**: every write lands in a fresh temp file in the
//!   same directory and is renamed over the target. Readers see the old file or
//!   the new one, nothing in between.
//!
//! ## Concurrency
//!
//! The binary layout rewrites the whole file on each mutation and takes no
//! lock. Two processes mutating it at once can lose an update; the last rename
//! wins. The legacy layout only races per property.

pub mod attrs;
pub mod binary;
pub mod config;
pub mod failing_metadata;
pub mod legacy;

pub use attrs::{clone_attributes, FileAttributes, FileMetadata, HostMetadata};
pub use binary::BinaryStore;
pub use config::StoreConfig;
pub use failing_metadata::{FailingMetadata, FailurePolicy};
pub use legacy::LegacyStore;

use log::debug;
use prop_codec::CodecError;
use prop_types::PropertyList;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while accessing the persistent store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Name failed validation
    #[error("Illegal property name: {0}")]
    InvalidName(String),

    /// Nothing stored under this name
    #[error("Persistent property not found: {0}")]
    NotFound(String),

    /// Open, read, write, rename or temp file creation failed
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The new store file could not be fully written
    #[error("Failed to encode persistent props: {0}")]
    Encode(#[from] CodecError),

    /// Store configuration could not be loaded
    #[error("Invalid store config: {0}")]
    Config(String),
}

impl StoreError {
    pub(crate) fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        StoreError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

/// Operations shared by both on-disk layouts.
pub trait PersistentBackend {
    /// Reads one property. Absent and empty values both read as `None`.
    fn get(&self, name: &str) -> StoreResult<Option<String>>;

    /// Reads every stored property
    fn get_all(&self) -> StoreResult<PropertyList>;

    /// Creates or replaces one property
    fn set(&self, name: &str, value: &str) -> StoreResult<()>;

    /// Removes one property. Fails with [`StoreError::NotFound`] when absent.
    fn delete(&self, name: &str) -> StoreResult<()>;
}

/// Which on-disk layout a store uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Single protobuf file
    Binary,
    /// Directory with one file per property
    Legacy,
}

/// The layout selected for this process
pub enum PersistentStore<M: FileMetadata = HostMetadata> {
    Binary(BinaryStore<M>),
    Legacy(LegacyStore),
}

impl PersistentStore<HostMetadata> {
    /// Probes `config` using the host's file metadata
    pub fn probe(config: &StoreConfig) -> Self {
        Self::probe_with(config, HostMetadata)
    }
}

impl<M: FileMetadata> PersistentStore<M> {
    /// Picks the binary layout if the canonical file exists and is readable,
    /// the legacy directory otherwise.
    pub fn probe_with(config: &StoreConfig, metadata: M) -> Self {
        let canonical = config.canonical_path();
        if is_readable_file(&canonical) {
            debug!("using protobuf store [{}]", canonical.display());
            PersistentStore::Binary(BinaryStore::new(canonical, metadata))
        } else {
            debug!("using legacy store [{}]", config.persist_dir.display());
            PersistentStore::Legacy(LegacyStore::new(config.persist_dir.clone()))
        }
    }

    /// Returns the layout in use
    pub fn kind(&self) -> BackendKind {
        match self {
            PersistentStore::Binary(_) => BackendKind::Binary,
            PersistentStore::Legacy(_) => BackendKind::Legacy,
        }
    }

    fn backend(&self) -> &dyn PersistentBackend {
        match self {
            PersistentStore::Binary(store) => store,
            PersistentStore::Legacy(store) => store,
        }
    }
}

impl<M: FileMetadata> PersistentBackend for PersistentStore<M> {
    fn get(&self, name: &str) -> StoreResult<Option<String>> {
        let value = self.backend().get(name)?;
        if let Some(value) = &value {
            debug!("get prop (persist) [{}]: [{}]", name, value);
        }
        Ok(value)
    }

    fn get_all(&self) -> StoreResult<PropertyList> {
        self.backend().get_all()
    }

    fn set(&self, name: &str, value: &str) -> StoreResult<()> {
        self.backend().set(name, value)
    }

    fn delete(&self, name: &str) -> StoreResult<()> {
        self.backend().delete(name)
    }
}

fn is_readable_file(path: &Path) -> bool {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => File::open(path).is_ok(),
        _ => false,
    }
}

pub(crate) fn check_name(name: &str) -> StoreResult<()> {
    if prop_types::is_well_formed_name(name) {
        Ok(())
    } else {
        Err(StoreError::InvalidName(name.to_string()))
    }
}
