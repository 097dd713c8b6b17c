//! # Property Resolver
//!
//! Routes property reads and writes between the live registry and the
//! persistent store.
//!
//! ## Philosophy
//!
//! - **Live first**: reads hit the live registry and only fall back to disk for
//!   `persist.` names when asked to.
//! - **Explicit flags**: every operation takes [`PropFlags`]; nothing is read
//!   from globals or the environment.
//! - **One layout per resolver**: the persistent layout is probed on first use
//!   and kept for the resolver's lifetime.
//!
//! ## Example
//!
//! ```ignore
//! use prop_area::MemoryPropertyArea;
//! use prop_resolver::PropertyResolver;
//! use prop_types::PropFlags;
//!
//! let mut resolver = PropertyResolver::new(MemoryPropertyArea::new(), StoreConfig::default());
//! let flags = PropFlags::new().bypass_live_registry().include_persistent();
//! resolver.set("persist.sys.locale", "en-US", flags)?;
//! let locale = resolver.get("persist.sys.locale", flags)?;
//! ```

pub mod prop_file;

pub use prop_file::parse_prop_file;

use log::{debug, warn};
use persist_store::{
    BackendKind, FileMetadata, HostMetadata, PersistentBackend, PersistentStore, StoreConfig,
    StoreError,
};
use prop_area::{AreaError, PropertyArea};
use prop_types::{has_persist_prefix, is_legal_name, is_read_only_name, PropFlags, PropertyList};
use std::cell::OnceCell;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors returned by resolver operations
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Name failed validation
    #[error("Illegal property name: {0}")]
    InvalidName(String),

    /// No value in any consulted source
    #[error("Property not found: {0}")]
    NotFound(String),

    /// Live registry refused the operation
    #[error("Registry error: {0}")]
    Registry(#[from] AreaError),

    /// Persistent store failed
    #[error("Persistent store error: {0}")]
    Persist(#[from] StoreError),

    /// Property file could not be read
    #[error("Cannot read property file {}: {source}", path.display())]
    PropFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Front end over a live registry and a persistent store
pub struct PropertyResolver<A: PropertyArea, M: FileMetadata = HostMetadata> {
    area: A,
    config: StoreConfig,
    metadata: M,
    store: OnceCell<PersistentStore<M>>,
}

impl<A: PropertyArea> PropertyResolver<A, HostMetadata> {
    /// Creates a resolver backed by the host file system
    pub fn new(area: A, config: StoreConfig) -> Self {
        Self::with_metadata(area, config, HostMetadata)
    }
}

impl<A: PropertyArea, M: FileMetadata + Clone> PropertyResolver<A, M> {
    /// Creates a resolver with a custom metadata source
    pub fn with_metadata(area: A, config: StoreConfig, metadata: M) -> Self {
        Self {
            area,
            config,
            metadata,
            store: OnceCell::new(),
        }
    }

    /// Returns the live registry
    pub fn area(&self) -> &A {
        &self.area
    }

    /// Returns the store configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns the persistent store, probing the layout on first call
    pub fn store(&self) -> &PersistentStore<M> {
        self.store
            .get_or_init(|| PersistentStore::probe_with(&self.config, self.metadata.clone()))
    }

    /// Layout chosen for this resolver
    pub fn backend_kind(&self) -> BackendKind {
        self.store().kind()
    }

    /// Reads a property.
    ///
    /// Returns [`ResolveError::NotFound`] when every consulted source is empty.
    pub fn get(&self, name: &str, flags: PropFlags) -> Result<String, ResolveError> {
        if !is_legal_name(name) {
            return Err(ResolveError::InvalidName(name.to_string()));
        }

        let value = if flags.want_security_label {
            self.area.context(name).unwrap_or_default()
        } else if flags.persistent_only {
            self.persistent_get(name)
        } else {
            let live = self.live_get(name);
            if live.is_empty() && flags.uses_persistent() && has_persist_prefix(name) {
                self.persistent_get(name)
            } else {
                live
            }
        };

        if value.is_empty() {
            debug!("prop [{}] does not exist", name);
            Err(ResolveError::NotFound(name.to_string()))
        } else {
            Ok(value)
        }
    }

    /// Writes a property.
    ///
    /// With `bypass_live_registry` the registry's storage is mutated directly
    /// and `persist.` names are written through to disk when
    /// `include_persistent` is set. Otherwise the registry's service decides
    /// what to persist.
    pub fn set(&mut self, name: &str, value: &str, flags: PropFlags) -> Result<(), ResolveError> {
        if !is_legal_name(name) {
            return Err(ResolveError::InvalidName(name.to_string()));
        }

        let bypass = flags.bypass_live_registry;
        let mut handle = self.area.find(name);
        if let Some(existing) = &handle {
            // ro. nodes can only be recreated, never rewritten by the service
            // or grown in place
            if is_read_only_name(name) && (!bypass || self.area.is_long(existing)) {
                self.area.delete(name, false)?;
                handle = None;
            }
        }

        let (result, how) = if bypass {
            let result = match &handle {
                Some(existing) => self.area.update(existing, value),
                None => self.area.add(name, value),
            };
            (result, "direct modification")
        } else {
            (self.area.service_set(name, value), "property_service")
        };
        let verb = if handle.is_some() { "update" } else { "create" };
        debug!("{} prop [{}]: [{}] by {}", verb, name, value, how);

        if let Err(err) = result {
            warn!("set prop error: [{}] ({})", name, err);
            return Err(err.into());
        }

        if bypass && flags.uses_persistent() && has_persist_prefix(name) {
            self.store().set(name, value)?;
        }
        Ok(())
    }

    /// Deletes a property.
    ///
    /// Succeeds when the live registry or, for `persist.` names with
    /// `include_persistent`, the persistent store held the property.
    pub fn delete(&mut self, name: &str, flags: PropFlags) -> Result<(), ResolveError> {
        if !is_legal_name(name) {
            return Err(ResolveError::InvalidName(name.to_string()));
        }
        debug!("delete prop [{}]", name);

        let live = self.area.delete(name, true);
        if !(flags.uses_persistent() && has_persist_prefix(name)) {
            return live.map_err(Into::into);
        }

        let persisted = self.store().delete(name);
        if let Err(err) = &persisted {
            if !matches!(err, StoreError::NotFound(_)) {
                warn!("delete persist prop error: [{}] ({})", name, err);
            }
        }

        match (live, persisted) {
            (Ok(()), _) | (_, Ok(())) => Ok(()),
            (Err(AreaError::NotFound(_)), Err(StoreError::NotFound(_))) => {
                Err(ResolveError::NotFound(name.to_string()))
            }
            (Err(AreaError::NotFound(_)), Err(err)) => Err(err.into()),
            (Err(err), _) => Err(err.into()),
        }
    }

    /// Snapshot of every visible property, sorted by name.
    ///
    /// Persistent values replace live ones on duplicate names.
    pub fn list_all(&self, flags: PropFlags) -> PropertyList {
        let mut list = PropertyList::new();

        if !flags.persistent_only {
            self.area.for_each(&mut |name, value| {
                list.insert(name.to_string(), value.to_string());
            });
        }

        if flags.uses_persistent() {
            match self.store().get_all() {
                Ok(persisted) => list.extend(persisted),
                Err(err) => warn!("cannot list persistent props: {}", err),
            }
        }

        if flags.want_security_label {
            for (name, value) in list.iter_mut() {
                *value = self.area.context(name).unwrap_or_default();
            }
        }

        list
    }

    /// Sets every `key=value` pair in the file at `path`.
    ///
    /// Individual failures are logged and skipped. Returns how many pairs
    /// were applied.
    pub fn load_file(&mut self, path: impl AsRef<Path>, flags: PropFlags) -> Result<usize, ResolveError> {
        let path = path.as_ref();
        let prop_file_err = |source| ResolveError::PropFile {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(prop_file_err)?;
        let entries = parse_prop_file(BufReader::new(file)).map_err(prop_file_err)?;
        debug!("load {} props from [{}]", entries.len(), path.display());

        let mut applied = 0;
        for (name, value) in entries {
            match self.set(&name, &value, flags) {
                Ok(()) => applied += 1,
                Err(err) => warn!("skip [{}] from [{}]: {}", name, path.display(), err),
            }
        }
        Ok(applied)
    }

    fn live_get(&self, name: &str) -> String {
        match self.area.find(name).and_then(|handle| self.area.read(&handle)) {
            Some((_, value)) => {
                debug!("get prop [{}]: [{}]", name, value);
                value
            }
            None => String::new(),
        }
    }

    fn persistent_get(&self, name: &str) -> String {
        match self.store().get(name) {
            Ok(value) => value.unwrap_or_default(),
            Err(err) => {
                warn!("cannot read persist prop [{}]: {}", name, err);
                String::new()
            }
        }
    }
}
