//! Resilience Test Utilities
//!
//! This crate provides shared fixtures for resilience and integration tests.
//!
//! ## Test Philosophy
//!
//! - **Safety under faults**: a failed write never damages what is on disk
//! - **Deterministic failures**: faults are injected through `FailingMetadata`
//! - **Consistency**: the live registry and the persistent store agree after
//!   every successful operation

use persist_store::{FailingMetadata, FailurePolicy, HostMetadata, StoreConfig};
use prop_area::MemoryPropertyArea;
use prop_resolver::PropertyResolver;
use prop_types::PropFlags;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// A persist directory that lives as long as the fixture
pub struct StoreFixture {
    pub dir: TempDir,
    pub config: StoreConfig,
}

impl StoreFixture {
    fn empty() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config = StoreConfig::with_dir(dir.path());
        Self { dir, config }
    }

    /// Path of the canonical protobuf file
    pub fn canonical_path(&self) -> PathBuf {
        self.config.canonical_path()
    }

    /// Raw bytes of the canonical file
    pub fn canonical_bytes(&self) -> Vec<u8> {
        fs::read(self.canonical_path()).expect("Failed to read canonical file")
    }

    /// File names left in the persist directory, sorted
    pub fn file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.dir.path())
            .expect("Failed to list persist dir")
            .map(|entry| {
                entry
                    .expect("Failed to read dir entry")
                    .file_name()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        names.sort();
        names
    }

    /// Resolver over an empty live registry
    pub fn resolver(&self) -> PropertyResolver<MemoryPropertyArea> {
        self.resolver_with_area(MemoryPropertyArea::new())
    }

    /// Resolver over the given live registry
    pub fn resolver_with_area(
        &self,
        area: MemoryPropertyArea,
    ) -> PropertyResolver<MemoryPropertyArea> {
        PropertyResolver::new(area, self.config.clone())
    }

    /// Resolver whose attribute cloning fails according to `policy`
    pub fn failing_resolver(
        &self,
        policy: FailurePolicy,
    ) -> PropertyResolver<MemoryPropertyArea, FailingMetadata<HostMetadata>> {
        PropertyResolver::with_metadata(
            MemoryPropertyArea::new(),
            self.config.clone(),
            FailingMetadata::new(HostMetadata, policy),
        )
    }
}

/// Persist directory holding a canonical protobuf file with `entries`
pub fn binary_fixture(entries: &[(&str, &str)]) -> StoreFixture {
    let fixture = StoreFixture::empty();
    let mut bytes = Vec::new();
    prop_codec::encode(entries.iter().copied(), &mut bytes).expect("Failed to encode fixture");
    fs::write(fixture.canonical_path(), bytes).expect("Failed to write canonical file");
    fixture
}

/// Persist directory in the one-file-per-property layout
pub fn legacy_fixture(entries: &[(&str, &str)]) -> StoreFixture {
    let fixture = StoreFixture::empty();
    for (name, value) in entries {
        fs::write(fixture.dir.path().join(name), value).expect("Failed to write prop file");
    }
    fixture
}

/// Flags for `resetprop -n -p`
pub fn persist_flags() -> PropFlags {
    PropFlags::new().bypass_live_registry().include_persistent()
}
