//! # Failing Metadata
//!
//! A [`FileMetadata`] wrapper that can simulate failures for testing the
//! atomic replace path. Attribute cloning runs after the temp file is written
//! and before the rename, so failing it exercises the window where a crash
//! must leave the canonical file untouched.

use crate::attrs::{FileAttributes, FileMetadata};
use std::cell::Cell;
use std::io;
use std::path::Path;

/// Policy for when failures should occur
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Never fail (passthrough)
    Never,
    /// Fail every attribute read
    OnGet,
    /// Fail every attribute write
    OnSet,
    /// Let N attribute writes succeed, then fail the rest
    AfterSets(usize),
}

/// Wrapper around a FileMetadata that can simulate failures
#[derive(Clone)]
pub struct FailingMetadata<M: FileMetadata> {
    inner: M,
    policy: FailurePolicy,
    set_count: Cell<usize>,
}

impl<M: FileMetadata> FailingMetadata<M> {
    /// Create a new failing metadata source with the given policy
    pub fn new(inner: M, policy: FailurePolicy) -> Self {
        Self {
            inner,
            policy,
            set_count: Cell::new(0),
        }
    }

    /// Get the wrapped metadata source
    pub fn inner(&self) -> &M {
        &self.inner
    }

    /// Number of attribute writes that went through
    pub fn set_count(&self) -> usize {
        self.set_count.get()
    }

    fn injected(op: &str) -> io::Error {
        io::Error::new(io::ErrorKind::Other, format!("injected {} failure", op))
    }
}

impl<M: FileMetadata> FileMetadata for FailingMetadata<M> {
    fn get_attributes(&self, path: &Path) -> io::Result<FileAttributes> {
        if self.policy == FailurePolicy::OnGet {
            return Err(Self::injected("get_attributes"));
        }
        self.inner.get_attributes(path)
    }

    fn set_attributes(&self, path: &Path, attrs: &FileAttributes) -> io::Result<()> {
        let fail = match self.policy {
            FailurePolicy::OnSet => true,
            FailurePolicy::AfterSets(n) => self.set_count.get() >= n,
            FailurePolicy::Never | FailurePolicy::OnGet => false,
        };
        if fail {
            return Err(Self::injected("set_attributes"));
        }
        self.inner.set_attributes(path, attrs)?;
        self.set_count.set(self.set_count.get() + 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs::HostMetadata;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_failing_metadata_never() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file");
        fs::write(&path, b"a").unwrap();
        let failing = FailingMetadata::new(HostMetadata, FailurePolicy::Never);

        let attrs = failing.get_attributes(&path).unwrap();
        assert!(failing.set_attributes(&path, &attrs).is_ok());
        assert_eq!(failing.set_count(), 1);
    }

    #[test]
    fn test_failing_metadata_on_get() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file");
        fs::write(&path, b"a").unwrap();
        let failing = FailingMetadata::new(HostMetadata, FailurePolicy::OnGet);

        assert!(failing.get_attributes(&path).is_err());
    }

    #[test]
    fn test_failing_metadata_after_sets() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file");
        fs::write(&path, b"a").unwrap();
        let failing = FailingMetadata::new(HostMetadata, FailurePolicy::AfterSets(1));
        let attrs = failing.get_attributes(&path).unwrap();

        assert!(failing.set_attributes(&path, &attrs).is_ok());
        assert!(failing.set_attributes(&path, &attrs).is_err());
        assert_eq!(failing.set_count(), 1);
    }
}
