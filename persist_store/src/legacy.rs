//! One-file-per-property store

use crate::{check_name, PersistentBackend, StoreError, StoreResult};
use log::debug;
use prop_types::{is_well_formed_name, PropertyList, PROP_VALUE_MAX};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

const TEMP_PREFIX: &str = "prop.";
const TEMP_SUFFIX_LEN: usize = 6;

/// Store backed by a directory where each file holds one value.
///
/// Mutations touch only the file of the property being changed.
pub struct LegacyStore {
    dir: PathBuf,
}

impl LegacyStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the property files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read_value(path: &Path) -> io::Result<Option<String>> {
        let file = File::open(path)?;
        debug!("read prop from [{}]", path.display());
        let mut buf = Vec::new();
        file.take((PROP_VALUE_MAX - 1) as u64).read_to_end(&mut buf)?;

        let value = match String::from_utf8(buf) {
            Ok(value) => value,
            Err(err) => {
                let valid = err.utf8_error().valid_up_to();
                let mut bytes = err.into_bytes();
                bytes.truncate(valid);
                String::from_utf8(bytes).unwrap_or_default()
            }
        };
        Ok(Some(value).filter(|value| !value.is_empty()))
    }
}

impl PersistentBackend for LegacyStore {
    fn get(&self, name: &str) -> StoreResult<Option<String>> {
        check_name(name)?;
        let path = self.dir.join(name);
        match Self::read_value(&path) {
            Ok(value) => Ok(value),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StoreError::io(&path, err)),
        }
    }

    fn get_all(&self) -> StoreResult<PropertyList> {
        let mut list = PropertyList::new();
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(list),
            Err(err) => return Err(StoreError::io(&self.dir, err)),
        };

        for entry in entries {
            let entry = entry.map_err(|err| StoreError::io(&self.dir, err))?;
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            let name = match entry.file_name().into_string() {
                Ok(name) if is_file && is_well_formed_name(&name) => name,
                _ => continue,
            };
            match Self::read_value(&entry.path()) {
                Ok(Some(value)) => {
                    list.insert(name, value);
                }
                Ok(None) => {}
                Err(err) => debug!("skip unreadable prop [{}]: {}", name, err),
            }
        }
        Ok(list)
    }

    fn set(&self, name: &str, value: &str) -> StoreResult<()> {
        check_name(name)?;
        let mut tmp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .rand_bytes(TEMP_SUFFIX_LEN)
            .tempfile_in(&self.dir)
            .map_err(|err| StoreError::io(&self.dir, err))?;
        debug!("write prop to [{}]", tmp.path().display());

        tmp.write_all(value.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|err| StoreError::io(tmp.path(), err))?;

        let path = self.dir.join(name);
        tmp.persist(&path)
            .map_err(|err| StoreError::io(&path, err.error))?;
        Ok(())
    }

    fn delete(&self, name: &str) -> StoreResult<()> {
        check_name(name)?;
        let path = self.dir.join(name);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("unlink [{}]", path.display());
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(name.to_string()))
            }
            Err(err) => Err(StoreError::io(&path, err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_set_then_get_exact_value() {
        let dir = tempdir().unwrap();
        let store = LegacyStore::new(dir.path());

        store.set("persist.a", "hello").unwrap();

        assert_eq!(store.get("persist.a").unwrap().as_deref(), Some("hello"));
        // no terminator persisted
        assert_eq!(fs::read(dir.path().join("persist.a")).unwrap(), b"hello");
    }

    #[test]
    fn test_missing_is_not_found_not_error() {
        let dir = tempdir().unwrap();
        let store = LegacyStore::new(dir.path());
        assert_eq!(store.get("persist.missing").unwrap(), None);
    }

    #[test]
    fn test_empty_file_reads_as_absent() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("persist.empty"), b"").unwrap();
        let store = LegacyStore::new(dir.path());
        assert_eq!(store.get("persist.empty").unwrap(), None);
    }

    #[test]
    fn test_read_caps_value_length() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("persist.long"), "z".repeat(200)).unwrap();
        let store = LegacyStore::new(dir.path());
        assert_eq!(
            store.get("persist.long").unwrap(),
            Some("z".repeat(PROP_VALUE_MAX - 1))
        );
    }

    #[test]
    fn test_set_touches_only_one_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("persist.sibling"), b"keep").unwrap();
        let store = LegacyStore::new(dir.path());

        store.set("persist.a", "1").unwrap();
        store.set("persist.a", "2").unwrap();

        assert_eq!(fs::read(dir.path().join("persist.sibling")).unwrap(), b"keep");
        assert_eq!(store.get("persist.a").unwrap().as_deref(), Some("2"));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_delete() {
        let dir = tempdir().unwrap();
        let store = LegacyStore::new(dir.path());
        store.set("persist.a", "1").unwrap();

        store.delete("persist.a").unwrap();

        assert_eq!(store.get("persist.a").unwrap(), None);
        assert!(matches!(
            store.delete("persist.a"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_get_all_skips_junk() {
        let dir = tempdir().unwrap();
        let store = LegacyStore::new(dir.path());
        store.set("persist.a", "1").unwrap();
        store.set("persist.b", "22").unwrap();
        fs::write(dir.path().join(".hidden"), b"x").unwrap();
        fs::write(dir.path().join("persist.empty"), b"").unwrap();
        fs::create_dir(dir.path().join("persist.dir")).unwrap();

        let list = store.get_all().unwrap();

        assert_eq!(list.len(), 2);
        assert_eq!(list["persist.a"], "1");
        assert_eq!(list["persist.b"], "22");
    }

    #[test]
    fn test_get_all_missing_dir_is_empty() {
        let dir = tempdir().unwrap();
        let store = LegacyStore::new(dir.path().join("nope"));
        assert!(store.get_all().unwrap().is_empty());
    }

    #[test]
    fn test_set_into_missing_dir_fails() {
        let dir = tempdir().unwrap();
        let store = LegacyStore::new(dir.path().join("nope"));
        assert!(matches!(
            store.set("persist.a", "1"),
            Err(StoreError::Io { .. })
        ));
    }
}
