//! Single-file protobuf store

use crate::attrs::{clone_attributes, FileMetadata};
use crate::{check_name, PersistentBackend, StoreError, StoreResult};
use log::debug;
use memmap2::Mmap;
use prop_types::PropertyList;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

const TEMP_SUFFIX_LEN: usize = 6;

/// Store backed by the canonical protobuf file.
///
/// Reads map the file and decode it in one pass. Every mutation rewrites the
/// whole list into a temp file next to the canonical one and renames it over.
pub struct BinaryStore<M: FileMetadata> {
    canonical: PathBuf,
    metadata: M,
}

impl<M: FileMetadata> BinaryStore<M> {
    pub fn new(canonical: impl Into<PathBuf>, metadata: M) -> Self {
        Self {
            canonical: canonical.into(),
            metadata,
        }
    }

    /// Path of the canonical file
    pub fn canonical_path(&self) -> &Path {
        &self.canonical
    }

    /// Metadata source used for attribute cloning
    pub fn metadata(&self) -> &M {
        &self.metadata
    }

    fn dir(&self) -> &Path {
        self.canonical.parent().unwrap_or_else(|| Path::new("."))
    }

    fn temp_prefix(&self) -> String {
        let name = self
            .canonical
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("{}.", name)
    }

    fn read_list(&self) -> StoreResult<PropertyList> {
        debug!("decode with protobuf [{}]", self.canonical.display());
        let file = match File::open(&self.canonical) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(PropertyList::new()),
            Err(err) => return Err(StoreError::io(&self.canonical, err)),
        };
        let len = file
            .metadata()
            .map_err(|err| StoreError::io(&self.canonical, err))?
            .len();
        if len == 0 {
            return Ok(PropertyList::new());
        }

        // SAFETY: the canonical file is only ever replaced by rename, never
        // written in place, so the mapped pages stay valid for this call.
        let map = unsafe { Mmap::map(&file) }.map_err(|err| StoreError::io(&self.canonical, err))?;
        Ok(prop_codec::decode_list(&map))
    }

    /// Replaces the canonical file with an encoding of `list`.
    ///
    /// On any error the canonical file is left as it was.
    fn write_list(&self, list: &PropertyList) -> StoreResult<()> {
        let dir = self.dir();
        let mut tmp = tempfile::Builder::new()
            .prefix(&self.temp_prefix())
            .rand_bytes(TEMP_SUFFIX_LEN)
            .tempfile_in(dir)
            .map_err(|err| StoreError::io(dir, err))?;
        debug!("encode with protobuf [{}]", tmp.path().display());

        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            prop_codec::encode(
                list.iter().map(|(name, value)| (name.as_str(), value.as_str())),
                &mut writer,
            )?;
            writer
                .flush()
                .map_err(|err| StoreError::Encode(err.into()))?;
        }
        tmp.as_file()
            .sync_all()
            .map_err(|err| StoreError::io(tmp.path(), err))?;

        clone_attributes(&self.metadata, &self.canonical, tmp.path())
            .map_err(|err| StoreError::io(tmp.path(), err))?;

        tmp.persist(&self.canonical)
            .map_err(|err| StoreError::io(&self.canonical, err.error))?;
        Ok(())
    }
}

impl<M: FileMetadata> PersistentBackend for BinaryStore<M> {
    fn get(&self, name: &str) -> StoreResult<Option<String>> {
        check_name(name)?;
        let list = self.read_list()?;
        Ok(list.get(name).filter(|value| !value.is_empty()).cloned())
    }

    fn get_all(&self) -> StoreResult<PropertyList> {
        self.read_list()
    }

    fn set(&self, name: &str, value: &str) -> StoreResult<()> {
        check_name(name)?;
        let mut list = self.read_list()?;
        list.insert(name.to_string(), value.to_string());
        self.write_list(&list)
    }

    fn delete(&self, name: &str) -> StoreResult<()> {
        check_name(name)?;
        let mut list = self.read_list()?;
        if list.remove(name).is_none() {
            return Err(StoreError::NotFound(name.to_string()));
        }
        self.write_list(&list)
    }
}
