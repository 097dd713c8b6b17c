//! File attribute cloning
//!
//! Before the canonical file is replaced, its permission bits, ownership and
//! security label are copied onto the replacement so the swap is invisible to
//! anything that checks them.

use log::debug;
use std::fs;
use std::io;
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::Path;

/// Longest security label we read back, including the terminator
pub const LABEL_MAX: usize = 128;

/// Extended attribute holding the security label
pub const LABEL_XATTR: &str = "security.selinux";

/// Metadata cloned from one file to another
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileAttributes {
    /// Permission bits (`0o777` mask)
    pub mode: u32,
    /// Owner user id
    pub uid: u32,
    /// Owner group id
    pub gid: u32,
    /// Security label, when the file system carries one
    pub label: Option<String>,
}

/// Reads and writes file metadata.
///
/// The host implementation is [`HostMetadata`]; tests wrap it in
/// [`crate::FailingMetadata`] to inject failures.
pub trait FileMetadata {
    fn get_attributes(&self, path: &Path) -> io::Result<FileAttributes>;
    fn set_attributes(&self, path: &Path, attrs: &FileAttributes) -> io::Result<()>;
}

/// Metadata access through the host file system
#[derive(Debug, Clone, Copy, Default)]
pub struct HostMetadata;

impl FileMetadata for HostMetadata {
    fn get_attributes(&self, path: &Path) -> io::Result<FileAttributes> {
        let meta = fs::symlink_metadata(path)?;
        Ok(FileAttributes {
            mode: meta.mode() & 0o777,
            uid: meta.uid(),
            gid: meta.gid(),
            label: label::read(path)?,
        })
    }

    fn set_attributes(&self, path: &Path, attrs: &FileAttributes) -> io::Result<()> {
        fs::set_permissions(path, fs::Permissions::from_mode(attrs.mode & 0o777))?;
        std::os::unix::fs::chown(path, Some(attrs.uid), Some(attrs.gid))?;
        match attrs.label.as_deref() {
            Some(label) if !label.is_empty() => label::write(path, label),
            _ => Ok(()),
        }
    }
}

/// Copies `src`'s attributes onto `dst`.
///
/// A missing `src` leaves `dst` as created; any other failure is returned.
pub fn clone_attributes<M: FileMetadata + ?Sized>(
    metadata: &M,
    src: &Path,
    dst: &Path,
) -> io::Result<()> {
    let attrs = match metadata.get_attributes(src) {
        Ok(attrs) => attrs,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!("no attributes to clone from [{}]", src.display());
            return Ok(());
        }
        Err(err) => return Err(err),
    };
    metadata.set_attributes(dst, &attrs)
}

#[cfg(any(target_os = "linux", target_os = "android"))]
mod label {
    use super::LABEL_MAX;
    use std::ffi::{CStr, CString};
    use std::io;
    use std::os::unix::ffi::OsStrExt;
    use std::path::Path;

    fn c_path(path: &Path) -> io::Result<CString> {
        CString::new(path.as_os_str().as_bytes())
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))
    }

    /// NUL-terminated form of [`super::LABEL_XATTR`]
    const LABEL_NAME: &CStr = c"security.selinux";

    fn is_unlabeled(err: &io::Error) -> bool {
        matches!(
            err.raw_os_error(),
            Some(libc::ENODATA) | Some(libc::ENOTSUP)
        )
    }

    pub(super) fn read(path: &Path) -> io::Result<Option<String>> {
        let path = c_path(path)?;
        let mut buf = [0u8; LABEL_MAX];
        // SAFETY: both strings are NUL terminated and `buf` outlives the call.
        let rc = unsafe {
            libc::lgetxattr(
                path.as_ptr(),
                LABEL_NAME.as_ptr(),
                buf.as_mut_ptr().cast(),
                buf.len() - 1,
            )
        };
        if rc < 0 {
            let err = io::Error::last_os_error();
            return if is_unlabeled(&err) { Ok(None) } else { Err(err) };
        }

        let raw = &buf[..rc as usize];
        let raw = raw.split(|b| *b == 0).next().unwrap_or_default();
        Ok(Some(String::from_utf8_lossy(raw).into_owned()))
    }

    pub(super) fn write(path: &Path, label: &str) -> io::Result<()> {
        let path = c_path(path)?;
        let value = CString::new(label)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
        let bytes = value.as_bytes_with_nul();
        // SAFETY: all pointers come from live CStrings for the duration of the call.
        let rc = unsafe {
            libc::lsetxattr(
                path.as_ptr(),
                LABEL_NAME.as_ptr(),
                bytes.as_ptr().cast(),
                bytes.len(),
                0,
            )
        };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
mod label {
    use std::io;
    use std::path::Path;

    pub(super) fn read(_path: &Path) -> io::Result<Option<String>> {
        Ok(None)
    }

    pub(super) fn write(_path: &Path, _label: &str) -> io::Result<()> {
        Ok(())
    }
}
