//! One file per key under a directory.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use crate::error::StorageError;

use super::DataModelStorage;

const PARTIAL_EXTENSION: &str = "partial";

#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Keys become file names, so only a conservative character set is accepted.
    fn path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.'));
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(key))
    }
}

fn not_found(key: &str, e: io::Error) -> StorageError {
    if e.kind() == io::ErrorKind::NotFound {
        StorageError::NotFound(key.to_string())
    } else {
        StorageError::Io(e)
    }
}

fn write_file(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut f = fs::File::create(path)?;
    f.write_all(data)?;
    f.sync_all()
}

impl DataModelStorage for FileStorage {
    fn get_data_model(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path(key)?;
        fs::read(path).map_err(|e| not_found(key, e))
    }

    fn set_data_model(&mut self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let path = self.path(key)?;
        let tmp = self.root.join(format!("{key}.{PARTIAL_EXTENSION}"));
        let written = write_file(&tmp, data).and_then(|()| fs::rename(&tmp, &path));
        if let Err(e) = written {
            // Best effort, the write error is what matters
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    fn remove_key(&mut self, key: &str) -> Result<(), StorageError> {
        let path = self.path(key)?;
        fs::remove_file(path).map_err(|e| not_found(key, e))
    }
}
