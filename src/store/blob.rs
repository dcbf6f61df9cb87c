// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Infolens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Infolens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use super::StoreError;

/// Key under which the analysis list is kept.
pub const ANALYSES_KEY: &str = "infographicAnalyses";

/// A key/value store of opaque blobs.
pub trait BlobStore: Send {
    /// `Ok(None)` when nothing was stored under `key` yet.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum WriteDurability {
    /// Temp file plus atomic rename, no fsync.
    #[default]
    BestEffort,

    /// Additionally syncs the file and its directory where the platform allows.
    Durable,
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FolderBlobStore {
    root: PathBuf,
    durability: WriteDurability,
}

impl FolderBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            durability: WriteDurability::default(),
        }
    }

    pub fn with_durability(mut self, durability: WriteDurability) -> Self {
        self.durability = durability;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl BlobStore for FolderBlobStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.path_for(key);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root).map_err(|source| StoreError::Io {
            path: self.root.clone(),
            source,
        })?;
        write_atomic(&self.path_for(key), value, self.durability)
    }
}

/// Process-local store; nothing touches the disk.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let blobs = self.blobs.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(blobs.get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let mut blobs = self.blobs.lock().map_err(|_| StoreError::Poisoned)?;
        blobs.insert(key.to_owned(), value.to_vec());
        Ok(())
    }
}

/// Writes `contents` to `path` through a temp file in the same directory and a rename.
///
/// Refuses to replace a symlink.
pub fn write_atomic(path: &Path, contents: &[u8], durability: WriteDurability) -> Result<(), StoreError> {
    match fs::symlink_metadata(path) {
        Ok(md) if md.file_type().is_symlink() => {
            return Err(StoreError::SymlinkRefused {
                path: path.to_path_buf(),
            });
        }
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    let (Some(parent), Some(file_name)) = (path.parent(), path.file_name()) else {
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source: io::Error::other("path has no parent or file name"),
        });
    };

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let tmp_path = parent.join(format!(".infolens.tmp.{}.{nanos}", file_name.to_string_lossy()));

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&tmp_path)
        .map_err(|source| StoreError::Io {
            path: tmp_path.clone(),
            source,
        })?;

    let written = file.write_all(contents).and_then(|()| {
        if durability == WriteDurability::Durable {
            file.sync_all()
        } else {
            Ok(())
        }
    });
    drop(file);
    if let Err(source) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(StoreError::Io { path: tmp_path, source });
    }

    if let Err(source) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        });
    }

    #[cfg(unix)]
    if durability == WriteDurability::Durable {
        let dir = fs::File::open(parent).map_err(|source| StoreError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
        dir.sync_all().map_err(|source| StoreError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    Ok(())
}
