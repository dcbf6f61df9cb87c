// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Infolens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Infolens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Persistence for the analysis list.
//!
//! [`AnalysisStore`] owns the records; the bytes go to a [`BlobStore`] under a single key, either a
//! folder of JSON files written atomically or a process-local map.

pub mod analysis_store;
pub mod blob;
pub mod persisted;


use std::path::PathBuf;

use thiserror::Error;

pub use analysis_store::{AnalysisStore, CommitError};
pub use blob::{write_atomic, BlobStore, FolderBlobStore, MemoryBlobStore, WriteDurability, ANALYSES_KEY};
pub use persisted::{decode_analyses, encode_analyses};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("json error: {0}")]
    Json(#[source] serde_json::Error),
    #[error("corrupt analysis data: {0}")]
    Corrupt(String),
    #[error("refusing to write through symlink at {path:?}")]
    SymlinkRefused { path: PathBuf },
    #[error("blob store lock poisoned")]
    Poisoned,
}
