// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Infolens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Infolens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use thiserror::Error;

use super::blob::{BlobStore, ANALYSES_KEY};
use super::persisted::{decode_analyses, encode_analyses};
use super::StoreError;
use crate::model::{Analysis, AnalysisId, FieldPathError, FieldRef, RichText};

#[derive(Debug, Error)]
pub enum CommitError {
    #[error("no analysis with id {0}")]
    UnknownAnalysis(AnalysisId),
    #[error(transparent)]
    InvalidPath(#[from] FieldPathError),
}

/// The ordered list of analyses (newest first) and the active one.
///
/// Every change is written through to the blob store. Write failures are logged and the
/// in-memory list stays authoritative.
pub struct AnalysisStore {
    analyses: Vec<Analysis>,
    active: Option<AnalysisId>,
    blob: Box<dyn BlobStore>,
}

impl std::fmt::Debug for AnalysisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisStore")
            .field("analyses", &self.analyses.len())
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl AnalysisStore {
    /// Reads the persisted list once. Missing data yields an empty store; unreadable or corrupt
    /// data is logged and discarded.
    pub fn load(blob: Box<dyn BlobStore>) -> Self {
        let analyses = match blob.get(ANALYSES_KEY).and_then(|bytes| bytes.map(|b| decode_analyses(&b)).transpose()) {
            Ok(Some(analyses)) => {
                tracing::info!(count = analyses.len(), "loaded analyses");
                analyses
            }
            Ok(None) => Vec::new(),
            Err(err) => {
                tracing::warn!(error = %err, "stored analyses are unreadable; starting empty");
                Vec::new()
            }
        };
        Self {
            analyses,
            active: None,
            blob,
        }
    }

    /// A store holding `analyses` that has not been written yet.
    pub fn with_analyses(blob: Box<dyn BlobStore>, analyses: Vec<Analysis>) -> Self {
        Self {
            analyses,
            active: None,
            blob,
        }
    }

    pub fn analyses(&self) -> &[Analysis] {
        &self.analyses
    }

    pub fn is_empty(&self) -> bool {
        self.analyses.is_empty()
    }

    pub fn get(&self, id: &AnalysisId) -> Option<&Analysis> {
        self.analyses.iter().find(|analysis| analysis.id() == id)
    }

    pub fn active_id(&self) -> Option<&AnalysisId> {
        self.active.as_ref()
    }

    pub fn active(&self) -> Option<&Analysis> {
        self.active.as_ref().and_then(|id| self.get(id))
    }

    /// Prepends and activates. A record whose id is already present is ignored.
    pub fn create(&mut self, analysis: Analysis) -> bool {
        if self.get(analysis.id()).is_some() {
            tracing::warn!(analysis_id = %analysis.id(), "analysis id already exists; not added");
            return false;
        }
        self.active = Some(analysis.id().clone());
        self.analyses.insert(0, analysis);
        self.persist();
        true
    }

    /// Removes the record; if it was active, the first remaining record (or none) becomes
    /// active.
    pub fn delete(&mut self, id: &AnalysisId) -> Option<Analysis> {
        let index = self.analyses.iter().position(|analysis| analysis.id() == id)?;
        let removed = self.analyses.remove(index);
        if self.active.as_ref() == Some(id) {
            self.active = self.analyses.first().map(|analysis| analysis.id().clone());
        }
        self.persist();
        Some(removed)
    }

    /// No-op for unknown ids.
    pub fn select(&mut self, id: &AnalysisId) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        self.active = Some(id.clone());
        true
    }

    pub fn clear_selection(&mut self) {
        self.active = None;
    }

    /// Replaces one RichText field of one record.
    ///
    /// The record is copied, the copy is edited, and the copy replaces the original, so a
    /// failed path leaves the stored record untouched.
    pub fn commit(&mut self, id: &AnalysisId, field: FieldRef, value: RichText) -> Result<(), CommitError> {
        let index = self
            .analyses
            .iter()
            .position(|analysis| analysis.id() == id)
            .ok_or_else(|| CommitError::UnknownAnalysis(id.clone()))?;

        let mut updated = self.analyses[index].clone();
        *field.resolve_mut(&mut updated)? = value;
        if updated == self.analyses[index] {
            return Ok(());
        }
        self.analyses[index] = updated;
        self.persist();
        Ok(())
    }

    /// Like [`AnalysisStore::commit`] but takes a dotted path.
    pub fn commit_path(&mut self, id: &AnalysisId, path: &str, value: RichText) -> Result<(), CommitError> {
        let field = FieldRef::parse(path)?;
        self.commit(id, field, value)
    }

    pub fn save(&self) -> Result<(), StoreError> {
        let bytes = encode_analyses(&self.analyses)?;
        self.blob.put(ANALYSES_KEY, &bytes)
    }

    fn persist(&self) {
        match self.save() {
            Ok(()) => tracing::debug!(count = self.analyses.len(), "saved analyses"),
            Err(err) => tracing::error!(error = %err, "failed to save analyses"),
        }
    }
}
