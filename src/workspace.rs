// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Infolens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Infolens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Headless controller for one user session.
//!
//! [`Workspace`] wires the store, the annotation engine, the color picker and the generation
//! dialog together. Every mutation happens synchronously on the caller's thread; the only async
//! step is [`run_generation`], whose [`GenerationOutcome`] is fed back through
//! [`Workspace::finish_generation`].

use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::export::{export_to_dir, ExportError, ImageRenderer};
use crate::generate::{AnalysisDraft, GenerationDialog, GenerationError, GenerationRequest, Generator, RequestToken};
use crate::model::{AnalysisId, FieldRef, RichText};
use crate::picker::{Anchor, ColorPickerController, PickerCommand, PickerEvent, PickerState};
use crate::render::Presentation;
use crate::rich_text::{AnnotationEngine, HighlightColor, HighlightSpan, TextRange};
use crate::store::{AnalysisStore, WriteDurability};

/// A pending text selection inside one annotatable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub field: FieldRef,
    pub range: TextRange,
}

/// A finished generation request, ready for [`Workspace::finish_generation`].
#[derive(Debug)]
pub struct GenerationOutcome {
    pub token: RequestToken,
    pub result: Result<AnalysisDraft, GenerationError>,
}

/// Runs one request against `generator`.
pub async fn run_generation<G: Generator>(generator: &G, request: GenerationRequest) -> GenerationOutcome {
    let result = generator.generate(request.text).await;
    GenerationOutcome {
        token: request.token,
        result,
    }
}

#[derive(Debug)]
pub struct Workspace {
    store: AnalysisStore,
    engine: AnnotationEngine,
    picker: ColorPickerController,
    dialog: GenerationDialog,
    presentation: Option<Presentation>,
    selection: Option<Selection>,
    rng: StdRng,
    rev: u64,
}

impl Workspace {
    pub fn new(store: AnalysisStore, generation_available: bool) -> Self {
        Self::with_parts(store, generation_available, AnnotationEngine::new(), StdRng::from_entropy())
    }

    /// Deterministic ids, for tests and benchmarks.
    pub fn with_seed(store: AnalysisStore, generation_available: bool, seed: u64) -> Self {
        Self::with_parts(
            store,
            generation_available,
            AnnotationEngine::with_seed(seed),
            StdRng::seed_from_u64(seed.wrapping_add(1)),
        )
    }

    fn with_parts(store: AnalysisStore, generation_available: bool, engine: AnnotationEngine, rng: StdRng) -> Self {
        let mut workspace = Self {
            store,
            engine,
            picker: ColorPickerController::default(),
            dialog: GenerationDialog::new(generation_available),
            presentation: None,
            selection: None,
            rng,
            rev: 0,
        };
        workspace.rebuild();
        workspace
    }

    pub fn store(&self) -> &AnalysisStore {
        &self.store
    }

    pub fn presentation(&self) -> Option<&Presentation> {
        self.presentation.as_ref()
    }

    pub fn picker(&self) -> &PickerState {
        self.picker.state()
    }

    pub fn dialog(&self) -> &GenerationDialog {
        &self.dialog
    }

    pub fn dialog_mut(&mut self) -> &mut GenerationDialog {
        &mut self.dialog
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    /// Bumped whenever the presentation changes.
    pub fn rev(&self) -> u64 {
        self.rev
    }

    pub fn select(&mut self, id: &AnalysisId) -> bool {
        if !self.store.select(id) {
            tracing::debug!(analysis_id = %id, "select ignored for unknown analysis");
            return false;
        }
        self.rebuild();
        true
    }

    pub fn delete(&mut self, id: &AnalysisId) -> bool {
        let deleted = self.store.delete(id).is_some();
        if deleted {
            tracing::info!(analysis_id = %id, "deleted analysis");
            self.rebuild();
        }
        deleted
    }

    pub fn set_selection(&mut self, field: FieldRef, range: TextRange) {
        self.selection = Some(Selection { field, range });
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Wraps the current selection in a new highlight and commits the field.
    ///
    /// The selection is cleared whether or not a highlight was created.
    pub fn highlight_selection(&mut self) -> bool {
        let Some(Selection { field, range }) = self.selection.take() else {
            return false;
        };
        let Some(region) = self.presentation.as_mut().and_then(|p| p.region_mut(field)) else {
            tracing::warn!(field = %field, "selection refers to a field that is not shown");
            return false;
        };
        let mut pending = Some(range);
        match self.engine.create_highlight(region, &mut pending) {
            Some(html) => self.commit(field, html),
            None => false,
        }
    }

    pub fn annotation_at(&self, field: FieldRef, offset: usize) -> Option<HighlightSpan> {
        let region = self.presentation.as_ref()?.region(field)?;
        self.engine.find_annotation_at(region, offset)
    }

    /// A click inside `field`: opens the picker on a highlight, or dismisses it on plain text.
    pub fn click(&mut self, field: FieldRef, offset: usize) -> bool {
        match self.annotation_at(field, offset) {
            Some(span) => {
                self.dispatch(PickerEvent::OpenAt {
                    anchor: Anchor { offset },
                    annotation: span.id,
                    field,
                });
                true
            }
            None => {
                self.dispatch(PickerEvent::ClickOutside);
                false
            }
        }
    }

    pub fn pick_color(&mut self, color: HighlightColor) -> bool {
        self.dispatch(PickerEvent::SelectColor(color))
    }

    pub fn delete_highlight(&mut self) -> bool {
        self.dispatch(PickerEvent::Delete)
    }

    pub fn dismiss_picker(&mut self) {
        self.dispatch(PickerEvent::ClickOutside);
    }

    /// Feeds the picker and runs the command it emits. Returns whether a field was committed.
    pub fn dispatch(&mut self, event: PickerEvent) -> bool {
        match self.picker.dispatch(event) {
            Some(command) => self.apply(command),
            None => false,
        }
    }

    fn apply(&mut self, command: PickerCommand) -> bool {
        let annotation = match &command {
            PickerCommand::Recolor { annotation, .. } | PickerCommand::Remove { annotation, .. } => annotation.clone(),
        };
        let Some(presentation) = self.presentation.as_mut() else {
            return false;
        };
        // The region is located from the highlight itself; the bound field is only a hint.
        let Some(field) = presentation.field_of(&annotation) else {
            tracing::warn!(annotation_id = %annotation, "highlight is no longer shown");
            return false;
        };
        let Some(region) = presentation.region_mut(field) else {
            return false;
        };

        let html = match command {
            PickerCommand::Recolor { color, .. } => self.engine.recolor(region, &annotation, color),
            PickerCommand::Remove { .. } => self.engine.remove(region, &annotation),
        };
        match html {
            Some(html) => self.commit(field, html),
            None => false,
        }
    }

    fn commit(&mut self, field: FieldRef, html: RichText) -> bool {
        let Some(id) = self.presentation.as_ref().map(|p| p.analysis_id().clone()) else {
            return false;
        };
        self.rev = self.rev.wrapping_add(1);
        match self.store.commit(&id, field, html) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(analysis_id = %id, field = %field, error = %err, "commit dropped");
                self.rebuild();
                false
            }
        }
    }

    pub fn open_dialog(&mut self) {
        self.dismiss_picker();
        self.dialog.open();
    }

    pub fn close_dialog(&mut self) {
        self.dialog.close();
    }

    pub fn submit_generation(&mut self) -> Option<GenerationRequest> {
        self.dialog.submit()
    }

    /// Applies a finished request. A successful current request becomes the new, active record.
    pub fn finish_generation(&mut self, outcome: GenerationOutcome) -> Option<AnalysisId> {
        let draft = self.dialog.resolve(outcome.token, outcome.result)?;
        let id = AnalysisId::generate(&mut self.rng);
        let analysis = draft.into_analysis(id.clone());
        tracing::info!(analysis_id = %id, title = analysis.title(), "created analysis");
        if !self.store.create(analysis) {
            return None;
        }
        self.rebuild();
        Some(id)
    }

    /// Plain text of the active analysis.
    pub fn copy_text(&self) -> Option<String> {
        self.presentation.as_ref().map(Presentation::to_plain_text)
    }

    pub fn export(
        &self,
        dir: &Path,
        renderer: &dyn ImageRenderer,
        durability: WriteDurability,
    ) -> Result<PathBuf, ExportError> {
        let presentation = self.presentation.as_ref().ok_or(ExportError::NothingSelected)?;
        export_to_dir(dir, presentation, renderer, durability)
    }

    fn rebuild(&mut self) {
        self.presentation = self.store.active().map(Presentation::from_analysis);
        self.engine.forget_issued();
        if let Some(presentation) = &self.presentation {
            presentation.regions().iter().for_each(|region| self.engine.observe(region));
        }
        self.picker.dispatch(PickerEvent::ClickOutside);
        self.selection = None;
        self.rev = self.rev.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests;
