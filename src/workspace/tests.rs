// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Infolens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Infolens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use rstest::{fixture, rstest};

use super::{run_generation, Workspace};
use crate::export::{ExportError, SvgRenderer};
use crate::generate::draft::{CategoryDraft, InsightDraft, InsightPointDraft};
use crate::generate::{AnalysisDraft, GenerationError, Generator, FAILURE_MESSAGE};
use crate::model::fixtures::{demo_analyses, single_insight_analysis};
use crate::model::{AnalysisId, FieldRef, RichText};
use crate::picker::PickerState;
use crate::rich_text::{HighlightColor, TextRange};
use crate::store::{AnalysisStore, FolderBlobStore, MemoryBlobStore, WriteDurability};
use crate::test_support::TempDir;

const SUMMARY_HTML: &str = "The monsoon arrived early this year across the southern coast.";

struct FakeGenerator {
    reply: Option<AnalysisDraft>,
}

impl Generator for FakeGenerator {
    async fn generate(&self, _text: String) -> Result<AnalysisDraft, GenerationError> {
        self.reply.clone().ok_or(GenerationError::EmptyReply)
    }
}

fn draft() -> AnalysisDraft {
    AnalysisDraft {
        title: "Glacier Retreat".into(),
        summary: "Himalayan glaciers are <shrinking> fast.".into(),
        key_facts: vec!["Melt rates doubled since 2000.".into()],
        key_stats: Vec::new(),
        upsc_insights: vec![InsightDraft {
            category: CategoryDraft::GsI,
            syllabus_description: "Geography".into(),
            points: vec![InsightPointDraft {
                point: "Changes in critical geographical features.".into(),
                syllabus_topic: "Physical Geography".into(),
            }],
        }],
    }
}

fn fixture_id() -> AnalysisId {
    single_insight_analysis().id().clone()
}

#[fixture]
fn workspace() -> Workspace {
    let store = AnalysisStore::with_analyses(Box::new(MemoryBlobStore::new()), demo_analyses());
    let mut workspace = Workspace::with_seed(store, true, 7);
    assert!(workspace.select(&fixture_id()));
    workspace
}

fn summary_html(workspace: &Workspace) -> String {
    workspace.store().active().unwrap().summary().as_html().to_owned()
}

#[tokio::test]
async fn generation_success_prepends_and_activates() {
    let mut workspace = workspace();
    let before = workspace.store().analyses().len();

    workspace.open_dialog();
    workspace.dialog_mut().set_input("Glaciers are retreating.");
    let request = workspace.submit_generation().expect("request");
    let generator = FakeGenerator { reply: Some(draft()) };
    let outcome = run_generation(&generator, request).await;
    let id = workspace.finish_generation(outcome).expect("created");

    let store = workspace.store();
    assert_eq!(store.analyses().len(), before + 1);
    assert_eq!(store.analyses()[0].id(), &id);
    assert_eq!(store.active_id(), Some(&id));
    assert!(id.as_str().starts_with("analysis-"));
    assert_eq!(
        store.analyses()[0].summary().as_html(),
        "Himalayan glaciers are &lt;shrinking&gt; fast."
    );
    assert_eq!(workspace.presentation().unwrap().title(), "Glacier Retreat");
    assert!(!workspace.dialog().is_open());
}

#[tokio::test]
async fn generation_failure_leaves_store_unchanged() {
    let mut workspace = workspace();
    let ids: Vec<_> = workspace.store().analyses().iter().map(|a| a.id().clone()).collect();

    workspace.open_dialog();
    workspace.dialog_mut().set_input("Glaciers are retreating.");
    let request = workspace.submit_generation().expect("request");
    let outcome = run_generation(&FakeGenerator { reply: None }, request).await;
    assert_eq!(workspace.finish_generation(outcome), None);

    let after: Vec<_> = workspace.store().analyses().iter().map(|a| a.id().clone()).collect();
    assert_eq!(after, ids);
    assert_eq!(workspace.store().active_id(), Some(&fixture_id()));
    assert!(workspace.dialog().is_open());
    assert_eq!(workspace.dialog().message(), Some(FAILURE_MESSAGE));
}

#[tokio::test]
async fn result_arriving_after_close_is_discarded() {
    let mut workspace = workspace();
    workspace.open_dialog();
    workspace.dialog_mut().set_input("text");
    let request = workspace.submit_generation().expect("request");
    workspace.close_dialog();

    let outcome = run_generation(&FakeGenerator { reply: Some(draft()) }, request).await;
    assert_eq!(workspace.finish_generation(outcome), None);
    assert_eq!(workspace.store().analyses().len(), demo_analyses().len());
}

#[rstest]
fn highlight_recolor_and_remove_round_trip(mut workspace: Workspace) {
    workspace.set_selection(FieldRef::Summary, TextRange::new(4, 11));
    assert!(workspace.highlight_selection());
    assert_eq!(workspace.selection(), None);

    let html = summary_html(&workspace);
    assert!(html.contains("class=\"highlight\""));
    assert!(html.contains(">monsoon</span>"));

    assert!(workspace.click(FieldRef::Summary, 6));
    assert!(workspace.picker().is_open());
    let red = HighlightColor::new("rgba(248, 113, 113, 0.4)").unwrap();
    assert!(workspace.pick_color(red));
    assert_eq!(workspace.picker(), &PickerState::Closed);
    assert!(summary_html(&workspace).contains("background-color:rgba(248, 113, 113, 0.4)"));

    assert!(workspace.click(FieldRef::Summary, 4));
    assert!(workspace.delete_highlight());
    assert_eq!(summary_html(&workspace), SUMMARY_HTML);
}

#[rstest]
fn plain_text_click_does_not_open_the_picker(mut workspace: Workspace) {
    workspace.set_selection(FieldRef::Summary, TextRange::new(4, 11));
    assert!(workspace.highlight_selection());
    assert!(workspace.click(FieldRef::Summary, 5));
    assert!(!workspace.click(FieldRef::Summary, 20));
    assert!(!workspace.picker().is_open());
    assert!(!workspace.delete_highlight());
}

#[rstest]
fn overlapping_selection_is_dropped(mut workspace: Workspace) {
    let fact = FieldRef::Fact(0);
    workspace.set_selection(fact, TextRange::new(0, 8));
    assert!(workspace.highlight_selection());
    let before = workspace.store().active().unwrap().key_facts()[0].clone();

    workspace.set_selection(fact, TextRange::new(5, 15));
    assert!(!workspace.highlight_selection());
    assert_eq!(workspace.selection(), None);
    assert_eq!(workspace.store().active().unwrap().key_facts()[0], before);
}

#[rstest]
fn deleting_the_active_record_falls_back_to_the_first(mut workspace: Workspace) {
    assert!(workspace.delete(&fixture_id()));
    let first = demo_analyses()[0].id().clone();
    assert_eq!(workspace.store().active_id(), Some(&first));
    assert_eq!(workspace.presentation().map(|p| p.analysis_id().clone()), Some(first));
}

#[rstest]
fn copy_text_uses_the_active_record(workspace: Workspace) {
    let text = workspace.copy_text().unwrap();
    assert!(text.starts_with("Monsoon Outlook\n"));
}

#[test]
fn export_needs_an_active_record() {
    let tmp = TempDir::new("workspace-export");
    let store = AnalysisStore::with_analyses(Box::new(MemoryBlobStore::new()), demo_analyses());
    let mut workspace = Workspace::with_seed(store, false, 1);
    let renderer = SvgRenderer::default();

    let result = workspace.export(tmp.path(), &renderer, WriteDurability::BestEffort);
    assert!(matches!(result, Err(ExportError::NothingSelected)));

    assert!(workspace.select(&fixture_id()));
    let path = workspace.export(tmp.path(), &renderer, WriteDurability::BestEffort).unwrap();
    assert!(path.ends_with("monsoon_outlook.svg"));
}

#[test]
fn highlights_survive_a_reload() {
    let tmp = TempDir::new("workspace-reload");
    let folder = FolderBlobStore::new(tmp.path());
    let store = AnalysisStore::with_analyses(Box::new(folder.clone()), vec![single_insight_analysis()]);
    let mut workspace = Workspace::with_seed(store, false, 3);
    assert!(workspace.select(&fixture_id()));
    workspace.set_selection(FieldRef::InsightPoint { insight: 0, point: 1 }, TextRange::new(0, 5));
    assert!(workspace.highlight_selection());

    let reloaded = AnalysisStore::load(Box::new(folder));
    let point = reloaded.get(&fixture_id()).unwrap().upsc_insights()[0].points()[1].point().clone();
    assert!(point.as_html().starts_with("<span id=\"highlight-"));
    assert_ne!(point, RichText::from_plain("Flood preparedness remains uneven."));
}

#[rstest]
fn failed_commit_restores_the_shown_regions_from_the_store(mut workspace: Workspace) {
    let region = workspace
        .presentation
        .as_mut()
        .and_then(|presentation| presentation.region_mut(FieldRef::Summary))
        .expect("summary region");
    let mut selection = Some(TextRange::new(4, 11));
    let html = workspace.engine.create_highlight(region, &mut selection).expect("highlight");

    assert!(!workspace.commit(FieldRef::Fact(99), html));

    let shown = workspace.presentation().unwrap().region(FieldRef::Summary).unwrap().serialize();
    assert_eq!(shown.as_html(), SUMMARY_HTML);
    assert_eq!(summary_html(&workspace), SUMMARY_HTML);
}
