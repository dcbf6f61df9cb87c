// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Infolens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Infolens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{backend::TestBackend, Terminal};
use rstest::{fixture, rstest};

use super::{
    cursor_position, document_rows, draw, fuzzy_score, osc52_sequence, regular_score,
    subsequence_stats, App, DocRow, ExternalAction, Focus, Matcher, SearchMode, SubsequenceStats,
    TuiOptions,
};
use crate::generate::{AnalysisDraft, EMPTY_INPUT_MESSAGE, EXAMPLE_TEXT};
use crate::model::fixtures::{demo_analyses, single_insight_analysis};
use crate::model::AnalysisId;
use crate::render::Presentation;
use crate::store::{AnalysisStore, MemoryBlobStore, WriteDurability};
use crate::test_support::TempDir;
use crate::workspace::{GenerationOutcome, Workspace};

const SUMMARY_HTML: &str = "The monsoon arrived early this year across the southern coast.";

fn options(exports_dir: &std::path::Path) -> TuiOptions {
    TuiOptions {
        exports_dir: exports_dir.to_path_buf(),
        durability: WriteDurability::BestEffort,
    }
}

fn fixture_id() -> AnalysisId {
    single_insight_analysis().id().clone()
}

fn app_with(analyses: Vec<crate::model::Analysis>, exports_dir: &std::path::Path) -> App {
    let store = AnalysisStore::with_analyses(Box::new(MemoryBlobStore::new()), analyses);
    let mut workspace = Workspace::with_seed(store, true, 11);
    workspace.select(&fixture_id());
    App::new(workspace, options(exports_dir))
}

#[fixture]
fn app() -> App {
    app_with(demo_analyses(), std::path::Path::new("unused-exports"))
}

fn press(app: &mut App, codes: &[KeyCode]) {
    for code in codes {
        app.handle_key(KeyEvent::new(*code, KeyModifiers::NONE));
    }
}

fn type_text(app: &mut App, text: &str) {
    for ch in text.chars() {
        press(app, &[KeyCode::Char(ch)]);
    }
}

fn repeat(code: KeyCode, times: usize) -> Vec<KeyCode> {
    vec![code; times]
}

fn render(app: &mut App, width: u16, height: u16) -> String {
    let mut terminal = Terminal::new(TestBackend::new(width, height)).expect("terminal");
    terminal.draw(|frame| draw(frame, app)).expect("draw");
    let buffer = terminal.backend().buffer();
    (0..buffer.area.height)
        .map(|y| (0..buffer.area.width).map(|x| buffer[(x, y)].symbol()).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

fn summary_html(app: &App) -> String {
    app.workspace.store().active().expect("active").summary().as_html().to_owned()
}

fn toast(app: &App) -> &str {
    app.toast.as_ref().map(|toast| toast.message.as_str()).unwrap_or_default()
}

fn draft() -> AnalysisDraft {
    AnalysisDraft {
        title: "Glacier Retreat".into(),
        summary: "Himalayan glaciers are shrinking fast.".into(),
        key_facts: vec!["Melt rates doubled since 2000.".into()],
        key_stats: Vec::new(),
        upsc_insights: Vec::new(),
    }
}

#[rstest]
fn history_marks_the_active_record(mut app: App) {
    assert_eq!(app.focus, Focus::History);
    assert_eq!(app.history_cursor, 1);

    let screen = render(&mut app, 120, 40);
    assert!(screen.contains("● Monsoon Outlook"));
    assert!(screen.contains("Webb Telescope"));
    assert!(screen.contains("KEY FACTS"));
    assert!(screen.contains("↳ Economic Development"));
}

#[rstest]
fn opening_a_history_entry_shows_it(mut app: App) {
    press(&mut app, &[KeyCode::Char('k'), KeyCode::Enter]);
    assert_eq!(app.workspace.store().active().map(|a| a.title()), Some("Webb Telescope: Peering Into Cosmic Dawn"));
    assert_eq!(app.focus, Focus::Document);
    assert_eq!(app.cursor.region, 0);
    assert_eq!(app.cursor.offset, 0);
}

#[rstest]
fn keyboard_selection_highlights_recolors_and_removes(mut app: App) {
    press(&mut app, &[KeyCode::Char('2'), KeyCode::Char('v')]);
    press(&mut app, &repeat(KeyCode::Char('l'), 6));
    press(&mut app, &[KeyCode::Enter]);

    let html = summary_html(&app);
    assert!(html.contains("class=\"highlight\""));
    assert!(html.contains(">The mon</span>"));
    assert_eq!(toast(&app), "Highlighted");

    press(&mut app, &repeat(KeyCode::Char('h'), 3));
    press(&mut app, &[KeyCode::Enter]);
    assert!(app.workspace.picker().is_open());
    assert!(render(&mut app, 120, 40).contains("x delete"));

    press(&mut app, &[KeyCode::Char('3')]);
    assert!(!app.workspace.picker().is_open());
    assert!(summary_html(&app).contains("rgba(248, 113, 113, 0.4)"));

    press(&mut app, &[KeyCode::Enter, KeyCode::Char('x')]);
    assert_eq!(summary_html(&app), SUMMARY_HTML);
}

#[rstest]
fn overlapping_selection_is_refused(mut app: App) {
    press(&mut app, &[KeyCode::Char('2'), KeyCode::Char('v')]);
    press(&mut app, &repeat(KeyCode::Char('l'), 6));
    press(&mut app, &[KeyCode::Enter, KeyCode::Char('0')]);
    press(&mut app, &repeat(KeyCode::Char('l'), 8));
    press(&mut app, &[KeyCode::Char('v')]);
    press(&mut app, &repeat(KeyCode::Char('h'), 3));
    press(&mut app, &[KeyCode::Enter]);

    assert!(toast(&app).starts_with("Cannot highlight"));
    assert_eq!(summary_html(&app).matches("class=\"highlight\"").count(), 1);
    assert_eq!(app.selection_anchor, None);
}

#[rstest]
fn enter_on_plain_text_does_not_open_the_picker(mut app: App) {
    press(&mut app, &[KeyCode::Char('2'), KeyCode::Char('w'), KeyCode::Enter]);
    assert!(!app.workspace.picker().is_open());
    assert_eq!(app.cursor.offset, 4);
}

#[rstest]
fn word_and_field_motions_stay_inside_the_document(mut app: App) {
    press(&mut app, &[KeyCode::Char('2'), KeyCode::Char('$')]);
    assert_eq!(app.cursor.offset, SUMMARY_HTML.chars().count() - 1);
    press(&mut app, &[KeyCode::Char('b')]);
    assert_eq!(app.cursor.offset, SUMMARY_HTML.find("coast").expect("word"));

    press(&mut app, &repeat(KeyCode::Char('j'), 10));
    assert_eq!(app.cursor.region, app.workspace.presentation().expect("shown").regions().len() - 1);
    press(&mut app, &repeat(KeyCode::Char('k'), 10));
    assert_eq!(app.cursor.region, 0);
}

#[rstest]
fn regular_search_filters_titles(mut app: App) {
    press(&mut app, &[KeyCode::Char('/')]);
    type_text(&mut app, "webb");
    assert_eq!(app.history_ids(), vec![AnalysisId::new("analysis-demo-jwst").unwrap()]);

    press(&mut app, &[KeyCode::Enter]);
    assert_eq!(app.search_mode, SearchMode::Results);
    assert!(render(&mut app, 120, 40).contains("1 match"));

    press(&mut app, &[KeyCode::Esc]);
    assert_eq!(app.search_mode, SearchMode::Inactive);
    assert_eq!(app.history_ids().len(), 2);
}

#[rstest]
fn regular_search_accepts_patterns(mut app: App) {
    press(&mut app, &[KeyCode::Char('/')]);
    type_text(&mut app, "^MONSOON");
    assert_eq!(app.history_ids(), vec![fixture_id()]);
}

#[rstest]
fn fuzzy_search_matches_subsequences(mut app: App) {
    press(&mut app, &[KeyCode::Char('\\')]);
    type_text(&mut app, "mnsn");
    assert_eq!(app.history_ids(), vec![fixture_id()]);
}

#[test]
fn invalid_pattern_falls_back_to_plain_text() {
    assert!(matches!(Matcher::new("a (b"), Matcher::Literal(_)));
    assert!(regular_score(&Matcher::new("a (b"), "plan a (b)").is_some());
    assert!(regular_score(&Matcher::new("zzz"), "plan a (b)").is_none());
}

#[test]
fn earlier_and_exact_matches_score_higher() {
    let matcher = Matcher::new("monsoon");
    let exact = regular_score(&matcher, "monsoon").unwrap();
    let prefix = regular_score(&matcher, "monsoon outlook").unwrap();
    let inner = regular_score(&matcher, "late monsoon outlook").unwrap();
    assert!(exact > prefix);
    assert!(prefix > inner);
}

#[test]
fn fuzzy_prefers_contiguous_matches() {
    let contiguous = fuzzy_score("mon", "monsoon outlook").unwrap();
    let scattered = fuzzy_score("mon", "my own notes").unwrap();
    assert!(contiguous > scattered);
    assert_eq!(fuzzy_score("xyz", "monsoon"), None);
}

#[test]
fn subsequence_stats_reports_span_and_boundary() {
    assert_eq!(
        subsequence_stats("mo", "a monsoon"),
        Some(SubsequenceStats {
            first: 2,
            span: 2,
            adjacent: 1,
            boundary_start: true,
        })
    );
    assert_eq!(subsequence_stats("", "anything"), None);
}

#[rstest]
fn new_analysis_dialog_queues_a_request_and_applies_the_result(mut app: App) {
    press(&mut app, &[KeyCode::Char('n')]);
    assert!(app.workspace.dialog().is_open());
    type_text(&mut app, "Glaciers are retreating.");
    press(&mut app, &[KeyCode::Enter]);

    let Some(ExternalAction::Generate(request)) = app.take_external_action() else {
        panic!("expected a generation request");
    };
    assert_eq!(request.text, "Glaciers are retreating.");
    assert!(app.workspace.dialog().is_pending());

    app.finish_generation(GenerationOutcome {
        token: request.token,
        result: Ok(draft()),
    });

    assert!(!app.workspace.dialog().is_open());
    assert_eq!(app.workspace.store().analyses().len(), 3);
    assert_eq!(app.workspace.store().active().map(|a| a.title()), Some("Glacier Retreat"));
    assert_eq!(app.history_cursor, 0);
    assert_eq!(app.focus, Focus::Document);
    assert!(toast(&app).contains("Glacier Retreat"));
}

#[rstest]
fn blank_dialog_input_is_rejected(mut app: App) {
    press(&mut app, &[KeyCode::Char('n'), KeyCode::Char(' '), KeyCode::Enter]);
    assert_eq!(app.take_external_action(), None);
    assert_eq!(app.workspace.dialog().message(), Some(EMPTY_INPUT_MESSAGE));
    assert!(render(&mut app, 120, 40).contains(EMPTY_INPUT_MESSAGE));
}

#[rstest]
fn dialog_keys_type_instead_of_running_commands(mut app: App) {
    press(&mut app, &[KeyCode::Char('n')]);
    type_text(&mut app, "eyq");
    assert_eq!(app.workspace.dialog().input(), "eyq");
    assert!(!app.should_quit);

    app.handle_key(KeyEvent::new(KeyCode::Char('e'), KeyModifiers::CONTROL));
    assert_eq!(app.workspace.dialog().input(), EXAMPLE_TEXT);

    app.handle_paste(" More.");
    assert!(app.workspace.dialog().input().ends_with(" More."));

    press(&mut app, &[KeyCode::Esc]);
    assert!(!app.workspace.dialog().is_open());
    assert_eq!(app.workspace.dialog().input(), "");
}

#[rstest]
fn deleting_the_active_entry_falls_back(mut app: App) {
    press(&mut app, &[KeyCode::Char('d')]);
    assert_eq!(app.workspace.store().analyses().len(), 1);
    assert_eq!(app.workspace.store().active().map(|a| a.id().as_str()), Some("analysis-demo-jwst"));
    assert_eq!(app.history_cursor, 0);
    assert!(toast(&app).contains("Monsoon Outlook"));
}

#[rstest]
fn copy_queues_plain_text(mut app: App) {
    press(&mut app, &[KeyCode::Char('y')]);
    let Some(ExternalAction::Copy(text)) = app.take_external_action() else {
        panic!("expected a clipboard write");
    };
    assert!(text.starts_with("Monsoon Outlook\n"));
}

#[test]
fn export_writes_an_svg_named_after_the_title() {
    let dir = TempDir::new("infolens-tui-export");
    let exports = dir.path().join("exports");
    let mut app = app_with(demo_analyses(), &exports);

    press(&mut app, &[KeyCode::Char('e')]);
    assert!(exports.join("monsoon_outlook.svg").is_file());
    assert!(toast(&app).starts_with("Exported"));
}

#[test]
fn empty_library_shows_the_welcome_view() {
    let dir = TempDir::new("infolens-tui-welcome");
    let mut app = app_with(Vec::new(), dir.path());

    let screen = render(&mut app, 100, 30);
    assert!(screen.contains("Welcome to Infolens"));
    assert!(screen.contains("No analyses yet"));

    press(&mut app, &[KeyCode::Char('e')]);
    assert!(toast(&app).starts_with("Export failed"));
    press(&mut app, &[KeyCode::Char('y')]);
    assert_eq!(toast(&app), "Nothing to copy");
}

#[rstest]
fn help_overlay_toggles_and_q_quits(mut app: App) {
    press(&mut app, &[KeyCode::Char('?')]);
    assert!(app.show_help);
    assert!(render(&mut app, 120, 40).contains("Highlight popup"));
    press(&mut app, &[KeyCode::Esc]);
    assert!(!app.show_help);

    press(&mut app, &[KeyCode::Char('q')]);
    assert!(app.should_quit);
}

#[test]
fn narrow_terminals_stack_the_panes() {
    let dir = TempDir::new("infolens-tui-narrow");
    let mut app = app_with(demo_analyses(), dir.path());
    let screen = render(&mut app, 60, 30);
    assert!(screen.contains("History"));
    assert!(screen.contains("Infographic"));
}

#[test]
fn document_rows_map_offsets_to_screen_positions() {
    let presentation = Presentation::from_analysis(&single_insight_analysis());
    let rows = document_rows(&presentation, 30);

    assert!(matches!(&rows[0], DocRow::Text(spans) if spans[0].content == "Monsoon Outlook"));
    let summary_row = rows
        .iter()
        .position(|row| matches!(row, DocRow::Field { region: 0, .. }))
        .expect("summary row");
    assert_eq!(cursor_position(&rows, 0, 0), Some((summary_row, 0)));

    let (fact_row, fact_col) = cursor_position(&rows, 1, 0).expect("fact row");
    assert!(fact_row > summary_row);
    assert_eq!(fact_col, 2);
    assert_eq!(cursor_position(&rows, 99, 0), None);
}

#[test]
fn osc52_sequence_encodes_base64() {
    assert_eq!(osc52_sequence("hi"), "\x1b]52;c;aGk=\x1b\\");
}
