// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Infolens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Infolens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Interactive terminal front-end.
//!
//! The [`App`] owns a [`Workspace`] and translates keys into workspace calls. Everything that has
//! to leave the UI thread (a generation request, a clipboard write) is queued as an
//! [`ExternalAction`] and picked up by the run loop, which also drains finished generation
//! requests once per tick.

use std::{
    error::Error,
    io,
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use crossterm::{
    event::{
        self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers,
    },
    execute,
    style::Print,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Padding, Paragraph, Wrap},
    Frame, Terminal,
};
use regex::{Regex, RegexBuilder};
use tokio::{runtime::Handle, sync::mpsc};

use crate::export::SvgRenderer;
use crate::generate::{GenerationError, GenerationRequest, Generator};
use crate::model::{AnalysisId, FieldRef};
use crate::render::{
    truncate_with_ellipsis, wrap_region, wrap_text, Block as DocBlock, Cell, Presentation,
    WrappedLine,
};
use crate::rich_text::{palette, HighlightColor, TextRange, PALETTE};
use crate::store::WriteDurability;
use crate::workspace::{run_generation, GenerationOutcome, Workspace};

const FOCUS_COLOR: Color = Color::LightGreen;
const ACCENT_COLOR: Color = Color::LightCyan;
const MUTED_COLOR: Color = Color::DarkGray;
const ERROR_COLOR: Color = Color::LightRed;
const FOOTER_LABEL_COLOR: Color = Color::Gray;
const FOOTER_KEY_COLOR: Color = Color::Cyan;
const FOOTER_BRAND_COLOR: Color = Color::White;
const FOOTER_BRAND: &str = "◆ infolens";
const HISTORY_WIDTH: u16 = 36;
const TICK: Duration = Duration::from_millis(250);
const TOAST_TTL: Duration = Duration::from_secs(3);
const PICKER_WIDTH: u16 = 36;
const PICKER_HEIGHT: u16 = 4;

/// Where exports go and how they are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TuiOptions {
    pub exports_dir: PathBuf,
    pub durability: WriteDurability,
}

/// Runs the interactive terminal UI until the user quits.
///
/// Generation requests are spawned on `runtime`; with no `generator` every request fails the
/// same way a missing API key does.
pub fn run<G: Generator>(
    workspace: Workspace,
    generator: Option<Arc<G>>,
    runtime: Handle,
    options: TuiOptions,
) -> Result<(), Box<dyn Error>> {
    let mut terminal = TerminalSession::new()?;
    let mut app = App::new(workspace, options);
    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel::<GenerationOutcome>();

    while !app.should_quit {
        while let Ok(outcome) = outcome_rx.try_recv() {
            app.finish_generation(outcome);
        }
        terminal.draw(|frame| draw(frame, &mut app))?;

        if event::poll(TICK)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => app.handle_key(key),
                Event::Paste(text) => app.handle_paste(&text),
                _ => {}
            }
        }

        match app.take_external_action() {
            Some(ExternalAction::Generate(request)) => {
                spawn_generation(&runtime, generator.clone(), request, outcome_tx.clone());
            }
            Some(ExternalAction::Copy(text)) => match copy_to_clipboard(&text) {
                Ok(backend) => app.set_toast(format!("Copied analysis ({backend})")),
                Err(err) => app.set_toast(format!("Clipboard error: {err}")),
            },
            None => {}
        }
    }

    Ok(())
}

fn spawn_generation<G: Generator>(
    runtime: &Handle,
    generator: Option<Arc<G>>,
    request: GenerationRequest,
    outcome_tx: mpsc::UnboundedSender<GenerationOutcome>,
) {
    tracing::info!(chars = request.text.chars().count(), "generation requested");
    runtime.spawn(async move {
        let outcome = match generator {
            Some(generator) => run_generation(generator.as_ref(), request).await,
            None => GenerationOutcome {
                token: request.token,
                result: Err(GenerationError::MissingApiKey),
            },
        };
        if outcome_tx.send(outcome).is_err() {
            tracing::debug!("generation finished after the UI closed");
        }
    });
}

fn draw(frame: &mut Frame<'_>, app: &mut App) {
    let area = frame.area();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);
    let main_area = rows[0];
    let status_area = rows[1];

    let panes = if stack_panes_vertically(main_area) {
        let history_height = (main_area.height / 3).clamp(3, 10);
        Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(history_height), Constraint::Min(0)])
            .split(main_area)
    } else {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(HISTORY_WIDTH), Constraint::Min(0)])
            .split(main_area)
    };

    render_history(frame, app, panes[0]);
    render_document(frame, app, panes[1]);

    let toast_suffix = app.toast_suffix();
    let footer = if app.search_mode == SearchMode::Inactive {
        footer_help_line(app, &toast_suffix)
    } else {
        search_footer_line(app, &toast_suffix)
    };
    frame.render_widget(Paragraph::new(footer), status_area);
    let brand = Paragraph::new(footer_brand_line()).alignment(Alignment::Right);
    frame.render_widget(brand, status_area);
    if app.search_mode == SearchMode::Editing {
        let cursor_x = status_area
            .x
            .saturating_add(1)
            .saturating_add(app.search_query.chars().count() as u16)
            .min(status_area.right().saturating_sub(1));
        frame.set_cursor_position((cursor_x, status_area.y));
    }

    if app.workspace.dialog().is_open() {
        render_dialog(frame, app, main_area);
    }
    if app.show_help {
        render_help(frame, app, main_area);
    }
}

fn render_history(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let ids = app.history_ids();
    let active = app.workspace.store().active_id();
    let label_width = usize::from(area.width.saturating_sub(6));

    let items = ids
        .iter()
        .filter_map(|id| app.workspace.store().get(id))
        .map(|analysis| {
            let is_active = Some(analysis.id()) == active;
            let marker = if is_active { "● " } else { "  " };
            let style = if is_active {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(vec![
                Span::styled(marker, Style::default().fg(FOCUS_COLOR)),
                Span::styled(truncate_with_ellipsis(analysis.title(), label_width), style),
            ]))
        })
        .collect::<Vec<_>>();

    let tail = match (&app.search_results, app.workspace.store().analyses().len()) {
        (Some(results), total) => format!("{}/{total}", results.len()),
        (None, total) => total.to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(panel_border_style_for_focus(app.focus, Focus::History))
        .title(view_title("History", '1', Some(&tail)));

    if items.is_empty() {
        let empty = if app.search_results.is_some() { "No matches" } else { "No analyses yet" };
        let paragraph = Paragraph::new(Span::styled(empty, Style::default().fg(MUTED_COLOR))).block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let highlight = if app.focus == Focus::History {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default().bg(Color::Rgb(40, 44, 52))
    };
    let list = List::new(items).block(block).highlight_style(highlight);
    let mut state = ListState::default().with_selected(Some(app.history_cursor));
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_document(frame: &mut Frame<'_>, app: &mut App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(panel_border_style_for_focus(app.focus, Focus::Document))
        .padding(Padding::horizontal(1));
    let inner = block.inner(area);

    let Some(presentation) = app.workspace.presentation() else {
        let paragraph = Paragraph::new(welcome_lines())
            .block(block.title(view_title("Infographic", '2', None)))
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
        return;
    };

    let title = view_title("Infographic", '2', Some(presentation.analysis_id().as_str()));
    let rows = document_rows(presentation, usize::from(inner.width));
    let picker = app.workspace.picker().bound().map(|open| {
        let current = presentation
            .region(open.field)
            .and_then(|region| region.highlights().into_iter().find(|span| span.id == open.annotation))
            .map(|span| span.color);
        (open.field, open.anchor.offset, current)
    });

    let view = CursorView {
        region: app.cursor.region,
        offset: app.cursor.offset,
        selection: app.selection_range(),
        show: app.focus == Focus::Document && !app.workspace.dialog().is_open(),
    };
    let cursor_at = cursor_position(&rows, view.region, view.offset);
    if let Some((row, _)) = cursor_at {
        app.scroll_to_row(row, usize::from(inner.height));
    }
    let max_scroll = rows.len().saturating_sub(usize::from(inner.height.max(1)));
    app.doc_scroll = app.doc_scroll.min(u16::try_from(max_scroll).unwrap_or(u16::MAX));

    let lines = rows.iter().map(|row| row_line(row, &view)).collect::<Vec<_>>();
    let paragraph = Paragraph::new(lines)
        .block(block.title(title))
        .scroll((app.doc_scroll, 0));
    frame.render_widget(paragraph, area);

    if let Some((field, anchor, current)) = picker {
        let anchor_at = app
            .region_index(field)
            .and_then(|region| cursor_position(&rows, region, anchor));
        let anchor_screen = anchor_at.map(|(row, col)| {
            let y = inner.y as i64 + row as i64 - i64::from(app.doc_scroll);
            (inner.x.saturating_add(col as u16), y)
        });
        render_picker(frame, inner, anchor_screen, current.as_ref());
    }
}

fn welcome_lines() -> Vec<Line<'static>> {
    vec![
        Line::from(""),
        Line::from(Span::styled(
            "Welcome to Infolens",
            Style::default().fg(ACCENT_COLOR).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Paste an article, a report or your notes and get a UPSC-style infographic:"),
        Line::from("a summary, key facts, statistics and syllabus insights you can highlight."),
        Line::from(""),
        Line::from(vec![
            Span::raw("Press "),
            Span::styled("n", help_key_style()),
            Span::raw(" to create an analysis, or pick one from the history with "),
            Span::styled("Enter", help_key_style()),
            Span::raw("."),
        ]),
    ]
}

fn render_picker(frame: &mut Frame<'_>, bounds: Rect, anchor: Option<(u16, i64)>, current: Option<&HighlightColor>) {
    let width = PICKER_WIDTH.min(bounds.width);
    let height = PICKER_HEIGHT.min(bounds.height);
    let (x, y) = match anchor {
        Some((x, y)) => {
            let below = y + 1;
            let y = if below + i64::from(height) <= i64::from(bounds.bottom()) {
                below
            } else {
                y - i64::from(height)
            };
            (x, y)
        }
        None => (bounds.x, i64::from(bounds.bottom().saturating_sub(height))),
    };
    let max_x = bounds.right().saturating_sub(width);
    let max_y = i64::from(bounds.bottom().saturating_sub(height));
    let area = Rect {
        x: x.clamp(bounds.x, max_x.max(bounds.x)),
        y: y.clamp(i64::from(bounds.y), max_y.max(i64::from(bounds.y))) as u16,
        width,
        height,
    };

    let mut swatches = Vec::<Span<'static>>::new();
    for (index, (color, (name, _))) in palette().iter().zip(PALETTE.iter()).enumerate() {
        let (r, g, b) = color.opaque().unwrap_or((128, 128, 128));
        let selected = current == Some(color);
        swatches.push(Span::styled(format!("{}", index + 1), help_key_style()));
        swatches.push(Span::styled(
            if selected { "▣" } else { "■" }.to_owned(),
            Style::default().fg(Color::Rgb(r, g, b)),
        ));
        if selected {
            swatches.push(Span::styled(format!("{name} "), Style::default().fg(Color::Rgb(r, g, b))));
        } else {
            swatches.push(Span::raw(" "));
        }
    }
    let hints = Line::from(vec![
        Span::styled("x", help_key_style()),
        Span::styled(" delete   ", Style::default().fg(FOOTER_LABEL_COLOR)),
        Span::styled("Esc", help_key_style()),
        Span::styled(" close", Style::default().fg(FOOTER_LABEL_COLOR)),
    ]);

    frame.render_widget(Clear, area);
    let popup = Paragraph::new(vec![Line::from(swatches), hints]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(FOCUS_COLOR))
            .title(" Highlight "),
    );
    frame.render_widget(popup, area);
}

fn render_dialog(frame: &mut Frame<'_>, app: &App, main_area: Rect) {
    let area = centered_rect(72, 64, main_area);
    frame.render_widget(Clear, area);

    let dialog = app.workspace.dialog();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(FOCUS_COLOR))
        .padding(Padding::horizontal(1))
        .title(" New analysis ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    frame.render_widget(
        Paragraph::new(Span::styled(
            "Paste or type the text to analyze:",
            Style::default().fg(FOOTER_LABEL_COLOR),
        )),
        sections[0],
    );

    let input_area = sections[1];
    let mut input_lines = wrap_text(dialog.input(), usize::from(input_area.width));
    let overflow = input_lines.len().saturating_sub(usize::from(input_area.height.max(1)));
    input_lines.drain(..overflow);
    let input_style = if dialog.is_pending() {
        Style::default().fg(MUTED_COLOR)
    } else {
        Style::default()
    };
    let cursor = input_lines
        .last()
        .map(|line| (line.chars().count(), input_lines.len() - 1))
        .unwrap_or((0, 0));
    let lines = input_lines
        .into_iter()
        .map(|line| Line::from(Span::styled(line, input_style)))
        .collect::<Vec<_>>();
    frame.render_widget(Paragraph::new(lines), input_area);
    if !dialog.is_pending() {
        frame.set_cursor_position((
            input_area.x.saturating_add(cursor.0 as u16).min(input_area.right().saturating_sub(1)),
            input_area.y.saturating_add(cursor.1 as u16),
        ));
    }

    let status = if dialog.is_pending() {
        Span::styled("Generating infographic…", Style::default().fg(ACCENT_COLOR))
    } else if let Some(message) = dialog.message() {
        Span::styled(message, Style::default().fg(ERROR_COLOR))
    } else {
        Span::raw("")
    };
    frame.render_widget(Paragraph::new(status), sections[2]);

    let mut spans = Vec::<Span<'static>>::new();
    push_footer_entry_maybe_disabled(&mut spans, "Generate", "Enter", !dialog.can_submit());
    push_footer_entry_maybe_disabled(&mut spans, "Example", "^E", dialog.is_pending());
    push_footer_entry_maybe_disabled(&mut spans, "Clear", "^U", dialog.is_pending());
    push_footer_entry(&mut spans, "Close", "Esc");
    frame.render_widget(Paragraph::new(Line::from(spans)), sections[3]);
}

/// One row of the document pane.
#[derive(Debug, Clone, PartialEq)]
enum DocRow {
    Blank,
    Text(Vec<Span<'static>>),
    /// Wrapped text of an annotatable region; `lead` is drawn before the cells.
    Field {
        region: usize,
        lead: &'static str,
        line: WrappedLine,
    },
}

#[derive(Debug, Clone, Copy)]
struct CursorView {
    region: usize,
    offset: usize,
    selection: Option<TextRange>,
    show: bool,
}

/// Lays a presentation out at `width` columns.
fn document_rows(presentation: &Presentation, width: usize) -> Vec<DocRow> {
    let width = width.max(8);
    let mut rows = Vec::new();

    for block in presentation.blocks() {
        match block {
            DocBlock::Title(title) => {
                let style = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
                rows.extend(
                    wrap_text(title, width)
                        .into_iter()
                        .map(|line| DocRow::Text(vec![Span::styled(line, style)])),
                );
            }
            DocBlock::Heading(heading) => {
                rows.push(DocRow::Blank);
                rows.push(DocRow::Text(vec![Span::styled(
                    heading.to_uppercase(),
                    Style::default().fg(ACCENT_COLOR).add_modifier(Modifier::BOLD),
                )]));
            }
            DocBlock::Stats(group) => {
                rows.push(DocRow::Text(vec![Span::styled(
                    group.group_name().to_owned(),
                    Style::default().fg(FOOTER_LABEL_COLOR).add_modifier(Modifier::BOLD),
                )]));
                for stat in group.stats() {
                    rows.push(DocRow::Text(vec![
                        Span::raw("  "),
                        Span::styled(stat.value().to_owned(), Style::default().add_modifier(Modifier::BOLD)),
                        Span::raw("  "),
                        Span::styled(stat.label().to_owned(), Style::default().fg(FOOTER_LABEL_COLOR)),
                    ]));
                }
            }
            DocBlock::InsightHeader {
                category,
                syllabus_description,
            } => {
                let label = category.short_label();
                let text = format!("{label} · {syllabus_description}");
                for (index, line) in wrap_text(&text, width).into_iter().enumerate() {
                    let spans = match (index, line.strip_prefix(label)) {
                        (0, Some(rest)) => vec![
                            Span::styled(label.to_owned(), Style::default().fg(ACCENT_COLOR).add_modifier(Modifier::BOLD)),
                            Span::styled(rest.to_owned(), Style::default().fg(FOOTER_LABEL_COLOR)),
                        ],
                        _ => vec![Span::styled(line, Style::default().fg(FOOTER_LABEL_COLOR))],
                    };
                    rows.push(DocRow::Text(spans));
                }
            }
            DocBlock::Field { field, caption } => {
                let Some(region) = presentation.regions().iter().position(|r| r.field() == *field) else {
                    continue;
                };
                let (first_lead, lead) = match field {
                    FieldRef::Summary => ("", ""),
                    _ => ("• ", "  "),
                };
                let wrapped = wrap_region(&presentation.regions()[region], width - first_lead.chars().count());
                for (index, line) in wrapped.into_iter().enumerate() {
                    rows.push(DocRow::Field {
                        region,
                        lead: if index == 0 { first_lead } else { lead },
                        line,
                    });
                }
                if let Some(caption) = caption {
                    rows.push(DocRow::Text(vec![Span::styled(
                        format!("  ↳ {caption}"),
                        Style::default().fg(MUTED_COLOR).add_modifier(Modifier::ITALIC),
                    )]));
                }
            }
        }
    }
    rows
}

/// Row and column of `offset` inside `region`, or the region's last position when the offset is
/// past the end.
fn cursor_position(rows: &[DocRow], region: usize, offset: usize) -> Option<(usize, usize)> {
    let mut fallback = None;
    for (row_index, row) in rows.iter().enumerate() {
        let DocRow::Field { region: r, lead, line } = row else {
            continue;
        };
        if *r != region {
            continue;
        }
        let lead_len = lead.chars().count();
        if let Some(col) = line.cells.iter().position(|cell| cell.offset == offset) {
            return Some((row_index, lead_len + col));
        }
        fallback = Some((row_index, lead_len + line.cells.len()));
    }
    fallback
}

fn row_line(row: &DocRow, view: &CursorView) -> Line<'static> {
    match row {
        DocRow::Blank => Line::from(""),
        DocRow::Text(spans) => Line::from(spans.clone()),
        DocRow::Field { region, lead, line } => {
            let mut spans = vec![Span::styled(*lead, Style::default().fg(ACCENT_COLOR))];
            let focused = view.show && view.region == *region;
            let mut run: Option<(Style, String)> = None;
            for cell in &line.cells {
                let style = cell_style(cell, focused.then_some(view));
                match run.as_mut() {
                    Some((run_style, text)) if *run_style == style => text.push(cell.ch),
                    _ => {
                        if let Some((run_style, text)) = run.take() {
                            spans.push(Span::styled(text, run_style));
                        }
                        run = Some((style, cell.ch.to_string()));
                    }
                }
            }
            if let Some((style, text)) = run {
                spans.push(Span::styled(text, style));
            }
            if focused && line.cells.is_empty() {
                spans.push(Span::styled(" ", Style::default().add_modifier(Modifier::REVERSED)));
            }
            Line::from(spans)
        }
    }
}

fn cell_style(cell: &Cell, view: Option<&CursorView>) -> Style {
    let mut style = Style::default();
    if let Some((_, color)) = &cell.highlight {
        if let Some((r, g, b)) = color.opaque() {
            style = style.bg(Color::Rgb(r, g, b)).fg(Color::Black);
        }
    }
    if cell.bold {
        style = style.add_modifier(Modifier::BOLD);
    }
    if cell.italic {
        style = style.add_modifier(Modifier::ITALIC);
    }
    if let Some(view) = view {
        if view.selection.is_some_and(|range| range.contains(cell.offset)) {
            style = style.add_modifier(Modifier::UNDERLINED).bg(Color::Rgb(60, 70, 110)).fg(Color::White);
        }
        if cell.offset == view.offset {
            style = style.add_modifier(Modifier::REVERSED);
        }
    }
    style
}

// Extracted layout, footer, help and style helpers.
include!("chrome.rs");

#[derive(Debug, Clone)]
struct Toast {
    message: String,
    expires_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchMode {
    Inactive,
    Editing,
    Results,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchKind {
    Regular,
    Fuzzy,
}

#[derive(Debug, Clone)]
struct SearchCandidate {
    id: AnalysisId,
    haystack: String,
}

/// Work the run loop performs outside of [`App`].
#[derive(Debug, Clone, PartialEq, Eq)]
enum ExternalAction {
    Generate(GenerationRequest),
    Copy(String),
}

/// Keyboard caret inside the document: a region index and a character offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct DocCursor {
    region: usize,
    offset: usize,
}

struct App {
    workspace: Workspace,
    options: TuiOptions,
    focus: Focus,
    history_cursor: usize,
    search_mode: SearchMode,
    search_kind: SearchKind,
    search_query: String,
    search_candidates: Vec<SearchCandidate>,
    /// `None` shows every record.
    search_results: Option<Vec<AnalysisId>>,
    shown: Option<AnalysisId>,
    cursor: DocCursor,
    selection_anchor: Option<usize>,
    doc_scroll: u16,
    show_help: bool,
    help_scroll: u16,
    toast: Option<Toast>,
    pending_external_action: Option<ExternalAction>,
    should_quit: bool,
}

impl App {
    fn new(workspace: Workspace, options: TuiOptions) -> Self {
        let mut app = Self {
            workspace,
            options,
            focus: Focus::History,
            history_cursor: 0,
            search_mode: SearchMode::Inactive,
            search_kind: SearchKind::Regular,
            search_query: String::new(),
            search_candidates: Vec::new(),
            search_results: None,
            shown: None,
            cursor: DocCursor::default(),
            selection_anchor: None,
            doc_scroll: 0,
            show_help: false,
            help_scroll: 0,
            toast: None,
            pending_external_action: None,
            should_quit: false,
        };
        app.history_cursor = app.active_history_index().unwrap_or(0);
        app.sync_document();
        app
    }

    fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        if self.workspace.dialog().is_open() {
            self.handle_dialog_key(key.code, ctrl);
        } else if self.handle_key_code(key.code) {
            self.should_quit = true;
        }
        self.sync_document();
    }

    fn handle_paste(&mut self, text: &str) {
        if !self.workspace.dialog().is_open() {
            return;
        }
        let mut input = self.workspace.dialog().input().to_owned();
        input.push_str(text);
        self.workspace.dialog_mut().set_input(input);
    }

    /// Returns `true` when the app should quit.
    fn handle_key_code(&mut self, code: KeyCode) -> bool {
        if self.show_help {
            match code {
                KeyCode::Esc | KeyCode::Char('?') => self.show_help = false,
                KeyCode::Char('q') => return true,
                KeyCode::Down | KeyCode::Char('j') => self.help_scroll = self.help_scroll.saturating_add(1),
                KeyCode::Up | KeyCode::Char('k') => self.help_scroll = self.help_scroll.saturating_sub(1),
                KeyCode::PageDown => self.help_scroll = self.help_scroll.saturating_add(10),
                KeyCode::PageUp => self.help_scroll = self.help_scroll.saturating_sub(10),
                KeyCode::Home => self.help_scroll = 0,
                KeyCode::End => self.help_scroll = u16::MAX,
                _ => {}
            }
            return false;
        }

        if self.workspace.picker().is_open() {
            self.handle_picker_key(code);
            return false;
        }

        match self.search_mode {
            SearchMode::Editing => {
                self.handle_search_edit_key(code);
                return false;
            }
            SearchMode::Results => match code {
                KeyCode::Esc => {
                    self.clear_search();
                    return false;
                }
                KeyCode::Char('n') => {
                    self.search_step(1);
                    return false;
                }
                KeyCode::Char('N') => {
                    self.search_step(-1);
                    return false;
                }
                _ => {}
            },
            SearchMode::Inactive => {}
        }

        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('?') => self.toggle_help(),
            KeyCode::Tab | KeyCode::BackTab => self.focus = self.focus.toggle(),
            KeyCode::Char('1') => self.focus = Focus::History,
            KeyCode::Char('2') => self.focus = Focus::Document,
            KeyCode::Char('n') => self.open_dialog(),
            KeyCode::Char('/') => self.enter_search_mode(SearchKind::Regular),
            KeyCode::Char('\\') => self.enter_search_mode(SearchKind::Fuzzy),
            KeyCode::Char('y') => self.queue_copy(),
            KeyCode::Char('e') => self.export_active(),
            _ => match self.focus {
                Focus::History => self.handle_history_key(code),
                Focus::Document => self.handle_document_key(code),
            },
        }
        false
    }

    fn handle_history_key(&mut self, code: KeyCode) {
        let len = self.history_ids().len();
        match code {
            KeyCode::Down | KeyCode::Char('j') if len > 0 => {
                self.history_cursor = (self.history_cursor + 1).min(len - 1);
            }
            KeyCode::Up | KeyCode::Char('k') => self.history_cursor = self.history_cursor.saturating_sub(1),
            KeyCode::Home | KeyCode::Char('g') => self.history_cursor = 0,
            KeyCode::End | KeyCode::Char('G') => self.history_cursor = len.saturating_sub(1),
            KeyCode::Enter | KeyCode::Char('o') => self.open_selected_history(),
            KeyCode::Char('d') | KeyCode::Delete => self.delete_selected_history(),
            _ => {}
        }
    }

    fn handle_document_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Left | KeyCode::Char('h') => self.move_left(),
            KeyCode::Right | KeyCode::Char('l') => self.move_right(),
            KeyCode::Down | KeyCode::Char('j') => self.move_region(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_region(-1),
            KeyCode::Char('w') => self.move_word_forward(),
            KeyCode::Char('b') => self.move_word_back(),
            KeyCode::Home | KeyCode::Char('0') => self.cursor.offset = 0,
            KeyCode::End | KeyCode::Char('$') => self.cursor.offset = self.region_len().saturating_sub(1),
            KeyCode::Char('v') => self.toggle_selection(),
            KeyCode::Esc => self.selection_anchor = None,
            KeyCode::Enter | KeyCode::Char(' ') => {
                if self.selection_anchor.is_some() {
                    self.highlight_selection();
                } else {
                    self.click_at_cursor();
                }
            }
            _ => {}
        }
    }

    fn handle_picker_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char(ch @ '1'..='9') => {
                let index = usize::from(ch as u8 - b'1');
                let Some(color) = palette().into_iter().nth(index) else {
                    return;
                };
                if !self.workspace.pick_color(color) {
                    self.set_toast("Could not recolor highlight");
                }
            }
            KeyCode::Char('x') | KeyCode::Char('d') | KeyCode::Delete | KeyCode::Backspace => {
                if self.workspace.delete_highlight() {
                    self.set_toast("Highlight removed");
                } else {
                    self.set_toast("Could not remove highlight");
                }
            }
            KeyCode::Esc | KeyCode::Char('q') => self.workspace.dismiss_picker(),
            _ => {}
        }
    }

    fn handle_dialog_key(&mut self, code: KeyCode, ctrl: bool) {
        match code {
            KeyCode::Esc => self.workspace.close_dialog(),
            KeyCode::Enter => {
                if let Some(request) = self.workspace.submit_generation() {
                    self.pending_external_action = Some(ExternalAction::Generate(request));
                }
            }
            KeyCode::Backspace => self.workspace.dialog_mut().backspace(),
            KeyCode::Char('e') if ctrl => self.workspace.dialog_mut().load_example(),
            KeyCode::Char('u') if ctrl => self.workspace.dialog_mut().set_input(""),
            KeyCode::Char(ch) if !ctrl => self.workspace.dialog_mut().push_char(ch),
            _ => {}
        }
    }

    fn finish_generation(&mut self, outcome: GenerationOutcome) {
        let Some(id) = self.workspace.finish_generation(outcome) else {
            return;
        };
        self.clear_search();
        self.history_cursor = self.history_ids().iter().position(|candidate| *candidate == id).unwrap_or(0);
        self.focus = Focus::Document;
        self.sync_document();
        let title = self.workspace.store().get(&id).map(|a| a.title().to_owned()).unwrap_or_default();
        self.set_toast(format!("Created “{title}”"));
    }

    fn take_external_action(&mut self) -> Option<ExternalAction> {
        self.pending_external_action.take()
    }

    fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
        if self.show_help {
            self.help_scroll = 0;
        }
    }

    fn open_dialog(&mut self) {
        self.selection_anchor = None;
        self.workspace.open_dialog();
    }

    fn queue_copy(&mut self) {
        match self.workspace.copy_text() {
            Some(text) => self.pending_external_action = Some(ExternalAction::Copy(text)),
            None => self.set_toast("Nothing to copy"),
        }
    }

    fn export_active(&mut self) {
        let renderer = SvgRenderer::default();
        match self.workspace.export(&self.options.exports_dir, &renderer, self.options.durability) {
            Ok(path) => self.set_toast(format!("Exported {}", path.display())),
            Err(err) => {
                tracing::warn!(error = %err, "export failed");
                self.set_toast(format!("Export failed: {err}"));
            }
        }
    }

    /// Record ids in sidebar order: newest first, or ranked when a search is active.
    fn history_ids(&self) -> Vec<AnalysisId> {
        match &self.search_results {
            Some(results) => results.clone(),
            None => self.workspace.store().analyses().iter().map(|a| a.id().clone()).collect(),
        }
    }

    fn active_history_index(&self) -> Option<usize> {
        let active = self.workspace.store().active_id()?;
        self.history_ids().iter().position(|id| id == active)
    }

    fn open_selected_history(&mut self) {
        let Some(id) = self.history_ids().get(self.history_cursor).cloned() else {
            return;
        };
        if self.workspace.select(&id) {
            self.focus = Focus::Document;
        }
    }

    fn delete_selected_history(&mut self) {
        let Some(id) = self.history_ids().get(self.history_cursor).cloned() else {
            return;
        };
        let title = self.workspace.store().get(&id).map(|a| a.title().to_owned()).unwrap_or_default();
        if !self.workspace.delete(&id) {
            return;
        }
        if let Some(results) = self.search_results.as_mut() {
            results.retain(|candidate| *candidate != id);
        }
        self.set_toast(format!("Deleted “{title}”"));
    }

    fn enter_search_mode(&mut self, kind: SearchKind) {
        self.search_mode = SearchMode::Editing;
        self.search_kind = kind;
        self.search_query.clear();
        self.search_results = None;
        self.search_candidates = self
            .workspace
            .store()
            .analyses()
            .iter()
            .map(|analysis| SearchCandidate {
                id: analysis.id().clone(),
                haystack: analysis.title().to_lowercase(),
            })
            .collect();
        self.focus = Focus::History;
    }

    fn handle_search_edit_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => self.clear_search(),
            KeyCode::Enter => {
                self.search_mode = if self.search_results.is_some() {
                    SearchMode::Results
                } else {
                    SearchMode::Inactive
                };
            }
            KeyCode::Backspace => {
                self.search_query.pop();
                self.update_search_results();
            }
            KeyCode::Char(ch) => {
                self.search_query.push(ch);
                self.update_search_results();
            }
            _ => {}
        }
    }

    fn update_search_results(&mut self) {
        self.search_results = (!self.search_query.trim().is_empty())
            .then(|| ranked_search_results(&self.search_candidates, &self.search_query, self.search_kind));
        self.history_cursor = 0;
    }

    fn clear_search(&mut self) {
        self.search_mode = SearchMode::Inactive;
        self.search_query.clear();
        self.search_candidates.clear();
        self.search_results = None;
        self.history_cursor = self.active_history_index().unwrap_or(0);
    }

    fn search_step(&mut self, delta: isize) {
        let len = self.history_ids().len();
        if len <= 1 {
            return;
        }
        self.history_cursor = (self.history_cursor as isize + delta).rem_euclid(len as isize) as usize;
    }

    fn search_prefix(&self) -> char {
        match self.search_kind {
            SearchKind::Regular => '/',
            SearchKind::Fuzzy => '\\',
        }
    }

    fn region_count(&self) -> usize {
        self.workspace.presentation().map_or(0, |p| p.regions().len())
    }

    fn region_len(&self) -> usize {
        self.workspace
            .presentation()
            .and_then(|p| p.regions().get(self.cursor.region))
            .map_or(0, |region| region.text_len())
    }

    fn region_index(&self, field: FieldRef) -> Option<usize> {
        self.workspace.presentation()?.regions().iter().position(|r| r.field() == field)
    }

    fn cursor_field(&self) -> Option<FieldRef> {
        self.workspace
            .presentation()
            .and_then(|p| p.regions().get(self.cursor.region))
            .map(|region| region.field())
    }

    fn region_chars(&self) -> Vec<char> {
        self.workspace
            .presentation()
            .and_then(|p| p.regions().get(self.cursor.region))
            .map(|region| region.text().chars().collect())
            .unwrap_or_default()
    }

    fn move_left(&mut self) {
        if self.cursor.offset > 0 {
            self.cursor.offset -= 1;
        } else if self.cursor.region > 0 && self.selection_anchor.is_none() {
            self.cursor.region -= 1;
            self.cursor.offset = self.region_len().saturating_sub(1);
        }
    }

    fn move_right(&mut self) {
        if self.cursor.offset + 1 < self.region_len() {
            self.cursor.offset += 1;
        } else if self.cursor.region + 1 < self.region_count() && self.selection_anchor.is_none() {
            self.cursor = DocCursor {
                region: self.cursor.region + 1,
                offset: 0,
            };
        }
    }

    fn move_region(&mut self, delta: isize) {
        let count = self.region_count();
        let target = self.cursor.region as isize + delta;
        if count == 0 || target < 0 || target as usize >= count {
            return;
        }
        self.selection_anchor = None;
        self.cursor = DocCursor {
            region: target as usize,
            offset: 0,
        };
    }

    fn move_word_forward(&mut self) {
        let chars = self.region_chars();
        let mut offset = self.cursor.offset;
        while offset < chars.len() && !chars[offset].is_whitespace() {
            offset += 1;
        }
        while offset < chars.len() && chars[offset].is_whitespace() {
            offset += 1;
        }
        self.cursor.offset = offset.min(chars.len().saturating_sub(1));
    }

    fn move_word_back(&mut self) {
        let chars = self.region_chars();
        let mut offset = self.cursor.offset.min(chars.len());
        while offset > 0 && chars[offset - 1].is_whitespace() {
            offset -= 1;
        }
        while offset > 0 && !chars[offset - 1].is_whitespace() {
            offset -= 1;
        }
        self.cursor.offset = offset;
    }

    fn toggle_selection(&mut self) {
        self.selection_anchor = match self.selection_anchor {
            Some(_) => None,
            None if self.region_len() > 0 => Some(self.cursor.offset),
            None => None,
        };
    }

    /// Inclusive of the character under the cursor.
    fn selection_range(&self) -> Option<TextRange> {
        let anchor = self.selection_anchor?;
        let (start, end) = (anchor.min(self.cursor.offset), anchor.max(self.cursor.offset));
        Some(TextRange::new(start, (end + 1).min(self.region_len())))
    }

    fn highlight_selection(&mut self) {
        let range = self.selection_range();
        self.selection_anchor = None;
        let (Some(range), Some(field)) = (range, self.cursor_field()) else {
            return;
        };
        self.workspace.set_selection(field, range);
        if self.workspace.highlight_selection() {
            self.set_toast("Highlighted");
        } else {
            self.set_toast("Cannot highlight there: the selection overlaps a highlight or formatting");
        }
    }

    fn click_at_cursor(&mut self) {
        let Some(field) = self.cursor_field() else {
            return;
        };
        if !self.workspace.click(field, self.cursor.offset) {
            self.set_toast("Press v to start a selection");
        }
    }

    /// Resets the caret when a different record is shown and keeps it inside the document.
    fn sync_document(&mut self) {
        let shown = self.workspace.presentation().map(|p| p.analysis_id().clone());
        if shown != self.shown {
            self.shown = shown;
            self.cursor = DocCursor::default();
            self.selection_anchor = None;
            self.doc_scroll = 0;
        }

        let regions = self.region_count();
        if self.cursor.region >= regions {
            self.cursor = DocCursor::default();
        }
        self.cursor.offset = self.cursor.offset.min(self.region_len().saturating_sub(1));

        let len = self.history_ids().len();
        if self.history_cursor >= len {
            self.history_cursor = len.saturating_sub(1);
        }
    }

    fn scroll_to_row(&mut self, row: usize, height: usize) {
        let height = height.max(1);
        let scroll = usize::from(self.doc_scroll);
        let scroll = if row < scroll {
            row
        } else if row >= scroll + height {
            row + 1 - height
        } else {
            scroll
        };
        self.doc_scroll = u16::try_from(scroll).unwrap_or(u16::MAX);
    }

    fn set_toast(&mut self, message: impl Into<String>) {
        self.toast = Some(Toast {
            message: message.into(),
            expires_at: Instant::now() + TOAST_TTL,
        });
    }

    /// The live toast as a footer suffix; expired toasts are dropped.
    fn toast_suffix(&mut self) -> String {
        match &self.toast {
            Some(toast) if toast.expires_at > Instant::now() => format!(" | {}", toast.message),
            Some(_) => {
                self.toast = None;
                String::new()
            }
            None => String::new(),
        }
    }
}

struct TerminalSession {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalSession {
    fn new() -> Result<Self, Box<dyn Error>> {
        enable_raw_mode()?;

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableBracketedPaste).map_err(|err| {
            teardown_terminal();
            err
        })?;

        let mut terminal = Terminal::new(CrosstermBackend::new(stdout)).map_err(|err| {
            teardown_terminal();
            err
        })?;
        terminal.clear().map_err(|err| {
            teardown_terminal();
            err
        })?;
        Ok(Self { terminal })
    }

    fn draw(&mut self, draw_fn: impl FnOnce(&mut Frame<'_>)) -> io::Result<()> {
        self.terminal.draw(draw_fn)?;
        Ok(())
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = self.terminal.show_cursor();
        teardown_terminal();
    }
}

fn teardown_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), DisableBracketedPaste, LeaveAlternateScreen);
}

fn copy_to_clipboard(text: &str) -> Result<&'static str, String> {
    execute!(io::stdout(), Print(osc52_sequence(text))).map_err(|err| err.to_string())?;
    Ok("osc52")
}

fn osc52_sequence(text: &str) -> String {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;

    format!("\x1b]52;c;{}\x1b\\", STANDARD.encode(text.as_bytes()))
}

/// How a regular search query matches: as a case-insensitive regex, or as a plain substring
/// when the query is not a valid pattern.
enum Matcher {
    Pattern(Regex),
    Literal(String),
}

impl Matcher {
    fn new(query: &str) -> Self {
        match RegexBuilder::new(query).case_insensitive(true).build() {
            Ok(regex) => Self::Pattern(regex),
            Err(_) => Self::Literal(query.to_lowercase()),
        }
    }

    /// Byte range of the first match.
    fn find(&self, haystack: &str) -> Option<(usize, usize)> {
        match self {
            Self::Pattern(regex) => regex.find(haystack).map(|m| (m.start(), m.end())),
            Self::Literal(needle) => haystack.find(needle.as_str()).map(|start| (start, start + needle.len())),
        }
    }
}

/// Candidate ids ordered best first; ties keep list order (newest first).
fn ranked_search_results(candidates: &[SearchCandidate], query: &str, kind: SearchKind) -> Vec<AnalysisId> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    let lowered = query.to_lowercase();
    let matcher = (kind == SearchKind::Regular).then(|| Matcher::new(query));
    let mut scored = candidates
        .iter()
        .enumerate()
        .filter_map(|(index, candidate)| {
            let score = match &matcher {
                Some(matcher) => regular_score(matcher, &candidate.haystack),
                None => fuzzy_score(&lowered, &candidate.haystack),
            }?;
            Some((score, index))
        })
        .collect::<Vec<_>>();
    scored.sort_by(|(score_a, index_a), (score_b, index_b)| score_b.cmp(score_a).then(index_a.cmp(index_b)));
    scored.into_iter().map(|(_, index)| candidates[index].id.clone()).collect()
}

fn regular_score(matcher: &Matcher, haystack: &str) -> Option<i64> {
    let (start, end) = matcher.find(haystack)?;
    let at_start = start == 0;
    let on_boundary = at_start || haystack[..start].chars().next_back().is_some_and(is_boundary_char);

    let mut score = 100_000 - start as i64 * 500 - haystack.chars().count() as i64;
    if at_start {
        score += 40_000;
    }
    if on_boundary {
        score += 15_000;
    }
    if end - start == haystack.len() {
        score += 80_000;
    }
    Some(score)
}

fn fuzzy_score(needle: &str, haystack: &str) -> Option<i64> {
    let stats = subsequence_stats(needle, haystack)?;
    let ratio = rapidfuzz::fuzz::ratio(needle.chars(), haystack.chars());

    let mut score = (ratio * 1000.0).round() as i64;
    score += stats.adjacent as i64 * 40;
    score -= stats.span as i64 + stats.first as i64 / 4;
    if stats.boundary_start {
        score += 150;
    }
    score += if haystack.contains(needle) { 2000 } else { 500 };
    Some(score)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SubsequenceStats {
    /// Char index of the first matched character.
    first: usize,
    /// Chars from the first to the last match, inclusive.
    span: usize,
    /// Matches directly following the previous match.
    adjacent: usize,
    boundary_start: bool,
}

/// Matches `needle` as an in-order subsequence of `haystack`, taking the earliest position for
/// every character.
fn subsequence_stats(needle: &str, haystack: &str) -> Option<SubsequenceStats> {
    let wanted = needle.chars().collect::<Vec<_>>();
    let (&head, _) = wanted.split_first()?;
    let hay = haystack.chars().collect::<Vec<_>>();

    let first = hay.iter().position(|&ch| ch == head)?;
    let mut last = first;
    let mut adjacent = 0;
    for &ch in &wanted[1..] {
        let next = last + 1 + hay[last + 1..].iter().position(|&candidate| candidate == ch)?;
        if next == last + 1 {
            adjacent += 1;
        }
        last = next;
    }

    Some(SubsequenceStats {
        first,
        span: last - first + 1,
        adjacent,
        boundary_start: first == 0 || is_boundary_char(hay[first - 1]),
    })
}

fn is_boundary_char(ch: char) -> bool {
    matches!(ch, ' ' | ':' | '-' | '_' | '/' | '(' | ',')
}

#[cfg(test)]
mod tests;
