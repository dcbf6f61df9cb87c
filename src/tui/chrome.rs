// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Infolens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Infolens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

/// Pane layout, titles, footer and help overlay.
fn stack_panes_vertically(area: Rect) -> bool {
    area.width < 90
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    History,
    Document,
}

impl Focus {
    fn toggle(self) -> Self {
        match self {
            Self::History => Self::Document,
            Self::Document => Self::History,
        }
    }
}

fn panel_border_style_for_focus(active: Focus, panel: Focus) -> Style {
    if active == panel {
        Style::default().fg(FOCUS_COLOR)
    } else {
        Style::default()
    }
}

fn view_title(label: &str, key: char, tail: Option<&str>) -> String {
    match tail.map(str::trim).filter(|tail| !tail.is_empty()) {
        Some(tail) => format!("─[{key}]─ {label} {tail} "),
        None => format!("─[{key}]─ {label} "),
    }
}

fn footer_help_line(app: &App, toast_suffix: &str) -> Line<'static> {
    let mut spans = Vec::<Span<'static>>::new();
    let has_record = app.workspace.presentation().is_some();

    if app.workspace.dialog().is_open() {
        push_footer_entry_maybe_disabled(&mut spans, "generate", "Enter", !app.workspace.dialog().can_submit());
        push_footer_entry(&mut spans, "close", "Esc");
    } else if app.workspace.picker().is_open() {
        push_footer_entry(&mut spans, "color", "1-5");
        push_footer_entry(&mut spans, "delete", "x");
        push_footer_entry(&mut spans, "close", "Esc");
    } else {
        match app.focus {
            Focus::History => {
                push_footer_entry(&mut spans, "open", "Enter");
                push_footer_entry(&mut spans, "delete", "d");
                push_footer_entry(&mut spans, "search", "/ \\");
            }
            Focus::Document => {
                let selecting = app.selection_anchor.is_some();
                push_footer_entry(&mut spans, "move", "hjkl wb");
                push_footer_entry(&mut spans, if selecting { "cancel" } else { "select" }, if selecting { "Esc" } else { "v" });
                push_footer_entry_maybe_disabled(
                    &mut spans,
                    if selecting { "highlight" } else { "edit highlight" },
                    "Enter",
                    !has_record,
                );
            }
        }
        push_footer_entry(&mut spans, "new", "n");
        push_footer_entry_maybe_disabled(&mut spans, "copy", "y", !has_record);
        push_footer_entry_maybe_disabled(&mut spans, "export", "e", !has_record);
        push_footer_entry(&mut spans, "help", "?");
        push_footer_entry(&mut spans, "quit", "q");
    }

    push_toast(&mut spans, toast_suffix);
    Line::from(spans)
}

fn search_footer_line(app: &App, toast_suffix: &str) -> Line<'static> {
    let mut spans = vec![
        Span::styled(app.search_prefix().to_string(), help_key_style()),
        Span::raw(app.search_query.clone()),
        Span::raw("   "),
    ];
    if let Some(results) = &app.search_results {
        let label = match results.len() {
            0 => "no matches".to_owned(),
            1 => "1 match".to_owned(),
            n => format!("{n} matches"),
        };
        spans.push(Span::styled(label, Style::default().fg(FOCUS_COLOR)));
    }

    if app.search_mode == SearchMode::Results {
        push_footer_entry(&mut spans, "next", "n/N");
        push_footer_entry(&mut spans, "open", "Enter");
        push_footer_entry(&mut spans, "clear", "Esc");
    } else {
        push_footer_entry(&mut spans, "keep", "Enter");
        push_footer_entry(&mut spans, "cancel", "Esc");
    }
    push_toast(&mut spans, toast_suffix);
    Line::from(spans)
}

fn push_toast(spans: &mut Vec<Span<'static>>, toast_suffix: &str) {
    let message = toast_suffix.trim_start_matches(" | ").trim();
    if message.is_empty() {
        return;
    }
    spans.push(Span::styled(" | ", Style::default().fg(FOOTER_LABEL_COLOR)));
    spans.push(Span::styled(message.to_owned(), Style::default().fg(Color::Yellow)));
}

fn footer_brand_line() -> Line<'static> {
    Line::from(Span::styled(FOOTER_BRAND, Style::default().fg(FOOTER_BRAND_COLOR)))
}

fn help_key_style() -> Style {
    Style::default().fg(FOOTER_KEY_COLOR).add_modifier(Modifier::BOLD)
}

fn help_header_style() -> Style {
    Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
}

fn centered_rect(width_percent: u16, height_percent: u16, area: Rect) -> Rect {
    let width = (u32::from(area.width) * u32::from(width_percent.min(100)) / 100) as u16;
    let height = (u32::from(area.height) * u32::from(height_percent.min(100)) / 100) as u16;
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn help_kv(key: &str, desc: &str, key_width: usize) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{key:>key_width$}"), help_key_style()),
        Span::raw("  "),
        Span::raw(desc.to_owned()),
    ])
}

const HELP_SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Global",
        &[
            ("Tab, 1, 2", "Switch between history and infographic"),
            ("n", "New analysis from text"),
            ("/", "Search titles (regex, falls back to plain text)"),
            ("\\", "Fuzzy search titles"),
            ("y", "Copy the infographic as plain text (OSC 52)"),
            ("e", "Export the infographic as SVG"),
            ("?", "Toggle this help"),
            ("q, Ctrl-C", "Quit"),
        ],
    ),
    (
        "History",
        &[
            ("j/k, ↑/↓", "Move"),
            ("g/G", "First / last"),
            ("Enter, o", "Open"),
            ("d, Del", "Delete"),
            ("n/N", "Next / previous match after a search"),
        ],
    ),
    (
        "Infographic",
        &[
            ("h/l, ←/→", "Move by character"),
            ("w/b", "Move by word"),
            ("j/k, ↑/↓", "Next / previous text block"),
            ("0/$", "Start / end of block"),
            ("v", "Start or cancel a selection"),
            ("Enter", "Highlight the selection, or edit the highlight under the cursor"),
        ],
    ),
    (
        "Highlight popup",
        &[("1-5", "Green, yellow, red, blue, purple"), ("x", "Remove highlight"), ("Esc", "Close")],
    ),
    (
        "New analysis",
        &[
            ("Enter", "Generate"),
            ("Ctrl-E", "Load example text"),
            ("Ctrl-U", "Clear input"),
            ("Esc", "Close; a running request is discarded"),
        ],
    ),
];

fn render_help(frame: &mut Frame<'_>, app: &mut App, main_area: Rect) {
    let area = centered_rect(76, 80, main_area);
    frame.render_widget(Clear, area);

    let key_width = HELP_SECTIONS
        .iter()
        .flat_map(|(_, entries)| entries.iter())
        .map(|(key, _)| key.chars().count())
        .max()
        .unwrap_or(0);

    let mut lines = Vec::<Line<'static>>::new();
    for (index, (section, entries)) in HELP_SECTIONS.iter().enumerate() {
        if index > 0 {
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(section.to_string(), help_header_style())));
        lines.extend(entries.iter().map(|(key, desc)| help_kv(key, desc, key_width)));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(FOCUS_COLOR))
        .title(" Help ");
    let inner = block.inner(area);
    let max_scroll = lines.len().saturating_sub(usize::from(inner.height.max(1)));
    app.help_scroll = app.help_scroll.min(u16::try_from(max_scroll).unwrap_or(u16::MAX));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.help_scroll, 0));
    frame.render_widget(paragraph, area);
}

fn push_footer_entry(spans: &mut Vec<Span<'static>>, label: &str, key: &str) {
    push_footer_entry_maybe_disabled(spans, label, key, false);
}

fn push_footer_entry_maybe_disabled(spans: &mut Vec<Span<'static>>, label: &str, key: &str, disabled: bool) {
    if !spans.is_empty() {
        spans.push(Span::styled(" | ", Style::default().fg(FOOTER_LABEL_COLOR)));
    }
    spans.push(Span::styled(format!("{}:", capitalize(label)), Style::default().fg(FOOTER_LABEL_COLOR)));
    let key_color = if disabled { MUTED_COLOR } else { FOOTER_KEY_COLOR };
    spans.push(Span::styled(
        key.to_owned(),
        Style::default().fg(key_color).add_modifier(Modifier::BOLD),
    ));
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
