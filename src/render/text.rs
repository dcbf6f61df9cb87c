// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Infolens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Infolens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use crate::model::AnnotationId;
use crate::rich_text::{HighlightColor, Region};

pub fn truncate_with_ellipsis(text: &str, max_len: usize) -> String {
    if max_len == 0 {
        return String::new();
    }

    let len = text.chars().count();
    if len <= max_len {
        return text.to_owned();
    }

    if max_len == 1 {
        return "…".to_owned();
    }

    let mut out: String = text.chars().take(max_len - 1).collect();
    out.push('…');
    out
}

/// One character cell of a wrapped region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    /// Character offset in the region's text content.
    pub offset: usize,
    pub highlight: Option<(AnnotationId, HighlightColor)>,
    pub bold: bool,
    pub italic: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WrappedLine {
    pub cells: Vec<Cell>,
}

impl WrappedLine {
    pub fn text(&self) -> String {
        self.cells.iter().map(|cell| cell.ch).collect()
    }

    /// Offset of the first cell, or `None` for an empty line.
    pub fn start(&self) -> Option<usize> {
        self.cells.first().map(|cell| cell.offset)
    }
}

/// Word-wraps a region to `width` columns.
///
/// Lines break after the last space that fits; a word longer than the line is split. `<br>`
/// starts a new line. Every character of the region lands in exactly one cell, so offsets can
/// be mapped back and forth between the text and the screen.
pub fn wrap_region(region: &Region, width: usize) -> Vec<WrappedLine> {
    let cells = region.styled_runs().into_iter().flat_map(|run| {
        let breaks = run.line_break.then_some(None);
        let chars = run
            .text
            .chars()
            .enumerate()
            .map(|(i, ch)| {
                Some(Cell {
                    ch,
                    offset: run.start + i,
                    highlight: run.highlight.clone(),
                    bold: run.bold,
                    italic: run.italic,
                })
            })
            .collect::<Vec<_>>();
        breaks.into_iter().chain(chars)
    });
    wrap_cells(cells, width)
}

/// Word-wraps plain text; `\n` starts a new line.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let cells = text.chars().enumerate().map(|(offset, ch)| {
        (ch != '\n').then_some(Cell {
            ch,
            offset,
            highlight: None,
            bold: false,
            italic: false,
        })
    });
    wrap_cells(cells, width).iter().map(WrappedLine::text).collect()
}

/// `None` items are forced line breaks.
fn wrap_cells(cells: impl IntoIterator<Item = Option<Cell>>, width: usize) -> Vec<WrappedLine> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut line = WrappedLine::default();

    for cell in cells {
        let Some(mut cell) = cell else {
            lines.push(std::mem::take(&mut line));
            continue;
        };
        if cell.ch.is_control() {
            cell.ch = ' ';
        }
        if line.cells.len() == width {
            let split = line
                .cells
                .iter()
                .rposition(|c| c.ch == ' ')
                .filter(|&pos| pos + 1 < line.cells.len())
                .map(|pos| pos + 1);
            let carry = match split {
                Some(pos) => line.cells.split_off(pos),
                None => Vec::new(),
            };
            lines.push(std::mem::replace(&mut line, WrappedLine { cells: carry }));
        }
        line.cells.push(cell);
    }
    lines.push(line);
    lines
}

#[cfg(test)]
mod tests {
    use super::{truncate_with_ellipsis, wrap_region, wrap_text};
    use crate::model::{FieldRef, RichText};
    use crate::rich_text::Region;

    fn region(html: &str) -> Region {
        Region::parse(FieldRef::Summary, &RichText::from_html(html)).unwrap()
    }

    #[test]
    fn truncate_with_ellipsis_handles_small_widths() {
        assert_eq!(truncate_with_ellipsis("hello", 0), "");
        assert_eq!(truncate_with_ellipsis("hello", 1), "…");
        assert_eq!(truncate_with_ellipsis("h", 1), "h");
        assert_eq!(truncate_with_ellipsis("αβγ", 2), "α…");
    }

    #[test]
    fn wraps_at_word_boundaries_and_keeps_offsets() {
        let lines = wrap_region(&region("alpha beta gamma"), 8);
        let texts: Vec<_> = lines.iter().map(|l| l.text()).collect();
        assert_eq!(texts, vec!["alpha ", "beta ", "gamma"]);
        assert_eq!(lines[1].start(), Some(6));
        assert_eq!(lines[2].start(), Some(11));
    }

    #[test]
    fn splits_words_longer_than_the_line() {
        let texts: Vec<_> = wrap_region(&region("abcdefgh"), 3).iter().map(|l| l.text()).collect();
        assert_eq!(texts, vec!["abc", "def", "gh"]);
    }

    #[test]
    fn line_breaks_and_highlights_carry_through() {
        let lines = wrap_region(
            &region("one<br><span id=\"h\" class=\"highlight\" style=\"background-color:red\">two</span>"),
            40,
        );
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].text(), "two");
        assert!(lines[1].cells.iter().all(|cell| cell.highlight.is_some()));
        assert_eq!(lines[1].start(), Some(3));
    }

    #[test]
    fn wraps_plain_text_with_newlines() {
        assert_eq!(wrap_text("ab cd\nef", 3), vec!["ab ", "cd", "ef"]);
    }
}
