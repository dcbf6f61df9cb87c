// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Infolens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Infolens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Rendering a presentation to an image file.
//!
//! [`ImageRenderer`] is the render-to-image capability; [`SvgRenderer`] lays the presentation out
//! on a monospace grid, the same grid the terminal view uses, and draws highlight backgrounds
//! behind the wrapped text.

use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::model::FieldRef;
use crate::render::{wrap_region, wrap_text, Block, Cell, Presentation};
use crate::rich_text::HighlightColor;
use crate::store::{write_atomic, StoreError, WriteDurability};

const FALLBACK_STEM: &str = "infographic";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no analysis is selected")]
    NothingSelected,
    #[error("failed to render image: {0}")]
    Render(#[from] fmt::Error),
    #[error("failed to write export: {0}")]
    Write(#[from] StoreError),
}

/// Turns a presentation into the bytes of one image file.
///
/// The format is up to the implementation, vector or raster; [`ImageRenderer::extension`] names it
/// and becomes the exported file's extension.
pub trait ImageRenderer {
    /// File extension without the dot.
    fn extension(&self) -> &'static str;

    fn render(&self, presentation: &Presentation) -> Result<Vec<u8>, ExportError>;
}

/// Lowercased title with every character outside `[a-z0-9]` replaced by `_`, plus the extension.
pub fn export_filename(title: &str, extension: &str) -> String {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    let unsafe_chars = UNSAFE.get_or_init(|| Regex::new(r"(?i)[^a-z0-9]").expect("filename pattern is valid"));

    let stem = unsafe_chars.replace_all(title.trim(), "_").to_lowercase();
    let stem = if stem.is_empty() { FALLBACK_STEM } else { stem.as_str() };
    format!("{stem}.{extension}")
}

/// Renders `presentation` and writes it atomically into `dir`, creating the directory.
pub fn export_to_dir(
    dir: &Path,
    presentation: &Presentation,
    renderer: &dyn ImageRenderer,
    durability: WriteDurability,
) -> Result<PathBuf, ExportError> {
    let bytes = renderer.render(presentation)?;
    std::fs::create_dir_all(dir).map_err(|source| StoreError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(export_filename(presentation.title(), renderer.extension()));
    write_atomic(&path, &bytes, durability)?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "exported presentation");
    Ok(path)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Title,
    Heading,
    Body,
    Muted,
    Accent,
}

#[derive(Debug)]
struct Line {
    indent: usize,
    marker: Option<char>,
    tone: Tone,
    cells: Vec<Cell>,
}

#[derive(Debug, Clone)]
pub struct SvgRenderer {
    /// Text columns, excluding the margin.
    pub columns: usize,
    pub cell_width: f32,
    pub cell_height: f32,
    pub font_size: f32,
    pub font_family: String,
    pub background: &'static str,
}

impl Default for SvgRenderer {
    fn default() -> Self {
        Self {
            columns: 80,
            cell_width: 8.4,
            cell_height: 20.0,
            font_size: 14.0,
            font_family: "monospace".into(),
            background: "#0f172a",
        }
    }
}

impl ImageRenderer for SvgRenderer {
    fn extension(&self) -> &'static str {
        "svg"
    }

    fn render(&self, presentation: &Presentation) -> Result<Vec<u8>, ExportError> {
        let lines = layout(presentation, self.columns.max(8));
        let mut out = String::with_capacity(lines.len() * 160);
        self.write_svg(&lines, &mut out)?;
        Ok(out.into_bytes())
    }
}

impl SvgRenderer {
    const MARGIN: usize = 2;

    fn write_svg(&self, lines: &[Line], out: &mut String) -> fmt::Result {
        let width = (self.columns + 2 * Self::MARGIN) as f32 * self.cell_width;
        let height = (lines.len() + 2) as f32 * self.cell_height;

        write!(
            out,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.1}\" height=\"{height:.1}\" \
             viewBox=\"0 0 {width:.1} {height:.1}\">"
        )?;
        write!(out, "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>", self.background)?;
        write!(
            out,
            "<g font-family=\"{}\" font-size=\"{}\" xml:space=\"preserve\">",
            svg_escape(&self.font_family),
            self.font_size
        )?;

        for (row, line) in lines.iter().enumerate() {
            let top = (row + 1) as f32 * self.cell_height;
            let baseline = top + self.font_size;
            let fill = tone_fill(line.tone);

            if let Some(marker) = line.marker {
                let x = (Self::MARGIN + line.indent.saturating_sub(2)) as f32 * self.cell_width;
                write!(out, "<text x=\"{x:.1}\" y=\"{baseline:.1}\" fill=\"{}\">{marker}</text>", tone_fill(Tone::Accent))?;
            }

            let mut column = Self::MARGIN + line.indent;
            for run in runs(&line.cells) {
                let x = column as f32 * self.cell_width;
                let run_width = run.text.chars().count() as f32 * self.cell_width;

                if let Some(color) = run.highlight {
                    write!(
                        out,
                        "<rect x=\"{x:.1}\" y=\"{top:.1}\" width=\"{run_width:.1}\" height=\"{:.1}\" {}/>",
                        self.cell_height,
                        highlight_fill(color)
                    )?;
                }

                write!(out, "<text x=\"{x:.1}\" y=\"{baseline:.1}\" fill=\"{fill}\"")?;
                if run.bold || line.tone == Tone::Title || line.tone == Tone::Heading {
                    out.push_str(" font-weight=\"bold\"");
                }
                if run.italic {
                    out.push_str(" font-style=\"italic\"");
                }
                write!(out, ">{}</text>", svg_escape(&run.text))?;
                column += run.text.chars().count();
            }
        }

        out.push_str("</g></svg>\n");
        Ok(())
    }
}

struct Run<'a> {
    text: String,
    highlight: Option<&'a HighlightColor>,
    bold: bool,
    italic: bool,
}

/// Groups adjacent cells with identical styling.
fn runs(cells: &[Cell]) -> Vec<Run<'_>> {
    let mut out: Vec<Run<'_>> = Vec::new();
    for cell in cells {
        let highlight = cell.highlight.as_ref().map(|(_, color)| color);
        if let Some(run) = out
            .last_mut()
            .filter(|run| run.highlight == highlight && run.bold == cell.bold && run.italic == cell.italic)
        {
            run.text.push(cell.ch);
            continue;
        }
        out.push(Run {
            text: cell.ch.to_string(),
            highlight,
            bold: cell.bold,
            italic: cell.italic,
        });
    }
    out
}

fn layout(presentation: &Presentation, columns: usize) -> Vec<Line> {
    let mut lines = Vec::new();
    for block in presentation.blocks() {
        match block {
            Block::Title(title) => push_plain(&mut lines, title, 0, Tone::Title, columns),
            Block::Heading(heading) => {
                if !lines.is_empty() {
                    push_blank(&mut lines);
                }
                push_plain(&mut lines, heading, 0, Tone::Heading, columns);
            }
            Block::Stats(group) => {
                push_plain(&mut lines, group.group_name(), 0, Tone::Accent, columns);
                for stat in group.stats() {
                    push_plain(&mut lines, &format!("{}  {}", stat.value(), stat.label()), 2, Tone::Body, columns);
                }
            }
            Block::InsightHeader {
                category,
                syllabus_description,
            } => {
                let header = format!("{} · {}", category.label(), syllabus_description);
                push_plain(&mut lines, &header, 0, Tone::Accent, columns);
            }
            Block::Field { field, caption } => {
                let Some(region) = presentation.region(*field) else {
                    continue;
                };
                let (indent, marker) = match field {
                    FieldRef::Summary => (0, None),
                    FieldRef::Fact(_) | FieldRef::InsightPoint { .. } => (2, Some('•')),
                };
                for (index, cells) in wrap_region(region, columns - indent).into_iter().enumerate() {
                    lines.push(Line {
                        indent,
                        marker: marker.filter(|_| index == 0),
                        tone: Tone::Body,
                        cells: cells.cells,
                    });
                }
                if let Some(caption) = caption {
                    push_plain(&mut lines, caption, indent, Tone::Muted, columns);
                }
            }
        }
    }
    lines
}

fn push_plain(lines: &mut Vec<Line>, text: &str, indent: usize, tone: Tone, columns: usize) {
    for row in wrap_text(text, columns.saturating_sub(indent)) {
        lines.push(Line {
            indent,
            marker: None,
            tone,
            cells: plain_cells(&row),
        });
    }
}

fn push_blank(lines: &mut Vec<Line>) {
    lines.push(Line {
        indent: 0,
        marker: None,
        tone: Tone::Body,
        cells: Vec::new(),
    });
}

fn plain_cells(text: &str) -> Vec<Cell> {
    text.chars()
        .enumerate()
        .map(|(offset, ch)| Cell {
            ch,
            offset,
            highlight: None,
            bold: false,
            italic: false,
        })
        .collect()
}

fn tone_fill(tone: Tone) -> &'static str {
    match tone {
        Tone::Title => "#f8fafc",
        Tone::Heading => "#38bdf8",
        Tone::Body => "#e2e8f0",
        Tone::Muted => "#94a3b8",
        Tone::Accent => "#c084fc",
    }
}

fn highlight_fill(color: &HighlightColor) -> String {
    match color.rgba() {
        Some((r, g, b, alpha)) => format!("fill=\"#{r:02x}{g:02x}{b:02x}\" fill-opacity=\"{alpha}\""),
        None => format!("fill=\"{}\"", svg_escape(color.as_str())),
    }
}

fn svg_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{export_filename, export_to_dir, ExportError, ImageRenderer, SvgRenderer};
    use crate::model::fixtures::single_insight_analysis;
    use crate::model::{Analysis, AnalysisId, FieldRef, RichText};
    use crate::render::Presentation;
    use crate::store::WriteDurability;
    use crate::test_support::TempDir;

    fn svg(analysis: &Analysis) -> String {
        let bytes = SvgRenderer::default()
            .render(&Presentation::from_analysis(analysis))
            .unwrap();
        String::from_utf8(bytes).unwrap()
    }

    #[rstest]
    #[case("Monsoon Outlook 2024!", "monsoon_outlook_2024_.svg")]
    #[case("  JWST: First Light  ", "jwst__first_light.svg")]
    #[case("Économie", "_conomie.svg")]
    #[case("", "infographic.svg")]
    fn filenames_are_sanitized(#[case] title: &str, #[case] expected: &str) {
        assert_eq!(export_filename(title, "svg"), expected);
    }

    #[test]
    fn svg_has_document_structure_and_sections() {
        let out = svg(&single_insight_analysis());
        assert!(out.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\""));
        assert!(out.ends_with("</g></svg>\n"));
        assert!(out.contains(">Monsoon Outlook</text>"));
        assert!(out.contains(">Key Facts</text>"));
        assert!(out.contains("xml:space=\"preserve\""));
    }

    #[test]
    fn highlights_become_translucent_rects() {
        let mut analysis = single_insight_analysis();
        *FieldRef::Summary.resolve_mut(&mut analysis).unwrap() = RichText::from_html(
            "A <span id=\"h-1\" class=\"highlight\" style=\"background-color:rgba(250, 204, 21, 0.4)\">wet</span> year.",
        );
        let out = svg(&analysis);
        assert!(out.contains("fill=\"#facc15\" fill-opacity=\"0.4\""));
        assert!(out.contains(">wet</text>"));
    }

    #[test]
    fn text_is_escaped_and_inline_styles_survive() {
        let analysis = Analysis::new(
            AnalysisId::new("esc").unwrap(),
            "R&D <2024>",
            RichText::from_html("plain <b>bold</b> <em>soft</em>"),
            Vec::new(),
            Vec::new(),
            Vec::new(),
        );
        let out = svg(&analysis);
        assert!(out.contains(">R&amp;D &lt;2024&gt;</text>"));
        assert!(out.contains("font-weight=\"bold\">bold</text>"));
        assert!(out.contains("font-style=\"italic\">soft</text>"));
    }

    #[test]
    fn export_writes_into_the_directory() {
        let tmp = TempDir::new("export");
        let dir = tmp.path().join("exports");
        let presentation = Presentation::from_analysis(&single_insight_analysis());
        let path = export_to_dir(&dir, &presentation, &SvgRenderer::default(), WriteDurability::BestEffort).unwrap();
        assert_eq!(path, dir.join("monsoon_outlook.svg"));
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("<svg"));
    }

    struct RasterStub;

    impl ImageRenderer for RasterStub {
        fn extension(&self) -> &'static str {
            "png"
        }

        fn render(&self, _presentation: &Presentation) -> Result<Vec<u8>, ExportError> {
            Ok(b"\x89PNG\r\n\x1a\n".to_vec())
        }
    }

    #[test]
    fn binary_formats_export_under_their_own_extension() {
        let tmp = TempDir::new("export-raster");
        let presentation = Presentation::from_analysis(&single_insight_analysis());
        let path = export_to_dir(tmp.path(), &presentation, &RasterStub, WriteDurability::BestEffort).unwrap();
        assert_eq!(path, tmp.path().join("monsoon_outlook.png"));
        assert_eq!(std::fs::read(&path).unwrap(), b"\x89PNG\r\n\x1a\n");
    }
}
