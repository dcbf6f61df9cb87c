// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Infolens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Infolens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::HashSet;
use std::fmt;

use rand::rngs::StdRng;
use rand::SeedableRng;
use smol_str::SmolStr;
use thiserror::Error;

use super::{
    nodes_text, nodes_text_len, normalize, parse_fragment, serialize_nodes, Highlight, HighlightColor, Node,
    ParseRichTextError,
};
use crate::model::{AnnotationId, FieldRef, RichText};

/// A half-open range of character offsets over a region's text content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextRange {
    start: usize,
    end: usize,
}

impl TextRange {
    /// Builds a range from the two ends of a selection, in either order.
    pub fn new(anchor: usize, focus: usize) -> Self {
        Self {
            start: anchor.min(focus),
            end: anchor.max(focus),
        }
    }

    pub fn start(self) -> usize {
        self.start
    }

    pub fn end(self) -> usize {
        self.end
    }

    pub fn len(self) -> usize {
        self.end - self.start
    }

    pub fn is_collapsed(self) -> bool {
        self.start == self.end
    }

    pub fn contains(self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    pub fn intersects(self, other: TextRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// One highlight as seen from the region's text content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightSpan {
    pub id: AnnotationId,
    pub color: HighlightColor,
    pub range: TextRange,
}

/// A run of text with uniform styling, for front-ends that draw a region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledRun {
    pub text: String,
    /// Character offset of the run's first character in the region.
    pub start: usize,
    pub highlight: Option<(AnnotationId, HighlightColor)>,
    pub bold: bool,
    pub italic: bool,
    /// `<br>`; carries no text.
    pub line_break: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnnotationError {
    #[error("selection is empty")]
    Collapsed,
    #[error("selection {range} is outside the region (length {len})")]
    OutOfBounds { range: TextRange, len: usize },
    #[error("selection {range} touches highlight {id}")]
    Overlap { range: TextRange, id: AnnotationId },
    #[error("selection would split <{tag}>")]
    SplitsElement { tag: SmolStr },
    #[error("no highlight {0} in this region")]
    NotFound(AnnotationId),
    #[error("region {0} holds markup that could not be parsed and is read-only")]
    ReadOnly(FieldRef),
}

/// One annotatable field, parsed into a tree for live editing.
///
/// The tree is working storage; [`Region::serialize`] produces the RichText that is
/// committed back to the record after every mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    field: FieldRef,
    nodes: Vec<Node>,
    editable: bool,
}

impl Region {
    pub fn parse(field: FieldRef, html: &RichText) -> Result<Self, ParseRichTextError> {
        Ok(Self {
            field,
            nodes: parse_fragment(html.as_html())?,
            editable: true,
        })
    }

    /// Like [`Region::parse`], but markup that does not parse is shown verbatim as text and
    /// the region refuses edits, so the stored value is never rewritten.
    pub fn load(field: FieldRef, html: &RichText) -> Self {
        match Self::parse(field, html) {
            Ok(region) => region,
            Err(err) => {
                tracing::warn!(field = %field, error = %err, "stored rich text does not parse; region is read-only");
                Self {
                    field,
                    nodes: vec![Node::text(html.as_html())],
                    editable: false,
                }
            }
        }
    }

    pub fn field(&self) -> FieldRef {
        self.field
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    pub fn text(&self) -> String {
        nodes_text(&self.nodes)
    }

    pub fn text_len(&self) -> usize {
        nodes_text_len(&self.nodes)
    }

    pub fn highlights(&self) -> Vec<HighlightSpan> {
        let mut out = Vec::new();
        collect_highlights(&self.nodes, 0, &mut out);
        out
    }

    pub fn contains_highlight(&self, id: &AnnotationId) -> bool {
        self.highlights().iter().any(|span| &span.id == id)
    }

    pub fn styled_runs(&self) -> Vec<StyledRun> {
        let mut out = Vec::new();
        collect_runs(&self.nodes, RunStyle::default(), &mut 0, &mut out);
        out
    }

    /// Current inner HTML. Never cached.
    pub fn serialize(&self) -> RichText {
        if !self.editable {
            if let [Node::Text(raw)] = self.nodes.as_slice() {
                return RichText::from_html(raw.clone());
            }
        }
        RichText::from_html(serialize_nodes(&self.nodes))
    }
}

fn collect_highlights(nodes: &[Node], mut pos: usize, out: &mut Vec<HighlightSpan>) -> usize {
    for node in nodes {
        match node {
            Node::Text(text) => pos += text.chars().count(),
            Node::Element(element) => pos = collect_highlights(&element.children, pos, out),
            Node::Highlight(highlight) => {
                let len = nodes_text_len(&highlight.children);
                out.push(HighlightSpan {
                    id: highlight.id.clone(),
                    color: highlight.color.clone(),
                    range: TextRange::new(pos, pos + len),
                });
                pos += len;
            }
        }
    }
    pos
}

#[derive(Debug, Clone, Default)]
struct RunStyle {
    highlight: Option<(AnnotationId, HighlightColor)>,
    bold: bool,
    italic: bool,
}

fn collect_runs(nodes: &[Node], style: RunStyle, pos: &mut usize, out: &mut Vec<StyledRun>) {
    for node in nodes {
        match node {
            Node::Text(text) => {
                out.push(StyledRun {
                    text: text.clone(),
                    start: *pos,
                    highlight: style.highlight.clone(),
                    bold: style.bold,
                    italic: style.italic,
                    line_break: false,
                });
                *pos += text.chars().count();
            }
            Node::Element(element) if element.tag == "br" => out.push(StyledRun {
                text: String::new(),
                start: *pos,
                highlight: style.highlight.clone(),
                bold: style.bold,
                italic: style.italic,
                line_break: true,
            }),
            Node::Element(element) => {
                let mut inner = style.clone();
                match element.tag.as_str() {
                    "b" | "strong" => inner.bold = true,
                    "i" | "em" => inner.italic = true,
                    _ => {}
                }
                collect_runs(&element.children, inner, pos, out);
            }
            Node::Highlight(highlight) => {
                let mut inner = style.clone();
                inner.highlight = Some((highlight.id.clone(), highlight.color.clone()));
                collect_runs(&highlight.children, inner, pos, out);
            }
        }
    }
}

/// Creates, finds, recolors and removes highlights inside [`Region`]s.
///
/// Every mutation is computed on a copy of the region's tree and swapped in only on
/// success, so a failed operation never leaves a partial edit behind.
#[derive(Debug)]
pub struct AnnotationEngine {
    rng: StdRng,
    issued: HashSet<AnnotationId>,
    default_color: HighlightColor,
}

impl Default for AnnotationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnotationEngine {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            rng,
            issued: HashSet::new(),
            default_color: HighlightColor::default(),
        }
    }

    pub fn default_color(&self) -> &HighlightColor {
        &self.default_color
    }

    /// Records the ids already present in `region` so fresh ids never collide with them.
    pub fn observe(&mut self, region: &Region) {
        self.issued.extend(region.highlights().into_iter().map(|span| span.id));
    }

    /// Drops every remembered id. Follow with [`AnnotationEngine::observe`] for the regions now shown.
    pub fn forget_issued(&mut self) {
        self.issued.clear();
    }

    fn fresh_id(&mut self, region: &Region) -> AnnotationId {
        loop {
            let id = AnnotationId::generate(&mut self.rng);
            if !self.issued.contains(&id) && !region.contains_highlight(&id) {
                self.issued.insert(id.clone());
                return id;
            }
        }
    }

    /// Wraps the selection in a new highlight with the default color.
    ///
    /// The selection is always cleared. Returns the region's new HTML, or `None` when the
    /// selection was collapsed or the operation was rejected (rejections are logged).
    pub fn create_highlight(&mut self, region: &mut Region, selection: &mut Option<TextRange>) -> Option<RichText> {
        let range = selection.take()?;
        match self.try_create_highlight(region, range) {
            Ok(html) => Some(html),
            Err(AnnotationError::Collapsed) => None,
            Err(err) => {
                tracing::warn!(field = %region.field(), range = %range, error = %err, "highlight rejected");
                None
            }
        }
    }

    pub fn try_create_highlight(&mut self, region: &mut Region, range: TextRange) -> Result<RichText, AnnotationError> {
        if !region.editable {
            return Err(AnnotationError::ReadOnly(region.field));
        }
        if range.is_collapsed() {
            return Err(AnnotationError::Collapsed);
        }
        let len = region.text_len();
        if range.end > len {
            return Err(AnnotationError::OutOfBounds { range, len });
        }
        if let Some(span) = region.highlights().into_iter().find(|span| span.range.intersects(range)) {
            return Err(AnnotationError::Overlap { range, id: span.id });
        }

        let mut highlight = Some(Highlight {
            id: self.fresh_id(region),
            color: self.default_color.clone(),
            children: Vec::new(),
        });
        let wrapped = wrap_range(region.nodes.clone(), range, &mut highlight)?;
        region.nodes = normalize(wrapped);
        Ok(region.serialize())
    }

    /// The highlight under `offset`, if any. Plain text yields `None`.
    pub fn find_annotation_at(&self, region: &Region, offset: usize) -> Option<HighlightSpan> {
        region.highlights().into_iter().find(|span| span.range.contains(offset))
    }

    pub fn recolor(&self, region: &mut Region, id: &AnnotationId, color: HighlightColor) -> Option<RichText> {
        self.try_recolor(region, id, color)
            .map_err(|err| {
                tracing::warn!(field = %region.field(), annotation_id = %id, error = %err, "recolor failed");
            })
            .ok()
    }

    pub fn try_recolor(
        &self,
        region: &mut Region,
        id: &AnnotationId,
        color: HighlightColor,
    ) -> Result<RichText, AnnotationError> {
        if !region.editable {
            return Err(AnnotationError::ReadOnly(region.field));
        }
        let highlight = find_highlight_mut(&mut region.nodes, id).ok_or_else(|| AnnotationError::NotFound(id.clone()))?;
        highlight.color = color;
        Ok(region.serialize())
    }

    pub fn remove(&self, region: &mut Region, id: &AnnotationId) -> Option<RichText> {
        self.try_remove(region, id)
            .map_err(|err| {
                tracing::warn!(field = %region.field(), annotation_id = %id, error = %err, "remove failed");
            })
            .ok()
    }

    /// Unwraps the highlight, splicing its children into its parent and merging text.
    pub fn try_remove(&self, region: &mut Region, id: &AnnotationId) -> Result<RichText, AnnotationError> {
        if !region.editable {
            return Err(AnnotationError::ReadOnly(region.field));
        }
        let (nodes, removed) = unwrap_highlight(region.nodes.clone(), id);
        if !removed {
            return Err(AnnotationError::NotFound(id.clone()));
        }
        region.nodes = normalize(nodes);
        Ok(region.serialize())
    }

    pub fn serialize(&self, region: &Region) -> RichText {
        region.serialize()
    }
}

/// Moves the characters in `range` into `highlight`, at the shallowest level whose
/// siblings can hold them without splitting an element.
fn wrap_range(
    nodes: Vec<Node>,
    range: TextRange,
    highlight: &mut Option<Highlight>,
) -> Result<Vec<Node>, AnnotationError> {
    let mut before = Vec::new();
    let mut inside = Vec::new();
    let mut after = Vec::new();
    let mut pos = 0usize;

    for node in nodes {
        let len = node.text_len();
        let (ns, ne) = (pos, pos + len);
        pos = ne;

        if len == 0 {
            if ns <= range.start {
                before.push(node);
            } else if ns >= range.end {
                after.push(node);
            } else {
                inside.push(node);
            }
            continue;
        }
        if ne <= range.start {
            before.push(node);
            continue;
        }
        if ns >= range.end {
            after.push(node);
            continue;
        }

        match node {
            Node::Text(text) => {
                let a = char_to_byte(&text, range.start.saturating_sub(ns));
                let b = char_to_byte(&text, range.end.min(ne) - ns);
                before.push(Node::text(&text[..a]));
                inside.push(Node::text(&text[a..b]));
                after.push(Node::text(&text[b..]));
            }
            Node::Element(element) if range.start <= ns && ne <= range.end => inside.push(Node::Element(element)),
            Node::Element(mut element) if ns <= range.start && range.end <= ne => {
                let inner = TextRange::new(range.start - ns, range.end - ns);
                element.children = wrap_range(element.children, inner, highlight)?;
                before.push(Node::Element(element));
            }
            Node::Element(element) => return Err(AnnotationError::SplitsElement { tag: element.tag }),
            Node::Highlight(existing) => {
                return Err(AnnotationError::Overlap {
                    range,
                    id: existing.id,
                })
            }
        }
    }

    if !inside.is_empty() {
        if let Some(mut wrapper) = highlight.take() {
            wrapper.children = inside;
            before.push(Node::Highlight(wrapper));
        }
    }
    before.extend(after);
    Ok(before)
}

fn char_to_byte(text: &str, chars: usize) -> usize {
    text.char_indices().nth(chars).map_or(text.len(), |(idx, _)| idx)
}

fn find_highlight_mut<'a>(nodes: &'a mut [Node], id: &AnnotationId) -> Option<&'a mut Highlight> {
    for node in nodes {
        match node {
            Node::Highlight(highlight) if &highlight.id == id => return Some(highlight),
            Node::Element(element) => {
                if let Some(found) = find_highlight_mut(&mut element.children, id) {
                    return Some(found);
                }
            }
            _ => {}
        }
    }
    None
}

fn unwrap_highlight(nodes: Vec<Node>, id: &AnnotationId) -> (Vec<Node>, bool) {
    let mut removed = false;
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Highlight(highlight) if !removed && &highlight.id == id => {
                removed = true;
                out.extend(highlight.children);
            }
            Node::Element(mut element) if !removed => {
                let (children, found) = unwrap_highlight(element.children, id);
                element.children = children;
                removed = found;
                out.push(Node::Element(element));
            }
            node => out.push(node),
        }
    }
    (out, removed)
}
