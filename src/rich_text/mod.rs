// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Infolens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Infolens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! In-place rich-text highlighting.
//!
//! A RichText fragment is parsed into a small inline tree (`Text`, plain inline `Element`s and
//! `Highlight` spans), mutated as a tree, and serialized back to HTML after every operation.
//! Highlights never nest and never overlap; the engine rejects any selection that would break
//! that.
//!
//! Wire format of a highlight:
//! `<span id="highlight-<ts>-<rand>" class="highlight" style="background-color:<css-color>">…</span>`

pub mod color;
pub mod engine;
pub mod parse;
pub mod serialize;


use smol_str::SmolStr;

use crate::model::AnnotationId;

pub use color::{palette, HighlightColor, HighlightColorError, DEFAULT_HIGHLIGHT_COLOR, PALETTE};
pub use engine::{AnnotationEngine, AnnotationError, HighlightSpan, Region, StyledRun, TextRange};
pub use parse::{parse_fragment, ParseRichTextError};
pub use serialize::{escape_text, serialize_nodes};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(String),
    Element(Element),
    Highlight(Highlight),
}

impl Node {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Number of characters of text content below this node.
    pub fn text_len(&self) -> usize {
        match self {
            Self::Text(text) => text.chars().count(),
            Self::Element(element) => nodes_text_len(&element.children),
            Self::Highlight(highlight) => nodes_text_len(&highlight.children),
        }
    }

    fn push_text(&self, out: &mut String) {
        match self {
            Self::Text(text) => out.push_str(text),
            Self::Element(element) => element.children.iter().for_each(|c| c.push_text(out)),
            Self::Highlight(highlight) => highlight.children.iter().for_each(|c| c.push_text(out)),
        }
    }
}

/// A plain inline element (`<b>`, `<em>`, `<br>`, …). Never a highlight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: SmolStr,
    pub attrs: Vec<Attr>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn is_void(&self) -> bool {
        is_void_tag(&self.tag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub name: SmolStr,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlight {
    pub id: AnnotationId,
    pub color: HighlightColor,
    pub children: Vec<Node>,
}

pub(crate) fn nodes_text_len(nodes: &[Node]) -> usize {
    nodes.iter().map(Node::text_len).sum()
}

pub(crate) fn nodes_text(nodes: &[Node]) -> String {
    let mut out = String::new();
    nodes.iter().for_each(|node| node.push_text(&mut out));
    out
}

pub(crate) fn is_void_tag(tag: &str) -> bool {
    matches!(tag, "br" | "wbr" | "img" | "hr")
}

/// Merges adjacent text nodes and drops empty ones, recursively.
pub(crate) fn normalize(nodes: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::<Node>::with_capacity(nodes.len());
    for node in nodes {
        let node = match node {
            Node::Text(text) if text.is_empty() => continue,
            Node::Element(mut element) => {
                element.children = normalize(element.children);
                Node::Element(element)
            }
            Node::Highlight(mut highlight) => {
                highlight.children = normalize(highlight.children);
                Node::Highlight(highlight)
            }
            text @ Node::Text(_) => text,
        };

        match (out.last_mut(), node) {
            (Some(Node::Text(prev)), Node::Text(next)) => prev.push_str(&next),
            (_, node) => out.push(node),
        }
    }
    out
}

/// Plain text content of a RichText fragment, or `None` if it does not parse.
pub fn plain_text(html: &crate::model::RichText) -> Option<String> {
    parse_fragment(html.as_html()).ok().map(|nodes| nodes_text(&nodes))
}
