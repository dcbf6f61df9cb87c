// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Infolens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Infolens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt::Write as _;

use super::{Element, Highlight, Node};

/// Escapes text content for inclusion in a RichText fragment.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    push_escaped_text(&mut out, text);
    out
}

fn push_escaped_text(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            ch => out.push(ch),
        }
    }
}

fn push_escaped_attr(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            ch => out.push(ch),
        }
    }
}

/// Serializes an inline tree back to a RichText fragment.
pub fn serialize_nodes(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(&mut out, node);
    }
    out
}

fn write_node(out: &mut String, node: &Node) {
    match node {
        Node::Text(text) => push_escaped_text(out, text),
        Node::Element(element) => write_element(out, element),
        Node::Highlight(highlight) => write_highlight(out, highlight),
    }
}

fn write_element(out: &mut String, element: &Element) {
    out.push('<');
    out.push_str(&element.tag);
    for attr in &element.attrs {
        out.push(' ');
        out.push_str(&attr.name);
        out.push_str("=\"");
        push_escaped_attr(out, &attr.value);
        out.push('"');
    }
    out.push('>');
    if element.is_void() {
        return;
    }
    element.children.iter().for_each(|child| write_node(out, child));
    let _ = write!(out, "</{}>", element.tag);
}

fn write_highlight(out: &mut String, highlight: &Highlight) {
    let _ = write!(
        out,
        "<span id=\"{}\" class=\"highlight\" style=\"background-color:{}\">",
        highlight.id, highlight.color
    );
    highlight.children.iter().for_each(|child| write_node(out, child));
    out.push_str("</span>");
}
