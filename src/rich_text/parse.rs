// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Infolens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Infolens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use memchr::{memchr2, memmem};
use smol_str::SmolStr;
use thiserror::Error;

use super::{is_void_tag, normalize, Attr, Element, Highlight, HighlightColor, Node};
use crate::model::{AnnotationId, IdError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseRichTextError {
    #[error("malformed tag at byte {offset}")]
    MalformedTag { offset: usize },
    #[error("unexpected </{tag}> at byte {offset}")]
    UnexpectedEndTag { offset: usize, tag: String },
    #[error("unclosed <{tag}> opened at byte {offset}")]
    UnclosedElement { offset: usize, tag: String },
    #[error("highlight nested inside another highlight at byte {offset}")]
    NestedHighlight { offset: usize },
    #[error("highlight at byte {offset} has no id")]
    MissingHighlightId { offset: usize },
    #[error("highlight at byte {offset} has an invalid id: {source}")]
    InvalidHighlightId {
        offset: usize,
        #[source]
        source: IdError,
    },
    #[error("unterminated comment at byte {offset}")]
    UnterminatedComment { offset: usize },
}

enum FrameKind {
    Element { tag: SmolStr, attrs: Vec<Attr> },
    Highlight { id: AnnotationId, color: HighlightColor },
}

/// An open element awaiting its end tag.
struct Frame {
    kind: FrameKind,
    offset: usize,
    children: Vec<Node>,
}

impl Frame {
    fn tag(&self) -> &str {
        match &self.kind {
            FrameKind::Element { tag, .. } => tag,
            FrameKind::Highlight { .. } => "span",
        }
    }

    fn into_node(self) -> Node {
        match self.kind {
            FrameKind::Element { tag, attrs } => Node::Element(Element {
                tag,
                attrs,
                children: self.children,
            }),
            FrameKind::Highlight { id, color } => Node::Highlight(Highlight {
                id,
                color,
                children: self.children,
            }),
        }
    }
}

struct Tag {
    name: SmolStr,
    attrs: Vec<Attr>,
    closing: bool,
    self_closing: bool,
}

impl Tag {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.iter().find(|attr| attr.name == name).map(|attr| attr.value.as_str())
    }

    fn is_highlight(&self) -> bool {
        self.name == "span"
            && self
                .attr("class")
                .is_some_and(|class| class.split_ascii_whitespace().any(|c| c == "highlight"))
    }
}

/// Parses a RichText fragment into an inline tree.
///
/// Accepts plain text, entity references, comments (dropped), plain inline elements and
/// highlight spans. Adjacent text is merged so that the result is in normal form.
pub fn parse_fragment(input: &str) -> Result<Vec<Node>, ParseRichTextError> {
    let bytes = input.as_bytes();
    let mut root = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut text = String::new();
    let mut pos = 0usize;

    while pos < bytes.len() {
        let Some(rel) = memchr2(b'<', b'&', &bytes[pos..]) else {
            text.push_str(&input[pos..]);
            break;
        };
        let at = pos + rel;
        text.push_str(&input[pos..at]);

        if bytes[at] == b'&' {
            let (decoded, consumed) = decode_entity(&input[at..]);
            text.push(decoded);
            pos = at + consumed;
            continue;
        }

        if input[at..].starts_with("<!--") {
            let Some(end) = memmem::find(&bytes[at + 4..], b"-->") else {
                return Err(ParseRichTextError::UnterminatedComment { offset: at });
            };
            pos = at + 4 + end + 3;
            continue;
        }

        let next = bytes.get(at + 1).copied();
        if !next.is_some_and(|b| b.is_ascii_alphabetic() || b == b'/') {
            // A bare '<' is text, as in HTML.
            text.push('<');
            pos = at + 1;
            continue;
        }

        let (tag, end) = parse_tag(input, at)?;
        flush_text(&mut stack, &mut root, &mut text);
        pos = end;

        if tag.closing {
            close_frame(&mut stack, &mut root, &tag.name, at)?;
            continue;
        }

        if tag.is_highlight() {
            if stack.iter().any(|frame| matches!(frame.kind, FrameKind::Highlight { .. })) {
                return Err(ParseRichTextError::NestedHighlight { offset: at });
            }
            let raw_id = tag.attr("id").ok_or(ParseRichTextError::MissingHighlightId { offset: at })?;
            let id = AnnotationId::new(raw_id)
                .map_err(|source| ParseRichTextError::InvalidHighlightId { offset: at, source })?;
            let color = tag.attr("style").and_then(background_color).unwrap_or_default();
            stack.push(Frame {
                kind: FrameKind::Highlight { id, color },
                offset: at,
                children: Vec::new(),
            });
            continue;
        }

        if tag.self_closing || is_void_tag(&tag.name) {
            current(&mut stack, &mut root).push(Node::Element(Element {
                tag: tag.name,
                attrs: tag.attrs,
                children: Vec::new(),
            }));
            continue;
        }

        stack.push(Frame {
            kind: FrameKind::Element {
                tag: tag.name,
                attrs: tag.attrs,
            },
            offset: at,
            children: Vec::new(),
        });
    }

    flush_text(&mut stack, &mut root, &mut text);

    if let Some(frame) = stack.pop() {
        return Err(ParseRichTextError::UnclosedElement {
            offset: frame.offset,
            tag: frame.tag().to_owned(),
        });
    }

    Ok(normalize(root))
}

fn current<'a>(stack: &'a mut [Frame], root: &'a mut Vec<Node>) -> &'a mut Vec<Node> {
    match stack.last_mut() {
        Some(frame) => &mut frame.children,
        None => root,
    }
}

fn flush_text(stack: &mut [Frame], root: &mut Vec<Node>, text: &mut String) {
    if !text.is_empty() {
        current(stack, root).push(Node::Text(std::mem::take(text)));
    }
}

fn close_frame(
    stack: &mut Vec<Frame>,
    root: &mut Vec<Node>,
    name: &str,
    offset: usize,
) -> Result<(), ParseRichTextError> {
    let frame = match stack.pop() {
        Some(frame) if frame.tag() == name => frame,
        _ => {
            return Err(ParseRichTextError::UnexpectedEndTag {
                offset,
                tag: name.to_owned(),
            })
        }
    };
    let node = frame.into_node();
    current(stack, root).push(node);
    Ok(())
}

fn parse_tag(input: &str, start: usize) -> Result<(Tag, usize), ParseRichTextError> {
    let bytes = input.as_bytes();
    let malformed = || ParseRichTextError::MalformedTag { offset: start };

    let mut pos = start + 1;
    let closing = bytes.get(pos) == Some(&b'/');
    if closing {
        pos += 1;
    }

    let name_start = pos;
    while bytes.get(pos).is_some_and(|b| b.is_ascii_alphanumeric()) {
        pos += 1;
    }
    if pos == name_start {
        return Err(malformed());
    }
    let name = SmolStr::new(input[name_start..pos].to_ascii_lowercase());

    let mut attrs = Vec::new();
    let mut self_closing = false;
    loop {
        while bytes.get(pos).is_some_and(|b| b.is_ascii_whitespace()) {
            pos += 1;
        }
        match bytes.get(pos) {
            None => return Err(malformed()),
            Some(b'>') => {
                pos += 1;
                break;
            }
            Some(b'/') if bytes.get(pos + 1) == Some(&b'>') => {
                self_closing = true;
                pos += 2;
                break;
            }
            Some(_) if closing => return Err(malformed()),
            Some(_) => {}
        }

        let attr_start = pos;
        while bytes
            .get(pos)
            .is_some_and(|b| !b.is_ascii_whitespace() && !matches!(b, b'=' | b'>' | b'/' | b'"' | b'\''))
        {
            pos += 1;
        }
        if pos == attr_start {
            return Err(malformed());
        }
        let attr_name = SmolStr::new(input[attr_start..pos].to_ascii_lowercase());

        while bytes.get(pos).is_some_and(|b| b.is_ascii_whitespace()) {
            pos += 1;
        }
        let mut value = String::new();
        if bytes.get(pos) == Some(&b'=') {
            pos += 1;
            while bytes.get(pos).is_some_and(|b| b.is_ascii_whitespace()) {
                pos += 1;
            }
            let raw = match bytes.get(pos) {
                Some(&quote @ (b'"' | b'\'')) => {
                    let value_start = pos + 1;
                    let len = memchr::memchr(quote, &bytes[value_start..]).ok_or_else(malformed)?;
                    pos = value_start + len + 1;
                    &input[value_start..value_start + len]
                }
                Some(_) => {
                    let value_start = pos;
                    while bytes.get(pos).is_some_and(|b| !b.is_ascii_whitespace() && *b != b'>') {
                        pos += 1;
                    }
                    &input[value_start..pos]
                }
                None => return Err(malformed()),
            };
            value = decode_entities(raw);
        }
        attrs.push(Attr {
            name: attr_name,
            value,
        });
    }

    Ok((
        Tag {
            name,
            attrs,
            closing,
            self_closing,
        },
        pos,
    ))
}

fn background_color(style: &str) -> Option<HighlightColor> {
    style.split(';').find_map(|decl| {
        let (prop, value) = decl.split_once(':')?;
        if prop.trim().eq_ignore_ascii_case("background-color") {
            HighlightColor::new(value.trim()).ok()
        } else {
            None
        }
    })
}

fn decode_entities(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(idx) = rest.find('&') {
        out.push_str(&rest[..idx]);
        let (decoded, consumed) = decode_entity(&rest[idx..]);
        out.push(decoded);
        rest = &rest[idx + consumed..];
    }
    out.push_str(rest);
    out
}

/// Decodes one entity at the start of `input` (which begins with `&`).
///
/// Returns the decoded character and the number of bytes consumed. Unknown or unterminated
/// references decode to a literal `&`.
fn decode_entity(input: &str) -> (char, usize) {
    const MAX_ENTITY_LEN: usize = 12;

    let window = &input.as_bytes()[..input.len().min(MAX_ENTITY_LEN)];
    let Some(semi) = memchr::memchr(b';', window) else {
        return ('&', 1);
    };
    let name = &input[1..semi];
    let decoded = match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => name.strip_prefix('#').and_then(|num| {
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }),
    };

    match decoded {
        Some(ch) => (ch, semi + 1),
        None => ('&', 1),
    }
}
