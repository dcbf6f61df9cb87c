// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Infolens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Infolens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::str::FromStr;

use smol_str::SmolStr;
use thiserror::Error;

/// A CSS color value carried by a highlight's `background-color`.
///
/// The value is written verbatim into a `style="…"` attribute, so it is restricted to the
/// characters CSS color syntax needs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HighlightColor(SmolStr);

impl HighlightColor {
    pub fn new(value: &str) -> Result<Self, HighlightColorError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(HighlightColorError::Empty);
        }
        if let Some(ch) = value
            .chars()
            .find(|ch| !(ch.is_ascii_alphanumeric() || matches!(ch, '#' | '(' | ')' | ',' | '.' | '%' | ' ' | '-')))
        {
            return Err(HighlightColorError::ForbiddenChar(ch));
        }
        Ok(Self(SmolStr::new(value)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Best-effort `(r, g, b, alpha)` for `rgb()`, `rgba()` and `#rrggbb` values.
    pub fn rgba(&self) -> Option<(u8, u8, u8, f32)> {
        let value = self.0.as_str();
        if let Some(hex) = value.strip_prefix('#') {
            if hex.len() != 6 || !hex.is_ascii() {
                return None;
            }
            let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
            return Some((channel(0..2)?, channel(2..4)?, channel(4..6)?, 1.0));
        }

        let inner = value
            .strip_prefix("rgba(")
            .or_else(|| value.strip_prefix("rgb("))?
            .strip_suffix(')')?;
        let mut parts = inner.split(',').map(str::trim);
        let r = parts.next()?.parse::<u8>().ok()?;
        let g = parts.next()?.parse::<u8>().ok()?;
        let b = parts.next()?.parse::<u8>().ok()?;
        let alpha = match parts.next() {
            Some(alpha) => alpha.parse::<f32>().ok()?.clamp(0.0, 1.0),
            None => 1.0,
        };
        if parts.next().is_some() {
            return None;
        }
        Some((r, g, b, alpha))
    }

    /// The same color at full opacity, used for swatches.
    pub fn opaque(&self) -> Option<(u8, u8, u8)> {
        self.rgba().map(|(r, g, b, _)| (r, g, b))
    }
}

impl Default for HighlightColor {
    fn default() -> Self {
        Self(SmolStr::new_static(DEFAULT_HIGHLIGHT_COLOR))
    }
}

impl fmt::Display for HighlightColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for HighlightColor {
    type Err = HighlightColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HighlightColorError {
    #[error("highlight color must not be empty")]
    Empty,
    #[error("highlight color must not contain {0:?}")]
    ForbiddenChar(char),
}

/// Yellow; new highlights start with this color.
pub const DEFAULT_HIGHLIGHT_COLOR: &str = "rgba(250, 204, 21, 0.4)";

/// Picker swatches in display order: `(name, css value)`.
pub const PALETTE: [(&str, &str); 5] = [
    ("green", "rgba(74, 222, 128, 0.4)"),
    ("yellow", DEFAULT_HIGHLIGHT_COLOR),
    ("red", "rgba(248, 113, 113, 0.4)"),
    ("blue", "rgba(96, 165, 250, 0.4)"),
    ("purple", "rgba(192, 132, 252, 0.4)"),
];

pub fn palette() -> Vec<HighlightColor> {
    PALETTE
        .iter()
        .map(|(_, value)| HighlightColor(SmolStr::new_static(value)))
        .collect()
}
