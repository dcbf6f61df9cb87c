// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Infolens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Infolens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::str::FromStr;

use smallvec::SmallVec;
use thiserror::Error;

use super::analysis::{Analysis, RichText};

/// Address of one RichText field inside an [`Analysis`].
///
/// Dotted form (used in logs and as the region marker):
/// - `summary`
/// - `keyFacts.<index>`
/// - `upscInsights.<index>.points.<index>.point`
///
/// Used only as a write-back address; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldRef {
    Summary,
    Fact(usize),
    InsightPoint { insight: usize, point: usize },
}

impl FieldRef {
    pub fn parse(input: &str) -> Result<Self, FieldPathError> {
        let invalid = |reason| FieldPathError::InvalidPath {
            path: input.to_owned(),
            reason,
        };

        let segments = input.split('.').collect::<SmallVec<[&str; 5]>>();
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(invalid(InvalidPathReason::EmptySegment));
        }

        match segments.as_slice() {
            ["summary"] => Ok(Self::Summary),
            ["keyFacts", index] => {
                let index = parse_index(index).map_err(invalid)?;
                Ok(Self::Fact(index))
            }
            ["upscInsights", insight, "points", point, "point"] => {
                let insight = parse_index(insight).map_err(invalid)?;
                let point = parse_index(point).map_err(invalid)?;
                Ok(Self::InsightPoint { insight, point })
            }
            ["keyFacts"] | ["upscInsights", ..] if segments.len() < 5 => {
                Err(invalid(InvalidPathReason::Incomplete))
            }
            [first, ..] if !matches!(*first, "summary" | "keyFacts" | "upscInsights") => {
                Err(invalid(InvalidPathReason::UnknownKey((*first).to_owned())))
            }
            _ => Err(invalid(InvalidPathReason::NotRichText)),
        }
    }

    /// Looks up the addressed field, failing if any index is out of bounds.
    pub fn resolve<'a>(&self, analysis: &'a Analysis) -> Result<&'a RichText, FieldPathError> {
        match *self {
            Self::Summary => Ok(analysis.summary()),
            Self::Fact(index) => {
                let facts = analysis.key_facts();
                facts.get(index).ok_or_else(|| self.out_of_bounds("keyFacts", index, facts.len()))
            }
            Self::InsightPoint { insight, point } => {
                let insights = analysis.upsc_insights();
                let entry = insights
                    .get(insight)
                    .ok_or_else(|| self.out_of_bounds("upscInsights", insight, insights.len()))?;
                let points = entry.points();
                points
                    .get(point)
                    .map(|p| p.point())
                    .ok_or_else(|| self.out_of_bounds("points", point, points.len()))
            }
        }
    }

    /// Mutable variant of [`FieldRef::resolve`]. Never touches the record on failure.
    pub fn resolve_mut<'a>(
        &self,
        analysis: &'a mut Analysis,
    ) -> Result<&'a mut RichText, FieldPathError> {
        match *self {
            Self::Summary => Ok(analysis.summary_mut()),
            Self::Fact(index) => {
                let facts = analysis.key_facts_mut();
                let len = facts.len();
                facts.get_mut(index).ok_or_else(|| self.out_of_bounds("keyFacts", index, len))
            }
            Self::InsightPoint { insight, point } => {
                let insights = analysis.upsc_insights_mut();
                let len = insights.len();
                let entry = insights
                    .get_mut(insight)
                    .ok_or_else(|| self.out_of_bounds("upscInsights", insight, len))?;
                let points = entry.points_mut();
                let len = points.len();
                points
                    .get_mut(point)
                    .map(|p| p.point_mut())
                    .ok_or_else(|| self.out_of_bounds("points", point, len))
            }
        }
    }

    fn out_of_bounds(&self, key: &'static str, index: usize, len: usize) -> FieldPathError {
        FieldPathError::InvalidPath {
            path: self.to_string(),
            reason: InvalidPathReason::IndexOutOfBounds { key, index, len },
        }
    }
}

/// Resolves a dotted path string against a record.
pub fn resolve_path<'a>(analysis: &'a Analysis, path: &str) -> Result<&'a RichText, FieldPathError> {
    FieldRef::parse(path)?.resolve(analysis)
}

/// All annotatable fields of a record in presentation order.
pub fn rich_text_fields(analysis: &Analysis) -> Vec<FieldRef> {
    let mut fields = vec![FieldRef::Summary];
    fields.extend((0..analysis.key_facts().len()).map(FieldRef::Fact));
    for (insight, entry) in analysis.upsc_insights().iter().enumerate() {
        fields.extend(
            (0..entry.points().len()).map(|point| FieldRef::InsightPoint { insight, point }),
        );
    }
    fields
}

fn parse_index(segment: &str) -> Result<usize, InvalidPathReason> {
    if !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(InvalidPathReason::NotAnIndex(segment.to_owned()));
    }
    segment.parse::<usize>().map_err(|_| InvalidPathReason::NotAnIndex(segment.to_owned()))
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Summary => f.write_str("summary"),
            Self::Fact(index) => write!(f, "keyFacts.{index}"),
            Self::InsightPoint { insight, point } => {
                write!(f, "upscInsights.{insight}.points.{point}.point")
            }
        }
    }
}

impl FromStr for FieldRef {
    type Err = FieldPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldPathError {
    #[error("invalid field path {path:?}: {reason}")]
    InvalidPath {
        path: String,
        reason: InvalidPathReason,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidPathReason {
    #[error("path contains an empty segment")]
    EmptySegment,
    #[error("unknown key {0:?}")]
    UnknownKey(String),
    #[error("{0:?} is not an index")]
    NotAnIndex(String),
    #[error("path stops before reaching a text field")]
    Incomplete,
    #[error("path does not address a rich text field")]
    NotRichText,
    #[error("{key} index {index} is out of bounds (len {len})")]
    IndexOutOfBounds {
        key: &'static str,
        index: usize,
        len: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::{resolve_path, rich_text_fields, FieldPathError, FieldRef, InvalidPathReason};
    use crate::model::fixtures;

    #[test]
    fn parses_and_formats_all_field_shapes() {
        let cases = ["summary", "keyFacts.3", "upscInsights.2.points.0.point"];
        for s in cases {
            let parsed: FieldRef = s.parse().expect("parse");
            assert_eq!(parsed.to_string(), s);
        }
        assert_eq!(
            FieldRef::parse("upscInsights.2.points.0.point"),
            Ok(FieldRef::InsightPoint { insight: 2, point: 0 })
        );
    }

    #[test]
    fn rejects_unknown_keys_and_bad_indices() {
        let FieldPathError::InvalidPath { reason, .. } = FieldRef::parse("title").unwrap_err();
        assert_eq!(reason, InvalidPathReason::UnknownKey("title".to_owned()));

        let FieldPathError::InvalidPath { reason, .. } = FieldRef::parse("keyFacts.x").unwrap_err();
        assert_eq!(reason, InvalidPathReason::NotAnIndex("x".to_owned()));

        let FieldPathError::InvalidPath { reason, .. } = FieldRef::parse("keyFacts.+1").unwrap_err();
        assert_eq!(reason, InvalidPathReason::NotAnIndex("+1".to_owned()));

        let FieldPathError::InvalidPath { reason, .. } =
            FieldRef::parse("upscInsights.0.points").unwrap_err();
        assert_eq!(reason, InvalidPathReason::Incomplete);

        let FieldPathError::InvalidPath { reason, .. } =
            FieldRef::parse("upscInsights.0.points.0.syllabusTopic").unwrap_err();
        assert_eq!(reason, InvalidPathReason::NotRichText);

        let FieldPathError::InvalidPath { reason, .. } = FieldRef::parse("keyFacts..1").unwrap_err();
        assert_eq!(reason, InvalidPathReason::EmptySegment);
    }

    #[test]
    fn resolve_fails_on_out_of_bounds_insight_and_leaves_record_untouched() {
        let mut analysis = fixtures::single_insight_analysis();
        let before = analysis.clone();

        let err = resolve_path(&analysis, "upscInsights.1.points.0.point").unwrap_err();
        let FieldPathError::InvalidPath { reason, .. } = err;
        assert_eq!(
            reason,
            InvalidPathReason::IndexOutOfBounds { key: "upscInsights", index: 1, len: 1 }
        );

        let field = FieldRef::InsightPoint { insight: 1, point: 0 };
        assert!(field.resolve_mut(&mut analysis).is_err());
        assert_eq!(analysis, before);
    }

    #[test]
    fn resolve_reaches_nested_point() {
        let analysis = fixtures::single_insight_analysis();
        let text = resolve_path(&analysis, "upscInsights.0.points.1.point").expect("resolve");
        assert_eq!(text, analysis.upsc_insights()[0].points()[1].point());
    }

    #[test]
    fn rich_text_fields_walks_in_presentation_order() {
        let analysis = fixtures::single_insight_analysis();
        let fields = rich_text_fields(&analysis);
        assert_eq!(fields.first(), Some(&FieldRef::Summary));
        assert_eq!(fields[1], FieldRef::Fact(0));
        assert_eq!(fields.last(), Some(&FieldRef::InsightPoint { insight: 0, point: 1 }));
        for field in fields {
            assert!(field.resolve(&analysis).is_ok(), "{field} must resolve");
        }
    }
}
