// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Infolens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Infolens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::ids::AnalysisId;
use crate::rich_text::escape_text;

/// An HTML fragment holding plain inline text plus non-overlapping highlight spans.
///
/// This is the at-rest form of every annotatable field. Live editing happens on a parsed
/// [`crate::rich_text::Region`] which is serialized back into a `RichText` after each mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RichText(String);

impl RichText {
    /// Wraps markup that is already a RichText fragment (e.g. engine output, persisted data).
    pub fn from_html(html: impl Into<String>) -> Self {
        Self(html.into())
    }

    /// Escapes plain text so it can never be read back as markup.
    pub fn from_plain(text: &str) -> Self {
        Self(escape_text(text))
    }

    pub fn as_html(&self) -> &str {
        &self.0
    }

    pub fn into_html(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RichText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One generated infographic.
///
/// Only the RichText fields change after creation, and only through
/// [`crate::model::FieldRef`] write-back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    id: AnalysisId,
    title: String,
    summary: RichText,
    key_facts: Vec<RichText>,
    key_stats: Vec<StatGroup>,
    upsc_insights: Vec<Insight>,
}

impl Analysis {
    pub fn new(
        id: AnalysisId,
        title: impl Into<String>,
        summary: RichText,
        key_facts: Vec<RichText>,
        key_stats: Vec<StatGroup>,
        upsc_insights: Vec<Insight>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            summary,
            key_facts,
            key_stats,
            upsc_insights,
        }
    }

    pub fn id(&self) -> &AnalysisId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn summary(&self) -> &RichText {
        &self.summary
    }

    pub fn key_facts(&self) -> &[RichText] {
        &self.key_facts
    }

    pub fn key_stats(&self) -> &[StatGroup] {
        &self.key_stats
    }

    pub fn upsc_insights(&self) -> &[Insight] {
        &self.upsc_insights
    }

    pub(crate) fn summary_mut(&mut self) -> &mut RichText {
        &mut self.summary
    }

    pub(crate) fn key_facts_mut(&mut self) -> &mut [RichText] {
        &mut self.key_facts
    }

    pub(crate) fn upsc_insights_mut(&mut self) -> &mut [Insight] {
        &mut self.upsc_insights
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatGroup {
    group_name: String,
    stats: Vec<Stat>,
}

impl StatGroup {
    pub fn new(group_name: impl Into<String>, stats: Vec<Stat>) -> Self {
        Self {
            group_name: group_name.into(),
            stats,
        }
    }

    pub fn group_name(&self) -> &str {
        &self.group_name
    }

    pub fn stats(&self) -> &[Stat] {
        &self.stats
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stat {
    value: String,
    label: String,
}

impl Stat {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insight {
    category: GsPaper,
    syllabus_description: String,
    points: Vec<InsightPoint>,
}

impl Insight {
    pub fn new(
        category: GsPaper,
        syllabus_description: impl Into<String>,
        points: Vec<InsightPoint>,
    ) -> Self {
        Self {
            category,
            syllabus_description: syllabus_description.into(),
            points,
        }
    }

    pub fn category(&self) -> GsPaper {
        self.category
    }

    pub fn syllabus_description(&self) -> &str {
        &self.syllabus_description
    }

    pub fn points(&self) -> &[InsightPoint] {
        &self.points
    }

    pub(crate) fn points_mut(&mut self) -> &mut [InsightPoint] {
        &mut self.points
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsightPoint {
    point: RichText,
    syllabus_topic: String,
}

impl InsightPoint {
    pub fn new(point: RichText, syllabus_topic: impl Into<String>) -> Self {
        Self {
            point,
            syllabus_topic: syllabus_topic.into(),
        }
    }

    pub fn point(&self) -> &RichText {
        &self.point
    }

    pub fn syllabus_topic(&self) -> &str {
        &self.syllabus_topic
    }

    pub(crate) fn point_mut(&mut self) -> &mut RichText {
        &mut self.point
    }
}

/// UPSC Mains General Studies paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GsPaper {
    GsI,
    GsII,
    GsIII,
    GsIV,
}

impl GsPaper {
    pub const ALL: [GsPaper; 4] = [Self::GsI, Self::GsII, Self::GsIII, Self::GsIV];

    /// Wire/display name, e.g. `General Studies - II`.
    pub fn label(self) -> &'static str {
        match self {
            Self::GsI => "General Studies - I",
            Self::GsII => "General Studies - II",
            Self::GsIII => "General Studies - III",
            Self::GsIV => "General Studies - IV",
        }
    }

    pub fn short_label(self) -> &'static str {
        match self {
            Self::GsI => "GS-I",
            Self::GsII => "GS-II",
            Self::GsIII => "GS-III",
            Self::GsIV => "GS-IV",
        }
    }

    pub fn syllabus(self) -> &'static str {
        match self {
            Self::GsI => "Indian Heritage and Culture, History and Geography of the World and Society",
            Self::GsII => {
                "Governance, Constitution, Polity, Social Justice and International relations"
            }
            Self::GsIII => {
                "Technology, Economic Development, Bio-diversity, Environment, Security and Disaster Management"
            }
            Self::GsIV => "Ethics, Integrity and Aptitude",
        }
    }
}

impl fmt::Display for GsPaper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for GsPaper {
    type Err = ParseGsPaperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|paper| {
                trimmed == paper.label() || trimmed.eq_ignore_ascii_case(paper.short_label())
            })
            .ok_or_else(|| ParseGsPaperError(trimmed.to_owned()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown GS paper category: {0:?}")]
pub struct ParseGsPaperError(String);

#[cfg(test)]
mod tests {
    use super::{GsPaper, RichText};

    #[test]
    fn plain_text_is_escaped_into_rich_text() {
        let text = RichText::from_plain("a < b & c > d");
        assert_eq!(text.as_html(), "a &lt; b &amp; c &gt; d");
    }

    #[test]
    fn gs_paper_parses_wire_and_short_labels() {
        assert_eq!("General Studies - III".parse::<GsPaper>(), Ok(GsPaper::GsIII));
        assert_eq!("gs-iv".parse::<GsPaper>(), Ok(GsPaper::GsIV));
        assert!("General Studies - V".parse::<GsPaper>().is_err());
    }
}
