// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Infolens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Infolens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Shape of a generation reply: an analysis without its id.
//!
//! Doc comments on the fields become descriptions in the response schema sent to the model.

use std::sync::OnceLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::GenerationError;
use crate::model::{Analysis, AnalysisId, GsPaper, Insight, InsightPoint, RichText, Stat, StatGroup};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisDraft {
    /// A short, catchy title for the infographic (max 10 words).
    pub title: String,
    /// A concise summary of the text (2-3 sentences).
    pub summary: String,
    /// A list of 3 to 5 key facts from the text. Each fact should be a complete sentence.
    pub key_facts: Vec<String>,
    /// 1 to 3 groups of key statistics or numbers mentioned in the text, 2 to 4 per group.
    pub key_stats: Vec<StatGroupDraft>,
    /// Points from the text categorized according to the UPSC Mains syllabus. Only include
    /// categories for which relevant points are found.
    pub upsc_insights: Vec<InsightDraft>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatGroupDraft {
    /// A short name for this group of statistics (e.g., 'Hardware', 'Programme').
    pub group_name: String,
    pub stats: Vec<StatDraft>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StatDraft {
    /// The numerical value or stat (e.g., '6.5m', '$10B', '20 years').
    pub value: String,
    /// A brief label describing the stat (e.g., 'Mirror Diameter', 'Project Cost').
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsightDraft {
    /// The UPSC General Studies paper category.
    pub category: CategoryDraft,
    /// The full description of the syllabus for this category.
    pub syllabus_description: String,
    /// Key points from the text that fall under this category.
    pub points: Vec<InsightPointDraft>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsightPointDraft {
    /// The specific point or fact identified from the text.
    pub point: String,
    /// The specific part of the syllabus this point pertains to (e.g., 'Technology', 'History').
    pub syllabus_topic: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum CategoryDraft {
    #[serde(rename = "General Studies - I", alias = "GS-I")]
    GsI,
    #[serde(rename = "General Studies - II", alias = "GS-II")]
    GsII,
    #[serde(rename = "General Studies - III", alias = "GS-III")]
    GsIII,
    #[serde(rename = "General Studies - IV", alias = "GS-IV")]
    GsIV,
}

impl From<CategoryDraft> for GsPaper {
    fn from(category: CategoryDraft) -> Self {
        match category {
            CategoryDraft::GsI => Self::GsI,
            CategoryDraft::GsII => Self::GsII,
            CategoryDraft::GsIII => Self::GsIII,
            CategoryDraft::GsIV => Self::GsIV,
        }
    }
}

impl AnalysisDraft {
    /// Builds the record. Every generated string is escaped, so model output never becomes
    /// markup.
    pub fn into_analysis(self, id: AnalysisId) -> Analysis {
        Analysis::new(
            id,
            self.title.trim(),
            RichText::from_plain(&self.summary),
            self.key_facts.iter().map(|fact| RichText::from_plain(fact)).collect(),
            self.key_stats
                .into_iter()
                .map(|group| {
                    StatGroup::new(
                        group.group_name,
                        group.stats.into_iter().map(|stat| Stat::new(stat.value, stat.label)).collect(),
                    )
                })
                .collect(),
            self.upsc_insights
                .into_iter()
                .map(|insight| {
                    Insight::new(
                        insight.category.into(),
                        insight.syllabus_description,
                        insight
                            .points
                            .into_iter()
                            .map(|point| InsightPoint::new(RichText::from_plain(&point.point), point.syllabus_topic))
                            .collect(),
                    )
                })
                .collect(),
        )
    }
}

/// JSON schema of [`AnalysisDraft`] with all subschemas inlined.
pub fn response_schema() -> serde_json::Value {
    let schema = schemars::generate::SchemaSettings::draft2020_12()
        .with(|settings| settings.inline_subschemas = true)
        .into_generator()
        .into_root_schema_for::<AnalysisDraft>();
    let mut value = serde_json::to_value(schema).unwrap_or_default();
    if let Some(object) = value.as_object_mut() {
        object.remove("$schema");
        object.remove("title");
    }
    value
}

fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| Regex::new(r"(?s)^```(?:json)?\s*\n?(.*?)\n?```$").expect("fence pattern is valid"))
}

/// Removes a surrounding ```` ```json ```` fence, if any.
pub fn strip_code_fences(reply: &str) -> &str {
    let trimmed = reply.trim();
    fence_regex()
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map_or(trimmed, |body| body.as_str().trim())
}

/// Parses the model's reply text into a draft.
pub fn parse_reply(reply: &str) -> Result<AnalysisDraft, GenerationError> {
    let draft: AnalysisDraft = serde_json::from_str(strip_code_fences(reply))?;
    if draft.title.trim().is_empty() {
        return Err(GenerationError::Incomplete("title is empty"));
    }
    if draft.summary.trim().is_empty() {
        return Err(GenerationError::Incomplete("summary is empty"));
    }
    Ok(draft)
}

#[cfg(test)]
mod tests {
    use super::{parse_reply, response_schema, strip_code_fences, CategoryDraft};
    use crate::generate::GenerationError;
    use crate::model::{AnalysisId, GsPaper};

    const REPLY: &str = r#"{
        "title": "Webb <Telescope>",
        "summary": "Largest & most sensitive.",
        "keyFacts": ["Launched in 2021."],
        "keyStats": [{"groupName": "Hardware", "stats": [{"value": "6.5 m", "label": "Mirror"}]}],
        "upscInsights": [{"category": "GS-III", "syllabusDescription": "Technology",
            "points": [{"point": "Science diplomacy", "syllabusTopic": "Technology"}]}]
    }"#;

    #[test]
    fn strips_json_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n[]\n```"), "[]");
        assert_eq!(strip_code_fences("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn parses_reply_and_escapes_generated_text() {
        let draft = parse_reply(&format!("```json\n{REPLY}\n```")).expect("reply");
        assert_eq!(draft.upsc_insights[0].category, CategoryDraft::GsIII);

        let analysis = draft.into_analysis(AnalysisId::new("a1").unwrap());
        assert_eq!(analysis.title(), "Webb <Telescope>");
        assert_eq!(analysis.summary().as_html(), "Largest &amp; most sensitive.");
        assert_eq!(analysis.upsc_insights()[0].category(), GsPaper::GsIII);
        assert_eq!(analysis.key_stats()[0].stats()[0].label(), "Mirror");
    }

    #[test]
    fn rejects_malformed_or_incomplete_replies() {
        assert!(matches!(parse_reply("not json"), Err(GenerationError::InvalidReply(_))));
        assert!(matches!(parse_reply(r#"{"title": "t"}"#), Err(GenerationError::InvalidReply(_))));
        let blank = REPLY.replace("Webb <Telescope>", "  ");
        assert!(matches!(parse_reply(&blank), Err(GenerationError::Incomplete(_))));
    }

    #[test]
    fn schema_is_inlined_and_lists_categories() {
        let schema = response_schema();
        assert!(schema.get("$schema").is_none());
        assert!(schema.get("$defs").is_none());
        let required = schema["required"].as_array().expect("required");
        assert!(required.iter().any(|v| v == "upscInsights"));
        let category = &schema["properties"]["upscInsights"]["items"]["properties"]["category"];
        let rendered = category.to_string();
        assert!(rendered.contains("General Studies - IV"), "{rendered}");
    }
}
