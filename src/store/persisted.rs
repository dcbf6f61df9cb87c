// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Infolens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Infolens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! JSON shape of the persisted analysis list.
//!
//! Field names match the wire shape of the generation response (camelCase), plus `id`.

use serde::{Deserialize, Serialize};

use super::StoreError;
use crate::model::{Analysis, AnalysisId, GsPaper, Insight, InsightPoint, RichText, Stat, StatGroup};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisJson {
    id: AnalysisId,
    title: String,
    summary: String,
    #[serde(default)]
    key_facts: Vec<String>,
    #[serde(default)]
    key_stats: Vec<StatGroupJson>,
    #[serde(default)]
    upsc_insights: Vec<InsightJson>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatGroupJson {
    group_name: String,
    #[serde(default)]
    stats: Vec<StatJson>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct StatJson {
    value: String,
    label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InsightJson {
    category: String,
    syllabus_description: String,
    #[serde(default)]
    points: Vec<InsightPointJson>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InsightPointJson {
    point: String,
    syllabus_topic: String,
}

impl From<&Analysis> for AnalysisJson {
    fn from(analysis: &Analysis) -> Self {
        Self {
            id: analysis.id().clone(),
            title: analysis.title().to_owned(),
            summary: analysis.summary().as_html().to_owned(),
            key_facts: analysis.key_facts().iter().map(|fact| fact.as_html().to_owned()).collect(),
            key_stats: analysis
                .key_stats()
                .iter()
                .map(|group| StatGroupJson {
                    group_name: group.group_name().to_owned(),
                    stats: group
                        .stats()
                        .iter()
                        .map(|stat| StatJson {
                            value: stat.value().to_owned(),
                            label: stat.label().to_owned(),
                        })
                        .collect(),
                })
                .collect(),
            upsc_insights: analysis
                .upsc_insights()
                .iter()
                .map(|insight| InsightJson {
                    category: insight.category().label().to_owned(),
                    syllabus_description: insight.syllabus_description().to_owned(),
                    points: insight
                        .points()
                        .iter()
                        .map(|point| InsightPointJson {
                            point: point.point().as_html().to_owned(),
                            syllabus_topic: point.syllabus_topic().to_owned(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

impl TryFrom<AnalysisJson> for Analysis {
    type Error = StoreError;

    fn try_from(json: AnalysisJson) -> Result<Self, Self::Error> {
        let insights = json
            .upsc_insights
            .into_iter()
            .map(|insight| {
                let category = insight
                    .category
                    .parse::<GsPaper>()
                    .map_err(|err| StoreError::Corrupt(err.to_string()))?;
                let points = insight
                    .points
                    .into_iter()
                    .map(|point| InsightPoint::new(RichText::from_html(point.point), point.syllabus_topic))
                    .collect();
                Ok(Insight::new(category, insight.syllabus_description, points))
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        Ok(Analysis::new(
            json.id,
            json.title,
            RichText::from_html(json.summary),
            json.key_facts.into_iter().map(RichText::from_html).collect(),
            json.key_stats
                .into_iter()
                .map(|group| {
                    StatGroup::new(
                        group.group_name,
                        group.stats.into_iter().map(|stat| Stat::new(stat.value, stat.label)).collect(),
                    )
                })
                .collect(),
            insights,
        ))
    }
}

/// Serializes the list as pretty JSON with a trailing newline.
pub fn encode_analyses(analyses: &[Analysis]) -> Result<Vec<u8>, StoreError> {
    let json: Vec<AnalysisJson> = analyses.iter().map(AnalysisJson::from).collect();
    let mut bytes = serde_json::to_vec_pretty(&json).map_err(StoreError::Json)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Parses a persisted list. Duplicate ids are rejected as corrupt.
pub fn decode_analyses(bytes: &[u8]) -> Result<Vec<Analysis>, StoreError> {
    let json: Vec<AnalysisJson> = serde_json::from_slice(bytes).map_err(StoreError::Json)?;
    let mut seen = std::collections::HashSet::new();
    json.into_iter()
        .map(|entry| {
            if !seen.insert(entry.id.clone()) {
                return Err(StoreError::Corrupt(format!("duplicate analysis id {}", entry.id)));
            }
            Analysis::try_from(entry)
        })
        .collect()
}
