// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Infolens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Infolens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Presentation of one analysis.
//!
//! A [`Presentation`] is the ordered list of blocks a front-end draws for an analysis. Every
//! annotatable field gets its own highlight-capable [`Region`]; title, stats and insight headers
//! are plain text.

pub mod text;

use crate::model::{rich_text_fields, Analysis, AnalysisId, AnnotationId, FieldRef, GsPaper, StatGroup};
use crate::rich_text::Region;

pub use text::{truncate_with_ellipsis, wrap_region, wrap_text, Cell, WrappedLine};

pub const SUMMARY_HEADING: &str = "Summary";
pub const STATS_HEADING: &str = "Key Statistics";
pub const FACTS_HEADING: &str = "Key Facts";
pub const INSIGHTS_HEADING: &str = "UPSC Syllabus Insights";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Title(String),
    Heading(&'static str),
    Stats(StatGroup),
    InsightHeader {
        category: GsPaper,
        syllabus_description: String,
    },
    /// An annotatable field; the region itself lives in [`Presentation::region`].
    Field {
        field: FieldRef,
        /// Shown under the text, e.g. an insight point's syllabus topic.
        caption: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presentation {
    analysis_id: AnalysisId,
    blocks: Vec<Block>,
    regions: Vec<Region>,
}

impl Presentation {
    pub fn from_analysis(analysis: &Analysis) -> Self {
        let mut blocks = vec![
            Block::Title(analysis.title().to_owned()),
            Block::Heading(SUMMARY_HEADING),
            Block::Field {
                field: FieldRef::Summary,
                caption: None,
            },
        ];

        if !analysis.key_stats().is_empty() {
            blocks.push(Block::Heading(STATS_HEADING));
            blocks.extend(analysis.key_stats().iter().cloned().map(Block::Stats));
        }

        if !analysis.key_facts().is_empty() {
            blocks.push(Block::Heading(FACTS_HEADING));
            blocks.extend((0..analysis.key_facts().len()).map(|index| Block::Field {
                field: FieldRef::Fact(index),
                caption: None,
            }));
        }

        let insights = analysis.upsc_insights();
        if insights.iter().any(|insight| !insight.points().is_empty()) {
            blocks.push(Block::Heading(INSIGHTS_HEADING));
            for (insight_index, insight) in insights.iter().enumerate() {
                if insight.points().is_empty() {
                    continue;
                }
                blocks.push(Block::InsightHeader {
                    category: insight.category(),
                    syllabus_description: insight.syllabus_description().to_owned(),
                });
                blocks.extend(insight.points().iter().enumerate().map(|(point_index, point)| Block::Field {
                    field: FieldRef::InsightPoint {
                        insight: insight_index,
                        point: point_index,
                    },
                    caption: Some(point.syllabus_topic().to_owned()),
                }));
            }
        }

        let regions = rich_text_fields(analysis)
            .into_iter()
            .filter_map(|field| {
                let html = field.resolve(analysis).ok()?;
                Some(Region::load(field, html))
            })
            .collect();

        Self {
            analysis_id: analysis.id().clone(),
            blocks,
            regions,
        }
    }

    pub fn analysis_id(&self) -> &AnalysisId {
        &self.analysis_id
    }

    pub fn title(&self) -> &str {
        self.blocks
            .iter()
            .find_map(|block| match block {
                Block::Title(title) => Some(title.as_str()),
                _ => None,
            })
            .unwrap_or_default()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Regions in presentation order.
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region(&self, field: FieldRef) -> Option<&Region> {
        self.regions.iter().find(|region| region.field() == field)
    }

    pub fn region_mut(&mut self, field: FieldRef) -> Option<&mut Region> {
        self.regions.iter_mut().find(|region| region.field() == field)
    }

    /// The field whose region holds the highlight, found by searching regions rather than
    /// assuming where the highlight sits.
    pub fn field_of(&self, annotation: &AnnotationId) -> Option<FieldRef> {
        self.regions
            .iter()
            .find(|region| region.contains_highlight(annotation))
            .map(Region::field)
    }

    /// Plain-text rendering of the whole analysis, for the clipboard.
    pub fn to_plain_text(&self) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            match block {
                Block::Title(title) => {
                    out.push_str(title);
                    out.push('\n');
                }
                Block::Heading(heading) => {
                    out.push('\n');
                    out.push_str(heading);
                    out.push('\n');
                }
                Block::Stats(group) => {
                    out.push_str(group.group_name());
                    out.push('\n');
                    for stat in group.stats() {
                        out.push_str(&format!("  {}: {}\n", stat.label(), stat.value()));
                    }
                }
                Block::InsightHeader {
                    category,
                    syllabus_description,
                } => {
                    out.push_str(&format!("{category} ({syllabus_description})\n"));
                }
                Block::Field { field, caption } => {
                    let text = self.region(*field).map(Region::text).unwrap_or_default();
                    let bullet = if matches!(field, FieldRef::Summary) { "" } else { "- " };
                    out.push_str(bullet);
                    out.push_str(&text);
                    if let Some(caption) = caption {
                        out.push_str(&format!(" [{caption}]"));
                    }
                    out.push('\n');
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::{Block, Presentation, FACTS_HEADING, INSIGHTS_HEADING, STATS_HEADING};
    use crate::model::fixtures::single_insight_analysis;
    use crate::model::{Analysis, AnalysisId, AnnotationId, FieldRef, GsPaper, Insight, InsightPoint, RichText};

    fn bare(insights: Vec<Insight>) -> Analysis {
        Analysis::new(
            AnalysisId::new("bare").unwrap(),
            "Bare",
            RichText::from_plain("Only a summary."),
            Vec::new(),
            Vec::new(),
            insights,
        )
    }

    #[test]
    fn one_region_per_annotatable_field() {
        let presentation = Presentation::from_analysis(&single_insight_analysis());
        let fields: Vec<_> = presentation.regions().iter().map(|r| r.field()).collect();
        assert_eq!(
            fields,
            vec![
                FieldRef::Summary,
                FieldRef::Fact(0),
                FieldRef::Fact(1),
                FieldRef::InsightPoint { insight: 0, point: 0 },
                FieldRef::InsightPoint { insight: 0, point: 1 },
            ]
        );
        assert!(presentation.blocks().contains(&Block::Heading(STATS_HEADING)));
        assert_eq!(
            presentation.region(FieldRef::Fact(1)).map(|r| r.text()),
            Some("Reservoir levels rose in three states.".to_owned())
        );
    }

    #[test]
    fn empty_sections_are_omitted() {
        let presentation = Presentation::from_analysis(&bare(vec![Insight::new(GsPaper::GsII, "d", Vec::new())]));
        let blocks = presentation.blocks();
        assert!(!blocks.contains(&Block::Heading(STATS_HEADING)));
        assert!(!blocks.contains(&Block::Heading(FACTS_HEADING)));
        assert!(!blocks.contains(&Block::Heading(INSIGHTS_HEADING)));
        assert_eq!(presentation.regions().len(), 1);
    }

    #[test]
    fn insight_without_points_is_skipped_but_indices_are_kept() {
        let presentation = Presentation::from_analysis(&bare(vec![
            Insight::new(GsPaper::GsI, "empty", Vec::new()),
            Insight::new(
                GsPaper::GsIV,
                "ethics",
                vec![InsightPoint::new(RichText::from_plain("p"), "Ethics")],
            ),
        ]));
        let headers: Vec<_> = presentation
            .blocks()
            .iter()
            .filter_map(|b| match b {
                Block::InsightHeader { category, .. } => Some(*category),
                _ => None,
            })
            .collect();
        assert_eq!(headers, vec![GsPaper::GsIV]);
        assert!(presentation
            .blocks()
            .contains(&Block::Field { field: FieldRef::InsightPoint { insight: 1, point: 0 }, caption: Some("Ethics".into()) }));
    }

    #[test]
    fn field_of_finds_the_region_holding_a_highlight() {
        let mut analysis = single_insight_analysis();
        let field = FieldRef::InsightPoint { insight: 0, point: 0 };
        *field.resolve_mut(&mut analysis).unwrap() = RichText::from_html(
            "Early <span id=\"h-7\" class=\"highlight\" style=\"background-color:red\">onset</span> supports kharif sowing.",
        );
        let presentation = Presentation::from_analysis(&analysis);
        assert_eq!(presentation.field_of(&AnnotationId::new("h-7").unwrap()), Some(field));
        assert_eq!(presentation.field_of(&AnnotationId::new("h-8").unwrap()), None);
    }

    #[test]
    fn plain_text_lists_every_section() {
        let text = Presentation::from_analysis(&single_insight_analysis()).to_plain_text();
        assert!(text.starts_with("Monsoon Outlook\n"));
        assert!(text.contains("  Of long period average: 112%\n"));
        assert!(text.contains("- Reservoir levels rose in three states.\n"));
        assert!(text.contains("- Flood preparedness remains uneven. [Disaster Management]\n"));
    }
}
