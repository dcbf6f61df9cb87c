// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Infolens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Infolens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Built-in records used by `--demo` and by tests.

use super::analysis::{Analysis, GsPaper, Insight, InsightPoint, RichText, Stat, StatGroup};
use super::ids::AnalysisId;

fn aid(value: &str) -> AnalysisId {
    AnalysisId::new(value).expect("hard-coded analysis id is valid")
}

fn text(value: &str) -> RichText {
    RichText::from_plain(value)
}

/// A small record with exactly one insight (index 0) holding two points.
pub fn single_insight_analysis() -> Analysis {
    Analysis::new(
        aid("analysis-fixture-single"),
        "Monsoon Outlook",
        text("The monsoon arrived early this year across the southern coast."),
        vec![
            text("Rainfall was 12% above the long period average."),
            text("Reservoir levels rose in three states."),
        ],
        vec![StatGroup::new(
            "Rainfall",
            vec![Stat::new("112%", "Of long period average")],
        )],
        vec![Insight::new(
            GsPaper::GsIII,
            GsPaper::GsIII.syllabus(),
            vec![
                InsightPoint::new(text("Early onset supports kharif sowing."), "Economic Development"),
                InsightPoint::new(text("Flood preparedness remains uneven."), "Disaster Management"),
            ],
        )],
    )
}

/// Demo library shown with `--demo`, newest first.
pub fn demo_analyses() -> Vec<Analysis> {
    vec![
        Analysis::new(
            aid("analysis-demo-jwst"),
            "Webb Telescope: Peering Into Cosmic Dawn",
            text(
                "The James Webb Space Telescope is the largest optical telescope in space. \
                 Its infrared sensitivity lets it observe the first stars and galaxies and \
                 characterize exoplanet atmospheres.",
            ),
            vec![
                text("JWST was launched in December 2021."),
                text("Its primary mirror is built from 18 hexagonal gold-plated beryllium segments."),
                text("It has detected water on several exoplanets."),
            ],
            vec![
                StatGroup::new(
                    "Hardware",
                    vec![
                        Stat::new("6.5 m", "Mirror Diameter"),
                        Stat::new("18", "Mirror Segments"),
                    ],
                ),
                StatGroup::new(
                    "Programme",
                    vec![
                        Stat::new("$10B", "Project Cost"),
                        Stat::new("20 years", "Operational Lifespan"),
                    ],
                ),
            ],
            vec![Insight::new(
                GsPaper::GsIII,
                GsPaper::GsIII.syllabus(),
                vec![
                    InsightPoint::new(
                        text("International collaboration in space science expands research capacity."),
                        "Technology",
                    ),
                    InsightPoint::new(
                        text("Large public science budgets need long-horizon planning."),
                        "Economic Development",
                    ),
                ],
            )],
        ),
        single_insight_analysis(),
    ]
}
