// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Infolens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Infolens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use infolens::model::{FieldRef, RichText};
use infolens::rich_text::{parse_fragment, serialize_nodes, AnnotationEngine, Region, TextRange};

const SENTENCE: &str =
    "The monsoon arrived <b>early</b> this year &amp; reservoirs rose across <i>three</i> states. ";

#[derive(Debug, Clone, Copy)]
enum Case {
    Plain,
    Formatted,
    Highlighted,
}

impl Case {
    fn id(self) -> &'static str {
        match self {
            Self::Plain => "plain_2k",
            Self::Formatted => "formatted_8k",
            Self::Highlighted => "highlighted_8k",
        }
    }

    fn html(self) -> String {
        match self {
            Self::Plain => "Rainfall was above the long period average in most districts. ".repeat(32),
            Self::Formatted => SENTENCE.repeat(96),
            Self::Highlighted => (0..96)
                .map(|i| {
                    format!(
                        "<span id=\"h-{i}\" class=\"highlight\" style=\"background-color: rgba(250, 204, 21, 0.4)\">Monsoon</span> {SENTENCE}"
                    )
                })
                .collect(),
        }
    }
}

fn criterion() -> Criterion {
    Criterion::default()
        .sample_size(50)
        .warm_up_time(Duration::from_secs(2))
        .measurement_time(Duration::from_secs(4))
}

// Group names and case ids stay stable so results remain comparable over time.
fn benches_rich_text(c: &mut Criterion) {
    let cases = [Case::Plain, Case::Formatted, Case::Highlighted];

    {
        let mut group = c.benchmark_group("rich_text.parse");
        for case in cases {
            let html = case.html();
            group.throughput(Throughput::Bytes(html.len() as u64));
            group.bench_function(case.id(), move |b| {
                b.iter(|| black_box(parse_fragment(black_box(&html)).expect("parse").len()))
            });
        }
        group.finish();
    }

    {
        let mut group = c.benchmark_group("rich_text.serialize");
        for case in cases {
            let nodes = parse_fragment(&case.html()).expect("parse");
            group.bench_function(case.id(), move |b| {
                b.iter(|| black_box(serialize_nodes(black_box(&nodes)).len()))
            });
        }
        group.finish();
    }

    {
        let mut group = c.benchmark_group("rich_text.create_highlight");
        for case in cases {
            let region = Region::parse(FieldRef::Summary, &RichText::from_html(case.html())).expect("region");
            let mid = region.text_len() / 2;
            let range = TextRange::new(mid, mid + 1);
            group.bench_function(case.id(), move |b| {
                b.iter_batched_ref(
                    || (AnnotationEngine::with_seed(3), region.clone()),
                    |(engine, region)| black_box(engine.try_create_highlight(region, range).is_ok()),
                    BatchSize::SmallInput,
                )
            });
        }
        group.finish();
    }
}

criterion_group! {
    name = benches;
    config = criterion();
    targets = benches_rich_text
}
criterion_main!(benches);
