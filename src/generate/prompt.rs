// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Infolens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Infolens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt::Write as _;

use crate::model::GsPaper;

/// Text offered by "load example" in the new-analysis dialog.
pub const EXAMPLE_TEXT: &str = "The James Webb Space Telescope (JWST) is a space telescope designed primarily to \
conduct infrared astronomy. As the largest optical telescope in space, its high resolution and sensitivity allow it \
to view objects too old, distant, or faint for the Hubble Space Telescope. This has enabled a broad range of \
investigations across many fields of astronomy and cosmology, such as observation of the first stars, the formation \
of the first galaxies, and detailed atmospheric characterization of potentially habitable exoplanets. The JWST was \
launched in December 2021. The primary mirror of the JWST, the Optical Telescope Element, consists of 18 hexagonal \
mirror segments made of gold-plated beryllium, which combine to create a 6.5-meter (21 ft) diameter mirror. This is \
a significant increase from Hubble's 2.4 m (7.9 ft) mirror. The total project cost is estimated to be around $10 \
billion. It has detected water on several exoplanets and its operational lifespan is expected to be around 20 years.";

pub fn build_prompt(text: &str) -> String {
    let mut prompt = String::from(
        "Analyze the following text and transform it into a concise, visually engaging infographic. \
         Extract a suitable title, a top-level summary, key facts, and key statistics grouped under short group names.\n\
         Additionally, identify and categorize any relevant points according to the UPSC (Union Public Service \
         Commission) Mains syllabus provided below.\n\n\
         For each identified UPSC point, you MUST specify which specific syllabus topic it pertains to \
         (e.g., 'Technology', 'Social Justice', 'History'). You MUST also include the full syllabus description \
         for each General Studies paper category that has relevant points.\n\n\
         **UPSC Mains Syllabus Categories:**\n",
    );
    for paper in GsPaper::ALL {
        let _ = writeln!(prompt, "- **{}:** ({})", paper.label(), paper.syllabus());
    }
    prompt.push_str(
        "\nFormat the entire output as a single JSON object that adheres to the provided schema. \
         For the UPSC insights, only include categories for which you can find relevant points in the text.\n\n\
         Text to analyze:\n---\n",
    );
    prompt.push_str(text);
    prompt.push_str("\n---\n");
    prompt
}

#[cfg(test)]
mod tests {
    use super::build_prompt;
    use crate::model::GsPaper;

    #[test]
    fn prompt_lists_every_paper_and_embeds_the_text() {
        let prompt = build_prompt("Some article.");
        for paper in GsPaper::ALL {
            assert!(prompt.contains(paper.syllabus()), "missing {paper}");
        }
        assert!(prompt.ends_with("---\nSome article.\n---\n"));
    }
}
