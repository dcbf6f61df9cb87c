// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Infolens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Infolens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model.
//!
//! An [`Analysis`] is one generated infographic; its RichText fields are addressed by
//! [`FieldRef`] when annotation results are written back.

pub mod analysis;
pub mod field_ref;
pub mod fixtures;
pub mod ids;

pub use analysis::{
    Analysis, GsPaper, Insight, InsightPoint, ParseGsPaperError, RichText, Stat, StatGroup,
};
pub use field_ref::{resolve_path, rich_text_fields, FieldPathError, FieldRef, InvalidPathReason};
pub use ids::{AnalysisId, AnnotationId, Id, IdError};
