// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Infolens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Infolens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Turning raw text into an analysis.
//!
//! A [`Generator`] answers one request with an [`AnalysisDraft`]; the [`GenerationDialog`] tracks
//! which request is current so that late replies can be dropped.

pub mod dialog;
pub mod draft;
pub mod gemini;
pub mod prompt;

use std::future::Future;

use thiserror::Error;

pub use dialog::{
    GenerationDialog, GenerationRequest, RequestToken, EMPTY_INPUT_MESSAGE, FAILURE_MESSAGE, UNAVAILABLE_MESSAGE,
};
pub use draft::{parse_reply, response_schema, strip_code_fences, AnalysisDraft};
pub use gemini::{GeminiClient, DEFAULT_MODEL};
pub use prompt::{build_prompt, EXAMPLE_TEXT};

/// Why a generation call failed. Users only ever see one message for all of these.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("no API key configured")]
    MissingApiKey,
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("model returned status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("model reply had no text")]
    EmptyReply,
    #[error("model reply is not a valid analysis: {0}")]
    InvalidReply(#[from] serde_json::Error),
    #[error("model reply is incomplete: {0}")]
    Incomplete(&'static str),
}

pub trait Generator: Send + Sync + 'static {
    fn generate(&self, text: String) -> impl Future<Output = Result<AnalysisDraft, GenerationError>> + Send;
}
