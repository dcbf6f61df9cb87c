// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Infolens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Infolens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use super::prompt::EXAMPLE_TEXT;
use super::{AnalysisDraft, GenerationError};

pub const EMPTY_INPUT_MESSAGE: &str = "Please enter some text to analyze.";
pub const FAILURE_MESSAGE: &str = "Failed to generate infographic. Please check your content or try again later.";
pub const UNAVAILABLE_MESSAGE: &str = "Generation is unavailable: no API key configured (set GEMINI_API_KEY).";

/// Identifies one submitted request; results carrying any other token are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestToken(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub token: RequestToken,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Idle,
    Pending(RequestToken),
}

/// State of the new-analysis dialog.
#[derive(Debug)]
pub struct GenerationDialog {
    open: bool,
    input: String,
    message: Option<&'static str>,
    status: Status,
    next_token: u64,
    available: bool,
}

impl GenerationDialog {
    pub fn new(available: bool) -> Self {
        Self {
            open: false,
            input: String::new(),
            message: None,
            status: Status::Idle,
            next_token: 0,
            available,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.status, Status::Pending(_))
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Error or status line shown under the input.
    pub fn message(&self) -> Option<&'static str> {
        self.message
    }

    pub fn can_submit(&self) -> bool {
        self.available && !self.is_pending() && !self.input.trim().is_empty()
    }

    pub fn open(&mut self) {
        self.open = true;
        if !self.available {
            self.message = Some(UNAVAILABLE_MESSAGE);
        }
    }

    /// Closes and resets. A request still in flight becomes stale.
    pub fn close(&mut self) {
        if let Status::Pending(token) = self.status {
            tracing::debug!(token = token.0, "dialog closed with a request in flight");
        }
        self.open = false;
        self.input.clear();
        self.message = None;
        self.status = Status::Idle;
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        if self.is_pending() {
            return;
        }
        self.input = text.into();
    }

    pub fn push_char(&mut self, ch: char) {
        if !self.is_pending() {
            self.input.push(ch);
        }
    }

    pub fn backspace(&mut self) {
        if !self.is_pending() {
            self.input.pop();
        }
    }

    pub fn load_example(&mut self) {
        if self.is_pending() {
            return;
        }
        self.input = EXAMPLE_TEXT.to_owned();
        self.message = None;
    }

    /// Starts a request, or returns `None` when submitting is not possible right now.
    pub fn submit(&mut self) -> Option<GenerationRequest> {
        if !self.open || self.is_pending() {
            return None;
        }
        if !self.available {
            self.message = Some(UNAVAILABLE_MESSAGE);
            return None;
        }
        if self.input.trim().is_empty() {
            self.message = Some(EMPTY_INPUT_MESSAGE);
            return None;
        }

        let token = RequestToken(self.next_token);
        self.next_token += 1;
        self.status = Status::Pending(token);
        self.message = None;
        Some(GenerationRequest {
            token,
            text: self.input.clone(),
        })
    }

    /// Applies a finished request. Returns the draft only for the current request when it
    /// succeeded; the dialog then closes and clears its input.
    pub fn resolve(
        &mut self,
        token: RequestToken,
        result: Result<AnalysisDraft, GenerationError>,
    ) -> Option<AnalysisDraft> {
        if self.status != Status::Pending(token) {
            match &result {
                Ok(_) => tracing::info!(token = token.0, "discarding stale generation result"),
                Err(err) => tracing::info!(token = token.0, error = %err, "discarding stale generation failure"),
            }
            return None;
        }

        self.status = Status::Idle;
        match result {
            Ok(draft) => {
                self.close();
                Some(draft)
            }
            Err(err) => {
                tracing::warn!(error = %err, "generation failed");
                self.message = Some(FAILURE_MESSAGE);
                None
            }
        }
    }
}
