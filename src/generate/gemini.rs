// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Infolens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Infolens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use super::draft::{parse_reply, response_schema, AnalysisDraft};
use super::prompt::build_prompt;
use super::{GenerationError, Generator};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

/// `generateContent` client for the Gemini API.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_json_schema: serde_json::Value,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, GenerationError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(GenerationError::MissingApiKey);
        }
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            api_key,
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_owned(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    async fn request(&self, text: &str) -> Result<AnalysisDraft, GenerationError> {
        let prompt = build_prompt(text);
        let body = GenerateRequest {
            contents: [Content {
                role: "user",
                parts: [RequestPart { text: &prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_json_schema: response_schema(),
            },
        };

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(&self.api_key).map_err(|_| GenerationError::MissingApiKey)?,
        );

        tracing::info!(model = %self.model, chars = text.chars().count(), "requesting analysis");
        let response = self.http.post(self.endpoint()).headers(headers).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorResponse>()
                .await
                .map(|body| body.error.message)
                .unwrap_or_else(|_| "unknown error".to_owned());
            return Err(GenerationError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateResponse = response.json().await?;
        let reply: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
            .unwrap_or_default();
        if reply.trim().is_empty() {
            return Err(GenerationError::EmptyReply);
        }
        parse_reply(&reply)
    }
}

impl Generator for GeminiClient {
    async fn generate(&self, text: String) -> Result<AnalysisDraft, GenerationError> {
        self.request(&text).await
    }
}

#[cfg(test)]
mod tests {
    use super::{GeminiClient, DEFAULT_MODEL};
    use crate::generate::GenerationError;

    #[test]
    fn endpoint_names_the_model() {
        let client = GeminiClient::new("key", DEFAULT_MODEL)
            .expect("client")
            .with_base_url("http://localhost:9/v1beta/");
        assert_eq!(client.endpoint(), "http://localhost:9/v1beta/models/gemini-2.5-flash:generateContent");
    }

    #[test]
    fn blank_key_is_rejected() {
        assert!(matches!(GeminiClient::new("  ", DEFAULT_MODEL), Err(GenerationError::MissingApiKey)));
    }

    #[test]
    fn debug_output_hides_the_key() {
        let client = GeminiClient::new("secret-key", DEFAULT_MODEL).expect("client");
        assert!(!format!("{client:?}").contains("secret-key"));
    }
}
