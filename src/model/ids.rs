// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Infolens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Infolens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::borrow::Borrow;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use chrono::{SecondsFormat, Utc};
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A stable identifier used across the model, the persisted list and RichText markup.
///
/// Ids end up inside HTML `id="…"` attributes, so besides being non-empty they must not
/// contain whitespace, quotes or angle brackets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id<T> {
    value: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    pub fn new(value: impl Into<String>) -> Result<Self, IdError> {
        let value = value.into();
        validate_id(&value)?;
        Ok(Self {
            value,
            _marker: PhantomData,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_string(self) -> String {
        self.value
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl<T> AsRef<str> for Id<T> {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl<T> Borrow<str> for Id<T> {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl<T> FromStr for Id<T> {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_owned())
    }
}

impl<T> TryFrom<String> for Id<T> {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.value)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::new(value).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("id must not be empty")]
    Empty,
    #[error("id must not contain {0:?}")]
    ForbiddenChar(char),
}

fn validate_id(value: &str) -> Result<(), IdError> {
    if value.is_empty() {
        return Err(IdError::Empty);
    }
    if let Some(ch) = value
        .chars()
        .find(|ch| ch.is_whitespace() || matches!(ch, '"' | '\'' | '<' | '>' | '&'))
    {
        return Err(IdError::ForbiddenChar(ch));
    }
    Ok(())
}

const SUFFIX_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 9;

fn random_suffix(rng: &mut impl Rng) -> String {
    (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AnalysisIdTag {}
pub type AnalysisId = Id<AnalysisIdTag>;

impl AnalysisId {
    /// `analysis-<ISO-8601 millis>-<9 base36 chars>`.
    pub fn generate(rng: &mut impl Rng) -> Self {
        let stamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        Self {
            value: format!("analysis-{stamp}-{}", random_suffix(rng)),
            _marker: PhantomData,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AnnotationIdTag {}
pub type AnnotationId = Id<AnnotationIdTag>;

impl AnnotationId {
    /// `highlight-<unix millis>-<9 base36 chars>`.
    pub fn generate(rng: &mut impl Rng) -> Self {
        let millis = Utc::now().timestamp_millis();
        Self {
            value: format!("highlight-{millis}-{}", random_suffix(rng)),
            _marker: PhantomData,
        }
    }
}
