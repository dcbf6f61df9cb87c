// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Infolens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Infolens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Command line and environment configuration.

use std::path::{Path, PathBuf};

use clap::Parser;
use thiserror::Error;

use crate::generate::DEFAULT_MODEL;
use crate::store::WriteDurability;

/// Secondary variable consulted when `GEMINI_API_KEY` is unset.
pub const FALLBACK_API_KEY_ENV: &str = "API_KEY";
pub const LOG_FILTER_ENV: &str = "INFOLENS_LOG";
pub const LOG_FILE_NAME: &str = "infolens.log";

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(
    name = "infolens",
    version,
    about = "Turn text into UPSC-style infographics and highlight them in the terminal"
)]
pub struct Cli {
    /// Where analyses, exports and the log file live
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,
    /// Gemini API key (falls back to API_KEY)
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
    /// Gemini model used for generation
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,
    /// Start with built-in demo analyses held in memory; nothing is saved
    #[arg(long)]
    pub demo: bool,
    /// fsync every save
    #[arg(long)]
    pub durable_writes: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("could not determine a data directory; pass --data-dir")]
    NoDataDir,
    #[error("model name must not be empty")]
    EmptyModel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    /// `None` disables generation.
    pub api_key: Option<String>,
    pub model: String,
    pub demo: bool,
    pub durability: WriteDurability,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::resolve(Cli::parse(), |name| std::env::var(name).ok())
    }

    /// Fills defaults that clap cannot express. `env` looks up environment variables.
    pub fn resolve(cli: Cli, env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let data_dir = match cli.data_dir {
            Some(dir) => dir,
            None => default_data_dir().ok_or(ConfigError::NoDataDir)?,
        };

        let model = cli.model.trim().to_owned();
        if model.is_empty() {
            return Err(ConfigError::EmptyModel);
        }

        let api_key = cli
            .api_key
            .or_else(|| env(FALLBACK_API_KEY_ENV))
            .map(|key| key.trim().to_owned())
            .filter(|key| !key.is_empty());

        Ok(Self {
            data_dir,
            api_key,
            model,
            demo: cli.demo,
            durability: if cli.durable_writes {
                WriteDurability::Durable
            } else {
                WriteDurability::BestEffort
            },
        })
    }

    pub fn exports_dir(&self) -> PathBuf {
        self.data_dir.join("exports")
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE_NAME)
    }

    pub fn store_dir(&self) -> &Path {
        &self.data_dir
    }
}

fn default_data_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "Infolens", "infolens").map(|dirs| dirs.data_dir().to_path_buf())
}
