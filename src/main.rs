// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Infolens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Infolens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Infolens CLI entrypoint.
//!
//! Runs the interactive TUI. Logs go to `<data-dir>/infolens.log` because the terminal belongs
//! to the UI; set `INFOLENS_LOG` to change the filter.

use std::error::Error;
use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};

use infolens::config::{Config, LOG_FILTER_ENV};
use infolens::generate::GeminiClient;
use infolens::model::fixtures::demo_analyses;
use infolens::store::{AnalysisStore, FolderBlobStore, MemoryBlobStore};
use infolens::tui::TuiOptions;
use infolens::workspace::Workspace;
use tracing_subscriber::EnvFilter;

fn init_logging(config: &Config) -> Result<(), Box<dyn Error + Send + Sync>> {
    let file = OpenOptions::new().create(true).append(true).open(config.log_path())?;
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()?;
    Ok(())
}

fn open_store(config: &Config) -> AnalysisStore {
    if config.demo {
        return AnalysisStore::with_analyses(Box::new(MemoryBlobStore::new()), demo_analyses());
    }
    let blob = FolderBlobStore::new(config.store_dir()).with_durability(config.durability);
    AnalysisStore::load(Box::new(blob))
}

fn run() -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = Config::from_env()?;
    std::fs::create_dir_all(&config.data_dir)?;
    init_logging(&config)?;
    tracing::info!(
        data_dir = %config.data_dir.display(),
        demo = config.demo,
        model = %config.model,
        generation = config.api_key.is_some(),
        "starting infolens"
    );

    let generator = config
        .api_key
        .as_deref()
        .map(|key| GeminiClient::new(key, config.model.as_str()))
        .transpose()?
        .map(Arc::new);
    if generator.is_none() {
        tracing::warn!("no API key configured; generation is disabled");
    }

    let mut workspace = Workspace::new(open_store(&config), generator.is_some());
    if workspace.presentation().is_none() {
        if let Some(first) = workspace.store().analyses().first().map(|a| a.id().clone()) {
            workspace.select(&first);
        }
    }

    let options = TuiOptions {
        exports_dir: config.exports_dir(),
        durability: config.durability,
    };

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    let handle = runtime.handle().clone();
    let tui_result = runtime.block_on(async move {
        tokio::task::spawn_blocking(move || {
            infolens::tui::run(workspace, generator, handle, options).map_err(|err| err.to_string())
        })
        .await
    })?;
    tui_result?;

    tracing::info!("infolens exited");
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        tracing::error!(error = %err, "infolens failed");
        eprintln!("infolens: {err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use infolens::config::{Cli, Config};

    use super::init_logging;

    #[test]
    fn logging_goes_to_the_data_dir_and_initialises_once() {
        let dir = std::env::temp_dir().join(format!("infolens-main-log-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        let cli = Cli::try_parse_from(["infolens", "--data-dir", dir.to_str().expect("utf-8 temp dir")])
            .expect("parse args");
        let config = Config::resolve(cli, |_| None).expect("config");

        init_logging(&config).expect("first init");
        assert!(config.log_path().exists());

        let again = init_logging(&config).expect_err("global subscriber is already set");
        assert!(!again.to_string().is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
