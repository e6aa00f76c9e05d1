// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::config::Config;
use anyhow::{Context, Result};
use std::env;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

const LOG_FILE_NAME: &str = "xpresa.log";

/// Installs the global subscriber. The terminal belongs to the UI, so all
/// output goes to `xpresa.log` in the configured log directory.
pub fn init(config: &Config) -> Result<PathBuf> {
    let log_dir = config.log_dir()?;
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("create log directory {}", log_dir.display()))?;

    let log_path = log_dir.join(LOG_FILE_NAME);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| {
            format!(
                "open log file {} -- set [log].dir or XPRESA_LOG_DIR to a writable directory",
                log_path.display()
            )
        })?;

    let filter = build_filter(env::var("RUST_LOG").ok().as_deref(), config.log_level());
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init()
        .context("install log subscriber")?;

    tracing::info!(path = %log_path.display(), "logging initialized");
    Ok(log_path)
}

/// `RUST_LOG` overrides the configured level unless it fails to parse.
fn build_filter(rust_log: Option<&str>, level: &str) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(level))
}
