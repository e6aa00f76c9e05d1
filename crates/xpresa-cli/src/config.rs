// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use xpresa_app::{DASHBOARD_PATH, Location, ProfileId};

const CONFIG_VERSION: i64 = 1;
const DEFAULT_LOG_LEVEL: &str = "info";
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            storage: Storage::default(),
            ui: Ui::default(),
            session: SessionConfig::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Storage {
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ui {
    pub start_location: Option<String>,
    pub recent_expenses: Option<i64>,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            start_location: Some(DASHBOARD_PATH.to_owned()),
            recent_expenses: Some(xpresa_db::DEFAULT_RECENT_EXPENSES as i64),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionConfig {
    pub user_id: Option<i64>,
    pub session_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub dir: Option<String>,
    pub level: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            dir: None,
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("XPRESA_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set XPRESA_CONFIG_PATH to the config file")
        })?;

        let app_dir = config_root.join(xpresa_db::APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no version. Add `version = 1` at the top and keep values under [storage], [ui], [session], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(db_path) = &self.storage.db_path {
            xpresa_db::validate_db_path(db_path)?;
        }

        if let Some(start) = &self.ui.start_location {
            if !start.starts_with('/') {
                bail!(
                    "ui.start_location in {} must be an absolute path such as /dashboard, got {start:?}",
                    path.display()
                );
            }
            Location::parse(start).with_context(|| {
                format!("ui.start_location in {} is not a valid location", path.display())
            })?;
        }

        if let Some(limit) = self.ui.recent_expenses
            && limit <= 0
        {
            bail!(
                "ui.recent_expenses in {} must be positive, got {}",
                path.display(),
                limit
            );
        }

        if let Some(user_id) = self.session.user_id
            && user_id <= 0
        {
            bail!(
                "session.user_id in {} must be positive, got {}",
                path.display(),
                user_id
            );
        }

        if let Some(level) = &self.log.level
            && !LOG_LEVELS.contains(&level.as_str())
        {
            bail!(
                "log.level in {} must be one of {}, got {level:?}",
                path.display(),
                LOG_LEVELS.join(", ")
            );
        }

        Ok(())
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.storage.db_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => xpresa_db::default_db_path(),
        }
    }

    pub fn start_location(&self) -> Result<Location> {
        Location::parse(self.ui.start_location.as_deref().unwrap_or(DASHBOARD_PATH))
    }

    pub fn recent_expenses(&self) -> usize {
        self.ui
            .recent_expenses
            .and_then(|limit| usize::try_from(limit).ok())
            .unwrap_or(xpresa_db::DEFAULT_RECENT_EXPENSES)
    }

    pub fn user_id(&self) -> Option<ProfileId> {
        self.session.user_id.map(ProfileId::new)
    }

    pub fn session_path(&self) -> Result<PathBuf> {
        match &self.session.session_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => xpresa_db::default_session_path(),
        }
    }

    /// `XPRESA_LOG_DIR` wins over `[log].dir`; both fall back to the data dir.
    pub fn log_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = env::var_os("XPRESA_LOG_DIR") {
            return Ok(PathBuf::from(dir));
        }
        match &self.log.dir {
            Some(dir) => Ok(PathBuf::from(dir)),
            None => xpresa_db::data_dir(),
        }
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# xpresa config\n# Place this file at: {}\n\nversion = 1\n\n[storage]\n# Optional. Default is platform data dir (for example ~/.local/share/xpresa/xpresa.db)\n# db_path = \"/absolute/path/to/xpresa.db\"\n\n[ui]\nstart_location = \"{}\"\nrecent_expenses = {}\n\n[session]\n# Profile id of the signed-in seller; falls back to the session file when unset.\n# user_id = 1\n# session_path = \"/absolute/path/to/session.json\"\n\n[log]\n# dir = \"/absolute/path/to/logs\"\nlevel = \"{}\"\n",
            path.display(),
            DASHBOARD_PATH,
            xpresa_db::DEFAULT_RECENT_EXPENSES,
            DEFAULT_LOG_LEVEL,
        )
    }
}
