// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Loader configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::environment::Host;
use crate::error::{LoaderError, Result};
use crate::namespace::{DEFAULT_COMPAT_ALIAS, DEFAULT_SOURCE_MAP_SUFFIX, WrapOptions};

/// Project configuration file name
pub const PROJECT_CONFIG_FILE: &str = "modboot.toml";

/// Prefix of configuration environment variables
pub const ENV_PREFIX: &str = "MODBOOT_";

/// Configuration for one loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Host variant
    pub host: Host,

    /// Retrieval base: URL or directory
    pub base: String,

    /// Skip the document-write phase
    pub force_async: bool,

    /// Log every module load
    pub debug: bool,

    /// Per-request fetch timeout in seconds
    pub fetch_timeout_secs: u64,

    /// Maximum number of retrievals in flight
    pub max_concurrency: usize,

    /// Names bound to the whole scope holder in every unit
    pub compat_aliases: Vec<String>,

    /// Appended to a module id to name its source map
    pub source_map_suffix: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            host: Host::Node,
            base: String::new(),
            force_async: false,
            debug: false,
            fetch_timeout_secs: 60,
            max_concurrency: 16,
            compat_aliases: vec![DEFAULT_COMPAT_ALIAS.to_string()],
            source_map_suffix: DEFAULT_SOURCE_MAP_SUFFIX.to_string(),
        }
    }
}

impl LoaderConfig {
    /// Load configuration from the default locations for `project_dir`.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let user_file = user_config_path();
        let project_file = project_dir.join(PROJECT_CONFIG_FILE);
        Self::load_from(
            user_file.as_deref(),
            Some(project_file.as_path()),
            std::env::vars(),
        )
    }

    /// Layer defaults, the user file, the project file and environment
    /// variables, in that order. Missing files are skipped.
    pub fn load_from(
        user_file: Option<&Path>,
        project_file: Option<&Path>,
        env: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self> {
        let mut config = LoaderConfig::default();

        for path in [user_file, project_file].into_iter().flatten() {
            if path.exists() {
                debug!("Reading config from {}", path.display());
                config.merge_from_file(path)?;
            }
        }

        config.load_from_env(env)?;
        config.validate()?;
        Ok(config)
    }

    /// Merge configuration from a TOML file.
    fn merge_from_file(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)?;
        let table: toml::Table = toml::from_str(&content)?;

        for (key, value) in table {
            let value = match value {
                toml::Value::String(s) => s,
                toml::Value::Array(items) => items
                    .into_iter()
                    .map(|item| match item {
                        toml::Value::String(s) => s,
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(","),
                other => other.to_string(),
            };
            self.set(&key, &value)?;
        }

        Ok(())
    }

    /// Apply `MODBOOT_*` variables.
    fn load_from_env(&mut self, env: impl IntoIterator<Item = (String, String)>) -> Result<()> {
        for (key, value) in env {
            if let Some(config_key) = key.strip_prefix(ENV_PREFIX) {
                self.set(&config_key.to_lowercase(), &value)?;
            }
        }
        Ok(())
    }

    /// Set a configuration value. Keys may use `-` or `_`; list values are
    /// comma separated.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let key = key.replace('-', "_");
        match key.as_str() {
            "host" => self.host = value.parse()?,
            "base" => self.base = value.to_string(),
            "force_async" => self.force_async = parse_bool(&key, value)?,
            "debug" => self.debug = parse_bool(&key, value)?,
            "fetch_timeout_secs" => self.fetch_timeout_secs = parse_number(&key, value)?,
            "max_concurrency" => self.max_concurrency = parse_number(&key, value)?,
            "compat_aliases" => {
                self.compat_aliases = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            "source_map_suffix" => self.source_map_suffix = value.to_string(),
            _ => warn!("Ignoring unknown config key '{}'", key),
        }
        Ok(())
    }

    /// Reject values no loader can work with
    pub fn validate(&self) -> Result<()> {
        if self.fetch_timeout_secs == 0 {
            return Err(LoaderError::config("fetch_timeout_secs must be at least 1"));
        }
        if self.max_concurrency == 0 {
            return Err(LoaderError::config("max_concurrency must be at least 1"));
        }
        if self.max_concurrency > Semaphore::MAX_PERMITS {
            return Err(LoaderError::config(format!(
                "max_concurrency must be at most {}",
                Semaphore::MAX_PERMITS
            )));
        }
        if self.source_map_suffix.is_empty() {
            return Err(LoaderError::config("source_map_suffix must not be empty"));
        }
        if let Some(alias) = self
            .compat_aliases
            .iter()
            .find(|alias| !modboot_engine::is_identifier(alias) || modboot_engine::is_keyword(alias))
        {
            return Err(LoaderError::config(format!(
                "compat alias '{}' is not an identifier",
                alias
            )));
        }
        Ok(())
    }

    /// Fetch timeout as a duration
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Wrapping settings derived from this config
    pub fn wrap_options(&self) -> WrapOptions {
        WrapOptions {
            compat_aliases: self.compat_aliases.clone(),
            source_map_suffix: self.source_map_suffix.clone(),
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(LoaderError::config(format!(
            "{} expects a boolean, got '{}'",
            key, value
        ))),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        LoaderError::config(format!("{} expects a number, got '{}'", key, value))
    })
}

/// Get the user config file path.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("modboot").join("config.toml"))
}
