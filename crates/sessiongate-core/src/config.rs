//! Application configuration management.
//!
//! This module handles loading and saving the configuration, which holds
//! the GraphQL endpoint, idle timeout, optional password policy, preferred
//! form and the last used username.
//!
//! Configuration is stored at `~/.config/sessiongate/config.json`.
//! `SESSIONGATE_ENDPOINT` and `SESSIONGATE_USERNAME` override the file.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::flow::{AcceptAny, MinLength, PasswordPolicy};
use crate::models::ViewMode;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "sessiongate";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_ENDPOINT: &str = "http://localhost:4000/graphql";

/// Log out after 15 minutes without activity.
const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 15 * 60;

pub const ENDPOINT_ENV: &str = "SESSIONGATE_ENDPOINT";
pub const USERNAME_ENV: &str = "SESSIONGATE_USERNAME";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub endpoint: Option<String>,
    pub idle_timeout_secs: Option<u64>,
    pub min_password_length: Option<usize>,
    pub default_view: Option<ViewMode>,
    pub last_username: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path).context("Failed to read config file")?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Endpoint from the environment, else the file, else the default
    pub fn endpoint(&self) -> String {
        self.endpoint_with(std::env::var(ENDPOINT_ENV).ok())
    }

    fn endpoint_with(&self, env_value: Option<String>) -> String {
        env_value
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.endpoint.clone())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
    }

    /// Username to pre-fill: environment first, then the last successful login
    pub fn initial_username(&self) -> Option<String> {
        self.initial_username_with(std::env::var(USERNAME_ENV).ok())
    }

    fn initial_username_with(&self, env_value: Option<String>) -> Option<String> {
        env_value
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.last_username.clone())
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs.unwrap_or(DEFAULT_IDLE_TIMEOUT_SECS))
    }

    pub fn default_view(&self) -> ViewMode {
        self.default_view.unwrap_or_default()
    }

    pub fn password_policy(&self) -> Box<dyn PasswordPolicy> {
        match self.min_password_length {
            Some(len) if len > 0 => Box::new(MinLength(len)),
            _ => Box::new(AcceptAny),
        }
    }
}
