//! Run settings: `config.toml` defaults overridden by command-line flags.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::AuthArgs;
use crate::paths;

/// A required identity setting is missing from both flags and config.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error(
        "no service account key given (use --service-account, WSAUDIT_SERVICE_ACCOUNT or service_account in config.toml)"
    )]
    MissingServiceAccount,

    #[error(
        "no admin email given (use --admin-email, WSAUDIT_ADMIN_EMAIL or admin_email in config.toml)"
    )]
    MissingAdminEmail,

    #[error("no domain given (use --domain, WSAUDIT_DOMAIN or domain in config.toml)")]
    MissingDomain,
}

/// Settings for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Path to the service account JSON key
    pub service_account: Option<String>,

    /// Principal impersonated for admin calls
    pub admin_email: Option<String>,

    /// Primary domain of the tenant
    pub domain: Option<String>,

    /// Directory receiving exports (each command has its own default)
    pub output_dir: Option<String>,

    /// Sleep between list pages
    pub page_delay_ms: u64,

    /// Sleep between users in per-user loops
    pub user_delay_ms: u64,

    /// Write a partial snapshot every this many records (0 disables)
    pub snapshot_interval: usize,

    /// Usage reports are requested for today minus this many days
    pub report_lag_days: i64,

    /// Drive activity lookback for drive discovery
    pub activity_lookback_days: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            service_account: None,
            admin_email: None,
            domain: None,
            output_dir: None,
            page_delay_ms: 500,
            user_delay_ms: 1000,
            snapshot_interval: 10,
            report_lag_days: 3,
            activity_lookback_days: 7,
        }
    }
}

impl Settings {
    /// Load settings from the config directory, or defaults if there is no file.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_file()?)
    }

    /// Load settings from a specific file, or defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Invalid TOML format in {}", path.display()))
    }

    /// Load from the config directory and apply command-line overrides.
    pub fn resolve(args: &AuthArgs) -> Result<Self> {
        Ok(Self::load()?.with_overrides(args))
    }

    /// Flags win over file values.
    pub fn with_overrides(mut self, args: &AuthArgs) -> Self {
        if let Some(sa) = &args.service_account {
            self.service_account = Some(sa.clone());
        }
        if let Some(email) = &args.admin_email {
            self.admin_email = Some(email.clone());
        }
        if let Some(domain) = &args.domain {
            self.domain = Some(domain.clone());
        }
        if let Some(dir) = &args.output_dir {
            self.output_dir = Some(dir.clone());
        }
        self
    }

    /// Expanded path of the service account key.
    pub fn service_account_path(&self) -> Result<PathBuf, ConfigError> {
        self.service_account
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(paths::expand)
            .ok_or(ConfigError::MissingServiceAccount)
    }

    /// The admin principal.
    pub fn admin_email(&self) -> Result<&str, ConfigError> {
        self.admin_email
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingAdminEmail)
    }

    /// The tenant domain, falling back to the admin email's domain part.
    pub fn domain(&self) -> Result<String, ConfigError> {
        if let Some(domain) = self.domain.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            return Ok(domain.to_string());
        }
        self.admin_email
            .as_deref()
            .and_then(|email| email.rsplit_once('@'))
            .map(|(_, domain)| domain.trim().to_string())
            .filter(|d| !d.is_empty())
            .ok_or(ConfigError::MissingDomain)
    }

    /// Output directory, or `default` when none is configured.
    pub fn output_dir_or(&self, default: &str) -> PathBuf {
        paths::expand(self.output_dir.as_deref().unwrap_or(default))
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn user_delay(&self) -> Duration {
        Duration::from_millis(self.user_delay_ms)
    }
}
