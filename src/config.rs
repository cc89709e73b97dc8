//! Engine configuration
//!
//! `EngineConfig` is read from TOML and never mutated afterwards. Every
//! dependency evaluation receives the validated [`UpdateSettings`] by
//! reference.
//!
//! ```toml
//! update_strategy = "widen_ranges"
//! raise_on_ignored = false
//! concurrency = 10
//! timeout_secs = 60
//!
//! [ignore]
//! lodash = [">= 5"]
//!
//! [cooldown]
//! default_days = 3
//! semver_major_days = 30
//!
//! [probe]
//! enabled = true
//! max_retries = 2
//! ```

use crate::domain::UpdateStrategy;
use crate::error::{AppError, ConfigError, EngineError, IoError};
use crate::update::CooldownConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONCURRENCY: usize = 10;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Package manager probe settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Run the probe for npm peer conflicts
    pub enabled: bool,
    /// Command and arguments; `<name>@<version>` is appended
    pub command: Vec<String>,
    /// Scratch directory the command runs in; unset gives each call a
    /// fresh temporary directory
    pub scratch_dir: Option<PathBuf>,
    /// Retries on transient network failures
    pub max_retries: u32,
    /// Base backoff between retries
    pub base_delay_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            command: ["npm", "install", "--package-lock-only", "--ignore-scripts"]
                .into_iter()
                .map(String::from)
                .collect(),
            scratch_dir: None,
            max_retries: 2,
            base_delay_ms: 500,
        }
    }
}

/// Engine configuration as written in the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub update_strategy: String,
    pub raise_on_ignored: bool,
    /// Dependency name to ignore conditions (requirement strings)
    pub ignore: BTreeMap<String, Vec<String>>,
    pub cooldown: Option<CooldownConfig>,
    pub concurrency: usize,
    pub timeout_secs: u64,
    pub probe: ProbeConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            update_strategy: UpdateStrategy::default().name().to_string(),
            raise_on_ignored: false,
            ignore: BTreeMap::new(),
            cooldown: None,
            concurrency: DEFAULT_CONCURRENCY,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            probe: ProbeConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a config from TOML text; `path` is only used in error messages
    pub fn from_toml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load a config file
    pub fn load(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            return Err(IoError::not_found(path).into());
        }
        let text = std::fs::read_to_string(path).map_err(|e| IoError::generic(path, e))?;
        Ok(Self::from_toml(&text, path)?)
    }

    /// Per-dependency timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the config into the settings every checker receives
    pub fn validate(&self) -> Result<UpdateSettings, EngineError> {
        let strategy = self.update_strategy.parse::<UpdateStrategy>()?;

        if self.concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "concurrency".to_string(),
                message: "must be at least 1".to_string(),
            }
            .into());
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeout_secs".to_string(),
                message: "must be at least 1".to_string(),
            }
            .into());
        }
        if self.probe.enabled && self.probe.command.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "probe.command".to_string(),
                message: "must name a program".to_string(),
            }
            .into());
        }
        if let Some(cooldown) = &self.cooldown {
            let empty = cooldown
                .include
                .iter()
                .chain(&cooldown.exclude)
                .any(|p| p.trim().is_empty());
            if empty {
                return Err(ConfigError::InvalidValue {
                    field: "cooldown".to_string(),
                    message: "include/exclude patterns must not be empty".to_string(),
                }
                .into());
            }
        }
        for (dependency, conditions) in &self.ignore {
            if let Some(blank) = conditions.iter().find(|c| c.trim().is_empty()) {
                return Err(EngineError::invalid_ignore_condition(
                    dependency,
                    blank,
                    "condition is empty",
                ));
            }
        }

        Ok(UpdateSettings {
            strategy,
            raise_on_ignored: self.raise_on_ignored,
            ignore: self.ignore.clone(),
            cooldown: self.cooldown.clone().filter(|c| !c.is_disabled()),
        })
    }
}

/// Validated, typed settings for one evaluation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateSettings {
    pub strategy: UpdateStrategy,
    pub raise_on_ignored: bool,
    pub ignore: BTreeMap<String, Vec<String>>,
    pub cooldown: Option<CooldownConfig>,
}

impl UpdateSettings {
    pub fn new(strategy: UpdateStrategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    pub fn with_raise_on_ignored(mut self, raise: bool) -> Self {
        self.raise_on_ignored = raise;
        self
    }

    /// Add ignore conditions for one dependency
    pub fn with_ignore(mut self, dependency: &str, conditions: &[&str]) -> Self {
        self.ignore
            .entry(dependency.to_string())
            .or_default()
            .extend(conditions.iter().map(|c| c.to_string()));
        self
    }

    pub fn with_cooldown(mut self, cooldown: CooldownConfig) -> Self {
        self.cooldown = Some(cooldown);
        self
    }

    /// Ignore conditions that apply to `dependency`
    pub fn ignore_conditions(&self, dependency: &str) -> &[String] {
        self.ignore
            .get(dependency)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
