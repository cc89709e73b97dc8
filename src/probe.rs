//! Package manager probe for install-time peer conflicts
//!
//! This module provides:
//! - The `PackageManagerProbe` trait the engine asks for a hypothetical install
//! - A command-based probe running in a scratch directory
//! - A bounded retry policy with jittered backoff for network-class failures

use crate::config::ProbeConfig;
use crate::domain::Dependency;
use crate::error::ProbeError;
use async_trait::async_trait;
use rand::Rng;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

/// Output fragments that mark a failure as worth retrying
const TRANSIENT_MARKERS: &[&str] = &[
    "ECONNRESET",
    "ETIMEDOUT",
    "EAI_AGAIN",
    "socket hang up",
    "network timeout",
];

/// Returns true if package manager output points at a network hiccup
pub fn is_transient_failure(output: &str) -> bool {
    TRANSIENT_MARKERS.iter().any(|marker| output.contains(marker))
}

/// Runs a hypothetical install and reports what the package manager printed
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PackageManagerProbe: Send + Sync {
    /// Install `dependency` at `version` and return the combined output
    async fn probe(&self, dependency: &Dependency, version: &str) -> Result<String, ProbeError>;
}

/// How often and how patiently transient failures are retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2, Duration::from_millis(500))
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    pub fn from_config(config: &ProbeConfig) -> Self {
        Self::new(config.max_retries, Duration::from_millis(config.base_delay_ms))
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before retry number `attempt` (0-based): exponential, plus up
    /// to one base delay of jitter
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponential = self.base_delay.saturating_mul(2u32.saturating_pow(attempt));
        let base_ms = self.base_delay.as_millis() as u64;
        let jitter = if base_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..base_ms)
        };
        exponential + Duration::from_millis(jitter)
    }

    /// Run `call`, retrying while it fails transiently
    pub async fn run<T, F, Fut>(&self, command: &str, mut call: F) -> Result<T, ProbeError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProbeError>>,
    {
        let mut attempt = 0;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let delay = self.delay_for(attempt);
                    attempt += 1;
                    debug!(command = %command, attempt, "retrying probe in {:?}: {}", delay, e);
                    tokio::time::sleep(delay).await;
                }
                Err(ProbeError::Transient { message, .. }) => {
                    return Err(ProbeError::RetriesExhausted {
                        command: command.to_string(),
                        attempts: attempt + 1,
                        message,
                    })
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Probe that runs a package manager command in a scratch directory
pub struct CommandProbe {
    command: Vec<String>,
    /// Fixed working directory; `None` gives every run its own
    scratch_dir: Option<PathBuf>,
    retry: RetryPolicy,
}

impl CommandProbe {
    /// Create a probe running `command` in a fresh temporary directory per call
    pub fn new(command: Vec<String>) -> Self {
        Self {
            command,
            scratch_dir: None,
            retry: RetryPolicy::default(),
        }
    }

    /// Build the probe from config
    pub fn from_config(config: &ProbeConfig) -> Self {
        let probe = Self::new(config.command.clone()).with_retry(RetryPolicy::from_config(config));
        match &config.scratch_dir {
            Some(dir) => probe.with_scratch_dir(dir.clone()),
            None => probe,
        }
    }

    /// Run every call in `dir` instead of a fresh directory (builder pattern)
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    /// Set the retry policy (builder pattern)
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn display(&self) -> String {
        self.command.join(" ")
    }

    async fn run_once(&self, target: &str) -> Result<String, ProbeError> {
        let Some((program, args)) = self.command.split_first() else {
            return Err(ProbeError::Spawn {
                command: String::new(),
                message: "empty command".to_string(),
            });
        };

        let fresh;
        let dir: &Path = match &self.scratch_dir {
            Some(dir) => dir,
            None => {
                fresh = tempfile::tempdir().map_err(|e| ProbeError::Spawn {
                    command: self.display(),
                    message: format!("cannot create scratch directory: {}", e),
                })?;
                fresh.path()
            }
        };

        let output = Command::new(program)
            .args(args)
            .arg(target)
            .current_dir(dir)
            .output()
            .await
            .map_err(|e| ProbeError::Spawn {
                command: self.display(),
                message: e.to_string(),
            })?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() && is_transient_failure(&text) {
            return Err(ProbeError::Transient {
                command: self.display(),
                message: text.lines().last().unwrap_or_default().to_string(),
            });
        }
        Ok(text)
    }
}

#[async_trait]
impl PackageManagerProbe for CommandProbe {
    async fn probe(&self, dependency: &Dependency, version: &str) -> Result<String, ProbeError> {
        let target = format!("{}@{}", dependency.name, version);
        debug!(command = %self.display(), target = %target, "running probe");
        self.retry
            .run(&self.display(), || self.run_once(&target))
            .await
    }
}
