//! CLI argument parsing module for depup-engine

use crate::config::EngineConfig;
use crate::domain::UnlockPolicy;
use crate::error::{AppError, ConfigError};
use crate::update::CooldownConfig;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Parse duration string in format: Nd (days), Nw (weeks), Nm (months)
pub fn parse_duration(s: &str) -> Result<Duration, ConfigError> {
    let s = s.trim();
    let invalid = || ConfigError::InvalidDuration {
        value: s.to_string(),
    };

    let (num_str, days_per_unit) = if let Some(n) = s.strip_suffix('d') {
        (n, 1)
    } else if let Some(n) = s.strip_suffix('w') {
        (n, 7)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 30)
    } else {
        return Err(invalid());
    };

    let num: u64 = num_str.parse().map_err(|_| invalid())?;
    num.checked_mul(days_per_unit * SECONDS_PER_DAY)
        .map(Duration::from_secs)
        .ok_or_else(invalid)
}

/// Dependency update decision engine
#[derive(Parser, Debug, Clone)]
#[command(
    name = "depup-engine",
    version,
    about = "Decide how each dependency of a project can be updated"
)]
pub struct CliArgs {
    /// Request file (JSON) with dependencies, releases and advisories
    pub request: PathBuf,

    /// Engine config file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Requirement rewrite strategy (overrides the config file)
    #[arg(long)]
    pub strategy: Option<String>,

    /// Highest unlock level to consider: none, own, all
    #[arg(long, default_value = "all")]
    pub unlock: UnlockPolicy,

    /// Only consider releases at least this old (e.g., 2w, 10d, 1m)
    #[arg(long, value_parser = parse_duration)]
    pub cooldown: Option<Duration>,

    /// Fail when ignore conditions filter out every newer version
    #[arg(long)]
    pub raise_on_ignored: bool,

    /// Probe the package manager for install-time peer conflicts
    #[arg(long)]
    pub probe: bool,

    /// Maximum dependencies evaluated at once
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Per-dependency timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Output results in JSON format
    #[arg(long)]
    pub json: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable quiet mode - minimal output
    #[arg(short, long)]
    pub quiet: bool,
}

impl CliArgs {
    /// Load the config file (or defaults) and apply command line overrides
    pub fn engine_config(&self) -> Result<EngineConfig, AppError> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::load(path)?,
            None => EngineConfig::default(),
        };

        if let Some(strategy) = &self.strategy {
            config.update_strategy = strategy.clone();
        }
        if let Some(cooldown) = self.cooldown {
            let days = u32::try_from(cooldown.as_secs() / SECONDS_PER_DAY).unwrap_or(u32::MAX);
            config.cooldown = Some(CooldownConfig::new(days));
        }
        if self.raise_on_ignored {
            config.raise_on_ignored = true;
        }
        if self.probe {
            config.probe.enabled = true;
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        Ok(config)
    }

    /// Progress bars only make sense for humans watching a terminal
    pub fn show_progress(&self) -> bool {
        !self.json && !self.quiet
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn test_default_args() {
        let args = CliArgs::parse_from(["depup-engine", "request.json"]);
        assert_eq!(args.request, PathBuf::from("request.json"));
        assert!(args.config.is_none());
        assert!(args.strategy.is_none());
        assert_eq!(args.unlock, UnlockPolicy::All);
        assert!(args.cooldown.is_none());
        assert!(!args.raise_on_ignored);
        assert!(!args.probe);
        assert!(!args.json);
        assert!(!args.verbose);
        assert!(!args.quiet);
        assert!(args.show_progress());
    }

    #[test]
    fn test_request_is_required() {
        assert!(CliArgs::try_parse_from(["depup-engine"]).is_err());
    }

    #[test]
    fn test_unlock_levels() {
        let args = CliArgs::parse_from(["depup-engine", "r.json", "--unlock", "own"]);
        assert_eq!(args.unlock, UnlockPolicy::Own);
        let args = CliArgs::parse_from(["depup-engine", "r.json", "--unlock", "none"]);
        assert_eq!(args.unlock, UnlockPolicy::None);
        assert!(CliArgs::try_parse_from(["depup-engine", "r.json", "--unlock", "some"]).is_err());
    }

    #[test]
    fn test_quiet_and_json_hide_progress() {
        let args = CliArgs::parse_from(["depup-engine", "r.json", "-q"]);
        assert!(!args.show_progress());
        let args = CliArgs::parse_from(["depup-engine", "r.json", "--json"]);
        assert!(!args.show_progress());
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("1d").unwrap(), Duration::from_secs(86400));
        assert_eq!(parse_duration("7d").unwrap(), Duration::from_secs(7 * 86400));
        assert_eq!(parse_duration("2w").unwrap(), Duration::from_secs(14 * 86400));
        assert_eq!(parse_duration("1m").unwrap(), Duration::from_secs(30 * 86400));
    }

    #[test]
    fn test_parse_duration_invalid() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("abc").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("10x").is_err());
        assert!(matches!(
            parse_duration("-1d"),
            Err(ConfigError::InvalidDuration { .. })
        ));
    }

    #[test]
    fn test_overrides_without_config_file() {
        let args = CliArgs::parse_from([
            "depup-engine",
            "r.json",
            "--strategy",
            "widen_ranges",
            "--cooldown",
            "2w",
            "--raise-on-ignored",
            "--probe",
            "--concurrency",
            "4",
            "--timeout",
            "5",
        ]);
        let config = args.engine_config().unwrap();
        assert_eq!(config.update_strategy, "widen_ranges");
        assert_eq!(config.cooldown, Some(CooldownConfig::new(14)));
        assert!(config.raise_on_ignored);
        assert!(config.probe.enabled);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn test_overrides_apply_on_top_of_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "update_strategy = \"lockfile_only\"\nconcurrency = 2").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let args = CliArgs::parse_from(["depup-engine", "r.json", "--config", &path]);
        let config = args.engine_config().unwrap();
        assert_eq!(config.update_strategy, "lockfile_only");
        assert_eq!(config.concurrency, 2);

        let args = CliArgs::parse_from([
            "depup-engine",
            "r.json",
            "--config",
            &path,
            "--strategy",
            "bump_versions",
        ]);
        assert_eq!(args.engine_config().unwrap().update_strategy, "bump_versions");
    }

    #[test]
    fn test_missing_config_file() {
        let args = CliArgs::parse_from(["depup-engine", "r.json", "-c", "/nonexistent.toml"]);
        assert!(args.engine_config().is_err());
    }
}
