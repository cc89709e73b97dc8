//! Error types using thiserror
//!
//! Error hierarchy:
//! - EngineError: invalid input, ignore signalling and caller contract violations
//! - RegistryError: failures of the release registry collaborator
//! - ProbeError: failures of the package manager probe
//! - ConfigError: malformed engine configuration
//! - IoError: file system failures surfaced by the binary

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::PackageManager;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Decision engine errors
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Registry collaborator errors
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Configuration related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// IO related errors
    #[error(transparent)]
    Io(#[from] IoError),
}

/// Errors raised by the decision engine itself
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Version text the scheme cannot parse
    #[error("invalid {package_manager} version '{value}'")]
    InvalidVersion {
        value: String,
        package_manager: PackageManager,
    },

    /// Requirement text the scheme cannot parse
    #[error("invalid {package_manager} requirement '{value}': {message}")]
    InvalidRequirement {
        value: String,
        package_manager: PackageManager,
        message: String,
    },

    /// Ignore condition that does not parse as a requirement
    #[error("invalid ignore condition '{condition}' for '{dependency}': {message}")]
    InvalidIgnoreCondition {
        dependency: String,
        condition: String,
        message: String,
    },

    /// Update strategy name that is not recognised
    #[error("unknown update strategy '{value}': expected 'lockfile_only', 'widen_ranges', 'bump_versions' or 'bump_versions_if_necessary'")]
    UnknownUpdateStrategy { value: String },

    /// Unlock policy name that is not recognised
    #[error("unknown unlock policy '{value}': expected 'none', 'own' or 'all'")]
    UnknownUnlockPolicy { value: String },

    /// Package manager id that has no scheme
    #[error("unsupported package manager '{value}'")]
    UnsupportedPackageManager { value: String },

    /// Every newer release was removed by ignore conditions
    #[error("all versions of '{dependency}' newer than the current one are ignored")]
    AllVersionsIgnored { dependency: String },

    /// A security fix was requested for a dependency that is not vulnerable
    #[error("dependency '{dependency}' at {version} is not vulnerable")]
    DependencyNotVulnerable { dependency: String, version: String },

    /// Configuration failure detected while building a checker
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors related to the release registry collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Package not found in registry
    #[error("package '{package}' not found in {registry} registry")]
    PackageNotFound { package: String, registry: String },

    /// Network request failed
    #[error("failed to fetch package '{package}' from {registry}: {message}")]
    NetworkError {
        package: String,
        registry: String,
        message: String,
    },

    /// Rate limit exceeded
    #[error("rate limit exceeded for {registry} registry")]
    RateLimitExceeded { registry: String },

    /// Invalid response from registry
    #[error("invalid response from {registry} for '{package}': {message}")]
    InvalidResponse {
        package: String,
        registry: String,
        message: String,
    },

    /// Timeout
    #[error("timeout while fetching '{package}' from {registry}")]
    Timeout { package: String, registry: String },
}

/// Errors related to the package manager probe
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// The probe command could not be started
    #[error("failed to run '{command}': {message}")]
    Spawn { command: String, message: String },

    /// The probe failed with a network-class error
    #[error("transient failure running '{command}': {message}")]
    Transient { command: String, message: String },

    /// Transient failures persisted through every retry
    #[error("'{command}' still failing after {attempts} attempts: {message}")]
    RetriesExhausted {
        command: String,
        attempts: u32,
        message: String,
    },
}

/// Errors related to configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Invalid duration format
    #[error("invalid duration format '{value}': expected format like '2w', '10d', '1m'")]
    InvalidDuration { value: String },

    /// Config file could not be parsed
    #[error("failed to parse config {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    /// A field holds a value outside its domain
    #[error("invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// Conflicting options
    #[error("conflicting options: {message}")]
    ConflictingOptions { message: String },
}

/// Errors related to IO operations
#[derive(Error, Debug)]
pub enum IoError {
    /// File not found
    #[error("file not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic IO error
    #[error("IO error at {path}: {source}")]
    Generic {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl EngineError {
    /// Creates a new InvalidVersion error
    pub fn invalid_version(value: impl Into<String>, package_manager: PackageManager) -> Self {
        EngineError::InvalidVersion {
            value: value.into(),
            package_manager,
        }
    }

    /// Creates a new InvalidRequirement error
    pub fn invalid_requirement(
        value: impl Into<String>,
        package_manager: PackageManager,
        message: impl Into<String>,
    ) -> Self {
        EngineError::InvalidRequirement {
            value: value.into(),
            package_manager,
            message: message.into(),
        }
    }

    /// Creates a new InvalidIgnoreCondition error
    pub fn invalid_ignore_condition(
        dependency: impl Into<String>,
        condition: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        EngineError::InvalidIgnoreCondition {
            dependency: dependency.into(),
            condition: condition.into(),
            message: message.into(),
        }
    }

    /// Creates a new AllVersionsIgnored error
    pub fn all_versions_ignored(dependency: impl Into<String>) -> Self {
        EngineError::AllVersionsIgnored {
            dependency: dependency.into(),
        }
    }

    /// Creates a new DependencyNotVulnerable error
    pub fn not_vulnerable(dependency: impl Into<String>, version: impl Into<String>) -> Self {
        EngineError::DependencyNotVulnerable {
            dependency: dependency.into(),
            version: version.into(),
        }
    }

    /// Returns true for errors that must halt a whole batch
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EngineError::DependencyNotVulnerable { .. }
                | EngineError::UnknownUpdateStrategy { .. }
                | EngineError::UnknownUnlockPolicy { .. }
                | EngineError::InvalidIgnoreCondition { .. }
                | EngineError::Config(_)
        )
    }
}

impl RegistryError {
    /// Creates a new PackageNotFound error
    pub fn package_not_found(package: impl Into<String>, registry: impl Into<String>) -> Self {
        RegistryError::PackageNotFound {
            package: package.into(),
            registry: registry.into(),
        }
    }

    /// Creates a new NetworkError
    pub fn network_error(
        package: impl Into<String>,
        registry: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        RegistryError::NetworkError {
            package: package.into(),
            registry: registry.into(),
            message: message.into(),
        }
    }

    /// Creates a new RateLimitExceeded error
    pub fn rate_limit_exceeded(registry: impl Into<String>) -> Self {
        RegistryError::RateLimitExceeded {
            registry: registry.into(),
        }
    }

    /// Creates a new Timeout error
    pub fn timeout(package: impl Into<String>, registry: impl Into<String>) -> Self {
        RegistryError::Timeout {
            package: package.into(),
            registry: registry.into(),
        }
    }

    /// Returns true if the request may succeed on retry
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RegistryError::NetworkError { .. }
                | RegistryError::RateLimitExceeded { .. }
                | RegistryError::Timeout { .. }
        )
    }
}

impl ProbeError {
    /// Returns true if the failure may succeed on retry
    pub fn is_transient(&self) -> bool {
        matches!(self, ProbeError::Transient { .. })
    }
}

impl IoError {
    /// Creates a new NotFound error
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        IoError::NotFound { path: path.into() }
    }

    /// Creates a new Generic IO error
    pub fn generic(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IoError::Generic {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_invalid_version() {
        let err = EngineError::invalid_version("not.a.version!", PackageManager::Npm);
        let msg = format!("{}", err);
        assert!(msg.contains("invalid npm version"));
        assert!(msg.contains("not.a.version!"));
    }

    #[test]
    fn test_engine_error_invalid_requirement() {
        let err = EngineError::invalid_requirement(">>1.0", PackageManager::Cargo, "bad operator");
        let msg = format!("{}", err);
        assert!(msg.contains("invalid Cargo requirement"));
        assert!(msg.contains(">>1.0"));
        assert!(msg.contains("bad operator"));
    }

    #[test]
    fn test_engine_error_all_versions_ignored() {
        let err = EngineError::all_versions_ignored("lodash");
        assert_eq!(
            err.to_string(),
            "all versions of 'lodash' newer than the current one are ignored"
        );
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_engine_error_not_vulnerable_is_fatal() {
        let err = EngineError::not_vulnerable("retry", "3.0.0");
        let msg = format!("{}", err);
        assert!(msg.contains("'retry'"));
        assert!(msg.contains("not vulnerable"));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_engine_error_unknown_strategy() {
        let err = EngineError::UnknownUpdateStrategy {
            value: "yolo".to_string(),
        };
        assert!(err.to_string().contains("unknown update strategy 'yolo'"));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_engine_error_from_config_error() {
        let err: EngineError = ConfigError::InvalidValue {
            field: "cooldown.include".to_string(),
            message: "bad pattern".to_string(),
        }
        .into();
        assert!(err.to_string().contains("cooldown.include"));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_registry_error_package_not_found() {
        let err = RegistryError::package_not_found("nonexistent-package", "npm");
        let msg = format!("{}", err);
        assert!(msg.contains("package 'nonexistent-package' not found"));
        assert!(msg.contains("npm"));
    }

    #[test]
    fn test_registry_error_network() {
        let err = RegistryError::network_error("lodash", "npm", "connection refused");
        let msg = format!("{}", err);
        assert!(msg.contains("failed to fetch"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn test_registry_error_rate_limit() {
        let err = RegistryError::rate_limit_exceeded("crates.io");
        assert!(err.to_string().contains("rate limit exceeded"));
    }

    #[test]
    fn test_registry_error_timeout() {
        let err = RegistryError::timeout("serde", "crates.io");
        let msg = format!("{}", err);
        assert!(msg.contains("timeout"));
        assert!(msg.contains("serde"));
    }

    #[test]
    fn test_registry_error_is_retryable() {
        assert!(RegistryError::timeout("serde", "crates.io").is_retryable());
        assert!(RegistryError::rate_limit_exceeded("npm").is_retryable());
        assert!(RegistryError::network_error("serde", "crates.io", "reset").is_retryable());
        assert!(!RegistryError::package_not_found("serde", "crates.io").is_retryable());
    }

    #[test]
    fn test_probe_error_transient() {
        let transient = ProbeError::Transient {
            command: "npm install".to_string(),
            message: "ECONNRESET".to_string(),
        };
        assert!(transient.is_transient());

        let exhausted = ProbeError::RetriesExhausted {
            command: "npm install".to_string(),
            attempts: 3,
            message: "ECONNRESET".to_string(),
        };
        assert!(!exhausted.is_transient());
        assert!(exhausted.to_string().contains("3 attempts"));
    }

    #[test]
    fn test_config_error_invalid_duration() {
        let err = ConfigError::InvalidDuration {
            value: "abc".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("invalid duration format"));
        assert!(msg.contains("abc"));
    }

    #[test]
    fn test_io_error_not_found() {
        let err = IoError::not_found("/path/to/request.json");
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_app_error_from_engine_error() {
        let app_err: AppError = EngineError::all_versions_ignored("pkg").into();
        assert!(format!("{}", app_err).contains("'pkg'"));
    }

    #[test]
    fn test_app_error_from_config_error() {
        let config_err = ConfigError::InvalidDuration {
            value: "bad".to_string(),
        };
        let app_err: AppError = config_err.into();
        let msg = format!("{}", app_err);
        assert!(msg.contains("invalid duration format"));
    }

    #[test]
    fn test_error_debug_trait() {
        let err = IoError::not_found("/test");
        let debug = format!("{:?}", err);
        assert!(debug.contains("NotFound"));
    }
}
