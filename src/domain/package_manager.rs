//! Package manager identifiers for supported ecosystems

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported package managers
///
/// Each package manager selects one version scheme and one requirement
/// grammar; see [`crate::scheme::scheme_for`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PackageManager {
    /// npm and yarn (package.json)
    #[serde(rename = "npm_and_yarn", alias = "npm", alias = "yarn")]
    Npm,
    /// Cargo (Cargo.toml)
    #[serde(rename = "cargo")]
    Cargo,
    /// Dart pub (pubspec.yaml)
    #[serde(rename = "pub", alias = "dart")]
    Pub,
    /// Julia Pkg (Project.toml)
    #[serde(rename = "julia")]
    Julia,
    /// Maven (pom.xml)
    #[serde(rename = "maven")]
    Maven,
    /// Gradle (build.gradle, build.gradle.kts)
    #[serde(rename = "gradle")]
    Gradle,
}

impl PackageManager {
    /// Returns the stable identifier used in requests and configuration
    pub fn id(&self) -> &'static str {
        match self {
            PackageManager::Npm => "npm_and_yarn",
            PackageManager::Cargo => "cargo",
            PackageManager::Pub => "pub",
            PackageManager::Julia => "julia",
            PackageManager::Maven => "maven",
            PackageManager::Gradle => "gradle",
        }
    }

    /// Returns the display name for this package manager
    pub fn display_name(&self) -> &'static str {
        match self {
            PackageManager::Npm => "npm",
            PackageManager::Cargo => "Cargo",
            PackageManager::Pub => "Pub",
            PackageManager::Julia => "Julia",
            PackageManager::Maven => "Maven",
            PackageManager::Gradle => "Gradle",
        }
    }

    /// Returns the registry name used in error messages
    pub fn registry_name(&self) -> &'static str {
        match self {
            PackageManager::Npm => "npm",
            PackageManager::Cargo => "crates.io",
            PackageManager::Pub => "pub.dev",
            PackageManager::Julia => "General",
            PackageManager::Maven | PackageManager::Gradle => "Maven Central",
        }
    }

    /// Returns true if versions use the Maven qualifier ordering
    pub fn uses_java_versions(&self) -> bool {
        matches!(self, PackageManager::Maven | PackageManager::Gradle)
    }

    /// Returns true if peer dependency constraints are modelled
    pub fn has_peer_dependencies(&self) -> bool {
        matches!(self, PackageManager::Npm)
    }

    /// Returns all supported package managers
    pub fn all() -> &'static [PackageManager] {
        &[
            PackageManager::Npm,
            PackageManager::Cargo,
            PackageManager::Pub,
            PackageManager::Julia,
            PackageManager::Maven,
            PackageManager::Gradle,
        ]
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for PackageManager {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "npm_and_yarn" | "npm" | "yarn" => Ok(PackageManager::Npm),
            "cargo" => Ok(PackageManager::Cargo),
            "pub" | "dart" => Ok(PackageManager::Pub),
            "julia" => Ok(PackageManager::Julia),
            "maven" => Ok(PackageManager::Maven),
            "gradle" => Ok(PackageManager::Gradle),
            _ => Err(EngineError::UnsupportedPackageManager {
                value: s.to_string(),
            }),
        }
    }
}
