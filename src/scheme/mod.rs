//! Per-ecosystem version and requirement semantics
//!
//! Every package manager maps to one static [`Scheme`], selected with
//! [`scheme_for`]. Schemes parse version text into [`Version`] values and
//! requirement text into [`VersionReq`] values; neither ever panics on bad
//! input.

pub(crate) mod java;
mod julia;
mod maven;
pub(crate) mod node;
mod requirement;
pub(crate) mod semantic;
mod version;

pub use node::NodeDialect;
pub use requirement::{Comparator, Op, PrereleasePolicy, VersionReq};
pub use version::{BumpKind, Version};

use crate::domain::PackageManager;
use crate::error::EngineError;
use std::cmp::Ordering;

/// Requirement syntax family, used by the requirement rewriter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    Node(NodeDialect),
    Julia,
    Java,
}

impl Grammar {
    /// Returns true if the grammar can express `a || b`
    pub fn supports_or(&self) -> bool {
        match self {
            Grammar::Node(dialect) => dialect.or_operator,
            Grammar::Julia => true,
            Grammar::Java => false,
        }
    }
}

/// Version parsing and ordering for one package manager
pub trait VersionScheme: Send + Sync {
    /// Returns the package manager this scheme belongs to
    fn package_manager(&self) -> PackageManager;

    /// Parses a version
    fn parse_version(&self, text: &str) -> Result<Version, EngineError>;

    fn is_valid(&self, text: &str) -> bool {
        self.parse_version(text).is_ok()
    }

    fn compare(&self, a: &Version, b: &Version) -> Ordering {
        a.cmp(b)
    }

    fn is_prerelease(&self, version: &Version) -> bool {
        version.is_prerelease()
    }
}

/// Requirement parsing for one package manager
pub trait RequirementScheme: Send + Sync {
    /// Parses requirement text; `None` and blank text mean "any version"
    fn parse_requirement(&self, text: Option<&str>) -> Result<VersionReq, EngineError>;

    fn satisfied_by(&self, requirement: &VersionReq, version: &Version) -> bool {
        requirement.matches(version)
    }

    fn grammar(&self) -> Grammar;
}

/// A complete scheme: versions plus requirements
pub trait Scheme: VersionScheme + RequirementScheme {}

impl<T: VersionScheme + RequirementScheme> Scheme for T {}

/// Semver-like versions with a node-style or Julia requirement grammar
#[derive(Debug)]
pub struct SemanticScheme {
    package_manager: PackageManager,
    grammar: Grammar,
}

impl VersionScheme for SemanticScheme {
    fn package_manager(&self) -> PackageManager {
        self.package_manager
    }

    fn parse_version(&self, text: &str) -> Result<Version, EngineError> {
        semantic::parse(text).ok_or_else(|| EngineError::invalid_version(text, self.package_manager))
    }
}

impl RequirementScheme for SemanticScheme {
    fn parse_requirement(&self, text: Option<&str>) -> Result<VersionReq, EngineError> {
        let parsed = match &self.grammar {
            Grammar::Node(dialect) => node::parse(dialect, text),
            Grammar::Julia => julia::parse(text),
            Grammar::Java => maven::parse(text),
        };
        parsed.map_err(|message| {
            EngineError::invalid_requirement(text.unwrap_or(""), self.package_manager, message)
        })
    }

    fn grammar(&self) -> Grammar {
        self.grammar
    }
}

/// Maven/Gradle qualifier versions
#[derive(Debug)]
pub struct JavaScheme {
    package_manager: PackageManager,
}

impl VersionScheme for JavaScheme {
    fn package_manager(&self) -> PackageManager {
        self.package_manager
    }

    fn parse_version(&self, text: &str) -> Result<Version, EngineError> {
        java::parse(text).ok_or_else(|| EngineError::invalid_version(text, self.package_manager))
    }
}

impl RequirementScheme for JavaScheme {
    fn parse_requirement(&self, text: Option<&str>) -> Result<VersionReq, EngineError> {
        maven::parse(text).map_err(|message| {
            EngineError::invalid_requirement(text.unwrap_or(""), self.package_manager, message)
        })
    }

    fn grammar(&self) -> Grammar {
        Grammar::Java
    }
}

static NPM: SemanticScheme = SemanticScheme {
    package_manager: PackageManager::Npm,
    grammar: Grammar::Node(node::NPM),
};

static CARGO: SemanticScheme = SemanticScheme {
    package_manager: PackageManager::Cargo,
    grammar: Grammar::Node(node::CARGO),
};

static PUB: SemanticScheme = SemanticScheme {
    package_manager: PackageManager::Pub,
    grammar: Grammar::Node(node::PUB),
};

static JULIA: SemanticScheme = SemanticScheme {
    package_manager: PackageManager::Julia,
    grammar: Grammar::Julia,
};

static MAVEN: JavaScheme = JavaScheme {
    package_manager: PackageManager::Maven,
};

static GRADLE: JavaScheme = JavaScheme {
    package_manager: PackageManager::Gradle,
};

/// Returns the scheme for a package manager
pub fn scheme_for(package_manager: PackageManager) -> &'static dyn Scheme {
    match package_manager {
        PackageManager::Npm => &NPM,
        PackageManager::Cargo => &CARGO,
        PackageManager::Pub => &PUB,
        PackageManager::Julia => &JULIA,
        PackageManager::Maven => &MAVEN,
        PackageManager::Gradle => &GRADLE,
    }
}
