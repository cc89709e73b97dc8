//! Manifest requirement entries
//!
//! A requirement is one declaration of a dependency in one file: the raw
//! constraint text, where it lives, and how it is linked to other
//! declarations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a requirement resolves its package from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequirementSource {
    /// A hosted package registry
    Registry {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },
    /// A git repository, optionally pinned to a ref
    Git {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reference: Option<String>,
    },
    /// A local path
    Path { path: String },
}

impl RequirementSource {
    /// Returns true if both sources are the same kind of source
    pub fn same_kind(&self, other: &RequirementSource) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

/// How a requirement shares its version with other declarations
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequirementLink {
    /// Standalone requirement
    #[default]
    None,
    /// Version comes from a named property (e.g. `${foo.version}`)
    Property {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        declared_in: Option<String>,
    },
    /// Version comes from a dependency set declaring one version for a group
    DependencySet { group: String, version: String },
}

impl RequirementLink {
    /// Returns true if this requirement is not linked
    pub fn is_none(&self) -> bool {
        matches!(self, RequirementLink::None)
    }

    /// Returns true if both links name the same shared version
    pub fn shares_version_with(&self, other: &RequirementLink) -> bool {
        match (self, other) {
            (
                RequirementLink::Property {
                    name: a,
                    declared_in: file_a,
                },
                RequirementLink::Property {
                    name: b,
                    declared_in: file_b,
                },
            ) => {
                a == b
                    && match (file_a, file_b) {
                        (Some(x), Some(y)) => x == y,
                        _ => true,
                    }
            }
            (
                RequirementLink::DependencySet { group: a, .. },
                RequirementLink::DependencySet { group: b, .. },
            ) => a == b,
            _ => false,
        }
    }
}

/// One declaration of a dependency in a manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    /// Constraint text; `None` means unconstrained
    #[serde(default)]
    pub requirement: Option<String>,
    /// Manifest file the declaration lives in
    pub file: String,
    /// Group tags such as "dependencies" or "devDependencies"
    #[serde(default)]
    pub groups: Vec<String>,
    /// Where the package is resolved from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<RequirementSource>,
    /// Shared-version linkage
    #[serde(default, skip_serializing_if = "RequirementLink::is_none")]
    pub link: RequirementLink,
}

impl Requirement {
    /// Creates a new requirement declared in `file`
    pub fn new(requirement: Option<&str>, file: impl Into<String>) -> Self {
        Self {
            requirement: requirement.map(str::to_string),
            file: file.into(),
            groups: Vec::new(),
            source: None,
            link: RequirementLink::None,
        }
    }

    /// Sets the group tags (builder pattern)
    pub fn with_groups(mut self, groups: &[&str]) -> Self {
        self.groups = groups.iter().map(|g| g.to_string()).collect();
        self
    }

    /// Sets the source (builder pattern)
    pub fn with_source(mut self, source: RequirementSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Sets the shared-version link (builder pattern)
    pub fn with_link(mut self, link: RequirementLink) -> Self {
        self.link = link;
        self
    }

    /// Returns a copy carrying different constraint text
    pub fn with_requirement(&self, requirement: Option<String>) -> Self {
        Self {
            requirement,
            ..self.clone()
        }
    }

    /// Returns the constraint text, if any
    pub fn text(&self) -> Option<&str> {
        self.requirement.as_deref()
    }

    /// Returns true if the requirement is resolved from git
    pub fn is_git(&self) -> bool {
        matches!(self.source, Some(RequirementSource::Git { .. }))
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({})",
            self.requirement.as_deref().unwrap_or("*"),
            self.file
        )
    }
}
