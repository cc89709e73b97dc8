//! Release information supplied by the registry collaborator
//!
//! A `Release` is one published version of a package together with the
//! metadata the engine filters on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Information about a published package version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// The version string as published (e.g. "1.2.3", "23.6-jre")
    pub version: String,
    /// Withdrawn by the publisher
    #[serde(default)]
    pub yanked: bool,
    /// Marked deprecated by the publisher
    #[serde(default)]
    pub deprecated: bool,
    /// Distribution tags pointing at this release (e.g. "latest")
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dist_tags: Vec<String>,
    /// When this version was released
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released_at: Option<DateTime<Utc>>,
    /// Peer requirements declared by this release, keyed by package name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub peer_constraints: BTreeMap<String, String>,
    /// Commit the release was tagged from, for git-pinned dependencies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_sha: Option<String>,
}

impl Release {
    /// Create a new Release with no metadata
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            yanked: false,
            deprecated: false,
            dist_tags: Vec::new(),
            released_at: None,
            peer_constraints: BTreeMap::new(),
            commit_sha: None,
        }
    }

    /// Set the release date (builder pattern)
    pub fn with_released_at(mut self, released_at: DateTime<Utc>) -> Self {
        self.released_at = Some(released_at);
        self
    }

    /// Mark the release as yanked (builder pattern)
    pub fn yanked(mut self) -> Self {
        self.yanked = true;
        self
    }

    /// Mark the release as deprecated (builder pattern)
    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    /// Add a distribution tag (builder pattern)
    pub fn with_dist_tag(mut self, tag: impl Into<String>) -> Self {
        self.dist_tags.push(tag.into());
        self
    }

    /// Add a peer requirement (builder pattern)
    pub fn with_peer(mut self, name: impl Into<String>, requirement: impl Into<String>) -> Self {
        self.peer_constraints.insert(name.into(), requirement.into());
        self
    }

    /// Set the commit sha (builder pattern)
    pub fn with_commit_sha(mut self, sha: impl Into<String>) -> Self {
        self.commit_sha = Some(sha.into());
        self
    }

    /// Returns true if this release must never be offered
    pub fn is_withdrawn(&self) -> bool {
        self.yanked || self.deprecated
    }

    /// Returns the age of the release at `now`, if the release date is known
    pub fn age_at(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        self.released_at.map(|released| now - released)
    }
}
