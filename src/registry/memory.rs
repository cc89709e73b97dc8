//! Fixture-backed registry

use super::RegistryClient;
use crate::domain::{Dependency, PackageManager, Release};
use crate::error::RegistryError;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

const REGISTRY_NAME: &str = "in-memory";

#[derive(Debug, Deserialize)]
struct RegistryEntry {
    package_manager: PackageManager,
    name: String,
    #[serde(default)]
    releases: Vec<Release>,
}

/// Registry answering from releases held in memory, keyed by
/// (package manager, name)
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    releases: HashMap<(PackageManager, String), Vec<Release>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the releases of one package (builder pattern)
    pub fn with_releases(
        mut self,
        package_manager: PackageManager,
        name: impl Into<String>,
        releases: Vec<Release>,
    ) -> Self {
        self.releases.insert((package_manager, name.into()), releases);
        self
    }

    /// Load a registry from a JSON array of
    /// `{ "package_manager", "name", "releases" }` entries
    pub fn from_json(text: &str) -> Result<Self, RegistryError> {
        let entries: Vec<RegistryEntry> =
            serde_json::from_str(text).map_err(|e| RegistryError::InvalidResponse {
                package: String::new(),
                registry: REGISTRY_NAME.to_string(),
                message: format!("failed to parse JSON: {}", e),
            })?;
        Ok(entries.into_iter().fold(Self::new(), |registry, entry| {
            registry.with_releases(entry.package_manager, entry.name, entry.releases)
        }))
    }

    pub fn len(&self) -> usize {
        self.releases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }

    fn lookup(&self, dependency: &Dependency) -> Result<&[Release], RegistryError> {
        self.releases
            .get(&(dependency.package_manager, dependency.name.clone()))
            .map(Vec::as_slice)
            .ok_or_else(|| RegistryError::package_not_found(&dependency.name, REGISTRY_NAME))
    }
}

#[async_trait]
impl RegistryClient for InMemoryRegistry {
    fn registry_name(&self) -> &'static str {
        REGISTRY_NAME
    }

    async fn list_releases(&self, dependency: &Dependency) -> Result<Vec<Release>, RegistryError> {
        Ok(self.lookup(dependency)?.to_vec())
    }

    async fn release_metadata(
        &self,
        dependency: &Dependency,
        version: &str,
    ) -> Result<Option<Release>, RegistryError> {
        Ok(self
            .lookup(dependency)?
            .iter()
            .find(|r| r.version == version)
            .cloned())
    }
}
