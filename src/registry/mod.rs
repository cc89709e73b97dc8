//! Release registry collaborators
//!
//! This module provides:
//! - The `RegistryClient` trait the engine fetches releases through
//! - An in-memory registry loaded from JSON fixtures
//! - A retrying wrapper with exponential backoff

mod memory;
mod retry;

pub use memory::InMemoryRegistry;
pub use retry::RetryingRegistry;

use crate::domain::{Dependency, Release};
use crate::error::RegistryError;
use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

/// Source of release metadata for dependencies
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Get the registry name used in error messages
    fn registry_name(&self) -> &'static str;

    /// Fetch every published release of a dependency
    async fn list_releases(&self, dependency: &Dependency) -> Result<Vec<Release>, RegistryError>;

    /// Fetch the metadata of one release, if it exists
    async fn release_metadata(
        &self,
        dependency: &Dependency,
        version: &str,
    ) -> Result<Option<Release>, RegistryError>;
}
