//! Evaluation requests read from JSON
//!
//! ```json
//! {
//!   "dependencies": [
//!     { "name": "lodash", "version": "4.17.20", "package_manager": "npm_and_yarn",
//!       "requirements": [{ "requirement": "^4.17.20", "file": "package.json" }] }
//!   ],
//!   "releases": { "lodash": [{ "version": "4.17.21" }] },
//!   "advisories": []
//! }
//! ```

use crate::domain::{Dependency, Release, SecurityAdvisory};
use crate::error::{AppError, ConfigError, IoError};
use crate::registry::InMemoryRegistry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// A project to evaluate, with the release data the registry would serve
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub dependencies: Vec<Dependency>,
    /// Releases by dependency name
    #[serde(default)]
    pub releases: BTreeMap<String, Vec<Release>>,
    #[serde(default)]
    pub advisories: Vec<SecurityAdvisory>,
}

impl Request {
    pub fn from_json(text: &str, path: &Path) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn load(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            return Err(IoError::not_found(path).into());
        }
        let text = std::fs::read_to_string(path).map_err(|e| IoError::generic(path, e))?;
        Ok(Self::from_json(&text, path)?)
    }

    /// Registry serving the request's releases
    ///
    /// Releases are filed under the package manager of the dependency with
    /// the same name; releases for unknown names are dropped.
    pub fn registry(&self) -> InMemoryRegistry {
        self.dependencies
            .iter()
            .fold(InMemoryRegistry::new(), |registry, dependency| {
                match self.releases.get(&dependency.name) {
                    Some(releases) => registry.with_releases(
                        dependency.package_manager,
                        dependency.name.clone(),
                        releases.clone(),
                    ),
                    None => registry,
                }
            })
    }
}
