//! Security advisory matching

use crate::domain::{Dependency, SecurityAdvisory};
use crate::scheme::{Scheme, Version, VersionReq};
use tracing::warn;

#[derive(Debug, Clone)]
struct ParsedAdvisory {
    vulnerable: Vec<VersionReq>,
    safe: Vec<VersionReq>,
}

impl ParsedAdvisory {
    fn affects(&self, version: &Version) -> bool {
        if self.safe.iter().any(|r| r.covers(version)) {
            return false;
        }
        if self.vulnerable.is_empty() {
            return !self.safe.is_empty();
        }
        self.vulnerable.iter().any(|r| r.covers(version))
    }
}

/// The advisories that apply to one dependency, parsed with its scheme
#[derive(Debug, Clone, Default)]
pub struct VulnerabilityIndex {
    advisories: Vec<ParsedAdvisory>,
}

impl VulnerabilityIndex {
    /// Build the index; predicates that do not parse are skipped
    pub fn new(
        dependency: &Dependency,
        advisories: &[SecurityAdvisory],
        scheme: &dyn Scheme,
    ) -> Self {
        let parse = |predicates: &[String]| -> Vec<VersionReq> {
            predicates
                .iter()
                .filter_map(|text| match scheme.parse_requirement(Some(text)) {
                    Ok(req) => Some(req),
                    Err(e) => {
                        warn!(dependency = %dependency.name, "skipping advisory predicate: {}", e);
                        None
                    }
                })
                .collect()
        };

        let advisories = advisories
            .iter()
            .filter(|a| a.applies_to(dependency))
            .map(|a| ParsedAdvisory {
                vulnerable: parse(&a.vulnerable_versions),
                safe: parse(&a.safe_versions),
            })
            .filter(|a| !a.vulnerable.is_empty() || !a.safe.is_empty())
            .collect();

        Self { advisories }
    }

    /// Returns true if no advisory applies
    pub fn is_empty(&self) -> bool {
        self.advisories.is_empty()
    }

    /// Returns true if any advisory marks `version` vulnerable
    pub fn is_vulnerable(&self, version: &Version) -> bool {
        self.advisories.iter().any(|a| a.affects(version))
    }
}
