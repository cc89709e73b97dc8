//! Update decision logic for dependencies
//!
//! This module provides:
//! - Candidate filtering (withdrawn, pre-release, ignore, cooldown)
//! - Security advisory matching
//! - Peer conflict analysis
//! - Requirement rewriting per update strategy
//! - Coordination of dependencies that must move together
//! - The per-dependency update checker

mod candidate_pool;
mod checker;
mod cooldown;
mod coordinator;
mod peer;
mod requirements_updater;
mod snapshot;
mod vulnerability;

pub use candidate_pool::{Candidate, CandidatePool, PoolInput};
pub use checker::UpdateChecker;
pub use cooldown::CooldownConfig;
pub use coordinator::{
    CoordinationPlan, CoordinationShape, MultiDependencyCoordinator, PlannedUpdate,
};
pub use peer::{
    is_vcs_locator, parse_peer_conflicts, prune_preexisting, PeerConflict, PeerConflictAnalyzer,
};
pub use requirements_updater::RequirementsUpdater;
pub use snapshot::ProjectSnapshot;
pub use vulnerability::VulnerabilityIndex;
