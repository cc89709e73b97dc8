//! Core domain models for depup-engine
//!
//! This module contains the fundamental types used throughout the engine:
//! - Package manager identifiers
//! - Dependencies and their manifest requirements
//! - Releases and security advisories supplied by collaborators
//! - Update strategies, unlock policies and decisions

mod advisory;
mod decision;
mod dependency;
mod package_manager;
mod release;
mod requirement;

pub use advisory::SecurityAdvisory;
pub use decision::{
    CanUpdate, DependencyReport, Outcome, UnlockPolicy, UpdateDecision, UpdateStrategy,
    UpdatedDependency,
};
pub use dependency::{Dependency, DependencyMetadata};
pub use package_manager::PackageManager;
pub use release::Release;
pub use requirement::{Requirement, RequirementLink, RequirementSource};
