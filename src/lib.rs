//! depup-engine - dependency update decision engine
//!
//! Given a dependency, the project it lives in and the releases published
//! upstream, this library decides:
//! - Which version the dependency can move to
//! - How much of the project's requirements must change to get there
//! - Which sibling dependencies must move with it
//!
//! Supported ecosystems: npm/yarn, Cargo, Dart pub, Julia, Maven and Gradle.

pub mod cli;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod output;
pub mod probe;
pub mod progress;
pub mod registry;
pub mod request;
pub mod scheme;
pub mod update;
