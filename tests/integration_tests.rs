//! Integration tests for depup-engine
//!
//! These tests verify:
//! - End-to-end decisions through the public checker API
//! - Coordinated updates across linked dependencies
//! - Re-running on an updated project reports nothing further
//! - Batch evaluation through the engine

use depup_engine::config::{EngineConfig, UpdateSettings};
use depup_engine::domain::{
    Dependency, Outcome, PackageManager, Release, Requirement, RequirementLink,
    SecurityAdvisory, UnlockPolicy, UpdateStrategy,
};
use depup_engine::engine::Engine;
use depup_engine::error::EngineError;
use depup_engine::registry::InMemoryRegistry;
use depup_engine::update::{ProjectSnapshot, UpdateChecker};
use proptest::prelude::*;
use std::sync::Arc;

fn pub_dependency(name: &str, version: &str, requirement: &str) -> Dependency {
    Dependency::new(name, Some(version), PackageManager::Pub)
        .with_requirement(Requirement::new(Some(requirement), "pubspec.yaml"))
}

fn releases(versions: &[&str]) -> Vec<Release> {
    versions.iter().map(|v| Release::new(*v)).collect()
}

fn bump_versions() -> UpdateSettings {
    UpdateSettings::new(UpdateStrategy::BumpVersions)
}

/// The project after applying a decision's updates
fn apply(project: &ProjectSnapshot, updates: &[depup_engine::domain::UpdatedDependency]) -> ProjectSnapshot {
    let mut next = project.clone();
    for update in updates {
        if let Some(slot) = next
            .dependencies
            .iter_mut()
            .find(|d| d.same_identity(&update.dependency))
        {
            *slot = update.dependency.clone();
        }
    }
    next
}

mod scenarios {
    use super::*;

    #[test]
    fn test_caret_requirement_bumped_to_latest() {
        let project = ProjectSnapshot::new(vec![pub_dependency("collection", "1.14.13", "^1.14.13")])
            .with_releases("collection", releases(&["1.14.12", "1.14.13", "1.15.0", "1.16.0"]));
        let settings = bump_versions();
        let checker = UpdateChecker::new(&project.dependencies[0], &project, &settings, &[]).unwrap();

        let decision = checker.decide(UnlockPolicy::All).unwrap();
        assert_eq!(decision.updated_dependencies.len(), 1);
        let update = &decision.updated_dependencies[0];
        assert_eq!(update.dependency.version.as_deref(), Some("1.16.0"));
        assert_eq!(update.dependency.requirements[0].text(), Some("^1.16.0"));
        assert_eq!(update.previous_version.as_deref(), Some("1.14.13"));
    }

    #[test]
    fn test_nothing_newer_within_requirement() {
        let project = ProjectSnapshot::new(vec![pub_dependency("retry", "2.0.0", "^2.0.0")])
            .with_releases("retry", releases(&["1.0.0", "2.0.0", "3.0.0"]));
        let settings = bump_versions();
        let checker = UpdateChecker::new(&project.dependencies[0], &project, &settings, &[]).unwrap();

        assert_eq!(checker.latest_resolvable_version().unwrap().to_string(), "2.0.0");
        assert!(!checker.can_update(UnlockPolicy::None));
        assert!(checker.updated_dependencies(UnlockPolicy::None).is_empty());
    }

    #[test]
    fn test_security_fix_and_contract_violation() {
        let advisories =
            vec![SecurityAdvisory::new("retry", PackageManager::Pub).with_vulnerable("<3.0.0")];
        let settings = bump_versions();

        let project = ProjectSnapshot::new(vec![pub_dependency("retry", "2.0.0", "^2.0.0")])
            .with_releases("retry", releases(&["2.0.0", "3.0.0", "3.1.0"]));
        let checker =
            UpdateChecker::new(&project.dependencies[0], &project, &settings, &advisories).unwrap();
        assert!(checker.is_vulnerable());
        assert_eq!(
            checker.lowest_security_fix_version().unwrap().unwrap().to_string(),
            "3.0.0"
        );
        let decision = checker.decide(UnlockPolicy::Own).unwrap();
        assert_eq!(decision.lowest_security_fix_version.as_deref(), Some("3.0.0"));
        assert_eq!(
            decision.updated_dependencies[0].dependency.version.as_deref(),
            Some("3.0.0")
        );

        let fixed = ProjectSnapshot::new(vec![pub_dependency("retry", "3.0.0", "^3.0.0")])
            .with_releases("retry", releases(&["2.0.0", "3.0.0", "3.1.0"]));
        let checker =
            UpdateChecker::new(&fixed.dependencies[0], &fixed, &settings, &advisories).unwrap();
        let err = checker.lowest_security_fix_version().unwrap_err();
        assert!(matches!(err, EngineError::DependencyNotVulnerable { .. }));
        assert!(err.is_fatal());
    }

    fn maven_property(name: &str, version: &str) -> Dependency {
        Dependency::new(name, Some(version), PackageManager::Maven).with_requirement(
            Requirement::new(Some(version), "pom.xml").with_link(RequirementLink::Property {
                name: "foo.version".to_string(),
                declared_in: None,
            }),
        )
    }

    #[test]
    fn test_shared_property_needs_all_unlock() {
        let project = ProjectSnapshot::new(vec![
            maven_property("org.foo:foo-core", "1.0.0"),
            maven_property("org.foo:foo-extra", "1.0.0"),
        ])
        .with_releases("org.foo:foo-core", releases(&["1.0.0", "1.1.0"]))
        .with_releases("org.foo:foo-extra", releases(&["1.0.0", "1.1.0"]));
        let settings = bump_versions();
        let checker = UpdateChecker::new(&project.dependencies[0], &project, &settings, &[]).unwrap();

        assert!(!checker.can_update(UnlockPolicy::Own));
        assert!(checker.can_update(UnlockPolicy::All));
        assert_eq!(checker.requirements_to_unlock(UnlockPolicy::All), Some(UnlockPolicy::All));

        let updates = checker.updated_dependencies(UnlockPolicy::All);
        let moved: Vec<(&str, Option<&str>)> = updates
            .iter()
            .map(|u| (u.dependency.name.as_str(), u.dependency.version.as_deref()))
            .collect();
        assert_eq!(
            moved,
            vec![
                ("org.foo:foo-core", Some("1.1.0")),
                ("org.foo:foo-extra", Some("1.1.0")),
            ]
        );
        assert!(updates
            .iter()
            .all(|u| u.dependency.requirements[0].text() == Some("1.1.0")));
    }

    #[test]
    fn test_everything_ignored() {
        let project = ProjectSnapshot::new(vec![pub_dependency("retry", "2.0.0", "^2.0.0")])
            .with_releases("retry", releases(&["2.0.0", "3.0.0"]));

        let raising = bump_versions()
            .with_ignore("retry", &[">= 0"])
            .with_raise_on_ignored(true);
        let err = UpdateChecker::new(&project.dependencies[0], &project, &raising, &[]).unwrap_err();
        assert!(matches!(err, EngineError::AllVersionsIgnored { .. }));

        let quiet = bump_versions().with_ignore("retry", &[">= 0"]);
        let checker = UpdateChecker::new(&project.dependencies[0], &project, &quiet, &[]).unwrap();
        assert_eq!(checker.latest_version(), checker.current_version().cloned());
        assert!(!checker.can_update(UnlockPolicy::All));
    }
}

mod properties {
    use super::*;

    #[test]
    fn test_rerun_after_update_is_stable() {
        let project = ProjectSnapshot::new(vec![pub_dependency("collection", "1.14.13", "^1.14.13")])
            .with_releases("collection", releases(&["1.14.13", "1.15.0", "1.16.0"]));
        let settings = bump_versions();
        let checker = UpdateChecker::new(&project.dependencies[0], &project, &settings, &[]).unwrap();
        let updates = checker.updated_dependencies(UnlockPolicy::Own);
        assert_eq!(updates.len(), 1);

        let next = apply(&project, &updates);
        let checker = UpdateChecker::new(&next.dependencies[0], &next, &settings, &[]).unwrap();
        assert!(!checker.can_update(UnlockPolicy::None));
        assert!(!checker.can_update(UnlockPolicy::Own));
        assert!(!checker.can_update(UnlockPolicy::All));
        assert!(checker.updated_dependencies(UnlockPolicy::All).is_empty());
    }

    #[test]
    fn test_rerun_after_coordinated_update_is_stable() {
        let link = |name: &str, version: &str| {
            Dependency::new(name, Some(version), PackageManager::Maven).with_requirement(
                Requirement::new(Some(version), "pom.xml").with_link(RequirementLink::Property {
                    name: "foo.version".to_string(),
                    declared_in: None,
                }),
            )
        };
        let project = ProjectSnapshot::new(vec![
            link("org.foo:foo-core", "1.0.0"),
            link("org.foo:foo-extra", "1.0.0"),
        ])
        .with_releases("org.foo:foo-core", releases(&["1.0.0", "1.1.0"]))
        .with_releases("org.foo:foo-extra", releases(&["1.0.0", "1.1.0"]));
        let settings = bump_versions();
        let checker = UpdateChecker::new(&project.dependencies[0], &project, &settings, &[]).unwrap();

        let next = apply(&project, &checker.updated_dependencies(UnlockPolicy::All));
        for dependency in &next.dependencies {
            let checker = UpdateChecker::new(dependency, &next, &settings, &[]).unwrap();
            assert!(!checker.can_update(UnlockPolicy::All), "{} moved again", dependency.name);
        }
    }

    #[test]
    fn test_unchanged_requirements_are_not_reported() {
        // the requirement is unconstrained, so only the version moves
        let project = ProjectSnapshot::new(vec![
            Dependency::new("collection", Some("1.14.13"), PackageManager::Pub)
                .with_requirement(Requirement::new(Some("any"), "pubspec.yaml")),
        ])
        .with_releases("collection", releases(&["1.14.13", "1.16.0"]));
        let settings = bump_versions();
        let checker = UpdateChecker::new(&project.dependencies[0], &project, &settings, &[]).unwrap();

        for policy in [UnlockPolicy::None, UnlockPolicy::Own, UnlockPolicy::All] {
            for update in checker.updated_dependencies(policy) {
                assert!(!update.is_noop());
            }
        }
    }

    proptest! {
        #[test]
        fn test_latest_resolvable_is_highest_satisfying(
            mut minors in prop::collection::vec((0u64..20, 0u64..20), 1..12),
            major_bump in 0u64..2,
        ) {
            minors.sort();
            minors.dedup();
            let (cur_minor, cur_patch) = minors[0];
            let current = format!("1.{}.{}", cur_minor, cur_patch);

            let mut versions: Vec<String> =
                minors.iter().map(|(m, p)| format!("1.{}.{}", m, p)).collect();
            if major_bump == 1 {
                versions.push("2.0.0".to_string());
            }
            let release_list = versions.iter().map(Release::new).collect();

            let project = ProjectSnapshot::new(vec![pub_dependency("pkg", &current, &format!("^{}", current))])
                .with_releases("pkg", release_list);
            let settings = bump_versions();
            let checker = UpdateChecker::new(&project.dependencies[0], &project, &settings, &[]).unwrap();

            let (top_minor, top_patch) = minors[minors.len() - 1];
            let expected = format!("1.{}.{}", top_minor, top_patch);
            let resolvable = checker.latest_resolvable_version().unwrap().to_string();
            prop_assert_eq!(resolvable, expected);
        }
    }
}

mod engine {
    use super::*;

    fn npm(name: &str, version: &str, requirement: &str) -> Dependency {
        Dependency::new(name, Some(version), PackageManager::Npm)
            .with_requirement(Requirement::new(Some(requirement), "package.json"))
    }

    #[tokio::test]
    async fn test_family_moves_together() {
        let registry = InMemoryRegistry::new()
            .with_releases(PackageManager::Npm, "react", releases(&["15.6.0", "16.0.0"]))
            .with_releases(PackageManager::Npm, "react-dom", releases(&["15.6.0", "16.0.0"]));
        let engine = Engine::new(&EngineConfig::default(), Arc::new(registry)).unwrap();

        let reports = engine
            .evaluate(
                vec![npm("react", "15.6.0", "^15.6.0"), npm("react-dom", "15.6.0", "^15.6.0")],
                Vec::new(),
            )
            .await
            .unwrap();

        assert_eq!(reports.len(), 2);
        let Outcome::Decided { decision } = &reports[0].outcome else {
            panic!("expected a decision for react");
        };
        assert_eq!(decision.unlock, Some(UnlockPolicy::All));
        let moved: Vec<&str> = decision
            .updated_dependencies
            .iter()
            .map(|u| u.dependency.name.as_str())
            .collect();
        assert_eq!(moved, vec!["react", "react-dom"]);
        assert!(decision
            .updated_dependencies
            .iter()
            .all(|u| u.dependency.requirements[0].text() == Some("^16.0.0")));
    }

    #[tokio::test]
    async fn test_mixed_batch() {
        let registry = InMemoryRegistry::new()
            .with_releases(PackageManager::Cargo, "serde", releases(&["1.0.100", "1.0.200"]))
            .with_releases(PackageManager::Npm, "lodash", releases(&["4.17.20"]));
        let engine = Engine::new(&EngineConfig::default(), Arc::new(registry))
            .unwrap()
            .with_unlock(UnlockPolicy::Own);

        let serde = Dependency::new("serde", Some("1.0.100"), PackageManager::Cargo)
            .with_requirement(Requirement::new(Some("1.0.100"), "Cargo.toml"));
        let unknown = npm("left-pad", "1.0.0", "^1.0.0");
        let reports = engine
            .evaluate(vec![serde, npm("lodash", "4.17.20", "^4.17.20"), unknown], Vec::new())
            .await
            .unwrap();

        assert_eq!(reports.len(), 3);
        assert!(reports[0].has_updates());
        assert!(!reports[1].has_updates());
        // unknown to the registry: evaluated against no releases
        assert!(!reports[2].has_updates());
        assert!(!reports.iter().any(|r| r.is_undetermined()));
    }
}
