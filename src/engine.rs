//! Batch evaluation of a project's dependencies
//!
//! This module provides:
//! - Concurrent release fetching with a concurrency cap
//! - Per-dependency timeouts reported as undetermined, never as "no update"
//! - Optional install-time peer conflict probing
//! - Degrading registry and probe failures to conservative outcomes

use crate::config::{EngineConfig, UpdateSettings};
use crate::domain::{
    Dependency, DependencyReport, Outcome, PackageManager, SecurityAdvisory, UnlockPolicy,
};
use crate::error::EngineError;
use crate::probe::{CommandProbe, PackageManagerProbe};
use crate::progress::Progress;
use crate::registry::RegistryClient;
use crate::update::{
    parse_peer_conflicts, prune_preexisting, PeerConflict, ProjectSnapshot, UpdateChecker,
};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Releases fetched for a project, plus the dependencies whose fetch timed out
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub project: ProjectSnapshot,
    /// Reasons by dependency name
    pub undetermined: BTreeMap<String, String>,
}

/// Everything one evaluation task needs, shared across tasks
#[derive(Clone)]
struct Worker {
    settings: Arc<UpdateSettings>,
    probe: Option<Arc<dyn PackageManagerProbe>>,
    unlock: UnlockPolicy,
    now: Option<DateTime<Utc>>,
}

impl Worker {
    /// Runs the evaluation on the blocking pool, so a caller's timeout also
    /// bounds the synchronous decision
    async fn evaluate(
        self,
        project: Arc<ProjectSnapshot>,
        index: usize,
        advisories: Arc<Vec<SecurityAdvisory>>,
    ) -> Result<Outcome, EngineError> {
        let handle = Handle::current();
        let name = project.dependencies[index].name.clone();
        let evaluated = tokio::task::spawn_blocking(move || {
            self.evaluate_blocking(&handle, &project, index, &advisories)
        })
        .await;
        match evaluated {
            Ok(result) => result,
            Err(e) => {
                warn!(dependency = %name, "evaluation task failed: {}", e);
                Ok(Outcome::Undetermined {
                    reason: format!("evaluation failed: {}", e),
                })
            }
        }
    }

    fn evaluate_blocking(
        &self,
        handle: &Handle,
        project: &ProjectSnapshot,
        index: usize,
        advisories: &[SecurityAdvisory],
    ) -> Result<Outcome, EngineError> {
        let dependency = &project.dependencies[index];
        let now = self.now.unwrap_or_else(Utc::now);

        let checker =
            match UpdateChecker::with_time(dependency, project, &self.settings, advisories, now) {
                Ok(checker) => checker,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    debug!(dependency = %dependency.name, "not updatable: {}", e);
                    return Ok(Outcome::NoUpdate {
                        reason: e.to_string(),
                    });
                }
            };

        let checker = match &self.probe {
            Some(probe) if dependency.package_manager == PackageManager::Npm => {
                with_probe_results(handle, checker, probe.as_ref())
            }
            _ => checker,
        };

        match checker.decide(self.unlock) {
            Ok(decision) => Ok(Outcome::Decided { decision }),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => Ok(Outcome::NoUpdate {
                reason: e.to_string(),
            }),
        }
    }
}

/// Probes the newest version and the current one, keeping only the
/// conflicts the update introduces
fn with_probe_results<'a>(
    handle: &Handle,
    checker: UpdateChecker<'a>,
    probe: &dyn PackageManagerProbe,
) -> UpdateChecker<'a> {
    let Some(target) = checker.latest_version() else {
        return checker;
    };
    if checker.current_version() == Some(&target) {
        return checker;
    }
    let target = target.to_string();
    let dependency = checker.dependency();

    let after = handle.block_on(probe_conflicts(probe, dependency, &target));
    if after.is_empty() {
        return checker;
    }
    let before = match &dependency.version {
        Some(current) => handle.block_on(probe_conflicts(probe, dependency, current)),
        None => Vec::new(),
    };
    let conflicts = prune_preexisting(&before, after);
    debug!(dependency = %dependency.name, version = %target, count = conflicts.len(), "probe reported peer conflicts");
    checker.with_probed(&target, conflicts)
}

/// Runs the probe; a failing probe reports no conflicts
async fn probe_conflicts(
    probe: &dyn PackageManagerProbe,
    dependency: &Dependency,
    version: &str,
) -> Vec<PeerConflict> {
    match probe.probe(dependency, version).await {
        Ok(output) => parse_peer_conflicts(&output),
        Err(e) => {
            warn!(dependency = %dependency.name, version = %version, "probe failed: {}", e);
            Vec::new()
        }
    }
}

/// Evaluates every top-level dependency of a project
pub struct Engine {
    registry: Arc<dyn RegistryClient>,
    worker: Worker,
    semaphore: Arc<Semaphore>,
    timeout: Duration,
}

impl Engine {
    /// Create an engine from validated configuration
    ///
    /// Fails on configuration errors such as an unknown update strategy.
    pub fn new(config: &EngineConfig, registry: Arc<dyn RegistryClient>) -> Result<Self, EngineError> {
        let settings = config.validate()?;
        let probe: Option<Arc<dyn PackageManagerProbe>> = if config.probe.enabled {
            Some(Arc::new(CommandProbe::from_config(&config.probe)))
        } else {
            None
        };

        Ok(Self {
            registry,
            worker: Worker {
                settings: Arc::new(settings),
                probe,
                unlock: UnlockPolicy::All,
                now: None,
            },
            semaphore: Arc::new(Semaphore::new(config.concurrency)),
            timeout: config.timeout(),
        })
    }

    /// Set the highest unlock level (builder pattern)
    pub fn with_unlock(mut self, unlock: UnlockPolicy) -> Self {
        self.worker.unlock = unlock;
        self
    }

    /// Replace the probe (builder pattern)
    pub fn with_probe(mut self, probe: Arc<dyn PackageManagerProbe>) -> Self {
        self.worker.probe = Some(probe);
        self
    }

    /// Set the per-dependency timeout (builder pattern)
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Evaluate at a fixed time (for testing cooldowns)
    pub fn with_time(mut self, now: DateTime<Utc>) -> Self {
        self.worker.now = Some(now);
        self
    }

    pub fn settings(&self) -> &UpdateSettings {
        &self.worker.settings
    }

    /// Fetch the releases of every dependency
    ///
    /// A registry error leaves the dependency with no releases. A timeout
    /// marks it undetermined.
    pub async fn snapshot(&self, dependencies: Vec<Dependency>) -> Snapshot {
        let mut tasks = JoinSet::new();
        for dependency in &dependencies {
            let registry = Arc::clone(&self.registry);
            let semaphore = Arc::clone(&self.semaphore);
            let timeout = self.timeout;
            let dependency = dependency.clone();
            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (dependency.name, Err("concurrency limiter closed".to_string()));
                };
                let fetched = tokio::time::timeout(timeout, registry.list_releases(&dependency)).await;
                let result = match fetched {
                    Ok(Ok(releases)) => Ok(releases),
                    Ok(Err(e)) => {
                        warn!(dependency = %dependency.name, registry = registry.registry_name(), "{}", e);
                        Ok(Vec::new())
                    }
                    Err(_) => Err(format!("fetching releases timed out after {:?}", timeout)),
                };
                (dependency.name, result)
            });
        }

        let mut releases = HashMap::new();
        let mut undetermined = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((name, Ok(fetched))) => {
                    releases.insert(name, fetched);
                }
                Ok((name, Err(reason))) => {
                    undetermined.insert(name, reason);
                }
                Err(e) => warn!("release fetch task failed: {}", e),
            }
        }

        Snapshot {
            project: ProjectSnapshot {
                dependencies,
                releases,
            },
            undetermined,
        }
    }

    /// Fetch releases and evaluate every top-level dependency
    pub async fn evaluate(
        &self,
        dependencies: Vec<Dependency>,
        advisories: Vec<SecurityAdvisory>,
    ) -> Result<Vec<DependencyReport>, EngineError> {
        self.evaluate_with_progress(dependencies, advisories, false)
            .await
    }

    /// Like [`Engine::evaluate`], optionally drawing progress bars
    pub async fn evaluate_with_progress(
        &self,
        dependencies: Vec<Dependency>,
        advisories: Vec<SecurityAdvisory>,
        show_progress: bool,
    ) -> Result<Vec<DependencyReport>, EngineError> {
        let mut progress = Progress::new(show_progress);

        progress.spinner("Fetching releases...");
        let snapshot = self.snapshot(dependencies).await;
        progress.finish_and_clear();

        self.evaluate_snapshot(snapshot, advisories, &mut progress)
            .await
    }

    /// Evaluate a project whose releases are already known
    ///
    /// Dependencies are evaluated concurrently; reports come back in
    /// discovery order. Fatal errors abort the batch.
    pub async fn evaluate_snapshot(
        &self,
        snapshot: Snapshot,
        advisories: Vec<SecurityAdvisory>,
        progress: &mut Progress,
    ) -> Result<Vec<DependencyReport>, EngineError> {
        let Snapshot {
            project,
            undetermined,
        } = snapshot;
        let project = Arc::new(project);
        let advisories = Arc::new(advisories);

        let mut outcomes: BTreeMap<usize, Outcome> = BTreeMap::new();
        let mut tasks = JoinSet::new();
        let mut pending = Vec::new();

        for (index, dependency) in project.dependencies.iter().enumerate() {
            if !dependency.is_top_level() {
                continue;
            }
            if let Some(reason) = undetermined.get(&dependency.name) {
                outcomes.insert(
                    index,
                    Outcome::Undetermined {
                        reason: reason.clone(),
                    },
                );
                continue;
            }

            pending.push(index);
            let worker = self.worker.clone();
            let project = Arc::clone(&project);
            let advisories = Arc::clone(&advisories);
            let semaphore = Arc::clone(&self.semaphore);
            let timeout = self.timeout;
            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (index, Ok(Err("concurrency limiter closed".to_string())));
                };
                let evaluated =
                    tokio::time::timeout(timeout, worker.evaluate(project, index, advisories))
                        .await;
                let result = match evaluated {
                    Ok(outcome) => outcome.map(Ok),
                    Err(_) => Ok(Err(format!("evaluation timed out after {:?}", timeout))),
                };
                (index, result)
            });
        }

        info!(count = pending.len(), "evaluating dependencies");
        progress.start(pending.len() as u64, "Evaluating dependencies");

        while let Some(joined) = tasks.join_next().await {
            progress.inc();
            let (index, result) = match joined {
                Ok(done) => done,
                Err(e) => {
                    warn!("evaluation task failed: {}", e);
                    continue;
                }
            };
            match result {
                Ok(Ok(outcome)) => {
                    outcomes.insert(index, outcome);
                }
                Ok(Err(reason)) => {
                    warn!(dependency = %project.dependencies[index].name, "{}", reason);
                    outcomes.insert(index, Outcome::Undetermined { reason });
                }
                Err(e) => {
                    progress.finish_and_clear();
                    tasks.abort_all();
                    return Err(e);
                }
            }
        }
        progress.finish_and_clear();

        for index in pending {
            outcomes.entry(index).or_insert_with(|| Outcome::Undetermined {
                reason: "evaluation task failed".to_string(),
            });
        }

        Ok(outcomes
            .into_iter()
            .map(|(index, outcome)| DependencyReport {
                dependency: project.dependencies[index].clone(),
                outcome,
            })
            .collect())
    }
}
