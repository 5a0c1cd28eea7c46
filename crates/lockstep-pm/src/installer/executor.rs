//! Sequential operation execution with per-operation persistence.

use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;

use super::materializer::Materializer;
use super::report::Suggestion;
use crate::error::{InstallerError, Result};
use crate::event::{EventContext, HookDispatcher};
use crate::package::Package;
use crate::repository::{InstalledRepository, PlatformRepository};
use crate::solver::Operation;

/// Applies operations strictly in order.
///
/// After each operation the local store is written, so a failure leaves the
/// store describing exactly the operations that completed. Nothing is rolled
/// back.
pub struct OperationExecutor<'a> {
    materializer: &'a dyn Materializer,
    dispatcher: Option<&'a dyn HookDispatcher>,
    references: Option<&'a IndexMap<String, String>>,
    installing_from_lock: bool,
    dev_mode: bool,
    working_dir: &'a Path,
}

impl<'a> OperationExecutor<'a> {
    pub fn new(materializer: &'a dyn Materializer, dev_mode: bool, working_dir: &'a Path) -> Self {
        Self {
            materializer,
            dispatcher: None,
            references: None,
            installing_from_lock: false,
            dev_mode,
            working_dir,
        }
    }

    /// Dispatch pre and post package events (leave unset to skip hooks)
    pub fn with_dispatcher(mut self, dispatcher: &'a dyn HookDispatcher) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Rewrite dev package references from the root's pins before materializing
    pub fn with_references(mut self, references: &'a IndexMap<String, String>) -> Self {
        self.references = Some(references);
        self
    }

    /// A lock already holds exact references: no rewriting and no skipping
    pub fn installing_from_lock(mut self, from_lock: bool) -> Self {
        self.installing_from_lock = from_lock;
        self
    }

    /// Run every operation, returning the suggestions of installed packages.
    ///
    /// Returns the operations as executed (reference overrides applied, same
    /// reference updates dropped).
    pub fn execute(
        &self,
        operations: Vec<Operation>,
        store: &mut InstalledRepository,
    ) -> Result<(Vec<Operation>, Vec<Suggestion>)> {
        let mut executed = Vec::with_capacity(operations.len());
        let mut suggestions = Vec::new();

        for (index, operation) in operations.into_iter().enumerate() {
            let index = index + 1;
            let operation = self.apply_reference_override(operation);

            // skipped updates never reach listeners
            if let Operation::Update { from, to } = &operation {
                if !self.installing_from_lock && is_reference_locked_update(from, to) {
                    log::debug!(
                        "Skipping update of {} to the same reference-locked version",
                        to.name
                    );
                    continue;
                }
            }

            self.dispatch(operation.pre_event(), &operation, index)?;

            log::info!("  - {}", operation);
            self.materializer
                .apply(&operation)
                .map_err(|source| InstallerError::Materialization {
                    index,
                    operation: operation.to_string(),
                    source,
                })?;

            store.apply(&operation);
            store.write()?;

            self.dispatch(operation.post_event(), &operation, index)?;

            if let Operation::Install(pkg) = &operation {
                suggestions.extend(suggestions_of(pkg));
            }
            executed.push(operation);
        }

        Ok((executed, suggestions))
    }

    fn dispatch(&self, event: &str, operation: &Operation, index: usize) -> Result<()> {
        let Some(dispatcher) = self.dispatcher else {
            return Ok(());
        };
        let context = EventContext::new(self.dev_mode, self.working_dir).with_operation(operation);
        dispatcher
            .dispatch(event, &context)
            .map_err(|source| InstallerError::Hook {
                event: event.to_string(),
                index,
                package: operation.package().to_string(),
                source,
            })
    }

    fn apply_reference_override(&self, operation: Operation) -> Operation {
        let Some(references) = self.references.filter(|_| !self.installing_from_lock) else {
            return operation;
        };
        let target = operation.package();
        if !target.is_dev() {
            return operation;
        }
        let Some(reference) = references.get(&target.name.to_lowercase()) else {
            return operation;
        };

        let mut pinned = Package::clone(target);
        pinned.set_source_reference(reference);
        pinned.set_dist_reference(reference);
        let pinned = Arc::new(pinned);

        match operation {
            Operation::Install(_) => Operation::Install(pinned),
            Operation::Update { from, .. } => Operation::Update { from, to: pinned },
            Operation::Uninstall(pkg) => Operation::Uninstall(pkg),
        }
    }
}

/// A dev update that would check out the reference already installed
fn is_reference_locked_update(from: &Package, to: &Package) -> bool {
    if !to.is_dev() || to.version != from.version {
        return false;
    }
    let same_source = to.source_reference().map_or(true, |r| r.is_empty() || Some(r) == from.source_reference());
    let same_dist = to.dist_reference().map_or(true, |r| r.is_empty() || Some(r) == from.dist_reference());
    same_source && same_dist
}

fn suggestions_of(package: &Package) -> Vec<Suggestion> {
    package
        .suggest
        .iter()
        .map(|(target, reason)| Suggestion {
            source: package.name.clone(),
            target: target.clone(),
            reason: reason.clone(),
        })
        .collect()
}

/// Drop suggestions whose target is already installed under any of its names,
/// or is a platform fact the runtime already has
pub(crate) fn filter_suggestions(
    suggestions: Vec<Suggestion>,
    store: &InstalledRepository,
    platform: &PlatformRepository,
) -> Vec<Suggestion> {
    let mut present = store.names();
    present.extend(platform.names());
    suggestions
        .into_iter()
        .filter(|s| !present.contains(&s.target.to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::Source;
    use crate::testing::{FailingDispatcher, RecordingDispatcher, RecordingMaterializer};
    use tempfile::tempdir;

    fn install(name: &str) -> Operation {
        Operation::Install(Arc::new(Package::new(name, "1.0.0")))
    }

    fn dev(name: &str, reference: &str) -> Arc<Package> {
        let mut pkg = Package::new(name, "dev-master");
        pkg.source = Some(Source::new("git", "https://example.com/repo.git", reference));
        Arc::new(pkg)
    }

    #[test]
    fn test_failure_at_k_leaves_k_minus_one_persisted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("installed.json");
        let mut store = InstalledRepository::from_file(&path).unwrap();
        let materializer = RecordingMaterializer::failing_at(3);

        let ops = vec![install("v/a"), install("v/b"), install("v/c"), install("v/d")];
        let err = OperationExecutor::new(&materializer, true, dir.path())
            .execute(ops, &mut store)
            .unwrap_err();

        assert!(matches!(err, InstallerError::Materialization { index: 3, .. }));
        let persisted = InstalledRepository::from_file(&path).unwrap();
        let names: Vec<_> = persisted.packages().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["v/a", "v/b"]);
    }

    #[test]
    fn test_hooks_wrap_each_operation() {
        let dir = tempdir().unwrap();
        let mut store = InstalledRepository::in_memory(vec![]);
        let materializer = RecordingMaterializer::default();
        let dispatcher = RecordingDispatcher::default();

        OperationExecutor::new(&materializer, true, dir.path())
            .with_dispatcher(&dispatcher)
            .execute(vec![install("v/a")], &mut store)
            .unwrap();

        assert_eq!(dispatcher.events(), vec!["pre-package-install", "post-package-install"]);
        assert_eq!(materializer.applied(), vec!["Installing v/a (1.0.0)"]);
    }

    #[test]
    fn test_hook_failure_aborts_remaining_operations() {
        let dir = tempdir().unwrap();
        let mut store = InstalledRepository::in_memory(vec![]);
        let materializer = RecordingMaterializer::default();
        let dispatcher = FailingDispatcher::on("post-package-install");

        let err = OperationExecutor::new(&materializer, true, dir.path())
            .with_dispatcher(&dispatcher)
            .execute(vec![install("v/a"), install("v/b")], &mut store)
            .unwrap_err();

        match err {
            InstallerError::Hook { event, index, package, .. } => {
                assert_eq!(event, "post-package-install");
                assert_eq!(index, 1);
                assert_eq!(package, "v/a (1.0.0)");
            }
            other => panic!("unexpected error {}", other),
        }
        assert_eq!(materializer.applied().len(), 1);
        assert_eq!(store.packages().len(), 1);
    }

    #[test]
    fn test_same_reference_dev_update_is_skipped() {
        let dir = tempdir().unwrap();
        let from = dev("v/a", "aaa");
        let mut store = InstalledRepository::in_memory(vec![Package::clone(&from)]);
        let materializer = RecordingMaterializer::default();

        let dispatcher = RecordingDispatcher::default();

        let ops = vec![Operation::Update { from: Arc::clone(&from), to: dev("v/a", "aaa") }];
        let (executed, _) = OperationExecutor::new(&materializer, true, dir.path())
            .with_dispatcher(&dispatcher)
            .execute(ops, &mut store)
            .unwrap();

        assert!(executed.is_empty());
        assert!(materializer.applied().is_empty());
        assert!(dispatcher.events().is_empty());
    }

    #[test]
    fn test_same_reference_update_runs_when_installing_from_lock() {
        let dir = tempdir().unwrap();
        let from = dev("v/a", "aaa");
        let mut store = InstalledRepository::in_memory(vec![Package::clone(&from)]);
        let materializer = RecordingMaterializer::default();

        let ops = vec![Operation::Update { from: Arc::clone(&from), to: dev("v/a", "aaa") }];
        let (executed, _) = OperationExecutor::new(&materializer, true, dir.path())
            .installing_from_lock(true)
            .execute(ops, &mut store)
            .unwrap();

        assert_eq!(executed.len(), 1);
    }

    #[test]
    fn test_reference_override_rewrites_dev_targets() {
        let dir = tempdir().unwrap();
        let from = dev("v/a", "aaa");
        let mut store = InstalledRepository::in_memory(vec![Package::clone(&from)]);
        let materializer = RecordingMaterializer::default();
        let mut references = IndexMap::new();
        references.insert("v/a".to_string(), "ccc".to_string());

        let ops = vec![Operation::Update { from: Arc::clone(&from), to: Arc::clone(&from) }];
        let (executed, _) = OperationExecutor::new(&materializer, true, dir.path())
            .with_references(&references)
            .execute(ops, &mut store)
            .unwrap();

        assert_eq!(executed.len(), 1);
        assert_eq!(store.packages()[0].source_reference(), Some("ccc"));
    }

    #[test]
    fn test_suggestions_of_installed_targets_are_dropped() {
        let mut pkg = Package::new("v/a", "1.0.0");
        pkg.suggest.insert("v/present".into(), "already here".into());
        pkg.suggest.insert("psr/log-implementation".into(), "provided".into());
        pkg.suggest.insert("v/missing".into(), "worth a look".into());

        // installed at a version the suggestion might not have had in mind
        let present = Package::new("v/present", "0.1.0");
        let mut provider = Package::new("v/logger", "1.0.0");
        provider.add_provide("psr/log-implementation", "1.0.0").unwrap();
        let store = InstalledRepository::in_memory(vec![present, provider]);

        let kept = filter_suggestions(suggestions_of(&pkg), &store, &PlatformRepository::default());
        let targets: Vec<_> = kept.iter().map(|s| s.target.as_str()).collect();
        assert_eq!(targets, vec!["v/missing"]);
    }

    #[test]
    fn test_suggestions_of_present_platform_facts_are_dropped() {
        let mut pkg = Package::new("v/a", "1.0.0");
        pkg.suggest.insert("ext-intl".into(), "locale aware formatting".into());
        pkg.suggest.insert("ext-gmp".into(), "big numbers".into());

        let store = InstalledRepository::in_memory(vec![]);
        let platform = PlatformRepository::from_runtime("8.2.0", &["intl"]);

        let kept = filter_suggestions(suggestions_of(&pkg), &store, &platform);
        let targets: Vec<_> = kept.iter().map(|s| s.target.as_str()).collect();
        assert_eq!(targets, vec!["ext-gmp"]);
    }
}
