//! Dev package reconciliation.
//!
//! A dev package keeps its version string while the branch it tracks moves,
//! so its installed links and references go stale. Before solving, the
//! installed copy takes the links of the authoritative metadata
//! ([`ReconcilePass::ForceLinks`]). After solving, packages whose authoritative
//! reference moved get an update of their own ([`ReconcilePass::ForceUpdates`]).

use std::sync::Arc;

use indexmap::IndexMap;
use lockstep_semver::VersionConstraint;

use super::whitelist::UpdateWhitelist;
use crate::package::Package;
use crate::repository::InstalledRepository;
use crate::solver::{Operation, Policy, Pool};

/// Which reconciliation pass to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilePass {
    /// Before solving: refresh the links of installed dev packages
    ForceLinks,
    /// After solving: add updates for dev packages whose reference moved
    ForceUpdates,
}

/// Keeps installed dev packages in line with their authoritative metadata
pub struct DevPackageReconciler<'a> {
    pool: &'a Pool,
    policy: &'a Policy,
    locked: &'a [Arc<Package>],
    installing_from_lock: bool,
    whitelist: Option<&'a UpdateWhitelist>,
    references: Option<&'a IndexMap<String, String>>,
}

impl<'a> DevPackageReconciler<'a> {
    /// `pool` supplies the remote candidates, `locked` the lock file packages
    pub fn new(
        pool: &'a Pool,
        policy: &'a Policy,
        locked: &'a [Arc<Package>],
        installing_from_lock: bool,
    ) -> Self {
        Self {
            pool,
            policy,
            locked,
            installing_from_lock,
            whitelist: None,
            references: None,
        }
    }

    /// Packages outside the whitelist are held to their locked metadata
    pub fn with_whitelist(mut self, whitelist: &'a UpdateWhitelist) -> Self {
        self.whitelist = Some(whitelist);
        self
    }

    /// Root pinned references (`dev-master#ref`) that force a re-checkout
    pub fn with_references(mut self, references: &'a IndexMap<String, String>) -> Self {
        self.references = Some(references);
        self
    }

    /// Run one pass over the installed dev packages.
    ///
    /// Packages already updated or removed by `operations` are left alone. Returns
    /// `operations` with any synthesized updates appended.
    pub fn reconcile(
        &self,
        pass: ReconcilePass,
        installed: &mut InstalledRepository,
        mut operations: Vec<Operation>,
    ) -> Vec<Operation> {
        let mut synthesized = Vec::new();

        for slot in installed.packages_mut().iter_mut() {
            if !slot.is_dev() || is_scheduled(&operations, slot) {
                continue;
            }

            let authority = self.authority(slot);
            match pass {
                ReconcilePass::ForceLinks => {
                    if let Some(authority) = authority {
                        if slot.links != authority.links {
                            log::debug!("Refreshing links of {} from its current metadata", slot);
                            Arc::make_mut(slot).links = authority.links.clone();
                        }
                    }
                }
                ReconcilePass::ForceUpdates => {
                    if let Some(authority) = authority {
                        if reference_moved(slot, &authority) {
                            synthesized.push(Operation::Update {
                                from: Arc::clone(slot),
                                to: authority,
                            });
                            continue;
                        }
                    }

                    if self.installing_from_lock {
                        continue;
                    }
                    let reference = self.references.and_then(|r| r.get(&slot.name.to_lowercase()));
                    if let Some(reference) = reference {
                        if slot.source_reference() != Some(reference.as_str()) {
                            synthesized.push(Operation::Update {
                                from: Arc::clone(slot),
                                to: Arc::clone(slot),
                            });
                        }
                    }
                }
            }
        }

        operations.extend(synthesized);
        operations
    }

    /// The metadata an installed dev package should agree with
    fn authority(&self, package: &Package) -> Option<Arc<Package>> {
        let held_to_lock = self.installing_from_lock
            || self.whitelist.is_some_and(|w| !w.is_updateable(&package.name));
        if held_to_lock {
            return self
                .locked
                .iter()
                .find(|locked| locked.is_dev() && locked.same_as(package))
                .cloned();
        }

        let exact = VersionConstraint::exact(package.version.clone());
        let candidates: Vec<_> = self
            .pool
            .what_provides(&package.name, Some(&exact))
            .into_iter()
            .filter(|&id| {
                let remote = self.pool.repo_kind(id).is_some_and(|repo| !repo.is_local());
                let same_name = self
                    .pool
                    .entry(id)
                    .is_some_and(|e| !e.is_alias() && e.name().eq_ignore_ascii_case(&package.name));
                remote && same_name
            })
            .collect();

        self.policy
            .select_best(self.pool, &candidates)
            .and_then(|id| self.pool.entry(id))
            .map(|entry| Arc::clone(entry.package()))
    }
}

/// Whether an operation already updates or removes this exact package
fn is_scheduled(operations: &[Operation], package: &Package) -> bool {
    operations.iter().any(|op| match op {
        Operation::Update { from, .. } => from.same_as(package),
        Operation::Uninstall(pkg) => pkg.same_as(package),
        Operation::Install(_) => false,
    })
}

fn reference_moved(installed: &Package, authority: &Package) -> bool {
    let source_moved = authority
        .source_reference()
        .is_some_and(|r| !r.is_empty() && installed.source_reference() != Some(r));
    let dist_moved = authority
        .dist_reference()
        .is_some_and(|r| !r.is_empty() && installed.dist_reference() != Some(r));
    source_moved || dist_moved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::Source;
    use crate::solver::RepoKind;

    fn dev(name: &str, reference: &str, requires: &[&str]) -> Package {
        let mut pkg = Package::new(name, "dev-master");
        pkg.source = Some(Source::new("git", format!("https://example.com/{}.git", name), reference));
        for target in requires {
            pkg.add_require(target, "^1.0").unwrap();
        }
        pkg
    }

    fn remote_pool(packages: Vec<Package>) -> Pool {
        let mut pool = Pool::default();
        for pkg in packages {
            pool.add_package(Arc::new(pkg), RepoKind::Remote("packagist".into()));
        }
        pool
    }

    #[test]
    fn test_force_links_takes_remote_links() {
        let pool = remote_pool(vec![dev("vendor/a", "bbb", &["vendor/e"])]);
        let policy = Policy::new();
        let mut installed = InstalledRepository::in_memory(vec![dev("vendor/a", "aaa", &[])]);

        let reconciler = DevPackageReconciler::new(&pool, &policy, &[], false);
        let ops = reconciler.reconcile(ReconcilePass::ForceLinks, &mut installed, Vec::new());

        assert!(ops.is_empty());
        let pkg = &installed.packages()[0];
        assert_eq!(pkg.requires()[0].target, "vendor/e");
        assert_eq!(pkg.source_reference(), Some("aaa"));
    }

    #[test]
    fn test_force_updates_on_moved_reference() {
        let pool = remote_pool(vec![dev("vendor/a", "bbb", &[]), dev("vendor/b", "same", &[])]);
        let policy = Policy::new();
        let mut installed = InstalledRepository::in_memory(vec![
            dev("vendor/a", "aaa", &[]),
            dev("vendor/b", "same", &[]),
            Package::new("vendor/stable", "1.0.0"),
        ]);

        let reconciler = DevPackageReconciler::new(&pool, &policy, &[], false);
        let ops = reconciler.reconcile(ReconcilePass::ForceUpdates, &mut installed, Vec::new());

        assert_eq!(ops.len(), 1);
        match &ops[0] {
            Operation::Update { from, to } => {
                assert_eq!(from.source_reference(), Some("aaa"));
                assert_eq!(to.source_reference(), Some("bbb"));
            }
            op => panic!("unexpected operation {}", op),
        }
    }

    #[test]
    fn test_scheduled_packages_are_skipped() {
        let pool = remote_pool(vec![dev("vendor/a", "bbb", &["vendor/e"])]);
        let policy = Policy::new();
        let mut installed = InstalledRepository::in_memory(vec![dev("vendor/a", "aaa", &[])]);
        let scheduled = vec![Operation::Uninstall(Arc::clone(&installed.packages()[0]))];

        let reconciler = DevPackageReconciler::new(&pool, &policy, &[], false);
        let ops = reconciler.reconcile(ReconcilePass::ForceUpdates, &mut installed, scheduled.clone());

        assert_eq!(ops, scheduled);
    }

    #[test]
    fn test_local_candidates_are_not_authoritative() {
        let mut pool = Pool::default();
        pool.add_package(Arc::new(dev("vendor/a", "bbb", &["vendor/e"])), RepoKind::Installed);
        let policy = Policy::new();
        let mut installed = InstalledRepository::in_memory(vec![dev("vendor/a", "aaa", &[])]);

        let reconciler = DevPackageReconciler::new(&pool, &policy, &[], false);
        reconciler.reconcile(ReconcilePass::ForceLinks, &mut installed, Vec::new());

        assert!(installed.packages()[0].requires().is_empty());
    }

    #[test]
    fn test_lock_is_authoritative_when_installing_from_lock() {
        let pool = remote_pool(vec![dev("vendor/a", "remote", &["vendor/remote"])]);
        let policy = Policy::new();
        let locked = vec![Arc::new(dev("vendor/a", "locked", &["vendor/locked"]))];
        let mut installed = InstalledRepository::in_memory(vec![dev("vendor/a", "aaa", &[])]);

        let reconciler = DevPackageReconciler::new(&pool, &policy, &locked, true);
        reconciler.reconcile(ReconcilePass::ForceLinks, &mut installed, Vec::new());
        let ops = reconciler.reconcile(ReconcilePass::ForceUpdates, &mut installed, Vec::new());

        assert_eq!(installed.packages()[0].requires()[0].target, "vendor/locked");
        assert_eq!(ops[0].package().source_reference(), Some("locked"));
    }

    #[test]
    fn test_non_whitelisted_packages_follow_the_lock() {
        let pool = remote_pool(vec![dev("vendor/a", "remote", &[])]);
        let policy = Policy::new();
        let locked = vec![Arc::new(dev("vendor/a", "aaa", &[]))];
        let whitelist = UpdateWhitelist::new(["vendor/other"]);
        let mut installed = InstalledRepository::in_memory(vec![dev("vendor/a", "aaa", &[])]);

        let reconciler = DevPackageReconciler::new(&pool, &policy, &locked, false).with_whitelist(&whitelist);
        let ops = reconciler.reconcile(ReconcilePass::ForceUpdates, &mut installed, Vec::new());

        assert!(ops.is_empty());
    }

    #[test]
    fn test_reference_override_forces_self_update() {
        let pool = Pool::default();
        let policy = Policy::new();
        let mut references = IndexMap::new();
        references.insert("vendor/a".to_string(), "pinned".to_string());
        let mut installed = InstalledRepository::in_memory(vec![dev("vendor/a", "aaa", &[])]);

        let reconciler = DevPackageReconciler::new(&pool, &policy, &[], false).with_references(&references);
        let ops = reconciler.reconcile(ReconcilePass::ForceUpdates, &mut installed, Vec::new());

        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], Operation::Update { from, to } if from.same_as(to)));
    }
}
