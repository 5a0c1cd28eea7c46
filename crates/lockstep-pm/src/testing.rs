//! Test doubles for the installer's collaborators.

use std::cell::{Cell, RefCell};
use std::collections::{HashSet, VecDeque};
use std::rc::Rc;
use std::sync::Arc;

use anyhow::bail;
use indexmap::IndexMap;
use lockstep_semver::VersionConstraint;

use crate::event::{EventContext, HookDispatcher};
use crate::installer::Materializer;
use crate::package::Package;
use crate::repository::InstalledRepository;
use crate::solver::{JobAction, Operation, Policy, Pool, RepoKind, Request, Solver, SolverError};

/// Resolves requirements greedily, without backtracking.
///
/// Walks the install directives and the requirements of every picked
/// package, taking the installed candidate when one fits and the request is
/// not an update of everything, the best candidate by policy otherwise.
/// Installed packages left unpicked are uninstalled.
#[derive(Debug, Default, Clone, Copy)]
pub struct GreedySolver;

impl Solver for GreedySolver {
    fn solve(
        &self,
        policy: &Policy,
        pool: &Pool,
        installed: &InstalledRepository,
        request: &Request,
    ) -> Result<Vec<Operation>, SolverError> {
        let removed: HashSet<String> = request
            .jobs()
            .filter(|job| job.action == JobAction::Remove)
            .map(|job| job.name.to_lowercase())
            .collect();

        let mut queue: VecDeque<(String, VersionConstraint)> = request
            .jobs()
            .filter(|job| job.action == JobAction::Install)
            .map(|job| (job.name.clone(), job.constraint.clone()))
            .collect();

        // picked packages by lowercase name, with the repository they came from
        let mut picked: IndexMap<String, (Arc<Package>, RepoKind)> = IndexMap::new();
        let mut problems = Vec::new();

        while let Some((name, constraint)) = queue.pop_front() {
            let key = name.to_lowercase();
            if let Some((pkg, _)) = picked.get(&key) {
                let accepted = constraint.satisfies(&pkg.version)
                    || pool
                        .packages_by_name(&key)
                        .into_iter()
                        .filter_map(|id| pool.entry(id))
                        .any(|e| e.is_alias() && e.package().same_as(pkg) && constraint.satisfies(e.version()));
                if !accepted {
                    problems.push(format!(
                        "{} {} conflicts with the picked {}",
                        name,
                        constraint.pretty_string(),
                        pkg
                    ));
                }
                continue;
            }
            if picked.values().any(|(pkg, _)| pkg.links.provider_link(&key).is_some()) {
                continue;
            }

            let candidates: Vec<_> = pool
                .what_provides(&name, Some(&constraint))
                .into_iter()
                .filter(|&id| {
                    pool.entry(id)
                        .is_some_and(|entry| !removed.contains(&entry.name().to_lowercase()))
                })
                .collect();
            let installed_candidates: Vec<_> = candidates
                .iter()
                .copied()
                .filter(|&id| pool.repo_kind(id) == Some(&RepoKind::Installed))
                .collect();
            let preferred = if !request.is_update_all() && !installed_candidates.is_empty() {
                installed_candidates
            } else {
                candidates
            };

            let Some(best) = policy.select_best(pool, &preferred) else {
                problems.push(format!(
                    "No package satisfies {} {}",
                    name,
                    constraint.pretty_string()
                ));
                continue;
            };
            let (Some(entry), Some(repo)) = (pool.entry(best), pool.repo_kind(best)) else {
                continue;
            };

            let package = Arc::clone(entry.package());
            for link in package.requires() {
                queue.push_back((link.target.clone(), link.constraint.clone()));
            }
            picked.insert(package.name.to_lowercase(), (package, repo.clone()));
        }

        if !problems.is_empty() {
            return Err(SolverError::unsatisfiable(problems));
        }

        let mut operations = Vec::new();
        for (key, (package, repo)) in &picked {
            if matches!(repo, RepoKind::Root | RepoKind::Platform) {
                continue;
            }
            match installed.find_package(key, None) {
                Some(current) if current.version == package.version => {}
                Some(current) => operations.push(Operation::Update {
                    from: Arc::clone(current),
                    to: Arc::clone(package),
                }),
                None => operations.push(Operation::Install(Arc::clone(package))),
            }
        }
        for current in installed.packages() {
            if !picked.contains_key(&current.name.to_lowercase()) {
                operations.push(Operation::Uninstall(Arc::clone(current)));
            }
        }

        Ok(operations)
    }
}

/// Records applied operations, optionally failing the n-th one
#[derive(Debug, Default, Clone)]
pub struct RecordingMaterializer {
    applied: Rc<RefCell<Vec<String>>>,
    calls: Rc<Cell<usize>>,
    fail_at: Option<usize>,
}

impl RecordingMaterializer {
    /// Fail the `n`-th call (1-based)
    pub fn failing_at(n: usize) -> Self {
        Self {
            fail_at: Some(n),
            ..Default::default()
        }
    }

    pub fn applied(&self) -> Vec<String> {
        self.applied.borrow().clone()
    }
}

impl Materializer for RecordingMaterializer {
    fn apply(&self, operation: &Operation) -> anyhow::Result<()> {
        let call = self.calls.get() + 1;
        self.calls.set(call);
        if self.fail_at == Some(call) {
            bail!("download of {} failed", operation.package());
        }
        self.applied.borrow_mut().push(operation.to_string());
        Ok(())
    }
}

/// Records every dispatched event name
#[derive(Debug, Default, Clone)]
pub struct RecordingDispatcher {
    events: Rc<RefCell<Vec<String>>>,
}

impl RecordingDispatcher {
    pub fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }
}

impl HookDispatcher for RecordingDispatcher {
    fn dispatch(&self, event: &str, _context: &EventContext<'_>) -> anyhow::Result<()> {
        self.events.borrow_mut().push(event.to_string());
        Ok(())
    }
}

/// Fails a single event, accepts every other
#[derive(Debug, Clone)]
pub struct FailingDispatcher {
    event: String,
}

impl FailingDispatcher {
    pub fn on(event: &str) -> Self {
        Self {
            event: event.to_string(),
        }
    }
}

impl HookDispatcher for FailingDispatcher {
    fn dispatch(&self, event: &str, _context: &EventContext<'_>) -> anyhow::Result<()> {
        if event == self.event {
            bail!("listener for {} exited with status 1", event);
        }
        Ok(())
    }
}
