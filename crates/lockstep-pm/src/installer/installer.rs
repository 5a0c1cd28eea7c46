use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use lockstep_semver::VersionConstraint;

use super::dev_packages::{DevPackageReconciler, ReconcilePass};
use super::executor::{filter_suggestions, OperationExecutor};
use super::materializer::{Materializer, NoopMaterializer, VendorMaterializer};
use super::report::{Advisory, InstallReport};
use super::request_builder::{require_links, RequestBuilder};
use super::whitelist::{pin_non_updateable, UpdateWhitelist, UpdateWhitelistExpander};
use crate::config::InstallConfig;
use crate::error::{InstallerError, Result};
use crate::event::{self, EventContext, HookDispatcher, NullDispatcher, ScriptListener};
use crate::json::ProjectManifest;
use crate::lock::{compute_content_hash, LockManager, Locker};
use crate::package::{Package, RootAlias, RootPackage};
use crate::repository::{ArrayRepository, InstalledRepository, PlatformRepository};
use crate::solver::{move_plugins_to_front, move_uninstalls_to_front, Operation, Policy, Pool, RepoKind, Solver};
use crate::util::is_platform_package;

/// Runs an install or update of a project.
///
/// Install mode reproduces the lock file. Update mode re-resolves the root
/// requirements (or only the whitelisted part of them) and writes a new lock.
/// Without a lock file an install turns into an update.
pub struct Installer {
    config: InstallConfig,
    root: RootPackage,
    locker: Locker,
    store: InstalledRepository,
    platform: PlatformRepository,
    repositories: Vec<ArrayRepository>,
    solver: Box<dyn Solver>,
    materializer: Box<dyn Materializer>,
    dispatcher: Box<dyn HookDispatcher>,
}

impl Installer {
    /// Create an installer materializing into the vendor directory and
    /// running the root package's scripts.
    pub fn new(
        config: InstallConfig,
        root: RootPackage,
        locker: Locker,
        store: InstalledRepository,
        platform: PlatformRepository,
        solver: Box<dyn Solver>,
    ) -> Self {
        let materializer = VendorMaterializer::new(config.vendor_path(), config.working_dir.clone());
        let dispatcher = ScriptListener::from_root(&root);
        Self {
            config,
            root,
            locker,
            store,
            platform,
            repositories: Vec::new(),
            solver,
            materializer: Box::new(materializer),
            dispatcher: Box::new(dispatcher),
        }
    }

    /// Load the root manifest, lock file and local store of `config.working_dir`
    pub fn load(config: InstallConfig, platform: PlatformRepository, solver: Box<dyn Solver>) -> Result<Self> {
        let manifest_path = config.working_dir.join("composer.json");
        let content = std::fs::read_to_string(&manifest_path)?;
        let manifest = ProjectManifest::from_json(&content)?;
        let root = RootPackage::from_manifest(&manifest)?;

        let locker = Locker::new(config.lock_path(), compute_content_hash(&content))?;
        let store = InstalledRepository::from_file(config.installed_path())?;

        Ok(Self::new(config, root, locker, store, platform, solver))
    }

    /// Add a repository of remote candidates
    pub fn with_repository(mut self, repository: ArrayRepository) -> Self {
        self.repositories.push(repository);
        self
    }

    pub fn with_materializer(mut self, materializer: Box<dyn Materializer>) -> Self {
        self.materializer = materializer;
        self
    }

    pub fn with_dispatcher(mut self, dispatcher: Box<dyn HookDispatcher>) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn config(&self) -> &InstallConfig {
        &self.config
    }

    pub fn root(&self) -> &RootPackage {
        &self.root
    }

    pub fn locker(&self) -> &Locker {
        &self.locker
    }

    /// The local store as of the last run
    pub fn store(&self) -> &InstalledRepository {
        &self.store
    }

    /// Run the install or update.
    ///
    /// A dry run works on an in-memory copy of the local store and never
    /// touches disk, the lock or any hook. After a failed run the store is
    /// re-read, so it holds exactly the operations that completed.
    pub fn run(&mut self) -> Result<InstallReport> {
        let mut store = if self.config.dry_run {
            self.store.to_memory()
        } else {
            std::mem::replace(&mut self.store, InstalledRepository::in_memory(Vec::new()))
        };

        let result = self.run_with(&mut store);

        if !self.config.dry_run {
            if result.is_err() {
                // drop links refreshed in memory by reconciliation
                if let Err(err) = store.reload() {
                    log::warn!("Could not re-read the local store after a failed run: {}", err);
                }
            }
            self.store = store;
        }
        result
    }

    fn run_with(&mut self, store: &mut InstalledRepository) -> Result<InstallReport> {
        let mut report = InstallReport::default();
        let dry_run = self.config.dry_run;
        let dev_mode = self.config.dev_mode;
        let is_locked = self.locker.is_locked();

        let update = self.config.update || !is_locked;
        let from_lock = !update;
        if !self.config.update && !is_locked {
            log::info!("No lock file found. Updating dependencies instead of installing from lock file.");
        }

        let null_dispatcher = NullDispatcher;
        let dispatcher: &dyn HookDispatcher = if self.config.run_scripts && !dry_run {
            self.dispatcher.as_ref()
        } else {
            &null_dispatcher
        };
        let working_dir = self.config.working_dir.as_path();

        if from_lock {
            log::info!(
                "Installing dependencies from lock file{}",
                if dev_mode { " (including require-dev)" } else { "" }
            );
            if !self.locker.is_fresh() {
                report.advise(Advisory::StaleLock);
            }
        } else {
            log::info!(
                "Updating dependencies{}",
                if dev_mode { " (including require-dev)" } else { "" }
            );
        }

        let (pre_event, post_event) = if update {
            (event::PRE_UPDATE_CMD, event::POST_UPDATE_CMD)
        } else {
            (event::PRE_INSTALL_CMD, event::POST_INSTALL_CMD)
        };
        run_hook(dispatcher, pre_event, dev_mode, working_dir)?;

        let overrides = if from_lock {
            self.locker.platform_overrides()
        } else {
            self.root.platform_overrides().clone()
        };
        let platform = self.platform.clone().with_overrides(&overrides)?;

        let locked_packages = if from_lock {
            match self.locker.locked_repository(dev_mode) {
                Err(InstallerError::MissingDevLockData) if !self.root.has_dev_requires() => {
                    self.locker.locked_repository(false)?
                }
                result => result?,
            }
        } else if is_locked {
            match self.locker.locked_repository(dev_mode) {
                Err(InstallerError::MissingDevLockData) => self.locker.locked_repository(false)?,
                result => result?,
            }
        } else {
            Vec::new()
        };

        let aliases = if from_lock {
            self.locker.aliases()
        } else {
            self.root.aliases().to_vec()
        };

        // candidates the request can be resolved against
        let mut pool = if from_lock {
            Pool::new(self.locker.minimum_stability(), self.locker.stability_flags())
        } else {
            Pool::new(self.root.minimum_stability(), self.root.stability_flags().clone())
        };
        if from_lock {
            for pkg in &locked_packages {
                add_with_aliases(&mut pool, pkg, RepoKind::Locked, &aliases);
            }
        } else {
            for repository in &self.repositories {
                let repo = RepoKind::Remote(repository.name().to_string());
                for pkg in repository.packages() {
                    add_with_aliases(&mut pool, pkg, repo.clone(), &aliases);
                }
            }
            if is_locked && !self.config.update_whitelist.is_empty() {
                for pkg in &locked_packages {
                    add_with_aliases(&mut pool, pkg, RepoKind::Locked, &aliases);
                }
            }
        }

        let whitelist = if update && !self.config.update_whitelist.is_empty() {
            let current: &[Arc<Package>] = if is_locked { &locked_packages } else { store.packages() };
            let (whitelist, advisories) =
                UpdateWhitelistExpander::new(&self.root, dev_mode, self.config.whitelist_dependencies)
                    .expand(&self.config.update_whitelist, current);
            for advisory in advisories {
                report.advise(advisory);
            }
            Some(whitelist)
        } else {
            None
        };

        let mut request = RequestBuilder::new(&self.root, &platform).build()?;

        let mut removed_unstable = HashSet::new();
        if update {
            for pkg in store.packages() {
                if is_platform_package(&pkg.name) || pool.is_package_acceptable(&pkg.name, pkg.stability()) {
                    continue;
                }
                report.advise(Advisory::UnacceptableStability {
                    package: pkg.name.clone(),
                    version: pkg.pretty_version.clone(),
                });
                request.remove(
                    &pkg.name,
                    VersionConstraint::exact(pkg.version.clone()).with_pretty_string(pkg.pretty_version.clone()),
                )?;
                removed_unstable.insert(pkg.name.to_lowercase());
            }
        }

        if update {
            request.update_all();
            if let Some(whitelist) = &whitelist {
                let locked = is_locked.then_some(locked_packages.as_slice());
                let advisories = pin_non_updateable(
                    &mut request,
                    whitelist,
                    &self.root,
                    dev_mode,
                    store.packages(),
                    locked,
                    &removed_unstable,
                )?;
                for advisory in advisories {
                    report.advise(advisory);
                }
            }
            require_links(&mut request, self.root.links(dev_mode))?;
        } else {
            for pkg in &locked_packages {
                if request.contains(&pkg.name) {
                    continue;
                }
                let constraint = match aliases.iter().find(|alias| alias.applies_to(pkg)) {
                    Some(alias) => VersionConstraint::exact(alias.alias_normalized.clone())
                        .with_pretty_string(alias.alias.clone()),
                    None => VersionConstraint::exact(pkg.version.clone())
                        .with_pretty_string(pkg.pretty_version.clone()),
                };
                request.install(&pkg.name, constraint)?;
            }
            let platform_requirements = self.locker.platform_requirements(dev_mode)?;
            require_links(&mut request, &platform_requirements)?;
        }

        let policy = if from_lock {
            Policy::new()
                .prefer_stable(self.locker.prefer_stable())
                .prefer_lowest(self.locker.prefer_lowest())
        } else {
            Policy::new()
                .prefer_stable(self.root.prefer_stable() || self.config.prefer_stable)
                .prefer_lowest(self.config.prefer_lowest)
        };

        dev_reconciler(&pool, &policy, &locked_packages, from_lock, whitelist.as_ref(), self.root.references())
            .reconcile(ReconcilePass::ForceLinks, store, Vec::new());

        // what already exists joins the pool only now, with refreshed links
        for pkg in store.packages() {
            add_with_aliases(&mut pool, pkg, RepoKind::Installed, &aliases);
        }
        pool.add_package(Arc::new(self.root.package().clone()), RepoKind::Root);
        for fact in platform.packages() {
            pool.add_package(Arc::clone(fact), RepoKind::Platform);
        }

        run_hook(dispatcher, event::PRE_DEPENDENCIES_SOLVING, dev_mode, working_dir)?;
        let operations = self.solver.solve(&policy, &pool, store, &request)?;
        run_hook(dispatcher, event::POST_DEPENDENCIES_SOLVING, dev_mode, working_dir)?;

        let operations =
            dev_reconciler(&pool, &policy, &locked_packages, from_lock, whitelist.as_ref(), self.root.references())
                .reconcile(ReconcilePass::ForceUpdates, store, operations);
        let operations = move_uninstalls_to_front(move_plugins_to_front(operations));

        if operations.is_empty() {
            log::info!("Nothing to install or update");
        } else {
            log::info!("Package operations: {}", summarize(&operations));
        }

        let noop = NoopMaterializer;
        let materializer: &dyn Materializer = if dry_run { &noop } else { self.materializer.as_ref() };
        let mut executor = OperationExecutor::new(materializer, dev_mode, working_dir)
            .with_dispatcher(dispatcher)
            .installing_from_lock(from_lock);
        if !from_lock {
            executor = executor.with_references(self.root.references());
        }
        let (executed, suggestions) = executor.execute(operations, store)?;

        if !dry_run {
            refresh_source_urls(store, &pool, &policy);
            store.write()?;
        }

        for pkg in store.packages() {
            if pkg.is_abandoned() {
                report.advise(Advisory::AbandonedPackage {
                    package: pkg.name.clone(),
                    replacement: pkg.replacement_package().map(str::to_string),
                });
            }
        }

        if !dry_run && update {
            report.lock_written = LockManager::new(&self.root, &platform, self.solver.as_ref(), dev_mode)
                .prefer_lowest(self.config.prefer_lowest)
                .write(&mut self.locker, store)?;
        }

        run_hook(dispatcher, post_event, dev_mode, working_dir)?;

        report.suggestions = filter_suggestions(suggestions, store, &platform);
        report.operations = executed;
        Ok(report)
    }
}

fn run_hook(dispatcher: &dyn HookDispatcher, event: &str, dev_mode: bool, working_dir: &Path) -> Result<()> {
    dispatcher
        .dispatch(event, &EventContext::new(dev_mode, working_dir))
        .map_err(|source| InstallerError::RunHook {
            event: event.to_string(),
            source,
        })
}

fn add_with_aliases(pool: &mut Pool, package: &Arc<Package>, repo: RepoKind, aliases: &[RootAlias]) {
    pool.add_package(Arc::clone(package), repo.clone());
    for alias in aliases.iter().filter(|alias| alias.applies_to(package)) {
        pool.add_alias(alias.to_alias_package(Arc::clone(package)), repo.clone());
    }
}

fn dev_reconciler<'a>(
    pool: &'a Pool,
    policy: &'a Policy,
    locked: &'a [Arc<Package>],
    from_lock: bool,
    whitelist: Option<&'a UpdateWhitelist>,
    references: &'a IndexMap<String, String>,
) -> DevPackageReconciler<'a> {
    let mut reconciler = DevPackageReconciler::new(pool, policy, locked, from_lock);
    if let Some(whitelist) = whitelist {
        reconciler = reconciler.with_whitelist(whitelist);
    }
    reconciler.with_references(references)
}

fn summarize(operations: &[Operation]) -> String {
    let count = |job: &str| operations.iter().filter(|op| op.job_type() == job).count();
    format!(
        "{} installs, {} updates, {} removals",
        count("install"),
        count("update"),
        count("uninstall")
    )
}

/// Take the URLs the preferred remote candidate advertises for the same reference
fn refresh_source_urls(store: &mut InstalledRepository, pool: &Pool, policy: &Policy) {
    for slot in store.packages_mut().iter_mut() {
        let exact = VersionConstraint::exact(slot.version.clone());
        let candidates: Vec<_> = pool
            .what_provides(&slot.name, Some(&exact))
            .into_iter()
            .filter(|&id| {
                let remote = pool.repo_kind(id).is_some_and(|repo| !repo.is_local());
                let same_name = pool
                    .entry(id)
                    .is_some_and(|e| !e.is_alias() && e.name().eq_ignore_ascii_case(&slot.name));
                remote && same_name
            })
            .collect();
        let Some(preferred) = policy.select_best(pool, &candidates).and_then(|id| pool.entry(id)) else {
            continue;
        };
        let preferred = Arc::clone(preferred.package());

        if let (Some(current), Some(remote)) = (&slot.source, &preferred.source) {
            if current.reference == remote.reference && current.url != remote.url {
                log::debug!("Refreshing source URL of {} to {}", slot.name, remote.url);
                let url = remote.url.clone();
                if let Some(source) = Arc::make_mut(slot).source.as_mut() {
                    source.url = url;
                }
            }
        }
        if let (Some(current), Some(remote)) = (&slot.dist, &preferred.dist) {
            if current.reference == remote.reference && current.url != remote.url {
                log::debug!("Refreshing dist URL of {} to {}", slot.name, remote.url);
                let url = remote.url.clone();
                if let Some(dist) = Arc::make_mut(slot).dist.as_mut() {
                    dist.url = url;
                }
            }
        }
    }
}
