//! Deriving the lock snapshot from what was actually installed.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use lockstep_semver::Stability;

use super::locker::{LockData, Locker};
use crate::error::Result;
use crate::installer::{require_links, RequestBuilder};
use crate::package::{Link, Package, RootPackage};
use crate::repository::{InstalledRepository, PlatformRepository};
use crate::solver::{Operation, Policy, Pool, RepoKind, Solver};
use crate::util::is_platform_package;

/// Writes the lock from the persisted local store
pub struct LockManager<'a> {
    root: &'a RootPackage,
    platform: &'a PlatformRepository,
    solver: &'a dyn Solver,
    dev_mode: bool,
    prefer_lowest: bool,
}

impl<'a> LockManager<'a> {
    pub fn new(
        root: &'a RootPackage,
        platform: &'a PlatformRepository,
        solver: &'a dyn Solver,
        dev_mode: bool,
    ) -> Self {
        Self {
            root,
            platform,
            solver,
            dev_mode,
            prefer_lowest: false,
        }
    }

    pub fn prefer_lowest(mut self, prefer: bool) -> Self {
        self.prefer_lowest = prefer;
        self
    }

    /// Reload `store` from disk and write the lock from it.
    ///
    /// Returns whether the lock file changed.
    pub fn write(&self, locker: &mut Locker, store: &mut InstalledRepository) -> Result<bool> {
        store.reload()?;

        let dev_packages = self.dev_packages(store)?;
        let dev_names: HashSet<String> = dev_packages
            .iter()
            .flatten()
            .map(|pkg| pkg.name.to_lowercase())
            .collect();
        let packages: Vec<Arc<Package>> = store
            .packages()
            .iter()
            .filter(|pkg| !dev_names.contains(&pkg.name.to_lowercase()))
            .cloned()
            .collect();

        locker.set_lock_data(LockData {
            packages,
            dev_packages,
            aliases: self.root.aliases().to_vec(),
            minimum_stability: self.root.minimum_stability(),
            stability_flags: self.root.stability_flags().clone(),
            prefer_stable: self.root.prefer_stable(),
            prefer_lowest: self.prefer_lowest,
            platform: platform_requirements(self.root.requires()),
            platform_dev: platform_requirements(self.root.dev_requires()),
            platform_overrides: self.root.platform_overrides().clone(),
        })
    }

    /// Installed packages only needed for dev requirements.
    ///
    /// `None` when the split is unknown: a non-dev run of a root that has dev
    /// requirements never installed them.
    fn dev_packages(&self, store: &InstalledRepository) -> Result<Option<Vec<Arc<Package>>>> {
        if !self.root.has_dev_requires() {
            return Ok(Some(Vec::new()));
        }
        if !self.dev_mode {
            return Ok(None);
        }

        // what would go if the dev requirements were dropped
        let mut pool = Pool::new(Stability::Dev, IndexMap::new());
        for pkg in store.packages() {
            pool.add_package(Arc::clone(pkg), RepoKind::Installed);
        }
        pool.add_package(Arc::new(self.root.package().clone()), RepoKind::Root);
        for fact in self.platform.packages() {
            pool.add_package(Arc::clone(fact), RepoKind::Platform);
        }

        let mut request = RequestBuilder::new(self.root, self.platform).build()?;
        request.update_all();
        require_links(&mut request, self.root.requires())?;

        let operations = self.solver.solve(&Policy::new(), &pool, store, &request)?;
        let dev = operations
            .into_iter()
            .filter_map(|op| match op {
                Operation::Uninstall(pkg) => Some(pkg),
                _ => None,
            })
            .collect();
        Ok(Some(dev))
    }
}

fn platform_requirements(links: &[Link]) -> IndexMap<String, String> {
    links
        .iter()
        .filter(|link| is_platform_package(&link.target))
        .map(|link| (link.target.clone(), link.pretty_constraint()))
        .collect()
}
