//! Partial updates: which installed packages may move this run.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use indexmap::IndexSet;
use lockstep_semver::VersionConstraint;
use regex::Regex;

use super::report::Advisory;
use crate::package::{Package, RootPackage};
use crate::solver::{PackageId, Pool, RepoKind, Request, RequestError};
use crate::util::{matches_package_pattern, package_name_to_regex};

/// Whitelist entries that never name a real package
const NO_OP_TOKENS: [&str; 2] = ["nothing", "lock"];

/// Name patterns allowed to change during an update.
///
/// Entries are lowercased exact names or `*` globs. The set only grows.
#[derive(Debug, Clone, Default)]
pub struct UpdateWhitelist {
    patterns: IndexSet<String>,
    matchers: Vec<Regex>,
}

impl UpdateWhitelist {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut whitelist = Self::default();
        for pattern in patterns {
            whitelist.insert(pattern.as_ref());
        }
        whitelist
    }

    /// Add an entry, returning whether it was new
    pub fn insert(&mut self, pattern: &str) -> bool {
        let pattern = pattern.to_lowercase();
        if self.patterns.contains(&pattern) {
            return false;
        }
        self.matchers.push(package_name_to_regex(&pattern));
        self.patterns.insert(pattern);
        true
    }

    /// Exact entry lookup, no glob matching
    pub fn contains(&self, name: &str) -> bool {
        self.patterns.contains(&name.to_lowercase())
    }

    /// Whether the package name matches any entry (case-insensitive, `*` globs)
    pub fn is_updateable(&self, name: &str) -> bool {
        self.matchers.iter().any(|re| re.is_match(name))
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Grows a whitelist along the requirement edges of the current packages.
///
/// Root requirements are walls: a dependency that the root also requires is
/// only updated when it is whitelisted itself.
pub struct UpdateWhitelistExpander<'a> {
    root: &'a RootPackage,
    dev_mode: bool,
    whitelist_dependencies: bool,
}

impl<'a> UpdateWhitelistExpander<'a> {
    pub fn new(root: &'a RootPackage, dev_mode: bool, whitelist_dependencies: bool) -> Self {
        Self {
            root,
            dev_mode,
            whitelist_dependencies,
        }
    }

    /// Expand `patterns` over `current` (the locked, or else installed, packages)
    pub fn expand<S: AsRef<str>>(
        &self,
        patterns: &[S],
        current: &[Arc<Package>],
    ) -> (UpdateWhitelist, Vec<Advisory>) {
        let mut pool = Pool::default();
        for package in current {
            pool.add_package(Arc::clone(package), RepoKind::Installed);
        }

        let root_links = self.root.links(self.dev_mode);
        let skip: HashSet<String> = root_links.iter().map(|l| l.target.to_lowercase()).collect();
        let root_required: Vec<&str> = root_links.iter().map(|l| l.target.as_str()).collect();

        let mut whitelist = UpdateWhitelist::new(patterns);
        let direct: Vec<String> = whitelist.patterns().map(str::to_string).collect();
        let mut advisories = Vec::new();
        let mut seen: HashSet<PackageId> = HashSet::new();

        for pattern in &direct {
            let seeds = pool.what_provides(pattern, None);

            let names_root_requirement = root_required
                .iter()
                .any(|name| name.eq_ignore_ascii_case(pattern) || matches_package_pattern(name, pattern));
            if seeds.is_empty() && !names_root_requirement && !NO_OP_TOKENS.contains(&pattern.as_str()) {
                advisories.push(Advisory::WhitelistMiss { pattern: pattern.clone() });
            }

            let mut queue: VecDeque<PackageId> = seeds.into_iter().collect();
            while let Some(id) = queue.pop_front() {
                if !seen.insert(id) {
                    continue;
                }
                let Some(entry) = pool.entry(id) else { continue };
                whitelist.insert(entry.name());

                if !self.whitelist_dependencies {
                    continue;
                }

                let mut links: Vec<_> = entry.requires().iter().collect();
                if self.dev_mode {
                    links.extend(entry.dev_requires());
                }

                for link in links {
                    for candidate in pool.what_provides(&link.target, None) {
                        if seen.contains(&candidate) {
                            continue;
                        }
                        let Some(name) = pool.entry(candidate).map(|e| e.name().to_lowercase()) else {
                            continue;
                        };
                        if skip.contains(&name) && !whitelist.contains(&name) {
                            log::warn!(
                                "Dependency \"{}\" is also a root requirement, but is not explicitly whitelisted. Ignoring.",
                                name
                            );
                            continue;
                        }
                        queue.push_back(candidate);
                    }
                }
            }
        }

        (whitelist, advisories)
    }
}

/// Pin every current package the whitelist does not cover.
///
/// Candidates are the root link targets and the installed packages; each is
/// pinned to its current (`locked`, or else installed) version. Packages
/// scheduled for removal because of their stability are left alone.
pub(crate) fn pin_non_updateable(
    request: &mut Request,
    whitelist: &UpdateWhitelist,
    root: &RootPackage,
    dev_mode: bool,
    installed: &[Arc<Package>],
    locked: Option<&[Arc<Package>]>,
    removed_unstable: &HashSet<String>,
) -> Result<Vec<Advisory>, RequestError> {
    let root_links = root.links(dev_mode);
    let current = locked.unwrap_or(installed);
    let description = if locked.is_some() { "locked at" } else { "installed at" };

    let mut candidates: IndexSet<String> = root_links.iter().map(|l| l.target.to_lowercase()).collect();
    candidates.extend(installed.iter().map(|p| p.name.to_lowercase()));

    let mut advisories = Vec::new();
    for candidate in &candidates {
        let Some(package) = current.iter().find(|p| p.name.eq_ignore_ascii_case(candidate)) else {
            continue;
        };
        if whitelist.is_updateable(&package.name) || removed_unstable.contains(candidate) {
            continue;
        }
        if request.contains(&package.name) {
            continue;
        }

        let root_link = root_links.iter().find(|l| l.targets(candidate));
        let required_as = root_link
            .map(|l| format!(", required as {}", l.pretty_constraint()))
            .unwrap_or_default();
        let constraint = VersionConstraint::exact(package.version.clone()).with_pretty_string(format!(
            "({} {}{})",
            description, package.pretty_version, required_as
        ));

        if let Some(link) = root_link {
            if !link.constraint.satisfies(&package.version) {
                advisories.push(Advisory::RootRequirementNotWhitelisted {
                    package: package.name.clone(),
                    constraint: link.pretty_constraint(),
                    pinned: package.pretty_version.clone(),
                });
            }
        }

        request.install(&package.name, constraint)?;
    }

    Ok(advisories)
}
