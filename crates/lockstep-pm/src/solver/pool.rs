use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use lockstep_semver::{Stability, VersionConstraint};

use crate::package::{AliasPackage, Link, Package};

/// Literal id of a pool candidate, 1-based
pub type PackageId = i32;

/// Which repository a candidate came from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RepoKind {
    /// The root package itself
    Root,
    /// Platform facts (php, extensions)
    Platform,
    /// The local package store
    Installed,
    /// The packages of the lock file
    Locked,
    /// A named remote repository
    Remote(String),
}

impl RepoKind {
    /// Local repositories describe what exists, they are never a download source
    pub fn is_local(&self) -> bool {
        matches!(self, RepoKind::Root | RepoKind::Platform | RepoKind::Installed)
    }

    pub fn name(&self) -> &str {
        match self {
            RepoKind::Root => "root",
            RepoKind::Platform => "platform",
            RepoKind::Installed => "installed",
            RepoKind::Locked => "lock",
            RepoKind::Remote(name) => name,
        }
    }
}

impl fmt::Display for RepoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Represents an entry in the pool - either a regular package or an alias
#[derive(Debug, Clone)]
pub enum PoolEntry {
    /// A regular package
    Package(Arc<Package>),
    /// An alias of another package
    Alias(Arc<AliasPackage>),
}

impl PoolEntry {
    pub fn name(&self) -> &str {
        match self {
            PoolEntry::Package(p) => p.name(),
            PoolEntry::Alias(a) => a.name(),
        }
    }

    pub fn version(&self) -> &str {
        match self {
            PoolEntry::Package(p) => p.version(),
            PoolEntry::Alias(a) => a.version(),
        }
    }

    pub fn pretty_version(&self) -> &str {
        match self {
            PoolEntry::Package(p) => p.pretty_version(),
            PoolEntry::Alias(a) => a.pretty_version(),
        }
    }

    pub fn stability(&self) -> Stability {
        match self {
            PoolEntry::Package(p) => p.stability(),
            PoolEntry::Alias(a) => a.stability(),
        }
    }

    pub fn is_alias(&self) -> bool {
        matches!(self, PoolEntry::Alias(_))
    }

    /// The concrete package behind this entry (the aliased one for aliases)
    pub fn package(&self) -> &Arc<Package> {
        match self {
            PoolEntry::Package(p) => p,
            PoolEntry::Alias(a) => a.alias_of(),
        }
    }

    pub fn as_alias(&self) -> Option<&Arc<AliasPackage>> {
        match self {
            PoolEntry::Alias(a) => Some(a),
            _ => None,
        }
    }

    pub fn requires(&self) -> &[Link] {
        self.package().requires()
    }

    pub fn dev_requires(&self) -> &[Link] {
        &self.package().dev_requires
    }

    fn provider_link(&self, name: &str) -> Option<&Link> {
        self.package().links.provider_link(name)
    }
}

/// Pool of all candidate packages for dependency resolution.
///
/// The pool indexes packages by ID (1-based) and by name for efficient lookup.
/// Candidates from non-local repositories are only admitted when their
/// stability is acceptable for their name.
pub struct Pool {
    /// Entries and their repository, `id - 1` indexed
    entries: Vec<(PoolEntry, RepoKind)>,

    /// Package IDs indexed by name (lowercase)
    packages_by_name: HashMap<String, Vec<PackageId>>,

    /// Packages indexed by what they provide or replace
    providers: HashMap<String, Vec<PackageId>>,

    /// Priority of repositories (lower = higher priority)
    priorities: HashMap<String, i32>,

    minimum_stability: Stability,
    stability_flags: IndexMap<String, Stability>,
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("entries", &self.entries.len())
            .field("packages_by_name", &self.packages_by_name)
            .field("providers", &self.providers)
            .field("minimum_stability", &self.minimum_stability)
            .finish()
    }
}

impl Default for Pool {
    fn default() -> Self {
        Self::new(Stability::Dev, IndexMap::new())
    }
}

impl Pool {
    /// Create an empty pool filtering remote candidates by stability
    pub fn new(minimum_stability: Stability, stability_flags: IndexMap<String, Stability>) -> Self {
        Self {
            entries: Vec::new(),
            packages_by_name: HashMap::new(),
            providers: HashMap::new(),
            priorities: HashMap::new(),
            minimum_stability,
            stability_flags,
        }
    }

    /// Set a repository priority (lower = preferred)
    pub fn set_priority(&mut self, repo: &RepoKind, priority: i32) {
        self.priorities.insert(repo.name().to_string(), priority);
    }

    pub fn priority(&self, id: PackageId) -> i32 {
        self.repo_kind(id)
            .and_then(|repo| self.priorities.get(repo.name()).copied())
            .unwrap_or(0)
    }

    /// Whether a package of this stability may be admitted under its name
    pub fn is_package_acceptable(&self, name: &str, stability: Stability) -> bool {
        let allowed = self
            .stability_flags
            .get(&name.to_lowercase())
            .copied()
            .unwrap_or(self.minimum_stability);
        stability.priority() <= allowed.priority()
    }

    /// Add a package, returning its ID, or `None` when its stability is not acceptable
    pub fn add_package(&mut self, package: Arc<Package>, repo: RepoKind) -> Option<PackageId> {
        if !repo.is_local() && !self.is_admissible(package.names(), package.stability()) {
            log::debug!("Skipping {} from {}: stability not acceptable", package, repo);
            return None;
        }
        Some(self.push(PoolEntry::Package(package), repo))
    }

    /// Add an alias entry, returning its ID
    pub fn add_alias(&mut self, alias: AliasPackage, repo: RepoKind) -> Option<PackageId> {
        let mut names = vec![alias.name().to_lowercase()];
        names.extend(alias.alias_of().links.provided_names().map(str::to_lowercase));
        if !repo.is_local() && !self.is_admissible(names, alias.stability()) {
            return None;
        }
        Some(self.push(PoolEntry::Alias(Arc::new(alias)), repo))
    }

    /// Acceptable under any of the names the package answers to
    fn is_admissible(&self, names: Vec<String>, stability: Stability) -> bool {
        names
            .iter()
            .any(|name| self.is_package_acceptable(name, stability))
    }

    fn push(&mut self, entry: PoolEntry, repo: RepoKind) -> PackageId {
        let id = (self.entries.len() + 1) as PackageId;

        self.packages_by_name
            .entry(entry.name().to_lowercase())
            .or_default()
            .push(id);

        for provided in entry.package().links.provided_names() {
            self.providers
                .entry(provided.to_lowercase())
                .or_default()
                .push(id);
        }

        self.entries.push((entry, repo));
        id
    }

    /// Get an entry by its ID
    pub fn entry(&self, id: PackageId) -> Option<&PoolEntry> {
        self.slot(id).map(|(entry, _)| entry)
    }

    /// Repository the entry was added from
    pub fn repo_kind(&self, id: PackageId) -> Option<&RepoKind> {
        self.slot(id).map(|(_, repo)| repo)
    }

    fn slot(&self, id: PackageId) -> Option<&(PoolEntry, RepoKind)> {
        if id > 0 {
            self.entries.get((id - 1) as usize)
        } else {
            None
        }
    }

    pub fn is_alias(&self, id: PackageId) -> bool {
        self.entry(id).is_some_and(PoolEntry::is_alias)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All IDs, in insertion order
    pub fn ids(&self) -> impl Iterator<Item = PackageId> + '_ {
        (1..=self.entries.len()).map(|i| i as PackageId)
    }

    /// Get all packages with a given name
    pub fn packages_by_name(&self, name: &str) -> Vec<PackageId> {
        self.packages_by_name
            .get(&name.to_lowercase())
            .cloned()
            .unwrap_or_default()
    }

    /// Find all packages that provide a given name (including the name itself)
    ///
    /// Direct matches come first and are filtered on their version. Providers
    /// and replacers follow when their provide/replace constraint intersects the
    /// requested one.
    pub fn what_provides(&self, name: &str, constraint: Option<&VersionConstraint>) -> Vec<PackageId> {
        let name_lower = name.to_lowercase();
        let mut result = Vec::new();

        if let Some(ids) = self.packages_by_name.get(&name_lower) {
            for &id in ids {
                let Some(entry) = self.entry(id) else { continue };
                if constraint.map_or(true, |c| c.satisfies(entry.version())) {
                    result.push(id);
                }
            }
        }

        if let Some(ids) = self.providers.get(&name_lower) {
            for &id in ids {
                if result.contains(&id) {
                    continue;
                }
                let Some(link) = self.entry(id).and_then(|e| e.provider_link(&name_lower)) else {
                    continue;
                };
                if constraint.map_or(true, |c| c.matches(&link.constraint)) {
                    result.push(id);
                }
            }
        }

        result
    }
}
