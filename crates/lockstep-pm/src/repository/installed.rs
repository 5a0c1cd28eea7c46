use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;

use crate::error::{InstallerError, Result};
use crate::json::{InstalledFile, LockedPackage};
use crate::package::Package;
use crate::solver::Operation;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Storage {
    File(PathBuf),
    Memory,
}

/// The local package store (`vendor/composer/installed.json`).
///
/// The durable record of what is on disk. [`write`](Self::write) atomically
/// replaces the file; an in-memory store never touches disk.
#[derive(Debug, Clone)]
pub struct InstalledRepository {
    packages: Vec<Arc<Package>>,
    storage: Storage,
}

impl InstalledRepository {
    /// Load the store from `path`, empty when the file does not exist yet
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let packages = read_packages(&path)?;
        Ok(Self {
            packages,
            storage: Storage::File(path),
        })
    }

    pub fn in_memory(packages: Vec<Package>) -> Self {
        Self {
            packages: packages.into_iter().map(Arc::new).collect(),
            storage: Storage::Memory,
        }
    }

    /// A detached copy that never persists
    pub fn to_memory(&self) -> Self {
        Self {
            packages: self.packages.clone(),
            storage: Storage::Memory,
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.storage == Storage::Memory
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.storage {
            Storage::File(path) => Some(path),
            Storage::Memory => None,
        }
    }

    pub fn packages(&self) -> &[Arc<Package>] {
        &self.packages
    }

    pub(crate) fn packages_mut(&mut self) -> &mut Vec<Arc<Package>> {
        &mut self.packages
    }

    /// Find a package by name, optionally at an exact normalized version
    pub fn find_package(&self, name: &str, version: Option<&str>) -> Option<&Arc<Package>> {
        self.packages.iter().find(|pkg| {
            pkg.name.eq_ignore_ascii_case(name) && version.map_or(true, |v| pkg.version == v)
        })
    }

    pub fn has_package(&self, package: &Package) -> bool {
        self.packages.iter().any(|pkg| pkg.same_as(package))
    }

    pub fn add_package(&mut self, package: Arc<Package>) {
        if !self.has_package(&package) {
            self.packages.push(package);
        }
    }

    pub fn remove_package(&mut self, package: &Package) {
        self.packages.retain(|pkg| !pkg.same_as(package));
    }

    /// Record the effect of an applied operation
    pub fn apply(&mut self, operation: &Operation) {
        match operation {
            Operation::Install(pkg) => self.add_package(Arc::clone(pkg)),
            Operation::Update { from, to } => {
                self.remove_package(from);
                self.add_package(Arc::clone(to));
            }
            Operation::Uninstall(pkg) => self.remove_package(pkg),
        }
    }

    /// Every name an installed package answers to, lowercased
    pub fn names(&self) -> HashSet<String> {
        self.packages.iter().flat_map(|pkg| pkg.names()).collect()
    }

    /// Persist the store, replacing the previous file atomically
    pub fn write(&self) -> Result<()> {
        let Storage::File(path) = &self.storage else {
            return Ok(());
        };

        let mut entries: Vec<LockedPackage> = self
            .packages
            .iter()
            .map(|pkg| {
                let mut entry = LockedPackage::from(pkg.as_ref());
                entry.version_normalized = Some(pkg.version.clone());
                entry
            })
            .collect();
        entries.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

        let json = serde_json::to_string_pretty(&InstalledFile { packages: entries })?;

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;
        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(json.as_bytes())?;
        file.write_all(b"\n")?;
        file.persist(path).map_err(|e| InstallerError::Persist {
            path: path.clone(),
            source: e.error,
        })?;

        log::debug!("Wrote {} packages to {}", self.packages.len(), path.display());
        Ok(())
    }

    /// Re-read the store from disk, dropping in-memory changes
    pub fn reload(&mut self) -> Result<()> {
        if let Storage::File(path) = &self.storage {
            self.packages = read_packages(path)?;
        }
        Ok(())
    }
}

fn read_packages(path: &Path) -> Result<Vec<Arc<Package>>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(path)?;
    let file = InstalledFile::from_json(&content)?;
    file.packages
        .iter()
        .map(|entry| -> Result<Arc<Package>> { Ok(Arc::new(Package::try_from(entry)?)) })
        .collect()
}
