use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use lockstep_semver::Stability;
use md5::{Digest, Md5};
use tempfile::NamedTempFile;

use crate::error::{InstallerError, Result};
use crate::json::{LockAlias, LockFile, LockedPackage};
use crate::package::{Link, LinkType, Package, RootAlias};

/// Manifest keys whose change invalidates a lock
const RELEVANT_KEYS: &[&str] = &[
    "name",
    "version",
    "require",
    "require-dev",
    "conflict",
    "replace",
    "provide",
    "minimum-stability",
    "prefer-stable",
    "repositories",
    "extra",
];

/// Compute the content hash of a manifest, as stored in the lock file.
///
/// Only keys relevant to resolution contribute, so reformatting the manifest
/// or editing its description keeps an existing lock fresh.
pub fn compute_content_hash(manifest_json: &str) -> String {
    let relevant = match serde_json::from_str::<serde_json::Value>(manifest_json) {
        Ok(serde_json::Value::Object(manifest)) => {
            let mut relevant: BTreeMap<&str, serde_json::Value> = BTreeMap::new();
            for &key in RELEVANT_KEYS {
                if let Some(value) = manifest.get(key) {
                    relevant.insert(key, value.clone());
                }
            }
            if let Some(platform) = manifest.get("config").and_then(|c| c.get("platform")) {
                relevant.insert("config", serde_json::json!({ "platform": platform }));
            }
            serde_json::to_string(&relevant).unwrap_or_default()
        }
        _ => manifest_json.to_string(),
    };

    let mut hasher = Md5::new();
    hasher.update(relevant.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Everything a new lock snapshot is made of
#[derive(Debug, Clone, Default)]
pub struct LockData {
    pub packages: Vec<Arc<Package>>,
    /// `None` when the dev split is unknown
    pub dev_packages: Option<Vec<Arc<Package>>>,
    pub aliases: Vec<RootAlias>,
    pub minimum_stability: Stability,
    pub stability_flags: IndexMap<String, Stability>,
    pub prefer_stable: bool,
    pub prefer_lowest: bool,
    pub platform: IndexMap<String, String>,
    pub platform_dev: IndexMap<String, String>,
    pub platform_overrides: IndexMap<String, String>,
}

/// Reads and writes the lock file
#[derive(Debug)]
pub struct Locker {
    path: PathBuf,
    content_hash: String,
    lock: Option<LockFile>,
}

impl Locker {
    /// Open the lock at `path`, `content_hash` being the hash of the current manifest
    pub fn new(path: impl Into<PathBuf>, content_hash: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let lock = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            Some(serde_json::from_str(&content)?)
        } else {
            None
        };

        Ok(Self {
            path,
            content_hash: content_hash.into(),
            lock,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_locked(&self) -> bool {
        self.lock.is_some()
    }

    /// Whether the lock was written for the current manifest
    pub fn is_fresh(&self) -> bool {
        self.lock
            .as_ref()
            .is_some_and(|lock| lock.content_hash == self.content_hash)
    }

    pub fn lock_data(&self) -> Option<&LockFile> {
        self.lock.as_ref()
    }

    /// The locked packages, dev packages included when `with_dev` is set
    pub fn locked_repository(&self, with_dev: bool) -> Result<Vec<Arc<Package>>> {
        let Some(lock) = &self.lock else {
            return Ok(Vec::new());
        };

        let mut entries: Vec<&LockedPackage> = lock.packages.iter().collect();
        if with_dev {
            let dev = lock.packages_dev.as_ref().ok_or(InstallerError::MissingDevLockData)?;
            entries.extend(dev.iter());
        }

        entries
            .into_iter()
            .map(|entry| -> Result<Arc<Package>> { Ok(Arc::new(Package::try_from(entry)?)) })
            .collect()
    }

    /// Whether the lock carries dev information at all
    pub fn has_dev_data(&self) -> bool {
        self.lock.as_ref().is_some_and(|lock| lock.packages_dev.is_some())
    }

    pub fn aliases(&self) -> Vec<RootAlias> {
        self.lock
            .as_ref()
            .map(|lock| lock.aliases.iter().map(RootAlias::from).collect())
            .unwrap_or_default()
    }

    /// The platform requirements recorded in the lock as links of the root
    pub fn platform_requirements(&self, with_dev: bool) -> Result<Vec<Link>> {
        let Some(lock) = &self.lock else {
            return Ok(Vec::new());
        };

        let mut requirements = Vec::new();
        for (target, constraint) in &lock.platform {
            requirements.push(Link::parse("__root__", "1.0.0", target, constraint, LinkType::Require)?);
        }
        if with_dev {
            for (target, constraint) in &lock.platform_dev {
                requirements.push(Link::parse("__root__", "1.0.0", target, constraint, LinkType::DevRequire)?);
            }
        }
        Ok(requirements)
    }

    pub fn minimum_stability(&self) -> Stability {
        self.lock
            .as_ref()
            .and_then(|lock| lock.minimum_stability.parse().ok())
            .unwrap_or_default()
    }

    /// Per-package stability flags, unknown priorities are dropped
    pub fn stability_flags(&self) -> IndexMap<String, Stability> {
        let Some(lock) = &self.lock else {
            return IndexMap::new();
        };
        lock.stability_flags
            .iter()
            .filter_map(|(name, &priority)| {
                Stability::from_priority(priority).map(|stability| (name.to_lowercase(), stability))
            })
            .collect()
    }

    pub fn prefer_stable(&self) -> bool {
        self.lock.as_ref().is_some_and(|lock| lock.prefer_stable)
    }

    pub fn prefer_lowest(&self) -> bool {
        self.lock.as_ref().is_some_and(|lock| lock.prefer_lowest)
    }

    pub fn platform_overrides(&self) -> IndexMap<String, String> {
        self.lock
            .as_ref()
            .map(|lock| lock.platform_overrides.clone())
            .unwrap_or_default()
    }

    /// Replace the lock with `data`.
    ///
    /// Returns whether anything changed on disk. An identical lock is left
    /// untouched; a lock with nothing in it is removed.
    pub fn set_lock_data(&mut self, data: LockData) -> Result<bool> {
        let lock = LockFile {
            content_hash: self.content_hash.clone(),
            packages: locked_packages(&data.packages),
            packages_dev: data.dev_packages.as_deref().map(locked_packages),
            aliases: data.aliases.iter().map(LockAlias::from).collect(),
            minimum_stability: data.minimum_stability.as_str().to_string(),
            stability_flags: data
                .stability_flags
                .iter()
                .map(|(name, stability)| (name.clone(), stability.priority()))
                .collect(),
            prefer_stable: data.prefer_stable,
            prefer_lowest: data.prefer_lowest,
            platform: data.platform,
            platform_dev: data.platform_dev,
            platform_overrides: data.platform_overrides,
            ..LockFile::default()
        };

        let is_empty = lock.packages.is_empty()
            && lock.packages_dev.as_ref().map_or(true, Vec::is_empty)
            && lock.platform.is_empty()
            && lock.platform_dev.is_empty();
        if is_empty {
            if self.path.exists() {
                log::info!("Removing empty lock file {}", self.path.display());
                std::fs::remove_file(&self.path)?;
                self.lock = None;
                return Ok(true);
            }
            return Ok(false);
        }

        if self.lock.as_ref() == Some(&lock) {
            log::debug!("Lock file is unchanged");
            return Ok(false);
        }

        log::info!("Writing lock file");
        self.write(&lock)?;
        self.lock = Some(lock);
        Ok(true)
    }

    fn write(&self, lock: &LockFile) -> Result<()> {
        let json = serde_json::to_string_pretty(lock)?;

        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;
        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(json.as_bytes())?;
        file.write_all(b"\n")?;
        file.persist(&self.path).map_err(|e| InstallerError::Persist {
            path: self.path.clone(),
            source: e.error,
        })?;
        Ok(())
    }
}

/// Lock entries sorted by name, then version
fn locked_packages(packages: &[Arc<Package>]) -> Vec<LockedPackage> {
    let mut sorted: Vec<&Arc<Package>> = packages.iter().collect();
    sorted.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.version.cmp(&b.version))
    });
    sorted.into_iter().map(|pkg| LockedPackage::from(pkg.as_ref())).collect()
}
