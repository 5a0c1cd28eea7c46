use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use lockstep_semver::VersionParser;

use crate::error::{InstallerError, Result};
use crate::package::Package;
use crate::util::is_platform_package;

/// Virtual packages describing the runtime: `php`, `ext-*` and `lib-*`.
///
/// These are facts, never installed or removed.
#[derive(Debug, Clone, Default)]
pub struct PlatformRepository {
    packages: Vec<Arc<Package>>,
}

impl PlatformRepository {
    pub fn new(packages: Vec<Package>) -> Self {
        Self {
            packages: packages.into_iter().map(Arc::new).collect(),
        }
    }

    /// A runtime at `php_version` with the given extensions loaded.
    ///
    /// Extensions report the runtime version as their own.
    pub fn from_runtime(php_version: &str, extensions: &[&str]) -> Self {
        let mut packages = vec![Package::new("php", php_version)];
        for ext in extensions {
            packages.push(Package::new(format!("ext-{}", ext.to_lowercase()), php_version));
        }
        Self::new(packages)
    }

    /// Replace detected facts with configured ones
    pub fn with_overrides(mut self, overrides: &IndexMap<String, String>) -> Result<Self> {
        let parser = VersionParser::new();
        for (name, version) in overrides {
            if !is_platform_package(name) {
                return Err(InstallerError::InvalidRoot(format!(
                    "{} is not a platform package and cannot be overridden",
                    name
                )));
            }
            // validate before replacing anything
            parser.normalize(version)?;

            self.packages.retain(|pkg| !pkg.name.eq_ignore_ascii_case(name));
            let mut pkg = Package::new(name.to_lowercase(), version.clone());
            pkg.description = Some("Package overridden via config.platform".to_string());
            self.packages.push(Arc::new(pkg));
        }
        Ok(self)
    }

    pub fn packages(&self) -> &[Arc<Package>] {
        &self.packages
    }

    pub fn find_package(&self, name: &str) -> Option<&Arc<Package>> {
        self.packages.iter().find(|pkg| pkg.name.eq_ignore_ascii_case(name))
    }

    /// Lowercased names of every fact
    pub fn names(&self) -> HashSet<String> {
        self.packages.iter().flat_map(|pkg| pkg.names()).collect()
    }
}
