//! Run configuration for the installer.

use std::path::{Path, PathBuf};

/// Installation configuration
#[derive(Debug, Clone)]
pub struct InstallConfig {
    /// Project root, relative paths below are resolved against it
    pub working_dir: PathBuf,
    /// Vendor directory
    pub vendor_dir: PathBuf,
    /// Lock file
    pub lock_file: PathBuf,
    /// Report operations without changing anything on disk
    pub dry_run: bool,
    /// Include require-dev packages
    pub dev_mode: bool,
    /// Re-resolve instead of installing from the lock file
    pub update: bool,
    /// Package name patterns allowed to change during an update
    pub update_whitelist: Vec<String>,
    /// Also allow the dependencies of whitelisted packages to change
    pub whitelist_dependencies: bool,
    /// Dispatch hook events
    pub run_scripts: bool,
    /// Prefer stable versions over dev
    pub prefer_stable: bool,
    /// Prefer lowest versions
    pub prefer_lowest: bool,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            working_dir: PathBuf::from("."),
            vendor_dir: PathBuf::from("vendor"),
            lock_file: PathBuf::from("composer.lock"),
            dry_run: false,
            dev_mode: true,
            update: false,
            update_whitelist: Vec::new(),
            whitelist_dependencies: true,
            run_scripts: true,
            prefer_stable: false,
            prefer_lowest: false,
        }
    }
}

impl InstallConfig {
    /// Create a configuration rooted at `working_dir`
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            ..Default::default()
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn dev_mode(mut self, dev_mode: bool) -> Self {
        self.dev_mode = dev_mode;
        self
    }

    pub fn update(mut self, update: bool) -> Self {
        self.update = update;
        self
    }

    pub fn update_whitelist<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.update_whitelist = packages.into_iter().map(Into::into).collect();
        self
    }

    pub fn whitelist_dependencies(mut self, enabled: bool) -> Self {
        self.whitelist_dependencies = enabled;
        self
    }

    pub fn run_scripts(mut self, run_scripts: bool) -> Self {
        self.run_scripts = run_scripts;
        self
    }

    pub fn prefer_stable(mut self, prefer: bool) -> Self {
        self.prefer_stable = prefer;
        self
    }

    pub fn prefer_lowest(mut self, prefer: bool) -> Self {
        self.prefer_lowest = prefer;
        self
    }

    pub fn with_vendor_dir(mut self, vendor_dir: impl Into<PathBuf>) -> Self {
        self.vendor_dir = vendor_dir.into();
        self
    }

    pub fn with_lock_file(mut self, lock_file: impl Into<PathBuf>) -> Self {
        self.lock_file = lock_file.into();
        self
    }

    /// Absolute (working dir relative) vendor directory
    pub fn vendor_path(&self) -> PathBuf {
        self.resolve(&self.vendor_dir)
    }

    /// Absolute (working dir relative) lock file path
    pub fn lock_path(&self) -> PathBuf {
        self.resolve(&self.lock_file)
    }

    /// Path of the local package store
    pub fn installed_path(&self) -> PathBuf {
        self.vendor_path().join("composer").join("installed.json")
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_dir.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_config_default() {
        let config = InstallConfig::default();
        assert_eq!(config.vendor_dir, PathBuf::from("vendor"));
        assert_eq!(config.lock_file, PathBuf::from("composer.lock"));
        assert!(config.dev_mode);
        assert!(config.whitelist_dependencies);
        assert!(config.run_scripts);
        assert!(!config.dry_run);
        assert!(!config.update);
    }

    #[test]
    fn test_paths_resolve_against_working_dir() {
        let config = InstallConfig::new("/project").with_vendor_dir("libs");
        assert_eq!(config.vendor_path(), PathBuf::from("/project/libs"));
        assert_eq!(config.lock_path(), PathBuf::from("/project/composer.lock"));
        assert_eq!(
            config.installed_path(),
            PathBuf::from("/project/libs/composer/installed.json")
        );

        let config = config.with_lock_file("/elsewhere/app.lock");
        assert_eq!(config.lock_path(), PathBuf::from("/elsewhere/app.lock"));
    }

    #[test]
    fn test_builder_flags() {
        let config = InstallConfig::new(".")
            .update(true)
            .update_whitelist(["vendor/a", "vendor/b*"])
            .whitelist_dependencies(false)
            .dry_run(true);

        assert!(config.update);
        assert!(config.dry_run);
        assert!(!config.whitelist_dependencies);
        assert_eq!(config.update_whitelist, vec!["vendor/a", "vendor/b*"]);
    }
}
