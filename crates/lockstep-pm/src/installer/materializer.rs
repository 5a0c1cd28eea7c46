//! Making operations real on disk.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use walkdir::WalkDir;

use crate::package::Package;
use crate::solver::Operation;

/// Applies a single operation to the vendor directory.
///
/// Success or failure is all the installer needs to know.
pub trait Materializer {
    fn apply(&self, operation: &Operation) -> Result<()>;
}

/// Accepts every operation and touches nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMaterializer;

impl Materializer for NoopMaterializer {
    fn apply(&self, _operation: &Operation) -> Result<()> {
        Ok(())
    }
}

/// Copies `path` dists into `<vendor>/<name>`.
///
/// Metapackages have nothing to put on disk. Archive and VCS dists are
/// fetched by a downloader this materializer does not have.
#[derive(Debug, Clone)]
pub struct VendorMaterializer {
    vendor_dir: PathBuf,
    working_dir: PathBuf,
}

impl VendorMaterializer {
    pub fn new(vendor_dir: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            vendor_dir: vendor_dir.into(),
            working_dir: working_dir.into(),
        }
    }

    /// Install path of a package
    pub fn install_path(&self, package: &Package) -> PathBuf {
        self.vendor_dir.join(&package.name)
    }

    fn install(&self, package: &Package) -> Result<()> {
        if package.package_type == "metapackage" {
            return Ok(());
        }

        let Some(dist) = &package.dist else {
            bail!("{} has no dist to install from", package);
        };
        if dist.dist_type != "path" {
            bail!("Unsupported dist type '{}' for {}", dist.dist_type, package);
        }

        let source = self.resolve(&dist.url);
        let target = self.install_path(package);
        log::debug!("Copying {} to {}", source.display(), target.display());
        copy_dir(&source, &target)
            .with_context(|| format!("Failed to install {} from {}", package, source.display()))
    }

    fn uninstall(&self, package: &Package) -> Result<()> {
        if package.package_type == "metapackage" {
            return Ok(());
        }

        let target = self.install_path(package);
        if target.exists() {
            fs::remove_dir_all(&target)
                .with_context(|| format!("Failed to remove {}", target.display()))?;
        }
        Ok(())
    }

    fn resolve(&self, url: &str) -> PathBuf {
        let path = Path::new(url);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_dir.join(path)
        }
    }
}

impl Materializer for VendorMaterializer {
    fn apply(&self, operation: &Operation) -> Result<()> {
        match operation {
            Operation::Install(pkg) => self.install(pkg),
            Operation::Update { from, to } => {
                self.uninstall(from)?;
                self.install(to)
            }
            Operation::Uninstall(pkg) => self.uninstall(pkg),
        }
    }
}

fn copy_dir(source: &Path, target: &Path) -> Result<()> {
    if !source.is_dir() {
        bail!("{} is not a directory", source.display());
    }

    for entry in WalkDir::new(source).follow_links(false) {
        let entry = entry?;
        let relative = entry.path().strip_prefix(source)?;
        let destination = target.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&destination)?;
        } else {
            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &destination)?;
        }
    }

    Ok(())
}
