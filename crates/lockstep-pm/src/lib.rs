//! Installer orchestration for Composer-compatible dependency graphs.
//!
//! Given a root package and the local package store, an [`Installer`] run
//! shapes a request for an external [`Solver`], reconciles dev packages,
//! executes the resulting operations one at a time and finally writes the
//! lock file from what actually landed on disk.
//!
//! ```no_run
//! use lockstep_pm::{InstallConfig, Installer, PlatformRepository};
//! # fn solver() -> Box<dyn lockstep_pm::Solver> { unimplemented!() }
//!
//! let config = InstallConfig::new("/path/to/project").update(true);
//! let platform = PlatformRepository::from_runtime("8.2.0", &["json", "mbstring"]);
//! let mut installer = Installer::load(config, platform, solver())?;
//! let report = installer.run()?;
//! for operation in &report.operations {
//!     println!("{}", operation);
//! }
//! # Ok::<(), lockstep_pm::InstallerError>(())
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod installer;
pub mod json;
pub mod lock;
pub mod package;
pub mod repository;
pub mod solver;
pub mod util;

#[cfg(test)]
mod testing;

pub use config::InstallConfig;
pub use error::{InstallerError, Result};
pub use event::{HookDispatcher, ListenerRegistry, ScriptListener};
pub use installer::{
    Advisory, DevPackageReconciler, InstallReport, Installer, Materializer, OperationExecutor,
    RequestBuilder, Suggestion, UpdateWhitelist, UpdateWhitelistExpander, VendorMaterializer,
};
pub use lock::{compute_content_hash, LockManager, Locker};
pub use package::{Package, RootPackage};
pub use repository::{InstalledRepository, PlatformRepository};
pub use solver::{Operation, Policy, Pool, Request, Solver, SolverError};
pub use util::is_platform_package;
