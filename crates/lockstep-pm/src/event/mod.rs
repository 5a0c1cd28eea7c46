//! Hook events fired around a run and around every operation.
//!
//! The installer talks to a single [`HookDispatcher`]. [`ListenerRegistry`]
//! fans an event out to several listeners, [`ScriptListener`] runs the root
//! package's `scripts`.

mod registry;
mod scripts;

pub use registry::ListenerRegistry;
pub use scripts::ScriptListener;

use std::path::Path;

use crate::solver::Operation;

pub const PRE_INSTALL_CMD: &str = "pre-install-cmd";
pub const POST_INSTALL_CMD: &str = "post-install-cmd";
pub const PRE_UPDATE_CMD: &str = "pre-update-cmd";
pub const POST_UPDATE_CMD: &str = "post-update-cmd";
pub const PRE_DEPENDENCIES_SOLVING: &str = "pre-dependencies-solving";
pub const POST_DEPENDENCIES_SOLVING: &str = "post-dependencies-solving";
pub const PRE_PACKAGE_INSTALL: &str = "pre-package-install";
pub const POST_PACKAGE_INSTALL: &str = "post-package-install";
pub const PRE_PACKAGE_UPDATE: &str = "pre-package-update";
pub const POST_PACKAGE_UPDATE: &str = "post-package-update";
pub const PRE_PACKAGE_UNINSTALL: &str = "pre-package-uninstall";
pub const POST_PACKAGE_UNINSTALL: &str = "post-package-uninstall";

/// What a listener gets to see about the event
#[derive(Debug, Clone, Copy)]
pub struct EventContext<'a> {
    pub dev_mode: bool,
    /// Set for per-operation events
    pub operation: Option<&'a Operation>,
    pub working_dir: &'a Path,
}

impl<'a> EventContext<'a> {
    pub fn new(dev_mode: bool, working_dir: &'a Path) -> Self {
        Self {
            dev_mode,
            operation: None,
            working_dir,
        }
    }

    pub fn with_operation(mut self, operation: &'a Operation) -> Self {
        self.operation = Some(operation);
        self
    }
}

/// Dispatches hook events to externally registered listeners.
///
/// Any error is fatal to the run.
pub trait HookDispatcher {
    fn dispatch(&self, event: &str, context: &EventContext<'_>) -> anyhow::Result<()>;
}

/// Dispatcher used when no listener is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDispatcher;

impl HookDispatcher for NullDispatcher {
    fn dispatch(&self, _event: &str, _context: &EventContext<'_>) -> anyhow::Result<()> {
        Ok(())
    }
}
