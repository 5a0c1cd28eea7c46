use std::fmt;
use std::sync::Arc;

use crate::event;
use crate::package::Package;

/// A single change to the installed package set
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Install(Arc<Package>),
    Update { from: Arc<Package>, to: Arc<Package> },
    Uninstall(Arc<Package>),
}

impl Operation {
    pub fn job_type(&self) -> &'static str {
        match self {
            Operation::Install(_) => "install",
            Operation::Update { .. } => "update",
            Operation::Uninstall(_) => "uninstall",
        }
    }

    /// The package this operation leaves behind (or removes)
    pub fn package(&self) -> &Arc<Package> {
        match self {
            Operation::Install(pkg) | Operation::Uninstall(pkg) => pkg,
            Operation::Update { to, .. } => to,
        }
    }

    /// The package being replaced or removed, if any
    pub fn initial_package(&self) -> Option<&Arc<Package>> {
        match self {
            Operation::Install(_) => None,
            Operation::Update { from, .. } => Some(from),
            Operation::Uninstall(pkg) => Some(pkg),
        }
    }

    pub fn pre_event(&self) -> &'static str {
        match self {
            Operation::Install(_) => event::PRE_PACKAGE_INSTALL,
            Operation::Update { .. } => event::PRE_PACKAGE_UPDATE,
            Operation::Uninstall(_) => event::PRE_PACKAGE_UNINSTALL,
        }
    }

    pub fn post_event(&self) -> &'static str {
        match self {
            Operation::Install(_) => event::POST_PACKAGE_INSTALL,
            Operation::Update { .. } => event::POST_PACKAGE_UPDATE,
            Operation::Uninstall(_) => event::POST_PACKAGE_UNINSTALL,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Install(pkg) => write!(f, "Installing {}", pkg),
            Operation::Update { from, to } => write!(
                f,
                "Updating {} ({} => {})",
                to.name,
                from.full_pretty_version(),
                to.full_pretty_version()
            ),
            Operation::Uninstall(pkg) => write!(f, "Removing {}", pkg),
        }
    }
}

/// Plugin installs and updates run before everything else
pub fn move_plugins_to_front(operations: Vec<Operation>) -> Vec<Operation> {
    let (mut plugins, rest): (Vec<_>, Vec<_>) = operations
        .into_iter()
        .partition(|op| !matches!(op, Operation::Uninstall(_)) && op.package().is_plugin());
    plugins.extend(rest);
    plugins
}

/// Removals run first so replaced packages are gone before their successors land
pub fn move_uninstalls_to_front(operations: Vec<Operation>) -> Vec<Operation> {
    let (mut uninstalls, rest): (Vec<_>, Vec<_>) = operations
        .into_iter()
        .partition(|op| matches!(op, Operation::Uninstall(_)));
    uninstalls.extend(rest);
    uninstalls
}
