use std::fmt;

use crate::solver::Operation;

/// A non-fatal finding of a run, logged as a warning and returned to the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advisory {
    /// The lock file predates the current manifest requirements
    StaleLock,
    /// An update whitelist entry matched no installed package
    WhitelistMiss { pattern: String },
    /// A root requirement is pinned to a version it no longer accepts
    RootRequirementNotWhitelisted {
        package: String,
        constraint: String,
        pinned: String,
    },
    /// An installed package is abandoned
    AbandonedPackage {
        package: String,
        replacement: Option<String>,
    },
    /// An installed package is less stable than the current settings allow and gets removed
    UnacceptableStability { package: String, version: String },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::StaleLock => f.write_str(
                "The lock file is not up to date with the latest changes in composer.json. \
                 You may be getting outdated dependencies. Run update to update them.",
            ),
            Advisory::WhitelistMiss { pattern } => {
                write!(f, "Package \"{}\" listed for update is not installed. Ignoring.", pattern)
            }
            Advisory::RootRequirementNotWhitelisted {
                package,
                constraint,
                pinned,
            } => write!(
                f,
                "Root requirement {} {} is pinned at {} which does not satisfy it. Add it to the update list.",
                package, constraint, pinned
            ),
            Advisory::AbandonedPackage {
                package,
                replacement: Some(replacement),
            } => write!(
                f,
                "Package {} is abandoned, you should avoid using it. Use {} instead.",
                package, replacement
            ),
            Advisory::AbandonedPackage {
                package,
                replacement: None,
            } => write!(
                f,
                "Package {} is abandoned, you should avoid using it. No replacement was suggested.",
                package
            ),
            Advisory::UnacceptableStability { package, version } => write!(
                f,
                "{} {} is no longer allowed by your stability settings and will be removed",
                package, version
            ),
        }
    }
}

/// A package suggested by an installed package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub source: String,
    pub target: String,
    pub reason: String,
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reason.is_empty() {
            write!(f, "{} suggests installing {}", self.source, self.target)
        } else {
            write!(f, "{} suggests installing {} ({})", self.source, self.target, self.reason)
        }
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone, Default)]
pub struct InstallReport {
    /// Operations in execution order (what would run, in dry-run mode)
    pub operations: Vec<Operation>,
    pub suggestions: Vec<Suggestion>,
    pub advisories: Vec<Advisory>,
    /// Whether the lock file was written (or removed)
    pub lock_written: bool,
}

impl InstallReport {
    pub(crate) fn advise(&mut self, advisory: Advisory) {
        log::warn!("{}", advisory);
        self.advisories.push(advisory);
    }
}
