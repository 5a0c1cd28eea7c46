//! The resolution seam: candidate pool, preference policy, request
//! directives and the operations a solver hands back.
//!
//! The search itself lives behind the [`Solver`] trait. The installer only
//! shapes its input and consumes its output:
//!
//! - [`Pool`]: every candidate package, each under a dense literal id
//! - [`Policy`]: ordering between candidates answering the same name
//! - [`Request`]: at most one install/remove directive per package name
//! - [`Operation`]: install, update or uninstall of a single package

mod operation;
mod policy;
mod pool;
mod request;

#[cfg(test)]
mod tests;

pub use operation::{move_plugins_to_front, move_uninstalls_to_front, Operation};
pub use policy::Policy;
pub use pool::{PackageId, Pool, PoolEntry, RepoKind};
pub use request::{Job, JobAction, Request, RequestError};

use thiserror::Error;

use crate::repository::InstalledRepository;

/// The solver could not satisfy the request.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("{}", .problems.join("\n"))]
    Unsatisfiable { problems: Vec<String> },
}

impl SolverError {
    pub fn unsatisfiable<I, S>(problems: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SolverError::Unsatisfiable {
            problems: problems.into_iter().map(Into::into).collect(),
        }
    }
}

/// A dependency solver.
///
/// Given the candidate pool, the currently installed packages and the request,
/// returns the ordered operations that move the installed set to a state
/// satisfying every directive.
pub trait Solver {
    fn solve(
        &self,
        policy: &Policy,
        pool: &Pool,
        installed: &InstalledRepository,
        request: &Request,
    ) -> std::result::Result<Vec<Operation>, SolverError>;
}
