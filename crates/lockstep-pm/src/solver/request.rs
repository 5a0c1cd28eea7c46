use indexmap::IndexMap;
use lockstep_semver::VersionConstraint;
use thiserror::Error;

/// Directive kind of a request job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobAction {
    Install,
    Remove,
}

/// A single request directive
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub action: JobAction,
    pub name: String,
    pub constraint: VersionConstraint,
}

/// Building a request went wrong. Always a caller bug.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RequestError {
    #[error("The request already holds a directive for {name}")]
    DuplicateDirective { name: String },
}

/// What the solver is asked to achieve.
///
/// Holds at most one directive per package name (case-insensitive). A second
/// directive for a name is rejected rather than merged.
#[derive(Debug, Clone, Default)]
pub struct Request {
    jobs: IndexMap<String, Job>,
    update_all: bool,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `name` to be installed within `constraint`
    pub fn install(&mut self, name: &str, constraint: VersionConstraint) -> Result<(), RequestError> {
        self.push(JobAction::Install, name, constraint)
    }

    /// Require `name` to be absent within `constraint`
    pub fn remove(&mut self, name: &str, constraint: VersionConstraint) -> Result<(), RequestError> {
        self.push(JobAction::Remove, name, constraint)
    }

    fn push(&mut self, action: JobAction, name: &str, constraint: VersionConstraint) -> Result<(), RequestError> {
        let key = name.to_lowercase();
        if self.jobs.contains_key(&key) {
            return Err(RequestError::DuplicateDirective { name: name.to_string() });
        }
        self.jobs.insert(
            key,
            Job {
                action,
                name: name.to_string(),
                constraint,
            },
        );
        Ok(())
    }

    /// Allow every installed package to move
    pub fn update_all(&mut self) {
        self.update_all = true;
    }

    pub fn is_update_all(&self) -> bool {
        self.update_all
    }

    pub fn contains(&self, name: &str) -> bool {
        self.jobs.contains_key(&name.to_lowercase())
    }

    pub fn job(&self, name: &str) -> Option<&Job> {
        self.jobs.get(&name.to_lowercase())
    }

    /// Directives in insertion order
    pub fn jobs(&self) -> impl Iterator<Item = &Job> {
        self.jobs.values()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_second_directive_for_same_name() {
        let mut request = Request::new();
        request.install("vendor/a", VersionConstraint::exact("1.0.0.0")).unwrap();

        let err = request.install("Vendor/A", VersionConstraint::any()).unwrap_err();
        assert_eq!(err, RequestError::DuplicateDirective { name: "Vendor/A".to_string() });

        assert!(request.remove("vendor/a", VersionConstraint::any()).is_err());

        let job = request.job("vendor/a").unwrap();
        assert_eq!(job.action, JobAction::Install);
        assert!(job.constraint.satisfies("1.0.0.0"));
        assert_eq!(request.len(), 1);
    }

    #[test]
    fn test_jobs_keep_insertion_order() {
        let mut request = Request::new();
        request.install("vendor/b", VersionConstraint::any()).unwrap();
        request.remove("vendor/a", VersionConstraint::any()).unwrap();
        request.update_all();

        let names: Vec<_> = request.jobs().map(|j| j.name.as_str()).collect();
        assert_eq!(names, vec!["vendor/b", "vendor/a"]);
        assert!(request.is_update_all());
    }
}
