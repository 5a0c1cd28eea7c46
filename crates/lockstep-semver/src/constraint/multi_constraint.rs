use std::fmt;

use super::VersionConstraint;

/// A conjunction (`>=1.0 <2.0`) or disjunction (`1.* || 2.*`) of constraints.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiConstraint {
    constraints: Vec<VersionConstraint>,
    conjunctive: bool,
    pretty_string: Option<String>,
}

impl MultiConstraint {
    pub fn new(constraints: Vec<VersionConstraint>, conjunctive: bool) -> Self {
        Self {
            constraints,
            conjunctive,
            pretty_string: None,
        }
    }

    pub fn constraints(&self) -> &[VersionConstraint] {
        &self.constraints
    }

    pub fn is_conjunctive(&self) -> bool {
        self.conjunctive
    }

    pub fn matches(&self, provider: &VersionConstraint) -> bool {
        if self.conjunctive {
            self.constraints.iter().all(|c| provider.matches(c))
        } else {
            self.constraints.iter().any(|c| provider.matches(c))
        }
    }

    pub fn set_pretty_string(&mut self, pretty: impl Into<String>) {
        self.pretty_string = Some(pretty.into());
    }

    pub fn pretty_string(&self) -> String {
        self.pretty_string.clone().unwrap_or_else(|| self.to_string())
    }
}

impl fmt::Display for MultiConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let separator = if self.conjunctive { " " } else { " || " };
        let parts: Vec<String> = self.constraints.iter().map(|c| c.to_string()).collect();
        write!(f, "[{}]", parts.join(separator))
    }
}
