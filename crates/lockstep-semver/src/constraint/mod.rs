//! Version constraints and their intersection rules.

mod constraint;
mod multi_constraint;

use std::fmt;

pub use constraint::{Constraint, ConstraintError};
pub use multi_constraint::MultiConstraint;

/// Comparison operator of a single constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl Operator {
    /// Parse an operator, accepting `=`/`==` and `<>`/`!=` spellings.
    pub fn from_str(op: &str) -> Result<Self, ()> {
        match op {
            "=" | "==" => Ok(Operator::Equal),
            "!=" | "<>" => Ok(Operator::NotEqual),
            "<" => Ok(Operator::LessThan),
            "<=" => Ok(Operator::LessThanOrEqual),
            ">" => Ok(Operator::GreaterThan),
            ">=" => Ok(Operator::GreaterThanOrEqual),
            _ => Err(()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::LessThan => "<",
            Operator::LessThanOrEqual => "<=",
            Operator::GreaterThan => ">",
            Operator::GreaterThanOrEqual => ">=",
        }
    }

    pub fn supported_operators() -> Vec<&'static str> {
        vec!["=", "==", "<", "<=", ">", ">=", "<>", "!="]
    }

    /// The operator with any equality part stripped (`<=` becomes `<`).
    pub(crate) fn strict_form(&self) -> &'static str {
        match self {
            Operator::Equal => "",
            Operator::NotEqual => "!",
            Operator::LessThan | Operator::LessThanOrEqual => "<",
            Operator::GreaterThan | Operator::GreaterThanOrEqual => ">",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any parsed constraint expression.
#[derive(Debug, Clone, PartialEq)]
pub enum VersionConstraint {
    /// Matches every version (`*`, `x`, empty).
    Any { pretty: Option<String> },
    Single(Constraint),
    Multi(MultiConstraint),
}

impl VersionConstraint {
    pub fn any() -> Self {
        VersionConstraint::Any { pretty: None }
    }

    /// An `== version` constraint on an already normalized version.
    pub fn exact(version: impl Into<String>) -> Self {
        VersionConstraint::Single(Constraint::new(Operator::Equal, version))
    }

    /// Whether the two constraints have at least one version in common.
    pub fn matches(&self, provider: &VersionConstraint) -> bool {
        match (self, provider) {
            (VersionConstraint::Any { .. }, _) | (_, VersionConstraint::Any { .. }) => true,
            (VersionConstraint::Single(a), VersionConstraint::Single(b)) => a.match_specific(b, false),
            (VersionConstraint::Single(_), VersionConstraint::Multi(multi)) => multi.matches(self),
            (VersionConstraint::Multi(multi), _) => multi.matches(provider),
        }
    }

    /// Whether a normalized version satisfies this constraint.
    pub fn satisfies(&self, normalized_version: &str) -> bool {
        self.matches(&VersionConstraint::exact(normalized_version))
    }

    pub fn set_pretty_string(&mut self, pretty: impl Into<String>) {
        let pretty = pretty.into();
        match self {
            VersionConstraint::Any { pretty: p } => *p = Some(pretty),
            VersionConstraint::Single(c) => c.set_pretty_string(pretty),
            VersionConstraint::Multi(m) => m.set_pretty_string(pretty),
        }
    }

    pub fn with_pretty_string(mut self, pretty: impl Into<String>) -> Self {
        self.set_pretty_string(pretty);
        self
    }

    /// The human readable form, as originally written when known.
    pub fn pretty_string(&self) -> String {
        match self {
            VersionConstraint::Any { pretty } => pretty.clone().unwrap_or_else(|| "*".to_string()),
            VersionConstraint::Single(c) => c.pretty_string(),
            VersionConstraint::Multi(m) => m.pretty_string(),
        }
    }
}

impl Default for VersionConstraint {
    fn default() -> Self {
        VersionConstraint::any()
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionConstraint::Any { .. } => f.write_str("[]"),
            VersionConstraint::Single(c) => write!(f, "{}", c),
            VersionConstraint::Multi(m) => write!(f, "{}", m),
        }
    }
}

impl From<Constraint> for VersionConstraint {
    fn from(c: Constraint) -> Self {
        VersionConstraint::Single(c)
    }
}

impl From<MultiConstraint> for VersionConstraint {
    fn from(m: MultiConstraint) -> Self {
        VersionConstraint::Multi(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(op: Operator, v: &str) -> VersionConstraint {
        VersionConstraint::Single(Constraint::new(op, v))
    }

    #[test]
    fn test_any_matches_everything() {
        let any = VersionConstraint::any();
        assert!(any.matches(&single(Operator::Equal, "1.0.0.0")));
        assert!(single(Operator::LessThan, "1.0.0.0").matches(&any));
        assert_eq!(any.pretty_string(), "*");
    }

    #[test]
    fn test_range_intersection() {
        let range = VersionConstraint::Multi(MultiConstraint::new(
            vec![
                single(Operator::GreaterThanOrEqual, "1.0.0.0"),
                single(Operator::LessThan, "2.0.0.0"),
            ],
            true,
        ));

        assert!(range.satisfies("1.5.0.0"));
        assert!(!range.satisfies("2.0.0.0"));
        assert!(single(Operator::Equal, "1.2.0.0").matches(&range));
    }

    #[test]
    fn test_disjunction() {
        let either = VersionConstraint::Multi(MultiConstraint::new(
            vec![single(Operator::Equal, "1.0.0.0"), single(Operator::Equal, "3.0.0.0")],
            false,
        ));

        assert!(either.satisfies("3.0.0.0"));
        assert!(!either.satisfies("2.0.0.0"));
    }

    #[test]
    fn test_pretty_string_override() {
        let c = VersionConstraint::exact("1.0.0.0").with_pretty_string("1.0.0");
        assert_eq!(c.pretty_string(), "1.0.0");
        assert_eq!(c.to_string(), "== 1.0.0.0");
    }
}
