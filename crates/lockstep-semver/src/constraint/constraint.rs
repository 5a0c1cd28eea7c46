//! Single version constraint implementation

use std::fmt;
use thiserror::Error;

use super::Operator;
use crate::compare::php_version_compare;

#[derive(Error, Debug)]
pub enum ConstraintError {
    #[error("Invalid operator \"{operator}\", expected one of: {expected}")]
    InvalidOperator { operator: String, expected: String },
}

/// A single version constraint (e.g., ">= 1.0.0.0")
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    operator: Operator,
    version: String,
    pretty_string: Option<String>,
}

impl Constraint {
    /// Create a new constraint
    pub fn new(operator: Operator, version: impl Into<String>) -> Self {
        Constraint {
            operator,
            version: version.into(),
            pretty_string: None,
        }
    }

    /// Create a constraint from operator string
    pub fn from_str(operator: &str, version: impl Into<String>) -> Result<Self, ConstraintError> {
        let op = Operator::from_str(operator).map_err(|_| ConstraintError::InvalidOperator {
            operator: operator.to_string(),
            expected: Operator::supported_operators().join(", "),
        })?;
        Ok(Self::new(op, version))
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn set_pretty_string(&mut self, pretty: impl Into<String>) {
        self.pretty_string = Some(pretty.into());
    }

    pub fn pretty_string(&self) -> String {
        self.pretty_string.clone().unwrap_or_else(|| self.to_string())
    }

    /// Match against another single constraint
    pub fn match_specific(&self, provider: &Constraint, compare_branches: bool) -> bool {
        let is_equal_op = self.operator == Operator::Equal;
        let is_non_equal_op = self.operator == Operator::NotEqual;
        let is_provider_equal_op = provider.operator == Operator::Equal;
        let is_provider_non_equal_op = provider.operator == Operator::NotEqual;

        // != always has a solution unless the other side pins the same version
        if is_non_equal_op || is_provider_non_equal_op {
            if is_non_equal_op
                && !is_provider_non_equal_op
                && !is_provider_equal_op
                && provider.version.starts_with("dev-")
            {
                return false;
            }

            if is_provider_non_equal_op
                && !is_non_equal_op
                && !is_equal_op
                && self.version.starts_with("dev-")
            {
                return false;
            }

            if !is_equal_op && !is_provider_equal_op {
                return true;
            }

            return self.version_compare(&provider.version, &self.version, Operator::NotEqual, compare_branches);
        }

        // same direction ranges (<= 2.0 and < 1.0) always overlap
        if !is_equal_op && self.operator.strict_form() == provider.operator.strict_form() {
            return !(self.version.starts_with("dev-") || provider.version.starts_with("dev-"));
        }

        let (version1, version2, operator) = if is_equal_op {
            (&self.version, &provider.version, provider.operator)
        } else {
            (&provider.version, &self.version, self.operator)
        };

        if self.version_compare(version1, version2, operator, compare_branches) {
            // require >= 1.0 against provide < 1.0 meets at 1.0, which is outside the provided range
            let provider_is_strict = !is_provider_equal_op
                && matches!(provider.operator, Operator::LessThan | Operator::GreaterThan);
            let self_is_inclusive = matches!(
                self.operator,
                Operator::LessThanOrEqual | Operator::GreaterThanOrEqual
            );
            return !(provider_is_strict
                && self_is_inclusive
                && php_version_compare(&provider.version, &self.version, "=="));
        }

        false
    }

    /// Compare two versions with an operator
    pub fn version_compare(
        &self,
        a: &str,
        b: &str,
        operator: Operator,
        compare_branches: bool,
    ) -> bool {
        let a_is_branch = a.starts_with("dev-");
        let b_is_branch = b.starts_with("dev-");

        if operator == Operator::NotEqual && (a_is_branch || b_is_branch) {
            return a != b;
        }

        if a_is_branch && b_is_branch {
            return operator == Operator::Equal && a == b;
        }

        // When branches are not comparable, dev branches never match anything
        if !compare_branches && (a_is_branch || b_is_branch) {
            return false;
        }

        php_version_compare(a, b, operator.as_str())
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.operator, self.version)
    }
}
