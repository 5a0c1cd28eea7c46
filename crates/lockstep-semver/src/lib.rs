//! Version handling compatible with Composer's semver rules.
//!
//! Provides normalization of version strings, stability detection, parsing of
//! constraint expressions (`^1.2`, `~1.0`, `1.*`, `>=1.0 <2.0 || 3.0 - 3.4`)
//! and intersection checks between constraints.
//!
//! ```
//! use lockstep_semver::{VersionConstraint, VersionParser};
//!
//! let parser = VersionParser::new();
//! let constraint = parser.parse_constraints("^1.2").unwrap();
//! assert!(constraint.matches(&VersionConstraint::exact("1.4.0.0")));
//! assert!(!constraint.matches(&VersionConstraint::exact("2.0.0.0")));
//! ```

pub mod compare;
pub mod constraint;
mod stability;
mod version_parser;

pub use compare::{compare_versions, php_version_compare};
pub use constraint::{Constraint, ConstraintError, MultiConstraint, Operator, VersionConstraint};
pub use stability::Stability;
pub use version_parser::{ParseError, VersionParser};
