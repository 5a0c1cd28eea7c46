use std::fmt;

use lockstep_semver::{ParseError, VersionConstraint, VersionParser};

/// Kind of relation a link expresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkType {
    Require,
    DevRequire,
    Provide,
    Conflict,
    Replace,
}

impl LinkType {
    pub fn description(&self) -> &'static str {
        match self {
            LinkType::Require => "requires",
            LinkType::DevRequire => "requires (for development)",
            LinkType::Provide => "provides",
            LinkType::Conflict => "conflicts",
            LinkType::Replace => "replaces",
        }
    }
}

/// A relation from one package to a target name under a version constraint
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub source: String,
    pub target: String,
    pub constraint: VersionConstraint,
    pub link_type: LinkType,
}

impl Link {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        constraint: VersionConstraint,
        link_type: LinkType,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            constraint,
            link_type,
        }
    }

    /// Parse a link from its manifest form. `self.version` resolves to `source_version`.
    pub fn parse(
        source: &str,
        source_version: &str,
        target: &str,
        constraint: &str,
        link_type: LinkType,
    ) -> Result<Self, ParseError> {
        let parser = VersionParser::new();
        let parsed = if constraint.trim() == "self.version" {
            parser.parse_constraints(source_version)?
        } else {
            parser.parse_constraints(constraint)?
        };
        Ok(Self::new(source, target, parsed, link_type))
    }

    /// The constraint as originally written
    pub fn pretty_constraint(&self) -> String {
        self.constraint.pretty_string()
    }

    /// Whether the target name matches (case-insensitive)
    pub fn targets(&self, name: &str) -> bool {
        self.target.eq_ignore_ascii_case(name)
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.source,
            self.link_type.description(),
            self.target,
            self.pretty_constraint()
        )
    }
}

/// The dependency metadata slot of a package.
///
/// Dev package reconciliation swaps this whole slot for the authoritative one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageLinks {
    pub requires: Vec<Link>,
    pub conflicts: Vec<Link>,
    pub provides: Vec<Link>,
    pub replaces: Vec<Link>,
}

impl PackageLinks {
    /// Names this package can stand in for through `provide` and `replace`
    pub fn provided_names(&self) -> impl Iterator<Item = &str> {
        self.provides
            .iter()
            .chain(self.replaces.iter())
            .map(|link| link.target.as_str())
    }

    /// The provide or replace link for a name, provide first
    pub fn provider_link(&self, name: &str) -> Option<&Link> {
        self.provides
            .iter()
            .find(|l| l.targets(name))
            .or_else(|| self.replaces.iter().find(|l| l.targets(name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_link() {
        let link = Link::parse("vendor/a", "1.0.0", "vendor/b", "^1.2", LinkType::Require).unwrap();
        assert_eq!(link.pretty_constraint(), "^1.2");
        assert!(link.constraint.satisfies("1.5.0.0"));
        assert_eq!(link.to_string(), "vendor/a requires vendor/b ^1.2");
    }

    #[test]
    fn test_self_version() {
        let link = Link::parse("vendor/a", "2.1.0", "vendor/a-sub", "self.version", LinkType::Replace)
            .unwrap();
        assert!(link.constraint.satisfies("2.1.0.0"));
        assert!(!link.constraint.satisfies("2.0.0.0"));
    }

    #[test]
    fn test_provider_link_prefers_provide() {
        let mut links = PackageLinks::default();
        links.replaces.push(
            Link::parse("vendor/a", "1.0.0", "psr/log", "1.0.0", LinkType::Replace).unwrap(),
        );
        links.provides.push(
            Link::parse("vendor/a", "1.0.0", "PSR/Log", "2.0.0", LinkType::Provide).unwrap(),
        );

        let link = links.provider_link("psr/log").unwrap();
        assert_eq!(link.link_type, LinkType::Provide);
        assert_eq!(links.provided_names().count(), 2);
    }
}
