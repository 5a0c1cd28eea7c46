use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use lockstep_semver::{ParseError, Stability, VersionParser};

use super::link::{Link, LinkType, PackageLinks};
use super::source::{Dist, Source};

/// Abandonment marker of a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Abandoned {
    Yes,
    Replacement(String),
}

/// A resolved package version.
///
/// `version` holds the normalized form (`1.2.0.0`), `pretty_version` the form
/// it was published with (`v1.2`).
#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    pub name: String,
    pub version: String,
    pub pretty_version: String,
    pub package_type: String,
    pub links: PackageLinks,
    pub dev_requires: Vec<Link>,
    pub suggest: IndexMap<String, String>,
    pub source: Option<Source>,
    pub dist: Option<Dist>,
    pub time: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub abandoned: Option<Abandoned>,
    pub extra: Option<serde_json::Value>,
}

impl Package {
    /// Create a package, normalizing `version` when it parses
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        let pretty_version = version.into();
        let version = VersionParser::new()
            .normalize(&pretty_version)
            .unwrap_or_else(|_| pretty_version.clone());

        Self {
            name: name.into(),
            version,
            pretty_version,
            package_type: "library".to_string(),
            links: PackageLinks::default(),
            dev_requires: Vec::new(),
            suggest: IndexMap::new(),
            source: None,
            dist: None,
            time: None,
            description: None,
            abandoned: None,
            extra: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn pretty_version(&self) -> &str {
        &self.pretty_version
    }

    pub fn stability(&self) -> Stability {
        VersionParser::parse_stability(&self.version)
    }

    /// Dev packages track a moving revision rather than a release tag
    pub fn is_dev(&self) -> bool {
        self.stability() == Stability::Dev
    }

    pub fn requires(&self) -> &[Link] {
        &self.links.requires
    }

    pub fn conflicts(&self) -> &[Link] {
        &self.links.conflicts
    }

    pub fn provides(&self) -> &[Link] {
        &self.links.provides
    }

    pub fn replaces(&self) -> &[Link] {
        &self.links.replaces
    }

    /// Every name this package answers to: its own plus provided and replaced names
    pub fn names(&self) -> Vec<String> {
        std::iter::once(self.name.as_str())
            .chain(self.links.provided_names())
            .map(|n| n.to_lowercase())
            .collect()
    }

    pub fn add_require(&mut self, target: &str, constraint: &str) -> Result<(), ParseError> {
        let link = self.link(target, constraint, LinkType::Require)?;
        self.links.requires.push(link);
        Ok(())
    }

    pub fn add_dev_require(&mut self, target: &str, constraint: &str) -> Result<(), ParseError> {
        let link = self.link(target, constraint, LinkType::DevRequire)?;
        self.dev_requires.push(link);
        Ok(())
    }

    pub fn add_conflict(&mut self, target: &str, constraint: &str) -> Result<(), ParseError> {
        let link = self.link(target, constraint, LinkType::Conflict)?;
        self.links.conflicts.push(link);
        Ok(())
    }

    pub fn add_provide(&mut self, target: &str, constraint: &str) -> Result<(), ParseError> {
        let link = self.link(target, constraint, LinkType::Provide)?;
        self.links.provides.push(link);
        Ok(())
    }

    pub fn add_replace(&mut self, target: &str, constraint: &str) -> Result<(), ParseError> {
        let link = self.link(target, constraint, LinkType::Replace)?;
        self.links.replaces.push(link);
        Ok(())
    }

    fn link(&self, target: &str, constraint: &str, link_type: LinkType) -> Result<Link, ParseError> {
        Link::parse(&self.name, &self.pretty_version, target, constraint, link_type)
    }

    pub fn source_reference(&self) -> Option<&str> {
        self.source.as_ref().map(|s| s.reference.as_str())
    }

    pub fn dist_reference(&self) -> Option<&str> {
        self.dist.as_ref().and_then(|d| d.reference.as_deref())
    }

    pub fn set_source_reference(&mut self, reference: &str) {
        if let Some(source) = self.source.as_mut() {
            source.reference = reference.to_string();
        }
    }

    /// Point the dist at another reference, rewriting the reference inside its URL too
    pub fn set_dist_reference(&mut self, reference: &str) {
        if let Some(dist) = self.dist.as_mut() {
            if let Some(old) = dist.reference.as_deref() {
                if !old.is_empty() && dist.url.contains(old) {
                    dist.url = dist.url.replace(old, reference);
                }
            }
            dist.reference = Some(reference.to_string());
        }
    }

    /// Pretty version, with the abbreviated source reference for dev packages
    pub fn full_pretty_version(&self) -> String {
        match self.source_reference().or_else(|| self.dist_reference()) {
            Some(reference) if self.is_dev() && !reference.is_empty() => {
                let short: String = reference.chars().take(7).collect();
                format!("{} {}", self.pretty_version, short)
            }
            _ => self.pretty_version.clone(),
        }
    }

    /// Plugin packages are installed before anything else
    pub fn is_plugin(&self) -> bool {
        matches!(
            self.package_type.as_str(),
            "composer-plugin" | "composer-installer"
        )
    }

    pub fn is_abandoned(&self) -> bool {
        self.abandoned.is_some()
    }

    pub fn replacement_package(&self) -> Option<&str> {
        match &self.abandoned {
            Some(Abandoned::Replacement(name)) => Some(name),
            _ => None,
        }
    }

    /// Same name and version
    pub fn same_as(&self, other: &Package) -> bool {
        self.name.eq_ignore_ascii_case(&other.name) && self.version == other.version
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.full_pretty_version())
    }
}
