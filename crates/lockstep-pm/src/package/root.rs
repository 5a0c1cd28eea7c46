//! The root package: the project being installed, with the settings only a
//! root manifest can carry.

use std::str::FromStr;

use indexmap::IndexMap;
use lazy_static::lazy_static;
use lockstep_semver::{Stability, VersionParser};
use regex::Regex;

use super::{Link, Package, RootAlias};
use crate::error::{InstallerError, Result};
use crate::json::ProjectManifest;

lazy_static! {
    static ref INLINE_ALIAS: Regex = Regex::new(r"^([^,\s#]+)(?:#[^ ]+)? +as +([^,\s]+)$").unwrap();
    static ref STRIP_ALIAS: Regex = Regex::new(r"^([^,\s@]+) as .+$").unwrap();
    static ref EXPLICIT_FLAG: Regex =
        Regex::new(r"(?i)^[^@]*?@(stable|RC|beta|alpha|dev)$").unwrap();
    static ref SINGLE_VERSION: Regex = Regex::new(r"^[^,\s@]+$").unwrap();
    static ref PINNED_REFERENCE: Regex = Regex::new(r"^[^,\s@]+?#([a-f0-9]+)$").unwrap();
    static ref OR_SPLIT: Regex = Regex::new(r"\s*\|\|?\s*").unwrap();
}

const DEFAULT_ROOT_NAME: &str = "__root__";
const DEFAULT_ROOT_VERSION: &str = "1.0.0+no-version-set";

/// The project package plus root-only settings
#[derive(Debug, Clone)]
pub struct RootPackage {
    package: Package,
    aliases: Vec<RootAlias>,
    minimum_stability: Stability,
    stability_flags: IndexMap<String, Stability>,
    references: IndexMap<String, String>,
    prefer_stable: bool,
    scripts: IndexMap<String, Vec<String>>,
    platform_overrides: IndexMap<String, String>,
}

impl RootPackage {
    /// A bare root package with no requirements
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        let mut package = Package::new(name, version);
        package.package_type = "project".to_string();
        Self {
            package,
            aliases: Vec::new(),
            minimum_stability: Stability::Stable,
            stability_flags: IndexMap::new(),
            references: IndexMap::new(),
            prefer_stable: false,
            scripts: IndexMap::new(),
            platform_overrides: IndexMap::new(),
        }
    }

    /// Load the root package from a manifest
    pub fn from_manifest(manifest: &ProjectManifest) -> Result<Self> {
        let name = manifest.name.as_deref().unwrap_or(DEFAULT_ROOT_NAME);
        let version = manifest.version.as_deref().unwrap_or(DEFAULT_ROOT_VERSION);

        let mut root = RootPackage::new(name, version);
        if let Some(package_type) = &manifest.package_type {
            root.package.package_type = package_type.clone();
        }

        if let Some(minimum) = &manifest.minimum_stability {
            root.minimum_stability = Stability::from_str(minimum).map_err(InstallerError::InvalidRoot)?;
        }
        root.prefer_stable = manifest.prefer_stable.unwrap_or(false);

        for (target, constraint) in &manifest.require {
            root.package.add_require(target, constraint)?;
        }
        for (target, constraint) in &manifest.require_dev {
            root.package.add_dev_require(target, constraint)?;
        }
        for (target, constraint) in &manifest.conflict {
            root.package.add_conflict(target, constraint)?;
        }
        for (target, constraint) in &manifest.provide {
            root.package.add_provide(target, constraint)?;
        }
        for (target, constraint) in &manifest.replace {
            root.package.add_replace(target, constraint)?;
        }
        root.package.suggest = manifest.suggest.clone();

        let all_requires: Vec<(&String, &String)> =
            manifest.require.iter().chain(manifest.require_dev.iter()).collect();

        root.aliases = extract_aliases(&all_requires)?;
        root.stability_flags = extract_stability_flags(&all_requires, root.minimum_stability);
        root.references = extract_references(&all_requires);

        root.scripts = manifest
            .scripts
            .iter()
            .map(|(event, value)| (event.clone(), value.as_vec()))
            .collect();
        root.platform_overrides = manifest.config.platform.clone();

        Ok(root)
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    pub fn name(&self) -> &str {
        &self.package.name
    }

    pub fn requires(&self) -> &[Link] {
        self.package.requires()
    }

    pub fn dev_requires(&self) -> &[Link] {
        &self.package.dev_requires
    }

    pub fn has_dev_requires(&self) -> bool {
        !self.package.dev_requires.is_empty()
    }

    /// Root requires, plus dev requires in dev mode
    pub fn links(&self, dev_mode: bool) -> Vec<&Link> {
        let mut links: Vec<&Link> = self.requires().iter().collect();
        if dev_mode {
            links.extend(self.dev_requires().iter());
        }
        links
    }

    pub fn aliases(&self) -> &[RootAlias] {
        &self.aliases
    }

    pub fn minimum_stability(&self) -> Stability {
        self.minimum_stability
    }

    pub fn stability_flags(&self) -> &IndexMap<String, Stability> {
        &self.stability_flags
    }

    /// Source references pinned with `dev-branch#ref`
    pub fn references(&self) -> &IndexMap<String, String> {
        &self.references
    }

    pub fn prefer_stable(&self) -> bool {
        self.prefer_stable
    }

    pub fn scripts(&self) -> &IndexMap<String, Vec<String>> {
        &self.scripts
    }

    pub fn platform_overrides(&self) -> &IndexMap<String, String> {
        &self.platform_overrides
    }

    pub fn with_requires(mut self, requires: &[(&str, &str)]) -> Result<Self> {
        for (target, constraint) in requires {
            self.package.add_require(target, constraint)?;
        }
        Ok(self)
    }

    pub fn with_dev_requires(mut self, requires: &[(&str, &str)]) -> Result<Self> {
        for (target, constraint) in requires {
            self.package.add_dev_require(target, constraint)?;
        }
        Ok(self)
    }

    pub fn with_reference(mut self, package: &str, reference: &str) -> Self {
        self.references.insert(package.to_lowercase(), reference.to_string());
        self
    }

    pub fn with_minimum_stability(mut self, stability: Stability) -> Self {
        self.minimum_stability = stability;
        self
    }

    pub fn with_script(mut self, event: &str, commands: &[&str]) -> Self {
        self.scripts.insert(
            event.to_string(),
            commands.iter().map(|c| c.to_string()).collect(),
        );
        self
    }
}

fn extract_aliases(requires: &[(&String, &String)]) -> Result<Vec<RootAlias>> {
    let parser = VersionParser::new();
    let mut aliases = Vec::new();

    for (name, constraint) in requires {
        if let Some(caps) = INLINE_ALIAS.captures(constraint) {
            aliases.push(RootAlias {
                package: name.to_lowercase(),
                version: parser.normalize(&caps[1])?,
                alias: caps[2].to_string(),
                alias_normalized: parser.normalize(&caps[2])?,
            });
        }
    }

    Ok(aliases)
}

/// Explicit `@flag`s win; otherwise an exact unstable version (`1.0.0-beta2`)
/// lowers the flag when it is less stable than the minimum stability.
fn extract_stability_flags(
    requires: &[(&String, &String)],
    minimum_stability: Stability,
) -> IndexMap<String, Stability> {
    let mut flags: IndexMap<String, Stability> = IndexMap::new();

    for (name, constraint) in requires {
        let name = name.to_lowercase();
        let parts: Vec<&str> = OR_SPLIT
            .split(constraint.trim())
            .flat_map(|group| group.split([',', ' ']).filter(|p| !p.is_empty()))
            .collect();

        let mut explicit = false;
        for part in &parts {
            if let Some(caps) = EXPLICIT_FLAG.captures(part) {
                let Ok(stability) = Stability::from_str(&caps[1]) else {
                    continue;
                };
                explicit = true;
                if flags.get(&name).is_some_and(|existing| existing.priority() > stability.priority()) {
                    continue;
                }
                flags.insert(name.clone(), stability);
            }
        }
        if explicit {
            continue;
        }

        let version = STRIP_ALIAS.replace(constraint.trim(), "$1");
        if !SINGLE_VERSION.is_match(&version) {
            continue;
        }
        let stability = VersionParser::parse_stability(&version);
        if stability == Stability::Stable {
            continue;
        }
        let weaker_flag = flags
            .get(&name)
            .is_some_and(|existing| existing.priority() > stability.priority());
        if weaker_flag || minimum_stability.priority() > stability.priority() {
            continue;
        }
        flags.insert(name, stability);
    }

    flags
}

fn extract_references(requires: &[(&String, &String)]) -> IndexMap<String, String> {
    let mut references = IndexMap::new();

    for (name, constraint) in requires {
        let version = STRIP_ALIAS.replace(constraint.trim(), "$1");
        if let Some(caps) = PINNED_REFERENCE.captures(&version) {
            if VersionParser::parse_stability(&version) == Stability::Dev {
                references.insert(name.to_lowercase(), caps[1].to_string());
            }
        }
    }

    references
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(json: &str) -> ProjectManifest {
        ProjectManifest::from_json(json).unwrap()
    }

    #[test]
    fn test_defaults() {
        let root = RootPackage::from_manifest(&manifest("{}")).unwrap();
        assert_eq!(root.name(), "__root__");
        assert_eq!(root.package().version, "1.0.0.0");
        assert_eq!(root.minimum_stability(), Stability::Stable);
        assert!(!root.has_dev_requires());
    }

    #[test]
    fn test_links() {
        let root = RootPackage::from_manifest(&manifest(
            r#"{"name": "acme/app", "require": {"vendor/a": "^1.0"}, "require-dev": {"vendor/t": "^2.0"}}"#,
        ))
        .unwrap();

        assert_eq!(root.links(false).len(), 1);
        assert_eq!(root.links(true).len(), 2);
        assert!(root.has_dev_requires());
    }

    #[test]
    fn test_inline_aliases() {
        let root = RootPackage::from_manifest(&manifest(
            r#"{"require": {"Vendor/A": "dev-master as 1.0.x-dev"}}"#,
        ))
        .unwrap();

        let alias = &root.aliases()[0];
        assert_eq!(alias.package, "vendor/a");
        assert_eq!(alias.version, "9999999-dev");
        assert_eq!(alias.alias, "1.0.x-dev");
        assert_eq!(alias.alias_normalized, "1.0.9999999.9999999-dev");
    }

    #[test]
    fn test_stability_flags() {
        let root = RootPackage::from_manifest(&manifest(
            r#"{"require": {
                "vendor/flagged": "^1.0@beta",
                "vendor/exact": "1.2.0-alpha3",
                "vendor/branch": "dev-master",
                "vendor/stable": "^2.0"
            }}"#,
        ))
        .unwrap();

        let flags = root.stability_flags();
        assert_eq!(flags["vendor/flagged"], Stability::Beta);
        assert_eq!(flags["vendor/exact"], Stability::Alpha);
        assert_eq!(flags["vendor/branch"], Stability::Dev);
        assert!(!flags.contains_key("vendor/stable"));
    }

    #[test]
    fn test_flags_not_lowered_below_minimum_stability() {
        let root = RootPackage::from_manifest(&manifest(
            r#"{"minimum-stability": "dev", "require": {"vendor/exact": "1.2.0-beta1"}}"#,
        ))
        .unwrap();
        assert!(root.stability_flags().is_empty());
    }

    #[test]
    fn test_references() {
        let root = RootPackage::from_manifest(&manifest(
            r#"{"require": {"vendor/a": "dev-master#abc123", "vendor/b": "^1.0"}}"#,
        ))
        .unwrap();

        assert_eq!(root.references()["vendor/a"], "abc123");
        assert!(!root.references().contains_key("vendor/b"));
    }

    #[test]
    fn test_reference_on_release_version_is_rejected() {
        let err = RootPackage::from_manifest(&manifest(
            r#"{"require": {"vendor/b": "1.0.0#abc123"}}"#,
        ))
        .unwrap_err();
        assert!(matches!(err, InstallerError::Version(_)));
    }

    #[test]
    fn test_scripts_and_platform() {
        let root = RootPackage::from_manifest(&manifest(
            r#"{"scripts": {"post-install-cmd": "echo hi"}, "config": {"platform": {"php": "8.1.0"}}}"#,
        ))
        .unwrap();

        assert_eq!(root.scripts()["post-install-cmd"], vec!["echo hi"]);
        assert_eq!(root.platform_overrides()["php"], "8.1.0");
    }

    #[test]
    fn test_invalid_minimum_stability() {
        let err = RootPackage::from_manifest(&manifest(r#"{"minimum-stability": "nightly"}"#))
            .unwrap_err();
        assert!(matches!(err, InstallerError::InvalidRoot(_)));
    }
}
