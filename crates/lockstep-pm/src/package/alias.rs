use std::sync::Arc;

use lockstep_semver::{Stability, VersionParser};

use super::link::Link;
use super::package::Package;

/// A package presented under an additional version label
#[derive(Debug, Clone)]
pub struct AliasPackage {
    alias_of: Arc<Package>,
    version: String,
    pretty_version: String,
    root_package_alias: bool,
}

impl AliasPackage {
    pub fn new(alias_of: Arc<Package>, version: String, pretty_version: String) -> Self {
        Self {
            alias_of,
            version,
            pretty_version,
            root_package_alias: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.alias_of.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn pretty_version(&self) -> &str {
        &self.pretty_version
    }

    pub fn alias_of(&self) -> &Arc<Package> {
        &self.alias_of
    }

    pub fn stability(&self) -> Stability {
        VersionParser::parse_stability(&self.version)
    }

    pub fn provides(&self) -> &[Link] {
        self.alias_of.provides()
    }

    pub fn replaces(&self) -> &[Link] {
        self.alias_of.replaces()
    }

    pub fn requires(&self) -> &[Link] {
        self.alias_of.requires()
    }

    /// Declared by the root package (`dev-master as 1.0.x-dev`)
    pub fn is_root_package_alias(&self) -> bool {
        self.root_package_alias
    }

    pub fn set_root_package_alias(&mut self, root: bool) {
        self.root_package_alias = root;
    }
}

/// An alias declaration: `package` at `version` is also known as `alias`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootAlias {
    pub package: String,
    pub version: String,
    pub alias: String,
    pub alias_normalized: String,
}

impl RootAlias {
    /// Whether this alias applies to the given package version
    pub fn applies_to(&self, package: &Package) -> bool {
        self.package.eq_ignore_ascii_case(&package.name) && self.version == package.version
    }

    /// Wrap the package in an alias entry
    pub fn to_alias_package(&self, package: Arc<Package>) -> AliasPackage {
        let mut alias =
            AliasPackage::new(package, self.alias_normalized.clone(), self.alias.clone());
        alias.set_root_package_alias(true);
        alias
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_presents_other_version() {
        let base = Arc::new(Package::new("vendor/package", "dev-master"));
        let alias = AliasPackage::new(
            Arc::clone(&base),
            "1.0.9999999.9999999-dev".to_string(),
            "1.0.x-dev".to_string(),
        );

        assert_eq!(alias.name(), "vendor/package");
        assert_eq!(alias.version(), "1.0.9999999.9999999-dev");
        assert_eq!(alias.alias_of().version, "9999999-dev");
        assert_eq!(alias.stability(), Stability::Dev);
        assert!(!alias.is_root_package_alias());
    }

    #[test]
    fn test_root_alias_applies_by_name_and_version() {
        let alias = RootAlias {
            package: "vendor/package".to_string(),
            version: "9999999-dev".to_string(),
            alias: "1.0.x-dev".to_string(),
            alias_normalized: "1.0.9999999.9999999-dev".to_string(),
        };

        let master = Arc::new(Package::new("Vendor/Package", "dev-master"));
        assert!(alias.applies_to(&master));
        assert!(!alias.applies_to(&Package::new("vendor/package", "1.0.0")));

        let wrapped = alias.to_alias_package(master);
        assert!(wrapped.is_root_package_alias());
        assert_eq!(wrapped.pretty_version(), "1.0.x-dev");
    }
}
