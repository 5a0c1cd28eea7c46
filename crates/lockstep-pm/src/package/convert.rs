//! Conversions between Package and LockedPackage types.

use indexmap::IndexMap;
use lockstep_semver::{ParseError, VersionParser};

use super::{Abandoned, Dist, Link, LinkType, Package, RootAlias, Source};
use crate::json::{LockAlias, LockDist, LockSource, LockedPackage};

impl TryFrom<&LockedPackage> for Package {
    type Error = ParseError;

    fn try_from(lp: &LockedPackage) -> Result<Self, Self::Error> {
        let mut pkg = Package::new(&lp.name, &lp.version);
        if let Some(normalized) = &lp.version_normalized {
            pkg.version = normalized.clone();
        } else {
            pkg.version = VersionParser::new().normalize(&lp.version)?;
        }

        pkg.package_type = lp.package_type.clone();
        pkg.description = lp.description.clone();
        pkg.suggest = lp.suggest.clone();
        pkg.extra = lp.extra.clone();

        pkg.links.requires = parse_links(&pkg, &lp.require, LinkType::Require)?;
        pkg.links.conflicts = parse_links(&pkg, &lp.conflict, LinkType::Conflict)?;
        pkg.links.provides = parse_links(&pkg, &lp.provide, LinkType::Provide)?;
        pkg.links.replaces = parse_links(&pkg, &lp.replace, LinkType::Replace)?;
        pkg.dev_requires = parse_links(&pkg, &lp.require_dev, LinkType::DevRequire)?;

        if let Some(ref src) = lp.source {
            pkg.source = Some(Source::new(&src.source_type, &src.url, &src.reference));
        }

        if let Some(ref dist) = lp.dist {
            let mut d = Dist::new(&dist.dist_type, &dist.url);
            if let Some(ref r) = dist.reference {
                d = d.with_reference(r);
            }
            if let Some(ref s) = dist.shasum {
                d = d.with_shasum(s);
            }
            pkg.dist = Some(d);
        }

        pkg.abandoned = match &lp.abandoned {
            Some(serde_json::Value::Bool(true)) => Some(Abandoned::Yes),
            Some(serde_json::Value::String(replacement)) => {
                Some(Abandoned::Replacement(replacement.clone()))
            }
            _ => None,
        };

        if let Some(ref time_str) = lp.time {
            if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(time_str) {
                pkg.time = Some(dt.with_timezone(&chrono::Utc));
            }
        }

        Ok(pkg)
    }
}

impl TryFrom<LockedPackage> for Package {
    type Error = ParseError;

    fn try_from(lp: LockedPackage) -> Result<Self, Self::Error> {
        Package::try_from(&lp)
    }
}

fn parse_links(
    pkg: &Package,
    links: &IndexMap<String, String>,
    link_type: LinkType,
) -> Result<Vec<Link>, ParseError> {
    links
        .iter()
        .map(|(target, constraint)| {
            Link::parse(&pkg.name, &pkg.pretty_version, target, constraint, link_type)
        })
        .collect()
}

fn links_to_map(links: &[Link]) -> IndexMap<String, String> {
    links
        .iter()
        .map(|link| (link.target.clone(), link.pretty_constraint()))
        .collect()
}

impl From<&Package> for LockedPackage {
    fn from(pkg: &Package) -> Self {
        LockedPackage {
            name: pkg.name.clone(),
            version: pkg.pretty_version.clone(),
            version_normalized: None,
            source: pkg.source.as_ref().map(LockSource::from),
            dist: pkg.dist.as_ref().map(LockDist::from),
            require: links_to_map(pkg.requires()),
            require_dev: links_to_map(&pkg.dev_requires),
            conflict: links_to_map(pkg.conflicts()),
            provide: links_to_map(pkg.provides()),
            replace: links_to_map(pkg.replaces()),
            suggest: pkg.suggest.clone(),
            package_type: pkg.package_type.clone(),
            extra: pkg.extra.clone(),
            description: pkg.description.clone(),
            abandoned: pkg.abandoned.as_ref().map(|abandoned| match abandoned {
                Abandoned::Yes => serde_json::Value::Bool(true),
                Abandoned::Replacement(name) => serde_json::Value::String(name.clone()),
            }),
            time: pkg.time.map(|t| t.to_rfc3339()),
        }
    }
}

impl From<Package> for LockedPackage {
    fn from(pkg: Package) -> Self {
        LockedPackage::from(&pkg)
    }
}

impl From<&Source> for LockSource {
    fn from(s: &Source) -> Self {
        LockSource {
            source_type: s.source_type.clone(),
            url: s.url.clone(),
            reference: s.reference.clone(),
        }
    }
}

impl From<&Dist> for LockDist {
    fn from(d: &Dist) -> Self {
        LockDist {
            dist_type: d.dist_type.clone(),
            url: d.url.clone(),
            reference: d.reference.clone(),
            shasum: d.shasum.clone(),
        }
    }
}

impl From<&LockAlias> for RootAlias {
    fn from(alias: &LockAlias) -> Self {
        RootAlias {
            package: alias.package.to_lowercase(),
            version: alias.version.clone(),
            alias: alias.alias.clone(),
            alias_normalized: alias.alias_normalized.clone(),
        }
    }
}

impl From<&RootAlias> for LockAlias {
    fn from(alias: &RootAlias) -> Self {
        LockAlias {
            alias: alias.alias.clone(),
            alias_normalized: alias.alias_normalized.clone(),
            version: alias.version.clone(),
            package: alias.package.clone(),
        }
    }
}
