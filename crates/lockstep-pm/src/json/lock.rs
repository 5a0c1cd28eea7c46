use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::map_or_empty_list;

/// The lock file document (`composer.lock`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct LockFile {
    #[serde(rename = "_readme", default)]
    pub readme: Vec<String>,

    #[serde(default)]
    pub content_hash: String,

    #[serde(default)]
    pub packages: Vec<LockedPackage>,

    /// `null` when the lock was written without dev information
    #[serde(default)]
    pub packages_dev: Option<Vec<LockedPackage>>,

    #[serde(default)]
    pub aliases: Vec<LockAlias>,

    #[serde(default = "default_minimum_stability")]
    pub minimum_stability: String,

    #[serde(default, deserialize_with = "map_or_empty_list")]
    pub stability_flags: IndexMap<String, u8>,

    #[serde(default)]
    pub prefer_stable: bool,

    #[serde(default)]
    pub prefer_lowest: bool,

    #[serde(default, deserialize_with = "map_or_empty_list")]
    pub platform: IndexMap<String, String>,

    #[serde(default, deserialize_with = "map_or_empty_list")]
    pub platform_dev: IndexMap<String, String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty", deserialize_with = "map_or_empty_list")]
    pub platform_overrides: IndexMap<String, String>,
}

impl Default for LockFile {
    fn default() -> Self {
        Self {
            readme: readme(),
            content_hash: String::new(),
            packages: Vec::new(),
            packages_dev: None,
            aliases: Vec::new(),
            minimum_stability: default_minimum_stability(),
            stability_flags: IndexMap::new(),
            prefer_stable: false,
            prefer_lowest: false,
            platform: IndexMap::new(),
            platform_dev: IndexMap::new(),
            platform_overrides: IndexMap::new(),
        }
    }
}

fn default_minimum_stability() -> String {
    "stable".to_string()
}

pub(crate) fn readme() -> Vec<String> {
    vec![
        "This file locks the dependencies of your project to a known state".to_string(),
        "Read more about it at https://getcomposer.org/doc/01-basic-usage.md#installing-dependencies"
            .to_string(),
        "This file is @generated automatically".to_string(),
    ]
}

/// One package entry, shared by the lock file and the installed store
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LockedPackage {
    pub name: String,

    pub version: String,

    /// Only present in the installed store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_normalized: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<LockSource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dist: Option<LockDist>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty", deserialize_with = "map_or_empty_list")]
    pub require: IndexMap<String, String>,

    #[serde(rename = "require-dev", default, skip_serializing_if = "IndexMap::is_empty", deserialize_with = "map_or_empty_list")]
    pub require_dev: IndexMap<String, String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty", deserialize_with = "map_or_empty_list")]
    pub conflict: IndexMap<String, String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty", deserialize_with = "map_or_empty_list")]
    pub provide: IndexMap<String, String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty", deserialize_with = "map_or_empty_list")]
    pub replace: IndexMap<String, String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty", deserialize_with = "map_or_empty_list")]
    pub suggest: IndexMap<String, String>,

    #[serde(rename = "type", default = "default_package_type")]
    pub package_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// `true` or the name of the replacement package
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abandoned: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

fn default_package_type() -> String {
    "library".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LockSource {
    #[serde(rename = "type")]
    pub source_type: String,
    pub url: String,
    pub reference: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LockDist {
    #[serde(rename = "type")]
    pub dist_type: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shasum: Option<String>,
}

/// An entry of the lock's alias table
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LockAlias {
    pub alias: String,
    pub alias_normalized: String,
    pub version: String,
    pub package: String,
}

/// The installed store document (`vendor/composer/installed.json`)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InstalledFile {
    #[serde(default)]
    pub packages: Vec<LockedPackage>,
}

impl InstalledFile {
    /// Parse either the object form or the older bare array form
    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        match serde_json::from_str::<InstalledFile>(content) {
            Ok(file) => Ok(file),
            Err(err) => match serde_json::from_str::<Vec<LockedPackage>>(content) {
                Ok(packages) => Ok(InstalledFile { packages }),
                Err(_) => Err(err),
            },
        }
    }
}
