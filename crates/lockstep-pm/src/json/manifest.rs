use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::map_or_empty_list;
use crate::Result;

/// The root project manifest (`composer.json`)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct ProjectManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub package_type: Option<String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty", deserialize_with = "map_or_empty_list")]
    pub require: IndexMap<String, String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty", deserialize_with = "map_or_empty_list")]
    pub require_dev: IndexMap<String, String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty", deserialize_with = "map_or_empty_list")]
    pub conflict: IndexMap<String, String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty", deserialize_with = "map_or_empty_list")]
    pub provide: IndexMap<String, String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty", deserialize_with = "map_or_empty_list")]
    pub replace: IndexMap<String, String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty", deserialize_with = "map_or_empty_list")]
    pub suggest: IndexMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_stability: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefer_stable: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repositories: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty", deserialize_with = "map_or_empty_list")]
    pub scripts: IndexMap<String, ScriptValue>,

    #[serde(default, skip_serializing_if = "ManifestConfig::is_empty")]
    pub config: ManifestConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

impl ProjectManifest {
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

/// A script entry: a single command or a list of them
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ScriptValue {
    Single(String),
    Multiple(Vec<String>),
}

impl ScriptValue {
    pub fn as_vec(&self) -> Vec<String> {
        match self {
            ScriptValue::Single(cmd) => vec![cmd.clone()],
            ScriptValue::Multiple(cmds) => cmds.clone(),
        }
    }
}

/// The subset of the `config` section the installer honours
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct ManifestConfig {
    #[serde(default, skip_serializing_if = "IndexMap::is_empty", deserialize_with = "map_or_empty_list")]
    pub platform: IndexMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_dir: Option<String>,
}

impl ManifestConfig {
    pub fn is_empty(&self) -> bool {
        self.platform.is_empty() && self.vendor_dir.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_manifest() {
        let manifest = ProjectManifest::from_json(
            r#"{
                "name": "acme/app",
                "require": {"php": ">=8.1", "vendor/a": "^1.0"},
                "require-dev": {"vendor/test": "^2.0"},
                "minimum-stability": "dev",
                "prefer-stable": true,
                "scripts": {
                    "post-install-cmd": "echo installed",
                    "pre-update-cmd": ["echo one", "echo two"]
                },
                "config": {"platform": {"php": "8.2.0"}}
            }"#,
        )
        .unwrap();

        assert_eq!(manifest.name.as_deref(), Some("acme/app"));
        assert_eq!(manifest.require.len(), 2);
        assert_eq!(manifest.require_dev["vendor/test"], "^2.0");
        assert_eq!(manifest.prefer_stable, Some(true));
        assert_eq!(manifest.scripts["post-install-cmd"].as_vec(), vec!["echo installed"]);
        assert_eq!(manifest.scripts["pre-update-cmd"].as_vec().len(), 2);
        assert_eq!(manifest.config.platform["php"], "8.2.0");
    }

    #[test]
    fn test_empty_php_arrays_are_empty_maps() {
        let manifest = ProjectManifest::from_json(r#"{"require": [], "suggest": []}"#).unwrap();
        assert!(manifest.require.is_empty());
        assert!(manifest.suggest.is_empty());
    }
}
