//! Serde models of the persisted documents: project manifest, lock file and
//! the installed package store.

mod lock;
mod manifest;

pub use lock::{InstalledFile, LockAlias, LockDist, LockFile, LockSource, LockedPackage};
pub use manifest::{ManifestConfig, ProjectManifest, ScriptValue};

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};

/// PHP serializes empty maps as `[]`, accept both forms
pub(crate) fn map_or_empty_list<'de, D, V>(deserializer: D) -> Result<IndexMap<String, V>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum MapOrList<V> {
        Map(IndexMap<String, V>),
        List(Vec<serde_json::Value>),
    }

    match MapOrList::deserialize(deserializer)? {
        MapOrList::Map(map) => Ok(map),
        MapOrList::List(list) if list.is_empty() => Ok(IndexMap::new()),
        MapOrList::List(_) => Err(serde::de::Error::custom("expected an object")),
    }
}
