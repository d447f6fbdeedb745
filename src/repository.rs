//! Repository index (`repository.json`)
//!
//! The index is the entry point for the plugin manager: it points at the
//! current package registry and at the bundled resources archive, each with
//! an integrity hash and the time it was last updated.
//!
//! Whatever the source index holds under `packages` and `resources` is
//! replaced on every release, so those keys are not validated on load.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::Path;

/// Index file name inside the addons directory
pub const REPOSITORY_FILE: &str = "repository.json";

/// Format of `update_time_utc`
pub const UPDATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single instant rendered both as text and as epoch seconds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTime {
    pub utc: String,
    pub timestamp: i64,
}

impl UpdateTime {
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn from_datetime(time: DateTime<Utc>) -> Self {
        Self {
            utc: time.format(UPDATE_TIME_FORMAT).to_string(),
            timestamp: time.timestamp(),
        }
    }
}

/// Where to fetch one published asset and how to check it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPointer {
    pub sha256: String,
    pub update_time_utc: String,
    pub update_timestamp: i64,
    pub url: String,
}

impl AssetPointer {
    pub fn new(sha256: String, time: &UpdateTime, url: String) -> Self {
        Self {
            sha256,
            update_time_utc: time.utc.clone(),
            update_timestamp: time.timestamp,
            url,
        }
    }
}

impl From<AssetPointer> for Value {
    fn from(pointer: AssetPointer) -> Self {
        json!({
            "sha256": pointer.sha256,
            "update_time_utc": pointer.update_time_utc,
            "update_timestamp": pointer.update_timestamp,
            "url": pointer.url,
        })
    }
}

/// The `repository.json` document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepositoryIndex {
    fields: Map<String, Value>,
}

impl RepositoryIndex {
    /// Load an index document; the file must exist
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::MissingFile(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let index: RepositoryIndex = serde_json::from_str(&content)?;
        Ok(index)
    }

    /// Write the index as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// The registry pointer, if the index holds a complete one
    pub fn packages(&self) -> Option<AssetPointer> {
        self.pointer("packages")
    }

    /// The resources pointer, if the index holds a complete one
    pub fn resources(&self) -> Option<AssetPointer> {
        self.pointer("resources")
    }

    /// Replace the registry pointer, keeping the key's position
    pub fn set_packages(&mut self, pointer: AssetPointer) {
        self.fields.insert("packages".to_string(), pointer.into());
    }

    /// Replace the resources pointer, keeping the key's position
    pub fn set_resources(&mut self, pointer: AssetPointer) {
        self.fields.insert("resources".to_string(), pointer.into());
    }

    fn pointer(&self, key: &str) -> Option<AssetPointer> {
        self.fields
            .get(key)
            .and_then(|v| AssetPointer::deserialize(v).ok())
    }
}
