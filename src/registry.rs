//! Package registry (`packages.json`) and version entries
//!
//! The registry lists every addon known to the plugin manager together with
//! all of its released versions. Releases only ever append to it: a version
//! string may appear at most once per addon.
//!
//! Documents are kept as ordered JSON objects. Only the keys a release edits
//! are lifted into typed fields; everything else is written back untouched and
//! in its original position, so a release only diffs what it changed.
//!
//! # Examples
//!
//! ```no_run
//! use addon_release::PackageRegistry;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = PackageRegistry::load("addons/packages.json")?;
//! let package = registry.find_package("com.github.example.addon")?;
//! if let Some(latest) = package.versions.last() {
//!     println!("Latest version: {}", latest.version());
//! }
//! # Ok(())
//! # }
//! ```

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Registry file name inside the addons directory
pub const PACKAGES_FILE: &str = "packages.json";

/// Read a required string field without moving it out of `fields`
pub(crate) fn required_string(
    fields: &Map<String, Value>,
    key: &str,
) -> std::result::Result<String, String> {
    match fields.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(format!("field `{}` must be a string", key)),
        None => Err(format!("missing field `{}`", key)),
    }
}

/// Deserialize `key` out of `fields`, leaving `null` in its slot.
///
/// The slot keeps the key's position; writing the typed value back with
/// `Map::insert` puts it where it was read from.
pub(crate) fn take_field<T: DeserializeOwned>(
    fields: &mut Map<String, Value>,
    key: &str,
) -> std::result::Result<Option<T>, String> {
    match fields.get_mut(key) {
        Some(value) => serde_json::from_value(value.take())
            .map(Some)
            .map_err(|e| format!("field `{}`: {}", key, e)),
        None => Ok(None),
    }
}

/// One release of one addon
///
/// Manifests carry a single entry without download fields; the registry
/// carries the same entry with the download fields filled in. Any other keys
/// (status, supported host versions, ...) are kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct VersionEntry {
    fields: Map<String, Value>,
}

impl TryFrom<Map<String, Value>> for VersionEntry {
    type Error = String;

    fn try_from(fields: Map<String, Value>) -> std::result::Result<Self, Self::Error> {
        required_string(&fields, "version")?;
        Ok(Self { fields })
    }
}

impl From<VersionEntry> for Map<String, Value> {
    fn from(entry: VersionEntry) -> Self {
        entry.fields
    }
}

/// Download details of a freshly built addon archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadInfo {
    pub url: String,
    pub sha256: String,
    pub size: u64,
    pub install_size: u64,
}

impl VersionEntry {
    pub fn new(version: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("version".to_string(), Value::String(version.into()));
        Self { fields }
    }

    pub fn version(&self) -> &str {
        self.fields
            .get("version")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn set_version(&mut self, version: impl Into<String>) {
        self.fields
            .insert("version".to_string(), Value::String(version.into()));
    }

    pub fn download_sha256(&self) -> Option<&str> {
        self.fields.get("download_sha256").and_then(Value::as_str)
    }

    pub fn download_size(&self) -> Option<u64> {
        self.fields.get("download_size").and_then(Value::as_u64)
    }

    pub fn download_url(&self) -> Option<&str> {
        self.fields.get("download_url").and_then(Value::as_str)
    }

    pub fn install_size(&self) -> Option<u64> {
        self.fields.get("install_size").and_then(Value::as_u64)
    }

    /// Any key of the entry, typed or not
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Set a key; an existing key keeps its position, a new one goes last
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Copy of this entry with the download fields overlaid
    pub fn with_download(&self, download: DownloadInfo) -> Self {
        let mut entry = self.clone();
        entry.insert("download_sha256", download.sha256);
        entry.insert("download_size", download.size);
        entry.insert("download_url", download.url);
        entry.insert("install_size", download.install_size);
        entry
    }
}

/// All registered versions of one addon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct PackageRecord {
    pub identifier: String,
    pub versions: Vec<VersionEntry>,
    fields: Map<String, Value>,
}

impl TryFrom<Map<String, Value>> for PackageRecord {
    type Error = String;

    fn try_from(mut fields: Map<String, Value>) -> std::result::Result<Self, Self::Error> {
        let identifier = required_string(&fields, "identifier")?;
        let versions = take_field(&mut fields, "versions")?.unwrap_or_default();
        Ok(Self {
            identifier,
            versions,
            fields,
        })
    }
}

impl From<PackageRecord> for Map<String, Value> {
    fn from(record: PackageRecord) -> Self {
        let mut fields = record.fields;
        fields.insert("identifier".to_string(), Value::String(record.identifier));
        if !record.versions.is_empty() || fields.contains_key("versions") {
            let versions = record
                .versions
                .into_iter()
                .map(|v| Value::Object(v.into()))
                .collect();
            fields.insert("versions".to_string(), Value::Array(versions));
        }
        fields
    }
}

impl PackageRecord {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            versions: Vec::new(),
            fields: Map::new(),
        }
    }

    /// A key of the record other than `identifier` and `versions`
    pub fn get(&self, key: &str) -> Option<&Value> {
        match key {
            "versions" => None,
            _ => self.fields.get(key),
        }
    }

    pub fn has_version(&self, version: &str) -> bool {
        self.versions.iter().any(|v| v.version() == version)
    }

    /// Append a release, refusing a version string that is already registered
    pub fn push_version(&mut self, entry: VersionEntry) -> Result<()> {
        if self.has_version(entry.version()) {
            return Err(Error::VersionConflict {
                identifier: self.identifier.clone(),
                version: entry.version().to_string(),
            });
        }
        self.versions.push(entry);
        Ok(())
    }
}

/// The `packages.json` document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct PackageRegistry {
    pub packages: Vec<PackageRecord>,
    fields: Map<String, Value>,
}

impl TryFrom<Map<String, Value>> for PackageRegistry {
    type Error = String;

    fn try_from(mut fields: Map<String, Value>) -> std::result::Result<Self, Self::Error> {
        let packages = take_field(&mut fields, "packages")?
            .ok_or_else(|| "missing field `packages`".to_string())?;
        Ok(Self { packages, fields })
    }
}

impl From<PackageRegistry> for Map<String, Value> {
    fn from(registry: PackageRegistry) -> Self {
        let mut fields = registry.fields;
        let packages = registry
            .packages
            .into_iter()
            .map(|p| Value::Object(p.into()))
            .collect();
        fields.insert("packages".to_string(), Value::Array(packages));
        fields
    }
}

impl PackageRegistry {
    /// Load a registry document; the file must exist
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::MissingFile(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let registry: PackageRegistry = serde_json::from_str(&content)?;
        Ok(registry)
    }

    /// Write the registry as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// A top-level key other than `packages`
    pub fn get(&self, key: &str) -> Option<&Value> {
        match key {
            "packages" => None,
            _ => self.fields.get(key),
        }
    }

    fn package_index(&self, identifier: &str) -> Result<usize> {
        let matches: Vec<usize> = self
            .packages
            .iter()
            .enumerate()
            .filter(|(_, p)| p.identifier == identifier)
            .map(|(idx, _)| idx)
            .collect();

        match matches.as_slice() {
            [idx] => Ok(*idx),
            [] => Err(Error::PackageNotFound(identifier.to_string())),
            _ => Err(Error::AmbiguousPackage {
                identifier: identifier.to_string(),
                matches: matches.len(),
            }),
        }
    }

    /// The single record registered under `identifier`
    pub fn find_package(&self, identifier: &str) -> Result<&PackageRecord> {
        let idx = self.package_index(identifier)?;
        Ok(&self.packages[idx])
    }

    pub fn find_package_mut(&mut self, identifier: &str) -> Result<&mut PackageRecord> {
        let idx = self.package_index(identifier)?;
        Ok(&mut self.packages[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_registry() -> PackageRegistry {
        serde_json::from_str(
            r#"{
                "$schema": "https://go.kicad.org/pcm/schemas/v1",
                "packages": [
                    {
                        "identifier": "com.github.example.one",
                        "name": "One",
                        "versions": [
                            {
                                "version": "1.0.0",
                                "status": "stable",
                                "download_sha256": "abc",
                                "download_size": 10,
                                "download_url": "https://example.com/1.0.0/one.zip",
                                "install_size": 20
                            }
                        ]
                    },
                    { "name": "Two", "versions": [], "identifier": "com.github.example.two" },
                    { "identifier": "com.github.example.twin", "versions": [] },
                    { "identifier": "com.github.example.twin", "versions": [] }
                ]
            }"#,
        )
        .unwrap()
    }

    fn keys(value: &Value) -> Vec<&str> {
        value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect()
    }

    #[test]
    fn test_registry_parse_keeps_unknown_fields() {
        let registry = sample_registry();
        assert_eq!(registry.packages.len(), 4);
        assert_eq!(
            registry.get("$schema"),
            Some(&Value::from("https://go.kicad.org/pcm/schemas/v1"))
        );

        let one = &registry.packages[0];
        assert_eq!(one.get("name"), Some(&Value::from("One")));
        assert_eq!(one.versions[0].download_size(), Some(10));
        assert_eq!(one.versions[0].get("status"), Some(&Value::from("stable")));

        let json = serde_json::to_string(&registry).unwrap();
        assert!(json.contains("\"$schema\""));
        assert!(json.contains("\"status\":\"stable\""));
    }

    #[test]
    fn test_registry_save_keeps_key_order() {
        let mut registry = sample_registry();
        let one = registry.find_package_mut("com.github.example.one").unwrap();
        one.push_version(VersionEntry::new("1.1.0")).unwrap();

        let value = serde_json::to_value(&registry).unwrap();
        assert_eq!(keys(&value), vec!["$schema", "packages"]);
        assert_eq!(keys(&value["packages"][0]), vec!["identifier", "name", "versions"]);
        assert_eq!(keys(&value["packages"][1]), vec!["name", "versions", "identifier"]);
        assert_eq!(
            keys(&value["packages"][0]["versions"][0]),
            vec![
                "version",
                "status",
                "download_sha256",
                "download_size",
                "download_url",
                "install_size"
            ]
        );
        assert_eq!(value["packages"][0]["versions"][1]["version"], "1.1.0");
    }

    #[test]
    fn test_record_without_versions_key() {
        let registry: PackageRegistry =
            serde_json::from_str(r#"{ "packages": [ { "identifier": "a", "name": "A" } ] }"#)
                .unwrap();
        assert!(registry.packages[0].versions.is_empty());

        let value = serde_json::to_value(&registry).unwrap();
        assert!(value["packages"][0].get("versions").is_none());
    }

    #[test]
    fn test_parse_rejects_missing_identifier() {
        let err = serde_json::from_str::<PackageRegistry>(r#"{ "packages": [ { "name": "A" } ] }"#)
            .unwrap_err();
        assert!(err.to_string().contains("identifier"));
    }

    #[test]
    fn test_find_package() {
        let registry = sample_registry();
        let two = registry.find_package("com.github.example.two").unwrap();
        assert!(two.versions.is_empty());
    }

    #[test]
    fn test_find_package_missing() {
        let registry = sample_registry();
        let err = registry.find_package("com.github.example.none").unwrap_err();
        assert!(matches!(err, Error::PackageNotFound(id) if id == "com.github.example.none"));
    }

    #[test]
    fn test_find_package_ambiguous() {
        let mut registry = sample_registry();
        let err = registry
            .find_package_mut("com.github.example.twin")
            .unwrap_err();
        assert!(matches!(err, Error::AmbiguousPackage { matches: 2, .. }));
    }

    #[test]
    fn test_push_version_rejects_duplicates() {
        let mut registry = sample_registry();
        let one = registry.find_package_mut("com.github.example.one").unwrap();

        let err = one.push_version(VersionEntry::new("1.0.0")).unwrap_err();
        assert!(matches!(err, Error::VersionConflict { ref version, .. } if version == "1.0.0"));
        assert!(err.to_string().contains("Version already present!"));
        assert_eq!(one.versions.len(), 1);

        one.push_version(VersionEntry::new("1.1.0")).unwrap();
        assert_eq!(one.versions.len(), 2);
        assert!(one.has_version("1.1.0"));
    }

    #[test]
    fn test_with_download_overlays_fields() {
        let mut template = VersionEntry::new("2.0");
        template.insert("status", "stable");
        template.insert("kicad_version", "7.0");

        let entry = template.with_download(DownloadInfo {
            url: "https://example.com/releases/download/2.0/addon.zip".to_string(),
            sha256: "deadbeef".to_string(),
            size: 123,
            install_size: 456,
        });

        assert_eq!(entry.version(), "2.0");
        assert_eq!(entry.download_sha256(), Some("deadbeef"));
        assert_eq!(entry.download_size(), Some(123));
        assert_eq!(entry.install_size(), Some(456));
        assert_eq!(entry.get("kicad_version"), Some(&Value::from("7.0")));

        // Template keys stay first, download fields follow in a fixed order
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            keys(&value),
            vec![
                "version",
                "status",
                "kicad_version",
                "download_sha256",
                "download_size",
                "download_url",
                "install_size"
            ]
        );
    }

    #[test]
    fn test_with_download_replaces_stale_fields_in_place() {
        let template: VersionEntry = serde_json::from_str(
            r#"{ "download_url": "https://old", "version": "3.0", "status": "testing" }"#,
        )
        .unwrap();

        let entry = template.with_download(DownloadInfo {
            url: "https://new".to_string(),
            sha256: "ff".to_string(),
            size: 1,
            install_size: 2,
        });

        assert_eq!(entry.download_url(), Some("https://new"));
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            keys(&value),
            vec![
                "download_url",
                "version",
                "status",
                "download_sha256",
                "download_size",
                "install_size"
            ]
        );
    }

    #[test]
    fn test_load_missing_registry() {
        let temp = tempfile::TempDir::new().unwrap();
        let err = PackageRegistry::load(temp.path().join(PACKAGES_FILE)).unwrap_err();
        assert!(matches!(err, Error::MissingFile(_)));
    }
}
