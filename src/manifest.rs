//! Addon manifest handling (`manifest.json`)
//!
//! Every addon directory carries a manifest describing the addon. Before a
//! release it holds exactly one version entry, a template whose `version`
//! gets replaced by the release version while packaging. The manifest's
//! homepage link is pointed at the project repository at the same time.
//!
//! # Examples
//!
//! ```no_run
//! use addon_release::{AddonManifest, ReleaseVersion};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut manifest = AddonManifest::load("addons/my_addon/manifest.json")?;
//! let version = ReleaseVersion::parse("1.2.3")?;
//! manifest.stamp(&version, "https://github.com/example/project")?;
//! manifest.save("build/src/my_addon/manifest.json")?;
//! # Ok(())
//! # }
//! ```

use crate::registry::{required_string, take_field, VersionEntry};
use crate::version::ReleaseVersion;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Manifest file name inside an addon directory
pub const MANIFEST_FILE: &str = "manifest.json";

/// Addon manifest file (manifest.json)
///
/// Keys other than `identifier` and `versions` stay in an ordered map and are
/// saved back in their original order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct AddonManifest {
    /// Unique addon identifier, the key into the package registry
    pub identifier: String,

    /// Release template; exactly one entry before packaging
    pub versions: Vec<VersionEntry>,

    fields: Map<String, Value>,
}

impl TryFrom<Map<String, Value>> for AddonManifest {
    type Error = String;

    fn try_from(mut fields: Map<String, Value>) -> std::result::Result<Self, Self::Error> {
        let identifier = required_string(&fields, "identifier")?;
        let versions = take_field(&mut fields, "versions")?
            .ok_or_else(|| "missing field `versions`".to_string())?;

        match fields.get("resources") {
            Some(Value::Object(_)) => {}
            Some(_) => return Err("field `resources` must be an object".to_string()),
            None => return Err("missing field `resources`".to_string()),
        }

        Ok(Self {
            identifier,
            versions,
            fields,
        })
    }
}

impl From<AddonManifest> for Map<String, Value> {
    fn from(manifest: AddonManifest) -> Self {
        let mut fields = manifest.fields;
        fields.insert("identifier".to_string(), Value::String(manifest.identifier));
        let versions = manifest
            .versions
            .into_iter()
            .map(|v| Value::Object(v.into()))
            .collect();
        fields.insert("versions".to_string(), Value::Array(versions));
        fields
    }
}

impl AddonManifest {
    /// Load a manifest and check it holds a single version entry
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::MissingFile(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let manifest: AddonManifest = serde_json::from_str(&content).map_err(|e| {
            Error::InvalidManifest(format!("{}: {}", path.display(), e))
        })?;

        if manifest.versions.len() != 1 {
            return Err(Error::InvalidManifest(format!(
                "{}: expected exactly one entry in \"versions\", found {}",
                path.display(),
                manifest.versions.len()
            )));
        }

        Ok(manifest)
    }

    /// Save the manifest as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// A top-level key other than `versions`
    pub fn get(&self, key: &str) -> Option<&Value> {
        match key {
            "versions" => None,
            _ => self.fields.get(key),
        }
    }

    /// The `homepage` link of the `resources` block
    pub fn homepage(&self) -> Option<&str> {
        self.fields
            .get("resources")
            .and_then(|r| r.get("homepage"))
            .and_then(Value::as_str)
    }

    /// The single version entry used as the template for the release
    pub fn release_entry(&self) -> Result<&VersionEntry> {
        match self.versions.as_slice() {
            [entry] => Ok(entry),
            entries => Err(Error::InvalidManifest(format!(
                "{}: expected exactly one entry in \"versions\", found {}",
                self.identifier,
                entries.len()
            ))),
        }
    }

    /// Set the release version and homepage link
    pub fn stamp(&mut self, version: &ReleaseVersion, homepage: &str) -> Result<()> {
        if self.versions.len() != 1 {
            return Err(Error::InvalidManifest(format!(
                "{}: expected exactly one entry in \"versions\", found {}",
                self.identifier,
                self.versions.len()
            )));
        }

        let Some(Value::Object(resources)) = self.fields.get_mut("resources") else {
            return Err(Error::InvalidManifest(format!(
                "{}: \"resources\" must be an object",
                self.identifier
            )));
        };
        resources.insert("homepage".to_string(), Value::from(homepage));
        self.versions[0].set_version(version.as_str());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"{
        "$schema": "https://go.kicad.org/pcm/schemas/v1",
        "name": "Example",
        "identifier": "com.github.example.addon",
        "type": "plugin",
        "resources": { "homepage": "https://old.example.com", "Docs": "https://docs" },
        "versions": [ { "version": "VERSION_HERE", "status": "stable", "kicad_version": "6.0" } ]
    }"#;

    #[test]
    fn test_manifest_parse() {
        let manifest: AddonManifest = serde_json::from_str(MANIFEST).unwrap();
        assert_eq!(manifest.identifier, "com.github.example.addon");
        assert_eq!(manifest.versions.len(), 1);
        assert_eq!(manifest.homepage(), Some("https://old.example.com"));
        assert_eq!(manifest.get("type"), Some(&Value::from("plugin")));
    }

    #[test]
    fn test_stamp_updates_version_and_homepage() {
        let mut manifest: AddonManifest = serde_json::from_str(MANIFEST).unwrap();
        let version = ReleaseVersion::parse("1.2.3").unwrap();

        manifest
            .stamp(&version, "https://github.com/example/project")
            .unwrap();

        let entry = manifest.release_entry().unwrap();
        assert_eq!(entry.version(), "1.2.3");
        assert_eq!(entry.get("status"), Some(&Value::from("stable")));
        assert_eq!(manifest.homepage(), Some("https://github.com/example/project"));
        assert_eq!(
            manifest.get("resources").and_then(|r| r.get("Docs")),
            Some(&Value::from("https://docs"))
        );
    }

    #[test]
    fn test_stamped_manifest_keeps_key_order() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(MANIFEST_FILE);
        let mut manifest: AddonManifest = serde_json::from_str(MANIFEST).unwrap();
        let version = ReleaseVersion::parse("2.0").unwrap();

        manifest.stamp(&version, "https://github.com/example/project").unwrap();
        manifest.save(&path).unwrap();

        let saved: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let keys = |v: &Value| -> Vec<String> { v.as_object().unwrap().keys().cloned().collect() };
        assert_eq!(
            keys(&saved),
            vec!["$schema", "name", "identifier", "type", "resources", "versions"]
        );
        assert_eq!(keys(&saved["resources"]), vec!["homepage", "Docs"]);
        assert_eq!(
            keys(&saved["versions"][0]),
            vec!["version", "status", "kicad_version"]
        );
        assert_eq!(saved["versions"][0]["version"], "2.0");
    }

    #[test]
    fn test_stamp_adds_missing_homepage() {
        let mut manifest: AddonManifest = serde_json::from_str(
            r#"{ "identifier": "x", "resources": {}, "versions": [ { "version": "0" } ] }"#,
        )
        .unwrap();
        let version = ReleaseVersion::parse("1").unwrap();

        manifest.stamp(&version, "https://example.com").unwrap();
        assert_eq!(manifest.homepage(), Some("https://example.com"));
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(MANIFEST_FILE);
        let manifest: AddonManifest = serde_json::from_str(MANIFEST).unwrap();

        manifest.save(&path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\n  \"identifier\""));

        let loaded = AddonManifest::load(&path).unwrap();
        assert_eq!(loaded, manifest);
    }

    #[test]
    fn test_load_rejects_multiple_versions() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(MANIFEST_FILE);
        fs::write(
            &path,
            r#"{
                "identifier": "x",
                "resources": {},
                "versions": [ { "version": "1" }, { "version": "2" } ]
            }"#,
        )
        .unwrap();

        let err = AddonManifest::load(&path).unwrap_err();
        assert!(matches!(err, Error::InvalidManifest(_)));
        assert!(err.to_string().contains("found 2"));
    }

    #[test]
    fn test_load_rejects_missing_resources() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(MANIFEST_FILE);
        fs::write(&path, r#"{ "identifier": "x", "versions": [ { "version": "1" } ] }"#).unwrap();

        let err = AddonManifest::load(&path).unwrap_err();
        assert!(matches!(err, Error::InvalidManifest(_)));
        assert!(err.to_string().contains("resources"));
    }

    #[test]
    fn test_load_missing_manifest() {
        let temp = TempDir::new().unwrap();
        let err = AddonManifest::load(temp.path().join(MANIFEST_FILE)).unwrap_err();
        assert!(matches!(err, Error::MissingFile(_)));
    }
}
