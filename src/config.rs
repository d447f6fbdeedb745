//! Release configuration
//!
//! Configuration is optional and stored in TOML format at
//! `<project root>/release.toml`. Every field has a default, so a project
//! without a config file releases with the stock repository URL and the
//! `addons/` -> `build/` layout.
//!
//! # Examples
//!
//! ```no_run
//! use addon_release::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load(".")?;
//! println!("Repository URL: {}", config.repository_url);
//! println!("Addons: {}", config.addons_path(".").display());
//! # Ok(())
//! # }
//! ```

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Config file name looked up in the project root
pub const CONFIG_FILE: &str = "release.toml";

/// Environment variable holding an explicit config file path
pub const CONFIG_ENV: &str = "ADDON_RELEASE_CONFIG";

/// Environment variable overriding `repository_url`
pub const REPOSITORY_URL_ENV: &str = "ADDON_RELEASE_REPOSITORY_URL";

/// Project repository the release assets are published under
pub const DEFAULT_REPOSITORY_URL: &str = "https://github.com/Bouni/kicad-jlcpcb-tools";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Repository URL used for manifest homepages and download links
    #[serde(default = "default_repository_url")]
    pub repository_url: String,

    /// Directory layout, relative to the project root
    #[serde(default)]
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding one subdirectory per addon plus the registry files
    #[serde(default = "default_addons_dir")]
    pub addons_dir: PathBuf,

    /// Output directory, recreated on every run
    #[serde(default = "default_build_dir")]
    pub build_dir: PathBuf,
}

fn default_repository_url() -> String {
    DEFAULT_REPOSITORY_URL.to_string()
}

fn default_addons_dir() -> PathBuf {
    PathBuf::from("addons")
}

fn default_build_dir() -> PathBuf {
    PathBuf::from("build")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            addons_dir: default_addons_dir(),
            build_dir: default_build_dir(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repository_url: default_repository_url(),
            paths: PathsConfig::default(),
        }
    }
}

impl Config {
    /// Config file path for a project
    ///
    /// Uses ADDON_RELEASE_CONFIG if set, otherwise `<project_root>/release.toml`
    pub fn default_path<P: AsRef<Path>>(project_root: P) -> PathBuf {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }

        project_root.as_ref().join(CONFIG_FILE)
    }

    /// Load config for a project, falling back to defaults when no file exists
    ///
    /// Environment variable overrides:
    /// - `ADDON_RELEASE_CONFIG`: Overrides the config file location
    /// - `ADDON_RELEASE_REPOSITORY_URL`: Overrides `repository_url`
    pub fn load<P: AsRef<Path>>(project_root: P) -> Result<Self> {
        let path = Self::default_path(project_root);
        let mut config = Self::load_file(&path)?;

        if let Ok(url) = std::env::var(REPOSITORY_URL_ENV) {
            if !url.is_empty() {
                config.repository_url = url;
            }
        }

        Ok(config)
    }

    /// Load config from a specific file, or defaults if it doesn't exist
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Repository URL without a trailing slash
    pub fn repository_base(&self) -> &str {
        self.repository_url.trim_end_matches('/')
    }

    /// Download URL of a release asset
    pub fn download_url(&self, version: &str, file_name: &str) -> String {
        format!(
            "{}/releases/download/{}/{}",
            self.repository_base(),
            version,
            file_name
        )
    }

    pub fn addons_path<P: AsRef<Path>>(&self, project_root: P) -> PathBuf {
        project_root.as_ref().join(&self.paths.addons_dir)
    }

    pub fn build_path<P: AsRef<Path>>(&self, project_root: P) -> PathBuf {
        project_root.as_ref().join(&self.paths.build_dir)
    }
}
