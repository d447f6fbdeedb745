use std::path::PathBuf;
use thiserror::Error;

use crate::version::VERSION_PATTERN;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialize error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Directory traversal error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("Path error: {0}")]
    StripPrefix(#[from] std::path::StripPrefixError),

    #[error("Version must match regex '{}' (got '{version}')", VERSION_PATTERN)]
    InvalidVersion { version: String },

    #[error("Required file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("Package '{0}' not found in packages.json\n\n\
             Hint: Every addon needs exactly one entry in addons/packages.json\n\
             whose \"identifier\" matches the addon's manifest.json.")]
    PackageNotFound(String),

    #[error("Package '{identifier}' is listed {matches} times in packages.json; expected exactly one entry")]
    AmbiguousPackage { identifier: String, matches: usize },

    #[error("Version already present! You can only release a new version. \
             ('{identifier}' already has version {version})")]
    VersionConflict { identifier: String, version: String },

    #[error("Addon has no resources directory: {}", .0.display())]
    MissingResources(PathBuf),

    #[error("Resource staging directory already exists: {}", .0.display())]
    StagingConflict(PathBuf),

    #[error("Invalid addon: {0}")]
    InvalidAddon(String),

    #[error("{0}")]
    Other(String),
}
