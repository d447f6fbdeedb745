//! addon-release - Release automation for plugin manager addon repositories
//!
//! Given a version string, addon-release packages every addon of a plugin
//! repository into a versioned, checksummed zip archive and updates the
//! package index the plugin manager reads:
//!
//! - Strict numeric-dotted release versions
//! - Manifests stamped with the release version and project homepage
//! - SHA-256 checksums, download sizes and install sizes for every archive
//! - Append-only package registry that refuses re-releasing a version
//! - One bundled archive of every addon's resources
//! - Repository index with hashes, timestamps and download URLs
//!
//! # Examples
//!
//! ```no_run
//! use addon_release::{Config, ReleaseVersion};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load(".")?;
//! let version = ReleaseVersion::parse("1.2.3")?;
//!
//! let summary = addon_release::release::run(".", &config, &version, None)?;
//! println!("Released {} addons", summary.addons.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`version`] - Release version validation
//! - [`fsutil`] - Tree removal, tree size, file hashing and copying
//! - [`archive`] - Zip archive creation
//! - [`manifest`] - Addon manifest (manifest.json) handling
//! - [`registry`] - Package registry (packages.json) and version entries
//! - [`repository`] - Repository index (repository.json)
//! - [`packager`] - Per-addon packaging and resource bundling
//! - [`release`] - Release orchestration
//! - [`config`] - Release configuration
//! - [`error`] - Error types and result handling

pub mod archive;
pub mod config;
pub mod error;
pub mod fsutil;
pub mod manifest;
pub mod packager;
pub mod registry;
pub mod release;
pub mod repository;
pub mod version;

pub use config::Config;
pub use error::{Error, Result};
pub use fsutil::{directory_size, remove_dir_tree, sha256_file};
pub use manifest::{AddonManifest, MANIFEST_FILE};
pub use packager::{discover_addons, Addon, BuildLayout, PackagedAddon, Packager};
pub use registry::{DownloadInfo, PackageRecord, PackageRegistry, VersionEntry, PACKAGES_FILE};
pub use release::{ProgressCallback, ReleaseSummary};
pub use repository::{AssetPointer, RepositoryIndex, UpdateTime, REPOSITORY_FILE};
pub use version::{is_valid_version, ReleaseVersion, VERSION_PATTERN};
