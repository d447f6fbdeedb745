//! Addon packaging and resource bundling
//!
//! Turns each addon directory into a release archive:
//!
//! 1. Copy the addon's files into `build/src/<addon>/` (the manifest is rewritten, not copied)
//! 2. Stamp the manifest with the release version and homepage
//! 3. Zip the copy into `build/release/<addon>.zip`
//! 4. Measure install size, download size and download hash
//! 5. Append a version entry to the addon's registry record
//! 6. Stage the addon's `resources/` under `build/src/resources/<identifier>/`
//!
//! Once every addon is packaged, the staged resources are bundled into
//! `build/release/resources.zip`.

use crate::archive::zip_directory;
use crate::config::Config;
use crate::fsutil::{copy_dir_all, copy_files_except, directory_size, remove_dir_tree, sha256_file};
use crate::manifest::{AddonManifest, MANIFEST_FILE};
use crate::registry::{DownloadInfo, PackageRegistry, VersionEntry, PACKAGES_FILE};
use crate::repository::REPOSITORY_FILE;
use crate::version::ReleaseVersion;
use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Name of the per-addon resources directory and of the staging area
pub const RESOURCES_DIR: &str = "resources";

/// File name of the bundled resources archive
pub const RESOURCES_ZIP: &str = "resources.zip";

/// Directory layout of a build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildLayout {
    /// `build/`
    pub root: PathBuf,
    /// `build/src/`, stamped addon copies
    pub src: PathBuf,
    /// `build/src/resources/`, staged resources keyed by identifier
    pub resources: PathBuf,
    /// `build/release/`, everything that gets published
    pub release: PathBuf,
}

impl BuildLayout {
    pub fn new<P: AsRef<Path>>(build_path: P) -> Self {
        let root = build_path.as_ref().to_path_buf();
        let src = root.join("src");
        let resources = src.join(RESOURCES_DIR);
        let release = root.join("release");
        Self {
            root,
            src,
            resources,
            release,
        }
    }

    /// Delete any previous build and create the empty layout
    pub fn prepare(&self) -> Result<()> {
        if self.root.exists() {
            if !self.root.is_dir() {
                return Err(Error::Other(format!(
                    "Build path exists and is not a directory: {}",
                    self.root.display()
                )));
            }
            info!(path = %self.root.display(), "removing previous build");
            remove_dir_tree(&self.root)?;
        }

        fs::create_dir(&self.root)?;
        fs::create_dir(&self.src)?;
        fs::create_dir(&self.resources)?;
        fs::create_dir(&self.release)?;
        Ok(())
    }

    pub fn addon_dir(&self, addon_name: &str) -> PathBuf {
        self.src.join(addon_name)
    }

    pub fn addon_zip(&self, addon_name: &str) -> PathBuf {
        self.release.join(format!("{}.zip", addon_name))
    }

    pub fn resources_zip(&self) -> PathBuf {
        self.release.join(RESOURCES_ZIP)
    }
}

/// An addon directory in the source tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Addon {
    /// Directory name, also the archive name
    pub name: String,
    pub path: PathBuf,
}

impl Addon {
    pub fn manifest_path(&self) -> PathBuf {
        self.path.join(MANIFEST_FILE)
    }
}

/// List the addons under `addons_path`, sorted by directory name.
///
/// The registry files and any other non-directory entries are skipped.
pub fn discover_addons<P: AsRef<Path>>(addons_path: P) -> Result<Vec<Addon>> {
    let addons_path = addons_path.as_ref();
    let mut addons = Vec::new();

    for entry in fs::read_dir(addons_path)? {
        let entry = entry?;
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();

        if name == PACKAGES_FILE || name == REPOSITORY_FILE {
            continue;
        }
        if !path.is_dir() {
            debug!(path = %path.display(), "skipping non-directory entry");
            continue;
        }
        if name == RESOURCES_DIR {
            return Err(Error::InvalidAddon(format!(
                "an addon directory may not be named '{}': {}",
                RESOURCES_DIR,
                path.display()
            )));
        }

        addons.push(Addon { name, path });
    }

    addons.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(addons)
}

/// Result of packaging one addon
#[derive(Debug, Clone, PartialEq)]
pub struct PackagedAddon {
    pub name: String,
    pub identifier: String,
    pub zip_path: PathBuf,
    /// The entry appended to the registry
    pub entry: VersionEntry,
    pub download: DownloadInfo,
}

/// Packages addons for one release version into one build layout
pub struct Packager<'a> {
    config: &'a Config,
    version: &'a ReleaseVersion,
    layout: &'a BuildLayout,
}

impl<'a> Packager<'a> {
    pub fn new(config: &'a Config, version: &'a ReleaseVersion, layout: &'a BuildLayout) -> Self {
        Self {
            config,
            version,
            layout,
        }
    }

    /// Build, measure and register one addon.
    ///
    /// The registry is only touched after the archive exists, and a version
    /// that is already registered for the addon leaves the registry unchanged.
    pub fn package(&self, addon: &Addon, registry: &mut PackageRegistry) -> Result<PackagedAddon> {
        let target = self.layout.addon_dir(&addon.name);

        let copied = copy_files_except(&addon.path, &target, MANIFEST_FILE)?;
        debug!(addon = %addon.name, files = copied, "copied addon files");

        let mut manifest = AddonManifest::load(addon.manifest_path())?;
        validate_identifier(&manifest.identifier)?;
        manifest.stamp(self.version, self.config.repository_base())?;
        fs::create_dir_all(&target)?;
        manifest.save(target.join(MANIFEST_FILE))?;

        let zip_path = self.layout.addon_zip(&addon.name);
        zip_directory(&target, &zip_path)?;

        let install_size = directory_size(&target)?;
        let size = fs::metadata(&zip_path)?.len();
        let sha256 = sha256_file(&zip_path)?;
        let zip_name = format!("{}.zip", addon.name);

        let download = DownloadInfo {
            url: self.config.download_url(self.version.as_str(), &zip_name),
            sha256,
            size,
            install_size,
        };
        let entry = manifest.release_entry()?.with_download(download.clone());

        let record = registry.find_package_mut(&manifest.identifier)?;
        record.push_version(entry.clone())?;

        self.stage_resources(&target, &manifest.identifier)?;

        info!(
            addon = %addon.name,
            identifier = %manifest.identifier,
            size = download.size,
            install_size = download.install_size,
            "packaged addon"
        );

        Ok(PackagedAddon {
            name: addon.name.clone(),
            identifier: manifest.identifier,
            zip_path,
            entry,
            download,
        })
    }

    fn stage_resources(&self, addon_build_dir: &Path, identifier: &str) -> Result<()> {
        let source = addon_build_dir.join(RESOURCES_DIR);
        if !source.is_dir() {
            return Err(Error::MissingResources(source));
        }

        let target = self.layout.resources.join(identifier);
        if target.exists() {
            return Err(Error::StagingConflict(target));
        }

        copy_dir_all(&source, &target)
    }

    /// Zip every staged resource directory into `resources.zip`
    pub fn bundle_resources(&self) -> Result<PathBuf> {
        let zip_path = self.layout.resources_zip();
        let stats = zip_directory(&self.layout.resources, &zip_path)?;
        info!(files = stats.files, "bundled resources");
        Ok(zip_path)
    }
}

/// Identifiers name a staging directory, so they must be a single path component
pub fn validate_identifier(identifier: &str) -> Result<()> {
    let valid = !identifier.is_empty()
        && identifier != "."
        && identifier != ".."
        && !identifier.contains(['/', '\\']);

    if !valid {
        return Err(Error::InvalidManifest(format!(
            "invalid identifier '{}'",
            identifier
        )));
    }
    Ok(())
}
