//! Release orchestration
//!
//! Runs the whole release for one version:
//!
//! 1. Load `packages.json` and `repository.json` from the addons directory
//! 2. Check every addon up front (manifest shape, registry match, version not yet released)
//! 3. Recreate the build directory
//! 4. Package each addon (see [`crate::packager`])
//! 5. Bundle the staged resources
//! 6. Write the registry and the repository index to `build/release/` and back
//!    into the addons directory
//!
//! Nothing in the addons directory is written before step 6, so a failed run
//! only ever leaves a partial `build/` behind.

use crate::config::Config;
use crate::fsutil::sha256_file;
use crate::manifest::AddonManifest;
use crate::packager::{discover_addons, Addon, BuildLayout, PackagedAddon, Packager, RESOURCES_ZIP};
use crate::registry::{PackageRegistry, PACKAGES_FILE};
use crate::repository::{AssetPointer, RepositoryIndex, UpdateTime, REPOSITORY_FILE};
use crate::version::ReleaseVersion;
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Progress callback for release steps
///
/// Called with:
/// - `message`: Description of the current step (e.g., "Packaging my_addon")
/// - `current`: Number of addons finished so far
/// - `total`: Number of addons in the release
pub type ProgressCallback = Arc<dyn Fn(&str, u64, u64) + Send + Sync>;

/// Everything a finished release produced
#[derive(Debug, Clone)]
pub struct ReleaseSummary {
    pub version: ReleaseVersion,
    pub layout: BuildLayout,
    pub addons: Vec<PackagedAddon>,
    pub resources_zip: PathBuf,
    /// Pointer written to `repository.json` for the package registry
    pub packages: AssetPointer,
    /// Pointer written to `repository.json` for the resources bundle
    pub resources: AssetPointer,
}

/// Check that every addon can be released as `version` before anything is built.
///
/// Fails on the first addon whose manifest is malformed, whose identifier does
/// not match exactly one registry record, or which already has `version`.
pub fn preflight(addons: &[Addon], registry: &PackageRegistry, version: &ReleaseVersion) -> Result<()> {
    for addon in addons {
        let manifest = AddonManifest::load(addon.manifest_path())?;
        let record = registry.find_package(&manifest.identifier)?;

        if record.has_version(version.as_str()) {
            return Err(Error::VersionConflict {
                identifier: manifest.identifier,
                version: version.to_string(),
            });
        }
    }

    Ok(())
}

/// Release `version` of every addon under `project_root`
pub fn run<P: AsRef<Path>>(
    project_root: P,
    config: &Config,
    version: &ReleaseVersion,
    progress: Option<ProgressCallback>,
) -> Result<ReleaseSummary> {
    let project_root = project_root.as_ref();
    let addons_path = config.addons_path(project_root);
    let packages_src = addons_path.join(PACKAGES_FILE);
    let repository_src = addons_path.join(REPOSITORY_FILE);

    let mut registry = PackageRegistry::load(&packages_src)?;
    let mut index = RepositoryIndex::load(&repository_src)?;

    let addons = discover_addons(&addons_path)?;
    if addons.is_empty() {
        warn!(path = %addons_path.display(), "no addons found");
    }
    preflight(&addons, &registry, version)?;

    let layout = BuildLayout::new(config.build_path(project_root));
    layout.prepare()?;
    info!(version = %version, addons = addons.len(), "starting release");

    let packager = Packager::new(config, version, &layout);
    let total = addons.len() as u64;
    let mut packaged = Vec::with_capacity(addons.len());

    for (idx, addon) in addons.iter().enumerate() {
        if let Some(ref cb) = progress {
            cb(&format!("Packaging {}", addon.name), idx as u64, total);
        }
        packaged.push(packager.package(addon, &mut registry)?);
    }

    if let Some(ref cb) = progress {
        cb("Bundling resources", total, total);
    }
    let resources_zip = packager.bundle_resources()?;

    let packages_release = layout.release.join(PACKAGES_FILE);
    registry.save(&packages_release)?;
    registry.save(&packages_src)?;

    let update_time = UpdateTime::now();
    let packages = AssetPointer::new(
        sha256_file(&packages_release)?,
        &update_time,
        config.download_url(version.as_str(), PACKAGES_FILE),
    );
    let resources = AssetPointer::new(
        sha256_file(&resources_zip)?,
        &update_time,
        config.download_url(version.as_str(), RESOURCES_ZIP),
    );
    index.set_packages(packages.clone());
    index.set_resources(resources.clone());

    index.save(layout.release.join(REPOSITORY_FILE))?;
    index.save(&repository_src)?;

    info!(
        version = %version,
        build = %layout.root.display(),
        "release written"
    );

    Ok(ReleaseSummary {
        version: version.clone(),
        layout,
        addons: packaged,
        resources_zip,
        packages,
        resources,
    })
}
