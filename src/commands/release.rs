use addon_release::fsutil::format_size;
use addon_release::{Config, ProgressCallback, ReleaseVersion};
use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

/// Create an indicatif-based progress callback for CLI display
fn create_progress_callback() -> (ProgressBar, ProgressCallback) {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░ ")
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );

    let pb_clone = pb.clone();
    let callback: ProgressCallback = Arc::new(move |msg: &str, current: u64, total: u64| {
        pb_clone.set_length(total);
        pb_clone.set_position(current);
        pb_clone.set_message(msg.to_string());
    });

    (pb, callback)
}

pub fn run(version: String, project_root: Option<String>) -> Result<()> {
    // Validate before touching anything on disk
    let version = ReleaseVersion::parse(&version)?;

    let project_root = if let Some(p) = project_root {
        PathBuf::from(p)
    } else {
        env::current_dir()?
    };

    if !project_root.is_dir() {
        anyhow::bail!(
            "Project root does not exist: {}",
            project_root.display()
        );
    }

    let config = Config::load(&project_root)?;

    println!("Releasing version {}...", version);
    println!("  Project: {}", project_root.display());
    println!("  Repository: {}", config.repository_base());
    println!();

    let (pb, progress) = create_progress_callback();
    let result = addon_release::release::run(&project_root, &config, &version, Some(progress));
    pb.finish_and_clear();
    let summary = result?;

    for addon in &summary.addons {
        println!("  ✓ {} ({})", addon.name, addon.identifier);
        println!("    Archive: {}", addon.zip_path.display());
        println!(
            "    Size: {} (installed {})",
            format_size(addon.download.size),
            format_size(addon.download.install_size)
        );
        println!("    Checksum: {}", addon.download.sha256);
    }
    if summary.addons.is_empty() {
        println!("  ⚠ No addons found in {}", config.addons_path(&project_root).display());
    }
    println!();
    println!("  Resources: {}", summary.resources_zip.display());
    println!("  Packages checksum: {}", summary.packages.sha256);
    println!("  Updated: {} UTC", summary.packages.update_time_utc);
    println!();
    println!(
        "Built release. See output in {}",
        summary.layout.root.display()
    );

    Ok(())
}
