//! Zip archive creation
//!
//! Archives hold the *contents* of a directory: entry names are relative to
//! the archived directory and always use `/` separators, matching what the
//! plugin manager expects when it unpacks an addon.

use crate::Result;
use std::fs::{self, File};
use std::io;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Summary of a written archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveStats {
    /// Number of file entries written
    pub files: usize,
    /// Number of directory entries written
    pub directories: usize,
}

/// Zip the contents of `source_dir` into `zip_path`.
///
/// Any existing file at `zip_path` is replaced. Entries are added in file
/// name order so the same tree always produces the same entry order.
pub fn zip_directory<P: AsRef<Path>, Q: AsRef<Path>>(
    source_dir: P,
    zip_path: Q,
) -> Result<ArchiveStats> {
    let source_dir = source_dir.as_ref();
    let zip_path = zip_path.as_ref();

    if let Some(parent) = zip_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let file = File::create(zip_path)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut stats = ArchiveStats {
        files: 0,
        directories: 0,
    };

    for entry in WalkDir::new(source_dir).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let relative = entry.path().strip_prefix(source_dir)?;
        let name = archive_name(relative);

        if entry.file_type().is_dir() {
            zip.add_directory(format!("{}/", name), options)?;
            stats.directories += 1;
        } else if entry.file_type().is_file() {
            zip.start_file(name, options)?;
            let mut source = File::open(entry.path())?;
            io::copy(&mut source, &mut zip)?;
            stats.files += 1;
        } else {
            debug!(path = %entry.path().display(), "skipping non-regular file");
        }
    }

    zip.finish()?;

    debug!(
        archive = %zip_path.display(),
        files = stats.files,
        directories = stats.directories,
        "wrote zip archive"
    );
    Ok(stats)
}

fn archive_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    #[test]
    fn test_zip_directory_contents_are_relative() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("addon");
        fs::create_dir_all(source.join("resources")).unwrap();
        fs::write(source.join("manifest.json"), b"{\"a\": 1}").unwrap();
        fs::write(source.join("resources/icon.png"), b"png-bytes").unwrap();

        let zip_path = temp.path().join("out/addon.zip");
        let stats = zip_directory(&source, &zip_path).unwrap();
        assert_eq!(stats.files, 2);
        assert_eq!(stats.directories, 1);

        let mut archive = zip::ZipArchive::new(File::open(&zip_path).unwrap()).unwrap();
        let mut names: Vec<String> = archive.file_names().map(String::from).collect();
        names.sort();
        assert_eq!(names, vec!["manifest.json", "resources/", "resources/icon.png"]);

        let mut content = String::new();
        archive
            .by_name("resources/icon.png")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "png-bytes");
    }

    #[test]
    fn test_zip_empty_directory() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("empty");
        fs::create_dir_all(&source).unwrap();

        let zip_path = temp.path().join("empty.zip");
        let stats = zip_directory(&source, &zip_path).unwrap();
        assert_eq!(stats.files, 0);

        let archive = zip::ZipArchive::new(File::open(&zip_path).unwrap()).unwrap();
        assert_eq!(archive.len(), 0);
    }
}
