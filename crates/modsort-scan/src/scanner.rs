//! Source directory scanning.

use std::fs;
use std::path::{Path, PathBuf};

use modsort_core::{ModRecord, ModSource};
use modsort_resolver::Scanner;
use modsort_util::errors::ModsortError;

use crate::about::parse_about;

/// Folder names that live inside a mod rather than being mods themselves.
const CONTENT_FOLDERS: &[&str] = &[
    "about",
    "assemblies",
    "defs",
    "languages",
    "patches",
    "sounds",
    "textures",
    "source",
    "news",
    "common",
    "loadfolders",
    "1.0",
    "1.1",
    "1.2",
    "1.3",
    "1.4",
    "1.5",
    "v1.0",
    "v1.1",
    "v1.2",
    "v1.3",
    "v1.4",
    "v1.5",
];

/// Descriptor locations relative to a mod folder, in lookup order.
const DESCRIPTOR_PATHS: &[&str] = &["About/About.xml", "About/about.xml", "about.xml"];

/// Scans the immediate sub-directories of a source directory for mods that
/// carry an `About.xml` descriptor.
#[derive(Debug, Clone, Copy, Default)]
pub struct AboutXmlScanner;

impl AboutXmlScanner {
    pub fn new() -> Self {
        Self
    }

    /// Read the mod folder at `folder`. Returns `Ok(None)` when the folder has
    /// no descriptor. The source kind is taken from the folder's location.
    pub fn read_mod(&self, folder: &Path) -> miette::Result<Option<ModRecord>> {
        let Some(descriptor) = find_descriptor(folder) else {
            return Ok(None);
        };
        let bytes = fs::read(&descriptor).map_err(ModsortError::Io)?;
        let xml = String::from_utf8_lossy(&bytes);
        let about = parse_about(&xml).map_err(|e| {
            miette::Report::from(ModsortError::Scan {
                message: format!("{}: {e}", descriptor.display()),
            })
        })?;
        Ok(about
            .into_record(folder)
            .map(|record| record.with_source(classify(folder))))
    }
}

impl Scanner for AboutXmlScanner {
    fn scan(&self, dir: &Path) -> Vec<ModRecord> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Cannot read source directory {}: {e}", dir.display());
                return Vec::new();
            }
        };

        let mut folders: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_dir() && is_candidate(path))
            .collect();
        folders.sort();

        let mut records = Vec::new();
        for folder in folders {
            match self.read_mod(&folder) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => tracing::debug!("No About.xml in {}, skipping", folder.display()),
                Err(e) => tracing::warn!("Skipping {}: {e}", folder.display()),
            }
        }
        records
    }
}

fn is_candidate(path: &Path) -> bool {
    let Some(name) = path.file_name().map(|n| n.to_string_lossy()) else {
        return false;
    };
    !name.starts_with('.') && !CONTENT_FOLDERS.contains(&name.to_lowercase().as_str())
}

/// Game content lives in the install's `Data/` folder. Workshop folders are
/// named by their numeric item id or carry `About/PublishedFileId.txt`.
fn classify(folder: &Path) -> ModSource {
    let in_data = folder
        .parent()
        .and_then(Path::file_name)
        .is_some_and(|name| name.eq_ignore_ascii_case("data"));
    if in_data {
        return ModSource::Game;
    }
    let numeric = folder
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()));
    if numeric || folder.join("About").join("PublishedFileId.txt").is_file() {
        ModSource::Workshop
    } else {
        ModSource::Local
    }
}

fn find_descriptor(folder: &Path) -> Option<PathBuf> {
    DESCRIPTOR_PATHS
        .iter()
        .map(|rel| folder.join(rel))
        .find(|path| path.is_file())
}
