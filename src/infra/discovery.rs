//! Unit discovery
//!
//! Walks the repository for PKGBUILD files and turns each directory into a
//! unit. Directories whose PKGBUILD cannot be interpreted are reported and
//! left out.

use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::config::defaults::{DEPS_DIR, MANIFEST_FILE};
use crate::core::unit::{ParseFailure, Unit, UnitId};
use crate::infra::pkgbuild;

/// Units found in a repository
#[derive(Debug, Default)]
pub struct UnitScan {
    /// Successfully interpreted units, sorted by id
    pub units: Vec<Unit>,
    /// Directories whose manifest could not be read
    pub failures: Vec<ParseFailure>,
}

fn is_skipped(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.') || name == DEPS_DIR)
}

/// Directories below `root` containing a PKGBUILD, relative to `root`
///
/// The root itself is never a unit.
pub fn find_unit_dirs(root: &Path) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !is_skipped(e))
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file() && e.file_name() == MANIFEST_FILE)
        .filter_map(|e| {
            let parent = e.path().parent()?;
            let rel = parent.strip_prefix(root).ok()?;
            (!rel.as_os_str().is_empty()).then(|| rel.to_path_buf())
        })
        .collect();
    dirs.sort();
    dirs
}

/// Interpret every unit of the repository
pub fn scan_units(root: &Path) -> UnitScan {
    let mut scan = UnitScan::default();

    for rel in find_unit_dirs(root) {
        match pkgbuild::read_manifest(&root.join(&rel)) {
            Ok(record) => {
                tracing::debug!("Parsed {}: {:?}", rel.display(), record.names);
                scan.units.push(Unit::from_record(UnitId::from_path(&rel), record));
            }
            Err(e) => {
                tracing::warn!("Skipping {}: {}", rel.display(), e);
                scan.failures.push(ParseFailure::new(rel, e));
            }
        }
    }

    tracing::info!(
        "Found {} units ({} unreadable)",
        scan.units.len(),
        scan.failures.len()
    );
    scan
}
