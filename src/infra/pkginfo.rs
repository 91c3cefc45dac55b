//! Package archive metadata
//!
//! Reads `.PKGINFO` out of `.pkg.tar.zst` archives by streaming them
//! through a zstd decoder into a tar reader.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::config::defaults::{ARCHIVE_SUFFIX, PKGINFO_MEMBER};
use crate::core::assets::Asset;
use crate::core::closure::ArchiveRecord;
use crate::core::unit::{strip_constraint, ParseFailure};
use crate::error::ArchiveError;

/// Archives found in a directory
#[derive(Debug, Default)]
pub struct ArchiveScan {
    /// Archives with readable metadata
    pub archives: Vec<ArchiveRecord>,
    /// Archives that could not be read
    pub failures: Vec<ParseFailure>,
}

/// Read the metadata of one package archive
pub fn read_archive(path: &Path) -> Result<ArchiveRecord, ArchiveError> {
    let read_err = |e: std::io::Error| ArchiveError::Read {
        path: path.to_path_buf(),
        error: e.to_string(),
    };

    let file = File::open(path).map_err(read_err)?;
    let decoder = zstd::Decoder::new(file).map_err(read_err)?;
    let mut archive = tar::Archive::new(decoder);

    for entry in archive.entries().map_err(read_err)? {
        let mut entry = entry.map_err(read_err)?;
        let is_pkginfo = entry
            .path()
            .map_err(read_err)?
            .to_str()
            .is_some_and(|p| p.trim_start_matches("./") == PKGINFO_MEMBER);
        if !is_pkginfo {
            continue;
        }

        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes).map_err(read_err)?;
        return parse_pkginfo(&String::from_utf8_lossy(&bytes), path);
    }

    Err(ArchiveError::MissingPkgInfo {
        path: path.to_path_buf(),
    })
}

/// Parse `.PKGINFO` content
///
/// `provides` and `depend` entries have their version constraints removed.
pub fn parse_pkginfo(content: &str, path: &Path) -> Result<ArchiveRecord, ArchiveError> {
    let mut name = None;
    let mut version = None;
    let mut provides = Vec::new();
    let mut dependencies = Vec::new();

    for line in content.lines() {
        let Some((key, value)) = line.split_once(" = ") else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "pkgname" => name = Some(value.to_string()),
            "pkgver" => version = Some(value.to_string()),
            "provides" => provides.push(strip_constraint(value).to_string()),
            "depend" => dependencies.push(strip_constraint(value).to_string()),
            _ => {}
        }
    }

    let name = name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ArchiveError::MissingName {
            path: path.to_path_buf(),
        })?;

    Ok(ArchiveRecord {
        path: path.to_path_buf(),
        name,
        version,
        provides,
        dependencies,
    })
}

/// Package archives directly inside `dir`, sorted by file name
pub fn list_archives(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_archive = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(ARCHIVE_SUFFIX));
        if is_archive && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Read every package archive in `dir`
pub fn scan_archives(dir: &Path) -> std::io::Result<ArchiveScan> {
    let paths = list_archives(dir)?;
    tracing::info!("Scanning {} archives in {}", paths.len(), dir.display());

    let mut scan = ArchiveScan::default();
    for path in paths {
        match read_archive(&path) {
            Ok(record) => scan.archives.push(record),
            Err(e) => {
                tracing::warn!("Failed to inspect {}: {}", path.display(), e);
                scan.failures.push(ParseFailure::new(path, e));
            }
        }
    }
    Ok(scan)
}

/// Read every package archive in `dir` as a release asset
///
/// Unreadable archives are kept in the list with no metadata.
pub fn scan_assets(dir: &Path) -> std::io::Result<Vec<Asset>> {
    let mut assets = Vec::new();
    for path in list_archives(dir)? {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let record = match read_archive(&path) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Could not read metadata from {file_name}: {e}");
                None
            }
        };
        assets.push(Asset { file_name, record });
    }
    Ok(assets)
}
