//! Error types for pkgplan
//!
//! Domain-specific error types using thiserror.

use std::collections::BTreeSet;
use std::path::PathBuf;
use thiserror::Error;

use crate::core::unit::UnitId;

/// Manifest (PKGBUILD) interpretation errors
#[derive(Error, Debug)]
pub enum ManifestError {
    /// PKGBUILD not found in the unit directory
    #[error("PKGBUILD not found in '{path}'")]
    NotFound { path: PathBuf },

    /// The interpreter could not be started
    #[error("Failed to run bash for '{path}': {error}")]
    Spawn { path: PathBuf, error: String },

    /// The interpreter exited with an error
    #[error("Failed to source '{path}': {stderr}")]
    Interpreter { path: PathBuf, stderr: String },

    /// Interpreter output did not contain the expected fields
    #[error("PKGBUILD in '{path}' declares no pkgname")]
    MissingName { path: PathBuf },
}

/// Package archive metadata errors
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// IO or decompression failure while reading the archive
    #[error("Failed to read archive '{path}': {error}")]
    Read { path: PathBuf, error: String },

    /// The archive has no .PKGINFO member
    #[error("Archive '{path}' contains no .PKGINFO")]
    MissingPkgInfo { path: PathBuf },

    /// .PKGINFO has no pkgname entry
    #[error("Archive '{path}' has no pkgname in .PKGINFO")]
    MissingName { path: PathBuf },
}

/// Repository database errors
#[derive(Error, Debug)]
pub enum RepoDbError {
    /// IO or decompression failure while reading the database
    #[error("Failed to read repository database '{path}': {error}")]
    Read { path: PathBuf, error: String },
}

/// Download errors
#[derive(Error, Debug)]
pub enum DownloadError {
    /// Network error
    #[error("Network error downloading '{url}': {error}")]
    NetworkError { url: String, error: String },

    /// Server answered with a non-success status
    #[error("Download of '{url}' failed with HTTP status {status}")]
    HttpStatus { url: String, status: u16 },

    /// IO error
    #[error("IO error for '{path}': {error}")]
    IoError { path: PathBuf, error: String },

    /// Max retries exceeded
    #[error("Download failed after {retries} retries: {url}")]
    MaxRetriesExceeded { url: String, retries: u32 },
}

/// Filesystem errors
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to write file
    #[error("Failed to write file '{path}': {error}")]
    WriteFile { path: PathBuf, error: String },

    /// Failed to copy file
    #[error("Failed to copy '{from}' to '{to}': {error}")]
    CopyFile {
        from: PathBuf,
        to: PathBuf,
        error: String,
    },
}

/// Configuration file errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file '{path}': {error}")]
    ReadError { path: String, error: String },

    /// Failed to parse config file
    #[error("Failed to parse config file '{path}': {error}")]
    ParseError { path: String, error: String },
}

/// A dependency cycle found while leveling or computing depths
///
/// `members` are the units that lie on a cycle; `blocked` are units that
/// could not be scheduled only because they sit downstream of one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Circular dependency detected between {}", join_ids(.members))]
pub struct CycleError {
    /// Units on a dependency cycle
    pub members: BTreeSet<UnitId>,
    /// Units depending (transitively) on a cycle
    pub blocked: BTreeSet<UnitId>,
}

impl CycleError {
    /// All units left without a level, cycle members first
    pub fn unscheduled(&self) -> impl Iterator<Item = &UnitId> {
        self.members.iter().chain(self.blocked.iter())
    }
}

fn join_ids(ids: &BTreeSet<UnitId>) -> String {
    ids.iter()
        .map(UnitId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
