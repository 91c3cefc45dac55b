//! Filesystem operations
//!
//! Handles file and directory operations.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::FilesystemError;

/// Create a directory and all parent directories
pub fn create_dir_all(path: &Path) -> Result<(), FilesystemError> {
    std::fs::create_dir_all(path).map_err(|e| FilesystemError::CreateDir {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Write content to a file
pub fn write_file(path: &Path, content: &str) -> Result<(), FilesystemError> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    std::fs::write(path, content).map_err(|e| FilesystemError::WriteFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Append content to a file, creating it if needed
pub fn append_file(path: &Path, content: &str) -> Result<(), FilesystemError> {
    let write_err = |e: std::io::Error| FilesystemError::WriteFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    };
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(write_err)?;
    file.write_all(content.as_bytes()).map_err(write_err)
}

/// Copy files into a directory, keeping their file names
pub fn copy_into<'a>(
    files: impl IntoIterator<Item = &'a Path>,
    dir: &Path,
) -> Result<Vec<PathBuf>, FilesystemError> {
    create_dir_all(dir)?;
    let mut copied = Vec::new();
    for from in files {
        let Some(name) = from.file_name() else {
            continue;
        };
        let to = dir.join(name);
        std::fs::copy(from, &to).map_err(|e| FilesystemError::CopyFile {
            from: from.to_path_buf(),
            to: to.clone(),
            error: e.to_string(),
        })?;
        copied.push(to);
    }
    Ok(copied)
}

/// Write lines, one per line with a trailing newline, to a file
pub fn write_lines(path: &Path, lines: &[String]) -> Result<(), FilesystemError> {
    let content: String = lines.iter().map(|l| format!("{l}\n")).collect();
    write_file(path, &content)
}
