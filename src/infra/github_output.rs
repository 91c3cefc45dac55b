//! CI step outputs
//!
//! GitHub Actions collects step outputs from the file named by
//! `$GITHUB_OUTPUT`, one `key=value` line each.

use std::path::{Path, PathBuf};

use crate::config::defaults::ENV_OUTPUT;
use crate::error::FilesystemError;
use crate::infra::filesystem;

/// The output file named by the environment, if any
pub fn output_file() -> Option<PathBuf> {
    std::env::var_os(ENV_OUTPUT)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Append `content` to the environment's output file
///
/// Returns `false` when no output file is configured (outside CI).
pub fn publish(content: &str) -> Result<bool, FilesystemError> {
    match output_file() {
        Some(path) => {
            publish_to(&path, content)?;
            Ok(true)
        }
        None => {
            tracing::debug!("{ENV_OUTPUT} not set; skipping step outputs");
            Ok(false)
        }
    }
}

/// Append `content` to a specific output file
pub fn publish_to(path: &Path, content: &str) -> Result<(), FilesystemError> {
    tracing::debug!("Writing step outputs to {}", path.display());
    filesystem::append_file(path, content)
}

/// Render one `key=<json>` line
pub fn line<T: serde::Serialize + ?Sized>(key: &str, value: &T) -> Result<String, serde_json::Error> {
    Ok(format!("{key}={}\n", serde_json::to_string(value)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_line_renders_compact_json() {
        assert_eq!(line("levels", &[1, 2]).unwrap(), "levels=[1,2]\n");
    }

    #[test]
    fn test_publish_to_appends() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("github_output");
        std::fs::write(&path, "existing=1\n").unwrap();

        publish_to(&path, "deleted=[]\n").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "existing=1\ndeleted=[]\n");
    }
}
