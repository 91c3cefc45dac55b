//! PKGBUILD interpretation
//!
//! PKGBUILDs are bash scripts, so the fields are read by letting bash
//! source the file and print the variables we need, one value per line,
//! between section markers.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::defaults::MANIFEST_FILE;
use crate::core::unit::ManifestRecord;
use crate::error::ManifestError;

const MARK_NAMES: &str = "@@pkgname";
const MARK_VERSION: &str = "@@version";
const MARK_DEPENDS: &str = "@@depends";
const MARK_MAKEDEPENDS: &str = "@@makedepends";

/// Bash snippet run inside the unit directory
const EXTRACT_SCRIPT: &str = r#"source ./PKGBUILD >/dev/null || true
printf '%s\n' '@@pkgname' "${pkgname[@]}" \
  '@@version' "${epoch:+${epoch}:}${pkgver}-${pkgrel}" \
  '@@depends' "${depends[@]}" \
  '@@makedepends' "${makedepends[@]}"
"#;

/// Read the manifest record of the unit in `dir`
pub fn read_manifest(dir: &Path) -> Result<ManifestRecord, ManifestError> {
    let manifest = dir.join(MANIFEST_FILE);
    if !manifest.is_file() {
        return Err(ManifestError::NotFound {
            path: dir.to_path_buf(),
        });
    }

    let bash = which::which("bash").unwrap_or_else(|_| PathBuf::from("bash"));
    let output = Command::new(bash)
        .arg("-c")
        .arg(EXTRACT_SCRIPT)
        .current_dir(dir)
        .output()
        .map_err(|e| ManifestError::Spawn {
            path: manifest.clone(),
            error: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(ManifestError::Interpreter {
            path: manifest,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let record = parse_sections(&String::from_utf8_lossy(&output.stdout));
    if record.names.is_empty() {
        return Err(ManifestError::MissingName { path: manifest });
    }
    Ok(record)
}

/// Parse the marker-delimited interpreter output
fn parse_sections(stdout: &str) -> ManifestRecord {
    let mut record = ManifestRecord::default();
    let mut section = None;

    for line in stdout.lines() {
        match line {
            MARK_NAMES | MARK_VERSION | MARK_DEPENDS | MARK_MAKEDEPENDS => {
                section = Some(line);
                continue;
            }
            _ => {}
        }
        let value = line.trim();
        if value.is_empty() {
            continue;
        }
        match section {
            Some(MARK_NAMES) => record.names.push(value.to_string()),
            Some(MARK_VERSION) => record.version = value.to_string(),
            Some(MARK_DEPENDS) => record.dependencies.push(value.to_string()),
            Some(MARK_MAKEDEPENDS) => record.build_dependencies.push(value.to_string()),
            _ => {}
        }
    }

    record
}
