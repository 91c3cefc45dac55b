//! Build units and their manifest records
//!
//! A unit is one package directory of the repository. A single directory
//! may produce several named outputs (split packages), all built together
//! and all sharing the unit's version.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Identifier of a unit: its directory relative to the repository root
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(String);

impl UnitId {
    /// Create an identifier from a relative directory
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Create an identifier from a path, using `/` as separator on every platform
    pub fn from_path(path: &Path) -> Self {
        let parts: Vec<_> = path
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Self(parts.join("/"))
    }

    /// Borrow the identifier as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UnitId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Fields extracted from a unit's PKGBUILD by the manifest interpreter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestRecord {
    /// Output package names (`pkgname`)
    pub names: Vec<String>,
    /// Full version string (`epoch:pkgver-pkgrel`)
    pub version: String,
    /// Runtime dependencies (`depends`)
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Build dependencies (`makedepends`)
    #[serde(default)]
    pub build_dependencies: Vec<String>,
}

/// One buildable directory of the repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    /// Directory identifier
    pub id: UnitId,
    /// Output names in declaration order
    pub names: Vec<String>,
    /// Version shared by all outputs
    pub version: String,
    /// Raw dependency strings, runtime and build, deduplicated
    pub dependencies: BTreeSet<String>,
}

impl Unit {
    /// Build a unit from its identifier and manifest record
    pub fn from_record(id: UnitId, record: ManifestRecord) -> Self {
        let dependencies = record
            .dependencies
            .into_iter()
            .chain(record.build_dependencies)
            .collect();

        Self {
            id,
            names: record.names,
            version: record.version,
            dependencies,
        }
    }

    /// Dependency names with version constraints removed
    pub fn bare_dependencies(&self) -> impl Iterator<Item = &str> {
        self.dependencies.iter().map(|d| strip_constraint(d))
    }
}

/// A manifest or archive that could not be read and was left out
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseFailure {
    /// File or directory that failed
    pub source: PathBuf,
    /// Error description
    pub reason: String,
}

impl ParseFailure {
    /// Record a failure for `source`
    pub fn new(source: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        Self {
            source: source.into(),
            reason: reason.to_string(),
        }
    }
}

/// Strip a trailing version constraint from a dependency string
///
/// Everything from the first `<`, `>` or `=` onward is removed, so
/// `glibc>=2.38` and `foo=1.0-1` become `glibc` and `foo`.
pub fn strip_constraint(dep: &str) -> &str {
    dep.find(['<', '>', '='])
        .map_or(dep, |idx| &dep[..idx])
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_constraint() {
        assert_eq!(strip_constraint("glibc"), "glibc");
        assert_eq!(strip_constraint("glibc>=2.38"), "glibc");
        assert_eq!(strip_constraint("qt6-base<7"), "qt6-base");
        assert_eq!(strip_constraint("foo=1.0-1"), "foo");
        assert_eq!(strip_constraint("bar<=>3"), "bar");
    }

    #[test]
    fn test_from_record_merges_dependencies() {
        let record = ManifestRecord {
            names: vec!["app".to_string()],
            version: "1.0-1".to_string(),
            dependencies: vec!["libfoo".to_string(), "libbar>=2".to_string()],
            build_dependencies: vec!["cmake".to_string(), "libfoo".to_string()],
        };

        let unit = Unit::from_record(UnitId::new("app"), record);

        assert_eq!(unit.dependencies.len(), 3);
        let bare: BTreeSet<_> = unit.bare_dependencies().collect();
        assert!(bare.contains("libbar"));
        assert!(bare.contains("cmake"));
    }

    #[test]
    fn test_unit_id_from_nested_path() {
        let id = UnitId::from_path(Path::new("qt/qtutilities"));
        assert_eq!(id.as_str(), "qt/qtutilities");
    }
}
