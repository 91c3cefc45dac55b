//! Dependency closure over locally built archives
//!
//! Given the direct dependencies of one unit, finds every locally available
//! package archive needed to satisfy them, following the dependencies
//! declared inside each archive. Names without a local archive are assumed
//! to come from the base system and are skipped.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use crate::core::unit::strip_constraint;

/// Metadata of one built package archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveRecord {
    /// Archive file
    pub path: PathBuf,
    /// Package name (`pkgname`)
    pub name: String,
    /// Package version (`pkgver`), if declared
    pub version: Option<String>,
    /// Alias names the package satisfies, constraints stripped
    #[serde(default)]
    pub provides: Vec<String>,
    /// Declared runtime dependencies, constraints stripped
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl ArchiveRecord {
    /// File name of the archive
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
}

/// Archives indexed by package name and by every provided alias
#[derive(Debug, Clone, Default)]
pub struct ArchiveIndex {
    archives: Vec<ArchiveRecord>,
    by_name: HashMap<String, usize>,
}

impl ArchiveIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Index a pool of archives
    ///
    /// When several archives claim a name, the one added last wins.
    pub fn from_archives(archives: impl IntoIterator<Item = ArchiveRecord>) -> Self {
        let mut index = Self::new();
        for archive in archives {
            index.insert(archive);
        }
        index
    }

    /// Add an archive under its name and all of its aliases
    pub fn insert(&mut self, archive: ArchiveRecord) {
        let slot = self.archives.len();
        self.by_name.insert(archive.name.clone(), slot);
        for alias in &archive.provides {
            self.by_name
                .insert(strip_constraint(alias).to_string(), slot);
        }
        self.archives.push(archive);
    }

    /// Archive satisfying `name`
    pub fn get(&self, name: &str) -> Option<&ArchiveRecord> {
        self.by_name.get(name).map(|&slot| &self.archives[slot])
    }

    /// Number of indexed archives
    pub fn len(&self) -> usize {
        self.archives.len()
    }

    /// Check if the index holds no archives
    pub fn is_empty(&self) -> bool {
        self.archives.is_empty()
    }
}

/// Resolve the archive files needed for `direct_deps`
///
/// Breadth-first over dependency names; each name is looked up once and
/// each archive file is selected at most once, however many aliases lead
/// to it.
pub fn resolve<S: AsRef<str>>(index: &ArchiveIndex, direct_deps: &[S]) -> BTreeSet<PathBuf> {
    let mut queue: VecDeque<String> = direct_deps
        .iter()
        .map(|d| strip_constraint(d.as_ref()).to_string())
        .collect();
    let mut checked: HashSet<String> = HashSet::new();
    let mut selected: BTreeSet<PathBuf> = BTreeSet::new();

    while let Some(name) = queue.pop_front() {
        if !checked.insert(name.clone()) {
            continue;
        }
        let Some(archive) = index.get(&name) else {
            tracing::debug!("'{name}' has no local archive, assuming base system");
            continue;
        };
        if selected.insert(archive.path.clone()) {
            tracing::info!("Found dependency: {} -> {}", name, display_name(&archive.path));
            queue.extend(
                archive
                    .dependencies
                    .iter()
                    .map(|d| strip_constraint(d).to_string()),
            );
        }
    }

    selected
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}
