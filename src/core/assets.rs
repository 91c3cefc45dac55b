//! Release asset cleanup
//!
//! Decides which archives of a published release still match the desired
//! package set. Anything unreadable, retired or built for another version
//! is deleted together with its detached signature.

use serde::Serialize;

use crate::core::closure::ArchiveRecord;
use crate::core::reconcile::DesiredState;

/// Suffix of detached signature files
pub const SIGNATURE_SUFFIX: &str = ".sig";

/// A release asset and what could be read from it
#[derive(Debug, Clone)]
pub struct Asset {
    /// File name within the release
    pub file_name: String,
    /// Parsed metadata, or `None` if the archive could not be read
    pub record: Option<ArchiveRecord>,
}

/// Why an asset is deleted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DeleteReason {
    /// Archive metadata could not be read
    Unreadable,
    /// Package is no longer part of the repository
    Retired {
        /// Package name
        name: String,
    },
    /// Archive carries an outdated version
    Outdated {
        /// Package name
        name: String,
        /// Version found in the archive
        found: Option<String>,
        /// Version the repository wants
        expected: String,
    },
}

/// Keep and delete lists for a release
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssetPlan {
    /// Asset file names to keep, signatures included
    pub keep: Vec<String>,
    /// Asset file names to delete, signatures included
    pub delete: Vec<String>,
}

/// Decide the fate of every asset against the desired versions
pub fn reconcile_assets(target: &DesiredState, assets: &[Asset]) -> AssetPlan {
    let mut plan = AssetPlan::default();

    for asset in assets {
        let signature = format!("{}{SIGNATURE_SUFFIX}", asset.file_name);
        match check(target, asset) {
            None => {
                tracing::info!("{}: up to date", asset.file_name);
                plan.keep.push(asset.file_name.clone());
                plan.keep.push(signature);
            }
            Some(reason) => {
                tracing::info!("{}: deleting ({reason:?})", asset.file_name);
                plan.delete.push(asset.file_name.clone());
                plan.delete.push(signature);
            }
        }
    }

    tracing::info!(
        "{} assets to keep, {} assets to delete",
        plan.keep.len(),
        plan.delete.len()
    );
    plan
}

fn check(target: &DesiredState, asset: &Asset) -> Option<DeleteReason> {
    let Some(record) = &asset.record else {
        return Some(DeleteReason::Unreadable);
    };
    let Some(expected) = target.get(&record.name) else {
        return Some(DeleteReason::Retired {
            name: record.name.clone(),
        });
    };
    if record.version.as_deref() == Some(expected) {
        None
    } else {
        Some(DeleteReason::Outdated {
            name: record.name.clone(),
            found: record.version.clone(),
            expected: expected.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::reconcile::VersionMap;
    use std::path::PathBuf;

    fn asset(file: &str, name: Option<(&str, &str)>) -> Asset {
        Asset {
            file_name: file.to_string(),
            record: name.map(|(n, v)| ArchiveRecord {
                path: PathBuf::from(file),
                name: n.to_string(),
                version: Some(v.to_string()),
                provides: Vec::new(),
                dependencies: Vec::new(),
            }),
        }
    }

    fn target(pairs: &[(&str, &str)]) -> DesiredState {
        pairs
            .iter()
            .map(|(n, v)| ((*n).to_string(), (*v).to_string()))
            .collect::<VersionMap>()
            .into()
    }

    #[test]
    fn test_keep_matching_version() {
        let plan = reconcile_assets(
            &target(&[("foo", "1.0-1")]),
            &[asset("foo-1.0-1-x86_64.pkg.tar.zst", Some(("foo", "1.0-1")))],
        );
        assert_eq!(
            plan.keep,
            vec![
                "foo-1.0-1-x86_64.pkg.tar.zst".to_string(),
                "foo-1.0-1-x86_64.pkg.tar.zst.sig".to_string()
            ]
        );
        assert!(plan.delete.is_empty());
    }

    #[test]
    fn test_delete_outdated_retired_and_unreadable() {
        let plan = reconcile_assets(
            &target(&[("foo", "2.0-1")]),
            &[
                asset("foo-1.0-1.pkg.tar.zst", Some(("foo", "1.0-1"))),
                asset("old-1-1.pkg.tar.zst", Some(("old", "1-1"))),
                asset("broken.pkg.tar.zst", None),
            ],
        );
        assert!(plan.keep.is_empty());
        assert_eq!(plan.delete.len(), 6);
        assert!(plan.delete.contains(&"broken.pkg.tar.zst.sig".to_string()));
    }
}
