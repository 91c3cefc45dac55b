//! Incremental rebuild reconciliation
//!
//! Compares the versions the repository wants to publish against the
//! versions already published and decides which units must be rebuilt and
//! which published packages must be removed.
//!
//! When a unit rebuilds, every unit depending on it (directly or
//! transitively) rebuilds as well.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::core::graph::{DependencyGraph, NameIndex};
use crate::core::unit::UnitId;

/// Output name to version
pub type VersionMap = BTreeMap<String, String>;

/// Versions the repository should publish after this build cycle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DesiredState(VersionMap);

impl DesiredState {
    /// Derive the desired state from the units owning each output name
    pub fn from_graph(graph: &DependencyGraph, index: &NameIndex) -> Self {
        let versions = index
            .iter()
            .filter_map(|(name, owner)| {
                graph
                    .unit(owner)
                    .map(|unit| (name.to_string(), unit.version.clone()))
            })
            .collect();
        Self(versions)
    }

    /// Version wanted for `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Whether `name` is produced by the repository
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Underlying map
    pub fn as_map(&self) -> &VersionMap {
        &self.0
    }
}

impl From<VersionMap> for DesiredState {
    fn from(map: VersionMap) -> Self {
        Self(map)
    }
}

/// Versions already present in the published repository
///
/// An unreachable source is represented by [`PublishedState::default`],
/// the empty state, which makes every unit look outdated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PublishedState(VersionMap);

impl PublishedState {
    /// Version published for `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Published names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of published names
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if nothing is published
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<VersionMap> for PublishedState {
    fn from(map: VersionMap) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, String)> for PublishedState {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Why a unit is part of the rebuild set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RebuildReason {
    /// Force mode rebuilds everything
    Forced,
    /// An output's desired version differs from the published one
    VersionMismatch {
        /// Output name
        name: String,
        /// Version the repository declares
        desired: Option<String>,
        /// Version currently published
        published: Option<String>,
    },
    /// A dependency is being rebuilt
    Impacted {
        /// The directly changed unit this one depends on
        by: UnitId,
    },
}

/// Result of reconciling desired and published state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    /// Units to rebuild
    pub rebuild: BTreeSet<UnitId>,
    /// Published names to delete
    pub delete: BTreeSet<String>,
    /// First reason found for each rebuilt unit
    pub reasons: BTreeMap<UnitId, RebuildReason>,
}

impl Reconciliation {
    /// Check if nothing needs to happen
    pub fn is_noop(&self) -> bool {
        self.rebuild.is_empty() && self.delete.is_empty()
    }
}

/// Compute the rebuild and deletion sets
pub fn reconcile(
    graph: &DependencyGraph,
    desired: &DesiredState,
    published: &PublishedState,
    force: bool,
) -> Reconciliation {
    let mut result = Reconciliation::default();

    if force {
        tracing::info!("Force rebuild enabled");
        for id in graph.ids() {
            result.reasons.insert(id.clone(), RebuildReason::Forced);
            result.rebuild.insert(id);
        }
    } else {
        for unit in graph.units() {
            // Each unit is compared on its own version, so a unit that lost a
            // name conflict still rebuilds when it changed.
            let mismatch = unit.names.iter().find_map(|name| {
                let current = published.get(name);
                (Some(unit.version.as_str()) != current).then(|| RebuildReason::VersionMismatch {
                    name: name.clone(),
                    desired: Some(unit.version.clone()),
                    published: current.map(str::to_string),
                })
            });

            if let Some(reason) = mismatch {
                if let RebuildReason::VersionMismatch {
                    name,
                    desired: local,
                    published: remote,
                } = &reason
                {
                    tracing::info!(
                        "Package '{}' needs build: local '{}' != remote '{}'",
                        name,
                        local.as_deref().unwrap_or("-"),
                        remote.as_deref().unwrap_or("-")
                    );
                }
                result.rebuild.insert(unit.id.clone());
                result.reasons.insert(unit.id.clone(), reason);
            }
        }

        let changed: Vec<UnitId> = result.rebuild.iter().cloned().collect();
        for id in changed {
            for dependent in graph.descendants(&id) {
                if result.rebuild.insert(dependent.clone()) {
                    tracing::info!("Rebuilding '{dependent}' because it depends on '{id}'");
                    result
                        .reasons
                        .insert(dependent, RebuildReason::Impacted { by: id.clone() });
                }
            }
        }
    }

    for name in published.names() {
        if !desired.contains(name) {
            tracing::info!("Package '{name}' is published but no longer built; marking for deletion");
            result.delete.insert(name.to_string());
        }
    }

    result
}
