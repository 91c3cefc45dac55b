//! Build plan assembly
//!
//! Combines reconciliation and leveling into the document handed to CI:
//! which levels exist, which units each level builds and which published
//! packages to remove.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::core::graph::GraphBuild;
use crate::core::levels::{self, BuildLevels, Schedule};
use crate::core::reconcile::{self, DesiredState, PublishedState, Reconciliation};
use crate::core::unit::UnitId;
use crate::error::CycleError;

/// What to do when the units to schedule contain a dependency cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CyclePolicy {
    /// Fail with the cycle report
    #[default]
    Abort,
    /// Build the cyclic units last, in one unordered level
    BestEffort,
}

impl CyclePolicy {
    /// Apply the policy to a schedule
    pub fn apply(self, schedule: Schedule) -> Result<BuildLevels, CycleError> {
        match self {
            Self::Abort => schedule.into_result(),
            Self::BestEffort => Ok(schedule.best_effort()),
        }
    }
}

/// An incremental build plan
#[derive(Debug, Clone)]
pub struct BuildPlan {
    /// Rebuild and deletion sets
    pub reconciliation: Reconciliation,
    /// Levels of the units to rebuild
    pub levels: BuildLevels,
}

impl BuildPlan {
    /// Reconcile against `published` and level the resulting rebuild set
    pub fn compute(
        build: &GraphBuild,
        published: &PublishedState,
        force: bool,
        policy: CyclePolicy,
    ) -> Result<Self, CycleError> {
        let desired = DesiredState::from_graph(&build.graph, &build.index);
        let reconciliation = reconcile::reconcile(&build.graph, &desired, published, force);
        let schedule = levels::schedule(&build.graph, &reconciliation.rebuild);
        let levels = policy.apply(schedule)?;

        Ok(Self {
            reconciliation,
            levels,
        })
    }

    /// Serializable output document
    pub fn output(&self) -> PlanOutput {
        PlanOutput::new(&self.levels, &self.reconciliation.delete)
    }
}

/// The plan as consumed by CI
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlanOutput {
    /// Level numbers, starting at 1
    pub levels: Vec<usize>,
    /// Level number to unit ids
    pub level_map: BTreeMap<usize, Vec<UnitId>>,
    /// Published package names to remove
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<Vec<String>>,
}

impl PlanOutput {
    /// Output for a full plan, including deletions
    pub fn new(levels: &BuildLevels, deleted: &BTreeSet<String>) -> Self {
        Self {
            deleted: Some(deleted.iter().cloned().collect()),
            ..Self::levels_only(levels)
        }
    }

    /// Output carrying only levels
    pub fn levels_only(levels: &BuildLevels) -> Self {
        Self {
            levels: levels.numbers(),
            level_map: levels.level_map(),
            deleted: None,
        }
    }

    /// Render as `key=<json>` lines for `$GITHUB_OUTPUT`
    pub fn to_github_output(&self) -> Result<String, serde_json::Error> {
        let mut out = format!(
            "levels={}\nlevel_map={}\n",
            serde_json::to_string(&self.levels)?,
            serde_json::to_string(&self.level_map)?
        );
        if let Some(deleted) = &self.deleted {
            out.push_str(&format!("deleted={}\n", serde_json::to_string(deleted)?));
        }
        Ok(out)
    }
}
