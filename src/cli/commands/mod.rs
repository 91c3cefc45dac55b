//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod cleanup;
pub mod deps;
pub mod levels;
pub mod plan;

use anyhow::Result;
use clap::Subcommand;

use crate::core::plan::CyclePolicy;

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Level every unit of the repository by dependency depth
    Levels(levels::LevelsArgs),

    /// Plan an incremental build against the published repository
    Plan(plan::PlanArgs),

    /// Stage the built archives a unit depends on into its _deps directory
    Deps(deps::DepsArgs),

    /// Decide which release assets to keep and which to delete
    Cleanup(cleanup::CleanupArgs),
}

impl Commands {
    /// Execute the command
    pub async fn run(self) -> Result<()> {
        match self {
            Self::Levels(args) => levels::execute(&args),
            Self::Plan(args) => plan::execute(&args).await,
            Self::Deps(args) => deps::execute(&args),
            Self::Cleanup(args) => cleanup::execute(&args),
        }
    }
}

/// Map the `--best-effort` flag to a cycle policy
pub(crate) fn cycle_policy(best_effort: bool) -> CyclePolicy {
    if best_effort {
        CyclePolicy::BestEffort
    } else {
        CyclePolicy::Abort
    }
}
