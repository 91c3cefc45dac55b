//! CLI implementation for `pkgplan levels`
//!
//! Levels every unit of the repository by its longest dependency chain,
//! ignoring anything published.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;

use crate::cli::commands::cycle_policy;
use crate::cli::output::{print_json, report, status};
use crate::core::graph::{self, GraphBuild};
use crate::core::levels;
use crate::core::plan::PlanOutput;
use crate::infra::{discovery, github_output};

/// Arguments of the levels command
#[derive(Args, Debug)]
pub struct LevelsArgs {
    /// Repository root to scan for PKGBUILDs
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Put units of a dependency cycle in a final level instead of failing
    #[arg(long)]
    pub best_effort: bool,
}

/// Execute the levels command
pub fn execute(args: &LevelsArgs) -> Result<()> {
    let build = load_graph(&args.root)?;

    let levels = cycle_policy(args.best_effort)
        .apply(levels::depth_levels(&build.graph))
        .context("Cannot order the units of this repository")?;

    report(
        status::SUCCESS,
        &format!(
            "{} unit(s) in {} level(s)",
            levels.unit_count(),
            levels.len()
        ),
    );

    let output = PlanOutput::levels_only(&levels);
    github_output::publish(&output.to_github_output()?)?;
    print_json(&output)
}

/// Discover the units under `root` and build their graph
///
/// Unreadable manifests and output name conflicts are reported but do not
/// stop planning.
pub(crate) fn load_graph(root: &Path) -> Result<GraphBuild> {
    if !root.is_dir() {
        bail!("Repository root {} is not a directory", root.display());
    }

    let scan = discovery::scan_units(root);
    for failure in &scan.failures {
        report(
            status::WARNING,
            &format!("Skipped {}: {}", failure.source.display(), failure.reason),
        );
    }

    let build = graph::build(scan.units);
    for conflict in &build.conflicts {
        report(
            status::WARNING,
            &format!(
                "'{}' is declared by both {} and {}; using {}",
                conflict.name, conflict.previous, conflict.winner, conflict.winner
            ),
        );
    }

    Ok(build)
}
