//! CLI implementation for `pkgplan cleanup`
//!
//! Checks downloaded release assets against the target package versions
//! and writes `delete.txt` and `keep.txt`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::output::{print_json, report, status};
use crate::config::defaults::{DELETE_LIST_FILE, KEEP_LIST_FILE};
use crate::core::assets::{self, AssetPlan};
use crate::core::reconcile::{DesiredState, VersionMap};
use crate::infra::{filesystem, github_output, pkginfo};

/// Arguments of the cleanup command
#[derive(Args, Debug)]
pub struct CleanupArgs {
    /// JSON object of package name to the version that should stay published
    #[arg(long)]
    pub target_packages: String,

    /// Directory containing the downloaded release assets
    #[arg(long, default_value = ".")]
    pub assets_dir: PathBuf,

    /// Directory receiving delete.txt and keep.txt
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,
}

/// Execute the cleanup command
pub fn execute(args: &CleanupArgs) -> Result<()> {
    let target: VersionMap = serde_json::from_str(&args.target_packages)
        .with_context(|| "Invalid --target-packages JSON")?;
    let target = DesiredState::from(target);

    let found = pkginfo::scan_assets(&args.assets_dir)
        .with_context(|| format!("Failed to list assets in {}", args.assets_dir.display()))?;

    let plan = if found.is_empty() {
        report(status::WARNING, "No package archives found in assets directory");
        AssetPlan::default()
    } else {
        assets::reconcile_assets(&target, &found)
    };

    filesystem::write_lines(&args.out_dir.join(DELETE_LIST_FILE), &plan.delete)?;
    filesystem::write_lines(&args.out_dir.join(KEEP_LIST_FILE), &plan.keep)?;

    report(
        status::SUCCESS,
        &format!(
            "{} asset(s) to keep, {} asset(s) to delete",
            plan.keep.len(),
            plan.delete.len()
        ),
    );

    let mut lines = github_output::line("delete", &plan.delete)?;
    lines.push_str(&github_output::line("keep", &plan.keep)?);
    github_output::publish(&lines)?;

    print_json(&plan)
}
