//! CLI implementation for `pkgplan plan`
//!
//! Compares the repository against its published database and prints the
//! levels to rebuild and the packages to remove.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tempfile::TempDir;

use crate::cli::commands::cycle_policy;
use crate::cli::commands::levels::load_graph;
use crate::cli::output::{create_spinner, print_json, report, status};
use crate::config::defaults;
use crate::core::config::PlanConfig;
use crate::core::plan::BuildPlan;
use crate::core::reconcile::{DesiredState, PublishedState};
use crate::infra::download::DownloadManager;
use crate::infra::{github_output, repo_db};

/// Arguments of the plan command
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Name of the published repository database (`<name>.db.tar.gz`)
    #[arg(long)]
    pub repo_name: Option<String>,

    /// Repository slug (`owner/repo`) hosting the published database
    #[arg(long, env = defaults::ENV_REPOSITORY)]
    pub slug: Option<String>,

    /// Rebuild every unit regardless of published versions
    #[arg(long)]
    pub force: bool,

    /// Read the published database from a local file instead of downloading it
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Repository root to scan for PKGBUILDs
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Put units of a dependency cycle in a final level instead of failing
    #[arg(long)]
    pub best_effort: bool,
}

/// Execute the plan command
pub async fn execute(args: &PlanArgs) -> Result<()> {
    let config = PlanConfig::load(&args.root)
        .with_context(|| "Failed to load repository configuration")?;
    let build = load_graph(&args.root)?;

    let published = match &args.db {
        Some(path) => repo_db::parse_db(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => fetch_published(args, &config).await,
    };

    if args.force {
        report(status::INFO, "Force rebuild enabled");
    }

    let plan = BuildPlan::compute(&build, &published, args.force, cycle_policy(args.best_effort))
        .context("Cannot order the units to rebuild")?;

    for (id, reason) in &plan.reconciliation.reasons {
        tracing::info!("{id} needs build: {reason:?}");
    }
    report(
        status::SUCCESS,
        &format!(
            "{} unit(s) to rebuild in {} level(s), {} package(s) to delete",
            plan.reconciliation.rebuild.len(),
            plan.levels.len(),
            plan.reconciliation.delete.len()
        ),
    );

    let output = plan.output();
    let desired = DesiredState::from_graph(&build.graph, &build.index);
    let mut lines = output.to_github_output()?;
    lines.push_str(&github_output::line("target_packages", &desired)?);
    github_output::publish(&lines)?;

    print_json(&output)
}

/// Download the published database, or fall back to the empty state
async fn fetch_published(args: &PlanArgs, config: &PlanConfig) -> PublishedState {
    let Some(name) = args.repo_name.as_deref().or(config.repository.name.as_deref()) else {
        report(
            status::WARNING,
            "No repository name given (--repo-name or [repository] name); planning a full rebuild",
        );
        return PublishedState::default();
    };

    let slug = args.slug.as_deref().filter(|s| !s.is_empty());
    let slug_free = config
        .repository
        .db_url
        .as_deref()
        .is_some_and(|template| !template.contains("{slug}"));
    let url = match slug {
        Some(slug) => Some(config.db_url(slug, name)),
        None if slug_free => Some(config.db_url("", name)),
        None => None,
    };

    let manager = DownloadManager::with_config(
        config.download_retries(),
        defaults::RETRY_BASE_DELAY_MS,
        config.download_timeout(),
    );
    let scratch = match DbScratch::new() {
        Ok(scratch) => scratch,
        Err(e) => {
            tracing::warn!("Cannot create a download directory ({e}); planning a full rebuild");
            return PublishedState::default();
        }
    };

    let spinner = create_spinner("Fetching published repository database...");
    let published = repo_db::fetch_published(&manager, url.as_deref(), &scratch.path()).await;
    spinner.finish_and_clear();

    published
}

/// Private download location for one run; removed on drop
struct DbScratch {
    dir: TempDir,
}

impl DbScratch {
    fn new() -> std::io::Result<Self> {
        Ok(Self {
            dir: tempfile::Builder::new().prefix("pkgplan-").tempdir()?,
        })
    }

    fn path(&self) -> PathBuf {
        self.dir.path().join(defaults::DB_DOWNLOAD_FILE)
    }
}
