//! CLI implementation for `pkgplan deps`
//!
//! Stages every built archive a unit needs, directly or transitively,
//! into the unit's `_deps` directory.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::output::{print_json, report, status};
use crate::config::defaults::DEPS_DIR;
use crate::core::closure::{self, ArchiveIndex};
use crate::core::config::PlanConfig;
use crate::core::unit::{Unit, UnitId};
use crate::infra::{filesystem, github_output, pkgbuild, pkginfo};

/// Arguments of the deps command
#[derive(Args, Debug)]
pub struct DepsArgs {
    /// Unit directory containing the PKGBUILD
    pub unit_dir: PathBuf,

    /// Directory holding built archives [default: `[archives] dir` of pkgplan.toml, else .]
    #[arg(long)]
    pub archives: Option<PathBuf>,
}

/// Execute the deps command
pub fn execute(args: &DepsArgs) -> Result<()> {
    let record = pkgbuild::read_manifest(&args.unit_dir)?;
    let cwd = std::env::current_dir()?;
    let unit = Unit::from_record(unit_id(&args.unit_dir, &cwd), record);

    let archives_dir = match &args.archives {
        Some(dir) => dir.clone(),
        None => PlanConfig::load(&cwd)?.archives_dir(&cwd),
    };

    let scan = pkginfo::scan_archives(&archives_dir)
        .with_context(|| format!("Failed to list archives in {}", archives_dir.display()))?;
    for failure in &scan.failures {
        report(
            status::WARNING,
            &format!("Ignoring {}: {}", failure.source.display(), failure.reason),
        );
    }

    let index = ArchiveIndex::from_archives(scan.archives);
    let direct: Vec<&str> = unit.bare_dependencies().collect();
    let files = closure::resolve(&index, &direct);

    let staged = filesystem::copy_into(
        files.iter().map(PathBuf::as_path),
        &args.unit_dir.join(DEPS_DIR),
    )?;
    let names: Vec<String> = staged.iter().filter_map(|p| file_name(p)).collect();

    report(
        status::SUCCESS,
        &format!("Staged {} archive(s) for {}", names.len(), unit.id),
    );

    github_output::publish(&github_output::line("deps", &names)?)?;
    print_json(&names)
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

/// Identify a unit directory given on the command line
///
/// Paths below `cwd` become relative ids; other absolute paths fall back
/// to the directory name.
fn unit_id(dir: &Path, cwd: &Path) -> UnitId {
    let rel = if dir.is_absolute() {
        dir.strip_prefix(cwd).unwrap_or(dir)
    } else {
        dir
    };
    let parts: PathBuf = rel
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect();

    if parts.as_os_str().is_empty() || rel.is_absolute() {
        let name = dir
            .file_name()
            .map_or_else(|| dir.display().to_string(), |n| n.to_string_lossy().into_owned());
        return UnitId::new(name);
    }
    UnitId::from_path(&parts)
}
