//! One linear run: scan, stage, check, report.
//!
//! All run state lives in `RunContext` and the values each stage returns;
//! nothing is shared between stages through globals.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::checker::SignatureChecker;
use crate::core::config::Config;
use crate::reporting::heuristics::Heuristics;
use crate::reporting::report_builder::reattach;
use crate::reporting::report_writer::{write_summary, write_table};
use crate::scanner::manifest_parser::{parse_manifest, ScanSettings, ScanStats};
use crate::scanner::path_resolver::infer_root;
use crate::staging::link_stager::stage_links;

/// Inputs for a single run
#[derive(Debug, Clone)]
pub struct RunContext {
    pub manifest: PathBuf,
    pub out_dir: PathBuf,
    /// Explicit image root; inferred from the manifest location when absent
    pub root: Option<PathBuf>,
    /// Run start time as `YYYYMMDDHHMMSS`, prefixed to every output
    pub timestamp: String,
    pub config: Config,
    pub show_progress: bool,
}

/// How a run ended when it did not fail
#[derive(Debug)]
pub enum RunOutcome {
    /// No unique candidate files; no scratch directory was created
    NothingToProcess { stats: ScanStats },
    /// Unique files existed but none could be staged
    NothingStaged { stats: ScanStats, unique: usize },
    Reported(RunReport),
}

#[derive(Debug)]
pub struct RunReport {
    pub stats: ScanStats,
    pub unique: usize,
    pub processed: usize,
    pub table_path: PathBuf,
    pub summary_path: PathBuf,
    pub heuristics: Heuristics,
}

impl RunContext {
    /// `<out_dir>/<timestamp>_BatchSigCheck.<extension>`
    pub fn output_path(&self, extension: &str) -> PathBuf {
        output_path(&self.out_dir, &self.timestamp, extension)
    }

    pub fn resolve_root(&self) -> PathBuf {
        match &self.root {
            Some(root) => {
                info!("User provided root as: {}", root.display());
                std::path::absolute(root).unwrap_or_else(|_| root.clone())
            }
            None => {
                let root = infer_root(&self.manifest);
                info!("Calculated root as: {}", root.display());
                root
            }
        }
    }
}

pub fn output_path(out_dir: &Path, timestamp: &str, extension: &str) -> PathBuf {
    out_dir.join(format!("{}_BatchSigCheck.{}", timestamp, extension))
}

/// Execute the whole run with the given checker
pub fn run(ctx: &RunContext, checker: &dyn SignatureChecker) -> Result<RunOutcome> {
    let config = &ctx.config;
    info!("Processing: {}", ctx.manifest.display());
    info!("Output Dir: {}", ctx.out_dir.display());
    info!("Max File Size: {}", config.max_file_size);

    let root = ctx.resolve_root();
    let settings = ScanSettings {
        rules: config.path_rules()?,
        max_file_size: config.max_file_size,
        hash_algorithm: config.hash_algorithm,
        show_progress: ctx.show_progress,
    };

    let scan = parse_manifest(&ctx.manifest, &root, &settings)?;
    let stats = scan.stats;
    let unique = scan.unique_count();

    let Some(staged) = stage_links(&scan.table, &config.link_extension, config.stage_mode)? else {
        info!("Nothing to process.");
        return Ok(RunOutcome::NothingToProcess { stats });
    };

    if staged.count() == 0 {
        warn!(
            "{} unique files but no links were created; skipping signature check",
            unique
        );
        staged.close();
        return Ok(RunOutcome::NothingStaged { stats, unique });
    }

    let table_path = ctx.output_path("csv");
    let summary_path = ctx.output_path("txt");
    info!("SigCheck Output to '{}'", table_path.display());
    info!("Runtime Analysis to '{}'", summary_path.display());

    let output = checker.run(staged.path());
    staged.close();
    let output = output?;

    let reattached = reattach(
        &output,
        &scan.table,
        config.hash_algorithm,
        &config.link_extension,
    )?;

    info!("Writing SigCheck output...");
    let processed = write_table(&table_path, &reattached)?;
    if reattached.has_header {
        info!("Done, wrote header + {} lines.", processed);
    } else {
        info!("Done, wrote {} lines.", processed);
    }

    info!("Analysing output...");
    let heuristics = Heuristics::derive(
        &scan.table,
        reattached.rows(),
        config.low_loads,
        &config.suspicious_substrings,
    );
    info!("{} files were skipped by SigCheck.", heuristics.non_binaries.len());

    info!("Writing RTA output...");
    write_summary(&summary_path, &heuristics)?;
    info!("Done.");

    Ok(RunOutcome::Reported(RunReport {
        stats,
        unique,
        processed,
        table_path,
        summary_path,
        heuristics,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_root_override_is_made_absolute() {
        let ctx = RunContext {
            manifest: PathBuf::from("Layout.ini"),
            out_dir: PathBuf::from("out"),
            root: Some(PathBuf::from("image")),
            timestamp: "20240101000000".into(),
            config: Config::default(),
            show_progress: false,
        };

        let root = ctx.resolve_root();
        assert!(root.is_absolute());
        assert!(root.ends_with("image"));
    }

    #[test]
    fn test_output_path_naming() {
        let path = output_path(Path::new("out"), "20240102030405", "csv");
        assert_eq!(path, Path::new("out").join("20240102030405_BatchSigCheck.csv"));
    }
}
