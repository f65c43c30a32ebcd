use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

use batch_sigcheck::core::logging::init_logging;
use batch_sigcheck::pipeline::output_path;
use batch_sigcheck::prelude::*;

#[derive(Parser)]
#[command(name = "batch_sigcheck")]
#[command(about = "Deduplicate layout manifest binaries and batch-check their signatures", long_about = None)]
struct Cli {
    /// Path of the Layout.ini manifest to process
    layout_manifest: PathBuf,

    /// Directory into which to save the output
    output_directory: PathBuf,

    /// Insist the root of the volume is this folder, e.g. G:\
    #[arg(long)]
    root: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path of the sigcheck executable
    #[arg(long)]
    sigcheck: Option<PathBuf>,

    /// Flag folders with this many processed files or fewer
    #[arg(long)]
    low_loads: Option<usize>,

    /// Digest used to deduplicate and to match checker rows
    #[arg(long, value_enum)]
    hash: Option<HashAlgorithm>,

    /// Stage copies instead of symbolic links
    #[arg(long)]
    copy: bool,

    /// Run in batch mode (no progress bar)
    #[arg(long)]
    batch: bool,
}

const EXIT_FATAL: u8 = 1;
const EXIT_CHECKER: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let timestamp = chrono::Local::now().format("%Y%m%d%H%M%S").to_string();

    if let Err(e) = fs::create_dir_all(&cli.output_directory) {
        eprintln!(
            "Cannot create output directory {}: {}",
            cli.output_directory.display(),
            e
        );
        return ExitCode::from(EXIT_FATAL);
    }

    let log_path = output_path(&cli.output_directory, &timestamp, "log");
    if let Err(e) = init_logging(&log_path) {
        eprintln!("{}", e);
        return ExitCode::from(EXIT_FATAL);
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(EXIT_FATAL);
        }
    };

    let checker = Sigcheck::new(config.sigcheck_path.clone(), config.sigcheck_args.clone());
    let ctx = RunContext {
        manifest: cli.layout_manifest,
        out_dir: cli.output_directory,
        root: cli.root,
        timestamp,
        config,
        show_progress: !cli.batch,
    };

    match run(&ctx, &checker) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            match e.downcast_ref::<BatchSigCheckError>() {
                Some(err) if err.is_checker_failure() => ExitCode::from(EXIT_CHECKER),
                _ => ExitCode::from(EXIT_FATAL),
            }
        }
    }
}

/// Config file first, then CLI overrides
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(ref sigcheck) = cli.sigcheck {
        config.sigcheck_path = sigcheck.clone();
    }
    if let Some(low_loads) = cli.low_loads {
        config.low_loads = low_loads;
    }
    if let Some(hash) = cli.hash {
        config.hash_algorithm = hash;
    }
    if cli.copy {
        config.stage_mode = StageMode::Copy;
    }
    config.validate()?;
    Ok(config)
}
