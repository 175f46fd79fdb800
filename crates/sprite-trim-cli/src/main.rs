use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Result};
use clap::{Parser, ValueEnum};
use sprite_trim_core::{AlignMode, RunStatus, TrimOptions};

mod app;
mod entity;
mod logging;
mod project;

#[derive(Parser)]
#[command(name = "sprite-trim")]
#[command(version, about = "Trim transparent margins from every sprite in a project")]
#[command(long_about = "Trim transparent margins from every sprite in a project\n\n\
    Crops each .png that has a .png.meta file down to its visible pixels, then\n\
    moves every symbol in the project's .entity files so nothing shifts on screen.\n\n\
    Files are modified in place; use --dry-run to preview.")]
struct Cli {
    /// Project directory (must contain a .fraytools file)
    project: PathBuf,

    /// How crops are shared between images
    #[arg(long, value_enum, default_value_t = AlignArg::None)]
    align: AlignArg,

    /// Compute crops and report, but write nothing
    #[arg(long)]
    dry_run: bool,

    /// Log level: trace, debug, info, warn, error, off
    #[arg(long)]
    log_level: Option<String>,

    /// Verbose output for debugging (same as --log-level debug)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum AlignArg {
    /// Crop every image independently
    None,
    /// Images in the same directory share one crop rectangle
    Aligned,
}

impl From<AlignArg> for AlignMode {
    fn from(arg: AlignArg) -> Self {
        match arg {
            AlignArg::None => AlignMode::None,
            AlignArg::Aligned => AlignMode::ByParent,
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let level = cli
        .log_level
        .as_deref()
        .unwrap_or(logging::default_log_level(cli.verbose));
    let _logger = logging::init_logging(level).map_err(|e| anyhow!(e))?;

    let config = app::RunConfig {
        project: cli.project,
        options: TrimOptions::new(cli.align.into()),
        dry_run: cli.dry_run,
    };

    let summary = match app::run(&config) {
        Ok(summary) => summary,
        Err(err) => {
            eprintln!("{}: {err:#}", RunStatus::Aborted);
            return Ok(ExitCode::FAILURE);
        }
    };

    for message in &summary.messages {
        eprintln!("warning: {message}");
    }
    let verb = if config.dry_run { "Would crop" } else { "Cropped" };
    println!(
        "{verb} {} of {} images, updated {} symbols in {} entity files ({})",
        summary.cropped,
        summary.images,
        summary.symbols_reconciled,
        summary.entities_updated,
        summary.status
    );

    if summary.failures > 0 {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
