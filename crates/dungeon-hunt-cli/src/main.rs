//! Dungeon hunt CLI.
//!
//! `dungeon-hunt <gridHalfExtent> <density> <seed>` builds the dungeon, runs
//! every hunt across the worker pool (or serially with `--serial`) and prints
//! the report. All argument errors exit with status 1.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::{error::Error, fmt};

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use dungeon_hunt_core::{ConfigError, HuntConfig, HuntSession, RunMode};

#[derive(Parser, Debug)]
#[command(name = "dungeon-hunt")]
#[command(version)]
#[command(about = "Parallel hill-climbing hunt for the dungeon's mana peak")]
struct Cli {
    /// Half-width of the square dungeon
    #[arg(allow_negative_numbers = true)]
    grid_half_extent: String,

    /// Searches per unit area, scaled by the grid resolution
    #[arg(allow_negative_numbers = true)]
    density: String,

    /// Random seed; 0 draws a fresh one
    #[arg(allow_negative_numbers = true)]
    seed: String,

    /// Worker threads (defaults to available hardware concurrency)
    #[arg(long, env = "DUNGEON_HUNT_WORKERS")]
    workers: Option<usize>,

    /// Run every hunt on the main thread
    #[arg(long)]
    serial: bool,

    /// Write field values and the winning path as JSON
    #[arg(long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum ArgumentError {
    Format,
    Range(ConfigError),
}

impl fmt::Display for ArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgumentError::Format => write!(f, "All arguments must be numeric."),
            ArgumentError::Range(e) => write!(f, "{e}"),
        }
    }
}

impl Error for ArgumentError {}

/// Exit status for every rejected argument, whatever the cause.
const ARGUMENT_ERROR_STATUS: u8 = 1;

impl ArgumentError {
    fn status(&self) -> u8 {
        ARGUMENT_ERROR_STATUS
    }
}

/// `--help` and `--version` succeed; every other parse failure is an argument error.
fn clap_status(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => ARGUMENT_ERROR_STATUS,
    }
}

impl Cli {
    fn to_config(&self) -> Result<HuntConfig, ArgumentError> {
        let grid_half_extent = self
            .grid_half_extent
            .parse::<i64>()
            .map_err(|_| ArgumentError::Format)?;
        let density = self
            .density
            .parse::<f64>()
            .map_err(|_| ArgumentError::Format)?;
        let seed = self.seed.parse::<i64>().map_err(|_| ArgumentError::Format)?;
        let config = HuntConfig {
            grid_half_extent,
            density,
            seed,
            workers: self.workers,
        };
        config.validate().map_err(ArgumentError::Range)?;
        Ok(config)
    }
}

fn clap_exit(err: clap::Error) -> ExitCode {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = err.print();
        }
        ErrorKind::ValueValidation | ErrorKind::InvalidValue => {
            eprintln!("Error: {}", ArgumentError::Format);
        }
        _ => {
            eprintln!("Incorrect number of command line arguments provided.");
            let _ = err.print();
        }
    }
    ExitCode::from(clap_status(err.kind()))
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn run(cli: &Cli, config: HuntConfig) -> Result<ExitCode> {
    let mode = RunMode::from_config(&config, cli.serial);
    let session = HuntSession::prepare(config)?;
    info!(?mode, hunts = session.hunts().len(), "starting hunt");
    let done = session.run(mode)?;

    print!("{}", done.report());
    println!();

    if let Some(path) = &cli.export {
        let file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        done.snapshot()
            .write_json(&mut writer)
            .with_context(|| format!("failed to write snapshot to {}", path.display()))?;
        writer.flush()?;
        info!(path = %path.display(), "wrote render snapshot");
    }

    Ok(if done.winner().is_some() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => return clap_exit(err),
    };
    init_tracing(cli.verbose);

    let config = match cli.to_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(e.status());
        }
    };

    match run(&cli, config) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(1)
        }
    }
}
