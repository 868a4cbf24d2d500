mod calc;
mod cmd;
mod data;
mod table;
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use table::MenuAction;
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "epigrid.log";

#[derive(Parser)]
#[command(name = "epigrid", about = "interactive epiweek record table")]
struct Cli {
    /// Path to the data directory containing config and data files (default: ./config)
    #[arg(long, default_value = "./config")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize data files with defaults
    Init,
    /// Render the record table as HTML
    Render {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// First year row (default: earliest record year)
        #[arg(long)]
        year_min: Option<i32>,
        /// Last year row (default: latest record year)
        #[arg(long)]
        year_max: Option<i32>,
        /// Emit only the table fragment, not a full page
        #[arg(long)]
        fragment: bool,
    },
    /// List all records
    Records,
    /// Apply a context menu action to one epiweek cell
    Act {
        /// add, update, delete or replace
        action: MenuAction,
        /// Epiweek (e.g. 2021-03)
        epiweek: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let data_dir = if cli.data_dir.is_absolute() {
        cli.data_dir.clone()
    } else {
        std::env::current_dir()?.join(&cli.data_dir)
    };
    data::persistence::set_data_dir(data_dir.clone());

    // Checked before logging starts: the terminal session log lives in the data dir.
    let is_init_command = matches!(cli.command, Some(Commands::Init));
    let needs_init = !is_init_command && dir_needs_init(&data_dir);

    init_logging(&data_dir, cli.command.is_none())?;

    if needs_init {
        eprintln!(
            "Data directory '{}' is missing or empty, running init...",
            data_dir.display()
        );
        cmd::init::run()?;
    }

    match cli.command {
        None => cmd::root::run(),
        Some(Commands::Init) => cmd::init::run(),
        Some(Commands::Render {
            out,
            year_min,
            year_max,
            fragment,
        }) => cmd::render::run(
            out.as_deref(),
            &cmd::render::RenderOptions {
                year_min,
                year_max,
                fragment,
            },
        ),
        Some(Commands::Records) => cmd::records::run(),
        Some(Commands::Act { action, epiweek }) => cmd::act::run(action, &epiweek),
    }
}

/// Logs go to stderr, except for the terminal session which would be
/// garbled by them; it appends to a file in the data directory.
fn init_logging(data_dir: &Path, interactive: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if interactive {
        fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create dir {}", data_dir.display()))?;
        let path = data_dir.join(LOG_FILE);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

/// Returns true when `dir` does not exist or exists but contains no files.
fn dir_needs_init(dir: &Path) -> bool {
    if !dir.exists() {
        return true;
    }
    dir.read_dir()
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}
