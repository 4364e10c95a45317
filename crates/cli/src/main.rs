// rollcall CLI - roster ingestion, duplicate diagnostics and tiered merge

mod exit_codes;
mod stages;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rollcall_dedup::{DedupError, RollcallConfig};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use exit_codes::{dedup_exit_code, EXIT_ERROR, EXIT_IO, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "rollcall")]
#[command(about = "Merge organization rosters into one deduplicated contact list")]
#[command(version)]
struct Cli {
    /// Pipeline config (TOML). Built-in defaults apply when omitted.
    #[arg(long, short = 'c', global = true, env = "ROLLCALL_CONFIG")]
    config: Option<PathBuf>,

    /// Override [paths].input_dir
    #[arg(long, global = true)]
    input_dir: Option<PathBuf>,

    /// Override [paths].output_dir
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Debug logging
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Warnings and errors only
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert each workbook in the input directory to CSV (first sheet only)
    #[command(after_help = "\
Examples:
  rollcall convert
  rollcall convert --input-dir ./contact-lists")]
    Convert,

    /// Write the organization name list
    Orgs,

    /// Show organizations whose roster lacks the required columns
    Columns,

    /// Build the people ledger from every roster
    Ingest,

    /// Assemble the people table from the ledger
    Export,

    /// Report suspected duplicates by name, email and phone
    Duplicates {
        /// Print the report JSON to stdout as well
        #[arg(long)]
        json: bool,
    },

    /// Merge duplicate records tier by tier
    #[command(after_help = "\
Examples:
  rollcall dedup
  rollcall dedup --json > summary.json
  rollcall --config rollcall.toml dedup")]
    Dedup {
        /// Print run metadata and merge summary JSON to stdout
        #[arg(long)]
        json: bool,
    },

    /// Recompute Total Orgs from the membership columns
    Recount {
        /// People CSV to rewrite (default: [paths].people_csv)
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Re-derive Zip Code from Physical Address
    Zip {
        /// People CSV to rewrite (default: [paths].people_csv)
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// orgs, columns, ingest, export, duplicates and dedup in order
    Run,
}

fn init_logging(verbose: bool, quiet: bool) {
    let default = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = load_config(cli.config.as_deref(), cli.input_dir, cli.output_dir)
        .and_then(|config| match cli.command {
            Commands::Convert => stages::cmd_convert(&config),
            Commands::Orgs => stages::cmd_orgs(&config),
            Commands::Columns => stages::cmd_columns(&config),
            Commands::Ingest => stages::cmd_ingest(&config),
            Commands::Export => stages::cmd_export(&config),
            Commands::Duplicates { json } => stages::cmd_duplicates(&config, json),
            Commands::Dedup { json } => stages::cmd_dedup(&config, json),
            Commands::Recount { file } => stages::cmd_recount(&config, file),
            Commands::Zip { file } => stages::cmd_zip(&config, file),
            Commands::Run => stages::cmd_run(&config),
        });

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

/// Read and validate the config; relative paths resolve against its directory.
fn load_config(
    path: Option<&Path>,
    input_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
) -> Result<RollcallConfig, CliError> {
    let mut config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|e| {
                CliError::io(format!("cannot read config {}: {e}", path.display()))
            })?;
            let mut config = RollcallConfig::from_toml(&text).map_err(CliError::dedup)?;
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            config.paths.rebase(base);
            config
        }
        None => RollcallConfig::default(),
    };

    if let Some(dir) = input_dir {
        config.paths.input_dir = dir;
    }
    if let Some(dir) = output_dir {
        config.paths.output_dir = Some(dir);
    }
    Ok(config)
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn dedup(err: DedupError) -> Self {
        let hint = match &err {
            DedupError::RowShape { .. } => Some(
                "if this came from `export`, a roster value contains [schema].key_separator"
                    .to_string(),
            ),
            DedupError::MissingColumn { .. } => {
                Some("regenerate the people table with `rollcall export`".to_string())
            }
            _ => None,
        };
        Self { code: dedup_exit_code(&err), message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
