use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use tablelog_kernel::config::KernelConfig;
use tablelog_kernel::data::Row;
use tablelog_kernel::log::{TransactionLog, Version};
use tablelog_kernel::replay::SnapshotReader;
use tablelog_kernel::session::Session;
use tablelog_kernel::store::FileObjectStore;

/// Tablelog CLI
#[derive(Parser, Debug)]
#[command(name = "tablelog")]
#[command(about = "Transactional table store on an append-only log", long_about = None)]
struct Cli {
    /// Store directory
    #[arg(long, default_value = ".tablelog")]
    dir: PathBuf,

    /// Path to kernel config JSON
    #[arg(long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a table with the given columns
    CreateTable {
        table: String,
        #[arg(required = true)]
        columns: Vec<String>,
    },

    /// Insert rows given as JSON arrays, e.g. '[1, "Alice"]'
    Insert {
        table: String,
        #[arg(required = true)]
        rows: Vec<String>,
    },

    /// Print every row of a table as JSON lines
    Scan { table: String },

    /// Print the committed log
    Log,

    /// Print a table's schema and file set
    Snapshot {
        table: String,

        /// Version to read at (defaults to latest)
        #[arg(long)]
        version: Option<Version>,
    },
}

/// Wrapper for JSON output of a commit
#[derive(Debug, Serialize)]
struct CommitOutput {
    version: Option<Version>,
    attempts: u32,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("tablelog=debug,tablelog_kernel=debug")
    } else {
        EnvFilter::new("tablelog=warn,tablelog_kernel=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

fn load_config(path: Option<&str>) -> Result<KernelConfig> {
    let config = match path {
        Some(path) => {
            let data = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
            serde_json::from_str::<KernelConfig>(&data)?
        }
        None => KernelConfig::default_config(),
    };
    config.validate()?;
    Ok(config)
}

fn print_commit(version: Option<Version>, attempts: u32) -> Result<()> {
    let output = CommitOutput { version, attempts };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // ----------------------------
    // Open store
    // ----------------------------
    let config = load_config(cli.config.as_deref())?;
    let store = Arc::new(
        FileObjectStore::open(&cli.dir)
            .with_context(|| format!("opening store at {}", cli.dir.display()))?,
    );
    debug!(dir = %cli.dir.display(), "store opened");

    let mut session = Session::new(Arc::clone(&store), config);

    // ----------------------------
    // Run command
    // ----------------------------
    match cli.command {
        Command::CreateTable { table, columns } => {
            session.new_tx()?;
            session.create_table(&table, columns)?;
            let outcome = session.commit_tx()?;
            print_commit(outcome.version, outcome.attempts)?;
        }

        Command::Insert { table, rows } => {
            session.new_tx()?;
            for raw in &rows {
                let row: Row = serde_json::from_str(raw)
                    .with_context(|| format!("row is not a JSON array of scalars: {raw}"))?;
                session.write_row(&table, row)?;
            }
            let outcome = session.commit_tx()?;
            print_commit(outcome.version, outcome.attempts)?;
        }

        Command::Scan { table } => {
            session.new_tx()?;
            for row in session.scan(&table)? {
                println!("{}", serde_json::to_string(&row?)?);
            }
            session.commit_tx()?;
        }

        Command::Log => {
            let history = session.history()?;
            println!("{}", serde_json::to_string_pretty(&history)?);
        }

        Command::Snapshot { table, version } => {
            let snapshot = match version {
                Some(version) => {
                    let latest = TransactionLog::new(Arc::clone(&store)).latest_version()?;
                    if latest.map_or(true, |latest| version > latest) {
                        bail!("version {version} has not been committed");
                    }
                    SnapshotReader::new(TransactionLog::new(store)).snapshot_at(&table, version)?
                }
                None => session.latest_snapshot(&table)?,
            };
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
    }

    Ok(())
}
