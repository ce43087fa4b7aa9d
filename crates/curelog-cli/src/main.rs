mod chart;
mod commands;
mod display;

use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use curelog_core::SoapKey;
use curelog_store::{CsvStore, NewSoap, SoapLedger, TabularStore};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "curelog", version, about = "Track weight loss of curing soap bars")]
struct Cli {
    /// Directory holding the CSV sheets.
    #[arg(long, env = "CURELOG_DATA_DIR", default_value = "curelog-data", global = true)]
    data_dir: PathBuf,

    /// Where the sheets are stored.
    #[arg(long, env = "CURELOG_BACKEND", value_enum, default_value_t = Backend::Csv, global = true)]
    backend: Backend,

    /// DuckDB database file (duckdb backend; defaults to <data-dir>/curelog.duckdb).
    #[arg(long, env = "CURELOG_DUCKDB", global = true)]
    duckdb_path: Option<PathBuf>,

    /// Log debug output to stderr (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum Backend {
    Csv,
    Duckdb,
}

#[derive(Subcommand)]
enum Command {
    /// Retained-weight curves for every soap.
    Overview {
        /// Soap type to show, or "All".
        #[arg(long = "type", default_value = "All")]
        soap_type: String,
        /// Case-insensitive part of the soap name.
        #[arg(long, default_value = "")]
        search: String,
        /// Print the series as JSON instead of a chart.
        #[arg(long)]
        json: bool,
    },
    /// List soap types for the overview filter.
    Types,
    /// Details, readings, and weight chart of one soap; lists soaps without a name.
    Show {
        name: Option<String>,
        #[arg(long, default_value = "")]
        batch: String,
    },
    /// Create a soap batch with its first reading.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        batch: String,
        #[arg(long = "type", default_value = "")]
        soap_type: String,
        #[arg(long)]
        height: Option<f64>,
        #[arg(long)]
        width: Option<f64>,
        #[arg(long)]
        thickness: Option<f64>,
        #[arg(long, default_value = "")]
        notes: String,
        /// Initial weight in grams.
        #[arg(long)]
        weight: f64,
        /// Initial date (defaults to today).
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
    },
    /// Record a weight reading.
    AddReading {
        name: String,
        #[arg(long, default_value = "")]
        batch: String,
        /// Weight in grams.
        #[arg(long)]
        weight: f64,
        /// Reading date (defaults to today).
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
    },
    /// Delete a soap and all its readings.
    Delete {
        name: String,
        #[arg(long, default_value = "")]
        batch: String,
        /// Confirm deletion.
        #[arg(long)]
        yes: bool,
    },
}

fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    curelog_core::cells::parse_date(s).ok_or_else(|| format!("unrecognised date: {s}"))
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn open_store(cli: &Cli) -> anyhow::Result<Box<dyn TabularStore>> {
    match cli.backend {
        Backend::Csv => {
            let store = CsvStore::open(&cli.data_dir)
                .with_context(|| format!("opening {}", cli.data_dir.display()))?;
            Ok(Box::new(store))
        }
        Backend::Duckdb => open_duckdb(cli),
    }
}

#[cfg(feature = "duckdb")]
fn open_duckdb(cli: &Cli) -> anyhow::Result<Box<dyn TabularStore>> {
    let path = cli
        .duckdb_path
        .clone()
        .unwrap_or_else(|| cli.data_dir.join("curelog.duckdb"));
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let store = curelog_store::DuckStore::open_persistent(&path)
        .with_context(|| format!("opening {}", path.display()))?;
    Ok(Box::new(store))
}

#[cfg(not(feature = "duckdb"))]
fn open_duckdb(cli: &Cli) -> anyhow::Result<Box<dyn TabularStore>> {
    let path = cli.duckdb_path.as_deref().unwrap_or(cli.data_dir.as_path());
    anyhow::bail!(
        "cannot open {}: curelog was built without the duckdb feature",
        path.display()
    )
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
    tracing::info!("curelog v{}", env!("CARGO_PKG_VERSION"));

    let mut ledger = SoapLedger::new(open_store(&cli)?);

    match cli.command {
        Command::Overview {
            soap_type,
            search,
            json,
        } => commands::overview(&ledger, &soap_type, &search, json),
        Command::Types => commands::types(&ledger),
        Command::Show { name, batch } => commands::show(&ledger, name.as_deref(), &batch),
        Command::Create {
            name,
            batch,
            soap_type,
            height,
            width,
            thickness,
            notes,
            weight,
            date,
        } => commands::create(
            &mut ledger,
            NewSoap {
                name,
                batch_number: batch,
                soap_type,
                height_mm: height,
                width_mm: width,
                thickness_mm: thickness,
                notes,
                initial_weight_g: weight,
                initial_date: Some(date.unwrap_or_else(today)),
            },
        ),
        Command::AddReading {
            name,
            batch,
            weight,
            date,
        } => commands::add_reading(
            &mut ledger,
            &SoapKey::new(name, batch),
            date.unwrap_or_else(today),
            weight,
        ),
        Command::Delete { name, batch, yes } => {
            commands::delete(&mut ledger, &SoapKey::new(name, batch), yes)
        }
    }
}
