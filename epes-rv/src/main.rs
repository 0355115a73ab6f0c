//! epes-rv (Record Review) - command line tool for EPES servicing records
//!
//! Resolves the root folder (command line, `EPES_ROOT_FOLDER`, config file,
//! platform default), opens `epes.db` in it, and runs one subcommand.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use epes_common::config::{self, TomlConfig};
use epes_common::db::SqliteRecordStore;
use epes_common::export::ExportFormat;
use epes_common::store::RecordSubmitter;
use epes_rv::commands;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "epes-rv")]
#[command(about = "Review, export and import EPES transformer servicing records")]
#[command(version)]
struct Args {
    /// Root folder holding epes.db
    #[arg(long, global = true)]
    root_folder: Option<String>,

    /// Database file, overriding the root folder
    #[arg(long, global = true, value_name = "FILE")]
    database: Option<PathBuf>,

    /// Config file, instead of the platform config file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List stored records, newest first
    List,
    /// Print one record as JSON
    Show { id: String },
    /// Export one record to a file
    Export {
        id: String,
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Store a record from a JSON export file
    Import { file: PathBuf },
    /// Write a pre-filled JSON record to complete and import
    Template {
        /// Number of transformers
        #[arg(long, default_value_t = 1)]
        total: u32,
        /// Number of transformers with OLTC (clamped to the total)
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        with_oltc: i64,
        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    Json,
    Xlsx,
}

impl From<Format> for ExportFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Json => ExportFormat::Json,
            Format::Xlsx => ExportFormat::Xlsx,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // The config file may set the log level, so it is read before tracing
    // starts and any problem with it is reported afterwards
    let config_path = args.config.clone().or_else(config::config_file_path);
    let loaded = config_path.as_deref().map(TomlConfig::load);
    let log_level = match &loaded {
        Some(Ok(config)) => config.log_level.clone(),
        _ => None,
    }
    .unwrap_or_else(|| "info".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with_writer(io::stderr)
        .init();

    info!(
        "Starting EPES Record Review (epes-rv) v{}",
        env!("CARGO_PKG_VERSION")
    );

    let config = match loaded {
        Some(Ok(config)) => config,
        Some(Err(e)) => {
            warn!("Using default configuration: {}", e);
            TomlConfig::default()
        }
        None => TomlConfig::default(),
    };

    if let Command::Template { total, with_oltc, out } = &args.command {
        let path =
            commands::template(&config.defaults, *total, *with_oltc, out, commands::today()).await?;
        println!("{}", path.display());
        return Ok(());
    }

    let db_path = match args.database {
        Some(path) => path,
        None => {
            let root_folder = config::resolve_root_folder(args.root_folder.as_deref(), &config);
            config::database_path(&root_folder)
        }
    };
    info!("Database path: {}", db_path.display());
    let store = SqliteRecordStore::open(&db_path).await?;

    let mut stdout = io::stdout().lock();
    match args.command {
        Command::List => commands::list(&store, &mut stdout).await?,
        Command::Show { id } => commands::show(&store, &id, &mut stdout).await?,
        Command::Export { id, format, out } => {
            let path =
                commands::export(&store, &id, format.into(), &out, commands::today()).await?;
            writeln!(stdout, "{}", path.display())?;
        }
        Command::Import { file } => {
            let submitter = RecordSubmitter::new(store);
            let id = commands::import(&submitter, &file).await?;
            writeln!(stdout, "{}", id)?;
        }
        Command::Template { .. } => {}
    }

    Ok(())
}
