//! oxide-dialect CLI
//!
//! Command-line tool for compiling vendor-neutral operations to SQL.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_dialect::ast::{DataType, Operation};
use oxide_dialect::dialect::dialect_name_from_url;
use oxide_dialect::{DatabaseVersion, Dialect, DialectConfig, DialectRegistry};

/// Compile database operations for a specific SQL dialect.
#[derive(Parser)]
#[command(name = "oxide-dialect")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Dialect name or alias (postgres, mysql, sqlite, ...).
    #[arg(short, long, env = "OXIDE_DIALECT", default_value = "generic")]
    dialect: String,

    /// Connection URL to guess the dialect from; overrides --dialect.
    #[arg(short, long, env = "DATABASE_URL")]
    url: Option<String>,

    /// JSON dialect configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server version, e.g. 8.0.36.
    #[arg(long)]
    server_version: Option<String>,

    /// Render values inline instead of as placeholders.
    #[arg(long)]
    inline: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile operations read from a JSON file (one operation or an array).
    Compile {
        /// Path to the JSON file.
        file: PathBuf,
    },

    /// Show the column type names of the dialect.
    Types,

    /// List registered dialect names.
    Dialects,
}

fn build_dialect(cli: &Cli, registry: &DialectRegistry) -> anyhow::Result<Dialect> {
    let mut config = match &cli.config {
        Some(path) => DialectConfig::from_path(path)
            .with_context(|| format!("reading configuration {}", path.display()))?,
        None => DialectConfig::default(),
    };
    if let Some(version) = &cli.server_version {
        config = config.with_version(version.parse::<DatabaseVersion>()?);
    }
    if cli.inline {
        config = config.inline();
    }

    let name = match &cli.url {
        Some(url) => dialect_name_from_url(url)
            .with_context(|| format!("cannot guess the dialect of {url}"))?,
        None => cli.dialect.as_str(),
    };
    let dialect = registry.resolve(name, config)?;
    debug!(dialect = dialect.name(), "Resolved dialect");
    Ok(dialect)
}

fn read_operations(file: &Path) -> anyhow::Result<Vec<Operation>> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let value: serde_json::Value = serde_json::from_str(&json)?;
    let operations = if value.is_array() {
        serde_json::from_value(value)?
    } else {
        vec![serde_json::from_value(value)?]
    };
    Ok(operations)
}

fn sample_types() -> Vec<DataType> {
    vec![
        DataType::Short,
        DataType::Integer,
        DataType::Long,
        DataType::Float,
        DataType::Double,
        DataType::Decimal {
            precision: 10,
            scale: 2,
        },
        DataType::Char(10),
        DataType::Varchar(255),
        DataType::Text,
        DataType::Binary(Some(16)),
        DataType::Blob,
        DataType::Uuid,
        DataType::Date,
        DataType::Time,
        DataType::DateTime,
        DataType::TimestampWithTimeZone,
        DataType::Boolean,
        DataType::Json,
        DataType::Jsonb,
    ]
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let registry = DialectRegistry::new();

    match &cli.command {
        Commands::Dialects => {
            for name in registry.names() {
                println!("{name}");
            }
        }

        Commands::Types => {
            let dialect = build_dialect(&cli, &registry)?;
            info!("Column types for {}:", dialect.name());
            for data_type in sample_types() {
                match dialect.types().render_type(&dialect, &data_type) {
                    Ok(name) => println!("{:<40} {name}", format!("{data_type:?}")),
                    Err(e) => println!("{:<40} ({e})", format!("{data_type:?}")),
                }
            }
        }

        Commands::Compile { file } => {
            let dialect = build_dialect(&cli, &registry)?;
            let operations = read_operations(file)?;
            info!(
                "Compiling {} operation(s) for {}",
                operations.len(),
                dialect.name()
            );
            for operation in &operations {
                for statement in dialect.compile(operation)? {
                    println!("{};", statement.sql);
                    if !statement.params.is_empty() {
                        let params: Vec<String> = statement
                            .params
                            .iter()
                            .map(oxide_dialect::SqlValue::to_sql_inline)
                            .collect();
                        println!("-- params: {}", params.join(", "));
                    }
                }
            }
        }
    }

    Ok(())
}
