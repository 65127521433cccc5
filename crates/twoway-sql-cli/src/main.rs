//! twoway-sql CLI
//!
//! Command-line tool for checking, rendering and inspecting two-way SQL
//! template files.

use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod commands;

use commands::OutputFormat;

/// Two-way SQL templates: runnable SQL with directive comments.
#[derive(Parser)]
#[command(name = "twoway-sql")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse templates and report errors.
    Check {
        /// Template files.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Evaluate a template and print the SQL and bind values.
    Render {
        /// Template file.
        file: PathBuf,

        /// JSON file holding the parameters object.
        #[arg(short, long, env = "TWOWAY_SQL_PARAMS")]
        params: Option<PathBuf>,

        /// Operator override, e.g. `name=STARTS_WITH` or `range=!BETWEEN`.
        #[arg(short = 'o', long = "operator", value_name = "NAME=OP")]
        operators: Vec<String>,

        /// Output format.
        #[arg(short, long, env = "TWOWAY_SQL_FORMAT", default_value = "text")]
        format: OutputFormat,
    },

    /// Print the template with every directive removed.
    Sample {
        /// Template file.
        file: PathBuf,
    },

    /// List the parameter names a template reads.
    Params {
        /// Template file.
        file: PathBuf,
    },
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
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut out = io::stdout().lock();
    match cli.command {
        Commands::Check { files } => commands::check(&files, &mut out)?,
        Commands::Render {
            file,
            params,
            operators,
            format,
        } => commands::render(&file, params.as_deref(), &operators, format, &mut out)?,
        Commands::Sample { file } => commands::sample(&file, &mut out)?,
        Commands::Params { file } => commands::params(&file, &mut out)?,
    }

    Ok(())
}
