//! Admin Tools CLI
//!
//! Provides `admintools upload`, `admintools pack` and `admintools status`.

mod commands;
mod logging;

use admintools_core::AdminToolsConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "admintools")]
#[command(about = "Admin Tools - upload packages onto a wiki installation")]
#[command(version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Permanent directory holding backups and run reports
    #[arg(long, global = true, value_name = "DIR")]
    permanent_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a package archive, rolling back on failure
    Upload {
        /// Package archive (zip)
        archive: PathBuf,

        /// Installation root the package is applied to
        #[arg(short, long, value_name = "DIR")]
        install_root: Option<PathBuf>,

        /// Run identifier (defaults to a new UUID)
        #[arg(long)]
        run_id: Option<String>,

        /// Package reference used to serialize uploads (defaults to the archive path)
        #[arg(long)]
        file_ref: Option<String>,

        /// Output the run report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Build a package archive from a directory
    Pack {
        /// Directory laid out like the installation root
        source: PathBuf,
        /// Archive to create
        output: PathBuf,
    },
    /// Show the report of a previous upload run
    Status {
        /// Run identifier
        run_id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let mut config = match AdminToolsConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    if let Some(dir) = cli.permanent_dir {
        config.permanent_dir = dir;
    }
    logging::init(cli.log_level.as_deref().unwrap_or(&config.log_level));

    let result = match cli.command {
        Commands::Upload {
            archive,
            install_root,
            run_id,
            file_ref,
            json,
        } => {
            if let Some(root) = install_root {
                config.install_root = root;
            }
            commands::upload::execute(config, &archive, file_ref, run_id, json)
        }
        Commands::Pack { source, output } => {
            commands::pack::execute(&source, &output).map(|()| true)
        }
        Commands::Status { run_id, json } => {
            commands::status::execute(&config, &run_id, json).map(|()| true)
        }
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}
