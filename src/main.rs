//! quarry CLI

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;

use cmd::install::ResolveFlags;

#[derive(Parser)]
#[command(name = "quarry")]
#[command(author, version, about = "quarry - a recipe-driven build-dependency manager")]
pub struct Cli {
    /// Show what would happen without making changes
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a recipe and emit its generator files
    Install {
        /// Recipe directory (containing quarry.toml)
        #[arg(default_value = ".")]
        dir: PathBuf,
        /// Directory for generated files (defaults to the recipe directory)
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Settings profile file
        #[arg(long, env = "QUARRY_PROFILE")]
        profile: Option<PathBuf>,
        /// Override a settings axis: -s os=Linux
        #[arg(short = 's', long = "setting")]
        settings: Vec<String>,
        /// Override an option: -o shared=true
        #[arg(short = 'o', long = "option")]
        options: Vec<String>,
        /// Fail if quarry.lock is missing or out of sync (for CI)
        #[arg(long)]
        frozen: bool,
    },
    /// Export a recipe directory into the local store and index
    Export {
        /// Recipe directory (containing quarry.toml)
        dir: PathBuf,
    },
    /// Run a recipe's packaging steps into a staging tree
    Package {
        /// Recipe directory (containing quarry.toml)
        #[arg(default_value = ".")]
        dir: PathBuf,
        /// Staging directory (defaults to <dir>/package)
        #[arg(long)]
        staging_dir: Option<PathBuf>,
        /// Settings profile file
        #[arg(long, env = "QUARRY_PROFILE")]
        profile: Option<PathBuf>,
        /// Override a settings axis: -s os=Linux
        #[arg(short = 's', long = "setting")]
        settings: Vec<String>,
        /// Override an option: -o shared=true
        #[arg(short = 'o', long = "option")]
        options: Vec<String>,
    },
    /// Show a recipe's resolved configuration
    Info {
        /// Recipe directory (containing quarry.toml)
        #[arg(default_value = ".")]
        dir: PathBuf,
        /// Settings profile file
        #[arg(long, env = "QUARRY_PROFILE")]
        profile: Option<PathBuf>,
        /// Override a settings axis: -s os=Linux
        #[arg(short = 's', long = "setting")]
        settings: Vec<String>,
        /// Override an option: -o shared=true
        #[arg(short = 'o', long = "option")]
        options: Vec<String>,
    },
    /// List exported packages
    List,
    /// Search exported packages
    Search {
        /// Search query
        query: String,
    },
    /// Remove an exported package: name or name@version
    Remove {
        /// Package spec (e.g. glad or glad@0.1.36)
        spec: String,
        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let dry_run = cli.dry_run;

    match cli.command {
        Commands::Install {
            dir,
            out_dir,
            profile,
            settings,
            options,
            frozen,
        } => cmd::install::install(
            dir,
            out_dir,
            ResolveFlags {
                profile,
                settings,
                options,
            },
            frozen,
            dry_run,
        ),
        Commands::Export { dir } => cmd::export::export(&dir, dry_run),
        Commands::Package {
            dir,
            staging_dir,
            profile,
            settings,
            options,
        } => cmd::package::package(
            dir,
            staging_dir,
            ResolveFlags {
                profile,
                settings,
                options,
            },
        ),
        Commands::Info {
            dir,
            profile,
            settings,
            options,
        } => cmd::info::info(
            dir,
            ResolveFlags {
                profile,
                settings,
                options,
            },
        ),
        Commands::List => cmd::list::list(),
        Commands::Search { query } => cmd::search::search(&query),
        Commands::Remove { spec, yes } => cmd::remove::remove(&spec, yes, dry_run),
        Commands::Completions { shell } => {
            cmd::completions::completions(shell);
            Ok(())
        }
    }
}
