//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Wharf - a dependency manager for embedded firmware components
#[derive(Parser)]
#[command(name = "wharf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve dependencies and download components (updates dependencies.lock)
    Resolve(ResolveArgs),

    /// Validate manifests without resolving
    Validate(ValidateArgs),

    /// Print the manifest JSON schema
    Schema,

    /// Manage the component cache
    Cache(CacheArgs),
}

/// Options shared by commands that read the project.
#[derive(Args)]
pub struct ProjectArgs {
    /// Project directory (defaults to the current directory)
    #[arg(long, default_value = ".")]
    pub project_dir: PathBuf,

    /// Build target identifier
    #[arg(long, env = "IDF_TARGET")]
    pub target: Option<String>,

    /// Toolchain version
    #[arg(long, env = "IDF_VERSION")]
    pub idf_version: Option<String>,
}

#[derive(Args)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Component cache directory (defaults to the per-user cache)
    #[arg(long)]
    pub cache_path: Option<PathBuf>,
}

#[derive(Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub project: ProjectArgs,
}

#[derive(Args)]
pub struct CacheArgs {
    /// Component cache directory (defaults to the per-user cache)
    #[arg(long)]
    pub cache_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CacheCommands,
}

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Print the cache directory
    Path,

    /// Print the total cache size in bytes
    Size,

    /// Remove every cache entry
    Clear,

    /// Remove entries the project's lock file does not reference
    Reclaim {
        /// Project directory (defaults to the current directory)
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
    },
}
