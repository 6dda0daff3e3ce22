//! CLI argument definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "equiclass")]
#[command(
    author,
    version,
    about = "Identify golf balls from photographs"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to EQUICLASS_CONFIG, then the user config dir)
    #[arg(long, global = true, env = "EQUICLASS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "cli")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify the golf ball shown in one or more images
    Classify(ClassifyArgs),

    /// Manage the search index
    Index(IndexArgs),

    /// Manage the equipment catalog
    Catalog(CatalogArgs),

    /// Show stored chat history for a session
    History(HistoryArgs),

    /// Inspect configuration
    Config(ConfigArgs),

    /// Start MCP server
    Mcp,
}

#[derive(Args)]
pub struct ClassifyArgs {
    /// Image files of the same ball
    #[arg(required = true)]
    pub images: Vec<PathBuf>,

    /// Reuse an existing session id
    #[arg(long)]
    pub session_id: Option<String>,
}

#[derive(Args)]
pub struct IndexArgs {
    #[command(subcommand)]
    pub action: IndexAction,
}

#[derive(Subcommand)]
pub enum IndexAction {
    /// Create the index or update its definition
    Create,
    /// Delete the index
    Delete,
    /// Embed the catalog and upload it to the index
    Populate {
        /// Records per embedding request
        #[arg(long, default_value = "32")]
        batch_size: usize,
        /// Concurrent embedding requests
        #[arg(long, default_value = "4")]
        concurrency: usize,
    },
}

#[derive(Args)]
pub struct CatalogArgs {
    #[command(subcommand)]
    pub action: CatalogAction,
}

#[derive(Subcommand)]
pub enum CatalogAction {
    /// Import golf ball records from a CSV file
    Import { path: PathBuf },
    /// List known manufacturers
    Manufacturers,
}

#[derive(Args)]
pub struct HistoryArgs {
    pub session_id: String,
}

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration with secrets masked
    Show,
    /// Print the config file path
    Path,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    Cli,
    Json,
}
