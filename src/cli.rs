use crate::views::ViewSelection;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "relviz")]
#[command(about = "Explore relational CSV data as linked graph views")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Serve the interactive views for a CSV file
    Serve(ServeArgs),

    /// Write the filtered graph (or view payloads) as JSON
    Export(ExportArgs),

    /// Print dataset statistics and the busiest pairs
    Summary(SummaryArgs),

    /// List the columns of a CSV file with their suggested roles
    Columns(ColumnsArgs),

    /// Generate a starter .relviz.toml next to a CSV file
    Init(InitArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct ServeArgs {
    /// CSV file to load
    pub csv: PathBuf,

    /// Config file (defaults to .relviz.toml next to the CSV)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Views to show
    #[arg(long, default_value = "combined")]
    pub view: ViewSelection,

    /// Port for HTTP server
    #[arg(long, default_value = "3000")]
    pub port: u16,

    /// Open browser automatically
    #[arg(long)]
    pub open: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct ExportArgs {
    /// CSV file to load
    pub csv: PathBuf,

    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Export rendered view payloads instead of the interchange graph
    #[arg(long)]
    pub view: Option<ViewSelection>,

    /// Accepted values for an attribute, as attr=v1,v2 (repeatable)
    #[arg(long = "filter", value_name = "ATTR=VALUES")]
    pub filters: Vec<String>,

    /// First day of the date range (YYYY-MM-DD)
    #[arg(long, requires = "to")]
    pub from: Option<String>,

    /// Last day of the date range (YYYY-MM-DD)
    #[arg(long, requires = "from")]
    pub to: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct SummaryArgs {
    /// CSV file to load
    pub csv: PathBuf,

    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[arg(short, long, default_value = "markdown")]
    pub format: OutputFormat,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of pairs to list
    #[arg(long, default_value = "10")]
    pub top: usize,
}

#[derive(Parser, Debug, Clone)]
pub struct ColumnsArgs {
    /// CSV file to inspect
    pub csv: PathBuf,

    #[arg(short, long, default_value = "markdown")]
    pub format: OutputFormat,
}

#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// CSV file whose header seeds the config
    pub csv: PathBuf,

    /// Overwrite an existing .relviz.toml
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Markdown,
    Json,
}
