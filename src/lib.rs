pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod filter;
pub mod fs;
pub mod graph;
pub mod loader;
pub mod model;
pub mod output;
pub mod server;
pub mod style;
pub mod sync;
pub mod views;

pub use api::{Dataset, ExportOptions, RelvizError, export, export_views, load, summarize};
pub use cli::Cli;
pub use commands::{cmd_columns, cmd_export, cmd_init, cmd_serve, cmd_summary};
pub use config::Config;
pub use filter::{DateRange, FilterEngine};
pub use graph::GraphData;
pub use model::{RecordStore, RoleMapping};
pub use sync::ViewSyncController;
pub use views::{ViewKind, ViewSelection};
