mod columns;
mod export;
mod init;
mod serve;
mod summary;

pub use columns::cmd_columns;
pub use export::cmd_export;
pub use init::{cmd_init, cmd_init_with_fs};
pub use serve::cmd_serve;
pub use summary::cmd_summary;

use crate::api::Dataset;
use crate::config::Config;
use crate::fs::{FileSystem, default_fs};
use crate::loader::{self, LoadError};
use crate::style;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Shared setup for commands that work on a loaded CSV.
pub struct CommandContext {
    pub path: PathBuf,
    pub dataset: Dataset,
}

impl CommandContext {
    /// Load the config and the CSV. Returns Err(exit_code) if loading fails.
    pub fn new(csv: &Path, config: Option<&Path>) -> Result<Self, i32> {
        Self::with_fs(csv, config, default_fs())
    }

    pub fn with_fs(csv: &Path, config: Option<&Path>, fs: &dyn FileSystem) -> Result<Self, i32> {
        let config = Config::load(fs, csv, config).unwrap_or_else(|e| {
            style::warning(&format!("{}. Using defaults.", e));
            Config::default()
        });

        let store = match loader::load(fs, csv, config.roles.clone()) {
            Ok(store) => store,
            Err(e) => {
                style::error(&e.to_string());
                if matches!(e, LoadError::Mapping(_)) {
                    style::hint(&format!(
                        "Run `relviz columns {}` to see the suggested roles",
                        csv.display()
                    ));
                }
                return Err(1);
            }
        };

        if store.is_empty() {
            style::warning(&format!("{} has no records", style::path(csv)));
        }

        Ok(Self {
            path: csv.to_path_buf(),
            dataset: Dataset {
                path: csv.to_path_buf(),
                config,
                store,
            },
        })
    }
}

/// Write `content` to `output`, or to stdout when none is given.
pub(crate) fn emit(content: &str, output: Option<&Path>, fs: &dyn FileSystem) -> i32 {
    match output {
        Some(path) => {
            if let Err(e) = fs.write(path, content) {
                style::error(&format!("Could not write output file: {}", e));
                return 1;
            }
            style::success(&format!("Wrote {}", style::path(path)));
        }
        None => {
            let mut stdout = io::stdout();
            if let Err(e) = stdout.write_all(content.as_bytes()).and_then(|_| stdout.flush()) {
                style::error(&format!("Failed to write output: {}", e));
                return 1;
            }
        }
    }
    0
}
