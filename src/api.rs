//! Library API for relviz.
//!
//! The CLI commands print and return exit codes; these functions return
//! `Result`s for use from other Rust code.
//!
//! # Example
//!
//! ```no_run
//! use relviz::{ExportOptions, export};
//! use std::path::Path;
//!
//! let data = export(Path::new("mail.csv"), ExportOptions::default())?;
//! println!("{} links", data.links.len());
//! # Ok::<(), relviz::RelvizError>(())
//! ```

use crate::config::{Config, ConfigError};
use crate::filter::{DateRange, FilterEngine, FilterError};
use crate::fs::{FileSystem, default_fs};
use crate::graph::GraphData;
use crate::loader::{self, LoadError};
use crate::model::{ColumnRow, RecordStore};
use crate::output::Summary;
use crate::sync::{Discard, SyncError, ViewSyncController};
use crate::views::{ViewKind, ViewPayload, ViewSelection};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelvizError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    #[error("Session error: {0}")]
    Sync(#[from] SyncError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A loaded CSV together with the config that applied to it.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub path: PathBuf,
    pub config: Config,
    pub store: RecordStore,
}

/// Options for [`export`] and [`export_views`].
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Config file to use instead of the one next to the CSV.
    pub config: Option<PathBuf>,
    /// Accepted values per attribute; attributes not listed keep every value.
    pub filters: Vec<(String, Vec<String>)>,
    pub date_range: Option<DateRange>,
}

/// Load a CSV with its config.
pub fn load(path: &Path, config: Option<&Path>) -> Result<Dataset, RelvizError> {
    load_with_fs(default_fs(), path, config)
}

pub fn load_with_fs(
    fs: &dyn FileSystem,
    path: &Path,
    config: Option<&Path>,
) -> Result<Dataset, RelvizError> {
    let config = Config::load(fs, path, config)?;
    let store = loader::load(fs, path, config.roles.clone())?;
    Ok(Dataset {
        path: path.to_path_buf(),
        config,
        store,
    })
}

/// The column table of a CSV with suggested roles.
pub fn columns(path: &Path) -> Result<Vec<ColumnRow>, RelvizError> {
    Ok(loader::read_table(default_fs(), path)?.columns())
}

/// Dataset statistics with the `top` busiest pairs.
pub fn summarize(path: &Path, config: Option<&Path>, top: usize) -> Result<Summary, RelvizError> {
    let dataset = load(path, config)?;
    Ok(Summary::from_dataset(&dataset, top))
}

/// The filtered graph in interchange format.
pub fn export(path: &Path, options: ExportOptions) -> Result<GraphData, RelvizError> {
    let dataset = load(path, options.config.as_deref())?;
    filtered_graph(&dataset, &options)
}

/// Interchange data for an already loaded dataset.
pub fn filtered_graph(dataset: &Dataset, options: &ExportOptions) -> Result<GraphData, RelvizError> {
    let mut filters = FilterEngine::new();
    let domains = filters.seed_from_store(&dataset.store);
    for (attribute, values) in &options.filters {
        filters.set_filter_values(attribute, values.iter().cloned())?;
    }
    if let Some(range) = options.date_range {
        filters.select_date_range(range)?;
    }

    Ok(GraphData::from_session(
        &dataset.store,
        &filters,
        &domains,
        dataset.config.views.numeric_policy,
    ))
}

/// A session seeded with `dataset` showing `selection`.
pub fn session(dataset: Dataset, selection: ViewSelection) -> ViewSyncController {
    let mut controller = ViewSyncController::new(dataset.config.views.clone());
    controller.select(selection, &mut Discard);
    controller.load(dataset.store, &mut Discard);
    controller
}

/// Render payloads of the selected views after applying `options`.
pub fn export_views(
    path: &Path,
    selection: ViewSelection,
    options: ExportOptions,
) -> Result<Vec<(ViewKind, ViewPayload)>, RelvizError> {
    let dataset = load(path, options.config.as_deref())?;
    view_payloads(dataset, selection, &options)
}

/// Payloads of the selected views for an already loaded dataset.
pub fn view_payloads(
    dataset: Dataset,
    selection: ViewSelection,
    options: &ExportOptions,
) -> Result<Vec<(ViewKind, ViewPayload)>, RelvizError> {
    let mut controller = session(dataset, selection);

    for (attribute, values) in &options.filters {
        controller.set_filter_values(attribute, values.iter().cloned(), &mut Discard)?;
    }
    if let Some(range) = options.date_range {
        controller.set_date_range(Some(range), &mut Discard)?;
    }

    selection
        .kinds()
        .into_iter()
        .map(|kind| Ok((kind, controller.payload(kind)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFs;

    const CSV: &str = "\
date,fromEmail,fromJobtitle,toEmail,toJobtitle,messageType,sentiment
2001-05-14,ann,CEO,bob,Trader,TO,0.5
2001-05-15,bob,Trader,ann,CEO,TO,-0.5
";

    #[test]
    fn test_load_with_config_roles() {
        let fs = MockFs::with_files([
            ("/d/mail.csv", CSV),
            (
                "/d/.relviz.toml",
                r#"
[roles]
source = [{ column = "fromJobtitle", attribute = "role" }]
target = [{ column = "toJobtitle", attribute = "role" }]
links = [{ column = "sentiment", attribute = "sentiment" }]
"#,
            ),
        ]);

        let dataset = load_with_fs(&fs, Path::new("/d/mail.csv"), None).unwrap();
        assert_eq!(
            dataset.store.mapping().identity(crate::model::Side::Source).unwrap().attribute,
            "role"
        );
        assert!(dataset.store.mapping().date().is_none());
    }

    #[test]
    fn test_load_with_bad_config() {
        let fs = MockFs::with_files([("/d/mail.csv", CSV), ("/d/.relviz.toml", "[views\n")]);
        let err = load_with_fs(&fs, Path::new("/d/mail.csv"), None).unwrap_err();
        assert!(matches!(err, RelvizError::Config(ConfigError::Parse(_))));
    }

    #[test]
    fn test_filtered_graph_rejects_unknown_attribute() {
        let fs = MockFs::with_files([("/d/mail.csv", CSV)]);
        let dataset = load_with_fs(&fs, Path::new("/d/mail.csv"), None).unwrap();
        let options = ExportOptions {
            filters: vec![("team".to_string(), vec!["x".to_string()])],
            ..ExportOptions::default()
        };

        let err = filtered_graph(&dataset, &options).unwrap_err();
        assert!(matches!(err, RelvizError::Filter(FilterError::UnknownAttribute(_))));
    }

    #[test]
    fn test_session_is_seeded() {
        let fs = MockFs::with_files([("/d/mail.csv", CSV)]);
        let dataset = load_with_fs(&fs, Path::new("/d/mail.csv"), None).unwrap();
        let controller = session(dataset, ViewSelection::Combined);

        assert!(controller.session().is_seeded());
        assert_eq!(controller.session().registered().count(), 3);
        assert!(controller.payload(ViewKind::Hierarchy).is_ok());
    }
}
