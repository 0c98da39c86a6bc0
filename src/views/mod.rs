//! Visualization models driven by the sync controller.
//!
//! Each view owns its own copy of the filters and its derived graph, and
//! rebuilds both wholesale whenever the controller asks it to. Views never see
//! each other: cross-highlighting only reaches them through
//! [`Visualization::highlight`] and [`Visualization::clear`].

mod hierarchy;
mod matrix;
pub mod scale;
mod timeline;

pub use hierarchy::{BundledEdge, Grouping, HierarchicalEdge, HierarchyPayload, TreeNode};
pub use matrix::{AdjacencyMatrix, CellInfo, MatrixCell, MatrixPayload, ScaleCalibration};
pub use timeline::{DateBucket, HoverWindow, LineDiagram, TimelinePayload};

use crate::filter::{DateRange, Filter, FilterEngine};
use crate::graph::{GraphBuilder, NumericPolicy};
use crate::model::{GraphView, RecordStore};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The visualizations a session can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    Matrix,
    Hierarchy,
    Timeline,
}

impl ViewKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "matrix" => Some(ViewKind::Matrix),
            "hierarchy" => Some(ViewKind::Hierarchy),
            "timeline" => Some(ViewKind::Timeline),
            _ => None,
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewKind::Matrix => write!(f, "matrix"),
            ViewKind::Hierarchy => write!(f, "hierarchy"),
            ViewKind::Timeline => write!(f, "timeline"),
        }
    }
}

/// Visualization selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ViewSelection {
    /// Adjacency matrix
    #[default]
    Matrix,
    /// Hierarchical edge bundling
    Hierarchy,
    /// Line diagram over time
    Timeline,
    /// All three, linked
    Combined,
}

impl ViewSelection {
    pub fn kinds(self) -> Vec<ViewKind> {
        match self {
            ViewSelection::Matrix => vec![ViewKind::Matrix],
            ViewSelection::Hierarchy => vec![ViewKind::Hierarchy],
            ViewSelection::Timeline => vec![ViewKind::Timeline],
            ViewSelection::Combined => {
                vec![ViewKind::Matrix, ViewKind::Hierarchy, ViewKind::Timeline]
            }
        }
    }
}

/// Something another view can point at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HighlightTarget {
    Node { identity: String },
    Pair { source: String, target: String },
}

/// Tunables shared by every view.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSettings {
    pub numeric_policy: NumericPolicy,
    pub hover_window: usize,
    pub opacity_total_max: usize,
    pub grouping: Grouping,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            numeric_policy: NumericPolicy::Zero,
            hover_window: 5,
            opacity_total_max: 50,
            grouping: Grouping::Delimiter(".".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ViewPayload {
    Matrix(MatrixPayload),
    Hierarchy(HierarchyPayload),
    Timeline(TimelinePayload),
}

/// The capability surface of a visualization instance.
pub trait Visualization: Send {
    fn kind(&self) -> ViewKind;

    /// Whether this instance filters on `attribute`.
    fn has_filter(&self, attribute: &str) -> bool;

    /// Copy the accepted values of a session filter into this instance.
    fn update_filter(&mut self, filter: &Filter);

    /// Set (or clear) the selected date range.
    fn update_date_range(&mut self, range: Option<DateRange>);

    /// Re-run filter, build and aggregation against the store.
    fn rebuild(&mut self, store: &RecordStore);

    fn payload(&self) -> ViewPayload;

    fn graph(&self) -> &GraphView;

    fn highlight(&mut self, target: &HighlightTarget);

    fn clear(&mut self);

    /// Date range selected by a click at `date`, for views that have one.
    fn click_range(&self, _date: NaiveDate) -> Option<DateRange> {
        None
    }

    /// Hover details of a source/target cell, for views laid out as a grid.
    fn cell_info(&self, _source: &str, _target: &str) -> Option<CellInfo> {
        None
    }
}

/// Filters, derived graph and highlight common to every view.
#[derive(Debug, Clone)]
pub(crate) struct ViewState {
    pub filters: FilterEngine,
    pub graph: GraphView,
    pub highlight: Option<HighlightTarget>,
}

impl ViewState {
    pub fn new(filters: FilterEngine) -> Self {
        Self {
            filters,
            graph: GraphView::default(),
            highlight: None,
        }
    }

    pub fn update_filter(&mut self, filter: &Filter) {
        if self
            .filters
            .set_filter_values(&filter.attribute, filter.values.iter().cloned())
            .is_err()
        {
            tracing::debug!(attribute = %filter.attribute, "view has no such filter");
        }
    }

    pub fn update_date_range(&mut self, range: Option<DateRange>) {
        match range {
            Some(range) => {
                if self.filters.select_date_range(range).is_err() {
                    tracing::debug!("view has no date filter");
                }
            }
            None => self.filters.clear_date_range(),
        }
    }

    pub fn rebuild(&mut self, store: &RecordStore) {
        let selection = self.filters.apply(store.records(), store.mapping());
        self.graph = GraphBuilder::new(store.mapping()).build(&selection);
    }
}

/// Create a view of `kind` whose filters start as a copy of `filters`.
pub fn create(kind: ViewKind, settings: &ViewSettings, filters: &FilterEngine) -> Box<dyn Visualization> {
    let state = ViewState::new(filters.clone());
    match kind {
        ViewKind::Matrix => Box::new(AdjacencyMatrix::new(state, settings)),
        ViewKind::Hierarchy => Box::new(HierarchicalEdge::new(state, settings)),
        ViewKind::Timeline => Box::new(LineDiagram::new(state, settings)),
    }
}

/// Main link attribute name of the store's mapping.
fn main_attribute(store: &RecordStore) -> String {
    store
        .mapping()
        .main_link_attribute()
        .map(|spec| spec.attribute.clone())
        .unwrap_or_default()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::Record;
    use crate::model::roles::tests::enron_mapping;

    pub(crate) fn enron_store(rows: &[(&str, &str, &str, &str, &str, &str)]) -> RecordStore {
        let header: Vec<String> = [
            "date",
            "fromEmail",
            "fromJobtitle",
            "toEmail",
            "toJobtitle",
            "messageType",
            "sentiment",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let records = rows
            .iter()
            .map(|(date, from, from_job, to, to_job, sentiment)| {
                Record::from_pairs([
                    ("date", *date),
                    ("fromEmail", *from),
                    ("fromJobtitle", *from_job),
                    ("toEmail", *to),
                    ("toJobtitle", *to_job),
                    ("messageType", "TO"),
                    ("sentiment", *sentiment),
                ])
            })
            .collect();

        RecordStore::new(header, records, enron_mapping()).unwrap()
    }

    pub(crate) fn seeded_filters(store: &RecordStore) -> FilterEngine {
        let mut filters = FilterEngine::new();
        filters.seed_from_store(store);
        filters
    }

    #[test]
    fn test_selection_kinds() {
        assert_eq!(ViewSelection::Combined.kinds().len(), 3);
        assert_eq!(ViewSelection::Timeline.kinds(), vec![ViewKind::Timeline]);
    }

    #[test]
    fn test_view_kind_parse_roundtrips_display() {
        for kind in [ViewKind::Matrix, ViewKind::Hierarchy, ViewKind::Timeline] {
            assert_eq!(ViewKind::parse(&kind.to_string()), Some(kind));
        }
        assert_eq!(ViewKind::parse("arc"), None);
    }

    #[test]
    fn test_highlight_target_json() {
        let target: HighlightTarget =
            serde_json::from_str(r#"{"type":"node","identity":"a@enron.com"}"#).unwrap();
        assert_eq!(
            target,
            HighlightTarget::Node {
                identity: "a@enron.com".to_string()
            }
        );
    }
}
