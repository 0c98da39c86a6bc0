use super::scale::{mean_color, total_opacity};
use super::{HighlightTarget, ViewKind, ViewPayload, ViewSettings, ViewState, Visualization};
use crate::filter::{DateRange, Filter};
use crate::graph::{NumericPolicy, PairAggregate, PairStats, aggregate};
use crate::model::{Attributes, GraphView, RecordStore};
use serde::Serialize;

/// A non-empty cell of the source × target grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixCell {
    /// Column, the target position.
    pub x: usize,
    /// Row, the source position.
    pub y: usize,
    pub source: String,
    pub target: String,
    pub total: usize,
    pub mean: f64,
    pub color: String,
    pub opacity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleCalibration {
    pub min_mean: Option<f64>,
    pub max_mean: Option<f64>,
    pub max_total: usize,
    pub opacity_total_max: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixPayload {
    pub main_attribute: String,
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    pub cells: Vec<MatrixCell>,
    pub scale: ScaleCalibration,
    pub highlight: Option<HighlightTarget>,
    pub highlighted_rows: Vec<usize>,
    pub highlighted_columns: Vec<usize>,
}

/// Everything known about one cell, for the hover tooltip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellInfo {
    pub source: Option<Attributes>,
    pub target: Option<Attributes>,
    pub stats: Option<PairStats>,
}

/// Sources as rows, targets as columns, one colored cell per linked pair.
#[derive(Debug, Clone)]
pub struct AdjacencyMatrix {
    state: ViewState,
    policy: NumericPolicy,
    opacity_total_max: usize,
    main_attribute: String,
    pairs: PairAggregate,
}

impl AdjacencyMatrix {
    pub(crate) fn new(state: ViewState, settings: &ViewSettings) -> Self {
        Self {
            state,
            policy: settings.numeric_policy,
            opacity_total_max: settings.opacity_total_max,
            main_attribute: String::new(),
            pairs: PairAggregate::default(),
        }
    }

    pub fn pairs(&self) -> &PairAggregate {
        &self.pairs
    }

    pub fn cells(&self) -> Vec<MatrixCell> {
        let graph = &self.state.graph;
        self.pairs
            .iter()
            .filter_map(|((source, target), stats)| {
                let y = graph.source_nodes.position(source)?;
                let x = graph.target_nodes.position(target)?;
                Some(MatrixCell {
                    x,
                    y,
                    source: source.clone(),
                    target: target.clone(),
                    total: stats.total,
                    mean: stats.mean,
                    color: mean_color(stats.mean),
                    opacity: total_opacity(stats.total, self.opacity_total_max),
                })
            })
            .collect()
    }

    /// Cell at grid position `(x, y)`, if that pair has links.
    pub fn cell(&self, x: usize, y: usize) -> Option<MatrixCell> {
        self.cells().into_iter().find(|c| c.x == x && c.y == y)
    }

    fn highlighted_axes(&self) -> (Vec<usize>, Vec<usize>) {
        let graph = &self.state.graph;
        match &self.state.highlight {
            None => (Vec::new(), Vec::new()),
            Some(HighlightTarget::Node { identity }) => (
                graph.source_nodes.position(identity).into_iter().collect(),
                graph.target_nodes.position(identity).into_iter().collect(),
            ),
            Some(HighlightTarget::Pair { source, target }) => (
                graph.source_nodes.position(source).into_iter().collect(),
                graph.target_nodes.position(target).into_iter().collect(),
            ),
        }
    }
}

impl Visualization for AdjacencyMatrix {
    fn kind(&self) -> ViewKind {
        ViewKind::Matrix
    }

    fn has_filter(&self, attribute: &str) -> bool {
        self.state.filters.has_filter(attribute)
    }

    fn update_filter(&mut self, filter: &Filter) {
        self.state.update_filter(filter);
    }

    fn update_date_range(&mut self, range: Option<DateRange>) {
        self.state.update_date_range(range);
    }

    fn rebuild(&mut self, store: &RecordStore) {
        self.state.rebuild(store);
        self.main_attribute = super::main_attribute(store);
        self.pairs = aggregate(&self.state.graph.links, &self.main_attribute, self.policy);
    }

    fn payload(&self) -> ViewPayload {
        let graph = &self.state.graph;
        let (highlighted_rows, highlighted_columns) = self.highlighted_axes();

        ViewPayload::Matrix(MatrixPayload {
            main_attribute: self.main_attribute.clone(),
            rows: graph.source_nodes.identities().map(String::from).collect(),
            columns: graph.target_nodes.identities().map(String::from).collect(),
            cells: self.cells(),
            scale: ScaleCalibration {
                min_mean: self.pairs.min_mean(),
                max_mean: self.pairs.max_mean(),
                max_total: self.pairs.max_total(),
                opacity_total_max: self.opacity_total_max,
            },
            highlight: self.state.highlight.clone(),
            highlighted_rows,
            highlighted_columns,
        })
    }

    fn graph(&self) -> &GraphView {
        &self.state.graph
    }

    fn highlight(&mut self, target: &HighlightTarget) {
        self.state.highlight = Some(target.clone());
    }

    fn clear(&mut self) {
        self.state.highlight = None;
    }

    fn cell_info(&self, source: &str, target: &str) -> Option<CellInfo> {
        let graph = &self.state.graph;
        Some(CellInfo {
            source: graph.source_nodes.get(source).map(|n| n.attributes.clone()),
            target: graph.target_nodes.get(target).map(|n| n.attributes.clone()),
            stats: self.pairs.get(source, target).copied(),
        })
    }
}
