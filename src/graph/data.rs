use super::builder::GraphBuilder;
use super::pairs::{NumericPolicy, aggregate};
use crate::filter::{FilterEngine, FilterKind};
use crate::model::{GraphView, Link, NodeCollection, RecordStore, RoleMapping};
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

/// The filtered graph in interchange format, as served to the browser and
/// written by `export`.
#[derive(Debug, Clone, Serialize)]
pub struct GraphData {
    pub format: RoleMapping,
    /// `[source nodes, target nodes]`
    pub nodes: [NodeCollection; 2],
    pub links: Vec<Link>,
    /// Dataset bounds as `[min, max]` in `MM/DD/YYYY`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<[String; 2]>,
    pub filters: IndexMap<String, FilterState>,
    pub metadata: GraphMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterState {
    pub kind: FilterKind,
    pub domain: IndexSet<String>,
    pub selected: IndexSet<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphMetadata {
    pub total_records: usize,
    pub source_nodes: usize,
    pub target_nodes: usize,
    pub total_links: usize,
    pub total_pairs: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_range: Option<[String; 2]>,
}

impl GraphData {
    /// Filter the store with `filters` and package the result.
    pub fn from_session(
        store: &RecordStore,
        filters: &FilterEngine,
        domains: &IndexMap<String, IndexSet<String>>,
        policy: NumericPolicy,
    ) -> Self {
        let selection = filters.apply(store.records(), store.mapping());
        let graph = GraphBuilder::new(store.mapping()).build(&selection);
        Self::from_graph(store, graph, filters, domains, policy)
    }

    /// Unfiltered graph of the whole store, every value selected.
    pub fn from_store(store: &RecordStore, policy: NumericPolicy) -> Self {
        let mut filters = FilterEngine::new();
        let domains = filters.seed_from_store(store);
        Self::from_session(store, &filters, &domains, policy)
    }

    fn from_graph(
        store: &RecordStore,
        graph: GraphView,
        filters: &FilterEngine,
        domains: &IndexMap<String, IndexSet<String>>,
        policy: NumericPolicy,
    ) -> Self {
        let main = store
            .mapping()
            .main_link_attribute()
            .map(|spec| spec.attribute.as_str())
            .unwrap_or_default();
        let pairs = aggregate(&graph.links, main, policy);

        let filter_states = filters
            .filters()
            .iter()
            .map(|f| {
                let state = FilterState {
                    kind: f.kind,
                    domain: domains.get(&f.attribute).cloned().unwrap_or_default(),
                    selected: f.values.clone(),
                };
                (f.attribute.clone(), state)
            })
            .collect();

        let date_filter = filters.date_filter();
        let metadata = GraphMetadata {
            total_records: store.len(),
            source_nodes: graph.source_nodes.len(),
            target_nodes: graph.target_nodes.len(),
            total_links: graph.links.len(),
            total_pairs: pairs.len(),
            selected_range: date_filter
                .and_then(|f| f.selected())
                .map(|r| r.formatted()),
        };

        let GraphView {
            source_nodes,
            target_nodes,
            links,
        } = graph;

        Self {
            format: store.mapping().clone(),
            nodes: [source_nodes, target_nodes],
            links,
            date: store.date_bounds().map(|b| b.formatted()),
            filters: filter_states,
            metadata,
        }
    }
}
