mod json;
mod markdown;

pub use json::{JsonOutput, write_json};
pub use markdown::MarkdownOutput;

use crate::api::Dataset;
use crate::filter::{FilterEngine, FilterKind};
use crate::graph::{GraphBuilder, aggregate};
use crate::model::Side;
use serde::Serialize;
use std::cmp::Ordering;
use std::io::Write;

pub trait OutputFormatter {
    fn format<W: Write>(&self, summary: &Summary, writer: &mut W) -> std::io::Result<()>;
}

/// Statistics of a loaded dataset, as printed by `summary`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub dataset: String,
    pub records: usize,
    pub source_nodes: usize,
    pub target_nodes: usize,
    pub links: usize,
    pub pairs: usize,
    /// Links left out of the pairs because their main attribute was not numeric.
    pub skipped_links: usize,
    pub main_attribute: Option<String>,
    pub mean_range: Option<[f64; 2]>,
    /// `[min, max]` in `MM/DD/YYYY`.
    pub date_range: Option<[String; 2]>,
    pub attributes: Vec<AttributeSummary>,
    pub top_pairs: Vec<PairSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeSummary {
    pub attribute: String,
    pub kind: FilterKind,
    pub distinct: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairSummary {
    pub source: String,
    pub target: String,
    pub total: usize,
    pub mean: f64,
}

impl Summary {
    /// Summarize the whole dataset, listing the `top` pairs with the most links.
    pub fn from_dataset(dataset: &Dataset, top: usize) -> Self {
        let store = &dataset.store;
        let mapping = store.mapping();

        let mut filters = FilterEngine::new();
        let domains = filters.seed_from_store(store);
        let selection = filters.apply(store.records(), mapping);
        let graph = GraphBuilder::new(mapping).build(&selection);

        let main_attribute = mapping.main_link_attribute().map(|s| s.attribute.clone());
        let pairs = main_attribute
            .as_deref()
            .map(|attr| aggregate(&graph.links, attr, dataset.config.views.numeric_policy))
            .unwrap_or_default();

        let mut top_pairs: Vec<PairSummary> = pairs
            .entries()
            .map(|e| PairSummary {
                source: e.source.to_string(),
                target: e.target.to_string(),
                total: e.total,
                mean: e.mean,
            })
            .collect();
        top_pairs.sort_by(|a, b| match b.total.cmp(&a.total) {
            Ordering::Equal => (&a.source, &a.target).cmp(&(&b.source, &b.target)),
            other => other,
        });
        top_pairs.truncate(top);

        let attributes = domains
            .iter()
            .map(|(attribute, domain)| AttributeSummary {
                attribute: attribute.clone(),
                kind: filters.filter(attribute).map(|f| f.kind).unwrap_or_default(),
                distinct: domain.len(),
            })
            .collect();

        let dataset_name = dataset
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| dataset.path.display().to_string());

        Self {
            dataset: dataset_name,
            records: store.len(),
            source_nodes: graph.nodes(Side::Source).len(),
            target_nodes: graph.nodes(Side::Target).len(),
            links: graph.links.len(),
            pairs: pairs.len(),
            skipped_links: pairs.skipped(),
            main_attribute,
            mean_range: pairs.min_mean().zip(pairs.max_mean()).map(|(lo, hi)| [lo, hi]),
            date_range: store.date_bounds().map(|r| r.formatted()),
            attributes,
            top_pairs,
        }
    }
}
