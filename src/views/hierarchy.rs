use super::scale::{mean_color, total_opacity};
use super::{HighlightTarget, ViewKind, ViewPayload, ViewSettings, ViewState, Visualization};
use crate::filter::{DateRange, Filter};
use crate::graph::{NumericPolicy, aggregate};
use crate::model::{GraphView, Node, RecordStore};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Group label for nodes lacking the grouping attribute.
const UNGROUPED: &str = "(none)";

/// How leaves are arranged into a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grouping {
    /// One level of groups keyed by a node attribute.
    Attribute(String),
    /// Split identities on a delimiter, `a.b.c` under `a.b` under `a`.
    Delimiter(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode {
    pub id: usize,
    pub name: String,
    pub key: String,
    pub parent: Option<usize>,
    pub leaf: bool,
}

/// One aggregated pair drawn along the tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BundledEdge {
    pub source: String,
    pub target: String,
    pub total: usize,
    pub mean: f64,
    pub color: String,
    pub opacity: f64,
    /// Tree node ids from the source leaf up to the common ancestor and down
    /// to the target leaf.
    pub path: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyPayload {
    pub nodes: Vec<TreeNode>,
    pub edges: Vec<BundledEdge>,
    pub highlight: Option<HighlightTarget>,
    pub highlighted_edges: Vec<usize>,
}

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    key: String,
    leaf: bool,
}

/// Identities as leaves of a tree, links bundled through their common ancestor.
#[derive(Debug, Clone)]
pub struct HierarchicalEdge {
    state: ViewState,
    policy: NumericPolicy,
    opacity_total_max: usize,
    grouping: Grouping,
    tree: DiGraph<Entry, ()>,
    root: NodeIndex,
    paths: HashMap<String, NodeIndex>,
    leaves: HashMap<String, NodeIndex>,
    edges: Vec<BundledEdge>,
}

impl HierarchicalEdge {
    pub(crate) fn new(state: ViewState, settings: &ViewSettings) -> Self {
        let (tree, root) = empty_tree();
        Self {
            state,
            policy: settings.numeric_policy,
            opacity_total_max: settings.opacity_total_max,
            grouping: settings.grouping.clone(),
            tree,
            root,
            paths: HashMap::new(),
            leaves: HashMap::new(),
            edges: Vec::new(),
        }
    }

    pub fn edges(&self) -> &[BundledEdge] {
        &self.edges
    }

    pub fn nodes(&self) -> Vec<TreeNode> {
        self.tree
            .node_indices()
            .map(|idx| {
                let entry = &self.tree[idx];
                TreeNode {
                    id: idx.index(),
                    name: entry.name.clone(),
                    key: entry.key.clone(),
                    parent: self.parent(idx).map(|p| p.index()),
                    leaf: entry.leaf,
                }
            })
            .collect()
    }

    /// Names along the bundled path between two leaves.
    pub fn path_names(&self, source: &str, target: &str) -> Option<Vec<String>> {
        let path = self.bundle(*self.leaves.get(source)?, *self.leaves.get(target)?);
        Some(path.into_iter().map(|i| self.tree[i].name.clone()).collect())
    }

    fn reset(&mut self) {
        let (tree, root) = empty_tree();
        self.tree = tree;
        self.root = root;
        self.paths.clear();
        self.leaves.clear();
        self.edges.clear();
    }

    /// (name, key) for each level from the top group down to the leaf.
    fn levels(&self, node: &Node) -> Vec<(String, String)> {
        let identity = node.identity.as_str();
        match &self.grouping {
            Grouping::Attribute(attribute) => {
                let group = node.attribute(attribute).unwrap_or(UNGROUPED);
                vec![
                    (group.to_string(), group.to_string()),
                    (identity.to_string(), identity.to_string()),
                ]
            }
            Grouping::Delimiter(delimiter) if !delimiter.is_empty() => {
                let mut levels = Vec::new();
                let mut name = String::new();
                for (i, part) in identity.split(delimiter.as_str()).enumerate() {
                    if i > 0 {
                        name.push_str(delimiter);
                    }
                    name.push_str(part);
                    levels.push((name.clone(), part.to_string()));
                }
                levels
            }
            Grouping::Delimiter(_) => vec![(identity.to_string(), identity.to_string())],
        }
    }

    fn insert_leaf(&mut self, node: &Node) {
        let levels = self.levels(node);
        let mut parent = self.root;
        let mut path_key = String::new();

        for (depth, (name, key)) in levels.iter().enumerate() {
            path_key.push('\u{1f}');
            path_key.push_str(key);

            let idx = match self.paths.get(&path_key) {
                Some(idx) => *idx,
                None => {
                    let idx = self.tree.add_node(Entry {
                        name: name.clone(),
                        key: key.clone(),
                        leaf: false,
                    });
                    self.tree.add_edge(parent, idx, ());
                    self.paths.insert(path_key.clone(), idx);
                    idx
                }
            };
            if depth + 1 == levels.len() {
                self.tree[idx].leaf = true;
                self.leaves.insert(node.identity.clone(), idx);
            }
            parent = idx;
        }
    }

    fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.tree.neighbors_directed(idx, Direction::Incoming).next()
    }

    fn ancestors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut chain = vec![idx];
        let mut current = idx;
        while let Some(parent) = self.parent(current) {
            chain.push(parent);
            current = parent;
        }
        chain
    }

    fn bundle(&self, source: NodeIndex, target: NodeIndex) -> Vec<NodeIndex> {
        let up = self.ancestors(source);
        let down = self.ancestors(target);
        let down_set: HashSet<NodeIndex> = down.iter().copied().collect();

        let Some(lca_pos) = up.iter().position(|idx| down_set.contains(idx)) else {
            return up;
        };
        let lca = up[lca_pos];
        let mut path: Vec<NodeIndex> = up[..=lca_pos].to_vec();
        let descent = down.iter().take_while(|idx| **idx != lca).copied();
        let mut descent: Vec<NodeIndex> = descent.collect();
        descent.reverse();
        path.extend(descent);
        path
    }

    fn highlighted_edges(&self) -> Vec<usize> {
        let Some(highlight) = &self.state.highlight else {
            return Vec::new();
        };
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, edge)| match highlight {
                HighlightTarget::Node { identity } => {
                    edge.source == *identity || edge.target == *identity
                }
                HighlightTarget::Pair { source, target } => {
                    edge.source == *source && edge.target == *target
                }
            })
            .map(|(i, _)| i)
            .collect()
    }
}

fn empty_tree() -> (DiGraph<Entry, ()>, NodeIndex) {
    let mut tree = DiGraph::new();
    let root = tree.add_node(Entry {
        name: String::new(),
        key: String::new(),
        leaf: false,
    });
    (tree, root)
}

impl Visualization for HierarchicalEdge {
    fn kind(&self) -> ViewKind {
        ViewKind::Hierarchy
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
        self.reset();

        for node in self.state.graph.merged_nodes().iter() {
            self.insert_leaf(node);
        }

        let main = super::main_attribute(store);
        let pairs = aggregate(&self.state.graph.links, &main, self.policy);
        let mut edges = Vec::with_capacity(pairs.len());
        for ((source, target), stats) in pairs.iter() {
            let (Some(s), Some(t)) = (self.leaves.get(source), self.leaves.get(target)) else {
                continue;
            };
            edges.push(BundledEdge {
                source: source.clone(),
                target: target.clone(),
                total: stats.total,
                mean: stats.mean,
                color: mean_color(stats.mean),
                opacity: total_opacity(stats.total, self.opacity_total_max),
                path: self.bundle(*s, *t).into_iter().map(|i| i.index()).collect(),
            });
        }
        self.edges = edges;

        tracing::debug!(
            leaves = self.leaves.len(),
            edges = self.edges.len(),
            "rebuilt hierarchy"
        );
    }

    fn payload(&self) -> ViewPayload {
        ViewPayload::Hierarchy(HierarchyPayload {
            nodes: self.nodes(),
            edges: self.edges.clone(),
            highlight: self.state.highlight.clone(),
            highlighted_edges: self.highlighted_edges(),
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
}
