use super::record::Attributes;
use super::roles::Side;
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeSet;

/// A node synthesized from every record in which its identity appeared.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    #[serde(skip)]
    pub identity: String,
    #[serde(flatten)]
    pub attributes: Attributes,
}

impl Node {
    pub fn new(identity: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            identity: identity.into(),
            attributes,
        }
    }

    /// Shallow merge: keys of `incoming` overwrite, other keys are kept.
    pub fn merge(&mut self, incoming: Attributes) {
        for (key, value) in incoming {
            self.attributes.insert(key, value);
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Nodes of one side, unique by identity and iterated in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeCollection {
    nodes: IndexMap<String, Node>,
}

impl Serialize for NodeCollection {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.nodes.values())
    }
}

impl NodeCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new identity or merge into the existing node.
    pub fn upsert(&mut self, identity: &str, attributes: Attributes) {
        match self.nodes.get_mut(identity) {
            Some(node) => node.merge(attributes),
            None => {
                self.nodes
                    .insert(identity.to_string(), Node::new(identity, attributes));
            }
        }
    }

    pub fn get(&self, identity: &str) -> Option<&Node> {
        self.nodes.get(identity)
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.nodes.contains_key(identity)
    }

    pub fn position(&self, identity: &str) -> Option<usize> {
        self.nodes.get_index_of(identity)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn identities(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// One edge per qualifying record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Link {
    pub source: String,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(flatten)]
    pub attributes: Attributes,
}

impl Link {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn touches(&self, identity: &str) -> bool {
        self.source == identity || self.target == identity
    }
}

/// Source nodes, target nodes and links derived from one filtered view.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphView {
    pub source_nodes: NodeCollection,
    pub target_nodes: NodeCollection,
    pub links: Vec<Link>,
}

impl GraphView {
    pub fn nodes(&self, side: Side) -> &NodeCollection {
        match side {
            Side::Source => &self.source_nodes,
            Side::Target => &self.target_nodes,
        }
    }

    /// Every identity present on either side.
    pub fn identities(&self) -> BTreeSet<&str> {
        self.source_nodes
            .identities()
            .chain(self.target_nodes.identities())
            .collect()
    }

    /// Source and target nodes merged into one collection by identity.
    /// Source nodes come first; target attributes win on conflicts.
    pub fn merged_nodes(&self) -> NodeCollection {
        let mut merged = self.source_nodes.clone();
        for node in self.target_nodes.iter() {
            merged.upsert(&node.identity, node.attributes.clone());
        }
        merged
    }

    pub fn is_empty(&self) -> bool {
        self.source_nodes.is_empty() && self.target_nodes.is_empty() && self.links.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_upsert_merges_and_keeps_order() {
        let mut nodes = NodeCollection::new();
        nodes.upsert("b", attrs(&[("email", "b"), ("jobtitle", "CEO")]));
        nodes.upsert("a", attrs(&[("email", "a")]));
        nodes.upsert("b", attrs(&[("jobtitle", "Trader")]));

        let order: Vec<_> = nodes.identities().collect();
        assert_eq!(order, vec!["b", "a"]);
        let b = nodes.get("b").unwrap();
        assert_eq!(b.attribute("jobtitle"), Some("Trader"));
        assert_eq!(b.attribute("email"), Some("b"));
    }

    #[test]
    fn test_node_collection_serializes_as_list() {
        let mut nodes = NodeCollection::new();
        nodes.upsert("a", attrs(&[("email", "a"), ("jobtitle", "CEO")]));

        let json = serde_json::to_value(&nodes).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{ "email": "a", "jobtitle": "CEO" }])
        );
    }

    #[test]
    fn test_merged_nodes_unions_sides() {
        let mut view = GraphView::default();
        view.source_nodes.upsert("a", attrs(&[("email", "a")]));
        view.target_nodes.upsert("b", attrs(&[("email", "b")]));
        view.target_nodes.upsert("a", attrs(&[("email", "a"), ("jobtitle", "VP")]));

        let merged = view.merged_nodes();
        assert_eq!(merged.identities().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(merged.get("a").unwrap().attribute("jobtitle"), Some("VP"));
        assert_eq!(view.identities().len(), 2);
    }
}
