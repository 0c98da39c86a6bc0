use crate::filter::RecordSelection;
use crate::model::{GraphView, Link, NodeCollection, Record, RoleMapping, Side};

/// Turns a selection of records into source nodes, target nodes and links.
pub struct GraphBuilder<'m> {
    mapping: &'m RoleMapping,
}

impl<'m> GraphBuilder<'m> {
    pub fn new(mapping: &'m RoleMapping) -> Self {
        Self { mapping }
    }

    pub fn build(&self, selection: &RecordSelection<'_>) -> GraphView {
        let mut view = GraphView::default();

        for (index, record) in selection.records().iter().enumerate() {
            for side in Side::BOTH {
                if !selection.side_included(index, side) {
                    continue;
                }
                let nodes = match side {
                    Side::Source => &mut view.source_nodes,
                    Side::Target => &mut view.target_nodes,
                };
                self.add_node(nodes, record, side);
            }

            // A link goes with the nodes of its own record.
            let linkable = selection.link_included(index)
                && selection.side_included(index, Side::Source)
                && selection.side_included(index, Side::Target);
            if linkable {
                if let Some(link) = self.link_for(record) {
                    view.links.push(link);
                }
            }
        }

        tracing::debug!(
            sources = view.source_nodes.len(),
            targets = view.target_nodes.len(),
            links = view.links.len(),
            "built graph"
        );

        view
    }

    fn add_node(&self, nodes: &mut NodeCollection, record: &Record, side: Side) {
        let Some(identity) = self.mapping.identity(side) else {
            return;
        };
        let Some(attributes) = record.project(self.mapping.group(side)) else {
            return;
        };
        if let Some(key) = attributes.get(&identity.attribute).cloned() {
            nodes.upsert(&key, attributes);
        }
    }

    fn link_for(&self, record: &Record) -> Option<Link> {
        let attributes = record.project(&self.mapping.link_attributes)?;
        let source = record.get(&self.mapping.identity(Side::Source)?.name)?;
        let target = record.get(&self.mapping.identity(Side::Target)?.name)?;

        Some(Link {
            source: source.to_string(),
            target: target.to_string(),
            date: record.date(self.mapping),
            attributes,
        })
    }
}

/// Build the unfiltered graph of `records`.
pub fn build(records: &[Record], mapping: &RoleMapping) -> GraphView {
    GraphBuilder::new(mapping).build(&RecordSelection::all(records))
}
