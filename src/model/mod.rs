mod graph;
mod record;
pub(crate) mod roles;

pub use graph::{GraphView, Link, Node, NodeCollection};
pub use record::{Attributes, Record, RecordStore};
pub use roles::{AttributeSpec, ColumnRole, ColumnRow, MappingError, RoleMapping, Side};
