mod builder;
mod data;
mod pairs;

pub use builder::{GraphBuilder, build};
pub use data::{FilterState, GraphData, GraphMetadata};
pub use pairs::{NumericPolicy, PairAggregate, PairEntry, PairKey, PairStats, aggregate, coerce_numeric};
