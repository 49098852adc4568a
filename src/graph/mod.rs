mod datasets;
mod model;
mod parse;

pub use datasets::{DataSource, DatasetCatalog, LoadedDataset, load_snapshot_file};
pub use model::{GraphEdge, GraphNode, GraphSnapshot, NodeKind};
pub use parse::parse_snapshot;
