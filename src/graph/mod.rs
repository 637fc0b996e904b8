//! Core alignment graph data structures

mod alignment;
mod edge;
mod node;


pub use alignment::{Alignment, AlignmentId, AlignmentMetadata};
pub use edge::{Edge, EdgeId, EdgeKind, EdgeStatus, CLASS_INSTANCE_URI};
pub use node::{
    ColumnData, ColumnId, Label, Node, NodeId, NodeKind, Origin, SemanticType, SynonymTypes,
};
