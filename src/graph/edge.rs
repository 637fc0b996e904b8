//! Edge representation in the alignment graph

use super::node::{Label, NodeId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an edge
///
/// Edges are identified by id, not by (source, target) pair: the graph is a
/// multigraph and several edges between the same nodes may coexist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeId(Uuid);

impl EdgeId {
    /// Create a new random EdgeId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EdgeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fixed label URI carried by every class-instance edge
pub const CLASS_INSTANCE_URI: &str = "http://ontoalign.org/model#class-instance";

/// The two edge kinds the engine builds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeKind {
    /// "This column instantiates this class"
    ClassInstance,
    /// "This column is a literal value of this property on this domain"
    DataProperty,
}

/// Provenance status of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeStatus {
    /// Inferred or newly built, not yet confirmed
    Normal,
    /// Explicitly chosen by a user action
    ForcedByUser,
}

/// A directed edge in the alignment graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Unique identifier
    pub id: EdgeId,
    /// Source node (the domain)
    pub source: NodeId,
    /// Target node (always a column node in this core)
    pub target: NodeId,
    /// Property/relation URI, or the fixed class-instance label
    pub label: Label,
    /// Class-instantiation or data-property edge
    pub kind: EdgeKind,
    /// Provenance status
    pub status: EdgeStatus,
}

impl Edge {
    /// The fixed label shared by all class-instance edges
    pub fn class_instance_label() -> Label {
        Label::new(CLASS_INSTANCE_URI)
    }

    /// Build a class-instantiation edge with `Normal` status
    pub fn class_instance(source: NodeId, target: NodeId) -> Self {
        Self {
            id: EdgeId::new(),
            source,
            target,
            label: Self::class_instance_label(),
            kind: EdgeKind::ClassInstance,
            status: EdgeStatus::Normal,
        }
    }

    /// Build a data-property edge with `Normal` status
    pub fn data_property(source: NodeId, target: NodeId, label: Label) -> Self {
        Self {
            id: EdgeId::new(),
            source,
            target,
            label,
            kind: EdgeKind::DataProperty,
            status: EdgeStatus::Normal,
        }
    }

    /// Whether the edge was explicitly chosen by a user
    pub fn is_forced(&self) -> bool {
        self.status == EdgeStatus::ForcedByUser
    }
}
