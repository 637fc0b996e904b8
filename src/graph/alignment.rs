//! Alignment: the directed multigraph mapping data columns to ontology concepts

use super::edge::{Edge, EdgeId, EdgeStatus};
use super::node::{ColumnData, ColumnId, Label, Node, NodeId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Composite identifier for an alignment: workspace id + worksheet id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlignmentId(String);

impl AlignmentId {
    /// Construct the registry key for one worksheet in one workspace
    pub fn for_worksheet(workspace_id: &str, worksheet_id: &str) -> Self {
        Self(format!("{workspace_id}:{worksheet_id}"))
    }

    /// Create an AlignmentId from a precomposed string
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AlignmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AlignmentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AlignmentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Metadata about an alignment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignmentMetadata {
    /// When the alignment was created
    pub created_at: Option<DateTime<Utc>>,
    /// When the alignment was last mutated
    pub updated_at: Option<DateTime<Utc>>,
}

/// The alignment graph for one worksheet
///
/// Nodes and edges are looked up by id. The incoming-edge index and the
/// column index are maintained by the mutation methods, so the fields stay
/// private. `Clone` produces a structurally independent deep copy — the basis
/// of the snapshot/undo contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alignment {
    /// Nodes by id
    nodes: HashMap<NodeId, Node>,
    /// Edges by id (multigraph: several edges may share endpoints)
    edges: HashMap<EdgeId, Edge>,
    /// Column id -> node id of its column node
    columns: HashMap<ColumnId, NodeId>,
    /// Target node id -> incoming edge ids
    incoming: HashMap<NodeId, Vec<EdgeId>>,
    /// Alignment metadata
    pub metadata: AlignmentMetadata,
}

impl Alignment {
    /// Create an empty alignment
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            edges: HashMap::new(),
            columns: HashMap::new(),
            incoming: HashMap::new(),
            metadata: AlignmentMetadata {
                created_at: Some(Utc::now()),
                ..Default::default()
            },
        }
    }

    /// Get a node by id
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Get a mutable reference to a node
    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Add an internal class-instance node for the given label
    ///
    /// The node id is derived from the label URI; when that id is already
    /// taken, the first free decimal suffix is appended. The suffixed ids are
    /// what the resolver's digit-strip fallback later undoes.
    pub fn add_internal_node(&mut self, label: Label) -> NodeId {
        let base = label.uri.clone();
        let mut id = NodeId::from_string(&base);
        let mut n = 1;
        while self.nodes.contains_key(&id) {
            id = NodeId::from_string(format!("{base}{n}"));
            n += 1;
        }
        self.nodes.insert(id.clone(), Node::internal(id.clone(), label));
        self.touch();
        id
    }

    /// Get the column node for a column, creating it if absent
    pub fn ensure_column_node(&mut self, column_id: &ColumnId, name: &str) -> NodeId {
        if let Some(id) = self.columns.get(column_id) {
            return id.clone();
        }
        let node = Node::column(column_id.clone(), name);
        let id = node.id.clone();
        self.nodes.insert(id.clone(), node);
        self.columns.insert(column_id.clone(), id.clone());
        self.touch();
        id
    }

    /// Node id of a column's node, if the column is in the graph
    pub fn column_node_id(&self, column_id: &ColumnId) -> Option<NodeId> {
        self.columns.get(column_id).cloned()
    }

    /// The column node for a column
    pub fn column_node(&self, column_id: &ColumnId) -> Option<&Node> {
        self.columns.get(column_id).and_then(|id| self.nodes.get(id))
    }

    /// Mutable column state for a column
    pub fn column_mut(&mut self, column_id: &ColumnId) -> Option<&mut ColumnData> {
        let id = self.columns.get(column_id)?.clone();
        self.nodes.get_mut(&id)?.as_column_mut()
    }

    /// Build and insert a class-instantiation edge with `Normal` status
    pub fn add_class_instance_edge(&mut self, domain: &NodeId, column: &NodeId) -> EdgeId {
        self.insert_edge(Edge::class_instance(domain.clone(), column.clone()))
    }

    /// Build and insert a data-property edge with `Normal` status
    pub fn add_data_property_edge(
        &mut self,
        domain: &NodeId,
        column: &NodeId,
        label: Label,
    ) -> EdgeId {
        self.insert_edge(Edge::data_property(domain.clone(), column.clone(), label))
    }

    fn insert_edge(&mut self, edge: Edge) -> EdgeId {
        let id = edge.id;
        self.incoming.entry(edge.target.clone()).or_default().push(id);
        self.edges.insert(id, edge);
        self.touch();
        id
    }

    /// Remove an edge, keeping the incoming index consistent
    pub fn remove_edge(&mut self, id: &EdgeId) -> Option<Edge> {
        let edge = self.edges.remove(id)?;
        if let Some(ids) = self.incoming.get_mut(&edge.target) {
            ids.retain(|e| e != id);
            if ids.is_empty() {
                self.incoming.remove(&edge.target);
            }
        }
        self.touch();
        Some(edge)
    }

    /// Get an edge by id
    pub fn edge(&self, id: &EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }

    /// Change an edge's status; returns false if the edge does not exist
    pub fn set_edge_status(&mut self, id: &EdgeId, status: EdgeStatus) -> bool {
        match self.edges.get_mut(id) {
            Some(edge) => {
                edge.status = status;
                self.touch();
                true
            }
            None => false,
        }
    }

    /// Incoming edges of a column's node, in insertion order
    pub fn incoming_edges(&self, column_id: &ColumnId) -> Vec<&Edge> {
        let Some(node_id) = self.columns.get(column_id) else {
            return Vec::new();
        };
        self.incoming
            .get(node_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.edges.get(id))
            .collect()
    }

    /// All nodes
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// All edges
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Update the last modified timestamp
    fn touch(&mut self) {
        self.metadata.updated_at = Some(Utc::now());
    }
}

impl Default for Alignment {
    fn default() -> Self {
        Self::new()
    }
}
