//! Node and semantic-type representation in the alignment graph

use serde::{Deserialize, Serialize};

/// Unique identifier for a graph node
///
/// Serializes as a plain string: an ontology URI, a URI with a decimal
/// disambiguation suffix for later instances of the same class, or a
/// column identifier for column nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a NodeId from a string
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identifier of an external data column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnId(String);

impl ColumnId {
    /// Create a ColumnId from a string
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ColumnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ColumnId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ColumnId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// An ontology label: a URI plus optional namespace and prefix hints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Full URI of the class or property
    pub uri: String,
    /// Namespace the URI belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ns: Option<String>,
    /// Short prefix for display (e.g. "foaf")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

impl Label {
    /// Create a label from a bare URI
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ns: None,
            prefix: None,
        }
    }

    /// Set the namespace
    pub fn with_ns(mut self, ns: impl Into<String>) -> Self {
        self.ns = Some(ns.into());
        self
    }

    /// Set the display prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Local name of the URI: the fragment after the last `#` or `/`
    pub fn local_name(&self) -> &str {
        self.uri
            .rsplit_once(['#', '/'])
            .map(|(_, local)| local)
            .unwrap_or(&self.uri)
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.uri)
    }
}

/// Provenance of a semantic type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Origin {
    /// Explicitly assigned by a user action
    User,
    /// Suggested by the classifier
    Learned,
}

/// The domain + relation pair assigned to a column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticType {
    /// Column this type was assigned to
    pub column_id: ColumnId,
    /// Label of the relation edge (fixed class-instance label for class types)
    pub type_label: Label,
    /// Label of the domain node
    pub domain_label: Label,
    /// Where the assignment came from
    pub origin: Origin,
    /// Confidence in the assignment (0.0 - 1.0)
    pub confidence: f64,
}

impl SemanticType {
    /// Create a new semantic type
    pub fn new(
        column_id: ColumnId,
        type_label: Label,
        domain_label: Label,
        origin: Origin,
        confidence: f64,
    ) -> Self {
        Self {
            column_id,
            type_label,
            domain_label,
            origin,
            confidence,
        }
    }

    /// Concatenated domain + type label string used for deduplication
    pub fn model_label_string(&self) -> String {
        format!("{}|{}", self.domain_label.uri, self.type_label.uri)
    }

    /// Deduplication equality: case-insensitive model label string match
    pub fn same_model_label(&self, other: &SemanticType) -> bool {
        self.model_label_string()
            .eq_ignore_ascii_case(&other.model_label_string())
    }
}

/// Ordered set of synonym semantic types recorded alongside a column's
/// current type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SynonymTypes(Vec<SemanticType>);

impl SynonymTypes {
    /// Create from a list of types
    pub fn new(types: Vec<SemanticType>) -> Self {
        Self(types)
    }

    /// The synonym types, in recorded order
    pub fn types(&self) -> &[SemanticType] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// State owned by a column node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnData {
    /// The external data column this node is bound to
    pub column_id: ColumnId,
    /// User-assigned semantic types, in assignment order
    pub user_types: Vec<SemanticType>,
    /// Classifier suggestions, populated at most once unless cleared
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learned_types: Option<Vec<SemanticType>>,
    /// RDF literal datatype tag for the column's values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rdf_literal_type: Option<String>,
}

impl ColumnData {
    fn new(column_id: ColumnId) -> Self {
        Self {
            column_id,
            user_types: Vec::new(),
            learned_types: None,
            rdf_literal_type: None,
        }
    }

    /// Record a user-assigned type
    pub fn assign_user_type(&mut self, semantic_type: SemanticType) {
        self.user_types.push(semantic_type);
    }

    /// Whether an equivalent type (by model label string) is already assigned
    pub fn has_user_type(&self, semantic_type: &SemanticType) -> bool {
        self.user_types
            .iter()
            .any(|t| t.same_model_label(semantic_type))
    }

    /// The most recently assigned user type
    pub fn current_user_type(&self) -> Option<&SemanticType> {
        self.user_types.last()
    }

    /// Drop the learned suggestions so they may be repopulated
    pub fn clear_learned_types(&mut self) {
        self.learned_types = None;
    }
}

/// Node kind: ontology class instance placeholder, or a leaf bound to a
/// data column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    /// Ontology class instance placeholder
    Internal,
    /// Leaf bound to exactly one external data column
    Column(ColumnData),
}

/// A node in the alignment graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier
    pub id: NodeId,
    /// Ontology label (or column display name for column nodes)
    pub label: Label,
    /// Internal class node or column node
    pub kind: NodeKind,
}

impl Node {
    /// Create an internal class-instance node
    pub fn internal(id: NodeId, label: Label) -> Self {
        Self {
            id,
            label,
            kind: NodeKind::Internal,
        }
    }

    /// Create a column node; the node id is the column id
    pub fn column(column_id: ColumnId, name: impl Into<String>) -> Self {
        Self {
            id: NodeId::from_string(column_id.as_str()),
            label: Label::new(name),
            kind: NodeKind::Column(ColumnData::new(column_id)),
        }
    }

    /// Whether this is a column node
    pub fn is_column(&self) -> bool {
        matches!(self.kind, NodeKind::Column(_))
    }

    /// Column state, if this is a column node
    pub fn as_column(&self) -> Option<&ColumnData> {
        match &self.kind {
            NodeKind::Column(data) => Some(data),
            NodeKind::Internal => None,
        }
    }

    /// Mutable column state, if this is a column node
    pub fn as_column_mut(&mut self) -> Option<&mut ColumnData> {
        match &mut self.kind {
            NodeKind::Column(data) => Some(data),
            NodeKind::Internal => None,
        }
    }
}
