//! Collaborator seams: ontology lookup, realignment, and type suggestion
//!
//! The engine consumes these as synchronous calls. None of them are required
//! for the graph invariants to hold; realignment and suggestion are optional
//! at the engine level.

use crate::graph::{Alignment, ColumnData, ColumnId, Label, SemanticType};
use std::collections::HashMap;
use thiserror::Error;

/// Resolves a URI or model identifier to a human-meaningful label
pub trait OntologyLookup {
    /// Label for the URI, or `None` when it is not in the ontology or model
    fn label_for_uri(&self, uri: &str) -> Option<Label>;
}

/// Error raised by a realignment collaborator
#[derive(Debug, Clone, Error)]
#[error("realignment failed: {0}")]
pub struct RealignmentError(pub String);

/// Recomputes derived layout/consistency state after a mutation
///
/// Side-effect only in the assignment path; failures there are logged, not
/// surfaced. Undo surfaces them as [`crate::snapshot::RestoreError`].
pub trait RealignmentService {
    fn recompute(&self, alignment: &mut Alignment) -> Result<(), RealignmentError>;
}

/// Learned-type suggestion and classifier training
pub trait TypeSuggester {
    /// Suggest up to `max_suggestions` semantic types for a column
    fn suggest_types(&self, column: &ColumnData, max_suggestions: usize) -> Vec<SemanticType>;

    /// Train the classifier on an applied type
    fn train_on_column(&self, column_id: &ColumnId, semantic_type: &SemanticType);
}

/// In-memory ontology backed by a URI -> label map
///
/// Intended for tests and embedders that load a fixed vocabulary up front.
#[derive(Debug, Clone, Default)]
pub struct StaticOntology {
    labels: HashMap<String, Label>,
}

impl StaticOntology {
    /// Create an empty ontology
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a URI whose label is derived from the URI itself
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        let uri = uri.into();
        self.labels.insert(uri.clone(), Label::new(uri));
        self
    }

    /// Register a URI with an explicit label
    pub fn with_label(mut self, uri: impl Into<String>, label: Label) -> Self {
        self.labels.insert(uri.into(), label);
        self
    }
}

impl OntologyLookup for StaticOntology {
    fn label_for_uri(&self, uri: &str) -> Option<Label> {
        self.labels.get(uri).cloned()
    }
}
