//! Type assignment: the core mutation operation over an alignment
//!
//! Candidates for one column arrive as a sequence; each is resolved to a
//! domain node, the column's prior incoming edge is replaced per the class /
//! property policy, and the chosen edge is promoted to `ForcedByUser`. The
//! caller captures a [`Snapshot`] before the mutation; the engine itself
//! never rolls back.

mod resolver;

#[cfg(test)]
mod tests;

pub use resolver::{resolve_domain, ADD_MARKER};

use crate::graph::{
    Alignment, AlignmentId, ColumnId, Edge, EdgeId, EdgeStatus, Label, Origin, SemanticType,
    SynonymTypes,
};
use crate::ontology::{OntologyLookup, RealignmentService, TypeSuggester};
use crate::registry::{AlignmentRegistry, ColumnTypeRegistry};
use crate::snapshot::Snapshot;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Errors that abort an assignment operation
#[derive(Debug, Error)]
pub enum AssignError {
    /// Neither direct lookup, alternate URI, nor the digit-suffix fallback
    /// produced a label for the domain identifier. Fatal: candidates after
    /// the failing one are not processed.
    #[error("unresolved domain identifier: {0}")]
    UnresolvedDomain(String),

    /// The target column has no node in the alignment
    #[error("column not found in alignment: {0}")]
    ColumnNotFound(ColumnId),
}

/// Result type for assignment operations
pub type AssignResult<T> = Result<T, AssignError>;

/// A candidate that cannot be interpreted; skipped at the parse boundary
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed type candidate: {0}")]
pub struct MalformedCandidateError(pub String);

/// One candidate semantic-type assignment for a column
///
/// On the wire an empty domain value marks a class candidate; the enum keeps
/// the class/property split explicit so edge construction is exhaustive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeCandidate {
    /// The column instantiates a class
    Class {
        /// URI of the class (or id of an existing class-instance node)
        class_uri: String,
    },
    /// The column holds literal values of a property on a domain instance
    Property {
        /// Domain identifier: a class URI or an existing node id
        domain_id: String,
        /// URI of the data property
        property_uri: String,
        /// Alternate domain URI supplied by the caller, used when the
        /// domain identifier itself cannot be resolved
        #[serde(default, skip_serializing_if = "Option::is_none")]
        domain_uri: Option<String>,
    },
}

impl TypeCandidate {
    /// Build a candidate from the raw wire fields
    ///
    /// An empty domain value signals a class candidate whose URI is the full
    /// type value; otherwise the full type value is the property URI.
    pub fn from_parts(
        domain_value: &str,
        full_type_value: &str,
        domain_uri: Option<&str>,
    ) -> Result<Self, MalformedCandidateError> {
        if full_type_value.is_empty() {
            return Err(MalformedCandidateError("empty full type value".into()));
        }
        if domain_value.is_empty() {
            Ok(Self::Class {
                class_uri: full_type_value.to_string(),
            })
        } else {
            Ok(Self::Property {
                domain_id: domain_value.to_string(),
                property_uri: full_type_value.to_string(),
                domain_uri: domain_uri.map(str::to_string),
            })
        }
    }
}

/// Parse candidates from the client JSON array shape
///
/// Each entry carries `DomainId` (or the legacy `Domain` key), `FullType`,
/// and optionally `DomainUri`. Malformed entries are logged and skipped;
/// they never fail the batch.
pub fn candidates_from_json(value: &Value) -> Vec<TypeCandidate> {
    let Some(items) = value.as_array() else {
        error!("candidate payload is not an array");
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match candidate_from_object(item) {
            Ok(candidate) => Some(candidate),
            Err(e) => {
                error!("skipping candidate: {e}");
                None
            }
        })
        .collect()
}

fn candidate_from_object(item: &Value) -> Result<TypeCandidate, MalformedCandidateError> {
    let object = item
        .as_object()
        .ok_or_else(|| MalformedCandidateError("candidate is not an object".into()))?;
    // "Domain" is the key older models used
    let domain_value = object
        .get("DomainId")
        .or_else(|| object.get("Domain"))
        .and_then(Value::as_str)
        .ok_or_else(|| MalformedCandidateError("missing DomainId".into()))?;
    let full_type_value = object
        .get("FullType")
        .and_then(Value::as_str)
        .ok_or_else(|| MalformedCandidateError("missing FullType".into()))?;
    let domain_uri = object.get("DomainUri").and_then(Value::as_str);
    TypeCandidate::from_parts(domain_value, full_type_value, domain_uri)
}

/// Whether the assignment runs interactively or as part of a replayed batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyMode {
    /// A user-driven assignment: realignment runs after each candidate
    Interactive,
    /// History replay: realignment is deferred, learned types may be
    /// populated once per column
    Batch,
}

/// Options for one apply call
#[derive(Debug, Clone)]
pub struct ApplyOptions {
    /// Interactive or batch execution
    pub mode: ApplyMode,
    /// Train the classifier on the applied type (interactive mode only;
    /// batch mode trains per [`EngineConfig::train_on_apply`])
    pub train: bool,
    /// RDF literal datatype tag recorded on the column node
    pub literal_type: Option<String>,
}

impl ApplyOptions {
    /// Interactive assignment without training
    pub fn interactive() -> Self {
        Self {
            mode: ApplyMode::Interactive,
            train: false,
            literal_type: None,
        }
    }

    /// Batch (history replay) assignment
    pub fn batch() -> Self {
        Self {
            mode: ApplyMode::Batch,
            train: false,
            literal_type: None,
        }
    }

    /// Request classifier training on the applied type
    pub fn with_training(mut self) -> Self {
        self.train = true;
        self
    }

    /// Set the RDF literal datatype tag
    pub fn with_literal_type(mut self, literal_type: impl Into<String>) -> Self {
        self.literal_type = Some(literal_type.into());
        self
    }
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self::interactive()
    }
}

/// Modeling flags consulted during batch replay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Populate a column's learned types on first batch assignment
    pub predict_on_apply: bool,
    /// Train the classifier on types applied during batch replay
    pub train_on_apply: bool,
    /// How many learned suggestions to request per column
    pub max_suggestions: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            predict_on_apply: true,
            train_on_apply: false,
            max_suggestions: 4,
        }
    }
}

/// Outcome of one candidate, in input order
#[derive(Debug, Clone, PartialEq)]
pub enum CandidateOutcome {
    /// The candidate was applied to the graph
    Applied {
        semantic_type: SemanticType,
        edge: EdgeId,
    },
    /// The property URI had no label in the ontology or model; skipped
    UnresolvedLabel { property_uri: String },
}

/// Result of an apply call
///
/// `last_type` and `last_edge` reflect only the last successfully processed
/// candidate; `trace` keeps every per-candidate outcome so callers can see
/// what the aggregate discards (see DESIGN.md on last-candidate-wins).
#[derive(Debug, Clone, Default)]
pub struct AssignmentResult {
    /// Type recorded as the column's current type
    pub last_type: Option<SemanticType>,
    /// Edge backing that type
    pub last_edge: Option<EdgeId>,
    /// Per-candidate outcomes
    pub trace: Vec<CandidateOutcome>,
}

/// The type-assignment engine
///
/// Borrows its collaborators; realignment and suggestion are optional — the
/// graph invariants hold without them.
pub struct AssignEngine<'a> {
    ontology: &'a dyn OntologyLookup,
    realigner: Option<&'a dyn RealignmentService>,
    suggester: Option<&'a dyn TypeSuggester>,
    config: EngineConfig,
}

impl<'a> AssignEngine<'a> {
    /// Create an engine over an ontology, with default config and no
    /// realignment or suggestion collaborators
    pub fn new(ontology: &'a dyn OntologyLookup) -> Self {
        Self {
            ontology,
            realigner: None,
            suggester: None,
            config: EngineConfig::default(),
        }
    }

    /// Attach a realignment service
    pub fn with_realigner(mut self, realigner: &'a dyn RealignmentService) -> Self {
        self.realigner = Some(realigner);
        self
    }

    /// Attach a suggestion/training service
    pub fn with_suggester(mut self, suggester: &'a dyn TypeSuggester) -> Self {
        self.suggester = Some(suggester);
        self
    }

    /// Replace the modeling config
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Apply candidate semantic types to a column, mutating the alignment
    ///
    /// Candidates are processed independently and in order. A property
    /// candidate whose URI has no ontology label is logged and skipped; an
    /// unresolvable domain identifier aborts the whole call. No rollback
    /// happens here — the caller holds a [`Snapshot`] captured beforehand.
    pub fn apply(
        &self,
        alignment: &mut Alignment,
        types: &mut ColumnTypeRegistry,
        column_id: &ColumnId,
        candidates: &[TypeCandidate],
        options: &ApplyOptions,
    ) -> AssignResult<AssignmentResult> {
        let mut result = AssignmentResult::default();
        // Candidates applied in this call are not folded into the synonym
        // set: only the last applied candidate survives as the current type,
        // and the synonyms are recorded empty. See DESIGN.md,
        // "last-candidate-wins".
        let synonym_types: Vec<SemanticType> = Vec::new();

        for candidate in candidates {
            self.column_mut(alignment, column_id)?.rdf_literal_type =
                options.literal_type.clone();

            let (domain_key, alternate_uri, edge_label) = match candidate {
                TypeCandidate::Class { class_uri } => {
                    (class_uri.as_str(), None, Edge::class_instance_label())
                }
                TypeCandidate::Property {
                    domain_id,
                    property_uri,
                    domain_uri,
                } => match self.ontology.label_for_uri(property_uri) {
                    Some(label) => (domain_id.as_str(), domain_uri.as_deref(), label),
                    None => {
                        error!(
                            uri = %property_uri,
                            "URI does not exist in the ontology or model, skipping candidate"
                        );
                        result.trace.push(CandidateOutcome::UnresolvedLabel {
                            property_uri: property_uri.clone(),
                        });
                        continue;
                    }
                },
            };

            let domain =
                resolver::resolve_domain(alignment, self.ontology, domain_key, alternate_uri)?;
            let domain_label = alignment
                .node(&domain)
                .map(|node| node.label.clone())
                .unwrap_or_else(|| Label::new(domain.as_str()));

            let column_node = alignment
                .column_node_id(column_id)
                .ok_or_else(|| AssignError::ColumnNotFound(column_id.clone()))?;
            let existing = alignment
                .incoming_edges(column_id)
                .first()
                .map(|edge| (edge.id, edge.source.clone()));

            let edge_id = match candidate {
                TypeCandidate::Class { .. } => match existing {
                    // re-asserting the same class assignment keeps the edge
                    Some((edge, ref source)) if *source == domain => edge,
                    Some((old, _)) => {
                        alignment.remove_edge(&old);
                        alignment.add_class_instance_edge(&domain, &column_node)
                    }
                    None => alignment.add_class_instance_edge(&domain, &column_node),
                },
                // a property assignment always rebuilds, even on the same
                // domain node: the relation itself may have changed
                TypeCandidate::Property { .. } => {
                    if let Some((old, _)) = existing {
                        alignment.remove_edge(&old);
                    }
                    alignment.add_data_property_edge(&domain, &column_node, edge_label.clone())
                }
            };

            let new_type = SemanticType::new(
                column_id.clone(),
                edge_label,
                domain_label,
                Origin::User,
                1.0,
            );

            let column = self.column_mut(alignment, column_id)?;
            if !column.has_user_type(&new_type) {
                column.assign_user_type(new_type.clone());
            }

            alignment.set_edge_status(&edge_id, EdgeStatus::ForcedByUser);

            match options.mode {
                ApplyMode::Interactive => {
                    if let Some(realigner) = self.realigner {
                        if let Err(e) = realigner.recompute(alignment) {
                            warn!("realignment after assignment failed: {e}");
                        }
                    }
                }
                ApplyMode::Batch => {
                    if self.config.predict_on_apply {
                        self.populate_learned_types(alignment, column_id);
                    }
                }
            }

            result.trace.push(CandidateOutcome::Applied {
                semantic_type: new_type.clone(),
                edge: edge_id,
            });
            result.last_type = Some(new_type);
            result.last_edge = Some(edge_id);
        }

        if let Some(applied) = &result.last_type {
            types.set_current_type(column_id.clone(), applied.clone());
            types.set_synonym_types(column_id.clone(), SynonymTypes::new(synonym_types));
        }

        let train = match options.mode {
            ApplyMode::Interactive => options.train,
            ApplyMode::Batch => self.config.train_on_apply,
        };
        if train {
            if let (Some(suggester), Some(applied)) = (self.suggester, &result.last_type) {
                suggester.train_on_column(column_id, applied);
            }
        }

        Ok(result)
    }

    /// Caller-facing operation: lazily create the alignment and column node,
    /// capture an undo snapshot, then apply under the registry's per-key
    /// guard (one assignment in flight per alignment)
    ///
    /// On failure the pre-mutation state is put back in place before the
    /// error is returned, so no partial edge survives a fatal domain failure.
    #[allow(clippy::too_many_arguments)]
    pub fn assign(
        &self,
        registry: &AlignmentRegistry,
        types: &mut ColumnTypeRegistry,
        key: &AlignmentId,
        column_id: &ColumnId,
        column_name: &str,
        candidates: &[TypeCandidate],
        options: &ApplyOptions,
    ) -> AssignResult<(AssignmentResult, Snapshot)> {
        registry.with_alignment_mut(key, |alignment| {
            alignment.ensure_column_node(column_id, column_name);
            let snapshot = Snapshot::capture(key, alignment, types, column_id);
            match self.apply(alignment, types, column_id, candidates, options) {
                Ok(result) => Ok((result, snapshot)),
                Err(e) => {
                    snapshot.restore_into(alignment, types);
                    Err(e)
                }
            }
        })
    }

    // Learned suggestions are captured once per column: a later explicit
    // assignment must not overwrite what was first learned for it.
    fn populate_learned_types(&self, alignment: &mut Alignment, column_id: &ColumnId) {
        let Some(suggester) = self.suggester else {
            return;
        };
        let Some(column) = alignment.column_mut(column_id) else {
            return;
        };
        if column.learned_types.is_some() {
            return;
        }
        debug!(column = %column_id, "populating learned semantic types");
        let learned = suggester.suggest_types(&*column, self.config.max_suggestions);
        if learned.is_empty() {
            info!(column = %column_id, "no semantic types learned for column");
        }
        column.learned_types = Some(learned);
    }

    fn column_mut<'g>(
        &self,
        alignment: &'g mut Alignment,
        column_id: &ColumnId,
    ) -> AssignResult<&'g mut crate::graph::ColumnData> {
        alignment
            .column_mut(column_id)
            .ok_or_else(|| AssignError::ColumnNotFound(column_id.clone()))
    }
}
