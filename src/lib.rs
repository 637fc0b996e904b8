//! Ontoalign: Semantic-Type Alignment Engine
//!
//! Assigns ontology (semantic) types to columns of tabular data and maintains
//! a consistent alignment graph mapping columns to domain concepts.
//!
//! # Core Concepts
//!
//! - **Alignment**: a directed multigraph of internal class nodes and column
//!   nodes, one per worksheet, held in a caller-owned registry
//! - **Type assignment**: an undoable mutation that resolves a candidate's
//!   domain node, replaces the column's incoming edge, and records the
//!   authoritative semantic type
//! - **Snapshots**: full-clone capture/restore backing undo
//!
//! # Example
//!
//! ```
//! use ontoalign::{
//!     AlignmentId, AlignmentRegistry, ApplyOptions, AssignEngine, ColumnId,
//!     ColumnTypeRegistry, StaticOntology, TypeCandidate,
//! };
//!
//! let ontology = StaticOntology::new().with_uri("http://example.org/Person");
//! let engine = AssignEngine::new(&ontology);
//! let registry = AlignmentRegistry::new();
//! let mut types = ColumnTypeRegistry::new();
//!
//! let key = AlignmentId::for_worksheet("workspace", "sheet1");
//! let column = ColumnId::from("c1");
//! let candidate = TypeCandidate::Class {
//!     class_uri: "http://example.org/Person".into(),
//! };
//!
//! let (result, snapshot) = engine
//!     .assign(
//!         &registry,
//!         &mut types,
//!         &key,
//!         &column,
//!         "person",
//!         &[candidate],
//!         &ApplyOptions::default(),
//!     )
//!     .unwrap();
//! assert!(result.last_type.is_some());
//!
//! // undo restores the captured state
//! snapshot.restore(&registry, &mut types).unwrap();
//! assert!(types.current_type(&column).is_none());
//! ```

mod graph;
pub mod engine;
pub mod ontology;
pub mod registry;
pub mod snapshot;

pub use engine::{
    candidates_from_json, resolve_domain, ApplyMode, ApplyOptions, AssignEngine, AssignError,
    AssignResult, AssignmentResult, CandidateOutcome, EngineConfig, MalformedCandidateError,
    TypeCandidate, ADD_MARKER,
};
pub use graph::{
    Alignment, AlignmentId, AlignmentMetadata, ColumnData, ColumnId, Edge, EdgeId, EdgeKind,
    EdgeStatus, Label, Node, NodeId, NodeKind, Origin, SemanticType, SynonymTypes,
    CLASS_INSTANCE_URI,
};
pub use ontology::{
    OntologyLookup, RealignmentError, RealignmentService, StaticOntology, TypeSuggester,
};
pub use registry::{AlignmentRegistry, ColumnTypeRegistry};
pub use snapshot::{RestoreError, RestoreResult, Snapshot};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
