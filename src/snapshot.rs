//! Snapshot capture and restore backing undoable assignment operations
//!
//! Undo is clone-based rather than diff-based: a snapshot deep-copies the
//! whole alignment before a mutation, and restore swaps it back in wholesale.
//! Alignments are per-worksheet scale, so the full clone stays cheap.

use crate::graph::{Alignment, AlignmentId, ColumnId, SemanticType, SynonymTypes};
use crate::ontology::{RealignmentError, RealignmentService};
use crate::registry::{AlignmentRegistry, ColumnTypeRegistry};
use thiserror::Error;
use tracing::error;

/// Errors that can occur while restoring a snapshot
#[derive(Debug, Error)]
pub enum RestoreError {
    /// Realignment after the registry swap failed; the swap itself stands
    /// (best effort then report)
    #[error("realignment after restore failed: {0}")]
    Realignment(#[from] RealignmentError),
}

/// Result type for restore operations
pub type RestoreResult<T> = Result<T, RestoreError>;

/// Immutable deep copy of an alignment plus the column bookkeeping it backs
///
/// Captured before a mutation; structurally independent of the live graph,
/// so later mutations never leak into it. Restoring the same snapshot twice
/// yields the same observable state.
#[derive(Debug, Clone)]
pub struct Snapshot {
    key: AlignmentId,
    column_id: ColumnId,
    alignment: Alignment,
    current_type: Option<SemanticType>,
    synonym_types: Option<SynonymTypes>,
}

impl Snapshot {
    /// Capture the pre-mutation state for one column of one alignment
    pub fn capture(
        key: &AlignmentId,
        alignment: &Alignment,
        types: &ColumnTypeRegistry,
        column_id: &ColumnId,
    ) -> Self {
        Self {
            key: key.clone(),
            column_id: column_id.clone(),
            alignment: alignment.clone(),
            current_type: types.current_type(column_id).cloned(),
            synonym_types: types.synonym_types(column_id).cloned(),
        }
    }

    /// Registry key the snapshot was captured under
    pub fn key(&self) -> &AlignmentId {
        &self.key
    }

    /// Column the snapshot tracks type bookkeeping for
    pub fn column_id(&self) -> &ColumnId {
        &self.column_id
    }

    /// The captured alignment
    pub fn alignment(&self) -> &Alignment {
        &self.alignment
    }

    /// Restore in place: reset a live alignment and the column bookkeeping to
    /// the captured state, without touching the registry
    pub fn restore_into(&self, alignment: &mut Alignment, types: &mut ColumnTypeRegistry) {
        *alignment = self.alignment.clone();
        self.restore_types(types);
    }

    /// Undo: swap the registry's alignment back to the captured state and
    /// restore the column's type bookkeeping
    pub fn restore(
        &self,
        registry: &AlignmentRegistry,
        types: &mut ColumnTypeRegistry,
    ) -> RestoreResult<()> {
        self.restore_with(registry, types, None)
    }

    /// Undo with a realignment pass over the restored alignment
    ///
    /// The registry swap happens first; a realignment failure is reported
    /// after the fact and leaves the swapped (but not realigned) state in
    /// place.
    pub fn restore_with(
        &self,
        registry: &AlignmentRegistry,
        types: &mut ColumnTypeRegistry,
        realigner: Option<&dyn RealignmentService>,
    ) -> RestoreResult<()> {
        registry.put(self.key.clone(), self.alignment.clone());
        self.restore_types(types);

        if let Some(realigner) = realigner {
            registry.with_alignment_mut(&self.key, |alignment| {
                realigner.recompute(alignment).map_err(|e| {
                    error!(key = %self.key, "realignment while undoing assignment failed: {e}");
                    RestoreError::from(e)
                })
            })?;
        }
        Ok(())
    }

    fn restore_types(&self, types: &mut ColumnTypeRegistry) {
        match &self.current_type {
            None => types.unassign(&self.column_id),
            Some(current) => {
                types.set_current_type(self.column_id.clone(), current.clone());
                match &self.synonym_types {
                    Some(synonyms) => {
                        types.set_synonym_types(self.column_id.clone(), synonyms.clone())
                    }
                    None => types.set_synonym_types(self.column_id.clone(), SynonymTypes::default()),
                }
            }
        }
    }
}
