//! Alignment registry and per-column type bookkeeping

use crate::graph::{Alignment, AlignmentId, ColumnId, SemanticType, SynonymTypes};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Registry of alignments keyed by workspace + worksheet
///
/// Caller-owned: passed explicitly to the engine rather than living as
/// ambient process state. Entries are created lazily on first access,
/// replaced wholesale on undo, and never otherwise removed. The per-key entry
/// guard taken by [`with_alignment_mut`](Self::with_alignment_mut) serializes
/// mutations per alignment, so one assignment is in flight at a time for any
/// registry key.
#[derive(Debug, Default)]
pub struct AlignmentRegistry {
    alignments: DashMap<AlignmentId, Alignment>,
}

impl AlignmentRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            alignments: DashMap::new(),
        }
    }

    /// Get a clone of the alignment for a key
    pub fn get(&self, key: &AlignmentId) -> Option<Alignment> {
        self.alignments.get(key).map(|r| r.clone())
    }

    /// Replace the alignment for a key
    pub fn put(&self, key: AlignmentId, alignment: Alignment) {
        self.alignments.insert(key, alignment);
    }

    /// Check if an alignment exists for a key
    pub fn contains(&self, key: &AlignmentId) -> bool {
        self.alignments.contains_key(key)
    }

    /// Number of registered alignments
    pub fn len(&self) -> usize {
        self.alignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alignments.is_empty()
    }

    /// Run `f` against the alignment for `key`, creating an empty alignment
    /// if none exists yet
    ///
    /// Holds the key's entry guard for the duration of `f`.
    pub fn with_alignment_mut<T>(
        &self,
        key: &AlignmentId,
        f: impl FnOnce(&mut Alignment) -> T,
    ) -> T {
        let mut entry = self
            .alignments
            .entry(key.clone())
            .or_insert_with(Alignment::new);
        f(entry.value_mut())
    }
}

/// Per-column store of the current user type and its synonym types
///
/// Backs undo: restoring either reinstates a previously recorded type or
/// unassigns the column entirely.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnTypeRegistry {
    current: HashMap<ColumnId, SemanticType>,
    synonyms: HashMap<ColumnId, SynonymTypes>,
}

impl ColumnTypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The column's currently assigned type
    pub fn current_type(&self, column_id: &ColumnId) -> Option<&SemanticType> {
        self.current.get(column_id)
    }

    /// Record the column's current type
    pub fn set_current_type(&mut self, column_id: ColumnId, semantic_type: SemanticType) {
        self.current.insert(column_id, semantic_type);
    }

    /// Remove the column's type and synonym types
    pub fn unassign(&mut self, column_id: &ColumnId) {
        self.current.remove(column_id);
        self.synonyms.remove(column_id);
    }

    /// The column's synonym types
    pub fn synonym_types(&self, column_id: &ColumnId) -> Option<&SynonymTypes> {
        self.synonyms.get(column_id)
    }

    /// Record the column's synonym types
    pub fn set_synonym_types(&mut self, column_id: ColumnId, synonym_types: SynonymTypes) {
        self.synonyms.insert(column_id, synonym_types);
    }
}
