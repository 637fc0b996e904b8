//! Domain-node resolution: reuse an existing graph node or synthesize one

use super::{AssignError, AssignResult};
use crate::graph::{Alignment, Label, NodeId};
use crate::ontology::OntologyLookup;
use tracing::{debug, info};

/// Reserved suffix a client appends to request a fresh class instance
pub const ADD_MARKER: &str = " (add)";

/// Strip the add-new-instance marker, trimming any leftover whitespace
pub(super) fn strip_add_marker(identifier: &str) -> &str {
    match identifier.strip_suffix(ADD_MARKER) {
        Some(stripped) => stripped.trim(),
        None => identifier,
    }
}

/// Resolve a domain identifier to a graph node, creating one when needed
///
/// Lookup ladder: an existing node with this id is returned unchanged (reuse
/// is preferred over duplication); otherwise the ontology is consulted for a
/// label; otherwise a caller-supplied alternate URI becomes the label;
/// otherwise, if the identifier ends in a digit (a disambiguation suffix from
/// an earlier duplicate-class node), the digit is stripped and the ontology
/// consulted once more. When all of that fails the whole assignment must
/// abort with [`AssignError::UnresolvedDomain`].
pub fn resolve_domain(
    alignment: &mut Alignment,
    ontology: &dyn OntologyLookup,
    identifier: &str,
    alternate_uri: Option<&str>,
) -> AssignResult<NodeId> {
    let identifier = strip_add_marker(identifier);

    if let Some(node) = alignment.node(&NodeId::from(identifier)) {
        debug!(id = %node.id, "reusing existing domain node");
        return Ok(node.id.clone());
    }

    let label = ontology
        .label_for_uri(identifier)
        .or_else(|| alternate_uri.map(Label::new))
        .or_else(|| {
            digit_stripped(identifier).and_then(|shorter| ontology.label_for_uri(shorter))
        })
        .ok_or_else(|| AssignError::UnresolvedDomain(identifier.to_string()))?;

    let id = alignment.add_internal_node(label);
    info!(%id, "created internal domain node");
    Ok(id)
}

/// The identifier with a trailing disambiguation digit removed, if it has one
fn digit_stripped(identifier: &str) -> Option<&str> {
    let last = identifier.chars().last()?;
    (identifier.len() > 1 && last.is_ascii_digit())
        .then(|| &identifier[..identifier.len() - 1])
}
