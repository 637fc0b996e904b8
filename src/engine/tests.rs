//! End-to-end assignment scenarios over a small fixed ontology

use super::*;
use crate::graph::EdgeKind;
use crate::ontology::{RealignmentError, StaticOntology};
use std::cell::{Cell, RefCell};

const PERSON: &str = "http://example.org/Person";
const PERSON_UPPER: &str = "HTTP://EXAMPLE.ORG/PERSON";
const ORGANIZATION: &str = "http://example.org/Organization";
const NAME: &str = "http://example.org/name";

fn ontology() -> StaticOntology {
    StaticOntology::new()
        .with_uri(PERSON)
        .with_uri(PERSON_UPPER)
        .with_uri(ORGANIZATION)
        .with_uri(NAME)
}

fn class(uri: &str) -> TypeCandidate {
    TypeCandidate::Class {
        class_uri: uri.to_string(),
    }
}

fn property(domain: &str, uri: &str) -> TypeCandidate {
    TypeCandidate::Property {
        domain_id: domain.to_string(),
        property_uri: uri.to_string(),
        domain_uri: None,
    }
}

fn key() -> AlignmentId {
    AlignmentId::for_worksheet("ws", "sheet")
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn forced_incoming(alignment: &Alignment, column: &ColumnId) -> usize {
    alignment
        .incoming_edges(column)
        .iter()
        .filter(|e| e.is_forced())
        .count()
}

/// Suggester that records its calls
#[derive(Default)]
struct RecordingSuggester {
    suggest_calls: Cell<usize>,
    trained: RefCell<Vec<SemanticType>>,
}

impl TypeSuggester for RecordingSuggester {
    fn suggest_types(
        &self,
        column: &crate::graph::ColumnData,
        _max_suggestions: usize,
    ) -> Vec<SemanticType> {
        self.suggest_calls.set(self.suggest_calls.get() + 1);
        vec![SemanticType::new(
            column.column_id.clone(),
            Label::new(NAME),
            Label::new(PERSON),
            Origin::Learned,
            0.6,
        )]
    }

    fn train_on_column(&self, _column_id: &ColumnId, semantic_type: &SemanticType) {
        self.trained.borrow_mut().push(semantic_type.clone());
    }
}

/// Realigner that counts invocations
#[derive(Default)]
struct CountingRealigner {
    recomputes: Cell<usize>,
}

impl RealignmentService for CountingRealigner {
    fn recompute(&self, _alignment: &mut Alignment) -> Result<(), RealignmentError> {
        self.recomputes.set(self.recomputes.get() + 1);
        Ok(())
    }
}

#[test]
fn class_assignment_builds_node_edge_and_user_type() {
    let ontology = ontology();
    let engine = AssignEngine::new(&ontology);
    let registry = AlignmentRegistry::new();
    let mut types = ColumnTypeRegistry::new();
    let column = ColumnId::from("c1");

    let (result, _snapshot) = engine
        .assign(
            &registry,
            &mut types,
            &key(),
            &column,
            "person",
            &[class(PERSON)],
            &ApplyOptions::default(),
        )
        .unwrap();

    let alignment = registry.get(&key()).unwrap();
    // one new internal node labeled Person, plus the column node
    assert_eq!(alignment.node_count(), 2);
    let domain = alignment.node(&crate::graph::NodeId::from(PERSON)).unwrap();
    assert_eq!(domain.label.local_name(), "Person");

    let incoming = alignment.incoming_edges(&column);
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming[0].kind, EdgeKind::ClassInstance);
    assert!(incoming[0].is_forced());

    let applied = result.last_type.unwrap();
    assert_eq!(applied.type_label.local_name(), "class-instance");
    assert_eq!(applied.domain_label.local_name(), "Person");
    assert_eq!(applied.origin, Origin::User);
    assert_eq!(applied.confidence, 1.0);

    let user_types = &alignment.column_node(&column).unwrap().as_column().unwrap().user_types;
    assert_eq!(user_types.len(), 1);
    assert_eq!(types.current_type(&column), Some(&applied));
}

#[test]
fn reassigning_the_same_class_is_idempotent() {
    let ontology = ontology();
    let engine = AssignEngine::new(&ontology);
    let registry = AlignmentRegistry::new();
    let mut types = ColumnTypeRegistry::new();
    let column = ColumnId::from("c1");

    let (first, _) = engine
        .assign(
            &registry,
            &mut types,
            &key(),
            &column,
            "person",
            &[class(PERSON)],
            &ApplyOptions::default(),
        )
        .unwrap();
    let (second, _) = engine
        .assign(
            &registry,
            &mut types,
            &key(),
            &column,
            "person",
            &[class(PERSON)],
            &ApplyOptions::default(),
        )
        .unwrap();

    // edge kept, id unchanged, user type list unchanged in size
    assert_eq!(first.last_edge, second.last_edge);
    let alignment = registry.get(&key()).unwrap();
    assert_eq!(alignment.edge_count(), 1);
    let user_types = &alignment.column_node(&column).unwrap().as_column().unwrap().user_types;
    assert_eq!(user_types.len(), 1);
}

#[test]
fn property_assignment_reuses_domain_and_replaces_edge() {
    let ontology = ontology();
    let engine = AssignEngine::new(&ontology);
    let registry = AlignmentRegistry::new();
    let mut types = ColumnTypeRegistry::new();
    let column = ColumnId::from("c1");

    let (_, _) = engine
        .assign(
            &registry,
            &mut types,
            &key(),
            &column,
            "person",
            &[class(PERSON)],
            &ApplyOptions::default(),
        )
        .unwrap();
    let before = registry.get(&key()).unwrap();
    let old_edge = before.incoming_edges(&column)[0].id;

    let (result, _) = engine
        .assign(
            &registry,
            &mut types,
            &key(),
            &column,
            "person",
            &[property(PERSON, NAME)],
            &ApplyOptions::default(),
        )
        .unwrap();

    let alignment = registry.get(&key()).unwrap();
    // the Person node was reused, not duplicated
    assert_eq!(alignment.node_count(), before.node_count());
    assert!(alignment.edge(&old_edge).is_none());

    let incoming = alignment.incoming_edges(&column);
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming[0].kind, EdgeKind::DataProperty);
    assert_eq!(incoming[0].label.local_name(), "name");
    assert!(incoming[0].is_forced());
    assert_eq!(incoming[0].source.as_str(), PERSON);

    let applied = result.last_type.unwrap();
    assert_eq!(applied.type_label.local_name(), "name");
    assert_eq!(applied.domain_label.local_name(), "Person");
    let user_types = &alignment.column_node(&column).unwrap().as_column().unwrap().user_types;
    assert!(user_types.iter().any(|t| t.same_model_label(&applied)));
}

#[test]
fn property_reassignment_on_same_domain_rebuilds_the_edge() {
    let ontology = ontology();
    let engine = AssignEngine::new(&ontology);
    let registry = AlignmentRegistry::new();
    let mut types = ColumnTypeRegistry::new();
    let column = ColumnId::from("c1");

    let (first, _) = engine
        .assign(
            &registry,
            &mut types,
            &key(),
            &column,
            "person",
            &[property(PERSON, NAME)],
            &ApplyOptions::default(),
        )
        .unwrap();
    let (second, _) = engine
        .assign(
            &registry,
            &mut types,
            &key(),
            &column,
            "person",
            &[property(PERSON, NAME)],
            &ApplyOptions::default(),
        )
        .unwrap();

    // never a no-op: the edge is rebuilt even for an identical property
    assert_ne!(first.last_edge, second.last_edge);
    let alignment = registry.get(&key()).unwrap();
    assert_eq!(alignment.incoming_edges(&column).len(), 1);
}

#[test]
fn at_most_one_forced_edge_after_any_apply() {
    let ontology = ontology();
    let engine = AssignEngine::new(&ontology);
    let registry = AlignmentRegistry::new();
    let mut types = ColumnTypeRegistry::new();
    let column = ColumnId::from("c1");

    for candidates in [
        vec![class(PERSON)],
        vec![class(ORGANIZATION)],
        vec![property(PERSON, NAME)],
        vec![class(PERSON), class(ORGANIZATION)],
    ] {
        engine
            .assign(
                &registry,
                &mut types,
                &key(),
                &column,
                "person",
                &candidates,
                &ApplyOptions::default(),
            )
            .unwrap();
        let alignment = registry.get(&key()).unwrap();
        assert_eq!(forced_incoming(&alignment, &column), 1);
        assert_eq!(alignment.incoming_edges(&column).len(), 1);
    }
}

#[test]
fn dedup_is_case_insensitive_on_the_model_label() {
    let ontology = ontology();
    let engine = AssignEngine::new(&ontology);
    let registry = AlignmentRegistry::new();
    let mut types = ColumnTypeRegistry::new();
    let column = ColumnId::from("c1");

    engine
        .assign(
            &registry,
            &mut types,
            &key(),
            &column,
            "person",
            &[class(PERSON), class(PERSON_UPPER)],
            &ApplyOptions::default(),
        )
        .unwrap();

    let alignment = registry.get(&key()).unwrap();
    let user_types = &alignment.column_node(&column).unwrap().as_column().unwrap().user_types;
    assert_eq!(user_types.len(), 1);
}

#[test]
fn last_candidate_wins_but_the_trace_keeps_everything() {
    let ontology = ontology();
    let engine = AssignEngine::new(&ontology);
    let registry = AlignmentRegistry::new();
    let mut types = ColumnTypeRegistry::new();
    let column = ColumnId::from("c1");

    let (result, _) = engine
        .assign(
            &registry,
            &mut types,
            &key(),
            &column,
            "person",
            &[class(PERSON), class(ORGANIZATION)],
            &ApplyOptions::default(),
        )
        .unwrap();

    assert_eq!(result.trace.len(), 2);
    let applied = result.last_type.unwrap();
    assert_eq!(applied.domain_label.local_name(), "Organization");
    assert_eq!(types.current_type(&column), Some(&applied));
    // the synonym set is recorded empty (last-candidate-wins)
    assert!(types.synonym_types(&column).unwrap().is_empty());
}

#[test]
fn unresolved_property_label_skips_only_that_candidate() {
    init_tracing();
    let ontology = ontology();
    let engine = AssignEngine::new(&ontology);
    let registry = AlignmentRegistry::new();
    let mut types = ColumnTypeRegistry::new();
    let column = ColumnId::from("c1");

    let (result, _) = engine
        .assign(
            &registry,
            &mut types,
            &key(),
            &column,
            "person",
            &[
                property(PERSON, "http://example.org/notInOntology"),
                class(PERSON),
            ],
            &ApplyOptions::default(),
        )
        .unwrap();

    assert_eq!(result.trace.len(), 2);
    assert!(matches!(
        result.trace[0],
        CandidateOutcome::UnresolvedLabel { .. }
    ));
    assert!(matches!(result.trace[1], CandidateOutcome::Applied { .. }));
    let alignment = registry.get(&key()).unwrap();
    assert_eq!(alignment.incoming_edges(&column).len(), 1);
}

#[test]
fn fatal_domain_failure_aborts_cleanly() {
    init_tracing();
    let ontology = ontology();
    let engine = AssignEngine::new(&ontology);
    let registry = AlignmentRegistry::new();
    let mut types = ColumnTypeRegistry::new();
    let column = ColumnId::from("c1");

    engine
        .assign(
            &registry,
            &mut types,
            &key(),
            &column,
            "person",
            &[class(PERSON)],
            &ApplyOptions::default(),
        )
        .unwrap();
    let before = registry.get(&key()).unwrap();
    let before_type = types.current_type(&column).cloned();

    let err = engine
        .assign(
            &registry,
            &mut types,
            &key(),
            &column,
            "person",
            &[class("http://example.org/Ghost"), class(ORGANIZATION)],
            &ApplyOptions::default(),
        )
        .unwrap_err();

    assert!(matches!(err, AssignError::UnresolvedDomain(_)));
    // no partial edge or node is left behind
    assert_eq!(registry.get(&key()).unwrap(), before);
    assert_eq!(types.current_type(&column).cloned(), before_type);
}

#[test]
fn undo_round_trip_restores_graph_and_column_type() {
    let ontology = ontology();
    let engine = AssignEngine::new(&ontology);
    let registry = AlignmentRegistry::new();
    let mut types = ColumnTypeRegistry::new();
    let column = ColumnId::from("c1");

    engine
        .assign(
            &registry,
            &mut types,
            &key(),
            &column,
            "person",
            &[class(PERSON)],
            &ApplyOptions::default(),
        )
        .unwrap();
    let before = registry.get(&key()).unwrap();
    let before_type = types.current_type(&column).cloned();

    let (_, snapshot) = engine
        .assign(
            &registry,
            &mut types,
            &key(),
            &column,
            "person",
            &[property(PERSON, NAME), class(ORGANIZATION)],
            &ApplyOptions::default(),
        )
        .unwrap();
    assert_ne!(registry.get(&key()).unwrap(), before);

    snapshot.restore(&registry, &mut types).unwrap();
    assert_eq!(registry.get(&key()).unwrap(), before);
    assert_eq!(types.current_type(&column).cloned(), before_type);
}

#[test]
fn undo_unassigns_a_column_that_had_no_prior_type() {
    let ontology = ontology();
    let engine = AssignEngine::new(&ontology);
    let registry = AlignmentRegistry::new();
    let mut types = ColumnTypeRegistry::new();
    let column = ColumnId::from("c1");

    let (_, snapshot) = engine
        .assign(
            &registry,
            &mut types,
            &key(),
            &column,
            "person",
            &[class(PERSON)],
            &ApplyOptions::default(),
        )
        .unwrap();
    assert!(types.current_type(&column).is_some());

    snapshot.restore(&registry, &mut types).unwrap();
    assert!(types.current_type(&column).is_none());
    assert!(registry
        .get(&key())
        .unwrap()
        .incoming_edges(&column)
        .is_empty());
}

#[test]
fn interactive_mode_realigns_per_candidate() {
    let ontology = ontology();
    let realigner = CountingRealigner::default();
    let engine = AssignEngine::new(&ontology).with_realigner(&realigner);
    let registry = AlignmentRegistry::new();
    let mut types = ColumnTypeRegistry::new();
    let column = ColumnId::from("c1");

    engine
        .assign(
            &registry,
            &mut types,
            &key(),
            &column,
            "person",
            &[class(PERSON), property(PERSON, NAME)],
            &ApplyOptions::default(),
        )
        .unwrap();

    assert_eq!(realigner.recomputes.get(), 2);
}

#[test]
fn batch_mode_populates_learned_types_exactly_once() {
    let ontology = ontology();
    let realigner = CountingRealigner::default();
    let suggester = RecordingSuggester::default();
    let engine = AssignEngine::new(&ontology)
        .with_realigner(&realigner)
        .with_suggester(&suggester);
    let registry = AlignmentRegistry::new();
    let mut types = ColumnTypeRegistry::new();
    let column = ColumnId::from("c1");

    for candidates in [vec![class(PERSON)], vec![class(ORGANIZATION)]] {
        engine
            .assign(
                &registry,
                &mut types,
                &key(),
                &column,
                "person",
                &candidates,
                &ApplyOptions::batch(),
            )
            .unwrap();
    }

    // realignment is deferred in batch mode; suggestion runs only once
    assert_eq!(realigner.recomputes.get(), 0);
    assert_eq!(suggester.suggest_calls.get(), 1);
    let alignment = registry.get(&key()).unwrap();
    let learned = alignment
        .column_node(&column)
        .unwrap()
        .as_column()
        .unwrap()
        .learned_types
        .as_ref()
        .unwrap();
    assert_eq!(learned.len(), 1);
    assert_eq!(learned[0].origin, Origin::Learned);
}

#[test]
fn training_runs_when_requested_interactively() {
    let ontology = ontology();
    let suggester = RecordingSuggester::default();
    let engine = AssignEngine::new(&ontology).with_suggester(&suggester);
    let registry = AlignmentRegistry::new();
    let mut types = ColumnTypeRegistry::new();
    let column = ColumnId::from("c1");

    engine
        .assign(
            &registry,
            &mut types,
            &key(),
            &column,
            "person",
            &[class(PERSON)],
            &ApplyOptions::interactive().with_training(),
        )
        .unwrap();

    let trained = suggester.trained.borrow();
    assert_eq!(trained.len(), 1);
    assert_eq!(trained[0].domain_label.local_name(), "Person");
}

#[test]
fn batch_training_follows_the_config_flag() {
    let ontology = ontology();
    let suggester = RecordingSuggester::default();
    let config = EngineConfig {
        train_on_apply: true,
        predict_on_apply: false,
        ..EngineConfig::default()
    };
    let engine = AssignEngine::new(&ontology)
        .with_suggester(&suggester)
        .with_config(config);
    let registry = AlignmentRegistry::new();
    let mut types = ColumnTypeRegistry::new();
    let column = ColumnId::from("c1");

    engine
        .assign(
            &registry,
            &mut types,
            &key(),
            &column,
            "person",
            &[class(PERSON)],
            &ApplyOptions::batch(),
        )
        .unwrap();

    assert_eq!(suggester.trained.borrow().len(), 1);
    // predict_on_apply was off, so nothing was learned
    let alignment = registry.get(&key()).unwrap();
    assert!(alignment
        .column_node(&column)
        .unwrap()
        .as_column()
        .unwrap()
        .learned_types
        .is_none());
}

#[test]
fn literal_type_is_recorded_on_the_column() {
    let ontology = ontology();
    let engine = AssignEngine::new(&ontology);
    let registry = AlignmentRegistry::new();
    let mut types = ColumnTypeRegistry::new();
    let column = ColumnId::from("c1");

    engine
        .assign(
            &registry,
            &mut types,
            &key(),
            &column,
            "person",
            &[class(PERSON)],
            &ApplyOptions::interactive().with_literal_type("xsd:string"),
        )
        .unwrap();

    let alignment = registry.get(&key()).unwrap();
    assert_eq!(
        alignment
            .column_node(&column)
            .unwrap()
            .as_column()
            .unwrap()
            .rdf_literal_type
            .as_deref(),
        Some("xsd:string")
    );
}

mod wire_format {
    use super::*;
    use serde_json::json;

    #[test]
    fn class_candidate_has_empty_domain() {
        let candidate = TypeCandidate::from_parts("", PERSON, None).unwrap();
        assert_eq!(
            candidate,
            TypeCandidate::Class {
                class_uri: PERSON.to_string()
            }
        );
    }

    #[test]
    fn property_candidate_keeps_domain_and_alternate_uri() {
        let candidate =
            TypeCandidate::from_parts(PERSON, NAME, Some("http://example.org/Agent")).unwrap();
        assert_eq!(
            candidate,
            TypeCandidate::Property {
                domain_id: PERSON.to_string(),
                property_uri: NAME.to_string(),
                domain_uri: Some("http://example.org/Agent".to_string()),
            }
        );
    }

    #[test]
    fn empty_full_type_is_malformed() {
        assert!(TypeCandidate::from_parts("", "", None).is_err());
    }

    #[test]
    fn json_array_parses_both_domain_keys() {
        let payload = json!([
            { "DomainId": "", "FullType": PERSON },
            { "Domain": PERSON, "FullType": NAME, "DomainUri": "http://example.org/Agent" }
        ]);
        let candidates = candidates_from_json(&payload);
        assert_eq!(candidates.len(), 2);
        assert!(matches!(candidates[0], TypeCandidate::Class { .. }));
        assert!(matches!(
            candidates[1],
            TypeCandidate::Property {
                domain_uri: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn malformed_entries_are_skipped_not_fatal() {
        let payload = json!([
            { "FullType": PERSON },
            "not an object",
            { "DomainId": "", "FullType": PERSON }
        ]);
        let candidates = candidates_from_json(&payload);
        assert_eq!(candidates.len(), 1);
    }
}
