use super::*;
use crate::context::{CollectionState, PersistentCollection, SharedCollection};
use crate::model::{CollectionSemantics, EntityModel};
use crate::query::{NamedQuery, ParameterBinding, QueryError, RetrievalError};
use crate::test_support::{ScriptedEngine, ScriptedResponse, fixtures};
use crate::types::{
    CompositeAttribute, CompositeType, MappedType, ScalarKind, ScalarType, TypeError,
};

fn tracked_session(
    engine: ScriptedEngine,
    query: NamedQuery,
    model: &Arc<CollectionModel>,
    owner: u64,
) -> (Session<ScriptedEngine>, SharedCollection) {
    let mut session = Session::new(engine);
    session.register_query(query).unwrap();

    let collection = session
        .track_collection(
            model,
            Value::from(owner),
            PersistentCollection::uninitialized(model.semantics(), Some(Value::from(owner))),
        )
        .unwrap();

    (session, collection)
}

#[test]
fn initializes_a_tracked_collection_end_to_end() {
    let engine = ScriptedEngine::with_rows(vec![Value::from("A"), Value::from("B")]);
    let model = fixtures::order_items();
    let (mut session, collection) =
        tracked_session(engine, fixtures::order_items_query(), &model, 42);

    let initializer = NamedQueryCollectionInitializer::from_model(Arc::clone(&model)).unwrap();
    initializer
        .initialize(&Value::from(42_u64), &mut session)
        .unwrap();

    // the engine saw one manual-flush request bound to the named parameter
    let requests = session.engine().requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].flush_mode(), FlushMode::Manual);
    assert_eq!(
        requests[0].binding(),
        &ParameterBinding::Named {
            name: "owner".to_string(),
            value: Value::from(42_u64),
        }
    );

    let request_key = requests[0].collection_key().unwrap();
    assert_eq!(request_key.role().as_str(), "Order.items");
    assert_eq!(request_key.owner_key(), &Value::from(42_u64));

    // contents arrive in retrieval order
    let state = collection.borrow();
    assert!(state.is_initialized());
    assert_eq!(state.elements(), &[Value::from("A"), Value::from("B")][..]);

    let snapshot = state.snapshot().unwrap();
    assert_eq!(snapshot.owner_key(), &Value::from(42_u64));
    assert_eq!(snapshot.role().as_str(), "Order.items");
    assert_eq!(snapshot.elements(), &[Value::from("A"), Value::from("B")][..]);
    assert!(!state.is_dirty());
    drop(state);

    // bookkeeping ran exactly once
    let entry = session.context().collection_entry(&collection).unwrap();
    assert_eq!(entry.post_initialize_count(), 1);
    assert_eq!(entry.owner_key(), Some(&Value::from(42_u64)));
}

#[test]
fn initialization_leaves_other_tracked_entries_untouched() {
    let engine = ScriptedEngine::with_rows(vec![Value::from("A"), Value::from("B")]);
    let model = fixtures::order_items();
    let (mut session, target) =
        tracked_session(engine, fixtures::order_items_query(), &model, 42);

    let other_owner = session
        .track_collection(
            &model,
            Value::from(7_u64),
            PersistentCollection::uninitialized(model.semantics(), Some(Value::from(7_u64))),
        )
        .unwrap();

    let tags = Arc::new(CollectionModel::new(
        CollectionRole::new("Order", "tags"),
        EntityModel::new("Order"),
        CollectionSemantics::Bag,
        ScalarType::shared(ScalarKind::Uint),
        MappedType::scalar(ScalarKind::Text),
    ));
    let other_role = session
        .track_collection(
            &tags,
            Value::from(42_u64),
            PersistentCollection::uninitialized(tags.semantics(), Some(Value::from(42_u64))),
        )
        .unwrap();

    let initializer = NamedQueryCollectionInitializer::from_model(Arc::clone(&model)).unwrap();
    initializer
        .initialize(&Value::from(42_u64), &mut session)
        .unwrap();

    let state = target.borrow();
    assert!(state.is_initialized());
    assert_eq!(state.elements(), &[Value::from("A"), Value::from("B")][..]);
    drop(state);

    // same role, other owner
    let state = other_owner.borrow();
    assert!(!state.is_initialized());
    assert!(state.elements().is_empty());
    assert!(state.snapshot().is_none());
    drop(state);

    // same owner, other role
    let state = other_role.borrow();
    assert!(!state.is_initialized());
    assert!(state.elements().is_empty());
    assert!(state.snapshot().is_none());
    drop(state);

    let context = session.context();
    assert_eq!(
        context
            .collection_entry(&other_owner)
            .unwrap()
            .post_initialize_count(),
        0
    );
    assert_eq!(
        context
            .collection_entry(&other_role)
            .unwrap()
            .post_initialize_count(),
        0
    );
}

#[test]
fn positional_queries_bind_the_owner_at_position_zero() {
    let engine = ScriptedEngine::with_rows(vec![Value::from("A")]);
    let model = fixtures::order_items();
    let (mut session, _collection) =
        tracked_session(engine, fixtures::positional_items_query(), &model, 42);

    let initializer = NamedQueryCollectionInitializer::from_model(Arc::clone(&model)).unwrap();
    initializer
        .initialize(&Value::from(42_u64), &mut session)
        .unwrap();

    let requests = session.engine().requests();
    assert_eq!(
        requests[0].binding(),
        &ParameterBinding::Positional {
            position: 0,
            value: Value::from(42_u64),
        }
    );
}

#[test]
fn zero_rows_still_initialize_with_an_empty_snapshot() {
    let engine = ScriptedEngine::with_rows(Vec::new());
    let model = fixtures::order_items();
    let (mut session, collection) =
        tracked_session(engine, fixtures::order_items_query(), &model, 42);

    let initializer = NamedQueryCollectionInitializer::from_model(Arc::clone(&model)).unwrap();
    initializer
        .initialize(&Value::from(42_u64), &mut session)
        .unwrap();

    let state = collection.borrow();
    assert!(state.is_initialized());
    assert!(state.elements().is_empty());

    // an empty load still leaves a snapshot behind
    assert!(state.snapshot().unwrap().elements().is_empty());
    drop(state);

    let entry = session.context().collection_entry(&collection).unwrap();
    assert_eq!(entry.post_initialize_count(), 1);
}

#[test]
fn untracked_collections_fail_without_side_effects() {
    let engine = ScriptedEngine::with_rows(vec![Value::from("A")]);
    let model = fixtures::order_items();
    let mut session = Session::new(engine);
    session
        .register_query(fixtures::order_items_query())
        .unwrap();

    let initializer = NamedQueryCollectionInitializer::from_model(Arc::clone(&model)).unwrap();
    let err = initializer
        .initialize(&Value::from(42_u64), &mut session)
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Loader(LoaderError::NoTrackedCollection { .. })
    ));
    assert!(session.context().is_empty());
}

#[test]
fn missing_named_query_leaves_the_collection_untouched() {
    let model = fixtures::order_items();
    let mut session = Session::new(ScriptedEngine::new());
    let collection = session
        .track_collection(
            &model,
            Value::from(42_u64),
            PersistentCollection::uninitialized(CollectionSemantics::Bag, None),
        )
        .unwrap();

    let initializer = NamedQueryCollectionInitializer::from_model(Arc::clone(&model)).unwrap();
    let err = initializer
        .initialize(&Value::from(42_u64), &mut session)
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Query(QueryError::UnknownNamedQuery { .. })
    ));
    assert_eq!(collection.borrow().state(), CollectionState::Uninitialized);
    assert!(session.engine().requests().is_empty());
}

#[test]
fn engine_failure_leaves_the_collection_untouched() {
    let engine = ScriptedEngine::new();
    engine.push_response(ScriptedResponse::Fail("backend offline".to_string()));

    let model = fixtures::order_items();
    let (mut session, collection) =
        tracked_session(engine, fixtures::order_items_query(), &model, 42);

    let initializer = NamedQueryCollectionInitializer::from_model(Arc::clone(&model)).unwrap();
    let err = initializer
        .initialize(&Value::from(42_u64), &mut session)
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Retrieval(RetrievalError::Execution { .. })
    ));

    let state = collection.borrow();
    assert!(!state.is_initialized());
    assert!(state.elements().is_empty());
    assert!(state.snapshot().is_none());
    drop(state);

    let entry = session.context().collection_entry(&collection).unwrap();
    assert_eq!(entry.post_initialize_count(), 0);
}

#[test]
fn a_row_failing_disassembly_aborts_before_any_mutation() {
    let engine = ScriptedEngine::with_rows(vec![Value::from("A"), Value::from(7_u64)]);
    let model = fixtures::order_items();
    let (mut session, collection) =
        tracked_session(engine, fixtures::order_items_query(), &model, 42);

    let initializer = NamedQueryCollectionInitializer::from_model(Arc::clone(&model)).unwrap();
    let err = initializer
        .initialize(&Value::from(42_u64), &mut session)
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Type(TypeError::Incompatible { found: "uint", .. })
    ));

    let state = collection.borrow();
    assert_eq!(state.state(), CollectionState::Uninitialized);
    assert!(state.elements().is_empty());
    assert!(state.snapshot().is_none());
}

#[test]
fn owner_key_must_match_the_key_descriptor() {
    let engine = ScriptedEngine::with_rows(vec![Value::from("A")]);
    let model = fixtures::order_items();
    let (mut session, _collection) =
        tracked_session(engine, fixtures::order_items_query(), &model, 42);

    let initializer = NamedQueryCollectionInitializer::from_model(Arc::clone(&model)).unwrap();
    let err = initializer
        .initialize(&Value::from("42"), &mut session)
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Type(TypeError::Incompatible { found: "text", .. })
    ));
    assert!(session.engine().requests().is_empty());
}

#[test]
fn duplicate_set_rows_never_reach_initialized_state() {
    let engine = ScriptedEngine::with_rows(vec![Value::from("A"), Value::from("A")]);
    let model = fixtures::order_items_set();
    let (mut session, collection) =
        tracked_session(engine, fixtures::order_items_query(), &model, 42);

    let initializer = NamedQueryCollectionInitializer::from_model(Arc::clone(&model)).unwrap();
    let err = initializer
        .initialize(&Value::from(42_u64), &mut session)
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Context(ContextError::DuplicateSetElement { position: 1 })
    ));
    assert!(!collection.borrow().is_initialized());

    let entry = session.context().collection_entry(&collection).unwrap();
    assert_eq!(entry.post_initialize_count(), 0);
}

#[test]
fn reinitializing_replaces_contents_and_snapshot() {
    let engine = ScriptedEngine::with_rows(vec![Value::from("A"), Value::from("B")]);
    engine.push_response(ScriptedResponse::Rows(vec![Value::from("C")]));

    let model = fixtures::order_items();
    let (mut session, collection) =
        tracked_session(engine, fixtures::order_items_query(), &model, 42);

    let initializer = NamedQueryCollectionInitializer::from_model(Arc::clone(&model)).unwrap();
    initializer
        .initialize(&Value::from(42_u64), &mut session)
        .unwrap();
    initializer
        .initialize(&Value::from(42_u64), &mut session)
        .unwrap();

    let state = collection.borrow();
    assert_eq!(state.elements(), &[Value::from("C")][..]);
    assert_eq!(state.snapshot().unwrap().elements(), &[Value::from("C")][..]);
    drop(state);

    let entry = session.context().collection_entry(&collection).unwrap();
    assert_eq!(entry.post_initialize_count(), 2);
}

#[test]
fn reinitializing_with_unchanged_rows_reproduces_the_snapshot() {
    let rows = vec![Value::from("A"), Value::from("B")];
    let engine = ScriptedEngine::with_rows(rows.clone());
    engine.push_response(ScriptedResponse::Rows(rows.clone()));

    let model = fixtures::order_items();
    let (mut session, collection) =
        tracked_session(engine, fixtures::order_items_query(), &model, 42);

    let initializer = NamedQueryCollectionInitializer::from_model(Arc::clone(&model)).unwrap();
    initializer
        .initialize(&Value::from(42_u64), &mut session)
        .unwrap();
    let first = collection.borrow().snapshot().cloned().unwrap();

    initializer
        .initialize(&Value::from(42_u64), &mut session)
        .unwrap();
    let second = collection.borrow().snapshot().cloned().unwrap();

    assert_eq!(first, second);
    assert_eq!(second.elements(), rows.as_slice());

    let entry = session.context().collection_entry(&collection).unwrap();
    assert_eq!(entry.post_initialize_count(), 2);
    assert_eq!(entry.snapshot(), Some(&second));
}

#[test]
fn composite_elements_disassemble_per_attribute() {
    let money = CompositeType::new(
        "Money",
        vec![
            CompositeAttribute::new("amount", MappedType::scalar(ScalarKind::Int)),
            CompositeAttribute::new("currency", MappedType::scalar(ScalarKind::Text)),
        ],
    );
    let model = Arc::new(
        CollectionModel::new(
            CollectionRole::new("Order", "payments"),
            EntityModel::new("Order"),
            CollectionSemantics::Bag,
            ScalarType::shared(ScalarKind::Uint),
            MappedType::composite(money),
        )
        .with_loader(fixtures::ORDER_ITEMS_QUERY),
    );

    let rows = vec![
        Value::Composite(vec![Value::from(120_i64), Value::from("EUR")]),
        Value::Composite(vec![Value::from(7_i64), Value::from("USD")]),
    ];
    let engine = ScriptedEngine::with_rows(rows.clone());
    let (mut session, collection) =
        tracked_session(engine, fixtures::order_items_query(), &model, 42);

    let initializer = NamedQueryCollectionInitializer::from_model(Arc::clone(&model)).unwrap();
    initializer
        .initialize(&Value::from(42_u64), &mut session)
        .unwrap();

    let state = collection.borrow();
    assert_eq!(state.elements(), rows.as_slice());
    assert_eq!(state.snapshot().unwrap().elements(), rows.as_slice());
}

#[test]
fn snapshots_store_the_disassembled_form() {
    let engine = ScriptedEngine::with_rows(vec![Value::from("abc"), Value::from("de")]);
    let model = fixtures::reversed_order_labels();
    let (mut session, collection) =
        tracked_session(engine, fixtures::order_items_query(), &model, 42);

    let initializer = NamedQueryCollectionInitializer::from_model(Arc::clone(&model)).unwrap();
    initializer
        .initialize(&Value::from(42_u64), &mut session)
        .unwrap();

    // live contents assemble back to the retrieval form; the snapshot keeps
    // the storage form
    let state = collection.borrow();
    assert_eq!(state.elements(), &[Value::from("abc"), Value::from("de")][..]);
    assert_eq!(
        state.snapshot().unwrap().elements(),
        &[Value::from("cba"), Value::from("ed")][..]
    );
}

#[test]
fn mappings_without_a_loader_cannot_build_an_initializer() {
    let model = Arc::new(CollectionModel::new(
        CollectionRole::new("Order", "notes"),
        EntityModel::new("Order"),
        CollectionSemantics::Bag,
        ScalarType::shared(ScalarKind::Uint),
        MappedType::scalar(ScalarKind::Text),
    ));

    let err = NamedQueryCollectionInitializer::from_model(model).unwrap_err();
    assert!(matches!(
        err,
        LoaderError::MissingLoader { role } if role.as_str() == "Order.notes"
    ));
}
