use super::*;
use crate::types::{ScalarKind, ScalarType};

#[test]
fn role_is_entity_dot_property() {
    let role = CollectionRole::new("Order", "items");

    assert_eq!(role.as_str(), "Order.items");
    assert_eq!(role.to_string(), "Order.items");
    assert_eq!(role, CollectionRole::from("Order.items"));
}

#[test]
fn role_serializes_as_plain_string() {
    let role = CollectionRole::new("Order", "items");
    let json = serde_json::to_string(&role).unwrap();

    assert_eq!(json, "\"Order.items\"");
}

#[test]
fn indexed_semantics() {
    assert!(CollectionSemantics::List.is_indexed());
    assert!(CollectionSemantics::Map.is_indexed());
    assert!(!CollectionSemantics::Bag.is_indexed());
    assert!(!CollectionSemantics::Set.is_indexed());
}

#[test]
fn collection_model_builders() {
    let owner = EntityModel::new("Order");
    let model = CollectionModel::new(
        CollectionRole::new("Order", "items"),
        owner,
        CollectionSemantics::List,
        ScalarType::shared(ScalarKind::Uint),
        MappedType::scalar(ScalarKind::Text),
    )
    .with_index_type(MappedType::scalar(ScalarKind::Uint))
    .with_loader("order-items-by-owner");

    assert_eq!(model.role().as_str(), "Order.items");
    assert_eq!(model.owner().name(), "Order");
    assert_eq!(model.semantics(), CollectionSemantics::List);
    assert_eq!(model.key_type().name(), "uint");
    assert_eq!(model.index_type().unwrap().name(), "uint");
    assert_eq!(model.element_type().name(), "text");
    assert_eq!(model.loader(), Some("order-items-by-owner"));
    assert_eq!(model.owner().identity_mode(), IdentityMode::Typed);
}

#[test]
fn loader_defaults_to_none() {
    let model = CollectionModel::new(
        CollectionRole::new("Order", "tags"),
        EntityModel::new("Order"),
        CollectionSemantics::Set,
        ScalarType::shared(ScalarKind::Uint),
        MappedType::scalar(ScalarKind::Text),
    );

    assert!(model.loader().is_none());
    assert!(model.index_type().is_none());
}
