//! Canned mapping fixtures.

use crate::model::{CollectionModel, CollectionRole, CollectionSemantics, EntityModel};
use crate::query::NamedQuery;
use crate::test_support::ReversedText;
use crate::types::{CompositeAttribute, CompositeType, MappedType, ScalarKind, ScalarType};
use std::sync::Arc;

pub const ORDER_ITEMS_QUERY: &str = "order-items-by-owner";

/// `Order.items`: a bag of text elements keyed by a uint owner, loaded by
/// the `order-items-by-owner` retrieval.
#[must_use]
pub fn order_items() -> Arc<CollectionModel> {
    Arc::new(
        CollectionModel::new(
            CollectionRole::new("Order", "items"),
            EntityModel::new("Order"),
            CollectionSemantics::Bag,
            ScalarType::shared(ScalarKind::Uint),
            MappedType::scalar(ScalarKind::Text),
        )
        .with_loader(ORDER_ITEMS_QUERY),
    )
}

/// `Order.labels`: elements whose disassembled form differs from the live
/// form (text stored reversed).
#[must_use]
pub fn reversed_order_labels() -> Arc<CollectionModel> {
    Arc::new(
        CollectionModel::new(
            CollectionRole::new("Order", "labels"),
            EntityModel::new("Order"),
            CollectionSemantics::Bag,
            ScalarType::shared(ScalarKind::Uint),
            MappedType::Scalar(Arc::new(ReversedText)),
        )
        .with_loader(ORDER_ITEMS_QUERY),
    )
}

/// Same role with set semantics.
#[must_use]
pub fn order_items_set() -> Arc<CollectionModel> {
    Arc::new(
        CollectionModel::new(
            CollectionRole::new("Order", "items"),
            EntityModel::new("Order"),
            CollectionSemantics::Set,
            ScalarType::shared(ScalarKind::Uint),
            MappedType::scalar(ScalarKind::Text),
        )
        .with_loader(ORDER_ITEMS_QUERY),
    )
}

/// Loader query declaring one named parameter, `owner`.
#[must_use]
pub fn order_items_query() -> NamedQuery {
    NamedQuery::new(
        ORDER_ITEMS_QUERY,
        "select item from order_items where owner_id = :owner order by position",
    )
    .with_named_parameter("owner")
}

/// Loader query with positional parameters only.
#[must_use]
pub fn positional_items_query() -> NamedQuery {
    NamedQuery::new(
        ORDER_ITEMS_QUERY,
        "select item from order_items where owner_id = ? order by position",
    )
}

/// Composite `BinSlot` descriptor used as a collection index.
#[must_use]
pub fn bin_slot_index() -> Arc<CompositeType> {
    CompositeType::new(
        "BinSlot",
        vec![
            CompositeAttribute::new("bin", MappedType::scalar(ScalarKind::Text)),
            CompositeAttribute::new("slot", MappedType::scalar(ScalarKind::Uint)),
        ],
    )
}

/// `Order.items` as a map indexed by the supplied composite descriptor.
#[must_use]
pub fn indexed_order_items(index: &Arc<CompositeType>) -> Arc<CollectionModel> {
    Arc::new(
        CollectionModel::new(
            CollectionRole::new("Order", "items"),
            EntityModel::new("Order"),
            CollectionSemantics::Map,
            ScalarType::shared(ScalarKind::Uint),
            MappedType::scalar(ScalarKind::Text),
        )
        .with_index_type(MappedType::composite(Arc::clone(index)))
        .with_loader(ORDER_ITEMS_QUERY),
    )
}
