//! Core runtime for moraine: mapping metadata, typed fetch-plan graphs and
//! named-query collection loading over a pluggable retrieval engine.
//!
//! A `Session` owns the persistence context for one unit of work; loaders
//! fill tracked collections and leave behind the storage-independent
//! snapshots that dirty checking runs on.

pub mod context;
pub mod error;
pub mod loader;
pub mod model;
pub mod plan;
pub mod query;
pub mod session;
pub mod types;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, engines, sessions, or loader machinery are re-exported here.
///

pub mod prelude {
    pub use crate::{
        context::{CollectionKey, CollectionSnapshot, PersistenceContext, PersistentCollection},
        model::{CollectionModel, CollectionRole, CollectionSemantics, EntityModel, IdentityMode},
        plan::{FetchPlan, FetchPlanBuilder, PropertyPath},
        query::RetrievalEngine,
        types::{CompositeAttribute, CompositeType, MappedType, ScalarKind, ScalarType, ValueType},
        value::{Float64, Ulid, Value},
    };
}
