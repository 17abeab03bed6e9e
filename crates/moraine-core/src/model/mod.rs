//! Module: model
//! Responsibility: static mapping metadata for entities and collections.
//! Does not own: runtime collection state, query text, fetch-graph nodes.
//! Boundary: models are immutable once built and shared behind `Arc`.

#[cfg(test)]
mod tests;

use crate::types::{MappedType, ValueType};
use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

///
/// CollectionRole
///
/// Fully-qualified collection role, `Entity.property`.
///

#[derive(
    Clone, Debug, Deserialize, Display, Eq, From, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct CollectionRole(String);

impl CollectionRole {
    #[must_use]
    pub fn new(entity: &str, property: &str) -> Self {
        Self(format!("{entity}.{property}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CollectionRole {
    fn from(role: &str) -> Self {
        Self(role.to_string())
    }
}

///
/// IdentityMode
///
/// Representation an entity instance is handled in. `Typed` is the native
/// struct representation, `Dynamic` the attribute-map one. Collection keys
/// record the mode they were created under but do not compare by it.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
pub enum IdentityMode {
    #[default]
    Typed,
    Dynamic,
}

///
/// CollectionSemantics
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
pub enum CollectionSemantics {
    Bag,
    List,
    Set,
    Map,
}

impl CollectionSemantics {
    /// Lists and maps carry a per-element index.
    #[must_use]
    pub const fn is_indexed(self) -> bool {
        matches!(self, Self::List | Self::Map)
    }
}

///
/// EntityModel
///

#[derive(Clone, Debug)]
pub struct EntityModel {
    name: String,
    identity_mode: IdentityMode,
}

impl EntityModel {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            identity_mode: IdentityMode::default(),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn identity_mode(&self) -> IdentityMode {
        self.identity_mode
    }
}

///
/// CollectionModel
///
/// Mapping metadata for one collection role: its owning entity, semantics,
/// key and element descriptors, the optional index descriptor for indexed
/// semantics, and the optional named retrieval used to load it.
///

#[derive(Clone, Debug)]
pub struct CollectionModel {
    role: CollectionRole,
    owner: Arc<EntityModel>,
    semantics: CollectionSemantics,
    key_type: Arc<dyn ValueType>,
    index_type: Option<MappedType>,
    element_type: MappedType,
    loader: Option<String>,
}

impl CollectionModel {
    #[must_use]
    pub fn new(
        role: CollectionRole,
        owner: Arc<EntityModel>,
        semantics: CollectionSemantics,
        key_type: Arc<dyn ValueType>,
        element_type: MappedType,
    ) -> Self {
        Self {
            role,
            owner,
            semantics,
            key_type,
            index_type: None,
            element_type,
            loader: None,
        }
    }

    #[must_use]
    pub fn with_index_type(mut self, index_type: MappedType) -> Self {
        self.index_type = Some(index_type);
        self
    }

    /// Name of the registered retrieval that loads this collection.
    #[must_use]
    pub fn with_loader(mut self, query_name: impl Into<String>) -> Self {
        self.loader = Some(query_name.into());
        self
    }

    #[must_use]
    pub const fn role(&self) -> &CollectionRole {
        &self.role
    }

    #[must_use]
    pub fn owner(&self) -> &Arc<EntityModel> {
        &self.owner
    }

    #[must_use]
    pub const fn semantics(&self) -> CollectionSemantics {
        self.semantics
    }

    #[must_use]
    pub fn key_type(&self) -> &dyn ValueType {
        self.key_type.as_ref()
    }

    #[must_use]
    pub const fn index_type(&self) -> Option<&MappedType> {
        self.index_type.as_ref()
    }

    #[must_use]
    pub const fn element_type(&self) -> &MappedType {
        &self.element_type
    }

    #[must_use]
    pub fn loader(&self) -> Option<&str> {
        self.loader.as_deref()
    }
}
