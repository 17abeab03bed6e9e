//! Module: context
//! Responsibility: unit-of-work bookkeeping for tracked collections.
//! Does not own: query execution, type coercion, mapping metadata.
//! Boundary: single-threaded; tracked collections are shared through
//! `Rc<RefCell<..>>` handles.

mod collection;


use crate::model::{CollectionModel, CollectionRole, IdentityMode};
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use thiserror::Error as ThisError;

pub use self::collection::{
    CollectionEntry, CollectionSnapshot, CollectionState, PersistentCollection,
};

///
/// ContextError
///

#[derive(Debug, ThisError)]
pub enum ContextError {
    #[error("collection {role} of owner {owner:?} is already tracked")]
    DuplicateCollectionKey { role: CollectionRole, owner: Value },

    #[error("collection has no bookkeeping entry in this context")]
    MissingEntry,

    #[error("set collection holds a duplicate element at position {position}")]
    DuplicateSetElement { position: usize },
}

///
/// CollectionKey
///
/// Identifies one collection instance inside a persistence context: the
/// collection role plus the owning entity's key. The identity mode the
/// key was created under is recorded for diagnostics but takes no part in
/// equality or hashing, so typed and dynamic handles of the same owner
/// land in the same map slot.
///

#[derive(Clone, Debug)]
pub struct CollectionKey {
    role: CollectionRole,
    owner_key: Value,
    mode: IdentityMode,
}

impl CollectionKey {
    #[must_use]
    pub const fn new(role: CollectionRole, owner_key: Value, mode: IdentityMode) -> Self {
        Self {
            role,
            owner_key,
            mode,
        }
    }

    /// Key for one owner's collection under a mapping model.
    #[must_use]
    pub fn for_collection(model: &CollectionModel, owner_key: Value, mode: IdentityMode) -> Self {
        Self::new(model.role().clone(), owner_key, mode)
    }

    #[must_use]
    pub const fn role(&self) -> &CollectionRole {
        &self.role
    }

    #[must_use]
    pub const fn owner_key(&self) -> &Value {
        &self.owner_key
    }

    #[must_use]
    pub const fn identity_mode(&self) -> IdentityMode {
        self.mode
    }
}

impl PartialEq for CollectionKey {
    fn eq(&self, other: &Self) -> bool {
        self.role == other.role && self.owner_key == other.owner_key
    }
}

impl Eq for CollectionKey {}

impl Hash for CollectionKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.role.hash(state);
        self.owner_key.hash(state);
    }
}

impl fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{:?}", self.role, self.owner_key)
    }
}

/// Shared handle to one tracked collection.
pub type SharedCollection = Rc<RefCell<PersistentCollection>>;

/// Entry map key, the address of the shared cell.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
struct CollectionAddr(usize);

impl CollectionAddr {
    fn of(collection: &SharedCollection) -> Self {
        Self(Rc::as_ptr(collection).addr())
    }
}

///
/// PersistenceContext
///
/// Unit-of-work bookkeeping: tracked collections by key plus a
/// per-instance entry. Key lookup is a direct map hit; the key's own
/// equality already ignores identity mode.
///

#[derive(Debug, Default)]
pub struct PersistenceContext {
    collections_by_key: HashMap<CollectionKey, SharedCollection>,
    entries: HashMap<CollectionAddr, CollectionEntry>,
}

impl PersistenceContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a not-yet-loaded collection under its key.
    ///
    /// Also creates the collection's bookkeeping entry.
    pub fn add_uninitialized_collection(
        &mut self,
        key: CollectionKey,
        collection: PersistentCollection,
    ) -> Result<SharedCollection, ContextError> {
        if self.collections_by_key.contains_key(&key) {
            return Err(ContextError::DuplicateCollectionKey {
                role: key.role.clone(),
                owner: key.owner_key.clone(),
            });
        }

        let shared: SharedCollection = Rc::new(RefCell::new(collection));
        self.entries
            .insert(CollectionAddr::of(&shared), CollectionEntry::default());
        self.collections_by_key.insert(key, Rc::clone(&shared));

        Ok(shared)
    }

    /// Tracked collection for a key, if any.
    #[must_use]
    pub fn collection(&self, key: &CollectionKey) -> Option<SharedCollection> {
        self.collections_by_key.get(key).map(Rc::clone)
    }

    #[must_use]
    pub const fn collections_by_key(&self) -> &HashMap<CollectionKey, SharedCollection> {
        &self.collections_by_key
    }

    #[must_use]
    pub fn collection_entry(&self, collection: &SharedCollection) -> Option<&CollectionEntry> {
        self.entries.get(&CollectionAddr::of(collection))
    }

    #[must_use]
    pub fn collection_entry_mut(
        &mut self,
        collection: &SharedCollection,
    ) -> Option<&mut CollectionEntry> {
        self.entries.get_mut(&CollectionAddr::of(collection))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.collections_by_key.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collections_by_key.is_empty()
    }

    /// Drop all tracked state.
    pub fn clear(&mut self) {
        self.collections_by_key.clear();
        self.entries.clear();
    }
}
