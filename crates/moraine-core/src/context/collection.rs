use crate::context::{ContextError, PersistenceContext};
use crate::model::{CollectionModel, CollectionRole, CollectionSemantics};
use crate::types::TypeError;
use crate::value::Value;
use derive_more::Display;
use serde::{Deserialize, Serialize};

///
/// CollectionState
///

#[derive(Clone, Copy, Debug, Default, Display, Eq, PartialEq)]
pub enum CollectionState {
    #[default]
    Uninitialized,
    Initialized,
}

///
/// CollectionSnapshot
///
/// Storage-independent copy of a collection's loaded state, tagged with
/// the owner key and role it was taken for.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct CollectionSnapshot {
    owner_key: Value,
    role: CollectionRole,
    elements: Vec<Value>,
}

impl CollectionSnapshot {
    #[must_use]
    pub const fn new(owner_key: Value, role: CollectionRole, elements: Vec<Value>) -> Self {
        Self {
            owner_key,
            role,
            elements,
        }
    }

    #[must_use]
    pub const fn owner_key(&self) -> &Value {
        &self.owner_key
    }

    #[must_use]
    pub const fn role(&self) -> &CollectionRole {
        &self.role
    }

    #[must_use]
    pub fn elements(&self) -> &[Value] {
        &self.elements
    }
}

///
/// PersistentCollection
///
/// Runtime state of one tracked collection instance. Uninitialized until a
/// loader fills it; the snapshot taken at initialization is what dirty
/// checking compares against.
///

#[derive(Debug)]
pub struct PersistentCollection {
    semantics: CollectionSemantics,
    state: CollectionState,
    owner: Option<Value>,
    elements: Vec<Value>,
    snapshot: Option<CollectionSnapshot>,
}

impl PersistentCollection {
    #[must_use]
    pub const fn uninitialized(semantics: CollectionSemantics, owner: Option<Value>) -> Self {
        Self {
            semantics,
            state: CollectionState::Uninitialized,
            owner,
            elements: Vec::new(),
            snapshot: None,
        }
    }

    #[must_use]
    pub const fn semantics(&self) -> CollectionSemantics {
        self.semantics
    }

    #[must_use]
    pub const fn state(&self) -> CollectionState {
        self.state
    }

    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        matches!(self.state, CollectionState::Initialized)
    }

    #[must_use]
    pub const fn owner(&self) -> Option<&Value> {
        self.owner.as_ref()
    }

    #[must_use]
    pub fn elements(&self) -> &[Value] {
        &self.elements
    }

    #[must_use]
    pub const fn snapshot(&self) -> Option<&CollectionSnapshot> {
        self.snapshot.as_ref()
    }

    /// Replace contents with rows assembled from their snapshot form.
    ///
    /// All rows are assembled before any element is stored; a failing row
    /// leaves the collection untouched.
    pub fn init_from_disassembled(
        &mut self,
        model: &CollectionModel,
        disassembled: &[Value],
        owner: Option<&Value>,
        context: &PersistenceContext,
    ) -> Result<(), TypeError> {
        let element_type = model.element_type().value_type();

        let mut assembled = Vec::with_capacity(disassembled.len());
        for entry in disassembled {
            assembled.push(element_type.assemble(entry, context, owner)?);
        }

        self.elements = assembled;

        Ok(())
    }

    /// Record the storage-independent snapshot for dirty checking.
    pub fn set_snapshot(&mut self, owner_key: Value, role: CollectionRole, elements: Vec<Value>) {
        self.snapshot = Some(CollectionSnapshot::new(owner_key, role, elements));
    }

    /// Flip to initialized once loading completes.
    ///
    /// Set semantics reject duplicate elements here, before the flip.
    pub fn after_initialize(&mut self) -> Result<(), ContextError> {
        if self.semantics == CollectionSemantics::Set {
            for (position, element) in self.elements.iter().enumerate() {
                if self.elements[..position].contains(element) {
                    return Err(ContextError::DuplicateSetElement { position });
                }
            }
        }

        self.state = CollectionState::Initialized;

        Ok(())
    }

    /// Append an element to the live contents.
    pub fn push(&mut self, element: Value) {
        self.elements.push(element);
    }

    /// Compare live contents against the initialization snapshot.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        match &self.snapshot {
            Some(snapshot) => snapshot.elements() != self.elements.as_slice(),
            None => false,
        }
    }
}

///
/// CollectionEntry
///
/// Per-context bookkeeping attached to one tracked collection: the role
/// and owner it was loaded for, the snapshot adopted at load time and how
/// many times post-initialization ran.
///

#[derive(Debug, Default)]
pub struct CollectionEntry {
    role: Option<CollectionRole>,
    owner_key: Option<Value>,
    snapshot: Option<CollectionSnapshot>,
    post_initialize_count: usize,
}

impl CollectionEntry {
    /// Adopt the collection's snapshot and record one post-initialization.
    pub fn post_initialize(&mut self, collection: &PersistentCollection) {
        if let Some(snapshot) = collection.snapshot() {
            self.role = Some(snapshot.role().clone());
            self.owner_key = Some(snapshot.owner_key().clone());
            self.snapshot = Some(snapshot.clone());
        }

        self.post_initialize_count += 1;
    }

    #[must_use]
    pub const fn is_post_initialized(&self) -> bool {
        self.post_initialize_count > 0
    }

    #[must_use]
    pub const fn post_initialize_count(&self) -> usize {
        self.post_initialize_count
    }

    #[must_use]
    pub const fn role(&self) -> Option<&CollectionRole> {
        self.role.as_ref()
    }

    #[must_use]
    pub const fn owner_key(&self) -> Option<&Value> {
        self.owner_key.as_ref()
    }

    #[must_use]
    pub const fn snapshot(&self) -> Option<&CollectionSnapshot> {
        self.snapshot.as_ref()
    }

    /// Dirty check against the entry's adopted snapshot.
    #[must_use]
    pub fn is_dirty(&self, collection: &PersistentCollection) -> bool {
        match &self.snapshot {
            Some(snapshot) => snapshot.elements() != collection.elements(),
            None => false,
        }
    }
}
