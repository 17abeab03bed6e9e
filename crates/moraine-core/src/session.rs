//! Module: session
//! Responsibility: one unit of work over an engine, registry and context.
//! Does not own: mapping metadata, storage access details.
//! Boundary: single-threaded; closing the session releases all tracked
//! state.

use crate::context::{CollectionKey, PersistenceContext, PersistentCollection, SharedCollection};
use crate::error::Error;
use crate::model::{CollectionModel, IdentityMode};
use crate::query::{NamedQuery, NamedQueryRegistry, RetrievalEngine, RetrievalRequest};
use crate::value::Value;

///
/// Session
///
/// One unit of work. Owns the persistence context, the named query
/// registry and the retrieval engine; loaders operate through it.
///

pub struct Session<E> {
    engine: E,
    queries: NamedQueryRegistry,
    context: PersistenceContext,
    identity_mode: IdentityMode,
    debug: bool,
}

impl<E: RetrievalEngine> Session<E> {
    #[must_use]
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            queries: NamedQueryRegistry::new(),
            context: PersistenceContext::new(),
            identity_mode: IdentityMode::default(),
            debug: false,
        }
    }

    /// Echo load activity to stdout.
    #[must_use]
    pub fn debug(mut self) -> Self {
        self.debug = true;
        self
    }

    #[must_use]
    pub fn with_identity_mode(mut self, mode: IdentityMode) -> Self {
        self.identity_mode = mode;
        self
    }

    #[must_use]
    pub const fn is_debug(&self) -> bool {
        self.debug
    }

    #[must_use]
    pub const fn identity_mode(&self) -> IdentityMode {
        self.identity_mode
    }

    #[must_use]
    pub const fn engine(&self) -> &E {
        &self.engine
    }

    #[must_use]
    pub const fn context(&self) -> &PersistenceContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut PersistenceContext {
        &mut self.context
    }

    /// Register a named retrieval for later lookup by loaders.
    pub fn register_query(&mut self, query: NamedQuery) -> Result<(), Error> {
        self.queries.register(query)?;

        Ok(())
    }

    pub fn named_query(&self, name: &str) -> Result<&NamedQuery, Error> {
        Ok(self.queries.try_get(name)?)
    }

    /// Begin tracking an owner's collection in this session's context.
    ///
    /// The key is built under the session's identity mode; lookups ignore
    /// the mode either way.
    pub fn track_collection(
        &mut self,
        model: &CollectionModel,
        owner_key: Value,
        collection: PersistentCollection,
    ) -> Result<SharedCollection, Error> {
        let key = CollectionKey::for_collection(model, owner_key, self.identity_mode);
        let shared = self.context.add_uninitialized_collection(key, collection)?;

        Ok(shared)
    }

    /// Run a retrieval through the engine.
    pub fn execute_retrieval(&self, request: &RetrievalRequest) -> Result<Vec<Value>, Error> {
        self.debug_log(|| {
            format!(
                "executing retrieval {} with flush mode {}",
                request.query().name(),
                request.flush_mode()
            )
        });

        Ok(self.engine.execute(request)?)
    }

    /// End the unit of work, dropping all tracked state.
    pub fn close(mut self) {
        self.context.clear();
    }

    pub(crate) fn debug_log<F>(&self, message: F)
    where
        F: FnOnce() -> String,
    {
        if self.debug {
            println!("[debug] {}", message());
        }
    }
}
