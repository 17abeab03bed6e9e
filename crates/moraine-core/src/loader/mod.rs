//! Module: loader
//! Responsibility: collection initialization through named retrievals.
//! Does not own: query execution, context bookkeeping internals.
//! Boundary: loaders mutate collections only through the session's context.

#[cfg(test)]
mod tests;

use crate::context::{CollectionKey, ContextError};
use crate::error::Error;
use crate::model::{CollectionModel, CollectionRole};
use crate::query::{FlushMode, RetrievalEngine, RetrievalRequest, bind_owner_key};
use crate::session::Session;
use crate::value::Value;
use std::sync::Arc;
use thiserror::Error as ThisError;

///
/// LoaderError
///

#[derive(Debug, ThisError)]
pub enum LoaderError {
    #[error("collection {role} declares no loader query")]
    MissingLoader { role: CollectionRole },

    #[error("no tracked collection {role} for owner {owner:?}")]
    NoTrackedCollection { role: CollectionRole, owner: Value },
}

///
/// CollectionInitializer
///
/// Fills one owner's collection inside a session.
///

pub trait CollectionInitializer<E: RetrievalEngine> {
    fn initialize(&self, owner_key: &Value, session: &mut Session<E>) -> Result<(), Error>;
}

///
/// NamedQueryCollectionInitializer
///
/// Loads a collection by running the named retrieval its mapping declares.
/// The owner key binds to the query's first named parameter, or to
/// position 0 when none are declared; the retrieval runs with flushing
/// forbidden and the collection key attached. Results are disassembled in
/// retrieval order into the snapshot the context keeps for dirty checking.
///

#[derive(Debug)]
pub struct NamedQueryCollectionInitializer {
    query_name: String,
    model: Arc<CollectionModel>,
}

impl NamedQueryCollectionInitializer {
    #[must_use]
    pub fn new(query_name: impl Into<String>, model: Arc<CollectionModel>) -> Self {
        Self {
            query_name: query_name.into(),
            model,
        }
    }

    /// Initializer for the loader query the mapping itself declares.
    pub fn from_model(model: Arc<CollectionModel>) -> Result<Self, LoaderError> {
        match model.loader() {
            Some(name) => {
                let name = name.to_string();

                Ok(Self::new(name, model))
            }
            None => Err(LoaderError::MissingLoader {
                role: model.role().clone(),
            }),
        }
    }

    #[must_use]
    pub fn query_name(&self) -> &str {
        &self.query_name
    }

    #[must_use]
    pub const fn model(&self) -> &Arc<CollectionModel> {
        &self.model
    }
}

impl<E: RetrievalEngine> CollectionInitializer<E> for NamedQueryCollectionInitializer {
    fn initialize(&self, owner_key: &Value, session: &mut Session<E>) -> Result<(), Error> {
        let role = self.model.role().clone();

        session.debug_log(|| {
            format!("initializing collection {role} using named query {}", self.query_name)
        });

        let query = session.named_query(&self.query_name)?.clone();
        let binding = bind_owner_key(&query, self.model.key_type(), owner_key)?;
        let key = CollectionKey::for_collection(
            &self.model,
            binding.value().clone(),
            session.identity_mode(),
        );

        let request = RetrievalRequest::new(query, binding)
            .with_collection_key(key.clone())
            .with_flush_mode(FlushMode::Manual);
        let rows = session.execute_retrieval(&request)?;

        let Some(collection) = session.context().collection(&key) else {
            return Err(LoaderError::NoTrackedCollection {
                role,
                owner: key.owner_key().clone(),
            }
            .into());
        };

        let owner = collection.borrow().owner().cloned();
        let element_type = self.model.element_type().value_type();

        // disassemble every row before the collection is touched
        let mut disassembled = Vec::with_capacity(rows.len());
        for row in &rows {
            disassembled.push(element_type.disassemble(row, session.context(), owner.as_ref())?);
        }

        {
            let mut state = collection.borrow_mut();
            state.init_from_disassembled(
                &self.model,
                &disassembled,
                owner.as_ref(),
                session.context(),
            )?;
            state.set_snapshot(key.owner_key().clone(), role, disassembled);
            state.after_initialize()?;
        }

        session
            .context_mut()
            .collection_entry_mut(&collection)
            .ok_or(ContextError::MissingEntry)?
            .post_initialize(&collection.borrow());

        Ok(())
    }
}
