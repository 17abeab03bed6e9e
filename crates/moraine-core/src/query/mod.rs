//! Module: query
//! Responsibility: named retrievals, parameter binding, the execution seam.
//! Does not own: collection state, snapshot handling, mapping metadata.
//! Boundary: `RetrievalEngine` is the only path to the storage backend.


use crate::context::CollectionKey;
use crate::types::{TypeError, ValueType};
use crate::value::Value;
use derive_more::Display;
use std::collections::HashMap;
use thiserror::Error as ThisError;

///
/// QueryError
///

#[derive(Debug, ThisError)]
pub enum QueryError {
    #[error("named query {name} is already registered")]
    DuplicateNamedQuery { name: String },

    #[error("no named query registered as {name}")]
    UnknownNamedQuery { name: String },
}

///
/// RetrievalError
///

#[derive(Debug, ThisError)]
pub enum RetrievalError {
    #[error("retrieval {query} failed: {message}")]
    Execution { query: String, message: String },

    #[error("retrieval engine unavailable: {message}")]
    Unavailable { message: String },
}

///
/// NamedQuery
///
/// A registered retrieval: backend-specific body plus the named parameters
/// it declares, in declaration order.
///

#[derive(Clone, Debug)]
pub struct NamedQuery {
    name: String,
    body: String,
    named_parameters: Vec<String>,
}

impl NamedQuery {
    #[must_use]
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
            named_parameters: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_named_parameter(mut self, name: impl Into<String>) -> Self {
        self.named_parameters.push(name.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    #[must_use]
    pub fn named_parameters(&self) -> &[String] {
        &self.named_parameters
    }

    /// First declared named parameter, if any.
    #[must_use]
    pub fn first_named_parameter(&self) -> Option<&str> {
        self.named_parameters.first().map(String::as_str)
    }
}

///
/// ParameterBinding
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParameterBinding {
    Named { name: String, value: Value },
    Positional { position: usize, value: Value },
}

impl ParameterBinding {
    #[must_use]
    pub const fn value(&self) -> &Value {
        match self {
            Self::Named { value, .. } | Self::Positional { value, .. } => value,
        }
    }
}

/// Bind an owner key to a retrieval.
///
/// The key binds to the first named parameter the query declares, falling
/// back to position 0 for queries with positional parameters only. The key
/// is coerced through the collection's key descriptor before binding.
pub fn bind_owner_key(
    query: &NamedQuery,
    key_type: &dyn ValueType,
    key: &Value,
) -> Result<ParameterBinding, TypeError> {
    let value = key_type.coerce(key)?;

    Ok(match query.first_named_parameter() {
        Some(name) => ParameterBinding::Named {
            name: name.to_string(),
            value,
        },
        None => ParameterBinding::Positional { position: 0, value },
    })
}

///
/// FlushMode
///
/// `Manual` forbids flushing for the duration of one retrieval; collection
/// loading always runs manual.
///

#[derive(Clone, Copy, Debug, Default, Display, Eq, PartialEq)]
pub enum FlushMode {
    #[default]
    Auto,
    Manual,
}

///
/// RetrievalRequest
///
/// One execution of a named query: the binding, the flush behavior and,
/// for collection loads, the collection key the results associate with.
///

#[derive(Clone, Debug)]
pub struct RetrievalRequest {
    query: NamedQuery,
    binding: ParameterBinding,
    collection_key: Option<CollectionKey>,
    flush_mode: FlushMode,
}

impl RetrievalRequest {
    #[must_use]
    pub fn new(query: NamedQuery, binding: ParameterBinding) -> Self {
        Self {
            query,
            binding,
            collection_key: None,
            flush_mode: FlushMode::default(),
        }
    }

    #[must_use]
    pub fn with_collection_key(mut self, key: CollectionKey) -> Self {
        self.collection_key = Some(key);
        self
    }

    #[must_use]
    pub const fn with_flush_mode(mut self, mode: FlushMode) -> Self {
        self.flush_mode = mode;
        self
    }

    #[must_use]
    pub const fn query(&self) -> &NamedQuery {
        &self.query
    }

    #[must_use]
    pub const fn binding(&self) -> &ParameterBinding {
        &self.binding
    }

    #[must_use]
    pub const fn collection_key(&self) -> Option<&CollectionKey> {
        self.collection_key.as_ref()
    }

    #[must_use]
    pub const fn flush_mode(&self) -> FlushMode {
        self.flush_mode
    }
}

///
/// RetrievalEngine
///
/// Storage seam. Implementations execute a bound named query and return
/// matching rows in retrieval order.
///

pub trait RetrievalEngine {
    fn execute(&self, request: &RetrievalRequest) -> Result<Vec<Value>, RetrievalError>;
}

///
/// NamedQueryRegistry
///

#[derive(Debug, Default)]
pub struct NamedQueryRegistry {
    queries: HashMap<String, NamedQuery>,
}

impl NamedQueryRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, query: NamedQuery) -> Result<(), QueryError> {
        if self.queries.contains_key(query.name()) {
            return Err(QueryError::DuplicateNamedQuery {
                name: query.name().to_string(),
            });
        }

        self.queries.insert(query.name().to_string(), query);

        Ok(())
    }

    pub fn try_get(&self, name: &str) -> Result<&NamedQuery, QueryError> {
        self.queries
            .get(name)
            .ok_or_else(|| QueryError::UnknownNamedQuery {
                name: name.to_string(),
            })
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&NamedQuery> {
        self.queries.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}
