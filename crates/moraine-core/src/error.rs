use crate::context::ContextError;
use crate::loader::LoaderError;
use crate::plan::FetchPlanError;
use crate::query::{QueryError, RetrievalError};
use crate::types::TypeError;
use thiserror::Error as ThisError;

///
/// Error
///
/// Top-level error, a transparent wrapper over each subsystem's error.
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    FetchPlan(#[from] FetchPlanError),

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error(transparent)]
    Loader(#[from] LoaderError),
}
