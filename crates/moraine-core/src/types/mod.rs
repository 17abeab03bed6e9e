//! Module: types
//! Responsibility: mapping-level type descriptors and value coercion.
//! Does not own: runtime value storage, fetch-graph shape, query execution.
//! Boundary: `disassemble`/`assemble` is the only conversion between loaded
//! rows and snapshot entries.

mod composite;
mod scalar;


use crate::context::PersistenceContext;
use crate::value::Value;
use std::fmt::Debug;
use std::sync::Arc;
use thiserror::Error as ThisError;

pub use self::composite::{CompositeAttribute, CompositeType};
pub use self::scalar::{ScalarKind, ScalarType};

///
/// TypeError
///

#[derive(Debug, ThisError)]
pub enum TypeError {
    #[error("{found} value is not compatible with type {expected}")]
    Incompatible { expected: String, found: &'static str },

    #[error("composite {name} expects {expected} attribute values, found {found}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("attribute {attribute} of composite {name} is not nullable")]
    NullAttribute { name: String, attribute: String },
}

///
/// ValueType
///
/// A mapping-level type descriptor. `coerce` validates a runtime value
/// against the descriptor; `disassemble` reduces a loaded value to its
/// snapshot form and `assemble` rebuilds it. The defaults make both a
/// plain coercion, which is correct for every value-typed descriptor.
///

pub trait ValueType: Debug + Send + Sync {
    /// Mapping-level name, used in diagnostics.
    fn name(&self) -> &str;

    /// Validate and normalize a runtime value against this descriptor.
    fn coerce(&self, value: &Value) -> Result<Value, TypeError>;

    /// Reduce a loaded value to its storage-independent snapshot form.
    ///
    /// `owner` is the entity owning the surrounding collection, when known.
    fn disassemble(
        &self,
        value: &Value,
        context: &PersistenceContext,
        owner: Option<&Value>,
    ) -> Result<Value, TypeError> {
        let _ = (context, owner);
        self.coerce(value)
    }

    /// Rebuild a runtime value from its snapshot form.
    fn assemble(
        &self,
        snapshot: &Value,
        context: &PersistenceContext,
        owner: Option<&Value>,
    ) -> Result<Value, TypeError> {
        let _ = (context, owner);
        self.coerce(snapshot)
    }
}

///
/// MappedType
///
/// Scalar or composite descriptor attached to a mapping slot. Composite
/// descriptors keep their `Arc` so graph construction can compare them by
/// pointer identity rather than by structure.
///

#[derive(Clone, Debug)]
pub enum MappedType {
    Scalar(Arc<dyn ValueType>),
    Composite(Arc<CompositeType>),
}

impl MappedType {
    #[must_use]
    pub fn scalar(kind: ScalarKind) -> Self {
        Self::Scalar(ScalarType::shared(kind))
    }

    #[must_use]
    pub const fn composite(descriptor: Arc<CompositeType>) -> Self {
        Self::Composite(descriptor)
    }

    /// View as the common descriptor trait.
    #[must_use]
    pub fn value_type(&self) -> &dyn ValueType {
        match self {
            Self::Scalar(ty) => ty.as_ref(),
            Self::Composite(ty) => ty.as_ref(),
        }
    }

    #[must_use]
    pub const fn as_composite(&self) -> Option<&Arc<CompositeType>> {
        match self {
            Self::Composite(ty) => Some(ty),
            Self::Scalar(_) => None,
        }
    }

    #[must_use]
    pub const fn is_composite(&self) -> bool {
        matches!(self, Self::Composite(_))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.value_type().name()
    }
}
