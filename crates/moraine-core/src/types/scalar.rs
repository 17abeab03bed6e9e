use crate::types::{TypeError, ValueType};
use crate::value::Value;
use std::sync::Arc;

///
/// ScalarKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScalarKind {
    Bool,
    Int,
    Uint,
    Float64,
    Text,
    Bytes,
    Ulid,
}

impl ScalarKind {
    pub(crate) const fn label(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Uint => "uint",
            Self::Float64 => "float64",
            Self::Text => "text",
            Self::Bytes => "bytes",
            Self::Ulid => "ulid",
        }
    }

    const fn admits(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Self::Bool, Value::Bool(_))
                | (Self::Int, Value::Int(_))
                | (Self::Uint, Value::Uint(_))
                | (Self::Float64, Value::Float64(_))
                | (Self::Text, Value::Text(_))
                | (Self::Bytes, Value::Bytes(_))
                | (Self::Ulid, Value::Ulid(_))
        )
    }
}

///
/// ScalarType
///
/// Descriptor for one scalar slot. `coerce` accepts exactly the matching
/// `Value` variant; `Null` handling belongs to the enclosing composite's
/// nullability rules, not to the scalar itself.
///

#[derive(Debug)]
pub struct ScalarType {
    kind: ScalarKind,
}

impl ScalarType {
    #[must_use]
    pub const fn new(kind: ScalarKind) -> Self {
        Self { kind }
    }

    #[must_use]
    pub fn shared(kind: ScalarKind) -> Arc<dyn ValueType> {
        Arc::new(Self::new(kind))
    }

    #[must_use]
    pub const fn kind(&self) -> ScalarKind {
        self.kind
    }
}

impl ValueType for ScalarType {
    fn name(&self) -> &str {
        self.kind.label()
    }

    fn coerce(&self, value: &Value) -> Result<Value, TypeError> {
        if self.kind.admits(value) {
            Ok(value.clone())
        } else {
            Err(TypeError::Incompatible {
                expected: self.kind.label().to_string(),
                found: value.kind_name(),
            })
        }
    }
}
