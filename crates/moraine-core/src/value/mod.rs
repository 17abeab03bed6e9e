//! Module: value
//! Responsibility: structural runtime values for keys, elements and snapshots.
//! Does not own: type descriptors, coercion policy, mapping metadata.
//! Boundary: the only value representation crossing the loader/context seam.

mod float64;
mod ulid;


use serde::{Deserialize, Serialize};

pub use self::float64::Float64;
pub use self::ulid::Ulid;

///
/// Value
///
/// Owned structural value used for owner keys, collection elements and
/// disassembled snapshot entries. Equality and hashing are structural;
/// this is the equality collection-key lookups and snapshot comparison
/// run on.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float64(Float64),
    Text(String),
    Bytes(Vec<u8>),
    Ulid(Ulid),

    /// Positional attribute values of one composite value.
    /// Attribute names live on the type descriptor, not here.
    Composite(Vec<Self>),
}

impl Value {
    /// Kind label used in error messages.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Uint(_) => "uint",
            Self::Float64(_) => "float64",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Ulid(_) => "ulid",
            Self::Composite(_) => "composite",
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub const fn is_composite(&self) -> bool {
        matches!(self, Self::Composite(_))
    }

    /// Build a `Value::Composite` from convertible items.
    #[must_use]
    pub fn composite_of<T>(items: &[T]) -> Self
    where
        T: Into<Self> + Clone,
    {
        Self::Composite(items.iter().cloned().map(Into::into).collect())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::Uint(v)
    }
}

impl From<Float64> for Value {
    fn from(v: Float64) -> Self {
        Self::Float64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<Ulid> for Value {
    fn from(v: Ulid) -> Self {
        Self::Ulid(v)
    }
}
