use crate::context::PersistenceContext;
use crate::types::{MappedType, TypeError, ValueType};
use crate::value::Value;
use std::sync::Arc;

///
/// CompositeAttribute
///
/// One named, typed slot of a composite descriptor. Attributes are
/// non-nullable unless marked otherwise.
///

#[derive(Debug)]
pub struct CompositeAttribute {
    name: String,
    ty: MappedType,
    nullable: bool,
}

impl CompositeAttribute {
    #[must_use]
    pub fn new(name: impl Into<String>, ty: MappedType) -> Self {
        Self {
            name: name.into(),
            ty,
            nullable: false,
        }
    }

    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn ty(&self) -> &MappedType {
        &self.ty
    }

    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        self.nullable
    }
}

///
/// CompositeType
///
/// Tuple-shaped descriptor: attribute i of a `Value::Composite` is checked
/// against attribute i declared here. Fetch-graph construction compares
/// descriptors by `Arc` pointer identity, never structurally, so the same
/// logical composite must be a single shared descriptor.
///

#[derive(Debug)]
pub struct CompositeType {
    name: String,
    attributes: Vec<CompositeAttribute>,
}

impl CompositeType {
    #[must_use]
    pub fn new(name: impl Into<String>, attributes: Vec<CompositeAttribute>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            attributes,
        })
    }

    #[must_use]
    pub fn attributes(&self) -> &[CompositeAttribute] {
        &self.attributes
    }

    fn map_attributes<F>(&self, value: &Value, mut f: F) -> Result<Value, TypeError>
    where
        F: FnMut(&CompositeAttribute, &Value) -> Result<Value, TypeError>,
    {
        let Value::Composite(values) = value else {
            return Err(TypeError::Incompatible {
                expected: self.name.clone(),
                found: value.kind_name(),
            });
        };

        if values.len() != self.attributes.len() {
            return Err(TypeError::ArityMismatch {
                name: self.name.clone(),
                expected: self.attributes.len(),
                found: values.len(),
            });
        }

        let mut mapped = Vec::with_capacity(values.len());
        for (attribute, attribute_value) in self.attributes.iter().zip(values) {
            if attribute_value.is_null() {
                if !attribute.is_nullable() {
                    return Err(TypeError::NullAttribute {
                        name: self.name.clone(),
                        attribute: attribute.name().to_string(),
                    });
                }

                mapped.push(Value::Null);
                continue;
            }

            mapped.push(f(attribute, attribute_value)?);
        }

        Ok(Value::Composite(mapped))
    }
}

impl ValueType for CompositeType {
    fn name(&self) -> &str {
        &self.name
    }

    fn coerce(&self, value: &Value) -> Result<Value, TypeError> {
        self.map_attributes(value, |attribute, v| attribute.ty().value_type().coerce(v))
    }

    fn disassemble(
        &self,
        value: &Value,
        context: &PersistenceContext,
        owner: Option<&Value>,
    ) -> Result<Value, TypeError> {
        self.map_attributes(value, |attribute, v| {
            attribute.ty().value_type().disassemble(v, context, owner)
        })
    }

    fn assemble(
        &self,
        snapshot: &Value,
        context: &PersistenceContext,
        owner: Option<&Value>,
    ) -> Result<Value, TypeError> {
        self.map_attributes(snapshot, |attribute, v| {
            attribute.ty().value_type().assemble(v, context, owner)
        })
    }
}
