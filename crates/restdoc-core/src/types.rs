//! Declared (named) payload types: structures and enumerations.
//!
//! These are the inputs the schema synthesizer resolves `TypeDescriptor::Named`
//! references against. In a manifest they look like:
//!
//! ```yaml
//! - name: Pet
//!   fields:
//!     - { name: id, type: int64 }
//!     - { name: name, type: string, required: true }
//!     - { name: status, type: PetStatus }
//! - name: PetStatus
//!   enum: [available, pending, sold]
//! ```

use serde::{Deserialize, Serialize};

use crate::shape::TypeDescriptor;

/// A named type declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeDef {
    /// Structure with ordered fields.
    Struct(StructDef),
    /// Enumeration of string values.
    Enum(EnumDef),
}

impl TypeDef {
    /// Declared type name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Struct(def) => &def.name,
            Self::Enum(def) => &def.name,
        }
    }

    /// Optional human description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Struct(def) => def.description.as_deref(),
            Self::Enum(def) => def.description.as_deref(),
        }
    }
}

impl From<StructDef> for TypeDef {
    fn from(def: StructDef) -> Self {
        Self::Struct(def)
    }
}

impl From<EnumDef> for TypeDef {
    fn from(def: EnumDef) -> Self {
        Self::Enum(def)
    }
}

/// Structure declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StructDef {
    /// Type name; becomes the component name.
    pub name: String,
    /// Optional human description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Fields in declaration order.
    pub fields: Vec<FieldDef>,
}

impl StructDef {
    /// Start a structure with no fields.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: Vec::new(),
        }
    }

    /// Set the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append an optional field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, ty: impl Into<TypeDescriptor>) -> Self {
        self.fields.push(FieldDef::new(name, ty));
        self
    }

    /// Append a required field.
    #[must_use]
    pub fn required_field(
        mut self,
        name: impl Into<String>,
        ty: impl Into<TypeDescriptor>,
    ) -> Self {
        let mut field = FieldDef::new(name, ty);
        field.required = true;
        self.fields.push(field);
        self
    }
}

/// One field of a [`StructDef`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDef {
    /// Field name as serialized.
    pub name: String,
    /// Field type.
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
    /// Whether the field must be present.
    #[serde(default)]
    pub required: bool,
    /// Optional human description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldDef {
    /// Optional field without description.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: impl Into<TypeDescriptor>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            required: false,
            description: None,
        }
    }
}

/// Enumeration declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnumDef {
    /// Type name; becomes the component name.
    pub name: String,
    /// Optional human description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Allowed values in declaration order.
    #[serde(rename = "enum")]
    pub values: Vec<String>,
}

impl EnumDef {
    /// Enumeration with the given values.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            description: None,
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}
