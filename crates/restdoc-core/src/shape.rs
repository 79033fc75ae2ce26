//! Type descriptors (what a declaration says) and data shapes (what the
//! synthesizer produces).
//!
//! A [`TypeDescriptor`] is the unresolved, textual form used in declarations
//! and manifests: `int64`, `Pet`, `list<Pet>`, `Tag[]`. Resolution against the
//! primitive table and the type catalog turns it into a [`DataShape`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Primitive kinds with a fixed `(type, format)` mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// 16-bit signed integer.
    Int16,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// Single-precision float.
    Float,
    /// Double-precision float.
    Double,
    /// Decimal number (documented as a double).
    Decimal,
    /// UTF-8 string.
    String,
    /// Boolean.
    Boolean,
    /// Base64-encoded bytes.
    Byte,
    /// Raw binary payload (file upload).
    Binary,
    /// Calendar date (`2024-01-31`).
    Date,
    /// RFC 3339 timestamp.
    DateTime,
    /// UUID string.
    Uuid,
}

impl PrimitiveKind {
    /// Every primitive kind, in table order.
    pub const ALL: [Self; 13] = [
        Self::Int16,
        Self::Int32,
        Self::Int64,
        Self::Float,
        Self::Double,
        Self::Decimal,
        Self::String,
        Self::Boolean,
        Self::Byte,
        Self::Binary,
        Self::Date,
        Self::DateTime,
        Self::Uuid,
    ];

    /// Look up a primitive by descriptor name. Aliases are accepted
    /// (`long` for `int64`, `bool` for `boolean`, ...).
    ///
    /// Returns `None` for names outside the table; callers decide whether
    /// that means "declared type" or "unsupported".
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "int16" | "short" => Self::Int16,
            "int32" | "int" | "integer" => Self::Int32,
            "int64" | "long" => Self::Int64,
            "float" => Self::Float,
            "double" | "number" => Self::Double,
            "decimal" => Self::Decimal,
            "string" => Self::String,
            "boolean" | "bool" => Self::Boolean,
            "byte" => Self::Byte,
            "binary" | "file" => Self::Binary,
            "date" => Self::Date,
            "date-time" | "datetime" => Self::DateTime,
            "uuid" => Self::Uuid,
            _ => return None,
        };
        Some(kind)
    }

    /// Canonical descriptor name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Float => "float",
            Self::Double => "double",
            Self::Decimal => "decimal",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Byte => "byte",
            Self::Binary => "binary",
            Self::Date => "date",
            Self::DateTime => "date-time",
            Self::Uuid => "uuid",
        }
    }

    /// Schema `type` and optional `format` for this primitive.
    #[must_use]
    pub const fn schema_type(self) -> (&'static str, Option<&'static str>) {
        match self {
            Self::Int16 | Self::Int32 => ("integer", Some("int32")),
            Self::Int64 => ("integer", Some("int64")),
            Self::Float => ("number", Some("float")),
            Self::Double | Self::Decimal => ("number", Some("double")),
            Self::String => ("string", None),
            Self::Boolean => ("boolean", None),
            Self::Byte => ("string", Some("byte")),
            Self::Binary => ("string", Some("binary")),
            Self::Date => ("string", Some("date")),
            Self::DateTime => ("string", Some("date-time")),
            Self::Uuid => ("string", Some("uuid")),
        }
    }
}

/// Unresolved type reference as written in a declaration.
///
/// Serialized as a type expression string:
///
/// | Expression          | Descriptor                 |
/// |---------------------|----------------------------|
/// | `int64`, `Pet`      | `Named`                    |
/// | `list<Pet>`         | `List(Named("Pet"))`       |
/// | `array<string>`     | `List(Named("string"))`    |
/// | `Tag[]`             | `List(Named("Tag"))`       |
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeDescriptor {
    /// A primitive name or the name of a declared type.
    Named(String),
    /// A homogeneous sequence.
    List(Box<TypeDescriptor>),
}

impl TypeDescriptor {
    /// Reference a primitive or declared type by name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Sequence of `element`.
    #[must_use]
    pub fn list(element: impl Into<TypeDescriptor>) -> Self {
        Self::List(Box::new(element.into()))
    }
}

impl From<PrimitiveKind> for TypeDescriptor {
    fn from(kind: PrimitiveKind) -> Self {
        Self::Named(kind.name().to_string())
    }
}

/// Parses type expressions; a malformed expression is kept verbatim as a
/// name and rejected later, at synthesis.
impl From<&str> for TypeDescriptor {
    fn from(expression: &str) -> Self {
        expression
            .parse()
            .unwrap_or_else(|_| Self::Named(expression.to_string()))
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::List(inner) => write!(f, "list<{inner}>"),
        }
    }
}

/// Failure to parse a type expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTypeError {
    expression: String,
}

impl fmt::Display for ParseTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid type expression '{}'", self.expression)
    }
}

impl std::error::Error for ParseTypeError {}

impl FromStr for TypeDescriptor {
    type Err = ParseTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || ParseTypeError {
            expression: s.to_string(),
        };

        if trimmed.is_empty()
            || (trimmed.chars().any(char::is_whitespace) && !trimmed.contains('<'))
        {
            return Err(invalid());
        }

        if let Some(element) = trimmed.strip_suffix("[]") {
            return element.parse::<Self>().map(Self::list).map_err(|_| invalid());
        }

        for prefix in ["list<", "array<"] {
            if let Some(rest) = trimmed.strip_prefix(prefix) {
                let inner = rest.strip_suffix('>').ok_or_else(invalid)?;
                return inner.parse::<Self>().map(Self::list).map_err(|_| invalid());
            }
        }

        // Anything else is a name; unknown names are rejected at synthesis
        // time, not here.
        Ok(Self::Named(trimmed.to_string()))
    }
}

impl TryFrom<String> for TypeDescriptor {
    type Error = ParseTypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TypeDescriptor> for String {
    fn from(value: TypeDescriptor) -> Self {
        value.to_string()
    }
}

/// Normalized, language-neutral payload structure.
///
/// Named structures never appear inline inside other shapes: they are stored
/// once in the component table and referenced through [`DataShape::ObjectRef`],
/// which is what keeps self-referential types finite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataShape {
    /// Scalar value.
    Primitive(PrimitiveKind),
    /// Sequence of elements.
    Array(Box<DataShape>),
    /// Structure with ordered fields.
    Object(Vec<ShapeField>),
    /// Named enumeration with its allowed values in declaration order.
    EnumRef {
        /// Enumeration name.
        name: String,
        /// Allowed values.
        values: Vec<String>,
    },
    /// Reference to a named structure in the component table.
    ObjectRef(String),
}

/// One field of an [`DataShape::Object`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeField {
    /// Field name as serialized.
    pub name: String,
    /// Field shape.
    pub shape: DataShape,
    /// Whether the field must be present.
    pub required: bool,
    /// Optional human description.
    pub description: Option<String>,
}

impl DataShape {
    /// Name of the component this shape points at, if it is a reference.
    #[must_use]
    pub fn reference(&self) -> Option<&str> {
        match self {
            Self::EnumRef { name, .. } | Self::ObjectRef(name) => Some(name),
            _ => None,
        }
    }

    /// Call `f` with every component name referenced anywhere in this shape.
    pub fn for_each_reference(&self, f: &mut impl FnMut(&str)) {
        match self {
            Self::Primitive(_) => {}
            Self::Array(element) => element.for_each_reference(f),
            Self::Object(fields) => {
                for field in fields {
                    field.shape.for_each_reference(f);
                }
            }
            Self::EnumRef { name, .. } | Self::ObjectRef(name) => f(name),
        }
    }
}
