//! Shared declaration and data-shape types for the restdoc ecosystem.
//!
//! This crate provides the plain value types that describe an HTTP API:
//! endpoint declarations, type descriptors, normalized data shapes and
//! security schemes. It performs no I/O and carries no error type beyond
//! type-expression parsing.
//!
//! Both `restdoc` (registry, synthesis, assembly) and `restdoc-server`
//! (document serving) build on these types. Most users reach them through
//! the re-exports in `restdoc`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod declaration;
pub mod security;
pub mod shape;
pub mod types;

pub use declaration::{
    EndpointBuilder, EndpointDeclaration, HttpMethod, ParameterDeclaration, ParameterLocation,
    RequestBodyDeclaration, ResponseDeclaration, SecurityRequirement, Visibility,
};
pub use security::{ApiKeyLocation, OAuthFlow, OAuthFlows, SecurityScheme, SecuritySchemeKind};
pub use shape::{DataShape, ParseTypeError, PrimitiveKind, ShapeField, TypeDescriptor};
pub use types::{EnumDef, FieldDef, StructDef, TypeDef};
