#![allow(clippy::doc_markdown)] // README uses "OpenAPI" proper noun throughout
#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! ## API Reference

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod assemble;
mod error;
pub mod manifest;
pub mod registry;
pub mod schema;
pub mod settings;

pub use assemble::{assemble, validate, AssembledDocument, DocumentFormat, Origin};
pub use error::{Error, Result};
pub use manifest::Manifest;
pub use registry::{EndpointRegistry, Endpoints};
pub use schema::{ComponentTable, Synthesizer, TypeCatalog};
pub use settings::{AuthLevel, AuthLevelSettings, DocumentSettings, SpecVersion};

pub use restdoc_core::{
    ApiKeyLocation, EndpointDeclaration, EnumDef, FieldDef, HttpMethod, OAuthFlow, OAuthFlows,
    ParameterDeclaration, ParameterLocation, RequestBodyDeclaration, ResponseDeclaration,
    SecurityRequirement, SecurityScheme, SecuritySchemeKind, StructDef, TypeDef, TypeDescriptor,
    Visibility,
};
