#![allow(clippy::doc_markdown)] // README uses "OpenAPI" and "Swagger UI" proper nouns throughout
#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! ## API Reference

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod runtime;

pub use runtime::{
    authorize, negotiate_format, oauth2_redirect_page, router, viewer_page, Denial,
    DocumentRequest, DocumentService, DocumentState, Resource, ServeError, FORWARDED_PROTO,
};
