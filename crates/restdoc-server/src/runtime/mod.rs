//! Runtime types for serving assembled documents.
//!
//! - [`DocumentService`]: settings, frozen endpoints and the snapshot cache
//! - [`DocumentRequest`]: the parts of an HTTP request that access checks
//!   and server lists depend on
//! - [`authorize`]: access precedence for documents and the viewer
//! - [`ServeError`]: converts refusals and build failures to HTTP responses
//! - [`router`]: axum routes for documents and the viewer

mod access;
mod error;
mod request;
mod router;
mod service;
mod viewer;

pub use access::{authorize, Resource};
pub use error::{Denial, ServeError};
pub use request::{DocumentRequest, FORWARDED_PROTO};
pub use router::{negotiate_format, router};
pub use service::{DocumentService, DocumentState};
pub use viewer::{oauth2_redirect_page, viewer_page};
