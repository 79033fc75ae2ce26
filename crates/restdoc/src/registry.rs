//! Endpoint registry: the startup-time collection of declarations.
//!
//! The registry is mutable only while it is an [`EndpointRegistry`]. Calling
//! [`EndpointRegistry::freeze`] turns it into [`Endpoints`], a cheaply
//! clonable read-only handle that the assembler and server share without
//! locking.

use std::collections::HashSet;
use std::sync::Arc;

use restdoc_core::EndpointDeclaration;

use crate::error::{Error, Result};

/// Mutable registry used during startup.
#[derive(Debug, Default)]
pub struct EndpointRegistry {
    endpoints: Vec<EndpointDeclaration>,
    ids: HashSet<String>,
}

impl EndpointRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a declaration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateOperationId`] if another declaration already
    /// uses the same operation id. The registry is left unchanged.
    pub fn register(&mut self, decl: EndpointDeclaration) -> Result<()> {
        if !self.ids.insert(decl.operation_id().to_string()) {
            return Err(Error::DuplicateOperationId {
                operation_id: decl.operation_id().to_string(),
            });
        }
        tracing::debug!(
            operation_id = decl.operation_id(),
            method = decl.method().as_str(),
            route = decl.route(),
            "registered endpoint"
        );
        self.endpoints.push(decl);
        Ok(())
    }

    /// Add several declarations, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first [`Error::DuplicateOperationId`] encountered.
    pub fn register_all<I>(&mut self, decls: I) -> Result<()>
    where
        I: IntoIterator<Item = EndpointDeclaration>,
    {
        decls.into_iter().try_for_each(|decl| self.register(decl))
    }

    /// Declarations in registration order.
    #[must_use]
    pub fn list(&self) -> &[EndpointDeclaration] {
        &self.endpoints
    }

    /// Number of registered endpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Whether nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// End the registration phase.
    #[must_use]
    pub fn freeze(self) -> Endpoints {
        tracing::info!(count = self.endpoints.len(), "endpoint registry frozen");
        Endpoints(self.endpoints.into())
    }
}

/// Read-only, shareable view of a frozen registry.
#[derive(Debug, Clone, Default)]
pub struct Endpoints(Arc<[EndpointDeclaration]>);

impl Endpoints {
    /// Declarations in registration order.
    #[must_use]
    pub fn list(&self) -> &[EndpointDeclaration] {
        &self.0
    }

    /// Look up a declaration by operation id.
    #[must_use]
    pub fn get(&self, operation_id: &str) -> Option<&EndpointDeclaration> {
        self.0.iter().find(|d| d.operation_id() == operation_id)
    }

    /// Number of endpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no endpoints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
