//! Declarative endpoint manifest loaded from YAML.
//!
//! A manifest lets a host describe its API without writing builder code:
//! declared types go into a [`TypeCatalog`], endpoints into an
//! [`EndpointRegistry`].
//!
//! # File format
//!
//! ```yaml
//! types:
//!   - name: Pet
//!     fields:
//!       - { name: id, type: int64 }
//!       - { name: name, type: string, required: true }
//!       - { name: status, type: PetStatus }
//!   - name: PetStatus
//!     enum: [Available, Pending, Sold]
//!
//! endpoints:
//!   - operation_id: getPetById
//!     method: get
//!     route: pet/{petId}
//!     tags: [pet]
//!     summary: Finds pet by ID
//!     parameters:
//!       - { name: petId, in: path, type: int64 }
//!     responses:
//!       - { status: 200, type: Pet }
//!       - { status: 404, description: Pet not found }
//! ```

use std::path::Path;

use restdoc_core::{EndpointDeclaration, TypeDef};
use serde::Deserialize;

use crate::error::Result;
use crate::registry::EndpointRegistry;
use crate::schema::TypeCatalog;

/// Types and endpoints declared in one file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Manifest {
    /// Structures and enumerations referenced by endpoints.
    pub types: Vec<TypeDef>,
    /// Endpoint declarations, in registration order.
    pub endpoints: Vec<EndpointDeclaration>,
}

impl Manifest {
    /// Load a manifest from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let manifest = Self::from_yaml(&content)?;
        tracing::debug!(
            path = %path.display(),
            types = manifest.types.len(),
            endpoints = manifest.endpoints.len(),
            "manifest loaded"
        );
        Ok(manifest)
    }

    /// Parse a manifest from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Yaml`](crate::Error::Yaml) on malformed input.
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(content)?)
    }

    /// Register everything into a fresh registry and catalog.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateOperationId`](crate::Error::DuplicateOperationId)
    /// or [`Error::ShapeConflict`](crate::Error::ShapeConflict).
    pub fn into_parts(self) -> Result<(EndpointRegistry, TypeCatalog)> {
        let mut catalog = TypeCatalog::new();
        catalog.define_all(self.types)?;
        let mut registry = EndpointRegistry::new();
        registry.register_all(self.endpoints)?;
        Ok((registry, catalog))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use indoc::indoc;
    use restdoc_core::{HttpMethod, ParameterLocation};

    const PETSTORE: &str = indoc! {"
        types:
          - name: Pet
            fields:
              - { name: id, type: int64 }
              - { name: name, type: string, required: true }
              - { name: tags, type: 'list<string>' }
          - name: PetStatus
            enum: [Available, Pending, Sold]
        endpoints:
          - operation_id: getPetById
            method: get
            route: pet/{petId}
            tags: [pet]
            parameters:
              - { name: petId, in: path, type: int64 }
            responses:
              - { status: 200, type: Pet }
    "};

    #[test]
    fn parse_petstore_manifest() {
        let manifest = Manifest::from_yaml(PETSTORE).unwrap();
        assert_eq!(manifest.types.len(), 2);
        assert_eq!(manifest.endpoints.len(), 1);

        let endpoint = &manifest.endpoints[0];
        assert_eq!(endpoint.method(), HttpMethod::Get);
        assert_eq!(endpoint.parameters()[0].location(), ParameterLocation::Path);
        assert!(endpoint.parameters()[0].is_required());
    }

    #[test]
    fn into_parts_registers_everything() {
        let (registry, catalog) = Manifest::from_yaml(PETSTORE).unwrap().into_parts().unwrap();
        assert_eq!(registry.len(), 1);
        assert!(catalog.get("PetStatus").is_some());
    }

    #[test]
    fn duplicate_operation_ids_fail_registration() {
        let yaml = indoc! {"
            endpoints:
              - { operation_id: addPet, method: post, route: pet }
              - { operation_id: addPet, method: put, route: pet }
        "};
        let err = Manifest::from_yaml(yaml).unwrap().into_parts().unwrap_err();
        assert!(matches!(err, Error::DuplicateOperationId { .. }));
    }

    #[test]
    fn empty_manifest_is_valid() {
        let manifest = Manifest::from_yaml("{}").unwrap();
        assert!(manifest.types.is_empty());
        assert!(manifest.endpoints.is_empty());
    }

    #[test]
    fn unknown_top_level_key_is_rejected() {
        assert!(matches!(
            Manifest::from_yaml("routes: []"),
            Err(Error::Yaml(_))
        ));
    }
}
