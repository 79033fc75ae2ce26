//! Schema synthesis: type descriptors → normalized shapes + component table.
//!
//! - [`TypeCatalog`]: declared structures and enumerations, by name
//! - [`ComponentTable`]: deduplicated named shapes referenced by endpoints
//! - [`Synthesizer`]: resolves descriptors against the primitive table and
//!   the catalog, filling the component table

mod synth;
mod table;

use std::collections::HashMap;

use restdoc_core::{PrimitiveKind, TypeDef};

use crate::error::{Error, Result};

pub use synth::Synthesizer;
pub use table::ComponentTable;

/// Declared types, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    defs: HashMap<String, TypeDef>,
}

impl TypeCatalog {
    /// Empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a type. Re-declaring an identical definition is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeConflict`] if a different definition already
    /// uses the name, or if the name shadows a primitive.
    pub fn define(&mut self, def: impl Into<TypeDef>) -> Result<()> {
        let def = def.into();
        if PrimitiveKind::from_name(def.name()).is_some() {
            return Err(Error::ShapeConflict {
                name: def.name().to_string(),
            });
        }
        match self.defs.get(def.name()) {
            Some(existing) if *existing == def => Ok(()),
            Some(_) => Err(Error::ShapeConflict {
                name: def.name().to_string(),
            }),
            None => {
                self.defs.insert(def.name().to_string(), def);
                Ok(())
            }
        }
    }

    /// Declare several types, stopping at the first conflict.
    ///
    /// # Errors
    ///
    /// Returns the first [`Error::ShapeConflict`] encountered.
    pub fn define_all<I>(&mut self, defs: I) -> Result<()>
    where
        I: IntoIterator<Item = TypeDef>,
    {
        defs.into_iter().try_for_each(|def| self.define(def))
    }

    /// Look up a declared type.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.defs.get(name)
    }

    /// Number of declared types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Whether no types are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}
