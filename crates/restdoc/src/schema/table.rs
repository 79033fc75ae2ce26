//! Component table: one canonical shape per name.

use std::collections::BTreeMap;

use restdoc_core::DataShape;

use crate::error::{Error, Result};

/// A table slot. Names are reserved before their fields are synthesized so
/// that self-references resolve to the reservation instead of recursing.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Slot {
    Reserved,
    Defined {
        shape: DataShape,
        description: Option<String>,
    },
}

/// Deduplicated store of named shapes.
///
/// Structures are stored as [`DataShape::Object`], enumerations as
/// [`DataShape::EnumRef`]. Iteration is ordered by name, which keeps the
/// rendered document byte-stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentTable {
    slots: BTreeMap<String, Slot>,
}

impl ComponentTable {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Define `name` as `shape`.
    ///
    /// Inserting a shape identical to the existing entry is a no-op; filling a
    /// reserved slot defines it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeConflict`] if `name` is already defined with a
    /// different shape.
    pub fn insert(
        &mut self,
        name: &str,
        shape: DataShape,
        description: Option<String>,
    ) -> Result<()> {
        match self.slots.get(name) {
            Some(Slot::Defined { shape: existing, .. }) if *existing == shape => Ok(()),
            Some(Slot::Defined { .. }) => Err(Error::ShapeConflict {
                name: name.to_string(),
            }),
            Some(Slot::Reserved) | None => {
                self.slots
                    .insert(name.to_string(), Slot::Defined { shape, description });
                Ok(())
            }
        }
    }

    /// Claim `name` before its definition is known. No-op if the name is
    /// already present.
    pub(crate) fn reserve(&mut self, name: &str) {
        self.slots
            .entry(name.to_string())
            .or_insert(Slot::Reserved);
    }

    /// Drop a reservation that will never be filled. Defined slots are kept.
    pub(crate) fn release(&mut self, name: &str) {
        if matches!(self.slots.get(name), Some(Slot::Reserved)) {
            self.slots.remove(name);
        }
    }

    /// Whether `name` is reserved or defined.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Canonical shape of a defined component.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&DataShape> {
        match self.slots.get(name)? {
            Slot::Defined { shape, .. } => Some(shape),
            Slot::Reserved => None,
        }
    }

    /// Description of a defined component.
    #[must_use]
    pub fn description(&self, name: &str) -> Option<&str> {
        match self.slots.get(name)? {
            Slot::Defined { description, .. } => description.as_deref(),
            Slot::Reserved => None,
        }
    }

    /// Defined components, ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DataShape)> {
        self.slots.iter().filter_map(|(name, slot)| match slot {
            Slot::Defined { shape, .. } => Some((name.as_str(), shape)),
            Slot::Reserved => None,
        })
    }

    /// Number of slots (reserved or defined).
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the table has no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Check that every slot is defined and every reference resolves.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeCycleUnresolved`] naming the first offending
    /// component.
    pub fn verify(&self) -> Result<()> {
        for (name, slot) in &self.slots {
            let Slot::Defined { shape, .. } = slot else {
                return Err(Error::ShapeCycleUnresolved { name: name.clone() });
            };
            self.verify_shape(shape)?;
        }
        Ok(())
    }

    /// Verify that `shape`'s references all resolve in this table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeCycleUnresolved`] for the first dangling name.
    pub fn verify_shape(&self, shape: &DataShape) -> Result<()> {
        let mut dangling = None;
        shape.for_each_reference(&mut |target| {
            if dangling.is_none() && self.get(target).is_none() {
                dangling = Some(target.to_string());
            }
        });
        match dangling {
            Some(name) => Err(Error::ShapeCycleUnresolved { name }),
            None => Ok(()),
        }
    }
}
