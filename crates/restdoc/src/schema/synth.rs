//! Descriptor → shape resolution.

use restdoc_core::{DataShape, PrimitiveKind, ShapeField, StructDef, TypeDef, TypeDescriptor};

use super::{ComponentTable, TypeCatalog};
use crate::error::{Error, Result};

/// Resolves [`TypeDescriptor`]s into [`DataShape`]s, registering every named
/// structure and enumeration it meets in a [`ComponentTable`].
///
/// Names resolve against the fixed primitive table first, then against the
/// [`TypeCatalog`]. Structures come back as [`DataShape::ObjectRef`]; their
/// definition lives in the table only.
///
/// A structure's name is reserved in the table *before* its fields are
/// visited, so a field that refers back to an enclosing structure resolves
/// to a reference instead of recursing.
#[derive(Debug)]
pub struct Synthesizer<'a> {
    catalog: &'a TypeCatalog,
    table: ComponentTable,
    structs_built: usize,
}

impl<'a> Synthesizer<'a> {
    /// Synthesizer with an empty component table.
    #[must_use]
    pub fn new(catalog: &'a TypeCatalog) -> Self {
        Self::with_table(catalog, ComponentTable::new())
    }

    /// Synthesizer that continues filling an existing table.
    #[must_use]
    pub fn with_table(catalog: &'a TypeCatalog, table: ComponentTable) -> Self {
        Self {
            catalog,
            table,
            structs_built: 0,
        }
    }

    /// Resolve a descriptor.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedShape`]: a name is neither primitive nor declared
    /// - [`Error::ShapeConflict`]: a component name is already taken by a
    ///   different shape
    pub fn synthesize(&mut self, descriptor: &TypeDescriptor) -> Result<DataShape> {
        match descriptor {
            TypeDescriptor::List(element) => {
                Ok(DataShape::Array(Box::new(self.synthesize(element)?)))
            }
            TypeDescriptor::Named(name) => self.resolve(name),
        }
    }

    fn resolve(&mut self, name: &str) -> Result<DataShape> {
        if let Some(kind) = PrimitiveKind::from_name(name) {
            return Ok(DataShape::Primitive(kind));
        }

        match self.catalog.get(name) {
            Some(TypeDef::Enum(def)) => {
                let shape = DataShape::EnumRef {
                    name: def.name.clone(),
                    values: def.values.clone(),
                };
                self.table
                    .insert(&def.name, shape.clone(), def.description.clone())?;
                Ok(shape)
            }
            Some(TypeDef::Struct(def)) => self.resolve_struct(def),
            None => Err(Error::UnsupportedShape {
                descriptor: name.to_string(),
            }),
        }
    }

    fn resolve_struct(&mut self, def: &StructDef) -> Result<DataShape> {
        let reference = DataShape::ObjectRef(def.name.clone());

        // Seen before, or currently being built further up the stack.
        if self.table.contains(&def.name) {
            return Ok(reference);
        }

        self.table.reserve(&def.name);
        let fields = match self.synthesize_fields(def) {
            Ok(fields) => fields,
            Err(err) => {
                self.table.release(&def.name);
                return Err(err);
            }
        };
        self.table
            .insert(&def.name, DataShape::Object(fields), def.description.clone())?;
        self.structs_built += 1;
        tracing::trace!(component = %def.name, "synthesized component");

        Ok(reference)
    }

    fn synthesize_fields(&mut self, def: &StructDef) -> Result<Vec<ShapeField>> {
        def.fields
            .iter()
            .map(|field| {
                Ok(ShapeField {
                    name: field.name.clone(),
                    shape: self.synthesize(&field.ty)?,
                    required: field.required,
                    description: field.description.clone(),
                })
            })
            .collect()
    }

    /// Components synthesized so far.
    #[must_use]
    pub fn table(&self) -> &ComponentTable {
        &self.table
    }

    /// How many structure definitions were actually computed (memoized
    /// lookups are not counted).
    #[must_use]
    pub fn structs_built(&self) -> usize {
        self.structs_built
    }

    /// Verify and return the component table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeCycleUnresolved`] if a reservation was never
    /// filled or a reference dangles.
    pub fn finish(self) -> Result<ComponentTable> {
        self.table.verify()?;
        Ok(self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use restdoc_core::{EnumDef, StructDef};

    fn pet_catalog() -> TypeCatalog {
        let mut catalog = TypeCatalog::new();
        catalog
            .define(
                StructDef::new("Pet")
                    .field("id", "int64")
                    .required_field("name", "string")
                    .field("status", "PetStatus"),
            )
            .unwrap();
        catalog
            .define(EnumDef::new("PetStatus", ["Available", "Pending", "Sold"]))
            .unwrap();
        catalog
    }

    #[test]
    fn pet_component_has_ordered_fields_and_enum() {
        let catalog = pet_catalog();
        let mut synth = Synthesizer::new(&catalog);

        let shape = synth.synthesize(&TypeDescriptor::named("Pet")).unwrap();
        assert_eq!(shape, DataShape::ObjectRef("Pet".into()));

        let table = synth.finish().unwrap();
        let Some(DataShape::Object(fields)) = table.get("Pet") else {
            panic!("Pet should be an object component");
        };
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name", "status"]);
        assert_eq!(fields[0].shape, DataShape::Primitive(PrimitiveKind::Int64));
        assert_eq!(fields[1].shape, DataShape::Primitive(PrimitiveKind::String));
        assert!(fields[1].required);
        assert_eq!(
            fields[2].shape,
            DataShape::EnumRef {
                name: "PetStatus".into(),
                values: vec!["Available".into(), "Pending".into(), "Sold".into()],
            }
        );
        assert!(table.get("PetStatus").is_some());
    }

    #[test]
    fn self_reference_terminates_with_single_entry() {
        let mut catalog = TypeCatalog::new();
        catalog
            .define(
                StructDef::new("Node")
                    .field("value", "string")
                    .field("parent", "Node")
                    .field("children", "list<Node>"),
            )
            .unwrap();
        let mut synth = Synthesizer::new(&catalog);
        let shape = synth.synthesize(&TypeDescriptor::named("Node")).unwrap();
        assert_eq!(shape, DataShape::ObjectRef("Node".into()));

        let table = synth.finish().unwrap();
        assert_eq!(table.len(), 1);
        let Some(DataShape::Object(fields)) = table.get("Node") else {
            panic!("Node should be an object component");
        };
        assert_eq!(fields[1].shape, DataShape::ObjectRef("Node".into()));
        assert_eq!(
            fields[2].shape,
            DataShape::Array(Box::new(DataShape::ObjectRef("Node".into())))
        );
    }

    #[test]
    fn mutual_recursion_terminates() {
        let mut catalog = TypeCatalog::new();
        catalog
            .define(StructDef::new("Owner").field("pets", "Pet[]"))
            .unwrap();
        catalog
            .define(StructDef::new("Pet").field("owner", "Owner"))
            .unwrap();
        let mut synth = Synthesizer::new(&catalog);
        synth.synthesize(&TypeDescriptor::named("Owner")).unwrap();
        let table = synth.finish().unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn resynthesis_is_memoized() {
        let catalog = pet_catalog();
        let mut synth = Synthesizer::new(&catalog);
        let first = synth.synthesize(&TypeDescriptor::named("Pet")).unwrap();
        let second = synth.synthesize(&TypeDescriptor::named("Pet")).unwrap();
        let listed = synth.synthesize(&TypeDescriptor::list("Pet")).unwrap();

        assert_eq!(first, second);
        assert_eq!(listed, DataShape::Array(Box::new(first)));
        assert_eq!(synth.structs_built(), 1);
        // Pet + PetStatus, never a duplicate.
        assert_eq!(synth.table().len(), 2);
    }

    #[test]
    fn unknown_name_is_unsupported() {
        let catalog = TypeCatalog::new();
        let mut synth = Synthesizer::new(&catalog);
        let err = synth
            .synthesize(&"map<string,int>".parse().unwrap())
            .unwrap_err();
        assert!(
            matches!(err, Error::UnsupportedShape { ref descriptor } if descriptor == "map<string,int>")
        );
    }

    #[test]
    fn failed_struct_releases_its_reservation() {
        let mut catalog = TypeCatalog::new();
        catalog
            .define(StructDef::new("Broken").field("x", "Mystery"))
            .unwrap();
        let mut synth = Synthesizer::new(&catalog);
        assert!(synth.synthesize(&TypeDescriptor::named("Broken")).is_err());
        assert!(!synth.table().contains("Broken"));
        assert!(synth.finish().is_ok());
    }

    #[test]
    fn primitives_need_no_catalog() {
        let catalog = TypeCatalog::new();
        let mut synth = Synthesizer::new(&catalog);
        let shape = synth.synthesize(&TypeDescriptor::list("date-time")).unwrap();
        assert_eq!(
            shape,
            DataShape::Array(Box::new(DataShape::Primitive(PrimitiveKind::DateTime)))
        );
        assert!(synth.table().is_empty());
    }
}
