use super::{
    ClassId, ClassType, Flavor, Modifier, PrimitiveType, Property, PropertyKind, QualifiedName,
    Schema, SchemaSet, ValueType,
};
use crate::{Error, Result};

use std::collections::HashSet;

/// Property names taken by the system properties of every mapped class.
const SYSTEM_PROPERTIES: &[&str] = &["ECInstanceId", "Id", "ECClassId"];

/// Property names taken by the system properties of relationship classes.
const RELATIONSHIP_SYSTEM_PROPERTIES: &[&str] = &[
    "SourceECInstanceId",
    "SourceId",
    "SourceECClassId",
    "TargetECInstanceId",
    "TargetId",
    "TargetECClassId",
];

struct Verify<'a, 'b> {
    set: &'b SchemaSet<'a>,
    schema: &'a Schema,
}

impl<'a> SchemaSet<'a> {
    /// Checks that `schema`, a member of this set, is well formed on its own:
    /// unique names, resolvable references and a consistent hierarchy.
    pub fn verify(&self, schema: &'a Schema) -> Result<()> {
        Verify { set: self, schema }.verify()
    }
}

impl<'a> Verify<'a, '_> {
    fn verify(&self) -> Result<()> {
        if self.schema.alias.is_empty() {
            return Err(Error::invalid_schema(format!(
                "ECSchema {} has an empty alias",
                self.schema.name
            )));
        }

        self.verify_names_are_unique()?;

        for class in &self.schema.classes {
            let name = self.schema.qualify(&class.name);
            let Some(id) = self.set.class_id(&name) else {
                continue;
            };
            self.verify_base_classes(id)?;
            self.verify_properties(id)?;

            if let Flavor::Relationship(relationship) = &class.flavor {
                for constraint in [&relationship.source, &relationship.target] {
                    if constraint.classes.is_empty() {
                        return Err(Error::invalid_schema(format!(
                            "relationship {name} has a constraint without classes"
                        )));
                    }

                    if let Some(upper) = constraint.multiplicity.upper {
                        if upper == 0 || upper < constraint.multiplicity.lower {
                            return Err(Error::invalid_schema(format!(
                                "relationship {name} has invalid multiplicity {}",
                                constraint.multiplicity
                            )));
                        }
                    }

                    for class in constraint
                        .classes
                        .iter()
                        .chain(constraint.abstract_constraint.iter())
                    {
                        self.verify_class_reference(
                            &name,
                            class,
                            &[ClassType::Entity, ClassType::Relationship],
                        )?;
                    }
                }
            }

            for custom_attribute in &class.custom_attributes {
                self.verify_class_reference(
                    &name,
                    &custom_attribute.class,
                    &[ClassType::CustomAttribute],
                )?;
            }
        }

        for enumeration in &self.schema.enumerations {
            if !matches!(
                enumeration.backing_type,
                PrimitiveType::Integer | PrimitiveType::String
            ) {
                return Err(Error::invalid_schema(format!(
                    "enumeration {} must be backed by int or string, not {}",
                    self.schema.qualify(&enumeration.name),
                    enumeration.backing_type
                )));
            }

            let mut names = HashSet::new();
            for enumerator in &enumeration.enumerators {
                if enumerator.value.primitive_type() != enumeration.backing_type {
                    return Err(Error::invalid_schema(format!(
                        "enumerator {} of {} has a value of the wrong type",
                        enumerator.name,
                        self.schema.qualify(&enumeration.name)
                    )));
                }
                if !names.insert(enumerator.name.as_str()) {
                    return Err(Error::invalid_schema(format!(
                        "duplicate enumerator `{}` in {}",
                        enumerator.name,
                        self.schema.qualify(&enumeration.name)
                    )));
                }
            }
        }

        Ok(())
    }

    fn verify_names_are_unique(&self) -> Result<()> {
        let mut names = HashSet::new();
        let items = self
            .schema
            .classes
            .iter()
            .map(|class| class.name.as_str())
            .chain(self.schema.enumerations.iter().map(|e| e.name.as_str()))
            .chain(self.schema.kinds_of_quantity.iter().map(|k| k.name.as_str()))
            .chain(self.schema.property_categories.iter().map(|c| c.name.as_str()));

        for name in items {
            if !names.insert(name.to_ascii_lowercase()) {
                return Err(Error::invalid_schema(format!(
                    "duplicate item name `{name}` in ECSchema {}",
                    self.schema.name
                )));
            }
        }

        for class in &self.schema.classes {
            let mut names = HashSet::new();
            for property in &class.properties {
                if !names.insert(property.name.to_ascii_lowercase()) {
                    return Err(Error::invalid_schema(format!(
                        "duplicate property `{}` in {}",
                        property.name,
                        self.schema.qualify(&class.name)
                    )));
                }
            }
        }

        Ok(())
    }

    fn verify_base_classes(&self, id: ClassId) -> Result<()> {
        let entry = self.set.entry(id);
        let class = entry.class;

        if class.base_classes.len() > 1 {
            return Err(Error::invalid_schema(format!(
                "{} has more than one base class",
                entry.name
            )));
        }

        let Some(base_name) = class.base_class() else {
            return Ok(());
        };

        self.verify_reference_visible(&entry.name, base_name)?;

        let Some(base) = self.set.class(base_name) else {
            return Err(Error::invalid_schema(format!(
                "base class {base_name} of {} not found",
                entry.name
            )));
        };

        if base.class_type() != class.class_type() {
            return Err(Error::invalid_schema(format!(
                "{} {} cannot derive from {} {base_name}",
                class.class_type(),
                entry.name,
                base.class_type()
            )));
        }

        if base.modifier == Modifier::Sealed {
            return Err(Error::invalid_schema(format!(
                "{} derives from sealed class {base_name}",
                entry.name
            )));
        }

        if self.set.has_cycle(id) {
            return Err(Error::invalid_schema(format!(
                "{} is part of an inheritance cycle",
                entry.name
            )));
        }

        Ok(())
    }

    fn verify_properties(&self, id: ClassId) -> Result<()> {
        let entry = self.set.entry(id);
        let class_type = entry.class.class_type();

        for property in &entry.class.properties {
            if is_system_property(class_type, &property.name) {
                return Err(Error::invalid_schema(format!(
                    "{}.{} collides with a system property",
                    entry.name, property.name
                )));
            }

            self.verify_property(&entry.name, property)?;

            // An override must keep the kind of the property it overrides.
            if let Some(base) = self.set.overridden(id, &property.name) {
                if let Some(overridden) = self.set.entry(base).class.property(&property.name) {
                    if !overridden.kind.same_kind(&property.kind) {
                        return Err(Error::invalid_schema(format!(
                            "{}.{} overrides a {} with a {}",
                            entry.name,
                            property.name,
                            overridden.kind.kind_name(),
                            property.kind.kind_name()
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    fn verify_property(&self, class: &QualifiedName, property: &Property) -> Result<()> {
        let owner = format!("{class}.{}", property.name);

        match &property.kind {
            PropertyKind::Primitive(ty) | PropertyKind::PrimitiveArray { ty, .. } => {
                if let ValueType::Enumeration(name) = ty {
                    self.verify_reference_visible(class, name)?;
                    if self.set.enumeration(name).is_none() {
                        return Err(Error::invalid_schema(format!(
                            "enumeration {name} of {owner} not found"
                        )));
                    }
                }
            }
            PropertyKind::Struct(name) | PropertyKind::StructArray { ty: name, .. } => {
                self.verify_class_reference(class, name, &[ClassType::Struct])?;
            }
            PropertyKind::Navigation { relationship, .. } => {
                self.verify_class_reference(class, relationship, &[ClassType::Relationship])?;
            }
        }

        if let PropertyKind::PrimitiveArray { occurs, .. }
        | PropertyKind::StructArray { occurs, .. } = &property.kind
        {
            if occurs.max.is_some_and(|max| max < occurs.min) {
                return Err(Error::invalid_schema(format!(
                    "{owner} has maxOccurs below minOccurs"
                )));
            }
        }

        if let Some(koq) = &property.kind_of_quantity {
            self.verify_reference_visible(class, koq)?;
            if self.set.kind_of_quantity(koq).is_none() {
                return Err(Error::invalid_schema(format!(
                    "kind of quantity {koq} of {owner} not found"
                )));
            }
        }

        if let Some(category) = &property.category {
            self.verify_reference_visible(class, category)?;
            if self.set.property_category(category).is_none() {
                return Err(Error::invalid_schema(format!(
                    "property category {category} of {owner} not found"
                )));
            }
        }

        Ok(())
    }

    fn verify_class_reference(
        &self,
        from: &QualifiedName,
        name: &QualifiedName,
        expected: &[ClassType],
    ) -> Result<()> {
        self.verify_reference_visible(from, name)?;

        match self.set.class(name) {
            Some(class) if expected.contains(&class.class_type()) => Ok(()),
            Some(class) => Err(Error::invalid_schema(format!(
                "{from} references {name}, which is a {}",
                class.class_type()
            ))),
            None => Err(Error::invalid_schema(format!(
                "{from} references {name}, which does not exist"
            ))),
        }
    }

    /// Items from another schema may only be referenced when that schema is
    /// declared as a reference.
    fn verify_reference_visible(&self, from: &QualifiedName, name: &QualifiedName) -> Result<()> {
        if name.schema == self.schema.name
            || self.schema.references.iter().any(|r| *r == name.schema)
        {
            return Ok(());
        }

        Err(Error::invalid_schema(format!(
            "{from} references {name}, but ECSchema {} does not reference ECSchema {}",
            self.schema.name, name.schema
        )))
    }
}

/// Struct and custom attribute classes are not mapped and have no system
/// properties. Names compare ignoring ASCII case.
fn is_system_property(class_type: ClassType, name: &str) -> bool {
    let reserved: &[&[&str]] = match class_type {
        ClassType::Entity => &[SYSTEM_PROPERTIES],
        ClassType::Relationship => &[SYSTEM_PROPERTIES, RELATIONSHIP_SYSTEM_PROPERTIES],
        ClassType::Struct | ClassType::CustomAttribute => return false,
    };

    reserved
        .iter()
        .flat_map(|names| names.iter())
        .any(|reserved| reserved.eq_ignore_ascii_case(name))
}
