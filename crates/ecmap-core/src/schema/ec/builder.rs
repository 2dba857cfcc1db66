use super::{
    Class, Collation, Constraint, CustomAttribute, End, Enumeration, Enumerator, EnumeratorValue,
    Flavor, KindOfQuantity, MapDirectives, Modifier, Multiplicity, Occurs, PrimitiveType,
    Exceptions, Property, PropertyCategory, PropertyKind, QualifiedName, Relationship, Schema,
    Strength, StrengthDirection, ValueType, Version,
};

/// Builds a [`Schema`] in code.
///
/// Names passed to the builder are either bare (`"Foo"`, qualified with the
/// schema being built) or qualified (`"Other:Foo"`).
#[derive(Debug)]
pub struct SchemaBuilder {
    schema: Schema,
}

#[derive(Debug)]
pub struct ClassBuilder {
    schema: String,
    class: Class,
}

#[derive(Debug)]
pub struct RelationshipBuilder {
    schema: String,
    class: Class,
    relationship: Relationship,
}

#[derive(Debug)]
pub struct EnumerationBuilder {
    enumeration: Enumeration,
}

impl SchemaBuilder {
    pub(super) fn new(name: String, alias: String, version: Version) -> Self {
        Self {
            schema: Schema::new(name, alias, version),
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.schema.label = Some(label.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.schema.description = Some(description.into());
        self
    }

    pub fn reference(mut self, schema: impl Into<String>) -> Self {
        self.schema.references.push(schema.into());
        self
    }

    pub fn entity(self, name: &str, f: impl FnOnce(ClassBuilder) -> ClassBuilder) -> Self {
        self.class(name, Flavor::Entity, f)
    }

    pub fn struct_class(self, name: &str, f: impl FnOnce(ClassBuilder) -> ClassBuilder) -> Self {
        self.class(name, Flavor::Struct, f)
    }

    pub fn custom_attribute_class(
        self,
        name: &str,
        f: impl FnOnce(ClassBuilder) -> ClassBuilder,
    ) -> Self {
        self.class(name, Flavor::CustomAttribute, f)
    }

    fn class(
        mut self,
        name: &str,
        flavor: Flavor,
        f: impl FnOnce(ClassBuilder) -> ClassBuilder,
    ) -> Self {
        let builder = ClassBuilder {
            schema: self.schema.name.clone(),
            class: Class::new(name, flavor),
        };
        self.schema.classes.push(f(builder).class);
        self
    }

    pub fn relationship(
        mut self,
        name: &str,
        f: impl FnOnce(RelationshipBuilder) -> RelationshipBuilder,
    ) -> Self {
        let empty = Constraint::new(Multiplicity::ZERO_MANY, vec![]);
        let relationship = Relationship::new(empty.clone(), empty);
        let builder = RelationshipBuilder {
            schema: self.schema.name.clone(),
            class: Class::new(name, Flavor::Relationship(relationship.clone())),
            relationship,
        };
        let mut built = f(builder);
        built.class.flavor = Flavor::Relationship(built.relationship);
        self.schema.classes.push(built.class);
        self
    }

    pub fn enumeration(
        mut self,
        name: &str,
        backing_type: PrimitiveType,
        is_strict: bool,
        f: impl FnOnce(EnumerationBuilder) -> EnumerationBuilder,
    ) -> Self {
        let builder = EnumerationBuilder {
            enumeration: Enumeration {
                name: name.to_string(),
                label: None,
                description: None,
                backing_type,
                is_strict,
                enumerators: vec![],
            },
        };
        self.schema.enumerations.push(f(builder).enumeration);
        self
    }

    pub fn kind_of_quantity(mut self, name: &str, persistence_unit: &str) -> Self {
        self.schema.kinds_of_quantity.push(KindOfQuantity {
            name: name.to_string(),
            label: None,
            description: None,
            persistence_unit: persistence_unit.to_string(),
            relative_error: 0.0001,
            presentation_formats: vec![],
        });
        self
    }

    pub fn property_category(mut self, name: &str, priority: i32) -> Self {
        self.schema.property_categories.push(PropertyCategory {
            name: name.to_string(),
            label: None,
            description: None,
            priority,
        });
        self
    }

    pub fn custom_attribute(mut self, custom_attribute: CustomAttribute) -> Self {
        self.schema.custom_attributes.push(custom_attribute);
        self
    }

    /// Opts into `NoAdditionalRootEntityClasses`.
    pub fn no_additional_root_entity_classes<'a>(
        mut self,
        exceptions: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        self.schema.policies.no_additional_root_entity_classes = Some(Exceptions::new(exceptions));
        self
    }

    /// Opts into `NoAdditionalLinkTables`.
    pub fn no_additional_link_tables<'a>(
        mut self,
        exceptions: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        self.schema.policies.no_additional_link_tables = Some(Exceptions::new(exceptions));
        self
    }

    /// Opts into `NoAdditionalForeignKeyConstraints`.
    pub fn no_additional_foreign_key_constraints<'a>(
        mut self,
        exceptions: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        self.schema.policies.no_additional_foreign_key_constraints =
            Some(Exceptions::new(exceptions));
        self
    }

    pub fn build(self) -> Schema {
        self.schema
    }
}

impl ClassBuilder {
    fn qualify(&self, name: &str) -> QualifiedName {
        QualifiedName::parse(&self.schema, name)
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.class.label = Some(label.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.class.description = Some(description.into());
        self
    }

    pub fn modifier(mut self, modifier: Modifier) -> Self {
        self.class.modifier = modifier;
        self
    }

    pub fn abstract_class(self) -> Self {
        self.modifier(Modifier::Abstract)
    }

    pub fn sealed(self) -> Self {
        self.modifier(Modifier::Sealed)
    }

    pub fn base(mut self, name: &str) -> Self {
        let base = self.qualify(name);
        self.class.base_classes.push(base);
        self
    }

    pub fn map(mut self, map: MapDirectives) -> Self {
        self.class.map = map;
        self
    }

    pub fn custom_attribute(mut self, class: &str) -> Self {
        let class = self.qualify(class);
        self.class.custom_attributes.push(CustomAttribute::new(class));
        self
    }

    pub fn custom_attribute_instance(mut self, custom_attribute: CustomAttribute) -> Self {
        self.class.custom_attributes.push(custom_attribute);
        self
    }

    pub fn property(mut self, property: Property) -> Self {
        self.class.properties.push(property);
        self
    }

    pub fn primitive(self, name: &str, ty: PrimitiveType) -> Self {
        self.property(Property::new(name, PropertyKind::Primitive(ValueType::Primitive(ty))))
    }

    pub fn enumeration(self, name: &str, enumeration: &str) -> Self {
        let ty = ValueType::Enumeration(self.qualify(enumeration));
        self.property(Property::new(name, PropertyKind::Primitive(ty)))
    }

    pub fn primitive_array(self, name: &str, ty: PrimitiveType) -> Self {
        self.property(Property::new(
            name,
            PropertyKind::PrimitiveArray {
                ty: ValueType::Primitive(ty),
                occurs: Occurs::UNBOUNDED,
            },
        ))
    }

    pub fn struct_property(self, name: &str, struct_class: &str) -> Self {
        let ty = self.qualify(struct_class);
        self.property(Property::new(name, PropertyKind::Struct(ty)))
    }

    pub fn struct_array(self, name: &str, struct_class: &str) -> Self {
        let ty = self.qualify(struct_class);
        self.property(Property::new(
            name,
            PropertyKind::StructArray {
                ty,
                occurs: Occurs::UNBOUNDED,
            },
        ))
    }

    pub fn navigation(self, name: &str, relationship: &str, direction: StrengthDirection) -> Self {
        let relationship = self.qualify(relationship);
        self.property(Property::new(
            name,
            PropertyKind::Navigation {
                relationship,
                direction,
            },
        ))
    }

    /// Applies `f` to the most recently added property.
    pub fn with_last(mut self, f: impl FnOnce(&mut Property)) -> Self {
        if let Some(property) = self.class.properties.last_mut() {
            f(property);
        }
        self
    }

    pub fn read_only(self) -> Self {
        self.with_last(|property| property.read_only = true)
    }

    pub fn kind_of_quantity(self, koq: &str) -> Self {
        let koq = self.qualify(koq);
        self.with_last(|property| property.kind_of_quantity = Some(koq))
    }

    pub fn category(self, category: &str) -> Self {
        let category = self.qualify(category);
        self.with_last(|property| property.category = Some(category))
    }

    pub fn column_name(self, column: &str) -> Self {
        self.with_last(|property| property.map.column_name = Some(column.to_string()))
    }

    pub fn unique(self) -> Self {
        self.with_last(|property| property.map.unique = true)
    }

    pub fn collation(self, collation: Collation) -> Self {
        self.with_last(|property| property.map.collation = Some(collation))
    }
}

impl RelationshipBuilder {
    fn qualify(&self, name: &str) -> QualifiedName {
        QualifiedName::parse(&self.schema, name)
    }

    fn constraint_mut(&mut self, end: End) -> &mut Constraint {
        match end {
            End::Source => &mut self.relationship.source,
            End::Target => &mut self.relationship.target,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.class.label = Some(label.into());
        self
    }

    pub fn modifier(mut self, modifier: Modifier) -> Self {
        self.class.modifier = modifier;
        self
    }

    pub fn base(mut self, name: &str) -> Self {
        let base = self.qualify(name);
        self.class.base_classes.push(base);
        self
    }

    pub fn map(mut self, map: MapDirectives) -> Self {
        self.class.map = map;
        self
    }

    pub fn strength(mut self, strength: Strength) -> Self {
        self.relationship.strength = strength;
        self
    }

    pub fn strength_direction(mut self, direction: StrengthDirection) -> Self {
        self.relationship.strength_direction = direction;
        self
    }

    pub fn source(self, multiplicity: Multiplicity, class: &str) -> Self {
        self.end(End::Source, multiplicity, class)
    }

    pub fn target(self, multiplicity: Multiplicity, class: &str) -> Self {
        self.end(End::Target, multiplicity, class)
    }

    /// Sets the multiplicity of `end` and appends `class` to its constraint
    /// classes.
    pub fn end(mut self, end: End, multiplicity: Multiplicity, class: &str) -> Self {
        let class = self.qualify(class);
        let constraint = self.constraint_mut(end);
        constraint.multiplicity = multiplicity;
        constraint.classes.push(class);
        self
    }

    pub fn polymorphic(mut self, end: End, polymorphic: bool) -> Self {
        self.constraint_mut(end).polymorphic = polymorphic;
        self
    }

    pub fn abstract_constraint(mut self, end: End, class: &str) -> Self {
        let class = self.qualify(class);
        self.constraint_mut(end).abstract_constraint = Some(class);
        self
    }

    pub fn role_label(mut self, end: End, label: &str) -> Self {
        self.constraint_mut(end).role_label = Some(label.to_string());
        self
    }

    pub fn primitive(mut self, name: &str, ty: PrimitiveType) -> Self {
        self.class.properties.push(Property::new(
            name,
            PropertyKind::Primitive(ValueType::Primitive(ty)),
        ));
        self
    }
}

impl EnumerationBuilder {
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.enumeration.label = Some(label.into());
        self
    }

    pub fn enumerator(mut self, name: &str, value: impl Into<EnumeratorValue>) -> Self {
        self.enumeration.enumerators.push(Enumerator {
            name: name.to_string(),
            value: value.into(),
            label: None,
            description: None,
        });
        self
    }
}

impl From<i32> for EnumeratorValue {
    fn from(value: i32) -> Self {
        EnumeratorValue::Integer(value)
    }
}

impl From<&str> for EnumeratorValue {
    fn from(value: &str) -> Self {
        EnumeratorValue::String(value.to_string())
    }
}
