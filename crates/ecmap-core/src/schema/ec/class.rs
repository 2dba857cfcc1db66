use super::{CustomAttribute, MapDirectives, Property, QualifiedName, Relationship};

use serde::{Deserialize, Serialize};

use std::fmt;

/// An EC class: entity, struct, custom attribute or relationship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Class {
    pub name: String,

    pub label: Option<String>,

    pub description: Option<String>,

    pub modifier: Modifier,

    /// What kind of class this is. Immutable once persisted.
    pub flavor: Flavor,

    /// Base classes in declaration order. Entities and relationships support
    /// a single base class.
    pub base_classes: Vec<QualifiedName>,

    /// Properties declared by this class (inherited ones are not repeated
    /// unless overridden).
    pub properties: Vec<Property>,

    /// Mapping directives parsed from the ECDbMap custom attributes.
    pub map: MapDirectives,

    /// All other custom attributes, carried through uninterpreted.
    pub custom_attributes: Vec<CustomAttribute>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modifier {
    #[default]
    None,
    Abstract,
    Sealed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Flavor {
    Entity,
    Struct,
    CustomAttribute,
    Relationship(Relationship),
}

/// The flavor without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassType {
    Entity,
    Struct,
    CustomAttribute,
    Relationship,
}

impl Class {
    pub fn new(name: impl Into<String>, flavor: Flavor) -> Self {
        Self {
            name: name.into(),
            label: None,
            description: None,
            modifier: Modifier::None,
            flavor,
            base_classes: vec![],
            properties: vec![],
            map: MapDirectives::default(),
            custom_attributes: vec![],
        }
    }

    pub fn class_type(&self) -> ClassType {
        match self.flavor {
            Flavor::Entity => ClassType::Entity,
            Flavor::Struct => ClassType::Struct,
            Flavor::CustomAttribute => ClassType::CustomAttribute,
            Flavor::Relationship(_) => ClassType::Relationship,
        }
    }

    pub fn is_abstract(&self) -> bool {
        self.modifier == Modifier::Abstract
    }

    pub fn is_struct(&self) -> bool {
        matches!(self.flavor, Flavor::Struct)
    }

    pub fn relationship(&self) -> Option<&Relationship> {
        match &self.flavor {
            Flavor::Relationship(relationship) => Some(relationship),
            _ => None,
        }
    }

    /// The single base class, if any.
    pub fn base_class(&self) -> Option<&QualifiedName> {
        self.base_classes.first()
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|property| property.name == name)
    }

    pub fn custom_attribute(&self, class: &QualifiedName) -> Option<&CustomAttribute> {
        self.custom_attributes
            .iter()
            .find(|custom_attribute| custom_attribute.class == *class)
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Modifier::None => "None",
            Modifier::Abstract => "Abstract",
            Modifier::Sealed => "Sealed",
        })
    }
}

impl fmt::Display for ClassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ClassType::Entity => "EntityClass",
            ClassType::Struct => "StructClass",
            ClassType::CustomAttribute => "CustomAttributeClass",
            ClassType::Relationship => "RelationshipClass",
        })
    }
}
