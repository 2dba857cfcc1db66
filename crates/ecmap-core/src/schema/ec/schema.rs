use super::{
    Class, CustomAttribute, Enumeration, KindOfQuantity, PropertyCategory, QualifiedName,
    SchemaBuilder, SchemaPolicies, Version,
};

use serde::{Deserialize, Serialize};

/// An EC schema as submitted for import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,

    pub alias: String,

    pub version: Version,

    pub label: Option<String>,

    pub description: Option<String>,

    /// Names of the schemas this schema references.
    pub references: Vec<String>,

    pub classes: Vec<Class>,

    pub enumerations: Vec<Enumeration>,

    pub kinds_of_quantity: Vec<KindOfQuantity>,

    pub property_categories: Vec<PropertyCategory>,

    pub custom_attributes: Vec<CustomAttribute>,

    /// Policies this schema imposes on the other schemas of the database.
    #[serde(default)]
    pub policies: SchemaPolicies,
}

impl Schema {
    pub fn builder(
        name: impl Into<String>,
        alias: impl Into<String>,
        version: Version,
    ) -> SchemaBuilder {
        SchemaBuilder::new(name.into(), alias.into(), version)
    }

    pub fn new(name: impl Into<String>, alias: impl Into<String>, version: Version) -> Self {
        Self {
            name: name.into(),
            alias: alias.into(),
            version,
            label: None,
            description: None,
            references: vec![],
            classes: vec![],
            enumerations: vec![],
            kinds_of_quantity: vec![],
            property_categories: vec![],
            custom_attributes: vec![],
            policies: SchemaPolicies::default(),
        }
    }

    pub fn class(&self, name: &str) -> Option<&Class> {
        self.classes.iter().find(|class| class.name == name)
    }

    pub fn class_mut(&mut self, name: &str) -> Option<&mut Class> {
        self.classes.iter_mut().find(|class| class.name == name)
    }

    pub fn enumeration(&self, name: &str) -> Option<&Enumeration> {
        self.enumerations
            .iter()
            .find(|enumeration| enumeration.name == name)
    }

    pub fn enumeration_mut(&mut self, name: &str) -> Option<&mut Enumeration> {
        self.enumerations
            .iter_mut()
            .find(|enumeration| enumeration.name == name)
    }

    pub fn kind_of_quantity(&self, name: &str) -> Option<&KindOfQuantity> {
        self.kinds_of_quantity.iter().find(|koq| koq.name == name)
    }

    pub fn property_category(&self, name: &str) -> Option<&PropertyCategory> {
        self.property_categories
            .iter()
            .find(|category| category.name == name)
    }

    /// Qualifies `name` with this schema's name.
    pub fn qualify(&self, name: &str) -> QualifiedName {
        QualifiedName::new(&self.name, name)
    }

    /// A copy with the version replaced, for building the next revision of a
    /// schema in place.
    pub fn with_version(&self, version: Version) -> Schema {
        Schema {
            version,
            ..self.clone()
        }
    }
}
