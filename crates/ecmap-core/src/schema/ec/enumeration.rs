use super::PrimitiveType;

use serde::{Deserialize, Serialize};

use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enumeration {
    pub name: String,

    pub label: Option<String>,

    pub description: Option<String>,

    /// Either `Integer` or `String`.
    pub backing_type: PrimitiveType,

    /// A strict enumeration only admits its enumerators' values.
    pub is_strict: bool,

    pub enumerators: Vec<Enumerator>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enumerator {
    pub name: String,
    pub value: EnumeratorValue,
    pub label: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnumeratorValue {
    Integer(i32),
    String(String),
}

impl Enumeration {
    pub fn enumerator(&self, name: &str) -> Option<&Enumerator> {
        self.enumerators
            .iter()
            .find(|enumerator| enumerator.name == name)
    }
}

impl EnumeratorValue {
    pub fn primitive_type(&self) -> PrimitiveType {
        match self {
            EnumeratorValue::Integer(_) => PrimitiveType::Integer,
            EnumeratorValue::String(_) => PrimitiveType::String,
        }
    }
}

impl fmt::Display for EnumeratorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnumeratorValue::Integer(value) => write!(f, "{value}"),
            EnumeratorValue::String(value) => write!(f, "'{value}'"),
        }
    }
}
