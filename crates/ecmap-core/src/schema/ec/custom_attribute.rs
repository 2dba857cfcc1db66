use super::QualifiedName;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A custom attribute instance the engine does not interpret.
///
/// Mapping custom attributes never appear here; they are parsed into
/// [`MapDirectives`](super::MapDirectives) and
/// [`PropertyMapDirectives`](super::PropertyMapDirectives).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomAttribute {
    /// The custom attribute class
    pub class: QualifiedName,

    /// Property values of the instance
    pub values: IndexMap<String, serde_json::Value>,
}

impl CustomAttribute {
    pub fn new(class: QualifiedName) -> Self {
        Self {
            class,
            values: IndexMap::new(),
        }
    }

    pub fn value(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}
