use serde::{Deserialize, Serialize};

use std::fmt;

/// Name of a schema item qualified by its schema name, displayed as
/// `Schema:Item`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QualifiedName {
    pub schema: String,
    pub name: String,
}

impl QualifiedName {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// Parses `Schema:Item`, or a bare `Item` which is qualified with
    /// `default_schema`.
    pub fn parse(default_schema: &str, s: &str) -> Self {
        match s.split_once(':') {
            Some((schema, name)) => Self::new(schema, name),
            None => Self::new(default_schema, s),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.schema, self.name)
    }
}

impl fmt::Debug for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.schema, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bare_and_qualified() {
        assert_eq!(
            QualifiedName::parse("TestSchema", "Foo"),
            QualifiedName::new("TestSchema", "Foo")
        );
        assert_eq!(
            QualifiedName::parse("TestSchema", "Base:Element"),
            QualifiedName::new("Base", "Element")
        );
        assert_eq!(QualifiedName::new("A", "B").to_string(), "A:B");
    }
}
