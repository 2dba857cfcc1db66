use super::Schema;

use serde::{Deserialize, Serialize};

/// Schema policies a schema opts into (`ECDbSchemaPolicies`). A policy
/// binds every other schema of the database, including schemas imported
/// before the opting-in schema, but only for items added after it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaPolicies {
    /// No new entity classes without a base class.
    pub no_additional_root_entity_classes: Option<Exceptions>,

    /// No new relationship classes mapped to a link table.
    pub no_additional_link_tables: Option<Exceptions>,

    /// No new foreign key relationships enforced by a `REFERENCES` clause.
    pub no_additional_foreign_key_constraints: Option<Exceptions>,
}

/// Items exempt from a policy, written `Schema:Class` or, for foreign key
/// constraints, `Schema:Class.NavigationProperty`.
///
/// The schema may be given by name or alias, `.` and `:` both separate the
/// parts, and matching ignores ASCII case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exceptions(pub Vec<String>);

impl SchemaPolicies {
    pub fn is_empty(&self) -> bool {
        self.no_additional_root_entity_classes.is_none()
            && self.no_additional_link_tables.is_none()
            && self.no_additional_foreign_key_constraints.is_none()
    }
}

impl Exceptions {
    pub fn new<S: Into<String>>(items: impl IntoIterator<Item = S>) -> Self {
        Self(items.into_iter().map(Into::into).collect())
    }

    /// Whether the item `path` of `schema` is exempt.
    pub fn contains(&self, schema: &Schema, path: &[&str]) -> bool {
        self.0.iter().any(|entry| {
            let parts: Vec<_> = entry.split([':', '.']).map(str::trim).collect();

            let Some((first, rest)) = parts.split_first() else {
                return false;
            };

            (first.eq_ignore_ascii_case(&schema.name) || first.eq_ignore_ascii_case(&schema.alias))
                && rest.len() == path.len()
                && rest
                    .iter()
                    .zip(path)
                    .all(|(lhs, rhs)| lhs.eq_ignore_ascii_case(rhs))
        })
    }
}
