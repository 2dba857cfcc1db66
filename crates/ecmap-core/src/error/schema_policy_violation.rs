use super::Error;

/// Error when an import adds an item forbidden by a schema policy another
/// schema opted into.
#[derive(Debug)]
pub(super) struct SchemaPolicyViolation {
    policy: &'static str,
    item: Box<str>,
    owner: Box<str>,
}

impl std::error::Error for SchemaPolicyViolation {}

impl core::fmt::Display for SchemaPolicyViolation {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "ECSchema import failed. {} violates the schema policy {} of ECSchema {}.",
            self.item, self.policy, self.owner
        )
    }
}

impl Error {
    /// `item` violates `policy`, declared by the schema `owner`.
    pub fn schema_policy_violation(
        policy: &'static str,
        item: impl Into<String>,
        owner: impl Into<String>,
    ) -> Error {
        Error::from(super::ErrorKind::SchemaPolicyViolation(SchemaPolicyViolation {
            policy,
            item: item.into().into(),
            owner: owner.into().into(),
        }))
    }

    pub fn is_schema_policy_violation(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::SchemaPolicyViolation(_))
    }
}
