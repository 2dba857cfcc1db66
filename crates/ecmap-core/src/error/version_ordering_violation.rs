use super::Error;

#[derive(Debug)]
pub(super) struct VersionOrderingViolation {
    schema: Box<str>,
    message: Box<str>,
}

impl std::error::Error for VersionOrderingViolation {}

impl core::fmt::Display for VersionOrderingViolation {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "ECSchema upgrade failed. ECSchema {}: {}",
            self.schema, self.message
        )
    }
}

impl Error {
    /// Creates a version ordering violation: the version decreased, or the
    /// major version does not reflect the presence of structural change.
    pub fn version_ordering_violation(
        schema: impl Into<String>,
        message: impl Into<String>,
    ) -> Error {
        Error::from(super::ErrorKind::VersionOrderingViolation(
            VersionOrderingViolation {
                schema: schema.into().into(),
                message: message.into().into(),
            },
        ))
    }

    /// Returns `true` if this error is a version ordering violation.
    pub fn is_version_ordering_violation(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::VersionOrderingViolation(_))
    }
}
