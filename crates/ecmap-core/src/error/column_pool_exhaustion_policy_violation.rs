use super::Error;

/// Error when the shared column pool parameters fixed at first mapping are
/// changed by a later import.
#[derive(Debug)]
pub(super) struct ColumnPoolExhaustionPolicyViolation {
    container: Box<str>,
    message: Box<str>,
}

impl std::error::Error for ColumnPoolExhaustionPolicyViolation {}

impl core::fmt::Display for ColumnPoolExhaustionPolicyViolation {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "ECSchema upgrade failed. {}: {}",
            self.container, self.message
        )
    }
}

impl Error {
    pub fn column_pool_exhaustion_policy_violation(
        container: impl Into<String>,
        message: impl Into<String>,
    ) -> Error {
        Error::from(super::ErrorKind::ColumnPoolExhaustionPolicyViolation(
            ColumnPoolExhaustionPolicyViolation {
                container: container.into().into(),
                message: message.into().into(),
            },
        ))
    }

    pub fn is_column_pool_exhaustion_policy_violation(&self) -> bool {
        matches!(
            self.kind(),
            super::ErrorKind::ColumnPoolExhaustionPolicyViolation(_)
        )
    }
}
