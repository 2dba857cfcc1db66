use super::Error;

/// Error when the storage layer rejects a statement at step time because a
/// unique index, foreign key or "already related" condition is violated.
#[derive(Debug)]
pub(super) struct ConstraintViolation {
    message: Box<str>,
}

impl std::error::Error for ConstraintViolation {}

impl core::fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "constraint violation: {}", self.message)
    }
}

impl Error {
    pub fn constraint_violation(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::ConstraintViolation(ConstraintViolation {
            message: message.into().into(),
        }))
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::ConstraintViolation(_))
    }
}
