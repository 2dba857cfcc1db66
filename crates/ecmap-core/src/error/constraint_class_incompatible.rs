use super::Error;

/// Error when a deleted class is still named as a constraint class by a
/// relationship that survives the import.
///
/// Deleting a class that only implements an abstract or polymorphic
/// constraint is not an error; its relationship instances are removed
/// instead.
#[derive(Debug)]
pub(super) struct ConstraintClassIncompatible {
    container: Box<str>,
    message: Box<str>,
}

impl std::error::Error for ConstraintClassIncompatible {}

impl core::fmt::Display for ConstraintClassIncompatible {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "ECSchema upgrade failed. {}: {}",
            self.container, self.message
        )
    }
}

impl Error {
    pub fn constraint_class_incompatible(
        container: impl Into<String>,
        message: impl Into<String>,
    ) -> Error {
        Error::from(super::ErrorKind::ConstraintClassIncompatible(
            ConstraintClassIncompatible {
                container: container.into().into(),
                message: message.into().into(),
            },
        ))
    }

    pub fn is_constraint_class_incompatible(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::ConstraintClassIncompatible(_))
    }
}
