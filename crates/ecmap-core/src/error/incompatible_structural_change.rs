use super::Error;

/// Error when an incoming schema changes something that is immutable once
/// persisted: a property type, a class flavor, a base class, the shape of a
/// relationship, and so on.
#[derive(Debug)]
pub(super) struct IncompatibleStructuralChange {
    container: Box<str>,
    message: Box<str>,
}

impl std::error::Error for IncompatibleStructuralChange {}

impl core::fmt::Display for IncompatibleStructuralChange {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "ECSchema upgrade failed. {}: {}",
            self.container, self.message
        )
    }
}

impl Error {
    /// Creates an incompatible structural change error.
    ///
    /// `container` identifies the schema element, e.g. `ECClass ts:Foo`.
    pub fn incompatible_structural_change(
        container: impl Into<String>,
        message: impl Into<String>,
    ) -> Error {
        Error::from(super::ErrorKind::IncompatibleStructuralChange(
            IncompatibleStructuralChange {
                container: container.into().into(),
                message: message.into().into(),
            },
        ))
    }

    /// Returns `true` if this error is an incompatible structural change error.
    pub fn is_incompatible_structural_change(&self) -> bool {
        matches!(
            self.kind(),
            super::ErrorKind::IncompatibleStructuralChange(_)
        )
    }
}
