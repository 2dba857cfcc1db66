use super::Error;

/// Error when a schema model is invalid on its own.
///
/// This occurs when:
/// - A schema has duplicate class, property or enumeration names
/// - A base class, struct, enumeration or relationship reference does not resolve
/// - A class has more than one base class
/// - A relationship derives from a non-relationship class, or the reverse
///
/// These errors are raised before any diffing or mapping takes place.
#[derive(Debug)]
pub(super) struct InvalidSchema {
    message: Box<str>,
}

impl std::error::Error for InvalidSchema {}

impl core::fmt::Display for InvalidSchema {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid schema: {}", self.message)
    }
}

impl Error {
    /// Creates an invalid schema error.
    pub fn invalid_schema(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InvalidSchema(InvalidSchema {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error is an invalid schema error.
    pub fn is_invalid_schema(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::InvalidSchema(_))
    }
}
