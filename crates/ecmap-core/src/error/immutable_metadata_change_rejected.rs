use super::Error;

/// Error when mapping custom attributes are added, removed or edited after
/// first import.
#[derive(Debug)]
pub(super) struct ImmutableMetadataChangeRejected {
    container: Box<str>,
    message: Box<str>,
}

impl std::error::Error for ImmutableMetadataChangeRejected {}

impl core::fmt::Display for ImmutableMetadataChangeRejected {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "ECSchema upgrade failed. {}: {}",
            self.container, self.message
        )
    }
}

impl Error {
    pub fn immutable_metadata_change_rejected(
        container: impl Into<String>,
        message: impl Into<String>,
    ) -> Error {
        Error::from(super::ErrorKind::ImmutableMetadataChangeRejected(
            ImmutableMetadataChangeRejected {
                container: container.into().into(),
                message: message.into().into(),
            },
        ))
    }

    pub fn is_immutable_metadata_change_rejected(&self) -> bool {
        matches!(
            self.kind(),
            super::ErrorKind::ImmutableMetadataChangeRejected(_)
        )
    }
}
