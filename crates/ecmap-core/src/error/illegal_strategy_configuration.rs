use super::Error;

/// Error when a class's requested map strategy, options, table name or
/// polymorphism flag form an illegal combination.
///
/// Raised by the map strategy resolver. The message is the reason of the
/// first violated rule.
#[derive(Debug)]
pub(super) struct IllegalStrategyConfiguration {
    class: Box<str>,
    message: Box<str>,
}

impl std::error::Error for IllegalStrategyConfiguration {}

impl core::fmt::Display for IllegalStrategyConfiguration {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "illegal map strategy on ECClass {}: {}",
            self.class, self.message
        )
    }
}

impl Error {
    /// Creates an illegal strategy configuration error for `class`.
    pub fn illegal_strategy_configuration(
        class: impl Into<String>,
        message: impl Into<String>,
    ) -> Error {
        Error::from(super::ErrorKind::IllegalStrategyConfiguration(
            IllegalStrategyConfiguration {
                class: class.into().into(),
                message: message.into().into(),
            },
        ))
    }

    /// Returns `true` if this error is an illegal strategy configuration error.
    pub fn is_illegal_strategy_configuration(&self) -> bool {
        matches!(
            self.kind(),
            super::ErrorKind::IllegalStrategyConfiguration(_)
        )
    }
}
