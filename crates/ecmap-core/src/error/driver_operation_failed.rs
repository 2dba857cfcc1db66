use super::{Error, ErrorKind};

use std::fmt;

/// The storage library reported a failure that does not map onto an engine
/// error kind: opening the database file, preparing or stepping a statement,
/// or a transaction control statement.
///
/// Constraint failures at step time are reported as constraint violations
/// instead.
#[derive(Debug)]
pub(super) struct DriverOperationFailed {
    pub(super) inner: Box<dyn std::error::Error + Send + Sync>,
}

impl std::error::Error for DriverOperationFailed {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.inner.as_ref())
    }
}

impl fmt::Display for DriverOperationFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "database operation failed: {}", self.inner)?;

        let mut cause = self.inner.source();
        while let Some(err) = cause {
            write!(f, ": {err}")?;
            cause = err.source();
        }

        Ok(())
    }
}

impl Error {
    /// Wraps an error raised by the storage library.
    pub fn driver_operation_failed(err: impl std::error::Error + Send + Sync + 'static) -> Error {
        Error::from(ErrorKind::DriverOperationFailed(DriverOperationFailed {
            inner: Box::new(err),
        }))
    }

    pub fn is_driver_operation_failed(&self) -> bool {
        matches!(self.kind(), ErrorKind::DriverOperationFailed(_))
    }
}
