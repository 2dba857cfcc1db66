mod adhoc;
mod column_pool_exhaustion_policy_violation;
mod constraint_class_incompatible;
mod constraint_violation;
mod driver_operation_failed;
mod illegal_strategy_configuration;
mod immutable_metadata_change_rejected;
mod incompatible_structural_change;
mod invalid_schema;
mod invalid_statement;
mod record_not_found;
mod schema_policy_violation;
mod unresolvable_table_reference;
mod version_ordering_violation;

use adhoc::AdhocError;
use column_pool_exhaustion_policy_violation::ColumnPoolExhaustionPolicyViolation;
use constraint_class_incompatible::ConstraintClassIncompatible;
use constraint_violation::ConstraintViolation;
use driver_operation_failed::DriverOperationFailed;
use illegal_strategy_configuration::IllegalStrategyConfiguration;
use immutable_metadata_change_rejected::ImmutableMetadataChangeRejected;
use incompatible_structural_change::IncompatibleStructuralChange;
use invalid_schema::InvalidSchema;
use invalid_statement::InvalidStatement;
use record_not_found::RecordNotFound;
use schema_policy_violation::SchemaPolicyViolation;
use unresolvable_table_reference::UnresolvableTableReference;
use version_ordering_violation::VersionOrderingViolation;

use std::sync::Arc;

/// Returns early with an ad-hoc error built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::Error::from_args(format_args!($($arg)*)))
    };
}

/// Builds an ad-hoc error from a format string.
#[macro_export]
macro_rules! err {
    ($($arg:tt)*) => {
        $crate::Error::from_args(format_args!($($arg)*))
    };
}

/// An error that can occur while mapping, importing or accessing instances.
///
/// The error is a single pointer wide. Errors form a chain through
/// [`Error::context`]; the display output walks the chain from the most
/// recent context down to the root cause.
#[derive(Clone)]
pub struct Error {
    inner: Option<Arc<ErrorInner>>,
}

#[derive(Debug)]
struct ErrorInner {
    kind: ErrorKind,
    cause: Option<Error>,
}

impl Error {
    /// Adds context to this error.
    ///
    /// Context is displayed in reverse order: the most recently added context is shown first,
    /// followed by earlier context, ending with the root cause.
    #[inline(always)]
    pub fn context(self, consequent: impl IntoError) -> Error {
        self.context_impl(consequent.into_error())
    }

    #[inline(never)]
    #[cold]
    fn context_impl(self, consequent: Error) -> Error {
        let kind = match consequent.inner {
            Some(inner) => match Arc::try_unwrap(inner) {
                Ok(inner) => inner.kind,
                Err(shared) => ErrorKind::Adhoc(AdhocError::new(shared.kind.to_string())),
            },
            None => ErrorKind::Unknown,
        };

        Error {
            inner: Some(Arc::new(ErrorInner {
                kind,
                cause: Some(self),
            })),
        }
    }

    /// Returns the innermost error of the chain.
    pub fn root(&self) -> &Error {
        let mut err = self;
        while let Some(cause) = err.inner.as_ref().and_then(|inner| inner.cause.as_ref()) {
            err = cause;
        }
        err
    }

    fn chain(&self) -> impl Iterator<Item = &Error> {
        let mut err = self;
        core::iter::once(err).chain(core::iter::from_fn(move || {
            err = err.inner.as_ref().and_then(|inner| inner.cause.as_ref())?;
            Some(err)
        }))
    }

    fn kind(&self) -> &ErrorKind {
        self.inner
            .as_ref()
            .map(|inner| &inner.kind)
            .unwrap_or(&ErrorKind::Unknown)
    }

    /// Returns `true` if any error in the chain satisfies `f`.
    ///
    /// The `is_*` predicates look at the outermost error only; use this to
    /// classify an error that has been wrapped with context.
    pub fn any(&self, f: impl Fn(&Error) -> bool) -> bool {
        self.chain().any(f)
    }

    /// Returns `true` if this error rejects a schema import.
    ///
    /// Import rejections leave the database untouched.
    pub fn is_import_rejection(&self) -> bool {
        matches!(
            self.root().kind(),
            ErrorKind::InvalidSchema(_)
                | ErrorKind::IllegalStrategyConfiguration(_)
                | ErrorKind::UnresolvableTableReference(_)
                | ErrorKind::IncompatibleStructuralChange(_)
                | ErrorKind::VersionOrderingViolation(_)
                | ErrorKind::ColumnPoolExhaustionPolicyViolation(_)
                | ErrorKind::ConstraintClassIncompatible(_)
                | ErrorKind::ImmutableMetadataChangeRejected(_)
                | ErrorKind::SchemaPolicyViolation(_)
        )
    }

    /// Creates an error from a formatted message.
    pub fn from_args(args: core::fmt::Arguments<'_>) -> Error {
        Error::from(ErrorKind::Adhoc(AdhocError::new(args.to_string())))
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.kind() {
            ErrorKind::DriverOperationFailed(err) => Some(err),
            ErrorKind::Anyhow(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let mut it = self.chain().peekable();
        while let Some(err) = it.next() {
            core::fmt::Display::fmt(err.kind(), f)?;
            if it.peek().is_some() {
                f.write_str(": ")?;
            }
        }
        Ok(())
    }
}

impl core::fmt::Debug for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        if !f.alternate() {
            core::fmt::Display::fmt(self, f)
        } else {
            let Some(ref inner) = self.inner else {
                return f.debug_struct("Error").field("kind", &"None").finish();
            };
            f.debug_struct("Error")
                .field("kind", &inner.kind)
                .field("cause", &inner.cause)
                .finish()
        }
    }
}

#[derive(Debug)]
enum ErrorKind {
    Anyhow(anyhow::Error),
    Adhoc(AdhocError),
    ColumnPoolExhaustionPolicyViolation(ColumnPoolExhaustionPolicyViolation),
    ConstraintClassIncompatible(ConstraintClassIncompatible),
    ConstraintViolation(ConstraintViolation),
    DriverOperationFailed(DriverOperationFailed),
    IllegalStrategyConfiguration(IllegalStrategyConfiguration),
    ImmutableMetadataChangeRejected(ImmutableMetadataChangeRejected),
    IncompatibleStructuralChange(IncompatibleStructuralChange),
    InvalidSchema(InvalidSchema),
    InvalidStatement(InvalidStatement),
    RecordNotFound(RecordNotFound),
    SchemaPolicyViolation(SchemaPolicyViolation),
    UnresolvableTableReference(UnresolvableTableReference),
    VersionOrderingViolation(VersionOrderingViolation),
    Unknown,
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use self::ErrorKind::*;

        match self {
            Anyhow(err) => core::fmt::Display::fmt(err, f),
            Adhoc(err) => core::fmt::Display::fmt(err, f),
            ColumnPoolExhaustionPolicyViolation(err) => core::fmt::Display::fmt(err, f),
            ConstraintClassIncompatible(err) => core::fmt::Display::fmt(err, f),
            ConstraintViolation(err) => core::fmt::Display::fmt(err, f),
            DriverOperationFailed(err) => core::fmt::Display::fmt(err, f),
            IllegalStrategyConfiguration(err) => core::fmt::Display::fmt(err, f),
            ImmutableMetadataChangeRejected(err) => core::fmt::Display::fmt(err, f),
            IncompatibleStructuralChange(err) => core::fmt::Display::fmt(err, f),
            InvalidSchema(err) => core::fmt::Display::fmt(err, f),
            InvalidStatement(err) => core::fmt::Display::fmt(err, f),
            RecordNotFound(err) => core::fmt::Display::fmt(err, f),
            SchemaPolicyViolation(err) => core::fmt::Display::fmt(err, f),
            UnresolvableTableReference(err) => core::fmt::Display::fmt(err, f),
            VersionOrderingViolation(err) => core::fmt::Display::fmt(err, f),
            Unknown => f.write_str("unknown ecmap error"),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error {
            inner: Some(Arc::new(ErrorInner { kind, cause: None })),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Error {
        Error::from(ErrorKind::Anyhow(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error::from(anyhow::Error::from(err))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::from(anyhow::Error::from(err))
    }
}

/// Trait for types that can be converted into an Error.
pub trait IntoError {
    /// Converts this type into an Error.
    fn into_error(self) -> Error;
}

impl IntoError for Error {
    #[inline(always)]
    fn into_error(self) -> Error {
        self
    }
}

impl IntoError for &str {
    fn into_error(self) -> Error {
        Error::from(ErrorKind::Adhoc(AdhocError::new(self.to_string())))
    }
}

impl IntoError for String {
    fn into_error(self) -> Error {
        Error::from(ErrorKind::Adhoc(AdhocError::new(self)))
    }
}
