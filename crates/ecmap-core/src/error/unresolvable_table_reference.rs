use super::Error;

/// Error when an `ExistingTable` strategy names a table that does not
/// physically exist.
#[derive(Debug)]
pub(super) struct UnresolvableTableReference {
    class: Box<str>,
    table: Box<str>,
}

impl std::error::Error for UnresolvableTableReference {}

impl core::fmt::Display for UnresolvableTableReference {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "illegal map strategy on ECClass {}: MapStrategy ExistingTable expects table specified by TableName to preexist (TableName: {})",
            self.class, self.table
        )
    }
}

impl Error {
    /// Creates an unresolvable table reference error.
    pub fn unresolvable_table_reference(
        class: impl Into<String>,
        table: impl Into<String>,
    ) -> Error {
        Error::from(super::ErrorKind::UnresolvableTableReference(
            UnresolvableTableReference {
                class: class.into().into(),
                table: table.into().into(),
            },
        ))
    }

    /// Returns `true` if this error is an unresolvable table reference error.
    pub fn is_unresolvable_table_reference(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::UnresolvableTableReference(_))
    }
}
