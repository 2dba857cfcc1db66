use super::Operation;

/// Describes a physical table.
///
/// The response is a row set with one record per column: the column name
/// (`String`) and its declared type (`String`, empty when undeclared). A table
/// that does not exist yields an empty row set.
#[derive(Debug, Clone)]
pub struct DescribeTable {
    pub name: String,
}

/// One column of a described table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumnInfo {
    pub name: String,
    pub declared_type: String,
}

impl From<DescribeTable> for Operation {
    fn from(value: DescribeTable) -> Self {
        Self::DescribeTable(value)
    }
}
