use crate::{schema::ec::PrimitiveType, stmt};

use serde::{Deserialize, Serialize};

use std::fmt;

/// Storage type of a column, as declared in `CREATE TABLE`.
///
/// SQLite uses type affinity, so only the four affinity types are needed.
/// Shared columns carry no declared type at all (see
/// [`Column::storage_ty`](super::Column::storage_ty)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Integer,
    Real,
    Text,
    Blob,
}

impl Type {
    /// Storage type of a single-column primitive. Points are stored as one
    /// `Real` column per coordinate.
    pub fn from_primitive(ty: PrimitiveType) -> Type {
        match ty {
            PrimitiveType::Boolean | PrimitiveType::Integer | PrimitiveType::Long => Type::Integer,
            PrimitiveType::Double
            | PrimitiveType::DateTime
            | PrimitiveType::Point2d
            | PrimitiveType::Point3d => Type::Real,
            PrimitiveType::String => Type::Text,
            PrimitiveType::Binary | PrimitiveType::IGeometry => Type::Blob,
        }
    }

    /// The type values of this column decode as.
    pub fn stmt_type(self) -> stmt::Type {
        match self {
            Type::Integer => stmt::Type::I64,
            Type::Real => stmt::Type::F64,
            Type::Text => stmt::Type::String,
            Type::Blob => stmt::Type::Bytes,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Type::Integer => "INTEGER",
            Type::Real => "REAL",
            Type::Text => "TEXT",
            Type::Blob => "BLOB",
        })
    }
}
