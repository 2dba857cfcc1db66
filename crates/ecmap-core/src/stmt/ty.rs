use serde::{Deserialize, Serialize};

/// The type a driver decodes a returned column as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Bool,
    I64,
    F64,
    String,
    Bytes,

    /// Decode using the storage class of the stored value. Used for shared
    /// columns, which carry no declared type.
    Any,
}
