use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KindOfQuantity {
    pub name: String,
    pub label: Option<String>,
    pub description: Option<String>,

    /// Unit values are stored in. Immutable once persisted.
    pub persistence_unit: String,

    pub relative_error: f64,

    pub presentation_formats: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyCategory {
    pub name: String,
    pub label: Option<String>,
    pub description: Option<String>,
    pub priority: i32,
}
