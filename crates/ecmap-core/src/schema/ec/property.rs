use super::{CustomAttribute, PropertyMapDirectives, QualifiedName, StrengthDirection};

use serde::{Deserialize, Serialize};

use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,

    pub label: Option<String>,

    pub description: Option<String>,

    /// Kind and type. Immutable once persisted, except for swapping a
    /// primitive type with a non-strict enumeration of the same backing type.
    pub kind: PropertyKind,

    pub read_only: bool,

    pub kind_of_quantity: Option<QualifiedName>,

    pub category: Option<QualifiedName>,

    pub extended_type: Option<String>,

    pub map: PropertyMapDirectives,

    pub custom_attributes: Vec<CustomAttribute>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyKind {
    Primitive(ValueType),
    PrimitiveArray { ty: ValueType, occurs: Occurs },
    Struct(QualifiedName),
    StructArray { ty: QualifiedName, occurs: Occurs },
    Navigation {
        relationship: QualifiedName,
        direction: StrengthDirection,
    },
}

/// Type of a primitive (or primitive array) property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Primitive(PrimitiveType),
    Enumeration(QualifiedName),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    Binary,
    Boolean,
    DateTime,
    Double,
    Integer,
    Long,
    Point2d,
    Point3d,
    String,
    IGeometry,
}

/// Bounds on the number of array elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurs {
    pub min: u32,
    pub max: Option<u32>,
}

impl Property {
    pub fn new(name: impl Into<String>, kind: PropertyKind) -> Self {
        Self {
            name: name.into(),
            label: None,
            description: None,
            kind,
            read_only: false,
            kind_of_quantity: None,
            category: None,
            extended_type: None,
            map: PropertyMapDirectives::default(),
            custom_attributes: vec![],
        }
    }

    pub fn is_navigation(&self) -> bool {
        matches!(self.kind, PropertyKind::Navigation { .. })
    }
}

impl PropertyKind {
    /// Name of the kind, without type information.
    pub fn kind_name(&self) -> &'static str {
        match self {
            PropertyKind::Primitive(_) => "PrimitiveProperty",
            PropertyKind::PrimitiveArray { .. } => "PrimitiveArrayProperty",
            PropertyKind::Struct(_) => "StructProperty",
            PropertyKind::StructArray { .. } => "StructArrayProperty",
            PropertyKind::Navigation { .. } => "NavigationProperty",
        }
    }

    pub fn same_kind(&self, other: &PropertyKind) -> bool {
        core::mem::discriminant(self) == core::mem::discriminant(other)
    }
}

impl PrimitiveType {
    /// Number of columns a value of this type occupies.
    pub fn column_count(self) -> usize {
        match self {
            PrimitiveType::Point2d => 2,
            PrimitiveType::Point3d => 3,
            _ => 1,
        }
    }
}

impl Occurs {
    pub const UNBOUNDED: Occurs = Occurs { min: 0, max: None };
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PrimitiveType::Binary => "binary",
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::DateTime => "dateTime",
            PrimitiveType::Double => "double",
            PrimitiveType::Integer => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Point2d => "point2d",
            PrimitiveType::Point3d => "point3d",
            PrimitiveType::String => "string",
            PrimitiveType::IGeometry => "Bentley.Geometry.Common.IGeometry",
        })
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Primitive(ty) => fmt::Display::fmt(ty, f),
            ValueType::Enumeration(name) => fmt::Display::fmt(name, f),
        }
    }
}
