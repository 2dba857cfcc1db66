mod builder;
pub use builder::{ClassBuilder, EnumerationBuilder, RelationshipBuilder, SchemaBuilder};

mod class;
pub use class::{Class, ClassType, Flavor, Modifier};

mod custom_attribute;
pub use custom_attribute::CustomAttribute;

pub mod diff;
pub use diff::{Change, ChangeKind, ChangeState, Container, SchemaDiff};

mod enumeration;
pub use enumeration::{Enumeration, Enumerator, EnumeratorValue};

mod koq;
pub use koq::{KindOfQuantity, PropertyCategory};

mod map;
pub use map::{
    Collation, DbIndex, ForeignKeyAction, ForeignKeyDirectives, LinkTableDirectives,
    MapDirectives, PropertyMapDirectives, StrategyRequest,
};

mod name;
pub use name::QualifiedName;

mod policy;
pub use policy::{Exceptions, SchemaPolicies};

mod property;
pub use property::{Occurs, PrimitiveType, Property, PropertyKind, ValueType};

mod relationship;
pub use relationship::{Constraint, End, Multiplicity, Relationship, Strength, StrengthDirection};

mod schema;
pub use schema::Schema;

mod schema_set;
pub use schema_set::{ClassEntry, ClassId, SchemaSet};

mod verify;

mod version;
pub use version::Version;
