mod class;
mod property;

use super::{
    CustomAttribute, End, Enumeration, KindOfQuantity, Modifier, PropertyCategory,
    QualifiedName, Schema, SchemaSet, Version,
};

use std::fmt;

/// Classified differences between the persisted revision of a schema and an
/// incoming one.
///
/// Changes are listed in a fixed order: schema-level items, enumerations,
/// kinds of quantity, property categories, then classes in incoming order
/// followed by deleted classes. Within a class, class-level changes come
/// before relationship constraints, properties and custom attributes.
#[derive(Debug, Clone)]
pub struct SchemaDiff {
    /// Name of the schema.
    pub schema: String,

    /// Persisted version, `None` on first import.
    pub previous_version: Option<Version>,

    /// Incoming version.
    pub version: Version,

    pub changes: Vec<Change>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub container: Container,
    pub kind: ChangeKind,
    pub state: ChangeState,
}

/// The schema element a change applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Container {
    Schema(String),
    Class(QualifiedName),
    Property {
        class: QualifiedName,
        property: String,
    },
    Constraint {
        relationship: QualifiedName,
        end: End,
    },
    CustomAttribute {
        owner: Box<Container>,
        class: QualifiedName,
    },
    Enumeration(QualifiedName),
    Enumerator {
        enumeration: QualifiedName,
        name: String,
    },
    KindOfQuantity(QualifiedName),
    PropertyCategory(QualifiedName),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeState {
    Unchanged,

    /// Label, description and other descriptive metadata. Always legal.
    MetadataChanged,

    Added,
    Deleted,

    /// An attribute that is immutable by policy changed.
    StructurallyChanged,
}

/// What changed about a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Deleted,

    Label,
    Description,
    Alias,
    References,

    // Classes
    Flavor,
    BaseClasses,
    Modifier { from: Modifier, to: Modifier },
    MapDirectives,
    SharedColumnCount,

    // Relationships
    Strength,
    StrengthDirection,
    Multiplicity,
    ConstraintPolymorphism,
    ConstraintClasses,
    AbstractConstraint,
    RoleLabel,

    // Properties
    PropertyKind,
    ValueType,
    StructType,
    Occurs,
    Navigation,
    PropertyMap,
    ReadOnly,
    KindOfQuantity,
    Category,
    ExtendedType,

    CustomAttributeValues,

    // Enumerations
    BackingType,
    IsStrict { from: bool, to: bool },
    EnumeratorValue,

    // Kinds of quantity and categories
    PersistenceUnit,
    RelativeError,
    PresentationFormats,
    Priority,
}

/// The schema sets being compared. Needed to resolve enumerations when
/// classifying type changes.
pub struct DiffContext<'a, 'b> {
    previous: &'b SchemaSet<'a>,
    next: &'b SchemaSet<'a>,
}

impl<'a, 'b> DiffContext<'a, 'b> {
    pub fn new(previous: &'b SchemaSet<'a>, next: &'b SchemaSet<'a>) -> Self {
        Self { previous, next }
    }

    pub fn previous(&self) -> &'b SchemaSet<'a> {
        self.previous
    }

    pub fn next(&self) -> &'b SchemaSet<'a> {
        self.next
    }
}

pub(crate) struct Changes {
    items: Vec<Change>,
}

impl Changes {
    fn push(&mut self, container: &Container, kind: ChangeKind, state: ChangeState) {
        self.items.push(Change {
            container: container.clone(),
            kind,
            state,
        });
    }

    fn metadata<T: PartialEq>(&mut self, container: &Container, kind: ChangeKind, from: T, to: T) {
        if from != to {
            self.push(container, kind, ChangeState::MetadataChanged);
        }
    }

    fn structural<T: PartialEq>(
        &mut self,
        container: &Container,
        kind: ChangeKind,
        from: T,
        to: T,
    ) {
        if from != to {
            self.push(container, kind, ChangeState::StructurallyChanged);
        }
    }

    fn custom_attributes(
        &mut self,
        owner: &Container,
        from: &[CustomAttribute],
        to: &[CustomAttribute],
    ) {
        for custom_attribute in to {
            let container = Container::CustomAttribute {
                owner: Box::new(owner.clone()),
                class: custom_attribute.class.clone(),
            };

            match from.iter().find(|c| c.class == custom_attribute.class) {
                Some(previous) => self.metadata(
                    &container,
                    ChangeKind::CustomAttributeValues,
                    &previous.values,
                    &custom_attribute.values,
                ),
                None => self.push(&container, ChangeKind::Added, ChangeState::Added),
            }
        }

        for custom_attribute in from {
            if !to.iter().any(|c| c.class == custom_attribute.class) {
                let container = Container::CustomAttribute {
                    owner: Box::new(owner.clone()),
                    class: custom_attribute.class.clone(),
                };
                self.push(&container, ChangeKind::Deleted, ChangeState::Deleted);
            }
        }
    }
}

impl SchemaDiff {
    /// Compares `from` (the persisted revision, if any) with `to`.
    pub fn from(cx: &DiffContext<'_, '_>, from: Option<&Schema>, to: &Schema) -> SchemaDiff {
        let mut changes = Changes { items: vec![] };

        let Some(from) = from else {
            // First import: everything is new.
            for class in &to.classes {
                changes.push(
                    &Container::Class(to.qualify(&class.name)),
                    ChangeKind::Added,
                    ChangeState::Added,
                );
            }

            return SchemaDiff {
                schema: to.name.clone(),
                previous_version: None,
                version: to.version,
                changes: changes.items,
            };
        };

        let container = Container::Schema(to.name.clone());
        changes.metadata(&container, ChangeKind::Label, &from.label, &to.label);
        changes.metadata(&container, ChangeKind::Description, &from.description, &to.description);
        changes.metadata(&container, ChangeKind::Alias, &from.alias, &to.alias);
        changes.metadata(&container, ChangeKind::References, &from.references, &to.references);
        changes.custom_attributes(&container, &from.custom_attributes, &to.custom_attributes);

        diff_enumerations(&mut changes, from, to);
        diff_kinds_of_quantity(&mut changes, from, to);
        diff_property_categories(&mut changes, from, to);
        class::diff_classes(cx, &mut changes, from, to);

        SchemaDiff {
            schema: to.name.clone(),
            previous_version: Some(from.version),
            version: to.version,
            changes: changes.items,
        }
    }

    pub fn is_first_import(&self) -> bool {
        self.previous_version.is_none()
    }

    /// True when the incoming schema is identical to the persisted one.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && Some(self.version) == self.previous_version
    }

    /// True when any change requires a major version increase.
    pub fn has_structural_changes(&self) -> bool {
        self.changes.iter().any(Change::is_structural)
    }

    pub fn changes(&self) -> impl ExactSizeIterator<Item = &Change> + '_ {
        self.changes.iter()
    }
}

impl Change {
    pub fn is_structural(&self) -> bool {
        matches!(
            self.state,
            ChangeState::Added | ChangeState::Deleted | ChangeState::StructurallyChanged
        )
    }
}

fn diff_enumerations(changes: &mut Changes, from: &Schema, to: &Schema) {
    for next in &to.enumerations {
        let name = to.qualify(&next.name);
        let container = Container::Enumeration(name.clone());

        let Some(previous) = from.enumeration(&next.name) else {
            changes.push(&container, ChangeKind::Added, ChangeState::Added);
            continue;
        };

        diff_enumeration(changes, &container, &name, previous, next);
    }

    for previous in &from.enumerations {
        if to.enumeration(&previous.name).is_none() {
            changes.push(
                &Container::Enumeration(from.qualify(&previous.name)),
                ChangeKind::Deleted,
                ChangeState::Deleted,
            );
        }
    }
}

fn diff_enumeration(
    changes: &mut Changes,
    container: &Container,
    name: &QualifiedName,
    from: &Enumeration,
    to: &Enumeration,
) {
    changes.metadata(container, ChangeKind::Label, &from.label, &to.label);
    changes.metadata(container, ChangeKind::Description, &from.description, &to.description);
    changes.structural(container, ChangeKind::BackingType, from.backing_type, to.backing_type);
    changes.structural(
        container,
        ChangeKind::IsStrict {
            from: from.is_strict,
            to: to.is_strict,
        },
        from.is_strict,
        to.is_strict,
    );

    for enumerator in &to.enumerators {
        let container = Container::Enumerator {
            enumeration: name.clone(),
            name: enumerator.name.clone(),
        };

        let Some(previous) = from.enumerator(&enumerator.name) else {
            changes.push(&container, ChangeKind::Added, ChangeState::Added);
            continue;
        };

        changes.metadata(&container, ChangeKind::Label, &previous.label, &enumerator.label);
        changes.metadata(
            &container,
            ChangeKind::Description,
            &previous.description,
            &enumerator.description,
        );
        changes.structural(
            &container,
            ChangeKind::EnumeratorValue,
            &previous.value,
            &enumerator.value,
        );
    }

    for enumerator in &from.enumerators {
        if to.enumerator(&enumerator.name).is_none() {
            let container = Container::Enumerator {
                enumeration: name.clone(),
                name: enumerator.name.clone(),
            };
            changes.push(&container, ChangeKind::Deleted, ChangeState::Deleted);
        }
    }
}

fn diff_kinds_of_quantity(changes: &mut Changes, from: &Schema, to: &Schema) {
    for next in &to.kinds_of_quantity {
        let container = Container::KindOfQuantity(to.qualify(&next.name));

        let Some(previous) = from.kind_of_quantity(&next.name) else {
            changes.push(&container, ChangeKind::Added, ChangeState::Added);
            continue;
        };

        diff_kind_of_quantity(changes, &container, previous, next);
    }

    for previous in &from.kinds_of_quantity {
        if to.kind_of_quantity(&previous.name).is_none() {
            changes.push(
                &Container::KindOfQuantity(from.qualify(&previous.name)),
                ChangeKind::Deleted,
                ChangeState::Deleted,
            );
        }
    }
}

fn diff_kind_of_quantity(
    changes: &mut Changes,
    container: &Container,
    from: &KindOfQuantity,
    to: &KindOfQuantity,
) {
    changes.metadata(container, ChangeKind::Label, &from.label, &to.label);
    changes.metadata(container, ChangeKind::Description, &from.description, &to.description);
    changes.structural(
        container,
        ChangeKind::PersistenceUnit,
        &from.persistence_unit,
        &to.persistence_unit,
    );
    changes.metadata(container, ChangeKind::RelativeError, from.relative_error, to.relative_error);
    changes.metadata(
        container,
        ChangeKind::PresentationFormats,
        &from.presentation_formats,
        &to.presentation_formats,
    );
}

fn diff_property_categories(changes: &mut Changes, from: &Schema, to: &Schema) {
    for next in &to.property_categories {
        let container = Container::PropertyCategory(to.qualify(&next.name));

        let Some(previous) = from.property_category(&next.name) else {
            changes.push(&container, ChangeKind::Added, ChangeState::Added);
            continue;
        };

        diff_property_category(changes, &container, previous, next);
    }

    for previous in &from.property_categories {
        if to.property_category(&previous.name).is_none() {
            changes.push(
                &Container::PropertyCategory(from.qualify(&previous.name)),
                ChangeKind::Deleted,
                ChangeState::Deleted,
            );
        }
    }
}

fn diff_property_category(
    changes: &mut Changes,
    container: &Container,
    from: &PropertyCategory,
    to: &PropertyCategory,
) {
    changes.metadata(container, ChangeKind::Label, &from.label, &to.label);
    changes.metadata(container, ChangeKind::Description, &from.description, &to.description);
    changes.metadata(container, ChangeKind::Priority, from.priority, to.priority);
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Container::Schema(name) => write!(f, "ECSchema {name}"),
            Container::Class(name) => write!(f, "ECClass {name}"),
            Container::Property { class, property } => write!(f, "ECProperty {class}.{property}"),
            Container::Constraint { relationship, end } => {
                write!(f, "ECRelationshipConstraint {relationship}.{end}")
            }
            Container::CustomAttribute { owner, class } => {
                write!(f, "ECCustomAttribute {class} on {owner}")
            }
            Container::Enumeration(name) => write!(f, "ECEnumeration {name}"),
            Container::Enumerator { enumeration, name } => {
                write!(f, "ECEnumerator {enumeration}.{name}")
            }
            Container::KindOfQuantity(name) => write!(f, "KindOfQuantity {name}"),
            Container::PropertyCategory(name) => write!(f, "PropertyCategory {name}"),
        }
    }
}

impl fmt::Display for ChangeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?} ({})", self.container, self.kind, self.state)
    }
}
