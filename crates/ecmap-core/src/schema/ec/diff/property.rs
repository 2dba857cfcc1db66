use super::{ChangeKind, ChangeState, Changes, Container, DiffContext};
use crate::schema::ec::{Class, Property, PropertyKind, QualifiedName, ValueType};

pub(super) fn diff_properties(
    cx: &DiffContext<'_, '_>,
    changes: &mut Changes,
    class: &QualifiedName,
    from: &Class,
    to: &Class,
) {
    for next in &to.properties {
        let container = Container::Property {
            class: class.clone(),
            property: next.name.clone(),
        };

        match from.property(&next.name) {
            Some(previous) => diff_property(cx, changes, &container, previous, next),
            None => changes.push(&container, ChangeKind::Added, ChangeState::Added),
        }
    }

    for previous in &from.properties {
        if to.property(&previous.name).is_none() {
            let container = Container::Property {
                class: class.clone(),
                property: previous.name.clone(),
            };
            changes.push(&container, ChangeKind::Deleted, ChangeState::Deleted);
        }
    }
}

fn diff_property(
    cx: &DiffContext<'_, '_>,
    changes: &mut Changes,
    container: &Container,
    from: &Property,
    to: &Property,
) {
    changes.metadata(container, ChangeKind::Label, &from.label, &to.label);
    changes.metadata(container, ChangeKind::Description, &from.description, &to.description);
    changes.metadata(container, ChangeKind::ReadOnly, from.read_only, to.read_only);
    changes.metadata(
        container,
        ChangeKind::KindOfQuantity,
        &from.kind_of_quantity,
        &to.kind_of_quantity,
    );
    changes.metadata(container, ChangeKind::Category, &from.category, &to.category);
    changes.metadata(container, ChangeKind::ExtendedType, &from.extended_type, &to.extended_type);

    match (&from.kind, &to.kind) {
        (PropertyKind::Primitive(a), PropertyKind::Primitive(b)) => {
            diff_value_type(cx, changes, container, a, b);
        }
        (
            PropertyKind::PrimitiveArray { ty: a, occurs: oa },
            PropertyKind::PrimitiveArray { ty: b, occurs: ob },
        ) => {
            diff_value_type(cx, changes, container, a, b);
            changes.structural(container, ChangeKind::Occurs, oa, ob);
        }
        (PropertyKind::Struct(a), PropertyKind::Struct(b)) => {
            changes.structural(container, ChangeKind::StructType, a, b);
        }
        (
            PropertyKind::StructArray { ty: a, occurs: oa },
            PropertyKind::StructArray { ty: b, occurs: ob },
        ) => {
            changes.structural(container, ChangeKind::StructType, a, b);
            changes.structural(container, ChangeKind::Occurs, oa, ob);
        }
        (PropertyKind::Navigation { .. }, PropertyKind::Navigation { .. }) => {
            changes.structural(container, ChangeKind::Navigation, &from.kind, &to.kind);
        }
        _ => changes.push(container, ChangeKind::PropertyKind, ChangeState::StructurallyChanged),
    }

    changes.structural(container, ChangeKind::PropertyMap, &from.map, &to.map);
    changes.custom_attributes(container, &from.custom_attributes, &to.custom_attributes);
}

fn diff_value_type(
    cx: &DiffContext<'_, '_>,
    changes: &mut Changes,
    container: &Container,
    from: &ValueType,
    to: &ValueType,
) {
    if from == to {
        return;
    }

    let state = if is_enumeration_swap(cx, from, to) {
        ChangeState::MetadataChanged
    } else {
        ChangeState::StructurallyChanged
    };
    changes.push(container, ChangeKind::ValueType, state);
}

/// A primitive may be swapped with a non-strict enumeration backed by the
/// same primitive type, in either direction.
fn is_enumeration_swap(cx: &DiffContext<'_, '_>, from: &ValueType, to: &ValueType) -> bool {
    match (from, to) {
        (ValueType::Primitive(primitive), ValueType::Enumeration(name)) => cx
            .next()
            .enumeration(name)
            .is_some_and(|e| !e.is_strict && e.backing_type == *primitive),
        (ValueType::Enumeration(name), ValueType::Primitive(primitive)) => cx
            .previous()
            .enumeration(name)
            .is_some_and(|e| !e.is_strict && e.backing_type == *primitive),
        _ => false,
    }
}
