use super::{property, ChangeKind, ChangeState, Changes, Container, DiffContext};
use crate::schema::ec::{Class, Constraint, End, MapDirectives, Relationship, Schema};

pub(super) fn diff_classes(
    cx: &DiffContext<'_, '_>,
    changes: &mut Changes,
    from: &Schema,
    to: &Schema,
) {
    for next in &to.classes {
        let name = to.qualify(&next.name);
        let container = Container::Class(name);

        match from.class(&next.name) {
            Some(previous) => diff_class(cx, changes, &container, previous, next),
            None => changes.push(&container, ChangeKind::Added, ChangeState::Added),
        }
    }

    for previous in &from.classes {
        if to.class(&previous.name).is_none() {
            changes.push(
                &Container::Class(from.qualify(&previous.name)),
                ChangeKind::Deleted,
                ChangeState::Deleted,
            );
        }
    }
}

fn diff_class(
    cx: &DiffContext<'_, '_>,
    changes: &mut Changes,
    container: &Container,
    from: &Class,
    to: &Class,
) {
    let Container::Class(name) = container else {
        return;
    };

    changes.metadata(container, ChangeKind::Label, &from.label, &to.label);
    changes.metadata(container, ChangeKind::Description, &from.description, &to.description);

    if from.class_type() != to.class_type() {
        // Nothing else is comparable once the flavor differs.
        changes.push(container, ChangeKind::Flavor, ChangeState::StructurallyChanged);
        return;
    }

    changes.structural(container, ChangeKind::BaseClasses, &from.base_classes, &to.base_classes);
    changes.structural(
        container,
        ChangeKind::Modifier {
            from: from.modifier,
            to: to.modifier,
        },
        from.modifier,
        to.modifier,
    );
    diff_map_directives(changes, container, &from.map, &to.map);

    if let (Some(previous), Some(next)) = (from.relationship(), to.relationship()) {
        diff_relationship(changes, container, previous, next);

        for end in [End::Source, End::Target] {
            let constraint = Container::Constraint {
                relationship: name.clone(),
                end,
            };
            diff_constraint(changes, &constraint, previous.constraint(end), next.constraint(end));
        }
    }

    property::diff_properties(cx, changes, name, from, to);

    changes.custom_attributes(container, &from.custom_attributes, &to.custom_attributes);
}

fn diff_map_directives(
    changes: &mut Changes,
    container: &Container,
    from: &MapDirectives,
    to: &MapDirectives,
) {
    changes.structural(
        container,
        ChangeKind::SharedColumnCount,
        from.shared_column_count,
        to.shared_column_count,
    );

    let from = MapDirectives {
        shared_column_count: None,
        ..from.clone()
    };
    let to = MapDirectives {
        shared_column_count: None,
        ..to.clone()
    };
    changes.structural(container, ChangeKind::MapDirectives, from, to);
}

fn diff_relationship(
    changes: &mut Changes,
    container: &Container,
    from: &Relationship,
    to: &Relationship,
) {
    changes.structural(container, ChangeKind::Strength, from.strength, to.strength);
    changes.structural(
        container,
        ChangeKind::StrengthDirection,
        from.strength_direction,
        to.strength_direction,
    );
}

fn diff_constraint(
    changes: &mut Changes,
    container: &Container,
    from: &Constraint,
    to: &Constraint,
) {
    changes.structural(container, ChangeKind::Multiplicity, from.multiplicity, to.multiplicity);
    changes.structural(
        container,
        ChangeKind::ConstraintPolymorphism,
        from.polymorphic,
        to.polymorphic,
    );
    changes.structural(container, ChangeKind::ConstraintClasses, &from.classes, &to.classes);
    changes.structural(
        container,
        ChangeKind::AbstractConstraint,
        &from.abstract_constraint,
        &to.abstract_constraint,
    );
    changes.metadata(container, ChangeKind::RoleLabel, &from.role_label, &to.role_label);
}
