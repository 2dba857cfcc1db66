use super::{Class, Enumeration, KindOfQuantity, Property, PropertyCategory, QualifiedName, Schema};

use indexmap::IndexMap;

/// A set of schemas visible to one import, with a flattened class table.
///
/// Every class gets a [`ClassId`] (its index in the table) and a `parent`
/// index resolved from its first base class. Hierarchy walks follow the
/// parent index iteratively.
#[derive(Debug)]
pub struct SchemaSet<'a> {
    schemas: IndexMap<&'a str, &'a Schema>,
    classes: Vec<ClassEntry<'a>>,
    lookup: IndexMap<QualifiedName, ClassId>,
}

/// Index of a class in a [`SchemaSet`]. Only meaningful for the set that
/// produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub usize);

#[derive(Debug)]
pub struct ClassEntry<'a> {
    pub id: ClassId,
    pub name: QualifiedName,
    pub schema: &'a Schema,
    pub class: &'a Class,
    pub parent: Option<ClassId>,
}

impl<'a> SchemaSet<'a> {
    /// Builds the set. A later schema replaces an earlier one with the same
    /// name, so candidates are passed after persisted schemas.
    pub fn new(schemas: impl IntoIterator<Item = &'a Schema>) -> SchemaSet<'a> {
        let mut by_name = IndexMap::new();
        for schema in schemas {
            by_name.insert(schema.name.as_str(), schema);
        }

        let mut classes = vec![];
        let mut lookup = IndexMap::new();

        for schema in by_name.values().copied() {
            for class in &schema.classes {
                let id = ClassId(classes.len());
                let name = schema.qualify(&class.name);
                lookup.insert(name.clone(), id);
                classes.push(ClassEntry {
                    id,
                    name,
                    schema,
                    class,
                    parent: None,
                });
            }
        }

        for entry in &mut classes {
            entry.parent = entry
                .class
                .base_class()
                .and_then(|base| lookup.get(base).copied());
        }

        SchemaSet {
            schemas: by_name,
            classes,
            lookup,
        }
    }

    pub fn schemas(&self) -> impl Iterator<Item = &'a Schema> + '_ {
        self.schemas.values().copied()
    }

    pub fn schema(&self, name: &str) -> Option<&'a Schema> {
        self.schemas.get(name).copied()
    }

    pub fn classes(&self) -> impl ExactSizeIterator<Item = &ClassEntry<'a>> + '_ {
        self.classes.iter()
    }

    pub fn class_id(&self, name: &QualifiedName) -> Option<ClassId> {
        self.lookup.get(name).copied()
    }

    pub fn class(&self, name: &QualifiedName) -> Option<&'a Class> {
        self.class_id(name).map(|id| self.classes[id.0].class)
    }

    pub fn entry(&self, id: ClassId) -> &ClassEntry<'a> {
        &self.classes[id.0]
    }

    pub fn name(&self, id: ClassId) -> &QualifiedName {
        &self.classes[id.0].name
    }

    pub fn parent(&self, id: ClassId) -> Option<ClassId> {
        self.classes[id.0].parent
    }

    /// Ancestors of `id`, nearest first. Stops on a cycle.
    pub fn ancestors(&self, id: ClassId) -> Vec<ClassId> {
        let mut ret = vec![];
        let mut cursor = self.parent(id);
        while let Some(ancestor) = cursor {
            if ancestor == id || ret.contains(&ancestor) {
                break;
            }
            ret.push(ancestor);
            cursor = self.parent(ancestor);
        }
        ret
    }

    /// Names from the hierarchy root down to `id`, inclusive.
    pub fn lineage(&self, id: ClassId) -> Vec<QualifiedName> {
        let mut ret: Vec<_> = self
            .ancestors(id)
            .into_iter()
            .rev()
            .map(|ancestor| self.name(ancestor).clone())
            .collect();
        ret.push(self.name(id).clone());
        ret
    }

    pub fn has_cycle(&self, id: ClassId) -> bool {
        let mut seen = vec![id];
        let mut cursor = self.parent(id);
        while let Some(ancestor) = cursor {
            if seen.contains(&ancestor) {
                return true;
            }
            seen.push(ancestor);
            cursor = self.parent(ancestor);
        }
        false
    }

    /// Direct subclasses of `id`, in class table order.
    pub fn derived(&self, id: ClassId) -> Vec<ClassId> {
        self.classes
            .iter()
            .filter(|entry| entry.parent == Some(id) && entry.id != id)
            .map(|entry| entry.id)
            .collect()
    }

    /// All subclasses of `id`, depth first.
    pub fn descendants(&self, id: ClassId) -> Vec<ClassId> {
        let mut ret = vec![];
        let mut stack = self.derived(id);
        stack.reverse();
        while let Some(next) = stack.pop() {
            if ret.contains(&next) {
                continue;
            }
            ret.push(next);
            let mut derived = self.derived(next);
            derived.reverse();
            stack.extend(derived);
        }
        ret
    }

    pub fn is_subclass_of(&self, id: ClassId, base: ClassId) -> bool {
        id == base || self.ancestors(id).contains(&base)
    }

    /// Classes ordered so that every base precedes its subclasses. Ties keep
    /// class table order.
    pub fn hierarchy_order(&self) -> Vec<ClassId> {
        let mut ids: Vec<_> = self.classes.iter().map(|entry| entry.id).collect();
        ids.sort_by_key(|id| (self.ancestors(*id).len(), *id));
        ids
    }

    /// Properties visible on `id`: inherited first, root to leaf, with
    /// overrides replacing the inherited declaration in place. Each property
    /// is paired with the class that declares it.
    pub fn all_properties(&self, id: ClassId) -> IndexMap<&'a str, (&'a Property, ClassId)> {
        let mut chain = self.ancestors(id);
        chain.reverse();
        chain.push(id);

        let mut ret = IndexMap::new();
        for class_id in chain {
            for property in &self.classes[class_id.0].class.properties {
                ret.insert(property.name.as_str(), (property, class_id));
            }
        }
        ret
    }

    /// The nearest ancestor of `id` declaring `property`.
    pub fn overridden(&self, id: ClassId, property: &str) -> Option<ClassId> {
        self.ancestors(id)
            .into_iter()
            .find(|ancestor| self.entry(*ancestor).class.property(property).is_some())
    }

    pub fn enumeration(&self, name: &QualifiedName) -> Option<&'a Enumeration> {
        self.schema(&name.schema)?.enumeration(&name.name)
    }

    pub fn kind_of_quantity(&self, name: &QualifiedName) -> Option<&'a KindOfQuantity> {
        self.schema(&name.schema)?.kind_of_quantity(&name.name)
    }

    pub fn property_category(&self, name: &QualifiedName) -> Option<&'a PropertyCategory> {
        self.schema(&name.schema)?.property_category(&name.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ec::{PrimitiveType, Version};

    fn schema() -> Schema {
        Schema::builder("TestSchema", "ts", Version::new(1, 0, 0))
            .entity("Koo", |c| c.primitive("L1", PrimitiveType::Long))
            .entity("Foo", |c| c.base("Koo").primitive("S1", PrimitiveType::String))
            .entity("Boo", |c| c.base("Koo"))
            .entity("Zoo", |c| c.base("Foo").primitive("L1", PrimitiveType::Long))
            .build()
    }

    #[test]
    fn hierarchy_walks() {
        let schema = schema();
        let set = SchemaSet::new([&schema]);

        let koo = set.class_id(&schema.qualify("Koo")).unwrap();
        let foo = set.class_id(&schema.qualify("Foo")).unwrap();
        let boo = set.class_id(&schema.qualify("Boo")).unwrap();
        let zoo = set.class_id(&schema.qualify("Zoo")).unwrap();

        assert_eq!(set.ancestors(zoo), vec![foo, koo]);
        assert_eq!(set.derived(koo), vec![foo, boo]);
        assert_eq!(set.descendants(koo), vec![foo, zoo, boo]);
        assert_eq!(set.hierarchy_order(), vec![koo, foo, boo, zoo]);
        assert_eq!(
            set.lineage(zoo)
                .iter()
                .map(|name| name.name.as_str())
                .collect::<Vec<_>>(),
            vec!["Koo", "Foo", "Zoo"]
        );
        assert!(set.is_subclass_of(zoo, koo));
        assert!(!set.is_subclass_of(boo, foo));
    }

    #[test]
    fn overrides_replace_inherited_properties() {
        let schema = schema();
        let set = SchemaSet::new([&schema]);
        let zoo = set.class_id(&schema.qualify("Zoo")).unwrap();
        let koo = set.class_id(&schema.qualify("Koo")).unwrap();

        let properties = set.all_properties(zoo);
        assert_eq!(properties.keys().copied().collect::<Vec<_>>(), vec!["L1", "S1"]);
        assert_eq!(properties["L1"].1, zoo);
        assert_eq!(set.overridden(zoo, "L1"), Some(koo));
    }

    #[test]
    fn later_schema_replaces_earlier() {
        let v1 = schema();
        let v2 = Schema::builder("TestSchema", "ts", Version::new(2, 0, 0))
            .entity("Koo", |c| c)
            .build();
        let set = SchemaSet::new([&v1, &v2]);
        assert_eq!(set.classes().len(), 1);
        assert_eq!(set.schema("TestSchema").unwrap().version, Version::new(2, 0, 0));
    }
}
