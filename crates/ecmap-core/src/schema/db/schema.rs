use super::{Column, ColumnId, Index, IndexId, Table, TableId, TableKind, TablesDiff};

use serde::{Deserialize, Serialize};

/// The physical layout: every table the engine knows about, including
/// existing tables and tables no longer referenced by any class.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub tables: Vec<Table>,
}

impl Schema {
    pub fn column(&self, id: impl Into<ColumnId>) -> &Column {
        let id = id.into();
        &self.table(id.table).columns[id.index]
    }

    // NOTE: this is unlikely to confuse users given the context.
    #[allow(clippy::should_implement_trait)]
    pub fn index(&self, id: IndexId) -> &Index {
        &self.table(id.table).indices[id.index]
    }

    pub fn table(&self, id: impl Into<TableId>) -> &Table {
        &self.tables[id.into().0]
    }

    pub fn table_mut(&mut self, id: impl Into<TableId>) -> &mut Table {
        &mut self.tables[id.into().0]
    }

    pub fn table_by_name(&self, name: &str) -> Option<&Table> {
        self.tables
            .iter()
            .find(|table| table.name.eq_ignore_ascii_case(name))
    }

    /// Appends a new, empty table.
    pub fn push_table(&mut self, name: String, kind: TableKind) -> TableId {
        let id = TableId(self.tables.len());
        self.tables.push(Table::new(id, name, kind));
        id
    }

    /// Returns `name`, or `name_<n>` for the smallest `n` that makes it
    /// unique among table names.
    pub fn unique_table_name(&self, name: &str) -> String {
        if self.table_by_name(name).is_none() {
            return name.to_string();
        }

        (1..)
            .map(|n| format!("{name}_{n}"))
            .find(|candidate| self.table_by_name(candidate).is_none())
            .unwrap_or_else(|| name.to_string())
    }

    pub fn index_name_exists(&self, name: &str) -> bool {
        self.tables
            .iter()
            .any(|table| table.index_by_name(name).is_some())
    }
}

/// Difference between two revisions of the layout.
pub struct SchemaDiff<'a> {
    previous: &'a Schema,
    next: &'a Schema,
    tables: TablesDiff<'a>,
}

impl<'a> SchemaDiff<'a> {
    /// Fails if `to` is not an extension of `from`.
    pub fn from(from: &'a Schema, to: &'a Schema) -> crate::Result<Self> {
        Ok(Self {
            previous: from,
            next: to,
            tables: TablesDiff::from(&from.tables, &to.tables)?,
        })
    }

    pub fn tables(&self) -> &TablesDiff<'a> {
        &self.tables
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn previous(&self) -> &'a Schema {
        self.previous
    }

    pub fn next(&self) -> &'a Schema {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::db::{ColumnKind, TablesDiffItem, Type};

    fn column(name: &str) -> Column {
        Column {
            id: ColumnId {
                table: TableId(0),
                index: 0,
            },
            name: name.to_string(),
            kind: ColumnKind::Dedicated,
            storage_ty: Some(Type::Text),
            nullable: true,
            primary_key: false,
            collation: None,
            references: None,
        }
    }

    #[test]
    fn diff_reports_new_tables_and_columns() {
        let mut from = Schema::default();
        let foo = from.push_table("ts_Foo".to_string(), TableKind::Primary);
        from.table_mut(foo).push_column(column("Id"));

        let mut to = from.clone();
        to.table_mut(foo).push_column(column("S1"));
        to.push_table("ts_Goo".to_string(), TableKind::Primary);

        let diff = SchemaDiff::from(&from, &to).unwrap();
        let items: Vec<_> = diff.tables().iter().collect();
        assert_eq!(items.len(), 2);

        match items[0] {
            TablesDiffItem::AlterTable { columns, .. } => assert_eq!(columns.iter().len(), 1),
            _ => panic!("expected alter table"),
        }
        match items[1] {
            TablesDiffItem::CreateTable(table) => assert_eq!(table.name, "ts_Goo"),
            _ => panic!("expected create table"),
        }
    }

    #[test]
    fn dropping_a_column_is_an_error() {
        let mut from = Schema::default();
        let foo = from.push_table("ts_Foo".to_string(), TableKind::Primary);
        from.table_mut(foo).push_column(column("Id"));

        let mut to = from.clone();
        to.table_mut(foo).columns.clear();

        assert!(SchemaDiff::from(&from, &to).is_err());
        assert!(SchemaDiff::from(&to, &to).unwrap().is_empty());
    }

    #[test]
    fn unique_table_name() {
        let mut schema = Schema::default();
        assert_eq!(schema.unique_table_name("ts_Foo"), "ts_Foo");
        schema.push_table("ts_Foo".to_string(), TableKind::Primary);
        schema.push_table("ts_Foo_1".to_string(), TableKind::Primary);
        assert_eq!(schema.unique_table_name("ts_Foo"), "ts_Foo_2");
    }
}
