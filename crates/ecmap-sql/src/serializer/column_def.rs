use super::{Ident, Params, ToSql};

use crate::stmt;

use ecmap_core::schema::ec::{Collation, ForeignKeyAction};

impl ToSql for &stmt::ColumnDef {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        let name = Ident(&self.name);

        fmt!(f, name);

        if let Some(ty) = self.ty {
            fmt!(f, " " ty);
        }

        if self.primary_key {
            fmt!(f, " PRIMARY KEY");
        }

        if self.not_null {
            fmt!(f, " NOT NULL");
        }

        if let Some(collation) = self.collation {
            let collation = match collation {
                Collation::Binary => "BINARY",
                Collation::NoCase => "NOCASE",
                Collation::RTrim => "RTRIM",
            };
            fmt!(f, " COLLATE " collation);
        }

        if let Some(references) = &self.references {
            fmt!(f, " REFERENCES " Ident(&references.table) "(" Ident(&references.column) ")");

            let on_delete = match references.on_delete {
                ForeignKeyAction::NoAction => None,
                ForeignKeyAction::Cascade => Some(" ON DELETE CASCADE"),
                ForeignKeyAction::SetNull => Some(" ON DELETE SET NULL"),
                ForeignKeyAction::Restrict => Some(" ON DELETE RESTRICT"),
            };
            fmt!(f, on_delete);
        }
    }
}
