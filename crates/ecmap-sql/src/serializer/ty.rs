use super::{Params, ToSql};

use ecmap_core::schema::db;

impl ToSql for db::Type {
    fn to_sql<T: Params>(self, f: &mut super::Formatter<'_, T>) {
        fmt!(
            f,
            match self {
                db::Type::Integer => "INTEGER",
                db::Type::Real => "REAL",
                db::Type::Text => "TEXT",
                db::Type::Blob => "BLOB",
            }
        );
    }
}
