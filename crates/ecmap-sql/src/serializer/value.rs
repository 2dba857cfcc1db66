use super::{Params, ToSql};

use crate::stmt::Value;

impl ToSql for &Value {
    fn to_sql<T: Params>(self, f: &mut super::Formatter<'_, T>) {
        match self {
            Value::Null => fmt!(f, "NULL"),
            value => {
                let placeholder = f.params.push(value);
                fmt!(f, placeholder);
            }
        }
    }
}
