use super::{Comma, Delimited, Params, ToSql};

use crate::stmt::{self, BinaryOp, Expr};

use ecmap_core::schema::db;

impl ToSql for &db::ColumnId {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        let name = f.serializer.column_name(*self);
        fmt!(f, name);
    }
}

impl ToSql for &Expr {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        match self {
            Expr::Column(column) => fmt!(f, column),
            Expr::Value(value) => fmt!(f, value),
            Expr::BinaryOp { lhs, op, rhs } => {
                let op = match op {
                    BinaryOp::Eq => " = ",
                    BinaryOp::Ne => " <> ",
                };
                let (lhs, rhs) = (&**lhs, &**rhs);
                fmt!(f, lhs op rhs);
            }
            Expr::And(operands) if operands.is_empty() => fmt!(f, "1"),
            Expr::And(operands) => fmt!(f, "(" Delimited(operands, " AND ") ")"),
            Expr::Or(operands) if operands.is_empty() => fmt!(f, "0"),
            Expr::Or(operands) => fmt!(f, "(" Delimited(operands, " OR ") ")"),
            Expr::IsNull(expr) => fmt!(f, &**expr " IS NULL"),
            Expr::IsNotNull(expr) => fmt!(f, &**expr " IS NOT NULL"),
            Expr::InList { expr, list } => fmt!(f, &**expr " IN (" Comma(list) ")"),
            Expr::InSubquery { expr, query } => {
                let query = &**query;
                fmt!(f, &**expr " IN (" query ")");
            }
        }
    }
}

impl ToSql for &stmt::Select {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        let table_name = f.serializer.table_name(self.table);

        fmt!(f, "SELECT " Comma(&self.columns) " FROM " table_name);

        if let Some(filter) = &self.filter {
            fmt!(f, " WHERE " filter);
        }

        if let Some(order_by) = &self.order_by {
            fmt!(f, " ORDER BY " order_by);
        }
    }
}
