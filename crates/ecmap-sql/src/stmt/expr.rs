use super::{Select, Value};

use ecmap_core::schema::db::ColumnId;

/// A scalar or boolean expression in a `WHERE` clause or `SET` assignment.
#[derive(Debug, Clone)]
pub enum Expr {
    Column(ColumnId),
    Value(Value),
    BinaryOp {
        lhs: Box<Expr>,
        op: BinaryOp,
        rhs: Box<Expr>,
    },
    And(Vec<Expr>),
    Or(Vec<Expr>),
    IsNull(Box<Expr>),
    IsNotNull(Box<Expr>),
    InList {
        expr: Box<Expr>,
        list: Vec<Expr>,
    },
    InSubquery {
        expr: Box<Expr>,
        query: Box<Select>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Ne,
}

impl Expr {
    pub fn column(id: ColumnId) -> Expr {
        Expr::Column(id)
    }

    pub fn value(value: impl Into<Value>) -> Expr {
        Expr::Value(value.into())
    }

    pub fn null() -> Expr {
        Expr::Value(Value::Null)
    }

    pub fn eq(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Expr {
        Expr::BinaryOp {
            lhs: Box::new(lhs.into()),
            op: BinaryOp::Eq,
            rhs: Box::new(rhs.into()),
        }
    }

    pub fn ne(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Expr {
        Expr::BinaryOp {
            lhs: Box::new(lhs.into()),
            op: BinaryOp::Ne,
            rhs: Box::new(rhs.into()),
        }
    }

    /// Conjunction of `operands`. A single operand is returned as is.
    pub fn and(operands: impl IntoIterator<Item = Expr>) -> Expr {
        let mut operands: Vec<_> = operands.into_iter().collect();
        if operands.len() == 1 {
            operands.remove(0)
        } else {
            Expr::And(operands)
        }
    }

    /// Disjunction of `operands`. A single operand is returned as is.
    pub fn or(operands: impl IntoIterator<Item = Expr>) -> Expr {
        let mut operands: Vec<_> = operands.into_iter().collect();
        if operands.len() == 1 {
            operands.remove(0)
        } else {
            Expr::Or(operands)
        }
    }

    pub fn is_null(expr: impl Into<Expr>) -> Expr {
        Expr::IsNull(Box::new(expr.into()))
    }

    pub fn is_not_null(expr: impl Into<Expr>) -> Expr {
        Expr::IsNotNull(Box::new(expr.into()))
    }

    pub fn in_list<T: Into<Value>>(
        expr: impl Into<Expr>,
        list: impl IntoIterator<Item = T>,
    ) -> Expr {
        Expr::InList {
            expr: Box::new(expr.into()),
            list: list.into_iter().map(Expr::value).collect(),
        }
    }

    pub fn in_subquery(expr: impl Into<Expr>, query: Select) -> Expr {
        Expr::InSubquery {
            expr: Box::new(expr.into()),
            query: Box::new(query),
        }
    }
}

impl From<ColumnId> for Expr {
    fn from(value: ColumnId) -> Self {
        Expr::Column(value)
    }
}

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Expr::Value(value)
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        Expr::Value(Value::I64(value))
    }
}
