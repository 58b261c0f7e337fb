//! SQL abstract syntax tree.

use crate::catalog::types::DataType;

/// Literal values as written in the statement. Numeric literals keep
/// their source text and are reparsed against the target type when
/// evaluated.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Boolean(bool),
    Integer(String),
    Double(String),
    Str(String),
}

impl Literal {
    /// Render the literal the way the statement logs print it.
    pub fn describe(&self) -> String {
        match self {
            Literal::Null => "NULL".to_string(),
            Literal::Boolean(true) => "TRUE".to_string(),
            Literal::Boolean(false) => "FALSE".to_string(),
            Literal::Integer(text) | Literal::Double(text) => text.clone(),
            Literal::Str(text) => text.clone(),
        }
    }
}

/// Possibly-qualified column reference.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub column: String,
}

impl ColumnRef {
    pub fn describe(&self) -> String {
        match &self.table {
            Some(table) => format!("{table}.{}", self.column),
            None => self.column.clone(),
        }
    }
}

/// Comparison and logical operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

impl BinaryOp {
    pub fn describe(self) -> &'static str {
        match self {
            BinaryOp::Eq => "=",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
        }
    }
}

/// WHERE / SET expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Column(ColumnRef),
    Not(Box<Expr>),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    NullTest {
        expr: Box<Expr>,
        negated: bool,
    },
}

impl Expr {
    /// Render the expression back to text for statement logs.
    pub fn describe(&self) -> String {
        match self {
            Expr::Literal(literal) => literal.describe(),
            Expr::Column(column) => column.describe(),
            Expr::Not(inner) => format!("NOT ({})", inner.describe()),
            Expr::Binary { op, left, right } => {
                format!("({} {} {})", left.describe(), op.describe(), right.describe())
            }
            Expr::NullTest { expr, negated } => {
                let suffix = if *negated { " IS NOT NULL" } else { " IS NULL" };
                format!("{}{suffix}", expr.describe())
            }
        }
    }
}

/// One column declaration inside CREATE TABLE.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDecl {
    pub name: String,
    pub data_type: DataType,
    /// VARCHAR(n) length; 0 for everything else.
    pub length: u32,
    pub not_null: bool,
    pub primary_key: bool,
    pub unique: bool,
    pub default_literal: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStatement {
    pub table_name: String,
    pub columns: Vec<ColumnDecl>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropTableStatement {
    pub table_name: String,
    pub if_exists: bool,
    pub cascade: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub table_name: String,
    /// Empty means declaration order.
    pub column_names: Vec<String>,
    pub rows: Vec<Vec<Literal>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    Star,
    Column(ColumnRef),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub table_name: String,
    pub items: Vec<SelectItem>,
    pub where_clause: Option<Expr>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column_name: String,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    pub table_name: String,
    pub assignments: Vec<Assignment>,
    pub where_clause: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    pub table_name: String,
    pub where_clause: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TruncateStatement {
    pub table_name: String,
}

/// Any parsed statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    CreateTable(CreateTableStatement),
    DropTable(DropTableStatement),
    Insert(InsertStatement),
    Select(SelectStatement),
    Update(UpdateStatement),
    Delete(DeleteStatement),
    Truncate(TruncateStatement),
}
