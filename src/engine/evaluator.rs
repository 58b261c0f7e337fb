//! Expression evaluation over one row.
//!
//! The evaluator is built per statement from a table's column entries.
//! Rows are `Vec<Value>` in declaration order. Predicates evaluate in
//! three-valued logic; scalars (UPDATE right-hand sides) evaluate to a
//! [`Value`].

use std::collections::HashMap;

use super::value::{
    compare, logical_and, logical_not, logical_or, parse_date, CompareResult, TriBool, Value,
};
use crate::catalog::schema::ColumnCatalogEntry;
use crate::catalog::types::DataType;
use crate::error::{Error, Result};
use crate::sql::ast::{BinaryOp, ColumnRef, Expr, Literal};

#[derive(Debug, Clone, Copy)]
struct ColumnBinding {
    index: usize,
    data_type: DataType,
}

/// Evaluates expressions against rows of one table.
pub struct ExpressionEvaluator {
    bindings: HashMap<String, ColumnBinding>,
}

impl ExpressionEvaluator {
    /// Build the lookup from `column` and `table.column` names to
    /// ordinal and declared type.
    pub fn new(columns: &[ColumnCatalogEntry], table_name: &str) -> Self {
        let mut bindings = HashMap::with_capacity(columns.len() * 2);
        for entry in columns {
            let binding = ColumnBinding {
                index: entry.ordinal as usize,
                data_type: entry.column.data_type,
            };
            bindings.insert(entry.column.name.clone(), binding);
            if !table_name.is_empty() {
                bindings.insert(format!("{table_name}.{}", entry.column.name), binding);
            }
        }
        Self { bindings }
    }

    fn lookup(&self, column: &ColumnRef) -> Option<ColumnBinding> {
        if let Some(table) = &column.table {
            if let Some(binding) = self.bindings.get(&format!("{table}.{}", column.column)) {
                return Some(*binding);
            }
        }
        self.bindings.get(&column.column).copied()
    }

    /// Evaluate an UPDATE right-hand side. Only literals and column
    /// references are scalar; logical operators belong in predicates.
    pub fn evaluate_scalar(&self, expr: &Expr, row: &[Value]) -> Result<Value> {
        self.evaluate_value(expr, row, None)
    }

    /// Evaluate a WHERE clause against one row.
    pub fn evaluate_predicate(&self, expr: &Expr, row: &[Value]) -> Result<TriBool> {
        match expr {
            Expr::Literal(literal) => {
                let value = self.literal_to_value(literal, None)?;
                value_to_tribool(&value)
            }
            Expr::Column(_) => {
                let value = self.evaluate_value(expr, row, None)?;
                value_to_tribool(&value)
            }
            Expr::Not(inner) => Ok(logical_not(self.evaluate_predicate(inner, row)?)),
            Expr::Binary { op, left, right } => match op {
                BinaryOp::And => Ok(logical_and(
                    self.evaluate_predicate(left, row)?,
                    self.evaluate_predicate(right, row)?,
                )),
                BinaryOp::Or => Ok(logical_or(
                    self.evaluate_predicate(left, row)?,
                    self.evaluate_predicate(right, row)?,
                )),
                _ => self.evaluate_comparison(*op, left, right, row),
            },
            Expr::NullTest { expr, negated } => {
                let value = self.evaluate_value(expr, row, None)?;
                let is_null = value.is_null();
                Ok(TriBool::from_bool(if *negated { !is_null } else { is_null }))
            }
        }
    }

    fn evaluate_comparison(
        &self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
        row: &[Value],
    ) -> Result<TriBool> {
        let left_binding = match left {
            Expr::Column(column) => self.lookup(column),
            _ => None,
        };
        let right_binding = match right {
            Expr::Column(column) => self.lookup(column),
            _ => None,
        };

        // A literal opposite a column is coerced toward the column's
        // declared type ('2024-05-01' against a DATE column parses as
        // a date, not a string).
        let left_hint = match (left, right_binding) {
            (Expr::Literal(_), Some(binding)) => Some(binding.data_type),
            _ => None,
        };
        let right_hint = match (right, left_binding) {
            (Expr::Literal(_), Some(binding)) => Some(binding.data_type),
            _ => None,
        };

        let mut left_value = self.evaluate_value(left, row, left_hint)?;
        let mut right_value = self.evaluate_value(right, row, right_hint)?;
        if let Some(binding) = left_binding {
            left_value = coerce_to_type(left_value, binding.data_type)?;
        }
        if let Some(binding) = right_binding {
            right_value = coerce_to_type(right_value, binding.data_type)?;
        }

        let cmp = compare(&left_value, &right_value)?;
        if cmp == CompareResult::Unknown {
            return Ok(TriBool::Unknown);
        }

        let result = match op {
            BinaryOp::Eq => cmp == CompareResult::Equal,
            BinaryOp::NotEq => cmp != CompareResult::Equal,
            BinaryOp::Lt => cmp == CompareResult::Less,
            BinaryOp::LtEq => cmp != CompareResult::Greater,
            BinaryOp::Gt => cmp == CompareResult::Greater,
            BinaryOp::GtEq => cmp != CompareResult::Less,
            BinaryOp::And | BinaryOp::Or => unreachable!("handled by evaluate_predicate"),
        };
        Ok(TriBool::from_bool(result))
    }

    fn evaluate_value(
        &self,
        expr: &Expr,
        row: &[Value],
        target_hint: Option<DataType>,
    ) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => self.literal_to_value(literal, target_hint),
            Expr::Column(column) => {
                let binding = self.lookup(column).ok_or_else(|| Error::ColumnNotFound {
                    column: column.column.clone(),
                    table: column.table.clone().unwrap_or_default(),
                })?;
                if binding.index >= row.len() {
                    return Err(Error::SchemaMismatch(format!(
                        "row has no column '{}'",
                        column.column
                    )));
                }
                Ok(row[binding.index].clone())
            }
            Expr::Not(_) | Expr::Binary { .. } | Expr::NullTest { .. } => Err(Error::TypeError {
                operation: "expression".to_string(),
                expected: "scalar".to_string(),
                actual: "predicate".to_string(),
            }),
        }
    }

    /// Convert a literal to a value, coercing toward `target_type`
    /// when one is known.
    pub fn literal_to_value(
        &self,
        literal: &Literal,
        target_type: Option<DataType>,
    ) -> Result<Value> {
        match literal {
            Literal::Null => Ok(Value::Null(target_type.unwrap_or(DataType::Null))),
            Literal::Boolean(b) => Ok(Value::Boolean(*b)),
            Literal::Integer(text) => {
                let parsed: i64 = text.parse().map_err(|_| Error::TypeError {
                    operation: "literal".to_string(),
                    expected: "INTEGER".to_string(),
                    actual: text.clone(),
                })?;
                if let Some(target) = target_type {
                    match target {
                        DataType::Boolean => return Ok(Value::Boolean(parsed != 0)),
                        DataType::Integer => {
                            let narrowed =
                                i32::try_from(parsed).map_err(|_| Error::TypeError {
                                    operation: "literal".to_string(),
                                    expected: "INTEGER".to_string(),
                                    actual: text.clone(),
                                })?;
                            return Ok(Value::Integer(narrowed));
                        }
                        DataType::BigInt | DataType::Date | DataType::Timestamp => {
                            return Ok(Value::BigInt(parsed));
                        }
                        _ => {}
                    }
                }
                if let Ok(narrowed) = i32::try_from(parsed) {
                    Ok(Value::Integer(narrowed))
                } else {
                    Ok(Value::BigInt(parsed))
                }
            }
            Literal::Double(text) => {
                let parsed: f64 = text.parse().map_err(|_| Error::TypeError {
                    operation: "literal".to_string(),
                    expected: "DOUBLE".to_string(),
                    actual: text.clone(),
                })?;
                Ok(Value::Double(parsed))
            }
            Literal::Str(text) => {
                if let Some(target) = target_type {
                    if target == DataType::Date {
                        let days = parse_date(text).ok_or_else(|| Error::TypeError {
                            operation: "literal".to_string(),
                            expected: "DATE".to_string(),
                            actual: text.clone(),
                        })?;
                        return Ok(Value::Date(days));
                    }
                    if target == DataType::Boolean {
                        return match text.as_str() {
                            "TRUE" | "true" => Ok(Value::Boolean(true)),
                            "FALSE" | "false" => Ok(Value::Boolean(false)),
                            _ => Err(Error::TypeError {
                                operation: "literal".to_string(),
                                expected: "BOOLEAN".to_string(),
                                actual: text.clone(),
                            }),
                        };
                    }
                }
                Ok(Value::Str(text.clone()))
            }
        }
    }
}

/// Coerce a value to a column's declared type for comparison or
/// assignment. Narrowing integer conversions are range-checked.
pub fn coerce_to_type(value: Value, target: DataType) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null(target));
    }
    match target {
        DataType::Boolean => match value {
            Value::Integer(i) => Ok(Value::Boolean(i != 0)),
            Value::BigInt(i) => Ok(Value::Boolean(i != 0)),
            other => Ok(other),
        },
        DataType::Integer => match value {
            Value::BigInt(i) => {
                let narrowed = i32::try_from(i).map_err(|_| Error::TypeError {
                    operation: "coercion".to_string(),
                    expected: "INTEGER".to_string(),
                    actual: i.to_string(),
                })?;
                Ok(Value::Integer(narrowed))
            }
            other => Ok(other),
        },
        DataType::BigInt => match value {
            Value::Integer(i) => Ok(Value::BigInt(i as i64)),
            other => Ok(other),
        },
        DataType::Float | DataType::Double => match value {
            Value::Integer(i) => Ok(Value::Double(i as f64)),
            Value::BigInt(i) => Ok(Value::Double(i as f64)),
            other => Ok(other),
        },
        _ => Ok(value),
    }
}

fn value_to_tribool(value: &Value) -> Result<TriBool> {
    match value {
        Value::Null(_) => Ok(TriBool::Unknown),
        Value::Boolean(b) => Ok(TriBool::from_bool(*b)),
        Value::Integer(i) => Ok(TriBool::from_bool(*i != 0)),
        Value::BigInt(i) | Value::Date(i) => Ok(TriBool::from_bool(*i != 0)),
        Value::Double(f) => Ok(TriBool::from_bool(*f != 0.0)),
        Value::Str(_) => Err(Error::TypeError {
            operation: "predicate".to_string(),
            expected: "BOOLEAN".to_string(),
            actual: value.data_type().to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::schema::{ColumnCatalogEntry, ColumnDef};
    use crate::sql::parser::parse;
    use crate::sql::Statement;

    fn column(ordinal: u32, name: &str, data_type: DataType) -> ColumnCatalogEntry {
        ColumnCatalogEntry {
            table_id: 1,
            column_id: ordinal + 1,
            ordinal,
            column: ColumnDef::new(name, data_type),
        }
    }

    fn employees() -> Vec<ColumnCatalogEntry> {
        vec![
            column(0, "id", DataType::Integer),
            column(1, "nickname", DataType::Varchar),
            column(2, "active", DataType::Boolean),
            column(3, "hired", DataType::Date),
        ]
    }

    fn where_clause(sql: &str) -> Expr {
        let Statement::Select(sel) = parse(sql).unwrap() else {
            panic!("expected SELECT");
        };
        sel.where_clause.unwrap()
    }

    fn row(id: i32, nickname: Option<&str>, active: bool, hired: i64) -> Vec<Value> {
        vec![
            Value::Integer(id),
            match nickname {
                Some(n) => Value::Str(n.to_string()),
                None => Value::Null(DataType::Varchar),
            },
            Value::Boolean(active),
            Value::Date(hired),
        ]
    }

    #[test]
    fn test_simple_comparison() {
        let ev = ExpressionEvaluator::new(&employees(), "employees");
        let expr = where_clause("SELECT * FROM employees WHERE id > 2");
        assert_eq!(
            ev.evaluate_predicate(&expr, &row(3, Some("x"), true, 0)).unwrap(),
            TriBool::True
        );
        assert_eq!(
            ev.evaluate_predicate(&expr, &row(2, Some("x"), true, 0)).unwrap(),
            TriBool::False
        );
    }

    #[test]
    fn test_null_comparison_is_unknown() {
        let ev = ExpressionEvaluator::new(&employees(), "employees");
        let expr = where_clause("SELECT * FROM employees WHERE nickname = 'ace'");
        assert_eq!(
            ev.evaluate_predicate(&expr, &row(1, None, true, 0)).unwrap(),
            TriBool::Unknown
        );
    }

    #[test]
    fn test_unknown_or_false_excludes_row() {
        // A NULL nickname with active=TRUE: Unknown OR False = Unknown.
        let ev = ExpressionEvaluator::new(&employees(), "employees");
        let expr = where_clause("SELECT id FROM employees WHERE nickname = 'ace' OR NOT active");
        assert_eq!(
            ev.evaluate_predicate(&expr, &row(1, None, true, 0)).unwrap(),
            TriBool::Unknown
        );
        // Inactive row: Unknown OR True = True.
        assert_eq!(
            ev.evaluate_predicate(&expr, &row(2, None, false, 0)).unwrap(),
            TriBool::True
        );
    }

    #[test]
    fn test_is_null_is_total() {
        let ev = ExpressionEvaluator::new(&employees(), "employees");
        let is_null = where_clause("SELECT * FROM employees WHERE nickname IS NULL");
        let is_not_null = where_clause("SELECT * FROM employees WHERE nickname IS NOT NULL");

        assert_eq!(
            ev.evaluate_predicate(&is_null, &row(1, None, true, 0)).unwrap(),
            TriBool::True
        );
        assert_eq!(
            ev.evaluate_predicate(&is_null, &row(1, Some("a"), true, 0)).unwrap(),
            TriBool::False
        );
        assert_eq!(
            ev.evaluate_predicate(&is_not_null, &row(1, None, true, 0)).unwrap(),
            TriBool::False
        );
    }

    #[test]
    fn test_string_literal_coerces_to_date() {
        let ev = ExpressionEvaluator::new(&employees(), "employees");
        let expr = where_clause("SELECT * FROM employees WHERE hired < '1970-01-11'");
        assert_eq!(
            ev.evaluate_predicate(&expr, &row(1, Some("x"), true, 5)).unwrap(),
            TriBool::True
        );
        assert_eq!(
            ev.evaluate_predicate(&expr, &row(1, Some("x"), true, 15)).unwrap(),
            TriBool::False
        );
    }

    #[test]
    fn test_qualified_column_resolves() {
        let ev = ExpressionEvaluator::new(&employees(), "employees");
        let expr = where_clause("SELECT * FROM employees WHERE employees.id = 7");
        assert_eq!(
            ev.evaluate_predicate(&expr, &row(7, Some("x"), true, 0)).unwrap(),
            TriBool::True
        );
    }

    #[test]
    fn test_unknown_column_errors() {
        let ev = ExpressionEvaluator::new(&employees(), "employees");
        let expr = where_clause("SELECT * FROM employees WHERE ghost = 1");
        let err = ev
            .evaluate_predicate(&expr, &row(1, Some("x"), true, 0))
            .unwrap_err();
        assert!(matches!(err, Error::ColumnNotFound { .. }));
    }

    #[test]
    fn test_type_error_string_vs_int() {
        let ev = ExpressionEvaluator::new(&employees(), "employees");
        let expr = where_clause("SELECT * FROM employees WHERE id = 'abc'");
        // 'abc' gets an INTEGER hint but is not parseable.
        let err = ev
            .evaluate_predicate(&expr, &row(1, Some("x"), true, 0))
            .unwrap_err();
        assert!(matches!(err, Error::TypeError { .. }));
    }

    #[test]
    fn test_scalar_sees_original_row() {
        let ev = ExpressionEvaluator::new(&employees(), "employees");
        let Statement::Update(upd) = parse("UPDATE employees SET id = id WHERE id = 1").unwrap()
        else {
            panic!()
        };
        let value = ev
            .evaluate_scalar(&upd.assignments[0].value, &row(9, Some("x"), true, 0))
            .unwrap();
        assert_eq!(value, Value::Integer(9));
    }

    #[test]
    fn test_scalar_rejects_predicate() {
        let ev = ExpressionEvaluator::new(&employees(), "employees");
        let expr = where_clause("SELECT * FROM employees WHERE NOT active");
        let err = ev.evaluate_scalar(&expr, &row(1, None, true, 0)).unwrap_err();
        assert!(matches!(err, Error::TypeError { .. }));
    }
}
