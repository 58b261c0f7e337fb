//! DML execution: INSERT, SELECT, UPDATE, DELETE, TRUNCATE.
//!
//! Each statement resolves its table through the catalog, opens the
//! table heap, and runs a straight-line scan. SELECT output is already
//! formatted to text; mutations report affected-row counts.

use tracing::debug;

use super::evaluator::{coerce_to_type, ExpressionEvaluator};
use super::value::{parse_date, Value};
use crate::catalog::schema::ColumnCatalogEntry;
use crate::catalog::types::DataType;
use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::sql::ast::{
    DeleteStatement, InsertStatement, Literal, SelectItem, SelectStatement, TruncateStatement,
    UpdateStatement,
};
use crate::storage::heap::{RowLocation, SharedPageManager, TableHeap};
use crate::storage::record::{self, Field};

/// Header and textual rows of a SELECT.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Executes DML statements against the catalog and storage layers.
pub struct DmlExecutor<'a> {
    catalog: &'a Catalog,
    pager: SharedPageManager,
}

impl<'a> DmlExecutor<'a> {
    pub fn new(catalog: &'a Catalog, pager: SharedPageManager) -> Self {
        Self { catalog, pager }
    }

    // ========== INSERT ==========

    pub fn insert(&self, stmt: &InsertStatement) -> Result<usize> {
        let table = self
            .catalog
            .get_table(&stmt.table_name)?
            .ok_or_else(|| Error::TableNotFound(stmt.table_name.clone()))?;
        let columns = self.catalog.get_columns(table.table_id)?;
        if columns.is_empty() {
            return Err(Error::ConstraintViolation(format!(
                "table '{}' has no columns",
                table.name
            )));
        }

        let column_names: Vec<String> = if stmt.column_names.is_empty() {
            columns.iter().map(|c| c.column.name.clone()).collect()
        } else {
            stmt.column_names.clone()
        };
        if column_names.len() != columns.len() {
            return Err(Error::ConstraintViolation(
                "column count mismatch".to_string(),
            ));
        }

        debug!(table = %table.name, rows = stmt.rows.len(), "insert");

        let mut heap = TableHeap::new(self.pager.clone(), table.root_page_id)?;
        let mut inserted = 0;
        for row in &stmt.rows {
            if row.len() != column_names.len() {
                return Err(Error::ConstraintViolation(
                    "row value count mismatch".to_string(),
                ));
            }
            let payload = encode_row(&columns, row, &column_names)?;
            heap.insert(&payload)?;
            inserted += 1;
        }
        Ok(inserted)
    }

    // ========== SELECT ==========

    pub fn select(&self, stmt: &SelectStatement) -> Result<SelectOutput> {
        let table = self
            .catalog
            .get_table(&stmt.table_name)?
            .ok_or_else(|| Error::TableNotFound(stmt.table_name.clone()))?;
        let columns = self.catalog.get_columns(table.table_id)?;
        if columns.is_empty() {
            return Ok(SelectOutput::default());
        }

        let mut output = SelectOutput::default();
        let projection = build_projection(stmt, &columns, &table.name, &mut output.columns)?;

        let evaluator = ExpressionEvaluator::new(&columns, &table.name);
        let predicate = stmt.where_clause.as_ref();
        let limit = stmt.limit.map(|l| l as usize).unwrap_or(usize::MAX);

        debug!(
            table = %table.name,
            projection = %output.columns.join(", "),
            predicate = %predicate.map(|p| p.describe()).unwrap_or_else(|| "<none>".into()),
            limit = %stmt.limit.map(|l| l.to_string()).unwrap_or_else(|| "ALL".into()),
            "select"
        );
        if limit == 0 {
            return Ok(output);
        }

        let heap = TableHeap::new(self.pager.clone(), table.root_page_id)?;
        for (_, payload) in heap.scan() {
            let values = decode_row_values(&columns, &payload)?;
            if let Some(predicate) = predicate {
                if !evaluator.evaluate_predicate(predicate, &values)?.is_true() {
                    continue;
                }
            }
            let row = projection
                .iter()
                .map(|&idx| values[idx].to_string())
                .collect();
            output.rows.push(row);
            if output.rows.len() >= limit {
                break;
            }
        }
        Ok(output)
    }

    // ========== UPDATE ==========

    pub fn update(&self, stmt: &UpdateStatement) -> Result<usize> {
        if stmt.assignments.is_empty() {
            return Err(Error::ConstraintViolation(
                "UPDATE requires at least one assignment".to_string(),
            ));
        }

        let table = self
            .catalog
            .get_table(&stmt.table_name)?
            .ok_or_else(|| Error::TableNotFound(stmt.table_name.clone()))?;
        let columns = self.catalog.get_columns(table.table_id)?;

        let mut heap = TableHeap::new(self.pager.clone(), table.root_page_id)?;
        let evaluator = ExpressionEvaluator::new(&columns, &table.name);
        let predicate = stmt.where_clause.as_ref();

        debug!(
            table = %table.name,
            assignments = %stmt
                .assignments
                .iter()
                .map(|a| format!("{}={}", a.column_name, a.value.describe()))
                .collect::<Vec<_>>()
                .join(", "),
            predicate = %predicate.map(|p| p.describe()).unwrap_or_else(|| "<none>".into()),
            "update"
        );

        // First pass: collect matches so assignments never observe a
        // row this statement already rewrote.
        let mut targets: Vec<(RowLocation, Vec<Value>)> = Vec::new();
        for (loc, payload) in heap.scan() {
            let values = decode_row_values(&columns, &payload)?;
            if let Some(predicate) = predicate {
                if !evaluator.evaluate_predicate(predicate, &values)?.is_true() {
                    continue;
                }
            }
            targets.push((loc, values));
        }

        let mut updated = 0;
        for (loc, current_values) in targets {
            let mut new_values = current_values.clone();
            for assignment in &stmt.assignments {
                let idx = columns
                    .iter()
                    .position(|c| c.column.name == assignment.column_name)
                    .ok_or_else(|| Error::ColumnNotFound {
                        column: assignment.column_name.clone(),
                        table: stmt.table_name.clone(),
                    })?;
                // Right-hand sides see the pre-update row.
                let evaluated = evaluator.evaluate_scalar(&assignment.value, &current_values)?;
                new_values[idx] = coerce_for_column(&columns[idx], evaluated)?;
            }

            let payload = encode_values(&columns, &new_values)?;
            heap.update(loc, &payload)?;
            updated += 1;
        }
        Ok(updated)
    }

    // ========== DELETE ==========

    pub fn delete(&self, stmt: &DeleteStatement) -> Result<usize> {
        let table = self
            .catalog
            .get_table(&stmt.table_name)?
            .ok_or_else(|| Error::TableNotFound(stmt.table_name.clone()))?;
        let columns = self.catalog.get_columns(table.table_id)?;

        let mut heap = TableHeap::new(self.pager.clone(), table.root_page_id)?;
        let evaluator = ExpressionEvaluator::new(&columns, &table.name);
        let predicate = stmt.where_clause.as_ref();

        debug!(
            table = %table.name,
            predicate = %predicate.map(|p| p.describe()).unwrap_or_else(|| "<none>".into()),
            "delete"
        );

        let mut deleted = 0;
        for (loc, payload) in heap.scan() {
            match predicate {
                None => {
                    if heap.erase(loc)? {
                        deleted += 1;
                    }
                }
                Some(predicate) => {
                    let values = decode_row_values(&columns, &payload)?;
                    if evaluator.evaluate_predicate(predicate, &values)?.is_true()
                        && heap.erase(loc)?
                    {
                        deleted += 1;
                    }
                }
            }
        }
        Ok(deleted)
    }

    // ========== TRUNCATE ==========

    pub fn truncate(&self, stmt: &TruncateStatement) -> Result<()> {
        let table = self
            .catalog
            .get_table(&stmt.table_name)?
            .ok_or_else(|| Error::TableNotFound(stmt.table_name.clone()))?;
        debug!(table = %table.name, "truncate");
        let mut heap = TableHeap::new(self.pager.clone(), table.root_page_id)?;
        heap.truncate()
    }
}

// ========== Row conversion helpers ==========

fn build_projection(
    stmt: &SelectStatement,
    columns: &[ColumnCatalogEntry],
    table_name: &str,
    out_names: &mut Vec<String>,
) -> Result<Vec<usize>> {
    let mut projection = Vec::new();
    let mut star_expanded = false;

    for item in &stmt.items {
        match item {
            SelectItem::Star => {
                if !star_expanded {
                    for (i, column) in columns.iter().enumerate() {
                        projection.push(i);
                        out_names.push(column.column.name.clone());
                    }
                    star_expanded = true;
                }
            }
            SelectItem::Column(column_ref) => {
                if let Some(table) = &column_ref.table {
                    if table != table_name {
                        return Err(Error::ColumnNotFound {
                            column: column_ref.column.clone(),
                            table: table.clone(),
                        });
                    }
                }
                let idx = columns
                    .iter()
                    .position(|c| c.column.name == column_ref.column)
                    .ok_or_else(|| Error::ColumnNotFound {
                        column: column_ref.column.clone(),
                        table: table_name.to_string(),
                    })?;
                projection.push(idx);
                out_names.push(column_ref.column.clone());
            }
        }
    }
    Ok(projection)
}

/// Decode a stored payload into values in declaration order.
pub fn decode_row_values(
    columns: &[ColumnCatalogEntry],
    payload: &[u8],
) -> Result<Vec<Value>> {
    let fields = record::decode(payload)
        .ok_or_else(|| Error::InvalidRecordFormat("undecodable table row".to_string()))?;
    if fields.len() != columns.len() {
        return Err(Error::SchemaMismatch(format!(
            "row has {} fields, table has {} columns",
            fields.len(),
            columns.len()
        )));
    }

    let mut values = Vec::with_capacity(columns.len());
    for (entry, field) in columns.iter().zip(&fields) {
        let data_type = entry.column.data_type;
        if field.is_null {
            values.push(Value::Null(data_type));
            continue;
        }
        let expected = data_type.fixed_size();
        if expected > 0 && field.payload.len() != expected {
            return Err(Error::InvalidRecordFormat(format!(
                "column '{}': {} bytes stored, {expected} expected",
                entry.column.name,
                field.payload.len()
            )));
        }
        let value = match data_type {
            DataType::Boolean => Value::Boolean(field.payload.first().is_some_and(|&b| b != 0)),
            DataType::Integer => Value::Integer(i32::from_le_bytes(
                field.payload[..4].try_into().unwrap(),
            )),
            DataType::BigInt | DataType::Timestamp => {
                Value::BigInt(i64::from_le_bytes(field.payload[..8].try_into().unwrap()))
            }
            DataType::Date => {
                Value::Date(i64::from_le_bytes(field.payload[..8].try_into().unwrap()))
            }
            DataType::Float => {
                let v = f32::from_le_bytes(field.payload[..4].try_into().unwrap());
                Value::Double(v as f64)
            }
            DataType::Double => {
                Value::Double(f64::from_le_bytes(field.payload[..8].try_into().unwrap()))
            }
            DataType::Varchar | DataType::Text => {
                Value::Str(String::from_utf8_lossy(&field.payload).into_owned())
            }
            DataType::Null | DataType::Blob => {
                return Err(Error::SchemaMismatch(format!(
                    "column '{}' has unsupported stored type {data_type}",
                    entry.column.name
                )));
            }
        };
        values.push(value);
    }
    Ok(values)
}

/// Encode runtime values (already coerced to their column types) into
/// a record payload, enforcing NOT NULL and VARCHAR lengths.
pub fn encode_values(columns: &[ColumnCatalogEntry], values: &[Value]) -> Result<Vec<u8>> {
    let mut fields = Vec::with_capacity(columns.len());
    for (entry, value) in columns.iter().zip(values) {
        let column = &entry.column;
        if value.is_null() {
            if column.constraint.not_null {
                return Err(Error::ConstraintViolation(format!(
                    "column '{}' is NOT NULL",
                    column.name
                )));
            }
            fields.push(Field::from_null(column.data_type));
            continue;
        }

        let type_error = || Error::TypeError {
            operation: "encode".to_string(),
            expected: column.data_type.to_string(),
            actual: value.data_type().to_string(),
        };
        let field = match column.data_type {
            DataType::Boolean => Field::from_bool(value.as_bool().ok_or_else(type_error)?),
            DataType::Integer => Field::from_i32(value.as_i32().ok_or_else(type_error)?),
            DataType::BigInt | DataType::Timestamp => {
                Field::from_i64(value.as_i64().ok_or_else(type_error)?)
            }
            DataType::Float => {
                Field::from_f32(value.as_f64().ok_or_else(type_error)? as f32)
            }
            DataType::Double => Field::from_f64(value.as_f64().ok_or_else(type_error)?),
            DataType::Date => match value {
                Value::Date(days) => Field::from_date(*days),
                _ => return Err(type_error()),
            },
            DataType::Varchar | DataType::Text => {
                let text = value.as_str().ok_or_else(type_error)?;
                if column.data_type == DataType::Varchar
                    && column.length > 0
                    && text.len() > column.length as usize
                {
                    return Err(Error::ConstraintViolation(format!(
                        "value too long for column '{}'",
                        column.name
                    )));
                }
                Field::from_str(text, column.data_type)
            }
            DataType::Null | DataType::Blob => return Err(type_error()),
        };
        fields.push(field);
    }
    record::encode(&fields)
}

/// Coerce an UPDATE result to its column's declared type.
fn coerce_for_column(entry: &ColumnCatalogEntry, value: Value) -> Result<Value> {
    let column = &entry.column;
    if value.is_null() {
        if column.constraint.not_null {
            return Err(Error::ConstraintViolation(format!(
                "column '{}' is NOT NULL",
                column.name
            )));
        }
        return Ok(Value::Null(column.data_type));
    }

    let type_error = |actual: String| Error::TypeError {
        operation: "UPDATE".to_string(),
        expected: column.data_type.to_string(),
        actual,
    };
    match column.data_type {
        DataType::Boolean => match value {
            Value::Boolean(_) => Ok(value),
            Value::Integer(i) => Ok(Value::Boolean(i != 0)),
            Value::BigInt(i) => Ok(Value::Boolean(i != 0)),
            other => Err(type_error(other.to_string())),
        },
        DataType::Integer | DataType::BigInt | DataType::Float | DataType::Double => match value {
            Value::Integer(_) | Value::BigInt(_) | Value::Double(_) => {
                coerce_to_type(value, column.data_type)
            }
            other => Err(type_error(other.to_string())),
        },
        DataType::Date => match value {
            Value::Date(_) => Ok(value),
            Value::Str(text) => parse_date(&text)
                .map(Value::Date)
                .ok_or_else(|| type_error(text)),
            other => Err(type_error(other.to_string())),
        },
        DataType::Varchar | DataType::Text => match value {
            Value::Str(_) => Ok(value),
            other => Err(type_error(other.to_string())),
        },
        DataType::Null | DataType::Blob | DataType::Timestamp => {
            Err(type_error(value.to_string()))
        }
    }
}

// INSERT literals are validated directly against the declared column
// types; there is no general expression evaluation on this path.
fn encode_row(
    columns: &[ColumnCatalogEntry],
    row: &[Literal],
    column_names: &[String],
) -> Result<Vec<u8>> {
    let mut by_name: std::collections::HashMap<&str, &Literal> =
        std::collections::HashMap::with_capacity(column_names.len());
    for (name, literal) in column_names.iter().zip(row) {
        by_name.insert(name.as_str(), literal);
    }

    let mut fields = Vec::with_capacity(columns.len());
    for entry in columns {
        let column = &entry.column;
        let literal = by_name
            .get(column.name.as_str())
            .ok_or_else(|| Error::ColumnNotFound {
                column: column.name.clone(),
                table: String::new(),
            })?;

        let type_error = |actual: &str| Error::TypeError {
            operation: "INSERT".to_string(),
            expected: column.data_type.to_string(),
            actual: actual.to_string(),
        };

        if matches!(literal, Literal::Null) {
            if column.constraint.not_null {
                return Err(Error::ConstraintViolation(format!(
                    "column '{}' is NOT NULL",
                    column.name
                )));
            }
            fields.push(Field::from_null(column.data_type));
            continue;
        }

        let field = match column.data_type {
            DataType::Boolean => match literal {
                Literal::Boolean(b) => Field::from_bool(*b),
                other => return Err(type_error(&other.describe())),
            },
            DataType::Integer | DataType::BigInt => match literal {
                Literal::Integer(text) => {
                    let parsed: i64 = text.parse().map_err(|_| type_error(text))?;
                    if column.data_type == DataType::Integer {
                        let narrowed =
                            i32::try_from(parsed).map_err(|_| type_error(text))?;
                        Field::from_i32(narrowed)
                    } else {
                        Field::from_i64(parsed)
                    }
                }
                other => return Err(type_error(&other.describe())),
            },
            DataType::Float | DataType::Double => match literal {
                Literal::Double(text) | Literal::Integer(text) => {
                    let parsed: f64 = text.parse().map_err(|_| type_error(text))?;
                    if column.data_type == DataType::Float {
                        Field::from_f32(parsed as f32)
                    } else {
                        Field::from_f64(parsed)
                    }
                }
                other => return Err(type_error(&other.describe())),
            },
            DataType::Date => match literal {
                Literal::Str(text) => {
                    let days = parse_date(text).ok_or_else(|| type_error(text))?;
                    Field::from_date(days)
                }
                other => return Err(type_error(&other.describe())),
            },
            DataType::Varchar | DataType::Text => match literal {
                Literal::Str(text) => {
                    if column.data_type == DataType::Varchar
                        && column.length > 0
                        && text.len() > column.length as usize
                    {
                        return Err(Error::ConstraintViolation(format!(
                            "value too long for column '{}'",
                            column.name
                        )));
                    }
                    Field::from_str(text, column.data_type)
                }
                other => return Err(type_error(&other.describe())),
            },
            DataType::Null | DataType::Blob | DataType::Timestamp => {
                return Err(type_error(&literal.describe()));
            }
        };
        fields.push(field);
    }

    record::encode(&fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::schema::{ColumnDef, TableDef};
    use crate::sql::parser::parse;
    use crate::sql::Statement;
    use crate::storage::buffer_pool::PageManager;
    use crate::storage::file::FileManager;
    use crate::storage::page::PageType;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        pager: SharedPageManager,
        catalog: Catalog,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let fm = FileManager::open(dir.path().join("dml.kz"), true).unwrap();
        let pager: SharedPageManager = Arc::new(Mutex::new(PageManager::new(fm).unwrap()));
        let catalog = Catalog::new(pager.clone()).unwrap();

        let def = TableDef {
            id: 0,
            name: "users".to_string(),
            columns: vec![
                ColumnDef::new("id", DataType::Integer).primary_key(),
                ColumnDef::new("name", DataType::Varchar).with_length(32).not_null(),
                ColumnDef::new("active", DataType::Boolean),
            ],
        };
        let root = {
            let mut pm = pager.lock().unwrap();
            let id = pm.new_page(PageType::Data).unwrap();
            pm.unpin(id, false).unwrap();
            id
        };
        catalog.create_table(def, root, "CREATE TABLE users (...)").unwrap();

        Fixture {
            _dir: dir,
            pager,
            catalog,
        }
    }

    fn run_insert(fx: &Fixture, sql: &str) -> Result<usize> {
        let Statement::Insert(stmt) = parse(sql).unwrap() else {
            panic!()
        };
        DmlExecutor::new(&fx.catalog, fx.pager.clone()).insert(&stmt)
    }

    fn run_select(fx: &Fixture, sql: &str) -> Result<SelectOutput> {
        let Statement::Select(stmt) = parse(sql).unwrap() else {
            panic!()
        };
        DmlExecutor::new(&fx.catalog, fx.pager.clone()).select(&stmt)
    }

    fn seed(fx: &Fixture) {
        run_insert(
            fx,
            "INSERT INTO users (id, name, active) \
             VALUES (1,'alice',TRUE),(2,'bob',FALSE),(3,'cara',TRUE)",
        )
        .unwrap();
    }

    #[test]
    fn test_insert_and_select_all() {
        let fx = fixture();
        seed(&fx);
        let out = run_select(&fx, "SELECT * FROM users").unwrap();
        assert_eq!(out.columns, vec!["id", "name", "active"]);
        assert_eq!(out.rows.len(), 3);
        assert_eq!(out.rows[0], vec!["1", "alice", "TRUE"]);
        assert_eq!(out.rows[1], vec!["2", "bob", "FALSE"]);
    }

    #[test]
    fn test_select_projection_where_limit() {
        let fx = fixture();
        seed(&fx);
        let out = run_select(&fx, "SELECT name FROM users WHERE active LIMIT 1").unwrap();
        assert_eq!(out.columns, vec!["name"]);
        assert_eq!(out.rows, vec![vec!["alice".to_string()]]);
    }

    #[test]
    fn test_select_limit_zero() {
        let fx = fixture();
        seed(&fx);
        let out = run_select(&fx, "SELECT * FROM users LIMIT 0").unwrap();
        assert!(out.rows.is_empty());
    }

    #[test]
    fn test_insert_not_null_violation() {
        let fx = fixture();
        let err = run_insert(&fx, "INSERT INTO users (id, name, active) VALUES (1, NULL, TRUE)")
            .unwrap_err();
        assert!(matches!(err, Error::ConstraintViolation(_)));
    }

    #[test]
    fn test_insert_requires_all_columns() {
        let fx = fixture();
        let err = run_insert(&fx, "INSERT INTO users (id, name) VALUES (1, 'x')").unwrap_err();
        assert!(matches!(err, Error::ConstraintViolation(_)));
    }

    #[test]
    fn test_insert_varchar_too_long() {
        let fx = fixture();
        let long = "x".repeat(33);
        let err = run_insert(
            &fx,
            &format!("INSERT INTO users (id, name, active) VALUES (1, '{long}', TRUE)"),
        )
        .unwrap_err();
        assert!(matches!(err, Error::ConstraintViolation(_)));
    }

    #[test]
    fn test_insert_integer_range_check() {
        let fx = fixture();
        let err = run_insert(
            &fx,
            "INSERT INTO users (id, name, active) VALUES (4294967296, 'x', TRUE)",
        )
        .unwrap_err();
        assert!(matches!(err, Error::TypeError { .. }));
    }

    #[test]
    fn test_insert_boolean_requires_boolean_literal() {
        let fx = fixture();
        let err = run_insert(&fx, "INSERT INTO users (id, name, active) VALUES (1, 'x', 'yes')")
            .unwrap_err();
        assert!(matches!(err, Error::TypeError { .. }));
    }

    #[test]
    fn test_delete_with_predicate() {
        let fx = fixture();
        seed(&fx);
        let Statement::Delete(stmt) = parse("DELETE FROM users WHERE active = FALSE").unwrap()
        else {
            panic!()
        };
        let deleted = DmlExecutor::new(&fx.catalog, fx.pager.clone())
            .delete(&stmt)
            .unwrap();
        assert_eq!(deleted, 1);

        let out = run_select(&fx, "SELECT id FROM users").unwrap();
        assert_eq!(out.rows, vec![vec!["1".to_string()], vec!["3".to_string()]]);
    }

    #[test]
    fn test_delete_all_without_predicate() {
        let fx = fixture();
        seed(&fx);
        let Statement::Delete(stmt) = parse("DELETE FROM users").unwrap() else {
            panic!()
        };
        let deleted = DmlExecutor::new(&fx.catalog, fx.pager.clone())
            .delete(&stmt)
            .unwrap();
        assert_eq!(deleted, 3);
        assert!(run_select(&fx, "SELECT * FROM users").unwrap().rows.is_empty());
    }

    #[test]
    fn test_update_uses_snapshot() {
        let fx = fixture();
        seed(&fx);
        // id = id twice over the original row is still the original id.
        let Statement::Update(stmt) =
            parse("UPDATE users SET name = 'carla', active = FALSE WHERE id = 3").unwrap()
        else {
            panic!()
        };
        let updated = DmlExecutor::new(&fx.catalog, fx.pager.clone())
            .update(&stmt)
            .unwrap();
        assert_eq!(updated, 1);

        let out = run_select(&fx, "SELECT name, active FROM users WHERE id = 3").unwrap();
        assert_eq!(out.rows, vec![vec!["carla".to_string(), "FALSE".to_string()]]);
    }

    #[test]
    fn test_update_grows_row() {
        let fx = fixture();
        seed(&fx);
        let Statement::Update(stmt) =
            parse("UPDATE users SET name = 'this string is definitely longer' WHERE id = 3")
                .unwrap()
        else {
            panic!()
        };
        let updated = DmlExecutor::new(&fx.catalog, fx.pager.clone())
            .update(&stmt)
            .unwrap();
        assert_eq!(updated, 1);

        let out = run_select(&fx, "SELECT name FROM users WHERE id = 3").unwrap();
        assert_eq!(
            out.rows,
            vec![vec!["this string is definitely longer".to_string()]]
        );
        // The grown row relocated; iteration still sees exactly the
        // live set.
        assert_eq!(run_select(&fx, "SELECT * FROM users").unwrap().rows.len(), 3);
    }

    #[test]
    fn test_update_not_null_enforced() {
        let fx = fixture();
        seed(&fx);
        let Statement::Update(stmt) = parse("UPDATE users SET name = NULL WHERE id = 1").unwrap()
        else {
            panic!()
        };
        let err = DmlExecutor::new(&fx.catalog, fx.pager.clone())
            .update(&stmt)
            .unwrap_err();
        assert!(matches!(err, Error::ConstraintViolation(_)));
    }

    #[test]
    fn test_truncate() {
        let fx = fixture();
        seed(&fx);
        let Statement::Truncate(stmt) = parse("TRUNCATE TABLE users").unwrap() else {
            panic!()
        };
        DmlExecutor::new(&fx.catalog, fx.pager.clone())
            .truncate(&stmt)
            .unwrap();
        assert!(run_select(&fx, "SELECT * FROM users").unwrap().rows.is_empty());
    }

    #[test]
    fn test_unknown_table() {
        let fx = fixture();
        let err = run_select(&fx, "SELECT * FROM ghosts").unwrap_err();
        assert!(matches!(err, Error::TableNotFound(_)));
    }
}
