//! DDL execution: CREATE TABLE and DROP TABLE.
//!
//! CREATE validates the declaration, allocates the table's root page,
//! registers the catalog entries, and touches the per-table sentinel
//! file. Partial failures roll back: the catalog entry is removed and
//! the root page freed before the error propagates.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::catalog::schema::{ColumnConstraint, ColumnDef, TableCatalogEntry, TableDef};
use crate::catalog::Catalog;
use crate::config::MAX_COLUMNS_PER_TABLE;
use crate::error::{Error, Result};
use crate::sql::ast::{ColumnDecl, CreateTableStatement, DropTableStatement};
use crate::storage::file::FileManager;
use crate::storage::heap::SharedPageManager;
use crate::storage::page::PageType;

/// Executes DDL statements.
pub struct DdlExecutor<'a> {
    catalog: &'a Catalog,
    pager: SharedPageManager,
    /// Directory holding per-table sentinel files.
    data_dir: PathBuf,
}

impl<'a> DdlExecutor<'a> {
    pub fn new(catalog: &'a Catalog, pager: SharedPageManager, data_dir: &Path) -> Self {
        Self {
            catalog,
            pager,
            data_dir: data_dir.to_path_buf(),
        }
    }

    /// Create a table from its parsed declaration. `original_sql` is
    /// stored verbatim in the catalog.
    pub fn create_table(
        &self,
        stmt: &CreateTableStatement,
        original_sql: &str,
    ) -> Result<TableCatalogEntry> {
        if stmt.columns.len() > MAX_COLUMNS_PER_TABLE {
            return Err(Error::ConstraintViolation(format!(
                "too many columns: {}",
                stmt.columns.len()
            )));
        }

        let mut seen_names = std::collections::HashSet::new();
        let mut primary_key_seen = false;
        let mut def = TableDef {
            id: 0,
            name: stmt.table_name.clone(),
            columns: Vec::with_capacity(stmt.columns.len()),
        };
        for (i, decl) in stmt.columns.iter().enumerate() {
            if !seen_names.insert(decl.name.to_ascii_uppercase()) {
                return Err(Error::ConstraintViolation(format!(
                    "duplicate column '{}'",
                    decl.name
                )));
            }
            if decl.primary_key {
                if primary_key_seen {
                    return Err(Error::ConstraintViolation(
                        "multiple PRIMARY KEY columns".to_string(),
                    ));
                }
                primary_key_seen = true;
            }
            def.columns.push(map_column(i, decl));
        }

        let root_page_id = {
            let mut pm = self.pager.lock().unwrap();
            let id = pm.new_page(PageType::Data)?;
            pm.unpin(id, false)?;
            id
        };

        let entry = match self.catalog.create_table(def, root_page_id, original_sql) {
            Ok(entry) => entry,
            Err(e) => {
                let _ = self.pager.lock().unwrap().free_page(root_page_id);
                return Err(e);
            }
        };

        // Per-table sentinel file; rows stay in the shared database
        // file.
        let table_file = FileManager::table_path(&self.data_dir, entry.table_id);
        if let Err(io) = fs::create_dir_all(&self.data_dir)
            .and_then(|_| fs::File::create(&table_file).map(|_| ()))
        {
            self.catalog.drop_table(&entry.name, true)?;
            self.pager.lock().unwrap().free_page(entry.root_page_id)?;
            return Err(Error::WriteError(format!(
                "{}: {io}",
                table_file.display()
            )));
        }

        debug!(table = %entry.name, table_id = entry.table_id, "create table");
        Ok(entry)
    }

    /// Drop a table. Returns false for a missing table under IF
    /// EXISTS; raises `TABLE_NOT_FOUND` otherwise.
    pub fn drop_table(&self, stmt: &DropTableStatement) -> Result<bool> {
        let Some(entry) = self.catalog.get_table(&stmt.table_name)? else {
            if stmt.if_exists {
                return Ok(false);
            }
            return Err(Error::TableNotFound(stmt.table_name.clone()));
        };

        if !self.catalog.drop_table(&stmt.table_name, stmt.cascade)? {
            if stmt.if_exists {
                return Ok(false);
            }
            return Err(Error::TableNotFound(stmt.table_name.clone()));
        }

        self.pager.lock().unwrap().free_page(entry.root_page_id)?;

        let table_file = FileManager::table_path(&self.data_dir, entry.table_id);
        if table_file.exists() {
            fs::remove_file(&table_file)?;
        }

        debug!(table = %stmt.table_name, "drop table");
        Ok(true)
    }
}

fn map_column(index: usize, decl: &ColumnDecl) -> ColumnDef {
    ColumnDef {
        id: (index + 1) as u32,
        name: decl.name.clone(),
        data_type: decl.data_type,
        length: decl.length,
        constraint: ColumnConstraint {
            not_null: decl.not_null || decl.primary_key,
            primary_key: decl.primary_key,
            unique: decl.unique || decl.primary_key,
            has_default: decl.default_literal.is_some(),
            default_value: decl.default_literal.clone().unwrap_or_default(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::parser::parse;
    use crate::sql::Statement;
    use crate::storage::buffer_pool::PageManager;
    use crate::storage::file::FileManager;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        pager: SharedPageManager,
        catalog: Catalog,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let fm = FileManager::open(dir.path().join("ddl.kz"), true).unwrap();
        let pager: SharedPageManager = Arc::new(Mutex::new(PageManager::new(fm).unwrap()));
        let catalog = Catalog::new(pager.clone()).unwrap();
        Fixture {
            dir,
            pager,
            catalog,
        }
    }

    fn run_create(fx: &Fixture, sql: &str) -> Result<TableCatalogEntry> {
        let Statement::CreateTable(stmt) = parse(sql).unwrap() else {
            panic!()
        };
        DdlExecutor::new(&fx.catalog, fx.pager.clone(), fx.dir.path())
            .create_table(&stmt, sql)
    }

    fn run_drop(fx: &Fixture, sql: &str) -> Result<bool> {
        let Statement::DropTable(stmt) = parse(sql).unwrap() else {
            panic!()
        };
        DdlExecutor::new(&fx.catalog, fx.pager.clone(), fx.dir.path()).drop_table(&stmt)
    }

    #[test]
    fn test_create_table_registers_everything() {
        let fx = fixture();
        let entry = run_create(
            &fx,
            "CREATE TABLE users (id INTEGER PRIMARY KEY, name VARCHAR(32) NOT NULL)",
        )
        .unwrap();
        assert_eq!(entry.table_id, 1);
        assert!(fx.catalog.table_exists("users").unwrap());
        assert_eq!(fx.catalog.get_columns(entry.table_id).unwrap().len(), 2);
        assert!(FileManager::table_path(fx.dir.path(), entry.table_id).exists());
        assert!(entry.create_sql.starts_with("CREATE TABLE users"));
    }

    #[test]
    fn test_duplicate_column_names_case_insensitive() {
        let fx = fixture();
        let err = run_create(&fx, "CREATE TABLE t (id INTEGER, ID VARCHAR(4))").unwrap_err();
        assert!(matches!(err, Error::ConstraintViolation(_)));
    }

    #[test]
    fn test_single_primary_key() {
        let fx = fixture();
        let err = run_create(
            &fx,
            "CREATE TABLE t (a INTEGER PRIMARY KEY, b INTEGER PRIMARY KEY)",
        )
        .unwrap_err();
        assert!(matches!(err, Error::ConstraintViolation(_)));
    }

    #[test]
    fn test_create_duplicate_table_frees_root() {
        let fx = fixture();
        run_create(&fx, "CREATE TABLE t (id INTEGER)").unwrap();
        let free_before = fx.pager.lock().unwrap().free_count();
        let err = run_create(&fx, "CREATE TABLE t (id INTEGER)").unwrap_err();
        assert!(matches!(err, Error::TableExists(_)));
        // The root page allocated for the failed CREATE went back to
        // the free list.
        assert_eq!(fx.pager.lock().unwrap().free_count(), free_before + 1);
    }

    #[test]
    fn test_drop_table_round_trip() {
        let fx = fixture();
        let entry = run_create(&fx, "CREATE TABLE t (id INTEGER)").unwrap();
        let free_before = fx.pager.lock().unwrap().free_count();

        assert!(run_drop(&fx, "DROP TABLE t").unwrap());
        assert!(fx.catalog.list_tables().unwrap().is_empty());
        assert!(fx.catalog.get_columns(entry.table_id).unwrap().is_empty());
        assert_eq!(fx.pager.lock().unwrap().free_count(), free_before + 1);
        assert!(!FileManager::table_path(fx.dir.path(), entry.table_id).exists());
    }

    #[test]
    fn test_drop_if_exists_is_silent() {
        let fx = fixture();
        assert!(!run_drop(&fx, "DROP TABLE IF EXISTS missing").unwrap());
        let err = run_drop(&fx, "DROP TABLE missing").unwrap_err();
        assert!(matches!(err, Error::TableNotFound(_)));
    }

    #[test]
    fn test_cascade_accepted_and_ignored() {
        let fx = fixture();
        run_create(&fx, "CREATE TABLE t (id INTEGER)").unwrap();
        assert!(run_drop(&fx, "DROP TABLE t CASCADE").unwrap());
    }
}
