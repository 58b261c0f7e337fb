//! Execution engine.
//!
//! [`Engine`] is the request/response surface of the database: one
//! statement string in, a typed [`StatementResult`] out. It owns the
//! buffer pool and catalog over a single database file.

pub mod ddl;
pub mod dml;
pub mod evaluator;
pub mod value;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::info;

use crate::catalog::Catalog;
use crate::error::Result;
use crate::sql::{self, Statement};
use crate::storage::buffer_pool::PageManager;
use crate::storage::file::FileManager;
use crate::storage::heap::SharedPageManager;

pub use ddl::DdlExecutor;
pub use dml::{DmlExecutor, SelectOutput};
pub use evaluator::ExpressionEvaluator;
pub use value::{TriBool, Value};

/// Outcome of one executed statement.
#[derive(Debug, Clone, PartialEq)]
pub enum StatementResult {
    /// CREATE TABLE: the created table's name.
    Created(String),
    /// DROP TABLE: `existed` is false for an IF EXISTS no-op.
    Dropped { table: String, existed: bool },
    Inserted(usize),
    Rows(SelectOutput),
    Updated(usize),
    Deleted(usize),
    Truncated,
}

/// A database engine over one file.
pub struct Engine {
    pager: SharedPageManager,
    catalog: Catalog,
    data_dir: PathBuf,
}

impl Engine {
    /// Open (or create) the database at `path`. Per-table sentinel
    /// files live next to the database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Engine> {
        let path = path.as_ref();
        let file = FileManager::open(path, true)?;
        let pager: SharedPageManager = Arc::new(Mutex::new(PageManager::new(file)?));
        let catalog = Catalog::new(pager.clone())?;
        let data_dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        info!(path = %path.display(), "opened database");
        Ok(Engine {
            pager,
            catalog,
            data_dir,
        })
    }

    /// Parse and execute one SQL statement.
    pub fn execute(&mut self, statement: &str) -> Result<StatementResult> {
        match sql::parse(statement)? {
            Statement::CreateTable(stmt) => {
                let ddl = DdlExecutor::new(&self.catalog, self.pager.clone(), &self.data_dir);
                let entry = ddl.create_table(&stmt, statement)?;
                Ok(StatementResult::Created(entry.name))
            }
            Statement::DropTable(stmt) => {
                let ddl = DdlExecutor::new(&self.catalog, self.pager.clone(), &self.data_dir);
                let existed = ddl.drop_table(&stmt)?;
                Ok(StatementResult::Dropped {
                    table: stmt.table_name,
                    existed,
                })
            }
            Statement::Insert(stmt) => {
                let dml = DmlExecutor::new(&self.catalog, self.pager.clone());
                Ok(StatementResult::Inserted(dml.insert(&stmt)?))
            }
            Statement::Select(stmt) => {
                let dml = DmlExecutor::new(&self.catalog, self.pager.clone());
                Ok(StatementResult::Rows(dml.select(&stmt)?))
            }
            Statement::Update(stmt) => {
                let dml = DmlExecutor::new(&self.catalog, self.pager.clone());
                Ok(StatementResult::Updated(dml.update(&stmt)?))
            }
            Statement::Delete(stmt) => {
                let dml = DmlExecutor::new(&self.catalog, self.pager.clone());
                Ok(StatementResult::Deleted(dml.delete(&stmt)?))
            }
            Statement::Truncate(stmt) => {
                let dml = DmlExecutor::new(&self.catalog, self.pager.clone());
                dml.truncate(&stmt)?;
                Ok(StatementResult::Truncated)
            }
        }
    }

    /// The system catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Shared buffer pool handle.
    pub fn pager(&self) -> &SharedPageManager {
        &self.pager
    }

    /// Write every dirty page back to disk.
    pub fn flush(&self) -> Result<()> {
        self.pager.lock().unwrap().flush_all()
    }
}
