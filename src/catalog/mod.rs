//! System catalog: data types, schema definitions, and the manager for
//! the two on-disk system heaps.

pub mod catalog;
pub mod schema;
pub mod types;

pub use catalog::Catalog;
pub use schema::{ColumnCatalogEntry, ColumnConstraint, ColumnDef, TableCatalogEntry, TableDef};
pub use types::{ColumnId, DataType};
