//! System catalog.
//!
//! Schema metadata lives in two heap-style system pages whose ids are
//! recorded in the metadata page: one holds [`TableCatalogEntry`]
//! records, the other [`ColumnCatalogEntry`] records. Each root is a
//! single page by design; overflowing it is a clean `PAGE_FULL`.
//!
//! Table entries are cached in memory on first read and kept coherent
//! by the mutating operations. Column entries are always read from the
//! page and sorted by ordinal.

use std::sync::RwLock;

use tracing::debug;

use super::schema::{ColumnCatalogEntry, TableCatalogEntry, TableDef};
use super::types::ColumnId;
use crate::config::FIRST_PAGE_ID;
use crate::error::{Error, Result};
use crate::storage::file::TableId;
use crate::storage::heap::SharedPageManager;
use crate::storage::page::{Page, PageId, PageType};

/// Catalog manager over the two system heaps.
pub struct Catalog {
    pager: SharedPageManager,
    tables_root: PageId,
    columns_root: PageId,
    /// Lazily loaded table entries; `None` until first read.
    cache: RwLock<Option<Vec<TableCatalogEntry>>>,
}

impl Catalog {
    /// Attach to the catalog roots recorded in the metadata page,
    /// allocating them if a pre-versioned file lacks them.
    pub fn new(pager: SharedPageManager) -> Result<Self> {
        let (tables_root, columns_root) = {
            let mut pm = pager.lock().unwrap();
            let mut tables_root = pm.catalog_tables_root();
            let mut columns_root = pm.catalog_columns_root();
            if tables_root < FIRST_PAGE_ID {
                tables_root = pm.new_page(PageType::Data)?;
                pm.set_catalog_tables_root(tables_root)?;
                pm.unpin(tables_root, false)?;
            }
            if columns_root < FIRST_PAGE_ID {
                columns_root = pm.new_page(PageType::Data)?;
                pm.set_catalog_columns_root(columns_root)?;
                pm.unpin(columns_root, false)?;
            }
            (tables_root, columns_root)
        };

        Ok(Self {
            pager,
            tables_root,
            columns_root,
            cache: RwLock::new(None),
        })
    }

    // ========== Reads ==========

    pub fn list_tables(&self) -> Result<Vec<TableCatalogEntry>> {
        self.load_cache()?;
        Ok(self.cache.read().unwrap().as_ref().unwrap().clone())
    }

    pub fn table_exists(&self, name: &str) -> Result<bool> {
        Ok(self.get_table(name)?.is_some())
    }

    pub fn get_table(&self, name: &str) -> Result<Option<TableCatalogEntry>> {
        self.load_cache()?;
        Ok(self
            .cache
            .read()
            .unwrap()
            .as_ref()
            .unwrap()
            .iter()
            .find(|e| e.name == name)
            .cloned())
    }

    pub fn get_table_by_id(&self, id: TableId) -> Result<Option<TableCatalogEntry>> {
        self.load_cache()?;
        Ok(self
            .cache
            .read()
            .unwrap()
            .as_ref()
            .unwrap()
            .iter()
            .find(|e| e.table_id == id)
            .cloned())
    }

    /// Columns of one table, sorted by ordinal.
    pub fn get_columns(&self, table_id: TableId) -> Result<Vec<ColumnCatalogEntry>> {
        let mut columns: Vec<ColumnCatalogEntry> = self
            .read_slots(self.columns_root)?
            .iter()
            .map(|payload| ColumnCatalogEntry::deserialize(payload))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .filter(|e| e.table_id == table_id)
            .collect();
        columns.sort_by_key(|e| e.ordinal);
        Ok(columns)
    }

    // ========== Mutations ==========

    /// Register a new table: assign the next table id, persist the
    /// table entry and one column entry per declared column.
    pub fn create_table(
        &self,
        mut def: TableDef,
        root_page_id: PageId,
        create_sql: &str,
    ) -> Result<TableCatalogEntry> {
        if self.table_exists(&def.name)? {
            return Err(Error::TableExists(def.name));
        }

        let table_id = {
            let mut pm = self.pager.lock().unwrap();
            let id = pm.next_table_id();
            pm.set_next_table_id(id + 1)?;
            id
        };
        def.id = table_id;

        let entry = TableCatalogEntry {
            table_id,
            root_page_id,
            name: def.name.clone(),
            create_sql: create_sql.to_string(),
        };
        self.persist_slot(self.tables_root, &entry.serialize()?, "tables")?;
        if let Some(cache) = self.cache.write().unwrap().as_mut() {
            cache.push(entry.clone());
        }

        for (i, column) in def.columns.iter().enumerate() {
            let mut column = column.clone();
            column.id = (i + 1) as ColumnId;
            let col_entry = ColumnCatalogEntry {
                table_id,
                column_id: column.id,
                ordinal: i as u32,
                column,
            };
            self.persist_slot(self.columns_root, &col_entry.serialize()?, "columns")?;
        }

        debug!(table = %entry.name, table_id, root_page_id, "created table");
        Ok(entry)
    }

    /// Remove a table and its columns from the catalog. Returns false
    /// when the table does not exist; the caller decides whether that
    /// is an error.
    pub fn drop_table(&self, name: &str, cascade: bool) -> Result<bool> {
        let _ = cascade; // no dependent objects yet
        self.load_cache()?;

        let removed = {
            let mut guard = self.cache.write().unwrap();
            let cache = guard.as_mut().unwrap();
            let Some(pos) = cache.iter().position(|e| e.name == name) else {
                return Ok(false);
            };
            cache.remove(pos)
        };

        let remaining = self.cache.read().unwrap().as_ref().unwrap().clone();
        let table_images = remaining
            .iter()
            .map(|e| e.serialize())
            .collect::<Result<Vec<_>>>()?;
        self.rewrite_page(self.tables_root, &table_images, "tables")?;

        let column_images = self
            .read_slots(self.columns_root)?
            .iter()
            .map(|payload| ColumnCatalogEntry::deserialize(payload))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .filter(|e| e.table_id != removed.table_id)
            .map(|e| e.serialize())
            .collect::<Result<Vec<_>>>()?;
        self.rewrite_page(self.columns_root, &column_images, "columns")?;

        debug!(table = name, table_id = removed.table_id, "dropped table");
        Ok(true)
    }

    // ========== Page plumbing ==========

    fn load_cache(&self) -> Result<()> {
        if self.cache.read().unwrap().is_some() {
            return Ok(());
        }
        let entries = self
            .read_slots(self.tables_root)?
            .iter()
            .map(|payload| TableCatalogEntry::deserialize(payload))
            .collect::<Result<Vec<_>>>()?;
        *self.cache.write().unwrap() = Some(entries);
        Ok(())
    }

    // Live payloads of every slot on one catalog page.
    fn read_slots(&self, page_id: PageId) -> Result<Vec<Vec<u8>>> {
        let mut pm = self.pager.lock().unwrap();
        let idx = pm.fetch(page_id, true)?;
        let mut payloads = Vec::new();
        {
            let page = pm.page(idx);
            for slot in 0..page.slot_count() {
                if let Some(payload) = page.read(slot) {
                    if !payload.is_empty() {
                        payloads.push(payload);
                    }
                }
            }
        }
        pm.unpin(page_id, false)?;
        Ok(payloads)
    }

    // Append one serialized entry to a catalog page.
    fn persist_slot(&self, page_id: PageId, data: &[u8], what: &str) -> Result<()> {
        let mut pm = self.pager.lock().unwrap();
        let idx = pm.fetch(page_id, true)?;
        match pm.page_mut(idx).insert(data) {
            Ok(Some(_)) => pm.unpin(page_id, true),
            Ok(None) => {
                pm.unpin(page_id, false)?;
                Err(Error::PageFull(format!("catalog {what} page {page_id}")))
            }
            Err(e) => {
                pm.unpin(page_id, false)?;
                Err(e)
            }
        }
    }

    // Replace a catalog page with a fresh image holding `entries`.
    fn rewrite_page(&self, page_id: PageId, entries: &[Vec<u8>], what: &str) -> Result<()> {
        let mut image = Page::new();
        image.init(PageType::Data, page_id);
        for data in entries {
            if image.insert(data)?.is_none() {
                return Err(Error::PageFull(format!("catalog {what} page {page_id}")));
            }
        }
        self.pager.lock().unwrap().overwrite_page(page_id, &image)
    }
}
