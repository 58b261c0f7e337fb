//! Schema definitions and catalog entry wire formats.
//!
//! Tables and columns are described by catalog entries stored as
//! records in the two system heaps. The wire formats are little-endian
//! with length-prefixed strings (u16 for names, u32 for SQL text) and
//! must stay bit-exact for on-disk compatibility.

use super::types::{ColumnId, DataType};
use crate::error::{Error, Result};
use crate::storage::file::TableId;
use crate::storage::page::PageId;

// Constraint mask bits.
const NOT_NULL_MASK: u8 = 0x01;
const PRIMARY_KEY_MASK: u8 = 0x02;
const UNIQUE_MASK: u8 = 0x04;
const HAS_DEFAULT_MASK: u8 = 0x08;

/// Column constraints. PRIMARY KEY implies NOT NULL and UNIQUE.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnConstraint {
    pub not_null: bool,
    pub primary_key: bool,
    pub unique: bool,
    pub has_default: bool,
    pub default_value: String,
}

impl ColumnConstraint {
    pub fn encode_mask(&self) -> u8 {
        let mut mask = 0;
        if self.not_null {
            mask |= NOT_NULL_MASK;
        }
        if self.primary_key {
            mask |= PRIMARY_KEY_MASK;
        }
        if self.unique {
            mask |= UNIQUE_MASK;
        }
        if self.has_default {
            mask |= HAS_DEFAULT_MASK;
        }
        mask
    }

    pub fn decode_mask(mask: u8, default_literal: String) -> ColumnConstraint {
        let has_default = mask & HAS_DEFAULT_MASK != 0;
        ColumnConstraint {
            not_null: mask & NOT_NULL_MASK != 0,
            primary_key: mask & PRIMARY_KEY_MASK != 0,
            unique: mask & UNIQUE_MASK != 0,
            has_default,
            default_value: if has_default {
                default_literal
            } else {
                String::new()
            },
        }
    }
}

/// Column definition inside a table.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub id: ColumnId,
    pub name: String,
    pub data_type: DataType,
    /// Declared maximum for VARCHAR(n); 0 means unbounded.
    pub length: u32,
    pub constraint: ColumnConstraint,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            id: 0,
            name: name.into(),
            data_type,
            length: 0,
            constraint: ColumnConstraint::default(),
        }
    }

    pub fn with_length(mut self, length: u32) -> Self {
        self.length = length;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.constraint.not_null = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.constraint.primary_key = true;
        self.constraint.not_null = true;
        self.constraint.unique = true;
        self
    }
}

/// Full table definition as declared by CREATE TABLE.
#[derive(Debug, Clone, Default)]
pub struct TableDef {
    pub id: TableId,
    pub name: String,
    pub columns: Vec<ColumnDef>,
}

/// One slot in the tables system heap.
///
/// Wire format: `u32 table_id | u32 root_page_id | u16 name_len |
/// name | u32 sql_len | sql`.
#[derive(Debug, Clone, PartialEq)]
pub struct TableCatalogEntry {
    pub table_id: TableId,
    pub root_page_id: PageId,
    pub name: String,
    pub create_sql: String,
}

impl TableCatalogEntry {
    pub fn serialize(&self) -> Result<Vec<u8>> {
        if self.name.len() > u16::MAX as usize {
            return Err(Error::InvalidArgument(format!(
                "table name too long: {}",
                self.name.len()
            )));
        }
        let mut out = Vec::with_capacity(16 + self.name.len() + self.create_sql.len());
        out.extend_from_slice(&self.table_id.to_le_bytes());
        out.extend_from_slice(&self.root_page_id.to_le_bytes());
        out.extend_from_slice(&(self.name.len() as u16).to_le_bytes());
        out.extend_from_slice(self.name.as_bytes());
        out.extend_from_slice(&(self.create_sql.len() as u32).to_le_bytes());
        out.extend_from_slice(self.create_sql.as_bytes());
        Ok(out)
    }

    pub fn deserialize(data: &[u8]) -> Result<TableCatalogEntry> {
        let mut r = Reader::new(data, "table catalog entry");
        let table_id = r.u32()?;
        let root_page_id = r.u32()?;
        let name_len = r.u16()? as usize;
        let name = r.string(name_len)?;
        let sql_len = r.u32()? as usize;
        let create_sql = r.string(sql_len)?;
        Ok(TableCatalogEntry {
            table_id,
            root_page_id,
            name,
            create_sql,
        })
    }
}

/// One slot in the columns system heap.
///
/// Wire format: `u32 table_id | u32 column_id | u32 ordinal | u8 type |
/// u32 length | u8 constraint_mask | u16 name_len | name |
/// u16 default_len | default`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnCatalogEntry {
    pub table_id: TableId,
    pub column_id: ColumnId,
    pub ordinal: u32,
    pub column: ColumnDef,
}

impl ColumnCatalogEntry {
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let column = &self.column;
        if column.name.len() > u16::MAX as usize {
            return Err(Error::InvalidArgument(format!(
                "column name too long: {}",
                column.name.len()
            )));
        }
        if column.constraint.has_default && column.constraint.default_value.len() > u16::MAX as usize
        {
            return Err(Error::InvalidArgument(format!(
                "default literal too long for column '{}'",
                column.name
            )));
        }

        let mut out = Vec::with_capacity(32 + column.name.len());
        out.extend_from_slice(&self.table_id.to_le_bytes());
        out.extend_from_slice(&self.column_id.to_le_bytes());
        out.extend_from_slice(&self.ordinal.to_le_bytes());
        out.push(column.data_type as u8);
        out.extend_from_slice(&column.length.to_le_bytes());
        out.push(column.constraint.encode_mask());
        out.extend_from_slice(&(column.name.len() as u16).to_le_bytes());
        out.extend_from_slice(column.name.as_bytes());
        let default_len = if column.constraint.has_default {
            column.constraint.default_value.len() as u16
        } else {
            0
        };
        out.extend_from_slice(&default_len.to_le_bytes());
        if column.constraint.has_default {
            out.extend_from_slice(column.constraint.default_value.as_bytes());
        }
        Ok(out)
    }

    pub fn deserialize(data: &[u8]) -> Result<ColumnCatalogEntry> {
        let mut r = Reader::new(data, "column catalog entry");
        let table_id = r.u32()?;
        let column_id = r.u32()?;
        let ordinal = r.u32()?;
        let type_tag = r.u8()?;
        let length = r.u32()?;
        let constraint_mask = r.u8()?;
        let name_len = r.u16()? as usize;
        let name = r.string(name_len)?;
        let default_len = r.u16()? as usize;
        let default_literal = r.string(default_len)?;

        let data_type = DataType::from_u8(type_tag).ok_or_else(|| {
            Error::InvalidRecordFormat(format!("unknown column data type tag {type_tag}"))
        })?;

        Ok(ColumnCatalogEntry {
            table_id,
            column_id,
            ordinal,
            column: ColumnDef {
                id: column_id,
                name,
                data_type,
                length,
                constraint: ColumnConstraint::decode_mask(constraint_mask, default_literal),
            },
        })
    }
}

// Bounds-checked little-endian reader shared by both entry codecs.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
    what: &'static str,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8], what: &'static str) -> Self {
        Self { data, pos: 0, what }
    }

    fn truncated(&self) -> Error {
        Error::InvalidRecordFormat(format!("{} truncated at offset {}", self.what, self.pos))
    }

    fn u8(&mut self) -> Result<u8> {
        if self.pos >= self.data.len() {
            return Err(self.truncated());
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Ok(v)
    }

    fn u16(&mut self) -> Result<u16> {
        if self.pos + 2 > self.data.len() {
            return Err(self.truncated());
        }
        let v = u16::from_le_bytes([self.data[self.pos], self.data[self.pos + 1]]);
        self.pos += 2;
        Ok(v)
    }

    fn u32(&mut self) -> Result<u32> {
        if self.pos + 4 > self.data.len() {
            return Err(self.truncated());
        }
        let v = u32::from_le_bytes([
            self.data[self.pos],
            self.data[self.pos + 1],
            self.data[self.pos + 2],
            self.data[self.pos + 3],
        ]);
        self.pos += 4;
        Ok(v)
    }

    fn string(&mut self, len: usize) -> Result<String> {
        if self.pos + len > self.data.len() {
            return Err(self.truncated());
        }
        let s = String::from_utf8(self.data[self.pos..self.pos + len].to_vec())
            .map_err(|e| Error::InvalidRecordFormat(format!("{}: {e}", self.what)))?;
        self.pos += len;
        Ok(s)
    }
}
