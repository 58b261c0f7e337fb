//! Engine-wide constants and limits.
//!
//! Everything that more than one layer needs to agree on lives here:
//! page geometry, database limits, catalog versioning, and default
//! file-system locations.

/// Size of each database page in bytes.
pub const PAGE_SIZE: usize = 4096;

/// Size of the page header in bytes. The on-disk layout in
/// [`crate::storage::page`] must stay exactly this wide.
pub const PAGE_HEADER_SIZE: usize = 24;

/// Maximum encoded size of a single record (page minus header minus a
/// safety margin for the slot directory).
pub const MAX_RECORD_SIZE: usize = PAGE_SIZE - PAGE_HEADER_SIZE - 16;

/// Default number of frames in the buffer pool.
pub const DEFAULT_CACHE_SIZE: usize = 100;

/// First valid page id. Page ids are 1-based; page 1 starts at file
/// offset 0.
pub const FIRST_PAGE_ID: u32 = 1;

/// Marker for "no page" in chain links and the free list.
pub const INVALID_PAGE_ID: u32 = 0;

/// Maximum number of columns a CREATE TABLE may declare.
pub const MAX_COLUMNS_PER_TABLE: usize = 1024;

/// Magic number identifying the metadata page ("KZFM" little-endian).
pub const METADATA_MAGIC: u32 = 0x4B5A_464D;

/// Current metadata schema version. Version 2 added the catalog roots
/// and the next-table-id counter to the metadata record.
pub const CATALOG_SCHEMA_VERSION: u32 = 2;

/// Database file extension.
pub const DB_FILE_EXTENSION: &str = ".kz";

/// Directory for per-table sentinel files.
pub const DEFAULT_DB_DIR: &str = "./data";

// Layout sanity checks.
const _: () = assert!(PAGE_SIZE.is_power_of_two());
const _: () = assert!(PAGE_SIZE >= 512 && PAGE_SIZE <= 65536);
const _: () = assert!(PAGE_HEADER_SIZE == 24);
const _: () = assert!(PAGE_HEADER_SIZE < PAGE_SIZE / 2);
const _: () = assert!(MAX_RECORD_SIZE > 0);
const _: () = assert!(FIRST_PAGE_ID > INVALID_PAGE_ID);
