//! File manager for KazeDB.
//!
//! Handles fixed-size page I/O over the single database file. Pages
//! are 1-based: page 1 lives at file offset 0.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::config::{DB_FILE_EXTENSION, FIRST_PAGE_ID, PAGE_SIZE};
use crate::error::{Error, Result};
use crate::storage::page::PageId;

/// Identifier type for tables, shared with the catalog.
pub type TableId = u32;

/// Owns the open handle for the database file.
#[derive(Debug)]
pub struct FileManager {
    path: PathBuf,
    file: File,
}

impl FileManager {
    /// Open the database file read/write. With `create_if_missing` the
    /// file (and its parent directories) are created on first open;
    /// otherwise a missing file is an error.
    pub fn open(path: impl AsRef<Path>, create_if_missing: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if create_if_missing {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }

        let file = match OpenOptions::new()
            .read(true)
            .write(true)
            .create(create_if_missing)
            .open(&path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::FileNotFound(path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self { path, file })
    }

    /// Path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Total file size in bytes.
    pub fn size_bytes(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// Number of whole pages in the file.
    pub fn page_count(&self) -> Result<u64> {
        Ok(self.size_bytes()? / PAGE_SIZE as u64)
    }

    /// Read one page into `out`. The page must already exist.
    pub fn read_page(&mut self, page_id: PageId, out: &mut [u8]) -> Result<()> {
        if out.len() != PAGE_SIZE {
            return Err(Error::InvalidArgument(format!(
                "read buffer must be {} bytes, got {}",
                PAGE_SIZE,
                out.len()
            )));
        }
        if page_id < FIRST_PAGE_ID {
            return Err(Error::PageNotFound(page_id));
        }
        let offset = page_offset(page_id);
        if offset + PAGE_SIZE as u64 > self.size_bytes()? {
            return Err(Error::PageNotFound(page_id));
        }

        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(|e| Error::SeekError(format!("offset {offset}: {e}")))?;
        self.file
            .read_exact(out)
            .map_err(|e| Error::ReadError(format!("page {page_id}: {e}")))?;
        Ok(())
    }

    /// Write one page. The page must already exist; extending the file
    /// happens only through [`FileManager::allocate_page`].
    pub fn write_page(&mut self, page_id: PageId, buf: &[u8]) -> Result<()> {
        if buf.len() != PAGE_SIZE {
            return Err(Error::InvalidArgument(format!(
                "write buffer must be {} bytes, got {}",
                PAGE_SIZE,
                buf.len()
            )));
        }
        if page_id < FIRST_PAGE_ID {
            return Err(Error::PageNotFound(page_id));
        }
        let offset = page_offset(page_id);
        if offset + PAGE_SIZE as u64 > self.size_bytes()? {
            return Err(Error::PageNotFound(page_id));
        }

        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(|e| Error::SeekError(format!("offset {offset}: {e}")))?;
        self.file
            .write_all(buf)
            .map_err(|e| Error::WriteError(format!("page {page_id}: {e}")))?;
        self.file
            .sync_data()
            .map_err(|e| Error::WriteError(format!("sync page {page_id}: {e}")))?;
        Ok(())
    }

    /// Append a zero-filled page at the end of the file and return its
    /// id.
    pub fn allocate_page(&mut self) -> Result<PageId> {
        let count = self.page_count()?;
        let id = (count + 1) as PageId;
        self.file.set_len((count + 1) * PAGE_SIZE as u64)?;
        tracing::trace!(page_id = id, "allocated page at file end");
        Ok(id)
    }

    /// File name for a table's sentinel file.
    pub fn table_filename(table_id: TableId) -> String {
        format!("table_{table_id}{DB_FILE_EXTENSION}")
    }

    /// Path of a table's sentinel file under `data_dir`. The sentinel
    /// carries no row data; rows live in the shared database file.
    pub fn table_path(data_dir: &Path, table_id: TableId) -> PathBuf {
        data_dir.join(Self::table_filename(table_id))
    }
}

fn page_offset(page_id: PageId) -> u64 {
    (page_id as u64 - 1) * PAGE_SIZE as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_temp() -> (TempDir, FileManager) {
        let dir = tempfile::tempdir().unwrap();
        let fm = FileManager::open(dir.path().join("test.kz"), true).unwrap();
        (dir, fm)
    }

    #[test]
    fn test_open_missing_without_create() {
        let dir = tempfile::tempdir().unwrap();
        let result = FileManager::open(dir.path().join("absent.kz"), false);
        assert!(matches!(result, Err(Error::FileNotFound(_))));
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b").join("db.kz");
        let fm = FileManager::open(&nested, true).unwrap();
        assert_eq!(fm.page_count().unwrap(), 0);
        assert!(nested.exists());
    }

    #[test]
    fn test_allocate_and_roundtrip() {
        let (_dir, mut fm) = open_temp();
        let id = fm.allocate_page().unwrap();
        assert_eq!(id, 1);
        assert_eq!(fm.page_count().unwrap(), 1);

        let mut buf = vec![0u8; PAGE_SIZE];
        buf[0] = 0x42;
        buf[PAGE_SIZE - 1] = 0x99;
        fm.write_page(id, &buf).unwrap();

        let mut out = vec![0u8; PAGE_SIZE];
        fm.read_page(id, &mut out).unwrap();
        assert_eq!(out, buf);
    }

    #[test]
    fn test_allocated_page_is_zeroed() {
        let (_dir, mut fm) = open_temp();
        let id = fm.allocate_page().unwrap();
        let mut out = vec![0xFFu8; PAGE_SIZE];
        fm.read_page(id, &mut out).unwrap();
        assert!(out.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_read_out_of_range() {
        let (_dir, mut fm) = open_temp();
        let mut buf = vec![0u8; PAGE_SIZE];
        assert!(matches!(
            fm.read_page(1, &mut buf),
            Err(Error::PageNotFound(1))
        ));
        assert!(matches!(
            fm.read_page(0, &mut buf),
            Err(Error::PageNotFound(0))
        ));
    }

    #[test]
    fn test_write_cannot_extend() {
        let (_dir, mut fm) = open_temp();
        let buf = vec![0u8; PAGE_SIZE];
        assert!(matches!(fm.write_page(2, &buf), Err(Error::PageNotFound(2))));
    }

    #[test]
    fn test_bad_buffer_length() {
        let (_dir, mut fm) = open_temp();
        fm.allocate_page().unwrap();
        let mut small = vec![0u8; PAGE_SIZE - 1];
        assert!(matches!(
            fm.read_page(1, &mut small),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            fm.write_page(1, &small),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_table_path() {
        let path = FileManager::table_path(Path::new("/tmp/dbdir"), 12);
        assert_eq!(path, PathBuf::from("/tmp/dbdir/table_12.kz"));
    }
}
