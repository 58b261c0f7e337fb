//! Buffer pool manager.
//!
//! A fixed array of frames caches pages from the database file. Frames
//! carry pin counts; only unpinned frames sit in the LRU list and are
//! eviction candidates. The manager also owns the process-wide
//! metadata page (page 1) and the persistent free list: freed pages are
//! linked into trunk pages whose payload is an array of freed leaf ids.

use std::collections::{HashMap, VecDeque};

use tracing::{debug, trace};

use crate::config::{
    CATALOG_SCHEMA_VERSION, DEFAULT_CACHE_SIZE, FIRST_PAGE_ID, INVALID_PAGE_ID, METADATA_MAGIC,
    PAGE_HEADER_SIZE, PAGE_SIZE,
};
use crate::error::{Error, Result};
use crate::storage::file::{FileManager, TableId};
use crate::storage::page::{Page, PageId, PageType};

// Metadata record field offsets, relative to the page header.
const META_MAGIC: usize = 0;
const META_VERSION: usize = 4;
const META_FIRST_TRUNK: usize = 8;
const META_FREE_COUNT: usize = 12;
const META_TABLES_ROOT: usize = 16;
const META_COLUMNS_ROOT: usize = 20;
const META_NEXT_TABLE_ID: usize = 24;

// Trunk page payload: next_trunk (4) + leaf_count (4) + leaf ids.
const TRUNK_HEADER_SIZE: usize = 8;

/// Number of leaf ids one trunk page can hold.
pub const fn trunk_capacity() -> usize {
    (PAGE_SIZE - PAGE_HEADER_SIZE - TRUNK_HEADER_SIZE) / 4
}

#[derive(Debug)]
struct Frame {
    page_id: PageId,
    page: Page,
    dirty: bool,
    pin_count: u32,
}

impl Frame {
    fn empty() -> Self {
        Self {
            page_id: INVALID_PAGE_ID,
            page: Page::new(),
            dirty: false,
            pin_count: 0,
        }
    }
}

/// Page cache with pin/unpin, LRU eviction, and the persistent free
/// list.
#[derive(Debug)]
pub struct PageManager {
    file: FileManager,
    capacity: usize,
    frames: Vec<Frame>,
    /// page id -> frame index for resident pages.
    page_table: HashMap<PageId, usize>,
    /// Unpinned resident pages, front = most recently used.
    lru: VecDeque<PageId>,
    first_trunk_id: PageId,
    free_count: u32,
    tables_root: PageId,
    columns_root: PageId,
    next_table_id: TableId,
    version: u32,
}

impl PageManager {
    /// Open a pool over the database file with the default capacity.
    pub fn new(file: FileManager) -> Result<Self> {
        Self::with_capacity(file, DEFAULT_CACHE_SIZE)
    }

    pub fn with_capacity(file: FileManager, capacity: usize) -> Result<Self> {
        let capacity = capacity.max(1);
        let mut frames = Vec::with_capacity(capacity);
        for _ in 0..capacity {
            frames.push(Frame::empty());
        }
        let mut pm = Self {
            file,
            capacity,
            frames,
            page_table: HashMap::new(),
            lru: VecDeque::new(),
            first_trunk_id: INVALID_PAGE_ID,
            free_count: 0,
            tables_root: INVALID_PAGE_ID,
            columns_root: INVALID_PAGE_ID,
            next_table_id: 1,
            version: CATALOG_SCHEMA_VERSION,
        };
        pm.bootstrap_if_needed()?;
        pm.load_metadata()?;
        Ok(pm)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn free_count(&self) -> u32 {
        self.free_count
    }

    pub fn catalog_tables_root(&self) -> PageId {
        self.tables_root
    }

    pub fn catalog_columns_root(&self) -> PageId {
        self.columns_root
    }

    pub fn next_table_id(&self) -> TableId {
        self.next_table_id
    }

    /// Pages in the underlying file.
    pub fn page_count(&self) -> Result<u64> {
        self.file.page_count()
    }

    pub fn set_catalog_tables_root(&mut self, id: PageId) -> Result<()> {
        self.tables_root = id;
        self.save_metadata()
    }

    pub fn set_catalog_columns_root(&mut self, id: PageId) -> Result<()> {
        self.columns_root = id;
        self.save_metadata()
    }

    pub fn set_next_table_id(&mut self, id: TableId) -> Result<()> {
        self.next_table_id = id;
        self.save_metadata()
    }

    // ========== Page lifecycle ==========

    /// Allocate a page: pop the free list if possible, otherwise extend
    /// the file. The page comes back pinned, zeroed, initialized to
    /// `page_type`, and already flushed so metadata and page state stay
    /// consistent on disk.
    pub fn new_page(&mut self, page_type: PageType) -> Result<PageId> {
        let id = match self.pop_free_page()? {
            Some(id) => id,
            None => self.file.allocate_page()?,
        };

        let idx = self.obtain_frame(id)?;
        let frame = &mut self.frames[idx];
        frame.page.data_mut().fill(0);
        frame.page.init(page_type, id);
        frame.dirty = true;
        self.flush(id)?;
        trace!(page_id = id, ?page_type, "new page");
        Ok(id)
    }

    /// Bring a page into the cache. With `pin` the frame's pin count is
    /// incremented and the frame leaves the LRU; without, the frame is
    /// only touched. Returns the frame index for [`PageManager::page`]
    /// / [`PageManager::page_mut`].
    pub fn fetch(&mut self, id: PageId, pin: bool) -> Result<usize> {
        if id < FIRST_PAGE_ID {
            return Err(Error::PageNotFound(id));
        }

        if let Some(&idx) = self.page_table.get(&id) {
            let frame = &mut self.frames[idx];
            if pin {
                if frame.pin_count == 0 {
                    remove_from_lru(&mut self.lru, id);
                }
                frame.pin_count += 1;
            } else if frame.pin_count == 0 {
                remove_from_lru(&mut self.lru, id);
                self.lru.push_front(id);
            }
            return Ok(idx);
        }

        let idx = self.acquire_frame(id, pin)?;
        if let Err(e) = self.file.read_page(id, self.frames[idx].page.data_mut()) {
            // Load failed: release the frame again.
            self.page_table.remove(&id);
            remove_from_lru(&mut self.lru, id);
            self.frames[idx] = Frame::empty();
            return Err(e);
        }
        Ok(idx)
    }

    /// Immutable access to a fetched frame.
    pub fn page(&self, index: usize) -> &Page {
        &self.frames[index].page
    }

    /// Mutable access to a fetched frame. The caller still reports
    /// dirtiness through [`PageManager::unpin`] or
    /// [`PageManager::mark_dirty`].
    pub fn page_mut(&mut self, index: usize) -> &mut Page {
        &mut self.frames[index].page
    }

    /// Drop one pin. When the pin count reaches zero the frame
    /// re-enters the LRU at the front.
    pub fn unpin(&mut self, id: PageId, dirty: bool) -> Result<()> {
        let &idx = self.page_table.get(&id).ok_or(Error::PageNotFound(id))?;
        let frame = &mut self.frames[idx];
        if frame.pin_count == 0 {
            return Err(Error::PageLocked(id));
        }
        frame.pin_count -= 1;
        if dirty {
            frame.dirty = true;
        }
        if frame.pin_count == 0 {
            remove_from_lru(&mut self.lru, id);
            self.lru.push_front(id);
        }
        Ok(())
    }

    pub fn mark_dirty(&mut self, id: PageId) -> Result<()> {
        let &idx = self.page_table.get(&id).ok_or(Error::PageNotFound(id))?;
        self.frames[idx].dirty = true;
        Ok(())
    }

    /// Return a page to the free list. The page is zeroed, marked FREE
    /// and flushed, then linked into the head trunk (or becomes a new
    /// trunk itself).
    pub fn free_page(&mut self, id: PageId) -> Result<()> {
        if id <= FIRST_PAGE_ID {
            return Err(Error::InvalidArgument(format!(
                "cannot free reserved page {id}"
            )));
        }

        let idx = self.fetch(id, true)?;
        {
            let frame = &mut self.frames[idx];
            frame.page.data_mut().fill(0);
            frame.page.init(PageType::Free, id);
            frame.dirty = true;
        }
        self.flush(id)?;
        self.unpin(id, false)?;

        if self.first_trunk_id != INVALID_PAGE_ID {
            let head = self.first_trunk_id;
            let mut trunk = self.read_page_direct(head)?;
            let leaf_count = get_u32(trunk.data(), PAGE_HEADER_SIZE + 4) as usize;
            if leaf_count < trunk_capacity() {
                let slot = PAGE_HEADER_SIZE + TRUNK_HEADER_SIZE + leaf_count * 4;
                put_u32(trunk.data_mut(), slot, id);
                put_u32(trunk.data_mut(), PAGE_HEADER_SIZE + 4, (leaf_count + 1) as u32);
                self.file.write_page(head, trunk.data())?;
            } else {
                // Head trunk is full: the freed page becomes the new
                // head, pointing back at the old one.
                self.write_trunk_header(id, head, 0)?;
                self.first_trunk_id = id;
            }
        } else {
            self.write_trunk_header(id, INVALID_PAGE_ID, 0)?;
            self.first_trunk_id = id;
        }

        self.free_count += 1;
        self.save_metadata()?;
        debug!(page_id = id, free_count = self.free_count, "freed page");
        Ok(())
    }

    /// Write back one page if it is resident and dirty.
    pub fn flush(&mut self, id: PageId) -> Result<()> {
        if let Some(&idx) = self.page_table.get(&id) {
            let frame = &mut self.frames[idx];
            if frame.dirty {
                self.file.write_page(frame.page_id, frame.page.data())?;
                frame.dirty = false;
            }
        }
        Ok(())
    }

    /// Write back every dirty frame.
    pub fn flush_all(&mut self) -> Result<()> {
        for frame in &mut self.frames {
            if frame.page_id != INVALID_PAGE_ID && frame.dirty {
                self.file.write_page(frame.page_id, frame.page.data())?;
                frame.dirty = false;
            }
        }
        Ok(())
    }

    /// Replace a page's on-disk image wholesale, keeping any resident
    /// frame coherent. Used by the catalog page rewrites.
    pub fn overwrite_page(&mut self, id: PageId, image: &Page) -> Result<()> {
        self.file.write_page(id, image.data())?;
        if let Some(&idx) = self.page_table.get(&id) {
            let frame = &mut self.frames[idx];
            frame.page.data_mut().copy_from_slice(image.data());
            frame.dirty = false;
        }
        Ok(())
    }

    // ========== Frame management ==========

    // A frame for `id`, pinned once. Reuses the resident frame when the
    // id is already cached (a recycled free-list page), so the page
    // table keeps exactly one frame per id.
    fn obtain_frame(&mut self, id: PageId) -> Result<usize> {
        if let Some(&idx) = self.page_table.get(&id) {
            let frame = &mut self.frames[idx];
            if frame.pin_count != 0 {
                return Err(Error::Internal(format!("reusing pinned page {id}")));
            }
            remove_from_lru(&mut self.lru, id);
            frame.pin_count = 1;
            frame.dirty = false;
            return Ok(idx);
        }
        self.acquire_frame(id, true)
    }

    fn acquire_frame(&mut self, id: PageId, pin: bool) -> Result<usize> {
        let idx = match self.find_free_frame() {
            Some(idx) => idx,
            None => self.evict_frame()?,
        };
        let frame = &mut self.frames[idx];
        frame.page_id = id;
        frame.dirty = false;
        frame.pin_count = u32::from(pin);
        if !pin {
            self.lru.push_front(id);
        }
        self.page_table.insert(id, idx);
        Ok(idx)
    }

    fn find_free_frame(&self) -> Option<usize> {
        self.frames
            .iter()
            .position(|f| f.page_id == INVALID_PAGE_ID)
    }

    // Evict the LRU tail. Fails with CACHE_FULL when every frame is
    // pinned.
    fn evict_frame(&mut self) -> Result<usize> {
        let victim = self.lru.pop_back().ok_or(Error::CacheFull)?;
        let idx = *self
            .page_table
            .get(&victim)
            .ok_or_else(|| Error::Internal(format!("LRU victim {victim} not in page table")))?;
        let frame = &mut self.frames[idx];
        if frame.pin_count != 0 {
            return Err(Error::Internal(format!("evicting pinned page {victim}")));
        }
        if frame.dirty {
            self.file.write_page(frame.page_id, frame.page.data())?;
        }
        trace!(page_id = victim, "evicted page");
        self.page_table.remove(&victim);
        self.frames[idx] = Frame::empty();
        Ok(idx)
    }

    // ========== Free-list trunks ==========

    fn pop_free_page(&mut self) -> Result<Option<PageId>> {
        if self.first_trunk_id == INVALID_PAGE_ID || self.free_count == 0 {
            return Ok(None);
        }

        let head = self.first_trunk_id;
        let mut trunk = self.read_page_direct(head)?;
        let leaf_count = get_u32(trunk.data(), PAGE_HEADER_SIZE + 4) as usize;
        let id = if leaf_count > 0 {
            let slot = PAGE_HEADER_SIZE + TRUNK_HEADER_SIZE + (leaf_count - 1) * 4;
            let leaf = get_u32(trunk.data(), slot);
            put_u32(trunk.data_mut(), PAGE_HEADER_SIZE + 4, (leaf_count - 1) as u32);
            self.file.write_page(head, trunk.data())?;
            leaf
        } else {
            // Head trunk has no leaves left: hand out the trunk page
            // itself and advance the list head.
            let next = get_u32(trunk.data(), PAGE_HEADER_SIZE);
            self.first_trunk_id = next;
            head
        };
        self.free_count -= 1;
        self.save_metadata()?;
        Ok(Some(id))
    }

    fn write_trunk_header(&mut self, trunk_id: PageId, next: PageId, leaf_count: u32) -> Result<()> {
        let mut page = self.read_page_direct(trunk_id)?;
        put_u32(page.data_mut(), PAGE_HEADER_SIZE, next);
        put_u32(page.data_mut(), PAGE_HEADER_SIZE + 4, leaf_count);
        self.file.write_page(trunk_id, page.data())
    }

    // Trunk and metadata traffic bypasses the frame cache on purpose:
    // these pages are never handed out to callers.
    fn read_page_direct(&mut self, id: PageId) -> Result<Page> {
        let mut page = Page::new();
        self.file.read_page(id, page.data_mut())?;
        Ok(page)
    }

    // ========== Metadata page ==========

    fn bootstrap_if_needed(&mut self) -> Result<()> {
        if self.file.page_count()? > 0 {
            return Ok(());
        }
        debug!(path = %self.file.path().display(), "bootstrapping database file");

        let meta_id = self.file.allocate_page()?;
        let mut meta = Page::new();
        meta.init(PageType::Metadata, meta_id);
        self.file.write_page(meta_id, meta.data())?;

        self.tables_root = self.allocate_catalog_root()?;
        self.columns_root = self.allocate_catalog_root()?;
        self.first_trunk_id = INVALID_PAGE_ID;
        self.free_count = 0;
        self.next_table_id = 1;
        self.version = CATALOG_SCHEMA_VERSION;
        self.save_metadata()
    }

    fn allocate_catalog_root(&mut self) -> Result<PageId> {
        let id = self.file.allocate_page()?;
        let mut page = Page::new();
        page.init(PageType::Data, id);
        self.file.write_page(id, page.data())?;
        Ok(id)
    }

    fn load_metadata(&mut self) -> Result<()> {
        let meta = self.read_page_direct(FIRST_PAGE_ID)?;
        let base = PAGE_HEADER_SIZE;
        let magic = get_u32(meta.data(), base + META_MAGIC);

        if magic != METADATA_MAGIC {
            // Unknown image: rewrite a fresh metadata record and
            // reallocate whatever is missing.
            self.first_trunk_id = INVALID_PAGE_ID;
            self.free_count = 0;
            self.tables_root = INVALID_PAGE_ID;
            self.columns_root = INVALID_PAGE_ID;
            self.next_table_id = 1;
            self.version = CATALOG_SCHEMA_VERSION;
        } else {
            self.version = get_u32(meta.data(), base + META_VERSION);
            self.first_trunk_id = get_u32(meta.data(), base + META_FIRST_TRUNK);
            self.free_count = get_u32(meta.data(), base + META_FREE_COUNT);
            if self.version >= 2 {
                self.tables_root = get_u32(meta.data(), base + META_TABLES_ROOT);
                self.columns_root = get_u32(meta.data(), base + META_COLUMNS_ROOT);
                self.next_table_id = get_u32(meta.data(), base + META_NEXT_TABLE_ID);
            } else {
                self.tables_root = INVALID_PAGE_ID;
                self.columns_root = INVALID_PAGE_ID;
                self.next_table_id = 1;
            }
        }

        if self.tables_root < FIRST_PAGE_ID {
            self.tables_root = self.allocate_catalog_root()?;
        }
        if self.columns_root < FIRST_PAGE_ID {
            self.columns_root = self.allocate_catalog_root()?;
        }
        if self.next_table_id == 0 {
            self.next_table_id = 1;
        }
        if self.version != CATALOG_SCHEMA_VERSION {
            self.version = CATALOG_SCHEMA_VERSION;
        }
        self.save_metadata()
    }

    fn save_metadata(&mut self) -> Result<()> {
        let mut meta = self.read_page_direct(FIRST_PAGE_ID)?;
        let base = PAGE_HEADER_SIZE;
        let data = meta.data_mut();
        put_u32(data, base + META_MAGIC, METADATA_MAGIC);
        put_u32(data, base + META_VERSION, self.version);
        put_u32(data, base + META_FIRST_TRUNK, self.first_trunk_id);
        put_u32(data, base + META_FREE_COUNT, self.free_count);
        put_u32(data, base + META_TABLES_ROOT, self.tables_root);
        put_u32(data, base + META_COLUMNS_ROOT, self.columns_root);
        put_u32(data, base + META_NEXT_TABLE_ID, self.next_table_id);
        self.file.write_page(FIRST_PAGE_ID, meta.data())?;

        // Keep any resident copy coherent.
        if let Some(&idx) = self.page_table.get(&FIRST_PAGE_ID) {
            let frame = &mut self.frames[idx];
            frame.page.data_mut().copy_from_slice(meta.data());
            frame.dirty = false;
        }
        Ok(())
    }
}

impl Drop for PageManager {
    fn drop(&mut self) {
        let _ = self.flush_all();
    }
}

fn remove_from_lru(lru: &mut VecDeque<PageId>, id: PageId) {
    if let Some(pos) = lru.iter().position(|&p| p == id) {
        lru.remove(pos);
    }
}

fn get_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

fn put_u32(data: &mut [u8], offset: usize, value: u32) {
    data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_pool(capacity: usize) -> (TempDir, PageManager) {
        let dir = tempfile::tempdir().unwrap();
        let fm = FileManager::open(dir.path().join("pool.kz"), true).unwrap();
        let pm = PageManager::with_capacity(fm, capacity).unwrap();
        (dir, pm)
    }

    #[test]
    fn test_bootstrap_layout() {
        let (_dir, pm) = open_pool(8);
        // Metadata page plus the two catalog roots.
        assert_eq!(pm.page_count().unwrap(), 3);
        assert_eq!(pm.catalog_tables_root(), 2);
        assert_eq!(pm.catalog_columns_root(), 3);
        assert_eq!(pm.next_table_id(), 1);
        assert_eq!(pm.free_count(), 0);
    }

    #[test]
    fn test_new_page_pinned_and_typed() {
        let (_dir, mut pm) = open_pool(8);
        let id = pm.new_page(PageType::Data).unwrap();
        assert_eq!(id, 4);

        let idx = pm.fetch(id, false).unwrap();
        assert_eq!(pm.page(idx).page_type(), PageType::Data);
        assert_eq!(pm.page(idx).page_id(), id);

        // Still pinned from new_page: a second unpin must fail.
        pm.unpin(id, false).unwrap();
        assert!(matches!(pm.unpin(id, false), Err(Error::PageLocked(_))));
    }

    #[test]
    fn test_fetch_unknown_page() {
        let (_dir, mut pm) = open_pool(8);
        assert!(matches!(pm.fetch(99, true), Err(Error::PageNotFound(99))));
        assert!(matches!(pm.fetch(0, true), Err(Error::PageNotFound(0))));
        assert!(matches!(pm.unpin(99, false), Err(Error::PageNotFound(99))));
    }

    #[test]
    fn test_dirty_page_survives_eviction() {
        let (_dir, mut pm) = open_pool(2);
        let a = pm.new_page(PageType::Data).unwrap();
        {
            let idx = pm.fetch(a, false).unwrap();
            let page = pm.page_mut(idx);
            let slot = page.insert(b"persist me").unwrap().unwrap();
            assert_eq!(slot, 0);
        }
        pm.mark_dirty(a).unwrap();
        pm.unpin(a, true).unwrap();

        // Fill the pool so `a` gets evicted.
        let b = pm.new_page(PageType::Data).unwrap();
        let c = pm.new_page(PageType::Data).unwrap();
        pm.unpin(b, false).unwrap();
        pm.unpin(c, false).unwrap();

        let idx = pm.fetch(a, true).unwrap();
        assert_eq!(pm.page(idx).read(0).unwrap(), b"persist me");
        pm.unpin(a, false).unwrap();
    }

    #[test]
    fn test_cache_full_when_all_pinned() {
        let (_dir, mut pm) = open_pool(2);
        let a = pm.new_page(PageType::Data).unwrap();
        let b = pm.new_page(PageType::Data).unwrap();
        // Both frames pinned: the next allocation cannot find a frame.
        let err = pm.new_page(PageType::Data).unwrap_err();
        assert!(matches!(err, Error::CacheFull));
        pm.unpin(a, false).unwrap();
        pm.unpin(b, false).unwrap();
    }

    #[test]
    fn test_free_page_reuse() {
        let (_dir, mut pm) = open_pool(8);
        let id = pm.new_page(PageType::Data).unwrap();
        pm.unpin(id, false).unwrap();
        let count_before = pm.page_count().unwrap();

        pm.free_page(id).unwrap();
        assert_eq!(pm.free_count(), 1);

        let reused = pm.new_page(PageType::Data).unwrap();
        assert_eq!(reused, id);
        assert_eq!(pm.free_count(), 0);
        assert_eq!(pm.page_count().unwrap(), count_before);
        pm.unpin(reused, false).unwrap();
    }

    #[test]
    fn test_free_list_prefers_freed_ids() {
        let (_dir, mut pm) = open_pool(8);
        let mut ids = Vec::new();
        for _ in 0..5 {
            let id = pm.new_page(PageType::Data).unwrap();
            pm.unpin(id, false).unwrap();
            ids.push(id);
        }
        for &id in &ids {
            pm.free_page(id).unwrap();
        }
        assert_eq!(pm.free_count(), 5);

        for _ in 0..5 {
            let id = pm.new_page(PageType::Data).unwrap();
            pm.unpin(id, false).unwrap();
            assert!(ids.contains(&id), "id {id} not drawn from freed set");
        }
        assert_eq!(pm.free_count(), 0);
    }

    #[test]
    fn test_cannot_free_reserved_pages() {
        let (_dir, mut pm) = open_pool(8);
        assert!(matches!(pm.free_page(0), Err(Error::InvalidArgument(_))));
        assert!(matches!(pm.free_page(1), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_metadata_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.kz");
        {
            let fm = FileManager::open(&path, true).unwrap();
            let mut pm = PageManager::new(fm).unwrap();
            pm.set_next_table_id(17).unwrap();
            let id = pm.new_page(PageType::Data).unwrap();
            pm.unpin(id, false).unwrap();
            pm.free_page(id).unwrap();
        }
        let fm = FileManager::open(&path, false).unwrap();
        let pm = PageManager::new(fm).unwrap();
        assert_eq!(pm.next_table_id(), 17);
        assert_eq!(pm.free_count(), 1);
    }

    #[test]
    fn test_lru_order() {
        let (_dir, mut pm) = open_pool(3);
        let a = pm.new_page(PageType::Data).unwrap();
        let b = pm.new_page(PageType::Data).unwrap();
        let c = pm.new_page(PageType::Data).unwrap();
        pm.unpin(a, false).unwrap();
        pm.unpin(b, false).unwrap();
        pm.unpin(c, false).unwrap();

        // Touch `a` so `b` becomes the eviction victim.
        pm.fetch(a, false).unwrap();
        let d = pm.new_page(PageType::Data).unwrap();
        pm.unpin(d, false).unwrap();

        assert!(pm.page_table.contains_key(&a));
        assert!(!pm.page_table.contains_key(&b));
        assert!(pm.page_table.contains_key(&c));
    }
}
