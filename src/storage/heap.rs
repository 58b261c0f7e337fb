//! Table heaps.
//!
//! A table heap is a doubly linked chain of DATA pages rooted at the
//! table's root page. Rows are addressed by [`RowLocation`] and
//! tombstoned on delete; reclaimed space comes back only through
//! truncation or whole-page reuse via the free list.

use std::sync::{Arc, Mutex};

use tracing::trace;

use crate::config::FIRST_PAGE_ID;
use crate::error::{Error, Result};
use crate::storage::buffer_pool::PageManager;
use crate::storage::page::{PageId, PageType, SlotId};

/// Buffer pool handle shared between the heap, catalog, and executors.
pub type SharedPageManager = Arc<Mutex<PageManager>>;

/// Address of one row: the page it lives on and its slot index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RowLocation {
    pub page_id: PageId,
    pub slot: SlotId,
}

impl RowLocation {
    pub fn new(page_id: PageId, slot: SlotId) -> Self {
        Self { page_id, slot }
    }
}

fn is_valid_page(id: PageId) -> bool {
    id >= FIRST_PAGE_ID
}

/// Heap of records for one table.
#[derive(Debug)]
pub struct TableHeap {
    pager: SharedPageManager,
    root_page_id: PageId,
    tail_page_id: PageId,
}

impl TableHeap {
    /// Open the heap rooted at `root_page_id`. The root must be a DATA
    /// page; the chain is walked once to cache the tail.
    pub fn new(pager: SharedPageManager, root_page_id: PageId) -> Result<Self> {
        if !is_valid_page(root_page_id) {
            return Err(Error::InvalidArgument(format!(
                "invalid table root {root_page_id}"
            )));
        }

        let tail_page_id = {
            let mut pm = pager.lock().unwrap();
            let idx = pm.fetch(root_page_id, true)?;
            let page_type = pm.page(idx).page_type();
            if page_type != PageType::Data {
                pm.unpin(root_page_id, false)?;
                return Err(Error::InvalidPageType {
                    page_id: root_page_id,
                    found: page_type as u8,
                });
            }
            pm.unpin(root_page_id, false)?;
            Self::find_tail(&mut pm, root_page_id)?
        };

        Ok(Self {
            pager,
            root_page_id,
            tail_page_id,
        })
    }

    pub fn root_page_id(&self) -> PageId {
        self.root_page_id
    }

    /// Insert a record, chaining a fresh page onto the tail when no
    /// existing page has room. Returns the row's location.
    pub fn insert(&mut self, payload: &[u8]) -> Result<RowLocation> {
        if payload.len() > u16::MAX as usize {
            return Err(Error::RecordTooLarge(payload.len()));
        }

        let pager = self.pager.clone();
        let mut pm = pager.lock().unwrap();

        let mut current = self.tail_page_id;
        while is_valid_page(current) {
            let idx = pm.fetch(current, true)?;
            match pm.page_mut(idx).insert(payload) {
                Ok(Some(slot)) => {
                    pm.unpin(current, true)?;
                    self.tail_page_id = current;
                    return Ok(RowLocation::new(current, slot));
                }
                Ok(None) => {
                    let next = pm.page(idx).next_page_id();
                    pm.unpin(current, false)?;
                    if is_valid_page(next) {
                        current = next;
                        continue;
                    }
                    return self.append_new_page(&mut pm, current, payload);
                }
                Err(e) => {
                    pm.unpin(current, false)?;
                    return Err(e);
                }
            }
        }
        let root = self.root_page_id;
        self.append_new_page(&mut pm, root, payload)
    }

    /// Update the row at `loc`. A payload no longer than the current
    /// one is rewritten in place and `loc` returned unchanged; a longer
    /// payload tombstones the slot and reinserts, returning the new
    /// location. Callers must use the returned location.
    pub fn update(&mut self, loc: RowLocation, payload: &[u8]) -> Result<RowLocation> {
        if payload.len() > u16::MAX as usize {
            return Err(Error::RecordTooLarge(payload.len()));
        }
        if !is_valid_page(loc.page_id) {
            return Err(Error::RecordNotFound(format!(
                "invalid page {} for update",
                loc.page_id
            )));
        }

        let updated = {
            let mut pm = self.pager.lock().unwrap();
            let idx = pm.fetch(loc.page_id, true)?;
            match pm.page_mut(idx).update(loc.slot, payload) {
                Ok(updated) => {
                    pm.unpin(loc.page_id, updated)?;
                    updated
                }
                Err(e) => {
                    pm.unpin(loc.page_id, false)?;
                    return Err(e);
                }
            }
        };
        if updated {
            return Ok(loc);
        }

        if !self.erase(loc)? {
            return Err(Error::RecordNotFound(format!(
                "row {}:{} vanished during update",
                loc.page_id, loc.slot
            )));
        }
        self.insert(payload)
    }

    /// Tombstone the row at `loc`. Returns false when the slot is
    /// already dead or out of range.
    pub fn erase(&mut self, loc: RowLocation) -> Result<bool> {
        if !is_valid_page(loc.page_id) {
            return Ok(false);
        }
        let mut pm = self.pager.lock().unwrap();
        let idx = pm.fetch(loc.page_id, true)?;
        match pm.page_mut(idx).erase(loc.slot) {
            Ok(erased) => {
                pm.unpin(loc.page_id, erased)?;
                Ok(erased)
            }
            Err(e) => {
                pm.unpin(loc.page_id, false)?;
                Err(e)
            }
        }
    }

    /// Copy out the row at `loc`, or `None` for dead/out-of-range
    /// slots.
    pub fn read(&self, loc: RowLocation) -> Result<Option<Vec<u8>>> {
        if !is_valid_page(loc.page_id) {
            return Ok(None);
        }
        let mut pm = self.pager.lock().unwrap();
        let idx = pm.fetch(loc.page_id, true)?;
        let payload = pm.page(idx).read(loc.slot);
        pm.unpin(loc.page_id, false)?;
        Ok(payload)
    }

    /// Empty the heap: reset the root page in place and free every
    /// chained page back to the free list.
    pub fn truncate(&mut self) -> Result<()> {
        let mut pm = self.pager.lock().unwrap();

        let idx = pm.fetch(self.root_page_id, true)?;
        let next = {
            let page = pm.page_mut(idx);
            let next = page.next_page_id();
            page.set_next_page_id(crate::config::INVALID_PAGE_ID);
            page.set_prev_page_id(crate::config::INVALID_PAGE_ID);
            page.clear_records();
            next
        };
        pm.unpin(self.root_page_id, true)?;

        let mut current = next;
        while is_valid_page(current) {
            let idx = pm.fetch(current, true)?;
            let nxt = pm.page(idx).next_page_id();
            pm.unpin(current, false)?;
            pm.free_page(current)?;
            current = nxt;
        }

        self.tail_page_id = self.root_page_id;
        trace!(root = self.root_page_id, "heap truncated");
        Ok(())
    }

    /// Forward-only scan over live rows, in page-chain order then
    /// slot order. Each yielded payload is an owned copy; at most one
    /// page is pinned at a time, and never across yields.
    pub fn scan(&self) -> TableIter {
        TableIter {
            pager: self.pager.clone(),
            page_id: self.root_page_id,
            slot: 0,
        }
    }

    fn find_tail(pm: &mut PageManager, start: PageId) -> Result<PageId> {
        let mut current = start;
        loop {
            let idx = pm.fetch(current, true)?;
            let next = pm.page(idx).next_page_id();
            pm.unpin(current, false)?;
            if !is_valid_page(next) {
                return Ok(current);
            }
            current = next;
        }
    }

    fn append_new_page(
        &mut self,
        pm: &mut PageManager,
        previous_tail: PageId,
        payload: &[u8],
    ) -> Result<RowLocation> {
        let new_id = pm.new_page(PageType::Data)?;
        let idx = pm.fetch(new_id, false)?;
        {
            let page = pm.page_mut(idx);
            page.set_prev_page_id(previous_tail);
            page.set_next_page_id(crate::config::INVALID_PAGE_ID);
        }
        let slot = match pm.page_mut(idx).insert(payload) {
            Ok(Some(slot)) => slot,
            Ok(None) => {
                pm.unpin(new_id, false)?;
                pm.free_page(new_id)?;
                return Err(Error::PageFull(format!(
                    "record of {} bytes does not fit in an empty page",
                    payload.len()
                )));
            }
            Err(e) => {
                pm.unpin(new_id, false)?;
                return Err(e);
            }
        };
        pm.unpin(new_id, true)?;

        let prev_idx = pm.fetch(previous_tail, true)?;
        pm.page_mut(prev_idx).set_next_page_id(new_id);
        pm.unpin(previous_tail, true)?;

        self.tail_page_id = new_id;
        trace!(page_id = new_id, prev = previous_tail, "chained heap page");
        Ok(RowLocation::new(new_id, slot))
    }
}

/// Owned-payload iterator over a heap's live rows.
pub struct TableIter {
    pager: SharedPageManager,
    page_id: PageId,
    slot: SlotId,
}

impl Iterator for TableIter {
    type Item = (RowLocation, Vec<u8>);

    fn next(&mut self) -> Option<Self::Item> {
        let pager = self.pager.clone();
        let mut pm = pager.lock().unwrap();

        while is_valid_page(self.page_id) {
            let idx = match pm.fetch(self.page_id, true) {
                Ok(idx) => idx,
                Err(_) => {
                    self.page_id = crate::config::INVALID_PAGE_ID;
                    return None;
                }
            };
            let (slot_count, next) = {
                let page = pm.page(idx);
                (page.slot_count(), page.next_page_id())
            };

            while self.slot < slot_count {
                let slot = self.slot;
                self.slot += 1;
                if let Some(payload) = pm.page(idx).read(slot) {
                    let loc = RowLocation::new(self.page_id, slot);
                    let _ = pm.unpin(self.page_id, false);
                    return Some((loc, payload));
                }
            }

            let _ = pm.unpin(self.page_id, false);
            self.page_id = next;
            self.slot = 0;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::file::FileManager;
    use tempfile::TempDir;

    fn open_heap() -> (TempDir, SharedPageManager, TableHeap) {
        let dir = tempfile::tempdir().unwrap();
        let fm = FileManager::open(dir.path().join("heap.kz"), true).unwrap();
        let pager: SharedPageManager = Arc::new(Mutex::new(PageManager::new(fm).unwrap()));
        let root = {
            let mut pm = pager.lock().unwrap();
            let id = pm.new_page(PageType::Data).unwrap();
            pm.unpin(id, false).unwrap();
            id
        };
        let heap = TableHeap::new(pager.clone(), root).unwrap();
        (dir, pager, heap)
    }

    #[test]
    fn test_insert_and_read() {
        let (_dir, _pager, mut heap) = open_heap();
        let loc = heap.insert(b"row one").unwrap();
        assert_eq!(heap.read(loc).unwrap().unwrap(), b"row one");
    }

    #[test]
    fn test_rejects_non_data_root() {
        let dir = tempfile::tempdir().unwrap();
        let fm = FileManager::open(dir.path().join("bad.kz"), true).unwrap();
        let pager: SharedPageManager = Arc::new(Mutex::new(PageManager::new(fm).unwrap()));
        let root = {
            let mut pm = pager.lock().unwrap();
            let id = pm.new_page(PageType::Index).unwrap();
            pm.unpin(id, false).unwrap();
            id
        };
        let err = TableHeap::new(pager, root).unwrap_err();
        assert!(matches!(err, Error::InvalidPageType { .. }));
    }

    #[test]
    fn test_chains_new_pages() {
        let (_dir, pager, mut heap) = open_heap();
        let payload = vec![7u8; 900];
        let mut locations = Vec::new();
        for _ in 0..12 {
            locations.push(heap.insert(&payload).unwrap());
        }
        // 900-byte rows cannot all share one 4 KiB page.
        let pages: std::collections::HashSet<_> =
            locations.iter().map(|l| l.page_id).collect();
        assert!(pages.len() > 1);

        // Chain links are consistent.
        let mut pm = pager.lock().unwrap();
        let root = heap.root_page_id();
        let idx = pm.fetch(root, true).unwrap();
        let next = pm.page(idx).next_page_id();
        assert!(next >= FIRST_PAGE_ID);
        pm.unpin(root, false).unwrap();
        let idx = pm.fetch(next, true).unwrap();
        assert_eq!(pm.page(idx).prev_page_id(), root);
        pm.unpin(next, false).unwrap();
        drop(pm);

        for loc in &locations {
            assert_eq!(heap.read(*loc).unwrap().unwrap(), payload);
        }
    }

    #[test]
    fn test_erase_is_idempotent() {
        let (_dir, _pager, mut heap) = open_heap();
        let loc = heap.insert(b"gone soon").unwrap();
        assert!(heap.erase(loc).unwrap());
        assert!(!heap.erase(loc).unwrap());
        assert!(heap.read(loc).unwrap().is_none());
    }

    #[test]
    fn test_update_in_place_keeps_location() {
        let (_dir, _pager, mut heap) = open_heap();
        let loc = heap.insert(b"a fairly long original value").unwrap();
        let new_loc = heap.update(loc, b"short").unwrap();
        assert_eq!(new_loc, loc);
        assert_eq!(heap.read(loc).unwrap().unwrap(), b"short");
    }

    #[test]
    fn test_update_grow_relocates() {
        let (_dir, _pager, mut heap) = open_heap();
        let loc = heap.insert(b"tiny").unwrap();
        let new_loc = heap
            .update(loc, b"this replacement is much longer than the original")
            .unwrap();
        assert_ne!(new_loc, loc);
        // Old slot is tombstoned, new slot holds the value.
        assert!(heap.read(loc).unwrap().is_none());
        assert_eq!(
            heap.read(new_loc).unwrap().unwrap(),
            b"this replacement is much longer than the original"
        );
        // Scan sees exactly the live row.
        let rows: Vec<_> = heap.scan().collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, new_loc);
    }

    #[test]
    fn test_scan_order_and_tombstones() {
        let (_dir, _pager, mut heap) = open_heap();
        let a = heap.insert(b"a").unwrap();
        let b = heap.insert(b"b").unwrap();
        let c = heap.insert(b"c").unwrap();
        heap.erase(b).unwrap();

        let rows: Vec<_> = heap.scan().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], (a, b"a".to_vec()));
        assert_eq!(rows[1], (c, b"c".to_vec()));
    }

    #[test]
    fn test_truncate_resets_to_single_root() {
        let (_dir, pager, mut heap) = open_heap();
        let big = vec![1u8; 1000];
        for _ in 0..10 {
            heap.insert(&big).unwrap();
        }
        let freed_before = pager.lock().unwrap().free_count();
        heap.truncate().unwrap();
        let freed_after = pager.lock().unwrap().free_count();
        assert!(freed_after > freed_before);

        assert_eq!(heap.scan().count(), 0);
        // Root accepts inserts again and is the sole page.
        let loc = heap.insert(b"fresh").unwrap();
        assert_eq!(loc.page_id, heap.root_page_id());
        assert_eq!(loc.slot, 0);
    }

    #[test]
    fn test_record_too_large() {
        let (_dir, _pager, mut heap) = open_heap();
        let too_big = vec![0u8; u16::MAX as usize + 1];
        assert!(matches!(
            heap.insert(&too_big),
            Err(Error::RecordTooLarge(_))
        ));
        // A record that fits u16 but not a page surfaces as PAGE_FULL.
        let page_buster = vec![0u8; 5000];
        assert!(matches!(
            heap.insert(&page_buster),
            Err(Error::PageFull(_))
        ));
    }
}
