//! Cross-reference table - the indirect object store
//!
//! Maps each object number to its storage location and owns the parsed
//! object once it has been resolved. The table is the sole arena for
//! resolved values: every reference between objects is a (number,
//! generation) pair looked up here, never an owning pointer, so cycles
//! in the document graph are safe to traverse.

use crate::object::Object;

/// Where an object's bytes live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// Free slot; `next` is the next free object number (0 terminates)
    Free { next: i32 },
    /// Ordinary object at a byte offset in the file
    Offset { offset: usize },
    /// Compressed object inside an object stream
    InStream { container: i32, index: u16 },
}

/// One cross-reference entry
///
/// `cached` is populated on first resolution and never evicted while
/// the document lives.
#[derive(Debug, Clone)]
pub struct XrefEntry {
    pub kind: StoreKind,
    pub generation: u16,
    pub cached: Option<Object>,
}

impl XrefEntry {
    pub fn free(next: i32, generation: u16) -> Self {
        Self {
            kind: StoreKind::Free { next },
            generation,
            cached: None,
        }
    }

    pub fn at_offset(offset: usize, generation: u16) -> Self {
        Self {
            kind: StoreKind::Offset { offset },
            generation,
            cached: None,
        }
    }

    pub fn in_stream(container: i32, index: u16) -> Self {
        // Compressed objects always have generation 0
        Self {
            kind: StoreKind::InStream { container, index },
            generation: 0,
            cached: None,
        }
    }

    pub fn is_free(&self) -> bool {
        matches!(self.kind, StoreKind::Free { .. })
    }

    pub fn is_in_stream(&self) -> bool {
        matches!(self.kind, StoreKind::InStream { .. })
    }
}

/// The cross-reference table: a dense slot per object number
#[derive(Debug, Default)]
pub struct XrefTable {
    entries: Vec<Option<XrefEntry>>,
}

impl XrefTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_size(size: usize) -> Self {
        let mut entries = Vec::new();
        entries.resize_with(size, || None);
        Self { entries }
    }

    /// Number of slots (one past the highest object number)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ensure at least `size` slots exist
    pub fn grow_to(&mut self, size: usize) {
        if self.entries.len() < size {
            self.entries.resize_with(size, || None);
        }
    }

    /// Hard-set an entry, growing the table as needed
    pub fn set(&mut self, num: i32, entry: XrefEntry) {
        if num < 0 {
            return;
        }
        let num = num as usize;
        self.grow_to(num + 1);
        self.entries[num] = Some(entry);
    }

    /// Set an entry only if the slot has not been claimed yet
    ///
    /// Incremental-update sections are read newest first; the newest
    /// definition of an object wins, so older sections only fill slots
    /// still vacant.
    pub fn set_if_vacant(&mut self, num: i32, entry: XrefEntry) {
        if num < 0 {
            return;
        }
        let idx = num as usize;
        self.grow_to(idx + 1);
        if self.entries[idx].is_none() {
            self.entries[idx] = Some(entry);
        }
    }

    pub fn get(&self, num: i32) -> Option<&XrefEntry> {
        if num < 0 {
            return None;
        }
        self.entries.get(num as usize).and_then(|e| e.as_ref())
    }

    pub fn get_mut(&mut self, num: i32) -> Option<&mut XrefEntry> {
        if num < 0 {
            return None;
        }
        self.entries.get_mut(num as usize).and_then(|e| e.as_mut())
    }

    /// A number outside the table, an unclaimed slot, or a free-listed
    /// slot all count as absent: references to them resolve to null.
    pub fn is_absent(&self, num: i32) -> bool {
        match self.get(num) {
            None => true,
            Some(e) => e.is_free(),
        }
    }

    pub fn cached(&self, num: i32) -> Option<&Object> {
        self.get(num).and_then(|e| e.cached.as_ref())
    }

    pub fn cached_mut(&mut self, num: i32) -> Option<&mut Object> {
        self.get_mut(num).and_then(|e| e.cached.as_mut())
    }

    pub fn set_cached(&mut self, num: i32, obj: Object) {
        if let Some(entry) = self.get_mut(num) {
            entry.cached = Some(obj);
        }
    }

    /// Make sure object 0 heads the free list
    pub fn ensure_free_list_head(&mut self) {
        self.grow_to(1);
        if self.entries[0].is_none() {
            self.entries[0] = Some(XrefEntry::free(0, 65535));
        }
    }

    /// Object numbers of every claimed slot, ascending
    pub fn object_numbers(&self) -> impl Iterator<Item = i32> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_some())
            .map(|(n, _)| n as i32)
    }

    /// Swap in a rebuilt slot vector (the rewriter's compaction step)
    pub(crate) fn replace_entries(&mut self, entries: Vec<Option<XrefEntry>>) {
        self.entries = entries;
    }

    /// Move the slots out, leaving an empty table
    pub(crate) fn take_entries(&mut self) -> Vec<Option<XrefEntry>> {
        std::mem::take(&mut self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_kinds() {
        assert!(XrefEntry::free(3, 1).is_free());
        assert!(!XrefEntry::at_offset(100, 0).is_free());
        assert!(XrefEntry::in_stream(5, 2).is_in_stream());
        assert_eq!(XrefEntry::in_stream(5, 2).generation, 0);
    }

    #[test]
    fn test_set_and_get() {
        let mut table = XrefTable::new();
        table.set(5, XrefEntry::at_offset(12345, 0));
        assert_eq!(table.len(), 6);
        match table.get(5).unwrap().kind {
            StoreKind::Offset { offset } => assert_eq!(offset, 12345),
            _ => panic!("expected offset entry"),
        }
        assert!(table.get(99).is_none());
    }

    #[test]
    fn test_first_seen_wins() {
        let mut table = XrefTable::new();
        table.set_if_vacant(2, XrefEntry::at_offset(100, 0));
        // An older section's definition of the same object is ignored
        table.set_if_vacant(2, XrefEntry::at_offset(999, 0));
        match table.get(2).unwrap().kind {
            StoreKind::Offset { offset } => assert_eq!(offset, 100),
            _ => panic!("expected offset entry"),
        }
    }

    #[test]
    fn test_is_absent() {
        let mut table = XrefTable::new();
        table.set(1, XrefEntry::at_offset(10, 0));
        table.set(2, XrefEntry::free(0, 1));
        assert!(!table.is_absent(1));
        assert!(table.is_absent(2));
        assert!(table.is_absent(3));
        assert!(table.is_absent(-1));
    }

    #[test]
    fn test_cache_slot() {
        let mut table = XrefTable::new();
        table.set(1, XrefEntry::at_offset(10, 0));
        assert!(table.cached(1).is_none());
        table.set_cached(1, Object::Int(7));
        assert_eq!(table.cached(1).and_then(|o| o.as_int()), Some(7));
        if let Some(obj) = table.cached_mut(1) {
            *obj = Object::Int(8);
        }
        assert_eq!(table.cached(1).and_then(|o| o.as_int()), Some(8));
    }

    #[test]
    fn test_free_list_head() {
        let mut table = XrefTable::new();
        table.ensure_free_list_head();
        let head = table.get(0).unwrap();
        assert!(head.is_free());
        assert_eq!(head.generation, 65535);
    }
}
