//! Graph rewriter: garbage collection, deduplication, compaction and
//! re-serialization
//!
//! Four ordered, independently toggleable passes over the object set:
//! sweep (mark reachable from the trailer), deduplicate (structural
//! comparison of non-stream objects), compact (renumber survivors
//! 1..M), and renumber + serialize. Deduplication and compaction are
//! skipped for encrypted input: object numbers are baked into the
//! per-object keys and into the stored ciphertexts, so renumbering
//! would corrupt them.

mod pages;
mod write;

pub use pages::parse_page_ranges;

use crate::document::Document;
use crate::error::Result;
use crate::object::{Name, Object, ObjRef};
use crate::xref::XrefEntry;
use log::warn;
use std::io::Write as IoWrite;

/// Decompress image streams
pub const EXPAND_IMAGES: u8 = 1;
/// Decompress font streams
pub const EXPAND_FONTS: u8 = 2;
/// Decompress everything
pub const EXPAND_ALL: u8 = 0xFF;

/// Rewrite options
#[derive(Debug, Clone, Default)]
pub struct CleanOptions {
    /// 0 = none, 1 = sweep, 2 = also compact, 3 = also deduplicate
    pub garbage: u8,
    /// Bitmask of EXPAND_* flags controlling stream decompression
    pub expand: u8,
    /// Hex-armor binary stream data in the output
    pub ascii: bool,
    /// 1-based page range specs (`a`, `a-b`, `-b`, `a-`, comma
    /// separated); empty keeps every page
    pub pages: Vec<String>,
}

/// Rewrite `doc` into `out` according to the options
pub fn clean<W: IoWrite>(doc: &mut Document, out: W, opts: &CleanOptions) -> Result<()> {
    let mut cleaner = Cleaner::new(doc, opts);
    cleaner.run(&mut write::CountingWriter::new(out))
}

struct Cleaner<'a> {
    doc: &'a mut Document,
    opts: &'a CleanOptions,
    /// Number of slots in play; shrinks when compaction rebuilds the table
    len: usize,
    used: Vec<bool>,
    renumber: Vec<i32>,
    gens: Vec<u16>,
    offsets: Vec<u64>,
}

impl<'a> Cleaner<'a> {
    fn new(doc: &'a mut Document, opts: &'a CleanOptions) -> Self {
        Self {
            doc,
            opts,
            len: 0,
            used: Vec::new(),
            renumber: Vec::new(),
            gens: Vec::new(),
            offsets: Vec::new(),
        }
    }

    fn run<W: IoWrite>(&mut self, out: &mut write::CountingWriter<W>) -> Result<()> {
        // Objects hidden inside object streams must be ordinary cached
        // objects before their containers are dropped from the output.
        self.preload_object_streams();

        if !self.opts.pages.is_empty() {
            pages::retain_pages(self.doc, &self.opts.pages)?;
        }

        self.len = self.doc.xref.len();
        self.used = vec![false; self.len];
        self.renumber = (0..self.len as i32).collect();
        self.gens = vec![0; self.len];
        self.offsets = vec![0; self.len];

        if self.opts.garbage >= 1 {
            self.sweep();
        }
        if self.opts.garbage >= 3 {
            self.remove_duplicate_objs();
        }
        if self.opts.garbage >= 2 {
            self.compact_xref();
        }
        if self.opts.garbage >= 2 && !self.doc.is_encrypted() {
            self.renumber_objs();
        }

        self.write_document(out)
    }

    /// Resolve every object stored inside an object stream. A slot that
    /// cannot be loaded is dropped, not fatal to the whole rewrite.
    fn preload_object_streams(&mut self) {
        let nums: Vec<i32> = self
            .doc
            .xref
            .object_numbers()
            .filter(|&n| {
                self.doc
                    .xref
                    .get(n)
                    .map(|e| e.is_in_stream())
                    .unwrap_or(false)
            })
            .collect();
        for num in nums {
            if let Err(e) = self.doc.resolve(num, 0) {
                warn!("dropping unloadable object {}: {}", num, e);
                self.doc.xref.set(num, XrefEntry::free(0, 0));
            }
        }
    }

    // ---- Pass 1: sweep ----

    /// Mark every object reachable from the trailer. Marking happens
    /// before recursing, so cycles terminate.
    fn sweep(&mut self) {
        let mut stack = vec![Object::Dict(self.doc.trailer.clone())];
        while let Some(obj) = stack.pop() {
            match obj {
                Object::Ref(r) => self.sweep_ref(r, &mut stack),
                Object::Dict(dict) => stack.extend(dict.into_values()),
                Object::Array(items) => stack.extend(items),
                Object::Stream { dict, .. } => stack.extend(dict.into_values()),
                _ => {}
            }
        }
    }

    fn sweep_ref(&mut self, r: ObjRef, stack: &mut Vec<Object>) {
        let num = r.num;
        if num < 0 || num as usize >= self.used.len() {
            return;
        }
        if self.used[num as usize] {
            return;
        }
        self.used[num as usize] = true;

        // Bake in /Length of stream objects: the stream is re-measured
        // when written, so a Length left indirect would dangle once the
        // old Length object is collected.
        if self.doc.is_stream(num, r.generation) {
            self.bake_stream_length(num);
        }

        match self.doc.resolve(num, r.generation) {
            Ok(obj) => stack.push(obj),
            Err(e) => warn!("sweep: cannot load object {}: {}", num, e),
        }
    }

    fn bake_stream_length(&mut self, num: i32) {
        let length_ref = match self.doc.xref.cached(num) {
            Some(Object::Stream { dict, .. }) => match dict.get(&Name::new("Length")) {
                Some(Object::Ref(r)) => *r,
                _ => return,
            },
            _ => return,
        };
        if length_ref.num >= 0 && (length_ref.num as usize) < self.used.len() {
            self.used[length_ref.num as usize] = false;
        }
        match self.doc.resolve_ref(length_ref) {
            Ok(literal @ Object::Int(_)) => {
                if let Some(Object::Stream { dict, .. }) = self.doc.xref.cached_mut(num) {
                    dict.insert(Name::new("Length"), literal);
                }
            }
            _ => {
                // Leave broken
            }
        }
    }

    // ---- Pass 2: deduplicate ----

    /// Pairwise structural comparison of used, non-stream objects.
    /// Stream contents are never compared; that asymmetry is part of
    /// the output identity guarantees. The higher number is remapped to
    /// the lower and unmarked. Only the first duplicate per object is
    /// taken, so merging is not transitive within one pass.
    fn remove_duplicate_objs(&mut self) {
        for num in 1..self.len {
            // Only compare an object to objects preceding it
            for other in 1..num {
                if !self.used[num] || !self.used[other] {
                    continue;
                }

                // Comparing stream data contents would take too long
                if self.doc.is_stream(num as i32, 0) || self.doc.is_stream(other as i32, 0) {
                    continue;
                }

                let (Ok(a), Ok(b)) = (
                    self.doc.resolve(num as i32, 0),
                    self.doc.resolve(other as i32, 0),
                ) else {
                    // Assume different
                    continue;
                };
                if a != b {
                    continue;
                }

                // Keep the lowest numbered object
                self.renumber[num] = other as i32;
                self.renumber[other] = other as i32;
                self.used[num] = false;

                // One duplicate found, do not look for another
                break;
            }
        }
    }

    // ---- Pass 3: compact ----

    /// Cluster used objects at low numbers, in ascending order of their
    /// original number. Objects already remapped by deduplication
    /// inherit the compacted number of their target.
    fn compact_xref(&mut self) {
        let mut newnum = 1i32;
        for num in 1..self.len {
            if self.used[num] && self.renumber[num] == num as i32 {
                self.renumber[num] = newnum;
                newnum += 1;
            } else if self.renumber[num] != num as i32 {
                self.renumber[num] = self.renumber[self.renumber[num] as usize];
            }
        }
    }

    // ---- Pass 4: renumber ----

    /// Apply the renumbering map to every reference in the trailer and
    /// in every retained object, then rebuild the table compacted.
    fn renumber_objs(&mut self) {
        // Everything that will be written must be in the cache so its
        // references get rewritten.
        for num in 1..self.len {
            if self.used[num] {
                if let Err(e) = self.doc.resolve(num as i32, 0) {
                    warn!("renumber: cannot load object {}: {}", num, e);
                }
            }
        }

        let mut trailer = std::mem::take(&mut self.doc.trailer);
        let mut trailer_obj = Object::Dict(trailer);
        renumber_refs(&mut trailer_obj, &self.renumber);
        trailer = match trailer_obj {
            Object::Dict(d) => d,
            _ => unreachable!(),
        };
        self.doc.trailer = trailer;

        for num in 0..self.len {
            if let Some(obj) = self.doc.xref.cached_mut(num as i32) {
                renumber_refs(obj, &self.renumber);
            }
        }

        // Move used objects into a compacted table
        let mut old = self.doc.xref.take_entries();
        let mut entries: Vec<Option<XrefEntry>> = vec![None; old.len()];
        entries[0] = old[0].take();
        let mut newlen = 0usize;
        for num in 1..self.len {
            if self.used[num] {
                let target = self.renumber[num] as usize;
                if newlen < target {
                    newlen = target;
                }
                entries[target] = old[num].take();
            }
        }
        entries.truncate(newlen + 1);
        self.doc.xref.replace_entries(entries);

        self.len = newlen + 1;
        for num in 1..self.len {
            self.used[num] = true;
        }
    }
}

/// Rewrite every indirect reference in an object through the map.
/// Rewritten references carry generation zero; everything survives the
/// rewrite at generation zero.
fn renumber_refs(obj: &mut Object, map: &[i32]) {
    match obj {
        Object::Ref(r) => {
            if r.num >= 0 && (r.num as usize) < map.len() {
                *r = ObjRef::new(map[r.num as usize], 0);
            }
        }
        Object::Array(items) => {
            for item in items {
                renumber_refs(item, map);
            }
        }
        Object::Dict(dict) | Object::Stream { dict, .. } => {
            for (_, value) in dict.iter_mut() {
                renumber_refs(value, map);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renumber_refs_nested() {
        let map = vec![0, 1, 7, 3];
        let mut obj = Object::Array(vec![
            Object::Ref(ObjRef::new(2, 0)),
            Object::Int(2),
            Object::Array(vec![Object::Ref(ObjRef::new(3, 5))]),
        ]);
        renumber_refs(&mut obj, &map);
        let arr = obj.as_array().unwrap();
        assert_eq!(arr[0], Object::Ref(ObjRef::new(7, 0)));
        assert_eq!(arr[1], Object::Int(2));
        // Generations collapse to zero on rewrite
        assert_eq!(arr[2].as_array().unwrap()[0], Object::Ref(ObjRef::new(3, 0)));
    }

    #[test]
    fn test_renumber_refs_out_of_range_kept() {
        let map = vec![0, 1];
        let mut obj = Object::Ref(ObjRef::new(9, 0));
        renumber_refs(&mut obj, &map);
        assert_eq!(obj, Object::Ref(ObjRef::new(9, 0)));
    }
}
