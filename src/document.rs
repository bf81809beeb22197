//! PDF document handle
//!
//! Owns the file bytes, the cross-reference table and the trailer, and
//! resolves indirect objects on demand. Resolution is cached: an object
//! is parsed once and the table keeps it for the life of the handle.
//! A handle is single-threaded; resolution takes `&mut self` and there
//! are no internal suspension points.

use crate::crypt::Crypt;
use crate::error::{Error, Result};
use crate::filter::FilterChain;
use crate::lexer::{LexBuf, Lexer, Token};
use crate::object::{Dict, Name, ObjRef, Object};
use crate::parser::Parser;
use crate::xref::{StoreKind, XrefEntry, XrefTable};
use log::warn;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

/// Bound on recursion while resolving objects out of object streams.
/// An object stream that (transitively) claims to contain itself has to
/// fail, not hang.
const RESOLVE_DEPTH_LIMIT: usize = 32;

/// A PDF document
pub struct Document {
    pub(crate) data: Vec<u8>,
    pub(crate) version: String,
    pub(crate) xref: XrefTable,
    pub(crate) trailer: Dict,
    pub(crate) crypt: Option<Crypt>,
    /// Object number of the Encrypt dictionary; its strings are stored
    /// unencrypted and must not be run through the decryptor.
    pub(crate) encrypt_num: Option<i32>,
    /// Flat page list, built once on first page access
    pub(crate) pages: Option<Vec<ObjRef>>,
}

impl Document {
    /// Open a document from a file path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes(data)
    }

    /// Open a document from any reader
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(data)
    }

    /// Open a document from owned bytes
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        if data.len() < 8 {
            return Err(Error::syntax("file too small to be a PDF"));
        }
        let header = &data[..8.min(data.len())];
        if !header.starts_with(b"%PDF-") {
            return Err(Error::syntax("missing %PDF header"));
        }
        let version = String::from_utf8_lossy(&header[5..])
            .trim()
            .split_whitespace()
            .next()
            .unwrap_or("1.4")
            .to_string();

        let mut doc = Self {
            data,
            version,
            xref: XrefTable::new(),
            trailer: Dict::new(),
            crypt: None,
            encrypt_num: None,
            pages: None,
        };
        doc.parse()?;
        Ok(doc)
    }

    fn parse(&mut self) -> Result<()> {
        if let Err(e) = self.read_xref_chain() {
            warn!("cross-reference table unusable ({}), scavenging file", e);
            self.repair_xref()?;
        }
        self.xref.ensure_free_list_head();
        self.setup_encryption()?;
        if !self.needs_password() {
            self.apply_catalog_version();
        }
        Ok(())
    }

    /// Header version, possibly overridden by the catalog's Version
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn trailer(&self) -> &Dict {
        &self.trailer
    }

    pub fn is_encrypted(&self) -> bool {
        self.crypt.is_some()
    }

    /// True until a password (possibly the blank one, tried at open)
    /// has authenticated.
    pub fn needs_password(&self) -> bool {
        self.crypt.as_ref().is_some_and(|c| !c.is_authenticated())
    }

    /// Try a password against the security handler
    pub fn authenticate(&mut self, password: &str) -> bool {
        let ok = self
            .crypt
            .as_mut()
            .map(|c| c.authenticate(password.as_bytes()))
            .unwrap_or(true);
        if ok && self.crypt.is_some() {
            self.apply_catalog_version();
        }
        ok
    }

    /// One past the highest object number
    pub fn object_count(&self) -> usize {
        self.xref.len()
    }

    // ---- Resolution ----

    /// Resolve an indirect object identity to its value.
    ///
    /// Idempotent and cached. A dangling reference (number outside the
    /// table, or a free slot) resolves to `Object::Null`: callers treat
    /// that as "absent", not as an error.
    pub fn resolve(&mut self, num: i32, generation: u16) -> Result<Object> {
        let _ = generation;
        self.cache_object(num, 0)?;
        Ok(self.xref.cached(num).cloned().unwrap_or(Object::Null))
    }

    pub fn resolve_ref(&mut self, r: ObjRef) -> Result<Object> {
        self.resolve(r.num, r.generation)
    }

    /// Resolve one level of indirection; non-references come back as-is
    pub fn resolve_obj(&mut self, obj: &Object) -> Result<Object> {
        match obj {
            Object::Ref(r) => self.resolve(r.num, r.generation),
            other => Ok(other.clone()),
        }
    }

    /// Does this object carry a stream?
    pub fn is_stream(&mut self, num: i32, generation: u16) -> bool {
        let _ = generation;
        if self.cache_object(num, 0).is_err() {
            return false;
        }
        matches!(self.xref.cached(num), Some(Object::Stream { .. }))
    }

    /// Raw stream bytes exactly as stored (still filtered, still
    /// encrypted)
    pub fn load_raw_stream(&mut self, num: i32, generation: u16) -> Result<Vec<u8>> {
        let _ = generation;
        self.cache_object(num, 0)?;
        match self.xref.cached(num) {
            Some(Object::Stream { data, .. }) => Ok(data.clone()),
            _ => Err(Error::reference(format!("object {} is not a stream", num))),
        }
    }

    /// Decoded stream bytes: decryption first, then each filter left to
    /// right
    pub fn load_stream(&mut self, num: i32, generation: u16) -> Result<Vec<u8>> {
        self.cache_object(num, 0)?;
        let (dict, raw) = match self.xref.cached(num) {
            Some(Object::Stream { dict, data }) => (dict.clone(), data.clone()),
            _ => return Err(Error::reference(format!("object {} is not a stream", num))),
        };
        self.decode_stream_parts(num, generation, &dict, raw)
    }

    /// Replace (or install) the value of an object in the store
    pub fn update_object(&mut self, num: i32, obj: Object) {
        match self.xref.get_mut(num) {
            Some(entry) => {
                if entry.is_free() {
                    entry.kind = StoreKind::Offset { offset: 0 };
                }
                entry.cached = Some(obj);
            }
            None => {
                let mut entry = XrefEntry::at_offset(0, 0);
                entry.cached = Some(obj);
                self.xref.set(num, entry);
            }
        }
    }

    /// Load an object into its cache slot
    fn cache_object(&mut self, num: i32, depth: usize) -> Result<()> {
        if depth > RESOLVE_DEPTH_LIMIT {
            return Err(Error::reference(format!(
                "object {}: resolution recurses too deep (object stream cycle?)",
                num
            )));
        }
        if self.xref.is_absent(num) || self.xref.cached(num).is_some() {
            return Ok(());
        }

        let Some(entry) = self.xref.get(num) else {
            return Ok(());
        };
        let generation = entry.generation;
        let kind = entry.kind;
        match kind {
            StoreKind::Free { .. } => Ok(()),
            StoreKind::Offset { offset } => self.load_at_offset(num, generation, offset, depth),
            StoreKind::InStream { container, index } => {
                if container == num {
                    return Err(Error::reference(format!(
                        "object stream {} claims to contain itself",
                        num
                    )));
                }
                let obj = self.load_from_object_stream(container, index, num, depth)?;
                self.xref.set_cached(num, obj);
                Ok(())
            }
        }
    }

    fn load_at_offset(&mut self, num: i32, generation: u16, offset: usize, depth: usize) -> Result<()> {
        if offset >= self.data.len() {
            return Err(Error::reference(format!(
                "object {}: offset {} past end of file",
                num, offset
            )));
        }
        let ind = Parser::at(&self.data, offset).parse_indirect_object()?;
        if ind.num != num {
            return Err(Error::reference(format!(
                "found object {} while looking for {}",
                ind.num, num
            )));
        }

        let mut obj = match ind.stream_ofs {
            Some(stm_ofs) => {
                let dict = match ind.object {
                    Object::Dict(d) => d,
                    _ => return Err(Error::syntax("stream object lacks a dictionary")),
                };
                // Length may itself be indirect; resolve through the
                // table before slicing. The Length object is a distinct
                // number, never the stream itself.
                let length = match dict.get(&Name::new("Length")) {
                    Some(Object::Ref(r)) => {
                        let r = *r;
                        self.cache_object(r.num, depth + 1)?;
                        self.xref
                            .cached(r.num)
                            .and_then(|o| o.as_int())
                            .ok_or_else(|| {
                                Error::syntax(format!("object {}: indirect Length unusable", num))
                            })?
                    }
                    Some(Object::Int(n)) => *n,
                    _ => return Err(Error::syntax(format!("object {}: missing Length", num))),
                };
                if length < 0 || stm_ofs + length as usize > self.data.len() {
                    return Err(Error::syntax(format!(
                        "object {}: stream extends past end of file",
                        num
                    )));
                }
                let data = self.data[stm_ofs..stm_ofs + length as usize].to_vec();
                Object::Stream { dict, data }
            }
            None => ind.object,
        };

        // Strings of directly stored objects are encrypted; the Encrypt
        // dictionary itself is not.
        if let Some(crypt) = &self.crypt {
            if self.encrypt_num != Some(num) {
                crypt.decrypt_object(&mut obj, num, generation)?;
            }
        }

        self.xref.set_cached(num, obj);
        Ok(())
    }

    /// Resolve an object that lives inside an object stream. This
    /// re-enters the resolver for the container, so the depth guard
    /// travels along.
    fn load_from_object_stream(
        &mut self,
        container: i32,
        index: u16,
        for_num: i32,
        depth: usize,
    ) -> Result<Object> {
        self.cache_object(container, depth + 1)?;
        let (dict, raw) = match self.xref.cached(container) {
            Some(Object::Stream { dict, data }) => (dict.clone(), data.clone()),
            _ => {
                return Err(Error::reference(format!(
                    "object stream container {} is not a stream",
                    container
                )));
            }
        };
        if dict.get(&Name::new("Type")).and_then(|o| o.as_name()).map(|n| n.as_str())
            != Some("ObjStm")
        {
            return Err(Error::reference(format!(
                "object {} points into non-ObjStm container {}",
                for_num, container
            )));
        }

        let generation = self.xref.get(container).map(|e| e.generation).unwrap_or(0);
        let decoded = self.decode_stream_parts(container, generation, &dict, raw)?;

        let n = dict
            .get(&Name::new("N"))
            .and_then(|o| o.as_int())
            .ok_or_else(|| Error::syntax("object stream missing N"))? as usize;
        let first = dict
            .get(&Name::new("First"))
            .and_then(|o| o.as_int())
            .ok_or_else(|| Error::syntax("object stream missing First"))? as usize;
        if first > decoded.len() {
            return Err(Error::syntax("object stream First past end of data"));
        }

        // Header: N pairs of (object number, relative offset)
        let mut header = Parser::new(&decoded[..first]);
        let mut offsets = Vec::with_capacity(n);
        for _ in 0..n {
            let onum = header
                .parse_object()?
                .as_int()
                .ok_or_else(|| Error::syntax("object stream header corrupt"))?;
            let ofs = header
                .parse_object()?
                .as_int()
                .ok_or_else(|| Error::syntax("object stream header corrupt"))?;
            offsets.push((onum as i32, ofs as usize));
        }

        let idx = index as usize;
        let &(onum, rel) = offsets.get(idx).ok_or_else(|| {
            Error::reference(format!(
                "index {} out of range in object stream {}",
                idx, container
            ))
        })?;
        if onum != for_num {
            return Err(Error::reference(format!(
                "object stream {} slot {} holds object {}, expected {}",
                container, idx, onum, for_num
            )));
        }
        if first + rel > decoded.len() {
            return Err(Error::syntax("object stream offset past end of data"));
        }

        // Strings in here were covered by the container's decryption;
        // they are not deciphered a second time.
        Parser::at(&decoded, first + rel).parse_object()
    }

    /// Decrypt (when applicable) and run the filter chain of a stream
    fn decode_stream_parts(
        &mut self,
        num: i32,
        generation: u16,
        dict: &Dict,
        raw: Vec<u8>,
    ) -> Result<Vec<u8>> {
        let mut data = raw;

        if let Some(crypt) = &self.crypt {
            let exempt = !crypt.encrypt_metadata()
                && dict.get(&Name::new("Type")).and_then(|o| o.as_name()).map(|n| n.as_str())
                    == Some("Metadata");
            if !exempt {
                data = crypt.decrypt_data(&data, num, generation)?;
            }
        }

        let filter = self.resolve_obj(dict.get(&Name::new("Filter")).unwrap_or(&Object::Null))?;
        let mut parms =
            self.resolve_obj(dict.get(&Name::new("DecodeParms")).unwrap_or(&Object::Null))?;
        // Parameter containers may nest one more level of indirection
        match &mut parms {
            Object::Array(items) => {
                for item in items.iter_mut() {
                    *item = self.resolve_obj(item)?;
                }
            }
            Object::Dict(d) => {
                let resolved: Vec<(Name, Object)> = {
                    let mut out = Vec::with_capacity(d.len());
                    for (k, v) in d.iter() {
                        out.push((k.clone(), v.clone()));
                    }
                    out
                };
                for (k, v) in resolved {
                    let v = self.resolve_obj(&v)?;
                    d.insert(k, v);
                }
            }
            _ => {}
        }

        FilterChain::from_objects(&filter, &parms)?.decode(data)
    }

    /// The filter chain of a cached stream object, for callers that
    /// need to reason about it without decoding.
    pub(crate) fn stream_filter_chain(&mut self, num: i32) -> Result<FilterChain> {
        self.cache_object(num, 0)?;
        let dict = match self.xref.cached(num) {
            Some(Object::Stream { dict, .. }) => dict.clone(),
            _ => return Err(Error::reference(format!("object {} is not a stream", num))),
        };
        let filter = self.resolve_obj(dict.get(&Name::new("Filter")).unwrap_or(&Object::Null))?;
        let parms =
            self.resolve_obj(dict.get(&Name::new("DecodeParms")).unwrap_or(&Object::Null))?;
        FilterChain::from_objects(&filter, &parms)
    }

    // ---- Open path: cross-reference chain ----

    fn find_startxref(&self) -> Result<usize> {
        let tail_len = self.data.len().min(1024);
        let tail_start = self.data.len() - tail_len;
        let tail = &self.data[tail_start..];

        let pos = tail
            .windows(9)
            .rposition(|w| w == b"startxref")
            .ok_or_else(|| Error::syntax("missing startxref"))?;

        let mut lexer = Lexer::new(&self.data);
        lexer.seek(tail_start + pos + 9);
        let mut buf = LexBuf::new();
        match lexer.lex(&mut buf)? {
            Token::Int if buf.as_int() >= 0 => Ok(buf.as_int() as usize),
            _ => Err(Error::syntax("startxref offset is not a number")),
        }
    }

    fn read_xref_chain(&mut self) -> Result<()> {
        let mut offset = self.find_startxref()?;
        let mut visited: HashSet<usize> = HashSet::new();
        let mut first = true;

        loop {
            if !visited.insert(offset) {
                warn!("cross-reference chain loops at offset {}", offset);
                break;
            }
            let trailer = self.read_xref_section(offset)?;

            let prev = trailer.get(&Name::new("Prev")).and_then(|o| o.as_int());
            let xref_stm = trailer.get(&Name::new("XRefStm")).and_then(|o| o.as_int());

            if first {
                self.trailer = trailer;
                first = false;
            } else {
                // Older sections only contribute keys the newest lacks
                for (k, v) in trailer {
                    self.trailer.entry(k).or_insert(v);
                }
            }

            // Hybrid files: the xref stream complements the classic
            // table and is consulted before following Prev.
            if let Some(stm_ofs) = xref_stm {
                if stm_ofs >= 0 && visited.insert(stm_ofs as usize) {
                    if let Err(e) = self.read_xref_section(stm_ofs as usize) {
                        warn!("hybrid xref stream unreadable: {}", e);
                    }
                }
            }

            match prev {
                Some(p) if p >= 0 => offset = p as usize,
                _ => break,
            }
        }

        if !self.trailer.contains_key(&Name::new("Root")) {
            return Err(Error::syntax("trailer has no Root"));
        }
        if let Some(size) = self.trailer.get(&Name::new("Size")).and_then(|o| o.as_int()) {
            if size > 0 {
                self.xref.grow_to(size as usize);
            }
        }
        Ok(())
    }

    /// Read one classic section or one xref stream; returns its trailer
    fn read_xref_section(&mut self, offset: usize) -> Result<Dict> {
        if offset >= self.data.len() {
            return Err(Error::syntax(format!("xref offset {} past end of file", offset)));
        }

        let mut probe = Lexer::new(&self.data);
        probe.seek(offset);
        let mut buf = LexBuf::new();
        let is_classic = matches!(probe.lex(&mut buf), Ok(Token::Xref));

        if is_classic {
            let (entries, trailer) = Parser::at(&self.data, offset).parse_xref_section()?;
            for (num, entry) in entries {
                self.xref.set_if_vacant(num, entry);
            }
            Ok(trailer)
        } else {
            self.read_xref_stream(offset)
        }
    }

    /// Cross-reference stream: W field widths, Index subsections,
    /// entry types 0 (free), 1 (offset) and 2 (in object stream).
    fn read_xref_stream(&mut self, offset: usize) -> Result<Dict> {
        let ind = Parser::at(&self.data, offset).parse_indirect_object()?;
        let (dict, stm_ofs) = match (ind.object, ind.stream_ofs) {
            (Object::Dict(d), Some(ofs)) => (d, ofs),
            _ => return Err(Error::syntax("xref stream is not a stream object")),
        };
        if dict.get(&Name::new("Type")).and_then(|o| o.as_name()).map(|n| n.as_str())
            != Some("XRef")
        {
            return Err(Error::syntax("xref stream has wrong Type"));
        }

        // Everything in an xref stream dictionary is direct by
        // specification; Length in particular.
        let length = dict
            .get(&Name::new("Length"))
            .and_then(|o| o.as_int())
            .ok_or_else(|| Error::syntax("xref stream missing Length"))?;
        if length < 0 || stm_ofs + length as usize > self.data.len() {
            return Err(Error::syntax("xref stream data out of bounds"));
        }
        let raw = self.data[stm_ofs..stm_ofs + length as usize].to_vec();

        // Xref streams are never encrypted
        let filter = dict.get(&Name::new("Filter")).cloned().unwrap_or(Object::Null);
        let parms = dict.get(&Name::new("DecodeParms")).cloned().unwrap_or(Object::Null);
        let decoded = FilterChain::from_objects(&filter, &parms)?.decode(raw)?;

        let w = dict
            .get(&Name::new("W"))
            .and_then(|o| o.as_array())
            .ok_or_else(|| Error::syntax("xref stream missing W"))?;
        if w.len() < 3 {
            return Err(Error::syntax("xref stream W needs three widths"));
        }
        let w: Vec<usize> = w.iter().map(|o| o.as_int().unwrap_or(0) as usize).collect();
        let entry_size = w[0] + w[1] + w[2];
        if entry_size == 0 {
            return Err(Error::syntax("xref stream W is all zero"));
        }

        let size = dict
            .get(&Name::new("Size"))
            .and_then(|o| o.as_int())
            .ok_or_else(|| Error::syntax("xref stream missing Size"))?;
        let index: Vec<i64> = match dict.get(&Name::new("Index")).and_then(|o| o.as_array()) {
            Some(arr) => arr.iter().filter_map(|o| o.as_int()).collect(),
            None => vec![0, size],
        };

        let mut pos = 0usize;
        for pair in index.chunks(2) {
            let [start, count] = pair else { break };
            for i in 0..*count {
                if pos + entry_size > decoded.len() {
                    warn!("xref stream data shorter than its Index promises");
                    break;
                }
                let entry = &decoded[pos..pos + entry_size];
                pos += entry_size;

                let field = |a: usize, b: usize| -> u64 {
                    entry[a..b].iter().fold(0u64, |acc, &x| (acc << 8) | x as u64)
                };
                // A missing type field defaults to 1
                let kind = if w[0] > 0 { field(0, w[0]) } else { 1 };
                let f2 = field(w[0], w[0] + w[1]);
                let f3 = field(w[0] + w[1], entry_size);

                let num = (start + i) as i32;
                let entry = match kind {
                    0 => XrefEntry::free(f2 as i32, f3 as u16),
                    1 => XrefEntry::at_offset(f2 as usize, f3 as u16),
                    2 => XrefEntry::in_stream(f2 as i32, f3 as u16),
                    _ => continue,
                };
                self.xref.set_if_vacant(num, entry);
            }
        }

        Ok(dict)
    }

    // ---- Scavenging repair ----

    /// Last-ditch pass over a file whose xref is unusable: scan for
    /// `N G obj` headers and trailer dictionaries and rebuild the
    /// table from what is found. Best effort only.
    fn repair_xref(&mut self) -> Result<()> {
        let mut found: Vec<(i32, u16, usize)> = Vec::new();
        let mut trailers: Vec<Dict> = Vec::new();

        let mut lexer = Lexer::new(&self.data);
        let mut buf = LexBuf::new();
        // The two most recent integer tokens and the offset of the older
        let mut ints: [(i64, usize); 2] = [(0, 0), (0, 0)];
        let mut int_count = 0usize;

        loop {
            let tok_start = lexer.pos();
            let tok = match lexer.lex(&mut buf) {
                Ok(t) => t,
                Err(_) => {
                    // Binary garbage between objects; resynchronize
                    lexer.seek(tok_start + 1);
                    int_count = 0;
                    continue;
                }
            };
            match tok {
                Token::Eof => break,
                Token::Int => {
                    ints[0] = ints[1];
                    ints[1] = (buf.as_int(), tok_start);
                    int_count += 1;
                }
                Token::Obj if int_count >= 2 => {
                    let (num, ofs) = ints[0];
                    let (generation, _) = ints[1];
                    if (0..=i32::MAX as i64).contains(&num) && (0..=65535).contains(&generation) {
                        found.push((num as i32, generation as u16, ofs));
                    }
                    int_count = 0;
                    repair_skip_object_body(&self.data, &mut lexer, &mut buf);
                }
                Token::Trailer => {
                    int_count = 0;
                    let mut p = Parser::at(&self.data, lexer.pos());
                    if let Ok(Object::Dict(d)) = p.parse_object() {
                        trailers.push(d);
                        lexer.seek(p.pos());
                    }
                }
                _ => int_count = 0,
            }
        }

        if found.is_empty() {
            return Err(Error::syntax("no objects found while scavenging"));
        }

        self.xref = XrefTable::new();
        for (num, generation, ofs) in &found {
            // Later definitions overwrite earlier ones
            self.xref.set(*num, XrefEntry::at_offset(*ofs, *generation));
        }

        self.trailer = Dict::new();
        for trailer in trailers {
            for (k, v) in trailer {
                self.trailer.entry(k).or_insert(v);
            }
        }
        if !self.trailer.contains_key(&Name::new("Root")) {
            // Fall back to the first object that looks like a catalog
            let nums: Vec<i32> = found.iter().map(|(n, _, _)| *n).collect();
            let mut root = None;
            for num in nums {
                if let Ok(obj) = self.resolve(num, 0) {
                    if obj.type_name() == Some("Catalog") {
                        root = Some(num);
                        break;
                    }
                }
            }
            match root {
                Some(num) => {
                    self.trailer.insert(Name::new("Root"), Object::Ref(ObjRef::new(num, 0)));
                }
                None => return Err(Error::syntax("scavenge found no document catalog")),
            }
        }
        self.trailer
            .insert(Name::new("Size"), Object::Int(self.xref.len() as i64));
        warn!("rebuilt cross-reference table with {} objects", self.xref.len());
        Ok(())
    }

    // ---- Encryption setup ----

    fn setup_encryption(&mut self) -> Result<()> {
        let Some(enc_val) = self.trailer.get(&Name::new("Encrypt")).cloned() else {
            return Ok(());
        };
        if let Object::Ref(r) = enc_val {
            self.encrypt_num = Some(r.num);
        }
        let enc_obj = self.resolve_obj(&enc_val)?;
        let Some(enc_dict) = enc_obj.as_dict() else {
            return Err(Error::encryption("Encrypt entry is not a dictionary"));
        };

        let id_val = self.trailer.get(&Name::new("ID")).cloned().unwrap_or(Object::Null);
        let id_obj = self.resolve_obj(&id_val)?;
        let doc_id = id_obj
            .as_array()
            .and_then(|a| a.first())
            .and_then(|o| o.as_string())
            .map(|s| s.as_bytes().to_vec())
            .unwrap_or_default();

        let mut crypt = Crypt::from_dict(enc_dict, doc_id)?;
        // The open path tries the blank password on its own; callers
        // re-prompt through authenticate() as often as they like.
        crypt.authenticate(b"");
        self.crypt = Some(crypt);
        Ok(())
    }

    /// The catalog's Version entry overrides the header when present
    fn apply_catalog_version(&mut self) {
        let Some(root) = self.trailer.get(&Name::new("Root")).cloned() else {
            return;
        };
        if let Ok(catalog) = self.resolve_obj(&root) {
            if let Some(v) = catalog.get("Version").and_then(|o| o.as_name()) {
                self.version = v.as_str().to_string();
            }
        }
    }
}

/// After an `obj` header, wind the repair scan past the body so stream
/// bytes are never lexed.
fn repair_skip_object_body(data: &[u8], lexer: &mut Lexer, buf: &mut LexBuf) {
    loop {
        let mark = lexer.pos();
        match lexer.lex(buf) {
            Ok(Token::EndObj) | Ok(Token::Eof) => break,
            Ok(Token::Stream) => {
                let rest = &data[lexer.pos()..];
                match rest.windows(9).position(|w| w == b"endstream") {
                    Some(p) => lexer.seek(lexer.pos() + p + 9),
                    None => lexer.seek(data.len()),
                }
            }
            Ok(_) => {}
            Err(_) => {
                lexer.seek(mark + 1);
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    /// Assemble a classic PDF from (number, body) pairs
    pub(crate) fn build_pdf(objects: &[(i32, &[u8])], trailer_extra: &str) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"%PDF-1.4\n");
        let max = objects.iter().map(|(n, _)| *n).max().unwrap_or(0);
        let mut offsets = vec![None; (max + 1) as usize];
        for (num, body) in objects {
            offsets[*num as usize] = Some(out.len());
            out.extend_from_slice(format!("{} 0 obj\n", num).as_bytes());
            out.extend_from_slice(body);
            out.extend_from_slice(b"\nendobj\n");
        }
        let xref_pos = out.len();
        out.extend_from_slice(format!("xref\n0 {}\n", max + 1).as_bytes());
        out.extend_from_slice(b"0000000000 65535 f \n");
        for num in 1..=max {
            match offsets[num as usize] {
                Some(ofs) => out.extend_from_slice(format!("{:010} 00000 n \n", ofs).as_bytes()),
                None => out.extend_from_slice(b"0000000000 00000 f \n"),
            }
        }
        out.extend_from_slice(
            format!("trailer\n<< /Size {} {} >>\n", max + 1, trailer_extra).as_bytes(),
        );
        out.extend_from_slice(format!("startxref\n{}\n%%EOF\n", xref_pos).as_bytes());
        out
    }
}
