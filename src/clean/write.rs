//! Output serialization for the rewriter
//!
//! Writes the retained objects, a classic cross-reference section with
//! its chained free list, and a fresh trailer.

use super::{Cleaner, EXPAND_ALL, EXPAND_FONTS, EXPAND_IMAGES};
use crate::error::Result;
use crate::object::{Dict, Name, Object};
use crate::write::format_object;
use log::warn;
use std::io::Write;

/// Byte-counting writer so xref offsets reflect the bytes written
pub(super) struct CountingWriter<W: Write> {
    inner: W,
    count: u64,
}

impl<W: Write> CountingWriter<W> {
    pub(super) fn new(inner: W) -> Self {
        Self { inner, count: 0 }
    }

    fn position(&self) -> u64 {
        self.count
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl Cleaner<'_> {
    pub(super) fn write_document<W: Write>(&mut self, out: &mut CountingWriter<W>) -> Result<()> {
        write!(out, "%PDF-{}\n", self.doc.version())?;
        // Binary marker so transports treat the file as binary
        out.write_all(b"%\xE2\xE3\xCF\xD3\n\n")?;

        for num in 0..self.len {
            self.gens[num] = match self.doc.xref.get(num as i32) {
                Some(entry) if entry.is_in_stream() => 0,
                Some(entry) => entry.generation,
                None => 0,
            };

            if self.opts.garbage >= 1 && !self.used[num] {
                continue;
            }

            let present = self
                .doc
                .xref
                .get(num as i32)
                .map(|e| !e.is_free())
                .unwrap_or(false);
            if present {
                self.used[num] = true;
                self.offsets[num] = out.position();
                self.write_object(out, num)?;
            }
        }

        // Chain the free slots through object 0
        let mut lastfree = 0usize;
        for num in 0..self.len {
            if !self.used[num] {
                if num > 0 && self.gens[num] < 65535 {
                    self.gens[num] += 1;
                }
                self.offsets[lastfree] = num as u64;
                lastfree = num;
            }
        }

        self.write_xref(out)
    }

    fn write_object<W: Write>(&mut self, out: &mut CountingWriter<W>, num: usize) -> Result<()> {
        let generation = self.gens[num];
        let obj = match self.doc.resolve(num as i32, generation) {
            Ok(obj) => obj,
            Err(e) => {
                warn!("dropping unwritable object {}: {}", num, e);
                self.used[num] = false;
                return Ok(());
            }
        };
        if obj.is_null() {
            self.used[num] = false;
            return Ok(());
        }

        // Container objects are never retained in the legacy-format
        // output; their contents were preloaded as ordinary objects.
        if matches!(obj.type_name(), Some("ObjStm") | Some("XRef")) {
            self.used[num] = false;
            return Ok(());
        }

        let tight = self.opts.expand == 0;
        match obj {
            Object::Stream { dict, .. } => {
                let mut dontexpand = false;
                if self.opts.expand != 0 && self.opts.expand != EXPAND_ALL {
                    if is_image(&dict) {
                        dontexpand = self.opts.expand & EXPAND_IMAGES == 0;
                    }
                    if is_font(&dict) {
                        dontexpand = self.opts.expand & EXPAND_FONTS == 0;
                    }
                }
                let decodable = self
                    .doc
                    .stream_filter_chain(num as i32)
                    .map(|c| c.decodable())
                    .unwrap_or(false);
                if self.opts.expand != 0 && !dontexpand && decodable {
                    self.expand_stream(out, num, generation, dict)?;
                } else {
                    self.copy_stream(out, num, generation, dict)?;
                }
            }
            other => {
                write!(out, "{} {} obj\n", num, generation)?;
                out.write_all(&format_object(&other, tight))?;
                out.write_all(b"\nendobj\n\n")?;
            }
        }
        Ok(())
    }

    /// Write a stream object with its stored bytes untouched
    fn copy_stream<W: Write>(
        &mut self,
        out: &mut CountingWriter<W>,
        num: usize,
        generation: u16,
        mut dict: Dict,
    ) -> Result<()> {
        let mut buf = match self.doc.load_raw_stream(num as i32, generation) {
            Ok(buf) => buf,
            Err(e) => {
                warn!("dropping stream object {}: {}", num, e);
                self.used[num] = false;
                return Ok(());
            }
        };

        if self.opts.ascii && is_binary_stream(&buf) {
            buf = hexbuf(&buf);
            add_hex_filter(&mut dict);
            dict.insert(Name::new("Length"), Object::Int(buf.len() as i64));
        }

        self.write_stream_frame(out, num, generation, &dict, &buf)
    }

    /// Write a stream object decompressed, re-measuring its length
    fn expand_stream<W: Write>(
        &mut self,
        out: &mut CountingWriter<W>,
        num: usize,
        generation: u16,
        mut dict: Dict,
    ) -> Result<()> {
        let mut buf = match self.doc.load_stream(num as i32, generation) {
            Ok(buf) => buf,
            Err(e) => {
                // A corrupt compressed segment is not fatal to the
                // rewrite; fall back to the stored bytes.
                warn!("cannot decode stream {}, copying raw: {}", num, e);
                return self.copy_stream(out, num, generation, dict);
            }
        };

        dict.shift_remove(&Name::new("Filter"));
        dict.shift_remove(&Name::new("DecodeParms"));

        if self.opts.ascii && is_binary_stream(&buf) {
            buf = hexbuf(&buf);
            add_hex_filter(&mut dict);
        }
        dict.insert(Name::new("Length"), Object::Int(buf.len() as i64));

        self.write_stream_frame(out, num, generation, &dict, &buf)
    }

    fn write_stream_frame<W: Write>(
        &mut self,
        out: &mut CountingWriter<W>,
        num: usize,
        generation: u16,
        dict: &Dict,
        data: &[u8],
    ) -> Result<()> {
        let tight = self.opts.expand == 0;
        write!(out, "{} {} obj\n", num, generation)?;
        out.write_all(&format_object(&Object::Dict(dict.clone()), tight))?;
        out.write_all(b"\nstream\n")?;
        out.write_all(data)?;
        out.write_all(b"\nendstream\nendobj\n\n")?;
        Ok(())
    }

    /// Classic xref section, fresh trailer, startxref, EOF marker
    fn write_xref<W: Write>(&mut self, out: &mut CountingWriter<W>) -> Result<()> {
        let startxref = out.position();

        write!(out, "xref\n0 {}\n", self.len)?;
        for num in 0..self.len {
            let kind = if self.used[num] { 'n' } else { 'f' };
            write!(out, "{:010} {:05} {} \n", self.offsets[num], self.gens[num], kind)?;
        }
        out.write_all(b"\n")?;

        let mut trailer = Dict::new();
        trailer.insert(Name::new("Size"), Object::Int(self.len as i64));
        for key in ["Info", "Root", "ID"] {
            if let Some(value) = self.doc.trailer.get(&Name::new(key)) {
                trailer.insert(Name::new(key), value.clone());
            }
        }

        out.write_all(b"trailer\n")?;
        out.write_all(&format_object(&Object::Dict(trailer), self.opts.expand == 0))?;
        out.write_all(b"\n")?;
        write!(out, "startxref\n{}\n%%EOF\n", startxref)?;
        out.flush()?;
        Ok(())
    }
}

fn dict_name<'a>(dict: &'a Dict, key: &str) -> Option<&'a str> {
    dict.get(&Name::new(key)).and_then(|o| o.as_name()).map(|n| n.as_str())
}

fn is_image(dict: &Dict) -> bool {
    dict_name(dict, "Type") == Some("XObject") && dict_name(dict, "Subtype") == Some("Image")
}

fn is_font(dict: &Dict) -> bool {
    matches!(dict_name(dict, "Type"), Some("Font") | Some("FontDescriptor"))
        || dict.contains_key(&Name::new("Length1"))
        || dict.contains_key(&Name::new("Length2"))
        || dict.contains_key(&Name::new("Length3"))
        || matches!(dict_name(dict, "Subtype"), Some("Type1C") | Some("CIDFontType0C"))
}

fn is_binary(byte: u8) -> bool {
    if matches!(byte, b'\n' | b'\r' | b'\t') {
        return false;
    }
    byte < 32 || byte > 127
}

fn is_binary_stream(buf: &[u8]) -> bool {
    buf.iter().any(|&b| is_binary(b))
}

/// Hex-encode with a line break every 32 input bytes and a trailing
/// end-of-data marker
fn hexbuf(data: &[u8]) -> Vec<u8> {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = Vec::with_capacity(data.len() * 2 + data.len() / 32 + 2);
    for (i, &byte) in data.iter().enumerate() {
        out.push(HEX[(byte >> 4) as usize]);
        out.push(HEX[(byte & 15) as usize]);
        if (i + 1) % 32 == 0 {
            out.push(b'\n');
        }
    }
    out.push(b'>');
    out.push(b'\n');
    out
}

/// Prepend ASCIIHexDecode to the filter chain, keeping DecodeParms
/// aligned
fn add_hex_filter(dict: &mut Dict) {
    let ahx = Object::Name(Name::new("ASCIIHexDecode"));
    let filter = dict.get(&Name::new("Filter")).cloned();
    let parms = dict.get(&Name::new("DecodeParms")).cloned();

    match filter {
        Some(Object::Name(f)) => {
            dict.insert(
                Name::new("Filter"),
                Object::Array(vec![ahx, Object::Name(f)]),
            );
            if let Some(dp @ Object::Dict(_)) = parms {
                dict.insert(
                    Name::new("DecodeParms"),
                    Object::Array(vec![Object::Null, dp]),
                );
            }
        }
        Some(Object::Array(mut list)) => {
            list.insert(0, ahx);
            dict.insert(Name::new("Filter"), Object::Array(list));
            if let Some(Object::Array(mut dp)) = parms {
                dp.insert(0, Object::Null);
                dict.insert(Name::new("DecodeParms"), Object::Array(dp));
            }
        }
        _ => {
            dict.insert(Name::new("Filter"), ahx);
        }
    }
}
