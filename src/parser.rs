//! PDF object parser - recursive descent over lexer tokens
//!
//! Builds composite object values, indirect-object framing, classic
//! cross-reference sections and trailer dictionaries.

use crate::error::{Error, Result};
use crate::lexer::{LexBuf, Lexer, Token};
use crate::object::{Array, Dict, Name, ObjRef, Object, PdfString};
use crate::xref::XrefEntry;
use log::warn;

/// Composite nesting deeper than this is treated as malformed input.
const MAX_NESTING: usize = 100;

/// A parsed `num generation obj ... endobj` unit
#[derive(Debug)]
pub struct IndirectObject {
    pub num: i32,
    pub generation: u16,
    pub object: Object,
    /// Offset of the first stream byte, when the object carries one.
    /// The byte range cannot be sliced here: its length may live behind
    /// an indirect `Length` that only the cross-reference table can
    /// resolve.
    pub stream_ofs: Option<usize>,
}

/// PDF parser over a byte slice
pub struct Parser<'a> {
    data: &'a [u8],
    lx: Lexer<'a>,
    buf: LexBuf,
}

impl<'a> Parser<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            lx: Lexer::new(data),
            buf: LexBuf::new(),
        }
    }

    /// Parser positioned at a byte offset
    pub fn at(data: &'a [u8], pos: usize) -> Self {
        let mut p = Self::new(data);
        p.lx.seek(pos);
        p
    }

    pub fn pos(&self) -> usize {
        self.lx.pos()
    }

    pub fn seek(&mut self, pos: usize) {
        self.lx.seek(pos);
    }

    /// Parse the next object from the input
    pub fn parse_object(&mut self) -> Result<Object> {
        let tok = self.lx.lex(&mut self.buf)?;
        self.parse_from(tok, 0)
    }

    fn parse_from(&mut self, tok: Token, depth: usize) -> Result<Object> {
        if depth > MAX_NESTING {
            return Err(Error::syntax("object nesting too deep"));
        }
        match tok {
            Token::Null => Ok(Object::Null),
            Token::True => Ok(Object::Bool(true)),
            Token::False => Ok(Object::Bool(false)),
            Token::Int => {
                let num = self.buf.as_int();
                self.try_parse_reference(num)
            }
            Token::Real => Ok(Object::Real(self.buf.as_float())),
            Token::String | Token::HexString => {
                Ok(Object::String(PdfString::new(self.buf.buffer.clone())))
            }
            Token::Name => Ok(Object::Name(Name::new(&self.buf.as_str()))),
            Token::OpenArray => self.parse_array(depth + 1),
            Token::OpenDict => self.parse_dict(depth + 1),
            Token::Eof => Err(Error::syntax("unexpected end of input")),
            other => Err(Error::syntax(format!("unexpected token {:?}", other))),
        }
    }

    /// `num generation R` lookahead; falls back to a plain integer
    fn try_parse_reference(&mut self, num: i64) -> Result<Object> {
        let mark = self.lx.pos();
        if let Ok(Token::Int) = self.lx.lex(&mut self.buf) {
            let generation = self.buf.as_int();
            if let Ok(Token::R) = self.lx.lex(&mut self.buf) {
                if num >= 0 && num <= i32::MAX as i64 && (0..=65535).contains(&generation) {
                    return Ok(Object::Ref(ObjRef::new(num as i32, generation as u16)));
                }
                return Err(Error::syntax(format!("reference {} {} R out of range", num, generation)));
            }
        }
        self.lx.seek(mark);
        Ok(Object::Int(num))
    }

    fn parse_array(&mut self, depth: usize) -> Result<Object> {
        let mut arr = Array::new();
        loop {
            let tok = self.lx.lex(&mut self.buf)?;
            match tok {
                Token::CloseArray => break,
                Token::Eof => return Err(Error::syntax("unterminated array")),
                other => arr.push(self.parse_from(other, depth)?),
            }
        }
        Ok(Object::Array(arr))
    }

    fn parse_dict(&mut self, depth: usize) -> Result<Object> {
        let mut dict = Dict::new();
        loop {
            let tok = self.lx.lex(&mut self.buf)?;
            match tok {
                Token::CloseDict => break,
                Token::Eof => return Err(Error::syntax("unterminated dictionary")),
                Token::Name => {
                    let key = Name::new(&self.buf.as_str());
                    let vtok = self.lx.lex(&mut self.buf)?;
                    let value = self.parse_from(vtok, depth)?;
                    dict.insert(key, value);
                }
                other => {
                    return Err(Error::syntax(format!(
                        "dictionary key must be a name, got {:?}",
                        other
                    )));
                }
            }
        }
        Ok(Object::Dict(dict))
    }

    /// Parse an indirect object: `num generation obj ... endobj`
    ///
    /// When a `stream` keyword follows the object, the offset of the
    /// first data byte is reported instead of consuming the bytes.
    pub fn parse_indirect_object(&mut self) -> Result<IndirectObject> {
        let num = self.expect_int()?;
        let generation = self.expect_int()?;
        if !(0..=i32::MAX as i64).contains(&num) || !(0..=65535).contains(&generation) {
            return Err(Error::syntax(format!("object id {} {} out of range", num, generation)));
        }
        self.expect_token(Token::Obj)?;

        let object = self.parse_object()?;

        let mark = self.lx.pos();
        let mut stream_ofs = None;
        match self.lx.lex(&mut self.buf)? {
            Token::Stream => {
                // Data starts after the end-of-line following the keyword
                let mut pos = self.lx.pos();
                if pos < self.data.len() && self.data[pos] == b'\r' {
                    pos += 1;
                }
                if pos < self.data.len() && self.data[pos] == b'\n' {
                    pos += 1;
                }
                stream_ofs = Some(pos);
            }
            Token::EndObj => {}
            other => {
                // Tolerate missing endobj; plenty of generators get this wrong
                warn!("object {} {}: expected endobj or stream, got {:?}", num, generation, other);
                self.lx.seek(mark);
            }
        }

        Ok(IndirectObject {
            num: num as i32,
            generation: generation as u16,
            object,
            stream_ofs,
        })
    }

    /// Parse a classic cross-reference section and its trailer
    ///
    /// Returns the entries (object number paired with its location) and
    /// the trailer dictionary.
    pub fn parse_xref_section(&mut self) -> Result<(Vec<(i32, XrefEntry)>, Dict)> {
        self.expect_token(Token::Xref)?;

        let mut entries = Vec::new();
        loop {
            match self.lx.lex(&mut self.buf)? {
                Token::Trailer => {
                    let trailer = match self.parse_object()? {
                        Object::Dict(d) => d,
                        _ => return Err(Error::syntax("trailer must be a dictionary")),
                    };
                    return Ok((entries, trailer));
                }
                Token::Int => {
                    let start = self.buf.as_int();
                    let count = self.expect_int()?;
                    if start < 0 || count < 0 {
                        return Err(Error::syntax("negative xref subsection header"));
                    }
                    for i in 0..count {
                        let num = (start + i) as i32;
                        entries.push((num, self.parse_xref_entry(num)?));
                    }
                }
                Token::Eof => return Err(Error::syntax("xref section missing trailer")),
                other => {
                    return Err(Error::syntax(format!(
                        "unexpected token {:?} in xref section",
                        other
                    )));
                }
            }
        }
    }

    fn parse_xref_entry(&mut self, num: i32) -> Result<XrefEntry> {
        let offset = self.expect_int()?;
        let generation = self.expect_int()?;
        if !(0..=65535).contains(&generation) || offset < 0 {
            return Err(Error::syntax(format!("bad xref entry for object {}", num)));
        }
        match self.lx.lex(&mut self.buf)? {
            Token::Keyword if self.buf.as_bytes() == b"n" => {
                Ok(XrefEntry::at_offset(offset as usize, generation as u16))
            }
            Token::Keyword if self.buf.as_bytes() == b"f" => {
                Ok(XrefEntry::free(offset as i32, generation as u16))
            }
            other => Err(Error::syntax(format!(
                "xref entry for object {} must end in n or f, got {:?}",
                num, other
            ))),
        }
    }

    fn expect_token(&mut self, expected: Token) -> Result<()> {
        let tok = self.lx.lex(&mut self.buf)?;
        if tok != expected {
            return Err(Error::syntax(format!("expected {:?}, got {:?}", expected, tok)));
        }
        Ok(())
    }

    fn expect_int(&mut self) -> Result<i64> {
        match self.lx.lex(&mut self.buf)? {
            Token::Int => Ok(self.buf.as_int()),
            other => Err(Error::syntax(format!("expected integer, got {:?}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xref::StoreKind;

    fn parse(data: &[u8]) -> Object {
        Parser::new(data).parse_object().unwrap()
    }

    #[test]
    fn test_parse_scalars() {
        assert_eq!(parse(b"null"), Object::Null);
        assert_eq!(parse(b"true"), Object::Bool(true));
        assert_eq!(parse(b"false"), Object::Bool(false));
        assert_eq!(parse(b"42"), Object::Int(42));
        assert_eq!(parse(b"-123"), Object::Int(-123));
        assert!(matches!(parse(b"3.5"), Object::Real(v) if (v - 3.5).abs() < 1e-9));
    }

    #[test]
    fn test_parse_strings() {
        assert_eq!(
            parse(b"(Hello World)"),
            Object::String(PdfString::from("Hello World"))
        );
        assert_eq!(
            parse(b"<48656C6C6F>"),
            Object::String(PdfString::from("Hello"))
        );
    }

    #[test]
    fn test_parse_name() {
        assert_eq!(parse(b"/Type"), Object::Name(Name::new("Type")));
    }

    #[test]
    fn test_parse_array() {
        let obj = parse(b"[1 2 (three) /Four]");
        let arr = obj.as_array().unwrap();
        assert_eq!(arr.len(), 4);
        assert_eq!(arr[0], Object::Int(1));
        assert_eq!(arr[3], Object::Name(Name::new("Four")));
    }

    #[test]
    fn test_parse_dict() {
        let obj = parse(b"<< /Type /Catalog /Pages 5 0 R >>");
        let dict = obj.as_dict().unwrap();
        assert_eq!(dict.get(&Name::new("Type")), Some(&Object::Name(Name::new("Catalog"))));
        assert_eq!(
            dict.get(&Name::new("Pages")),
            Some(&Object::Ref(ObjRef::new(5, 0)))
        );
    }

    #[test]
    fn test_parse_reference_lookahead() {
        assert_eq!(parse(b"5 0 R"), Object::Ref(ObjRef::new(5, 0)));
        // Two integers without R stay integers
        let obj = parse(b"[5 0 7]");
        let arr = obj.as_array().unwrap();
        assert_eq!(arr, &vec![Object::Int(5), Object::Int(0), Object::Int(7)]);
        // Mixed: reference followed by an integer
        let obj = parse(b"[5 0 R 7]");
        let arr = obj.as_array().unwrap();
        assert_eq!(arr, &vec![Object::Ref(ObjRef::new(5, 0)), Object::Int(7)]);
    }

    #[test]
    fn test_parse_indirect_object() {
        let mut p = Parser::new(b"7 0 obj\n<< /Answer 42 >>\nendobj\n");
        let ind = p.parse_indirect_object().unwrap();
        assert_eq!(ind.num, 7);
        assert_eq!(ind.generation, 0);
        assert!(ind.stream_ofs.is_none());
        assert_eq!(ind.object.get("Answer").and_then(|o| o.as_int()), Some(42));
    }

    #[test]
    fn test_parse_indirect_stream_offset() {
        let data = b"3 0 obj\n<< /Length 5 >>\nstream\nHello\nendstream\nendobj\n";
        let mut p = Parser::new(data);
        let ind = p.parse_indirect_object().unwrap();
        let ofs = ind.stream_ofs.unwrap();
        assert_eq!(&data[ofs..ofs + 5], b"Hello");
    }

    #[test]
    fn test_parse_nesting_limit() {
        let mut data = Vec::new();
        for _ in 0..200 {
            data.extend_from_slice(b"[");
        }
        data.extend_from_slice(b"1");
        for _ in 0..200 {
            data.extend_from_slice(b"]");
        }
        let err = Parser::new(&data).parse_object().unwrap_err();
        assert!(matches!(err, Error::Syntax(_)));
    }

    #[test]
    fn test_parse_xref_section() {
        let data = b"xref\n0 3\n0000000000 65535 f \n0000000017 00000 n \n0000000081 00000 n \ntrailer\n<< /Size 3 /Root 1 0 R >>\n";
        let mut p = Parser::new(data);
        let (entries, trailer) = p.parse_xref_section().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].0, 0);
        assert!(entries[0].1.is_free());
        match entries[1].1.kind {
            StoreKind::Offset { offset } => assert_eq!(offset, 17),
            _ => panic!("expected offset entry"),
        }
        assert_eq!(trailer.get(&Name::new("Size")), Some(&Object::Int(3)));
    }

    #[test]
    fn test_parse_xref_multiple_subsections() {
        let data = b"xref\n0 1\n0000000000 65535 f \n4 2\n0000000100 00000 n \n0000000200 00000 n \ntrailer\n<< /Size 6 >>\n";
        let mut p = Parser::new(data);
        let (entries, _) = p.parse_xref_section().unwrap();
        let nums: Vec<i32> = entries.iter().map(|(n, _)| *n).collect();
        assert_eq!(nums, vec![0, 4, 5]);
    }
}
