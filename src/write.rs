//! Object serialization
//!
//! Two forms: a tight single-line form used while streams stay
//! compressed, and an indented form for output meant to be read by
//! people (streams decompressed).

use crate::object::{Name, Object, PdfString};

/// Serialize one object value. Stream objects render as their
/// dictionary; the stream body is framed by the document writer.
pub fn format_object(obj: &Object, tight: bool) -> Vec<u8> {
    let mut fmt = Formatter {
        out: Vec::new(),
        tight,
    };
    fmt.write_obj(obj, 0);
    fmt.out
}

struct Formatter {
    out: Vec<u8>,
    tight: bool,
}

impl Formatter {
    /// Append a token, inserting a space only where two regular tokens
    /// would otherwise run together.
    fn push_token(&mut self, token: &[u8]) {
        if let (Some(&last), Some(&first)) = (self.out.last(), token.first()) {
            if is_regular(last) && is_regular(first) {
                self.out.push(b' ');
            }
        }
        self.out.extend_from_slice(token);
    }

    fn newline_indent(&mut self, indent: usize) {
        self.out.push(b'\n');
        for _ in 0..indent {
            self.out.extend_from_slice(b"  ");
        }
    }

    fn write_obj(&mut self, obj: &Object, indent: usize) {
        match obj {
            Object::Null => self.push_token(b"null"),
            Object::Bool(true) => self.push_token(b"true"),
            Object::Bool(false) => self.push_token(b"false"),
            Object::Int(i) => self.push_token(i.to_string().as_bytes()),
            Object::Real(r) => self.push_token(format_real(*r).as_bytes()),
            Object::String(s) => self.write_string(s),
            Object::Name(n) => self.write_name(n),
            Object::Ref(r) => {
                self.push_token(r.num.to_string().as_bytes());
                self.push_token(r.generation.to_string().as_bytes());
                self.push_token(b"R");
            }
            Object::Array(items) => {
                self.push_token(b"[");
                for item in items {
                    self.write_obj(item, indent);
                }
                self.push_token(b"]");
            }
            Object::Dict(dict) | Object::Stream { dict, .. } => {
                self.push_token(b"<<");
                for (key, value) in dict {
                    if !self.tight {
                        self.newline_indent(indent + 1);
                    }
                    self.write_name(key);
                    self.write_obj(value, indent + 1);
                }
                if !self.tight {
                    self.newline_indent(indent);
                }
                self.push_token(b">>");
            }
        }
    }

    fn write_name(&mut self, name: &Name) {
        let mut token = Vec::with_capacity(name.as_str().len() + 1);
        token.push(b'/');
        for &byte in name.as_str().as_bytes() {
            if byte <= 32
                || byte > 126
                || byte == b'#'
                || crate::lexer::is_delimiter(byte)
            {
                token.push(b'#');
                token.extend_from_slice(format!("{:02x}", byte).as_bytes());
            } else {
                token.push(byte);
            }
        }
        self.push_token(&token);
    }

    fn write_string(&mut self, s: &PdfString) {
        let bytes = s.as_bytes();
        let binary = bytes
            .iter()
            .filter(|&&b| (b < 32 && !matches!(b, b'\n' | b'\r' | b'\t')) || b > 126)
            .count();

        // Mostly binary strings read better hex-armored
        if binary * 2 > bytes.len() {
            let mut token = Vec::with_capacity(bytes.len() * 2 + 2);
            token.push(b'<');
            for byte in bytes {
                token.extend_from_slice(format!("{:02x}", byte).as_bytes());
            }
            token.push(b'>');
            self.push_token(&token);
            return;
        }

        let mut token = Vec::with_capacity(bytes.len() + 2);
        token.push(b'(');
        for &byte in bytes {
            match byte {
                b'(' | b')' | b'\\' => {
                    token.push(b'\\');
                    token.push(byte);
                }
                b'\n' => token.extend_from_slice(b"\\n"),
                b'\r' => token.extend_from_slice(b"\\r"),
                b'\t' => token.extend_from_slice(b"\\t"),
                0..=31 | 127.. => token.extend_from_slice(format!("\\{:03o}", byte).as_bytes()),
                _ => token.push(byte),
            }
        }
        token.push(b')');
        self.push_token(&token);
    }
}

fn is_regular(byte: u8) -> bool {
    !crate::lexer::is_delimiter(byte) && !crate::lexer::is_whitespace(byte)
}

/// Reals print without an exponent and without a trailing ".0" tail
fn format_real(value: f64) -> String {
    if value == value.trunc() && value.abs() < 1e15 {
        format!("{}", value.trunc() as i64)
    } else {
        let s = format!("{:.6}", value);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{Dict, ObjRef};
    use crate::parser::Parser;

    fn tight(obj: &Object) -> String {
        String::from_utf8(format_object(obj, true)).unwrap()
    }

    #[test]
    fn test_format_scalars() {
        assert_eq!(tight(&Object::Null), "null");
        assert_eq!(tight(&Object::Bool(true)), "true");
        assert_eq!(tight(&Object::Int(-42)), "-42");
        assert_eq!(tight(&Object::Real(2.5)), "2.5");
        assert_eq!(tight(&Object::Real(3.0)), "3");
    }

    #[test]
    fn test_format_reference() {
        assert_eq!(tight(&Object::Ref(ObjRef::new(12, 0))), "12 0 R");
    }

    #[test]
    fn test_format_array_spacing() {
        let arr = Object::Array(vec![Object::Int(1), Object::Int(2), Object::Name(Name::new("X"))]);
        assert_eq!(tight(&arr), "[1 2/X]");
    }

    #[test]
    fn test_format_dict_tight() {
        let mut dict = Dict::new();
        dict.insert(Name::new("Type"), Object::Name(Name::new("Page")));
        dict.insert(Name::new("Count"), Object::Int(3));
        assert_eq!(tight(&Object::Dict(dict)), "<</Type/Page/Count 3>>");
    }

    #[test]
    fn test_format_dict_expanded() {
        let mut dict = Dict::new();
        dict.insert(Name::new("Type"), Object::Name(Name::new("Page")));
        let text = String::from_utf8(format_object(&Object::Dict(dict), false)).unwrap();
        assert!(text.contains('\n'));
        assert!(text.contains("/Type/Page"));
    }

    #[test]
    fn test_format_string_escapes() {
        let s = Object::String(PdfString::from("a(b)\nc\\"));
        assert_eq!(tight(&s), "(a\\(b\\)\\nc\\\\)");
    }

    #[test]
    fn test_format_binary_string_goes_hex() {
        let s = Object::String(PdfString::new(vec![0xDE, 0xAD, 0xBE, 0xEF]));
        assert_eq!(tight(&s), "<deadbeef>");
    }

    #[test]
    fn test_format_name_escapes() {
        let name = Object::Name(Name::new("Has Space"));
        assert_eq!(tight(&name), "/Has#20Space");
    }

    #[test]
    fn test_format_parse_round_trip() {
        let src = b"<< /Kids [3 0 R 4 0 R] /Name /N#20A /S (str\\n) /V 1.25 /B true >>";
        let obj = Parser::new(src).parse_object().unwrap();
        for tight_mode in [true, false] {
            let bytes = format_object(&obj, tight_mode);
            let reparsed = Parser::new(&bytes).parse_object().unwrap();
            assert_eq!(reparsed, obj);
        }
    }
}
