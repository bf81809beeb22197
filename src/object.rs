//! PDF object types
use indexmap::IndexMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

/// Interned PDF Name with shared storage
///
/// PDF names are frequently repeated (Type, Length, Kids, ...). This
/// implementation uses `Arc<str>` for zero-copy cloning and sharing.
/// Common names are pre-interned for fast comparison.
#[derive(Debug, Clone, Eq)]
pub struct Name(Arc<str>);

impl Name {
    /// Create a new name, potentially sharing storage with existing names
    pub fn new(s: &str) -> Self {
        if let Some(interned) = Self::get_interned(s) {
            return interned;
        }
        Self(Arc::from(s))
    }

    /// Create from owned String
    pub fn from_string(s: String) -> Self {
        if let Some(interned) = Self::get_interned(&s) {
            return interned;
        }
        Self(Arc::from(s))
    }

    /// Get the name string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn get_interned(s: &str) -> Option<Self> {
        COMMON_NAMES
            .iter()
            .find(|(name, _)| *name == s)
            .map(|(_, arc)| Self(Arc::clone(arc)))
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        // Fast path: pointer equality for interned names
        if Arc::ptr_eq(&self.0, &other.0) {
            return true;
        }
        self.0.as_ref() == other.0.as_ref()
    }
}

impl PartialEq<str> for Name {
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl std::hash::Hash for Name {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.as_ref().hash(state);
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.0)
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Name {
    fn from(s: String) -> Self {
        Self::from_string(s)
    }
}

/// Common PDF names pre-interned for fast comparison
static COMMON_NAMES: LazyLock<Vec<(&'static str, Arc<str>)>> = LazyLock::new(|| {
    [
        // Document structure
        "Type", "Subtype", "Length", "Filter", "DecodeParms", "Parent", "Kids", "Count",
        // Page tree
        "Catalog", "Pages", "Page", "Resources", "Contents", "MediaBox", "Rotate",
        // Filters
        "FlateDecode", "DCTDecode", "ASCII85Decode", "ASCIIHexDecode", "LZWDecode",
        "RunLengthDecode", "CCITTFaxDecode", "JBIG2Decode", "JPXDecode", "Crypt",
        // Filter parameters
        "Predictor", "Colors", "BitsPerComponent", "Columns", "EarlyChange",
        // Trailer and xref
        "Root", "Info", "ID", "Size", "Prev", "Encrypt", "XRefStm", "Index", "W", "XRef",
        // Object streams
        "ObjStm", "N", "First",
        // Encryption
        "V", "R", "O", "U", "OE", "UE", "P", "StmF", "StrF", "CF", "CFM", "EncryptMetadata",
        "Standard", "Identity", "Metadata",
        // Destinations and outlines
        "Dests", "Names", "D", "Outlines", "Title", "Dest", "A", "Next", "Limits",
        // Fonts (stream expansion opt-outs)
        "Font", "FontDescriptor", "Length1", "Length2", "Length3", "Type1C", "CIDFontType0C",
        // Images
        "XObject", "Image", "Width", "Height",
        // Metadata
        "Version",
    ]
    .iter()
    .map(|s| (*s, Arc::from(*s)))
    .collect()
});

/// A PDF string: raw bytes, not necessarily valid UTF-8
#[derive(Debug, Clone, PartialEq)]
pub struct PdfString(Vec<u8>);

impl PdfString {
    pub fn new(data: Vec<u8>) -> Self {
        Self(data)
    }
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl From<&[u8]> for PdfString {
    fn from(data: &[u8]) -> Self {
        Self(data.to_vec())
    }
}

impl From<&str> for PdfString {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

/// An indirect object identity: object number and generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjRef {
    pub num: i32,
    pub generation: u16,
}

impl ObjRef {
    pub fn new(num: i32, generation: u16) -> Self {
        Self { num, generation }
    }
}

impl fmt::Display for ObjRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.num, self.generation)
    }
}

/// Dictionary with insertion order preserved for round-trip fidelity
pub type Dict = IndexMap<Name, Object>;
pub type Array = Vec<Object>;

/// A PDF object value
///
/// `Ref` is a lookup key into the cross-reference table, not an owning
/// edge; resolving it always goes through the table. At most one level
/// of indirection exists: a `Ref` never resolves to another `Ref`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Object {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Real(f64),
    String(PdfString),
    Name(Name),
    Array(Array),
    Dict(Dict),
    Stream {
        dict: Dict,
        /// Raw bytes as stored in the file (still filtered, still encrypted)
        data: Vec<u8>,
    },
    Ref(ObjRef),
}

impl Object {
    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }
    pub fn as_bool(&self) -> Option<bool> {
        if let Object::Bool(b) = self { Some(*b) } else { None }
    }
    pub fn as_int(&self) -> Option<i64> {
        if let Object::Int(i) = self { Some(*i) } else { None }
    }
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Object::Real(r) => Some(*r),
            Object::Int(i) => Some(*i as f64),
            _ => None,
        }
    }
    pub fn as_name(&self) -> Option<&Name> {
        if let Object::Name(n) = self { Some(n) } else { None }
    }
    pub fn as_string(&self) -> Option<&PdfString> {
        if let Object::String(s) = self { Some(s) } else { None }
    }
    pub fn as_array(&self) -> Option<&Array> {
        if let Object::Array(a) = self { Some(a) } else { None }
    }
    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Object::Dict(d) => Some(d),
            Object::Stream { dict, .. } => Some(dict),
            _ => None,
        }
    }
    pub fn as_ref_id(&self) -> Option<ObjRef> {
        if let Object::Ref(r) = self { Some(*r) } else { None }
    }
    pub fn is_stream(&self) -> bool {
        matches!(self, Object::Stream { .. })
    }

    /// Look up a key when this object is a dictionary or stream
    pub fn get(&self, key: &str) -> Option<&Object> {
        self.as_dict().and_then(|d| d.get(&Name::new(key)))
    }

    /// Name of the dictionary `Type` entry, if any
    pub fn type_name(&self) -> Option<&str> {
        self.get("Type").and_then(|o| o.as_name()).map(|n| n.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_interning() {
        let n1 = Name::new("Type");
        let n2 = Name::new("Type");
        assert!(Arc::ptr_eq(&n1.0, &n2.0));
        assert_eq!(n1, n2);
    }

    #[test]
    fn test_name_non_interned() {
        let n1 = Name::new("UncommonName12345");
        let n2 = Name::new("UncommonName12345");
        assert_eq!(n1, n2);
        assert_ne!(n1, Name::new("Other"));
    }

    #[test]
    fn test_name_display() {
        assert_eq!(format!("{}", Name::new("Page")), "/Page");
    }

    #[test]
    fn test_pdf_string_bytes() {
        let s = PdfString::new(vec![0xFF, 0xFE]);
        assert_eq!(s.as_str(), None);
        assert_eq!(s.as_bytes(), &[0xFF, 0xFE]);
    }

    #[test]
    fn test_obj_ref_display() {
        assert_eq!(format!("{}", ObjRef::new(10, 0)), "10 0 R");
    }

    #[test]
    fn test_object_accessors() {
        assert!(Object::Null.is_null());
        assert_eq!(Object::Int(42).as_int(), Some(42));
        assert_eq!(Object::Int(42).as_real(), Some(42.0));
        assert_eq!(Object::Real(2.5).as_real(), Some(2.5));
        assert_eq!(Object::Real(2.5).as_int(), None);
        assert_eq!(Object::Bool(true).as_bool(), Some(true));
    }

    #[test]
    fn test_dict_preserves_insertion_order() {
        let mut dict = Dict::new();
        dict.insert(Name::new("Zebra"), Object::Int(1));
        dict.insert(Name::new("Apple"), Object::Int(2));
        dict.insert(Name::new("Mango"), Object::Int(3));
        let keys: Vec<&str> = dict.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["Zebra", "Apple", "Mango"]);
    }

    #[test]
    fn test_structural_equality_ignores_dict_order() {
        let mut a = Dict::new();
        a.insert(Name::new("A"), Object::Int(1));
        a.insert(Name::new("B"), Object::Int(2));
        let mut b = Dict::new();
        b.insert(Name::new("B"), Object::Int(2));
        b.insert(Name::new("A"), Object::Int(1));
        assert_eq!(Object::Dict(a), Object::Dict(b));
    }

    #[test]
    fn test_structural_equality_nested() {
        let make = || {
            let mut inner = Dict::new();
            inner.insert(Name::new("Key"), Object::String(PdfString::from("Value")));
            Object::Array(vec![
                Object::Int(1),
                Object::Real(2.5),
                Object::Dict(inner),
                Object::Ref(ObjRef::new(7, 0)),
            ])
        };
        assert_eq!(make(), make());
    }

    #[test]
    fn test_stream_dict_via_as_dict() {
        let mut dict = Dict::new();
        dict.insert(Name::new("Length"), Object::Int(5));
        let obj = Object::Stream { dict, data: b"Hello".to_vec() };
        assert!(obj.is_stream());
        assert_eq!(obj.get("Length").and_then(|o| o.as_int()), Some(5));
    }

    #[test]
    fn test_type_name() {
        let mut dict = Dict::new();
        dict.insert(Name::new("Type"), Object::Name(Name::new("ObjStm")));
        assert_eq!(Object::Dict(dict).type_name(), Some("ObjStm"));
    }
}
