//! Stream filter pipeline
//!
//! A stream's `Filter` entry names one or more decoders applied left to
//! right, each consuming the previous filter's output. `DecodeParms`
//! carries per-filter parameters, aligned with the filter list.

pub mod ascii85;
pub mod asciihex;
pub mod flate;
pub mod lzw;
pub mod params;
pub mod predictor;
pub mod runlength;

pub use ascii85::{decode_ascii85, encode_ascii85};
pub use asciihex::{decode_ascii_hex, encode_ascii_hex};
pub use flate::{decode_flate, encode_flate};
pub use lzw::{decode_lzw, encode_lzw};
pub use params::DecodeParams;
pub use runlength::{decode_run_length, encode_run_length};

use crate::error::{Error, Result};
use crate::object::Object;
use smallvec::SmallVec;

/// Stream filter names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    FlateDecode,
    LZWDecode,
    ASCII85Decode,
    ASCIIHexDecode,
    RunLengthDecode,
    CCITTFaxDecode,
    DCTDecode,
    JPXDecode,
    JBIG2Decode,
    Crypt,
}

impl FilterType {
    /// Parse a filter name, accepting the inline-image abbreviations
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "FlateDecode" | "Fl" => Some(FilterType::FlateDecode),
            "LZWDecode" | "LZW" => Some(FilterType::LZWDecode),
            "ASCII85Decode" | "A85" => Some(FilterType::ASCII85Decode),
            "ASCIIHexDecode" | "AHx" => Some(FilterType::ASCIIHexDecode),
            "RunLengthDecode" | "RL" => Some(FilterType::RunLengthDecode),
            "CCITTFaxDecode" | "CCF" => Some(FilterType::CCITTFaxDecode),
            "DCTDecode" | "DCT" => Some(FilterType::DCTDecode),
            "JPXDecode" => Some(FilterType::JPXDecode),
            "JBIG2Decode" => Some(FilterType::JBIG2Decode),
            "Crypt" => Some(FilterType::Crypt),
            _ => None,
        }
    }

    pub fn to_name(self) -> &'static str {
        match self {
            FilterType::FlateDecode => "FlateDecode",
            FilterType::LZWDecode => "LZWDecode",
            FilterType::ASCII85Decode => "ASCII85Decode",
            FilterType::ASCIIHexDecode => "ASCIIHexDecode",
            FilterType::RunLengthDecode => "RunLengthDecode",
            FilterType::CCITTFaxDecode => "CCITTFaxDecode",
            FilterType::DCTDecode => "DCTDecode",
            FilterType::JPXDecode => "JPXDecode",
            FilterType::JBIG2Decode => "JBIG2Decode",
            FilterType::Crypt => "Crypt",
        }
    }

    /// Image-codec filters are recognized but decoded by the image
    /// layer, not this pipeline.
    pub fn is_image_codec(self) -> bool {
        matches!(
            self,
            FilterType::CCITTFaxDecode
                | FilterType::DCTDecode
                | FilterType::JPXDecode
                | FilterType::JBIG2Decode
        )
    }
}

/// One step of a decode chain
#[derive(Debug, Clone)]
pub struct FilterStep {
    pub filter: FilterType,
    pub params: DecodeParams,
}

/// An ordered chain of filters
#[derive(Debug, Clone, Default)]
pub struct FilterChain {
    steps: SmallVec<[FilterStep; 2]>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, filter: FilterType, params: DecodeParams) {
        self.steps.push(FilterStep { filter, params });
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[FilterStep] {
        &self.steps
    }

    /// Build a chain from resolved `Filter` and `DecodeParms` values
    ///
    /// `filter` may be null, a name, or an array of names; `parms` may
    /// be null, a dictionary, or an array aligned with the filter array
    /// (null entries allowed).
    pub fn from_objects(filter: &Object, parms: &Object) -> Result<Self> {
        fn push_named(chain: &mut FilterChain, name: &str, parms: &Object) -> Result<()> {
            let filter = FilterType::from_name(name)
                .ok_or_else(|| Error::unsupported_filter(name.to_string()))?;
            chain.push(filter, DecodeParams::from_dict(parms.as_dict()));
            Ok(())
        }

        let mut chain = Self::new();
        match filter {
            Object::Null => {}
            Object::Name(name) => push_named(&mut chain, name.as_str(), parms)?,
            Object::Array(names) => {
                for (i, entry) in names.iter().enumerate() {
                    let name = entry
                        .as_name()
                        .ok_or_else(|| Error::syntax("Filter array entry is not a name"))?;
                    let step_parms = match parms {
                        Object::Array(list) => list.get(i).unwrap_or(&Object::Null),
                        other => other,
                    };
                    push_named(&mut chain, name.as_str(), step_parms)?;
                }
            }
            _ => return Err(Error::syntax("Filter must be a name or an array of names")),
        }

        Ok(chain)
    }

    /// True when every step can be decoded by this pipeline
    pub fn decodable(&self) -> bool {
        self.steps.iter().all(|s| !s.filter.is_image_codec())
    }

    /// Decode data through the chain, left to right
    pub fn decode(&self, mut data: Vec<u8>) -> Result<Vec<u8>> {
        for step in &self.steps {
            data = match step.filter {
                FilterType::FlateDecode => decode_flate(&data, &step.params)?,
                FilterType::LZWDecode => decode_lzw(&data, &step.params)?,
                FilterType::ASCII85Decode => decode_ascii85(&data)?,
                FilterType::ASCIIHexDecode => decode_ascii_hex(&data)?,
                FilterType::RunLengthDecode => decode_run_length(&data)?,
                // Decryption is applied before the chain runs
                FilterType::Crypt => data,
                codec => {
                    return Err(Error::unsupported_filter(format!(
                        "{} is decoded by the image layer",
                        codec.to_name()
                    )));
                }
            };
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{Array, Dict, Name};

    #[test]
    fn test_filter_type_from_name() {
        assert_eq!(FilterType::from_name("FlateDecode"), Some(FilterType::FlateDecode));
        assert_eq!(FilterType::from_name("Fl"), Some(FilterType::FlateDecode));
        assert_eq!(FilterType::from_name("AHx"), Some(FilterType::ASCIIHexDecode));
        assert_eq!(FilterType::from_name("Invalid"), None);
    }

    #[test]
    fn test_chain_from_single_name() {
        let filter = Object::Name(Name::new("FlateDecode"));
        let chain = FilterChain::from_objects(&filter, &Object::Null).unwrap();
        assert_eq!(chain.steps().len(), 1);
        assert!(chain.decodable());
    }

    #[test]
    fn test_chain_from_array_with_parms() {
        let filter = Object::Array(vec![
            Object::Name(Name::new("ASCII85Decode")),
            Object::Name(Name::new("FlateDecode")),
        ]);
        let mut parm_dict = Dict::new();
        parm_dict.insert(Name::new("Predictor"), Object::Int(12));
        parm_dict.insert(Name::new("Columns"), Object::Int(4));
        let parms = Object::Array(vec![Object::Null, Object::Dict(parm_dict)]);

        let chain = FilterChain::from_objects(&filter, &parms).unwrap();
        assert_eq!(chain.steps().len(), 2);
        assert_eq!(chain.steps()[0].params.predictor, 1);
        assert_eq!(chain.steps()[1].params.predictor, 12);
    }

    #[test]
    fn test_chain_unknown_filter() {
        let filter = Object::Name(Name::new("FooDecode"));
        let err = FilterChain::from_objects(&filter, &Object::Null).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFilter(_)));
    }

    #[test]
    fn test_chain_decode_order() {
        // Encode: flate first, then ascii85 armor; decode runs the
        // chain left to right, undoing the armor before inflating.
        let original = b"chained filter test data, repeated: chained filter test data";
        let compressed = encode_flate(original, 6).unwrap();
        let armored = encode_ascii85(&compressed).unwrap();

        let filter = Object::Array(vec![
            Object::Name(Name::new("ASCII85Decode")),
            Object::Name(Name::new("FlateDecode")),
        ]);
        let chain = FilterChain::from_objects(&filter, &Object::Null).unwrap();
        assert_eq!(chain.decode(armored).unwrap(), original);
    }

    #[test]
    fn test_chain_image_codec_not_decodable() {
        let filter = Object::Name(Name::new("DCTDecode"));
        let chain = FilterChain::from_objects(&filter, &Object::Null).unwrap();
        assert!(!chain.decodable());
        let err = chain.decode(vec![0xFF, 0xD8]).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFilter(_)));
    }

    #[test]
    fn test_chain_empty_passthrough() {
        let chain = FilterChain::from_objects(&Object::Null, &Object::Null).unwrap();
        assert!(chain.is_empty());
        assert_eq!(chain.decode(b"raw".to_vec()).unwrap(), b"raw");
    }

    #[test]
    fn test_chain_filter_array_non_name_entry() {
        let filter: Object = Object::Array(Array::from(vec![Object::Int(1)]));
        assert!(FilterChain::from_objects(&filter, &Object::Null).is_err());
    }
}
