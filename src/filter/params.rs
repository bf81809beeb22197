//! Decode parameter structures for stream filters

use crate::object::Dict;

/// Parameters shared by FlateDecode and LZWDecode
#[derive(Debug, Clone, Copy)]
pub struct DecodeParams {
    /// Predictor algorithm (1 = none, 2 = TIFF, 10-15 = PNG)
    pub predictor: i32,
    /// Color components per sample
    pub colors: i32,
    /// Bits per color component
    pub bits_per_component: i32,
    /// Samples per row
    pub columns: i32,
    /// LZW early code-size change (0 or 1)
    pub early_change: i32,
}

impl Default for DecodeParams {
    fn default() -> Self {
        Self {
            predictor: 1,
            colors: 1,
            bits_per_component: 8,
            columns: 1,
            early_change: 1,
        }
    }
}

impl DecodeParams {
    /// Read parameters out of a DecodeParms dictionary
    pub fn from_dict(dict: Option<&Dict>) -> Self {
        let mut params = Self::default();
        let Some(dict) = dict else {
            return params;
        };
        let int = |key: &str, default: i32| {
            dict.get(&crate::object::Name::new(key))
                .and_then(|o| o.as_int())
                .map(|v| v as i32)
                .unwrap_or(default)
        };
        params.predictor = int("Predictor", params.predictor);
        params.colors = int("Colors", params.colors);
        params.bits_per_component = int("BitsPerComponent", params.bits_per_component);
        params.columns = int("Columns", params.columns);
        params.early_change = int("EarlyChange", params.early_change);
        params
    }

    pub fn has_predictor(&self) -> bool {
        self.predictor > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{Name, Object};

    #[test]
    fn test_params_defaults() {
        let params = DecodeParams::from_dict(None);
        assert_eq!(params.predictor, 1);
        assert_eq!(params.colors, 1);
        assert_eq!(params.bits_per_component, 8);
        assert_eq!(params.columns, 1);
        assert_eq!(params.early_change, 1);
        assert!(!params.has_predictor());
    }

    #[test]
    fn test_params_from_dict() {
        let mut dict = Dict::new();
        dict.insert(Name::new("Predictor"), Object::Int(12));
        dict.insert(Name::new("Columns"), Object::Int(4));
        let params = DecodeParams::from_dict(Some(&dict));
        assert_eq!(params.predictor, 12);
        assert_eq!(params.columns, 4);
        assert!(params.has_predictor());
    }
}
