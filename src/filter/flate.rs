//! FlateDecode (zlib/deflate)

use super::params::DecodeParams;
use super::predictor::apply_predictor;
use crate::error::{Error, Result};
use flate2::Compression;
use flate2::read::{ZlibDecoder, ZlibEncoder};
use std::io::Read;

/// Decode zlib-compressed data, then undo any predictor
pub fn decode_flate(data: &[u8], params: &DecodeParams) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| Error::decode(format!("FlateDecode failed: {}", e)))?;

    if params.has_predictor() {
        decompressed = apply_predictor(&decompressed, params)?;
    }

    Ok(decompressed)
}

/// Encode data with zlib
pub fn encode_flate(data: &[u8], level: u32) -> Result<Vec<u8>> {
    let compression = match level {
        0 => Compression::none(),
        1..=3 => Compression::fast(),
        4..=6 => Compression::default(),
        _ => Compression::best(),
    };

    let mut encoder = ZlibEncoder::new(data, compression);
    let mut compressed = Vec::new();
    encoder
        .read_to_end(&mut compressed)
        .map_err(|e| Error::decode(format!("Flate encode failed: {}", e)))?;

    Ok(compressed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flate_encode_decode() {
        let original = b"Hello, FlateDecode! Hello, FlateDecode! Hello, FlateDecode!";
        let compressed = encode_flate(original, 6).unwrap();
        assert!(compressed.len() < original.len());
        let decompressed = decode_flate(&compressed, &DecodeParams::default()).unwrap();
        assert_eq!(decompressed, original.as_slice());
    }

    #[test]
    fn test_flate_corrupt_data() {
        let err = decode_flate(b"not zlib data", &DecodeParams::default()).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_flate_with_predictor() {
        // Two Up-filtered PNG rows of 3 columns
        let raw = [0u8, 5, 5, 5, 2, 1, 1, 1];
        let compressed = encode_flate(&raw, 6).unwrap();
        let params = DecodeParams {
            predictor: 12,
            columns: 3,
            ..DecodeParams::default()
        };
        let out = decode_flate(&compressed, &params).unwrap();
        assert_eq!(out, [5, 5, 5, 6, 6, 6]);
    }
}
