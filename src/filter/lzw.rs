//! LZWDecode

use super::params::DecodeParams;
use super::predictor::apply_predictor;
use crate::error::{Error, Result};

/// Decode LZW-compressed data, then undo any predictor
pub fn decode_lzw(data: &[u8], params: &DecodeParams) -> Result<Vec<u8>> {
    let mut decoder = weezl::decode::Decoder::with_tiff_size_switch(
        weezl::BitOrder::Msb,
        if params.early_change != 0 { 8 } else { 9 },
    );

    let mut result = decoder
        .decode(data)
        .map_err(|e| Error::decode(format!("LZWDecode failed: {:?}", e)))?;

    if params.has_predictor() {
        result = apply_predictor(&result, params)?;
    }

    Ok(result)
}

/// Encode data with LZW
pub fn encode_lzw(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = weezl::encode::Encoder::with_tiff_size_switch(weezl::BitOrder::Msb, 8);
    encoder
        .encode(data)
        .map_err(|e| Error::decode(format!("LZW encode failed: {:?}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lzw_encode_decode() {
        let original = b"ABCABCABCABCABC";
        let compressed = encode_lzw(original).unwrap();
        let decompressed = decode_lzw(&compressed, &DecodeParams::default()).unwrap();
        assert_eq!(decompressed, original);
    }
}
