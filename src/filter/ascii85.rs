//! ASCII85Decode

use crate::error::{Error, Result};

/// Decode ASCII base-85 data, stopping at the `~>` marker
pub fn decode_ascii85(data: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(data.len() * 4 / 5);
    let mut group: u32 = 0;
    let mut count = 0;

    for &byte in data {
        if byte.is_ascii_whitespace() {
            continue;
        }
        if byte == b'~' {
            break;
        }
        if byte == b'z' {
            if count != 0 {
                return Err(Error::decode("'z' inside an ASCII85 group"));
            }
            result.extend_from_slice(&[0, 0, 0, 0]);
            continue;
        }
        if !(b'!'..=b'u').contains(&byte) {
            return Err(Error::decode(format!("invalid ASCII85 byte 0x{:02x}", byte)));
        }

        group = group
            .checked_mul(85)
            .and_then(|g| g.checked_add((byte - b'!') as u32))
            .ok_or_else(|| Error::decode("ASCII85 group overflow"))?;
        count += 1;

        if count == 5 {
            result.extend_from_slice(&group.to_be_bytes());
            group = 0;
            count = 0;
        }
    }

    if count == 1 {
        return Err(Error::decode("truncated ASCII85 group"));
    }
    if count > 0 {
        // Pad with the highest digit and keep count-1 output bytes
        for _ in count..5 {
            group = group * 85 + 84;
        }
        let bytes = group.to_be_bytes();
        result.extend_from_slice(&bytes[..count - 1]);
    }

    Ok(result)
}

/// Encode data as ASCII base-85 with a `~>` terminator
pub fn encode_ascii85(data: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(data.len() * 5 / 4 + 8);

    for chunk in data.chunks(4) {
        let mut group: u32 = 0;
        for (j, &byte) in chunk.iter().enumerate() {
            group |= (byte as u32) << (24 - j * 8);
        }

        if group == 0 && chunk.len() == 4 {
            result.push(b'z');
            continue;
        }

        let mut encoded = [0u8; 5];
        let mut temp = group;
        for slot in encoded.iter_mut().rev() {
            *slot = (temp % 85) as u8 + b'!';
            temp /= 85;
        }

        let keep = if chunk.len() == 4 { 5 } else { chunk.len() + 1 };
        result.extend_from_slice(&encoded[..keep]);
    }

    result.extend_from_slice(b"~>");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii85_encode_decode() {
        let original = b"Hello, ASCII85!";
        let encoded = encode_ascii85(original).unwrap();
        let decoded = decode_ascii85(&encoded).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_ascii85_zero_group() {
        let zeros = [0u8; 8];
        let encoded = encode_ascii85(&zeros).unwrap();
        assert_eq!(&encoded, b"zz~>");
        assert_eq!(decode_ascii85(&encoded).unwrap(), zeros);
    }

    #[test]
    fn test_ascii85_partial_group() {
        for len in 1..=7 {
            let data: Vec<u8> = (1..=len as u8).collect();
            let encoded = encode_ascii85(&data).unwrap();
            assert_eq!(decode_ascii85(&encoded).unwrap(), data);
        }
    }

    #[test]
    fn test_ascii85_bad_byte() {
        let err = decode_ascii85(b"\x7f~>").unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }
}
