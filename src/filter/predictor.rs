//! PNG and TIFF predictors for Flate/LZW streams

use super::params::DecodeParams;
use crate::error::{Error, Result};

/// Undo the predictor named in the decode parameters
pub fn apply_predictor(data: &[u8], params: &DecodeParams) -> Result<Vec<u8>> {
    let colors = params.colors.max(1) as usize;
    let bits = params.bits_per_component.max(1) as usize;
    let columns = params.columns.max(1) as usize;

    let bytes_per_pixel = (colors * bits).div_ceil(8).max(1);
    let bytes_per_row = (colors * bits * columns).div_ceil(8);

    match params.predictor {
        1 => Ok(data.to_vec()),
        2 => tiff_predictor(data, bytes_per_row, bytes_per_pixel),
        10..=15 => png_predictor(data, bytes_per_row, bytes_per_pixel),
        p => Err(Error::decode(format!("unsupported predictor {}", p))),
    }
}

/// TIFF predictor: horizontal differencing within each row
fn tiff_predictor(data: &[u8], bytes_per_row: usize, bytes_per_pixel: usize) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(data.len());

    for row in data.chunks(bytes_per_row) {
        let mut prev = vec![0u8; bytes_per_pixel];
        for pixel in row.chunks(bytes_per_pixel) {
            for (i, &byte) in pixel.iter().enumerate() {
                let decoded = byte.wrapping_add(prev[i]);
                result.push(decoded);
                prev[i] = decoded;
            }
        }
    }

    Ok(result)
}

/// PNG predictor: each row starts with a filter-type byte
fn png_predictor(data: &[u8], bytes_per_row: usize, bytes_per_pixel: usize) -> Result<Vec<u8>> {
    let row_size = bytes_per_row + 1;
    let mut result = Vec::with_capacity(data.len());
    let mut prev_row = vec![0u8; bytes_per_row];

    for row_data in data.chunks(row_size) {
        if row_data.len() < 2 {
            break;
        }
        let filter_type = row_data[0];
        let mut row = row_data[1..].to_vec();
        row.resize(bytes_per_row, 0);

        match filter_type {
            0 => {}
            1 => {
                // Sub: add the byte one pixel to the left
                for i in bytes_per_pixel..row.len() {
                    row[i] = row[i].wrapping_add(row[i - bytes_per_pixel]);
                }
            }
            2 => {
                // Up: add the byte above
                for i in 0..row.len() {
                    row[i] = row[i].wrapping_add(prev_row[i]);
                }
            }
            3 => {
                // Average of left and above
                for i in 0..row.len() {
                    let left = if i >= bytes_per_pixel {
                        row[i - bytes_per_pixel] as u16
                    } else {
                        0
                    };
                    let up = prev_row[i] as u16;
                    row[i] = row[i].wrapping_add(((left + up) / 2) as u8);
                }
            }
            4 => {
                // Paeth
                for i in 0..row.len() {
                    let left = if i >= bytes_per_pixel {
                        row[i - bytes_per_pixel] as i16
                    } else {
                        0
                    };
                    let up = prev_row[i] as i16;
                    let up_left = if i >= bytes_per_pixel {
                        prev_row[i - bytes_per_pixel] as i16
                    } else {
                        0
                    };
                    row[i] = row[i].wrapping_add(paeth(left, up, up_left));
                }
            }
            t => return Err(Error::decode(format!("bad PNG filter type {}", t))),
        }

        result.extend_from_slice(&row);
        prev_row = row;
    }

    Ok(result)
}

fn paeth(a: i16, b: i16, c: i16) -> u8 {
    let p = a + b - c;
    let pa = (p - a).abs();
    let pb = (p - b).abs();
    let pc = (p - c).abs();
    if pa <= pb && pa <= pc {
        a as u8
    } else if pb <= pc {
        b as u8
    } else {
        c as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(predictor: i32, columns: i32) -> DecodeParams {
        DecodeParams {
            predictor,
            columns,
            ..DecodeParams::default()
        }
    }

    #[test]
    fn test_no_predictor_passthrough() {
        let data = [1u8, 2, 3, 4];
        let out = apply_predictor(&data, &params(1, 4)).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn test_tiff_predictor() {
        // Row of deltas 10, +1, +1, +1
        let data = [10u8, 1, 1, 1];
        let out = apply_predictor(&data, &params(2, 4)).unwrap();
        assert_eq!(out, [10, 11, 12, 13]);
    }

    #[test]
    fn test_png_up_filter() {
        // Two rows of 3 columns; second row is Up-filtered
        let data = [0u8, 5, 5, 5, 2, 1, 1, 1];
        let out = apply_predictor(&data, &params(12, 3)).unwrap();
        assert_eq!(out, [5, 5, 5, 6, 6, 6]);
    }

    #[test]
    fn test_png_sub_filter() {
        let data = [1u8, 10, 1, 1];
        let out = apply_predictor(&data, &params(11, 3)).unwrap();
        assert_eq!(out, [10, 11, 12]);
    }

    #[test]
    fn test_unknown_predictor_fails() {
        let err = apply_predictor(&[0u8; 4], &params(7, 4)).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }
}
