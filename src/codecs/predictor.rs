//! TIFF and PNG predictors for stream filters.
//!
//! Predictors are row-wise byte transforms applied between a compressor
//! (flate or LZW) and its payload to improve compression of image-like data.
//! Decoding reconstructs rows after decompression; encoding filters rows
//! before compression.

use crate::error::{Error, Result};
use crate::object::Dictionary;

/// Predictor parameters carried in a filter's decode-parameters dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictorParams {
    /// Predictor algorithm: 1 = none, 2 = TIFF, 10-15 = PNG
    pub predictor: i64,
    /// Number of samples per row
    pub columns: usize,
    /// Number of interleaved color components per sample
    pub colors: usize,
    /// Bits per component (8 is the only supported value)
    pub bits_per_component: usize,
}

impl Default for PredictorParams {
    fn default() -> Self {
        Self {
            predictor: 1,
            columns: 1,
            colors: 1,
            bits_per_component: 8,
        }
    }
}

impl PredictorParams {
    /// Read predictor parameters from a decode-parameters dictionary.
    ///
    /// Absent entries keep their defaults. `Columns` and `Colors` are only
    /// consulted when a predictor is actually selected.
    pub fn from_decode_parms(parms: Option<&Dictionary>) -> Result<Self> {
        let mut params = Self::default();
        let parms = match parms {
            Some(d) => d,
            None => return Ok(params),
        };

        if let Some(obj) = parms.get("Predictor") {
            params.predictor = obj.as_integer().ok_or(Error::TypeMismatch {
                entry: "Predictor",
                expected: "integer",
            })?;
        }
        if let Some(obj) = parms.get("BitsPerComponent") {
            params.bits_per_component = obj.as_integer().ok_or(Error::TypeMismatch {
                entry: "BitsPerComponent",
                expected: "integer",
            })? as usize;
        }
        if params.predictor > 1 {
            if let Some(obj) = parms.get("Columns") {
                params.columns = obj.as_integer().ok_or(Error::TypeMismatch {
                    entry: "Columns",
                    expected: "integer",
                })? as usize;
            }
            if let Some(obj) = parms.get("Colors") {
                params.colors = obj.as_integer().ok_or(Error::TypeMismatch {
                    entry: "Colors",
                    expected: "integer",
                })? as usize;
            }
        }

        Ok(params)
    }

    /// Whether the parameters select no prediction at all.
    pub fn is_identity(&self) -> bool {
        self.predictor <= 1
    }

    /// Row length in bytes of the predicted form.
    ///
    /// PNG rows carry a leading per-row filter byte; TIFF rows do not.
    fn row_len(&self) -> usize {
        let pixel_bytes = self.columns * self.colors;
        if self.predictor >= 10 {
            pixel_bytes + 1
        } else {
            pixel_bytes
        }
    }

    fn check_supported(&self) -> Result<()> {
        if self.bits_per_component != 8 {
            return Err(Error::UnsupportedEncodingParameters(format!(
                "BitsPerComponent={} (only 8 supported)",
                self.bits_per_component
            )));
        }
        Ok(())
    }
}

/// Reverse a predictor after decompression.
///
/// Input length must be an exact multiple of the row length. Empty input
/// yields empty output.
pub fn decode(data: &[u8], params: &PredictorParams) -> Result<Vec<u8>> {
    match params.predictor {
        1 => Ok(data.to_vec()),
        2 => {
            params.check_supported()?;
            decode_tiff(data, params)
        }
        10..=15 => {
            params.check_supported()?;
            decode_png(data, params)
        }
        other => Err(Error::UnsupportedPredictor(other)),
    }
}

/// Apply a predictor before compression.
///
/// Supported: 1 (none), 2 (TIFF) and 11 (PNG Sub, the only PNG row filter
/// the encoder emits). Other codes fail with unsupported parameters.
pub fn encode(data: &[u8], params: &PredictorParams) -> Result<Vec<u8>> {
    match params.predictor {
        1 => Ok(data.to_vec()),
        2 => {
            params.check_supported()?;
            encode_tiff(data, params)
        }
        11 => {
            params.check_supported()?;
            encode_png_sub(data, params)
        }
        other => Err(Error::UnsupportedEncodingParameters(format!(
            "predictor {} (encoding supports 1, 2 and 11)",
            other
        ))),
    }
}

fn check_rows(data: &[u8], row_len: usize) -> Result<()> {
    if row_len > 0 && data.len() % row_len != 0 {
        return Err(Error::InvalidRowLength {
            data_len: data.len(),
            row_len,
        });
    }
    Ok(())
}

/// TIFF predictor 2: each sample is the difference from the sample to its
/// left, interleaved by color component.
fn decode_tiff(data: &[u8], params: &PredictorParams) -> Result<Vec<u8>> {
    let row_len = params.row_len();
    if row_len < 1 || data.is_empty() {
        return Ok(Vec::new());
    }
    check_rows(data, row_len)?;

    let colors = params.colors;
    let mut output = Vec::with_capacity(data.len());
    for row in data.chunks(row_len) {
        let mut row = row.to_vec();
        for j in colors..row_len {
            row[j] = row[j].wrapping_add(row[j - colors]);
        }
        output.extend_from_slice(&row);
    }
    Ok(output)
}

fn encode_tiff(data: &[u8], params: &PredictorParams) -> Result<Vec<u8>> {
    let row_len = params.row_len();
    if row_len < 1 || data.is_empty() {
        return Ok(Vec::new());
    }
    check_rows(data, row_len)?;

    let colors = params.colors;
    let mut output = Vec::with_capacity(data.len());
    for row in data.chunks(row_len) {
        output.extend_from_slice(&row[..colors]);
        for j in colors..row_len {
            output.push(row[j].wrapping_sub(row[j - colors]));
        }
    }
    Ok(output)
}

/// PNG predictors 10-15: every row starts with a filter byte 0-4 selecting
/// the row's algorithm; the code in the parameters only selects the family.
fn decode_png(data: &[u8], params: &PredictorParams) -> Result<Vec<u8>> {
    let row_len = params.row_len();
    if row_len < 2 || data.is_empty() {
        return Ok(Vec::new());
    }
    check_rows(data, row_len)?;

    // Left-neighbor distance is one sample (all components of the pixel).
    let bpp = params.colors.max(1);
    let rows = data.len() / row_len;
    let mut output = Vec::with_capacity(rows * (row_len - 1));
    let mut prev_row = vec![0u8; row_len];

    for row in data.chunks(row_len) {
        let mut row = row.to_vec();
        let filter_byte = row[0];
        match filter_byte {
            0 => {}
            1 => {
                // Sub: left neighbor
                for j in 1 + bpp..row_len {
                    row[j] = row[j].wrapping_add(row[j - bpp]);
                }
            }
            2 => {
                // Up: same column in the previous row
                for j in 1..row_len {
                    row[j] = row[j].wrapping_add(prev_row[j]);
                }
            }
            3 => {
                // Average of left and above; left is 0 for the first sample
                for j in 1..row_len {
                    let left = if j > bpp { row[j - bpp] as u16 } else { 0 };
                    let above = prev_row[j] as u16;
                    row[j] = row[j].wrapping_add(((left + above) / 2) as u8);
                }
            }
            4 => {
                // Paeth
                for j in 1..row_len {
                    let a = if j > bpp { row[j - bpp] as i16 } else { 0 };
                    let b = prev_row[j] as i16;
                    let c = if j > bpp { prev_row[j - bpp] as i16 } else { 0 };
                    row[j] = row[j].wrapping_add(paeth(a, b, c) as u8);
                }
            }
            other => {
                return Err(Error::decode(
                    "Predictor",
                    format!("invalid row filter byte ({})", other),
                ));
            }
        }

        output.extend_from_slice(&row[1..]);
        prev_row = row;
    }

    Ok(output)
}

/// PNG Sub row filter, the only one the encoder emits.
fn encode_png_sub(data: &[u8], params: &PredictorParams) -> Result<Vec<u8>> {
    let row_len = params.columns * params.colors;
    if row_len < 1 || data.is_empty() {
        return Ok(Vec::new());
    }
    check_rows(data, row_len)?;

    let bpp = params.colors.max(1);
    let rows = data.len() / row_len;
    let mut output = Vec::with_capacity(rows * (row_len + 1));
    for row in data.chunks(row_len) {
        output.push(1);
        output.extend_from_slice(&row[..bpp.min(row_len)]);
        for j in bpp..row_len {
            output.push(row[j].wrapping_sub(row[j - bpp]));
        }
    }
    Ok(output)
}

/// Paeth predictor function from the PNG specification. Ties prefer the
/// left neighbor, then the one above.
fn paeth(a: i16, b: i16, c: i16) -> i16 {
    let p = a + b - c;
    let pa = (p - a).abs();
    let pb = (p - b).abs();
    let pc = (p - c).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}
