//! LZWDecode implementation.
//!
//! PDF's LZW uses MSB-first bit ordering with 9-bit initial codes. Two
//! dialects exist, selected by the `EarlyChange` flag: the default (1)
//! increases the code width one code early, the other (0) postpones the
//! increase. Both are honored when decoding; only the postponed dialect has
//! an encoder.

use weezl::{decode::Decoder as LzwDecoder, encode::Encoder as LzwEncoder, BitOrder};

use crate::codecs::predictor::{self, PredictorParams};
use crate::error::{Error, Result};

/// Parameters for the LZW filter: predictor configuration plus the
/// `EarlyChange` code-width dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LzwParams {
    /// Predictor configuration shared with flate
    pub predictor: PredictorParams,
    /// Code-width dialect: 1 = one code early (default), 0 = postponed
    pub early_change: i64,
}

impl Default for LzwParams {
    fn default() -> Self {
        Self {
            predictor: PredictorParams::default(),
            early_change: 1,
        }
    }
}

pub(crate) fn decode(input: &[u8], params: &LzwParams) -> Result<Vec<u8>> {
    let mut decoder = if params.early_change == 1 {
        LzwDecoder::with_tiff_size_switch(BitOrder::Msb, 8)
    } else {
        LzwDecoder::new(BitOrder::Msb, 8)
    };

    let output = decoder.decode(input).map_err(|e| {
        log::debug!("LZWDecode failed (EarlyChange={}): {}", params.early_change, e);
        Error::decode("LZWDecode", e.to_string())
    })?;

    if params.predictor.is_identity() {
        return Ok(output);
    }
    predictor::decode(&output, &params.predictor)
}

pub(crate) fn encode(data: &[u8], params: &LzwParams) -> Result<Vec<u8>> {
    if !params.predictor.is_identity() {
        return Err(Error::UnsupportedEncodingParameters(
            "LZW encoding supports predictor 1 only".to_string(),
        ));
    }
    if params.early_change != 0 {
        return Err(Error::UnsupportedEncodingParameters(
            "LZW encoding supports EarlyChange=0 only".to_string(),
        ));
    }

    LzwEncoder::new(BitOrder::Msb, 8)
        .encode(data)
        .map_err(|e| Error::decode("LZWDecode", e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn postponed() -> LzwParams {
        LzwParams {
            early_change: 0,
            ..Default::default()
        }
    }

    #[test]
    fn test_lzw_roundtrip_postponed_dialect() {
        let params = postponed();
        let original = b"The quick brown fox jumps over the lazy dog. ".repeat(10);
        let compressed = encode(&original, &params).unwrap();
        assert_eq!(decode(&compressed, &params).unwrap(), original);
    }

    #[test]
    fn test_lzw_roundtrip_repeated_pattern() {
        let params = postponed();
        let original = b"ABCABCABCABC".to_vec();
        let compressed = encode(&original, &params).unwrap();
        assert_eq!(decode(&compressed, &params).unwrap(), original);
    }

    #[test]
    fn test_lzw_early_change_dialect_decodes() {
        // The one-code-early stream comes from the TIFF-style encoder.
        let original = b"aaaaaaaaaabbbbbbbbbbccccc".repeat(40);
        let compressed = LzwEncoder::with_tiff_size_switch(BitOrder::Msb, 8)
            .encode(&original)
            .unwrap();
        let decoded = decode(&compressed, &LzwParams::default()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_lzw_default_encoder_fails() {
        // EarlyChange defaults to 1 and the encoder only handles 0.
        let result = encode(b"data", &LzwParams::default());
        assert!(matches!(
            result,
            Err(Error::UnsupportedEncodingParameters(_))
        ));
    }

    #[test]
    fn test_lzw_encode_rejects_predictor() {
        let mut params = postponed();
        params.predictor.predictor = 11;
        params.predictor.columns = 4;
        assert!(encode(b"datadata", &params).is_err());
    }

    #[test]
    fn test_lzw_decode_invalid_data() {
        let garbage = [0xFFu8; 64];
        assert!(decode(&garbage, &postponed()).is_err());
    }

    #[test]
    fn test_lzw_decode_with_predictor() {
        let mut params = postponed();
        params.predictor = PredictorParams {
            predictor: 2,
            columns: 4,
            colors: 1,
            bits_per_component: 8,
        };
        // TIFF-filtered row [10, 2, 2, 2] reconstructs to [10, 12, 14, 16].
        let filtered = [10u8, 2, 2, 2];
        let compressed = LzwEncoder::new(BitOrder::Msb, 8).encode(&filtered).unwrap();
        let decoded = decode(&compressed, &params).unwrap();
        assert_eq!(decoded, vec![10, 12, 14, 16]);
    }
}
