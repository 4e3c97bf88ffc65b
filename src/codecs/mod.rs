//! Stream codec implementations for PDF filters.
//!
//! This module provides encoder/decoder pairs for the standard stream
//! filters:
//! - FlateDecode (zlib/deflate) - most common
//! - LZWDecode - LZW compression, both EarlyChange dialects
//! - DCTDecode - JPEG
//! - RunLengthDecode - run-length encoding
//! - ASCIIHexDecode - hexadecimal encoding
//! - ASCII85Decode - base-85 encoding
//! - Raw - identity pass-through
//! - CCITTFaxDecode, JBIG2Decode, JPXDecode - declared, fail cleanly
//!
//! Codecs compose into pipelines built from a stream dictionary's `Filter`
//! and `DecodeParms` entries; see [`MultiCodec`].

use crate::error::{Error, Result};
use crate::object::{Dictionary, Object, Stream};

mod ascii85;
mod ascii_hex;
mod dct;
mod flate;
mod lzw;
mod multi;
mod predictor;
mod runlength;

pub use dct::{DctParams, DEFAULT_JPEG_QUALITY};
pub use lzw::LzwParams;
pub use multi::MultiCodec;
pub use predictor::PredictorParams;

/// Filter name for FlateDecode.
pub const FILTER_FLATE: &str = "FlateDecode";
/// Filter name for LZWDecode.
pub const FILTER_LZW: &str = "LZWDecode";
/// Filter name for DCTDecode.
pub const FILTER_DCT: &str = "DCTDecode";
/// Filter name for RunLengthDecode.
pub const FILTER_RUN_LENGTH: &str = "RunLengthDecode";
/// Filter name for ASCIIHexDecode.
pub const FILTER_ASCII_HEX: &str = "ASCIIHexDecode";
/// Filter name for ASCII85Decode.
pub const FILTER_ASCII85: &str = "ASCII85Decode";
/// Filter name for CCITTFaxDecode.
pub const FILTER_CCITT_FAX: &str = "CCITTFaxDecode";
/// Filter name for JBIG2Decode.
pub const FILTER_JBIG2: &str = "JBIG2Decode";
/// Filter name for JPXDecode.
pub const FILTER_JPX: &str = "JPXDecode";
/// Filter name for the identity pass-through.
pub const FILTER_RAW: &str = "Raw";

/// A stream filter over the closed set of supported kinds, each variant
/// carrying its own parameters.
///
/// Exhaustiveness over the filter set is checked by the compiler; there is
/// no global registry.
#[derive(Debug, Clone, PartialEq)]
pub enum Codec {
    /// FlateDecode with optional predictor parameters
    Flate(PredictorParams),
    /// LZWDecode with predictor parameters and the EarlyChange dialect flag
    Lzw(LzwParams),
    /// DCTDecode (JPEG) with image parameters
    Dct(DctParams),
    /// RunLengthDecode
    RunLength,
    /// ASCIIHexDecode
    AsciiHex,
    /// ASCII85Decode
    Ascii85,
    /// Identity pass-through
    Raw,
    /// CCITTFaxDecode; declared but unsupported
    CcittFax,
    /// JBIG2Decode; declared but unsupported
    Jbig2,
    /// JPXDecode; declared but unsupported
    Jpx,
}

impl Codec {
    /// Flate codec with default parameters (no predictor).
    pub fn flate() -> Self {
        Codec::Flate(PredictorParams::default())
    }

    /// Flate codec that filters rows through the PNG Sub predictor when
    /// encoding. `columns` is the number of samples per row.
    pub fn flate_with_predictor(columns: usize) -> Self {
        Codec::Flate(PredictorParams {
            predictor: 11,
            columns,
            ..Default::default()
        })
    }

    /// LZW codec with default parameters (EarlyChange = 1).
    pub fn lzw() -> Self {
        Codec::Lzw(LzwParams::default())
    }

    /// The PDF filter name.
    pub fn name(&self) -> &'static str {
        match self {
            Codec::Flate(_) => FILTER_FLATE,
            Codec::Lzw(_) => FILTER_LZW,
            Codec::Dct(_) => FILTER_DCT,
            Codec::RunLength => FILTER_RUN_LENGTH,
            Codec::AsciiHex => FILTER_ASCII_HEX,
            Codec::Ascii85 => FILTER_ASCII85,
            Codec::Raw => FILTER_RAW,
            Codec::CcittFax => FILTER_CCITT_FAX,
            Codec::Jbig2 => FILTER_JBIG2,
            Codec::Jpx => FILTER_JPX,
        }
    }

    /// Decode filter-encoded bytes.
    pub fn decode(&self, input: &[u8]) -> Result<Vec<u8>> {
        match self {
            Codec::Flate(params) => flate::decode(input, params),
            Codec::Lzw(params) => lzw::decode(input, params),
            Codec::Dct(_) => dct::decode(input),
            Codec::RunLength => runlength::decode(input),
            Codec::AsciiHex => ascii_hex::decode(input),
            Codec::Ascii85 => ascii85::decode(input),
            Codec::Raw => Ok(input.to_vec()),
            Codec::CcittFax | Codec::Jbig2 | Codec::Jpx => self.unsupported(),
        }
    }

    /// Encode bytes with this filter.
    pub fn encode(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Codec::Flate(params) => flate::encode(data, params),
            Codec::Lzw(params) => lzw::encode(data, params),
            Codec::Dct(params) => dct::encode(data, params),
            Codec::RunLength => runlength::encode(data),
            Codec::AsciiHex => ascii_hex::encode(data),
            Codec::Ascii85 => ascii85::encode(data),
            Codec::Raw => Ok(data.to_vec()),
            Codec::CcittFax | Codec::Jbig2 | Codec::Jpx => self.unsupported(),
        }
    }

    fn unsupported(&self) -> Result<Vec<u8>> {
        log::debug!("attempt to use unsupported encoding {}", self.name());
        Err(Error::UnsupportedFilter(self.name().to_string()))
    }

    /// Decode-parameters dictionary for this codec, or `None` when all
    /// parameters are at their defaults.
    pub fn make_decode_params(&self) -> Option<Object> {
        let params = match self {
            Codec::Flate(p) => p,
            Codec::Lzw(lzw) => &lzw.predictor,
            _ => return None,
        };
        if params.predictor <= 1 {
            return None;
        }

        let mut dict = Dictionary::new();
        dict.set("Predictor", Object::Integer(params.predictor));
        // Only non-default options are written.
        if params.bits_per_component != 8 {
            dict.set(
                "BitsPerComponent",
                Object::Integer(params.bits_per_component as i64),
            );
        }
        if params.columns != 1 {
            dict.set("Columns", Object::Integer(params.columns as i64));
        }
        if params.colors != 1 {
            dict.set("Colors", Object::Integer(params.colors as i64));
        }
        Some(Object::Dictionary(dict))
    }

    /// Stream dictionary skeleton for this codec: the `Filter` entry plus
    /// `DecodeParms` and filter-specific keys where applicable.
    pub fn make_stream_dict(&self) -> Dictionary {
        let mut dict = Dictionary::new();
        match self {
            // Pass-throughs and unsupported stubs write no Filter entry.
            Codec::Raw | Codec::CcittFax | Codec::Jbig2 | Codec::Jpx => return dict,
            _ => {}
        }

        dict.set("Filter", Object::name(self.name()));
        if let Some(params) = self.make_decode_params() {
            dict.set("DecodeParms", params);
        }
        if let Codec::Lzw(lzw) = self {
            dict.set("EarlyChange", Object::Integer(lzw.early_change));
        }
        dict
    }
}

/// Decode a stream object's payload through the filter pipeline described
/// by its dictionary.
pub fn decode_stream(stream: &Stream) -> Result<Vec<u8>> {
    MultiCodec::from_stream(stream)?.decode(&stream.data)
}
