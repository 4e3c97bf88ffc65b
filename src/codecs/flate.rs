//! FlateDecode (zlib/deflate) implementation.
//!
//! The most common PDF stream filter. Wraps zlib via the flate2 crate with
//! default settings, with optional TIFF/PNG predictor pre/post-processing.

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::codecs::predictor::{self, PredictorParams};
use crate::error::{Error, Result};

pub(crate) fn decode(input: &[u8], params: &PredictorParams) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(input);
    let mut output = Vec::new();
    decoder.read_to_end(&mut output).map_err(|e| {
        log::debug!("FlateDecode failed on {} input bytes: {}", input.len(), e);
        Error::decode("FlateDecode", e.to_string())
    })?;

    if params.is_identity() {
        return Ok(output);
    }
    predictor::decode(&output, params)
}

pub(crate) fn encode(data: &[u8], params: &PredictorParams) -> Result<Vec<u8>> {
    // Only no-predictor, TIFF and PNG Sub rows are emitted when encoding.
    let filtered = predictor::encode(data, params)?;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&filtered)?;
    Ok(encoder.finish()?)
}
