//! Serial filter pipelines.
//!
//! A stream's `Filter` entry may name a single filter or an ordered array;
//! `DecodeParms` may be absent, a single dictionary applied to every stage,
//! or an array matched positionally. Decoding applies stages in declared
//! order, encoding in reverse order.

use crate::codecs::{
    dct::DctParams, lzw::LzwParams, predictor::PredictorParams, Codec, FILTER_ASCII85,
    FILTER_ASCII_HEX, FILTER_CCITT_FAX, FILTER_DCT, FILTER_FLATE, FILTER_JBIG2, FILTER_JPX,
    FILTER_LZW, FILTER_RAW, FILTER_RUN_LENGTH,
};
use crate::error::{Error, Result};
use crate::object::{Dictionary, Object, Stream};

/// An ordered filter pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultiCodec {
    stages: Vec<Codec>,
}

impl MultiCodec {
    /// Empty pipeline; decoding and encoding are the identity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage at the end of the decode order.
    pub fn push(&mut self, codec: Codec) {
        self.stages.push(codec);
    }

    /// The stages in decode order.
    pub fn stages(&self) -> &[Codec] {
        &self.stages
    }

    /// Build the pipeline described by a stream object's dictionary.
    pub fn from_stream(stream: &Stream) -> Result<Self> {
        Self::from_stream_dict(&stream.dict, &stream.data)
    }

    /// Build a pipeline from a stream dictionary and the raw payload.
    ///
    /// The payload is only consulted when a `DCTDecode` stage needs its
    /// JPEG header sniffed; any wrapping filters declared before it are
    /// applied first.
    pub fn from_stream_dict(dict: &Dictionary, payload: &[u8]) -> Result<Self> {
        let names: Vec<&str> = match dict.get("Filter") {
            None => Vec::new(),
            Some(Object::Name(name)) => vec![name.as_str()],
            Some(Object::Array(items)) => {
                let mut names = Vec::with_capacity(items.len());
                for item in items {
                    names.push(item.as_name().ok_or(Error::TypeMismatch {
                        entry: "Filter",
                        expected: "name",
                    })?);
                }
                names
            }
            Some(_) => {
                return Err(Error::TypeMismatch {
                    entry: "Filter",
                    expected: "name or array",
                });
            }
        };

        // One parameter dictionary per stage: a single dict applies to all
        // stages, an array is matched positionally with nulls as gaps.
        enum Parms<'a> {
            None,
            Shared(&'a Dictionary),
            PerStage(Vec<Option<&'a Dictionary>>),
        }
        let parms = match dict.get("DecodeParms") {
            None => Parms::None,
            Some(Object::Dictionary(d)) => Parms::Shared(d),
            Some(Object::Array(items)) => {
                Parms::PerStage(items.iter().map(Object::as_dict).collect())
            }
            Some(other) => {
                log::debug!("ignoring DecodeParms of type {}", other.type_name());
                Parms::None
            }
        };

        let mut pipeline = MultiCodec::new();
        for (idx, name) in names.iter().enumerate() {
            let stage_parms = match &parms {
                Parms::None => None,
                Parms::Shared(d) => Some(*d),
                Parms::PerStage(list) => {
                    if idx >= list.len() {
                        return Err(Error::MissingDictEntry("DecodeParms"));
                    }
                    list[idx]
                }
            };
            let codec = build_stage(name, stage_parms, dict, &pipeline, payload)?;
            pipeline.push(codec);
        }

        Ok(pipeline)
    }

    /// Apply every stage's decoder in declared order.
    pub fn decode(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut current = data.to_vec();
        for codec in &self.stages {
            log::trace!("pipeline decode: applying {}", codec.name());
            current = codec.decode(&current)?;
        }
        Ok(current)
    }

    /// Apply every stage's encoder in reverse declared order. Fails if any
    /// stage refuses; stages are never reordered or substituted.
    pub fn encode(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut current = data.to_vec();
        for codec in self.stages.iter().rev() {
            current = codec.encode(&current)?;
        }
        Ok(current)
    }

    /// Decode-parameters entry matching the pipeline: the single stage's
    /// dictionary, or a parallel array with nulls for stages without one.
    pub fn make_decode_params(&self) -> Option<Object> {
        match self.stages.len() {
            0 => None,
            1 => self.stages[0].make_decode_params(),
            _ => {
                let items: Vec<Object> = self
                    .stages
                    .iter()
                    .map(|c| c.make_decode_params().unwrap_or(Object::Null))
                    .collect();
                Some(Object::Array(items))
            }
        }
    }

    /// Stream dictionary for the pipeline: `Filter` as a name or array of
    /// names, `DecodeParms` where needed, and filter-specific keys copied
    /// through from the stages.
    pub fn make_stream_dict(&self) -> Dictionary {
        let mut dict = Dictionary::new();

        for codec in &self.stages {
            for (key, value) in codec.make_stream_dict().iter() {
                if key != "Filter" && key != "DecodeParms" {
                    dict.set(key.clone(), value.clone());
                }
            }
        }

        match self.stages.len() {
            0 => {}
            1 => dict.set("Filter", Object::name(self.stages[0].name())),
            _ => {
                let names = self
                    .stages
                    .iter()
                    .map(|c| Object::name(c.name()))
                    .collect();
                dict.set("Filter", Object::Array(names));
            }
        }
        if let Some(parms) = self.make_decode_params() {
            dict.set("DecodeParms", parms);
        }

        dict
    }
}

fn build_stage(
    name: &str,
    parms: Option<&Dictionary>,
    stream_dict: &Dictionary,
    prefix: &MultiCodec,
    payload: &[u8],
) -> Result<Codec> {
    match name {
        FILTER_FLATE => Ok(Codec::Flate(PredictorParams::from_decode_parms(parms)?)),
        FILTER_LZW => {
            let predictor = PredictorParams::from_decode_parms(parms)?;
            // EarlyChange belongs in the decode parameters, but writers
            // also put it at the top of the stream dictionary.
            let early_change = parms
                .and_then(|d| d.get_integer("EarlyChange"))
                .or_else(|| stream_dict.get_integer("EarlyChange"))
                .unwrap_or(1);
            if early_change != 0 && early_change != 1 {
                return Err(Error::UnsupportedEncodingParameters(format!(
                    "EarlyChange={} (must be 0 or 1)",
                    early_change
                )));
            }
            Ok(Codec::Lzw(LzwParams {
                predictor,
                early_change,
            }))
        }
        FILTER_DCT => {
            // Wrapping filters are undone before the header is inspected.
            let encoded = prefix.decode(payload)?;
            Ok(Codec::Dct(DctParams::from_jpeg_header(&encoded)?))
        }
        FILTER_RUN_LENGTH => Ok(Codec::RunLength),
        FILTER_ASCII_HEX => Ok(Codec::AsciiHex),
        FILTER_ASCII85 => Ok(Codec::Ascii85),
        FILTER_RAW => Ok(Codec::Raw),
        FILTER_CCITT_FAX => Ok(Codec::CcittFax),
        FILTER_JBIG2 => Ok(Codec::Jbig2),
        FILTER_JPX => Ok(Codec::Jpx),
        other => Err(Error::UnsupportedFilter(other.to_string())),
    }
}
