//! Filter pipeline integration tests.
//!
//! Exercises the codec layer end to end: single filters, chained filter
//! arrays with positional decode parameters, stream-dictionary binding in
//! both directions, and the round-trip guarantees for every filter with a
//! working encoder.

use pdf_forge::codecs::{decode_stream, Codec, LzwParams, MultiCodec, PredictorParams};
use pdf_forge::object::{Dictionary, Object, Stream};

fn filter_array(names: &[&str]) -> Object {
    Object::Array(names.iter().map(|n| Object::name(*n)).collect())
}

#[test]
fn test_every_encodable_codec_roundtrips() {
    let payloads: Vec<Vec<u8>> = vec![
        Vec::new(),
        b"short".to_vec(),
        vec![0u8; 256],
        (0u8..=255).collect(),
        b"repetition repetition repetition ".repeat(50),
    ];

    let codecs = [
        Codec::flate(),
        Codec::Lzw(LzwParams {
            predictor: PredictorParams::default(),
            early_change: 0,
        }),
        Codec::RunLength,
        Codec::AsciiHex,
        Codec::Ascii85,
        Codec::Raw,
    ];

    for codec in &codecs {
        for payload in &payloads {
            // Empty AES-style cases aside, encode then decode must be the
            // identity for every non-lossy filter.
            let encoded = codec.encode(payload).unwrap();
            let decoded = codec.decode(&encoded).unwrap();
            assert_eq!(&decoded, payload, "{} with {} bytes", codec.name(), payload.len());
        }
    }
}

#[test]
fn test_flate_predictor_roundtrip_through_stream_dict() {
    let codec = Codec::flate_with_predictor(16);
    let data: Vec<u8> = (0..160u8).collect();
    let encoded = codec.encode(&data).unwrap();

    // The codec's own stream dictionary must describe the encoded bytes
    // well enough for a fresh pipeline to decode them.
    let dict = codec.make_stream_dict();
    let stream = Stream::new(dict, encoded);
    assert_eq!(decode_stream(&stream).unwrap(), data);
}

#[test]
fn test_chained_filters_decode_in_declared_order() {
    let payload = b"stacked filters: flate inside, ascii85 outside".to_vec();
    let flated = Codec::flate().encode(&payload).unwrap();
    let wrapped = Codec::Ascii85.encode(&flated).unwrap();

    let mut dict = Dictionary::new();
    dict.set("Filter", filter_array(&["ASCII85Decode", "FlateDecode"]));
    let stream = Stream::new(dict, wrapped);

    assert_eq!(decode_stream(&stream).unwrap(), payload);
}

#[test]
fn test_pipeline_encode_applies_reverse_order() {
    let mut pipeline = MultiCodec::new();
    pipeline.push(Codec::AsciiHex);
    pipeline.push(Codec::RunLength);

    let payload = b"encode me backwards".to_vec();
    let encoded = pipeline.encode(&payload).unwrap();

    // The outermost representation must be hex text.
    assert!(encoded
        .iter()
        .all(|b| b.is_ascii_hexdigit() || *b == b' ' || *b == b'>'));
    assert_eq!(pipeline.decode(&encoded).unwrap(), payload);
}

#[test]
fn test_decode_parms_array_with_null_gap() {
    let predictor = PredictorParams {
        predictor: 11,
        columns: 8,
        colors: 1,
        bits_per_component: 8,
    };
    let data: Vec<u8> = (0..64u8).map(|b| b / 3).collect();
    let flated = Codec::Flate(predictor).encode(&data).unwrap();
    let hexed = Codec::AsciiHex.encode(&flated).unwrap();

    let mut parms = Dictionary::new();
    parms.set("Predictor", Object::Integer(11));
    parms.set("Columns", Object::Integer(8));

    let mut dict = Dictionary::new();
    dict.set("Filter", filter_array(&["ASCIIHexDecode", "FlateDecode"]));
    dict.set(
        "DecodeParms",
        Object::Array(vec![Object::Null, Object::Dictionary(parms)]),
    );
    let stream = Stream::new(dict, hexed);

    assert_eq!(decode_stream(&stream).unwrap(), data);
}

#[test]
fn test_lzw_early_change_selected_from_stream_dict() {
    // Weezl's plain MSB encoder produces the postponed dialect, which a
    // stream must declare with EarlyChange 0.
    let payload = b"lzw dialect selection test, repeated: lzw lzw lzw".to_vec();
    let codec = Codec::Lzw(LzwParams {
        predictor: PredictorParams::default(),
        early_change: 0,
    });
    let encoded = codec.encode(&payload).unwrap();

    let mut dict = Dictionary::new();
    dict.set("Filter", Object::name("LZWDecode"));
    dict.set("EarlyChange", Object::Integer(0));
    let stream = Stream::new(dict, encoded.clone());
    assert_eq!(decode_stream(&stream).unwrap(), payload);

    // The default dialect (1) reads the same bytes with a shifted code
    // width and must not produce the plaintext.
    let mut dict = Dictionary::new();
    dict.set("Filter", Object::name("LZWDecode"));
    let stream = Stream::new(dict, encoded);
    match decode_stream(&stream) {
        Ok(decoded) => assert_ne!(decoded, payload),
        Err(_) => {}
    }
}

#[test]
fn test_run_length_decode_grammar() {
    // Length-5 literal, then a three-byte run, then EOD.
    let encoded = [0x05, 0x48, 0x65, 0x6C, 0x6C, 0x6F, 0x20, 0xFE, 0x21, 0x80];
    assert_eq!(Codec::RunLength.decode(&encoded).unwrap(), b"Hello !!!");
}

#[test]
fn test_ascii85_decode_known_text() {
    let decoded = Codec::Ascii85
        .decode(b"9jqo^BlbD-BleB1DJ+*+F(f,q~>")
        .unwrap();
    assert_eq!(decoded, b"Man is distinguished");
}

#[test]
fn test_unsupported_filters_fail_in_pipelines() {
    for name in ["CCITTFaxDecode", "JBIG2Decode", "JPXDecode"] {
        let mut dict = Dictionary::new();
        dict.set("Filter", Object::name(name));
        let stream = Stream::new(dict, b"opaque".to_vec());

        // Building the pipeline succeeds (the filter is declared), but
        // running it reports the unsupported filter.
        let pipeline = MultiCodec::from_stream(&stream).unwrap();
        let err = pipeline.decode(&stream.data).unwrap_err();
        assert!(err.to_string().contains(name), "{}", err);
    }
}

#[test]
fn test_pipeline_stream_dict_rebuild() {
    let mut pipeline = MultiCodec::new();
    pipeline.push(Codec::Ascii85);
    pipeline.push(Codec::flate_with_predictor(4));

    let data = vec![9u8; 32];
    let encoded = pipeline.encode(&data).unwrap();

    // Rebuilding from the generated dictionary reproduces the pipeline.
    let dict = pipeline.make_stream_dict();
    let rebuilt = MultiCodec::from_stream_dict(&dict, &encoded).unwrap();
    assert_eq!(rebuilt.stages().len(), 2);
    assert_eq!(rebuilt.decode(&encoded).unwrap(), data);
}

#[test]
fn test_missing_filter_entry_means_raw_payload() {
    let stream = Stream::new(Dictionary::new(), b"plain bytes".to_vec());
    assert_eq!(decode_stream(&stream).unwrap(), b"plain bytes");
}
