//! RunLengthDecode implementation.
//!
//! Encoded data is a sequence of runs, each a length byte followed by data:
//! - Length 0-127: the next length+1 bytes are literal.
//! - Length 129-255: the next byte repeats 257-length times.
//! - Length 128: end of data, terminates decoding.

use crate::error::{Error, Result};

pub(crate) fn decode(input: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    let mut i = 0;

    while i < input.len() {
        let length = input[i];
        i += 1;

        match length {
            0..=127 => {
                let count = length as usize + 1;
                if i + count > input.len() {
                    return Err(Error::decode(
                        "RunLengthDecode",
                        format!(
                            "literal run needs {} bytes, {} available",
                            count,
                            input.len() - i
                        ),
                    ));
                }
                output.extend_from_slice(&input[i..i + count]);
                i += count;
            }
            128 => break,
            129..=255 => {
                let count = 257 - length as usize;
                if i >= input.len() {
                    return Err(Error::decode(
                        "RunLengthDecode",
                        "missing byte for repeated run",
                    ));
                }
                let byte = input[i];
                i += 1;
                output.resize(output.len() + count, byte);
            }
        }
    }

    Ok(output)
}

/// Minimum-size encoding: runs whenever at least two identical bytes occur,
/// literals otherwise, flushed at the 128-byte format maximum.
pub(crate) fn encode(data: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    let mut literal: Vec<u8> = Vec::new();
    let mut i = 0;

    while i < data.len() {
        let byte = data[i];
        let mut run = 1;
        while i + run < data.len() && data[i + run] == byte && run < 128 {
            run += 1;
        }

        if run >= 2 {
            flush_literal(&mut output, &mut literal);
            output.push((257 - run) as u8);
            output.push(byte);
            i += run;
        } else {
            literal.push(byte);
            if literal.len() == 128 {
                flush_literal(&mut output, &mut literal);
            }
            i += 1;
        }
    }

    flush_literal(&mut output, &mut literal);
    output.push(128);
    Ok(output)
}

fn flush_literal(output: &mut Vec<u8>, literal: &mut Vec<u8>) {
    if !literal.is_empty() {
        output.push((literal.len() - 1) as u8);
        output.extend_from_slice(literal);
        literal.clear();
    }
}
