//! ASCIIHexDecode implementation.
//!
//! Decoded form is pairs of hex digits; whitespace is ignored and `>` ends
//! the data. An odd number of digits gets an implicit trailing '0'.

use crate::error::{Error, Result};

pub(crate) fn decode(input: &[u8]) -> Result<Vec<u8>> {
    let mut digits = Vec::with_capacity(input.len());

    for &byte in input {
        match byte {
            b'>' => break,
            b if b.is_ascii_whitespace() => continue,
            b'0'..=b'9' | b'a'..=b'f' | b'A'..=b'F' => digits.push(hex_value(byte)),
            other => {
                log::debug!("ASCIIHexDecode: invalid byte 0x{:02x}", other);
                return Err(Error::InvalidHexCharacter(other as char));
            }
        }
    }

    if digits.len() % 2 == 1 {
        digits.push(0);
    }

    Ok(digits
        .chunks_exact(2)
        .map(|pair| (pair[0] << 4) | pair[1])
        .collect())
}

pub(crate) fn encode(data: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(data.len() * 3 + 1);
    for &byte in data {
        output.extend_from_slice(format!("{:02X} ", byte).as_bytes());
    }
    output.push(b'>');
    Ok(output)
}

fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        _ => digit - b'A' + 10,
    }
}
