//! ASCII85Decode (base-85) implementation.
//!
//! Five digits in the alphabet '!'..'u' encode four bytes; 'z' stands for
//! four zero bytes at a group boundary. `~>` terminates the data. A final
//! group of n digits encodes n-1 bytes, with missing digits taken as 'u'.

use crate::error::{Error, Result};

pub(crate) fn decode(input: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    let mut acc: u32 = 0;
    let mut count = 0usize;

    let mut i = 0;
    while i < input.len() {
        let byte = input[i];
        match byte {
            b'~' => {
                if i + 1 < input.len() && input[i + 1] != b'>' {
                    return Err(Error::decode("ASCII85Decode", "malformed EOD marker"));
                }
                break;
            }
            b'z' if count == 0 => output.extend_from_slice(&[0, 0, 0, 0]),
            b'z' => {
                return Err(Error::decode(
                    "ASCII85Decode",
                    "'z' inside a five-digit group",
                ));
            }
            b'!'..=b'u' => {
                acc = push_digit(acc, (byte - b'!') as u32)?;
                count += 1;
                if count == 5 {
                    output.extend_from_slice(&acc.to_be_bytes());
                    acc = 0;
                    count = 0;
                }
            }
            b if b.is_ascii_whitespace() => {}
            other => {
                return Err(Error::decode(
                    "ASCII85Decode",
                    format!("invalid character (0x{:02x})", other),
                ));
            }
        }
        i += 1;
    }

    // A trailing group of n digits encodes n-1 bytes; pad with 'u' (84).
    if count > 0 {
        if count == 1 {
            return Err(Error::decode(
                "ASCII85Decode",
                "single digit in final group",
            ));
        }
        for _ in count..5 {
            acc = push_digit(acc, 84)?;
        }
        output.extend_from_slice(&acc.to_be_bytes()[..count - 1]);
    }

    Ok(output)
}

fn push_digit(acc: u32, digit: u32) -> Result<u32> {
    acc.checked_mul(85)
        .and_then(|v| v.checked_add(digit))
        .ok_or_else(|| Error::decode("ASCII85Decode", "group value overflow"))
}

pub(crate) fn encode(data: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(data.len() / 4 * 5 + 2);

    for chunk in data.chunks(4) {
        let n = chunk.len();
        let mut group = [0u8; 4];
        group[..n].copy_from_slice(chunk);
        let value = u32::from_be_bytes(group);

        if value == 0 && n == 4 {
            output.push(b'z');
            continue;
        }

        let mut digits = [0u8; 5];
        let mut rem = value;
        for slot in digits.iter_mut().rev() {
            *slot = (rem % 85) as u8;
            rem /= 85;
        }
        // A trailing group of n bytes emits n+1 digits.
        for &d in &digits[..n + 1] {
            output.push(d + b'!');
        }
    }

    output.extend_from_slice(b"~>");
    Ok(output)
}
