//! Hex input helpers for captured traffic

use thiserror::Error;

pub use divo_transport::protocol::hexlify;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HexError {
    #[error("odd-length hex string ({len} digits)")]
    OddLength { len: usize },

    #[error("non-hex digit {ch:?} at position {index}")]
    InvalidDigit { ch: char, index: usize },

    #[error("chunk size must be positive")]
    ZeroChunkSize,
}

fn nibble(ch: char, index: usize) -> Result<u8, HexError> {
    ch.to_digit(16)
        .map(|d| d as u8)
        .ok_or(HexError::InvalidDigit { ch, index })
}

/// Decode a hex string, ignoring spaces and line breaks
pub fn clean_unhexlify(val: &str) -> Result<Vec<u8>, HexError> {
    let digits: Vec<char> = val
        .chars()
        .filter(|c| !matches!(c, ' ' | '\n' | '\r' | '\t'))
        .collect();
    if digits.len() % 2 != 0 {
        return Err(HexError::OddLength { len: digits.len() });
    }

    digits
        .chunks(2)
        .enumerate()
        .map(|(i, pair)| -> Result<u8, HexError> {
            Ok(nibble(pair[0], 2 * i)? << 4 | nibble(pair[1], 2 * i + 1)?)
        })
        .collect()
}

/// Split `s` into pieces of `n` characters; the last one may be shorter
pub fn chunks(s: &str, n: usize) -> Result<Vec<String>, HexError> {
    if n == 0 {
        return Err(HexError::ZeroChunkSize);
    }
    let chars: Vec<char> = s.chars().collect();
    Ok(chars.chunks(n).map(|c| c.iter().collect()).collect())
}
