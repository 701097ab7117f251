//! # Hex Encoding/Decoding Utilities
//!
//! Hex helpers used for key parsing, raw telegram output and debug logging.
//!
//! ```rust
//! use smartmeter_rs::util::hex::{encode_hex, decode_hex, format_hex_compact};
//!
//! let data = [0x7E, 0xA0, 0x67, 0xCF];
//! assert_eq!(encode_hex(&data), "7ea067cf");
//! assert_eq!(decode_hex("7EA067CF").unwrap(), data);
//! assert_eq!(format_hex_compact(&data), "7e a0 67 cf");
//! ```

use thiserror::Error;

/// Errors that can occur during hex operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HexError {
    #[error("Invalid hex character: {0}")]
    InvalidCharacter(char),

    #[error("Odd number of hex characters: {0}")]
    OddLength(usize),

    #[error("Empty hex string")]
    EmptyString,
}

/// Encode bytes to lowercase hex string
pub fn encode_hex(data: &[u8]) -> String {
    hex::encode(data)
}

/// Decode a hex string to bytes.
///
/// Accepts both uppercase and lowercase characters. Unlike a lenient parser,
/// whitespace and separators are rejected: a key with a stray character is a
/// configuration mistake, not something to silently repair.
pub fn decode_hex(hex_str: &str) -> Result<Vec<u8>, HexError> {
    if hex_str.is_empty() {
        return Err(HexError::EmptyString);
    }

    if let Some(c) = hex_str.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(HexError::InvalidCharacter(c));
    }

    if hex_str.len() % 2 != 0 {
        return Err(HexError::OddLength(hex_str.len()));
    }

    hex::decode(hex_str).map_err(|_| HexError::OddLength(hex_str.len()))
}

/// Format hex data for compact display (useful for logs)
///
/// Formats data as "7e a0 67" with spaces between bytes.
pub fn format_hex_compact(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}
