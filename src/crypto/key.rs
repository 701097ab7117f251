//! AES-128 decryption key as handed out by the grid operator.

use crate::constants::{KEY_HEX_LENGTH, KEY_LENGTH};
use crate::error::SmartMeterError;
use crate::util::hex::{decode_hex, HexError};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// 16-byte global unicast encryption key. Wiped from memory on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct DecryptionKey {
    key: [u8; KEY_LENGTH],
}

impl DecryptionKey {
    /// Parse a key entered as 32 hex characters.
    pub fn from_hex(hex_str: &str) -> Result<Self, SmartMeterError> {
        let char_count = hex_str.chars().count();
        if char_count != KEY_HEX_LENGTH {
            return Err(SmartMeterError::InvalidKey(format!(
                "must be {KEY_HEX_LENGTH} hex characters long, got {char_count}"
            )));
        }

        let bytes = Zeroizing::new(decode_hex(hex_str).map_err(|e| match e {
            HexError::InvalidCharacter(c) => {
                SmartMeterError::InvalidKey(format!("must be in hex, found {c:?}"))
            }
            other => SmartMeterError::InvalidKey(other.to_string()),
        })?);

        Self::from_bytes(&bytes)
    }

    /// Create a key from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SmartMeterError> {
        let key: [u8; KEY_LENGTH] = bytes.try_into().map_err(|_| {
            SmartMeterError::InvalidKey(format!(
                "expected {KEY_LENGTH} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self { key })
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }
}

// Never print key material.
impl fmt::Debug for DecryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DecryptionKey(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_from_hex() {
        let key = DecryptionKey::from_hex("000102030405060708090A0B0C0D0E0F").unwrap();
        assert_eq!(key.as_bytes()[0], 0x00);
        assert_eq!(key.as_bytes()[10], 0x0A);
        assert_eq!(key.as_bytes()[15], 0x0F);
    }

    #[test]
    fn test_key_lowercase_hex() {
        let upper = DecryptionKey::from_hex("ABCDEF0123456789ABCDEF0123456789").unwrap();
        let lower = DecryptionKey::from_hex("abcdef0123456789abcdef0123456789").unwrap();
        assert_eq!(upper, lower);
    }

    #[test]
    fn test_key_wrong_length() {
        for key in ["", "00", "0000000000000000000000000000000", "000000000000000000000000000000000"] {
            let err = DecryptionKey::from_hex(key).unwrap_err();
            assert!(matches!(err, SmartMeterError::InvalidKey(_)), "{key:?}");
            assert!(err.is_configuration_error());
        }
    }

    #[test]
    fn test_key_length_counts_characters() {
        // 16 two-byte characters: 32 bytes but only 16 characters
        let err = DecryptionKey::from_hex(&"é".repeat(16)).unwrap_err();
        assert!(matches!(err, SmartMeterError::InvalidKey(msg) if msg.ends_with("got 16")));

        // 32 characters, one of them multi-byte
        let key = format!("{}é", "0".repeat(31));
        let err = DecryptionKey::from_hex(&key).unwrap_err();
        assert!(matches!(err, SmartMeterError::InvalidKey(msg) if msg.contains("hex, found 'é'")));
    }

    #[test]
    fn test_key_not_hex() {
        let err = DecryptionKey::from_hex("0000000000000000000000000000000Z").unwrap_err();
        assert!(matches!(err, SmartMeterError::InvalidKey(msg) if msg.contains("hex")));
    }

    #[test]
    fn test_key_debug_is_redacted() {
        let key = DecryptionKey::from_hex("ffffffffffffffffffffffffffffffff").unwrap();
        assert_eq!(format!("{key:?}"), "DecryptionKey(..)");
    }

    #[test]
    fn test_key_from_bytes_length() {
        assert!(DecryptionKey::from_bytes(&[0u8; 16]).is_ok());
        assert!(DecryptionKey::from_bytes(&[0u8; 15]).is_err());
    }
}
