//! Smart Meter Protocol Constants
//!
//! This module defines the fixed layout of the push telegrams emitted on the
//! meter's customer interface: an HDLC-framed DLMS general-glo-ciphering APDU
//! carrying an AES-128-GCM encrypted data notification.

use std::time::Duration;

// ----------------------------------------------------------------------------
// HDLC framing
// ----------------------------------------------------------------------------

/// HDLC flag byte opening and closing every frame
pub const HDLC_FLAG: u8 = 0x7E;

/// Total length of one push telegram including both flags
pub const FRAME_LENGTH: usize = 105;

/// Trailing bytes excluded from the ciphertext: FCS (2) + closing flag (1)
pub const FRAME_TRAILER_LENGTH: usize = 3;

/// Length of the HDLC frame check sequence
pub const HDLC_FCS_LENGTH: usize = 2;

// ----------------------------------------------------------------------------
// Ciphering header (offsets into the raw frame)
// ----------------------------------------------------------------------------

/// System title of the meter (8 bytes)
pub const SYSTEM_TITLE_OFFSET: usize = 14;
pub const SYSTEM_TITLE_LENGTH: usize = 8;

/// Invocation counter (4 bytes, big-endian)
pub const INVOCATION_COUNTER_OFFSET: usize = 24;
pub const INVOCATION_COUNTER_LENGTH: usize = 4;

/// First byte of the encrypted APDU
pub const CIPHERTEXT_OFFSET: usize = INVOCATION_COUNTER_OFFSET + INVOCATION_COUNTER_LENGTH;

/// GCM nonce = system title ++ invocation counter
pub const NONCE_LENGTH: usize = SYSTEM_TITLE_LENGTH + INVOCATION_COUNTER_LENGTH;

// ----------------------------------------------------------------------------
// Decrypted data notification
// ----------------------------------------------------------------------------

/// Expected length of the decrypted payload
pub const PAYLOAD_LENGTH: usize = 74;

/// DLMS data-notification tag, first byte of a correctly decrypted payload
pub const PAYLOAD_TAG: u8 = 0x0F;

/// Energy counters are transmitted in Wh / varh
pub const ENERGY_SCALE: f64 = 1000.0;

// ----------------------------------------------------------------------------
// Cipher
// ----------------------------------------------------------------------------

/// AES-128 key length in bytes
pub const KEY_LENGTH: usize = 16;

/// Key length as entered by the user (hex characters)
pub const KEY_HEX_LENGTH: usize = KEY_LENGTH * 2;

/// AES block size
pub const AES_BLOCK_SIZE: usize = 16;

// ----------------------------------------------------------------------------
// Serial defaults (customer interface: 9600 8N1)
// ----------------------------------------------------------------------------

pub const DEFAULT_BAUDRATE: u32 = 9600;
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(3);

/// Bytes the frame reader may discard while resynchronizing before giving up
pub const DEFAULT_RESYNC_BUDGET: usize = 1024;
