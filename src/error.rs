//! # Smart Meter Error Handling
//!
//! This module defines the SmartMeterError enum, which represents the different
//! error types that can occur while configuring, connecting to and decoding a
//! smart meter.

use thiserror::Error;

/// Reasons a decrypted payload is rejected. All of them mean the key is wrong
/// or the frame was garbled.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecryptionFailure {
    #[error("decrypted payload is empty")]
    EmptyPayload,

    #[error("decrypted payload has {actual} bytes, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("decrypted payload starts with 0x{actual:02X}, expected 0x{expected:02X}")]
    UnexpectedTag { expected: u8, actual: u8 },

    #[error("frame of {frame_len} bytes has no room for a ciphertext")]
    CiphertextOutOfBounds { frame_len: usize },
}

/// Represents the different error types that can occur in the smart meter crate.
#[derive(Debug, Error)]
pub enum SmartMeterError {
    /// The decryption key is not 32 hex characters.
    #[error("Invalid decryption key: {0}")]
    InvalidKey(String),

    /// The configured serial interface is not present on this system.
    #[error("Interface {interface} does not exist (available: {available:?})")]
    InterfaceNotFound {
        interface: String,
        available: Vec<String>,
    },

    /// A configuration file could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Opening the serial port or reading from it failed.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A read ended before the requested number of bytes arrived.
    #[error("Read timed out after {received} of {expected} bytes")]
    Timeout { expected: usize, received: usize },

    /// A read was attempted without an open transport.
    #[error("Not connected")]
    NotConnected,

    /// The frame reader discarded its whole budget without finding an aligned frame.
    #[error("Unable to resynchronize on frame boundary after discarding {discarded} bytes")]
    FramingDesync { discarded: usize },

    /// The payload did not decrypt to a data notification, the key seems not to be correct.
    #[error("Decryption failed: {0}")]
    Decryption(#[from] DecryptionFailure),

    /// The frame ends before a frame check sequence could be located.
    #[error("Frame of {frame_len} bytes is too short to carry a frame check sequence")]
    FrameTooShort { frame_len: usize },

    /// The HDLC frame check sequence does not match.
    #[error("Invalid frame check sequence: expected 0x{expected:04X}, calculated 0x{calculated:04X}")]
    FrameCheck { expected: u16, calculated: u16 },
}

impl SmartMeterError {
    /// Errors raised before the first read, never resolved by retrying.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidKey(_) | Self::InterfaceNotFound { .. } | Self::Config(_)
        )
    }

    /// Transport level failures, recoverable on the next polling cycle.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::Timeout { .. } | Self::NotConnected
        )
    }
}

impl From<std::io::Error> for SmartMeterError {
    fn from(e: std::io::Error) -> Self {
        SmartMeterError::Connection(e.to_string())
    }
}
