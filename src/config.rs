//! Meter session configuration.
//!
//! Configuration is taken from the command line or from a JSON file:
//!
//! ```json
//! {
//!     "interface": "/dev/ttyUSB0",
//!     "key": "00112233445566778899AABBCCDDEEFF",
//!     "serial": { "baudrate": 9600, "timeout_ms": 3000 },
//!     "resync_budget": 1024,
//!     "verify_fcs": false
//! }
//! ```

use crate::constants::DEFAULT_RESYNC_BUDGET;
use crate::crypto::DecryptionKey;
use crate::error::SmartMeterError;
use crate::transport::SerialConfig;
use serde::Deserialize;
use std::fmt;
use std::path::Path;

fn default_resync_budget() -> usize {
    DEFAULT_RESYNC_BUDGET
}

#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct MeterConfig {
    /// Serial interface the meter is attached to, e.g. `/dev/ttyUSB0` or `COM3`
    pub interface: String,
    /// Decryption key as 32 hex characters
    pub key: String,
    #[serde(default)]
    pub serial: SerialConfig,
    /// Bytes the frame reader may discard per reading while resynchronizing
    #[serde(default = "default_resync_budget")]
    pub resync_budget: usize,
    /// Reject frames whose HDLC frame check sequence does not match
    #[serde(default)]
    pub verify_fcs: bool,
}

impl MeterConfig {
    pub fn new(interface: impl Into<String>, key: impl Into<String>) -> Self {
        MeterConfig {
            interface: interface.into(),
            key: key.into(),
            serial: SerialConfig::default(),
            resync_budget: DEFAULT_RESYNC_BUDGET,
            verify_fcs: false,
        }
    }

    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SmartMeterError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| SmartMeterError::Config(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&content)
            .map_err(|e| SmartMeterError::Config(format!("{}: {e}", path.display())))
    }

    /// Parse the configured key.
    pub fn decryption_key(&self) -> Result<DecryptionKey, SmartMeterError> {
        DecryptionKey::from_hex(&self.key)
    }
}

// Keeps the key out of logs.
impl fmt::Debug for MeterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeterConfig")
            .field("interface", &self.interface)
            .field("key", &"<redacted>")
            .field("serial", &self.serial)
            .field("resync_budget", &self.resync_budget)
            .field("verify_fcs", &self.verify_fcs)
            .finish()
    }
}
