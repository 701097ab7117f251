//! # smartmeter-rs - Read Encrypted Smart Meter Push Telegrams
//!
//! Smart meters with a DLMS/COSEM customer interface push a telegram every
//! few seconds: an HDLC frame carrying an AES-128-GCM encrypted data
//! notification with the meter clock, the energy registers and the current
//! power values. This crate reads those frames from a serial port, decrypts
//! them with the key issued by the grid operator and decodes the readings.
//!
//! ## Features
//!
//! - Recover frame boundaries when listening starts in the middle of a frame
//! - Decrypt the payload with the system title and invocation counter as nonce
//! - Reject payloads that do not decrypt to a data notification (wrong key)
//! - Decode timestamp, +A/-A/+R/-R energy and +P/-P/+Q/-Q power
//! - Lazy (re)connection with "no reading" instead of errors on transient failures
//!
//! ## Usage
//!
//! ```rust,no_run
//! use smartmeter_rs::{init_logger, MeterConfig, SmartMeter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), smartmeter_rs::SmartMeterError> {
//!     init_logger(false);
//!     let config = MeterConfig::new("/dev/ttyUSB0", "00112233445566778899AABBCCDDEEFF");
//!     let mut meter = SmartMeter::open(config)?;
//!     if let Some(reading) = meter.read_meter_data().await? {
//!         println!("{reading}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod hdlc;
pub mod logging;
pub mod meter;
pub mod payload;
pub mod transport;
pub mod util;

pub use crate::config::MeterConfig;
pub use crate::error::{DecryptionFailure, SmartMeterError};
pub use crate::logging::init_logger;

pub use crypto::DecryptionKey;
pub use hdlc::{read_frame, Frame};
pub use meter::SmartMeter;
pub use payload::{MeterReading, MeterTimestamp};
pub use transport::{Connector, SerialConfig, SerialConnector, Transport};

/// List the serial ports present on this system.
pub fn available_ports() -> Result<Vec<String>, SmartMeterError> {
    SerialConnector.available_ports()
}
