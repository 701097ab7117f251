//! The payload module interprets decrypted data notifications.

pub mod reading;

pub use reading::{decode, decode_payload, validate_payload, MeterReading, MeterTimestamp};
