//! # Record Decoder
//!
//! Maps a decrypted data notification onto meter readings. The meter pushes
//! a fixed structure (clock, four energy registers, four instantaneous power
//! values), so every value sits at a fixed offset; no A-XDR parsing is done.
//!
//! | Field                | Offset | Width | OBIS         | Unit          |
//! |----------------------|--------|-------|--------------|---------------|
//! | year                 | 22     | 2     | 0-0:1.0.0    |               |
//! | month, day           | 24, 25 | 1     |              |               |
//! | hour, minute, second | 27..30 | 1     |              |               |
//! | +A / -A              | 35, 40 | 4     | 1-0:1.8.0 / 1-0:2.8.0 | Wh → kWh |
//! | +R / -R              | 45, 50 | 4     | 1-0:3.8.0 / 1-0:4.8.0 | varh → kvarh |
//! | +P / -P              | 55, 60 | 4     | 1-0:1.7.0 / 1-0:2.7.0 | W     |
//! | +Q / -Q              | 65, 70 | 4     | 1-0:3.7.0 / 1-0:4.7.0 | var   |

use crate::constants::{ENERGY_SCALE, PAYLOAD_LENGTH, PAYLOAD_TAG};
use crate::error::DecryptionFailure;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};
use std::fmt;

const YEAR_OFFSET: usize = 22;
const MONTH_OFFSET: usize = 24;
const DAY_OFFSET: usize = 25;
const HOUR_OFFSET: usize = 27;
const MINUTE_OFFSET: usize = 28;
const SECOND_OFFSET: usize = 29;

const ACTIVE_ENERGY_IN_OFFSET: usize = 35;
const ACTIVE_ENERGY_OUT_OFFSET: usize = 40;
const REACTIVE_ENERGY_IN_OFFSET: usize = 45;
const REACTIVE_ENERGY_OUT_OFFSET: usize = 50;
const ACTIVE_POWER_IN_OFFSET: usize = 55;
const ACTIVE_POWER_OUT_OFFSET: usize = 60;
const REACTIVE_POWER_IN_OFFSET: usize = 65;
const REACTIVE_POWER_OUT_OFFSET: usize = 70;

/// Check that decryption produced a data notification.
///
/// A wrong key yields random bytes, which fail the tag check with
/// probability 255/256.
pub fn validate_payload(data: &[u8]) -> Result<&[u8; PAYLOAD_LENGTH], DecryptionFailure> {
    let first = *data.first().ok_or(DecryptionFailure::EmptyPayload)?;

    let payload: &[u8; PAYLOAD_LENGTH] =
        data.try_into()
            .map_err(|_| DecryptionFailure::LengthMismatch {
                expected: PAYLOAD_LENGTH,
                actual: data.len(),
            })?;

    if first != PAYLOAD_TAG {
        return Err(DecryptionFailure::UnexpectedTag {
            expected: PAYLOAD_TAG,
            actual: first,
        });
    }
    Ok(payload)
}

/// Validate and decode a decrypted payload.
pub fn decode_payload(data: &[u8]) -> Result<MeterReading, DecryptionFailure> {
    validate_payload(data).map(decode)
}

/// Decode a validated payload. Infallible: every field is a fixed-width
/// unsigned integer at a fixed offset.
pub fn decode(payload: &[u8; PAYLOAD_LENGTH]) -> MeterReading {
    let energy = |offset| be_u32(payload, offset) as f64 / ENERGY_SCALE;

    MeterReading {
        timestamp: MeterTimestamp {
            year: u16::from_be_bytes([payload[YEAR_OFFSET], payload[YEAR_OFFSET + 1]]),
            month: payload[MONTH_OFFSET],
            day: payload[DAY_OFFSET],
            hour: payload[HOUR_OFFSET],
            minute: payload[MINUTE_OFFSET],
            second: payload[SECOND_OFFSET],
        },
        active_energy_in: energy(ACTIVE_ENERGY_IN_OFFSET),
        active_energy_out: energy(ACTIVE_ENERGY_OUT_OFFSET),
        reactive_energy_in: energy(REACTIVE_ENERGY_IN_OFFSET),
        reactive_energy_out: energy(REACTIVE_ENERGY_OUT_OFFSET),
        active_power_in: be_u32(payload, ACTIVE_POWER_IN_OFFSET),
        active_power_out: be_u32(payload, ACTIVE_POWER_OUT_OFFSET),
        reactive_power_in: be_u32(payload, REACTIVE_POWER_IN_OFFSET),
        reactive_power_out: be_u32(payload, REACTIVE_POWER_OUT_OFFSET),
    }
}

fn be_u32(payload: &[u8; PAYLOAD_LENGTH], offset: usize) -> u32 {
    u32::from_be_bytes([
        payload[offset],
        payload[offset + 1],
        payload[offset + 2],
        payload[offset + 3],
    ])
}

/// Meter clock as transmitted. The fields are kept raw so that a payload
/// with an impossible date still decodes; see [`MeterTimestamp::to_datetime`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeterTimestamp {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl MeterTimestamp {
    /// The local wall-clock time of the meter, `None` if the fields do not form a valid date.
    pub fn to_datetime(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(self.year as i32, self.month as u32, self.day as u32)?.and_hms_opt(
            self.hour as u32,
            self.minute as u32,
            self.second as u32,
        )
    }
}

impl fmt::Display for MeterTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

impl Serialize for MeterTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.to_datetime() {
            Some(datetime) => datetime.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }
}

/// One set of readings pushed by the meter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeterReading {
    pub timestamp: MeterTimestamp,
    /// +A, kWh
    pub active_energy_in: f64,
    /// -A, kWh
    pub active_energy_out: f64,
    /// +R, kvarh
    pub reactive_energy_in: f64,
    /// -R, kvarh
    pub reactive_energy_out: f64,
    /// +P, W
    pub active_power_in: u32,
    /// -P, W
    pub active_power_out: u32,
    /// +Q, var
    pub reactive_power_in: u32,
    /// -Q, var
    pub reactive_power_out: u32,
}

impl fmt::Display for MeterReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.timestamp)?;
        writeln!(f, "+A: {:.3} kWh", self.active_energy_in)?;
        writeln!(f, "-A: {:.3} kWh", self.active_energy_out)?;
        writeln!(f, "+R: {:.3} kvarh", self.reactive_energy_in)?;
        writeln!(f, "-R: {:.3} kvarh", self.reactive_energy_out)?;
        writeln!(f, "+P: {} W", self.active_power_in)?;
        writeln!(f, "-P: {} W", self.active_power_out)?;
        writeln!(f, "+Q: {} var", self.reactive_power_in)?;
        write!(f, "-Q: {} var", self.reactive_power_out)
    }
}
