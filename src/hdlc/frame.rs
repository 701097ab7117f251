//! # HDLC Push Frame
//!
//! A frame is one fixed-length unit of the meter's push stream, opened and
//! closed by the HDLC flag. Only the subfields needed for decryption are
//! exposed; the addressing and LLC header are carried but not interpreted.
//!
//! ```text
//! | 0x7E | header .. | system title | .. | invocation counter | ciphertext .. | FCS | 0x7E |
//! | 0    |           | 14..22       |    | 24..28             | 28..len-3     |     | -1   |
//! ```

use crate::constants::{
    CIPHERTEXT_OFFSET, FRAME_TRAILER_LENGTH, HDLC_FCS_LENGTH, INVOCATION_COUNTER_LENGTH,
    INVOCATION_COUNTER_OFFSET, NONCE_LENGTH, SYSTEM_TITLE_LENGTH, SYSTEM_TITLE_OFFSET,
};
use crate::error::SmartMeterError;
use crc::{Crc, CRC_16_IBM_SDLC};

/// HDLC frame check sequence (ISO 13239, reflected X.25 polynomial)
const HDLC_FCS: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_SDLC);

/// Compute the FCS-16 over `data`.
pub fn compute_fcs(data: &[u8]) -> u16 {
    HDLC_FCS.checksum(data)
}

/// Returns true when `data` starts and ends with `flag`.
pub fn is_aligned(data: &[u8], flag: u8) -> bool {
    data.len() >= 2 && data.first() == Some(&flag) && data.last() == Some(&flag)
}

/// A flag-delimited push frame as read from the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    data: Vec<u8>,
}

impl Frame {
    /// Wrap `data` if its first and last byte equal `flag`, otherwise hand it back.
    pub fn from_aligned(data: Vec<u8>, flag: u8) -> Result<Self, Vec<u8>> {
        if is_aligned(&data, flag) {
            Ok(Frame { data })
        } else {
            Err(data)
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// 8-byte system title identifying the meter.
    pub fn system_title(&self) -> Option<&[u8]> {
        self.data
            .get(SYSTEM_TITLE_OFFSET..SYSTEM_TITLE_OFFSET + SYSTEM_TITLE_LENGTH)
    }

    pub fn invocation_counter_bytes(&self) -> Option<&[u8]> {
        self.data
            .get(INVOCATION_COUNTER_OFFSET..INVOCATION_COUNTER_OFFSET + INVOCATION_COUNTER_LENGTH)
    }

    /// Invocation counter as transmitted (big-endian).
    pub fn invocation_counter(&self) -> Option<u32> {
        let bytes: [u8; INVOCATION_COUNTER_LENGTH] =
            self.invocation_counter_bytes()?.try_into().ok()?;
        Some(u32::from_be_bytes(bytes))
    }

    /// GCM nonce: system title ++ invocation counter.
    pub fn nonce(&self) -> Option<[u8; NONCE_LENGTH]> {
        let mut nonce = [0u8; NONCE_LENGTH];
        nonce[..SYSTEM_TITLE_LENGTH].copy_from_slice(self.system_title()?);
        nonce[SYSTEM_TITLE_LENGTH..].copy_from_slice(self.invocation_counter_bytes()?);
        Some(nonce)
    }

    /// Encrypted APDU between the invocation counter and the trailer.
    pub fn ciphertext(&self) -> Option<&[u8]> {
        let end = self.data.len().checked_sub(FRAME_TRAILER_LENGTH)?;
        self.data.get(CIPHERTEXT_OFFSET..end)
    }

    /// Verify the trailing FCS, transmitted least significant byte first,
    /// over everything between the opening flag and the FCS itself.
    pub fn verify_fcs(&self) -> Result<(), SmartMeterError> {
        let fcs_end = self.data.len().saturating_sub(1);
        let fcs_start = fcs_end.saturating_sub(HDLC_FCS_LENGTH);
        if fcs_start < 1 {
            return Err(SmartMeterError::FrameTooShort {
                frame_len: self.data.len(),
            });
        }

        let expected = u16::from_le_bytes([self.data[fcs_start], self.data[fcs_start + 1]]);
        let calculated = compute_fcs(&self.data[1..fcs_start]);
        if expected != calculated {
            return Err(SmartMeterError::FrameCheck {
                expected,
                calculated,
            });
        }
        Ok(())
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}
