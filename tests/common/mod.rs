//! Shared helpers for building push telegrams the way a meter does.
#![allow(dead_code)]

use aes_gcm::aead::AeadInPlace;
use aes_gcm::{Aes128Gcm, KeyInit, Nonce};
use smartmeter_rs::constants::{FRAME_LENGTH, HDLC_FLAG, PAYLOAD_LENGTH, PAYLOAD_TAG};
use smartmeter_rs::hdlc::compute_fcs;

/// HDLC header up to the system title: flag, frame format, addresses,
/// control, HCS, LLC, general-glo-ciphering tag, system title length.
pub const FRAME_HEADER: [u8; 14] = [
    0x7E, 0xA0, 0x67, 0xCF, 0x02, 0x23, 0x13, 0xFB, 0xF1, 0xE6, 0xE7, 0x00, 0xDB, 0x08,
];

/// Length of the ciphered APDU (security control + invocation counter + payload)
/// and security control "encryption only".
pub const CIPHERING_LENGTH_AND_SC: [u8; 2] = [0x4F, 0x20];

pub const SYSTEM_TITLE: [u8; 8] = [0x53, 0x4D, 0x53, 0x67, 0x70, 0x09, 0x86, 0x53];

pub const TEST_KEY: [u8; 16] = [
    0x36, 0xC6, 0x66, 0x39, 0xE4, 0x8A, 0x8C, 0xA4, 0xD6, 0xBC, 0x8B, 0x28, 0x2A, 0x79, 0x3B, 0xBB,
];

pub fn key_hex(key: &[u8; 16]) -> String {
    hex::encode_upper(key)
}

/// Field values encoded into a synthetic data notification.
#[derive(Debug, Clone, Copy)]
pub struct Fields {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    /// Wh / varh: +A, -A, +R, -R
    pub energy: [u32; 4],
    /// W / var: +P, -P, +Q, -Q
    pub power: [u32; 4],
}

impl Default for Fields {
    fn default() -> Self {
        Fields {
            year: 2024,
            month: 3,
            day: 1,
            hour: 12,
            minute: 0,
            second: 0,
            energy: [0; 4],
            power: [0; 4],
        }
    }
}

/// Data notification with the structure pushed by the meter.
pub fn build_payload(fields: &Fields) -> Vec<u8> {
    let mut payload = vec![0u8; PAYLOAD_LENGTH];
    payload[0] = PAYLOAD_TAG;
    // long-invoke-id-and-priority, then the date-time octet string header
    payload[1..5].copy_from_slice(&[0x00, 0x00, 0x00, 0x01]);
    payload[20..22].copy_from_slice(&[0x09, 0x0C]);
    payload[22..24].copy_from_slice(&fields.year.to_be_bytes());
    payload[24] = fields.month;
    payload[25] = fields.day;
    payload[26] = 0x05; // day of week, not decoded
    payload[27] = fields.hour;
    payload[28] = fields.minute;
    payload[29] = fields.second;
    for (i, value) in fields.energy.iter().enumerate() {
        let offset = 35 + 5 * i;
        payload[offset - 1] = 0x06; // double-long-unsigned
        payload[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
    }
    for (i, value) in fields.power.iter().enumerate() {
        let offset = 55 + 5 * i;
        payload[offset - 1] = 0x06;
        payload[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
    }
    payload
}

/// Encrypt with a reference AES-GCM implementation; the tag is not transmitted.
pub fn encrypt(key: &[u8; 16], nonce: &[u8; 12], plaintext: &[u8]) -> Vec<u8> {
    let cipher = Aes128Gcm::new_from_slice(key).unwrap();
    let mut buffer = plaintext.to_vec();
    cipher
        .encrypt_in_place_detached(Nonce::from_slice(nonce), b"", &mut buffer)
        .unwrap();
    buffer
}

/// A complete 105-byte frame carrying `plaintext` encrypted under `key`.
pub fn build_frame(
    key: &[u8; 16],
    system_title: [u8; 8],
    invocation_counter: u32,
    plaintext: &[u8],
) -> Vec<u8> {
    let mut nonce = [0u8; 12];
    nonce[..8].copy_from_slice(&system_title);
    nonce[8..].copy_from_slice(&invocation_counter.to_be_bytes());

    let mut frame = Vec::with_capacity(FRAME_LENGTH);
    frame.extend_from_slice(&FRAME_HEADER);
    frame.extend_from_slice(&system_title);
    frame.extend_from_slice(&CIPHERING_LENGTH_AND_SC);
    frame.extend_from_slice(&invocation_counter.to_be_bytes());
    frame.extend_from_slice(&encrypt(key, &nonce, plaintext));
    let fcs = compute_fcs(&frame[1..]);
    frame.extend_from_slice(&fcs.to_le_bytes());
    frame.push(HDLC_FLAG);
    frame
}

/// Frame with default test key and system title.
pub fn sample_frame(invocation_counter: u32, fields: &Fields) -> Vec<u8> {
    build_frame(&TEST_KEY, SYSTEM_TITLE, invocation_counter, &build_payload(fields))
}
