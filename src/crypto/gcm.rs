//! # Frame Decryptor
//!
//! Push telegrams use DLMS general-glo-ciphering with security control
//! "encryption only": the APDU is AES-128-GCM encrypted but carries no
//! authentication tag. Decryption is therefore the GCM counter-mode stage on
//! its own, with the 12-byte nonce built from the system title and the
//! invocation counter and the first data block at counter value 2.
//!
//! Without a tag nothing here can tell a wrong key from a correct one; callers
//! must run [`crate::payload::validate_payload`] on the result.

use crate::constants::{AES_BLOCK_SIZE, NONCE_LENGTH};
use crate::crypto::key::DecryptionKey;
use crate::error::{DecryptionFailure, SmartMeterError};
use crate::hdlc::Frame;
use aes::Aes128;
use cipher::generic_array::GenericArray;
use cipher::{BlockEncrypt, KeyInit};

/// GCM reserves counter 1 for the tag mask; payload blocks start at 2.
const GCM_FIRST_DATA_COUNTER: u32 = 2;

/// Decrypt the APDU carried in `frame`.
///
/// The result is raw plaintext; its shape has not been checked.
pub fn decrypt(frame: &Frame, key: &DecryptionKey) -> Result<Vec<u8>, SmartMeterError> {
    let out_of_bounds = || DecryptionFailure::CiphertextOutOfBounds {
        frame_len: frame.len(),
    };
    let nonce = frame.nonce().ok_or_else(out_of_bounds)?;
    let ciphertext = frame.ciphertext().ok_or_else(out_of_bounds)?;

    Ok(apply_keystream(key, &nonce, ciphertext))
}

/// XOR `data` with the GCM keystream for `nonce`. Encrypts and decrypts alike.
pub fn apply_keystream(key: &DecryptionKey, nonce: &[u8; NONCE_LENGTH], data: &[u8]) -> Vec<u8> {
    let cipher = Aes128::new(GenericArray::from_slice(key.as_bytes()));

    let mut counter_block = [0u8; AES_BLOCK_SIZE];
    counter_block[..NONCE_LENGTH].copy_from_slice(nonce);

    let mut counter = GCM_FIRST_DATA_COUNTER;
    let mut result = Vec::with_capacity(data.len());
    for chunk in data.chunks(AES_BLOCK_SIZE) {
        counter_block[NONCE_LENGTH..].copy_from_slice(&counter.to_be_bytes());
        let mut keystream = GenericArray::clone_from_slice(&counter_block);
        cipher.encrypt_block(&mut keystream);

        result.extend(chunk.iter().zip(keystream.iter()).map(|(b, k)| b ^ k));
        // inc32: only the low 32 bits of the counter block wrap
        counter = counter.wrapping_add(1);
    }
    result
}
