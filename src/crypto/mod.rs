//! Key handling and payload decryption for DLMS push telegrams.

pub mod gcm;
pub mod key;

pub use gcm::{apply_keystream, decrypt};
pub use key::DecryptionKey;
