#![no_main]

use libfuzzer_sys::fuzz_target;
use smartmeter_rs::constants::HDLC_FLAG;
use smartmeter_rs::crypto::decrypt;
use smartmeter_rs::payload::decode_payload;
use smartmeter_rs::{DecryptionKey, Frame};

fuzz_target!(|data: &[u8]| {
    // First 16 bytes are the key, the rest is the frame
    if data.len() < 16 {
        return;
    }
    let Ok(key) = DecryptionKey::from_bytes(&data[..16]) else {
        return;
    };

    let mut buffer = data[16..].to_vec();
    // Force alignment so short and truncated frames reach the decryptor
    if buffer.len() >= 2 {
        buffer[0] = HDLC_FLAG;
        let last = buffer.len() - 1;
        buffer[last] = HDLC_FLAG;
    }

    if let Ok(frame) = Frame::from_aligned(buffer, HDLC_FLAG) {
        let _ = frame.verify_fcs();
        let _ = frame.invocation_counter();
        if let Ok(plaintext) = decrypt(&frame, &key) {
            let _ = decode_payload(&plaintext);
        }
    }
});
