#![no_main]

use libfuzzer_sys::fuzz_target;
use smartmeter_rs::payload::decode_payload;

fuzz_target!(|data: &[u8]| {
    if let Ok(reading) = decode_payload(data) {
        // Display and JSON must cope with impossible dates
        let _ = reading.to_string();
        let _ = reading.timestamp.to_datetime();
        let _ = serde_json::to_string(&reading);
    }
});
