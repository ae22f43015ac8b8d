#![no_main]

// Harness: ace_dump
// Focus: host JSON dumps of any shape parse or fail cleanly.

use libfuzzer_sys::fuzz_target;
use regacl_core::RawAce;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = RawAce::parse_list(text);
    }
});
