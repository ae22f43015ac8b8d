#![no_main]

// Harness: rights_codec
// Focus: decode never panics; codec output always re-encodes to the named bits.

use libfuzzer_sys::fuzz_target;
use regacl_core::rights::{self, KNOWN_BITS};

fuzz_target!(|input: (u32, String)| {
    let (mask, text) = input;

    let decoded = rights::decode(mask);
    if mask & KNOWN_BITS != 0 {
        assert_eq!(rights::encode(&decoded), Ok(mask & KNOWN_BITS));
    } else {
        assert!(decoded.is_empty());
    }

    // Arbitrary text either encodes or is rejected; it must not panic.
    let _ = rights::encode(&text);
});
