#![no_main]

use libfuzzer_sys::fuzz_target;

// Fuzz target: modified-UTF-8 decoder.
//
// Calls `decode_modified_utf8` on arbitrary bytes. Catches bugs in:
// - Byte-pattern classification (1/2/3-byte forms)
// - Continuation-byte validation
// - Truncated-sequence handling at the end of input
// - Surrogate-half replacement
fuzz_target!(|data: &[u8]| {
    let _ = serialscan_wire::utf::decode_modified_utf8(data);
});
