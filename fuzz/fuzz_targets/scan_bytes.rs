#![no_main]

use libfuzzer_sys::fuzz_target;
use serialscan_scanner::NullSink;

// Fuzz target: full scanner entry point.
//
// Calls `check()` on arbitrary input bytes. Catches bugs in:
// - Header validation (magic, version)
// - Tag dispatch and resync on unknown tags
// - Class descriptor parsing (proxy + non-proxy, flag validation)
// - Back-reference handle validation and table forward-fills
// - Block-data framing (short/long headers, resets, straddled reads)
// - Array tally and reference-graph traversal bounds
fuzz_target!(|data: &[u8]| {
    let mut sink = NullSink;
    let _ = serialscan_scanner::check(data, &mut sink);
});
