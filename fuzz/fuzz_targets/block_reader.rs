#![no_main]

use libfuzzer_sys::fuzz_target;
use serialscan_wire::BlockDataReader;

// Fuzz target: dual-mode framed reader.
//
// Drives a fixed read script against arbitrary bytes in block mode.
// Catches bugs in:
// - Block header scanning (lengths, TC_RESET swallowing, invalid tags)
// - Buffer refills and primitive reads straddling block boundaries
// - UTF reads with deterministic cursor positioning on malformed input
// - skip / skip_to_block_end bookkeeping
fuzz_target!(|data: &[u8]| {
    let mut reader = BlockDataReader::new(data);
    reader.set_block_mode();
    let _ = reader.read_i32();
    let _ = reader.read_utf();
    let _ = reader.read_f64();
    let _ = reader.skip(16);
    let _ = reader.skip_to_block_end();
    let _ = reader.set_raw_mode();
    let _ = reader.read_u16();
});
