//! Chunking determinism and robustness properties.
//!
//! The scanner must not care how the underlying byte source chunks its
//! reads: a stream delivered one byte at a time has to produce exactly the
//! same verdict, error, and event sequence as the same bytes delivered in
//! one buffer. And no input, however mangled, may panic the scanner:
//! every outcome is a `Verdict` or a typed error.

use std::io::{self, Cursor, Read};

use proptest::prelude::*;
use serialscan_scanner::{check, CollectingSink, Event, Verdict};

/// Byte source that yields a single byte per `read` call, the most
/// hostile legal chunking.
struct DribbleReader {
    data: Vec<u8>,
    pos: usize,
}

impl DribbleReader {
    fn new(data: Vec<u8>) -> Self {
        Self { data, pos: 0 }
    }
}

impl Read for DribbleReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos >= self.data.len() || buf.is_empty() {
            return Ok(0);
        }
        buf[0] = self.data[self.pos];
        self.pos += 1;
        Ok(1)
    }
}

/// Run a scan and flatten the outcome into comparable values.
fn outcome(source: impl Read) -> (Result<Verdict, String>, Vec<Event>) {
    let mut sink = CollectingSink::new();
    let result = check(source, &mut sink).map_err(|e| e.to_string());
    (result, sink.events)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn chunking_does_not_change_the_outcome(
        data in proptest::collection::vec(any::<u8>(), 0..512)
    ) {
        let mut stream = vec![0xAC, 0xED, 0x00, 0x05];
        stream.extend(&data);

        let (buffered, buffered_events) = outcome(Cursor::new(stream.clone()));
        let (dribbled, dribbled_events) = outcome(DribbleReader::new(stream));

        prop_assert_eq!(buffered, dribbled);
        prop_assert_eq!(buffered_events, dribbled_events);
    }

    #[test]
    fn arbitrary_bytes_never_panic(
        data in proptest::collection::vec(any::<u8>(), 0..512)
    ) {
        let mut sink = CollectingSink::new();
        let _ = check(Cursor::new(data), &mut sink);
    }

    #[test]
    fn arbitrary_record_bytes_never_panic(
        data in proptest::collection::vec(any::<u8>(), 0..512)
    ) {
        // Same, but with a valid header so the dispatch loop actually runs.
        let mut stream = vec![0xAC, 0xED, 0x00, 0x05];
        stream.extend(&data);
        let mut sink = CollectingSink::new();
        let _ = check(Cursor::new(stream), &mut sink);
    }
}
