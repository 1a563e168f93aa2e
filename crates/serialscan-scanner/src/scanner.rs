use std::io::Read;

use crate::analyzer;
use crate::error::ScanError;
use crate::events::{EventSink, Verdict};
use crate::walker::GrammarWalker;

/// Scan a serialized-object byte stream and judge whether deserializing it
/// would likely trigger a denial of service.
///
/// ```text
///   bytes ──▶ grammar walk ──▶ handle table + reference graph
///                 │                         │
///           array tally               graph traversal
///                 └────────┬────────────────┘
///                          ▼
///                  Verdict + events
/// ```
///
/// The walk and both checks report through `sink`; the returned verdict is
/// also emitted as the final [`Event::Verdict`](crate::events::Event).
///
/// Two conditions get special handling:
///
/// - Running out of bytes mid-record (anywhere, including inside the
///   header) is downgraded to a warning: truncation is common in captured
///   streams and the reference graph built so far is still worth judging.
/// - The two DoS findings short-circuit into `Ok(Unsafe { reason })`
///   rather than an error: they are the scanner's answer, not a failure.
///
/// The byte source is consumed by the walk and released on every path.
///
/// # Errors
///
/// Structural failures (bad magic, out-of-range handles, invalid tag
/// codes, conflicting descriptor flags, malformed strings, block-mode
/// violations, I/O errors) propagate without a verdict.
pub fn check<R: Read>(source: R, sink: &mut dyn EventSink) -> Result<Verdict, ScanError> {
    let mut walker = GrammarWalker::new(source);

    if let Err(e) = walker.walk(sink) {
        if let Some(reason) = e.unsafe_reason() {
            let verdict = Verdict::Unsafe { reason };
            sink.verdict(verdict);
            return Ok(verdict);
        }
        if !e.is_unexpected_eof() {
            return Err(e);
        }
        sink.warn("serialized stream ended unexpectedly");
    }

    if let Err(e) = analyzer::check_reference_graph(walker.graph(), sink) {
        if let Some(reason) = e.unsafe_reason() {
            let verdict = Verdict::Unsafe { reason };
            sink.verdict(verdict);
            return Ok(verdict);
        }
        return Err(e);
    }

    sink.verdict(Verdict::Safe);
    Ok(Verdict::Safe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{CollectingSink, Event, UnsafeReason};
    use std::io::Cursor;

    fn scan(bytes: &[u8]) -> (Result<Verdict, ScanError>, CollectingSink) {
        let mut sink = CollectingSink::new();
        let result = check(Cursor::new(bytes.to_vec()), &mut sink);
        (result, sink)
    }

    #[test]
    fn header_only_stream_is_safe() {
        let (result, sink) = scan(&[0xAC, 0xED, 0x00, 0x05]);
        assert_eq!(result.unwrap(), Verdict::Safe);
        assert_eq!(sink.verdict(), Some(Verdict::Safe));
    }

    #[test]
    fn empty_input_warns_and_judges_safe() {
        let (result, sink) = scan(&[]);
        assert_eq!(result.unwrap(), Verdict::Safe);
        assert!(sink.events.iter().any(|e| matches!(e, Event::Warn(_))));
    }

    #[test]
    fn bad_magic_is_an_error_not_a_verdict() {
        let (result, sink) = scan(&[0x00, 0x00, 0x00, 0x05]);
        assert!(matches!(result, Err(ScanError::BadStreamHeader { .. })));
        assert_eq!(sink.verdict(), None);
    }

    #[test]
    fn unsafe_verdict_is_also_emitted_as_event() {
        // proxy descriptor declaring an absurd interface count
        let mut bytes = vec![0xAC, 0xED, 0x00, 0x05, 0x7D];
        bytes.extend(70000i32.to_be_bytes());
        let (result, sink) = scan(&bytes);
        let verdict = result.unwrap();
        assert_eq!(
            verdict,
            Verdict::Unsafe {
                reason: UnsafeReason::ArrayTooLarge
            }
        );
        assert_eq!(sink.verdict(), Some(verdict));
    }

    #[test]
    fn verdict_event_is_last() {
        let (_, sink) = scan(&[0xAC, 0xED, 0x00, 0x05]);
        assert!(matches!(sink.events.last(), Some(Event::Verdict(_))));
    }
}
