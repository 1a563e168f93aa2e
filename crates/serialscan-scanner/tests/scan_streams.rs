//! End-to-end scans over hand-built byte streams.
//!
//! Every stream here is constructed byte by byte (no serializer is
//! involved) and the assertions cover four categories:
//!
//! - **Clean streams**: the minimal header-only stream, plain string and
//!   descriptor records, and mixed record sequences must come back `Safe`
//!   with the expected handle and event bookkeeping.
//!
//! - **Allocation ceiling**: declared array lengths and proxy interface
//!   counts summing to exactly the ceiling are safe; one element more
//!   flips the verdict to `Unsafe { ArrayTooLarge }`.
//!
//! - **Reference ceiling**: a back-reference cycle drives the bounded
//!   traversal past its edge budget and flips the verdict to
//!   `Unsafe { ReferenceTooComplex }`.
//!
//! - **Corruption**: bad magic, out-of-range handles and malformed UTF-8
//!   surface as errors, not verdicts.

use std::io::Cursor;

use serialscan_scanner::{
    check, CollectingSink, Event, GrammarWalker, ScanError, UnsafeReason, Verdict,
};

// ── Stream construction ───────────────────────────────────────────────────────

/// Builds serialized-stream bytes incrementally.
struct StreamBuilder {
    bytes: Vec<u8>,
}

impl StreamBuilder {
    /// Start with the stream magic and version.
    fn new() -> Self {
        Self {
            bytes: vec![0xAC, 0xED, 0x00, 0x05],
        }
    }

    fn tag(mut self, tag: u8) -> Self {
        self.bytes.push(tag);
        self
    }

    fn i32(mut self, value: i32) -> Self {
        self.bytes.extend(value.to_be_bytes());
        self
    }

    fn utf(mut self, s: &str) -> Self {
        self.bytes
            .extend(u16::try_from(s.len()).unwrap().to_be_bytes());
        self.bytes.extend(s.as_bytes());
        self
    }

    /// `TC_STRING` record.
    fn string(self, s: &str) -> Self {
        self.tag(0x74).utf(s)
    }

    /// Minimal serializable class descriptor: no fields, empty custom
    /// data, null super descriptor.
    fn class_desc(mut self, name: &str) -> Self {
        self = self.tag(0x72).utf(name);
        self.bytes.extend(0i64.to_be_bytes()); // serialVersionUID
        self.bytes.push(0x02); // SC_SERIALIZABLE
        self.bytes.extend(0i16.to_be_bytes()); // field count
        self.tag(0x78).tag(0x70) // end custom data, null super
    }

    /// `TC_ARRAY` record with the given declared length.
    fn array(self, element_class: &str, length: i32) -> Self {
        self.tag(0x75).class_desc(element_class).i32(length)
    }

    /// `TC_REFERENCE` to a zero-based handle.
    fn reference(self, handle: i32) -> Self {
        self.tag(0x71).i32(0x007E_0000 + handle)
    }

    fn build(self) -> Vec<u8> {
        self.bytes
    }
}

fn scan(bytes: Vec<u8>) -> (Result<Verdict, ScanError>, CollectingSink) {
    let mut sink = CollectingSink::new();
    let result = check(Cursor::new(bytes), &mut sink);
    (result, sink)
}

// ── Clean streams ─────────────────────────────────────────────────────────────

#[test]
fn header_only_stream_is_safe_with_no_descriptors() {
    let (result, sink) = scan(StreamBuilder::new().build());
    assert_eq!(result.unwrap(), Verdict::Safe);
    assert_eq!(sink.verdict(), Some(Verdict::Safe));
    assert!(sink.descriptors().is_empty());
}

#[test]
fn single_string_yields_one_labeled_handle() {
    let bytes = StreamBuilder::new().string("abc").build();
    let mut walker = GrammarWalker::new(Cursor::new(bytes.clone()));
    let mut sink = CollectingSink::new();
    walker.walk(&mut sink).unwrap();
    assert_eq!(walker.handles().len(), 1);
    assert_eq!(walker.handles().label(0), Some("java.lang.String"));

    let (result, _) = scan(bytes);
    assert_eq!(result.unwrap(), Verdict::Safe);
}

#[test]
fn mixed_records_scan_safe() {
    let bytes = StreamBuilder::new()
        .string("first")
        .tag(0x70) // null
        .array("[I", 16)
        .string("last")
        .build();
    let (result, sink) = scan(bytes);
    assert_eq!(result.unwrap(), Verdict::Safe);
    assert_eq!(sink.descriptors().len(), 1);
}

#[test]
fn verdict_event_is_always_last() {
    let bytes = StreamBuilder::new().string("x").build();
    let (_, sink) = scan(bytes);
    assert!(matches!(sink.events.last(), Some(Event::Verdict(Verdict::Safe))));
}

#[test]
fn truncated_record_warns_but_still_judges() {
    let mut bytes = StreamBuilder::new().build();
    bytes.extend([0x74, 0x00, 0x20, b'a']); // string declares 32 bytes, delivers 1
    let (result, sink) = scan(bytes);
    assert_eq!(result.unwrap(), Verdict::Safe);
    assert!(sink
        .events
        .iter()
        .any(|e| matches!(e, Event::Warn(m) if m.contains("ended unexpectedly"))));
}

// ── Allocation ceiling ────────────────────────────────────────────────────────

#[test]
fn array_sum_at_ceiling_is_safe() {
    let bytes = StreamBuilder::new()
        .array("[I", 65000)
        .array("[B", 536)
        .build();
    let (result, _) = scan(bytes);
    assert_eq!(result.unwrap(), Verdict::Safe);
}

#[test]
fn array_sum_past_ceiling_is_unsafe() {
    let bytes = StreamBuilder::new()
        .array("[I", 65000)
        .array("[B", 537)
        .build();
    let (result, sink) = scan(bytes);
    assert_eq!(
        result.unwrap(),
        Verdict::Unsafe {
            reason: UnsafeReason::ArrayTooLarge
        }
    );
    assert!(sink.events.iter().any(|e| matches!(e, Event::Warn(_))));
}

#[test]
fn single_oversized_array_is_unsafe() {
    let bytes = StreamBuilder::new().array("[I", 0x0001_0001).build();
    let (result, _) = scan(bytes);
    assert_eq!(
        result.unwrap(),
        Verdict::Unsafe {
            reason: UnsafeReason::ArrayTooLarge
        }
    );
}

#[test]
fn proxy_descriptor_with_excessive_interfaces_is_unsafe() {
    let mut bytes = StreamBuilder::new().build();
    bytes.push(0x7D); // TC_PROXYCLASSDESC
    bytes.extend(70000i32.to_be_bytes());
    // no interface names follow; the verdict lands before they are read
    let (result, sink) = scan(bytes);
    assert_eq!(
        result.unwrap(),
        Verdict::Unsafe {
            reason: UnsafeReason::ArrayTooLarge
        }
    );
    assert!(sink.descriptors().is_empty());
}

// ── Reference ceiling ─────────────────────────────────────────────────────────

#[test]
fn self_referential_cycle_is_unsafe() {
    // Handles 0 and 1 are strings; handle 1 then back-references itself.
    // The bounded traversal spins on that cycle until the edge budget
    // trips.
    let bytes = StreamBuilder::new()
        .string("a")
        .string("b")
        .reference(1)
        .build();
    let (result, sink) = scan(bytes);
    assert_eq!(
        result.unwrap(),
        Verdict::Unsafe {
            reason: UnsafeReason::ReferenceTooComplex
        }
    );
    assert!(sink.events.iter().any(|e| matches!(e, Event::Warn(_))));
}

#[test]
fn plain_back_references_are_safe_and_reported() {
    // Handle 2 holds a reference to handle 1. Handle 0 is the traversal
    // sentinel, so a chain ending there contributes no further edges.
    let bytes = StreamBuilder::new()
        .string("a")
        .string("b")
        .string("c")
        .reference(1)
        .build();
    let (result, sink) = scan(bytes);
    assert_eq!(result.unwrap(), Verdict::Safe);
    assert!(sink
        .events
        .iter()
        .any(|e| matches!(e, Event::Graph { handle: 2, count: 1 })));
}

// ── Corruption ────────────────────────────────────────────────────────────────

#[test]
fn bad_magic_surfaces_as_error_without_verdict() {
    let mut sink = CollectingSink::new();
    let result = check(Cursor::new(vec![0x00, 0x00, 0x00, 0x05]), &mut sink);
    assert!(matches!(result, Err(ScanError::BadStreamHeader { .. })));
    assert_eq!(sink.verdict(), None);
}

#[test]
fn reference_to_unassigned_handle_is_an_error() {
    let bytes = StreamBuilder::new().reference(0).build();
    let (result, sink) = scan(bytes);
    assert!(matches!(result, Err(ScanError::InvalidHandle { .. })));
    assert_eq!(sink.verdict(), None);
}

#[test]
fn malformed_descriptor_name_is_an_error() {
    let mut bytes = StreamBuilder::new().build();
    bytes.push(0x72); // TC_CLASSDESC
    bytes.extend([0x00, 0x02, 0x80, 0x80]); // two bare continuation bytes
    let (result, _) = scan(bytes);
    assert!(matches!(
        result,
        Err(ScanError::Wire(
            serialscan_wire::WireError::MalformedUtf { offset: 0 }
        ))
    ));
}

#[test]
fn unknown_tags_between_records_resync() {
    let mut bytes = StreamBuilder::new().string("a").build();
    bytes.extend([0x00, 0x00, 0x41]); // junk between records
    let mut tail = StreamBuilder::new().string("b").build();
    bytes.append(&mut tail.split_off(4)); // drop the duplicate header
    let (result, _) = scan(bytes);
    assert_eq!(result.unwrap(), Verdict::Safe);
}
