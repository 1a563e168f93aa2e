//! Diagnostic event surface of the scanner.
//!
//! The walker and the analyzer never print; everything they have to say
//! goes through an [`EventSink`]. Tests pass a [`CollectingSink`] and
//! assert on the recorded [`Event`] values; a terminal frontend renders
//! them as they arrive. Events are emitted in stream order, interleaved
//! with the single walk, so the sequence is deterministic for a given
//! input.

/// Why a stream was judged unsafe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnsafeReason {
    /// The running sum of declared array lengths and proxy interface
    /// counts exceeded the allocation ceiling.
    ArrayTooLarge,
    /// A reference-graph traversal exceeded the edge budget.
    ReferenceTooComplex,
}

impl std::fmt::Display for UnsafeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ArrayTooLarge => f.write_str("array size too large"),
            Self::ReferenceTooComplex => f.write_str("object reference too complex"),
        }
    }
}

/// Final judgement for a scanned stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Nothing in the stream tripped either DoS check.
    Safe,
    /// Deserializing this stream would likely trigger a denial of service.
    Unsafe { reason: UnsafeReason },
}

impl Verdict {
    #[must_use]
    pub fn is_safe(self) -> bool {
        matches!(self, Self::Safe)
    }
}

/// A single diagnostic emitted during a scan.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Progress note.
    Info(String),
    /// Recoverable anomaly (truncated stream, suspicious totals).
    Warn(String),
    /// A class descriptor was parsed.
    Descriptor {
        name: String,
        suid: i64,
        num_fields: i16,
    },
    /// One reference-graph traversal finished.
    Graph { handle: usize, count: u32 },
    /// The final judgement. Emitted at most once per scan.
    Verdict(Verdict),
}

/// Where scan diagnostics go.
///
/// Implementations decide routing: the CLI paints them onto a terminal,
/// tests collect them, fuzzing discards them.
pub trait EventSink {
    fn info(&mut self, message: &str);
    fn warn(&mut self, message: &str);
    fn descriptor(&mut self, name: &str, suid: i64, num_fields: i16);
    fn graph(&mut self, handle: usize, count: u32);
    fn verdict(&mut self, verdict: Verdict);
}

/// Sink that records every event in order.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub events: Vec<Event>,
}

impl CollectingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The verdict event, if one was emitted.
    #[must_use]
    pub fn verdict(&self) -> Option<Verdict> {
        self.events.iter().find_map(|e| match e {
            Event::Verdict(v) => Some(*v),
            _ => None,
        })
    }

    /// All descriptor events, in stream order.
    #[must_use]
    pub fn descriptors(&self) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| matches!(e, Event::Descriptor { .. }))
            .collect()
    }
}

impl EventSink for CollectingSink {
    fn info(&mut self, message: &str) {
        self.events.push(Event::Info(message.to_owned()));
    }

    fn warn(&mut self, message: &str) {
        self.events.push(Event::Warn(message.to_owned()));
    }

    fn descriptor(&mut self, name: &str, suid: i64, num_fields: i16) {
        self.events.push(Event::Descriptor {
            name: name.to_owned(),
            suid,
            num_fields,
        });
    }

    fn graph(&mut self, handle: usize, count: u32) {
        self.events.push(Event::Graph { handle, count });
    }

    fn verdict(&mut self, verdict: Verdict) {
        self.events.push(Event::Verdict(verdict));
    }
}

/// Sink that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn info(&mut self, _message: &str) {}
    fn warn(&mut self, _message: &str) {}
    fn descriptor(&mut self, _name: &str, _suid: i64, _num_fields: i16) {}
    fn graph(&mut self, _handle: usize, _count: u32) {}
    fn verdict(&mut self, _verdict: Verdict) {}
}
