//! Handle table and back-reference graph.
//!
//! Every shareable object a writer serializes gets a monotonically
//! increasing handle, and every inter-object reference on the wire is an
//! integer handle: arena-and-index, never a pointer. The scanner mirrors
//! that: a dense table of optional class-name labels, and per-handle edge
//! rows of plain indexes.

/// Dense, append-only table of scanned objects in writer handle order.
///
/// The *n*-th entry corresponds to the *n*-th handle the writer assigned.
/// Slots are usually labeled when pushed; slots created by forward-fills
/// (a back-reference landing on a handle whose record has not finished
/// parsing) start unlabeled and may be labeled later.
#[derive(Debug, Default)]
pub struct HandleTable {
    labels: Vec<Option<String>>,
}

impl HandleTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Append a labeled slot for the next handle.
    pub fn push(&mut self, label: impl Into<String>) {
        self.labels.push(Some(label.into()));
    }

    /// Label for a handle, if the slot exists and has been labeled.
    #[must_use]
    pub fn label(&self, handle: usize) -> Option<&str> {
        self.labels.get(handle).and_then(Option::as_deref)
    }

    /// Grow the table with unlabeled placeholder slots up to and including
    /// `handle`.
    pub fn fill_to(&mut self, handle: usize) {
        while self.labels.len() <= handle {
            self.labels.push(None);
        }
    }

    /// Label a slot, but only if it is still unlabeled.
    pub fn label_if_empty(&mut self, handle: usize, label: Option<String>) {
        if let Some(slot) = self.labels.get_mut(handle)
            && slot.is_none()
        {
            *slot = label;
        }
    }
}

/// Outgoing back-reference edges, one row per holding handle.
///
/// `outgoing(h)` lists the handles `h` was observed holding references to.
/// Rows grow on demand and duplicate targets are suppressed; insertion
/// order within a row is preserved.
#[derive(Debug, Default)]
pub struct RefGraph {
    edges: Vec<Vec<usize>>,
}

impl RefGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows (indexable handles), not edges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Record that `holder` references `target`.
    pub fn add_edge(&mut self, holder: usize, target: usize) {
        while self.edges.len() <= holder {
            self.edges.push(Vec::new());
        }
        let row = &mut self.edges[holder];
        if !row.contains(&target) {
            row.push(target);
        }
    }

    /// Handles `handle` directly references. Empty when no row exists.
    #[must_use]
    pub fn outgoing(&self, handle: usize) -> &[usize] {
        self.edges.get(handle).map_or(&[], Vec::as_slice)
    }
}
