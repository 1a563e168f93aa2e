use std::io::Read;

use serialscan_wire::block::BlockDataReader;
use serialscan_wire::constants::{
    BASE_WIRE_HANDLE, SC_ENUM, SC_EXTERNALIZABLE, SC_SERIALIZABLE, STREAM_MAGIC, STREAM_VERSION,
    TC_ARRAY, TC_BLOCKDATA, TC_BLOCKDATALONG, TC_CLASSDESC, TC_ENDBLOCKDATA, TC_LONGSTRING,
    TC_NULL, TC_OBJECT, TC_PROXYCLASSDESC, TC_REFERENCE, TC_STRING,
};
use serialscan_wire::WireError;

use crate::analyzer::ArraySizeTally;
use crate::error::ScanError;
use crate::events::EventSink;
use crate::graph::{HandleTable, RefGraph};

/// Label recorded for string handles.
const STRING_CLASS: &str = "java.lang.String";

/// Recursive-descent walker over the tagged object-stream grammar.
///
/// The walker consumes a [`BlockDataReader`] and maintains the scan state
/// the analyzer needs afterwards:
///
/// ```text
///   bytes ──▶ dispatch loop ──▶ handle table   (dense, writer order)
///                          ──▶ reference graph (outgoing edges)
///                          ──▶ array tally     (checked inline)
/// ```
///
/// Handles are assigned in the exact order the writer assigned them: the
/// counter advances whenever a handle-bearing tag (string, object, class
/// descriptor) is encountered, and labels are appended as each record
/// finishes parsing. Back-references are validated against the table built
/// so far; a reference to a handle the writer has not assigned yet means
/// the stream is corrupt.
///
/// The walker validates structure but reconstructs nothing: field values,
/// block-data payloads and long-string bodies are consumed and discarded.
pub struct GrammarWalker<R> {
    rdr: BlockDataReader<R>,
    handles: HandleTable,
    graph: RefGraph,
    /// Serialization-nesting parents: pushed when block-data framing opens
    /// under a known handle, popped on `TC_ENDBLOCKDATA`.
    parents: Vec<usize>,
    /// Handle most recently assigned; `None` until the first handle-bearing
    /// tag.
    now: Option<usize>,
    tally: ArraySizeTally,
}

impl<R: Read> GrammarWalker<R> {
    pub fn new(source: R) -> Self {
        Self {
            rdr: BlockDataReader::new(source),
            handles: HandleTable::new(),
            graph: RefGraph::new(),
            parents: Vec::new(),
            now: None,
            tally: ArraySizeTally::new(),
        }
    }

    #[must_use]
    pub fn handles(&self) -> &HandleTable {
        &self.handles
    }

    #[must_use]
    pub fn graph(&self) -> &RefGraph {
        &self.graph
    }

    /// Sum of all declared array lengths and proxy interface counts seen.
    #[must_use]
    pub fn total_array_size(&self) -> i64 {
        self.tally.total()
    }

    /// Walk the stream from header to end of input.
    ///
    /// # Errors
    ///
    /// Structural violations ([`ScanError::BadStreamHeader`],
    /// [`ScanError::InvalidHandle`], tag and descriptor-flag errors, wire
    /// failures) propagate immediately. [`ScanError::ArrayTooLarge`]
    /// surfaces as soon as the tally crosses its ceiling.
    pub fn walk(&mut self, sink: &mut dyn EventSink) -> Result<(), ScanError> {
        self.read_stream_header(sink)?;
        self.dispatch_loop(sink)
    }

    fn read_stream_header(&mut self, sink: &mut dyn EventSink) -> Result<(), ScanError> {
        let magic = self.rdr.read_u16()?;
        let version = self.rdr.read_u16()?;
        if magic != STREAM_MAGIC || version != STREAM_VERSION {
            return Err(ScanError::BadStreamHeader { magic, version });
        }
        sink.info("stream magic and version verified");
        Ok(())
    }

    /// Top-level record dispatch. Runs until the source is exhausted.
    fn dispatch_loop(&mut self, sink: &mut dyn EventSink) -> Result<(), ScanError> {
        while let Some(tag) = self.rdr.peek()? {
            match tag {
                TC_NULL => self.read_null()?,
                TC_ARRAY => self.scan_array(sink)?,
                TC_CLASSDESC | TC_PROXYCLASSDESC => self.read_class_desc(sink)?,
                TC_STRING | TC_LONGSTRING => {
                    self.bump_handle();
                    self.read_string()?;
                }
                TC_OBJECT => {
                    self.bump_handle();
                    self.scan_object(sink)?;
                }
                TC_REFERENCE => self.scan_reference()?,
                TC_BLOCKDATA | TC_BLOCKDATALONG => self.skip_framed_block()?,
                TC_ENDBLOCKDATA => {
                    self.rdr.read_u8()?;
                    // Unbalanced end markers are tolerated.
                    self.parents.pop();
                }
                _ => {
                    // Unknown tag: consume one byte and resync.
                    self.rdr.read_u8()?;
                }
            }
        }
        Ok(())
    }

    /// Advance the handle counter for a handle-bearing tag.
    fn bump_handle(&mut self) {
        self.now = Some(self.now.map_or(0, |n| n + 1));
    }

    fn expect_tag(&mut self, expected: u8) -> Result<(), ScanError> {
        let tag = self.rdr.read_u8()?;
        if tag == expected {
            Ok(())
        } else {
            Err(ScanError::InvalidTypeCode { code: tag })
        }
    }

    fn read_null(&mut self) -> Result<(), ScanError> {
        self.expect_tag(TC_NULL)
    }

    /// `TC_ARRAY`: class descriptor, then the declared element count.
    fn scan_array(&mut self, sink: &mut dyn EventSink) -> Result<(), ScanError> {
        self.expect_tag(TC_ARRAY)?;
        self.read_class_desc(sink)?;
        let length = self.rdr.read_i32()?;
        if length > 0 {
            self.tally.add(length, sink)?;
        }
        Ok(())
    }

    /// `TC_OBJECT`: class descriptor, then a nesting edge to the parent
    /// frame if one is open. The table is forward-filled so both edge
    /// endpoints resolve to a slot at end of scan.
    fn scan_object(&mut self, sink: &mut dyn EventSink) -> Result<(), ScanError> {
        self.expect_tag(TC_OBJECT)?;
        self.read_class_desc(sink)?;
        if let (Some(current), Some(&parent)) = (self.now, self.parents.last()) {
            self.handles.fill_to(current);
            self.graph.add_edge(parent, current);
        }
        Ok(())
    }

    /// `TC_REFERENCE`: validate the handle, lazily label the current slot,
    /// and record the edge.
    fn scan_reference(&mut self) -> Result<(), ScanError> {
        self.expect_tag(TC_REFERENCE)?;
        let wire = self.rdr.read_i32()?;
        let index = i64::from(wire) - i64::from(BASE_WIRE_HANDLE);
        let handle = match usize::try_from(index) {
            Ok(handle) if handle < self.handles.len() => handle,
            _ => return Err(ScanError::InvalidHandle { handle: wire }),
        };
        if let Some(current) = self.now {
            let label = self.handles.label(handle).map(str::to_owned);
            self.handles.fill_to(current);
            self.handles.label_if_empty(current, label);
            self.graph.add_edge(current, handle);
        }
        Ok(())
    }

    /// Class descriptor in any of its wire shapes: null, back-reference,
    /// proxy, or ordinary.
    fn read_class_desc(&mut self, sink: &mut dyn EventSink) -> Result<(), ScanError> {
        let tag = self.rdr.peek_byte()?;
        match tag {
            TC_NULL => self.read_null(),
            TC_REFERENCE => self.scan_reference(),
            TC_PROXYCLASSDESC => {
                self.bump_handle();
                self.read_proxy_desc(sink)
            }
            TC_CLASSDESC => {
                self.bump_handle();
                self.read_nonproxy_desc(sink)
            }
            code => Err(ScanError::InvalidTypeCode { code }),
        }
    }

    /// Proxy descriptor: interface count (fed to the tally *before* the
    /// names are read), interface names, then the shared tail.
    fn read_proxy_desc(&mut self, sink: &mut dyn EventSink) -> Result<(), ScanError> {
        self.expect_tag(TC_PROXYCLASSDESC)?;
        let num_ifaces = self.rdr.read_i32()?;
        self.tally.add(num_ifaces, sink)?;
        for _ in 0..num_ifaces.max(0) {
            self.rdr.read_utf()?;
        }
        self.read_descriptor_tail(sink)
    }

    fn read_nonproxy_desc(&mut self, sink: &mut dyn EventSink) -> Result<(), ScanError> {
        self.expect_tag(TC_CLASSDESC)?;
        self.read_descriptor_tail(sink)
    }

    /// Shared descriptor tail: name, serialVersionUID, flags, field list,
    /// custom data, super descriptor. The name is appended to the handle
    /// table once the whole tail has parsed.
    fn read_descriptor_tail(&mut self, sink: &mut dyn EventSink) -> Result<(), ScanError> {
        let name = self.rdr.read_utf()?;
        let suid = self.rdr.read_i64()?;
        let flags = self.rdr.read_u8()?;

        let externalizable = flags & SC_EXTERNALIZABLE != 0;
        let serializable = flags & SC_SERIALIZABLE != 0;
        if externalizable && serializable {
            return Err(ScanError::ClassFlagConflict { name });
        }
        let is_enum = flags & SC_ENUM != 0;
        if is_enum && suid != 0 {
            return Err(ScanError::EnumWithSuid { name, suid });
        }

        let num_fields = self.rdr.read_i16()?;
        if is_enum && num_fields != 0 {
            return Err(ScanError::EnumWithFields { name, num_fields });
        }
        for _ in 0..num_fields.max(0) {
            let typecode = self.rdr.read_u8()?;
            let _field_name = self.rdr.read_utf()?;
            if typecode == b'L' || typecode == b'[' {
                self.read_type_string()?;
            }
        }

        self.skip_custom_data()?;
        self.read_class_desc(sink)?; // super-class descriptor

        self.handles.push(name.clone());
        sink.descriptor(&name, suid, num_fields);
        Ok(())
    }

    /// Type string of an object or array field: an inline string record, a
    /// back-reference to one, or null. Inline strings here label a table
    /// slot without advancing the handle counter.
    fn read_type_string(&mut self) -> Result<(), ScanError> {
        let tag = self.rdr.peek_byte()?;
        match tag {
            TC_NULL => self.read_null(),
            TC_REFERENCE => self.scan_reference(),
            TC_STRING | TC_LONGSTRING => self.read_string(),
            code => Err(ScanError::InvalidTypeCode { code }),
        }
    }

    /// Consume a string record and label its table slot. Long-string
    /// bodies are consumed but never materialized, so a hostile declared
    /// length cannot make the scanner itself allocate.
    fn read_string(&mut self) -> Result<(), ScanError> {
        let tag = self.rdr.read_u8()?;
        match tag {
            TC_STRING => {
                self.rdr.read_utf()?;
            }
            TC_LONGSTRING => {
                let declared = self.rdr.read_i64()?;
                let len = u64::try_from(declared).unwrap_or(0);
                let skipped = self.rdr.skip(len)?;
                if skipped < len {
                    return Err(self.eof().into());
                }
            }
            code => return Err(ScanError::InvalidTypeCode { code }),
        }
        self.handles.push(STRING_CLASS);
        Ok(())
    }

    /// Top-level framed payload: opaque to the walker. Consume the declared
    /// bytes and remember the current handle as the nesting parent for what
    /// follows.
    fn skip_framed_block(&mut self) -> Result<(), ScanError> {
        self.rdr.set_raw_mode()?;
        if let Some(len) = self.rdr.read_block_header()? {
            let len = len as u64;
            let skipped = self.rdr.skip(len)?;
            if skipped < len {
                return Err(self.eof().into());
            }
        }
        if let Some(current) = self.now {
            self.parents.push(current);
        }
        Ok(())
    }

    /// Optional block-data sections after a descriptor's field list,
    /// terminated by `TC_ENDBLOCKDATA`. Any other tag returns without
    /// consuming.
    fn skip_custom_data(&mut self) -> Result<(), ScanError> {
        loop {
            if self.rdr.in_block_mode() {
                self.rdr.skip_to_block_end()?;
                self.rdr.set_raw_mode()?;
            }
            match self.rdr.peek_byte()? {
                TC_BLOCKDATA | TC_BLOCKDATALONG => self.rdr.set_block_mode(),
                TC_ENDBLOCKDATA => {
                    self.rdr.read_u8()?;
                    return Ok(());
                }
                _ => return Ok(()),
            }
        }
    }

    fn eof(&self) -> WireError {
        WireError::UnexpectedEof {
            offset: self.rdr.offset(),
        }
    }
}
