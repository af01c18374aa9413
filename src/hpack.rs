//! HPACK block codec (RFC 7541 Sections 5.2 and 6).
//!
//! [`HPack`] is the per-connection state: the dynamic table, the size
//! parameters, the encoding toggles, and the scratch list of fields the
//! last decode produced. One instance serves one direction of one
//! connection; HTTP/2 orders header blocks strictly, and `&mut self`
//! enforces the matching serialization here.

use crate::error::HpackError;
use crate::field::HeaderField;
use crate::huffman;
use crate::integer;
use crate::table::{self, DynamicTable, STATIC_TABLE};

/// Default dynamic table budget (SETTINGS_HEADER_TABLE_SIZE default).
pub const DEFAULT_MAX_TABLE_SIZE: usize = 4096;

// Representation tag patterns (RFC 7541 Section 6).
const INDEXED: u8 = 0x80; // 1xxxxxxx, 7-bit index
const INCREMENTAL: u8 = 0x40; // 01xxxxxx, 6-bit name index
const SIZE_UPDATE: u8 = 0x20; // 001xxxxx, 5-bit size
const NEVER_INDEXED: u8 = 0x10; // 0001xxxx, 4-bit name index
const WITHOUT_INDEXING: u8 = 0x00; // 0000xxxx, 4-bit name index

// -- String literals (RFC 7541 Section 5.2) --

/// Append a string literal, Huffman-coded unless that would grow it or
/// Huffman is disabled. Ties go to Huffman, which is what interop vectors
/// expect (RFC 7541 C.6.2 codes "307" at its raw length).
pub fn write_string(dst: &mut Vec<u8>, s: &[u8], disable_huffman: bool) {
    if !disable_huffman {
        let huffman_len = huffman::encoded_len(s);
        if huffman_len <= s.len() {
            integer::encode_int(dst, 7, 0x80, huffman_len as u64);
            huffman::encode(s, dst);
            return;
        }
    }
    integer::encode_int(dst, 7, 0x00, s.len() as u64);
    dst.extend_from_slice(s);
}

/// Decode a string literal from the front of `buf`, appending the content
/// to `out`. Returns the unconsumed remainder.
pub fn read_string<'a>(out: &mut Vec<u8>, buf: &'a [u8]) -> Result<&'a [u8], HpackError> {
    let huffman_coded = match buf.first() {
        Some(&first) => first & 0x80 != 0,
        None => return Err(HpackError::IntegerTruncated),
    };
    let (len, rest) = integer::decode_int(buf, 7)?;
    if len > rest.len() as u64 {
        return Err(HpackError::StringTruncated);
    }
    let (body, rest) = rest.split_at(len as usize);
    if huffman_coded {
        huffman::decode(body, out)?;
    } else {
        out.extend_from_slice(body);
    }
    Ok(rest)
}

// -- Block codec --

/// Stateful HPACK encoder/decoder for one direction of a connection.
///
/// Decoded fields are owned by the instance: [`HPack::decode`] returns a
/// borrowed slice that stays valid until [`HPack::release_fields`] or the
/// next decode. The same internal list doubles as the encoder's pending
/// fields, filled with [`HPack::add`] and drained by [`HPack::encode`].
#[derive(Debug)]
pub struct HPack {
    table: DynamicTable,
    /// The table budget this codec last advertised; a decoded size update
    /// may not exceed it.
    max_table_size_limit: usize,
    /// Armed by a peer SETTINGS change; emitted at the head of the next
    /// encoded block.
    pending_size_update: Option<usize>,
    /// Outbound strings stay raw.
    pub disable_huffman: bool,
    /// Emit every field as Literal Without Indexing and leave the dynamic
    /// table untouched.
    pub disable_indexing: bool,
    fields: Vec<HeaderField>,
    /// Released field records, kept for their buffers.
    spare: Vec<HeaderField>,
}

impl Default for HPack {
    fn default() -> Self {
        Self::new()
    }
}

impl HPack {
    pub fn new() -> Self {
        Self {
            table: DynamicTable::new(DEFAULT_MAX_TABLE_SIZE),
            max_table_size_limit: DEFAULT_MAX_TABLE_SIZE,
            pending_size_update: None,
            disable_huffman: false,
            disable_indexing: false,
            fields: Vec::new(),
            spare: Vec::new(),
        }
    }

    // -- Field list --

    /// The fields produced by the last decode, or pending for the next
    /// encode.
    pub fn fields(&self) -> &[HeaderField] {
        &self.fields
    }

    /// Queue a field for the next encode.
    pub fn add(&mut self, name: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.fields.push(HeaderField::new(name, value));
    }

    /// Queue a field the encoder must never index.
    pub fn add_sensitive(&mut self, name: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.fields.push(HeaderField::sensitive(name, value));
    }

    pub fn add_field(&mut self, field: HeaderField) {
        self.fields.push(field);
    }

    /// Release the field list, recycling the records' buffers.
    pub fn release_fields(&mut self) {
        self.spare.append(&mut self.fields);
    }

    /// Return the instance to its initial state. Called on connection
    /// end; the spare buffers are kept, everything else is cleared.
    pub fn reset(&mut self) {
        self.release_fields();
        self.table.clear();
        self.table.set_max_size(DEFAULT_MAX_TABLE_SIZE);
        self.max_table_size_limit = DEFAULT_MAX_TABLE_SIZE;
        self.pending_size_update = None;
        self.disable_huffman = false;
        self.disable_indexing = false;
    }

    fn take_spare(&mut self) -> HeaderField {
        let mut field = self.spare.pop().unwrap_or_default();
        field.name.clear();
        field.value.clear();
        field.sensitive = false;
        field
    }

    // -- Size parameters --

    /// Directly set the active dynamic table budget, evicting to fit.
    ///
    /// This is the path a decoded size-update representation takes; it
    /// does not schedule any outbound update.
    pub fn set_max_table_size(&mut self, size: usize) {
        self.table.set_max_size(size);
    }

    /// Record the peer's SETTINGS_HEADER_TABLE_SIZE.
    ///
    /// The codec adopts the value as both its advertised limit and its
    /// active budget, and the next encoded block opens with a size update
    /// announcing it.
    pub fn set_peer_max_table_size(&mut self, size: usize) {
        self.max_table_size_limit = size;
        self.table.set_max_size(size);
        self.pending_size_update = Some(size);
    }

    pub fn max_table_size(&self) -> usize {
        self.table.max_size()
    }

    pub fn max_table_size_limit(&self) -> usize {
        self.max_table_size_limit
    }

    // -- Dynamic table inspection --

    /// Entry at `position` from the newest end (0 is external index 62).
    pub fn dynamic_entry(&self, position: usize) -> Option<&HeaderField> {
        self.table.get(position)
    }

    pub fn dynamic_len(&self) -> usize {
        self.table.len()
    }

    /// Charged size of the dynamic table.
    pub fn dynamic_size(&self) -> usize {
        self.table.size()
    }

    // -- Decoding --

    /// Decode a complete header block.
    ///
    /// The returned fields stay valid until [`HPack::release_fields`] or
    /// the next decode. On error nothing is delivered: the partial field
    /// list is released, though the dynamic table keeps any mutations the
    /// valid prefix of the block made.
    pub fn decode(&mut self, block: &[u8]) -> Result<&[HeaderField], HpackError> {
        self.release_fields();
        match self.decode_block(block) {
            Ok(()) => Ok(&self.fields),
            Err(err) => {
                self.release_fields();
                Err(err)
            }
        }
    }

    fn decode_block(&mut self, block: &[u8]) -> Result<(), HpackError> {
        let mut buf = block;
        // Size updates are only valid before the first field
        // representation of a block.
        let mut seen_field = false;

        while let Some(&first) = buf.first() {
            if first & INDEXED != 0 {
                let (index, rest) = integer::decode_int(buf, 7)?;
                buf = rest;
                if index == 0 {
                    return Err(HpackError::ZeroIndex);
                }
                let field = self.indexed_field(index as usize)?;
                self.fields.push(field);
                seen_field = true;
            } else if first & INCREMENTAL != 0 {
                buf = self.decode_literal(buf, 6, true, false)?;
                seen_field = true;
            } else if first & SIZE_UPDATE != 0 {
                if seen_field {
                    return Err(HpackError::BadSizeUpdate);
                }
                let (size, rest) = integer::decode_int(buf, 5)?;
                buf = rest;
                if size > self.max_table_size_limit as u64 {
                    return Err(HpackError::BadSizeUpdate);
                }
                self.table.set_max_size(size as usize);
            } else {
                let sensitive = first & NEVER_INDEXED != 0;
                buf = self.decode_literal(buf, 4, false, sensitive)?;
                seen_field = true;
            }
        }
        Ok(())
    }

    fn decode_literal<'a>(
        &mut self,
        buf: &'a [u8],
        prefix_bits: u8,
        insert: bool,
        sensitive: bool,
    ) -> Result<&'a [u8], HpackError> {
        let (name_index, mut rest) = integer::decode_int(buf, prefix_bits)?;
        let mut field = self.take_spare();
        field.sensitive = sensitive;
        if name_index == 0 {
            rest = read_string(&mut field.name, rest)?;
        } else {
            self.copy_name(name_index as usize, &mut field.name)?;
        }
        rest = read_string(&mut field.value, rest)?;
        if insert {
            self.table.insert(field.clone());
        }
        self.fields.push(field);
        Ok(rest)
    }

    /// Resolve an index to a full field, copied into a recycled record.
    fn indexed_field(&mut self, index: usize) -> Result<HeaderField, HpackError> {
        let mut field = self.take_spare();
        if index <= STATIC_TABLE.len() {
            let (name, value) = STATIC_TABLE[index - 1];
            field.name.extend_from_slice(name);
            field.value.extend_from_slice(value);
        } else if let Some(entry) = self.table.get(index - STATIC_TABLE.len() - 1) {
            field.name.extend_from_slice(&entry.name);
            field.value.extend_from_slice(&entry.value);
        } else {
            self.spare.push(field);
            return Err(HpackError::InvalidIndex(index));
        }
        Ok(field)
    }

    /// Resolve a name index, copying the name into `out`. Callers handle
    /// index 0 (a literal name follows) before resolving.
    fn copy_name(&self, index: usize, out: &mut Vec<u8>) -> Result<(), HpackError> {
        if index <= STATIC_TABLE.len() {
            out.extend_from_slice(STATIC_TABLE[index - 1].0);
            return Ok(());
        }
        match self.table.get(index - STATIC_TABLE.len() - 1) {
            Some(entry) => {
                out.extend_from_slice(&entry.name);
                Ok(())
            }
            None => Err(HpackError::InvalidIndex(index)),
        }
    }

    // -- Encoding --

    /// Encode the pending field list (built with [`HPack::add`]) into
    /// `dst`. The list stays in place until [`HPack::release_fields`].
    ///
    /// Encoding cannot fail; the `Result` keeps the signature uniform
    /// with [`HPack::decode`].
    pub fn encode(&mut self, dst: &mut Vec<u8>) -> Result<(), HpackError> {
        let fields = std::mem::take(&mut self.fields);
        let result = self.encode_fields(&fields, dst);
        self.fields = fields;
        result
    }

    /// Encode a caller-supplied field list into `dst`.
    pub fn encode_fields(
        &mut self,
        fields: &[HeaderField],
        dst: &mut Vec<u8>,
    ) -> Result<(), HpackError> {
        if let Some(size) = self.pending_size_update.take() {
            integer::encode_int(dst, 5, SIZE_UPDATE, size as u64);
        }
        for field in fields {
            self.encode_field(field, dst);
        }
        Ok(())
    }

    fn encode_field(&mut self, field: &HeaderField, dst: &mut Vec<u8>) {
        if field.sensitive {
            self.encode_literal_name(field, dst, NEVER_INDEXED);
            return;
        }
        if self.disable_indexing {
            self.encode_literal_name(field, dst, WITHOUT_INDEXING);
            return;
        }
        match self.search(&field.name, &field.value) {
            Some((index, true)) => {
                integer::encode_int(dst, 7, INDEXED, index as u64);
            }
            Some((index, false)) => {
                integer::encode_int(dst, 6, INCREMENTAL, index as u64);
                write_string(dst, &field.value, self.disable_huffman);
                self.table.insert(field.clone());
            }
            None => {
                integer::encode_int(dst, 6, INCREMENTAL, 0);
                write_string(dst, &field.name, self.disable_huffman);
                write_string(dst, &field.value, self.disable_huffman);
                self.table.insert(field.clone());
            }
        }
    }

    /// The two non-indexing literal forms share a shape: 4-bit name
    /// index (0 for a literal name), then the value.
    fn encode_literal_name(&self, field: &HeaderField, dst: &mut Vec<u8>, pattern: u8) {
        let name_index = self.search_name(&field.name).unwrap_or(0);
        integer::encode_int(dst, 4, pattern, name_index as u64);
        if name_index == 0 {
            write_string(dst, &field.name, self.disable_huffman);
        }
        write_string(dst, &field.value, self.disable_huffman);
    }

    /// Search both tables. Returns the external index and whether the
    /// value matched too. Exact matches beat name-only matches, and the
    /// static table is scanned first in each pass so the smaller index
    /// wins.
    fn search(&self, name: &[u8], value: &[u8]) -> Option<(usize, bool)> {
        if let Some(index) = table::find_static_exact(name, value) {
            return Some((index, true));
        }
        if let Some(index) = self.table.find_exact(name, value) {
            return Some((index, true));
        }
        if let Some(index) = table::find_static_name(name) {
            return Some((index, false));
        }
        if let Some(index) = self.table.find_name(name) {
            return Some((index, false));
        }
        None
    }

    fn search_name(&self, name: &[u8]) -> Option<usize> {
        table::find_static_name(name).or_else(|| self.table.find_name(name))
    }
}
