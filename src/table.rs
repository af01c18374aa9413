//! HPACK indexing tables (RFC 7541 Section 2.3).
//!
//! The static table is a frozen constant; the dynamic table is a bounded
//! newest-first FIFO whose budget is charged per entry as
//! `len(name) + len(value) + 32`.

use std::collections::VecDeque;

use crate::field::HeaderField;

/// HPACK static table entries: (name, value). 61 entries, externally
/// indexed 1..=61 (RFC 7541 Appendix A).
pub const STATIC_TABLE: &[(&[u8], &[u8])] = &[
    (b":authority", b""),                   // 1
    (b":method", b"GET"),                   // 2
    (b":method", b"POST"),                  // 3
    (b":path", b"/"),                       // 4
    (b":path", b"/index.html"),             // 5
    (b":scheme", b"http"),                  // 6
    (b":scheme", b"https"),                 // 7
    (b":status", b"200"),                   // 8
    (b":status", b"204"),                   // 9
    (b":status", b"206"),                   // 10
    (b":status", b"304"),                   // 11
    (b":status", b"400"),                   // 12
    (b":status", b"404"),                   // 13
    (b":status", b"500"),                   // 14
    (b"accept-charset", b""),               // 15
    (b"accept-encoding", b"gzip, deflate"), // 16
    (b"accept-language", b""),              // 17
    (b"accept-ranges", b""),                // 18
    (b"accept", b""),                       // 19
    (b"access-control-allow-origin", b""),  // 20
    (b"age", b""),                          // 21
    (b"allow", b""),                        // 22
    (b"authorization", b""),                // 23
    (b"cache-control", b""),                // 24
    (b"content-disposition", b""),          // 25
    (b"content-encoding", b""),             // 26
    (b"content-language", b""),             // 27
    (b"content-length", b""),               // 28
    (b"content-location", b""),             // 29
    (b"content-range", b""),                // 30
    (b"content-type", b""),                 // 31
    (b"cookie", b""),                       // 32
    (b"date", b""),                         // 33
    (b"etag", b""),                         // 34
    (b"expect", b""),                       // 35
    (b"expires", b""),                      // 36
    (b"from", b""),                         // 37
    (b"host", b""),                         // 38
    (b"if-match", b""),                     // 39
    (b"if-modified-since", b""),            // 40
    (b"if-none-match", b""),                // 41
    (b"if-range", b""),                     // 42
    (b"if-unmodified-since", b""),          // 43
    (b"last-modified", b""),                // 44
    (b"link", b""),                         // 45
    (b"location", b""),                     // 46
    (b"max-forwards", b""),                 // 47
    (b"proxy-authenticate", b""),           // 48
    (b"proxy-authorization", b""),          // 49
    (b"range", b""),                        // 50
    (b"referer", b""),                      // 51
    (b"refresh", b""),                      // 52
    (b"retry-after", b""),                  // 53
    (b"server", b""),                       // 54
    (b"set-cookie", b""),                   // 55
    (b"strict-transport-security", b""),    // 56
    (b"transfer-encoding", b""),            // 57
    (b"user-agent", b""),                   // 58
    (b"vary", b""),                         // 59
    (b"via", b""),                          // 60
    (b"www-authenticate", b""),             // 61
];

/// Find a static entry matching both name and value. 1-based index.
pub(crate) fn find_static_exact(name: &[u8], value: &[u8]) -> Option<usize> {
    STATIC_TABLE
        .iter()
        .position(|&(n, v)| n == name && v == value)
        .map(|i| i + 1)
}

/// Find the first static entry matching the name. 1-based index.
pub(crate) fn find_static_name(name: &[u8]) -> Option<usize> {
    STATIC_TABLE
        .iter()
        .position(|&(n, _)| n == name)
        .map(|i| i + 1)
}

/// HPACK dynamic table (RFC 7541 Section 2.3.2).
///
/// Entries are stored newest-first: position 0 corresponds to external
/// index 62. All entries are owned copies, so nothing decoded or encoded
/// later can alias into an evicted slot.
#[derive(Debug)]
pub struct DynamicTable {
    entries: VecDeque<HeaderField>,
    size: usize,
    max_size: usize,
}

impl DynamicTable {
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            size: 0,
            max_size,
        }
    }

    /// Get an entry by 0-based position from the newest end.
    pub fn get(&self, position: usize) -> Option<&HeaderField> {
        self.entries.get(position)
    }

    /// Insert a new entry at the newest end (RFC 7541 Section 4.4).
    ///
    /// An entry larger than the whole budget empties the table and is not
    /// inserted; otherwise the oldest entries are evicted until it fits.
    /// The size invariant holds again by the time this returns.
    pub fn insert(&mut self, field: HeaderField) {
        let entry_size = field.size();
        if entry_size > self.max_size {
            self.entries.clear();
            self.size = 0;
            return;
        }
        while self.size + entry_size > self.max_size {
            if let Some(evicted) = self.entries.pop_back() {
                self.size -= evicted.size();
            } else {
                break;
            }
        }
        self.size += entry_size;
        self.entries.push_front(field);
    }

    /// Update the budget, evicting oldest entries until the table fits.
    pub fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size;
        while self.size > self.max_size {
            if let Some(evicted) = self.entries.pop_back() {
                self.size -= evicted.size();
            } else {
                break;
            }
        }
    }

    /// Find an entry matching both name and value. External (62-based)
    /// index.
    pub(crate) fn find_exact(&self, name: &[u8], value: &[u8]) -> Option<usize> {
        self.entries
            .iter()
            .position(|f| f.name == name && f.value == value)
            .map(|i| i + STATIC_TABLE.len() + 1)
    }

    /// Find the first entry matching the name. External (62-based) index.
    pub(crate) fn find_name(&self, name: &[u8]) -> Option<usize> {
        self.entries
            .iter()
            .position(|f| f.name == name)
            .map(|i| i + STATIC_TABLE.len() + 1)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.size = 0;
    }

    /// Current charged size: the sum of entry sizes.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, value: &str) -> HeaderField {
        HeaderField::new(name.as_bytes(), value.as_bytes())
    }

    #[test]
    fn static_table_size() {
        assert_eq!(STATIC_TABLE.len(), 61);
    }

    #[test]
    fn static_lookups() {
        assert_eq!(find_static_exact(b":method", b"GET"), Some(2));
        assert_eq!(find_static_exact(b":status", b"302"), None);
        // Name-only matches land on the first entry with that name.
        assert_eq!(find_static_name(b":status"), Some(8));
        assert_eq!(find_static_name(b"set-cookie"), Some(55));
        assert_eq!(find_static_name(b"x-custom"), None);
    }

    #[test]
    fn insert_prepends_and_charges() {
        let mut table = DynamicTable::new(4096);
        table.insert(field(":authority", "www.example.com"));
        assert_eq!(table.size(), 57);
        table.insert(field("cache-control", "no-cache"));
        assert_eq!(table.size(), 57 + 53);
        // Newest first.
        assert_eq!(table.get(0).unwrap().name, b"cache-control");
        assert_eq!(table.get(1).unwrap().name, b":authority");
    }

    #[test]
    fn eviction_from_oldest_end() {
        // Each entry is 32 + 1 + 1 = 34 bytes; three fit in 110, four do
        // not.
        let mut table = DynamicTable::new(110);
        for name in ["a", "b", "c", "d"] {
            table.insert(field(name, "v"));
        }
        assert_eq!(table.len(), 3);
        assert_eq!(table.size(), 102);
        assert_eq!(table.get(2).unwrap().name, b"b");
        assert!(table.find_name(b"a").is_none());
    }

    #[test]
    fn oversized_entry_clears_table() {
        let mut table = DynamicTable::new(100);
        table.insert(field("a", "v"));
        table.insert(field("b", "v"));
        assert_eq!(table.len(), 2);

        let big_value = "x".repeat(100);
        table.insert(field("big", &big_value));
        assert_eq!(table.len(), 0);
        assert_eq!(table.size(), 0);
    }

    #[test]
    fn resize_evicts_to_fit() {
        let mut table = DynamicTable::new(4096);
        for name in ["a", "b", "c"] {
            table.insert(field(name, "v"));
        }
        table.set_max_size(70);
        assert_eq!(table.len(), 2);
        assert_eq!(table.size(), 68);
        table.set_max_size(0);
        assert!(table.is_empty());
        assert_eq!(table.size(), 0);
    }

    #[test]
    fn external_indices_are_62_based() {
        let mut table = DynamicTable::new(4096);
        table.insert(field("x-a", "1"));
        table.insert(field("x-b", "2"));
        assert_eq!(table.find_exact(b"x-b", b"2"), Some(62));
        assert_eq!(table.find_exact(b"x-a", b"1"), Some(63));
        assert_eq!(table.find_name(b"x-a"), Some(63));
        assert_eq!(table.find_exact(b"x-a", b"other"), None);
    }

    #[test]
    fn size_invariant_after_mixed_operations() {
        let mut table = DynamicTable::new(200);
        for i in 0..20 {
            table.insert(field(&format!("name-{i}"), "some-value"));
            let charged: usize = (0..table.len()).map(|k| table.get(k).unwrap().size()).sum();
            assert_eq!(charged, table.size());
            assert!(table.size() <= table.max_size());
        }
    }
}
