//! Header field representation.

/// A single header name-value pair.
///
/// Names and values are opaque octet strings. HTTP/2 expects lowercase
/// names, but the codec neither checks nor rewrites case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderField {
    pub name: Vec<u8>,
    pub value: Vec<u8>,
    /// Never index this field. The encoder emits it as Literal Never
    /// Indexed so intermediaries keep it out of their tables too.
    pub sensitive: bool,
}

impl HeaderField {
    pub fn new(name: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            sensitive: false,
        }
    }

    /// A field carrying the never-index hint.
    pub fn sensitive(name: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            sensitive: true,
        }
    }

    /// Size of this field for dynamic table accounting (RFC 7541
    /// Section 4.1): `len(name) + len(value) + 32`.
    pub fn size(&self) -> usize {
        self.name.len() + self.value.len() + 32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_size_includes_overhead() {
        let field = HeaderField::new(b":authority".as_slice(), b"www.example.com".as_slice());
        assert_eq!(field.size(), 10 + 15 + 32);
    }

    #[test]
    fn sensitive_constructor_sets_hint() {
        let field = HeaderField::sensitive(b"authorization".as_slice(), b"secret".as_slice());
        assert!(field.sensitive);
        assert!(!HeaderField::new(b"a".as_slice(), b"b".as_slice()).sensitive);
    }
}
