//! Error types for HPACK coding.

/// Error type for HPACK encode/decode operations.
///
/// The taxonomy is flat: every failure a header block can produce maps to
/// exactly one variant, and the framing layer maps any of them to an
/// HTTP/2 `COMPRESSION_ERROR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HpackError {
    /// The buffer ended in the middle of a prefix integer.
    #[error("truncated integer")]
    IntegerTruncated,

    /// A decoded integer exceeds 2^63 - 1.
    #[error("integer overflow")]
    IntegerOverflow,

    /// A string literal declares more octets than the buffer holds.
    #[error("truncated string literal")]
    StringTruncated,

    /// A Huffman bit sequence does not map to any symbol.
    #[error("invalid huffman code")]
    HuffmanInvalidCode,

    /// Trailing bits of a Huffman string are not a valid EOS prefix.
    #[error("invalid huffman padding")]
    HuffmanBadPadding,

    /// The EOS symbol appeared inside a Huffman string.
    #[error("EOS symbol in huffman string")]
    HuffmanEosInStream,

    /// A table index outside the static and dynamic ranges.
    #[error("invalid table index: {0}")]
    InvalidIndex(usize),

    /// An indexed representation with index zero.
    #[error("zero table index")]
    ZeroIndex,

    /// A dynamic table size update out of place or above the advertised
    /// limit.
    #[error("invalid dynamic table size update")]
    BadSizeUpdate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            format!("{}", HpackError::IntegerTruncated),
            "truncated integer"
        );
        assert_eq!(
            format!("{}", HpackError::IntegerOverflow),
            "integer overflow"
        );
        assert_eq!(
            format!("{}", HpackError::StringTruncated),
            "truncated string literal"
        );
        assert_eq!(
            format!("{}", HpackError::HuffmanInvalidCode),
            "invalid huffman code"
        );
        assert_eq!(
            format!("{}", HpackError::HuffmanBadPadding),
            "invalid huffman padding"
        );
        assert_eq!(
            format!("{}", HpackError::HuffmanEosInStream),
            "EOS symbol in huffman string"
        );
        assert_eq!(
            format!("{}", HpackError::InvalidIndex(99)),
            "invalid table index: 99"
        );
        assert_eq!(format!("{}", HpackError::ZeroIndex), "zero table index");
        assert_eq!(
            format!("{}", HpackError::BadSizeUpdate),
            "invalid dynamic table size update"
        );
    }

    #[test]
    fn test_error_eq() {
        assert_eq!(HpackError::ZeroIndex, HpackError::ZeroIndex);
        assert_ne!(HpackError::ZeroIndex, HpackError::BadSizeUpdate);
        assert_eq!(HpackError::InvalidIndex(62), HpackError::InvalidIndex(62));
        assert_ne!(HpackError::InvalidIndex(62), HpackError::InvalidIndex(63));
    }
}
