//! Sans-IO HPACK (RFC 7541) header compression codec for HTTP/2.
//!
//! This crate implements the stateful HPACK encoder/decoder pair used for
//! HTTP/2 header blocks. It has zero runtime dependencies on any I/O layer:
//! the framing layer passes complete header-block payloads in and receives
//! appended output buffers out.
//!
//! # Architecture
//!
//! ```text
//!   HEADERS / CONTINUATION payload bytes
//!        |
//!   +----v----------+
//!   | protocol-hpack|  prefix integers + Huffman + tables
//!   | HPack         |  decoded HeaderField list / encoded block
//!   +---------------+
//! ```
//!
//! - [`integer`]: RFC 7541 Section 5.1 prefix integers
//! - [`huffman`]: the canonical 257-symbol code of Appendix B
//! - [`table`]: the 61-entry static table and the bounded dynamic table
//! - [`hpack`]: the six representation forms and the [`HPack`] block codec
//! - [`pool`]: process-wide recycling of [`HPack`] instances
//!
//! # Example
//!
//! ```
//! use protocol_hpack::{acquire_hpack, release_hpack, HeaderField};
//!
//! let mut encoder = acquire_hpack();
//! let mut decoder = acquire_hpack();
//!
//! encoder.add(b":method".as_slice(), b"GET".as_slice());
//! encoder.add(b":path".as_slice(), b"/index.html".as_slice());
//!
//! let mut block = Vec::new();
//! encoder.encode(&mut block).unwrap();
//!
//! let fields = decoder.decode(&block).unwrap();
//! assert_eq!(fields[0], HeaderField::new(b":method".as_slice(), b"GET".as_slice()));
//!
//! decoder.release_fields();
//! release_hpack(encoder);
//! release_hpack(decoder);
//! ```
//!
//! HPACK state is strictly ordered with the header blocks of a connection;
//! an `HPack` value is `&mut self` throughout, so the borrow checker
//! enforces the per-connection serialization HTTP/2 requires. Any decode
//! error should be mapped to a connection-level `COMPRESSION_ERROR` by the
//! framing layer.

pub mod error;
mod field;
pub mod hpack;
pub mod huffman;
pub mod integer;
pub mod pool;
pub mod table;

pub use error::HpackError;
pub use field::HeaderField;
pub use hpack::HPack;
pub use pool::{acquire_hpack, release_hpack};
