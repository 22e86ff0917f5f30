//! bflat is a codec for BFlat, a compact binary serialization format for
//! flat mappings whose values are scalars or homogeneous arrays of scalars.
//!
//! A BFlat document is a bare concatenation of records, one per tag, with no
//! header, trailer, or magic bytes. Each record is a one-byte tag header
//! (array flag, type code, and an inline tag-name-length hint), the tag name
//! itself, and the value payload: little-endian fixed-width integers and
//! IEEE-754 doubles, signed LEB128 integers, and length-prefixed strings and
//! byte strings. Scalar integers use the 4-byte form when they fit a signed
//! 32-bit value and LEB128 otherwise; integer array elements are always
//! LEB128.
//!
//! Encoding and decoding are pure, single-pass functions between byte
//! buffers and [`Document`] mappings:
//!
//! ```
//! use bflat::{decode, encode, Document};
//!
//! let mut doc = Document::new();
//! doc.insert("foo", 1);
//! doc.insert("greeting", "hello");
//!
//! let bytes = encode(&doc)?;
//! assert_eq!(decode(&bytes)?, doc);
//! # Ok::<(), bflat::Error>(())
//! ```
//!
//! Decoding combines repeated tags: when a name appears in more than one
//! record, the entry becomes one sequence holding every occurrence's
//! value(s) in record order, which may mix element types even though each
//! encoded array is homogeneous:
//!
//! ```
//! use bflat::{decode, encode, Document, Value};
//!
//! let first = encode(&[("foo", 1i32)].into_iter().collect())?;
//! let second = encode(&[("foo", "bar")].into_iter().collect())?;
//!
//! let combined = decode(&[first, second].concat())?;
//! assert_eq!(
//!     combined.get("foo"),
//!     Some(&Value::Array(vec![Value::Int(1), Value::from("bar")]))
//! );
//! # Ok::<(), bflat::Error>(())
//! ```
//!
//! The `bytes-as-string` feature makes the decoder surface Binary-tagged
//! records as strings, for bindings whose host language has no text/bytes
//! split. It changes nothing on the wire.

mod decode;
mod document;
mod element;
mod encode;
mod error;
mod leb128;
mod tag;
mod value;

pub use self::decode::decode;
pub use self::document::Document;
pub use self::encode::encode;
pub use self::error::{Error, Result};
pub use self::value::Value;

/// Longest tag name a record can carry, in bytes.
pub const MAX_TAG_NAME_LEN: usize = (1 << 24) - 1;
