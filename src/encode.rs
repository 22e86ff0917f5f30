//! Encoding of [`Document`]s into BFlat bytes.

use crate::document::Document;
use crate::element;
use crate::error::Result;

/// Encode a document. Records are emitted in the document's insertion order,
/// with no header or trailer around them.
///
/// Fails with [`HeterogeneousArray`](crate::Error::HeterogeneousArray) when a
/// sequence mixes element types, or [`KeyTooLong`](crate::Error::KeyTooLong)
/// when a tag name exceeds [`MAX_TAG_NAME_LEN`](crate::MAX_TAG_NAME_LEN); no
/// partial output is returned.
pub fn encode(doc: &Document) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    for (name, value) in doc.iter() {
        element::write_record(&mut buf, name, value)?;
    }
    Ok(buf)
}
