//! # Persistent Property Codec
//!
//! Encodes and decodes the canonical persistent property file.
//!
//! ## Format
//!
//! The file is a protobuf message compatible with the platform's own reader:
//!
//! ```text
//! message PersistentProperties {
//!     message PersistentPropertyRecord {
//!         optional string name = 1;
//!         optional string value = 2;   // at most 91 bytes
//!     }
//!     repeated PersistentPropertyRecord properties = 1;
//! }
//! ```
//!
//! ## Contract
//!
//! - Encoding never rejects a value: anything longer than
//!   [`PERSIST_VALUE_CAPACITY`] is truncated.
//! - Decoding is a single forward pass exposed as an iterator. A malformed
//!   stream ends the iteration early, so a corrupt file and an empty file look
//!   the same to callers. Non-UTF-8 bytes are not an error; they are replaced
//!   with U+FFFD.

pub mod record;
pub mod stream;

pub use record::{PersistentProperties, PersistentPropertyRecord};
pub use stream::{decode, RecordStream};

use log::debug;
use prop_types::{truncate_value, PropertyList, PERSIST_VALUE_CAPACITY};
use prost::encoding::{encode_key, WireType};
use prost::Message;
use std::io::Write;
use thiserror::Error;

/// Field number of the repeated record in the outer message
pub const PROPERTIES_TAG: u32 = 1;

/// Errors that can occur while encoding
#[derive(Debug, Error)]
pub enum CodecError {
    /// Record could not be serialized into the scratch buffer
    #[error("Failed to encode record: {0}")]
    Encode(#[from] prost::EncodeError),

    /// Encoded bytes could not be written out
    #[error("Failed to write encoded records: {0}")]
    Write(#[from] std::io::Error),
}

/// Encodes `entries` as a complete store file into `out`.
///
/// Records are written one at a time in iteration order. Every record carries
/// a value; values longer than the record capacity are truncated.
pub fn encode<'a, I, W>(entries: I, out: &mut W) -> Result<usize, CodecError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
    W: Write,
{
    let mut written = 0;
    let mut scratch = Vec::new();
    for (name, value) in entries {
        let record = PersistentPropertyRecord {
            name: name.to_string(),
            value: Some(truncate_value(value, PERSIST_VALUE_CAPACITY).to_string()),
        };

        scratch.clear();
        encode_key(PROPERTIES_TAG, WireType::LengthDelimited, &mut scratch);
        record.encode_length_delimited(&mut scratch)?;
        out.write_all(&scratch)?;
        written += scratch.len();
    }
    Ok(written)
}

/// Encodes a property list into a fresh buffer
pub fn encode_list(list: &PropertyList) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::new();
    encode(list.iter().map(|(k, v)| (k.as_str(), v.as_str())), &mut buf)?;
    Ok(buf)
}

/// Decodes every readable record into a property list.
///
/// The first record seen for a name wins. Records without a name are dropped.
pub fn decode_list(bytes: &[u8]) -> PropertyList {
    let mut list = PropertyList::new();
    for record in decode(bytes) {
        if record.name.is_empty() {
            debug!("skip record without name");
            continue;
        }
        list.entry(record.name)
            .or_insert_with(|| record.value.unwrap_or_default());
    }
    list
}
