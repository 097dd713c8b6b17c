//! Streaming record decoder

use crate::record::PersistentPropertyRecord;
use crate::PROPERTIES_TAG;
use log::debug;
use prop_types::PERSIST_VALUE_CAPACITY;
use prost::encoding::{decode_key, decode_varint, WireType};
use prost::DecodeError;

const NAME_TAG: u32 = 1;
const VALUE_TAG: u32 = 2;

/// Returns a single-pass iterator over the records in `bytes`
pub fn decode(bytes: &[u8]) -> RecordStream<'_> {
    RecordStream {
        remaining: bytes,
        failed: false,
    }
}

/// Forward-only iterator over encoded records.
///
/// Yields records until the input is exhausted or a framing error is hit.
/// After an error the stream stays finished.
pub struct RecordStream<'a> {
    remaining: &'a [u8],
    failed: bool,
}

impl<'a> RecordStream<'a> {
    fn next_record(&mut self) -> Result<Option<PersistentPropertyRecord>, DecodeError> {
        while !self.remaining.is_empty() {
            let mut cursor = self.remaining;
            let (tag, wire_type) = decode_key(&mut cursor)?;

            if tag != PROPERTIES_TAG {
                skip_field(wire_type, &mut cursor)?;
                self.remaining = cursor;
                continue;
            }
            if wire_type != WireType::LengthDelimited {
                return Err(DecodeError::new("invalid wire type for record"));
            }

            let body = take_delimited(&mut cursor)?;
            let record = decode_record(body)?;
            self.remaining = cursor;
            return Ok(Some(record));
        }
        Ok(None)
    }
}

impl<'a> Iterator for RecordStream<'a> {
    type Item = PersistentPropertyRecord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_record() {
            Ok(record) => record,
            Err(err) => {
                debug!("stop decoding persistent props: {}", err);
                self.failed = true;
                None
            }
        }
    }
}

/// Decodes one record body.
///
/// Fields are read as raw bytes and converted lossily, so a record with
/// non-UTF-8 content is kept instead of ending the stream. Repeated fields
/// follow protobuf rules: the last one wins.
fn decode_record(mut body: &[u8]) -> Result<PersistentPropertyRecord, DecodeError> {
    let mut name: &[u8] = &[];
    let mut value: Option<&[u8]> = None;

    while !body.is_empty() {
        let (tag, wire_type) = decode_key(&mut body)?;
        match (tag, wire_type) {
            (NAME_TAG, WireType::LengthDelimited) => name = take_delimited(&mut body)?,
            (VALUE_TAG, WireType::LengthDelimited) => {
                let bytes = take_delimited(&mut body)?;
                if bytes.len() > PERSIST_VALUE_CAPACITY {
                    return Err(DecodeError::new("string overflow"));
                }
                value = Some(bytes);
            }
            (NAME_TAG, _) | (VALUE_TAG, _) => {
                return Err(DecodeError::new("invalid wire type for record field"));
            }
            _ => skip_field(wire_type, &mut body)?,
        }
    }

    Ok(PersistentPropertyRecord {
        name: String::from_utf8_lossy(name).into_owned(),
        value: value.map(|bytes| String::from_utf8_lossy(bytes).into_owned()),
    })
}

fn take_delimited<'a>(cursor: &mut &'a [u8]) -> Result<&'a [u8], DecodeError> {
    let len = decode_varint(cursor)?;
    let len = usize::try_from(len).map_err(|_| DecodeError::new("length overflow"))?;
    let bytes: &'a [u8] = cursor;
    if len > bytes.len() {
        return Err(DecodeError::new("buffer underflow"));
    }
    let (body, rest) = bytes.split_at(len);
    *cursor = rest;
    Ok(body)
}

fn take_fixed<'a>(cursor: &mut &'a [u8], width: usize) -> Result<(), DecodeError> {
    let bytes: &'a [u8] = cursor;
    if width > bytes.len() {
        return Err(DecodeError::new("buffer underflow"));
    }
    *cursor = &bytes[width..];
    Ok(())
}

fn skip_field(wire_type: WireType, cursor: &mut &[u8]) -> Result<(), DecodeError> {
    match wire_type {
        WireType::Varint => decode_varint(cursor).map(|_| ()),
        WireType::SixtyFourBit => take_fixed(cursor, 8),
        WireType::ThirtyTwoBit => take_fixed(cursor, 4),
        WireType::LengthDelimited => take_delimited(cursor).map(|_| ()),
        WireType::StartGroup | WireType::EndGroup => {
            Err(DecodeError::new("groups are not supported"))
        }
    }
}
