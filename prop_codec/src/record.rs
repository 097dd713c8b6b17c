//! Protobuf message definitions for the store file

use prost::Message;

/// One stored property
#[derive(Clone, PartialEq, Message)]
pub struct PersistentPropertyRecord {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, optional, tag = "2")]
    pub value: Option<String>,
}

/// The whole store file.
///
/// Only used where a fully materialized message is convenient (tests, tools);
/// the store itself streams records through [`crate::encode`] and
/// [`crate::decode`].
#[derive(Clone, PartialEq, Message)]
pub struct PersistentProperties {
    #[prost(message, repeated, tag = "1")]
    pub properties: Vec<PersistentPropertyRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{decode, encode};

    #[test]
    fn test_streamed_encoding_matches_message_encoding() {
        let message = PersistentProperties {
            properties: vec![
                PersistentPropertyRecord {
                    name: "persist.a".to_string(),
                    value: Some("1".to_string()),
                },
                PersistentPropertyRecord {
                    name: "persist.b".to_string(),
                    value: Some("22".to_string()),
                },
            ],
        };

        let mut streamed = Vec::new();
        encode([("persist.a", "1"), ("persist.b", "22")], &mut streamed).unwrap();

        assert_eq!(streamed, message.encode_to_vec());
    }

    #[test]
    fn test_streamed_decoding_matches_message_decoding() {
        let message = PersistentProperties {
            properties: vec![PersistentPropertyRecord {
                name: "persist.c".to_string(),
                value: Some("3".to_string()),
            }],
        };
        let bytes = message.encode_to_vec();

        let records: Vec<PersistentPropertyRecord> = decode(&bytes).collect();
        assert_eq!(records, message.properties);
    }
}
