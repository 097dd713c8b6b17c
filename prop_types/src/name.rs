//! Property name rules

use crate::{PERSIST_PREFIX, READ_ONLY_PREFIX};
use log::error;

const SEPARATOR: u8 = b'.';

/// Checks whether `name` is a legal property name.
///
/// A legal name is non-empty, does not start or end with `.`, never contains
/// two consecutive `.`, and only uses ASCII letters, digits and `_ - @ : .`.
pub fn is_legal_name(name: &str) -> bool {
    let legal = is_well_formed_name(name);
    if !legal {
        error!("Illegal property name: [{}]", name);
    }
    legal
}

/// Same rules as [`is_legal_name`] without logging.
///
/// Used when scanning names that did not come from a caller.
pub fn is_well_formed_name(name: &str) -> bool {
    let name = name.as_bytes();
    let (first, last) = match (name.first(), name.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return false,
    };
    if first == SEPARATOR || last == SEPARATOR {
        return false;
    }

    let mut previous = 0u8;
    for &byte in name {
        if byte == SEPARATOR {
            if previous == SEPARATOR {
                return false;
            }
        } else if !is_name_byte(byte) {
            return false;
        }
        previous = byte;
    }
    true
}

fn is_name_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'-' | b'@' | b':')
}

/// Returns true if `name` may be stored in the persistent store
pub fn has_persist_prefix(name: &str) -> bool {
    name.starts_with(PERSIST_PREFIX)
}

/// Returns true if `name` is in the read-only namespace
pub fn is_read_only_name(name: &str) -> bool {
    name.starts_with(READ_ONLY_PREFIX)
}
