//! # Property Types
//!
//! This crate defines the fundamental types shared by the property store.
//!
//! ## Philosophy
//!
//! - **Names are checked once, everywhere**: every store operation goes through
//!   [`is_legal_name`] before touching disk or the live registry.
//! - **Lists are transient**: a [`PropertyList`] is built per operation and
//!   dropped afterwards. Nothing caches property values between calls.
//! - **Flags are explicit**: callers say which stores to consult with
//!   [`PropFlags`] rather than relying on ambient defaults.
//!
//! ## Key Types
//!
//! - [`PropertyList`]: Ordered name → value mapping
//! - [`PropFlags`]: Store selection policy for one operation

pub mod flags;
pub mod name;

use std::collections::BTreeMap;

pub use flags::PropFlags;
pub use name::{has_persist_prefix, is_legal_name, is_read_only_name, is_well_formed_name};

/// Name → value mapping built for a single operation.
///
/// Ordered so listings come out sorted by name.
pub type PropertyList = BTreeMap<String, String>;

/// Maximum size of a property value including the terminating NUL.
///
/// Values read through the live registry or the legacy directory are capped at
/// `PROP_VALUE_MAX - 1` bytes.
pub const PROP_VALUE_MAX: usize = 92;

/// Longest value that fits in a binary store record.
pub const PERSIST_VALUE_CAPACITY: usize = PROP_VALUE_MAX - 1;

/// Prefix of names eligible for the persistent store.
pub const PERSIST_PREFIX: &str = "persist.";

/// Prefix of names that are read-only once set through the service.
pub const READ_ONLY_PREFIX: &str = "ro.";

/// Returns the longest prefix of `value` that fits in `max` bytes without
/// splitting a UTF-8 sequence.
pub fn truncate_value(value: &str, max: usize) -> &str {
    if value.len() <= max {
        return value;
    }
    let mut end = max;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}
