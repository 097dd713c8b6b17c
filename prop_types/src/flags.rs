//! Store selection flags

use serde::{Deserialize, Serialize};

/// Policy for a single property operation.
///
/// `persistent_only` implies `include_persistent`; use the builder methods to
/// keep the two consistent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropFlags {
    /// Mutate registry nodes directly instead of going through the service
    pub bypass_live_registry: bool,
    /// Also consult the persistent store for `persist.` names
    pub include_persistent: bool,
    /// Consult only the persistent store
    pub persistent_only: bool,
    /// Return the security label instead of the value
    pub want_security_label: bool,
}

impl PropFlags {
    /// Creates an empty flag set (live registry only, through the service)
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the bypass flag
    pub fn bypass_live_registry(mut self) -> Self {
        self.bypass_live_registry = true;
        self
    }

    /// Sets the persistent flag
    pub fn include_persistent(mut self) -> Self {
        self.include_persistent = true;
        self
    }

    /// Restricts the operation to the persistent store
    pub fn persistent_only(mut self) -> Self {
        self.persistent_only = true;
        self.include_persistent = true;
        self
    }

    /// Requests security labels instead of values
    pub fn want_security_label(mut self) -> Self {
        self.want_security_label = true;
        self
    }

    /// Returns true if the persistent store is consulted at all.
    ///
    /// Holds for `persistent_only` even when `include_persistent` was left
    /// unset by a struct literal.
    pub fn uses_persistent(&self) -> bool {
        self.include_persistent || self.persistent_only
    }
}
