//! # Property Area
//!
//! The live property registry as seen by the store.
//!
//! ## Philosophy
//!
//! The live registry belongs to the host. This crate only describes the
//! operations the resolver needs from it ([`PropertyArea`]) and ships an
//! in-memory stand-in ([`MemoryPropertyArea`]) for hosts without one and for
//! tests.

use log::debug;
use prop_types::{is_read_only_name, PROP_VALUE_MAX};
use std::collections::BTreeMap;
use thiserror::Error;

/// Result type for area operations
pub type AreaResult<T> = Result<T, AreaError>;

/// Error types for area operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AreaError {
    /// No node with this name
    #[error("Property not found: {0}")]
    NotFound(String),

    /// A node with this name already exists
    #[error("Property already exists: {0}")]
    AlreadyExists(String),

    /// Value does not fit the node
    #[error("Value too long for {name}: {len} bytes")]
    ValueTooLong { name: String, len: usize },

    /// Read-only property already set
    #[error("Read-only property: {0}")]
    ReadOnly(String),

    /// Host refused the request
    #[error("Property service rejected {0}")]
    Rejected(String),
}

/// Operations the resolver needs from the live registry.
///
/// `add`, `update` and `delete` mutate storage nodes directly and skip the
/// service's own side effects (persistence, triggers). `service_set` goes
/// through the full service, which decides persistence itself.
pub trait PropertyArea {
    /// Opaque reference to an existing node
    type Handle;

    /// Looks up a node by name
    fn find(&self, name: &str) -> Option<Self::Handle>;

    /// Reads `(name, value)` from a node
    fn read(&self, handle: &Self::Handle) -> Option<(String, String)>;

    /// Visits every node
    fn for_each(&self, visitor: &mut dyn FnMut(&str, &str));

    /// Creates a node
    fn add(&mut self, name: &str, value: &str) -> AreaResult<()>;

    /// Overwrites a node's value in place
    fn update(&mut self, handle: &Self::Handle, value: &str) -> AreaResult<()>;

    /// Removes a node; `prune` also drops now-empty interior nodes
    fn delete(&mut self, name: &str, prune: bool) -> AreaResult<()>;

    /// Returns true if the node holds a value too long to update in place
    fn is_long(&self, handle: &Self::Handle) -> bool;

    /// Security label that governs `name`
    fn context(&self, name: &str) -> Option<String>;

    /// Sets a property through the full service
    fn service_set(&mut self, name: &str, value: &str) -> AreaResult<()>;
}

/// Handle into a [`MemoryPropertyArea`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct Node {
    name: String,
    value: String,
}

impl Node {
    fn is_long(&self) -> bool {
        self.value.len() >= PROP_VALUE_MAX
    }
}

/// In-memory live registry.
///
/// Mirrors the host's storage rules: values must be shorter than
/// [`PROP_VALUE_MAX`] unless the name is read-only, long values cannot be
/// updated in place, and the service refuses to change a read-only property
/// that is already set.
#[derive(Debug, Default)]
pub struct MemoryPropertyArea {
    nodes: Vec<Option<Node>>,
    names: BTreeMap<String, usize>,
    contexts: Vec<(String, String)>,
}

impl MemoryPropertyArea {
    /// Creates an empty area
    pub fn new() -> Self {
        Self::default()
    }

    /// Labels every name starting with `prefix`. Longest prefix wins.
    pub fn with_context(mut self, prefix: impl Into<String>, label: impl Into<String>) -> Self {
        self.contexts.push((prefix.into(), label.into()));
        self
    }

    /// Adds a property while building a fixture
    pub fn with_property(mut self, name: &str, value: &str) -> AreaResult<Self> {
        self.add(name, value)?;
        Ok(self)
    }

    /// Number of live nodes
    pub fn count(&self) -> usize {
        self.names.len()
    }

    fn check_len(name: &str, value: &str) -> AreaResult<()> {
        if value.len() >= PROP_VALUE_MAX && !is_read_only_name(name) {
            return Err(AreaError::ValueTooLong {
                name: name.to_string(),
                len: value.len(),
            });
        }
        Ok(())
    }

    fn node(&self, handle: &NodeId) -> Option<&Node> {
        self.nodes.get(handle.0).and_then(Option::as_ref)
    }
}

impl PropertyArea for MemoryPropertyArea {
    type Handle = NodeId;

    fn find(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied().map(NodeId)
    }

    fn read(&self, handle: &NodeId) -> Option<(String, String)> {
        self.node(handle)
            .map(|node| (node.name.clone(), node.value.clone()))
    }

    fn for_each(&self, visitor: &mut dyn FnMut(&str, &str)) {
        for idx in self.names.values() {
            if let Some(Some(node)) = self.nodes.get(*idx) {
                visitor(&node.name, &node.value);
            }
        }
    }

    fn add(&mut self, name: &str, value: &str) -> AreaResult<()> {
        if self.names.contains_key(name) {
            return Err(AreaError::AlreadyExists(name.to_string()));
        }
        Self::check_len(name, value)?;

        let node = Node {
            name: name.to_string(),
            value: value.to_string(),
        };
        let idx = match self.nodes.iter().position(Option::is_none) {
            Some(free) => {
                self.nodes[free] = Some(node);
                free
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        };
        self.names.insert(name.to_string(), idx);
        Ok(())
    }

    fn update(&mut self, handle: &NodeId, value: &str) -> AreaResult<()> {
        let node = self
            .nodes
            .get_mut(handle.0)
            .and_then(Option::as_mut)
            .ok_or_else(|| AreaError::NotFound(format!("node {}", handle.0)))?;
        if node.is_long() || value.len() >= PROP_VALUE_MAX {
            return Err(AreaError::ValueTooLong {
                name: node.name.clone(),
                len: value.len(),
            });
        }
        node.value = value.to_string();
        Ok(())
    }

    fn delete(&mut self, name: &str, prune: bool) -> AreaResult<()> {
        let idx = self
            .names
            .remove(name)
            .ok_or_else(|| AreaError::NotFound(name.to_string()))?;
        self.nodes[idx] = None;
        if prune {
            while matches!(self.nodes.last(), Some(None)) {
                self.nodes.pop();
            }
        }
        Ok(())
    }

    fn is_long(&self, handle: &NodeId) -> bool {
        self.node(handle).map(Node::is_long).unwrap_or(false)
    }

    fn context(&self, name: &str) -> Option<String> {
        self.contexts
            .iter()
            .filter(|(prefix, _)| name.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, label)| label.clone())
    }

    fn service_set(&mut self, name: &str, value: &str) -> AreaResult<()> {
        match self.find(name) {
            Some(_) if is_read_only_name(name) => Err(AreaError::ReadOnly(name.to_string())),
            Some(handle) => self.update(&handle, value),
            None => {
                debug!("service creates [{}]", name);
                self.add(name, value)
            }
        }
    }
}
