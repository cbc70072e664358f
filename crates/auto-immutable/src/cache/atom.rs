//! A cached snapshot of the value at one property path.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;

use super::AccessorId;

/// One path's value, shared read-only by every [`Accessor`](super::Accessor)
/// selecting that path.
///
/// The value is an owned copy taken from the tree, never a view into it.
/// `exists` remembers whether the path resolved when the copy was taken; a
/// missing path is held as `null`.
#[derive(Debug, Clone)]
pub struct Atom {
    value: Arc<Value>,
    exists: bool,
    connections: HashSet<AccessorId>,
}

impl Atom {
    pub fn new(value: Value, exists: bool) -> Self {
        Self {
            value: Arc::new(value),
            exists,
            connections: HashSet::new(),
        }
    }

    pub fn value(&self) -> &Arc<Value> {
        &self.value
    }

    pub fn exists(&self) -> bool {
        self.exists
    }

    /// Swaps in a new snapshot. Accessors holding the previous one keep it
    /// until they refresh.
    pub fn set_value(&mut self, value: Value, exists: bool) {
        self.value = Arc::new(value);
        self.exists = exists;
    }

    pub fn connect(&mut self, accessor: AccessorId) {
        self.connections.insert(accessor);
    }

    /// Returns the number of accessors still connected.
    pub fn disconnect(&mut self, accessor: AccessorId) -> usize {
        self.connections.remove(&accessor);
        self.connections.len()
    }

    pub fn is_connected(&self, accessor: AccessorId) -> bool {
        self.connections.contains(&accessor)
    }

    pub fn num_connections(&self) -> usize {
        self.connections.len()
    }
}
