//! Where a store keeps the snapshot that resets restore.

use std::collections::HashMap;

use serde_json::Value;

/// Key-value storage for the store's original tree.
///
/// `clone_value` decides how a value is copied on its way in and out, so
/// that later mutations of the live tree never reach the stored one.
pub trait Storage {
    fn clone_value(&self, value: &Value) -> Value {
        value.clone()
    }

    fn get_item(&self, key: &str) -> Option<Value>;

    fn set_item(&mut self, key: &str, value: Value);

    fn remove_item(&mut self, key: &str);
}

/// In-process [`Storage`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: HashMap<String, Value>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<Value> {
        self.items.get(key).map(|v| self.clone_value(v))
    }

    fn set_item(&mut self, key: &str, value: Value) {
        self.items.insert(key.to_string(), value);
    }

    fn remove_item(&mut self, key: &str) {
        self.items.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn memory_storage_roundtrip() {
        let mut storage = MemoryStorage::new();
        assert!(storage.get_item("k").is_none());
        storage.set_item("k", json!({"a": 1}));
        assert_eq!(storage.get_item("k"), Some(json!({"a": 1})));
        assert_eq!(storage.len(), 1);
        storage.remove_item("k");
        assert!(storage.is_empty());
    }
}
