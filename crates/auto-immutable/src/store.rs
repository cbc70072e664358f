//! The store: a state tree, its cache, its change listeners and the
//! original snapshot that resets restore.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use auto_immutable_path::FULL_STATE_SELECTOR;

use crate::cache::{Cache, Snapshot};
use crate::options::StoreOptions;
use crate::patch::{merge_request, synthesize_reset, ChangeStats, Patch, PatchError};
use crate::storage::{MemoryStorage, Storage};

pub type ClientId = String;
pub type ListenerId = u64;

type Listener = Box<dyn FnMut(&Patch) + Send + Sync>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error(transparent)]
    Patch(#[from] PatchError),
    #[error("no original state stored under {key:?}")]
    OriginalMissing { key: String },
}

/// An immutable-by-contract state tree.
///
/// Writes go through [`Store::set_state`] and [`Store::reset_state`]; reads
/// go through client views from [`Store::get`], which only change identity
/// when a value they select changed.
///
/// # Example
///
/// ```
/// use auto_immutable::{Patch, Store};
/// use serde_json::json;
///
/// let mut store = Store::new(json!({"a": {"b": 1}, "c": 2}));
/// let client = store.connect();
/// let view = store.get(&client, &["a.b"]);
/// assert_eq!(*view["a.b"], json!(1));
///
/// assert!(store.set_state(&Patch::from(json!({"a": {"b": 5}}))).unwrap());
/// assert_eq!(*store.get(&client, &["a.b"])["a.b"], json!(5));
///
/// assert!(store.reset_state(&["a.b"]).unwrap());
/// assert_eq!(store.state(), json!({"a": {"b": 1}, "c": 2}));
/// ```
pub struct Store<S: Storage = MemoryStorage> {
    tree: Value,
    cache: Cache,
    storage: S,
    options: StoreOptions,
    next_client_id: u64,
    next_listener_id: ListenerId,
    listeners: BTreeMap<ListenerId, Listener>,
}

impl Store<MemoryStorage> {
    pub fn new(initial: Value) -> Self {
        Self::with_options(initial, StoreOptions::default(), MemoryStorage::new())
    }
}

impl<S: Storage> Store<S> {
    /// Creates a store over `initial`, recording a copy of it in `storage`
    /// under `options.storage_key`.
    pub fn with_options(initial: Value, options: StoreOptions, mut storage: S) -> Self {
        storage.set_item(&options.storage_key, storage.clone_value(&initial));
        Self {
            tree: initial,
            cache: Cache::with_options(options.cache.clone()),
            storage,
            options,
            next_client_id: 1,
            next_listener_id: 1,
            listeners: BTreeMap::new(),
        }
    }

    /// Issues a new client id.
    pub fn connect(&mut self) -> ClientId {
        let id = self.next_client_id;
        self.next_client_id = self.next_client_id.saturating_add(1);
        format!("client-{id}")
    }

    /// The view of `paths` for `client`; no paths selects the whole tree.
    ///
    /// The view is keyed by normalised paths (`a.0` becomes `a[0]`); use
    /// [`lookup`](crate::cache::lookup) to read it with any spelling.
    pub fn get<P: AsRef<str>>(&mut self, client: &str, paths: &[P]) -> Arc<Snapshot> {
        self.cache.get(&self.tree, client, paths)
    }

    /// Releases everything `client` was observing.
    pub fn disconnect(&mut self, client: &str) {
        self.cache.unlink_client(client);
    }

    /// A copy of the whole tree.
    pub fn state(&self) -> Value {
        self.tree.clone()
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Applies `request` and reports whether the tree changed.
    ///
    /// Listeners receive `request` itself after an effective change. When a
    /// tag argument is invalid the error is returned and listeners are not
    /// called, but views still pick up the changes applied before the
    /// failing tag.
    pub fn set_state(&mut self, request: &Patch) -> Result<bool, StoreError> {
        let mut stats = ChangeStats::default();
        let result = merge_request(&mut self.tree, request, &mut stats);
        if stats.changed {
            self.cache.watch_source(&self.tree, request);
        }
        result?;
        if stats.changed {
            self.emit_change(request);
        }
        Ok(stats.changed)
    }

    /// Restores `paths` to their values in the original tree; no paths
    /// restores the whole tree.
    pub fn reset_state<P: AsRef<str>>(&mut self, paths: &[P]) -> Result<bool, StoreError> {
        let key = &self.options.storage_key;
        let original = self
            .storage
            .get_item(key)
            .ok_or_else(|| StoreError::OriginalMissing { key: key.clone() })?;
        let request = if paths.is_empty() {
            synthesize_reset(&original, &[FULL_STATE_SELECTOR])
        } else {
            synthesize_reset(&original, paths)
        };
        tracing::debug!(paths = paths.len(), "resetting state");
        self.set_state(&request)
    }

    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&Patch) + Send + Sync + 'static,
    {
        let id = self.next_listener_id;
        self.next_listener_id = self.next_listener_id.saturating_add(1);
        self.listeners.insert(id, Box::new(listener));
        id
    }

    pub fn unsubscribe(&mut self, listener_id: ListenerId) -> bool {
        self.listeners.remove(&listener_id).is_some()
    }

    /// Drops listeners, client views and the stored original.
    pub fn close(&mut self) {
        self.listeners.clear();
        self.cache.clear();
        self.storage.remove_item(&self.options.storage_key);
        tracing::debug!("store closed");
    }

    fn emit_change(&mut self, request: &Patch) {
        for listener in self.listeners.values_mut() {
            listener(request);
        }
    }
}
