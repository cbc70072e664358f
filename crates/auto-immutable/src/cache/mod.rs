//! Reactive snapshot cache.
//!
//! The [`Cache`] keeps one [`Atom`] per tracked property path and one
//! [`Accessor`] per distinct path selection. After every effective mutation
//! the host calls [`Cache::watch_source`]; atoms whose value moved are
//! replaced and all accessors are told which paths went stale. Clients read
//! through [`Cache::get`], which refreshes only what their selection needs.

mod accessor;
mod atom;

pub use accessor::Accessor;
pub use atom::Atom;

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use auto_immutable_path::{format_property_path, parse_property_path, resolve, FULL_STATE_SELECTOR};
use auto_immutable_util::deep_equal;

use crate::options::CacheOptions;
use crate::patch::Patch;

pub type AccessorId = u64;

/// A client's view: declared path, in normalised form, to that path's value.
///
/// Index with the normalised spelling (`a[0]`, not `a.0`) or go through
/// [`lookup`], which accepts any spelling.
pub type Snapshot = IndexMap<String, Arc<Value>>;

/// The value of `path` in `view`, whichever way `path` is spelled.
pub fn lookup<'a>(view: &'a Snapshot, path: &str) -> Option<&'a Arc<Value>> {
    view.get(path)
        .or_else(|| view.get(&format_property_path(&parse_property_path(path))))
}

/// Atoms by normalised path.
pub type AtomTable = HashMap<String, Atom>;

/// Registry of atoms and accessors for one state tree.
///
/// The cache does not own the tree; callers pass it to [`Cache::get`] and
/// [`Cache::watch_source`] and must call the latter after every mutation.
#[derive(Debug, Default)]
pub struct Cache {
    atoms: AtomTable,
    accessors: HashMap<Vec<String>, Accessor>,
    next_accessor_id: AccessorId,
    options: CacheOptions,
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CacheOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// The view of `paths` for `client`.
    ///
    /// No paths selects the whole tree. Paths are normalised and
    /// deduplicated, so `a[0]` and `a.0` select the same atom, and clients
    /// selecting the same paths in the same order share one accessor. The
    /// returned view is keyed by the normalised paths: `view["a.0"]` panics
    /// where `view["a[0]"]` or [`lookup`] succeed.
    ///
    /// # Example
    ///
    /// ```
    /// use auto_immutable::cache::Cache;
    /// use serde_json::json;
    /// use std::sync::Arc;
    ///
    /// let tree = json!({"a": {"b": 1}, "c": [1, 2]});
    /// let mut cache = Cache::new();
    /// let view = cache.get(&tree, "client-1", &["a.b", "c[-1]"]);
    /// assert_eq!(*view["a.b"], json!(1));
    /// assert_eq!(*view["c[-1]"], json!(2));
    /// assert!(Arc::ptr_eq(&view, &cache.get(&tree, "client-1", &["a.b", "c[-1]"])));
    /// ```
    pub fn get<S: AsRef<str>>(&mut self, tree: &Value, client: &str, paths: &[S]) -> Arc<Snapshot> {
        let key = canonical_paths(paths);
        if !self.accessors.contains_key(&key) {
            for path in &key {
                if !self.atoms.contains_key(path) {
                    let reference = resolve(&parse_property_path(path), tree);
                    self.atoms
                        .insert(path.clone(), Atom::new(reference.value_or_null(), reference.exists));
                }
            }
            self.next_accessor_id += 1;
            let accessor = Accessor::new(self.next_accessor_id, key.clone(), self.options.lookup_threshold);
            tracing::debug!(accessor = accessor.id(), paths = ?key, "created accessor");
            self.accessors.insert(key.clone(), accessor);
        }
        match self.accessors.get_mut(&key) {
            Some(accessor) => {
                accessor.add_client(client);
                accessor.refresh_value(&mut self.atoms)
            }
            None => Arc::new(Snapshot::new()),
        }
    }

    /// Detaches `client` from every accessor. Accessors left without clients
    /// are dropped together with the atoms only they were using.
    pub fn unlink_client(&mut self, client: &str) {
        let mut orphaned = Vec::new();
        for (key, accessor) in self.accessors.iter_mut() {
            if accessor.remove_client(client) && accessor.num_clients() == 0 {
                orphaned.push(key.clone());
            }
        }
        for key in orphaned {
            let Some(accessor) = self.accessors.remove(&key) else {
                continue;
            };
            for path in accessor.paths() {
                let remaining = match self.atoms.get_mut(path) {
                    Some(atom) => atom.disconnect(accessor.id()),
                    None => continue,
                };
                if remaining == 0 {
                    self.atoms.remove(path);
                    tracing::trace!(path = %path, "evicted atom");
                }
            }
            tracing::debug!(accessor = accessor.id(), "evicted accessor");
        }
    }

    /// Reconciles atoms with the tree after `request` was applied to it.
    ///
    /// Atoms whose value differs are replaced and their paths are queued on
    /// every accessor. A path that stopped resolving is left alone when
    /// `request` does not reach it, since that only means a sibling
    /// restructured the tree around it.
    pub fn watch_source(&mut self, tree: &Value, request: &Patch) {
        let mut updated = Vec::new();
        for (path, atom) in self.atoms.iter_mut() {
            let parsed = parse_property_path(path);
            let reference = resolve(&parsed, tree);
            if !reference.exists && atom.exists() && !request.touches(&parsed, tree) {
                continue;
            }
            let value = reference.value_or_null();
            if reference.exists == atom.exists() && deep_equal(atom.value(), &value) {
                continue;
            }
            atom.set_value(value, reference.exists);
            updated.push(path.clone());
        }
        if updated.is_empty() {
            return;
        }
        tracing::debug!(paths = ?updated, accessors = self.accessors.len(), "atoms updated");
        for accessor in self.accessors.values_mut() {
            accessor.outdate(updated.iter().cloned());
        }
    }

    pub fn num_atoms(&self) -> usize {
        self.atoms.len()
    }

    pub fn num_accessors(&self) -> usize {
        self.accessors.len()
    }

    /// `true` when an atom tracks `path` (in any of its spellings).
    pub fn has_atom(&self, path: &str) -> bool {
        self.atoms.contains_key(&format_property_path(&parse_property_path(path)))
    }

    /// Drops every accessor and atom.
    pub fn clear(&mut self) {
        self.accessors.clear();
        self.atoms.clear();
    }
}

/// Normalised, order-preserving, duplicate-free path list. Empty input
/// selects the whole tree.
fn canonical_paths<S: AsRef<str>>(paths: &[S]) -> Vec<String> {
    if paths.is_empty() {
        return vec![FULL_STATE_SELECTOR.to_string()];
    }
    let mut out: Vec<String> = Vec::with_capacity(paths.len());
    for path in paths {
        let path = format_property_path(&parse_property_path(path.as_ref()));
        if !out.contains(&path) {
            out.push(path);
        }
    }
    out
}
