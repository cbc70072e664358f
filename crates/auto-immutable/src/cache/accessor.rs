//! A composite view over a fixed set of property paths.

use std::collections::HashSet;
use std::sync::Arc;

use super::{AccessorId, AtomTable, Snapshot};

/// The view shared by every client that selected the same paths.
///
/// `outdated` queues paths whose atoms changed since the last refresh. The
/// queue is filled for every accessor alike; each accessor picks out its own
/// paths when it refreshes.
#[derive(Debug, Clone)]
pub struct Accessor {
    id: AccessorId,
    paths: Vec<String>,
    value: Arc<Snapshot>,
    clients: HashSet<String>,
    outdated: Vec<String>,
    lookup_threshold: usize,
}

impl Accessor {
    /// Every declared path starts out outdated so the first refresh fills the
    /// whole view.
    pub fn new(id: AccessorId, paths: Vec<String>, lookup_threshold: usize) -> Self {
        Self {
            id,
            outdated: paths.clone(),
            paths,
            value: Arc::new(Snapshot::new()),
            clients: HashSet::new(),
            lookup_threshold,
        }
    }

    pub fn id(&self) -> AccessorId {
        self.id
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// The current view, without refreshing.
    pub fn value(&self) -> &Arc<Snapshot> {
        &self.value
    }

    pub fn add_client(&mut self, client: &str) {
        if !self.clients.contains(client) {
            self.clients.insert(client.to_string());
        }
    }

    pub fn remove_client(&mut self, client: &str) -> bool {
        self.clients.remove(client)
    }

    pub fn has_client(&self, client: &str) -> bool {
        self.clients.contains(client)
    }

    pub fn num_clients(&self) -> usize {
        self.clients.len()
    }

    /// Queues `paths` for the next refresh.
    pub fn outdate<I>(&mut self, paths: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.outdated.extend(paths);
    }

    pub fn is_outdated(&self) -> bool {
        !self.outdated.is_empty()
    }

    /// Brings the view up to date with `atoms`.
    ///
    /// With nothing queued the current view is returned as is, so callers
    /// can compare consecutive results with [`Arc::ptr_eq`]. Otherwise only
    /// the queued paths this accessor declares are copied over. When a
    /// client still holds the previous view, the refreshed one is a new
    /// allocation.
    pub fn refresh_value(&mut self, atoms: &mut AtomTable) -> Arc<Snapshot> {
        if self.outdated.is_empty() {
            return Arc::clone(&self.value);
        }
        let outdated = std::mem::take(&mut self.outdated);
        let stale: HashSet<&str> = outdated.iter().map(String::as_str).collect();

        // past the threshold, membership goes through a lookup table of the
        // declared paths instead of a scan
        let own: Option<HashSet<&str>> =
            (self.paths.len() > self.lookup_threshold).then(|| self.paths.iter().map(String::as_str).collect());
        let declared = |path: &str| match &own {
            Some(table) => table.contains(path),
            None => self.paths.iter().any(|p| p == path),
        };
        let overlap = stale.iter().filter(|p| declared(p)).count();

        let targets: Vec<&String> = if overlap >= self.paths.len() {
            // every declared path is stale
            self.paths.iter().collect()
        } else {
            dedup(outdated.iter().filter(|p| declared(p)))
        };
        if targets.is_empty() {
            return Arc::clone(&self.value);
        }

        let snapshot = Arc::make_mut(&mut self.value);
        for path in targets {
            if let Some(atom) = atoms.get_mut(path) {
                atom.connect(self.id);
                snapshot.insert(path.clone(), Arc::clone(atom.value()));
            }
        }
        tracing::trace!(accessor = self.id, paths = snapshot.len(), "refreshed accessor");
        Arc::clone(&self.value)
    }
}

fn dedup<'a>(paths: impl Iterator<Item = &'a String>) -> Vec<&'a String> {
    let mut seen = HashSet::new();
    paths.filter(|p| seen.insert(p.as_str())).collect()
}
