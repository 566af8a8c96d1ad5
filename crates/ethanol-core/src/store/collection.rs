// ── Generic reactive entity collection ──
//
// Concurrent keyed storage with an id index and push-based change
// notification via `watch` channels. Entities are shared `Arc`s; the
// collection never clones or mutates them.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::watch;

use crate::model::EntityId;

/// A concurrent, observable collection for one entity type.
///
/// Uses `DashMap` for O(1) lookups and `watch` channels for change
/// notification. Every mutation bumps a version counter and rebuilds
/// the snapshot that subscribers receive.
pub(crate) struct EntityCollection<T: Send + Sync + 'static> {
    /// Primary storage: registry key -> entity.
    /// Keys are IP strings for APs, `"{ip}/{intf}"` for stations,
    /// SSIDs for networks.
    by_key: DashMap<String, Arc<T>>,

    /// Secondary index: EntityId -> key string.
    id_to_key: DashMap<EntityId, String>,

    /// Reverse of `id_to_key` for efficient removal.
    key_to_id: DashMap<String, EntityId>,

    /// Version counter, bumped on every mutation.
    version: watch::Sender<u64>,

    /// Full snapshot, rebuilt on mutation.
    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,
}

impl<T: Send + Sync + 'static> EntityCollection<T> {
    pub(crate) fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            by_key: DashMap::new(),
            id_to_key: DashMap::new(),
            key_to_id: DashMap::new(),
            version,
            snapshot,
        }
    }

    /// Insert `entity` under `key` unless the key is taken.
    ///
    /// Returns the entity already stored when the key exists; the check
    /// and the insert happen under one shard lock.
    pub(crate) fn insert_if_absent(
        &self,
        key: String,
        id: EntityId,
        entity: Arc<T>,
    ) -> Result<(), Arc<T>> {
        match self.by_key.entry(key.clone()) {
            Entry::Occupied(existing) => return Err(Arc::clone(existing.get())),
            Entry::Vacant(slot) => {
                slot.insert(entity);
            }
        }
        self.id_to_key.insert(id, key.clone());
        self.key_to_id.insert(key, id);

        self.rebuild_snapshot();
        self.bump_version();
        Ok(())
    }

    /// Remove an entity by key. Returns the removed entity if it existed.
    pub(crate) fn remove(&self, key: &str) -> Option<Arc<T>> {
        let removed = self.by_key.remove(key).map(|(_, v)| v);
        if removed.is_some() {
            if let Some((_, id)) = self.key_to_id.remove(key) {
                // The id may already point at a newer key after a re-key.
                self.id_to_key.remove_if(&id, |_, current| current == key);
            }
            self.rebuild_snapshot();
            self.bump_version();
        }
        removed
    }

    /// Look up an entity by its primary key string.
    pub(crate) fn get_by_key(&self, key: &str) -> Option<Arc<T>> {
        self.by_key.get(key).map(|r| Arc::clone(r.value()))
    }

    /// Look up an entity by its `EntityId` (secondary index).
    pub(crate) fn get_by_id(&self, id: &EntityId) -> Option<Arc<T>> {
        let key = self.id_to_key.get(id)?;
        self.by_key
            .get(key.value().as_str())
            .map(|r| Arc::clone(r.value()))
    }

    pub(crate) fn contains_key(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    /// Get the current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes via a `watch::Receiver`.
    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<T>>>> {
        self.snapshot.subscribe()
    }

    pub(crate) fn version(&self) -> u64 {
        *self.version.borrow()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_key.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// Collect all values into a snapshot vec and broadcast to subscribers.
    fn rebuild_snapshot(&self) {
        let values: Vec<Arc<T>> = self.by_key.iter().map(|r| Arc::clone(r.value())).collect();
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }

    fn bump_version(&self) {
        self.version.send_modify(|v| *v += 1);
    }
}
