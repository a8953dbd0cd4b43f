// Entity Store - authoritative in-memory keyed storage with ID allocation
// One table per entity kind; all access is serialized through per-kind locks

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

use crate::models::{EntityId, Friendship, Message, Notification, Post, User};

/// Keyed storage for a single entity kind.
///
/// IDs are strictly increasing and never reused. Iteration order of `all()`
/// is ascending by ID, which coincides with insertion order; callers impose
/// any further ordering themselves.
#[derive(Debug)]
pub struct EntityTable<T> {
    rows: RwLock<BTreeMap<EntityId, T>>,
    next_id: AtomicI64,
}

impl<T: Clone> EntityTable<T> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Allocate the next ID for this kind. Strictly increasing, never reused.
    pub fn next_id(&self) -> EntityId {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    pub async fn put(&self, id: EntityId, row: T) {
        self.rows.write().await.insert(id, row);
    }

    /// Exact-match lookup. An absent key is "not found", not an error.
    pub async fn get(&self, id: EntityId) -> Option<T> {
        self.rows.read().await.get(&id).cloned()
    }

    /// Complete record set in ascending-ID order.
    pub async fn all(&self) -> Vec<T> {
        self.rows.read().await.values().cloned().collect()
    }

    /// Apply an in-place mutation under the write lock, returning the updated
    /// row, or None if the key is absent.
    pub async fn update<F>(&self, id: EntityId, f: F) -> Option<T>
    where
        F: FnOnce(&mut T),
    {
        let mut rows = self.rows.write().await;
        let row = rows.get_mut(&id)?;
        f(row);
        Some(row.clone())
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }
}

impl<T: Clone> Default for EntityTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// The five entity collections backing the platform. Volatile and
/// process-lifetime-only; there is no persistence behind it.
#[derive(Debug, Default)]
pub struct EntityStore {
    pub users: EntityTable<User>,
    pub posts: EntityTable<Post>,
    pub messages: EntityTable<Message>,
    pub friendships: EntityTable<Friendship>,
    pub notifications: EntityTable<Notification>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }
}
