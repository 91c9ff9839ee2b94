//! Tag-based response cache.
//!
//! Reads register the tags they provide; mutations name the tags they
//! invalidate. An entry is dropped as soon as any of its tags is invalidated.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    User,
    Analytics,
    Level,
    Moderation,
    Leaderboard,
    Profile,
    Question,
    Conversation,
    PointAdjustment,
}

/// Tag
///
/// A resource collection (`id: None`) or one member of it. The collection
/// listing itself is conventionally tagged with id `LIST`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    pub kind: TagKind,
    pub id: Option<String>,
}

impl Tag {
    pub fn of(kind: TagKind) -> Self {
        Self { kind, id: None }
    }

    pub fn with_id(kind: TagKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: Some(id.into()),
        }
    }

    pub fn list(kind: TagKind) -> Self {
        Self::with_id(kind, "LIST")
    }

    /// A bare kind matches every tag of that kind, in either direction.
    fn matches(&self, other: &Tag) -> bool {
        self.kind == other.kind
            && match (&self.id, &other.id) {
                (Some(a), Some(b)) => a == b,
                _ => true,
            }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    tags: Vec<Tag>,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    /// Bumped by every invalidation and clear.
    generation: u64,
}

/// ResourceCache
///
/// Shared between clones; one cache per signed-in session.
///
/// Reads that race a mutation capture [`ResourceCache::generation`] before going
/// upstream and store through [`ResourceCache::insert_if_current`], so a response
/// fetched before an invalidation is never cached after it.
#[derive(Debug, Clone, Default)]
pub struct ResourceCache {
    state: Arc<Mutex<CacheState>>,
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().entries.get(key).map(|entry| entry.value.clone())
    }

    /// Current invalidation generation.
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    pub fn insert(&self, key: String, value: Value, tags: Vec<Tag>) {
        self.lock().entries.insert(key, CacheEntry { value, tags });
    }

    /// Stores the entry only if nothing was invalidated since `generation` was
    /// read. Returns whether it was stored.
    pub fn insert_if_current(
        &self,
        generation: u64,
        key: String,
        value: Value,
        tags: Vec<Tag>,
    ) -> bool {
        let mut state = self.lock();
        if state.generation != generation {
            return false;
        }
        state.entries.insert(key, CacheEntry { value, tags });
        true
    }

    /// Drops every entry providing one of `tags`. Returns how many were dropped.
    pub fn invalidate(&self, tags: &[Tag]) -> usize {
        let mut state = self.lock();
        state.generation = state.generation.wrapping_add(1);
        let before = state.entries.len();
        state.entries.retain(|_, entry| {
            !entry
                .tags
                .iter()
                .any(|provided| tags.iter().any(|tag| tag.matches(provided)))
        });
        before - state.entries.len()
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        state.generation = state.generation.wrapping_add(1);
        state.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
