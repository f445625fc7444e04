//! In-process [`AssetStore`] with GitHub-like revision semantics.
//!
//! Used by tests and for local experiments: creating an existing path or
//! updating with a stale revision is a [`PublishError::Conflict`], exactly
//! as the contents API behaves.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::{AssetStore, PublishError, Revision};

/// One committed change recorded by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    /// Path that was written.
    pub path: String,
    /// Commit message supplied by the publisher.
    pub message: String,
    /// Revision produced by the write.
    pub revision: Revision,
}

#[derive(Debug)]
struct StoredObject {
    content: Vec<u8>,
    revision: Revision,
}

/// Thread-safe in-memory content store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<String, StoredObject>>,
    history: Mutex<Vec<CommitRecord>>,
    rejected: Mutex<HashSet<String>>,
    next_revision: AtomicU64,
    creates: AtomicUsize,
    updates: AtomicUsize,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every write to `path` fail with HTTP 500.
    pub fn reject_path(&self, path: impl Into<String>) {
        lock(&self.rejected).insert(path.into());
    }

    /// Returns the stored bytes for `path`.
    #[must_use]
    pub fn content(&self, path: &str) -> Option<Vec<u8>> {
        lock(&self.objects).get(path).map(|obj| obj.content.clone())
    }

    /// Returns the current revision of `path`.
    #[must_use]
    pub fn revision(&self, path: &str) -> Option<Revision> {
        lock(&self.objects).get(path).map(|obj| obj.revision.clone())
    }

    /// Returns every stored path, sorted.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = lock(&self.objects).keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.objects).len()
    }

    /// Returns true when nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of successful creates.
    #[must_use]
    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    /// Number of successful updates.
    #[must_use]
    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    /// Returns all commits in the order they were made.
    #[must_use]
    pub fn history(&self) -> Vec<CommitRecord> {
        lock(&self.history).clone()
    }

    fn check_rejected(&self, path: &str) -> Result<(), PublishError> {
        if lock(&self.rejected).contains(path) {
            return Err(PublishError::from_status(path, 500, "rejected by test store"));
        }
        Ok(())
    }

    fn commit(
        &self,
        objects: &mut HashMap<String, StoredObject>,
        path: &str,
        message: &str,
        content: &[u8],
    ) {
        let n = self.next_revision.fetch_add(1, Ordering::SeqCst) + 1;
        let revision = Revision::new(format!("rev-{n}"));
        objects.insert(
            path.to_string(),
            StoredObject {
                content: content.to_vec(),
                revision: revision.clone(),
            },
        );
        lock(&self.history).push(CommitRecord {
            path: path.to_string(),
            message: message.to_string(),
            revision,
        });
    }
}

#[async_trait]
impl AssetStore for MemoryStore {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    async fn lookup(&self, path: &str) -> Result<Option<Revision>, PublishError> {
        Ok(self.revision(path))
    }

    async fn create(&self, path: &str, message: &str, content: &[u8]) -> Result<(), PublishError> {
        self.check_rejected(path)?;
        let mut objects = lock(&self.objects);
        if objects.contains_key(path) {
            return Err(PublishError::conflict(path));
        }
        self.commit(&mut objects, path, message, content);
        self.creates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn update(
        &self,
        path: &str,
        message: &str,
        content: &[u8],
        revision: &Revision,
    ) -> Result<(), PublishError> {
        self.check_rejected(path)?;
        let mut objects = lock(&self.objects);
        match objects.get(path) {
            Some(existing) if existing.revision == *revision => {}
            _ => return Err(PublishError::conflict(path)),
        }
        self.commit(&mut objects, path, message, content);
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
