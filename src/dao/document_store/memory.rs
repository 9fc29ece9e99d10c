//! Process-local document store used for local runs and tests.

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use dashmap::DashMap;
use futures::future::BoxFuture;
use serde_json::{Map, Value};

use super::{Collection, Document, DocumentStore, Query};
use crate::dao::storage::{Degraded, StorageError, StorageResult};

/// Document store keeping every document in memory.
///
/// Clones share the same underlying data.
#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    documents: DashMap<(Collection, String), Document>,
    offline: AtomicBool,
    reads: AtomicUsize,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document, replacing any previous one with the same id.
    pub fn seed(&self, collection: Collection, document: Document) {
        self.inner
            .documents
            .insert((collection, document.id.clone()), document);
    }

    /// Simulate an outage: while offline every call fails with `Unavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of `get` and `query` calls served so far, including failed ones.
    pub fn read_count(&self) -> usize {
        self.inner.reads.load(Ordering::SeqCst)
    }

    fn ensure_online(&self) -> StorageResult<()> {
        if self.inner.offline.load(Ordering::SeqCst) {
            Err(StorageError::unavailable(
                "memory store offline",
                Degraded("offline"),
            ))
        } else {
            Ok(())
        }
    }

    fn get_now(&self, collection: Collection, id: &str) -> StorageResult<Document> {
        self.inner.reads.fetch_add(1, Ordering::SeqCst);
        self.ensure_online()?;
        self.inner
            .documents
            .get(&(collection, id.to_owned()))
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StorageError::not_found(collection, id))
    }

    fn query_now(&self, collection: Collection, query: &Query) -> StorageResult<Vec<Document>> {
        self.inner.reads.fetch_add(1, Ordering::SeqCst);
        self.ensure_online()?;
        let documents: Vec<Document> = self
            .inner
            .documents
            .iter()
            .filter(|entry| entry.key().0 == collection)
            .map(|entry| entry.value().clone())
            .collect();
        Ok(query.apply(documents))
    }

    fn update_now(
        &self,
        collection: Collection,
        id: &str,
        partial: Map<String, Value>,
    ) -> StorageResult<()> {
        self.ensure_online()?;
        let mut entry = self
            .inner
            .documents
            .get_mut(&(collection, id.to_owned()))
            .ok_or_else(|| StorageError::not_found(collection, id))?;
        entry.merge(partial);
        Ok(())
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn get(&self, collection: Collection, id: &str) -> BoxFuture<'static, StorageResult<Document>> {
        let result = self.get_now(collection, id);
        Box::pin(async move { result })
    }

    fn query(
        &self,
        collection: Collection,
        query: Query,
    ) -> BoxFuture<'static, StorageResult<Vec<Document>>> {
        let result = self.query_now(collection, &query);
        Box::pin(async move { result })
    }

    fn update(
        &self,
        collection: Collection,
        id: &str,
        partial: Map<String, Value>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let result = self.update_now(collection, id, partial);
        Box::pin(async move { result })
    }

    fn insert(
        &self,
        collection: Collection,
        document: Document,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let result = self.ensure_online().map(|()| self.seed(collection, document));
        Box::pin(async move { result })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let result = self.ensure_online();
        Box::pin(async move { result })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.health_check()
    }
}
