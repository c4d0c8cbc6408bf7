//! In-process remote store (tests and offline demos)

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use serde_json::{Map, Value};
use shared::cloud::{Collection, RemoteDocument};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::remote::{RemoteError, RemoteStore};

type Partition = (String, Collection);

/// Remote store kept in memory
///
/// Counts successful writes and can be told to fail writes of given
/// document ids, fetches of given collections, or to go unreachable.
pub struct MemoryRemoteStore {
    documents: DashMap<Partition, BTreeMap<String, Map<String, Value>>>,
    writes: AtomicUsize,
    failing_documents: DashSet<String>,
    failing_collections: DashSet<Collection>,
    reachable: AtomicBool,
}

impl Default for MemoryRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self {
            documents: DashMap::new(),
            writes: AtomicUsize::new(0),
            failing_documents: DashSet::new(),
            failing_collections: DashSet::new(),
            reachable: AtomicBool::new(true),
        }
    }

    /// Successful `set_document` calls so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn reset_write_count(&self) {
        self.writes.store(0, Ordering::SeqCst);
    }

    pub fn fail_writes_for(&self, document_id: impl Into<String>) {
        self.failing_documents.insert(document_id.into());
    }

    pub fn fail_fetches_for(&self, collection: Collection) {
        self.failing_collections.insert(collection);
    }

    pub fn clear_failures(&self) {
        self.failing_documents.clear();
        self.failing_collections.clear();
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn document(&self, owner_id: &str, collection: Collection, id: &str) -> Option<Map<String, Value>> {
        self.documents
            .get(&(owner_id.to_string(), collection))
            .and_then(|docs| docs.get(id).cloned())
    }

    pub fn len(&self, owner_id: &str, collection: Collection) -> usize {
        self.documents
            .get(&(owner_id.to_string(), collection))
            .map(|docs| docs.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.documents.iter().all(|entry| entry.value().is_empty())
    }

    /// Write a document as another device would (not counted)
    pub fn insert_raw(&self, owner_id: &str, collection: Collection, document: RemoteDocument) {
        self.documents
            .entry((owner_id.to_string(), collection))
            .or_default()
            .insert(document.id, document.fields);
    }

    fn ensure_reachable(&self) -> Result<(), RemoteError> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RemoteError::Unavailable("memory store offline".into()))
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn set_document(
        &self,
        owner_id: &str,
        collection: Collection,
        document: &RemoteDocument,
    ) -> Result<(), RemoteError> {
        self.ensure_reachable()?;
        if self.failing_documents.contains(&document.id) {
            return Err(RemoteError::Rejected {
                status: 500,
                message: format!("injected write failure for {}", document.id),
            });
        }
        self.insert_raw(owner_id, collection, document.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn list_documents(
        &self,
        owner_id: &str,
        collection: Collection,
    ) -> Result<Vec<RemoteDocument>, RemoteError> {
        self.ensure_reachable()?;
        if self.failing_collections.contains(&collection) {
            return Err(RemoteError::Unavailable(format!(
                "injected fetch failure for {collection}"
            )));
        }
        Ok(self
            .documents
            .get(&(owner_id.to_string(), collection))
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| RemoteDocument::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn ping(&self) -> bool {
        self.reachable.load(Ordering::SeqCst)
    }
}
