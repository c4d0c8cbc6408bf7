//! Sync Engine
//!
//! Reconciles one owner partition between the local Ledger Store and the
//! remote store. A pass is strictly sequential: push, then (owner only)
//! directory publish, then pull.
//!
//! - push: pending sales/payments are written to the remote store one by
//!   one and flipped to `synced` after each confirmed write. A failed record
//!   stays pending and does not stop the others.
//! - pull: every remote document of the six collections overwrites the
//!   local record with the same id (last remote write wins). A failed fetch
//!   skips that collection only.
//!
//! No scheduling or retry happens here; see [`super::SyncWorker`].

use serde::Serialize;
use shared::cloud::{Collection, RemoteDocument};
use shared::error::{AppError, AppResult};
use shared::models::{Agent, Customer, Payment, Product, Sale, Village};
use std::sync::Arc;

use super::codec;
use super::remote::RemoteStore;
use crate::ledger::LedgerStore;
use crate::session::Session;

/// One record that could not be pushed or applied
#[derive(Debug, Clone, PartialEq)]
pub struct RecordFailure {
    pub collection: Collection,
    pub id: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PushReport {
    /// Remote writes confirmed (and flipped locally for ledger kinds)
    pub pushed: usize,
    pub failures: Vec<RecordFailure>,
}

impl PushReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PullReport {
    /// Documents upserted into the local store
    pub applied: usize,
    /// Documents that could not be decoded or stored
    pub skipped: Vec<RecordFailure>,
    /// Collections whose fetch failed (nothing applied for them)
    pub failed_collections: Vec<(Collection, String)>,
}

impl PullReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.failed_collections.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    pub push: PushReport,
    /// Present for owner passes
    pub publish: Option<PushReport>,
    pub pull: PullReport,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.push.is_clean()
            && self.publish.as_ref().is_none_or(PushReport::is_clean)
            && self.pull.is_clean()
    }

    /// Whole-pass error for callers that retry on any failure
    pub fn into_result(self) -> AppResult<Self> {
        if self.is_clean() {
            return Ok(self);
        }
        let failed = self.push.failures.len()
            + self.publish.as_ref().map_or(0, |p| p.failures.len())
            + self.pull.skipped.len();
        Err(AppError::sync_failed(format!(
            "Sync incomplete: {failed} record(s) failed, {} collection fetch(es) failed",
            self.pull.failed_collections.len()
        )))
    }
}

#[derive(Clone)]
pub struct SyncEngine {
    remote: Arc<dyn RemoteStore>,
}

impl SyncEngine {
    pub fn new(remote: Arc<dyn RemoteStore>) -> Self {
        Self { remote }
    }

    pub fn remote(&self) -> &Arc<dyn RemoteStore> {
        &self.remote
    }

    /// Push every pending sale and payment of the store's partition
    ///
    /// Errors only when the local pending sets cannot be read.
    pub async fn push_local(&self, store: &LedgerStore) -> AppResult<PushReport> {
        let mut report = PushReport::default();

        for sale in store.pending_sales().await? {
            let outcome = match self.write(store, Collection::Sales, sale.id, &sale).await {
                Ok(()) => store.mark_sale_synced(&sale).await.map(|flipped| {
                    if !flipped {
                        // advanced while the write was in flight; next pass pushes the new state
                        tracing::debug!(
                            owner_id = %store.owner_id(),
                            sale_id = sale.id,
                            "Sale changed during push, left pending"
                        );
                    }
                }),
                Err(e) => Err(e),
            };
            record_push(&mut report, Collection::Sales, sale.id, outcome);
        }

        for payment in store.pending_payments().await? {
            let outcome = match self
                .write(store, Collection::Payments, payment.id, &payment)
                .await
            {
                Ok(()) => store.mark_payment_synced(payment.id).await.map(|_| ()),
                Err(e) => Err(e),
            };
            record_push(&mut report, Collection::Payments, payment.id, outcome);
        }

        tracing::info!(
            owner_id = %store.owner_id(),
            pushed = report.pushed,
            failed = report.failures.len(),
            "Push complete"
        );
        Ok(report)
    }

    /// Upsert every village, customer, product and agent to the remote store
    pub async fn publish_directory(&self, store: &LedgerStore) -> AppResult<PushReport> {
        let mut report = PushReport::default();

        for village in store.villages().await? {
            let outcome = self.write(store, Collection::Villages, village.id, &village).await;
            record_push(&mut report, Collection::Villages, village.id, outcome);
        }
        for customer in store.customers().await? {
            let outcome = self.write(store, Collection::Customers, customer.id, &customer).await;
            record_push(&mut report, Collection::Customers, customer.id, outcome);
        }
        for product in store.products().await? {
            let outcome = self.write(store, Collection::Products, product.id, &product).await;
            record_push(&mut report, Collection::Products, product.id, outcome);
        }
        for agent in store.agents().await? {
            let outcome = self.write(store, Collection::Agents, agent.id, &agent).await;
            record_push(&mut report, Collection::Agents, agent.id, outcome);
        }

        tracing::info!(
            owner_id = %store.owner_id(),
            published = report.pushed,
            failed = report.failures.len(),
            "Directory publish complete"
        );
        Ok(report)
    }

    /// Overwrite local records with the full remote snapshot
    pub async fn pull_remote(&self, store: &LedgerStore) -> PullReport {
        let mut report = PullReport::default();

        for collection in Collection::ALL {
            let documents = match self.remote.list_documents(store.owner_id(), collection).await {
                Ok(documents) => documents,
                Err(e) => {
                    tracing::warn!(
                        owner_id = %store.owner_id(),
                        collection = %collection,
                        error = %e,
                        "Remote fetch failed, skipping collection"
                    );
                    report.failed_collections.push((collection, e.to_string()));
                    continue;
                }
            };

            let mut applied = 0;
            for document in &documents {
                match apply_document(store, collection, document).await {
                    Ok(()) => applied += 1,
                    Err(e) => {
                        tracing::warn!(
                            owner_id = %store.owner_id(),
                            collection = %collection,
                            doc_id = %document.id,
                            error = %e,
                            "Skipping remote document"
                        );
                        report.skipped.push(RecordFailure {
                            collection,
                            id: document.id.clone(),
                            error: e.to_string(),
                        });
                    }
                }
            }
            tracing::debug!(
                owner_id = %store.owner_id(),
                collection = %collection,
                fetched = documents.len(),
                applied,
                "Pulled collection"
            );
            report.applied += applied;
        }

        tracing::info!(
            owner_id = %store.owner_id(),
            applied = report.applied,
            skipped = report.skipped.len(),
            failed_collections = report.failed_collections.len(),
            "Pull complete"
        );
        report
    }

    /// Full pass for a session: owners also publish their directory
    pub async fn sync(&self, session: &Session) -> AppResult<SyncReport> {
        let store = session.store();
        let push = self.push_local(store).await?;
        let publish = if session.is_owner() {
            Some(self.publish_directory(store).await?)
        } else {
            None
        };
        let pull = self.pull_remote(store).await;
        Ok(SyncReport {
            push,
            publish,
            pull,
        })
    }

    async fn write<T: Serialize>(
        &self,
        store: &LedgerStore,
        collection: Collection,
        id: i64,
        record: &T,
    ) -> AppResult<()> {
        let document = codec::encode(collection, id, record)?;
        self.remote
            .set_document(store.owner_id(), collection, &document)
            .await?;
        Ok(())
    }
}

fn record_push(report: &mut PushReport, collection: Collection, id: i64, outcome: AppResult<()>) {
    match outcome {
        Ok(()) => report.pushed += 1,
        Err(e) => {
            tracing::warn!(
                collection = %collection,
                doc_id = id,
                error = %e,
                "Failed to push record, leaving it pending"
            );
            report.failures.push(RecordFailure {
                collection,
                id: id.to_string(),
                error: e.to_string(),
            });
        }
    }
}

async fn apply_document(
    store: &LedgerStore,
    collection: Collection,
    document: &RemoteDocument,
) -> AppResult<()> {
    let owner_id = store.owner_id();
    match collection {
        Collection::Sales => {
            let record: Sale = codec::decode(collection, owner_id, document)?;
            store.put_sale(&record).await
        }
        Collection::Payments => {
            let record: Payment = codec::decode(collection, owner_id, document)?;
            store.put_payment(&record).await
        }
        Collection::Villages => {
            let record: Village = codec::decode(collection, owner_id, document)?;
            store.put_village(&record).await
        }
        Collection::Customers => {
            let record: Customer = codec::decode(collection, owner_id, document)?;
            store.put_customer(&record).await
        }
        Collection::Products => {
            let record: Product = codec::decode(collection, owner_id, document)?;
            store.put_product(&record).await
        }
        Collection::Agents => {
            let record: Agent = codec::decode(collection, owner_id, document)?;
            store.put_agent(&record).await
        }
    }
}
