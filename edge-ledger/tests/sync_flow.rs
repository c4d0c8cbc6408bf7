mod common;

use common::*;
use async_trait::async_trait;
use edge_ledger::cloud_sync::{MemoryRemoteStore, RemoteError, RemoteStore};
use edge_ledger::{CollectionService, SyncEngine, SyncWorker};
use serde_json::json;
use shared::cloud::{Collection, RemoteDocument};
use shared::models::{Agent, Customer, SaleStatus, SyncStatus};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn engine_with(remote: &Arc<MemoryRemoteStore>) -> SyncEngine {
    SyncEngine::new(remote.clone())
}

#[tokio::test]
async fn test_push_then_pull_is_identity() {
    let mut device = Device::open().await;
    let owner = device.login_owner().await;
    let seeded = seed(&device.admin(&owner)).await;
    CollectionService::new(owner.store().clone())
        .collect_at(&seeded.customer, 100.0, &seeded.agent, START)
        .await
        .unwrap();

    let mut expected = owner.store().snapshot().await.unwrap();
    for sale in &mut expected.sales {
        sale.sync_status = SyncStatus::Synced;
    }
    for payment in &mut expected.payments {
        payment.sync_status = SyncStatus::Synced;
    }

    let remote = Arc::new(MemoryRemoteStore::new());
    let report = engine_with(&remote).sync(&owner).await.unwrap();
    assert!(report.is_clean());
    assert_eq!(report.push.pushed, 2);
    assert_eq!(report.publish.as_ref().map(|p| p.pushed), Some(4));

    let after = owner.store().snapshot().await.unwrap();
    assert_eq!(after.sales, expected.sales);
    assert_eq!(after.payments, expected.payments);
    assert_eq!(after.villages, expected.villages);
    assert_eq!(after.customers, expected.customers);
    assert_eq!(after.products, expected.products);
    assert_eq!(after.agents, expected.agents);
    assert_eq!(owner.store().pending_count().await.unwrap(), 0);

    // remote layout: no local id or sync flag, timestamps as {seconds, nanos}
    let doc = remote
        .document(OWNER_UID, Collection::Sales, &seeded.sale.id.to_string())
        .unwrap();
    assert!(!doc.contains_key("id"));
    assert!(!doc.contains_key("syncStatus"));
    assert_eq!(doc["startDate"], json!({ "seconds": START / 1000, "nanos": 0 }));
    assert_eq!(doc["totalEMIs"], json!(3));
}

#[tokio::test]
async fn test_second_push_writes_nothing() {
    let mut device = Device::open().await;
    let owner = device.login_owner().await;
    seed(&device.admin(&owner)).await;

    let remote = Arc::new(MemoryRemoteStore::new());
    let engine = engine_with(&remote);
    let first = engine.push_local(owner.store()).await.unwrap();
    assert_eq!(first.pushed, 1);

    remote.reset_write_count();
    let second = engine.push_local(owner.store()).await.unwrap();
    assert_eq!(second.pushed, 0);
    assert_eq!(remote.write_count(), 0);
}

#[tokio::test]
async fn test_push_failure_is_isolated_per_record() {
    let mut device = Device::open().await;
    let owner = device.login_owner().await;
    let seeded = seed(&device.admin(&owner)).await;
    let collection = CollectionService::new(owner.store().clone());
    let first = collection
        .collect_at(&seeded.customer, 100.0, &seeded.agent, START)
        .await
        .unwrap();
    let second = collection
        .collect_at(&seeded.customer, 100.0, &seeded.agent, START + 31 * DAY)
        .await
        .unwrap();

    let remote = Arc::new(MemoryRemoteStore::new());
    remote.fail_writes_for(first.payment.id.to_string());
    let report = engine_with(&remote).push_local(owner.store()).await.unwrap();

    assert_eq!(report.pushed, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].collection, Collection::Payments);
    assert_eq!(report.failures[0].id, first.payment.id.to_string());

    let failed = owner.store().payment(first.payment.id).await.unwrap().unwrap();
    assert_eq!(failed.sync_status, SyncStatus::Pending);
    let pushed = owner.store().payment(second.payment.id).await.unwrap().unwrap();
    assert_eq!(pushed.sync_status, SyncStatus::Synced);
    let sale = owner.store().sale(seeded.sale.id).await.unwrap().unwrap();
    assert_eq!(sale.sync_status, SyncStatus::Synced);

    // retried on the next pass
    remote.clear_failures();
    let retry = engine_with(&remote).push_local(owner.store()).await.unwrap();
    assert_eq!(retry.pushed, 1);
    assert_eq!(owner.store().pending_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_unreachable_remote_keeps_records_pending() {
    let mut device = Device::open().await;
    let owner = device.login_owner().await;
    seed(&device.admin(&owner)).await;

    let remote = Arc::new(MemoryRemoteStore::new());
    remote.set_reachable(false);
    let report = engine_with(&remote).sync(&owner).await.unwrap();
    assert!(!report.is_clean());
    assert_eq!(report.push.pushed, 0);
    assert_eq!(report.pull.failed_collections.len(), Collection::ALL.len());
    assert_eq!(owner.store().pending_count().await.unwrap(), 1);
    assert!(report.into_result().is_err());
}

#[tokio::test]
async fn test_pull_fetch_failure_skips_only_that_collection() {
    let mut owner_device = Device::open().await;
    let owner = owner_device.login_owner().await;
    let seeded = seed(&owner_device.admin(&owner)).await;
    CollectionService::new(owner.store().clone())
        .collect_at(&seeded.customer, 100.0, &seeded.agent, START)
        .await
        .unwrap();

    let remote = Arc::new(MemoryRemoteStore::new());
    engine_with(&remote).sync(&owner).await.unwrap();

    let fresh = Device::open().await;
    let store = fresh.ledger.scoped(OWNER_UID);
    remote.fail_fetches_for(Collection::Payments);
    let report = engine_with(&remote).pull_remote(&store).await;

    assert_eq!(report.failed_collections.len(), 1);
    assert_eq!(report.failed_collections[0].0, Collection::Payments);
    assert_eq!(store.count_payments().await.unwrap(), 0);
    assert_eq!(store.sales().await.unwrap().len(), 1);
    assert_eq!(store.customers().await.unwrap().len(), 1);
    assert_eq!(store.agents().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_pull_skips_undecodable_documents() {
    let fresh = Device::open().await;
    let store = fresh.ledger.scoped(OWNER_UID);
    let remote = Arc::new(MemoryRemoteStore::new());

    let mut fields = serde_json::Map::new();
    fields.insert("name".into(), json!("Sitapur"));
    fields.insert("agentIds".into(), json!([]));
    fields.insert("createdAt".into(), json!({ "seconds": 1_700_000_000, "nanos": 0 }));
    remote.insert_raw(OWNER_UID, Collection::Villages, RemoteDocument::new("42", fields.clone()));
    remote.insert_raw(OWNER_UID, Collection::Villages, RemoteDocument::new("not-a-number", fields));

    let report = engine_with(&remote).pull_remote(&store).await;
    assert_eq!(report.applied, 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].id, "not-a-number");

    let village = store.village(42).await.unwrap().unwrap();
    assert_eq!(village.name, "Sitapur");
    assert_eq!(village.owner_id, OWNER_UID);
    assert_eq!(village.created_at, 1_700_000_000_000);
}

#[tokio::test]
async fn test_agent_device_round_trip() {
    // owner device authors the directory and publishes it
    let mut owner_device = Device::open().await;
    let owner = owner_device.login_owner().await;
    let seeded = seed(&owner_device.admin(&owner)).await;
    let remote = Arc::new(MemoryRemoteStore::new());
    engine_with(&remote).sync(&owner).await.unwrap();

    // agent device imports, logs in and collects offline
    let mut agent_device = Device::open().await;
    engine_with(&remote)
        .pull_remote(&agent_device.ledger.scoped(OWNER_UID))
        .await;
    let login = agent_device
        .context
        .login_agent(AGENT_PHONE, AGENT_PIN)
        .await
        .unwrap();
    assert!(!login.needs_import);
    let agent_session = login.session;
    let agent = agent_session.require_agent().unwrap().clone();
    let collection = CollectionService::new(agent_session.store().clone());
    let customer = collection
        .lookup_customer(seeded.village.id, seeded.customer.customer_number)
        .await
        .unwrap();
    let receipt = collection.collect_at(&customer, 100.0, &agent, START).await.unwrap();

    // agent pass: push then pull, no directory publish
    let report = engine_with(&remote).sync(&agent_session).await.unwrap();
    assert!(report.publish.is_none());
    assert_eq!(report.push.pushed, 2);

    // owner sees the collection after its next pass
    engine_with(&remote).sync(&owner).await.unwrap();
    let payment = owner.store().payment(receipt.payment.id).await.unwrap().unwrap();
    assert_eq!(payment.amount, 100.0);
    assert_eq!(payment.sync_status, SyncStatus::Synced);
    let sale = owner.store().sale(seeded.sale.id).await.unwrap().unwrap();
    assert_eq!(sale.emis_collected, 1);
    assert_eq!(sale.status, SaleStatus::Active);
}

#[tokio::test]
async fn test_worker_runs_only_with_pending_and_reachable_remote() {
    let mut device = Device::open().await;
    let owner = device.login_owner().await;
    seed(&device.admin(&owner)).await;

    let remote = Arc::new(MemoryRemoteStore::new());
    let worker = SyncWorker::new(
        engine_with(&remote),
        owner.clone(),
        Duration::from_secs(60),
        CancellationToken::new(),
    )
    .with_retry_delay(Duration::from_millis(1));

    remote.set_reachable(false);
    assert!(worker.run_once(false).await.unwrap().is_none());
    assert_eq!(owner.store().pending_count().await.unwrap(), 1);

    remote.set_reachable(true);
    let report = worker.run_once(false).await.unwrap().unwrap();
    assert_eq!(report.push.pushed, 1);
    assert_eq!(owner.store().pending_count().await.unwrap(), 0);

    // nothing pending: skipped unless forced
    assert!(worker.run_once(false).await.unwrap().is_none());
    assert!(worker.run_once(true).await.unwrap().is_some());
}

#[tokio::test]
async fn test_worker_gives_up_after_retries() {
    let mut device = Device::open().await;
    let owner = device.login_owner().await;
    let seeded = seed(&device.admin(&owner)).await;

    let remote = Arc::new(MemoryRemoteStore::new());
    remote.fail_writes_for(seeded.sale.id.to_string());
    let worker = SyncWorker::new(
        engine_with(&remote),
        owner.clone(),
        Duration::from_secs(60),
        CancellationToken::new(),
    )
    .with_retry_delay(Duration::from_millis(1));

    let err = worker.run_once(false).await.unwrap_err();
    assert_eq!(err.code, shared::error::ErrorCode::SyncFailed);
    assert_eq!(owner.store().pending_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_worker_stops_on_cancel() {
    let mut device = Device::open().await;
    let owner = device.login_owner().await;
    let remote = Arc::new(MemoryRemoteStore::new());
    let shutdown = CancellationToken::new();
    let worker = SyncWorker::new(
        engine_with(&remote),
        owner,
        Duration::from_secs(3600),
        shutdown.clone(),
    );
    let trigger = worker.trigger();
    let handle = tokio::spawn(worker.run());

    trigger.sync_now();
    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
}

/// Remote that records one more collection while the first sale write is in flight
struct CollectDuringWrite {
    inner: Arc<MemoryRemoteStore>,
    pending: Mutex<Option<(CollectionService, Customer, Agent)>>,
}

#[async_trait]
impl RemoteStore for CollectDuringWrite {
    async fn set_document(
        &self,
        owner_id: &str,
        collection: Collection,
        document: &RemoteDocument,
    ) -> Result<(), RemoteError> {
        self.inner.set_document(owner_id, collection, document).await?;
        if collection == Collection::Sales {
            let next = self.pending.lock().unwrap().take();
            if let Some((service, customer, agent)) = next {
                service
                    .collect_at(&customer, 100.0, &agent, START + 31 * DAY)
                    .await
                    .unwrap();
            }
        }
        Ok(())
    }

    async fn list_documents(
        &self,
        owner_id: &str,
        collection: Collection,
    ) -> Result<Vec<RemoteDocument>, RemoteError> {
        self.inner.list_documents(owner_id, collection).await
    }

    async fn ping(&self) -> bool {
        self.inner.ping().await
    }
}

#[tokio::test]
async fn test_sale_advanced_during_push_stays_pending() {
    let mut device = Device::open().await;
    let owner = device.login_owner().await;
    let seeded = seed(&device.admin(&owner)).await;
    let collection = CollectionService::new(owner.store().clone());
    collection
        .collect_at(&seeded.customer, 100.0, &seeded.agent, START)
        .await
        .unwrap();

    let memory = Arc::new(MemoryRemoteStore::new());
    let racing = Arc::new(CollectDuringWrite {
        inner: memory.clone(),
        pending: Mutex::new(Some((collection, seeded.customer.clone(), seeded.agent.clone()))),
    });
    SyncEngine::new(racing).push_local(owner.store()).await.unwrap();

    // the pushed snapshot had one installment; the local row has two
    let sale = owner.store().sale(seeded.sale.id).await.unwrap().unwrap();
    assert_eq!(sale.emis_collected, 2);
    assert_eq!(sale.sync_status, SyncStatus::Pending);
    let doc = memory
        .document(OWNER_UID, Collection::Sales, &seeded.sale.id.to_string())
        .unwrap();
    assert_eq!(doc["emisCollected"], json!(1));

    // the next pass pushes the newer state and pull keeps it
    let report = engine_with(&memory).sync(&owner).await.unwrap();
    assert!(report.is_clean());
    let sale = owner.store().sale(seeded.sale.id).await.unwrap().unwrap();
    let payments = owner.store().count_payments().await.unwrap();
    assert_eq!(sale.emis_collected, 2);
    assert_eq!(payments, 2);
    assert_eq!(sale.sync_status, SyncStatus::Synced);
    assert_eq!(owner.store().pending_count().await.unwrap(), 0);
}
