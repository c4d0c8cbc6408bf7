mod common;

use common::*;
use edge_ledger::services::ReportService;
use edge_ledger::CollectionService;
use shared::error::ErrorCode;
use shared::models::{
    AgentCreate, AgentUpdate, CustomerCreate, CustomerUpdate, SaleCustomer, SaleStatus, SyncStatus,
};

#[tokio::test]
async fn test_customer_numbers_per_village() {
    let mut device = Device::open().await;
    let owner = device.login_owner().await;
    let admin = device.admin(&owner);
    let north = admin.create_village("North").await.unwrap();
    let south = admin.create_village("South").await.unwrap();

    let customer = |village_id: i64, name: &str| CustomerCreate {
        village_id,
        name: name.into(),
        phone: Some("  ".into()),
        address: None,
    };
    let a = admin.create_customer(customer(north.id, "A")).await.unwrap();
    let b = admin.create_customer(customer(north.id, "B")).await.unwrap();
    let c = admin.create_customer(customer(south.id, "C")).await.unwrap();

    assert_eq!((a.customer_number, b.customer_number, c.customer_number), (1, 2, 1));
    assert_eq!(a.phone, None);
    assert_eq!(owner.store().customers_in_village(north.id).await.unwrap().len(), 2);

    let err = admin.create_customer(customer(999, "Nowhere")).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::VillageNotFound);
    let err = admin.create_customer(customer(north.id, " ")).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::RequiredField);
}

#[tokio::test]
async fn test_create_agent_rules() {
    let mut device = Device::open().await;
    let owner = device.login_owner().await;
    let admin = device.admin(&owner);
    let village = admin.create_village("Rampur").await.unwrap();

    let agent = |phone: &str, pin: &str, villages: Vec<i64>| AgentCreate {
        name: "Suresh".into(),
        phone: phone.into(),
        pin: pin.into(),
        assigned_villages: villages,
    };

    let created = admin
        .create_agent(agent(AGENT_PHONE, AGENT_PIN, vec![village.id]))
        .await
        .unwrap();
    assert_ne!(created.pin_hash, AGENT_PIN);
    assert!(created.is_assigned_to(village.id));

    // village agent cache follows the assignment
    let village = owner.store().village(village.id).await.unwrap().unwrap();
    assert_eq!(village.agent_ids, vec![created.id]);

    let err = admin
        .create_agent(agent(AGENT_PHONE, "5678", vec![]))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::AgentPhoneExists);

    let err = admin
        .create_agent(agent("9000000002", "12", vec![]))
        .await
        .unwrap_err();
    assert!(err.is_input_error());

    let err = admin
        .create_agent(agent("9000000003", "4321", vec![404]))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::VillageNotFound);
    assert!(owner.store().agent_by_phone("9000000003").await.unwrap().is_none());
}

#[tokio::test]
async fn test_create_sale_validation() {
    let mut device = Device::open().await;
    let owner = device.login_owner().await;
    let admin = device.admin(&owner);
    let seeded = seed(&admin).await;

    assert_eq!(seeded.sale.status, SaleStatus::Active);
    assert_eq!(seeded.sale.emis_collected, 0);
    assert_eq!(seeded.sale.next_due_date, seeded.sale.start_date);
    assert_eq!(seeded.sale.sync_status, SyncStatus::Pending);

    let existing = SaleCustomer::Existing {
        customer_id: seeded.customer.id,
    };

    let mut terms = sale_terms(seeded.village.id, existing.clone(), 12345);
    let err = admin.create_sale(terms.clone()).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ProductNotFound);

    terms = sale_terms(seeded.village.id, existing.clone(), seeded.product.id);
    terms.emi_amount = 0.0;
    assert_eq!(admin.create_sale(terms).await.unwrap_err().code, ErrorCode::ValidationFailed);

    terms = sale_terms(seeded.village.id, existing.clone(), seeded.product.id);
    terms.total_emis = 0;
    assert_eq!(admin.create_sale(terms).await.unwrap_err().code, ErrorCode::ValidationFailed);

    terms = sale_terms(seeded.village.id, existing.clone(), seeded.product.id);
    terms.assigned_agent_id = Some(1);
    assert_eq!(admin.create_sale(terms).await.unwrap_err().code, ErrorCode::AgentNotFound);

    let other_village = admin.create_village("Other").await.unwrap();
    terms = sale_terms(other_village.id, existing, seeded.product.id);
    assert_eq!(admin.create_sale(terms).await.unwrap_err().code, ErrorCode::ValidationFailed);

    terms = sale_terms(
        seeded.village.id,
        SaleCustomer::Existing { customer_id: 777 },
        seeded.product.id,
    );
    assert_eq!(admin.create_sale(terms).await.unwrap_err().code, ErrorCode::CustomerNotFound);

    // failed attempts leave a single sale
    assert_eq!(owner.store().sales().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_reports() {
    let mut device = Device::open().await;
    let owner = device.login_owner().await;
    let admin = device.admin(&owner);
    let seeded = seed(&admin).await;
    let (second, _) = admin
        .create_sale(sale_terms(
            seeded.village.id,
            SaleCustomer::New {
                name: "Second".into(),
                phone: None,
                address: None,
            },
            seeded.product.id,
        ))
        .await
        .unwrap();

    CollectionService::new(owner.store().clone())
        .collect_at(&seeded.customer, 120.0, &seeded.agent, START)
        .await
        .unwrap();

    let reports = ReportService::new(owner.store().clone());
    let stats = reports.owner_stats().await.unwrap();
    assert_eq!(stats.total_collected, 120.0);
    assert_eq!(stats.active_sales, 2);
    assert_eq!(stats.customers, 2);
    // two sales + one payment
    assert_eq!(stats.pending_sync, 3);
    assert_eq!(reports.pending_count().await.unwrap(), 3);

    // first sale advanced past START, the second is due at START
    let dues = reports.village_dues_at(&seeded.agent, START).await.unwrap();
    assert_eq!(dues.len(), 1);
    assert_eq!(dues[0].village_id, seeded.village.id);
    assert_eq!(dues[0].due_sales, 1);
    assert_eq!(dues[0].due_amount, second.emi_amount);

    let snapshot = reports.export_snapshot().await.unwrap();
    assert_eq!(snapshot.sales.len(), 2);
    assert_eq!(snapshot.payments.len(), 1);
    assert_eq!(snapshot.villages.len(), 1);
    assert_eq!(snapshot.customers.len(), 2);
    assert_eq!(snapshot.products.len(), 1);
    assert_eq!(snapshot.agents.len(), 1);
    assert_eq!(snapshot.record_count(), 8);

    assert_eq!(reports.customers_in_village(seeded.village.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_reassigning_agent_moves_village_cache() {
    let mut device = Device::open().await;
    let owner = device.login_owner().await;
    let seeded = seed(&device.admin(&owner)).await;
    let admin = device.admin(&owner);
    let other = admin.create_village("Sitapur").await.unwrap();

    let moved = admin
        .update_agent(
            seeded.agent.id,
            AgentUpdate {
                name: None,
                assigned_villages: Some(vec![other.id]),
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.name, seeded.agent.name);
    assert_eq!(moved.pin_hash, seeded.agent.pin_hash);
    assert_eq!(moved.assigned_villages, vec![other.id]);

    let left = owner.store().village(seeded.village.id).await.unwrap().unwrap();
    assert!(left.agent_ids.is_empty());
    let joined = owner.store().village(other.id).await.unwrap().unwrap();
    assert_eq!(joined.agent_ids, vec![seeded.agent.id]);

    // rename only: assignment and caches untouched
    let renamed = admin
        .update_agent(
            seeded.agent.id,
            AgentUpdate {
                name: Some(" Ramesh ".into()),
                assigned_villages: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "Ramesh");
    assert_eq!(renamed.assigned_villages, vec![other.id]);

    // unknown village: nothing written
    let err = admin
        .update_agent(
            seeded.agent.id,
            AgentUpdate {
                name: Some("Mahesh".into()),
                assigned_villages: Some(vec![seeded.village.id, 404]),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::VillageNotFound);
    let unchanged = owner.store().agent(seeded.agent.id).await.unwrap().unwrap();
    assert_eq!(unchanged.name, "Ramesh");
    assert_eq!(unchanged.assigned_villages, vec![other.id]);
    let left = owner.store().village(seeded.village.id).await.unwrap().unwrap();
    assert!(left.agent_ids.is_empty());

    let err = admin
        .update_agent(404, AgentUpdate::default())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::AgentNotFound);
}

#[tokio::test]
async fn test_update_customer_is_partial() {
    let mut device = Device::open().await;
    let owner = device.login_owner().await;
    let seeded = seed(&device.admin(&owner)).await;
    let admin = device.admin(&owner);

    let updated = admin
        .update_customer(
            seeded.customer.id,
            CustomerUpdate {
                name: None,
                phone: Some(" ".into()),
                address: Some("Ward 4".into()),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, seeded.customer.name);
    assert_eq!(updated.phone, seeded.customer.phone);
    assert_eq!(updated.address.as_deref(), Some("Ward 4"));
    assert_eq!(updated.customer_number, seeded.customer.customer_number);
    assert_eq!(updated.village_id, seeded.customer.village_id);
    assert_eq!(
        owner.store().customer(seeded.customer.id).await.unwrap(),
        Some(updated)
    );

    let err = admin
        .update_customer(
            seeded.customer.id,
            CustomerUpdate {
                name: Some("  ".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::RequiredField);

    let err = admin
        .update_customer(404, CustomerUpdate::default())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::CustomerNotFound);
}
