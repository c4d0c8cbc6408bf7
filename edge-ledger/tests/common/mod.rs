//! Shared fixtures for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use edge_ledger::services::AdminService;
use edge_ledger::session::{Argon2Hasher, CredentialHasher, ExternalIdentity, IdentityProvider};
use edge_ledger::{Ledger, Session, SessionContext};
use shared::error::{AppError, AppResult};
use shared::models::{
    Agent, AgentCreate, Customer, CustomerCreate, Frequency, Product, Sale, SaleCreate,
    SaleCustomer, Village,
};
use std::sync::Arc;
use tempfile::TempDir;

pub const OWNER_UID: &str = "owner-uid-1";
pub const OWNER_EMAIL: &str = "owner@example.com";
pub const OWNER_PASSWORD: &str = "correct horse";
pub const AGENT_PHONE: &str = "9000000001";
pub const AGENT_PIN: &str = "1234";

/// 2024-01-15T00:00:00Z
pub const START: i64 = 1_705_276_800_000;
pub const DAY: i64 = 86_400_000;

/// Identity provider accepting exactly one email/password pair
pub struct StaticIdentity {
    pub uid: String,
    pub email: String,
    pub password: String,
}

impl StaticIdentity {
    pub fn owner() -> Self {
        Self::new(OWNER_UID, OWNER_EMAIL, OWNER_PASSWORD)
    }

    pub fn new(uid: &str, email: &str, password: &str) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> AppResult<ExternalIdentity> {
        if email != self.email || password != self.password {
            return Err(AppError::invalid_credentials());
        }
        Ok(ExternalIdentity {
            uid: self.uid.clone(),
            email: self.email.clone(),
            name: Some("Owner".into()),
            token: Some("test-token".into()),
        })
    }
}

/// One device: a ledger file in its own temp dir
pub struct Device {
    _dir: TempDir,
    pub ledger: Ledger,
    pub context: SessionContext,
}

impl Device {
    pub async fn open() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");
        let ledger = Ledger::open(path.to_str().unwrap()).await.unwrap();
        let context = SessionContext::new(ledger.clone(), Arc::new(Argon2Hasher));
        Self {
            _dir: dir,
            ledger,
            context,
        }
    }

    pub fn hasher(&self) -> Arc<dyn CredentialHasher> {
        self.context.hasher()
    }

    pub async fn login_owner(&mut self) -> Session {
        self.login_owner_as(&StaticIdentity::owner()).await
    }

    pub async fn login_owner_as(&mut self, identity: &StaticIdentity) -> Session {
        self.context
            .login_owner(identity, &identity.email, &identity.password)
            .await
            .unwrap()
    }

    pub fn admin(&self, session: &Session) -> AdminService {
        AdminService::for_session(session, self.hasher()).unwrap()
    }
}

/// Directory and one monthly sale created by the owner
pub struct Seeded {
    pub village: Village,
    pub product: Product,
    pub agent: Agent,
    pub customer: Customer,
    pub sale: Sale,
}

pub fn sale_terms(village_id: i64, customer: SaleCustomer, product_id: i64) -> SaleCreate {
    SaleCreate {
        village_id,
        customer,
        product_id,
        down_payment: 500.0,
        emi_amount: 100.0,
        frequency: Frequency::Monthly,
        total_emis: 3,
        start_date: START,
        assigned_agent_id: None,
    }
}

pub async fn seed(admin: &AdminService) -> Seeded {
    let village = admin.create_village("Rampur").await.unwrap();
    let product = admin.create_product("Sewing machine").await.unwrap();
    let agent = admin
        .create_agent(AgentCreate {
            name: "Suresh".into(),
            phone: AGENT_PHONE.into(),
            pin: AGENT_PIN.into(),
            assigned_villages: vec![village.id],
        })
        .await
        .unwrap();
    let customer = admin
        .create_customer(CustomerCreate {
            village_id: village.id,
            name: "Kamala".into(),
            phone: Some("9111111111".into()),
            address: None,
        })
        .await
        .unwrap();
    let mut terms = sale_terms(
        village.id,
        SaleCustomer::Existing {
            customer_id: customer.id,
        },
        product.id,
    );
    terms.assigned_agent_id = Some(agent.id);
    let (sale, _) = admin.create_sale(terms).await.unwrap();

    Seeded {
        village,
        product,
        agent,
        customer,
        sale,
    }
}
