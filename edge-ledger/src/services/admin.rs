//! Owner administration
//!
//! Write path for the records an owner authors on the device: villages,
//! products, agents, customers and sales. Every operation validates its
//! input before touching the store.

use std::sync::Arc;

use crate::ledger::LedgerStore;
use crate::session::{CredentialHasher, Session, validate_pin};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{
    Agent, AgentCreate, AgentUpdate, Customer, CustomerCreate, CustomerUpdate, Product,
    ProductCreate, Sale, SaleCreate, SaleCustomer, Village, VillageCreate,
};

/// Owner-only administration bound to the session's partition
pub struct AdminService {
    store: LedgerStore,
    hasher: Arc<dyn CredentialHasher>,
}

impl AdminService {
    /// Fails with `OwnerRequired` for an agent session
    pub fn for_session(session: &Session, hasher: Arc<dyn CredentialHasher>) -> AppResult<Self> {
        session.require_owner()?;
        Ok(Self {
            store: session.store().clone(),
            hasher,
        })
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    pub async fn create_village(&self, name: &str) -> AppResult<Village> {
        let name = required("name", name)?;
        let village = self.store.insert_village(VillageCreate { name }).await?;
        tracing::info!(owner_id = %self.store.owner_id(), village_id = village.id, "Village created");
        Ok(village)
    }

    pub async fn create_product(&self, name: &str) -> AppResult<Product> {
        let name = required("name", name)?;
        let product = self.store.insert_product(ProductCreate { name }).await?;
        tracing::info!(owner_id = %self.store.owner_id(), product_id = product.id, "Product created");
        Ok(product)
    }

    /// Create an agent with a hashed PIN
    ///
    /// The phone must be unused among this owner's agents and every assigned
    /// village must exist.
    pub async fn create_agent(&self, data: AgentCreate) -> AppResult<Agent> {
        let name = required("name", &data.name)?;
        let phone = required("phone", &data.phone)?;
        validate_pin(&data.pin)?;

        if self.store.agent_by_phone(&phone).await?.is_some() {
            return Err(AppError::new(ErrorCode::AgentPhoneExists).with_detail("phone", phone));
        }

        let pin_hash = self.hasher.hash(&data.pin)?;
        let agent = self
            .store
            .insert_agent(
                AgentCreate {
                    name,
                    phone,
                    pin: String::new(),
                    assigned_villages: data.assigned_villages,
                },
                pin_hash,
            )
            .await?;

        tracing::info!(
            owner_id = %self.store.owner_id(),
            agent_id = agent.id,
            villages = agent.assigned_villages.len(),
            "Agent created"
        );
        Ok(agent)
    }

    /// Rename or reassign an agent
    pub async fn update_agent(&self, id: i64, data: AgentUpdate) -> AppResult<Agent> {
        let name = data.name.as_deref().map(|n| required("name", n)).transpose()?;
        let agent = self
            .store
            .update_agent(
                id,
                AgentUpdate {
                    name,
                    assigned_villages: data.assigned_villages,
                },
            )
            .await?;

        tracing::info!(
            owner_id = %self.store.owner_id(),
            agent_id = agent.id,
            villages = agent.assigned_villages.len(),
            "Agent updated"
        );
        Ok(agent)
    }

    /// Create a customer numbered after the last one of its village
    pub async fn create_customer(&self, data: CustomerCreate) -> AppResult<Customer> {
        let name = required("name", &data.name)?;
        self.require_village(data.village_id).await?;

        let customer = self
            .store
            .insert_customer(CustomerCreate {
                village_id: data.village_id,
                name,
                phone: optional(data.phone),
                address: optional(data.address),
            })
            .await?;

        tracing::info!(
            owner_id = %self.store.owner_id(),
            customer_id = customer.id,
            village_id = customer.village_id,
            customer_number = customer.customer_number,
            "Customer created"
        );
        Ok(customer)
    }

    /// Create an active sale, with its customer when given inline
    pub async fn create_sale(&self, data: SaleCreate) -> AppResult<(Sale, Customer)> {
        validate_terms(&data)?;
        self.require_village(data.village_id).await?;

        if self.store.product(data.product_id).await?.is_none() {
            return Err(AppError::new(ErrorCode::ProductNotFound).with_detail("id", data.product_id));
        }
        if let Some(agent_id) = data.assigned_agent_id
            && self.store.agent(agent_id).await?.is_none()
        {
            return Err(AppError::new(ErrorCode::AgentNotFound).with_detail("id", agent_id));
        }

        let data = match data.customer {
            SaleCustomer::Existing { customer_id } => {
                let customer = self.store.customer(customer_id).await?.ok_or_else(|| {
                    AppError::new(ErrorCode::CustomerNotFound).with_detail("id", customer_id)
                })?;
                if customer.village_id != data.village_id {
                    return Err(AppError::validation("Customer belongs to another village")
                        .with_detail("customer_id", customer_id)
                        .with_detail("village_id", data.village_id));
                }
                SaleCreate {
                    customer: SaleCustomer::Existing { customer_id },
                    ..data
                }
            }
            SaleCustomer::New {
                name,
                phone,
                address,
            } => SaleCreate {
                customer: SaleCustomer::New {
                    name: required("name", &name)?,
                    phone: optional(phone),
                    address: optional(address),
                },
                ..data
            },
        };

        let (sale, customer) = self.store.insert_sale(data).await?;
        tracing::info!(
            owner_id = %self.store.owner_id(),
            sale_id = sale.id,
            customer_id = customer.id,
            total_emis = sale.total_emis,
            "Sale created"
        );
        Ok((sale, customer))
    }

    /// Blank optional fields keep their stored value
    pub async fn update_customer(&self, id: i64, data: CustomerUpdate) -> AppResult<Customer> {
        let name = data.name.as_deref().map(|n| required("name", n)).transpose()?;
        let customer = self
            .store
            .update_customer(
                id,
                CustomerUpdate {
                    name,
                    phone: optional(data.phone),
                    address: optional(data.address),
                },
            )
            .await?;

        tracing::info!(owner_id = %self.store.owner_id(), customer_id = customer.id, "Customer updated");
        Ok(customer)
    }

    async fn require_village(&self, village_id: i64) -> AppResult<Village> {
        self.store
            .village(village_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::VillageNotFound).with_detail("id", village_id))
    }
}

fn required(field: &'static str, value: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::new(ErrorCode::RequiredField).with_detail("field", field));
    }
    Ok(trimmed.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_terms(data: &SaleCreate) -> AppResult<()> {
    if !data.emi_amount.is_finite() || data.emi_amount <= 0.0 {
        return Err(AppError::validation("EMI amount must be greater than zero")
            .with_detail("emi_amount", data.emi_amount));
    }
    if data.total_emis < 1 {
        return Err(AppError::validation("Total EMIs must be at least one")
            .with_detail("total_emis", data.total_emis));
    }
    if !data.down_payment.is_finite() || data.down_payment < 0.0 {
        return Err(AppError::validation("Down payment cannot be negative")
            .with_detail("down_payment", data.down_payment));
    }
    Ok(())
}
