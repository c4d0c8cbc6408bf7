//! Collection Workflow
//!
//! customer number + village → due amount → payment + advanced sale →
//! receipt records.

use crate::ledger::LedgerStore;
use crate::schedule;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Agent, Customer, Payment, Receipt, ReceiptAgent, SyncStatus};
use shared::util::{now_millis, snowflake_id};

/// Parse a typed amount; must be a positive finite number
pub fn parse_amount(raw: &str) -> AppResult<f64> {
    let amount: f64 = raw
        .trim()
        .parse()
        .map_err(|_| AppError::invalid_amount(raw))?;
    validate_amount(amount)?;
    Ok(amount)
}

fn validate_amount(amount: f64) -> AppResult<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(AppError::invalid_amount(amount.to_string()));
    }
    Ok(())
}

#[derive(Clone)]
pub struct CollectionService {
    store: LedgerStore,
}

impl CollectionService {
    pub fn new(store: LedgerStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    pub async fn lookup_customer(&self, village_id: i64, customer_number: i64) -> AppResult<Customer> {
        self.store
            .customer_by_number(village_id, customer_number)
            .await?
            .ok_or_else(|| {
                AppError::new(ErrorCode::CustomerNotFound)
                    .with_detail("village_id", village_id)
                    .with_detail("customer_number", customer_number)
            })
    }

    pub async fn due_amount(&self, customer: &Customer) -> AppResult<f64> {
        self.due_amount_at(customer, now_millis()).await
    }

    /// Sum of `emi_amount` over the customer's active sales due at `now`
    pub async fn due_amount_at(&self, customer: &Customer, now: i64) -> AppResult<f64> {
        let sales = self.store.active_sales_for_customer(customer.id).await?;
        Ok(schedule::due_amount(&sales, now))
    }

    pub async fn collect(&self, customer: &Customer, amount: f64, agent: &Agent) -> AppResult<Receipt> {
        self.collect_at(customer, amount, agent, now_millis()).await
    }

    /// Record `amount` against the customer's earliest-due active sale
    ///
    /// The amount is stored as typed (over- and under-payments are accepted)
    /// and the sale advances by exactly one installment. Payment insert and
    /// sale update commit together.
    pub async fn collect_at(
        &self,
        customer: &Customer,
        amount: f64,
        agent: &Agent,
        now: i64,
    ) -> AppResult<Receipt> {
        validate_amount(amount)?;
        for (kind, owner_id) in [("customer", &customer.owner_id), ("agent", &agent.owner_id)] {
            if owner_id != self.store.owner_id() {
                return Err(AppError::new(ErrorCode::OwnerMismatch).with_detail("kind", kind));
            }
        }

        let (payment, sale) = self
            .store
            .record_collection(customer.id, |current| {
                let advanced = schedule::advance(current, now)?;
                let payment = Payment {
                    id: snowflake_id(),
                    owner_id: current.owner_id.clone(),
                    sale_id: current.id,
                    amount,
                    collected_by_agent_id: agent.id,
                    collected_at: now,
                    created_at: now,
                    sync_status: SyncStatus::Pending,
                };
                Ok((payment, advanced))
            })
            .await?;

        tracing::info!(
            owner_id = %sale.owner_id,
            sale_id = sale.id,
            payment_id = payment.id,
            customer_id = customer.id,
            agent_id = agent.id,
            amount,
            emis_collected = sale.emis_collected,
            status = sale.status.as_str(),
            "Payment collected"
        );

        Ok(Receipt {
            payment,
            sale,
            customer: customer.clone(),
            agent: ReceiptAgent::from(agent),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("150").unwrap(), 150.0);
        assert_eq!(parse_amount(" 99.5 ").unwrap(), 99.5);
        for bad in ["0", "-10", "abc", "", "NaN", "inf"] {
            let err = parse_amount(bad).unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidAmount, "{bad}");
            assert!(err.is_input_error());
        }
    }
}
