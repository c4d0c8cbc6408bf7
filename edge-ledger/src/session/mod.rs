//! Identity / Session Resolver
//!
//! A [`SessionContext`] holds at most one logged-in principal for the running
//! instance. It is created empty, filled by a login and cleared by logout;
//! nothing about it is persisted. Operations that need the owner partition
//! take the [`Session`] (or its [`LedgerStore`]) explicitly.

mod credential;
mod identity;

pub use credential::{Argon2Hasher, CredentialHasher, validate_pin};
pub use identity::{ExternalIdentity, HttpIdentityProvider, IdentityProvider};

use crate::ledger::{Ledger, LedgerStore};
use crate::security_log;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Agent, Owner};
use std::sync::Arc;

/// Logged-in principal
#[derive(Debug, Clone, PartialEq)]
pub enum Principal {
    /// Authenticated by the external identity provider
    Owner(Owner),
    /// Authenticated locally by phone + PIN
    Agent(Agent),
}

/// Owner partition key of a principal
///
/// Owner: its external uid. Agent: the stored `owner_id` of its record.
pub fn resolve_owner_id(principal: &Principal) -> &str {
    match principal {
        Principal::Owner(owner) => &owner.external_uid,
        Principal::Agent(agent) => &agent.owner_id,
    }
}

/// One active login, bound to its owner partition
#[derive(Debug, Clone)]
pub struct Session {
    principal: Principal,
    store: LedgerStore,
    remote_token: Option<String>,
    started_at: i64,
}

impl Session {
    fn new(ledger: &Ledger, principal: Principal, remote_token: Option<String>) -> Self {
        let store = ledger.scoped(resolve_owner_id(&principal));
        Self {
            principal,
            store,
            remote_token,
            started_at: shared::util::now_millis(),
        }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn owner_id(&self) -> &str {
        resolve_owner_id(&self.principal)
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    /// Bearer token for the remote store (owner sessions only)
    pub fn remote_token(&self) -> Option<&str> {
        self.remote_token.as_deref()
    }

    pub fn started_at(&self) -> i64 {
        self.started_at
    }

    pub fn is_owner(&self) -> bool {
        matches!(self.principal, Principal::Owner(_))
    }

    pub fn require_owner(&self) -> AppResult<&Owner> {
        match &self.principal {
            Principal::Owner(owner) => Ok(owner),
            Principal::Agent(_) => Err(AppError::new(ErrorCode::OwnerRequired)),
        }
    }

    pub fn require_agent(&self) -> AppResult<&Agent> {
        match &self.principal {
            Principal::Agent(agent) => Ok(agent),
            Principal::Owner(_) => Err(AppError::new(ErrorCode::AgentRequired)),
        }
    }
}

/// Result of an agent login
#[derive(Debug)]
pub struct AgentLogin {
    pub session: Session,
    /// No local customers in the agent's villages: the caller should run a
    /// pull before collecting
    pub needs_import: bool,
}

pub struct SessionContext {
    ledger: Ledger,
    hasher: Arc<dyn CredentialHasher>,
    current: Option<Session>,
}

impl SessionContext {
    pub fn new(ledger: Ledger, hasher: Arc<dyn CredentialHasher>) -> Self {
        Self {
            ledger,
            hasher,
            current: None,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn hasher(&self) -> Arc<dyn CredentialHasher> {
        self.hasher.clone()
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn require(&self) -> AppResult<&Session> {
        self.current.as_ref().ok_or_else(AppError::not_authenticated)
    }

    /// Phone + PIN login against the agents stored on this device
    ///
    /// Unknown phone and wrong PIN fail identically.
    pub async fn login_agent(&mut self, phone: &str, pin: &str) -> AppResult<AgentLogin> {
        let candidates = self.ledger.agents_by_phone(phone).await?;
        // argon2 验证是 CPU 密集型，放到阻塞线程池
        let hasher = self.hasher.clone();
        let secret = pin.to_string();
        let matched = tokio::task::spawn_blocking(move || {
            candidates
                .into_iter()
                .find(|a| hasher.verify(&secret, &a.pin_hash))
        })
        .await
        .map_err(|e| AppError::internal(format!("PIN verification task failed: {e}")))?;
        let Some(agent) = matched else {
            security_log!(WARN, "agent_login_failed", phone = %phone);
            return Err(AppError::invalid_credentials());
        };

        let session = Session::new(&self.ledger, Principal::Agent(agent.clone()), None);
        let local_customers = session
            .store()
            .count_customers_in_villages(&agent.assigned_villages)
            .await?;
        let needs_import = local_customers == 0;

        security_log!(INFO, "agent_login", agent_id = agent.id, owner_id = %agent.owner_id);
        tracing::info!(agent_id = agent.id, needs_import, "Agent logged in");

        self.current = Some(session.clone());
        Ok(AgentLogin {
            session,
            needs_import,
        })
    }

    /// Email + password login through the external identity provider
    ///
    /// Records or refreshes the local owner row.
    pub async fn login_owner(
        &mut self,
        provider: &dyn IdentityProvider,
        email: &str,
        password: &str,
    ) -> AppResult<Session> {
        let identity = match provider.sign_in(email, password).await {
            Ok(identity) => identity,
            Err(e) => {
                security_log!(WARN, "owner_login_failed", email = %email, code = %e.code);
                return Err(e);
            }
        };

        let owner = self
            .ledger
            .upsert_owner(&identity.uid, &identity.email, identity.name.as_deref())
            .await?;

        security_log!(INFO, "owner_login", owner_id = %owner.external_uid);

        let session = Session::new(&self.ledger, Principal::Owner(owner), identity.token);
        self.current = Some(session.clone());
        Ok(session)
    }

    /// Clear the current session (no-op when logged out)
    pub fn logout(&mut self) {
        if let Some(session) = self.current.take() {
            tracing::info!(owner_id = %session.owner_id(), "Logged out");
        }
    }
}
