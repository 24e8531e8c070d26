// ============================
// storefront-backend-lib/src/storage.rs
// ============================
//! Account persistence abstraction with an in-memory implementation.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use thiserror::Error;
use uuid::Uuid;

/// Opaque account id
pub type AccountId = String;

/// Errors reported by persistence backends
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("record already exists")]
    AlreadyExists,

    #[error("record not found")]
    NotFound,

    #[error("storage failure: {0}")]
    Unknown(String),
}

/// Stored login material for one account
#[derive(Clone)]
pub struct Credential {
    pub account_id: AccountId,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("account_id", &self.account_id)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Trait for account storage backends
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Create an account; fails with `AlreadyExists` if the identifier is taken
    async fn create_account(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<AccountId, StoreError>;

    /// Look up the credential for an identifier; fails with `NotFound`
    async fn fetch_credential(&self, email: &str) -> Result<Credential, StoreError>;

    /// Replace the stored hash of an existing account
    async fn update_password_hash(
        &self,
        account_id: &str,
        password_hash: &str,
    ) -> Result<(), StoreError>;
}

/// In-memory account store keyed by identifier
#[derive(Default)]
pub struct MemoryStore {
    accounts: DashMap<String, Credential>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn create_account(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<AccountId, StoreError> {
        // The entry lock makes check-and-insert atomic per identifier.
        match self.accounts.entry(email.to_string()) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists),
            Entry::Vacant(slot) => {
                let account_id = Uuid::new_v4().to_string();
                slot.insert(Credential {
                    account_id: account_id.clone(),
                    email: email.to_string(),
                    password_hash: password_hash.to_string(),
                    created_at: Utc::now(),
                });
                Ok(account_id)
            },
        }
    }

    async fn fetch_credential(&self, email: &str) -> Result<Credential, StoreError> {
        self.accounts
            .get(email)
            .map(|entry| entry.value().clone())
            .ok_or(StoreError::NotFound)
    }

    async fn update_password_hash(
        &self,
        account_id: &str,
        password_hash: &str,
    ) -> Result<(), StoreError> {
        let mut entry = self
            .accounts
            .iter_mut()
            .find(|entry| entry.value().account_id == account_id)
            .ok_or(StoreError::NotFound)?;
        entry.value_mut().password_hash = password_hash.to_string();
        Ok(())
    }
}
