use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use storefront_common::AccountResponse;
use zeroize::Zeroizing;

use crate::auth::{AuthService, CredentialError, CredentialHasher, IssuedToken, TokenService};
use crate::error::AppError;
use crate::metrics::{AUTH_LOGIN, AUTH_REGISTER};
use crate::storage::{AccountStore, StoreError};
use crate::validation::{validate_login, validate_registration};

pub struct DefaultAuth {
    store: Arc<dyn AccountStore>,
    hasher: CredentialHasher,
    tokens: Arc<TokenService>,
    /// Verified against when the identifier is unknown, so both login failures cost one hash check
    decoy_hash: String,
}

impl DefaultAuth {
    pub fn new(
        store: Arc<dyn AccountStore>,
        hasher: CredentialHasher,
        tokens: Arc<TokenService>,
    ) -> Result<Self, CredentialError> {
        let decoy_hash = hasher.hash(&uuid::Uuid::new_v4().to_string())?;
        Ok(Self {
            store,
            hasher,
            tokens,
            decoy_hash,
        })
    }

    /// Swap an outdated hash for one under the current settings.
    /// Failures only cost an upgrade, never the login.
    async fn upgrade_hash(&self, account_id: &str, password: &str) {
        let hash = match self.hasher.hash_blocking(password.to_string()).await {
            Ok(hash) => hash,
            Err(e) => {
                tracing::warn!(account_id, error = %e, "password rehash failed");
                return;
            },
        };
        match self.store.update_password_hash(account_id, &hash).await {
            Ok(()) => tracing::info!(account_id, "password hash upgraded"),
            Err(e) => tracing::warn!(account_id, error = %e, "storing upgraded hash failed"),
        }
    }
}

#[async_trait]
impl AuthService for DefaultAuth {
    async fn register(&self, email: &str, password: String) -> Result<AccountResponse, AppError> {
        let password = Zeroizing::new(password);

        if let Err(e) = validate_registration(email, &password) {
            counter!(AUTH_REGISTER, "outcome" => "invalid").increment(1);
            return Err(e.into());
        }

        let hash = self.hasher.hash_blocking(password.to_string()).await?;

        match self.store.create_account(email, &hash).await {
            Ok(id) => {
                counter!(AUTH_REGISTER, "outcome" => "created").increment(1);
                tracing::info!(account_id = %id, "account registered");
                Ok(AccountResponse {
                    id,
                    email: email.to_string(),
                })
            },
            Err(StoreError::AlreadyExists) => {
                counter!(AUTH_REGISTER, "outcome" => "conflict").increment(1);
                tracing::info!("registration for existing identifier refused");
                Err(AppError::AccountExists)
            },
            Err(e) => Err(e.into()),
        }
    }

    async fn login(&self, email: &str, password: String) -> Result<IssuedToken, AppError> {
        let password = Zeroizing::new(password);

        if let Err(e) = validate_login(email, &password) {
            counter!(AUTH_LOGIN, "outcome" => "invalid").increment(1);
            return Err(e.into());
        }

        let credential = match self.store.fetch_credential(email).await {
            Ok(credential) => credential,
            // Unknown identifiers look exactly like wrong passwords, timing included.
            Err(StoreError::NotFound) => {
                self.hasher
                    .verify_blocking(password.to_string(), self.decoy_hash.clone())
                    .await;
                counter!(AUTH_LOGIN, "outcome" => "rejected").increment(1);
                return Err(AppError::InvalidCredentials);
            },
            Err(e) => return Err(e.into()),
        };

        let matches = self
            .hasher
            .verify_blocking(password.to_string(), credential.password_hash.clone())
            .await;
        if !matches {
            counter!(AUTH_LOGIN, "outcome" => "rejected").increment(1);
            tracing::info!(account_id = %credential.account_id, "login rejected");
            return Err(AppError::InvalidCredentials);
        }

        if self.hasher.needs_rehash(&credential.password_hash) {
            self.upgrade_hash(&credential.account_id, &password).await;
        }

        let (token, claims) = self.tokens.issue(&credential.account_id, &credential.email)?;
        counter!(AUTH_LOGIN, "outcome" => "success").increment(1);
        tracing::info!(account_id = %credential.account_id, "login succeeded");

        Ok(IssuedToken { token, claims })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{HashAlgorithm, SigningSecret};
    use crate::storage::MemoryStore;
    use crate::validation::ValidationError;

    fn setup(hasher: CredentialHasher) -> (DefaultAuth, Arc<MemoryStore>, Arc<TokenService>) {
        let store = Arc::new(MemoryStore::new());
        let tokens = Arc::new(TokenService::new(&SigningSecret::generate()));
        let auth = DefaultAuth::new(store.clone(), hasher, tokens.clone()).unwrap();
        (auth, store, tokens)
    }

    fn fast_hasher() -> CredentialHasher {
        CredentialHasher::new(HashAlgorithm::Bcrypt, 4)
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (auth, store, tokens) = setup(fast_hasher());

        let account = auth
            .register("user@example.com", "Abc123!@".to_string())
            .await
            .unwrap();
        assert_eq!(account.email, "user@example.com");

        // only the hash is stored
        let stored = store.fetch_credential("user@example.com").await.unwrap();
        assert_ne!(stored.password_hash, "Abc123!@");

        let issued = auth
            .login("user@example.com", "Abc123!@".to_string())
            .await
            .unwrap();
        let claims = tokens.verify(&issued.token).unwrap();
        assert_eq!(claims.user_id, account.id);
        assert_eq!(claims.email, "user@example.com");
        assert_eq!(claims, issued.claims);
    }

    #[tokio::test]
    async fn test_register_weak_password() {
        let (auth, store, _) = setup(fast_hasher());
        let err = auth
            .register("user@example.com", "abcdefgh".to_string())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(ValidationError::PasswordMissingUpper)
        ));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_register_duplicate() {
        let (auth, _, _) = setup(fast_hasher());
        auth.register("user@example.com", "Abc123!@".to_string())
            .await
            .unwrap();
        let err = auth
            .register("user@example.com", "Xyz789#$".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AccountExists));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (auth, _, _) = setup(fast_hasher());
        auth.register("user@example.com", "Abc123!@".to_string())
            .await
            .unwrap();

        let wrong_password = auth
            .login("user@example.com", "Abc123!#".to_string())
            .await
            .unwrap_err();
        let unknown_user = auth
            .login("other@example.com", "Abc123!@".to_string())
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, AppError::InvalidCredentials));
        assert!(matches!(unknown_user, AppError::InvalidCredentials));
        assert_eq!(wrong_password.public_message(), unknown_user.public_message());
    }

    #[tokio::test]
    async fn test_unknown_identifier_costs_a_hash_check() {
        let (auth, _, _) = setup(CredentialHasher::new(HashAlgorithm::Bcrypt, 8));
        auth.register("user@example.com", "Abc123!@".to_string())
            .await
            .unwrap();

        let started = std::time::Instant::now();
        auth.login("user@example.com", "Abc123!#".to_string())
            .await
            .unwrap_err();
        let wrong_password = started.elapsed();

        let started = std::time::Instant::now();
        let err = auth
            .login("other@example.com", "Abc123!@".to_string())
            .await
            .unwrap_err();
        let unknown_user = started.elapsed();

        assert!(matches!(err, AppError::InvalidCredentials));
        // both paths run one bcrypt verification at the same cost
        assert!(
            unknown_user * 4 >= wrong_password,
            "unknown user took {unknown_user:?}, wrong password {wrong_password:?}"
        );
    }

    #[test]
    fn test_decoy_hash_follows_hasher() {
        let store = Arc::new(MemoryStore::new());
        let tokens = Arc::new(TokenService::new(&SigningSecret::generate()));
        let hasher = CredentialHasher::new(HashAlgorithm::Bcrypt, 5);
        let auth = DefaultAuth::new(store, hasher, tokens).unwrap();
        assert!(auth.decoy_hash.starts_with("$2b$05$"));
        assert!(!hasher.needs_rehash(&auth.decoy_hash));
    }

    #[tokio::test]
    async fn test_login_validates_input() {
        let (auth, _, _) = setup(fast_hasher());
        let err = auth.login("ab", "whatever".to_string()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ValidationError::TooShort)));
    }

    #[tokio::test]
    async fn test_login_upgrades_outdated_hash() {
        let (auth, store, _) = setup(fast_hasher());
        let legacy = CredentialHasher::new(HashAlgorithm::Scrypt, 4)
            .with_scrypt_log_n(8)
            .hash("Abc123!@")
            .unwrap();
        store.create_account("user@example.com", &legacy).await.unwrap();

        auth.login("user@example.com", "Abc123!@".to_string())
            .await
            .unwrap();

        let upgraded = store.fetch_credential("user@example.com").await.unwrap();
        assert!(upgraded.password_hash.starts_with("$2b$04$"));
        // the new hash still verifies the same password
        auth.login("user@example.com", "Abc123!@".to_string())
            .await
            .unwrap();
    }
}
