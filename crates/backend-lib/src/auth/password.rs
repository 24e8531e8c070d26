// ============================
// storefront-backend-lib/src/auth/password.rs
// ============================
//! Password hashing and verification.
use scrypt::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Params, Scrypt,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::Zeroize;

/// Default bcrypt cost factor
pub const DEFAULT_BCRYPT_COST: u32 = 10;

/// Lowest bcrypt cost the primitive accepts
pub const MIN_BCRYPT_COST: u32 = 4;

/// Highest bcrypt cost the primitive accepts
pub const MAX_BCRYPT_COST: u32 = 31;

/// Default scrypt work factor (N = 2^17)
pub const DEFAULT_SCRYPT_LOG_N: u8 = Params::RECOMMENDED_LOG_N;

/// Failure of the hashing primitive itself (never a password mismatch)
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("bcrypt failure: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),

    #[error("scrypt failure: {0}")]
    Scrypt(String),

    #[error("hashing task aborted: {0}")]
    Join(String),
}

/// Algorithm used for newly created hashes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Bcrypt,
    Scrypt,
}

/// One-way password hasher.
///
/// New hashes use the configured algorithm; verification accepts both bcrypt
/// (`$2a$`/`$2b$`/`$2y$`) and scrypt PHC (`$scrypt$`) strings.
#[derive(Debug, Clone, Copy)]
pub struct CredentialHasher {
    algorithm: HashAlgorithm,
    bcrypt_cost: u32,
    scrypt_log_n: u8,
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::Bcrypt,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
            scrypt_log_n: DEFAULT_SCRYPT_LOG_N,
        }
    }
}

impl CredentialHasher {
    /// Create a hasher; `bcrypt_cost` is clamped into the range bcrypt supports
    pub fn new(algorithm: HashAlgorithm, bcrypt_cost: u32) -> Self {
        Self {
            algorithm,
            bcrypt_cost: bcrypt_cost.clamp(MIN_BCRYPT_COST, MAX_BCRYPT_COST),
            scrypt_log_n: DEFAULT_SCRYPT_LOG_N,
        }
    }

    /// Override the scrypt work factor used for new scrypt hashes
    pub fn with_scrypt_log_n(mut self, log_n: u8) -> Self {
        self.scrypt_log_n = log_n;
        self
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn bcrypt_cost(&self) -> u32 {
        self.bcrypt_cost
    }

    /// Hash a password with a fresh random salt
    pub fn hash(&self, plain: &str) -> Result<String, CredentialError> {
        match self.algorithm {
            HashAlgorithm::Bcrypt => Ok(bcrypt::hash(plain, self.bcrypt_cost)?),
            HashAlgorithm::Scrypt => {
                let params = Params::new(
                    self.scrypt_log_n,
                    Params::RECOMMENDED_R,
                    Params::RECOMMENDED_P,
                    Params::RECOMMENDED_LEN,
                )
                .map_err(|e| CredentialError::Scrypt(e.to_string()))?;
                let salt = SaltString::generate(&mut OsRng);
                let hash = Scrypt
                    .hash_password_customized(plain.as_bytes(), None, None, params, &salt)
                    .map_err(|e| CredentialError::Scrypt(e.to_string()))?
                    .to_string();
                Ok(hash)
            },
        }
    }

    /// Verify a password against a stored hash.
    ///
    /// Returns false on mismatch and on any malformed hash.
    pub fn verify(&self, plain: &str, hash: &str) -> bool {
        if is_scrypt_hash(hash) {
            let parsed_hash = match PasswordHash::new(hash) {
                Ok(h) => h,
                Err(_) => return false,
            };
            return Scrypt.verify_password(plain.as_bytes(), &parsed_hash).is_ok();
        }
        bcrypt::verify(plain, hash).unwrap_or(false)
    }

    /// Whether a stored hash was produced under different settings than ours
    pub fn needs_rehash(&self, hash: &str) -> bool {
        match self.algorithm {
            HashAlgorithm::Scrypt => scrypt_log_n_of(hash) != Some(self.scrypt_log_n),
            HashAlgorithm::Bcrypt => bcrypt_cost_of(hash) != Some(self.bcrypt_cost),
        }
    }

    /// Hash on the blocking pool so request tasks are not stalled
    pub async fn hash_blocking(&self, plain: String) -> Result<String, CredentialError> {
        let hasher = *self;
        tokio::task::spawn_blocking(move || {
            let mut plain = plain;
            let hash = hasher.hash(&plain);
            plain.zeroize();
            hash
        })
        .await
        .map_err(|e| CredentialError::Join(e.to_string()))?
    }

    /// Verify on the blocking pool; a panicked task counts as a mismatch
    pub async fn verify_blocking(&self, plain: String, hash: String) -> bool {
        let hasher = *self;
        tokio::task::spawn_blocking(move || {
            let mut plain = plain;
            let ok = hasher.verify(&plain, &hash);
            plain.zeroize();
            ok
        })
        .await
        .unwrap_or(false)
    }
}

fn is_scrypt_hash(hash: &str) -> bool {
    hash.starts_with("$scrypt$")
}

/// `ln` parameter of a scrypt PHC string, e.g. `$scrypt$ln=17,r=8,p=1$...`
fn scrypt_log_n_of(hash: &str) -> Option<u8> {
    if !is_scrypt_hash(hash) {
        return None;
    }
    let parsed = PasswordHash::new(hash).ok()?;
    Params::try_from(&parsed).ok().map(|params| params.log_n())
}

/// Cost field of a modular-crypt bcrypt string, e.g. `$2b$10$...`
fn bcrypt_cost_of(hash: &str) -> Option<u32> {
    let mut parts = hash.split('$');
    // leading empty segment
    parts.next()?;
    let version = parts.next()?;
    if !matches!(version, "2a" | "2b" | "2x" | "2y") {
        return None;
    }
    parts.next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> CredentialHasher {
        CredentialHasher::new(HashAlgorithm::Bcrypt, MIN_BCRYPT_COST)
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = CredentialHasher::default();
        let hash = hasher.hash("Abc123!@").unwrap();

        assert_ne!(hash, "Abc123!@");
        assert!(hash.starts_with("$2"));
        assert!(hasher.verify("Abc123!@", &hash));
        assert!(!hasher.verify("Abc123!#", &hash));
    }

    #[test]
    fn test_same_password_gets_fresh_salt() {
        let hasher = fast();
        let first = hasher.hash("SecureP@ssw0rd").unwrap();
        let second = hasher.hash("SecureP@ssw0rd").unwrap();

        assert_ne!(first, second);
        assert!(hasher.verify("SecureP@ssw0rd", &first));
        assert!(hasher.verify("SecureP@ssw0rd", &second));
    }

    #[test]
    fn test_wrong_passwords_rejected() {
        let hasher = fast();
        let hash = hasher.hash("SecureP@ssw0rd").unwrap();

        for wrong in ["", "securep@ssw0rd", "SecureP@ssw0rd ", "SecureP@ssw0r", "x"] {
            assert!(!hasher.verify(wrong, &hash), "{wrong:?} should not verify");
        }
    }

    #[test]
    fn test_malformed_hash_is_false() {
        let hasher = fast();
        assert!(!hasher.verify("anything", ""));
        assert!(!hasher.verify("anything", "not-a-hash"));
        assert!(!hasher.verify("anything", "$2b$10$tooshort"));
        assert!(!hasher.verify("anything", "$scrypt$garbage"));
    }

    #[test]
    fn test_cost_is_clamped() {
        assert_eq!(CredentialHasher::new(HashAlgorithm::Bcrypt, 1).bcrypt_cost(), 4);
        assert_eq!(CredentialHasher::new(HashAlgorithm::Bcrypt, 99).bcrypt_cost(), 31);
        assert_eq!(CredentialHasher::default().bcrypt_cost(), DEFAULT_BCRYPT_COST);
    }

    #[test]
    fn test_scrypt_hashes_verify_under_bcrypt_config() {
        let scrypt = CredentialHasher::new(HashAlgorithm::Scrypt, DEFAULT_BCRYPT_COST)
            .with_scrypt_log_n(8);
        let hash = scrypt.hash("SecureP@ssw0rd").unwrap();
        assert!(hash.starts_with("$scrypt$"));

        let bcrypt = fast();
        assert!(bcrypt.verify("SecureP@ssw0rd", &hash));
        assert!(!bcrypt.verify("wrong", &hash));
    }

    #[test]
    fn test_needs_rehash() {
        let hasher = fast();
        let current = hasher.hash("SecureP@ssw0rd").unwrap();
        assert!(!hasher.needs_rehash(&current));

        let stronger = CredentialHasher::new(HashAlgorithm::Bcrypt, 5);
        assert!(stronger.needs_rehash(&current));

        let scrypt = CredentialHasher::new(HashAlgorithm::Scrypt, DEFAULT_BCRYPT_COST)
            .with_scrypt_log_n(8);
        assert!(scrypt.needs_rehash(&current));
        let scrypt_hash = scrypt.hash("SecureP@ssw0rd").unwrap();
        assert!(!scrypt.needs_rehash(&scrypt_hash));
        assert!(hasher.needs_rehash(&scrypt_hash));
    }

    #[test]
    fn test_scrypt_work_factor_triggers_rehash() {
        let weak = CredentialHasher::new(HashAlgorithm::Scrypt, DEFAULT_BCRYPT_COST)
            .with_scrypt_log_n(8);
        let weak_hash = weak.hash("SecureP@ssw0rd").unwrap();
        assert_eq!(scrypt_log_n_of(&weak_hash), Some(8));

        let stronger = weak.with_scrypt_log_n(9);
        assert!(stronger.needs_rehash(&weak_hash));
        assert!(!weak.needs_rehash(&weak_hash));

        let upgraded = stronger.hash("SecureP@ssw0rd").unwrap();
        assert!(!stronger.needs_rehash(&upgraded));
        assert!(stronger.verify("SecureP@ssw0rd", &upgraded));
    }

    #[test]
    fn test_scrypt_log_n_parsing() {
        assert_eq!(scrypt_log_n_of("$2b$10$abcdefghijklmnopqrstuv"), None);
        assert_eq!(scrypt_log_n_of("$scrypt$garbage"), None);
    }

    #[test]
    fn test_bcrypt_cost_parsing() {
        assert_eq!(bcrypt_cost_of("$2b$10$abcdefghijklmnopqrstuv"), Some(10));
        assert_eq!(bcrypt_cost_of("$2a$04$abc"), Some(4));
        assert_eq!(bcrypt_cost_of("$scrypt$ln=17"), None);
        assert_eq!(bcrypt_cost_of("plain"), None);
    }

    #[tokio::test]
    async fn test_blocking_wrappers() {
        let hasher = fast();
        let hash = hasher.hash_blocking("SecureP@ssw0rd".to_string()).await.unwrap();
        assert!(hasher.verify_blocking("SecureP@ssw0rd".to_string(), hash.clone()).await);
        assert!(!hasher.verify_blocking("nope".to_string(), hash).await);
    }
}
