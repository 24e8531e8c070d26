// ============================
// storefront-backend-lib/src/config.rs
// ============================
//! Configuration management.
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::auth::password::{MAX_BCRYPT_COST, MIN_BCRYPT_COST};
use crate::auth::token::MIN_SECRET_LEN;
use crate::auth::{CredentialHasher, HashAlgorithm, SigningSecret, DEFAULT_BCRYPT_COST};

/// Environment variable prefix; nested keys use `__`, e.g. `STOREFRONT_AUTH__JWT_SECRET`
pub const ENV_PREFIX: &str = "STOREFRONT_";

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub auth: AuthSettings,
    pub catalog: CatalogSettings,
    pub log: LogSettings,
}

/// Listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Credential and token settings
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// HMAC secret for session tokens
    pub jwt_secret: Option<String>,
    /// Algorithm for newly stored password hashes
    pub hash_algorithm: HashAlgorithm,
    /// bcrypt cost factor
    pub bcrypt_cost: u32,
    /// scrypt work factor (log2 of N)
    pub scrypt_log_n: u8,
    /// Cookie that carries the session token
    pub cookie_name: String,
    /// Mark the session cookie `Secure`
    pub cookie_secure: bool,
}

/// Catalog settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// JSON file with the initial list of stores
    pub seed_path: Option<PathBuf>,
    pub default_page_size: usize,
    pub max_page_size: usize,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            hash_algorithm: HashAlgorithm::Bcrypt,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
            scrypt_log_n: crate::auth::password::DEFAULT_SCRYPT_LOG_N,
            cookie_name: "session_token".to_string(),
            cookie_secure: false,
        }
    }
}

// The secret never shows up in logs.
impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field("hash_algorithm", &self.hash_algorithm)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("scrypt_log_n", &self.scrypt_log_n)
            .field("cookie_name", &self.cookie_name)
            .field("cookie_secure", &self.cookie_secure)
            .finish()
    }
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            seed_path: None,
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Settings {
    /// Load from `config.toml` (if present) and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load from a specific TOML file (if present) and the environment
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings: Settings = Self::figment(path.as_ref())
            .extract()
            .with_context(|| format!("invalid configuration ({})", path.as_ref().display()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Layered sources: defaults, then the file, then `STOREFRONT_*` variables
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.server.host.trim().is_empty() {
            bail!("server.host must not be empty");
        }
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&self.auth.bcrypt_cost) {
            bail!(
                "auth.bcrypt_cost must be between {MIN_BCRYPT_COST} and {MAX_BCRYPT_COST}, got {}",
                self.auth.bcrypt_cost
            );
        }
        if !(1..=20).contains(&self.auth.scrypt_log_n) {
            bail!("auth.scrypt_log_n must be between 1 and 20");
        }
        if let Some(secret) = &self.auth.jwt_secret {
            if secret.len() < MIN_SECRET_LEN {
                bail!("auth.jwt_secret must be at least {MIN_SECRET_LEN} bytes");
            }
        }
        if self.auth.cookie_name.is_empty()
            || !self
                .auth
                .cookie_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            bail!("auth.cookie_name must be a non-empty token of [A-Za-z0-9_-]");
        }
        if self.catalog.max_page_size == 0 {
            bail!("catalog.max_page_size must be positive");
        }
        if self.catalog.default_page_size == 0
            || self.catalog.default_page_size > self.catalog.max_page_size
        {
            bail!("catalog.default_page_size must be between 1 and catalog.max_page_size");
        }
        if !LOG_LEVELS.contains(&self.log.level.to_lowercase().as_str()) {
            bail!("log.level must be one of {LOG_LEVELS:?}");
        }
        Ok(())
    }

    /// Address to bind the HTTP listener to
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.server.host, self.server.port))
    }

    /// Password hasher for newly stored credentials
    pub fn hasher(&self) -> CredentialHasher {
        CredentialHasher::new(self.auth.hash_algorithm, self.auth.bcrypt_cost)
            .with_scrypt_log_n(self.auth.scrypt_log_n)
    }

    /// Resolve the token signing secret.
    ///
    /// Without a configured secret, debug builds fall back to a random
    /// per-process secret; release builds refuse to start.
    pub fn signing_secret(&self) -> Result<SigningSecret> {
        match &self.auth.jwt_secret {
            Some(secret) => Ok(SigningSecret::new(secret.as_bytes().to_vec())?),
            None if cfg!(debug_assertions) => {
                tracing::warn!(
                    "auth.jwt_secret is not set; using an ephemeral secret, tokens will not survive a restart"
                );
                Ok(SigningSecret::generate())
            },
            None => bail!("auth.jwt_secret must be configured (or {ENV_PREFIX}AUTH__JWT_SECRET)"),
        }
    }
}
