//! Process-wide session bootstrap.
//!
//! Establishes the target chain configuration and the shared secret
//! read-cache before any verification flow runs. Created once at startup and
//! never torn down during the session; [`Session::shutdown`] is the
//! documented end-of-lifecycle hook. The flow controller receives the
//! session by injection rather than reading a global.

use std::env;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use thiserror::Error;
use tokio::sync::RwLock;

use zkredeem_core::encoding;

pub const RPC_URL_ENV: &str = "ZKREDEEM_RPC_URL";
pub const CONTRACT_ENV: &str = "ZKREDEEM_CONTRACT";
pub const CHAIN_ID_ENV: &str = "ZKREDEEM_CHAIN_ID";

/// Sepolia test network.
pub const SEPOLIA_CHAIN_ID: u64 = 11_155_111;
pub const DEFAULT_RPC_URL: &str = "https://rpc.sepolia.org";

/// The secret contract deployed on Sepolia.
pub const DEFAULT_CONTRACT: &str = "0xde9174EAaa3ee5f91f26C520b7F7315af225F1c1";

static SESSION: OnceCell<Arc<Session>> = OnceCell::new();

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid contract address {0}")]
    InvalidContract(String),

    #[error("rpc url must be http(s), got {0}")]
    InvalidRpcUrl(String),

    #[error("chain id must be non-zero")]
    InvalidChainId,
}

/// Target network and transport configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub rpc_url: String,
    pub contract: String,
}

impl ChainConfig {
    /// The fixed test-network build: Sepolia over public HTTP transport.
    pub fn sepolia() -> Self {
        Self {
            chain_id: SEPOLIA_CHAIN_ID,
            rpc_url: DEFAULT_RPC_URL.to_string(),
            contract: DEFAULT_CONTRACT.to_string(),
        }
    }

    /// Sepolia defaults with `ZKREDEEM_*` environment overrides.
    pub fn from_env() -> Self {
        let defaults = Self::sepolia();
        Self {
            chain_id: env::var(CHAIN_ID_ENV)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.chain_id),
            rpc_url: env::var(RPC_URL_ENV).unwrap_or(defaults.rpc_url),
            contract: env::var(CONTRACT_ENV).unwrap_or(defaults.contract),
        }
    }

    /// Check the configuration is internally consistent: parseable contract
    /// address, http(s) transport, non-zero chain id. Surfaced at bootstrap
    /// instead of lazily at the first contract call.
    pub fn validate(&self) -> Result<(), SessionError> {
        encoding::parse_address(&self.contract)
            .map_err(|_| SessionError::InvalidContract(self.contract.clone()))?;
        if !self.rpc_url.starts_with("http://") && !self.rpc_url.starts_with("https://") {
            return Err(SessionError::InvalidRpcUrl(self.rpc_url.clone()));
        }
        if self.chain_id == 0 {
            return Err(SessionError::InvalidChainId);
        }
        Ok(())
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self::sepolia()
    }
}

/// Shared cache of the last secret value read from the contract.
#[derive(Debug, Clone, Default)]
pub struct SecretCache {
    inner: Arc<RwLock<Option<String>>>,
}

impl SecretCache {
    pub async fn get(&self) -> Option<String> {
        self.inner.read().await.clone()
    }

    pub async fn store(&self, secret: Option<String>) {
        *self.inner.write().await = secret;
    }

    pub async fn clear(&self) {
        *self.inner.write().await = None;
    }
}

/// Process-wide state: chain configuration plus the secret read-cache.
#[derive(Debug)]
pub struct Session {
    config: ChainConfig,
    cache: SecretCache,
}

impl Session {
    /// Construct a standalone session. Used by tests and by callers that
    /// manage their own lifecycle.
    pub fn new(config: ChainConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            cache: SecretCache::default(),
        })
    }

    /// One-time process bootstrap. The first call installs the session;
    /// later calls return the existing one unchanged. Configuration problems
    /// surface from [`ChainConfig::validate`] or lazily at the first chain
    /// call, not here.
    pub fn initialize(config: ChainConfig) -> Arc<Self> {
        SESSION.get_or_init(|| Session::new(config)).clone()
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn cache(&self) -> &SecretCache {
        &self.cache
    }

    /// End-of-lifecycle hook: drop the cached secret.
    pub async fn shutdown(&self) {
        self.cache.clear().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sepolia_config_validates() {
        ChainConfig::sepolia().validate().unwrap();
    }

    #[test]
    fn bad_contract_address_is_rejected() {
        let config = ChainConfig {
            contract: "0x1234".into(),
            ..ChainConfig::sepolia()
        };
        assert!(matches!(
            config.validate(),
            Err(SessionError::InvalidContract(_))
        ));
    }

    #[test]
    fn non_http_transport_is_rejected() {
        let config = ChainConfig {
            rpc_url: "ws://rpc.sepolia.org".into(),
            ..ChainConfig::sepolia()
        };
        assert!(matches!(
            config.validate(),
            Err(SessionError::InvalidRpcUrl(_))
        ));
    }

    #[tokio::test]
    async fn cache_round_trip_and_shutdown() {
        let session = Session::new(ChainConfig::sepolia());
        assert_eq!(session.cache().get().await, None);

        session.cache().store(Some("0xdeadbeef".into())).await;
        assert_eq!(session.cache().get().await.as_deref(), Some("0xdeadbeef"));

        session.shutdown().await;
        assert_eq!(session.cache().get().await, None);
    }

    #[test]
    fn initialize_returns_one_instance() {
        let a = Session::initialize(ChainConfig::sepolia());
        let b = Session::initialize(ChainConfig {
            chain_id: 1,
            ..ChainConfig::sepolia()
        });
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(b.config().chain_id, SEPOLIA_CHAIN_ID);
    }
}
