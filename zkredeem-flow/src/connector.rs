//! Collaborator interfaces the flow depends on.
//!
//! Four external parties take part in a verification attempt: the proof
//! tool, the wallet provider, the signer it hands out, and the secret
//! contract. Each is a trait so the controller can run against fakes; the
//! production implementations live in [`crate::evm`] and
//! [`crate::transgate`]. Each collaborator has its own failure shape,
//! and the controller never assumes an error's structure across the seam.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use zkredeem_core::{AttestationResult, ChainFamily, ChainParams};

/// Failure shape of the proof tool connector.
#[derive(Debug, Clone, Error)]
pub enum ConnectorError {
    /// The tool reported an error (or the user cancelled inside it).
    #[error("{message}")]
    Tool { message: String, code: i64 },

    /// The tool could not be reached at all.
    #[error("transgate transport error: {0}")]
    Transport(String),
}

/// Failure shape of the wallet provider.
#[derive(Debug, Clone, Error)]
pub enum WalletError {
    /// No injected chain-capable provider present.
    #[error("no provider detected")]
    NotDetected,

    /// The user declined the wallet prompt.
    #[error("{0}")]
    Rejected(String),
}

/// Failure shape of the secret contract.
#[derive(Debug, Clone, Error)]
pub enum ContractError {
    /// Transaction rejected before inclusion.
    #[error("transaction rejected: {0}")]
    Rejected(String),

    /// Transaction included but reverted.
    #[error("transaction reverted: {0}")]
    Reverted(String),

    /// Transport / RPC failure.
    #[error("rpc error: {0}")]
    Rpc(String),
}

/// External proof tool: availability probe, handshake, and local signature
/// validation over the handshake's result.
#[async_trait]
pub trait ProofConnector: Send + Sync {
    /// Whether the tool is present in the current context.
    async fn is_available(&self) -> Result<bool, ConnectorError>;

    /// Run the proof handshake for a schema and recipient. Suspends until
    /// the tool returns an attestation or the user cancels inside it.
    async fn launch(
        &self,
        schema_id: &str,
        recipient: &str,
    ) -> Result<AttestationResult, ConnectorError>;

    /// Validate the attestation's signatures. No detail beyond the bool.
    fn verify_signature(
        &self,
        chain: ChainFamily,
        schema_id: &str,
        result: &AttestationResult,
    ) -> bool;
}

/// Account-control abstraction handed out by the provider.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// The active account address, 0x-prefixed. May suspend on user
    /// approval and may be rejected.
    async fn address(&self) -> Result<String, WalletError>;
}

/// Chain-capable provider injected into the environment.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Whether a provider is present at all.
    fn is_detected(&self) -> bool;

    /// Obtain the active signer.
    async fn signer(&self) -> Result<Box<dyn WalletSigner>, WalletError>;
}

/// The on-chain secret contract: one write, one read.
#[async_trait]
pub trait SecretContract: Send + Sync {
    /// Submit the payload; resolves with a transaction id once accepted.
    async fn assign_secret(&self, params: &ChainParams) -> Result<String, ContractError>;

    /// Read the current secret value, `None` when unset.
    async fn get_secret(&self) -> Result<Option<String>, ContractError>;
}

/// The full collaborator set a controller is constructed with.
#[derive(Clone)]
pub struct Collaborators {
    pub connector: Arc<dyn ProofConnector>,
    pub wallet: Arc<dyn WalletProvider>,
    pub contract: Arc<dyn SecretContract>,
}
