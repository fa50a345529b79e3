//! Verification flow controller.
//!
//! Runs the proof-and-submit protocol exactly once per submission, strictly
//! in order: tool availability, provider detection, signer address, proof
//! handshake, signature validation, contract write, secret refetch. Each
//! step is a suspension point; every failure is adapted into a
//! [`FlowError`] at its own seam and collapsed to one displayable message.
//!
//! Overlapping submissions are resolved by attempt id: every snapshot write
//! is tagged with the attempt that produced it and discarded if a newer
//! attempt has started since. Only the latest attempt's outcome is ever
//! visible.
//!
//! There is no controller-side timeout or cancel: a hung external call
//! hangs its attempt. The only cancellation path is the user cancelling
//! inside the proof tool, observed here as a handshake failure.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use zkredeem_core::{AttestationResult, ChainFamily, ChainParams, FlowError, VerifyIdentifiers};

use crate::connector::{Collaborators, ConnectorError, WalletError};
use crate::session::Session;

/// Phase of a verification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FlowPhase {
    #[default]
    Idle,
    CheckingTool,
    DetectingProvider,
    FetchingSigner,
    AwaitingAttestation,
    ValidatingSignatures,
    Submitting,
    Refreshing,
    Succeeded,
    Failed,
}

impl FlowPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowPhase::Idle => "idle",
            FlowPhase::CheckingTool => "checking_tool",
            FlowPhase::DetectingProvider => "detecting_provider",
            FlowPhase::FetchingSigner => "fetching_signer",
            FlowPhase::AwaitingAttestation => "awaiting_attestation",
            FlowPhase::ValidatingSignatures => "validating_signatures",
            FlowPhase::Submitting => "submitting",
            FlowPhase::Refreshing => "refreshing",
            FlowPhase::Succeeded => "succeeded",
            FlowPhase::Failed => "failed",
        }
    }

    /// Terminal for the attempt; a new submission may start from here.
    pub fn is_terminal(&self) -> bool {
        matches!(self, FlowPhase::Idle | FlowPhase::Succeeded | FlowPhase::Failed)
    }
}

impl std::fmt::Display for FlowPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Observable state for the display layer.
///
/// On failure, `result` and `secret` retain their prior values; only
/// `error_message` is (re)written.
#[derive(Debug, Clone, Default)]
pub struct FlowSnapshot {
    pub phase: FlowPhase,
    pub result: Option<AttestationResult>,
    pub secret: Option<String>,
    pub error_message: Option<String>,
    pub is_submitting: bool,
    pub attempt: u64,
}

/// Outcome of a successful attempt.
#[derive(Debug, Clone)]
pub struct FlowSuccess {
    pub result: AttestationResult,
    pub secret: Option<String>,
    pub tx_id: String,
}

pub struct FlowController {
    session: Arc<Session>,
    collaborators: Collaborators,
    attempt: AtomicU64,
    snapshot: RwLock<FlowSnapshot>,
}

impl FlowController {
    pub fn new(session: Arc<Session>, collaborators: Collaborators) -> Self {
        Self {
            session,
            collaborators,
            attempt: AtomicU64::new(0),
            snapshot: RwLock::new(FlowSnapshot::default()),
        }
    }

    /// Current observable state.
    pub async fn snapshot(&self) -> FlowSnapshot {
        self.snapshot.read().await.clone()
    }

    /// Run one verification attempt end to end.
    pub async fn submit(&self, ids: &VerifyIdentifiers) -> Result<FlowSuccess, FlowError> {
        let attempt = self.attempt.fetch_add(1, Ordering::SeqCst) + 1;
        info!(attempt, app_id = %ids.app_id, schema_id = %ids.schema_id, "starting verification attempt");

        // Clear the previous error before the first suspension point.
        self.commit(attempt, |s| {
            s.attempt = attempt;
            s.error_message = None;
            s.is_submitting = true;
            s.phase = FlowPhase::CheckingTool;
        })
        .await;

        let outcome = self.run(attempt, ids).await;

        match &outcome {
            Ok(success) => {
                let secret = success.secret.clone();
                self.commit(attempt, |s| {
                    s.secret = secret;
                    s.error_message = None;
                    s.is_submitting = false;
                    s.phase = FlowPhase::Succeeded;
                })
                .await;
                info!(attempt, tx_id = %success.tx_id, "verification attempt succeeded");
            }
            Err(err) => {
                let message = err.message();
                self.commit(attempt, |s| {
                    s.error_message = Some(message);
                    s.is_submitting = false;
                    s.phase = FlowPhase::Failed;
                })
                .await;
                warn!(attempt, kind = ?err.kind(), "verification attempt failed: {}", err.message());
            }
        }

        outcome
    }

    async fn run(
        &self,
        attempt: u64,
        ids: &VerifyIdentifiers,
    ) -> Result<FlowSuccess, FlowError> {
        let Collaborators {
            connector,
            wallet,
            contract,
        } = &self.collaborators;

        // Tool availability. A transport failure while probing is a
        // handshake-level failure; a clean "no" is tool-unavailable.
        let available = connector
            .is_available()
            .await
            .map_err(connector_error_to_flow)?;
        if !available {
            return Err(FlowError::ToolUnavailable);
        }

        // Provider detection.
        self.advance(attempt, FlowPhase::DetectingProvider).await;
        if !wallet.is_detected() {
            return Err(FlowError::ProviderMissing);
        }

        // Signer address; user approval may be rejected.
        self.advance(attempt, FlowPhase::FetchingSigner).await;
        let signer = wallet.signer().await.map_err(wallet_error_to_flow)?;
        let recipient_hex = signer.address().await.map_err(wallet_error_to_flow)?;
        // Nothing has been submitted yet, so an unusable address is not a
        // submission failure; it has no kind of its own.
        let recipient = zkredeem_core::encoding::parse_address(&recipient_hex).map_err(|e| {
            warn!(attempt, address = %recipient_hex, "signer returned an unusable address: {e}");
            FlowError::Unknown
        })?;
        debug!(attempt, recipient = %recipient_hex, "signer address obtained");

        // Proof handshake.
        self.advance(attempt, FlowPhase::AwaitingAttestation).await;
        let result = connector
            .launch(&ids.schema_id, &recipient_hex)
            .await
            .map_err(connector_error_to_flow)?;
        debug!(attempt, task_id = %result.task_id, "handshake returned an attestation");

        // Local signature validation. No contract write happens unless this
        // returns true.
        self.advance(attempt, FlowPhase::ValidatingSignatures).await;
        if !connector.verify_signature(ChainFamily::Evm, &ids.schema_id, &result) {
            return Err(FlowError::ValidationFailed);
        }

        // The attestation is committed as soon as it is known good, so a
        // later failure still leaves it visible.
        {
            let result = result.clone();
            self.commit(attempt, move |s| {
                s.result = Some(result);
                s.phase = FlowPhase::Submitting;
            })
            .await;
        }

        // Same reasoning: a malformed attestation is caught before the write,
        // so it is not a submission failure.
        let params = ChainParams::build(&result, &ids.schema_id, recipient).map_err(|e| {
            warn!(attempt, task_id = %result.task_id, "attestation fields do not decode: {e}");
            FlowError::Unknown
        })?;

        let tx_id = contract
            .assign_secret(&params)
            .await
            .map_err(|e| FlowError::SubmissionFailed(e.to_string()))?;
        info!(attempt, %tx_id, "secret assignment accepted");

        // Refresh the stored secret. The write has landed; a failure here is
        // a partial failure, not a success.
        self.advance(attempt, FlowPhase::Refreshing).await;
        let secret = contract.get_secret().await.map_err(|e| {
            FlowError::RefetchFailed(format!(
                "transaction {tx_id} accepted, but refreshing the secret failed: {e}"
            ))
        })?;
        self.session.cache().store(secret.clone()).await;

        Ok(FlowSuccess {
            result,
            secret,
            tx_id,
        })
    }

    async fn advance(&self, attempt: u64, phase: FlowPhase) {
        self.commit(attempt, move |s| s.phase = phase).await;
    }

    /// Apply a snapshot write only if `attempt` is still the latest.
    async fn commit(&self, attempt: u64, apply: impl FnOnce(&mut FlowSnapshot)) {
        if self.attempt.load(Ordering::SeqCst) != attempt {
            debug!(attempt, "discarding snapshot write from superseded attempt");
            return;
        }
        let mut snapshot = self.snapshot.write().await;
        // Re-check under the lock so a newer attempt's writes never lose.
        if self.attempt.load(Ordering::SeqCst) != attempt {
            return;
        }
        apply(&mut snapshot);
    }
}

fn connector_error_to_flow(err: ConnectorError) -> FlowError {
    match err {
        ConnectorError::Tool { message, code } => FlowError::HandshakeFailed { message, code },
        ConnectorError::Transport(message) => FlowError::HandshakeFailed { message, code: 0 },
    }
}

fn wallet_error_to_flow(err: WalletError) -> FlowError {
    match err {
        WalletError::NotDetected => FlowError::ProviderMissing,
        WalletError::Rejected(message) => FlowError::UserRejected(message),
    }
}
