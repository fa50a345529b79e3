//! zkredeem-flow
//!
//! The end-to-end proof-and-submit protocol: drive the external Transgate
//! handshake, verify the returned attestation locally, submit the payload to
//! the secret contract, and refresh the unlocked secret for display.
//!
//! The flow is an explicit state machine ([`controller::FlowController`])
//! over four injected collaborator interfaces ([`connector`]), so the whole
//! protocol is unit-testable with fakes. Production collaborators live in
//! [`evm`] and [`transgate`]; process-wide setup in [`session`].

pub mod connector;
pub mod controller;
pub mod evm;
pub mod session;
pub mod transgate;

pub use connector::{
    Collaborators, ConnectorError, ContractError, ProofConnector, SecretContract, WalletError,
    WalletProvider, WalletSigner,
};
pub use controller::{FlowController, FlowPhase, FlowSnapshot, FlowSuccess};
pub use session::{ChainConfig, SecretCache, Session};
