//! zkredeem-core
//!
//! Domain types and encoding logic for redeeming zkPass Transgate
//! attestations against an EVM contract. This crate holds the attestation
//! and payload structures, the flow error taxonomy, and the client-side
//! signature verification performed before anything is submitted on-chain.

use serde::{Deserialize, Serialize};

pub mod encoding;
pub mod error;
pub mod types;
#[cfg(feature = "ethers")]
pub mod verify;

pub use error::{ErrorKind, FlowError};
pub use types::{AttestationResult, ChainParams, VerifyIdentifiers};

/// Default verifier application id, user-editable at the surface.
pub const DEFAULT_APP_ID: &str = "68c92aba-8546-4335-88b6-dbc8400e850b";

/// Default attestation schema id, user-editable at the surface.
pub const DEFAULT_SCHEMA_ID: &str = "d377286f79644092bcd253ec629c647a";

/// Chain family the attestation signatures are checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChainFamily {
    /// EVM-compatible chain
    #[default]
    Evm,
}

impl ChainFamily {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainFamily::Evm => "evm",
        }
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "evm" => Some(ChainFamily::Evm),
            _ => None,
        }
    }
}

impl std::fmt::Display for ChainFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
