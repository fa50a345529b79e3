//! Attestation and submission payload types.

use serde::{Deserialize, Serialize};

use crate::encoding::{self, EncodingError};

/// The two user-supplied identifiers naming the verifier application and
/// the attestation schema. Opaque strings; the only validation is presence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyIdentifiers {
    pub app_id: String,
    pub schema_id: String,
}

impl VerifyIdentifiers {
    pub fn new(app_id: impl Into<String>, schema_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            schema_id: schema_id.into(),
        }
    }

    /// Both identifiers present (non-empty after trimming).
    pub fn is_complete(&self) -> bool {
        !self.app_id.trim().is_empty() && !self.schema_id.trim().is_empty()
    }
}

impl Default for VerifyIdentifiers {
    fn default() -> Self {
        Self::new(crate::DEFAULT_APP_ID, crate::DEFAULT_SCHEMA_ID)
    }
}

/// Attestation returned by the Transgate handshake.
///
/// Produced at most once per successful handshake and immutable afterwards.
/// Field names follow the Transgate SDK's JSON wire format; hashes,
/// addresses, and signatures are 0x-prefixed hex strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationResult {
    /// Task identifier assigned by the allocator.
    pub task_id: String,
    /// Uniqueness hash binding the attestation to the underlying data.
    pub u_hash: String,
    /// Hash over the schema's public fields.
    pub public_fields_hash: String,
    /// Address of the validator node that produced the attestation.
    pub validator_address: String,
    /// Address of the allocator that assigned the task.
    pub allocator_address: String,
    /// Allocator's signature over (task id, schema id, validator).
    pub allocator_signature: String,
    /// Validator's signature over the attestation body.
    pub validator_signature: String,
    /// Recipient the attestation was generated for, when the tool echoes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
}

/// The ordered argument set submitted to the contract to unlock the secret.
///
/// Built only after the attestation's signatures verified and a signer
/// address is in hand; there is no way to construct a partial payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainParams {
    /// Task id as raw UTF-8 bytes.
    pub task_id: Vec<u8>,
    /// Schema id as raw UTF-8 bytes.
    pub schema_id: Vec<u8>,
    /// Uniqueness hash.
    pub u_hash: [u8; 32],
    /// Recipient of the secret. Always the connected signer's address,
    /// never user input.
    pub recipient: [u8; 20],
    /// Hash over the schema's public fields.
    pub public_fields_hash: [u8; 32],
    /// Validator address.
    pub validator: [u8; 20],
    /// Allocator signature (65 bytes).
    pub allocator_signature: Vec<u8>,
    /// Validator signature (65 bytes).
    pub validator_signature: Vec<u8>,
}

impl ChainParams {
    /// Derive the payload from a verified attestation, the schema id it was
    /// generated under, and the connected signer's address.
    pub fn build(
        result: &AttestationResult,
        schema_id: &str,
        recipient: [u8; 20],
    ) -> Result<Self, EncodingError> {
        Ok(Self {
            task_id: result.task_id.as_bytes().to_vec(),
            schema_id: schema_id.as_bytes().to_vec(),
            u_hash: encoding::parse_hex32(&result.u_hash)?,
            recipient,
            public_fields_hash: encoding::parse_hex32(&result.public_fields_hash)?,
            validator: encoding::parse_address(&result.validator_address)?,
            allocator_signature: encoding::parse_signature(&result.allocator_signature)?,
            validator_signature: encoding::parse_signature(&result.validator_signature)?,
        })
    }

    /// Recipient as a 0x-prefixed hex string.
    pub fn recipient_hex(&self) -> String {
        encoding::format_address(&self.recipient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_attestation() -> AttestationResult {
        AttestationResult {
            task_id: "task-0001".into(),
            u_hash: format!("0x{}", "aa".repeat(32)),
            public_fields_hash: format!("0x{}", "bb".repeat(32)),
            validator_address: format!("0x{}", "cc".repeat(20)),
            allocator_address: format!("0x{}", "dd".repeat(20)),
            allocator_signature: format!("0x{}", "01".repeat(65)),
            validator_signature: format!("0x{}", "02".repeat(65)),
            recipient: None,
        }
    }

    #[test]
    fn identifiers_default_to_prefilled_values() {
        let ids = VerifyIdentifiers::default();
        assert_eq!(ids.app_id, crate::DEFAULT_APP_ID);
        assert_eq!(ids.schema_id, crate::DEFAULT_SCHEMA_ID);
        assert!(ids.is_complete());
        assert!(!VerifyIdentifiers::new("", "x").is_complete());
    }

    #[test]
    fn attestation_uses_sdk_wire_names() {
        let json = serde_json::to_value(sample_attestation()).unwrap();
        assert!(json.get("taskId").is_some());
        assert!(json.get("uHash").is_some());
        assert!(json.get("publicFieldsHash").is_some());
        assert!(json.get("validatorAddress").is_some());
        assert!(json.get("allocatorSignature").is_some());
        // Absent optional recipient is omitted entirely.
        assert!(json.get("recipient").is_none());
    }

    #[test]
    fn chain_params_take_recipient_from_caller() {
        let res = sample_attestation();
        let recipient = [0x42u8; 20];
        let params = ChainParams::build(&res, "schema-1", recipient).unwrap();
        assert_eq!(params.recipient, recipient);
        assert_eq!(params.task_id, b"task-0001");
        assert_eq!(params.schema_id, b"schema-1");
        assert_eq!(params.u_hash, [0xaau8; 32]);
        assert_eq!(params.validator, [0xccu8; 20]);
    }

    #[test]
    fn chain_params_reject_malformed_hashes() {
        let mut res = sample_attestation();
        res.u_hash = "0x1234".into();
        assert!(ChainParams::build(&res, "schema-1", [0u8; 20]).is_err());
    }
}
