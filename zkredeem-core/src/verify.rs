//! Client-side attestation signature verification.
//!
//! An attestation carries two ECDSA signatures: the allocator's, binding the
//! task and schema to a specific validator, and the validator's, binding the
//! attestation body (and the recipient, when present). Both are checked by
//! recovering the signer from a keccak256 hash of the ABI-encoded message
//! and comparing it to the address named in the attestation.
//!
//! The result is a plain `bool`: callers get no detail on which check
//! failed, matching the behavior of the Transgate SDK validator.

use ethers_core::abi::{encode, Token};
use ethers_core::types::{Address, RecoveryMessage, Signature, H256};
use ethers_core::utils::keccak256;

use crate::encoding;
use crate::types::AttestationResult;
use crate::ChainFamily;

/// Verify both attestation signatures for the given chain family.
pub fn verify_attestation(
    chain: ChainFamily,
    schema_id: &str,
    result: &AttestationResult,
) -> bool {
    match chain {
        ChainFamily::Evm => verify_evm(schema_id, result),
    }
}

fn verify_evm(schema_id: &str, result: &AttestationResult) -> bool {
    let Ok(validator) = encoding::parse_address(&result.validator_address) else {
        return false;
    };
    let Ok(allocator) = encoding::parse_address(&result.allocator_address) else {
        return false;
    };
    let validator = Address::from(validator);
    let allocator = Address::from(allocator);

    let recipient = match &result.recipient {
        Some(r) => match encoding::parse_address(r) {
            Ok(a) => Some(Address::from(a)),
            Err(_) => return false,
        },
        None => None,
    };

    let Ok(u_hash) = encoding::parse_hex32(&result.u_hash) else {
        return false;
    };
    let Ok(public_fields_hash) = encoding::parse_hex32(&result.public_fields_hash) else {
        return false;
    };

    let allocator_hash = allocator_message_hash(&result.task_id, schema_id, validator);
    if !signature_matches(&result.allocator_signature, allocator_hash, allocator) {
        return false;
    }

    let validator_hash = validator_message_hash(
        &result.task_id,
        schema_id,
        u_hash,
        public_fields_hash,
        recipient,
    );
    signature_matches(&result.validator_signature, validator_hash, validator)
}

/// keccak256(abi.encode(taskId bytes, schemaId bytes, validator address))
pub fn allocator_message_hash(task_id: &str, schema_id: &str, validator: Address) -> H256 {
    let encoded = encode(&[
        Token::Bytes(task_id.as_bytes().to_vec()),
        Token::Bytes(schema_id.as_bytes().to_vec()),
        Token::Address(validator),
    ]);
    H256::from(keccak256(encoded))
}

/// keccak256(abi.encode(taskId bytes, schemaId bytes, uHash, publicFieldsHash
/// [, recipient address]))
pub fn validator_message_hash(
    task_id: &str,
    schema_id: &str,
    u_hash: [u8; 32],
    public_fields_hash: [u8; 32],
    recipient: Option<Address>,
) -> H256 {
    let mut tokens = vec![
        Token::Bytes(task_id.as_bytes().to_vec()),
        Token::Bytes(schema_id.as_bytes().to_vec()),
        Token::FixedBytes(u_hash.to_vec()),
        Token::FixedBytes(public_fields_hash.to_vec()),
    ];
    if let Some(recipient) = recipient {
        tokens.push(Token::Address(recipient));
    }
    H256::from(keccak256(encode(&tokens)))
}

fn signature_matches(signature_hex: &str, hash: H256, expected: Address) -> bool {
    let Ok(bytes) = encoding::parse_signature(signature_hex) else {
        return false;
    };
    let Ok(signature) = Signature::try_from(bytes.as_slice()) else {
        return false;
    };
    match signature.recover(RecoveryMessage::Hash(hash)) {
        Ok(recovered) => recovered == expected,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::signers::{LocalWallet, Signer};

    const SCHEMA_ID: &str = "d377286f79644092bcd253ec629c647a";
    const TASK_ID: &str = "task-7f3b";

    fn signed_attestation(recipient: Option<Address>) -> AttestationResult {
        let allocator_wallet = LocalWallet::new(&mut rand::thread_rng());
        let validator_wallet = LocalWallet::new(&mut rand::thread_rng());
        let validator = validator_wallet.address();
        let allocator = allocator_wallet.address();

        let u_hash = [0x5au8; 32];
        let public_fields_hash = [0xc3u8; 32];

        let allocator_sig = allocator_wallet
            .sign_hash(allocator_message_hash(TASK_ID, SCHEMA_ID, validator))
            .unwrap();
        let validator_sig = validator_wallet
            .sign_hash(validator_message_hash(
                TASK_ID,
                SCHEMA_ID,
                u_hash,
                public_fields_hash,
                recipient,
            ))
            .unwrap();

        AttestationResult {
            task_id: TASK_ID.into(),
            u_hash: format!("0x{}", hex::encode(u_hash)),
            public_fields_hash: format!("0x{}", hex::encode(public_fields_hash)),
            validator_address: format!("0x{}", hex::encode(validator.as_bytes())),
            allocator_address: format!("0x{}", hex::encode(allocator.as_bytes())),
            allocator_signature: format!("0x{}", hex::encode(allocator_sig.to_vec())),
            validator_signature: format!("0x{}", hex::encode(validator_sig.to_vec())),
            recipient: recipient.map(|r| format!("0x{}", hex::encode(r.as_bytes()))),
        }
    }

    #[test]
    fn well_signed_attestation_verifies() {
        let res = signed_attestation(None);
        assert!(verify_attestation(ChainFamily::Evm, SCHEMA_ID, &res));
    }

    #[test]
    fn attestation_bound_to_recipient_verifies() {
        let recipient = LocalWallet::new(&mut rand::thread_rng()).address();
        let res = signed_attestation(Some(recipient));
        assert!(verify_attestation(ChainFamily::Evm, SCHEMA_ID, &res));
    }

    #[test]
    fn wrong_schema_fails() {
        let res = signed_attestation(None);
        assert!(!verify_attestation(ChainFamily::Evm, "another-schema", &res));
    }

    #[test]
    fn tampered_u_hash_fails() {
        let mut res = signed_attestation(None);
        res.u_hash = format!("0x{}", "00".repeat(32));
        assert!(!verify_attestation(ChainFamily::Evm, SCHEMA_ID, &res));
    }

    #[test]
    fn swapped_validator_fails() {
        let mut res = signed_attestation(None);
        res.validator_address = format!("0x{}", "11".repeat(20));
        assert!(!verify_attestation(ChainFamily::Evm, SCHEMA_ID, &res));
    }

    #[test]
    fn malformed_fields_fail_closed() {
        let mut res = signed_attestation(None);
        res.allocator_signature = "0x1234".into();
        assert!(!verify_attestation(ChainFamily::Evm, SCHEMA_ID, &res));

        let mut res = signed_attestation(None);
        res.validator_address = "not-hex".into();
        assert!(!verify_attestation(ChainFamily::Evm, SCHEMA_ID, &res));
    }
}
