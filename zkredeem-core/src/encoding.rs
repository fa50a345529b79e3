//! Hex and ABI encoding helpers.
//!
//! The contract takes the task and schema identifiers as their raw UTF-8
//! bytes, and all hashes, addresses, and signatures as fixed-width values
//! parsed from the attestation's 0x-prefixed hex strings.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// 0x-prefixed hex of a string's UTF-8 bytes.
///
/// Equivalent of `hexlify(toUtf8Bytes(s))` on the submitting side; the
/// contract receives identifiers in this form.
pub fn hexlify_utf8(s: &str) -> String {
    format!("0x{}", hex::encode(s.as_bytes()))
}

/// Decode a 0x-prefixed (or bare) hex string.
pub fn parse_hex_bytes(s: &str) -> Result<Vec<u8>, EncodingError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(s).map_err(|e| EncodingError::InvalidHex(e.to_string()))
}

/// Decode a hex string into exactly 32 bytes.
pub fn parse_hex32(s: &str) -> Result<[u8; 32], EncodingError> {
    let bytes = parse_hex_bytes(s)?;
    if bytes.len() != 32 {
        return Err(EncodingError::InvalidLength {
            expected: 32,
            got: bytes.len(),
        });
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes);
    Ok(out)
}

/// Decode a hex string into a 20-byte address.
pub fn parse_address(s: &str) -> Result<[u8; 20], EncodingError> {
    let bytes = parse_hex_bytes(s).map_err(|_| EncodingError::InvalidAddress(s.to_string()))?;
    if bytes.len() != 20 {
        return Err(EncodingError::InvalidAddress(s.to_string()));
    }
    let mut out = [0u8; 20];
    out.copy_from_slice(&bytes);
    Ok(out)
}

/// Decode a hex string into a 65-byte ECDSA signature.
pub fn parse_signature(s: &str) -> Result<Vec<u8>, EncodingError> {
    let bytes = parse_hex_bytes(s)?;
    if bytes.len() != 65 {
        return Err(EncodingError::InvalidLength {
            expected: 65,
            got: bytes.len(),
        });
    }
    Ok(bytes)
}

/// Format a 20-byte address as a 0x-prefixed hex string.
pub fn format_address(addr: &[u8; 20]) -> String {
    format!("0x{}", hex::encode(addr))
}

#[cfg(feature = "ethers")]
pub use abi::chain_params_token;

#[cfg(feature = "ethers")]
mod abi {
    use ethers_core::abi::Token;
    use ethers_core::types::Address;

    use crate::types::ChainParams;

    /// Convert the submission payload into the ordered ABI tuple taken by
    /// `assignSecret((bytes,bytes,bytes32,address,bytes32,address,bytes,bytes))`.
    pub fn chain_params_token(params: &ChainParams) -> Token {
        Token::Tuple(vec![
            Token::Bytes(params.task_id.clone()),
            Token::Bytes(params.schema_id.clone()),
            Token::FixedBytes(params.u_hash.to_vec()),
            Token::Address(Address::from(params.recipient)),
            Token::FixedBytes(params.public_fields_hash.to_vec()),
            Token::Address(Address::from(params.validator)),
            Token::Bytes(params.allocator_signature.clone()),
            Token::Bytes(params.validator_signature.clone()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hexlify_matches_utf8_bytes() {
        assert_eq!(hexlify_utf8("abc"), "0x616263");
        assert_eq!(
            hexlify_utf8("d377286f79644092bcd253ec629c647a"),
            format!("0x{}", hex::encode("d377286f79644092bcd253ec629c647a")),
        );
    }

    #[test]
    fn parse_hex32_accepts_both_prefixes() {
        let with = format!("0x{}", "11".repeat(32));
        let without = "11".repeat(32);
        assert_eq!(parse_hex32(&with).unwrap(), [0x11u8; 32]);
        assert_eq!(parse_hex32(&without).unwrap(), [0x11u8; 32]);
    }

    #[test]
    fn parse_hex32_rejects_wrong_length() {
        let err = parse_hex32("0x1234").unwrap_err();
        assert!(matches!(
            err,
            EncodingError::InvalidLength {
                expected: 32,
                got: 2
            }
        ));
    }

    #[test]
    fn parse_address_rejects_garbage() {
        assert!(parse_address("0xzz").is_err());
        assert!(parse_address("0x1234").is_err());
        let addr = format!("0x{}", "ab".repeat(20));
        assert_eq!(parse_address(&addr).unwrap(), [0xabu8; 20]);
    }

    #[test]
    fn parse_signature_requires_65_bytes() {
        let sig = format!("0x{}", "01".repeat(65));
        assert_eq!(parse_signature(&sig).unwrap().len(), 65);
        assert!(parse_signature(&format!("0x{}", "01".repeat(64))).is_err());
    }
}
