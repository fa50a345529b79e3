//! Flow error taxonomy.
//!
//! Every failure a verification attempt can hit is mapped into one of these
//! kinds by a narrow adapter at its suspension point. The display layer gets
//! a single string per attempt via [`FlowError::message`].

use thiserror::Error;

/// Fallback text for failures that carry no message of their own.
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error occurred";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    /// External proof tool not installed or not enabled.
    #[error("zkPass Transgate not available. Install it from the Chrome Web Store.")]
    ToolUnavailable,

    /// No chain-capable provider present.
    #[error("Ethereum provider not found. Ensure MetaMask is installed.")]
    ProviderMissing,

    /// User declined a wallet prompt.
    #[error("{0}")]
    UserRejected(String),

    /// Proof handshake returned an error or was cancelled inside the tool.
    #[error("{message}")]
    HandshakeFailed { message: String, code: i64 },

    /// Attestation signatures did not verify. The validator yields no
    /// further detail.
    #[error("attestation signature validation failed")]
    ValidationFailed,

    /// Contract write rejected or reverted.
    #[error("{0}")]
    SubmissionFailed(String),

    /// The write was accepted but the follow-up secret read failed.
    #[error("{0}")]
    RefetchFailed(String),

    /// Anything without a message of its own.
    #[error("Unknown error occurred")]
    Unknown,
}

/// Discriminant-only view of [`FlowError`], for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ToolUnavailable,
    ProviderMissing,
    UserRejected,
    HandshakeFailed,
    ValidationFailed,
    SubmissionFailed,
    RefetchFailed,
    Unknown,
}

impl FlowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FlowError::ToolUnavailable => ErrorKind::ToolUnavailable,
            FlowError::ProviderMissing => ErrorKind::ProviderMissing,
            FlowError::UserRejected(_) => ErrorKind::UserRejected,
            FlowError::HandshakeFailed { .. } => ErrorKind::HandshakeFailed,
            FlowError::ValidationFailed => ErrorKind::ValidationFailed,
            FlowError::SubmissionFailed(_) => ErrorKind::SubmissionFailed,
            FlowError::RefetchFailed(_) => ErrorKind::RefetchFailed,
            FlowError::Unknown => ErrorKind::Unknown,
        }
    }

    /// The single human-readable string surfaced for this failure.
    ///
    /// Failures whose underlying message is empty collapse to the fixed
    /// fallback text.
    pub fn message(&self) -> String {
        let text = self.to_string();
        if text.trim().is_empty() {
            UNKNOWN_ERROR_MESSAGE.to_string()
        } else {
            text
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_message_names_the_tool() {
        let msg = FlowError::ToolUnavailable.message();
        assert!(msg.contains("not available"));
    }

    #[test]
    fn provider_message_names_the_provider() {
        let msg = FlowError::ProviderMissing.message();
        assert!(msg.contains("provider not found"));
    }

    #[test]
    fn empty_messages_collapse_to_fallback() {
        assert_eq!(
            FlowError::UserRejected(String::new()).message(),
            UNKNOWN_ERROR_MESSAGE
        );
        assert_eq!(FlowError::Unknown.message(), UNKNOWN_ERROR_MESSAGE);
    }

    #[test]
    fn handshake_errors_surface_the_tool_text() {
        let err = FlowError::HandshakeFailed {
            message: "user cancelled".into(),
            code: 110001,
        };
        assert_eq!(err.message(), "user cancelled");
        assert_eq!(err.kind(), ErrorKind::HandshakeFailed);
    }
}
