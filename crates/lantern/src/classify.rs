//! Error classification for retry decisions.
//!
//! Raw failures from caller-supplied operations are normalized into a
//! [`ClassifiedError`]: a closed taxonomy code, a display-ready message, a
//! retryability verdict, and a remedial suggestion. Classification is a pure
//! function of the error's textual content: identical inputs always produce
//! identical classifications.

use crate::error::BoxError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Closed set of failure categories the engine distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The wallet (or an equivalent approval collaborator) refused the request
    UserRejected,
    /// The wallet balance cannot cover the transaction
    InsufficientFunds,
    /// The transaction failed validation (constraint or circuit rejection)
    InvalidTransaction,
    /// An operation exceeded its deadline
    Timeout,
    /// A required service (proof server, node) is not responding
    ServiceUnavailable,
    /// Connectivity failure between the caller and a remote endpoint
    NetworkError,
    /// Anything the pattern table does not recognize
    Unknown,
}

impl ErrorCode {
    /// Whether failures of this category are worth retrying by default.
    ///
    /// Unknown failures are assumed transient: retrying an unrecognized error
    /// is cheap, while giving up on a recoverable one loses the submission.
    pub fn default_retryable(self) -> bool {
        match self {
            ErrorCode::UserRejected
            | ErrorCode::InsufficientFunds
            | ErrorCode::InvalidTransaction => false,
            ErrorCode::Timeout
            | ErrorCode::ServiceUnavailable
            | ErrorCode::NetworkError
            | ErrorCode::Unknown => true,
        }
    }

    /// Remedial suggestion suitable for direct display to the user.
    pub fn suggestion(self) -> &'static str {
        match self {
            ErrorCode::UserRejected => {
                "Approval was declined in the wallet. \
                 Re-submit and approve the request when prompted."
            }
            ErrorCode::InsufficientFunds => {
                "The wallet balance cannot cover this transaction. \
                 Fund the wallet (e.g. from the testnet faucet) and try again."
            }
            ErrorCode::InvalidTransaction => {
                "The transaction failed validation. \
                 Check the contract state and input values before resubmitting."
            }
            ErrorCode::Timeout => {
                "The operation took too long. \
                 The proof server may be under load; retrying usually succeeds."
            }
            ErrorCode::ServiceUnavailable => {
                "A required service is not responding. \
                 Check that the proof server container is running and reachable."
            }
            ErrorCode::NetworkError => {
                "A network error interrupted the operation. \
                 Check connectivity to the node and indexer endpoints, then retry."
            }
            ErrorCode::Unknown => {
                "An unexpected error occurred. \
                 Retrying may succeed; check the logs if it persists."
            }
        }
    }

    /// Stable identifier used in logs and serialized output.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::UserRejected => "USER_REJECTED",
            ErrorCode::InsufficientFunds => "INSUFFICIENT_FUNDS",
            ErrorCode::InvalidTransaction => "INVALID_TRANSACTION",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            ErrorCode::NetworkError => "NETWORK_ERROR",
            ErrorCode::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw failure normalized into a structured, display-ready descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("{message}")]
pub struct ClassifiedError {
    /// Failure category
    pub code: ErrorCode,
    /// Human-readable message (the raw error's text)
    pub message: String,
    /// Whether a retry is worth attempting
    pub retryable: bool,
    /// Remedial suggestion suitable for direct display
    pub suggestion: String,
}

impl ClassifiedError {
    /// Build a classified error for a known category with a custom message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            retryable: code.default_retryable(),
            suggestion: code.suggestion().to_string(),
        }
    }
}

/// Ordered pattern table mapping message substrings to categories.
///
/// Evaluated top to bottom, first match wins. Non-retryable categories are
/// listed before retryable ones so that a message like "transaction rejected
/// due to network policy" resolves to the user rejection, not to a retryable
/// network error.
const PATTERNS: &[(ErrorCode, &[&str])] = &[
    (
        ErrorCode::UserRejected,
        &["rejected", "denied", "declined", "user refused", "cancelled by user"],
    ),
    (
        ErrorCode::InsufficientFunds,
        &["insufficient", "not enough", "balance too low"],
    ),
    (
        ErrorCode::InvalidTransaction,
        &["constraint", "circuit", "invalid", "malformed", "verification failed"],
    ),
    (
        ErrorCode::Timeout,
        &["timeout", "timed out", "deadline exceeded"],
    ),
    (
        ErrorCode::ServiceUnavailable,
        &["unavailable", "503", "502", "connection refused", "overloaded"],
    ),
    (
        ErrorCode::NetworkError,
        &["network", "connection", "connect", "socket", "dns", "unreachable"],
    ),
];

/// Classify a raw operation failure.
///
/// An error that already is a [`ClassifiedError`] passes through unchanged,
/// so callers can pre-classify failures they understand better than the
/// pattern table does. Otherwise the error's display text and its `source()`
/// chain are matched against the table. Total: every input produces a
/// classification.
pub fn classify(error: &BoxError) -> ClassifiedError {
    if let Some(classified) = error.downcast_ref::<ClassifiedError>() {
        return classified.clone();
    }

    // Collect the full chain so a wrapped cause (e.g. "request failed:
    // connection refused") still matches.
    let top: &(dyn std::error::Error) = error.as_ref();
    let mut text = top.to_string();
    let mut source = top.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }

    classify_message(&text)
}

/// Classify a failure from its message text alone.
pub fn classify_message(message: &str) -> ClassifiedError {
    let lowered = message.to_lowercase();

    for (code, needles) in PATTERNS {
        if needles.iter().any(|needle| lowered.contains(needle)) {
            return ClassifiedError::new(*code, message);
        }
    }

    ClassifiedError::new(ErrorCode::Unknown, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_rejection_not_retryable() {
        let err = classify_message("Transaction rejected by user");
        assert_eq!(err.code, ErrorCode::UserRejected);
        assert!(!err.retryable);
    }

    #[test]
    fn test_rejection_wins_over_network() {
        // Non-retryable patterns are checked first: a message containing both
        // "rejected" and "network" must not classify as a retryable network error.
        let err = classify_message("signing request rejected (network: testnet)");
        assert_eq!(err.code, ErrorCode::UserRejected);
        assert!(!err.retryable);
    }

    #[test]
    fn test_insufficient_balance_not_retryable() {
        let err = classify_message("insufficient balance: 0 tDUST available");
        assert_eq!(err.code, ErrorCode::InsufficientFunds);
        assert!(!err.retryable);
        assert!(err.suggestion.contains("faucet"));
    }

    #[test]
    fn test_circuit_failure_not_retryable() {
        let err = classify_message("proof generation failed: circuit constraint 7 not satisfied");
        assert_eq!(err.code, ErrorCode::InvalidTransaction);
        assert!(!err.retryable);
    }

    #[test]
    fn test_timeout_retryable() {
        let err = classify_message("proof request timed out after 60s");
        assert_eq!(err.code, ErrorCode::Timeout);
        assert!(err.retryable);
    }

    #[test]
    fn test_service_unavailable_retryable() {
        let err = classify_message("HTTP 503: service unavailable");
        assert_eq!(err.code, ErrorCode::ServiceUnavailable);
        assert!(err.retryable);
    }

    #[test]
    fn test_connection_refused_is_service_unavailable() {
        let err = classify_message("connection refused (os error 61)");
        assert_eq!(err.code, ErrorCode::ServiceUnavailable);
        assert!(err.retryable);
    }

    #[test]
    fn test_network_error_retryable() {
        let err = classify_message("network unreachable");
        assert_eq!(err.code, ErrorCode::NetworkError);
        assert!(err.retryable);
    }

    #[test]
    fn test_unknown_defaults_to_retryable() {
        let err = classify_message("something completely unexpected happened");
        assert_eq!(err.code, ErrorCode::Unknown);
        assert!(err.retryable);
    }

    #[test]
    fn test_classification_is_case_insensitive() {
        let err = classify_message("CONNECTION REFUSED");
        assert_eq!(err.code, ErrorCode::ServiceUnavailable);
    }

    #[test]
    fn test_message_preserved_verbatim() {
        let err = classify_message("Timed Out waiting for prover");
        assert_eq!(err.message, "Timed Out waiting for prover");
    }

    #[test]
    fn test_preclassified_error_passes_through() {
        let original = ClassifiedError {
            code: ErrorCode::NetworkError,
            message: "wrapped by the caller".to_string(),
            retryable: false, // caller overrode the default
            suggestion: "custom advice".to_string(),
        };
        let boxed: BoxError = Box::new(original.clone());
        assert_eq!(classify(&boxed), original);
    }

    #[test]
    fn test_source_chain_is_searched() {
        #[derive(Debug, thiserror::Error)]
        #[error("submit failed")]
        struct Outer(#[source] std::io::Error);

        let inner = std::io::Error::other("connection refused");
        let boxed: BoxError = Box::new(Outer(inner));
        let err = classify(&boxed);
        assert_eq!(err.code, ErrorCode::ServiceUnavailable);
        assert!(err.message.contains("submit failed"));
    }

    #[test]
    fn test_codes_serialize_screaming_snake() {
        let err = classify_message("insufficient funds");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "INSUFFICIENT_FUNDS");
        assert_eq!(json["retryable"], false);
        assert!(json["suggestion"].as_str().unwrap().len() > 10);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let a = classify_message("socket closed mid-transfer");
        let b = classify_message("socket closed mid-transfer");
        assert_eq!(a, b);
    }
}
