//! Error handling for the pairing protocol
//!
//! This module provides a single error type for all pairing operations.
//! Errors are automatically converted from underlying library errors using
//! `thiserror`.
//!
//! ## Error Categories
//!
//! ### I/O Errors
//! File system and general I/O failures (identity persistence).
//! Automatically converted from `std::io::Error`.
//!
//! ### Crypto Errors
//! Cipher, signature, and certificate failures.
//! Automatically converted from `openssl::error::ErrorStack`.
//!
//! ### Transport Errors
//! Failures reported by the HTTP command channel collaborator. Retry policy,
//! if any, belongs to the caller.
//!
//! ### Protocol Errors
//! Malformed host responses: missing required fields, bad hex data, or byte
//! layouts that do not match the protocol contract.
//!
//! ### Cancellation
//! A cooperatively cancelled attempt surfaces as `PairingError::Cancelled`,
//! distinct from every failure category so the caller never reports a
//! spurious failure reason for a cancel.

use thiserror::Error;

/// Result type for pairing operations
pub type Result<T> = std::result::Result<T, PairingError>;

/// Errors that can occur during pairing operations
///
/// Protocol-level *rejections* (host answered `paired=0`, signature did not
/// verify, PIN mismatch) are not errors: they are terminal
/// [`PairState`](crate::PairState) values. This enum covers everything that
/// prevents the state machine from reaching a terminal state at all.
///
/// # Examples
///
/// ```rust
/// use gamestream_pairing::PairingError;
///
/// let error = PairingError::MissingField("paired".to_string());
/// assert_eq!(error.to_string(), "Missing required field: paired");
///
/// let error = PairingError::Cancelled;
/// assert_eq!(error.to_string(), "Pairing cancelled");
/// ```
#[derive(Error, Debug)]
pub enum PairingError {
    /// I/O error (identity load/save)
    ///
    /// Automatically converted from `std::io::Error`.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Cipher, signing, or certificate error
    ///
    /// Automatically converted from `openssl::error::ErrorStack`.
    #[error("Crypto error: {0}")]
    Crypto(#[from] openssl::error::ErrorStack),

    /// The HTTP command channel failed (unreachable host, timeout, ...)
    ///
    /// Produced by the transport collaborator; the underlying cause is
    /// carried in the message.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A required field was absent from the host's response
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// A hex-encoded field could not be decoded
    #[error("Invalid hex data: {0}")]
    InvalidHex(String),

    /// The host's response violated the protocol byte layout
    #[error("Invalid pairing response: {0}")]
    InvalidResponse(String),

    /// The key or certificate uses an algorithm other than RSA or EC
    ///
    /// This is a fatal configuration error detected at key-load time, not
    /// per signing call.
    #[error("Unsupported key algorithm: {0}")]
    UnsupportedKeyAlgorithm(String),

    /// The attempt was cancelled by an external signal
    ///
    /// Distinct from all failure categories; a cancelled attempt must never
    /// be reported to the user as a protocol failure.
    #[error("Pairing cancelled")]
    Cancelled,
}

impl PairingError {
    /// Check if this error is recoverable (transient error that can be retried)
    ///
    /// Returns `true` if a fresh `pair` attempt might succeed without any
    /// configuration change.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use gamestream_pairing::PairingError;
    ///
    /// let error = PairingError::Transport("connection timeout".to_string());
    /// assert!(error.is_recoverable());
    ///
    /// let error = PairingError::UnsupportedKeyAlgorithm("DSA".to_string());
    /// assert!(!error.is_recoverable());
    /// ```
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PairingError::Transport(_) | PairingError::Io(_) | PairingError::Cancelled
        )
    }
}
