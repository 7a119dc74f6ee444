//! PIN-based pairing with a streaming host
//!
//! This module implements the client side of the GameStream/Sunshine pairing
//! handshake: a fixed sequence of salted, AES-encrypted, SHA-256-hashed, and
//! signed challenge/response exchanges over the host's pairing endpoint.
//!
//! ## Pairing Protocol
//!
//! 1. **Server certificate**: send a fresh salt and our PEM certificate,
//!    receive the host's certificate and pin it for TLS
//! 2. **Client challenge**: derive the session key from salt + PIN, send an
//!    encrypted random challenge
//! 3. **Challenge response**: the host answers with its response hash and
//!    its own challenge, encrypted under the same key
//! 4. **Secret exchange**: hashes and signatures over random secrets prove
//!    each side holds both the PIN-derived key and its certificate's
//!    private key
//! 5. **Confirmation**: a final challenge command completes the pairing
//!
//! A wrong PIN surfaces as a response-hash mismatch; a man in the middle
//! surfaces as a signature that does not verify against the step-1
//! certificate. Every abandoned attempt notifies the host with an unpair
//! command so no half-completed state lingers on either side.

pub mod session;

// Re-export main types
pub use session::{PairState, PairingSession};
