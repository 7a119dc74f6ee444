//! GameStream/Sunshine Pairing Protocol
//!
//! This library implements the client side of the PIN-based pairing
//! handshake used by GameStream-compatible streaming hosts (Sunshine and
//! relatives). Pairing establishes mutual trust between a streaming client
//! and a host that have never met: both sides prove possession of a short
//! out-of-band PIN without ever transmitting it, exchange self-signed
//! certificates, and detect both wrong-PIN entry and man-in-the-middle
//! tampering.
//!
//! The HTTP channel to the host is a collaborator supplied by the caller
//! through the [`PairingTransport`] trait; this crate owns the protocol
//! logic, the crypto, and the exact byte layouts.

pub mod crypto;
pub mod identity;
pub mod pairing;
pub mod response;
pub mod transport;
pub mod wire;

mod error;
pub use crypto::{generate_pin, ClientKey, KeyAlgorithm};
pub use error::{PairingError, Result};
pub use identity::ClientIdentity;
pub use pairing::{PairState, PairingSession};
pub use transport::PairingTransport;
