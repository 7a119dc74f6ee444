//! Transport collaborator contract
//!
//! The pairing state machine does not speak HTTP itself; it drives a
//! transport collaborator through this trait. The transport owns the
//! connection to the host's pairing endpoint, the TLS layer, and the pinned
//! server certificate. The state machine owns only which commands to send
//! and what the responses must contain.

use openssl::x509::X509;

use crate::Result;

/// The HTTP command channel and server-certificate trust sink
///
/// One implementation serves one host. Calls are blocking: a `pair` attempt
/// is a single sequential operation expected to run on a dedicated worker,
/// since the first command has no read timeout (the host waits for the user
/// to type the PIN).
///
/// ## Cancellation
///
/// An external cancel signal interrupts the blocking call in flight; the
/// implementation reports that as `PairingError::Cancelled`, which the state
/// machine propagates unchanged so the caller never sees a spurious protocol
/// failure for a cancelled attempt.
pub trait PairingTransport {
    /// Send a pairing command query string to the pairing endpoint
    ///
    /// # Arguments
    ///
    /// * `query` - Query parameters, e.g. `clientchallenge=<hex>`
    /// * `require_pinned_cert` - When set, the request must go over TLS
    ///   pinned to the certificate established via
    ///   [`pin_server_certificate`](Self::pin_server_certificate); every
    ///   command after the first requires this
    fn execute_pairing_command(&self, query: &str, require_pinned_cert: bool) -> Result<String>;

    /// Send the final zero-parameter pairing challenge command
    fn execute_pairing_challenge(&self) -> Result<String>;

    /// Ask the host to drop any in-progress pairing for this client
    ///
    /// Best-effort: callers ignore the result.
    fn unpair(&self) -> Result<()>;

    /// Pin `certificate` as the trusted server certificate for this host
    ///
    /// Applies to every subsequent TLS connection, within this pairing
    /// attempt and beyond. Persisting the trust relationship is the
    /// transport's responsibility, not the state machine's.
    fn pin_server_certificate(&self, certificate: &X509) -> Result<()>;
}
