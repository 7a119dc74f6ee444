//! Pairing state machine
//!
//! One [`PairingSession`] drives one `pair` attempt: five sequential round
//! trips to the host's pairing endpoint, each deriving or verifying
//! cryptographic material, ending in exactly one terminal [`PairState`].
//! All secrets (salt, session key, challenges) live only for the duration of
//! the attempt; the server certificate is the one artifact that outlives it.

use openssl::x509::X509;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::crypto::{self, SHA256_HASH_LENGTH};
use crate::identity::ClientIdentity;
use crate::response;
use crate::transport::PairingTransport;
use crate::wire::{bytes_to_hex, concat, hex_to_bytes};
use crate::{PairingError, Result};

/// Salt, challenge, and secret size in bytes
const NONCE_LENGTH: usize = 16;

/// Terminal outcome of one `pair` invocation
///
/// Exactly one of these is returned per attempt; there is no partial-success
/// state. Transport failures and cancellation are `Err` values instead, so
/// they can never be mistaken for a protocol verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairState {
    /// No pairing relationship exists
    NotPaired,
    /// The handshake completed and both sides hold each other's certificate
    Paired,
    /// The entered PIN did not match the host's (step 6 hash mismatch)
    PinWrong,
    /// The host rejected a step, or a signature failed to verify
    Failed,
    /// The host withheld its certificate because another client is
    /// mid-pairing
    AlreadyInProgress,
}

impl PairState {
    /// The single caller-facing message for this outcome
    pub fn user_message(&self) -> &'static str {
        match self {
            PairState::NotPaired => "Not paired.",
            PairState::Paired => "Pairing completed successfully.",
            PairState::PinWrong => "Incorrect PIN. Try again with a fresh PIN.",
            PairState::Failed => "Pairing failed.",
            PairState::AlreadyInProgress => {
                "Another pairing attempt is already in progress on this host."
            }
        }
    }
}

/// Scoped abort notification
///
/// Armed for the whole handshake after step 1 establishes state on the host;
/// dropping it un-disarmed sends a best-effort unpair so the host does not
/// keep a half-completed pairing for this client. Covers every exit path,
/// including `?` propagation and cancellation.
struct UnpairGuard<'t> {
    transport: &'t dyn PairingTransport,
    armed: bool,
}

impl<'t> UnpairGuard<'t> {
    fn new(transport: &'t dyn PairingTransport) -> Self {
        Self {
            transport,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for UnpairGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            debug!("Aborting pairing attempt, notifying host");
            if let Err(e) = self.transport.unpair() {
                warn!("Failed to notify host of aborted pairing: {}", e);
            }
        }
    }
}

/// One pairing attempt against one host
///
/// # Examples
///
/// ```rust,no_run
/// use gamestream_pairing::{ClientIdentity, PairState, PairingSession, PairingTransport};
///
/// fn pair_with_host(
///     identity: &ClientIdentity,
///     transport: &dyn PairingTransport,
///     pin: &str,
/// ) -> gamestream_pairing::Result<()> {
///     let mut session = PairingSession::new(identity);
///     match session.pair(transport, pin)? {
///         PairState::Paired => println!("paired!"),
///         state => println!("{}", state.user_message()),
///     }
///     Ok(())
/// }
/// ```
pub struct PairingSession<'id> {
    identity: &'id ClientIdentity,
    server_certificate: Option<X509>,
}

impl<'id> PairingSession<'id> {
    /// Create a session for the given client identity
    pub fn new(identity: &'id ClientIdentity) -> Self {
        Self {
            identity,
            server_certificate: None,
        }
    }

    /// The host certificate established by a successful `pair` call
    ///
    /// `None` until an attempt returns [`PairState::Paired`].
    pub fn server_certificate(&self) -> Option<&X509> {
        self.server_certificate.as_ref()
    }

    /// Run the pairing handshake with the given PIN
    ///
    /// Blocks for the whole exchange; the first round trip has no read
    /// timeout because the host waits for the user to enter the PIN. Every
    /// early exit after step 1 notifies the host with an unpair command
    /// before returning.
    ///
    /// # Errors
    ///
    /// Transport failures, malformed responses, and cancellation propagate
    /// as errors; protocol verdicts (rejection, wrong PIN, busy host) are
    /// `Ok` terminal states.
    pub fn pair(&mut self, transport: &dyn PairingTransport, pin: &str) -> Result<PairState> {
        // Step 1: send a fresh salt and our certificate, get the host's
        // certificate back. Nothing is established on the host yet, so a
        // rejection here has nothing to abort.
        let salt = crypto::random_bytes::<NONCE_LENGTH>()?;
        debug!("Requesting server certificate");
        let get_cert = transport.execute_pairing_command(
            &format!(
                "phrase=getservercert&salt={}&clientcert={}",
                bytes_to_hex(&salt),
                bytes_to_hex(self.identity.pem_certificate()),
            ),
            false,
        )?;
        if !response::is_paired(&get_cert)? {
            info!("Host rejected pairing request");
            return Ok(PairState::Failed);
        }

        // From here on the host holds pairing state for us; the guard sends
        // an unpair on every exit that does not disarm it.
        let mut guard = UnpairGuard::new(transport);

        // The host withholds plaincert while another client is mid-pairing
        let server_certificate = match response::get_field(&get_cert, "plaincert", false)? {
            Some(cert_hex) => X509::from_der(&hex_to_bytes(&cert_hex)?)?,
            None => {
                info!("Host is already pairing with another client");
                return Ok(PairState::AlreadyInProgress);
            }
        };

        // Pin it for TLS now; the certificate itself only becomes
        // trustworthy if the rest of the handshake verifies against it
        transport.pin_server_certificate(&server_certificate)?;

        // Step 2: prove nothing yet, just send a challenge under the
        // PIN-derived key
        let aes_key = crypto::derive_aes_key(&salt, pin);
        let client_challenge = crypto::random_bytes::<NONCE_LENGTH>()?;
        debug!("Sending encrypted client challenge");
        let challenge_resp = transport.execute_pairing_command(
            &format!(
                "clientchallenge={}",
                bytes_to_hex(&crypto::encrypt_aes(&client_challenge, &aes_key)?)
            ),
            true,
        )?;
        if !response::is_paired(&challenge_resp)? {
            info!("Host rejected client challenge");
            return Ok(PairState::Failed);
        }

        // Step 3: the decrypted response is the host's response hash (32
        // bytes) followed by the host's own challenge (16 bytes)
        let decrypted = crypto::decrypt_aes(
            &hex_to_bytes(&response::required_field(&challenge_resp, "challengeresponse")?)?,
            &aes_key,
        )?;
        if decrypted.len() < SHA256_HASH_LENGTH + NONCE_LENGTH {
            return Err(PairingError::InvalidResponse(format!(
                "challenge response too short: {} bytes",
                decrypted.len()
            )));
        }
        let server_response = &decrypted[..SHA256_HASH_LENGTH];
        let server_challenge = &decrypted[SHA256_HASH_LENGTH..SHA256_HASH_LENGTH + NONCE_LENGTH];

        // Step 4: answer the host's challenge with a hash binding it to our
        // certificate signature and a fresh client secret
        let client_secret = crypto::random_bytes::<NONCE_LENGTH>()?;
        let challenge_resp_hash = crypto::sha256(&concat(&[
            server_challenge,
            self.identity.certificate().signature().as_slice(),
            &client_secret,
        ]));
        debug!("Sending server challenge response");
        let secret_resp = transport.execute_pairing_command(
            &format!(
                "serverchallengeresp={}",
                bytes_to_hex(&crypto::encrypt_aes(&challenge_resp_hash, &aes_key)?)
            ),
            true,
        )?;
        if !response::is_paired(&secret_resp)? {
            info!("Host rejected challenge response");
            return Ok(PairState::Failed);
        }

        // Step 5: the pairing secret is sent in the clear: 16 bytes of
        // server secret, then a signature over them
        let pairing_secret = hex_to_bytes(&response::required_field(&secret_resp, "pairingsecret")?)?;
        if pairing_secret.len() <= NONCE_LENGTH {
            return Err(PairingError::InvalidResponse(format!(
                "pairing secret too short: {} bytes",
                pairing_secret.len()
            )));
        }
        let (server_secret, server_signature) = pairing_secret.split_at(NONCE_LENGTH);

        // Only the holder of the private key behind the step-1 certificate
        // can produce this signature; anything else means a man in the middle
        if !crypto::verify_signature(server_secret, server_signature, &server_certificate)? {
            warn!("Server pairing secret signature did not verify");
            return Ok(PairState::Failed);
        }

        // Step 6: recompute what the host's step-3 response hash must have
        // been; a mismatch means the host derived a different session key,
        // i.e. the PIN was wrong
        let expected_response = crypto::sha256(&concat(&[
            &client_challenge,
            server_certificate.signature().as_slice(),
            server_secret,
        ]));
        if server_response != expected_response.as_slice() {
            info!("Server challenge response mismatch, PIN was wrong");
            return Ok(PairState::PinWrong);
        }

        // Step 7: hand the host our signed secret for the same check on its
        // side
        debug!("Sending client pairing secret");
        let client_secret_resp = transport.execute_pairing_command(
            &format!(
                "clientpairingsecret={}",
                bytes_to_hex(&concat(&[
                    &client_secret,
                    &crypto::sign_data(&client_secret, self.identity.key())?,
                ]))
            ),
            true,
        )?;
        if !response::is_paired(&client_secret_resp)? {
            info!("Host rejected client pairing secret");
            return Ok(PairState::Failed);
        }

        // Step 8: final confirmation challenge; required for the host to
        // report us as paired
        debug!("Sending pairing confirmation challenge");
        let pair_challenge = transport.execute_pairing_challenge()?;
        if !response::is_paired(&pair_challenge)? {
            info!("Host rejected pairing confirmation");
            return Ok(PairState::Failed);
        }

        guard.disarm();
        self.server_certificate = Some(server_certificate);
        info!("Pairing completed successfully");
        Ok(PairState::Paired)
    }
}
