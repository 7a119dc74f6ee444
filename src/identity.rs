//! Client identity management
//!
//! The client presents one long-lived self-signed certificate across every
//! pairing attempt and every subsequent streaming session; the host pins it
//! during pairing and trusts it from then on. This module generates that
//! certificate, persists it as PEM files, and hands the pairing state
//! machine the three things it needs: the parsed certificate, the signing
//! key, and the PEM bytes sent to the host in the first pairing message.
//!
//! An identity is immutable once loaded, so sharing one `ClientIdentity`
//! across simultaneous pairing attempts to different hosts needs no
//! synchronization.

use openssl::asn1::Asn1Time;
use openssl::bn::{BigNum, MsbOption};
use openssl::hash::MessageDigest;
use openssl::pkey::PKey;
use openssl::rsa::Rsa;
use openssl::x509::{X509, X509Name};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::crypto::ClientKey;
use crate::Result;

/// Common Name GameStream hosts expect on a client certificate
const CERT_COMMON_NAME: &str = "NVIDIA GameStream Client";

/// Certificate validity period (20 years)
const CERT_VALIDITY_DAYS: u32 = 20 * 365;

/// RSA modulus size for generated client keys
const RSA_KEY_BITS: u32 = 2048;

/// A long-lived client certificate/key pair
///
/// All accessors take `&self`; the identity never changes after load.
pub struct ClientIdentity {
    certificate: X509,
    pem: Vec<u8>,
    key: ClientKey,
}

impl std::fmt::Debug for ClientIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientIdentity")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl ClientIdentity {
    /// Generate a fresh self-signed client identity
    ///
    /// RSA 2048-bit key, SHA-256 self-signature, random serial, 20-year
    /// validity, and the Common Name GameStream hosts expect.
    pub fn generate() -> Result<Self> {
        let rsa = Rsa::generate(RSA_KEY_BITS)?;
        let pkey = PKey::from_rsa(rsa)?;

        let mut builder = X509::builder()?;
        builder.set_version(2)?;

        let mut serial = BigNum::new()?;
        serial.rand(159, MsbOption::MAYBE_ZERO, false)?;
        let serial = serial.to_asn1_integer()?;
        builder.set_serial_number(&serial)?;

        let mut name = X509Name::builder()?;
        name.append_entry_by_text("CN", CERT_COMMON_NAME)?;
        let name = name.build();
        builder.set_subject_name(&name)?;
        builder.set_issuer_name(&name)?;

        let not_before = Asn1Time::days_from_now(0)?;
        let not_after = Asn1Time::days_from_now(CERT_VALIDITY_DAYS)?;
        builder.set_not_before(&not_before)?;
        builder.set_not_after(&not_after)?;

        builder.set_pubkey(&pkey)?;
        builder.sign(&pkey, MessageDigest::sha256())?;

        let certificate = builder.build();
        let pem = certificate.to_pem()?;

        info!("Generated new client identity certificate");

        Ok(Self {
            certificate,
            pem,
            key: ClientKey::new(pkey)?,
        })
    }

    /// Load an identity from PEM certificate and key files
    pub fn load_from_files(
        cert_path: impl AsRef<Path>,
        key_path: impl AsRef<Path>,
    ) -> Result<Self> {
        let cert_pem = fs::read(cert_path.as_ref())?;
        let certificate = X509::from_pem(&cert_pem)?;

        let key_pem = fs::read(key_path.as_ref())?;
        let pkey = PKey::private_key_from_pem(&key_pem)?;

        info!("Loaded client identity from {:?}", cert_path.as_ref());

        Ok(Self {
            certificate,
            pem: cert_pem,
            key: ClientKey::new(pkey)?,
        })
    }

    /// Save the identity as PEM certificate and key files
    pub fn save_to_files(
        &self,
        cert_path: impl AsRef<Path>,
        key_path: impl AsRef<Path>,
    ) -> Result<()> {
        let cert_path = cert_path.as_ref();
        let key_path = key_path.as_ref();

        if let Some(parent) = cert_path.parent() {
            fs::create_dir_all(parent)?;
        }
        if let Some(parent) = key_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(cert_path, &self.pem)?;
        fs::write(key_path, self.key.pkey().private_key_to_pem_pkcs8()?)?;

        info!(
            "Saved client identity to {:?} and {:?}",
            cert_path, key_path
        );

        Ok(())
    }

    /// Load an existing identity, or generate and persist a new one
    pub fn load_or_generate(
        cert_path: impl AsRef<Path>,
        key_path: impl AsRef<Path>,
    ) -> Result<Self> {
        let cert_path = cert_path.as_ref();
        let key_path = key_path.as_ref();

        if cert_path.exists() && key_path.exists() {
            Self::load_from_files(cert_path, key_path)
        } else {
            let identity = Self::generate()?;
            identity.save_to_files(cert_path, key_path)?;
            Ok(identity)
        }
    }

    /// The client certificate
    pub fn certificate(&self) -> &X509 {
        &self.certificate
    }

    /// PEM encoding of the certificate, as sent to the host in step 1
    pub fn pem_certificate(&self) -> &[u8] {
        &self.pem
    }

    /// The signing key matching the certificate
    pub fn key(&self) -> &ClientKey {
        &self.key
    }
}
