//! Cryptographic primitives for the pairing protocol
//!
//! Stateless building blocks used by the pairing state machine: SHA-256
//! hashing, PIN-salted AES key derivation, AES-128-ECB block encryption, and
//! SHA-256 based RSA/ECDSA signatures over openssl.
//!
//! ## ECB mode
//!
//! The host side of the protocol uses AES in ECB mode with no padding; this
//! is a wire-compatibility requirement, not a selectable option. Inputs are
//! zero-padded up to the next 16-byte block before encryption, and decryption
//! returns the padded plaintext unchanged. Callers must know the true
//! plaintext length and slice accordingly.
//!
//! ## Key algorithms
//!
//! Signatures are SHA-256 with the scheme selected by the key type: PKCS#1
//! for RSA keys, ECDSA for EC keys. [`ClientKey`] resolves that selection
//! once when the key is loaded; any other key algorithm is rejected there as
//! a configuration error.

use openssl::hash::MessageDigest;
use openssl::pkey::{Id, PKey, Private};
use openssl::sign::{Signer, Verifier};
use openssl::symm::{Cipher, Crypter, Mode};
use openssl::x509::X509;
use sha2::{Digest, Sha256};

use crate::{PairingError, Result};

/// AES block and session key size in bytes
pub const AES_KEY_LENGTH: usize = 16;

/// SHA-256 digest size in bytes
pub const SHA256_HASH_LENGTH: usize = 32;

/// A pairing session key (AES-128)
pub type AesKey = [u8; AES_KEY_LENGTH];

/// Signature scheme selected by the client key type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAlgorithm {
    /// SHA-256 with RSA PKCS#1 v1.5
    Rsa,
    /// SHA-256 with ECDSA
    Ecdsa,
}

/// A client private key with its signature algorithm resolved at load time
///
/// Wrapping the raw `PKey` forces the RSA-vs-EC decision to happen exactly
/// once, when the key enters the process, instead of on every signing call.
#[derive(Clone)]
pub struct ClientKey {
    pkey: PKey<Private>,
    algorithm: KeyAlgorithm,
}

impl ClientKey {
    /// Wrap a private key, resolving its signature algorithm
    ///
    /// # Errors
    ///
    /// Returns `PairingError::UnsupportedKeyAlgorithm` for any key that is
    /// neither RSA nor EC.
    pub fn new(pkey: PKey<Private>) -> Result<Self> {
        let algorithm = match pkey.id() {
            Id::RSA => KeyAlgorithm::Rsa,
            Id::EC => KeyAlgorithm::Ecdsa,
            other => {
                return Err(PairingError::UnsupportedKeyAlgorithm(format!("{:?}", other)));
            }
        };

        Ok(Self { pkey, algorithm })
    }

    /// The signature scheme this key signs with
    pub fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    pub(crate) fn pkey(&self) -> &PKey<Private> {
        &self.pkey
    }
}

impl std::fmt::Debug for ClientKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientKey")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

/// Compute the SHA-256 digest of `data`
pub fn sha256(data: &[u8]) -> [u8; SHA256_HASH_LENGTH] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Derive the pairing session key from a salt and the PIN
///
/// SHA-256 over `salt ++ pin_utf8`, truncated to 16 bytes. Deterministic:
/// both sides compute the same key from the same salt and PIN without the
/// key ever crossing the wire.
pub fn derive_aes_key(salt: &[u8], pin: &str) -> AesKey {
    let digest = sha256(&crate::wire::concat(&[salt, pin.as_bytes()]));

    let mut key = [0u8; AES_KEY_LENGTH];
    key.copy_from_slice(&digest[..AES_KEY_LENGTH]);
    key
}

/// Zero-pad `data` up to the next multiple of the AES block size
fn zero_pad(data: &[u8]) -> Vec<u8> {
    let padded_len = (data.len() + AES_KEY_LENGTH - 1) / AES_KEY_LENGTH * AES_KEY_LENGTH;
    let mut padded = data.to_vec();
    padded.resize(padded_len, 0);
    padded
}

fn run_aes_ecb(data: &[u8], key: &AesKey, mode: Mode) -> Result<Vec<u8>> {
    let cipher = Cipher::aes_128_ecb();
    let padded = zero_pad(data);

    let mut crypter = Crypter::new(cipher, mode, key, None)?;
    crypter.pad(false);

    let mut out = vec![0u8; padded.len() + cipher.block_size()];
    let mut count = crypter.update(&padded, &mut out)?;
    count += crypter.finalize(&mut out[count..])?;
    out.truncate(count);

    Ok(out)
}

/// Encrypt with AES-128-ECB, zero-padding the plaintext to the block size
pub fn encrypt_aes(plaintext: &[u8], key: &AesKey) -> Result<Vec<u8>> {
    run_aes_ecb(plaintext, key, Mode::Encrypt)
}

/// Decrypt with AES-128-ECB
///
/// The returned plaintext keeps whatever padding the encryptor added; ECB
/// with no padding cannot signal where real data ends.
pub fn decrypt_aes(ciphertext: &[u8], key: &AesKey) -> Result<Vec<u8>> {
    run_aes_ecb(ciphertext, key, Mode::Decrypt)
}

/// Sign `data` with the client key (SHA-256, scheme per key type)
pub fn sign_data(data: &[u8], key: &ClientKey) -> Result<Vec<u8>> {
    let mut signer = Signer::new(MessageDigest::sha256(), key.pkey())?;
    signer.update(data)?;
    Ok(signer.sign_to_vec()?)
}

/// Verify a SHA-256 signature over `data` against a certificate's public key
///
/// The scheme follows the certificate's key type, like [`sign_data`]. A
/// malformed signature counts as verification failure, not an error; the
/// caller cannot distinguish a mangled signature from a wrong one, and the
/// protocol treats both as the same security event.
///
/// # Errors
///
/// Returns `PairingError::UnsupportedKeyAlgorithm` if the certificate key is
/// neither RSA nor EC.
pub fn verify_signature(data: &[u8], signature: &[u8], certificate: &X509) -> Result<bool> {
    let public_key = certificate.public_key()?;

    match public_key.id() {
        Id::RSA | Id::EC => {}
        other => {
            return Err(PairingError::UnsupportedKeyAlgorithm(format!("{:?}", other)));
        }
    }

    let mut verifier = Verifier::new(MessageDigest::sha256(), &public_key)?;
    verifier.update(data)?;
    Ok(verifier.verify(signature).unwrap_or(false))
}

/// Fill an `N`-byte array from the cryptographically secure RNG
pub fn random_bytes<const N: usize>() -> Result<[u8; N]> {
    let mut bytes = [0u8; N];
    openssl::rand::rand_bytes(&mut bytes)?;
    Ok(bytes)
}

/// Generate a 4-digit pairing PIN, leading zeros included
///
/// Each digit is drawn independently with rejection sampling so all ten
/// values are equally likely.
pub fn generate_pin() -> Result<String> {
    let mut pin = String::with_capacity(4);

    while pin.len() < 4 {
        let [byte] = random_bytes::<1>()?;
        // 250..=255 would bias the modulo
        if byte < 250 {
            pin.push(char::from(b'0' + byte % 10));
        }
    }

    Ok(pin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::ClientIdentity;
    use openssl::ec::{EcGroup, EcKey};
    use openssl::nid::Nid;

    #[test]
    fn test_sha256_known_vector() {
        // SHA-256("abc")
        let digest = sha256(b"abc");
        assert_eq!(
            crate::wire::bytes_to_hex(&digest),
            "BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD"
        );
    }

    #[test]
    fn test_derive_aes_key_deterministic() {
        let salt = [7u8; 16];
        let first = derive_aes_key(&salt, "0123");
        let second = derive_aes_key(&salt, "0123");
        assert_eq!(first, second);

        // Key is the truncated digest of salt ++ pin
        let digest = sha256(&crate::wire::concat(&[&salt, b"0123"]));
        assert_eq!(first, digest[..16]);
    }

    #[test]
    fn test_derive_aes_key_salt_sensitivity() {
        let key_a = derive_aes_key(&[0u8; 16], "1234");
        let key_b = derive_aes_key(&[1u8; 16], "1234");
        let key_c = derive_aes_key(&[0u8; 16], "1235");
        assert_ne!(key_a, key_b);
        assert_ne!(key_a, key_c);
    }

    #[test]
    fn test_aes_round_trip_exact_block() {
        let key = derive_aes_key(&[2u8; 16], "4242");
        let plaintext = [0xABu8; 16];

        let ciphertext = encrypt_aes(&plaintext, &key).unwrap();
        assert_eq!(ciphertext.len(), 16);
        assert_ne!(ciphertext, plaintext);

        assert_eq!(decrypt_aes(&ciphertext, &key).unwrap(), plaintext);
    }

    #[test]
    fn test_aes_round_trip_zero_pads_short_input() {
        let key = derive_aes_key(&[3u8; 16], "0000");
        let plaintext = b"hello";

        let ciphertext = encrypt_aes(plaintext, &key).unwrap();
        assert_eq!(ciphertext.len(), 16);

        let mut expected = plaintext.to_vec();
        expected.resize(16, 0);
        assert_eq!(decrypt_aes(&ciphertext, &key).unwrap(), expected);
    }

    #[test]
    fn test_aes_multi_block() {
        let key = derive_aes_key(&[4u8; 16], "9999");
        let plaintext = [0x5Au8; 48];

        let ciphertext = encrypt_aes(&plaintext, &key).unwrap();
        assert_eq!(ciphertext.len(), 48);

        let decrypted = decrypt_aes(&ciphertext, &key).unwrap();
        assert_eq!(decrypted.len(), 48);
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_sign_and_verify_rsa() {
        let identity = ClientIdentity::generate().unwrap();
        assert_eq!(identity.key().algorithm(), KeyAlgorithm::Rsa);

        let data = b"client secret bytes";
        let signature = sign_data(data, identity.key()).unwrap();

        assert!(verify_signature(data, &signature, identity.certificate()).unwrap());
        assert!(!verify_signature(b"tampered", &signature, identity.certificate()).unwrap());

        let other = ClientIdentity::generate().unwrap();
        assert!(!verify_signature(data, &signature, other.certificate()).unwrap());
    }

    #[test]
    fn test_verify_rejects_garbage_signature() {
        let identity = ClientIdentity::generate().unwrap();
        assert!(!verify_signature(b"data", &[0xFF; 4], identity.certificate()).unwrap());
    }

    #[test]
    fn test_client_key_resolves_ec() {
        let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
        let ec_key = EcKey::generate(&group).unwrap();
        let key = ClientKey::new(PKey::from_ec_key(ec_key).unwrap()).unwrap();

        assert_eq!(key.algorithm(), KeyAlgorithm::Ecdsa);
        assert!(!sign_data(b"payload", &key).unwrap().is_empty());
    }

    #[test]
    fn test_client_key_rejects_unsupported_algorithm() {
        let pkey = PKey::generate_ed25519().unwrap();
        let err = ClientKey::new(pkey).unwrap_err();
        assert!(matches!(err, PairingError::UnsupportedKeyAlgorithm(_)));
    }

    #[test]
    fn test_random_bytes_distinct() {
        let a = random_bytes::<16>().unwrap();
        let b = random_bytes::<16>().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_generate_pin_format() {
        for _ in 0..64 {
            let pin = generate_pin().unwrap();
            assert_eq!(pin.len(), 4);
            assert!(pin.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
