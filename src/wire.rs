//! Wire encoding helpers
//!
//! Hex conversion and byte assembly for pairing command parameters. The
//! protocol transmits every binary value hex-encoded: uppercase on output,
//! case-insensitive on input. Decoding rejects odd-length and non-hex input
//! instead of guessing, since a silently mis-decoded value would corrupt the
//! exact byte offsets the challenge/response layout depends on.

use crate::{PairingError, Result};

/// Encode bytes as an uppercase hex string
///
/// # Examples
///
/// ```rust
/// use gamestream_pairing::wire::bytes_to_hex;
///
/// assert_eq!(bytes_to_hex(&[0xDE, 0xAD, 0x0F]), "DEAD0F");
/// assert_eq!(bytes_to_hex(&[]), "");
/// ```
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}

/// Decode a hex string (either case) into bytes
///
/// # Errors
///
/// Returns `PairingError::InvalidHex` for odd-length input or any character
/// outside `[0-9A-Fa-f]`.
pub fn hex_to_bytes(s: &str) -> Result<Vec<u8>> {
    // from_str_radix alone would also accept sign characters like "+F"
    if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(PairingError::InvalidHex(
            "non-hex character in string".to_string(),
        ));
    }
    if s.len() % 2 != 0 {
        return Err(PairingError::InvalidHex(format!("odd length: {}", s.len())));
    }

    (0..s.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&s[i..i + 2], 16).map_err(|_| {
                PairingError::InvalidHex(format!("invalid digit pair {:?}", &s[i..i + 2]))
            })
        })
        .collect()
}

/// Concatenate byte slices into one owned buffer
///
/// The hash inputs of the challenge/response protocol are formed by exact
/// concatenation; order matters.
pub fn concat(parts: &[&[u8]]) -> Vec<u8> {
    let mut out = Vec::with_capacity(parts.iter().map(|p| p.len()).sum());
    for part in parts {
        out.extend_from_slice(part);
    }
    out
}
