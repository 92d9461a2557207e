//! SHA-256 digest computation for the HTTP-Digest-like device challenge
//!
//! The device expects the standard digest construction with fixed dummy
//! method and URI components:
//!
//! ```text
//! ha1      = SHA256("{username}:{realm}:{password}")
//! ha2      = SHA256("dummy_method:dummy_uri")
//! response = SHA256("{ha1}:{nonce}:{nc}:{cnonce}:auth:{ha2}")
//! ```

use sha2::{Digest, Sha256};

/// Fixed HA2 input mandated by the device protocol.
const HA2_INPUT: &str = "dummy_method:dummy_uri";

/// SHA-256 of the input, hex-encoded lowercase.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compute the digest response value for a challenge.
pub fn digest_response(
    username: &str,
    password: &str,
    realm: &str,
    nonce: u64,
    cnonce: u64,
    nc: u64,
) -> String {
    let ha1 = sha256_hex(&format!("{}:{}:{}", username, realm, password));
    let ha2 = sha256_hex(HA2_INPUT);
    sha256_hex(&format!("{}:{}:{}:{}:auth:{}", ha1, nonce, nc, cnonce, ha2))
}
