//! Credential session lifecycle
//!
//! A [`CredentialSession`] is created from the first parsed challenge and
//! replaced wholesale on every subsequent one. It never expires on success;
//! the same session is reused for all follow-up requests until the process
//! restarts or the device rejects an already-updated session.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use shellyrpc_core::{RpcError, RpcResult};

use crate::digest::digest_response;

/// Username the device expects for digest authentication.
pub const DEFAULT_USERNAME: &str = "admin";

/// Parsed authentication challenge.
///
/// The device carries this as a JSON document inside the `message` string of
/// a 401 error object.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthChallenge {
    pub realm: String,
    pub nonce: u64,
    pub nc: u64,
}

impl AuthChallenge {
    /// Parse a challenge from the raw `error.message` text.
    pub fn parse(message: &str) -> RpcResult<Self> {
        serde_json::from_str(message)
            .map_err(|e| RpcError::Authentication(format!("Malformed challenge: {}", e)))
    }
}

/// Mutable bundle of authentication parameters derived from a challenge.
///
/// Construction replaces every field from the challenge; in particular the
/// client nonce is reset to 0, so stale values can never leak into a request
/// built after an update.
#[derive(Debug, Clone)]
pub struct CredentialSession {
    password: String,
    realm: String,
    nonce: u64,
    cnonce: u64,
    nc: u64,
}

impl CredentialSession {
    /// Build a fresh session from the configured password and a challenge.
    pub fn from_challenge(password: &str, challenge: &AuthChallenge) -> Self {
        Self {
            password: password.to_string(),
            realm: challenge.realm.clone(),
            nonce: challenge.nonce,
            cnonce: 0,
            nc: challenge.nc,
        }
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn nc(&self) -> u64 {
        self.nc
    }

    /// Produce the `auth` fragment to embed into an outgoing request.
    pub fn fragment(&self) -> AuthFragment {
        AuthFragment {
            realm: self.realm.clone(),
            username: DEFAULT_USERNAME.to_string(),
            nonce: self.nonce,
            cnonce: self.cnonce,
            response: digest_response(
                DEFAULT_USERNAME,
                &self.password,
                &self.realm,
                self.nonce,
                self.cnonce,
                self.nc,
            ),
            nc: self.nc,
            algorithm: "SHA-256".to_string(),
        }
    }
}

/// Serializable authentication fragment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthFragment {
    pub realm: String,
    pub username: String,
    pub nonce: u64,
    pub cnonce: u64,
    pub response: String,
    pub nc: u64,
    pub algorithm: String,
}

impl AuthFragment {
    /// Convert to a JSON value for merging into the request envelope.
    pub fn to_value(&self) -> RpcResult<Value> {
        serde_json::to_value(self)
            .map_err(|e| RpcError::Authentication(format!("Failed to encode auth fragment: {}", e)))
    }
}
