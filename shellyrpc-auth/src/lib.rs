//! Challenge-response authentication for shellyrpc
//!
//! Devices that require authentication reject a plain request with an in-band
//! 401 error whose `message` field carries a JSON-encoded challenge
//! (realm, nonce, nc). This crate parses the challenge, derives the SHA-256
//! digest response, and produces the `auth` fragment embedded into subsequent
//! requests.

pub mod digest;
pub mod session;

pub use session::{AuthChallenge, AuthFragment, CredentialSession, DEFAULT_USERNAME};
