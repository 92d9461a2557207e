//! Persistent RPC connection manager for shellyrpc
//!
//! This crate owns the transport lifecycle for one device endpoint:
//! connect, detect failure, reconnect, and a bounded request/response round
//! trip with a single re-authentication retry driven by the in-band 401
//! error code.

pub mod manager;
mod session;

use async_trait::async_trait;

pub use manager::{ConnectionManager, ConnectionState};

/// Consumer-facing seam of the connection manager.
///
/// The polling façade depends only on this trait, which keeps it testable
/// without a live device. Both operations mirror the manager's boundary
/// semantics: `request` never fails loudly, it returns `None` after retry
/// bounds are exhausted.
#[async_trait]
pub trait RpcChannel: Send + Sync {
    /// Perform one request/response round trip against the device.
    async fn request(&self) -> Option<String>;

    /// One-time setup of the device password, required before the first
    /// request if the target needs authentication.
    async fn set_auth(&self, password: &str);
}

#[async_trait]
impl RpcChannel for ConnectionManager {
    async fn request(&self) -> Option<String> {
        ConnectionManager::request(self).await
    }

    async fn set_auth(&self, password: &str) {
        ConnectionManager::set_auth(self, password).await
    }
}
