//! shellyrpc - persistent WebSocket JSON-RPC client for smart plug telemetry
//!
//! Polls a device's JSON-RPC endpoint over a persistent WebSocket
//! connection, caches the last-known telemetry values, and exposes them as
//! formatted strings to a metrics exporter. Devices that require
//! authentication are handled through an in-band challenge-response digest
//! upgrade (error code 401 carrying the challenge).
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `shellyrpc-core`: Error handling, RPC envelope, endpoint normalization
//! - `shellyrpc-auth`: Challenge parsing and SHA-256 digest credentials
//! - `shellyrpc-transport`: WebSocket transport layer
//! - `shellyrpc-client`: Connection manager with bounded retry and
//!   re-authentication
//! - `shellyrpc-metrics`: Polling facade with cached formatted telemetry
//!
//! # Usage
//!
//! ```no_run
//! use shellyrpc::client::ConnectionManager;
//! use shellyrpc::metrics::{PlugMonitor, PlugSettings};
//! use shellyrpc::RpcRequest;
//!
//! # async fn run() -> shellyrpc::RpcResult<()> {
//! let request = RpcRequest::new("Switch.GetStatus")
//!     .with_params(serde_json::json!({"id": 0}));
//! let manager = ConnectionManager::new("http://192.168.1.50/rpc", request)?;
//! manager.set_auth("secret").await;
//!
//! let mut monitor = PlugMonitor::new(manager, PlugSettings::default());
//! monitor.poll().await;
//! println!("power: {} W", monitor.power());
//! # Ok(())
//! # }
//! ```

// Re-export core types
pub use shellyrpc_core::{normalize_endpoint, ErrorObject, RpcError, RpcRequest, RpcResponse, RpcResult};

// Re-export authentication API
pub mod auth {
    pub use shellyrpc_auth::*;
}

// Re-export transport API
pub mod transport {
    pub use shellyrpc_transport::*;
}

// Re-export client API
pub mod client {
    pub use shellyrpc_client::*;
}

// Re-export metrics facade
pub mod metrics {
    pub use shellyrpc_metrics::*;
}
