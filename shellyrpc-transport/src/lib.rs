//! WebSocket transport layer for shellyrpc
//!
//! This crate provides the frame-level transport used by the connection
//! manager: a timeout-bounded connect, single text-frame send/receive, and
//! close handling.

pub mod ws;

use async_trait::async_trait;
use shellyrpc_core::RpcResult;

pub use ws::{WsSettings, WsTransport};

/// Frame-level transport to a remote RPC endpoint.
///
/// A transport starts closed; `open` establishes (or re-establishes) the
/// underlying connection, disposing any prior handle first. Implementations
/// must mark themselves closed on any send/receive failure so the caller can
/// detect a dead handle without an extra probe.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open the connection, replacing any prior handle.
    async fn open(&mut self) -> RpcResult<()>;

    /// Write one text frame.
    async fn send_text(&mut self, payload: &str) -> RpcResult<()>;

    /// Await exactly one inbound text frame, decoded as UTF-8.
    async fn receive_text(&mut self) -> RpcResult<String>;

    /// Check if the transport is closed.
    fn is_closed(&self) -> bool;

    /// Close the connection.
    async fn close(&mut self) -> RpcResult<()>;
}
