//! Core types and utilities for the shellyrpc stack
//!
//! This crate provides the shared error type, the JSON-RPC envelope data
//! model, and endpoint URL normalization used by the transport and client
//! layers.

pub mod endpoint;
pub mod envelope;
pub mod error;

pub use endpoint::normalize_endpoint;
pub use envelope::{ErrorObject, RpcRequest, RpcResponse};
pub use error::{RpcError, RpcResult};

/// In-band error code signalling that the device requires an authenticated
/// request (HTTP-Digest-like challenge carried in the error payload).
pub const AUTH_REQUIRED_CODE: i64 = 401;
