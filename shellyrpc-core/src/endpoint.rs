//! Endpoint URL normalization
//!
//! Device addresses are usually configured as plain HTTP URLs or bare
//! hostnames. The RPC channel runs over WebSocket, so the scheme is rewritten
//! once at construction time:
//!
//! - `https://...` becomes `wss://...`
//! - `http://...` becomes `ws://...`
//! - a bare host without a scheme gets `ws://` prepended
//! - `ws://` and `wss://` URLs are left unchanged

/// Normalize a target address to a WebSocket URL.
pub fn normalize_endpoint(target: &str) -> String {
    let target = target.trim();
    if target.starts_with("ws://") || target.starts_with("wss://") {
        return target.to_string();
    }
    if let Some(rest) = target.strip_prefix("https://") {
        return format!("wss://{}", rest);
    }
    if let Some(rest) = target.strip_prefix("http://") {
        return format!("ws://{}", rest);
    }
    if target.contains("://") {
        // Unknown scheme, keep the authority and fall back to insecure ws.
        let rest = target.splitn(2, "://").nth(1).unwrap_or(target);
        return format!("ws://{}", rest);
    }
    format!("ws://{}", target)
}
