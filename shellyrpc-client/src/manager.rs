//! Connection manager for one device endpoint
//!
//! The manager owns the transport handle, the connection state, and the
//! send/receive/retry/reauthenticate protocol.
//!
//! # Lifecycle
//!
//! State transitions:
//! - `Disconnected` -> `Connecting`: on first use or after a failed send
//! - `Connecting` -> `Open`: handshake succeeds within the connect timeout
//! - `Connecting` -> `Disconnected`: handshake fails or times out
//! - `Open` -> `Disconnected`: a send or receive raises a transport error
//!
//! Reconnection is always lazy: there is no background reconnect timer, the
//! next failed send or request triggers it. A single-flight guard ensures
//! only one connect attempt runs at a time per endpoint; a concurrent
//! attempt reports failure immediately instead of queuing.
//!
//! # Concurrency
//!
//! At most one logical request is in flight per manager; the round trip
//! holds the internal lock for its whole duration. All suspension points
//! (handshake, send, one-frame receive) race against a shared cancellation
//! token owned by the manager.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use shellyrpc_auth::{AuthChallenge, CredentialSession};
use shellyrpc_core::{normalize_endpoint, RpcError, RpcRequest, RpcResponse, RpcResult};
use shellyrpc_transport::{Transport, WsSettings, WsTransport};

use crate::session::{interpret_response, AttemptOutcome, Interpretation};

/// Maximum number of send attempts per call, including the first one.
const MAX_SEND_ATTEMPTS: usize = 3;

/// Connection state of a manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No usable transport handle (initial state)
    Disconnected,
    /// A connect attempt is running
    Connecting,
    /// Transport handshake completed, handle is usable
    Open,
}

impl ConnectionState {
    /// Check if the connection is usable for requests
    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }
}

struct Shared {
    transport: Box<dyn Transport>,
    state: ConnectionState,
    password: Option<String>,
    credentials: Option<CredentialSession>,
    /// Pre-rendered outgoing payload, recomputed only when the credential
    /// session changes.
    payload: String,
}

struct Inner {
    /// Normalized endpoint URL, kept for log context.
    url: String,
    /// Base request envelope; the auth fragment is merged into a clone of
    /// this whenever the credential session is replaced.
    request: RpcRequest,
    connecting: AtomicBool,
    cancel: CancellationToken,
    shared: Mutex<Shared>,
}

/// Persistent RPC connection manager for one device endpoint.
///
/// Exactly one manager exists per target; it exclusively owns its transport
/// handle and credential session. Cloning is shallow and only shares the
/// same underlying connection, so detached recovery tasks can reach it.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

impl ConnectionManager {
    /// Create a manager for the given target address.
    ///
    /// The target scheme is normalized to WebSocket once, here; it is not
    /// recomputed per connect attempt.
    pub fn new(target: &str, request: RpcRequest) -> RpcResult<Self> {
        let settings = WsSettings::new(target);
        let transport = Box::new(WsTransport::new(settings));
        Self::with_transport(target, request, transport)
    }

    /// Create a manager with a custom handshake timeout.
    pub fn with_connect_timeout(
        target: &str,
        connect_timeout: Duration,
        request: RpcRequest,
    ) -> RpcResult<Self> {
        let settings = WsSettings::with_timeout(target, connect_timeout);
        let transport = Box::new(WsTransport::new(settings));
        Self::with_transport(target, request, transport)
    }

    /// Create a manager over an arbitrary transport implementation.
    pub fn with_transport(
        target: &str,
        request: RpcRequest,
        transport: Box<dyn Transport>,
    ) -> RpcResult<Self> {
        let payload = request.serialize()?;
        Ok(Self {
            inner: Arc::new(Inner {
                url: normalize_endpoint(target),
                request,
                connecting: AtomicBool::new(false),
                cancel: CancellationToken::new(),
                shared: Mutex::new(Shared {
                    transport,
                    state: ConnectionState::Disconnected,
                    password: None,
                    credentials: None,
                    payload,
                }),
            }),
        })
    }

    /// Configure the device password.
    ///
    /// Must be called before the first request if the target requires
    /// authentication; without it a challenge is fatal for the call.
    pub async fn set_auth(&self, password: &str) {
        let mut shared = self.inner.shared.lock().await;
        shared.password = Some(password.to_string());
    }

    /// Current connection state.
    pub async fn state(&self) -> ConnectionState {
        self.inner.shared.lock().await.state
    }

    /// Check whether a credential session is currently active.
    pub async fn is_authenticated(&self) -> bool {
        self.inner.shared.lock().await.credentials.is_some()
    }

    /// Cancel any outstanding network operation and stop the manager.
    ///
    /// Outstanding handshakes, sends, and receives abort; the state
    /// transitions to `Disconnected`.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
    }

    /// Establish the transport connection.
    ///
    /// Guarded by a single-flight flag: a concurrent call returns `false`
    /// immediately rather than queuing or racing. All transport errors are
    /// caught and logged here; nothing propagates past this boundary.
    pub async fn connect(&self) -> bool {
        if !self.begin_connect() {
            return false;
        }
        let mut shared = self.inner.shared.lock().await;
        let ok = self.open_locked(&mut shared).await;
        self.end_connect();
        ok
    }

    /// Perform one request/response round trip.
    ///
    /// Sends the cached payload (with the auth fragment once a credential
    /// session exists), awaits exactly one inbound frame, and retries the
    /// attempt at most once after a successful authentication update.
    /// Returns `None` when retry bounds are exhausted or any failure is
    /// hit; the raw response text otherwise, even when it is not JSON.
    pub async fn request(&self) -> Option<String> {
        let mut shared = self.inner.shared.lock().await;
        for attempt in 0..=1 {
            match self.attempt_locked(&mut shared, attempt > 0).await {
                AttemptOutcome::Done(text) => return Some(text),
                AttemptOutcome::Retry => continue,
                AttemptOutcome::Failed => return None,
            }
        }
        None
    }

    async fn attempt_locked(&self, shared: &mut Shared, is_retry: bool) -> AttemptOutcome {
        if !self.send_locked(shared).await {
            return AttemptOutcome::Failed;
        }
        let text = match self.receive_locked(shared).await {
            Some(text) => text,
            None => return AttemptOutcome::Failed,
        };
        match interpret_response(text, is_retry) {
            Interpretation::Deliver(text) => AttemptOutcome::Done(text),
            Interpretation::Rejected => {
                log::warn!(
                    "Device {} rejected the re-authenticated request",
                    self.inner.url
                );
                AttemptOutcome::Failed
            }
            Interpretation::NeedsAuth(raw) => {
                if self.update_authentication(shared, &raw) {
                    AttemptOutcome::Retry
                } else {
                    AttemptOutcome::Failed
                }
            }
        }
    }

    /// Send the cached payload, reconnecting between attempts.
    ///
    /// With no usable handle, a detached connect task is spawned and the
    /// send reports failure immediately without waiting for it. With a
    /// handle, a failed write reconnects synchronously and retries, up to
    /// [`MAX_SEND_ATTEMPTS`] total attempts.
    async fn send_locked(&self, shared: &mut Shared) -> bool {
        for attempt in 1..=MAX_SEND_ATTEMPTS {
            if shared.transport.is_closed() {
                let manager = self.clone();
                tokio::spawn(async move {
                    manager.connect().await;
                });
                return false;
            }
            let payload = shared.payload.clone();
            let result = tokio::select! {
                _ = self.inner.cancel.cancelled() => Err(RpcError::Cancelled),
                r = shared.transport.send_text(&payload) => r,
            };
            match result {
                Ok(()) => return true,
                Err(RpcError::Cancelled) => {
                    log::warn!("Send to {} cancelled", self.inner.url);
                    let _ = shared.transport.close().await;
                    shared.state = ConnectionState::Disconnected;
                    return false;
                }
                Err(e) => {
                    shared.state = ConnectionState::Disconnected;
                    log::warn!(
                        "Send to {} failed (attempt {}/{}): {}",
                        self.inner.url,
                        attempt,
                        MAX_SEND_ATTEMPTS,
                        e
                    );
                    if attempt == MAX_SEND_ATTEMPTS {
                        return false;
                    }
                    if !self.reconnect_locked(shared).await {
                        return false;
                    }
                }
            }
        }
        false
    }

    /// Await exactly one inbound text frame.
    async fn receive_locked(&self, shared: &mut Shared) -> Option<String> {
        let result = tokio::select! {
            _ = self.inner.cancel.cancelled() => Err(RpcError::Cancelled),
            r = shared.transport.receive_text() => r,
        };
        match result {
            Ok(text) => Some(text),
            Err(e) => {
                log::warn!("Receive from {} failed: {}", self.inner.url, e);
                let _ = shared.transport.close().await;
                shared.state = ConnectionState::Disconnected;
                None
            }
        }
    }

    /// Replace the credential session from a 401 challenge and regenerate
    /// the serialized request cache.
    ///
    /// Any parse failure leaves the prior session and payload untouched.
    fn update_authentication(&self, shared: &mut Shared, raw: &str) -> bool {
        let Some(password) = shared.password.clone() else {
            log::warn!(
                "Device {} requires authentication but no password is configured",
                self.inner.url
            );
            return false;
        };
        let Some(message) = RpcResponse::parse(raw)
            .and_then(|response| response.error)
            .and_then(|error| error.message)
        else {
            log::warn!("Challenge from {} carries no message field", self.inner.url);
            return false;
        };
        let challenge = match AuthChallenge::parse(&message) {
            Ok(challenge) => challenge,
            Err(e) => {
                log::warn!("Failed to parse challenge from {}: {}", self.inner.url, e);
                return false;
            }
        };

        let session = CredentialSession::from_challenge(&password, &challenge);
        let fragment = match session.fragment().to_value() {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Failed to encode credentials for {}: {}", self.inner.url, e);
                return false;
            }
        };
        let mut request = self.inner.request.clone();
        request.auth = Some(fragment);
        let payload = match request.serialize() {
            Ok(payload) => payload,
            Err(e) => {
                log::warn!("Failed to encode request for {}: {}", self.inner.url, e);
                return false;
            }
        };

        shared.payload = payload;
        shared.credentials = Some(session);
        log::debug!(
            "Credential session for {} replaced (nonce {})",
            self.inner.url,
            challenge.nonce
        );
        true
    }

    /// Synchronous reconnect used between send attempts. Shares the
    /// single-flight guard with `connect`, so it aborts when a detached
    /// attempt is already running.
    async fn reconnect_locked(&self, shared: &mut Shared) -> bool {
        if !self.begin_connect() {
            return false;
        }
        let ok = self.open_locked(shared).await;
        self.end_connect();
        ok
    }

    async fn open_locked(&self, shared: &mut Shared) -> bool {
        shared.state = ConnectionState::Connecting;
        let result = tokio::select! {
            _ = self.inner.cancel.cancelled() => Err(RpcError::Cancelled),
            r = shared.transport.open() => r,
        };
        match result {
            Ok(()) => {
                shared.state = ConnectionState::Open;
                true
            }
            Err(e) => {
                log::warn!("Connect to {} failed: {}", self.inner.url, e);
                shared.state = ConnectionState::Disconnected;
                false
            }
        }
    }

    fn begin_connect(&self) -> bool {
        if self
            .inner
            .connecting
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            log::debug!("Connect to {} already in progress", self.inner.url);
            return false;
        }
        true
    }

    fn end_connect(&self) {
        self.inner.connecting.store(false, Ordering::SeqCst);
    }
}
