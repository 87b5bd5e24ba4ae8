//! Bounded-retry connect and teardown.
//!
//! # Connection Flow
//!
//! 1. Dial `ws://host:port/` requesting subprotocol `noflo`
//! 2. On failure, wait `retry_delay` and dial again, up to `max_attempts` times
//! 3. On success, hand out the [`Connection`] for scenarios to borrow
//! 4. At suite end, close gracefully and wait for the acknowledgment

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tokio::time::{Instant, sleep, timeout};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{Error, Result};

use super::connection::{Connection, ConnectionState};

// ============================================================================
// Constants
// ============================================================================

/// Default number of connect attempts.
pub const DEFAULT_CONNECT_ATTEMPTS: u32 = 10;

/// Default delay between failed connect attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Default time budget for a single WebSocket handshake.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(2);

// ============================================================================
// RetryPolicy
// ============================================================================

/// How hard to try before giving up on connecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, at least one.
    pub max_attempts: u32,
    /// Delay between a failed attempt and the next one.
    pub retry_delay: Duration,
    /// Time budget for each handshake.
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_CONNECT_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }
}

// ============================================================================
// Connect
// ============================================================================

/// Opens a connection, retrying on failure.
///
/// # Errors
///
/// Returns [`Error::Connect`] carrying the last failure once every
/// attempt has failed.
pub async fn connect_with_retry(
    url: &Url,
    subprotocol: &str,
    policy: &RetryPolicy,
) -> Result<Connection> {
    let attempts = policy.max_attempts.max(1);
    let started = Instant::now();
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        match open(url, subprotocol, policy.attempt_timeout).await {
            Ok(connection) => {
                info!(
                    url = %url,
                    attempt,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Connected to runtime"
                );
                return Ok(connection);
            }
            Err(e) => {
                debug!(url = %url, attempt, error = %e, "Connect attempt failed");
                last_error = e.to_string();
            }
        }

        if attempt < attempts {
            sleep(policy.retry_delay).await;
        }
    }

    warn!(url = %url, attempts, "Giving up connecting to runtime");
    Err(Error::connect(url.as_str(), attempts, last_error))
}

/// Performs one WebSocket handshake with subprotocol negotiation.
async fn open(url: &Url, subprotocol: &str, attempt_timeout: Duration) -> Result<Connection> {
    let mut request = url.as_str().into_client_request()?;
    let protocol = HeaderValue::from_str(subprotocol)
        .map_err(|e| Error::config(format!("Invalid subprotocol {subprotocol:?}: {e}")))?;
    request.headers_mut().insert(SEC_WEBSOCKET_PROTOCOL, protocol);

    let (ws_stream, response) = timeout(attempt_timeout, connect_async(request))
        .await
        .map_err(|_| {
            Error::timeout("WebSocket handshake", attempt_timeout.as_millis() as u64)
        })??;

    debug!(
        status = %response.status(),
        protocol = ?response.headers().get(SEC_WEBSOCKET_PROTOCOL),
        "WebSocket handshake completed"
    );

    Ok(Connection::new(ws_stream, url.as_str()))
}

// ============================================================================
// Supervisor
// ============================================================================

/// Owns the connection for the duration of a suite run.
///
/// Connection is created once per run and torn down at the end.
#[derive(Debug)]
pub struct Supervisor {
    /// Runtime address.
    url: Url,
    /// Subprotocol requested during the handshake.
    subprotocol: String,
    /// Retry policy for [`Supervisor::connect`].
    policy: RetryPolicy,
    /// The live connection, if any.
    connection: Option<Connection>,
    /// Set while a connect is in flight.
    connecting: bool,
}

impl Supervisor {
    /// Creates a supervisor that has not connected yet.
    #[must_use]
    pub fn new(url: Url, subprotocol: impl Into<String>, policy: RetryPolicy) -> Self {
        Self {
            url,
            subprotocol: subprotocol.into(),
            policy,
            connection: None,
            connecting: false,
        }
    }

    /// Returns the runtime address.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the retry policy.
    #[inline]
    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Returns the lifecycle state of the managed connection.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        match &self.connection {
            Some(connection) => connection.state(),
            None if self.connecting => ConnectionState::Connecting,
            None => ConnectionState::Disconnected,
        }
    }

    /// Connects, reusing an open connection if there is one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connect`] once the retry budget is exhausted.
    pub async fn connect(&mut self) -> Result<&mut Connection> {
        if self
            .connection
            .as_ref()
            .is_some_and(|connection| connection.is_connected())
        {
            return self.connection();
        }

        self.connecting = true;
        let result = connect_with_retry(&self.url, &self.subprotocol, &self.policy).await;
        self.connecting = false;

        self.connection = Some(result?);
        self.connection()
    }

    /// Returns the live connection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if not connected.
    pub fn connection(&mut self) -> Result<&mut Connection> {
        self.connection.as_mut().ok_or(Error::ConnectionClosed)
    }

    /// Returns the live connection without borrowing it mutably.
    #[inline]
    #[must_use]
    pub fn current(&self) -> Option<&Connection> {
        self.connection.as_ref()
    }

    /// Closes the connection gracefully.
    ///
    /// A no-op if the supervisor never connected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if the close is not acknowledged.
    pub async fn teardown(&mut self) -> Result<()> {
        match self.connection.take() {
            Some(mut connection) => connection.close().await,
            None => Ok(()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
