//! Tester configuration.
//!
//! # Example
//!
//! ```
//! use fbp_conformance::TesterOptions;
//!
//! let options = TesterOptions::new()
//!     .with_host("127.0.0.1")
//!     .with_port(3569)
//!     .with_collection("noflo-core")
//!     .with_secret("s3cr3t");
//!
//! assert_eq!(options.url().unwrap().as_str(), "ws://127.0.0.1:3569/");
//! assert_eq!(options.semantic_version(), "0.7.0");
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};
use crate::runtime::DEFAULT_STARTUP_TIMEOUT;
use crate::scenario::DEFAULT_SCENARIO_TIMEOUT;
use crate::transport::RetryPolicy;
use crate::transport::supervisor::{
    DEFAULT_ATTEMPT_TIMEOUT, DEFAULT_CONNECT_ATTEMPTS, DEFAULT_RETRY_DELAY,
};

// ============================================================================
// Constants
// ============================================================================

/// Environment variable holding the shared secret.
pub const SECRET_ENV_VAR: &str = "FBP_PROTOCOL_SECRET";

/// WebSocket subprotocol spoken by FBP runtimes.
pub const DEFAULT_SUBPROTOCOL: &str = "noflo";

// ============================================================================
// TesterOptions
// ============================================================================

/// Connection, timing and fixture settings for a conformance run.
#[derive(Clone, PartialEq, Eq)]
pub struct TesterOptions {
    /// Runtime host name.
    pub host: String,

    /// Runtime port.
    pub port: u16,

    /// WebSocket path, starting with `/`.
    pub path: String,

    /// Subprotocol requested during the handshake.
    pub subprotocol: String,

    /// Connect attempts before giving up.
    pub connect_attempts: u32,

    /// Delay between connect attempts.
    pub retry_delay: Duration,

    /// Time budget for one WebSocket handshake.
    pub attempt_timeout: Duration,

    /// Default time budget for a scenario.
    pub scenario_timeout: Duration,

    /// Shared secret attached to every command.
    pub secret: Option<String>,

    /// Component library prefix, e.g. `core` in `core/Repeat`.
    pub collection: String,

    /// Protocol version the runtime is tested against.
    pub protocol_version: String,

    /// Label for the runtime under test.
    pub runtime_type: String,

    /// Base directory sent with `graph/clear`; the working directory if unset.
    pub base_dir: Option<PathBuf>,

    /// Shell command that starts the runtime.
    pub command: Option<String>,

    /// Time budget for the started runtime to become ready.
    pub startup_timeout: Duration,
}

impl fmt::Debug for TesterOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TesterOptions")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("path", &self.path)
            .field("subprotocol", &self.subprotocol)
            .field("connect_attempts", &self.connect_attempts)
            .field("retry_delay", &self.retry_delay)
            .field("attempt_timeout", &self.attempt_timeout)
            .field("scenario_timeout", &self.scenario_timeout)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("collection", &self.collection)
            .field("protocol_version", &self.protocol_version)
            .field("runtime_type", &self.runtime_type)
            .field("base_dir", &self.base_dir)
            .field("command", &self.command)
            .field("startup_timeout", &self.startup_timeout)
            .finish()
    }
}

impl Default for TesterOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl TesterOptions {
    /// Creates options with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            host: "localhost".into(),
            port: 8080,
            path: "/".into(),
            subprotocol: DEFAULT_SUBPROTOCOL.into(),
            connect_attempts: DEFAULT_CONNECT_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            scenario_timeout: DEFAULT_SCENARIO_TIMEOUT,
            secret: None,
            collection: "core".into(),
            protocol_version: "0.7".into(),
            runtime_type: "noflo".into(),
            base_dir: None,
            command: None,
            startup_timeout: DEFAULT_STARTUP_TIMEOUT,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl TesterOptions {
    /// Sets the runtime host.
    #[inline]
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the runtime port.
    #[inline]
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the WebSocket path.
    #[inline]
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Sets connect attempts and the delay between them.
    #[inline]
    #[must_use]
    pub fn with_retry(mut self, attempts: u32, delay: Duration) -> Self {
        self.connect_attempts = attempts;
        self.retry_delay = delay;
        self
    }

    /// Sets the per-handshake time budget.
    #[inline]
    #[must_use]
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Sets the default scenario time budget.
    #[inline]
    #[must_use]
    pub fn with_scenario_timeout(mut self, timeout: Duration) -> Self {
        self.scenario_timeout = timeout;
        self
    }

    /// Sets the shared secret.
    #[inline]
    #[must_use]
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Reads the shared secret from `FBP_PROTOCOL_SECRET`.
    ///
    /// Leaves the secret untouched if the variable is unset.
    #[must_use]
    pub fn with_secret_from_env(mut self) -> Self {
        if let Ok(secret) = env::var(SECRET_ENV_VAR) {
            self.secret = Some(secret);
        }
        self
    }

    /// Sets the component collection.
    #[inline]
    #[must_use]
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Sets the protocol version.
    #[inline]
    #[must_use]
    pub fn with_protocol_version(mut self, version: impl Into<String>) -> Self {
        self.protocol_version = version.into();
        self
    }

    /// Sets the runtime type label.
    #[inline]
    #[must_use]
    pub fn with_runtime_type(mut self, runtime_type: impl Into<String>) -> Self {
        self.runtime_type = runtime_type.into();
        self
    }

    /// Sets the base directory sent with `graph/clear`.
    #[inline]
    #[must_use]
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Sets the shell command that starts the runtime.
    #[inline]
    #[must_use]
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Sets the runtime startup time budget.
    #[inline]
    #[must_use]
    pub fn with_startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }
}

// ============================================================================
// Conversion Methods
// ============================================================================

impl TesterOptions {
    /// Returns the runtime address, `ws://host:port/path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the address doesn't parse.
    pub fn url(&self) -> Result<Url> {
        let address = format!("ws://{}:{}{}", self.host, self.port, self.path);
        Url::parse(&address).map_err(|e| Error::config(format!("Invalid address {address}: {e}")))
    }

    /// Returns the connect retry policy.
    #[inline]
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.connect_attempts,
            retry_delay: self.retry_delay,
            attempt_timeout: self.attempt_timeout,
        }
    }

    /// Returns the protocol version as `major.minor.patch`.
    ///
    /// A two-component version like `0.7` is reported as `0.7.0`.
    #[must_use]
    pub fn semantic_version(&self) -> String {
        if self.protocol_version.split('.').count() == 2 {
            format!("{}.0", self.protocol_version)
        } else {
            self.protocol_version.clone()
        }
    }

    /// Returns the base directory, falling back to the working directory.
    #[must_use]
    pub fn resolved_base_dir(&self) -> PathBuf {
        match &self.base_dir {
            Some(dir) => env::current_dir().map_or_else(|_| dir.clone(), |cwd| cwd.join(dir)),
            None => env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Returns a fully qualified component name, `collection/name`.
    #[inline]
    #[must_use]
    pub fn component(&self, name: &str) -> String {
        format!("{}/{name}", self.collection)
    }

    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(Error::config("Host must not be empty"));
        }
        if self.port == 0 {
            return Err(Error::config("Port must be greater than zero"));
        }
        if !self.path.starts_with('/') {
            return Err(Error::config(format!(
                "Path must start with '/', got {:?}",
                self.path
            )));
        }
        if self.subprotocol.is_empty() {
            return Err(Error::config("Subprotocol must not be empty"));
        }
        if self.connect_attempts == 0 {
            return Err(Error::config("Connect attempts must be at least 1"));
        }
        if self.scenario_timeout.is_zero() || self.attempt_timeout.is_zero() {
            return Err(Error::config("Timeouts must be greater than zero"));
        }
        if self.collection.is_empty() {
            return Err(Error::config("Component collection must not be empty"));
        }
        if self.protocol_version.is_empty() {
            return Err(Error::config("Protocol version must not be empty"));
        }
        self.url()?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
