//! Tester: one connection, many scenarios.
//!
//! The tester owns the [`Supervisor`], the [`Codec`] and the
//! [`SchemaGate`]. Every scenario of a run borrows the same connection
//! through a short-lived [`ScenarioDriver`].

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Value, from_value};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::protocol::{Codec, Command, Message};
use crate::scenario::{Scenario, ScenarioDriver};
use crate::schema::SchemaGate;
use crate::transport::{Capabilities, ConnectionState, Supervisor};

use super::builder::TesterBuilder;
use super::options::TesterOptions;

// ============================================================================
// Constants
// ============================================================================

/// Schema the runtime metadata reply is validated against.
const RUNTIME_SCHEMA: &str = "runtime/output/runtime";

// ============================================================================
// RuntimeInfo
// ============================================================================

/// Runtime metadata from `runtime/runtime`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeInfo {
    /// Runtime type, e.g. `noflo-nodejs`.
    #[serde(rename = "type")]
    pub runtime_type: Option<String>,
    /// Protocol version the runtime implements.
    pub version: Option<String>,
    /// Capabilities granted to this client.
    pub capabilities: Vec<String>,
    /// Capabilities the runtime supports at all.
    #[serde(rename = "allCapabilities")]
    pub all_capabilities: Vec<String>,
    /// Runtime identifier.
    pub id: Option<String>,
    /// Human-readable label.
    pub label: Option<String>,
    /// Main graph, if any.
    pub graph: Option<String>,
}

impl RuntimeInfo {
    /// Returns `true` if the capability was granted.
    #[inline]
    #[must_use]
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }
}

// ============================================================================
// Tester
// ============================================================================

/// Runs scenarios against one runtime over one connection.
///
/// # Example
///
/// ```no_run
/// use fbp_conformance::{Scenario, Tester, TesterOptions};
/// use serde_json::json;
///
/// # async fn example() -> fbp_conformance::Result<()> {
/// let mut tester = Tester::builder()
///     .options(TesterOptions::new().with_port(3569))
///     .build()?;
///
/// tester.connect().await?;
/// let info = tester.request_runtime().await?;
/// println!("capabilities: {:?}", info.capabilities);
///
/// tester
///     .run(
///         &Scenario::new("graph.clear")
///             .expect("graph", "clear", json!({"id": "foo", "main": true}))
///             .send("graph", "clear", json!({"id": "foo", "main": true}))
///             .tolerate_extra(),
///     )
///     .await?;
///
/// tester.close().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Tester {
    options: TesterOptions,
    supervisor: Supervisor,
    codec: Codec,
    gate: SchemaGate,
}

impl Tester {
    /// Creates a configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> TesterBuilder {
        TesterBuilder::new()
    }

    /// Creates a tester from validated options.
    pub(crate) fn new(options: TesterOptions, gate: SchemaGate) -> Result<Self> {
        let supervisor = Supervisor::new(
            options.url()?,
            options.subprotocol.clone(),
            options.retry_policy(),
        );
        let codec = Codec::new(options.secret.clone());

        Ok(Self {
            options,
            supervisor,
            codec,
            gate,
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Returns the options this tester was built with.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &TesterOptions {
        &self.options
    }

    /// Returns the connection state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.supervisor.state()
    }

    /// Returns the capabilities recorded from runtime metadata.
    #[inline]
    #[must_use]
    pub fn capabilities(&self) -> Option<&Capabilities> {
        self.supervisor.current().and_then(|c| c.capabilities())
    }

    // ========================================================================
    // Connection
    // ========================================================================

    /// Connects to the runtime, retrying per the options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connect`] once every attempt has failed.
    pub async fn connect(&mut self) -> Result<()> {
        self.supervisor.connect().await?;
        Ok(())
    }

    /// Closes the connection gracefully.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if the close is not acknowledged.
    pub async fn close(&mut self) -> Result<()> {
        self.supervisor.teardown().await
    }

    /// Borrows the connection for scenario work.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if not connected.
    pub fn driver(&mut self) -> Result<ScenarioDriver<'_>> {
        let connection = self.supervisor.connection()?;
        Ok(ScenarioDriver::new(
            connection,
            &self.codec,
            &self.gate,
            self.options.scenario_timeout,
        ))
    }

    // ========================================================================
    // Scenarios
    // ========================================================================

    /// Sends one command without waiting for a reply.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if not connected.
    pub async fn send(&mut self, protocol: &str, command: &str, payload: Value) -> Result<()> {
        let command = Command::new(protocol, command, payload);
        self.driver()?.send(&command).await
    }

    /// Runs a scenario.
    ///
    /// # Errors
    ///
    /// Returns the first scenario failure.
    pub async fn run(&mut self, scenario: &Scenario) -> Result<()> {
        self.driver()?.run(scenario).await
    }

    /// Runs a scenario and hands its outcome to `on_complete` exactly once.
    pub async fn run_with<F, R>(&mut self, scenario: &Scenario, on_complete: F) -> R
    where
        F: FnOnce(Result<()>) -> R,
    {
        match self.driver() {
            Ok(mut driver) => driver.run_with(scenario, on_complete).await,
            Err(e) => on_complete(Err(e)),
        }
    }

    /// Consumes `count` validated messages within the scenario timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if fewer arrive in time.
    pub async fn drain(&mut self, count: usize) -> Result<Vec<Message>> {
        let budget = self.options.scenario_timeout;
        self.driver()?.drain(count, budget).await
    }

    /// Consumes validated messages until one satisfies `predicate`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if none does within `budget`.
    pub async fn await_until<P>(&mut self, budget: Duration, predicate: P) -> Result<Message>
    where
        P: FnMut(&Message) -> bool,
    {
        self.driver()?.await_until(budget, predicate).await
    }

    // ========================================================================
    // Runtime Metadata
    // ========================================================================

    /// Requests runtime metadata and records the advertised capabilities.
    ///
    /// The next inbound message is taken as the reply and validated against
    /// `runtime/output/runtime`.
    ///
    /// # Errors
    ///
    /// - [`Error::SchemaViolation`] if the reply isn't runtime metadata
    /// - [`Error::Timeout`] if no reply arrives
    pub async fn request_runtime(&mut self) -> Result<RuntimeInfo> {
        let budget = self.options.scenario_timeout;

        let message = {
            let mut driver = self.driver()?;
            driver
                .send(&Command::new("runtime", "getruntime", Value::Object(Default::default())))
                .await?;
            tokio::time::timeout(budget, driver.next_message_as(RUNTIME_SCHEMA))
                .await
                .map_err(|_| Error::timeout("runtime metadata", budget.as_millis() as u64))??
        };

        let info: RuntimeInfo = from_value(Value::Object(message.payload))
            .map_err(|e| Error::decode(format!("invalid runtime metadata: {e}")))?;

        self.supervisor
            .connection()?
            .set_capabilities(info.capabilities.iter().cloned());

        info!(
            runtime_type = info.runtime_type.as_deref().unwrap_or("unknown"),
            version = info.version.as_deref().unwrap_or("unknown"),
            capabilities = info.capabilities.len(),
            "Runtime metadata received"
        );
        Ok(info)
    }

    /// Checks the runtime granted `capability`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCapability`] if it was not advertised, or if
    /// no metadata has been received yet.
    pub fn require_capability(&self, capability: &str) -> Result<()> {
        let granted = self
            .supervisor
            .current()
            .is_some_and(|c| c.has_capability(capability));

        if granted {
            Ok(())
        } else {
            debug!(capability, "Capability not granted");
            Err(Error::missing_capability(capability))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
