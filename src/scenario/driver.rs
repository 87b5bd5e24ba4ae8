//! Scenario driver.
//!
//! Runs one scenario at a time over a borrowed [`Connection`]:
//!
//! 1. Arm a [`Matcher`] with the scenario's expectations
//! 2. Send the scenario's commands in order
//! 3. Decode, validate and match inbound frames until the matcher finishes
//! 4. Give up with [`Error::Timeout`] when the budget runs out
//!
//! Waiting is cancel-safe. A timed-out scenario leaves the connection open,
//! and frames that arrive afterwards are seen by the next scenario.

// ============================================================================
// Imports
// ============================================================================

use std::future::Future;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::time::timeout;
use tracing::{debug, info, trace, warn};

use crate::error::{Error, Result};
use crate::protocol::{Codec, Command, Message};
use crate::schema::SchemaGate;
use crate::transport::Connection;

use super::definition::Scenario;
use super::matcher::{Matcher, Verdict};

// ============================================================================
// Constants
// ============================================================================

/// Default time budget for a scenario.
pub const DEFAULT_SCENARIO_TIMEOUT: Duration = Duration::from_secs(2);

// ============================================================================
// ScenarioDriver
// ============================================================================

/// Drives scenarios over a borrowed connection.
#[derive(Debug)]
pub struct ScenarioDriver<'a> {
    /// Connection shared by every scenario of the run.
    connection: &'a mut Connection,
    /// Outbound encoder and inbound sanitizer.
    codec: &'a Codec,
    /// Schema validation for every inbound message.
    gate: &'a SchemaGate,
    /// Budget for scenarios without their own timeout.
    default_timeout: Duration,
}

impl<'a> ScenarioDriver<'a> {
    /// Creates a driver.
    #[must_use]
    pub fn new(
        connection: &'a mut Connection,
        codec: &'a Codec,
        gate: &'a SchemaGate,
        default_timeout: Duration,
    ) -> Self {
        Self {
            connection,
            codec,
            gate,
            default_timeout,
        }
    }

    /// Returns the budget used for scenarios without their own timeout.
    #[inline]
    #[must_use]
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    // ========================================================================
    // Sending
    // ========================================================================

    /// Encodes and sends one command.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] or [`Error::WebSocket`] if the
    /// frame can't be written.
    pub async fn send(&self, command: &Command) -> Result<()> {
        let frame = self.codec.encode(command)?;
        debug!(protocol = %command.protocol, command = %command.command, "Sending command");
        self.connection.send_text(frame).await
    }

    // ========================================================================
    // Receiving
    // ========================================================================

    /// Waits for the next inbound message, validated against its own schema.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if the stream ended
    /// - [`Error::Decode`] if the frame is malformed
    /// - [`Error::SchemaViolation`] if validation fails
    pub async fn next_message(&mut self) -> Result<Message> {
        let message = self.next_decoded().await?;
        self.gate.check(&message)?;
        Ok(message)
    }

    /// Waits for the next inbound message and validates it against
    /// `schema_id` instead of its own.
    ///
    /// # Errors
    ///
    /// Same as [`ScenarioDriver::next_message`].
    pub async fn next_message_as(&mut self, schema_id: &str) -> Result<Message> {
        let message = self.next_decoded().await?;
        self.gate.check_as(&message, schema_id)?;
        Ok(message)
    }

    async fn next_decoded(&mut self) -> Result<Message> {
        let frame = self
            .connection
            .recv_frame()
            .await
            .ok_or(Error::ConnectionClosed)?;
        let message = Codec::decode(&frame)?;
        trace!(schema = %message.schema_id(), "Message received");
        Ok(message)
    }

    // ========================================================================
    // Scenarios
    // ========================================================================

    /// Runs a scenario to completion.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the scenario has no expectations
    /// - [`Error::Timeout`] if the expectations are not met in time
    /// - Any scenario failure raised while matching
    pub async fn run(&mut self, scenario: &Scenario) -> Result<()> {
        scenario.validate()?;

        let budget = scenario.timeout_override().unwrap_or(self.default_timeout);
        let mut matcher = Matcher::arm(
            scenario.expectations().iter().cloned(),
            scenario.tolerates_extra(),
        );

        debug!(
            scenario = scenario.name(),
            expectations = matcher.remaining(),
            tolerate_extra = scenario.tolerates_extra(),
            "Scenario armed"
        );

        let started = Instant::now();
        let result = within(budget, scenario.name(), async {
            for command in scenario.commands() {
                self.send(command).await?;
            }
            loop {
                let message = self.next_message().await?;
                if matcher.on_message(message)? == Verdict::Complete {
                    return Ok(());
                }
            }
        })
        .await;

        match &result {
            Ok(()) => info!(
                scenario = scenario.name(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Scenario passed"
            ),
            Err(e) => warn!(
                scenario = scenario.name(),
                matched = matcher.matched(),
                remaining = matcher.remaining(),
                error = %e,
                "Scenario failed"
            ),
        }

        result
    }

    /// Runs a scenario and hands its outcome to `on_complete`.
    ///
    /// The callback is invoked exactly once, with `Ok(())` on success or
    /// the first failure.
    pub async fn run_with<F, R>(&mut self, scenario: &Scenario, on_complete: F) -> R
    where
        F: FnOnce(Result<()>) -> R,
    {
        let result = self.run(scenario).await;
        on_complete(result)
    }

    /// Consumes `count` validated messages regardless of their content.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if fewer arrive within `budget`, or the
    /// first decode/validation failure.
    pub async fn drain(&mut self, count: usize, budget: Duration) -> Result<Vec<Message>> {
        let operation = format!("draining {count} messages");
        within(budget, &operation, async {
            let mut messages = Vec::with_capacity(count);
            while messages.len() < count {
                messages.push(self.next_message().await?);
            }
            debug!(count, "Drained messages");
            Ok(messages)
        })
        .await
    }

    /// Consumes validated messages until one satisfies `predicate`.
    ///
    /// An `error` message fails the wait.
    ///
    /// # Errors
    ///
    /// - [`Error::UnexpectedRuntimeError`] if the runtime reports an error
    /// - [`Error::Timeout`] if no message matches within `budget`
    pub async fn await_until<P>(&mut self, budget: Duration, mut predicate: P) -> Result<Message>
    where
        P: FnMut(&Message) -> bool,
    {
        within(budget, "awaiting message", async {
            let mut skipped = 0usize;
            loop {
                let message = self.next_message().await?;
                if message.is_error() {
                    return Err(Error::unexpected_runtime_error(
                        message.protocol,
                        Value::Object(message.payload),
                    ));
                }
                if predicate(&message) {
                    debug!(skipped, schema = %message.schema_id(), "Awaited message arrived");
                    return Ok(message);
                }
                skipped += 1;
            }
        })
        .await
    }

}

/// Bounds `future` by `budget`.
async fn within<T>(
    budget: Duration,
    operation: &str,
    future: impl Future<Output = Result<T>>,
) -> Result<T> {
    timeout(budget, future)
        .await
        .map_err(|_| Error::timeout(operation, budget.as_millis() as u64))?
}

// ============================================================================
// Tests
// ============================================================================
