//! Expectation matcher.
//!
//! Holds the ordered expectation queue of one in-flight scenario and
//! decides, for each validated inbound message, whether it matches,
//! is ignored, or fails the scenario.
//!
//! # Decision Order
//!
//! 1. An `error` message fails the scenario unless the front expectation
//!    is itself an `error`.
//! 2. In tolerate-extra mode, a message whose protocol/command differ from
//!    the front expectation is ignored.
//! 3. Otherwise the front expectation is popped and compared after
//!    normalization; a difference fails the scenario.
//! 4. An empty queue completes the scenario.
//!
//! Once complete or failed the matcher is done and ignores further input,
//! so completion is reported at most once.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;

use serde_json::Value;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::protocol::{Expectation, Message, normalize, payload_eq};

// ============================================================================
// Verdict
// ============================================================================

/// Outcome of feeding one message to the matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Matched the front expectation; more remain.
    Pending,
    /// Not relevant to the scenario; the queue is untouched.
    Ignored,
    /// Matched the last expectation.
    Complete,
}

// ============================================================================
// Matcher
// ============================================================================

/// State machine consuming inbound messages against an expectation queue.
#[derive(Debug, Clone)]
pub struct Matcher {
    /// Remaining expectations, front first.
    queue: VecDeque<Expectation>,
    /// Skip messages that don't match the front expectation.
    tolerate_extra: bool,
    /// Set on completion or failure.
    done: bool,
    /// Number of expectations matched so far.
    matched: usize,
}

impl Matcher {
    /// Arms a matcher with an ordered queue of expectations.
    ///
    /// An empty queue never completes.
    #[must_use]
    pub fn arm(expectations: impl IntoIterator<Item = Expectation>, tolerate_extra: bool) -> Self {
        Self {
            queue: expectations.into_iter().collect(),
            tolerate_extra,
            done: false,
            matched: 0,
        }
    }

    /// Returns `true` once the matcher has completed or failed.
    #[inline]
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Returns the number of expectations still waiting.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    /// Returns the number of expectations matched so far.
    #[inline]
    #[must_use]
    pub fn matched(&self) -> usize {
        self.matched
    }

    /// Returns the expectation the next message is compared against.
    #[inline]
    #[must_use]
    pub fn front(&self) -> Option<&Expectation> {
        self.queue.front()
    }

    /// Consumes one schema-validated inbound message.
    ///
    /// # Errors
    ///
    /// - [`Error::UnexpectedRuntimeError`] for an unanticipated `error`
    /// - [`Error::AssertionMismatch`] if the popped expectation differs
    pub fn on_message(&mut self, message: Message) -> Result<Verdict> {
        if self.done {
            trace!(command = %message.command, "Matcher done, ignoring message");
            return Ok(Verdict::Ignored);
        }

        let result = self.step(message);
        if !matches!(result, Ok(Verdict::Pending | Verdict::Ignored)) {
            self.done = true;
        }
        result
    }

    fn step(&mut self, mut message: Message) -> Result<Verdict> {
        let error_expected = self.queue.front().is_some_and(Expectation::is_error);
        if message.is_error() && !error_expected {
            debug!(protocol = %message.protocol, "Unexpected runtime error");
            return Err(Error::unexpected_runtime_error(
                message.protocol,
                Value::Object(message.payload),
            ));
        }

        let Some(front) = self.queue.front() else {
            trace!(command = %message.command, "No expectation armed, ignoring message");
            return Ok(Verdict::Ignored);
        };

        if self.tolerate_extra && !message.matches(front) {
            trace!(
                schema = %message.schema_id(),
                expected = %front.schema_id(),
                "Ignoring extra message"
            );
            return Ok(Verdict::Ignored);
        }

        let Some(mut expected) = self.queue.pop_front() else {
            return Ok(Verdict::Ignored);
        };

        let actual_schema = message.schema_id();
        let expected_schema = expected.schema_id();

        normalize(&message.protocol, &message.command, &mut message.payload);
        normalize(&message.protocol, &message.command, &mut expected.payload);

        let actual = Value::Object(message.payload);
        let expected_payload = Value::Object(expected.payload);

        if actual_schema != expected_schema || !payload_eq(&actual, &expected_payload) {
            return Err(Error::AssertionMismatch {
                expected_schema,
                expected: expected_payload,
                actual_schema,
                actual,
            });
        }

        self.matched += 1;
        trace!(schema = %actual_schema, remaining = self.queue.len(), "Expectation matched");

        if self.queue.is_empty() {
            Ok(Verdict::Complete)
        } else {
            Ok(Verdict::Pending)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;
    use serde_json::json;

    use crate::protocol::object;

    fn msg(protocol: &str, command: &str, payload: Value) -> Message {
        Message::new(protocol, command, object(payload))
    }

    fn exp(protocol: &str, command: &str, payload: Value) -> Expectation {
        Expectation::new(protocol, command, payload)
    }

    #[test]
    fn test_tolerate_extra_ignores_side_announcements() {
        let mut matcher = Matcher::arm([exp("graph", "clear", json!({"id": "foo"}))], true);

        let verdict = matcher
            .on_message(msg("graph", "changenode", json!({"id": "Drop1", "graph": "foo"})))
            .expect("ignored");
        assert_eq!(verdict, Verdict::Ignored);
        assert_eq!(matcher.remaining(), 1);

        let verdict = matcher
            .on_message(msg("graph", "clear", json!({"id": "foo"})))
            .expect("matched");
        assert_eq!(verdict, Verdict::Complete);
        assert!(matcher.is_done());
    }

    #[test]
    fn test_unexpected_error_fails_with_payload() {
        let mut matcher = Matcher::arm([exp("graph", "addnode", json!({"id": "X"}))], true);

        let err = matcher
            .on_message(msg("graph", "error", json!({"message": "No graph specified"})))
            .unwrap_err();

        match err {
            Error::UnexpectedRuntimeError { protocol, payload } => {
                assert_eq!(protocol, "graph");
                assert_eq!(payload, json!({"message": "No graph specified"}));
            }
            other => panic!("expected unexpected runtime error, got {other:?}"),
        }
        assert!(matcher.is_done());
    }

    #[test]
    fn test_expected_error_matches_without_stack() {
        let mut matcher = Matcher::arm(
            [exp("graph", "error", json!({"message": "Requested graph not found"}))],
            true,
        );

        let verdict = matcher
            .on_message(msg(
                "graph",
                "error",
                json!({"message": "Requested graph not found", "stack": "Error: ...\n at x"}),
            ))
            .expect("matched");
        assert_eq!(verdict, Verdict::Complete);
    }

    #[test]
    fn test_network_started_ignores_time_and_running() {
        let mut matcher = Matcher::arm([exp("network", "started", json!({"graph": "bar"}))], false);

        let verdict = matcher
            .on_message(msg(
                "network",
                "started",
                json!({"graph": "bar", "time": "2024-01-01T00:00:00Z", "running": true}),
            ))
            .expect("matched");
        assert_eq!(verdict, Verdict::Complete);
    }

    #[test]
    fn test_strict_mode_fails_on_extra_message() {
        let mut matcher = Matcher::arm([exp("graph", "clear", json!({"id": "foo"}))], false);

        let err = matcher
            .on_message(msg("graph", "changenode", json!({"id": "Drop1"})))
            .unwrap_err();
        match err {
            Error::AssertionMismatch {
                expected_schema,
                actual_schema,
                ..
            } => {
                assert_eq!(expected_schema, "graph/output/clear");
                assert_eq!(actual_schema, "graph/output/changenode");
            }
            other => panic!("expected mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_payload_mismatch_fails() {
        let mut matcher = Matcher::arm(
            [exp("graph", "changenode", json!({"id": "Drop1", "metadata": {"sort": 1}}))],
            true,
        );

        let err = matcher
            .on_message(msg("graph", "changenode", json!({"id": "Drop1", "metadata": {}})))
            .unwrap_err();
        assert!(matches!(err, Error::AssertionMismatch { .. }));
    }

    #[test]
    fn test_multiple_expectations_in_order() {
        let mut matcher = Matcher::arm(
            [
                exp("graph", "removeedge", json!({"graph": "foo"})),
                exp("graph", "removenode", json!({"id": "Drop1", "graph": "foo"})),
            ],
            true,
        );

        assert_eq!(
            matcher
                .on_message(msg("graph", "changeedge", json!({})))
                .expect("ignored"),
            Verdict::Ignored
        );
        assert_eq!(
            matcher
                .on_message(msg("graph", "removeedge", json!({"graph": "foo"})))
                .expect("matched"),
            Verdict::Pending
        );
        assert_eq!(matcher.matched(), 1);
        assert_eq!(
            matcher
                .on_message(msg("graph", "removenode", json!({"id": "Drop1", "graph": "foo"})))
                .expect("matched"),
            Verdict::Complete
        );
    }

    #[test]
    fn test_done_matcher_ignores_traffic() {
        let mut matcher = Matcher::arm([exp("graph", "clear", json!({}))], false);
        assert_eq!(
            matcher.on_message(msg("graph", "clear", json!({}))).expect("matched"),
            Verdict::Complete
        );

        // Neither a second completion nor a late error
        assert_eq!(
            matcher.on_message(msg("graph", "clear", json!({}))).expect("ignored"),
            Verdict::Ignored
        );
        assert_eq!(
            matcher
                .on_message(msg("graph", "error", json!({"message": "late"})))
                .expect("ignored"),
            Verdict::Ignored
        );
    }

    #[test]
    fn test_failed_matcher_ignores_traffic() {
        let mut matcher = Matcher::arm([exp("graph", "clear", json!({"id": "a"}))], false);
        assert!(matcher.on_message(msg("graph", "clear", json!({"id": "b"}))).is_err());
        assert_eq!(
            matcher.on_message(msg("graph", "clear", json!({"id": "a"}))).expect("ignored"),
            Verdict::Ignored
        );
    }

    #[test]
    fn test_empty_queue_never_completes() {
        let mut matcher = Matcher::arm(Vec::new(), false);
        assert_eq!(
            matcher.on_message(msg("graph", "clear", json!({}))).expect("ignored"),
            Verdict::Ignored
        );
        assert!(!matcher.is_done());

        // An error with nothing armed is still unexpected
        assert!(matcher.on_message(msg("graph", "error", json!({}))).is_err());
    }

    proptest! {
        #[test]
        fn prop_strict_mode_never_matches_out_of_order(len in 2usize..6, pick in 1usize..6) {
            let pick = pick % len;
            prop_assume!(pick != 0);

            let expectations: Vec<_> = (0..len)
                .map(|i| exp("graph", "addnode", json!({"id": format!("n{i}")})))
                .collect();
            let mut matcher = Matcher::arm(expectations, false);

            let out_of_order = msg("graph", "addnode", json!({"id": format!("n{pick}")}));
            prop_assert!(matcher.on_message(out_of_order).is_err());
        }

        #[test]
        fn prop_in_order_delivery_completes_exactly_once(len in 1usize..8) {
            let expectations: Vec<_> = (0..len)
                .map(|i| exp("graph", "addnode", json!({"id": format!("n{i}")})))
                .collect();
            let mut matcher = Matcher::arm(expectations, true);

            let mut completions = 0;
            for i in 0..len {
                let noise = msg("graph", "changenode", json!({"id": "x"}));
                prop_assert_eq!(matcher.on_message(noise).expect("ignored"), Verdict::Ignored);

                let verdict = matcher
                    .on_message(msg("graph", "addnode", json!({"id": format!("n{i}")})))
                    .expect("matched");
                if verdict == Verdict::Complete {
                    completions += 1;
                }
            }
            let late = msg("graph", "addnode", json!({"id": "n0"}));
            if matcher.on_message(late).expect("ignored") == Verdict::Complete {
                completions += 1;
            }
            prop_assert_eq!(completions, 1);
        }
    }
}
