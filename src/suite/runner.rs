//! Suite runner.
//!
//! # Run Flow
//!
//! 1. Start the runtime if a command is configured
//! 2. Connect (failure aborts the run)
//! 3. For each group with selected cases: check its capability, run its
//!    setup, then run the cases in order
//! 4. Close the connection and stop the runtime
//!
//! A failing case never stops the cases after it.

// ============================================================================
// Imports
// ============================================================================

use std::time::Instant;

use serde_json::json;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::protocol::Command;
use crate::runtime::RuntimeProcess;
use crate::schema::SchemaValidator;
use crate::tester::{RuntimeInfo, Tester, TesterBuilder, TesterOptions};

use super::case::{Case, Category, Group, Step};
use super::report::{CaseOutcome, Status, SuiteReport};
use super::{component, graph, network, runtime};

// ============================================================================
// CaseFilter
// ============================================================================

/// Selects which cases of the catalog run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseFilter {
    /// Exact case name.
    pub case: Option<String>,
    /// Protocol area.
    pub category: Option<Category>,
}

impl CaseFilter {
    /// Selects every case.
    #[inline]
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Selects one case by name.
    #[inline]
    #[must_use]
    pub fn case(name: impl Into<String>) -> Self {
        Self {
            case: Some(name.into()),
            category: None,
        }
    }

    /// Selects one category.
    #[inline]
    #[must_use]
    pub fn category(category: Category) -> Self {
        Self {
            case: None,
            category: Some(category),
        }
    }

    /// Returns `true` if `case` is selected.
    #[must_use]
    pub fn matches(&self, case: &Case) -> bool {
        self.case.as_deref().is_none_or(|name| case.name == name)
            && self.category.is_none_or(|category| case.category == category)
    }
}

// ============================================================================
// ConformanceSuite
// ============================================================================

/// The conformance catalog bound to one set of options.
#[derive(Debug, Clone)]
pub struct ConformanceSuite {
    options: TesterOptions,
    builder: TesterBuilder,
    groups: Vec<Group>,
}

impl ConformanceSuite {
    /// Builds the catalog for `options`.
    #[must_use]
    pub fn new(options: TesterOptions) -> Self {
        let groups = vec![
            runtime::group(),
            graph::group(&options),
            network::group(&options),
            component::group(&options),
        ];
        let builder = Tester::builder().options(options.clone());

        Self {
            options,
            builder,
            groups,
        }
    }

    /// Installs a schema validator for inbound messages.
    #[must_use]
    pub fn with_validator(mut self, validator: impl SchemaValidator + 'static) -> Self {
        self.builder = self.builder.validator(validator);
        self
    }

    /// Returns the options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &TesterOptions {
        &self.options
    }

    /// Returns the groups in run order.
    #[inline]
    #[must_use]
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Iterates every case in run order.
    pub fn cases(&self) -> impl Iterator<Item = &Case> {
        self.groups.iter().flat_map(|group| group.cases.iter())
    }

    /// Runs the selected cases.
    ///
    /// # Errors
    ///
    /// Only setup failures are returned: invalid options, a runtime that
    /// fails to start, or a connection that can't be established. Case
    /// failures are recorded in the report.
    pub async fn run(&self, filter: &CaseFilter) -> Result<SuiteReport> {
        let mut tester = self.builder.clone().build()?;

        if self.cases().all(|case| !filter.matches(case)) {
            return Err(Error::config(format!("No case matches {filter:?}")));
        }

        let process = match &self.options.command {
            Some(command) => {
                Some(RuntimeProcess::start(command, self.options.startup_timeout).await?)
            }
            None => {
                info!("No runtime command, assuming the runtime is already running");
                None
            }
        };

        if let Err(e) = tester.connect().await {
            if let Some(process) = process {
                process.stop().await;
            }
            return Err(e);
        }

        let mut report = SuiteReport {
            runtime_type: self.options.runtime_type.clone(),
            version: self.options.semantic_version(),
            address: tester.options().url()?.to_string(),
            runtime: None,
            outcomes: Vec::new(),
        };

        for group in &self.groups {
            let selected: Vec<&Case> = group.cases.iter().filter(|c| filter.matches(c)).collect();
            if selected.is_empty() {
                continue;
            }
            self.run_group(&mut tester, group, &selected, &mut report).await;
        }

        if let Err(e) = tester.close().await {
            warn!(error = %e, "Connection did not close cleanly");
        }
        if let Some(process) = process {
            process.stop().await;
        }

        info!(
            passed = report.passed(),
            failed = report.failed(),
            "Conformance run finished"
        );
        Ok(report)
    }

    async fn run_group(
        &self,
        tester: &mut Tester,
        group: &Group,
        selected: &[&Case],
        report: &mut SuiteReport,
    ) {
        debug!(category = %group.category, cases = selected.len(), "Running group");

        if let Some(capability) = group.category.capability() {
            if report.runtime.is_none() && tester.capabilities().is_none() {
                match tester.request_runtime().await {
                    Ok(info) => report.runtime = Some(info),
                    Err(e) => warn!(error = %e, "Runtime metadata unavailable"),
                }
            }

            if let Err(e) = tester.require_capability(capability) {
                fail_all(selected, &e.to_string(), report);
                return;
            }
        }

        for step in &group.setup {
            if let Err(e) = execute(tester, step, &mut report.runtime).await {
                warn!(category = %group.category, error = %e, "Group setup failed");
                fail_all(selected, &format!("Setup failed: {e}"), report);
                return;
            }
        }

        for case in selected {
            let outcome = run_case(tester, case, &mut report.runtime).await;
            report.outcomes.push(outcome);
        }
    }
}

// ============================================================================
// Execution
// ============================================================================

async fn run_case(
    tester: &mut Tester,
    case: &Case,
    runtime: &mut Option<RuntimeInfo>,
) -> CaseOutcome {
    let started = Instant::now();
    let mut error = None;

    for step in &case.steps {
        if let Err(e) = execute(tester, step, runtime).await {
            error = Some(e.to_string());
            break;
        }
    }

    let status = if error.is_none() {
        Status::Passed
    } else {
        Status::Failed
    };
    debug!(case = %case.name, ?status, "Case finished");

    CaseOutcome {
        name: case.name.clone(),
        category: case.category,
        description: case.description.to_owned(),
        status,
        error,
        elapsed_ms: started.elapsed().as_millis() as u64,
    }
}

async fn execute(
    tester: &mut Tester,
    step: &Step,
    runtime: &mut Option<RuntimeInfo>,
) -> Result<()> {
    match step {
        Step::RequestRuntime => {
            *runtime = Some(tester.request_runtime().await?);
            Ok(())
        }

        Step::Scenario(scenario) => tester.run(scenario).await,

        Step::Drain { commands, count } => {
            let mut driver = tester.driver()?;
            for command in commands {
                driver.send(command).await?;
            }
            let budget = driver.default_timeout();
            driver.drain(*count, budget).await?;
            Ok(())
        }

        Step::AwaitComponent { component, budget } => {
            let mut driver = tester.driver()?;
            driver
                .send(&Command::new("component", "list", json!({})))
                .await?;
            driver
                .await_until(*budget, |message| {
                    message.protocol == "component"
                        && message.command == "component"
                        && message.get_str("name") == Some(component.as_str())
                })
                .await?;
            Ok(())
        }
    }
}

fn fail_all(cases: &[&Case], error: &str, report: &mut SuiteReport) {
    for case in cases {
        report.outcomes.push(CaseOutcome {
            name: case.name.clone(),
            category: case.category,
            description: case.description.to_owned(),
            status: Status::Failed,
            error: Some(error.to_owned()),
            elapsed_ms: 0,
        });
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    #[test]
    fn test_catalog() {
        let suite = ConformanceSuite::new(TesterOptions::new());
        let categories: Vec<_> = suite.groups().iter().map(|g| g.category).collect();
        assert_eq!(categories, Category::ALL);
        assert_eq!(suite.cases().count(), 1 + 15 + 4 + 1);
        assert_eq!(suite.cases().next().map(|c| c.name.as_str()), Some("runtime.metadata"));
    }

    #[test]
    fn test_case_names_are_unique() {
        let suite = ConformanceSuite::new(TesterOptions::new());
        let mut names: Vec<_> = suite.cases().map(|c| c.name.as_str()).collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn test_filter() {
        let suite = ConformanceSuite::new(TesterOptions::new());

        let network = CaseFilter::category(Category::Network);
        assert_eq!(suite.cases().filter(|c| network.matches(c)).count(), 4);

        let single = CaseFilter::case("graph.adding_an_edge");
        assert_eq!(suite.cases().filter(|c| single.matches(c)).count(), 1);

        let mismatch = CaseFilter {
            case: Some("graph.adding_an_edge".into()),
            category: Some(Category::Network),
        };
        assert_eq!(suite.cases().filter(|c| mismatch.matches(c)).count(), 0);
        assert_eq!(suite.cases().filter(|c| CaseFilter::all().matches(c)).count(), 21);
    }

    #[tokio::test]
    async fn test_unknown_case_is_config_error() {
        let suite = ConformanceSuite::new(TesterOptions::new());
        let err = suite.run(&CaseFilter::case("graph.nope")).await.unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[tokio::test]
    async fn test_connect_failure_aborts_run() {
        let options = TesterOptions::new()
            .with_host("127.0.0.1")
            .with_port(1)
            .with_retry(2, Duration::from_millis(10));
        let err = ConformanceSuite::new(options)
            .run(&CaseFilter::all())
            .await
            .unwrap_err();
        assert!(err.is_fatal_for_run());
    }
}
