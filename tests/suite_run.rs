//! The full conformance catalog against a fake runtime.

mod common;

use fbp_conformance::suite::Status;
use fbp_conformance::{CaseFilter, Category, ConformanceSuite};
use serde_json::json;

use common::MockRuntime;
use common::fake_runtime::FakeRuntime;

#[tokio::test]
async fn full_catalog_passes() {
    let mut fake = FakeRuntime::new("core");
    let runtime = MockRuntime::start(move |command| fake.respond(command)).await;

    let suite = ConformanceSuite::new(runtime.options().with_secret("s3cr3t"));
    let report = suite.run(&CaseFilter::all()).await.expect("run completes");

    let failures: Vec<_> = report
        .outcomes
        .iter()
        .filter(|o| !o.passed())
        .map(|o| format!("{}: {:?}", o.name, o.error))
        .collect();
    assert!(failures.is_empty(), "failing cases: {failures:#?}");
    assert_eq!(report.outcomes.len(), 21);
    assert_eq!(report.version, "0.7.0");
    assert!(report.runtime.is_some());

    // Every command carried the secret
    assert!(
        runtime
            .received()
            .iter()
            .all(|command| command["secret"] == "s3cr3t")
    );
}

#[tokio::test]
async fn collection_prefix_is_honoured() {
    let mut fake = FakeRuntime::new("noflo-core");
    let runtime = MockRuntime::start(move |command| fake.respond(command)).await;

    let suite = ConformanceSuite::new(runtime.options().with_collection("noflo-core"));
    let report = suite
        .run(&CaseFilter::category(Category::Component))
        .await
        .expect("run completes");

    assert_eq!(report.outcomes.len(), 1);
    assert!(report.all_passed(), "{}", report.render_text());
}

#[tokio::test]
async fn missing_capability_fails_the_whole_group() {
    let mut fake = FakeRuntime::with_capabilities("core", &["protocol:graph"]);
    let runtime = MockRuntime::start(move |command| fake.respond(command)).await;

    let suite = ConformanceSuite::new(runtime.options());
    let report = suite
        .run(&CaseFilter::category(Category::Network))
        .await
        .expect("run completes");

    assert_eq!(report.outcomes.len(), 4);
    for outcome in &report.outcomes {
        assert_eq!(outcome.status, Status::Failed);
        let error = outcome.error.as_deref().unwrap_or_default();
        assert!(error.contains("protocol:network"), "{error}");
    }
}

#[tokio::test]
async fn failing_case_does_not_stop_siblings() {
    let mut fake = FakeRuntime::new("core");
    let runtime = MockRuntime::start(move |command| {
        if common::route(command) == ("graph", "renamenode") {
            return vec![common::msg(
                "graph",
                "error",
                json!({"message": "Renaming not supported"}),
            )];
        }
        fake.respond(command)
    })
    .await;

    let suite = ConformanceSuite::new(runtime.options());
    let report = suite
        .run(&CaseFilter::category(Category::Graph))
        .await
        .expect("run completes");

    let failed: Vec<_> = report
        .outcomes
        .iter()
        .filter(|o| !o.passed())
        .map(|o| o.name.as_str())
        .collect();
    assert_eq!(failed, ["graph.renaming_a_node"]);
    assert_eq!(report.outcomes.len(), 15);

    let error = report.outcomes[9].error.as_deref().unwrap_or_default();
    assert!(error.contains("Renaming not supported"), "{error}");
}
