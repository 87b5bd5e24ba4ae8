//! Connection supervision and runtime metadata.

mod common;

use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

use fbp_conformance::{Error, Tester, TesterOptions};
use serde_json::json;
use tokio::net::TcpListener;
use tokio_test::{assert_err, assert_ok};

use common::fake_runtime::FakeRuntime;
use common::{MockRuntime, msg, route};

async fn free_port() -> u16 {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind");
    listener.local_addr().expect("addr").port()
}

#[tokio::test]
async fn connect_retries_until_runtime_listens() -> anyhow::Result<()> {
    let port = free_port().await;

    let late = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(250)).await;
        MockRuntime::start_on(port, |_| Vec::new()).await
    });

    let options = TesterOptions::new()
        .with_host("127.0.0.1")
        .with_port(port)
        .with_retry(10, Duration::from_millis(100));
    let mut tester = Tester::builder().options(options).build()?;

    tester.connect().await?;
    let _runtime = late.await?;
    tester.close().await?;
    Ok(())
}

#[tokio::test]
async fn connect_gives_up_after_budget() {
    let port = free_port().await;
    let options = TesterOptions::new()
        .with_host("127.0.0.1")
        .with_port(port)
        .with_retry(10, Duration::from_millis(100));
    let mut tester = Tester::builder().options(options).build().expect("tester");

    let started = Instant::now();
    let err = tester.connect().await.unwrap_err();

    assert!(started.elapsed() >= Duration::from_millis(900));
    assert!(err.is_connection_error());
    assert!(err.is_fatal_for_run());
    match err {
        Error::Connect { attempts, .. } => assert_eq!(attempts, 10),
        other => panic!("expected connect error, got {other:?}"),
    }
}

#[tokio::test]
async fn request_runtime_records_capabilities() {
    let mut fake = FakeRuntime::with_capabilities("core", &["protocol:graph"]);
    let runtime = MockRuntime::start(move |command| fake.respond(command)).await;

    let mut tester = Tester::builder()
        .options(runtime.options())
        .build()
        .expect("tester");
    tester.connect().await.expect("connect");

    let info = tester.request_runtime().await.expect("metadata");
    assert_eq!(info.runtime_type.as_deref(), Some("fake"));
    assert_eq!(info.capabilities, ["protocol:graph"]);

    assert_ok!(tester.require_capability("protocol:graph"));
    let err = assert_err!(tester.require_capability("protocol:network"));
    assert!(matches!(err, Error::MissingCapability { .. }));

    let capabilities = tester.capabilities().expect("recorded");
    assert!(capabilities.contains("protocol:graph"));
    assert_eq!(capabilities.len(), 1);
}

#[tokio::test]
async fn runtime_metadata_must_be_the_next_message() {
    let runtime = MockRuntime::start(|command| match route(command) {
        ("runtime", "getruntime") => vec![msg("graph", "clear", json!({"id": "foo"}))],
        _ => Vec::new(),
    })
    .await;

    let mut tester = Tester::builder()
        .options(runtime.options())
        .build()
        .expect("tester");
    tester.connect().await.expect("connect");

    let err = tester.request_runtime().await.unwrap_err();
    assert!(matches!(err, Error::SchemaViolation { .. }), "{err:?}");
    assert!(tester.capabilities().is_none());
}
