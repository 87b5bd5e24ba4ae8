//! Shared fixtures: an in-process runtime speaking the FBP protocol over
//! WebSocket.

#![allow(dead_code)]

pub mod fake_runtime;

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use fbp_conformance::TesterOptions;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
use tracing_subscriber::EnvFilter;

/// Reply to be sent by the mock runtime.
#[derive(Debug, Clone)]
pub enum Reply {
    /// A JSON message.
    Json(Value),
    /// A raw text frame, sent verbatim.
    Raw(String),
}

/// Builds a protocol message.
pub fn msg(protocol: &str, command: &str, payload: Value) -> Reply {
    Reply::Json(json!({"protocol": protocol, "command": command, "payload": payload}))
}

type Responder = Box<dyn FnMut(&Value) -> Vec<Reply> + Send>;

/// Installs a test subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("fbp_conformance=debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// A WebSocket server answering each inbound command through a responder.
pub struct MockRuntime {
    addr: SocketAddr,
    received: Arc<Mutex<Vec<Value>>>,
    task: JoinHandle<()>,
}

impl MockRuntime {
    /// Starts on a random local port.
    pub async fn start(responder: impl FnMut(&Value) -> Vec<Reply> + Send + 'static) -> Self {
        Self::start_on(0, responder).await
    }

    /// Starts on a given local port.
    pub async fn start_on(
        port: u16,
        responder: impl FnMut(&Value) -> Vec<Reply> + Send + 'static,
    ) -> Self {
        init_tracing();

        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, port))
            .await
            .expect("bind mock runtime");
        let addr = listener.local_addr().expect("local addr");
        let received = Arc::new(Mutex::new(Vec::new()));
        let responder: Arc<Mutex<Responder>> = Arc::new(Mutex::new(Box::new(responder)));

        let task = tokio::spawn({
            let received = Arc::clone(&received);
            async move {
                while let Ok((stream, _)) = listener.accept().await {
                    tokio::spawn(serve(
                        stream,
                        Arc::clone(&received),
                        Arc::clone(&responder),
                    ));
                }
            }
        });

        Self {
            addr,
            received,
            task,
        }
    }

    /// Returns the listening port.
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Returns options pointing at this runtime with short timeouts.
    pub fn options(&self) -> TesterOptions {
        TesterOptions::new()
            .with_host("127.0.0.1")
            .with_port(self.port())
            .with_retry(3, Duration::from_millis(20))
            .with_scenario_timeout(Duration::from_secs(2))
    }

    /// Returns every command received so far, as sent on the wire.
    pub fn received(&self) -> Vec<Value> {
        self.received.lock().clone()
    }
}

impl Drop for MockRuntime {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(
    stream: TcpStream,
    received: Arc<Mutex<Vec<Value>>>,
    responder: Arc<Mutex<Responder>>,
) {
    let callback = |_request: &Request, mut response: Response| -> Result<Response, ErrorResponse> {
        response
            .headers_mut()
            .insert(SEC_WEBSOCKET_PROTOCOL, HeaderValue::from_static("noflo"));
        Ok(response)
    };
    let Ok(mut ws) = tokio_tungstenite::accept_hdr_async(stream, callback).await else {
        return;
    };

    while let Some(Ok(frame)) = ws.next().await {
        let Message::Text(text) = frame else {
            continue;
        };
        let Ok(command) = serde_json::from_str::<Value>(text.as_str()) else {
            continue;
        };
        received.lock().push(command.clone());

        let replies = {
            let mut responder = responder.lock();
            (*responder)(&command)
        };
        for reply in replies {
            let text = match reply {
                Reply::Json(value) => value.to_string(),
                Reply::Raw(text) => text,
            };
            if ws.send(Message::Text(text.into())).await.is_err() {
                return;
            }
        }
    }
}

/// Returns `(protocol, command)` of a received command.
pub fn route(command: &Value) -> (&str, &str) {
    (
        command["protocol"].as_str().unwrap_or_default(),
        command["command"].as_str().unwrap_or_default(),
    )
}
