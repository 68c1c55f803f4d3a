//! Shared test doubles for connection tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use url::Url;

use duplex_connection::{
    Error, HttpClient, HttpResponse, Payload, Result, TransferFormat, Transport,
    TransportHandlers, TransportKind, TransportRegistry,
};

// ============================================================================
// Tracing
// ============================================================================

/// Installs a test subscriber honouring `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ============================================================================
// ScriptedHttpClient
// ============================================================================

/// Negotiation client answering every request with the same response.
pub struct ScriptedHttpClient {
    status: u16,
    body: String,
    calls: AtomicUsize,
    last_url: Mutex<Option<Url>>,
}

impl ScriptedHttpClient {
    pub fn new(status: u16, body: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            status,
            body: body.into(),
            calls: AtomicUsize::new(0),
            last_url: Mutex::new(None),
        })
    }

    /// Successful negotiation advertising `transports`.
    pub fn negotiating(connection_id: &str, transports: &[&str]) -> Arc<Self> {
        let body = serde_json::json!({
            "connectionId": connection_id,
            "availableTransports": transports,
        });
        Self::new(200, body.to_string())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_url(&self) -> Option<Url> {
        self.last_url.lock().clone()
    }
}

#[async_trait]
impl HttpClient for ScriptedHttpClient {
    async fn options(&self, url: &Url) -> Result<HttpResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_url.lock() = Some(url.clone());
        Ok(HttpResponse::new(self.status, self.body.clone()))
    }
}

// ============================================================================
// ScriptedTransport
// ============================================================================

/// Transport whose connect outcome and timing are controlled by the test.
pub struct ScriptedTransport {
    name: &'static str,
    handlers: Mutex<TransportHandlers>,
    grant: Mutex<Option<TransferFormat>>,
    gated: AtomicBool,
    fail: AtomicBool,
    close_on_connect: Mutex<Option<Option<Error>>>,
    gate: Notify,
    connect_started: Notify,
    connects: Mutex<Vec<(Url, TransferFormat)>>,
    sent: Mutex<Vec<Payload>>,
    stops: AtomicUsize,
}

impl ScriptedTransport {
    /// A transport that connects immediately and grants what is requested.
    pub fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            handlers: Mutex::new(TransportHandlers::default()),
            grant: Mutex::new(None),
            gated: AtomicBool::new(false),
            fail: AtomicBool::new(false),
            close_on_connect: Mutex::new(None),
            gate: Notify::new(),
            connect_started: Notify::new(),
            connects: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            stops: AtomicUsize::new(0),
        })
    }

    /// Makes `connect` wait for [`Self::release`].
    pub fn gated(self: Arc<Self>) -> Arc<Self> {
        self.gated.store(true, Ordering::SeqCst);
        self
    }

    /// Makes `connect` grant `format` regardless of the request.
    pub fn granting(self: Arc<Self>, format: TransferFormat) -> Arc<Self> {
        *self.grant.lock() = Some(format);
        self
    }

    /// Makes `connect` report a close with `error` before it succeeds.
    pub fn closing_during_connect(self: Arc<Self>, error: Option<Error>) -> Arc<Self> {
        *self.close_on_connect.lock() = Some(error);
        self
    }

    /// Lets a gated `connect` finish.
    pub fn release(&self) {
        self.gate.notify_one();
    }

    /// Lets a gated `connect` finish with a failure.
    pub fn release_with_failure(&self) {
        self.fail.store(true, Ordering::SeqCst);
        self.gate.notify_one();
    }

    /// Waits until `connect` has been called.
    pub async fn wait_connect_started(&self) {
        self.connect_started.notified().await;
    }

    /// Emits an inbound payload as the server would.
    pub fn emit(&self, payload: Payload) {
        let handlers = self.handlers.lock().clone();
        handlers.receive(payload);
    }

    /// Closes as if the remote end dropped the connection.
    pub fn close_remotely(&self, error: Option<Error>) {
        let handlers = self.handlers.lock().clone();
        handlers.close(error);
    }

    pub fn connects(&self) -> Vec<(Url, TransferFormat)> {
        self.connects.lock().clone()
    }

    pub fn sent(&self) -> Vec<Payload> {
        self.sent.lock().clone()
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn name(&self) -> &str {
        self.name
    }

    fn set_handlers(&self, handlers: TransportHandlers) {
        *self.handlers.lock() = handlers;
    }

    async fn connect(&self, url: &Url, requested: TransferFormat) -> Result<TransferFormat> {
        self.connects.lock().push((url.clone(), requested));
        self.connect_started.notify_one();

        if self.gated.load(Ordering::SeqCst) {
            self.gate.notified().await;
        }

        let close = self.close_on_connect.lock().take();
        if let Some(error) = close {
            self.close_remotely(error);
        }

        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Io(std::io::Error::other("connection refused")));
        }

        let granted = *self.grant.lock();
        Ok(granted.unwrap_or(requested))
    }

    async fn send(&self, payload: Payload) -> Result<()> {
        self.sent.lock().push(payload);
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        *self.handlers.lock() = TransportHandlers::default();
        Ok(())
    }
}

/// Registry serving the given scripted transports by kind.
pub fn registry(transports: &[(TransportKind, Arc<ScriptedTransport>)]) -> Arc<TransportRegistry> {
    let registry = transports
        .iter()
        .fold(TransportRegistry::new(), |registry, (kind, transport)| {
            let transport = Arc::clone(transport);
            registry.register(*kind, move || -> Arc<dyn Transport> { transport.clone() })
        });
    Arc::new(registry)
}
