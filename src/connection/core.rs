//! Connection orchestrator.
//!
//! The [`Connection`] drives negotiation, transport selection and connect,
//! owns the single active transport, and reports inbound payloads and the
//! final close to the caller.
//!
//! # Start / Stop
//!
//! `start` stores its sequence as a shared future. `stop` marks the
//! connection disconnected first, then awaits that future (ignoring its
//! outcome) before tearing the transport down, so a transport is never
//! closed while it is still connecting. If the sequence finishes connecting
//! after a stop, the guarded `Connecting → Connected` transition fails and
//! the fresh transport is torn down. A transport that closes on its own while
//! still connecting fails `start` with its close error instead.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::{Arc, Weak};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::time::timeout;
use tracing::{Instrument, Span, debug, error, info, info_span, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::identifiers::ConnectionId;
use crate::protocol::{Payload, TransferFormat};
use crate::transport::{Transport, TransportHandlers, TransportKind, select_transport};

use super::builder::ConnectionBuilder;
use super::negotiator::Negotiator;
use super::options::ConnectionOptions;
use super::redirect::parse_redirect;
use super::state::ConnectionState;
use super::target::with_connection_id;

// ============================================================================
// Types
// ============================================================================

/// Caller callback for inbound payloads.
pub type ReceiveCallback = Arc<dyn Fn(Payload) + Send + Sync>;

/// Caller callback for the end of a connected lifetime.
pub type CloseCallback = Arc<dyn Fn(Option<Error>) + Send + Sync>;

/// Handle to the outstanding start sequence.
type StartHandle = Shared<BoxFuture<'static, StartOutcome>>;

/// How the start sequence settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StartOutcome {
    Connected,
    Failed,
}

// ============================================================================
// ConnectionShared
// ============================================================================

/// Mutable connection state. Never held across an await.
struct ConnectionShared {
    state: ConnectionState,
    /// Target url; gains the connection id after negotiation.
    url: Url,
    connection_id: Option<ConnectionId>,
    transport: Option<Arc<dyn Transport>>,
    transport_kind: Option<TransportKind>,
    transfer_format: TransferFormat,
    pending_start: Option<StartHandle>,
    /// Set once the connection has been `Connected`.
    was_connected: bool,
    /// Set once the caller's close callback has fired.
    close_raised: bool,
    /// Set by `stop`.
    stop_requested: bool,
    /// Close reported by the transport before `connect` returned.
    close_error: Option<Error>,
}

impl ConnectionShared {
    /// Moves to `next` along a legal edge.
    fn transition(&mut self, next: ConnectionState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {next}",
            self.state
        );
        self.state = next;
    }
}

/// Work left after detaching the transport.
struct Teardown {
    transport: Option<Arc<dyn Transport>>,
    notify: Option<(CloseCallback, Option<Error>)>,
}

// ============================================================================
// ConnectionInner
// ============================================================================

/// Internal shared state for the connection.
pub(crate) struct ConnectionInner {
    options: ConnectionOptions,
    http_client: Arc<dyn HttpClient>,
    shared: Mutex<ConnectionShared>,
    on_receive: Mutex<Option<ReceiveCallback>>,
    on_close: Mutex<Option<CloseCallback>>,
    span: Span,
}

// ============================================================================
// Connection
// ============================================================================

/// A single logical connection to a server endpoint.
///
/// Cloning yields another handle to the same connection. A connection is
/// started at most once; create a new one to reconnect.
///
/// # Example
///
/// ```no_run
/// use duplex_connection::{Connection, Payload, Result};
///
/// # async fn example() -> Result<()> {
/// let connection = Connection::builder("http://localhost:5000/chat").build()?;
///
/// connection.on_receive(|payload| println!("received {payload:?}"));
/// connection.on_close(|error| println!("closed: {error:?}"));
///
/// connection.start().await?;
/// connection.send(Payload::text("hello")).await?;
/// connection.stop().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Connection {
    pub(crate) inner: Arc<ConnectionInner>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shared = self.inner.shared.lock();
        f.debug_struct("Connection")
            .field("state", &shared.state)
            .field("url", &shared.url.as_str())
            .field("connection_id", &shared.connection_id)
            .field("transport", &shared.transport_kind)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Connection - Constructor
// ============================================================================

impl Connection {
    /// Creates a configuration builder for a connection to `url`.
    #[inline]
    #[must_use]
    pub fn builder(url: impl Into<String>) -> ConnectionBuilder {
        ConnectionBuilder::new(url)
    }

    /// Creates a connection from a resolved url and validated options.
    pub(crate) fn new(
        url: Url,
        options: ConnectionOptions,
        http_client: Arc<dyn HttpClient>,
    ) -> Self {
        let span = info_span!(
            "connection",
            url = %url,
            connection_id = tracing::field::Empty
        );

        let shared = ConnectionShared {
            state: ConnectionState::Initial,
            url,
            connection_id: None,
            transport: None,
            transport_kind: None,
            transfer_format: options.transfer_format,
            pending_start: None,
            was_connected: false,
            close_raised: false,
            stop_requested: false,
            close_error: None,
        };

        Self {
            inner: Arc::new(ConnectionInner {
                options,
                http_client,
                shared: Mutex::new(shared),
                on_receive: Mutex::new(None),
                on_close: Mutex::new(None),
                span,
            }),
        }
    }
}

// ============================================================================
// Connection - Public API
// ============================================================================

impl Connection {
    /// Negotiates, selects a transport and connects it.
    ///
    /// The sequence runs on its own task; dropping the returned future does
    /// not abandon it, and the connection still settles in `Connected` or
    /// `Disconnected`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidState`] if the connection was already started or stopped
    /// - [`Error::Unauthorized`] / [`Error::Forbidden`] if negotiation was rejected or the transport closed with a redirect
    /// - [`Error::Negotiation`] if negotiation failed otherwise
    /// - [`Error::NoAvailableTransport`] if no transport could be selected
    /// - [`Error::TransportConnect`] if the transport failed to connect or closed while connecting
    /// - [`Error::ConnectionStopped`] if `stop` was called before connecting finished
    pub async fn start(&self) -> Result<()> {
        let (result_tx, result_rx) = oneshot::channel();

        let handle = {
            let mut shared = self.inner.shared.lock();
            if shared.state != ConnectionState::Initial {
                return Err(Error::invalid_state("start", shared.state));
            }
            shared.transition(ConnectionState::Connecting);

            let weak = Arc::downgrade(&self.inner);
            let handle = Self::start_sequence(weak, result_tx)
                .instrument(self.inner.span.clone())
                .boxed()
                .shared();
            shared.pending_start = Some(handle.clone());
            handle
        };

        tokio::spawn(handle);
        result_rx.await?
    }

    /// Sends a payload over the active transport.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidState`] if the connection is not connected
    /// - Any error the transport reports for the send
    pub async fn send(&self, payload: Payload) -> Result<()> {
        let transport = {
            let shared = self.inner.shared.lock();
            match &shared.transport {
                Some(transport) if shared.state.is_connected() => Arc::clone(transport),
                _ => return Err(Error::invalid_state("send", shared.state)),
            }
        };

        transport.send(payload).await
    }

    /// Stops the connection.
    ///
    /// Safe to call in any state and more than once. Waits for an outstanding
    /// `start` to settle; its failure is not reported here.
    pub async fn stop(&self) {
        let inner = Arc::clone(&self.inner);
        let span = inner.span.clone();

        async move {
            let (was_connected, pending_start) = {
                let mut shared = inner.shared.lock();
                let was_connected = shared.state.is_connected();
                shared.stop_requested = true;
                shared.transition(ConnectionState::Disconnected);
                (was_connected, shared.pending_start.clone())
            };

            if let Some(pending_start) = pending_start {
                let outcome = pending_start.await;
                debug!(?outcome, "Pending start settled");
            }

            inner.stop_connection(was_connected, None).await;
        }
        .instrument(span)
        .await;
    }

    /// Sets the callback for inbound payloads, replacing any previous one.
    pub fn on_receive(&self, callback: impl Fn(Payload) + Send + Sync + 'static) {
        *self.inner.on_receive.lock() = Some(Arc::new(callback));
    }

    /// Sets the callback for the end of a connected lifetime.
    ///
    /// Fires at most once, and only if the connection reached `Connected`.
    /// A failed `start` is reported through its result instead.
    pub fn on_close(&self, callback: impl Fn(Option<Error>) + Send + Sync + 'static) {
        *self.inner.on_close.lock() = Some(Arc::new(callback));
    }

    /// Returns the current state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.inner.shared.lock().state
    }

    /// Returns the negotiated connection id.
    #[inline]
    #[must_use]
    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.inner.shared.lock().connection_id.clone()
    }

    /// Returns the target url, including the connection id once negotiated.
    #[inline]
    #[must_use]
    pub fn url(&self) -> Url {
        self.inner.shared.lock().url.clone()
    }

    /// Returns the transfer format, as granted once connected.
    #[inline]
    #[must_use]
    pub fn transfer_format(&self) -> TransferFormat {
        self.inner.shared.lock().transfer_format
    }

    /// Returns the kind of the selected transport (`None` for custom transports).
    #[inline]
    #[must_use]
    pub fn transport_kind(&self) -> Option<TransportKind> {
        self.inner.shared.lock().transport_kind
    }

    /// Returns the options this connection was built with.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &ConnectionOptions {
        &self.inner.options
    }
}

// ============================================================================
// Connection - Start Sequence
// ============================================================================

impl Connection {
    /// Runs the start sequence and reports its result to `start`.
    async fn start_sequence(
        weak: Weak<ConnectionInner>,
        result_tx: oneshot::Sender<Result<()>>,
    ) -> StartOutcome {
        let Some(inner) = weak.upgrade() else {
            let _ = result_tx.send(Err(Error::ConnectionStopped));
            return StartOutcome::Failed;
        };

        let result = match inner.establish().await {
            Ok(()) => {
                info!(transport = ?inner.shared.lock().transport_kind, "Connection started");
                Ok(())
            }
            Err(err) => {
                error!(error = %err, "Failed to start connection");
                inner.stop_connection(false, None).await;
                Err(err)
            }
        };

        let outcome = if result.is_ok() {
            StartOutcome::Connected
        } else {
            StartOutcome::Failed
        };
        let _ = result_tx.send(result);
        outcome
    }
}

impl ConnectionInner {
    /// Negotiates, selects and connects a transport.
    async fn establish(self: &Arc<Self>) -> Result<()> {
        let base_url = self.shared.lock().url.clone();

        let available = if self.options.skip_negotiation {
            debug!("Skipping negotiation");
            vec![TransportKind::WebSockets]
        } else {
            let negotiated = match self.negotiator().negotiate(&base_url).await {
                Ok(negotiated) => negotiated,
                Err(err) => {
                    if let Error::Unauthorized { message } | Error::Forbidden { message } = &err {
                        (self.options.on_unauthorized)(message);
                    }
                    return Err(err);
                }
            };

            let connection_id = negotiated.connection_id.clone();
            self.span.record("connection_id", connection_id.as_str());

            {
                let mut shared = self.shared.lock();
                shared.url = with_connection_id(&base_url, &connection_id);
                shared.connection_id = Some(connection_id);
            }

            negotiated.transports()
        };

        let selected = select_transport(
            self.options.transport.as_ref(),
            &available,
            self.options.transport_factory.as_ref(),
        )?;
        let name = selected.name();

        selected.transport.set_handlers(self.transport_handlers());

        let (connect_url, requested) = {
            let mut shared = self.shared.lock();
            if shared.state != ConnectionState::Connecting {
                return Err(Self::interrupted(&mut shared, &name));
            }
            shared.transport = Some(Arc::clone(&selected.transport));
            shared.transport_kind = selected.kind;
            (shared.url.clone(), shared.transfer_format)
        };

        debug!(transport = %name, url = %connect_url, format = %requested, "Connecting transport");

        let connect_timeout = self.options.connect_timeout;
        let granted = timeout(
            connect_timeout,
            selected.transport.connect(&connect_url, requested),
        )
        .await
        .map_err(|_| {
            Error::transport_connect(
                &name,
                format!("timed out after {}ms", connect_timeout.as_millis()),
            )
        })?
        .map_err(|err| match err {
            Error::TransportConnect { .. } => err,
            err => Error::transport_connect(&name, err.to_string()),
        })?;

        let mut shared = self.shared.lock();
        if shared.state != ConnectionState::Connecting {
            return Err(Self::interrupted(&mut shared, &name));
        }
        shared.transition(ConnectionState::Connected);
        shared.transfer_format = granted;
        shared.was_connected = true;

        Ok(())
    }

    /// Explains why a connect left the connection no longer `Connecting`.
    ///
    /// A close the transport reported wins over a concurrent `stop`.
    fn interrupted(shared: &mut ConnectionShared, transport: &str) -> Error {
        match shared.close_error.take() {
            Some(err) if err.is_redirect() => err,
            Some(err) => Error::transport_connect(transport, err.to_string()),
            None if shared.stop_requested => Error::ConnectionStopped,
            None => Error::transport_connect(transport, "transport closed while connecting"),
        }
    }

    /// Creates the negotiator for this connection.
    fn negotiator(&self) -> Negotiator {
        Negotiator::new(Arc::clone(&self.http_client), self.options.connect_timeout)
    }

    /// Wires transport callbacks back to this connection.
    fn transport_handlers(self: &Arc<Self>) -> TransportHandlers {
        let receive_ref = Arc::downgrade(self);
        let close_ref = Arc::downgrade(self);

        TransportHandlers::new(
            move |payload| {
                if let Some(inner) = receive_ref.upgrade() {
                    inner.dispatch_receive(payload);
                }
            },
            move |error| {
                if let Some(inner) = close_ref.upgrade() {
                    inner.transport_closed(error);
                }
            },
        )
    }
}

// ============================================================================
// Connection - Callbacks
// ============================================================================

impl ConnectionInner {
    /// Forwards an inbound payload to the caller.
    fn dispatch_receive(&self, payload: Payload) {
        let callback = self.on_receive.lock().clone();
        match callback {
            Some(callback) => callback(payload),
            None => debug!(len = payload.len(), "Dropping payload, no receive callback"),
        }
    }

    /// Handles a close the transport initiated.
    fn transport_closed(self: &Arc<Self>, error: Option<Error>) {
        let _entered = self.span.enter();

        let teardown = self.detach(true, error);

        // The transport already closed itself; stopping it is best effort.
        if let Some(transport) = teardown.transport {
            match tokio::runtime::Handle::try_current() {
                Ok(runtime) => {
                    runtime.spawn(async move {
                        if let Err(e) = transport.stop().await {
                            debug!(error = %e, "Stopping closed transport failed");
                        }
                    });
                }
                Err(_) => debug!("No runtime to stop closed transport"),
            }
        }

        if let Some((callback, error)) = teardown.notify {
            callback(error);
        }
    }
}

// ============================================================================
// Connection - Teardown
// ============================================================================

impl ConnectionInner {
    /// Stops the active transport and notifies the caller if needed.
    async fn stop_connection(&self, raise_closed: bool, error: Option<Error>) {
        let teardown = self.detach(raise_closed, error);

        if let Some(transport) = teardown.transport
            && let Err(e) = transport.stop().await
        {
            warn!(error = %e, "Failed to stop transport");
        }

        if let Some((callback, error)) = teardown.notify {
            callback(error);
        }
    }

    /// Moves to `Disconnected`, takes the transport and decides on notification.
    fn detach(&self, raise_closed: bool, error: Option<Error>) -> Teardown {
        let mut error = error.map(|err| self.apply_redirect(err));

        match &error {
            Some(err) => error!(error = %err, "Connection disconnected with an error"),
            None => info!("Connection disconnected"),
        }

        let (transport, raise) = {
            let mut shared = self.shared.lock();
            if shared.state == ConnectionState::Connecting {
                // Reported by the start sequence once `connect` returns.
                shared.close_error = error.take();
            }
            shared.transition(ConnectionState::Disconnected);
            let transport = shared.transport.take();
            let raise = raise_closed && shared.was_connected && !shared.close_raised;
            if raise {
                shared.close_raised = true;
            }
            (transport, raise)
        };

        let notify = if raise {
            self.on_close
                .lock()
                .clone()
                .map(|callback| (callback, error))
        } else {
            None
        };

        Teardown { transport, notify }
    }

    /// Forwards a redirect-coded close reason to the redirect callback.
    fn apply_redirect(&self, error: Error) -> Error {
        let Some(redirect) = error.close_reason().and_then(parse_redirect) else {
            return error;
        };

        debug!(location = redirect.location(), "Close reason carries a redirect");
        (self.options.on_unauthorized)(redirect.location());
        redirect.into_error()
    }
}

// ============================================================================
// Tests
// ============================================================================
