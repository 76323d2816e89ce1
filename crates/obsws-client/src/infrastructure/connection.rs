//! The connection manager: [`ObsClient`].
//!
//! # How the pieces fit (for beginners)
//!
//! ```text
//!  Transport ──TransportEvent──▶ reader task ──route()──▶ Handshake
//!      ▲                                              ├──▶ RequestCorrelator ──▶ waiting callers
//!      │                                              ├──▶ BatchCoordinator  ──▶ waiting callers
//!      │                                              ├──▶ EventDispatcher   ──▶ subscriptions
//!      │                                              └──▶ unknown frames    ──▶ broadcast
//!      └───────────── send_request / send_batch (any task) ◀── caller
//! ```
//!
//! One reader task consumes transport events in order.  It never waits on a
//! caller: responses go through `oneshot` channels and events through
//! unbounded channels.  Callers run on their own tasks.  They register a
//! waiter, send their frame, and suspend on the waiter until the response,
//! their deadline, or a disconnect resolves it.
//!
//! On every disconnect all waiters fail with [`ClientError::Disconnected`],
//! the handshake starts over, and [`DisconnectInfo`] is broadcast.  When the
//! transport reconnects, the server sends a fresh Hello and the full
//! handshake runs again.

use std::sync::{Arc, Weak};
use std::time::Duration;

use obsws_core::{encode_frame, CloseCode, EventSubscription, OpCode, OutboundFrame, Request, RequestSpec};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use crate::application::batch::{self, BatchOptions, BatchResult, PreparedBatch};
use crate::application::correlator::RequestCorrelator;
use crate::application::dispatcher::{EventDispatcher, Subscription, SubscriptionId};
use crate::application::handshake::Handshake;
use crate::application::router::{route, Routed};
use crate::application::BatchCoordinator;
use crate::domain::{
    ClientConfig, ClientError, ConnectionState, DisconnectInfo, TransportError, UnknownFrame,
};
use crate::infrastructure::transport::{Transport, TransportEvent};
use crate::infrastructure::ws_transport::WsTransport;

/// WebSocket "normal closure", sent when the caller disconnects.
const NORMAL_CLOSURE: u16 = 1000;

/// Capacity of the disconnect and unknown-frame broadcast channels.
const BROADCAST_CAPACITY: usize = 64;

/// Handle to one OBS WebSocket session.
///
/// Cheap to clone; clones share the same connection.
#[derive(Clone)]
pub struct ObsClient {
    inner: Arc<Inner>,
}

struct Inner {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    handshake: Mutex<Handshake>,
    requests: RequestCorrelator,
    batches: BatchCoordinator,
    dispatcher: EventDispatcher,
    state_tx: watch::Sender<ConnectionState>,
    /// Set when the server rejected the last handshake; cleared on reconnect.
    handshake_failure_tx: watch::Sender<Option<ClientError>>,
    disconnect_tx: broadcast::Sender<DisconnectInfo>,
    unknown_tx: broadcast::Sender<UnknownFrame>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl ObsClient {
    pub fn new(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let handshake = Handshake::new(
            config.password.clone(),
            config.rpc_version,
            config.event_subscriptions,
        );
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        let (handshake_failure_tx, _) = watch::channel(None);
        let (disconnect_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        let (unknown_tx, _) = broadcast::channel(BROADCAST_CAPACITY);

        Self {
            inner: Arc::new(Inner {
                config,
                transport,
                handshake: Mutex::new(handshake),
                requests: RequestCorrelator::new(),
                batches: BatchCoordinator::new(),
                dispatcher: EventDispatcher::new(),
                state_tx,
                handshake_failure_tx,
                disconnect_tx,
                unknown_tx,
                reader: Mutex::new(None),
            }),
        }
    }

    /// Builds a client that talks to `config.url` over a reconnecting
    /// WebSocket.
    pub fn with_websocket(config: ClientConfig) -> Self {
        let transport = Arc::new(WsTransport::from_config(&config));
        Self::new(config, transport)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    // ── Lifecycle ────────────────────────────────────────────────────────────

    /// Opens the transport and starts the reader task.
    ///
    /// Returns once the socket is open; the handshake continues in the
    /// background.  Use [`ObsClient::connect_and_identify`] to wait for it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if the first connection attempt
    /// fails or the client is already connected.
    pub async fn connect(&self) -> Result<(), ClientError> {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let reader = tokio::spawn(run_reader(Arc::downgrade(&self.inner), events_rx));

        if let Err(e) = self.inner.transport.start(events_tx).await {
            reader.abort();
            warn!(url = %self.inner.config.url, error = %e, "connect failed");
            return Err(e.into());
        }

        let previous = self.inner.reader.lock().replace(reader);
        if let Some(old) = previous {
            old.abort();
        }
        Ok(())
    }

    /// Connects and waits until the session is identified, using the request
    /// timeout as the deadline.
    pub async fn connect_and_identify(&self) -> Result<(), ClientError> {
        self.connect().await?;
        self.wait_until_identified(self.inner.config.request_timeout)
            .await
    }

    /// Waits until the handshake completes.
    ///
    /// # Errors
    ///
    /// - [`ClientError::HandshakeFailed`] if the server closed the socket with
    ///   a handshake rejection (bad password, unsupported RPC version).
    /// - [`ClientError::NotIdentified`] if `timeout` elapses first.
    pub async fn wait_until_identified(&self, timeout: Duration) -> Result<(), ClientError> {
        let mut state_rx = self.inner.state_tx.subscribe();
        let mut failure_rx = self.inner.handshake_failure_tx.subscribe();

        let wait = async {
            loop {
                if *state_rx.borrow_and_update() == ConnectionState::Identified {
                    return Ok(());
                }
                let failure = failure_rx.borrow_and_update().clone();
                if let Some(err) = failure {
                    return Err(err);
                }
                tokio::select! {
                    changed = state_rx.changed() => changed.map_err(|_| ClientError::Disconnected)?,
                    changed = failure_rx.changed() => changed.map_err(|_| ClientError::Disconnected)?,
                }
            }
        };

        match tokio::time::timeout(timeout, wait).await {
            Ok(result) => result,
            Err(_elapsed) => {
                warn!(?timeout, "not identified before the deadline");
                Err(ClientError::NotIdentified)
            }
        }
    }

    /// Closes the socket and fails everything still in flight.
    pub async fn disconnect(&self) -> Result<(), ClientError> {
        let closed = self
            .inner
            .transport
            .close(NORMAL_CLOSURE, "client disconnect")
            .await;

        let reader = self.inner.reader.lock().take();
        if let Some(handle) = reader {
            handle.abort();
        }
        self.inner.on_disconnect(DisconnectInfo {
            code: CloseCode::from_code(NORMAL_CLOSURE),
            comment: Some("closed by client".into()),
        });
        closed.map_err(ClientError::from)
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state_tx.borrow()
    }

    /// A receiver that observes every state transition.
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state_tx.subscribe()
    }

    pub fn is_identified(&self) -> bool {
        self.state() == ConnectionState::Identified
    }

    pub fn negotiated_rpc_version(&self) -> Option<u32> {
        self.inner.handshake.lock().negotiated_rpc_version()
    }

    pub fn disconnections(&self) -> broadcast::Receiver<DisconnectInfo> {
        self.inner.disconnect_tx.subscribe()
    }

    /// Frames with opcodes this client does not handle.
    pub fn unknown_frames(&self) -> broadcast::Receiver<UnknownFrame> {
        self.inner.unknown_tx.subscribe()
    }

    // ── Requests ─────────────────────────────────────────────────────────────

    /// Sends one request and waits for its typed result, using the configured
    /// request timeout.
    pub async fn send_request<T>(&self, request: Request<T>) -> Result<T, ClientError> {
        self.send_request_with_timeout(request, self.inner.config.request_timeout)
            .await
    }

    /// Sends one request and waits at most `timeout` for its result.
    ///
    /// # Errors
    ///
    /// - [`ClientError::NotIdentified`] before the handshake completes.
    /// - [`ClientError::RequestFailed`] if the server rejected the request.
    /// - [`ClientError::RequestTimedOut`] if no response came in time.
    /// - [`ClientError::MalformedPayload`] if the response lacked a field the
    ///   request's parser needs.
    /// - [`ClientError::Disconnected`] if the socket dropped first.
    pub async fn send_request_with_timeout<T>(
        &self,
        request: Request<T>,
        timeout: Duration,
    ) -> Result<T, ClientError> {
        self.ensure_identified()?;
        let (spec, parser) = request.into_parts();
        let id = spec.request_id.clone();

        let rx = self.inner.requests.register(&id)?;
        if let Err(e) = self.inner.send_frame(&OutboundFrame::Request(spec)).await {
            self.inner.requests.cancel(&id);
            return Err(e);
        }

        let data = self.inner.requests.wait(&id, rx, timeout).await?;
        parser(data).map_err(ClientError::from)
    }

    /// Sends a request without waiting for its response.  Returns its id.
    ///
    /// The response, if any, is swallowed quietly for up to the request
    /// timeout.
    pub async fn send_request_without_waiting<T>(
        &self,
        request: Request<T>,
    ) -> Result<String, ClientError> {
        self.ensure_identified()?;
        let (spec, _parser) = request.into_parts();
        let id = spec.request_id.clone();

        self.inner
            .requests
            .register_discard(&id, self.inner.config.request_timeout)?;
        if let Err(e) = self.inner.send_frame(&OutboundFrame::Request(spec)).await {
            self.inner.requests.cancel(&id);
            return Err(e);
        }
        Ok(id)
    }

    /// Sends any request type by name and returns its raw `responseData`.
    pub async fn send_raw_request(
        &self,
        request_type: &str,
        request_data: Option<Value>,
        timeout: Option<Duration>,
    ) -> Result<Option<Value>, ClientError> {
        let request = Request::raw(RequestSpec::new(request_type, request_data));
        let timeout = timeout.unwrap_or(self.inner.config.request_timeout);
        self.send_request_with_timeout(request, timeout).await
    }

    // ── Batches ──────────────────────────────────────────────────────────────

    /// Sends `requests` as one batch and waits for the joined results.
    ///
    /// The deadline is the base timeout plus any sleep the batch declares.
    /// Results are returned in the order of `requests`; sub-requests the
    /// server did not execute are listed in
    /// [`BatchResult::not_executed`].
    pub async fn send_batch(
        &self,
        requests: Vec<RequestSpec>,
        options: BatchOptions,
    ) -> Result<BatchResult, ClientError> {
        self.ensure_identified()?;
        let PreparedBatch { payload, deadline } =
            batch::prepare(requests, &options, self.inner.config.batch_timeout)?;
        let id = payload.request_id.clone();
        let specs = payload.requests.clone();
        debug!(id = %id, count = specs.len(), ?deadline, "sending batch");

        let rx = self.inner.batches.register(&id)?;
        if let Err(e) = self
            .inner
            .send_frame(&OutboundFrame::RequestBatch(payload))
            .await
        {
            self.inner.batches.cancel(&id);
            return Err(e);
        }

        let results = self.inner.batches.wait(&id, rx, deadline).await?;
        Ok(batch::join_results(specs, results))
    }

    /// Sends a batch without waiting for its results.  Returns the batch id.
    pub async fn send_batch_without_waiting(
        &self,
        requests: Vec<RequestSpec>,
        options: BatchOptions,
    ) -> Result<String, ClientError> {
        self.ensure_identified()?;
        let PreparedBatch { payload, deadline } =
            batch::prepare(requests, &options, self.inner.config.batch_timeout)?;
        let id = payload.request_id.clone();

        self.inner.batches.register_discard(&id, deadline)?;
        if let Err(e) = self
            .inner
            .send_frame(&OutboundFrame::RequestBatch(payload))
            .await
        {
            self.inner.batches.cancel(&id);
            return Err(e);
        }
        Ok(id)
    }

    /// Runs one request per key as a single batch and joins the typed results
    /// back to the keys.
    ///
    /// `result_mapper` sees each key with its parsed result (or the error for
    /// that item) and returns `None` to drop the key.  Keys whose sub-request
    /// produced no result are skipped.  The output keeps input order.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let muted = client
    ///     .select_results(
    ///         ["Mic", "Desktop Audio"],
    ///         |name| inputs::get_input_mute(*name),
    ///         |_, result| result.ok(),
    ///         BatchOptions::default(),
    ///     )
    ///     .await?;
    /// ```
    pub async fn select_results<K, T, V, I, RM, VM>(
        &self,
        inputs: I,
        request_mapper: RM,
        result_mapper: VM,
        options: BatchOptions,
    ) -> Result<Vec<(K, V)>, ClientError>
    where
        I: IntoIterator<Item = K>,
        RM: Fn(&K) -> Request<T>,
        VM: Fn(&K, Result<T, ClientError>) -> Option<V>,
    {
        let keyed: Vec<(K, Request<T>)> = inputs
            .into_iter()
            .map(|key| {
                let request = request_mapper(&key);
                (key, request)
            })
            .collect();
        let specs = keyed.iter().map(|(_, request)| request.spec().clone()).collect();

        let result = self.send_batch(specs, options).await?;

        Ok(keyed
            .into_iter()
            .filter_map(|(key, request)| {
                let item = result.get(request.id())?;
                let parsed = item.parse(&request);
                result_mapper(&key, parsed).map(|value| (key, value))
            })
            .collect())
    }

    pub fn pending_requests(&self) -> usize {
        self.inner.requests.pending_count()
    }

    pub fn pending_batches(&self) -> usize {
        self.inner.batches.pending_count()
    }

    pub fn is_request_pending(&self, id: &str) -> bool {
        self.inner.requests.is_pending(id)
    }

    // ── Events ───────────────────────────────────────────────────────────────

    /// Subscribes to one event type, including derived edges such as
    /// `StreamStarted`.
    pub fn subscribe(&self, event_type: &str) -> Subscription {
        self.inner.dispatcher.subscribe(event_type)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.dispatcher.unsubscribe(id)
    }

    /// Subscribes to events whose type this client does not recognise.
    pub fn subscribe_unknown_events(&self) -> Subscription {
        self.inner.dispatcher.subscribe_unknown()
    }

    /// Replaces the event subscription mask.
    ///
    /// A live session is updated in place with Reidentify; otherwise the mask
    /// is used by the next Identify.
    pub async fn reidentify(&self, mask: EventSubscription) -> Result<(), ClientError> {
        let payload = self.inner.handshake.lock().reidentify(mask);
        match payload {
            Some(payload) => {
                info!(%mask, "reidentifying");
                self.inner
                    .send_frame(&OutboundFrame::Reidentify(payload))
                    .await
            }
            None => Ok(()),
        }
    }

    pub fn event_subscriptions(&self) -> EventSubscription {
        self.inner.handshake.lock().event_subscriptions()
    }

    fn ensure_identified(&self) -> Result<(), ClientError> {
        if self.is_identified() {
            Ok(())
        } else {
            Err(ClientError::NotIdentified)
        }
    }
}

// ── Reader task ───────────────────────────────────────────────────────────────

/// Consumes transport events until the transport or the client goes away.
async fn run_reader(inner: Weak<Inner>, mut events: mpsc::UnboundedReceiver<TransportEvent>) {
    while let Some(event) = events.recv().await {
        let Some(client) = inner.upgrade() else {
            break;
        };
        client.handle_transport_event(event).await;
    }
    debug!("reader task finished");
}

impl Inner {
    /// A socket that is already gone reports [`ClientError::Disconnected`],
    /// the same as a drop while the call was waiting.
    async fn send_frame(&self, frame: &OutboundFrame) -> Result<(), ClientError> {
        let text = encode_frame(frame)?;
        match self.transport.send(text).await {
            Ok(()) => Ok(()),
            Err(TransportError::NotConnected) => Err(ClientError::Disconnected),
            Err(e) => Err(e.into()),
        }
    }

    async fn handle_transport_event(&self, event: TransportEvent) {
        match event {
            TransportEvent::Connected => {
                self.handshake.lock().reset();
                self.handshake_failure_tx.send_replace(None);
                self.state_tx.send_replace(ConnectionState::Connected);
                info!(url = %self.config.url, "socket open; awaiting Hello");
            }
            TransportEvent::Message(text) => self.handle_frame(&text).await,
            TransportEvent::Disconnected { code, reason } => {
                self.on_disconnect(DisconnectInfo::from_close(code, reason));
            }
        }
    }

    async fn handle_frame(&self, text: &str) {
        match route(text) {
            Routed::Hello(hello) => {
                let identify = self.handshake.lock().on_hello(&hello);
                match self.send_frame(&OutboundFrame::Identify(identify)).await {
                    Ok(()) => info!("Identify sent"),
                    Err(e) => warn!(error = %e, "failed to send Identify"),
                }
            }
            Routed::Identified(identified) => {
                let ready = self.handshake.lock().on_identified(&identified);
                if ready {
                    self.state_tx.send_replace(ConnectionState::Identified);
                }
            }
            Routed::Event(event) => {
                let mask = self.handshake.lock().event_subscriptions();
                let report = self.dispatcher.dispatch(event, mask);
                trace!(
                    delivered = report.delivered,
                    unknown = report.unknown,
                    derived = ?report.derived,
                    "event dispatched"
                );
            }
            Routed::Response(response) => {
                self.requests.handle_response(response);
                self.sweep_discarded();
            }
            Routed::BatchResponse(response) => {
                self.batches.handle_response(response);
                self.sweep_discarded();
            }
            Routed::Unknown(frame) => {
                // No receivers is fine; the frame is simply dropped.
                let _ = self.unknown_tx.send(frame);
            }
            Routed::Malformed {
                op,
                request_id,
                reason,
            } => self.on_malformed(op, request_id, reason),
            Routed::Invalid(_) => {}
        }
    }

    /// Drops fire-and-forget entries whose response never came.
    fn sweep_discarded(&self) {
        let swept = self.requests.sweep_expired() + self.batches.sweep_expired();
        if swept > 0 {
            debug!(swept, "expired fire-and-forget entries removed");
        }
    }

    /// Fails only the call the malformed frame belongs to.
    fn on_malformed(&self, op: i64, request_id: Option<String>, reason: String) {
        match (OpCode::try_from(op), request_id) {
            (Ok(OpCode::RequestResponse), Some(id)) => {
                self.requests.fail_malformed(&id, reason);
            }
            (Ok(OpCode::RequestBatchResponse), Some(id)) => {
                self.batches.fail_malformed(&id, reason);
            }
            (Ok(OpCode::Hello | OpCode::Identified), _) => {
                error!(op, %reason, "handshake frame malformed");
                self.handshake_failure_tx
                    .send_replace(Some(ClientError::HandshakeFailed {
                        code: CloseCode::MissingDataField,
                        comment: Some(reason),
                    }));
            }
            (_, id) => debug!(op, request_id = ?id, "malformed frame has no owner"),
        }
    }

    fn on_disconnect(&self, info: DisconnectInfo) {
        let previous = self.state_tx.send_replace(ConnectionState::Disconnected);
        self.handshake.lock().reset();
        self.dispatcher.reset_edges();
        let requests = self.requests.fail_all(|| ClientError::Disconnected);
        let batches = self.batches.fail_all(|| ClientError::Disconnected);

        if previous == ConnectionState::Disconnected {
            debug!("disconnect while already disconnected");
            return;
        }

        if previous == ConnectionState::Connected && info.code.is_handshake_rejection() {
            error!(code = %info.code, comment = ?info.comment, "server rejected the handshake");
            self.handshake_failure_tx
                .send_replace(Some(ClientError::HandshakeFailed {
                    code: info.code,
                    comment: info.comment.clone(),
                }));
        }

        warn!(
            code = %info.code,
            comment = ?info.comment,
            failed_requests = requests,
            failed_batches = batches,
            "disconnected"
        );
        let _ = self.disconnect_tx.send(info);
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(handle) = self.reader.get_mut().take() {
            handle.abort();
        }
    }
}
