//! In-memory transport for tests.
//!
//! # Why a mock transport?
//!
//! The real transport needs a running OBS instance.  `MockTransport` replaces
//! the socket with two in-memory queues:
//!
//! - every frame the client sends is recorded, both in a log you can inspect
//!   with [`MockTransport::sent`] and in a queue you can await with
//!   [`MockTransport::next_sent_json`];
//! - the test plays the server by pushing frames with
//!   [`MockTransport::inject_json`] and dropping the socket with
//!   [`MockTransport::simulate_disconnect`].
//!
//! Clones share state, so a test keeps one handle and gives the client
//! another.
//!
//! # Usage in tests
//!
//! ```ignore
//! let mock = MockTransport::new();
//! let client = ObsClient::new(ClientConfig::default(), Arc::new(mock.clone()));
//! client.connect().await?;
//!
//! mock.inject_json(&json!({ "op": 0, "d": { "rpcVersion": 1 } }));
//! let identify = mock.next_sent_json().await;
//! assert_eq!(identify["op"], 1);
//! ```
//!
//! # `fail_sends` flag
//!
//! [`MockTransport::set_fail_sends`] makes every `send` return
//! [`TransportError::SendFailed`], to exercise the paths where a frame never
//! reaches the wire.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::domain::TransportError;
use crate::infrastructure::transport::{Transport, TransportEvent};

#[derive(Default)]
struct MockState {
    events: Option<mpsc::UnboundedSender<TransportEvent>>,
    connected: bool,
    sent: Vec<String>,
    fail_sends: bool,
    connect_error: Option<TransportError>,
    closed_with: Option<(u16, String)>,
}

#[derive(Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
    outbound_tx: mpsc::UnboundedSender<String>,
    outbound_rx: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<String>>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
            outbound_tx,
            outbound_rx: Arc::new(tokio::sync::Mutex::new(outbound_rx)),
        }
    }

    // ── Inspecting what the client sent ──────────────────────────────────────

    /// Every frame sent so far, oldest first.
    pub fn sent(&self) -> Vec<String> {
        self.state.lock().sent.clone()
    }

    /// Waits for the next frame the client sends, parsed as JSON.
    ///
    /// Frames are handed out once each, in send order.  Returns
    /// [`Value::Null`] if the frame was not valid JSON.
    pub async fn next_sent_json(&self) -> Value {
        let text = self.outbound_rx.lock().await.recv().await;
        text.and_then(|t| serde_json::from_str(&t).ok())
            .unwrap_or(Value::Null)
    }

    /// The code and reason of the last `close` call, if any.
    pub fn closed_with(&self) -> Option<(u16, String)> {
        self.state.lock().closed_with.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    // ── Playing the server ───────────────────────────────────────────────────

    /// Delivers one raw text frame to the client.  Returns `false` if the
    /// transport was never started.
    pub fn inject(&self, text: impl Into<String>) -> bool {
        self.emit(TransportEvent::Message(text.into()))
    }

    pub fn inject_json(&self, frame: &Value) -> bool {
        self.inject(frame.to_string())
    }

    /// Drops the socket as the server would, with an optional close frame.
    pub fn simulate_disconnect(&self, code: Option<u16>, reason: Option<&str>) -> bool {
        self.state.lock().connected = false;
        self.emit(TransportEvent::Disconnected {
            code,
            reason: reason.map(str::to_string),
        })
    }

    /// Reports a successful automatic reconnect.
    pub fn simulate_reconnect(&self) -> bool {
        self.state.lock().connected = true;
        self.emit(TransportEvent::Connected)
    }

    pub fn set_fail_sends(&self, fail: bool) {
        self.state.lock().fail_sends = fail;
    }

    /// Makes the next `start` fail with `error`.
    pub fn fail_next_connect(&self, error: TransportError) {
        self.state.lock().connect_error = Some(error);
    }

    fn emit(&self, event: TransportEvent) -> bool {
        let events = self.state.lock().events.clone();
        events.is_some_and(|tx| tx.send(event).is_ok())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn start(&self, events: mpsc::UnboundedSender<TransportEvent>) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        if let Some(error) = state.connect_error.take() {
            return Err(error);
        }
        if state.connected {
            return Err(TransportError::AlreadyStarted);
        }
        state.connected = true;
        state.closed_with = None;
        let _ = events.send(TransportEvent::Connected);
        state.events = Some(events);
        Ok(())
    }

    async fn send(&self, text: String) -> Result<(), TransportError> {
        {
            let mut state = self.state.lock();
            if state.fail_sends {
                return Err(TransportError::SendFailed("mock send failure".into()));
            }
            if !state.connected {
                return Err(TransportError::NotConnected);
            }
            state.sent.push(text.clone());
        }
        let _ = self.outbound_tx.send(text);
        Ok(())
    }

    async fn close(&self, code: u16, reason: &str) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        state.connected = false;
        state.events = None;
        state.closed_with = Some((code, reason.to_string()));
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
