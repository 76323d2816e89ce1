//! WebSocket transport built on `tokio-tungstenite`.
//!
//! # Lifecycle (for beginners)
//!
//! [`WsTransport::start`] performs the first connection itself so a bad URL
//! or a server that is not running is reported to the caller right away.
//! After that a background task owns the read half of the socket:
//!
//! 1. Text frames are forwarded as [`TransportEvent::Message`].
//! 2. When the socket closes, [`TransportEvent::Disconnected`] is sent with
//!    the close frame's code and reason.
//! 3. The task sleeps for `reconnect_interval` and dials again, repeating
//!    until a connection succeeds or [`WsTransport::close`] is called.
//!
//! The write half lives behind an async mutex so any caller can send while
//! the background task reads.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode as WsCloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::domain::{ClientConfig, TransportError};
use crate::infrastructure::transport::{Transport, TransportEvent};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, WsMessage>;
type WsSource = SplitStream<WsStream>;

pub struct WsTransport {
    url: String,
    reconnect_interval: Duration,
    sink: Arc<Mutex<Option<WsSink>>>,
    running: Arc<AtomicBool>,
    task: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl WsTransport {
    pub fn new(url: impl Into<String>, reconnect_interval: Duration) -> Self {
        Self {
            url: url.into(),
            reconnect_interval,
            sink: Arc::new(Mutex::new(None)),
            running: Arc::new(AtomicBool::new(false)),
            task: parking_lot::Mutex::new(None),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.url.clone(), config.reconnect_interval)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn is_task_running(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn start(&self, events: mpsc::UnboundedSender<TransportEvent>) -> Result<(), TransportError> {
        if self.is_task_running() {
            return Err(TransportError::AlreadyStarted);
        }

        let stream = dial(&self.url).await?;
        info!(url = %self.url, "connected");
        let (sink, source) = stream.split();
        *self.sink.lock().await = Some(sink);
        self.running.store(true, Ordering::SeqCst);
        // The receiver only goes away with the connection; the task notices
        // on its next send.
        let _ = events.send(TransportEvent::Connected);

        let handle = tokio::spawn(run_socket(
            self.url.clone(),
            self.reconnect_interval,
            Arc::clone(&self.sink),
            Arc::clone(&self.running),
            source,
            events,
        ));
        let previous = self.task.lock().replace(handle);
        if let Some(old) = previous {
            old.abort();
        }
        Ok(())
    }

    async fn send(&self, text: String) -> Result<(), TransportError> {
        let mut guard = self.sink.lock().await;
        let sink = guard.as_mut().ok_or(TransportError::NotConnected)?;
        sink.send(WsMessage::Text(text))
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    async fn close(&self, code: u16, reason: &str) -> Result<(), TransportError> {
        self.running.store(false, Ordering::SeqCst);
        let task = self.task.lock().take();
        if let Some(handle) = task {
            handle.abort();
        }

        let Some(mut sink) = self.sink.lock().await.take() else {
            return Ok(());
        };
        let frame = CloseFrame {
            code: WsCloseCode::from(code),
            reason: reason.to_string().into(),
        };
        let result = sink
            .send(WsMessage::Close(Some(frame)))
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()));
        debug!(code, reason, "close frame sent");
        result
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.task.get_mut().take() {
            handle.abort();
        }
    }
}

// ── Background task ───────────────────────────────────────────────────────────

async fn dial(url: &str) -> Result<WsStream, TransportError> {
    let (stream, _response) = connect_async(url)
        .await
        .map_err(|e| TransportError::ConnectFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
    Ok(stream)
}

async fn run_socket(
    url: String,
    reconnect_interval: Duration,
    sink: Arc<Mutex<Option<WsSink>>>,
    running: Arc<AtomicBool>,
    mut source: WsSource,
    events: mpsc::UnboundedSender<TransportEvent>,
) {
    loop {
        let (code, reason) = read_frames(&mut source, &events).await;
        sink.lock().await.take();

        warn!(url = %url, code = ?code, reason = ?reason, "socket closed");
        if events
            .send(TransportEvent::Disconnected { code, reason })
            .is_err()
        {
            return;
        }

        source = loop {
            if !running.load(Ordering::SeqCst) {
                return;
            }
            info!(url = %url, ?reconnect_interval, "reconnecting after delay");
            time::sleep(reconnect_interval).await;
            if !running.load(Ordering::SeqCst) {
                return;
            }

            match dial(&url).await {
                Ok(stream) => {
                    info!(url = %url, "reconnected");
                    let (new_sink, new_source) = stream.split();
                    *sink.lock().await = Some(new_sink);
                    if events.send(TransportEvent::Connected).is_err() {
                        return;
                    }
                    break new_source;
                }
                Err(e) => warn!(error = %e, "reconnect attempt failed"),
            }
        };
    }
}

/// Forwards text frames until the socket closes.  Returns the close code
/// and reason, if the peer sent a close frame.
async fn read_frames(
    source: &mut WsSource,
    events: &mpsc::UnboundedSender<TransportEvent>,
) -> (Option<u16>, Option<String>) {
    while let Some(next) = source.next().await {
        match next {
            Ok(WsMessage::Text(text)) => {
                if events.send(TransportEvent::Message(text)).is_err() {
                    break;
                }
            }
            Ok(WsMessage::Close(frame)) => {
                return match frame {
                    Some(frame) => (Some(u16::from(frame.code)), Some(frame.reason.into_owned())),
                    None => (None, None),
                };
            }
            Ok(WsMessage::Binary(data)) => {
                warn!(bytes = data.len(), "unexpected binary frame ignored");
            }
            Ok(WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_)) => {}
            Err(e) => {
                warn!(error = %e, "WebSocket read error");
                break;
            }
        }
    }
    (None, None)
}
