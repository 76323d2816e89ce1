//! Client configuration.
//!
//! [`ClientConfig`] is a plain struct with no I/O of its own.  Front ends
//! (the CLI, an embedding application, a test) fill it in and hand it to
//! [`ObsClient::new`](crate::ObsClient::new), which keeps it behind an `Arc`.

use std::time::Duration;

use obsws_core::protocol::messages::RPC_VERSION;
use obsws_core::EventSubscription;

/// Default server address: obs-websocket listens on port 4455.
pub const DEFAULT_URL: &str = "ws://127.0.0.1:4455";

/// All runtime settings of one client connection.
///
/// # Example
///
/// ```rust
/// use obsws_client::ClientConfig;
/// use std::time::Duration;
///
/// let cfg = ClientConfig::default().with_password("hunter2");
/// assert_eq!(cfg.request_timeout, Duration::from_secs(30));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// WebSocket URL of the server.
    pub url: String,

    /// Empty means "no password"; it is only used when Hello asks for it.
    pub password: String,

    /// Event categories requested at identify time.
    pub event_subscriptions: EventSubscription,

    /// RPC version announced in Identify.
    pub rpc_version: u32,

    /// Deadline for a single request.
    pub request_timeout: Duration,

    /// Base deadline for a batch, before sleep time is added.
    pub batch_timeout: Duration,

    /// Delay between reconnection attempts after the socket drops.
    pub reconnect_interval: Duration,
}

impl Default for ClientConfig {
    /// | Field               | Default                |
    /// |---------------------|------------------------|
    /// | url                 | `ws://127.0.0.1:4455`  |
    /// | password            | empty                  |
    /// | event_subscriptions | `All`                  |
    /// | rpc_version         | 1                      |
    /// | request_timeout     | 30 seconds             |
    /// | batch_timeout       | 15 seconds             |
    /// | reconnect_interval  | 15 seconds             |
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            password: String::new(),
            event_subscriptions: EventSubscription::ALL,
            rpc_version: RPC_VERSION,
            request_timeout: Duration::from_secs(30),
            batch_timeout: Duration::from_secs(15),
            reconnect_interval: Duration::from_secs(15),
        }
    }
}

impl ClientConfig {
    /// Builds the URL from a host and port.
    pub fn for_host(host: &str, port: u16) -> Self {
        Self {
            url: format!("ws://{host}:{port}"),
            ..Self::default()
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn with_event_subscriptions(mut self, mask: EventSubscription) -> Self {
        self.event_subscriptions = mask;
        self
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
