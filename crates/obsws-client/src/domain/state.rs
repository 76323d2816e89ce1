//! Connection lifecycle states and disconnect reports.

use obsws_core::CloseCode;

/// Where a connection is in its lifecycle.
///
/// ```text
/// Disconnected ──socket open──▶ Connected ──Identified──▶ Identified
///      ▲                            │                         │
///      └──────── socket lost ───────┴─────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    /// Socket open, handshake in progress.
    Connected,
    /// Handshake complete; requests may be sent.
    Identified,
}

/// Reported to disconnect listeners each time the socket goes away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisconnectInfo {
    pub code: CloseCode,
    pub comment: Option<String>,
}

impl DisconnectInfo {
    /// Builds a report from the raw close frame, if the socket sent one.
    ///
    /// A socket that dropped without a close frame reports `UnknownReason`.
    pub fn from_close(code: Option<u16>, reason: Option<String>) -> Self {
        Self {
            code: code.map(CloseCode::from_code).unwrap_or(CloseCode::UnknownReason),
            comment: reason.filter(|r| !r.is_empty()),
        }
    }
}
