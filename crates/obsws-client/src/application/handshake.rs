//! Hello → Identify → Identified state machine.
//!
//! ```text
//!  AwaitingHello ──Hello / send Identify──▶ AwaitingIdentified ──Identified──▶ Ready
//!        ▲                                                                     │
//!        └──────────────────────── socket lost (reset) ────────────────────────┘
//! ```
//!
//! The machine is pure: it consumes decoded payloads and returns the payload
//! to send next.  The connection manager owns the socket and does the I/O.

use obsws_core::compute_auth_token;
use obsws_core::protocol::messages::{
    HelloPayload, IdentifiedPayload, IdentifyPayload, ReidentifyPayload,
};
use obsws_core::EventSubscription;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakePhase {
    AwaitingHello,
    AwaitingIdentified,
    Ready,
}

#[derive(Debug, Clone)]
pub struct Handshake {
    phase: HandshakePhase,
    password: String,
    rpc_version: u32,
    event_subscriptions: EventSubscription,
    negotiated_rpc_version: Option<u32>,
}

impl Handshake {
    pub fn new(password: impl Into<String>, rpc_version: u32, mask: EventSubscription) -> Self {
        Self {
            phase: HandshakePhase::AwaitingHello,
            password: password.into(),
            rpc_version,
            event_subscriptions: mask,
            negotiated_rpc_version: None,
        }
    }

    pub fn phase(&self) -> HandshakePhase {
        self.phase
    }

    pub fn is_ready(&self) -> bool {
        self.phase == HandshakePhase::Ready
    }

    pub fn event_subscriptions(&self) -> EventSubscription {
        self.event_subscriptions
    }

    pub fn negotiated_rpc_version(&self) -> Option<u32> {
        self.negotiated_rpc_version
    }

    /// Answers Hello with the Identify payload to send.
    ///
    /// A Hello in any phase starts the handshake over.
    pub fn on_hello(&mut self, hello: &HelloPayload) -> IdentifyPayload {
        if self.phase != HandshakePhase::AwaitingHello {
            warn!(phase = ?self.phase, "Hello received mid-session; restarting handshake");
        }
        info!(
            server = %hello.obs_web_socket_version,
            rpc_version = hello.rpc_version,
            auth_required = hello.authentication.is_some(),
            "Hello received"
        );

        let authentication = hello.authentication.as_ref().map(|challenge| {
            if self.password.is_empty() {
                warn!("server requires a password but none is configured");
            }
            compute_auth_token(&self.password, &challenge.salt, &challenge.challenge)
        });

        self.phase = HandshakePhase::AwaitingIdentified;
        self.negotiated_rpc_version = None;
        IdentifyPayload {
            rpc_version: self.rpc_version,
            authentication,
            event_subscriptions: self.event_subscriptions,
        }
    }

    /// Completes the handshake.  Returns `false` if Identified was unexpected.
    pub fn on_identified(&mut self, identified: &IdentifiedPayload) -> bool {
        if self.phase != HandshakePhase::AwaitingIdentified {
            warn!(phase = ?self.phase, "unexpected Identified frame ignored");
            return false;
        }
        info!(rpc_version = identified.negotiated_rpc_version, "session identified");
        self.phase = HandshakePhase::Ready;
        self.negotiated_rpc_version = Some(identified.negotiated_rpc_version);
        true
    }

    /// Replaces the subscription mask.
    ///
    /// Returns the Reidentify payload to send when the session is live; the
    /// new mask is otherwise used by the next Identify.
    pub fn reidentify(&mut self, mask: EventSubscription) -> Option<ReidentifyPayload> {
        self.event_subscriptions = mask;
        if self.is_ready() {
            Some(ReidentifyPayload {
                event_subscriptions: mask,
            })
        } else {
            debug!(%mask, "subscription mask stored for the next Identify");
            None
        }
    }

    pub fn reset(&mut self) {
        self.phase = HandshakePhase::AwaitingHello;
        self.negotiated_rpc_version = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use obsws_core::protocol::messages::AuthChallenge;

    fn hello(auth: Option<(&str, &str)>) -> HelloPayload {
        HelloPayload {
            obs_web_socket_version: "5.5.0".into(),
            rpc_version: 1,
            authentication: auth.map(|(challenge, salt)| AuthChallenge {
                challenge: challenge.into(),
                salt: salt.into(),
            }),
        }
    }

    #[test]
    fn test_hello_without_challenge_omits_authentication() {
        // Arrange
        let mut hs = Handshake::new("pw", 1, EventSubscription::ALL);

        // Act
        let identify = hs.on_hello(&hello(None));

        // Assert
        assert_eq!(identify.authentication, None);
        assert_eq!(identify.event_subscriptions, EventSubscription::ALL);
        assert_eq!(hs.phase(), HandshakePhase::AwaitingIdentified);
    }

    #[test]
    fn test_hello_with_challenge_computes_token() {
        let mut hs = Handshake::new("p", 1, EventSubscription::NONE);

        let identify = hs.on_hello(&hello(Some(("c", "s"))));

        assert_eq!(
            identify.authentication.as_deref(),
            Some("LEfh2WVBWpa8M06P7MehLXlToA1PtH2lNSNPjUZVYls=")
        );
    }

    #[test]
    fn test_identified_completes_handshake() {
        let mut hs = Handshake::new("", 1, EventSubscription::ALL);
        hs.on_hello(&hello(None));

        assert!(hs.on_identified(&IdentifiedPayload {
            negotiated_rpc_version: 1
        }));
        assert!(hs.is_ready());
        assert_eq!(hs.negotiated_rpc_version(), Some(1));
    }

    #[test]
    fn test_identified_before_hello_is_ignored() {
        let mut hs = Handshake::new("", 1, EventSubscription::ALL);
        assert!(!hs.on_identified(&IdentifiedPayload {
            negotiated_rpc_version: 1
        }));
        assert_eq!(hs.phase(), HandshakePhase::AwaitingHello);
    }

    #[test]
    fn test_reidentify_only_sends_when_ready() {
        // Arrange
        let mut hs = Handshake::new("", 1, EventSubscription::ALL);

        // Act / Assert: not ready yet, mask is stored for Identify
        assert_eq!(hs.reidentify(EventSubscription::SCENES), None);
        let identify = hs.on_hello(&hello(None));
        assert_eq!(identify.event_subscriptions, EventSubscription::SCENES);

        hs.on_identified(&IdentifiedPayload {
            negotiated_rpc_version: 1,
        });
        let payload = hs.reidentify(EventSubscription::OUTPUTS).unwrap();
        assert_eq!(payload.event_subscriptions, EventSubscription::OUTPUTS);
    }

    #[test]
    fn test_reset_returns_to_awaiting_hello() {
        let mut hs = Handshake::new("", 1, EventSubscription::ALL);
        hs.on_hello(&hello(None));
        hs.on_identified(&IdentifiedPayload {
            negotiated_rpc_version: 1,
        });

        hs.reset();

        assert_eq!(hs.phase(), HandshakePhase::AwaitingHello);
        assert_eq!(hs.negotiated_rpc_version(), None);
    }
}
