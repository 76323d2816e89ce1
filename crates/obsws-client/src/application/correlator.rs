//! Single-request correlation.
//!
//! Maps each op 7 response back to the caller that sent the op 6 request with
//! the same `requestId`.  The correlator only moves raw `responseData`;
//! turning it into a typed result is the caller's job (see
//! [`Request::parse`](obsws_core::Request::parse)).

use std::time::Duration;

use obsws_core::protocol::messages::RequestResponsePayload;
use serde_json::Value;
use tracing::{debug, warn};

use crate::application::pending::{Completion, PendingTable, WaiterReceiver};
use crate::domain::ClientError;

/// What a single request resolves to before typed parsing.
pub type RawResponse = Option<Value>;

pub struct RequestCorrelator {
    table: PendingTable<RawResponse>,
}

impl Default for RequestCorrelator {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestCorrelator {
    pub fn new() -> Self {
        Self {
            table: PendingTable::new("request"),
        }
    }

    pub fn register(&self, id: &str) -> Result<WaiterReceiver<RawResponse>, ClientError> {
        self.table.register(id)
    }

    pub fn register_discard(&self, id: &str, ttl: Duration) -> Result<(), ClientError> {
        self.table.register_discard(id, ttl)
    }

    /// Withdraws a registration whose frame never made it onto the socket.
    pub fn cancel(&self, id: &str) -> bool {
        self.table.remove(id)
    }

    pub async fn wait(
        &self,
        id: &str,
        rx: WaiterReceiver<RawResponse>,
        timeout: Duration,
    ) -> Result<RawResponse, ClientError> {
        self.table.wait(id, rx, timeout).await
    }

    /// Routes one response to its waiter.
    ///
    /// `result: false` becomes [`ClientError::RequestFailed`] carrying the
    /// server's status code and comment.
    pub fn handle_response(&self, response: RequestResponsePayload) -> Completion {
        let RequestResponsePayload {
            request_type,
            request_id,
            request_status,
            response_data,
        } = response;

        let result = if request_status.result {
            Ok(response_data)
        } else {
            debug!(
                id = %request_id,
                request_type = %request_type,
                code = %request_status.code,
                "request failed on the server"
            );
            Err(ClientError::RequestFailed {
                code: request_status.code,
                comment: request_status.comment,
            })
        };

        let completion = self.table.complete(&request_id, result);
        if completion == Completion::Unmatched {
            warn!(
                id = %request_id,
                request_type = %request_type,
                "response to a request that is not awaiting one"
            );
        }
        completion
    }

    /// Fails one waiter whose response arrived but could not be decoded.
    pub fn fail_malformed(&self, request_id: &str, reason: String) -> Completion {
        self.table
            .complete(request_id, Err(ClientError::MalformedPayload(reason)))
    }

    pub fn fail_all(&self, make_error: impl Fn() -> ClientError) -> usize {
        self.table.fail_all(make_error)
    }

    pub fn sweep_expired(&self) -> usize {
        self.table.sweep_expired()
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.table.contains(id)
    }

    pub fn pending_count(&self) -> usize {
        self.table.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use obsws_core::protocol::messages::RequestStatusPayload;
    use obsws_core::RequestStatus;
    use serde_json::json;

    fn response(id: &str, result: bool, code: i64, data: Option<Value>) -> RequestResponsePayload {
        RequestResponsePayload {
            request_type: "GetInputMute".into(),
            request_id: id.into(),
            request_status: RequestStatusPayload {
                result,
                code: RequestStatus::from_code(code),
                comment: (!result).then(|| "nope".to_string()),
            },
            response_data: data,
        }
    }

    #[tokio::test]
    async fn test_successful_response_resolves_with_data() {
        // Arrange
        let correlator = RequestCorrelator::new();
        let rx = correlator.register("r1").unwrap();

        // Act
        correlator.handle_response(response("r1", true, 100, Some(json!({ "inputMuted": true }))));

        // Assert
        assert_eq!(rx.await.unwrap(), Ok(Some(json!({ "inputMuted": true }))));
    }

    #[tokio::test]
    async fn test_failed_response_carries_code_and_comment() {
        let correlator = RequestCorrelator::new();
        let rx = correlator.register("r1").unwrap();

        correlator.handle_response(response("r1", false, 604, None));

        assert_eq!(
            rx.await.unwrap(),
            Err(ClientError::RequestFailed {
                code: RequestStatus::InvalidResourceState,
                comment: Some("nope".into()),
            })
        );
    }

    #[test]
    fn test_unknown_id_is_unmatched() {
        let correlator = RequestCorrelator::new();
        assert_eq!(
            correlator.handle_response(response("ghost", true, 100, None)),
            Completion::Unmatched
        );
    }

    #[tokio::test]
    async fn test_fail_malformed_targets_one_waiter() {
        // Arrange
        let correlator = RequestCorrelator::new();
        let bad = correlator.register("bad").unwrap();
        let _good = correlator.register("good").unwrap();

        // Act
        correlator.fail_malformed("bad", "missing requestStatus".into());

        // Assert
        assert!(matches!(bad.await.unwrap(), Err(ClientError::MalformedPayload(_))));
        assert!(correlator.is_pending("good"));
    }
}
