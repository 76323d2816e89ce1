//! Batch coordination.
//!
//! A batch is one op 8 frame carrying several sub-requests under a single
//! correlation id.  The server answers with one op 9 frame whose `results`
//! array may be shorter than the request list (halt on failure) and may be
//! in any order.  Results are therefore joined back to the sub-requests by
//! their own `requestId`, never by position.
//!
//! The deadline is the base timeout plus the total sleep time the batch's
//! `Sleep` sub-requests declare, so a batch that intentionally pauses on the
//! server is not reported as timed out.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use obsws_core::protocol::messages::{
    RequestBatchPayload, RequestBatchResponsePayload, RequestResponsePayload,
};
use obsws_core::request::batch::declared_sleep;
use obsws_core::{ExecutionType, Request, RequestSpec, RequestStatus};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::application::pending::{Completion, PendingTable, WaiterReceiver};
use crate::domain::ClientError;

/// Per-batch settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOptions {
    /// Server stops executing after the first failed sub-request.
    pub halt_on_failure: bool,
    pub execution_type: ExecutionType,
    /// Base deadline; `None` uses the configured batch timeout.
    pub timeout: Option<Duration>,
}

impl BatchOptions {
    pub fn halting(mut self) -> Self {
        self.halt_on_failure = true;
        self
    }

    pub fn with_execution_type(mut self, execution_type: ExecutionType) -> Self {
        self.execution_type = execution_type;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A batch ready to send, with its computed deadline.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedBatch {
    pub payload: RequestBatchPayload,
    pub deadline: Duration,
}

impl PreparedBatch {
    pub fn id(&self) -> &str {
        &self.payload.request_id
    }
}

/// Builds the op 8 payload and its deadline.
///
/// # Errors
///
/// Returns [`ClientError::DuplicateRequestId`] if two sub-requests share an
/// id, since their results could not be told apart.
pub fn prepare(
    requests: Vec<RequestSpec>,
    options: &BatchOptions,
    default_timeout: Duration,
) -> Result<PreparedBatch, ClientError> {
    let mut seen = HashSet::with_capacity(requests.len());
    for spec in &requests {
        if !seen.insert(spec.request_id.as_str()) {
            return Err(ClientError::DuplicateRequestId(spec.request_id.clone()));
        }
    }

    let base = options.timeout.unwrap_or(default_timeout);
    let deadline = base.saturating_add(declared_sleep(&requests));

    Ok(PreparedBatch {
        payload: RequestBatchPayload {
            request_id: Uuid::new_v4().to_string(),
            halt_on_failure: options.halt_on_failure,
            execution_type: options.execution_type,
            requests,
        },
        deadline,
    })
}

// ── Results ───────────────────────────────────────────────────────────────────

/// One sub-request paired with the result the server returned for it.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchItem {
    pub request: RequestSpec,
    pub response: RequestResponsePayload,
}

impl BatchItem {
    pub fn succeeded(&self) -> bool {
        self.response.request_status.result
    }

    pub fn status(&self) -> RequestStatus {
        self.response.request_status.code
    }

    /// The raw `responseData`, or the failure the server reported.
    pub fn raw_result(&self) -> Result<Option<Value>, ClientError> {
        let status = &self.response.request_status;
        if status.result {
            Ok(self.response.response_data.clone())
        } else {
            Err(ClientError::RequestFailed {
                code: status.code,
                comment: status.comment.clone(),
            })
        }
    }

    /// Parses this item with the parser of the request that produced it.
    pub fn parse<T>(&self, request: &Request<T>) -> Result<T, ClientError> {
        let data = self.raw_result()?;
        request.parse(data).map_err(ClientError::from)
    }
}

/// Results of a batch, in the order the sub-requests were given.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult {
    /// Only sub-requests the server produced a result for.
    pub items: Vec<BatchItem>,
    /// Sub-requests with no result, in input order.
    pub not_executed: Vec<RequestSpec>,
    /// `true` iff every returned result succeeded.
    pub finished_without_errors: bool,
}

impl BatchResult {
    pub fn get(&self, request_id: &str) -> Option<&BatchItem> {
        self.items.iter().find(|item| item.request.request_id == request_id)
    }
}

/// Joins `results` back onto `requests` by id, preserving request order.
pub fn join_results(
    requests: Vec<RequestSpec>,
    results: Vec<RequestResponsePayload>,
) -> BatchResult {
    let mut by_id: HashMap<String, RequestResponsePayload> = results
        .into_iter()
        .map(|result| (result.request_id.clone(), result))
        .collect();

    let mut items = Vec::with_capacity(requests.len());
    let mut not_executed = Vec::new();
    for request in requests {
        match by_id.remove(&request.request_id) {
            Some(response) => items.push(BatchItem { request, response }),
            None => not_executed.push(request),
        }
    }

    for stray in by_id.keys() {
        warn!(id = %stray, "batch result for a sub-request that was not sent");
    }

    let finished_without_errors = items.iter().all(BatchItem::succeeded);
    BatchResult {
        items,
        not_executed,
        finished_without_errors,
    }
}

// ── Coordinator ───────────────────────────────────────────────────────────────

/// Pending-table wrapper for batches; resolves with the raw result array.
pub struct BatchCoordinator {
    table: PendingTable<Vec<RequestResponsePayload>>,
}

impl Default for BatchCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchCoordinator {
    pub fn new() -> Self {
        Self {
            table: PendingTable::new("batch"),
        }
    }

    pub fn register(
        &self,
        id: &str,
    ) -> Result<WaiterReceiver<Vec<RequestResponsePayload>>, ClientError> {
        self.table.register(id)
    }

    pub fn register_discard(&self, id: &str, ttl: Duration) -> Result<(), ClientError> {
        self.table.register_discard(id, ttl)
    }

    pub fn cancel(&self, id: &str) -> bool {
        self.table.remove(id)
    }

    pub async fn wait(
        &self,
        id: &str,
        rx: WaiterReceiver<Vec<RequestResponsePayload>>,
        timeout: Duration,
    ) -> Result<Vec<RequestResponsePayload>, ClientError> {
        self.table.wait(id, rx, timeout).await
    }

    pub fn handle_response(&self, response: RequestBatchResponsePayload) -> Completion {
        let completion = self.table.complete(&response.request_id, Ok(response.results));
        if completion == Completion::Unmatched {
            warn!(id = %response.request_id, "batch response that is not awaited");
        }
        completion
    }

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

// ── Tests ─────────────────────────────────────────────────────────────────────
