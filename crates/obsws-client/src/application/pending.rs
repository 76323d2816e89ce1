//! Table of in-flight calls waiting for a response.
//!
//! # How a call is tracked (for beginners)
//!
//! Sending a request and receiving its response happen on different tasks:
//! the caller writes the frame, and the connection's reader task later sees
//! the matching response.  The two meet in a [`PendingTable`]:
//!
//! 1. The caller registers its correlation id and gets back the receiving
//!    end of a `oneshot` channel.
//! 2. The reader task looks up the id when a response arrives, removes the
//!    entry, and sends the result down the channel.
//! 3. If the deadline passes first, the caller removes the entry itself and
//!    reports a timeout.
//!
//! Whichever of {response, timeout, disconnect} removes the entry first wins;
//! the removal happens under the table lock, so an id is resolved at most
//! once.  The lock only guards the map.  It is never held across an
//! `.await`, and results are sent after the lock is released.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::domain::ClientError;

/// Receiving half handed to the caller at registration time.
pub type WaiterReceiver<T> = oneshot::Receiver<Result<T, ClientError>>;

enum Waiter<T> {
    /// A caller is suspended on the other end of this sender.
    Pending(oneshot::Sender<Result<T, ClientError>>),
    /// Fire-and-forget: swallow the response quietly until `expires_at`
    /// (`None` never expires).
    Discard { expires_at: Option<Instant> },
}

/// What happened to an inbound response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Handed to the waiting caller.
    Delivered,
    /// Matched a fire-and-forget entry.
    Discarded,
    /// Matched an entry whose caller had already gone away.
    Abandoned,
    /// No entry for this id (never sent, timed out, or already resolved).
    Unmatched,
}

/// Thread-safe map from correlation id to waiter.
pub struct PendingTable<T> {
    kind: &'static str,
    entries: Mutex<HashMap<String, Waiter<T>>>,
}

impl<T> PendingTable<T> {
    /// `kind` names the table in log lines ("request", "batch").
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Registers a waiter for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::DuplicateRequestId`] if `id` is already live.
    pub fn register(&self, id: &str) -> Result<WaiterReceiver<T>, ClientError> {
        let (tx, rx) = oneshot::channel();
        self.insert(id, Waiter::Pending(tx))?;
        Ok(rx)
    }

    /// Registers a fire-and-forget entry that expires after `ttl`.
    pub fn register_discard(&self, id: &str, ttl: Duration) -> Result<(), ClientError> {
        let expires_at = Instant::now().checked_add(ttl);
        self.insert(id, Waiter::Discard { expires_at })
    }

    fn insert(&self, id: &str, waiter: Waiter<T>) -> Result<(), ClientError> {
        let mut entries = self.entries.lock();
        prune_expired(&mut entries, Instant::now());
        if entries.contains_key(id) {
            return Err(ClientError::DuplicateRequestId(id.to_string()));
        }
        entries.insert(id.to_string(), waiter);
        Ok(())
    }

    /// Resolves `id` with `result`, removing its entry.
    pub fn complete(&self, id: &str, result: Result<T, ClientError>) -> Completion {
        let waiter = self.entries.lock().remove(id);
        match waiter {
            Some(Waiter::Pending(tx)) => match tx.send(result) {
                Ok(()) => Completion::Delivered,
                Err(_) => {
                    debug!(kind = self.kind, id, "caller went away before its response arrived");
                    Completion::Abandoned
                }
            },
            Some(Waiter::Discard { .. }) => Completion::Discarded,
            None => Completion::Unmatched,
        }
    }

    /// Removes `id` without resolving it.  Returns `false` if it was not present.
    pub fn remove(&self, id: &str) -> bool {
        self.entries.lock().remove(id).is_some()
    }

    /// Fails every pending waiter with the error `make_error` builds and
    /// clears the table.  Returns how many callers were woken.
    pub fn fail_all(&self, make_error: impl Fn() -> ClientError) -> usize {
        let drained: Vec<Waiter<T>> = self.entries.lock().drain().map(|(_, w)| w).collect();
        let mut woken = 0;
        for waiter in drained {
            if let Waiter::Pending(tx) = waiter {
                if tx.send(Err(make_error())).is_ok() {
                    woken += 1;
                }
            }
        }
        woken
    }

    /// Drops fire-and-forget entries whose time is up.
    pub fn sweep_expired(&self) -> usize {
        prune_expired(&mut self.entries.lock(), Instant::now())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Suspends until `rx` resolves or `timeout` elapses.
    ///
    /// On timeout the entry is removed before the error is returned, so a
    /// late response with the same id is unmatched rather than misdelivered.
    /// If the future is dropped early the entry is removed as well.
    pub async fn wait(
        &self,
        id: &str,
        mut rx: WaiterReceiver<T>,
        timeout: Duration,
    ) -> Result<T, ClientError> {
        let mut guard = RemoveOnDrop {
            table: self,
            id,
            armed: true,
        };

        let outcome = tokio::time::timeout(timeout, &mut rx).await;
        guard.armed = false;

        match outcome {
            Ok(Ok(result)) => result,
            // The sender is only dropped without a value if the table itself
            // is being torn down with the connection.
            Ok(Err(_)) => Err(ClientError::Disconnected),
            Err(_elapsed) => {
                if self.remove(id) {
                    warn!(kind = self.kind, id, ?timeout, "timed out waiting for response");
                    return Err(ClientError::RequestTimedOut {
                        request_id: id.to_string(),
                    });
                }
                // The reader removed the entry first; its send is either done
                // or about to happen outside the lock.
                rx.await.unwrap_or(Err(ClientError::Disconnected))
            }
        }
    }
}

fn prune_expired<T>(entries: &mut HashMap<String, Waiter<T>>, now: Instant) -> usize {
    let before = entries.len();
    entries.retain(|_, waiter| match waiter {
        Waiter::Discard { expires_at } => expires_at.map_or(true, |at| at > now),
        Waiter::Pending(_) => true,
    });
    before - entries.len()
}

struct RemoveOnDrop<'a, T> {
    table: &'a PendingTable<T>,
    id: &'a str,
    armed: bool,
}

impl<T> Drop for RemoveOnDrop<'_, T> {
    fn drop(&mut self) {
        if self.armed && self.table.remove(self.id) {
            debug!(kind = self.table.kind, id = self.id, "waiter dropped; entry removed");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_pending, assert_ready, task};

    #[tokio::test]
    async fn test_complete_delivers_to_waiter() {
        // Arrange
        let table: PendingTable<u32> = PendingTable::new("request");
        let rx = table.register("a").unwrap();

        // Act
        let completion = table.complete("a", Ok(7));

        // Assert
        assert_eq!(completion, Completion::Delivered);
        assert_eq!(rx.await.unwrap(), Ok(7));
        assert!(table.is_empty());
    }

    #[test]
    fn test_duplicate_live_id_is_rejected() {
        let table: PendingTable<u32> = PendingTable::new("request");
        let _rx = table.register("a").unwrap();

        assert_eq!(
            table.register("a").unwrap_err(),
            ClientError::DuplicateRequestId("a".into())
        );
    }

    #[test]
    fn test_second_completion_is_unmatched() {
        let table: PendingTable<u32> = PendingTable::new("request");
        let _rx = table.register("a").unwrap();

        assert_eq!(table.complete("a", Ok(1)), Completion::Delivered);
        assert_eq!(table.complete("a", Ok(2)), Completion::Unmatched);
    }

    #[test]
    fn test_complete_after_caller_dropped_is_abandoned() {
        let table: PendingTable<u32> = PendingTable::new("request");
        drop(table.register("a").unwrap());

        assert_eq!(table.complete("a", Ok(1)), Completion::Abandoned);
    }

    #[tokio::test]
    async fn test_fail_all_wakes_every_waiter() {
        // Arrange
        let table: PendingTable<u32> = PendingTable::new("batch");
        let receivers: Vec<_> = (0..5).map(|i| table.register(&i.to_string()).unwrap()).collect();
        table.register_discard("quiet", Duration::from_secs(60)).unwrap();

        // Act
        let woken = table.fail_all(|| ClientError::Disconnected);

        // Assert
        assert_eq!(woken, 5);
        assert!(table.is_empty());
        for rx in receivers {
            assert_eq!(rx.await.unwrap(), Err(ClientError::Disconnected));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out_and_removes_entry() {
        // Arrange
        let table: PendingTable<u32> = PendingTable::new("request");
        let rx = table.register("a").unwrap();

        // Act
        let result = table.wait("a", rx, Duration::from_millis(500)).await;

        // Assert
        assert_eq!(
            result,
            Err(ClientError::RequestTimedOut {
                request_id: "a".into()
            })
        );
        assert!(!table.contains("a"));
        assert_eq!(table.complete("a", Ok(1)), Completion::Unmatched);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_is_pending_until_completed() {
        let table: PendingTable<u32> = PendingTable::new("request");
        let rx = table.register("a").unwrap();
        let mut fut = task::spawn(table.wait("a", rx, Duration::from_secs(5)));

        assert_pending!(fut.poll());
        table.complete("a", Ok(3));
        assert_eq!(assert_ready!(fut.poll()), Ok(3));
    }

    #[tokio::test]
    async fn test_dropping_wait_future_removes_entry() {
        let table: PendingTable<u32> = PendingTable::new("request");
        let rx = table.register("a").unwrap();

        {
            let mut fut = task::spawn(table.wait("a", rx, Duration::from_secs(5)));
            assert_pending!(fut.poll());
        }

        assert!(!table.contains("a"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_discard_entry_swallows_response_then_expires() {
        // Arrange
        let table: PendingTable<u32> = PendingTable::new("request");
        table.register_discard("a", Duration::from_secs(1)).unwrap();
        table.register_discard("b", Duration::from_secs(1)).unwrap();

        // Act / Assert
        assert_eq!(table.complete("a", Ok(1)), Completion::Discarded);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(table.sweep_expired(), 1);
        assert_eq!(table.complete("b", Ok(1)), Completion::Unmatched);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_discard_ttl_never_expires() {
        let table: PendingTable<u32> = PendingTable::new("batch");
        table.register_discard("a", Duration::MAX).unwrap();

        tokio::time::advance(Duration::from_secs(3600)).await;

        assert_eq!(table.sweep_expired(), 0);
        assert!(table.contains("a"));
    }
}
