//! Bounded history of trigger runs with a broadcast status channel.

use std::collections::{HashMap, VecDeque};

use chrono::Utc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};

use super::cancel::{cancel_pair, CancelHandle, CancelToken};
use super::types::{CancelOutcome, Operation, OperationEvent, OperationId, OperationStatus, Trigger};

/// Operations kept in the history.
pub const DEFAULT_HISTORY: usize = 100;

const EVENT_CAPACITY: usize = 64;

#[derive(Default)]
struct TrackerState {
    operations: VecDeque<Operation>,
    handles: HashMap<OperationId, CancelHandle>,
}

impl TrackerState {
    fn get_mut(&mut self, id: OperationId) -> Option<&mut Operation> {
        self.operations.iter_mut().find(|op| op.id == id)
    }

    /// Drop the oldest finished operations beyond `capacity`. Running
    /// operations are never evicted.
    fn evict(&mut self, capacity: usize) {
        while self.operations.len() > capacity {
            match self.operations.iter().position(|op| op.status.is_finished()) {
                Some(index) => {
                    self.operations.remove(index);
                }
                None => break,
            }
        }
    }
}

/// Records every trigger run and lets callers cancel the ones in flight.
pub struct OperationTracker {
    state: RwLock<TrackerState>,
    events: broadcast::Sender<OperationEvent>,
    capacity: usize,
}

impl Default for OperationTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationTracker {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: RwLock::new(TrackerState::default()),
            events,
            capacity: capacity.max(1),
        }
    }

    /// Subscribe to started/finished events.
    pub fn subscribe(&self) -> broadcast::Receiver<OperationEvent> {
        self.events.subscribe()
    }

    /// Record a new running operation.
    pub async fn begin(&self, trigger: Trigger) -> (OperationId, CancelToken) {
        let id = OperationId::new();
        let (handle, token) = cancel_pair();
        let operation = Operation {
            id,
            trigger,
            status: OperationStatus::Running,
            started_at: Utc::now(),
            finished_at: None,
        };

        {
            let mut state = self.state.write().await;
            state.operations.push_back(operation.clone());
            state.handles.insert(id, handle);
            state.evict(self.capacity);
        }

        debug!(operation_id = %id, trigger = operation.trigger.label(), "Operation started");
        let _ = self.events.send(OperationEvent::Started { operation });
        (id, token)
    }

    /// Record the final status of an operation.
    pub async fn finish(&self, id: OperationId, status: OperationStatus) {
        let finished = {
            let mut state = self.state.write().await;
            state.handles.remove(&id);
            let finished = state.get_mut(id).map(|op| {
                op.status = status;
                op.finished_at = Some(Utc::now());
                op.clone()
            });
            state.evict(self.capacity);
            finished
        };

        if let Some(operation) = finished {
            debug!(operation_id = %id, status = operation.status.label(), "Operation finished");
            let _ = self.events.send(OperationEvent::Finished { operation });
        }
    }

    /// Signal an in-flight operation to stop.
    pub async fn cancel(&self, id: OperationId) -> CancelOutcome {
        let state = self.state.read().await;
        match state.handles.get(&id) {
            Some(handle) => {
                handle.cancel();
                info!(operation_id = %id, "Cancellation requested");
                CancelOutcome::Requested
            }
            None if state.operations.iter().any(|op| op.id == id) => {
                CancelOutcome::AlreadyFinished
            }
            None => CancelOutcome::NotFound,
        }
    }

    /// Signal every in-flight operation. Returns how many were signalled.
    pub async fn cancel_all(&self) -> usize {
        let state = self.state.read().await;
        for handle in state.handles.values() {
            handle.cancel();
        }
        let count = state.handles.len();
        if count > 0 {
            info!(count, "Cancelled in-flight operations");
        }
        count
    }

    /// Known operations, newest first.
    pub async fn list(&self) -> Vec<Operation> {
        self.state
            .read()
            .await
            .operations
            .iter()
            .rev()
            .cloned()
            .collect()
    }

    pub async fn get(&self, id: OperationId) -> Option<Operation> {
        self.state
            .read()
            .await
            .operations
            .iter()
            .find(|op| op.id == id)
            .cloned()
    }

    /// Number of operations still running.
    pub async fn in_flight(&self) -> usize {
        self.state.read().await.handles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_begin_and_finish_records_lifecycle() {
        let tracker = OperationTracker::new();
        let mut events = tracker.subscribe();

        let (id, _token) = tracker.begin(Trigger::SaveAsFile).await;
        let running = tracker.get(id).await.unwrap();
        assert_eq!(running.status, OperationStatus::Running);
        assert!(running.finished_at.is_none());

        tracker
            .finish(
                id,
                OperationStatus::Succeeded {
                    detail: "document.pdf".into(),
                },
            )
            .await;

        let done = tracker.get(id).await.unwrap();
        assert!(done.status.is_finished());
        assert!(done.finished_at.unwrap() >= done.started_at);

        assert!(matches!(events.recv().await.unwrap(), OperationEvent::Started { .. }));
        match events.recv().await.unwrap() {
            OperationEvent::Finished { operation } => assert_eq!(operation.id, id),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cancel_signals_token() {
        let tracker = OperationTracker::new();
        let (id, token) = tracker.begin(Trigger::AddVersion).await;

        assert_eq!(tracker.cancel(id).await, CancelOutcome::Requested);
        tokio::time::timeout(Duration::from_secs(1), token.cancelled())
            .await
            .unwrap();

        tracker.finish(id, OperationStatus::Cancelled).await;
        assert_eq!(tracker.cancel(id).await, CancelOutcome::AlreadyFinished);
        assert_eq!(
            tracker.cancel(OperationId::new()).await,
            CancelOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn test_cancel_all_signals_every_running_operation() {
        let tracker = OperationTracker::new();
        let (_a, token_a) = tracker.begin(Trigger::SaveAsFile).await;
        let (_b, token_b) = tracker.begin(Trigger::AddVersion).await;
        let (c, _token_c) = tracker.begin(Trigger::SaveAsFile).await;
        tracker.finish(c, OperationStatus::Cancelled).await;

        assert_eq!(tracker.in_flight().await, 2);
        assert_eq!(tracker.cancel_all().await, 2);
        assert!(token_a.is_cancelled());
        assert!(token_b.is_cancelled());
    }

    #[tokio::test]
    async fn test_history_is_bounded_and_newest_first() {
        let tracker = OperationTracker::with_capacity(3);
        let mut ids = Vec::new();
        for _ in 0..5 {
            let (id, _) = tracker.begin(Trigger::SaveAsFile).await;
            tracker
                .finish(
                    id,
                    OperationStatus::Succeeded {
                        detail: String::new(),
                    },
                )
                .await;
            ids.push(id);
        }

        let listed: Vec<OperationId> = tracker.list().await.iter().map(|op| op.id).collect();
        assert_eq!(listed, vec![ids[4], ids[3], ids[2]]);
        assert!(tracker.get(ids[0]).await.is_none());
    }

    #[tokio::test]
    async fn test_running_operations_survive_eviction() {
        let tracker = OperationTracker::with_capacity(1);
        let (running, _token) = tracker.begin(Trigger::AddVersion).await;
        let (other, _) = tracker.begin(Trigger::SaveAsFile).await;
        tracker
            .finish(
                other,
                OperationStatus::Failed {
                    error: "x".into(),
                },
            )
            .await;

        assert!(tracker.get(running).await.is_some());
        assert!(tracker.get(other).await.is_none());
    }
}
