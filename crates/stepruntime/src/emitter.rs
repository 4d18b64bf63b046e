use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use stepcore::{ExecutionId, UpdateEvent, UpdateKind};
use tokio::sync::broadcast;

/// Publishes lifecycle events for executions.
///
/// Every event is appended to a bounded per-execution log and stamped with
/// a sequence number. Live delivery goes to whoever is subscribed to the
/// execution at that moment; with nobody subscribed it is dropped, and a
/// late subscriber catches up from the log instead.
#[derive(Clone)]
pub struct UpdateEmitter {
    inner: Arc<Inner>,
}

struct Inner {
    channels: DashMap<ExecutionId, broadcast::Sender<UpdateEvent>>,
    logs: DashMap<ExecutionId, EventLog>,
    log_capacity: usize,
    channel_capacity: usize,
}

#[derive(Default)]
struct EventLog {
    last_sequence: u64,
    events: VecDeque<UpdateEvent>,
    /// Set once the terminal event has been emitted
    finished: bool,
}

impl UpdateEmitter {
    pub fn new(log_capacity: usize, channel_capacity: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                channels: DashMap::new(),
                logs: DashMap::new(),
                log_capacity: log_capacity.max(1),
                channel_capacity: channel_capacity.max(1),
            }),
        }
    }

    /// Log an event for `execution_id` and push it to live subscribers
    pub fn emit(&self, execution_id: ExecutionId, kind: UpdateKind) -> UpdateEvent {
        // The log guard is released before the channel directory is touched.
        let event = {
            let mut log = self.inner.logs.entry(execution_id).or_default();
            log.last_sequence += 1;
            let event = UpdateEvent {
                kind,
                execution_id,
                sequence: log.last_sequence,
            };
            if event.is_terminal() {
                log.finished = true;
            }
            if log.events.len() == self.inner.log_capacity {
                log.events.pop_front();
            }
            log.events.push_back(event.clone());
            event
        };

        let delivered = self
            .inner
            .channels
            .get(&execution_id)
            .map(|sender| sender.send(event.clone()).is_ok())
            .unwrap_or(false);

        if !delivered {
            tracing::debug!(
                %execution_id,
                sequence = event.sequence,
                "No live subscriber for {}, update logged only",
                event.name()
            );
        }

        event
    }

    /// Subscribe to live updates, replaying logged events after `since`
    pub fn subscribe(&self, execution_id: ExecutionId, since: u64) -> Subscription {
        let receiver = self
            .inner
            .channels
            .entry(execution_id)
            .or_insert_with(|| broadcast::channel(self.inner.channel_capacity).0)
            .subscribe();

        // Snapshot after subscribing: anything emitted in between shows up in
        // both and is dropped by sequence in `Subscription::next`.
        let (replay, finished) = self
            .inner
            .logs
            .get(&execution_id)
            .map(|log| {
                let replay: VecDeque<UpdateEvent> = log
                    .events
                    .iter()
                    .filter(|event| event.sequence > since)
                    .cloned()
                    .collect();
                (replay, log.finished)
            })
            .unwrap_or_default();

        Subscription {
            execution_id,
            last_sequence: since,
            replay,
            finished,
            receiver,
        }
    }

    /// Logged events with a sequence number above `since`
    pub fn history(&self, execution_id: ExecutionId, since: u64) -> Vec<UpdateEvent> {
        self.inner
            .logs
            .get(&execution_id)
            .map(|log| {
                log.events
                    .iter()
                    .filter(|event| event.sequence > since)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Forget the log and live channel of an execution. Waiting subscribers
    /// see the end of their stream.
    pub fn forget(&self, execution_id: ExecutionId) {
        self.inner.logs.remove(&execution_id);
        self.inner.channels.remove(&execution_id);
    }

    /// Number of executions with a retained event log
    pub fn retained(&self) -> usize {
        self.inner.logs.len()
    }

    /// Drop the live channel for an execution once nobody listens
    pub fn release(&self, execution_id: ExecutionId) {
        self.inner
            .channels
            .remove_if(&execution_id, |_, sender| sender.receiver_count() == 0);
    }

    pub fn subscriber_count(&self, execution_id: ExecutionId) -> usize {
        self.inner
            .channels
            .get(&execution_id)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }
}

/// Stream of updates for one execution: replayed history, then live events
pub struct Subscription {
    execution_id: ExecutionId,
    last_sequence: u64,
    replay: VecDeque<UpdateEvent>,
    /// No live events will follow the replay
    finished: bool,
    receiver: broadcast::Receiver<UpdateEvent>,
}

impl Subscription {
    /// Sequence number of the last event handed out
    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    /// Next event in sequence order. `None` after the terminal event, or
    /// once the channel is gone.
    pub async fn next(&mut self) -> Option<UpdateEvent> {
        if let Some(event) = self.replay.pop_front() {
            self.last_sequence = event.sequence;
            return Some(event);
        }

        if self.finished {
            return None;
        }

        loop {
            match self.receiver.recv().await {
                Ok(event) if event.sequence <= self.last_sequence => continue,
                Ok(event) => {
                    self.last_sequence = event.sequence;
                    self.finished = event.is_terminal();
                    return Some(event);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        execution_id = %self.execution_id,
                        "Subscriber lagged, {} updates skipped",
                        skipped
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
