//! Two-phase removal.
//!
//! Marking a record starts its exit transition; the record is committed
//! out of the collection once the transition reports completion or the
//! fallback timeout elapses, whichever comes first.
use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
    time::Duration,
};

use log::{debug, warn};
use tokio::sync::oneshot;
use uuid::Uuid;

/// How a pending removal was released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    /// The transition reported its end
    Signalled,
    /// The fallback timeout fired first
    TimedOut,
}

type Leaving = Arc<Mutex<HashSet<Uuid>>>;

/// Records currently leaving the view.
#[derive(Debug, Default)]
pub struct RemovalQueue {
    pending: Leaving,
}

impl RemovalQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `id` as leaving and returns the handle that settles it.
    pub fn mark(&mut self, id: Uuid, fallback: Duration) -> PendingRemoval {
        debug!("Marking {} for removal (fallback {:?})", id, fallback);
        if let Ok(mut pending) = self.pending.lock() {
            pending.insert(id);
        }
        let (done_tx, done_rx) = oneshot::channel();
        PendingRemoval {
            id,
            fallback,
            done_tx: Some(done_tx),
            done_rx: Some(done_rx),
            queue: Arc::clone(&self.pending),
            settled: false,
        }
    }

    pub fn is_leaving(&self, id: &Uuid) -> bool {
        self.pending
            .lock()
            .map(|pending| pending.contains(id))
            .unwrap_or(false)
    }

    /// Snapshot of the ids currently leaving.
    pub fn leaving(&self) -> HashSet<Uuid> {
        self.pending
            .lock()
            .map(|pending| pending.clone())
            .unwrap_or_default()
    }

    /// Forgets `id`; returns whether it was pending.
    pub fn finish(&mut self, id: &Uuid) -> bool {
        self.pending
            .lock()
            .map(|mut pending| pending.remove(id))
            .unwrap_or(false)
    }
}

/// A removal waiting for its transition.
///
/// Dropping it before [`settle`](Self::settle) completes un-marks the record.
#[derive(Debug)]
pub struct PendingRemoval {
    id: Uuid,
    fallback: Duration,
    done_tx: Option<oneshot::Sender<()>>,
    done_rx: Option<oneshot::Receiver<()>>,
    queue: Leaving,
    settled: bool,
}

impl PendingRemoval {
    /// Handle the view calls when the exit transition ends.
    pub fn transition_signal(&mut self) -> Option<TransitionSignal> {
        self.done_tx.take().map(TransitionSignal)
    }

    /// Reports the end of the transition directly.
    pub fn transition_end(&mut self) {
        if let Some(signal) = self.transition_signal() {
            signal.fire();
        }
    }

    /// Waits for the transition end, bounded by the fallback timeout.
    pub async fn settle(mut self) -> (Uuid, Settled) {
        let id = self.id;
        let Some(done_rx) = self.done_rx.take() else {
            self.settled = true;
            return (id, Settled::TimedOut);
        };

        let settled = match tokio::time::timeout(self.fallback, done_rx).await {
            Ok(Ok(())) => Settled::Signalled,
            Ok(Err(_)) => {
                warn!("Transition signal for {} dropped, committing removal", id);
                Settled::TimedOut
            }
            Err(_) => {
                warn!(
                    "No transition end for {} within {:?}, committing removal",
                    id, self.fallback
                );
                Settled::TimedOut
            }
        };
        self.settled = true;
        (id, settled)
    }
}

impl Drop for PendingRemoval {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        debug!("Removal of {} abandoned, restoring it", self.id);
        if let Ok(mut pending) = self.queue.lock() {
            pending.remove(&self.id);
        }
    }
}

/// One-shot "transition ended" notification.
#[derive(Debug)]
pub struct TransitionSignal(oneshot::Sender<()>);

impl TransitionSignal {
    pub fn fire(self) {
        let _ = self.0.send(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn signal_settles_immediately() {
        let mut queue = RemovalQueue::new();
        let id = Uuid::new_v4();
        let mut pending = queue.mark(id, Duration::from_secs(3600));
        assert!(queue.is_leaving(&id));

        pending.transition_end();
        assert_eq!(pending.settle().await, (id, Settled::Signalled));
        assert!(queue.finish(&id));
        assert!(!queue.is_leaving(&id));
    }

    #[tokio::test(start_paused = true)]
    async fn missing_signal_falls_back_to_timeout() {
        let mut queue = RemovalQueue::new();
        let id = Uuid::new_v4();
        let pending = queue.mark(id, Duration::from_millis(300));

        assert_eq!(pending.settle().await, (id, Settled::TimedOut));
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_signal_still_commits() {
        let mut queue = RemovalQueue::new();
        let mut pending = queue.mark(Uuid::new_v4(), Duration::from_millis(300));
        drop(pending.transition_signal());

        assert_eq!(pending.settle().await.1, Settled::TimedOut);
    }

    #[tokio::test]
    async fn dropping_an_unsettled_removal_unmarks_it() {
        let mut queue = RemovalQueue::new();
        let id = Uuid::new_v4();
        let pending = queue.mark(id, Duration::from_secs(3600));
        assert!(queue.is_leaving(&id));

        drop(pending);
        assert!(!queue.is_leaving(&id));
        assert!(queue.leaving().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_settle_unmarks() {
        let mut queue = RemovalQueue::new();
        let id = Uuid::new_v4();
        let pending = queue.mark(id, Duration::from_secs(3600));

        let waited = tokio::time::timeout(Duration::from_millis(10), pending.settle()).await;
        assert!(waited.is_err());
        assert!(!queue.is_leaving(&id));
    }

    #[tokio::test]
    async fn signal_from_another_task() {
        let mut queue = RemovalQueue::new();
        let id = Uuid::new_v4();
        let mut pending = queue.mark(id, Duration::from_secs(3600));
        let signal = pending.transition_signal().unwrap();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            signal.fire();
        });
        assert_eq!(pending.settle().await.1, Settled::Signalled);
    }
}
