//! Deferred deletion of delivered objects.
//!
//! Deliveries hand their identifier to a [`CleanupScheduler`]; a single
//! worker task deletes each one after a fixed grace delay and releases its
//! download claim. Scheduling never blocks, so it is safe from `Drop`.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::time::DelayQueue;
use tokio_util::time::delay_queue::Key;
use tracing::{debug, warn};

use super::claims::ClaimRegistry;
use crate::storage::StorageService;

/// Count of scheduled deletions that have not finished yet.
#[derive(Debug, Default)]
struct Pending {
    count: AtomicUsize,
    idle: Notify,
}

impl Pending {
    fn add(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    fn done(&self) {
        if self.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }

    fn get(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

/// Handle for scheduling deletions. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CleanupScheduler {
    tx: mpsc::UnboundedSender<String>,
    pending: Arc<Pending>,
}

impl CleanupScheduler {
    /// Schedule `identifier` for deletion after the grace delay.
    pub fn schedule(&self, identifier: String) {
        self.pending.add();
        if let Err(mpsc::error::SendError(identifier)) = self.tx.send(identifier) {
            warn!(identifier = %identifier, "Cleanup worker stopped; deletion dropped");
            self.pending.done();
        }
    }
}

/// The cleanup worker and its control handles.
pub struct CleanupQueue {
    scheduler: CleanupScheduler,
    shutdown: CancellationToken,
    worker: JoinHandle<()>,
}

impl CleanupQueue {
    /// Spawn the worker on the current tokio runtime.
    #[must_use]
    pub fn spawn(
        storage: Arc<StorageService>,
        claims: Arc<ClaimRegistry>,
        delay: Duration,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let pending = Arc::new(Pending::default());
        let shutdown = CancellationToken::new();

        let worker = CleanupWorker {
            rx,
            storage,
            claims,
            delay,
            pending: pending.clone(),
            scheduled: HashMap::new(),
            delays: DelayQueue::new(),
        };
        let worker = tokio::spawn(worker.run(shutdown.clone()));

        Self {
            scheduler: CleanupScheduler { tx, pending },
            shutdown,
            worker,
        }
    }

    /// A handle for scheduling deletions.
    #[must_use]
    pub fn scheduler(&self) -> CleanupScheduler {
        self.scheduler.clone()
    }

    /// Number of deletions scheduled but not yet finished.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.scheduler.pending.get()
    }

    /// Wait until every scheduled deletion has run.
    pub async fn wait_idle(&self) {
        let pending = &self.scheduler.pending;
        loop {
            let notified = pending.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if pending.get() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Stop the worker, deleting everything still scheduled without waiting
    /// for the grace delay.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        if let Err(e) = self.worker.await {
            warn!(error = %e, "Cleanup worker did not stop cleanly");
        }
    }
}

struct CleanupWorker {
    rx: mpsc::UnboundedReceiver<String>,
    storage: Arc<StorageService>,
    claims: Arc<ClaimRegistry>,
    delay: Duration,
    pending: Arc<Pending>,
    scheduled: HashMap<String, Key>,
    delays: DelayQueue<String>,
}

impl CleanupWorker {
    async fn run(mut self, shutdown: CancellationToken) {
        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                msg = self.rx.recv() => match msg {
                    Some(identifier) => self.enqueue(identifier),
                    None => break,
                },
                Some(expired) = self.delays.next(), if !self.delays.is_empty() => {
                    let identifier = expired.into_inner();
                    self.scheduled.remove(&identifier);
                    self.remove(&identifier).await;
                }
            }
        }

        self.drain().await;
    }

    fn enqueue(&mut self, identifier: String) {
        if self.scheduled.contains_key(&identifier) {
            // Already on its way out.
            self.pending.done();
            return;
        }
        let key = self.delays.insert(identifier.clone(), self.delay);
        self.scheduled.insert(identifier, key);
    }

    async fn drain(&mut self) {
        self.rx.close();
        while let Ok(identifier) = self.rx.try_recv() {
            self.enqueue(identifier);
        }

        let scheduled: Vec<(String, Key)> = self.scheduled.drain().collect();
        for (identifier, key) in scheduled {
            self.delays.remove(&key);
            self.remove(&identifier).await;
        }
    }

    async fn remove(&self, identifier: &str) {
        match self.storage.delete(identifier).await {
            Ok(()) => debug!(identifier = %identifier, "Delivered object deleted"),
            Err(e) => debug!(identifier = %identifier, error = %e, "Ignoring cleanup failure"),
        }
        self.claims.release(identifier);
        self.pending.done();
    }
}
