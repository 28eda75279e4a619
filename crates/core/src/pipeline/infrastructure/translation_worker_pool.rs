use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Sender, TrySendError};

use crate::annotation::domain::annotation_aggregator::TranslationRequest;

/// Counts submitted-but-unfinished jobs so callers can wait for idle.
struct PendingJobs {
    count: Mutex<usize>,
    idle: Condvar,
}

impl PendingJobs {
    fn start(&self) {
        *lock(&self.count) += 1;
    }

    fn finish(&self) {
        let mut count = lock(&self.count);
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.idle.notify_all();
        }
    }
}

/// Fixed set of threads draining a bounded job queue.
///
/// Layout: `frame thread → [bounded queue] → N workers → handler`
///
/// `submit` never blocks the frame thread. A full queue rejects the job and
/// counts it as dropped; the caller decides whether to retry later.
pub struct TranslationWorkerPool {
    sender: Option<Sender<TranslationRequest>>,
    handles: Vec<JoinHandle<()>>,
    pending: Arc<PendingJobs>,
    dropped: AtomicU64,
}

impl TranslationWorkerPool {
    pub fn new<F>(workers: usize, queue_capacity: usize, handler: F) -> Self
    where
        F: Fn(TranslationRequest) + Send + Sync + 'static,
    {
        let (tx, rx) = crossbeam_channel::bounded::<TranslationRequest>(queue_capacity.max(1));
        let handler = Arc::new(handler);
        let pending = Arc::new(PendingJobs {
            count: Mutex::new(0),
            idle: Condvar::new(),
        });

        let handles = (0..workers.max(1))
            .map(|_| {
                let rx = rx.clone();
                let handler = handler.clone();
                let pending = pending.clone();
                std::thread::spawn(move || {
                    for job in rx {
                        let key = job.key.clone();
                        if panic::catch_unwind(AssertUnwindSafe(|| handler(job))).is_err() {
                            log::warn!("translation worker panicked on {key:?}");
                        }
                        pending.finish();
                    }
                })
            })
            .collect();

        Self {
            sender: Some(tx),
            handles,
            pending,
            dropped: AtomicU64::new(0),
        }
    }

    /// Queues a job, handing it back if the queue is full or closed.
    pub fn submit(&self, job: TranslationRequest) -> Result<(), TranslationRequest> {
        let Some(sender) = self.sender.as_ref() else {
            return Err(job);
        };
        self.pending.start();
        match sender.try_send(job) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(job)) | Err(TrySendError::Disconnected(job)) => {
                self.pending.finish();
                self.dropped.fetch_add(1, Ordering::Relaxed);
                log::warn!("translation queue full; dropping job for {:?}", job.key);
                Err(job)
            }
        }
    }

    /// Jobs queued or running.
    pub fn pending(&self) -> usize {
        *lock(&self.pending.count)
    }

    pub fn dropped_jobs(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn worker_count(&self) -> usize {
        self.handles.len()
    }

    /// Blocks until every accepted job has finished.
    pub fn wait_idle(&self) {
        let mut count = lock(&self.pending.count);
        while *count > 0 {
            count = self
                .pending
                .idle
                .wait(count)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    /// Like `wait_idle`, but gives up after `timeout`. Returns `true` if idle.
    pub fn wait_idle_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut count = lock(&self.pending.count);
        while *count > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            count = match self.pending.idle.wait_timeout(count, remaining) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
        true
    }
}

impl Drop for TranslationWorkerPool {
    fn drop(&mut self) {
        // Closing the queue lets workers drain what is left and exit.
        self.sender.take();
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                log::warn!("translation worker exited abnormally");
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
