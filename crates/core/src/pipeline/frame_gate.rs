//! Single-slot hand-off between a frame producer and the annotation loop.
//!
//! The producer never blocks: if the consumer is still busy with an earlier
//! frame, the pending one is replaced by the newest, and the replaced frame
//! is counted as dropped. At most one frame waits at any time.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};

use crate::shared::observation::FrameObservations;

/// Creates a connected producer/consumer pair.
pub fn frame_gate() -> (FrameSender, FrameReceiver) {
    let (tx, rx) = crossbeam_channel::bounded(1);
    let dropped = Arc::new(AtomicU64::new(0));
    let closed = Arc::new(AtomicBool::new(false));
    (
        FrameSender {
            tx,
            rx: rx.clone(),
            dropped: dropped.clone(),
            closed: closed.clone(),
        },
        FrameReceiver { rx, dropped, closed },
    )
}

#[derive(Clone)]
pub struct FrameSender {
    tx: Sender<FrameObservations>,
    // Lets the producer evict the stale pending frame.
    rx: Receiver<FrameObservations>,
    dropped: Arc<AtomicU64>,
    closed: Arc<AtomicBool>,
}

impl FrameSender {
    /// Offers a frame without blocking. Returns `false` once the consumer
    /// is gone.
    pub fn offer(&self, frame: FrameObservations) -> bool {
        if self.closed.load(Ordering::Acquire) {
            return false;
        }
        let mut frame = frame;
        loop {
            match self.tx.try_send(frame) {
                Ok(()) => return true,
                Err(TrySendError::Disconnected(_)) => return false,
                Err(TrySendError::Full(rejected)) => {
                    if let Ok(stale) = self.rx.try_recv() {
                        self.dropped.fetch_add(1, Ordering::Relaxed);
                        log::trace!("frame {} superseded before processing", stale.sequence);
                    }
                    frame = rejected;
                }
            }
        }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

pub struct FrameReceiver {
    rx: Receiver<FrameObservations>,
    dropped: Arc<AtomicU64>,
    closed: Arc<AtomicBool>,
}

impl FrameReceiver {
    /// Blocks for the next frame. `None` once every sender is dropped and
    /// the slot is empty.
    pub fn recv(&self) -> Option<FrameObservations> {
        self.rx.recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<FrameObservations> {
        match self.rx.recv_timeout(timeout) {
            Ok(frame) => Some(frame),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn try_recv(&self) -> Option<FrameObservations> {
        self.rx.try_recv().ok()
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Drop for FrameReceiver {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::Release);
    }
}

impl Iterator for FrameReceiver {
    type Item = FrameObservations;

    fn next(&mut self) -> Option<Self::Item> {
        self.recv()
    }
}
