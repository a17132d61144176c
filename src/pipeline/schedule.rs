//! Periodic task timing plus a cooperative stop signal.

use std::time::Duration;

use rand::Rng;
use tokio::sync::watch;

/// Pause between runs of a periodic task: `interval` plus a uniform random
/// extra in `[0, jitter]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub interval: Duration,
    pub jitter: Duration,
}

impl Schedule {
    pub fn new(interval: Duration, jitter: Duration) -> Self {
        Self { interval, jitter }
    }

    pub fn fixed(interval: Duration) -> Self {
        Self::new(interval, Duration::ZERO)
    }

    pub fn next_delay(&self) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return self.interval;
        }
        let extra = rand::thread_rng().gen_range(0..=jitter_ms);
        self.interval + Duration::from_millis(extra)
    }
}

/// Owner side of the stop signal. Dropping it also stops the listeners.
#[derive(Debug)]
pub struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

/// Listener side, cheap to clone into every loop that must stop.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

pub fn shutdown_channel() -> (ShutdownHandle, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (ShutdownHandle { tx }, ShutdownSignal { rx })
}

impl ShutdownHandle {
    pub fn trigger(&self) {
        // No listeners left is fine: nobody needs stopping.
        let _ = self.tx.send(true);
    }
}

impl ShutdownSignal {
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Sleep for `delay`. Returns `true` if the signal fired first.
    pub async fn sleep_or_stop(&mut self, delay: Duration) -> bool {
        if self.is_triggered() {
            return true;
        }
        tokio::select! {
            _ = tokio::time::sleep(delay) => false,
            changed = self.rx.changed() => {
                // Err means the handle was dropped, which also means stop.
                changed.is_err() || *self.rx.borrow()
            }
        }
    }
}
