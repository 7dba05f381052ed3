use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// A message that clears itself after a fixed delay.
///
/// Each `show` bumps a generation counter; a timer only clears the message it
/// was started for, so a newer message keeps its full lifetime.
#[derive(Clone)]
pub struct TransientBanner {
    current: Arc<Mutex<Option<(u64, String)>>>,
    generation: Arc<AtomicU64>,
    ttl: Duration,
}

impl TransientBanner {
    pub fn new(ttl: Duration) -> Self {
        Self {
            current: Arc::new(Mutex::new(None)),
            generation: Arc::new(AtomicU64::new(0)),
            ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<(u64, String)>> {
        self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Show a message and schedule its removal. Must run inside a tokio runtime.
    pub fn show(&self, message: impl Into<String>) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.lock() = Some((generation, message.into()));

        let current = self.current.clone();
        let ttl = self.ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            let mut slot = current.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            if matches!(slot.as_ref(), Some((shown, _)) if *shown == generation) {
                *slot = None;
            }
        });
    }

    pub fn clear(&self) {
        *self.lock() = None;
    }

    pub fn message(&self) -> Option<String> {
        self.lock().as_ref().map(|(_, message)| message.clone())
    }
}
