//! Single-assignment cell that can be awaited.

use tokio::sync::watch;

/// A value that is set at most once and can be awaited by any number of
/// waiters. The first `set` wins; later calls are ignored.
#[derive(Debug)]
pub struct OnceSignal<T> {
    tx: watch::Sender<Option<T>>,
}

impl<T: Clone> OnceSignal<T> {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Stores `value` if nothing was stored yet. Returns whether it was stored.
    pub fn set(&self, value: T) -> bool {
        let mut value = Some(value);
        self.tx.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = value.take();
            true
        })
    }

    /// Returns the value if it has been set.
    pub fn get(&self) -> Option<T> {
        self.tx.borrow().clone()
    }

    pub fn is_set(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Waits until the value is set. Never completes if it never is.
    pub async fn wait(&self) -> T {
        let mut rx = self.tx.subscribe();
        if let Ok(slot) = rx.wait_for(Option::is_some).await {
            if let Some(value) = slot.as_ref() {
                return value.clone();
            }
        }
        // The sender lives in `self`, so the channel cannot close while we wait.
        std::future::pending().await
    }
}

impl<T: Clone> Default for OnceSignal<T> {
    fn default() -> Self {
        Self::new()
    }
}
