//! Active concurrency slot held by an admitted request.
//!
//! Settlement releases the slot explicitly and re-runs admission inline. If
//! the running task is dropped instead (panic, runtime shutdown), the slot is
//! freed in `Drop` and admission is handed to a fresh task, so a spawn the
//! runtime refuses can never recurse back into another slot release.

use std::sync::Arc;

use tokio::runtime::Handle;

use super::Shared;

/// RAII guard for one occupied concurrency slot.
pub(crate) struct ActiveSlot {
    shared: Option<Arc<Shared>>,
}

impl ActiveSlot {
    /// Wrap a slot that admission has already counted as active.
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self {
            shared: Some(shared),
        }
    }

    /// Free the slot after settlement and admit the next waiting request.
    pub(crate) fn release(mut self) {
        if let Some(shared) = self.shared.take() {
            shared.release_slot();
            match Handle::try_current() {
                Ok(handle) => super::admit(&shared, &handle),
                Err(_) => tracing::debug!("runtime gone; skipping admission on slot release"),
            }
        }
    }
}

impl Drop for ActiveSlot {
    fn drop(&mut self) {
        let Some(shared) = self.shared.take() else {
            return;
        };
        shared.release_slot();
        if let Ok(handle) = Handle::try_current() {
            let admit_on = handle.clone();
            handle.spawn(async move {
                super::admit(&shared, &admit_on);
            });
        }
    }
}
