use crate::error::ContentError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cancellation handle threaded through every level of a build.
///
/// Clones share the same flag. Creates that are already in flight finish on
/// their own; nothing new is issued once the flag is set.
#[derive(Debug, Clone, Default)]
pub struct BuildContext {
    cancelled: Arc<AtomicBool>,
}

impl BuildContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn ensure_active(&self) -> Result<(), ContentError> {
        if self.is_cancelled() {
            Err(ContentError::Cancelled)
        } else {
            Ok(())
        }
    }
}
