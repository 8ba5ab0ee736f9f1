use std::sync::{Arc, PoisonError, RwLock};

use super::Logger;

/// The process-wide logger slot.
///
/// Readers clone the `Arc` out of the lock and release it before logging, so
/// a sink that reconfigures the global logger cannot deadlock.
pub(crate) struct LoggerSlot(RwLock<Option<Arc<Logger>>>);

impl LoggerSlot {
    #[must_use]
    pub(crate) const fn new() -> Self {
        Self(RwLock::new(None))
    }

    #[inline]
    pub(crate) fn current(&self) -> Option<Arc<Logger>> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Stores `logger` unless the slot is occupied, handing it back if so.
    pub(crate) fn install(&self, logger: Logger) -> Result<(), Logger> {
        let mut guard = self.0.write().unwrap_or_else(PoisonError::into_inner);
        if guard.is_some() {
            return Err(logger);
        }
        *guard = Some(Arc::new(logger));
        Ok(())
    }

    pub(crate) fn replace(&self, logger: Logger) -> Option<Arc<Logger>> {
        self.0
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(Arc::new(logger))
    }

    pub(crate) fn take(&self) -> Option<Arc<Logger>> {
        self.0.write().unwrap_or_else(PoisonError::into_inner).take()
    }
}
