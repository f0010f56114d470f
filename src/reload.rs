//! Core-reload notifications.
//!
//! Reload *triggers* (file watchers, timers, signals) live outside the
//! crate; they call [`Gestalt::reload_source`](crate::Gestalt::reload_source)
//! from their own threads. Listeners registered here are told about every
//! successfully built generation, after it is complete and before it is
//! published, so caches can clear ahead of the swap.

/// Notified once per successfully built generation.
pub trait CoreReloadListener: Send + Sync {
    /// Called with the new generation fully built but not yet visible to
    /// readers.
    fn on_core_reload(&self);
}
