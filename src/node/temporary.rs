//! Access-counted leaf values backing temporary secrets.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// A leaf value that may be read a bounded number of times.
///
/// Each successful [`take`](Self::take) decrements the budget; once it is
/// spent the inner string is dropped, so the plain text can be reclaimed,
/// and every later read yields nothing. Clones of the owning leaf share
/// the same budget.
#[derive(Debug)]
pub struct TemporaryValue {
    remaining: AtomicUsize,
    inner: Mutex<Option<String>>,
}

impl TemporaryValue {
    /// Wrap `value` with a budget of `access_count` reads.
    #[must_use]
    pub fn new(value: String, access_count: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(access_count),
            inner: Mutex::new(Some(value)),
        }
    }

    /// Read the value, spending one unit of budget.
    ///
    /// Returns `None` once the budget is exhausted; the first exhausted
    /// read drops the inner string.
    #[must_use]
    pub fn take(&self) -> Option<String> {
        let mut current = self.remaining.load(Ordering::Acquire);
        while current > 0 {
            match self.remaining.compare_exchange_weak(
                current,
                current - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return self.lock_inner().clone(),
                Err(observed) => current = observed,
            }
        }
        self.lock_inner().take();
        None
    }

    /// Read the value without spending budget. Used for rendering and
    /// equality, never for decoding.
    #[must_use]
    pub fn peek(&self) -> Option<String> {
        if self.remaining.load(Ordering::Acquire) == 0 {
            return None;
        }
        self.lock_inner().clone()
    }

    /// Reads left before the value is dropped.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }

    fn lock_inner(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::TemporaryValue;

    #[test]
    fn yields_value_until_budget_is_spent() {
        let cell = TemporaryValue::new("s3cret".into(), 2);
        assert_eq!(cell.take().as_deref(), Some("s3cret"));
        assert_eq!(cell.take().as_deref(), Some("s3cret"));
        assert_eq!(cell.take(), None);
        assert_eq!(cell.take(), None);
    }

    #[test]
    fn exhaustion_drops_the_inner_string() {
        let cell = TemporaryValue::new("s3cret".into(), 1);
        let _ = cell.take();
        let _ = cell.take();
        assert_eq!(cell.peek(), None);
        assert!(cell.inner.lock().unwrap().is_none());
    }

    #[test]
    fn peek_does_not_spend_budget() {
        let cell = TemporaryValue::new("s3cret".into(), 1);
        assert_eq!(cell.peek().as_deref(), Some("s3cret"));
        assert_eq!(cell.remaining(), 1);
        assert_eq!(cell.take().as_deref(), Some("s3cret"));
    }
}
