use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, MutexGuard};

/// Gives exclusive access to a resource that must not be used by two tasks at once.
///
/// Waiting tasks are admitted in the order they called [`RenderGate::acquire`]. Access is released
/// when the returned [`RenderPermit`] is dropped, whatever way the holder leaves its scope.
pub struct RenderGate<T> {
    inner: Mutex<T>,
    busy: AtomicBool,
}

impl<T> RenderGate<T> {
    /// Creates a new gate owning the resource.
    pub fn new(resource: T) -> Self {
        Self {
            inner: Mutex::new(resource),
            busy: AtomicBool::new(false),
        }
    }

    /// Waits until no other permit is alive and takes one.
    pub async fn acquire(&self) -> RenderPermit<'_, T> {
        if self.is_busy() {
            log::trace!("Render gate is busy, waiting");
        }

        let guard = self.inner.lock().await;
        self.busy.store(true, Ordering::Release);
        log::trace!("Render gate acquired");

        RenderPermit { guard, gate: self }
    }

    /// Returns true if a permit is currently held.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Returns the resource, bypassing the gate.
    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}

/// Exclusive access to the resource of a [`RenderGate`].
pub struct RenderPermit<'a, T> {
    guard: MutexGuard<'a, T>,
    gate: &'a RenderGate<T>,
}

impl<T> Deref for RenderPermit<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> DerefMut for RenderPermit<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

impl<T> Drop for RenderPermit<'_, T> {
    fn drop(&mut self) {
        // The mutex guard is released right after this, so a waiting task may only observe
        // `busy == false` for the short moment before it stores `true` itself.
        self.gate.busy.store(false, Ordering::Release);
        log::trace!("Render gate released");
    }
}
