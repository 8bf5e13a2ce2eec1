// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Cancel-and-reschedule single-shot timer.
//!
//! Every [`Debouncer::schedule`] replaces the pending run, so a burst of calls
//! results in exactly one run, `delay` after the last call. A run that has
//! already woken up is detached from the debouncer before it starts, so
//! rescheduling never cancels work that is in flight.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::error::KeenError;

/// Lock a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
struct Pending {
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

/// Debounced single-shot task runner.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Arc<Mutex<Pending>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Arc::new(Mutex::new(Pending::default())),
        }
    }

    /// The quiet period before a scheduled task runs.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `task` once `delay` has passed without another call to `schedule`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F, Fut>(&self, task: F) -> Result<(), KeenError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| KeenError::NoRuntime("schedule a flush"))?;

        let mut pending = lock(&self.pending);
        if let Some(previous) = pending.handle.take() {
            previous.abort();
        }
        pending.generation += 1;

        let generation = pending.generation;
        let slot = Arc::clone(&self.pending);
        let delay = self.delay;

        pending.handle = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut pending = lock(&slot);
                if pending.generation != generation {
                    return;
                }
                pending.handle = None;
            }
            task().await;
        }));

        Ok(())
    }

    /// Drop the pending run, if any. Returns whether one was pending.
    pub fn cancel(&self) -> bool {
        let mut pending = lock(&self.pending);
        pending.generation += 1;
        match pending.handle.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Whether a run is scheduled and has not fired yet.
    pub fn is_pending(&self) -> bool {
        lock(&self.pending).handle.is_some()
    }
}
