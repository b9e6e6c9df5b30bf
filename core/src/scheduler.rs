/// Deferred UI work guarded by a liveness flag
use crate::error::{Result, UiError};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;
use tokio::task::{JoinHandle, LocalSet};
use tracing::debug;

/// Shared "is the owner still attached" flag
#[derive(Debug, Clone)]
pub struct Liveness(Rc<Cell<bool>>);

impl Liveness {
    pub fn new() -> Self {
        Self(Rc::new(Cell::new(true)))
    }

    pub fn is_alive(&self) -> bool {
        self.0.get()
    }

    pub fn kill(&self) {
        self.0.set(false);
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

/// Fire-and-forget timers on the UI thread.
///
/// Tasks go onto the `LocalSet` the scheduler was built with; the owner
/// drives that set (`run_until`). Without one, scheduling fails with
/// `UiError::NoExecutor` instead of panicking. A task whose owner was torn
/// down while it slept is skipped.
#[derive(Debug, Clone, Default)]
pub struct UiScheduler {
    liveness: Liveness,
    local: Option<Rc<LocalSet>>,
}

impl UiScheduler {
    pub fn new(liveness: Liveness) -> Self {
        Self {
            liveness,
            local: None,
        }
    }

    pub fn with_local_set(liveness: Liveness, local: Rc<LocalSet>) -> Self {
        Self {
            liveness,
            local: Some(local),
        }
    }

    pub fn liveness(&self) -> &Liveness {
        &self.liveness
    }

    pub fn has_executor(&self) -> bool {
        self.local.is_some()
    }

    /// The handle resolves to whether the task actually ran.
    pub fn post_delayed<F>(
        &self,
        label: &'static str,
        delay: Duration,
        task: F,
    ) -> Result<JoinHandle<bool>>
    where
        F: FnOnce() + 'static,
    {
        let local = self.local.as_ref().ok_or(UiError::NoExecutor(label))?;
        let liveness = self.liveness.clone();
        debug!("Scheduling '{}' in {:?}", label, delay);
        Ok(local.spawn_local(async move {
            tokio::time::sleep(delay).await;
            if !liveness.is_alive() {
                debug!("Skipping '{}': owner torn down", label);
                return false;
            }
            task();
            true
        }))
    }
}
