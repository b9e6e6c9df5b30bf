/// Observer registry with copy-on-write fan-out
///
/// Every controller owns one `ObserverSet` per concern. The live list is an
/// `Rc<Vec<_>>` that is replaced, never mutated in place, so a notification
/// pass keeps iterating its own snapshot while observers attach or detach
/// each other from inside their callbacks.
use crate::error::{Result, UiError};
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use tracing::{debug, error};

pub struct ObserverSet<T: ?Sized> {
    name: &'static str,
    /// `None` once torn down
    live: RefCell<Option<Rc<Vec<Rc<T>>>>>,
}

fn same_observer<T: ?Sized>(a: &Rc<T>, b: &Rc<T>) -> bool {
    // Thin-pointer comparison; vtable pointers for the same type may differ
    // between codegen units.
    Rc::as_ptr(a).cast::<()>() == Rc::as_ptr(b).cast::<()>()
}

impl<T: ?Sized> ObserverSet<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            live: RefCell::new(Some(Rc::new(Vec::new()))),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Fails fast when the owning controller has been torn down.
    pub fn verify_lifecycle(&self) -> Result<()> {
        if self.live.borrow().is_none() {
            return Err(UiError::TornDown(self.name));
        }
        Ok(())
    }

    pub fn is_torn_down(&self) -> bool {
        self.live.borrow().is_none()
    }

    /// Returns false if the observer was already registered.
    pub fn add(&self, observer: Rc<T>) -> Result<bool> {
        let mut live = self.live.borrow_mut();
        let current = live.as_ref().ok_or(UiError::TornDown(self.name))?;
        if current.iter().any(|o| same_observer(o, &observer)) {
            return Ok(false);
        }
        let mut next = Vec::with_capacity(current.len() + 1);
        next.extend(current.iter().cloned());
        next.push(observer);
        *live = Some(Rc::new(next));
        debug!("{}: observer added", self.name);
        Ok(true)
    }

    /// Returns false if the observer was not registered.
    pub fn remove(&self, observer: &Rc<T>) -> Result<bool> {
        let mut live = self.live.borrow_mut();
        let current = live.as_ref().ok_or(UiError::TornDown(self.name))?;
        if !current.iter().any(|o| same_observer(o, observer)) {
            return Ok(false);
        }
        let next: Vec<Rc<T>> = current
            .iter()
            .filter(|o| !same_observer(o, observer))
            .cloned()
            .collect();
        *live = Some(Rc::new(next));
        debug!("{}: observer removed", self.name);
        Ok(true)
    }

    pub fn contains(&self, observer: &Rc<T>) -> bool {
        self.live
            .borrow()
            .as_ref()
            .map(|current| current.iter().any(|o| same_observer(o, observer)))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.live.borrow().as_ref().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invokes `event` for every observer in a snapshot of the live set and
    /// returns how many were notified.
    ///
    /// An observer removed earlier in the same pass is skipped. One added
    /// during the pass is first notified on the next pass. A panicking
    /// observer is logged and the remaining observers are still notified.
    pub fn notify_all<F>(&self, mut event: F) -> Result<usize>
    where
        F: FnMut(&T),
    {
        let snapshot = {
            let live = self.live.borrow();
            live.as_ref().ok_or(UiError::TornDown(self.name))?.clone()
        };

        let mut delivered = 0;
        for observer in snapshot.iter() {
            if !self.contains(observer) {
                continue;
            }
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| event(observer.as_ref())));
            match outcome {
                Ok(()) => delivered += 1,
                Err(_) => error!("{}: observer panicked during notification", self.name),
            }
        }
        Ok(delivered)
    }

    /// Drops every observer and makes the set inert.
    pub fn tear_down(&self) {
        if self.live.borrow_mut().take().is_some() {
            debug!("{}: torn down", self.name);
        }
    }
}
