use std::cell::RefCell;
use std::sync::{Arc, Mutex, RwLock, Weak};

use super::ControlSignal;
use crate::events::{ServiceEvent, ServiceEvents};
use crate::utils::sync::{lock_or_recover, read_or_recover, write_or_recover};

thread_local! {
    /// Buses with a delivery in progress on this thread, innermost last
    static DELIVERING: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

struct DeliveryScope {
    bus: usize,
}

impl DeliveryScope {
    fn enter(bus: usize) -> Self {
        DELIVERING.with(|active| active.borrow_mut().push(bus));
        DeliveryScope { bus }
    }

    fn active(bus: usize) -> bool {
        DELIVERING.with(|active| active.borrow().contains(&bus))
    }
}

impl Drop for DeliveryScope {
    fn drop(&mut self) {
        DELIVERING.with(|active| {
            let mut active = active.borrow_mut();
            if let Some(pos) = active.iter().rposition(|bus| *bus == self.bus) {
                active.remove(pos);
            }
        });
    }
}

#[derive(Default)]
struct Registration {
    listener: Option<Weak<dyn ServiceEvents>>,
    /// Bumped on every replacement
    generation: u64,
}

/// Single-registration publish point for control and binder events.
///
/// Holds at most one non-owning listener reference. Registering a new
/// listener silently supersedes the previous one; there is no fan-out.
/// Only the session binder mutates the slot.
pub struct ControlEventBus {
    registration: Mutex<Registration>,
    /// Held shared for the duration of a delivery so clearing the listener
    /// can wait out deliveries running on other threads.
    delivery_gate: RwLock<()>,
}

impl Default for ControlEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlEventBus {
    pub fn new() -> Self {
        Self {
            registration: Mutex::new(Registration::default()),
            delivery_gate: RwLock::new(()),
        }
    }

    /// Deliver a control signal to the registered listener, if any.
    ///
    /// Runs on the caller's thread. Without a listener the signal is dropped.
    pub fn dispatch(&self, signal: ControlSignal) {
        if !self.deliver(ServiceEvent::from(signal)) {
            log::debug!("Dropping {:?}: no listener registered", signal);
        }
    }

    pub fn has_listener(&self) -> bool {
        self.current_listener().is_some()
    }

    /// Returns false when there was nobody to deliver to.
    pub(crate) fn deliver(&self, event: ServiceEvent) -> bool {
        // Nested deliveries from this bus on this thread already hold the gate.
        let _gate = if DeliveryScope::active(self.id()) {
            None
        } else {
            Some(read_or_recover(&self.delivery_gate, "control delivery gate"))
        };

        let Some(listener) = self.current_listener() else {
            return false;
        };

        let _scope = DeliveryScope::enter(self.id());
        listener.on_event(event);
        true
    }

    /// Register `listener`, returning the new registration generation.
    pub(crate) fn replace_listener(&self, listener: &Arc<dyn ServiceEvents>) -> u64 {
        let mut slot = self.lock_registration();
        if slot.listener.as_ref().is_some_and(|old| old.strong_count() > 0) {
            log::debug!("Replacing registered event listener");
        }
        slot.listener = Some(Arc::downgrade(listener));
        slot.generation += 1;
        slot.generation
    }

    pub(crate) fn generation(&self) -> u64 {
        self.lock_registration().generation
    }

    /// Clear the listener registered at `generation` and wait for deliveries
    /// on other threads to finish.
    ///
    /// A listener registered after `generation` is kept; returns whether the
    /// slot was cleared.
    pub(crate) fn clear_listener(&self, generation: u64) -> bool {
        let cleared = {
            let mut slot = self.lock_registration();
            if slot.generation == generation {
                slot.listener = None;
                true
            } else {
                false
            }
        };

        // A listener that detaches from inside its own callback is the only
        // delivery of this bus left on this thread.
        if !DeliveryScope::active(self.id()) {
            drop(write_or_recover(&self.delivery_gate, "control delivery gate"));
        }
        cleared
    }

    fn current_listener(&self) -> Option<Arc<dyn ServiceEvents>> {
        self.lock_registration()
            .listener
            .as_ref()
            .and_then(Weak::upgrade)
    }

    fn lock_registration(&self) -> std::sync::MutexGuard<'_, Registration> {
        lock_or_recover(&self.registration, "listener slot")
    }

    fn id(&self) -> usize {
        self as *const Self as usize
    }
}
