//! Synchronous notifications raised while patching.
//!
//! Listeners are owned by one [`Patcher`](crate::Patcher) and run in
//! registration order during the call that triggers them.

use crate::platform::Platform;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A platform no longer needs special-casing by later steps
    PlatformDisabled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchEvent {
    PlatformDisabled(Platform),
}

impl PatchEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            PatchEvent::PlatformDisabled(_) => EventKind::PlatformDisabled,
        }
    }
}

/// Handle returned by [`EventBus::on`], used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Callback = Box<dyn FnMut(&PatchEvent)>;

struct Listener {
    id: ListenerId,
    kind: EventKind,
    callback: Callback,
}

#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    listeners: Vec<Listener>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(&mut self, kind: EventKind, callback: F) -> ListenerId
    where
        F: FnMut(&PatchEvent) + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push(Listener {
            id,
            kind,
            callback: Box::new(callback),
        });
        id
    }

    /// Remove a listener. Returns `false` if it was already gone.
    pub fn off(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|listener| listener.id != id);
        self.listeners.len() != before
    }

    pub fn emit(&mut self, event: &PatchEvent) {
        let kind = event.kind();
        tracing::debug!(?event, "emitting");
        for listener in self.listeners.iter_mut().filter(|l| l.kind == kind) {
            (listener.callback)(event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_delivery_in_registration_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        for tag in ["first", "second"] {
            let seen = Rc::clone(&seen);
            bus.on(EventKind::PlatformDisabled, move |event| {
                seen.borrow_mut().push((tag, event.clone()));
            });
        }

        bus.emit(&PatchEvent::PlatformDisabled(Platform::Electron));

        assert_eq!(
            *seen.borrow(),
            vec![
                ("first", PatchEvent::PlatformDisabled(Platform::Electron)),
                ("second", PatchEvent::PlatformDisabled(Platform::Electron)),
            ]
        );
    }

    #[test]
    fn test_off_removes_listener() {
        let count = Rc::new(RefCell::new(0));
        let mut bus = EventBus::new();
        let counter = Rc::clone(&count);
        let id = bus.on(EventKind::PlatformDisabled, move |_| *counter.borrow_mut() += 1);

        assert!(bus.off(id));
        assert!(!bus.off(id));
        bus.emit(&PatchEvent::PlatformDisabled(Platform::Electron));

        assert_eq!(*count.borrow(), 0);
        assert!(bus.is_empty());
    }
}
