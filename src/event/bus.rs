use std::cell::RefCell;

use crate::event::{EditorEvent, EventHandler};

/// A simple event bus for broadcasting editor events to registered handlers
pub struct EventBus {
    handlers: RefCell<Vec<Box<dyn EventHandler>>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &format!("<{} handlers>", self.handlers.borrow().len()))
            .finish()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Creates a new event bus
    pub fn new() -> Self {
        Self {
            handlers: RefCell::new(Vec::new()),
        }
    }

    /// Subscribe a handler to receive events
    pub fn subscribe(&self, handler: Box<dyn EventHandler>) {
        self.handlers.borrow_mut().push(handler);
    }

    /// Emit an event to all registered handlers
    pub fn emit(&self, event: EditorEvent) {
        log::trace!("editor event: {:?}", event);
        for handler in &mut *self.handlers.borrow_mut() {
            handler.handle_event(&event);
        }
    }

    /// Drops every handler. Used when the owning screen is torn down.
    pub fn clear(&self) {
        self.handlers.borrow_mut().clear();
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn closures_receive_events_in_order() {
        let bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        bus.subscribe(Box::new(move |event: &EditorEvent| {
            sink.borrow_mut().push(event.clone());
        }));

        bus.emit(EditorEvent::Ready);
        bus.emit(EditorEvent::Rendered);

        assert_eq!(*seen.borrow(), vec![EditorEvent::Ready, EditorEvent::Rendered]);
    }

    #[test]
    fn clear_drops_handlers() {
        let bus = EventBus::new();
        bus.subscribe(Box::new(|_: &EditorEvent| {}));
        assert_eq!(bus.handler_count(), 1);
        bus.clear();
        assert_eq!(bus.handler_count(), 0);
    }
}
