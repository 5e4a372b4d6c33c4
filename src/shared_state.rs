//! Key/value state shared by a control's panel and its canvas overlay.
//!
//! One instance lives for exactly one control activation. Both halves hold a clone
//! (the values are shared), and `dispose` drops every subscriber when the activation
//! ends.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{Map, Value};

pub type SharedValues = Map<String, Value>;
pub type SubscriptionId = usize;

type Listener = Box<dyn FnMut(&SharedValues)>;

#[derive(Default)]
struct Inner {
    values: SharedValues,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: SubscriptionId,
    disposed: bool,
}

#[derive(Clone, Default)]
pub struct SharedState {
    inner: Rc<RefCell<Inner>>,
}

impl std::fmt::Debug for SharedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("SharedState")
            .field("values", &inner.values)
            .field("listeners", &format!("<{} listeners>", inner.listeners.len()))
            .field("disposed", &inner.disposed)
            .finish()
    }
}

impl SharedState {
    pub fn new(values: SharedValues) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                values,
                ..Default::default()
            })),
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.borrow().values.get(key).cloned()
    }

    pub fn get_f32(&self, key: &str) -> Option<f32> {
        self.get(key).and_then(|v| v.as_f64()).map(|v| v as f32)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.as_bool())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get(key).and_then(|v| v.as_str().map(str::to_owned))
    }

    pub fn values(&self) -> SharedValues {
        self.inner.borrow().values.clone()
    }

    /// Shallow-merges `partial`; subscribers see the changed keys unless `broadcast` is off.
    pub fn set(&self, partial: SharedValues, broadcast: bool) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.disposed {
                log::debug!("shared state set after dispose, ignoring");
                return;
            }
            for (key, value) in partial.clone() {
                inner.values.insert(key, value);
            }
        }

        if broadcast {
            self.notify(&partial);
        }
    }

    /// Sets a single key and broadcasts it
    pub fn set_value(&self, key: &str, value: Value) {
        let mut partial = SharedValues::new();
        partial.insert(key.to_owned(), value);
        self.set(partial, true);
    }

    pub fn subscribe(&self, listener: impl FnMut(&SharedValues) + 'static) -> SubscriptionId {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.borrow_mut().listeners.retain(|(listener_id, _)| *listener_id != id);
    }

    /// Ends the activation: drops every subscriber and refuses further writes
    pub fn dispose(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.listeners.clear();
        inner.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.borrow().disposed
    }

    // Listeners may read the state again, so they run without the borrow held.
    fn notify(&self, changed: &SharedValues) {
        let mut listeners = std::mem::take(&mut self.inner.borrow_mut().listeners);
        for (_, listener) in &mut listeners {
            listener(changed);
        }

        let mut inner = self.inner.borrow_mut();
        if inner.disposed {
            return;
        }
        let added = std::mem::take(&mut inner.listeners);
        listeners.extend(added);
        inner.listeners = listeners;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn values(pairs: &[(&str, Value)]) -> SharedValues {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn set_merges_and_notifies_changed_keys() {
        let state = SharedState::new(values(&[("ratio", json!("free")), ("size", json!(3))]));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        state.subscribe(move |changed| sink.borrow_mut().push(changed.clone()));

        state.set(values(&[("size", json!(5))]), true);

        assert_eq!(state.get("ratio"), Some(json!("free")));
        assert_eq!(state.get_f32("size"), Some(5.0));
        assert_eq!(*seen.borrow(), vec![values(&[("size", json!(5))])]);
    }

    #[test]
    fn silent_set_skips_listeners() {
        let state = SharedState::default();
        let calls = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&calls);
        state.subscribe(move |_| *counter.borrow_mut() += 1);

        state.set(values(&[("a", json!(1))]), false);

        assert_eq!(*calls.borrow(), 0);
        assert_eq!(state.get("a"), Some(json!(1)));
    }

    #[test]
    fn listeners_can_read_back() {
        let state = SharedState::default();
        let reader = state.clone();
        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        state.subscribe(move |_| *sink.borrow_mut() = reader.get("color"));

        state.set_value("color", json!("#fff"));

        assert_eq!(*seen.borrow(), Some(json!("#fff")));
    }

    #[test]
    fn dispose_drops_listeners_and_writes() {
        let state = SharedState::default();
        let calls = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&calls);
        let id = state.subscribe(move |_| *counter.borrow_mut() += 1);
        state.set_value("a", json!(1));
        state.unsubscribe(id);
        state.set_value("a", json!(2));
        assert_eq!(*calls.borrow(), 1);

        state.dispose();
        state.set_value("a", json!(3));
        assert!(state.is_disposed());
        assert_eq!(state.get("a"), Some(json!(2)));
    }
}
