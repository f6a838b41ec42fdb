//! Text fields of a page form and their input listeners.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;

/// Read access to the current value of elements by id.
pub trait FieldValues: Send + Sync {
    /// Current text of the element, empty if there is no such element.
    fn value(&self, element_id: &str) -> String;
}

/// Callback run on every input event of an element, with the new value.
pub type InputListener = Arc<dyn Fn(&str) + Send + Sync>;

/// Identifies a registered listener so it can be removed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
struct FormInner {
    values: HashMap<String, String>,
    listeners: HashMap<String, Vec<(ListenerId, InputListener)>>,
    next_listener: u64,
}

/// A set of text fields keyed by element id.
///
/// Cheap to clone; clones share the same fields and listeners.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use training_lib::form::{FieldValues, Form};
///
/// let form = Form::new().with_value("id_email", "bob@x.com");
/// let events = Arc::new(AtomicUsize::new(0));
/// let counter = events.clone();
/// form.on_input("id_username", Arc::new(move |_: &str| {
///     counter.fetch_add(1, Ordering::SeqCst);
/// }));
///
/// form.set_value("id_username", "bob");
/// assert_eq!(form.value("id_username"), "bob");
/// assert_eq!(events.load(Ordering::SeqCst), 1);
/// ```
#[derive(Clone, Default)]
pub struct Form {
    inner: Arc<RwLock<FormInner>>,
}

impl Form {
    /// Creates an empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an initial value without firing input events.
    pub fn with_value(self, element_id: impl Into<String>, value: impl Into<String>) -> Self {
        if let Ok(mut guard) = self.inner.write() {
            guard.values.insert(element_id.into(), value.into());
        }
        self
    }

    /// Registers a listener for input events on an element.
    ///
    /// Registering the same listener twice runs it twice.
    pub fn on_input(&self, element_id: impl Into<String>, listener: InputListener) -> ListenerId {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let id = ListenerId(guard.next_listener);
        guard.next_listener += 1;
        guard.listeners.entry(element_id.into()).or_default().push((id, listener));
        id
    }

    /// Removes a listener. Returns `false` if it was not registered on the element.
    pub fn remove_listener(&self, element_id: &str, id: ListenerId) -> bool {
        let Ok(mut guard) = self.inner.write() else {
            return false;
        };
        let Some(listeners) = guard.listeners.get_mut(element_id) else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|(registered, _)| *registered != id);
        let removed = listeners.len() != before;
        if listeners.is_empty() {
            guard.listeners.remove(element_id);
        }
        removed
    }

    /// Number of listeners registered on an element.
    pub fn listener_count(&self, element_id: &str) -> usize {
        self.inner
            .read()
            .map(|guard| guard.listeners.get(element_id).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    /// Replaces the text of an element and fires its input event.
    pub fn set_value(&self, element_id: &str, value: impl Into<String>) {
        let value = value.into();
        let listeners = match self.inner.write() {
            Ok(mut guard) => {
                guard.values.insert(element_id.to_string(), value.clone());
                guard
                    .listeners
                    .get(element_id)
                    .map(|listeners| listeners.iter().map(|(_, listener)| Arc::clone(listener)).collect::<Vec<_>>())
                    .unwrap_or_default()
            }
            Err(_) => return,
        };

        // Listeners read other fields, so the lock must be released first.
        for listener in listeners {
            listener(&value);
        }
    }

    /// Empties an element and fires its input event.
    pub fn clear(&self, element_id: &str) {
        self.set_value(element_id, String::new());
    }
}

impl FieldValues for Form {
    fn value(&self, element_id: &str) -> String {
        self.inner
            .read()
            .ok()
            .and_then(|guard| guard.values.get(element_id).cloned())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for Form {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut debug = f.debug_struct("Form");
        if let Ok(guard) = self.inner.read() {
            debug.field("values", &guard.values);
        }
        debug.finish_non_exhaustive()
    }
}
