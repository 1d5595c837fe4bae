//! Object Identity Registry
//!
//! Maps each raw target to its view so wrapping is idempotent: wrapping the
//! same target twice in the same mode yields the same view, and identity
//! comparisons on views behave predictably. Deep and shallow views are kept
//! in separate stores, since one target may be wrapped both ways at once.
//!
//! Stores are keyed by target identity and hold views weakly. Since a view
//! owns its target, a live entry implies a live target, and the registry
//! itself keeps neither alive.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Weak;
use std::thread::LocalKey;

use tracing::debug;

use super::runtime::{TargetId, Trackable};
use super::view::{Reactive, ReactiveFlags, ReactiveInner, WrapMode};
use crate::value::{Object, Value};

/// Dead entries are swept once a store grows past this size.
const MIN_SWEEP_THRESHOLD: usize = 64;

struct ViewStore {
    views: HashMap<TargetId, Weak<ReactiveInner>>,
    sweep_at: usize,
}

impl ViewStore {
    fn new() -> Self {
        Self {
            views: HashMap::new(),
            sweep_at: MIN_SWEEP_THRESHOLD,
        }
    }

    fn lookup(&self, target: &Object) -> Option<Reactive> {
        self.views
            .get(&target.target_id())
            .and_then(Weak::upgrade)
            .map(Reactive::from_inner)
            .filter(|view| view.target().ptr_eq(target))
    }

    fn insert(&mut self, view: &Reactive) {
        if self.views.len() >= self.sweep_at {
            self.views.retain(|_, entry| entry.strong_count() > 0);
            self.sweep_at = (self.views.len() * 2).max(MIN_SWEEP_THRESHOLD);
        }
        self.views.insert(view.target().target_id(), view.downgrade());
    }

    fn holds(&self, view: &Reactive) -> bool {
        self.views
            .get(&view.target().target_id())
            .is_some_and(|registered| Weak::ptr_eq(registered, &view.downgrade()))
    }
}

thread_local! {
    static REACTIVE_MAP: RefCell<ViewStore> = RefCell::new(ViewStore::new());
    static SHALLOW_REACTIVE_MAP: RefCell<ViewStore> = RefCell::new(ViewStore::new());
}

fn store_for(mode: WrapMode) -> &'static LocalKey<RefCell<ViewStore>> {
    match mode {
        WrapMode::Deep => &REACTIVE_MAP,
        WrapMode::Shallow => &SHALLOW_REACTIVE_MAP,
    }
}

fn create_reactive_object(target: &Object, mode: WrapMode) -> Reactive {
    let store = store_for(mode);
    if let Some(existing) = store.with(|views| views.borrow().lookup(target)) {
        return existing;
    }

    let view = Reactive::new(target.clone(), mode);
    store.with(|views| views.borrow_mut().insert(&view));
    debug!(target_id = ?target.target_id(), ?mode, "created reactive view");
    view
}

/// Whether `view` is the view registered for its target, in either mode.
pub(crate) fn is_registered(view: &Reactive) -> bool {
    [WrapMode::Deep, WrapMode::Shallow]
        .into_iter()
        .any(|mode| store_for(mode).with(|views| views.borrow().holds(view)))
}

/// The deep view over `target`.
pub fn reactive_object(target: &Object) -> Reactive {
    create_reactive_object(target, WrapMode::Deep)
}

/// The shallow view over `target`.
pub fn shallow_reactive_object(target: &Object) -> Reactive {
    create_reactive_object(target, WrapMode::Shallow)
}

/// Deep-wrap a value.
///
/// Raw objects become their (cached) deep view. Everything else, including
/// views and refs, is returned unchanged.
pub fn reactive(value: impl Into<Value>) -> Value {
    match value.into() {
        Value::Object(target) => Value::Reactive(reactive_object(&target)),
        other => other,
    }
}

/// Shallow-wrap a value.
///
/// Same as [`reactive`] but nested objects read through the view are not
/// wrapped. The shallow cache is independent of the deep one.
pub fn shallow_reactive(value: impl Into<Value>) -> Value {
    match value.into() {
        Value::Object(target) => Value::Reactive(shallow_reactive_object(&target)),
        other => other,
    }
}

/// Whether `value` is a reactive view.
///
/// Only views answer the `IS_REACTIVE` flag. A raw object is never
/// reactive, whatever properties it happens to carry.
pub fn is_reactive(value: &Value) -> bool {
    match value {
        Value::Reactive(view) => view
            .get(ReactiveFlags::IS_REACTIVE)
            .is_some_and(|flag| flag.is_truthy()),
        _ => false,
    }
}

/// The raw target behind a view.
///
/// Returns `value` unchanged if it is not a view, or not a view the
/// registry recognises.
pub fn to_raw(value: &Value) -> Value {
    match value {
        Value::Reactive(view) => match view.get(ReactiveFlags::RAW) {
            Some(raw @ Value::Object(_)) => raw,
            _ => value.clone(),
        },
        _ => value.clone(),
    }
}
