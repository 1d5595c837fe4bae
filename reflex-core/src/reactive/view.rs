//! Reactive Views
//!
//! A [`Reactive`] is the interception layer over one raw [`Object`] target.
//! Every property access through the view funnels through tracking or
//! notification before performing the default operation on the target:
//!
//! | Operation | Default operation      | Side channel                        |
//! |-----------|------------------------|-------------------------------------|
//! | `get`     | read the property      | track `Get`, wrap nested (deep)     |
//! | `set`     | write the property     | trigger `Set`, always               |
//! | `has`     | check for the property | track `Has`                         |
//! | `delete`  | remove the property    | trigger `Delete` if it existed      |
//!
//! Writes trigger even when the new value equals the old one.
//!
//! # Modes
//!
//! A deep view wraps raw objects it reads out of the target, so nested state
//! is reactive too. A shallow view returns nested objects as-is. Both modes
//! share set/has/delete.
//!
//! # Flags
//!
//! Two synthetic keys answer without touching the target: see
//! [`ReactiveFlags`].
//!
//! Views are only created through the registry (`reactive`,
//! `shallow_reactive`), which keeps them unique per target and mode.

use std::fmt;
use std::rc::{Rc, Weak};

use super::registry;
use super::runtime::{Key, OpType, Runtime};
use crate::value::{Object, Value};

/// Synthetic property keys answered by every view.
pub struct ReactiveFlags;

impl ReactiveFlags {
    /// Always reads as `true` through a view.
    pub const IS_REACTIVE: &'static str = "__v_isReactive";

    /// Reads as the raw target through a registered view.
    pub const RAW: &'static str = "__v_isRaw";
}

/// Whether nested objects are wrapped on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WrapMode {
    Deep,
    Shallow,
}

pub(crate) struct ReactiveInner {
    target: Object,
    mode: WrapMode,
}

/// A tracked view over an object target.
///
/// Cloning shares the view. Two views are equal only if they are the same
/// view.
#[derive(Clone)]
pub struct Reactive(Rc<ReactiveInner>);

impl Reactive {
    pub(crate) fn new(target: Object, mode: WrapMode) -> Self {
        Self(Rc::new(ReactiveInner { target, mode }))
    }

    pub(crate) fn from_inner(inner: Rc<ReactiveInner>) -> Self {
        Self(inner)
    }

    pub(crate) fn downgrade(&self) -> Weak<ReactiveInner> {
        Rc::downgrade(&self.0)
    }

    pub(crate) fn target(&self) -> &Object {
        &self.0.target
    }

    /// Read a property.
    ///
    /// Tracks the read, including reads of absent properties. Under a deep
    /// view, a raw object result is returned as its deep view.
    pub fn get(&self, key: &str) -> Option<Value> {
        if key == ReactiveFlags::IS_REACTIVE {
            return Some(Value::Bool(true));
        }
        if key == ReactiveFlags::RAW && registry::is_registered(self) {
            return Some(Value::Object(self.0.target.clone()));
        }

        let result = self.0.target.get(key);
        Runtime::track(&self.0.target, OpType::Get, &Key::prop(key));

        match result {
            Some(Value::Object(nested)) if self.0.mode == WrapMode::Deep => {
                Some(Value::Reactive(registry::reactive_object(&nested)))
            }
            other => other,
        }
    }

    /// Write a property and re-run everything that read it.
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        let key: Rc<str> = Rc::from(key);
        self.0.target.insert(Rc::clone(&key), value);
        Runtime::trigger(&self.0.target, OpType::Set, &Key::Prop(key));
    }

    /// Check whether a property exists, tracking the check.
    pub fn has(&self, key: &str) -> bool {
        let result = self.0.target.contains_key(key);
        Runtime::track(&self.0.target, OpType::Has, &Key::prop(key));
        result
    }

    /// Remove a property. Dependents re-run only if the property existed.
    ///
    /// Returns whether the property existed.
    pub fn delete(&self, key: &str) -> bool {
        let had_key = self.0.target.contains_key(key);
        let removed = self.0.target.remove(key).is_some();
        if removed && had_key {
            Runtime::trigger(&self.0.target, OpType::Delete, &Key::prop(key));
        }
        had_key
    }

    /// Property names of the target, untracked.
    pub fn keys(&self) -> Vec<Rc<str>> {
        self.0.target.keys()
    }

    /// Number of properties on the target, untracked.
    pub fn len(&self) -> usize {
        self.0.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.target.is_empty()
    }

    pub fn mode(&self) -> WrapMode {
        self.0.mode
    }

    pub fn is_shallow(&self) -> bool {
        self.0.mode == WrapMode::Shallow
    }

    /// Whether two handles are the same view.
    pub fn ptr_eq(&self, other: &Reactive) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Reactive {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Reactive {}

impl fmt::Debug for Reactive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reactive")
            .field("mode", &self.0.mode)
            .field("target", &self.0.target)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use crate::reactive::{effect, reactive_object, shallow_reactive_object, EffectOptions};

    fn nested_target() -> Object {
        let inner: Object = [("x", 1)].into_iter().collect();
        [("a", Value::Int(1)), ("inner", Value::Object(inner))]
            .into_iter()
            .collect()
    }

    #[test]
    fn flags_answer_without_tracking() {
        let target = nested_target();
        let view = reactive_object(&target);

        assert_eq!(view.get(ReactiveFlags::IS_REACTIVE), Some(Value::Bool(true)));
        assert_eq!(view.get(ReactiveFlags::RAW), Some(Value::Object(target.clone())));
        assert_eq!(view.get("__v_isRaw"), Some(Value::Object(target.clone())));
        assert_eq!(Runtime::dependent_count(&target, &Key::prop(ReactiveFlags::RAW)), 0);
    }

    #[test]
    fn deep_view_wraps_nested_objects() {
        let view = reactive_object(&nested_target());

        let inner = view.get("inner").expect("inner exists");
        assert!(matches!(inner, Value::Reactive(_)));

        // Same nested target, same view
        assert_eq!(view.get("inner"), Some(inner));
    }

    #[test]
    fn shallow_view_returns_nested_raw() {
        let view = shallow_reactive_object(&nested_target());

        assert!(view.is_shallow());
        assert!(matches!(view.get("inner"), Some(Value::Object(_))));
    }

    #[test]
    fn shallow_view_triggers_on_set_and_delete() {
        let target = nested_target();
        let view = shallow_reactive_object(&target);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let (reader, log) = (view.clone(), seen.clone());
        let _runner = effect(
            move || log.borrow_mut().push(reader.get("a")),
            EffectOptions::default(),
        );
        assert_eq!(Runtime::dependent_count(&target, &Key::prop("a")), 1);

        view.set("a", 2);
        view.delete("a");
        assert_eq!(*seen.borrow(), vec![Some(Value::Int(1)), Some(Value::Int(2)), None]);
    }

    #[test]
    fn set_triggers_even_when_unchanged() {
        let view = reactive_object(&nested_target());
        let seen = Rc::new(RefCell::new(Vec::new()));

        let (reader, log) = (view.clone(), seen.clone());
        let _runner = effect(
            move || log.borrow_mut().push(reader.get("a")),
            EffectOptions::default(),
        );

        view.set("a", 1);
        view.set("a", 1);
        assert_eq!(seen.borrow().len(), 3);
    }

    #[test]
    fn has_is_tracked() {
        let target = Object::new();
        let view = reactive_object(&target);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let (reader, log) = (view.clone(), seen.clone());
        let _runner = effect(
            move || log.borrow_mut().push(reader.has("flag")),
            EffectOptions::default(),
        );
        assert_eq!(Runtime::dependent_count(&target, &Key::prop("flag")), 1);

        view.set("flag", true);
        assert_eq!(*seen.borrow(), vec![false, true]);
    }

    #[test]
    fn delete_triggers_only_existing_keys() {
        let view = reactive_object(&nested_target());
        let runs = Rc::new(RefCell::new(0));

        let (reader, counter) = (view.clone(), runs.clone());
        let _runner = effect(
            move || {
                reader.get("a");
                reader.get("missing");
                *counter.borrow_mut() += 1;
            },
            EffectOptions::default(),
        );

        assert!(!view.delete("missing"));
        assert_eq!(*runs.borrow(), 1);

        assert!(view.delete("a"));
        assert_eq!(*runs.borrow(), 2);
        assert!(!view.has("a"));
    }

    #[test]
    fn untracked_helpers_do_not_subscribe() {
        let target = nested_target();
        let view = reactive_object(&target);

        let reader = view.clone();
        let _runner = effect(
            move || {
                reader.keys();
                reader.len();
            },
            EffectOptions::default(),
        );

        assert_eq!(view.len(), 2);
        assert_eq!(Runtime::dependent_count(&target, &Key::prop("a")), 0);
    }
}
