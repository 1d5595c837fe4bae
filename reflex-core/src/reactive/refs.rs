//! Ref Implementation
//!
//! A [`Ref`] is a single-slot reactive box. It applies the same track and
//! trigger contract as a view property, for a standalone value that does
//! not need a whole object around it.
//!
//! # How Refs Work
//!
//! 1. Reading with [`Ref::get`] inside a running effect records that effect
//!    under the ref's slot.
//!
//! 2. Writing with [`Ref::set`] stores the new value and then re-runs every
//!    effect recorded for the slot. Dependents therefore always observe the
//!    value that was just written.
//!
//! 3. A raw object stored in a ref is deep-wrapped, both on creation and on
//!    every write, so nested state read through the ref is reactive too.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use super::registry::reactive;
use super::runtime::{Key, OpType, Runtime, TargetId, Trackable};
use crate::value::Value;

struct RefInner {
    slot: RefCell<Value>,
}

/// A reactive single-slot box.
///
/// Cloning shares the slot. Two refs are equal only if they are the same
/// ref.
///
/// # Example
///
/// ```rust
/// use reflex_core::{create_ref, Value};
///
/// let count = create_ref(5);
/// assert_eq!(count.get(), Value::Int(5));
///
/// count.set(6);
/// assert_eq!(count.get(), Value::Int(6));
/// ```
#[derive(Clone)]
pub struct Ref(Rc<RefInner>);

impl Ref {
    fn new(value: Value) -> Self {
        Self(Rc::new(RefInner {
            slot: RefCell::new(reactive(value)),
        }))
    }

    /// Get the current value.
    ///
    /// If called while an effect is running, this also registers the
    /// effect as a dependent.
    pub fn get(&self) -> Value {
        Runtime::track(self, OpType::Get, &Key::Slot);
        self.get_untracked()
    }

    /// Get the current value without tracking dependencies.
    pub fn get_untracked(&self) -> Value {
        self.0.slot.borrow().clone()
    }

    /// Store a new value and re-run every dependent.
    ///
    /// Dependents re-run even if the value is unchanged.
    pub fn set(&self, value: impl Into<Value>) {
        let previous = self.0.slot.replace(reactive(value));
        Runtime::trigger(self, OpType::Set, &Key::Slot);
        drop(previous);
    }

    /// Update the value using a function of the current one.
    ///
    /// The current value is read untracked.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&Value) -> Value,
    {
        let next = f(&self.0.slot.borrow());
        self.set(next);
    }

    /// Whether two handles are the same ref.
    pub fn ptr_eq(&self, other: &Ref) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Trackable for Ref {
    fn target_id(&self) -> TargetId {
        TargetId::of(&self.0)
    }

    fn liveness(&self) -> Weak<dyn Any> {
        let strong: Rc<dyn Any> = self.0.clone();
        Rc::downgrade(&strong)
    }
}

impl PartialEq for Ref {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Ref {}

impl fmt::Debug for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ref")
            .field("id", &self.target_id())
            .field("value", &*self.0.slot.borrow())
            .finish()
    }
}

/// Box a value in a ref.
///
/// An existing ref is returned as-is. A raw object is stored as its deep
/// view.
pub fn create_ref(value: impl Into<Value>) -> Ref {
    match value.into() {
        Value::Ref(existing) => existing,
        other => Ref::new(other),
    }
}

/// Whether `value` is a ref.
pub fn is_ref(value: &Value) -> bool {
    matches!(value, Value::Ref(_))
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
