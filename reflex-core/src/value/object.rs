//! Raw Object Targets
//!
//! An [`Object`] is the plain, untracked composite that reactive views wrap.
//! It is a shared, insertion-ordered map from property names to [`Value`]s.
//!
//! # Identity
//!
//! Cloning an `Object` clones the handle, not the contents: both handles
//! refer to the same allocation and compare equal. The dependency store and
//! the view registry key on that allocation's address, never on contents.
//!
//! Reads and writes through an `Object` handle are never tracked. Go through
//! a [`Reactive`](crate::reactive::Reactive) view to participate in
//! dependency tracking.

use std::any::Any;
use std::cell::RefCell;
use std::fmt::{self, Debug};
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use super::Value;
use crate::reactive::{TargetId, Trackable};

type Properties = IndexMap<Rc<str>, Value>;

/// A raw composite target.
#[derive(Clone, Default)]
pub struct Object(Rc<RefCell<Properties>>);

impl Object {
    /// Create a new empty object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a property.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.borrow().get(key).cloned()
    }

    /// Check whether a property exists.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.borrow().contains_key(key)
    }

    /// Write a property, returning the previous value if there was one.
    ///
    /// New keys are appended; overwriting keeps the key's position.
    pub fn insert(&self, key: impl Into<Rc<str>>, value: impl Into<Value>) -> Option<Value> {
        self.0.borrow_mut().insert(key.into(), value.into())
    }

    /// Remove a property, returning its value if it existed.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.0.borrow_mut().shift_remove(key)
    }

    /// Property names in insertion order.
    pub fn keys(&self) -> Vec<Rc<str>> {
        self.0.borrow().keys().cloned().collect()
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// Whether the object has no properties.
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Whether two handles refer to the same target.
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Snapshot of all properties, used for serialization.
    pub(crate) fn entries(&self) -> Vec<(Rc<str>, Value)> {
        self.0
            .borrow()
            .iter()
            .map(|(key, value)| (Rc::clone(key), value.clone()))
            .collect()
    }
}

impl Trackable for Object {
    fn target_id(&self) -> TargetId {
        TargetId::of(&self.0)
    }

    fn liveness(&self) -> Weak<dyn Any> {
        let strong: Rc<dyn Any> = self.0.clone();
        Rc::downgrade(&strong)
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Object {}

impl<K, V> FromIterator<(K, V)> for Object
where
    K: Into<Rc<str>>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let properties = iter
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Self(Rc::new(RefCell::new(properties)))
    }
}

// Keys only: objects may reference each other in cycles.
impl Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("id", &self.target_id())
            .field("keys", &self.keys())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_insert_get_remove() {
        let object = Object::new();
        assert!(object.is_empty());

        assert_eq!(object.insert("a", 1), None);
        assert_eq!(object.insert("a", 2), Some(Value::Int(1)));
        assert_eq!(object.get("a"), Some(Value::Int(2)));
        assert!(object.contains_key("a"));

        assert_eq!(object.remove("a"), Some(Value::Int(2)));
        assert_eq!(object.remove("a"), None);
        assert!(!object.contains_key("a"));
    }

    #[test]
    fn object_keys_keep_insertion_order() {
        let object: Object = [("z", 1), ("a", 2), ("m", 3)].into_iter().collect();
        object.remove("a");
        object.insert("b", 4);

        let keys = object.keys();
        let names: Vec<&str> = keys.iter().map(|k| &**k).collect();
        assert_eq!(names, vec!["z", "m", "b"]);
    }

    #[test]
    fn object_clone_shares_identity() {
        let object1 = Object::new();
        let object2 = object1.clone();

        object1.insert("x", true);
        assert_eq!(object2.get("x"), Some(Value::Bool(true)));
        assert_eq!(object1, object2);
        assert_eq!(object1.target_id(), object2.target_id());

        // Same contents, different allocation
        let other = Object::new();
        other.insert("x", true);
        assert_ne!(object1, other);
    }

    #[test]
    fn liveness_does_not_keep_target_alive() {
        let object = Object::new();
        let weak = object.liveness();
        assert!(weak.upgrade().is_some());

        drop(object);
        assert!(weak.upgrade().is_none());
    }
}
