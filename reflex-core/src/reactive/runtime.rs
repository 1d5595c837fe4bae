//! Reactive Runtime
//!
//! The runtime owns the dependency store: for every tracked target, a map
//! from property key to the ordered set of effects that read it.
//!
//! # How It Works
//!
//! 1. When a view property or ref slot is read while an effect is running,
//!    [`Runtime::track`] records that effect under (target, key).
//!
//! 2. When the property or slot is written, [`Runtime::trigger`] looks up
//!    (target, key) and re-runs every recorded effect, synchronously and in
//!    the order they were first tracked.
//!
//! There is no batching, no deduplication across keys and no cleanup of
//! stale dependencies between runs: an effect stays subscribed to
//! everything it ever read.
//!
//! # Ownership
//!
//! Targets are keyed by identity and held through a `Weak` liveness token,
//! and effects are held as `Weak` references. The store therefore never
//! keeps a target or an effect alive. Entries belonging to dropped targets
//! or effects are pruned lazily.
//!
//! # Threading
//!
//! The store is thread-local. Reactive handles are `!Send`, so a target can
//! only ever be tracked on the thread that created it.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::{debug, trace};

use super::context::ReactiveContext;
use super::effect::{EffectId, ReactiveEffect};

/// Identity of a tracked target: the address of its shared allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetId(usize);

impl TargetId {
    /// Identity of the allocation behind `rc`.
    pub fn of<T: ?Sized>(rc: &Rc<T>) -> Self {
        Self(Rc::as_ptr(rc).cast::<()>() as usize)
    }
}

/// Anything whose reads and writes can be tracked.
///
/// Implemented by raw object targets and by refs.
pub trait Trackable {
    /// Identity used to key the dependency store.
    fn target_id(&self) -> TargetId;

    /// A token that stays upgradable exactly as long as the target is alive.
    fn liveness(&self) -> Weak<dyn Any>;
}

/// A tracked key within a target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A named object property.
    Prop(Rc<str>),
    /// The single value slot of a ref.
    Slot,
}

impl Key {
    pub fn prop(name: &str) -> Self {
        Key::Prop(Rc::from(name))
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::prop(name)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Prop(name) => f.write_str(name),
            Key::Slot => f.write_str("<slot>"),
        }
    }
}

/// The kind of access that caused a track or trigger.
///
/// Tracking and triggering currently behave the same for every kind; the
/// kind is carried through so that iteration- or length-specific semantics
/// can be distinguished later without changing call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpType {
    Get,
    Has,
    Set,
    Delete,
}

/// Effects recorded for one key, in first-tracked order.
type Dep = IndexMap<EffectId, Weak<ReactiveEffect>>;

struct TargetDeps {
    owner: Weak<dyn Any>,
    keys: HashMap<Key, Dep>,
}

/// Store of dead-target entries is swept once it grows past this size.
const MIN_SWEEP_THRESHOLD: usize = 64;

struct DependencyStore {
    targets: HashMap<TargetId, TargetDeps>,
    sweep_at: usize,
}

impl DependencyStore {
    fn new() -> Self {
        Self {
            targets: HashMap::new(),
            sweep_at: MIN_SWEEP_THRESHOLD,
        }
    }

    fn deps_for(&mut self, target: &dyn Trackable) -> &mut TargetDeps {
        let id = target.target_id();
        if !self.targets.contains_key(&id) && self.targets.len() >= self.sweep_at {
            self.sweep();
        }
        self.targets.entry(id).or_insert_with(|| TargetDeps {
            owner: target.liveness(),
            keys: HashMap::new(),
        })
    }

    fn sweep(&mut self) {
        let before = self.targets.len();
        self.targets.retain(|_, deps| deps.owner.strong_count() > 0);
        self.sweep_at = (self.targets.len() * 2).max(MIN_SWEEP_THRESHOLD);
        debug!(
            pruned = before - self.targets.len(),
            remaining = self.targets.len(),
            "swept dependencies of dropped targets"
        );
    }
}

thread_local! {
    static STORE: RefCell<DependencyStore> = RefCell::new(DependencyStore::new());
}

/// The reactive runtime.
///
/// A zero-sized facade over the thread-local dependency store and the
/// active-effect context.
pub struct Runtime;

impl Runtime {
    /// Record that the running effect depends on `key` of `target`.
    ///
    /// Does nothing when no effect is running. Recording the same effect
    /// twice for the same key is a no-op.
    pub fn track(target: &dyn Trackable, op: OpType, key: &Key) {
        let Some(effect) = ReactiveContext::current_effect() else {
            return;
        };

        STORE.with(|store| {
            let mut store = store.borrow_mut();
            let dep = store.deps_for(target).keys.entry(key.clone()).or_default();
            if !dep.contains_key(&effect.id()) {
                let before = dep.len();
                dep.retain(|_, recorded| recorded.strong_count() > 0);
                if dep.len() < before {
                    debug!(pruned = before - dep.len(), %key, "pruned dropped effects");
                }
                dep.insert(effect.id(), Rc::downgrade(&effect));
                trace!(effect = ?effect.id(), target_id = ?target.target_id(), ?op, %key, "track");
            }
        });
    }

    /// Re-run every effect that depends on `key` of `target`.
    ///
    /// Effects run synchronously, in first-tracked order, before this
    /// returns. The set is snapshotted first, so effects tracked by the
    /// re-runs themselves are not visited in this pass.
    ///
    /// An effect whose run writes a key it depends on re-enters itself
    /// without any guard; a true self cycle overflows the stack.
    pub fn trigger(target: &dyn Trackable, op: OpType, key: &Key) {
        let id = target.target_id();
        let effects: SmallVec<[Rc<ReactiveEffect>; 4]> = STORE.with(|store| {
            let mut store = store.borrow_mut();
            let Some(dep) = store
                .targets
                .get_mut(&id)
                .and_then(|deps| deps.keys.get_mut(key))
            else {
                return SmallVec::new();
            };

            let before = dep.len();
            dep.retain(|_, effect| effect.strong_count() > 0);
            if dep.len() < before {
                debug!(pruned = before - dep.len(), %key, "pruned dropped effects");
            }
            dep.values().filter_map(Weak::upgrade).collect()
        });

        if effects.is_empty() {
            return;
        }

        trace!(target_id = ?id, ?op, %key, dependents = effects.len(), "trigger");
        for effect in &effects {
            effect.run();
        }
    }

    /// Number of live effects recorded for `key` of `target`.
    pub fn dependent_count(target: &dyn Trackable, key: &Key) -> usize {
        STORE.with(|store| {
            store
                .borrow()
                .targets
                .get(&target.target_id())
                .and_then(|deps| deps.keys.get(key))
                .map(|dep| dep.values().filter(|effect| effect.strong_count() > 0).count())
                .unwrap_or(0)
        })
    }

    /// Number of entries recorded for `key` of `target`, dead ones included.
    #[cfg(test)]
    fn recorded_count(target: &dyn Trackable, key: &Key) -> usize {
        STORE.with(|store| {
            store
                .borrow()
                .targets
                .get(&target.target_id())
                .and_then(|deps| deps.keys.get(key))
                .map_or(0, |dep| dep.len())
        })
    }

    /// The effect currently running on this thread, if any.
    pub fn current_effect() -> Option<Rc<ReactiveEffect>> {
        ReactiveContext::current_effect()
    }

    /// Whether reads on this thread are currently being tracked.
    pub fn is_tracking() -> bool {
        ReactiveContext::is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use crate::reactive::{effect, EffectOptions};
    use crate::value::Object;

    #[test]
    fn track_outside_effect_is_noop() {
        let target = Object::new();
        let key = Key::prop("a");

        Runtime::track(&target, OpType::Get, &key);
        assert_eq!(Runtime::dependent_count(&target, &key), 0);
        assert!(!Runtime::is_tracking());
    }

    #[test]
    fn track_is_idempotent_per_key() {
        let target = Object::new();
        let key = Key::prop("a");

        let tracked = target.clone();
        let _runner = effect(
            move || {
                Runtime::track(&tracked, OpType::Get, &Key::prop("a"));
                Runtime::track(&tracked, OpType::Has, &Key::prop("a"));
            },
            EffectOptions::default(),
        );

        assert_eq!(Runtime::dependent_count(&target, &key), 1);
        assert_eq!(Runtime::dependent_count(&target, &Key::prop("b")), 0);
    }

    #[test]
    fn trigger_runs_dependents_in_tracking_order() {
        let target = Object::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let runners: Vec<_> = (0..3)
            .map(|n| {
                let tracked = target.clone();
                let order = order.clone();
                effect(
                    move || {
                        Runtime::track(&tracked, OpType::Get, &Key::prop("a"));
                        order.borrow_mut().push(n);
                    },
                    EffectOptions::default(),
                )
            })
            .collect();

        order.borrow_mut().clear();
        Runtime::trigger(&target, OpType::Set, &Key::prop("a"));
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
        assert_eq!(runners.len(), 3);
    }

    #[test]
    fn trigger_without_dependents_is_noop() {
        let target = Object::new();
        Runtime::trigger(&target, OpType::Set, &Key::prop("missing"));
        Runtime::trigger(&target, OpType::Delete, &Key::Slot);
    }

    #[test]
    fn dropped_effects_are_not_run() {
        let target = Object::new();
        let runs = Rc::new(Cell::new(0));

        let tracked = target.clone();
        let counter = runs.clone();
        let runner = effect(
            move || {
                Runtime::track(&tracked, OpType::Get, &Key::prop("a"));
                counter.set(counter.get() + 1);
            },
            EffectOptions::default(),
        );
        assert_eq!(runs.get(), 1);

        drop(runner);
        Runtime::trigger(&target, OpType::Set, &Key::prop("a"));
        assert_eq!(runs.get(), 1);
        assert_eq!(Runtime::dependent_count(&target, &Key::prop("a")), 0);
    }

    #[test]
    fn track_prunes_dropped_effects_without_a_write() {
        let target = Object::new();
        let key = Key::prop("a");

        // Short-lived effects that read the key and are discarded, with no
        // write in between to clean up after them.
        for _ in 0..8 {
            let tracked = target.clone();
            let runner = effect(
                move || Runtime::track(&tracked, OpType::Get, &Key::prop("a")),
                EffectOptions::default(),
            );
            drop(runner);
        }
        assert!(Runtime::recorded_count(&target, &key) <= 1);

        let tracked = target.clone();
        let _runner = effect(
            move || Runtime::track(&tracked, OpType::Get, &Key::prop("a")),
            EffectOptions::default(),
        );
        assert_eq!(Runtime::recorded_count(&target, &key), 1);
        assert_eq!(Runtime::dependent_count(&target, &key), 1);
    }

    #[test]
    fn store_does_not_keep_targets_alive() {
        let target = Object::new();
        let liveness = target.liveness();

        let tracked = target.clone();
        let runner = effect(
            move || Runtime::track(&tracked, OpType::Get, &Key::prop("a")),
            EffectOptions::lazy(),
        );
        runner.run();

        // The runner's body still owns a handle; the store itself must not.
        drop(target);
        assert!(liveness.upgrade().is_some());
        drop(runner);
        assert!(liveness.upgrade().is_none());
    }
}
