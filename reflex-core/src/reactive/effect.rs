//! Effect Implementation
//!
//! An effect is a re-runnable computation. Whatever reactive state its body
//! reads while running becomes a dependency, and writing any of that state
//! later re-runs the body.
//!
//! # How Effects Work
//!
//! 1. [`effect`] wraps a body into a [`ReactiveEffect`] and, unless
//!    `lazy` is set, runs it once to establish its dependencies.
//!
//! 2. Each run enters a [`ReactiveContext`] for the effect, so every tracked
//!    read during the body is attributed to it. Leaving the context restores
//!    whichever effect was running before, which makes nested runs work.
//!
//! 3. When a dependency is written, the runtime calls [`ReactiveEffect::run`]
//!    synchronously on the writing thread.
//!
//! Dependencies are only ever added: there is no cleanup of keys an effect
//! stopped reading.
//!
//! # Ownership
//!
//! The dependency store holds effects weakly. An effect lives exactly as
//! long as an [`EffectRunner`] for it does; once every runner is dropped the
//! effect is never run again. A runner discarded straight away (`let _ =
//! effect(..)`) therefore runs once and then goes quiet.
//!
//! For fire-and-forget effects, [`EffectRunner::detach`] hands ownership to
//! the current thread instead: the effect keeps re-running until the thread
//! exits.
//!
//! # Panics
//!
//! A panicking body unwinds out of `run()` (and so out of whatever write
//! triggered it). The context guard still restores the active effect on the
//! way out. [`EffectRunner::try_run`] catches the panic and reports it as a
//! [`ReactiveError::EffectPanicked`] instead.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::context::ReactiveContext;
use crate::error::{ReactiveError, Result};

thread_local! {
    /// Effects owned by the thread rather than by a runner.
    static DETACHED: RefCell<Vec<Rc<ReactiveEffect>>> = RefCell::new(Vec::new());
}

/// Unique identifier for an effect.
///
/// This is the identity stored in dependency sets, so an effect is
/// recorded at most once per tracked key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectId(u64);

impl EffectId {
    /// Generate a new unique effect ID.
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Options accepted by [`effect`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectOptions {
    /// Skip the initial run. The effect tracks nothing until its runner is
    /// first invoked.
    pub lazy: bool,
}

impl EffectOptions {
    /// Options for an effect that does not run on creation.
    pub fn lazy() -> Self {
        Self { lazy: true }
    }
}

/// A reactive unit of work.
pub struct ReactiveEffect {
    /// Unique identifier for this effect.
    id: EffectId,

    /// The effect body. Shared so a new effect can be built from an
    /// existing runner without double wrapping.
    body: Rc<dyn Fn()>,

    /// The effect that was running when this one started. Only set while
    /// this effect is on the context stack.
    parent: RefCell<Option<Weak<ReactiveEffect>>>,

    /// Number of times the body has been entered.
    run_count: Cell<usize>,
}

impl ReactiveEffect {
    /// Create a new idle effect around `body`.
    pub fn new(body: Rc<dyn Fn()>) -> Rc<Self> {
        Rc::new(Self {
            id: EffectId::next(),
            body,
            parent: RefCell::new(None),
            run_count: Cell::new(0),
        })
    }

    /// Get the effect's unique ID.
    pub fn id(&self) -> EffectId {
        self.id
    }

    /// Run the body with this effect as the active effect.
    ///
    /// Nested and re-entrant runs are fine; each call saves and restores the
    /// active effect independently.
    pub fn run(self: &Rc<Self>) {
        let _ctx = ReactiveContext::enter(Rc::clone(self));
        self.run_count.set(self.run_count.get() + 1);
        debug!(effect = ?self.id, run = self.run_count.get(), "running effect");
        (self.body)();
    }

    /// Get the number of times the effect has run.
    pub fn run_count(&self) -> usize {
        self.run_count.get()
    }

    /// The effect that was active when this one started, while it runs.
    pub fn parent(&self) -> Option<Rc<ReactiveEffect>> {
        self.parent.borrow().as_ref().and_then(Weak::upgrade)
    }

    /// Whether the effect is on the context stack.
    pub fn is_running(&self) -> bool {
        ReactiveContext::contains(self)
    }

    pub(crate) fn replace_parent(
        &self,
        parent: Option<Weak<ReactiveEffect>>,
    ) -> Option<Weak<ReactiveEffect>> {
        self.parent.replace(parent)
    }
}

impl fmt::Debug for ReactiveEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveEffect")
            .field("id", &self.id)
            .field("run_count", &self.run_count())
            .field("running", &self.is_running())
            .finish()
    }
}

/// Callable handle to an effect.
///
/// Cloning the runner shares the same underlying effect. Every runner
/// invocation re-runs that same effect, so its dependency-set membership
/// stays valid across runs.
#[must_use = "an effect stops re-running once every runner handle is dropped"]
#[derive(Clone)]
pub struct EffectRunner {
    effect: Rc<ReactiveEffect>,
}

impl EffectRunner {
    /// Re-run the effect. Panics in the body propagate.
    pub fn run(&self) {
        self.effect.run();
    }

    /// Re-run the effect, reporting a panicking body as an error.
    pub fn try_run(&self) -> Result<()> {
        panic::catch_unwind(AssertUnwindSafe(|| self.effect.run())).map_err(|payload| {
            ReactiveError::EffectPanicked {
                effect: self.effect.id(),
                message: panic_message(&*payload),
            }
        })
    }

    /// The underlying effect.
    pub fn effect(&self) -> &Rc<ReactiveEffect> {
        &self.effect
    }

    pub fn id(&self) -> EffectId {
        self.effect.id()
    }

    /// Keep the effect alive for the rest of the thread's lifetime, without
    /// holding on to a runner.
    ///
    /// There is no way to stop a detached effect.
    pub fn detach(self) -> EffectId {
        let id = self.effect.id();
        DETACHED.with(|detached| detached.borrow_mut().push(self.effect));
        debug!(effect = ?id, "effect detached");
        id
    }
}

impl fmt::Debug for EffectRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EffectRunner").field(&self.effect).finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Something [`effect`] can build an effect body from.
///
/// Implemented for plain closures and for [`EffectRunner`]. Passing a
/// runner reuses its original body instead of wrapping the runner itself.
pub trait IntoEffectBody {
    fn into_effect_body(self) -> Rc<dyn Fn()>;
}

impl<F> IntoEffectBody for F
where
    F: Fn() + 'static,
{
    fn into_effect_body(self) -> Rc<dyn Fn()> {
        Rc::new(self)
    }
}

impl IntoEffectBody for EffectRunner {
    fn into_effect_body(self) -> Rc<dyn Fn()> {
        Rc::clone(&self.effect.body)
    }
}

/// Create an effect from `body`.
///
/// Runs the body once immediately unless `options.lazy` is set, and returns
/// a runner that re-runs it.
///
/// # Example
///
/// ```rust
/// use reflex_core::{effect, reactive_object, EffectOptions, Object};
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let state = reactive_object(&[("count", 1)].into_iter().collect::<Object>());
/// let seen = Rc::new(RefCell::new(Vec::new()));
///
/// let (view, log) = (state.clone(), seen.clone());
/// let _runner = effect(
///     move || log.borrow_mut().push(view.get("count")),
///     EffectOptions::default(),
/// );
///
/// state.set("count", 2);
/// assert_eq!(seen.borrow().len(), 2);
/// ```
pub fn effect<B: IntoEffectBody>(body: B, options: EffectOptions) -> EffectRunner {
    let effect = ReactiveEffect::new(body.into_effect_body());
    debug!(effect = ?effect.id(), lazy = options.lazy, "effect created");

    if !options.lazy {
        effect.run();
    }

    EffectRunner { effect }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
