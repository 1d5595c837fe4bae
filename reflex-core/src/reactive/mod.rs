//! Reactive Primitives
//!
//! This module implements the core reactive system: views over objects,
//! refs, and effects, tied together by a dependency store.
//!
//! # Concepts
//!
//! ## Views
//!
//! A [`Reactive`] view wraps a raw [`Object`](crate::value::Object). Reading a
//! property through the view inside an effect records the effect as a
//! dependent of that property; writing or deleting the property re-runs
//! every dependent. Views are unique per target and mode, see
//! [`reactive`] and [`shallow_reactive`].
//!
//! ## Refs
//!
//! A [`Ref`] is a single reactive slot with the same contract, for values
//! that don't need a whole object.
//!
//! ## Effects
//!
//! An effect is a computation that re-runs whenever something it read
//! changes. [`effect`] creates one and returns an [`EffectRunner`] handle.
//!
//! The runner owns the effect. Keep it for as long as the effect should keep
//! reacting: once every runner is dropped, writes no longer re-run it. Call
//! [`EffectRunner::detach`] to leave the effect running for the lifetime of
//! the thread instead.
//!
//! # Implementation Notes
//!
//! The reactive system uses a thread-local context stack to detect
//! dependencies automatically: when a view property or ref is read, we check
//! for a running effect and, if there is one, record the dependency.
//!
//! Re-runs are synchronous and immediate. A write returns only after every
//! dependent (and anything those dependents wrote in turn) has finished.

mod context;
mod effect;
mod registry;
mod refs;
mod runtime;
mod view;

pub use context::ReactiveContext;
pub use effect::{effect, EffectId, EffectOptions, EffectRunner, IntoEffectBody, ReactiveEffect};
pub use refs::{create_ref, is_ref, Ref};
pub use registry::{
    is_reactive, reactive, reactive_object, shallow_reactive, shallow_reactive_object, to_raw,
};
pub use runtime::{Key, OpType, Runtime, TargetId, Trackable};
pub use view::{Reactive, ReactiveFlags, WrapMode};
