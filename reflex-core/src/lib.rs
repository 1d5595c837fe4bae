//! Reflex Core
//!
//! This crate provides the core runtime for Reflex, a fine-grained reactive
//! dependency-tracking system. It implements:
//!
//! - Reactive views over plain objects, with deep and shallow modes
//! - Single-slot reactive refs
//! - Effects that re-run synchronously when anything they read changes
//! - A dependency store keyed by target identity that never keeps
//!   targets or effects alive
//!
//! The runtime is single-threaded: all state lives in thread-locals and
//! every reactive handle is `!Send`.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `value`: the dynamic [`Value`] type and raw [`Object`] targets
//! - `reactive`: views, refs, effects and dependency tracking
//! - `error`: the crate error type
//!
//! # Example
//!
//! ```rust
//! use reflex_core::{effect, reactive, EffectOptions, Value};
//! use serde_json::json;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let state = reactive(Value::from(json!({"count": 1})));
//! let view = state.as_reactive().unwrap().clone();
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let (reader, log) = (view.clone(), seen.clone());
//! let _runner = effect(
//!     move || log.borrow_mut().push(reader.get("count")),
//!     EffectOptions::default(),
//! );
//!
//! // Writing re-runs the effect before `set` returns
//! view.set("count", 2);
//! assert_eq!(
//!     *seen.borrow(),
//!     vec![Some(Value::Int(1)), Some(Value::Int(2))]
//! );
//! ```

pub mod error;
pub mod reactive;
pub mod value;

pub use error::{ReactiveError, Result};
pub use reactive::{
    create_ref, effect, is_reactive, is_ref, reactive, reactive_object, shallow_reactive,
    shallow_reactive_object, to_raw, EffectOptions, EffectRunner, Reactive, Ref,
};
pub use value::{Object, Value};
