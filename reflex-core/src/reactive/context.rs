//! Reactive Context
//!
//! The reactive context tracks which effect is currently running. This is
//! the active-effect pointer that [`Runtime::track`](super::Runtime::track)
//! consults to learn who is reading.
//!
//! # Implementation
//!
//! We use a thread-local stack to track the currently executing effect.
//! When an effect starts running we push it; when it finishes we pop it,
//! which restores the previously running effect (if any). The top of the
//! stack is the active effect.
//!
//! Pushing and popping only happen through the [`ReactiveContext`] guard,
//! and the pop lives in its `Drop` impl. A body that panics therefore still
//! restores the previous effect while unwinding, and later reads are never
//! attributed to an effect that is no longer running.
//!
//! While on the stack, an effect's parent link points at the effect that was
//! active when it started. The link is restored when the guard drops, so it
//! is cleared once the outermost run of that effect finishes.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::effect::ReactiveEffect;

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<Rc<ReactiveEffect>>> = RefCell::new(Vec::new());
}

/// Guard that pops the context when dropped.
///
/// This ensures the context stack is properly maintained even if
/// the effect body panics.
pub struct ReactiveContext {
    effect: Rc<ReactiveEffect>,
    saved_parent: Option<Weak<ReactiveEffect>>,
}

impl ReactiveContext {
    /// Enter a new reactive context for the given effect.
    ///
    /// While this context is active, tracked reads register `effect` as a
    /// dependent. The previous context is restored when the returned guard
    /// is dropped.
    pub fn enter(effect: Rc<ReactiveEffect>) -> Self {
        let saved_parent = CONTEXT_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            let parent = stack.last().map(Rc::downgrade);
            stack.push(Rc::clone(&effect));
            effect.replace_parent(parent)
        });

        Self {
            effect,
            saved_parent,
        }
    }

    /// Check if there is an active reactive context.
    pub fn is_active() -> bool {
        CONTEXT_STACK.with(|stack| !stack.borrow().is_empty())
    }

    /// Get the currently running effect, if any.
    pub fn current_effect() -> Option<Rc<ReactiveEffect>> {
        CONTEXT_STACK.with(|stack| stack.borrow().last().cloned())
    }

    /// Number of effects currently on the stack.
    pub fn depth() -> usize {
        CONTEXT_STACK.with(|stack| stack.borrow().len())
    }

    /// Whether `effect` is anywhere on the stack.
    pub(crate) fn contains(effect: &ReactiveEffect) -> bool {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .iter()
                .any(|running| running.id() == effect.id())
        })
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        // The stack is already gone if this runs during thread teardown.
        let popped = CONTEXT_STACK
            .try_with(|stack| stack.borrow_mut().pop())
            .ok()
            .flatten();

        self.effect.replace_parent(self.saved_parent.take());

        // Verify we're popping the right context.
        // This helps catch bugs where contexts are mismatched.
        if let Some(popped) = popped {
            debug_assert!(
                Rc::ptr_eq(&popped, &self.effect),
                "ReactiveContext mismatch: expected {:?}, got {:?}",
                self.effect.id(),
                popped.id()
            );
        }
    }
}
