#![forbid(unsafe_code)]

//! Shared state container with change notification.
//!
//! # Design
//!
//! [`StateContainer<T>`] wraps one piece of shared state in reference-
//! counted storage (`Rc<RefCell<..>>`). Cloning the container creates a new
//! handle to the **same** inner state — consumers hold clones instead of
//! reaching for a process-wide global, and the state lives as long as any
//! handle does. Updates go through [`set_state`], which resolves a full or
//! partial [`Update`], runs change detection per the container's
//! [`NotifyPolicy`], and fans out zero-argument notifications to every
//! subscriber in subscription order.
//!
//! # Invariants
//!
//! 1. The [`Semantics`] tag is fixed at construction and never changes; an
//!    update that resolves to the other shape is rejected before any
//!    mutation ([`StateError::ShapeMismatch`], dynamic values only).
//! 2. A subscriber appears at most once (by `Rc` pointer identity).
//! 3. Subscribers are notified in subscription order.
//! 4. `version` increments exactly once per accepted update; rejected and
//!    no-op updates leave it untouched.
//! 5. [`get`] hands out a clone, never the internal storage: mutating a
//!    returned value cannot corrupt container state.
//!
//! # Concurrency
//!
//! Single-threaded by construction (`Rc`, so `!Send`/`!Sync`). All
//! operations are synchronous and run to completion. Notification is
//! synchronous and reentrant: the subscriber list is snapshotted before
//! fan-out, so a callback may subscribe, unsubscribe, or call `set_state`
//! again — the nested call recurses on the same stack, last write wins.
//! Retargeting this to a concurrent runtime would require making the
//! mutate+notify sequence a critical section (mutex or single-writer
//! actor); nothing here does that.
//!
//! [`set_state`]: StateContainer::set_state
//! [`get`]: StateContainer::get

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::error::StateError;
use crate::value::{Semantics, StateValue, Update};

/// A change-notification callback: no arguments, no return value.
///
/// Carries no payload by design — it signals "something changed, re-read
/// if you care". The `Rc` is the callback's identity: subscribing the same
/// `Rc` twice registers it once, and unsubscribing removes exactly that
/// `Rc`.
pub type NotifyFn = Rc<dyn Fn()>;

/// Change-detection strategy, fixed at container construction.
///
/// Equality checking here is a cheap wakeup filter, not a correctness
/// guarantee: callers that want every accepted update to notify, equal or
/// not, opt into [`Always`](NotifyPolicy::Always) explicitly.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum NotifyPolicy {
    /// Compare the resolved update against the current snapshot with
    /// `PartialEq`; equal values are a no-op (no mutation, no version
    /// bump, no notification).
    #[default]
    OnChange,
    /// Every structurally valid update is accepted and notifies, even if
    /// the resolved value equals the current one.
    Always,
}

struct ContainerInner<T: StateValue> {
    value: T,
    version: u64,
    semantics: Semantics,
    policy: NotifyPolicy,
    subscribers: Vec<NotifyFn>,
}

/// A shared state container with subscriber fan-out.
///
/// Cloning creates a new handle to the same inner state; see the module
/// docs for the full contract.
pub struct StateContainer<T: StateValue> {
    inner: Rc<RefCell<ContainerInner<T>>>,
}

// Manual Clone: shares the same Rc regardless of T's bounds.
impl<T: StateValue> Clone for StateContainer<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: StateValue + std::fmt::Debug> std::fmt::Debug for StateContainer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("StateContainer")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("semantics", &inner.semantics)
            .field("policy", &inner.policy)
            .field("subscriber_count", &inner.subscribers.len())
            .finish()
    }
}

impl<T: StateValue> StateContainer<T> {
    /// Create a container holding `initial`, classifying it once to fix
    /// the merge-vs-replace semantics. Change detection defaults to
    /// [`NotifyPolicy::OnChange`].
    #[must_use]
    pub fn new(initial: T) -> Self {
        Self::with_policy(initial, NotifyPolicy::default())
    }

    /// Create a container with an explicit change-detection policy.
    #[must_use]
    pub fn with_policy(initial: T, policy: NotifyPolicy) -> Self {
        let semantics = initial.classify();
        trace!(?semantics, ?policy, "state container created");
        Self {
            inner: Rc::new(RefCell::new(ContainerInner {
                value: initial,
                version: 0,
                semantics,
                policy,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Get a clone of the current snapshot.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Access the current value by reference without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Apply a full or partial update.
    ///
    /// Resolution: [`Update::Replace`] takes the value as-is;
    /// [`Update::Patch`] shallow-merges over a clone of the current
    /// snapshot. The resolved value's classification must match the
    /// container's construction-time tag — a contradiction (possible only
    /// for dynamically shaped values) is rejected with no mutation and no
    /// notification.
    ///
    /// Under [`NotifyPolicy::OnChange`], a resolved value equal to the
    /// current snapshot is a silent no-op. Otherwise the value is stored,
    /// the version bumped, and every subscriber invoked in subscription
    /// order.
    ///
    /// # Errors
    ///
    /// [`StateError::ShapeMismatch`] when the resolved value contradicts
    /// the container's semantics. Statically-typed values never fail.
    pub fn set_state(&self, update: Update<T>) -> Result<(), StateError> {
        let accepted = {
            let mut inner = self.inner.borrow_mut();
            let next = match update {
                Update::Replace(value) => value,
                Update::Patch(patch) => {
                    let mut merged = inner.value.clone();
                    merged.merge(patch)?;
                    merged
                }
            };
            let actual = next.classify();
            if actual != inner.semantics {
                debug!(
                    expected = ?inner.semantics,
                    ?actual,
                    "rejected shape-mismatched update"
                );
                return Err(StateError::ShapeMismatch {
                    expected: inner.semantics,
                    actual,
                });
            }
            if inner.policy == NotifyPolicy::OnChange && next == inner.value {
                trace!(version = inner.version, "update resolved to current value, skipping");
                false
            } else {
                inner.value = next;
                inner.version += 1;
                trace!(version = inner.version, "state updated");
                true
            }
        };
        if accepted {
            self.notify();
        }
        Ok(())
    }

    /// Replace the whole value. Shorthand for `set_state(Update::Replace(..))`.
    ///
    /// # Errors
    ///
    /// [`StateError::ShapeMismatch`] for dynamically shaped values whose
    /// new shape contradicts the container's semantics.
    pub fn set(&self, value: T) -> Result<(), StateError> {
        self.set_state(Update::Replace(value))
    }

    /// Shallow-merge a partial value. Shorthand for
    /// `set_state(Update::Patch(..))`.
    ///
    /// # Errors
    ///
    /// [`StateError::ShapeMismatch`] for dynamically shaped patches of the
    /// wrong shape.
    pub fn patch(&self, patch: T::Patch) -> Result<(), StateError> {
        self.set_state(Update::Patch(patch))
    }

    /// Register `notify` unless an identical callback (same `Rc`) is
    /// already subscribed.
    pub fn subscribe(&self, notify: &NotifyFn) {
        let mut inner = self.inner.borrow_mut();
        if inner
            .subscribers
            .iter()
            .any(|existing| Rc::ptr_eq(existing, notify))
        {
            return;
        }
        inner.subscribers.push(Rc::clone(notify));
        trace!(subscriber_count = inner.subscribers.len(), "subscriber added");
    }

    /// Remove a previously registered callback (by `Rc` pointer identity).
    /// Silently accepted if the callback is not subscribed.
    pub fn unsubscribe(&self, notify: &NotifyFn) {
        let mut inner = self.inner.borrow_mut();
        inner
            .subscribers
            .retain(|existing| !Rc::ptr_eq(existing, notify));
        trace!(subscriber_count = inner.subscribers.len(), "subscriber removed");
    }

    /// Subscribe with an RAII guard: the callback stays registered until
    /// the returned [`Subscription`] is dropped, which unsubscribes it
    /// explicitly.
    #[must_use]
    pub fn subscribe_guard(&self, notify: impl Fn() + 'static) -> Subscription {
        let notify: NotifyFn = Rc::new(notify);
        self.subscribe(&notify);
        let container = self.clone();
        Subscription {
            detach: Some(Box::new(move || container.unsubscribe(&notify))),
        }
    }

    /// The merge-vs-replace tag fixed at construction.
    #[must_use]
    pub fn semantics(&self) -> Semantics {
        self.inner.borrow().semantics
    }

    /// The change-detection policy fixed at construction.
    #[must_use]
    pub fn policy(&self) -> NotifyPolicy {
        self.inner.borrow().policy
    }

    /// Number of accepted updates since construction. Useful for
    /// dirty-checking.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Number of currently registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    /// Invoke every subscriber in subscription order.
    ///
    /// The list is snapshotted before the borrow is released, so callbacks
    /// are free to subscribe, unsubscribe, or re-enter `set_state`.
    /// Mid-notification churn takes effect from the *next* fan-out.
    fn notify(&self) {
        let subscribers: Vec<NotifyFn> = self.inner.borrow().subscribers.clone();
        for notify in &subscribers {
            notify();
        }
    }
}

/// Free factory, equivalent to [`StateContainer::new`].
#[must_use]
pub fn create_container<T: StateValue>(initial: T) -> StateContainer<T> {
    StateContainer::new(initial)
}

/// RAII guard for a subscribed callback.
///
/// Dropping the guard unsubscribes the callback from its container.
/// Holding the guard is the only thing keeping the registration alive, so
/// a binding (or widget) that owns its guard deregisters cleanly whenever
/// it is torn down, however many mount/unmount cycles its owner goes
/// through.
pub struct Subscription {
    detach: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Unsubscribe immediately instead of waiting for drop.
    pub fn detach_now(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.detach.is_some())
            .finish()
    }
}
