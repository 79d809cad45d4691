#![forbid(unsafe_code)]

//! Observer bindings tying containers to a component's refresh cycle.
//!
//! A [`StateBinding<T>`] is the per-observer registration: it lets an
//! observing component read a container's current value and receive a fresh
//! local value whenever it changes, without the component touching the
//! subscriber list itself. Construction registers an internal notification
//! callback (the "mount"); dropping the binding deregisters it (the
//! "unmount"). Remounting is constructing a fresh binding — there is no
//! other state in the lifecycle:
//!
//! ```text
//! unregistered --new()--> registered --drop--> unregistered
//! ```
//!
//! Notifications carry no payload; they only mark the binding dirty. The
//! next [`get`] re-reads the container, so a burst of updates between two
//! reads costs one refresh, not one per update.
//!
//! [`BindingScope`] collects subscription guards for a logical scope (one
//! widget, one screen) and releases them together on drop.
//!
//! # Invariants
//!
//! 1. `get()` after a notification returns the container's latest value.
//! 2. A dropped binding's callback never fires again; sibling bindings on
//!    the same container are unaffected.
//! 3. `update_with` hands its closure the container's *current* value, not
//!    the binding's possibly stale snapshot.
//!
//! [`get`]: StateBinding::get

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::container::{StateContainer, Subscription};
use crate::error::StateError;
use crate::value::{StateValue, Update};

/// A live-updating read of a [`StateContainer`] plus an updater, with the
/// registration lifecycle tied to this value's own lifetime.
pub struct StateBinding<T: StateValue> {
    container: StateContainer<T>,
    snapshot: RefCell<T>,
    dirty: Rc<Cell<bool>>,
    _registration: Subscription,
}

impl<T: StateValue> StateBinding<T> {
    /// Bind to `container`: captures the current value and registers a
    /// notification callback that marks this binding dirty.
    #[must_use]
    pub fn new(container: &StateContainer<T>) -> Self {
        let dirty = Rc::new(Cell::new(false));
        let flag = Rc::clone(&dirty);
        let registration = container.subscribe_guard(move || flag.set(true));
        Self {
            container: container.clone(),
            snapshot: RefCell::new(container.get()),
            dirty,
            _registration: registration,
        }
    }

    /// The bound value as of the last refresh.
    ///
    /// If a notification arrived since the previous read, the container is
    /// re-read first, so the returned value is current.
    #[must_use]
    pub fn get(&self) -> T {
        if self.dirty.get() {
            *self.snapshot.borrow_mut() = self.container.get();
            self.dirty.set(false);
        }
        self.snapshot.borrow().clone()
    }

    /// Whether a notification arrived since the last [`get`](Self::get).
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Forward a full or partial update to the container.
    ///
    /// # Errors
    ///
    /// [`StateError::ShapeMismatch`] for dynamically shaped values whose
    /// resolved shape contradicts the container's semantics.
    pub fn set_state(&self, update: Update<T>) -> Result<(), StateError> {
        self.container.set_state(update)
    }

    /// Replace the whole value.
    ///
    /// # Errors
    ///
    /// See [`set_state`](Self::set_state).
    pub fn set(&self, value: T) -> Result<(), StateError> {
        self.container.set(value)
    }

    /// Shallow-merge a partial value.
    ///
    /// # Errors
    ///
    /// See [`set_state`](Self::set_state).
    pub fn patch(&self, patch: T::Patch) -> Result<(), StateError> {
        self.container.patch(patch)
    }

    /// Function-form updater: `f` receives the container's current value
    /// (a fresh read, never this binding's stale snapshot) and produces
    /// the update to apply.
    ///
    /// # Errors
    ///
    /// See [`set_state`](Self::set_state).
    pub fn update_with(&self, f: impl FnOnce(&T) -> Update<T>) -> Result<(), StateError> {
        let current = self.container.get();
        self.container.set_state(f(&current))
    }

    /// The bound container.
    #[must_use]
    pub fn container(&self) -> &StateContainer<T> {
        &self.container
    }
}

impl<T: StateValue + std::fmt::Debug> std::fmt::Debug for StateBinding<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateBinding")
            .field("snapshot", &*self.snapshot.borrow())
            .field("dirty", &self.dirty.get())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// BindingScope — lifecycle management
// ---------------------------------------------------------------------------

/// Collects subscription guards for a logical scope (e.g., a widget).
///
/// When the scope is dropped, all held subscriptions are released, cleanly
/// deregistering every callback associated with that scope.
///
/// # Invariants
///
/// 1. After drop, no callbacks from this scope will fire.
/// 2. `clear()` releases all subscriptions immediately (reusable scope).
pub struct BindingScope {
    subscriptions: Vec<Subscription>,
}

impl BindingScope {
    /// Create an empty binding scope.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscriptions: Vec::new(),
        }
    }

    /// Add a subscription to this scope. It is held until the scope is
    /// dropped or `clear()` is called.
    pub fn hold(&mut self, sub: Subscription) {
        self.subscriptions.push(sub);
    }

    /// Subscribe to a container within this scope.
    ///
    /// Returns a reference to the scope for chaining.
    pub fn subscribe<T: StateValue>(
        &mut self,
        container: &StateContainer<T>,
        callback: impl Fn() + 'static,
    ) -> &mut Self {
        let sub = container.subscribe_guard(callback);
        self.subscriptions.push(sub);
        self
    }

    /// Number of active subscriptions in this scope.
    #[must_use]
    pub fn binding_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Whether the scope has no active subscriptions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Release all subscriptions immediately (scope becomes empty but
    /// reusable).
    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }
}

impl Default for BindingScope {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BindingScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingScope")
            .field("binding_count", &self.subscriptions.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
