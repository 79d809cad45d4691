#![forbid(unsafe_code)]

//! Error type for state container operations.
//!
//! Statically-typed state can never fail: classification is constant per
//! type and merges are total. The only fallible path is dynamically shaped
//! state ([`serde_json::Value`]), where an update can contradict the
//! classification fixed at container construction. Such updates are
//! rejected before any mutation or notification.

use core::fmt;

use crate::value::Semantics;

/// Error returned by [`StateContainer::set_state`] and the binding-layer
/// updaters that forward to it.
///
/// [`StateContainer::set_state`]: crate::container::StateContainer::set_state
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StateError {
    /// The resolved update value's shape contradicts the container's
    /// construction-time [`Semantics`] tag.
    ///
    /// The container is left untouched: no value change, no version bump,
    /// no notification.
    ShapeMismatch {
        /// The semantics fixed when the container was constructed.
        expected: Semantics,
        /// The semantics of the rejected update value.
        actual: Semantics,
    },
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShapeMismatch { expected, actual } => write!(
                f,
                "state shape mismatch: container is {expected:?} but update resolved to {actual:?}"
            ),
        }
    }
}

impl std::error::Error for StateError {}
