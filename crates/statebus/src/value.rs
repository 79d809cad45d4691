#![forbid(unsafe_code)]

//! Value classification and update semantics.
//!
//! A container decides *once*, at construction, whether it holds composite
//! state (a structured, multi-field value, updated by shallow merge) or
//! scalar state (replaced wholesale). That decision is modeled as an
//! explicit [`Semantics`] tag rather than runtime type inspection on every
//! call, and the [`StateValue`] trait supplies the two pieces the container
//! needs: classification of an initial value, and shallow merge of a
//! partial update.
//!
//! # Invariants
//!
//! 1. `classify()` is evaluated once per container, at construction; the
//!    resulting tag never changes.
//! 2. `merge()` is shallow: incoming fields overwrite same-named fields of
//!    the base, fields absent from the patch are untouched.
//! 3. For scalar impls, `Patch = Self` and merge is plain replacement.
//! 4. Only dynamically shaped values (`serde_json::Value`) can fail to
//!    merge; every statically-typed impl is total.

use crate::error::StateError;

/// Update semantics of a container, fixed at construction.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Semantics {
    /// Single value, replaced outright by every accepted update.
    Scalar,
    /// Structured, multi-field value, updated by shallow merge.
    Composite,
}

impl Semantics {
    /// Whether updates shallow-merge rather than replace.
    #[must_use]
    pub fn is_composite(self) -> bool {
        matches!(self, Self::Composite)
    }
}

/// A value that can live in a [`StateContainer`].
///
/// Implementations come in two flavors:
///
/// - **Scalar**: provided for the primitive types and `String` (see the
///   list below). `Patch = Self`, merge replaces.
/// - **Composite**: structured types implement this directly with an
///   `Option`-per-field patch struct, merging each `Some` field over the
///   base. [`serde_json::Value`] ships with a composite-aware impl whose
///   classification depends on the runtime shape.
///
/// ```
/// use statebus::{Semantics, StateError, StateValue};
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Settings {
///     volume: u8,
///     muted: bool,
/// }
///
/// #[derive(Clone, Debug, Default)]
/// struct SettingsPatch {
///     volume: Option<u8>,
///     muted: Option<bool>,
/// }
///
/// impl StateValue for Settings {
///     type Patch = SettingsPatch;
///
///     fn classify(&self) -> Semantics {
///         Semantics::Composite
///     }
///
///     fn merge(&mut self, patch: SettingsPatch) -> Result<(), StateError> {
///         if let Some(volume) = patch.volume {
///             self.volume = volume;
///         }
///         if let Some(muted) = patch.muted {
///             self.muted = muted;
///         }
///         Ok(())
///     }
/// }
/// ```
///
/// [`StateContainer`]: crate::container::StateContainer
pub trait StateValue: Clone + PartialEq + 'static {
    /// The partial-update type accepted by [`Update::Patch`].
    type Patch: Clone + 'static;

    /// Classify this value as scalar or composite.
    ///
    /// Called once per container, on the initial value.
    fn classify(&self) -> Semantics;

    /// Shallow-merge `patch` into `self`.
    ///
    /// Scalar impls replace; composite impls overwrite the fields the
    /// patch carries. Fails only for dynamically shaped values whose patch
    /// has the wrong shape.
    fn merge(&mut self, patch: Self::Patch) -> Result<(), StateError>;
}

/// A full or partial state update.
#[derive(Clone)]
pub enum Update<T: StateValue> {
    /// Replace the whole value (equivalently: a patch carrying every field).
    Replace(T),
    /// Shallow-merge a partial value over the current state.
    Patch(T::Patch),
}

impl<T: StateValue> Update<T> {
    /// Full replacement update.
    #[must_use]
    pub fn replace(value: T) -> Self {
        Self::Replace(value)
    }

    /// Partial update, shallow-merged over the current state.
    #[must_use]
    pub fn patch(patch: T::Patch) -> Self {
        Self::Patch(patch)
    }
}

impl<T: StateValue> From<T> for Update<T> {
    fn from(value: T) -> Self {
        Self::Replace(value)
    }
}

macro_rules! scalar_state_value {
    ($($ty:ty),* $(,)?) => {$(
        impl StateValue for $ty {
            type Patch = $ty;

            fn classify(&self) -> Semantics {
                Semantics::Scalar
            }

            fn merge(&mut self, patch: Self::Patch) -> Result<(), StateError> {
                *self = patch;
                Ok(())
            }
        }
    )*};
}

scalar_state_value!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, String,
    &'static str,
);

/// Dynamically shaped state.
///
/// Classification depends on the runtime shape: JSON objects are
/// composite, everything else is scalar. This is the one impl where a
/// merge can fail — patching an object with a non-object (or the reverse)
/// is a [`StateError::ShapeMismatch`], not a silent misclassified merge.
impl StateValue for serde_json::Value {
    type Patch = serde_json::Value;

    fn classify(&self) -> Semantics {
        if self.is_object() {
            Semantics::Composite
        } else {
            Semantics::Scalar
        }
    }

    fn merge(&mut self, patch: Self::Patch) -> Result<(), StateError> {
        match (&mut *self, patch) {
            (serde_json::Value::Object(base), serde_json::Value::Object(incoming)) => {
                for (key, value) in incoming {
                    base.insert(key, value);
                }
                Ok(())
            }
            // At most one side is an object here.
            (base, patch) => match (base.classify(), patch.classify()) {
                (Semantics::Scalar, Semantics::Scalar) => {
                    *base = patch;
                    Ok(())
                }
                (expected, actual) => Err(StateError::ShapeMismatch { expected, actual }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalars_classify_scalar() {
        assert_eq!(0i32.classify(), Semantics::Scalar);
        assert_eq!(false.classify(), Semantics::Scalar);
        assert_eq!(String::new().classify(), Semantics::Scalar);
    }

    #[test]
    fn scalar_merge_replaces() {
        let mut value = 3i64;
        value.merge(7).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn json_object_is_composite() {
        assert_eq!(json!({"a": 1}).classify(), Semantics::Composite);
        assert_eq!(json!(5).classify(), Semantics::Scalar);
        assert_eq!(json!([1, 2]).classify(), Semantics::Scalar);
        assert_eq!(json!(null).classify(), Semantics::Scalar);
    }

    #[test]
    fn json_merge_is_shallow() {
        let mut base = json!({"a": 0, "b": 2, "nested": {"x": 1}});
        base.merge(json!({"a": 1, "nested": {"y": 2}})).unwrap();
        // Top-level keys overwritten, untouched keys preserved, nested
        // objects replaced (not deep-merged).
        assert_eq!(base, json!({"a": 1, "b": 2, "nested": {"y": 2}}));
    }

    #[test]
    fn json_shape_flip_rejected() {
        let mut object = json!({"a": 1});
        let err = object.merge(json!(5)).unwrap_err();
        assert_eq!(
            err,
            StateError::ShapeMismatch {
                expected: Semantics::Composite,
                actual: Semantics::Scalar,
            }
        );
        // Base untouched on rejection.
        assert_eq!(object, json!({"a": 1}));

        let mut scalar = json!(5);
        assert!(scalar.merge(json!({"a": 1})).is_err());
        assert_eq!(scalar, json!(5));
    }

    #[test]
    fn update_from_value_is_replace() {
        let update: Update<i32> = 5.into();
        assert!(matches!(update, Update::Replace(5)));
    }
}
