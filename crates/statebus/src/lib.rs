#![forbid(unsafe_code)]

//! Shared reactive state containers with change notification.
//!
//! `statebus` lets UI components read and mutate shared state outside the
//! component hierarchy, with automatic refresh on change:
//!
//! - [`StateContainer<T>`]: a shared handle to one piece of state with
//!   subscriber fan-out. Merge-vs-replace semantics are fixed once, at
//!   construction, by classifying the initial value ([`Semantics`]).
//! - [`StateBinding<T>`]: the per-observer adapter — registers on
//!   construction, marks itself dirty on notification, re-reads lazily,
//!   deregisters on drop.
//! - [`BindingScope`]: bulk lifecycle management for a widget's
//!   subscriptions.
//!
//! # Quick start
//!
//! ```
//! use statebus::{StateBinding, StateContainer, Update};
//! use serde_json::json;
//!
//! let counter = StateContainer::new(json!({"count": 0}));
//!
//! // One binding per observing component instance.
//! let binding = StateBinding::new(&counter);
//! binding
//!     .update_with(|state| {
//!         let count = state["count"].as_i64().unwrap_or(0);
//!         Update::patch(json!({"count": count + 1}))
//!     })
//!     .unwrap();
//! assert_eq!(binding.get(), json!({"count": 1}));
//! ```
//!
//! # Concurrency
//!
//! Single-threaded by construction (`Rc`-based sharing). All operations
//! are synchronous; notification fan-out is reentrant-tolerant. See the
//! [`container`] module docs for the full model.

pub mod binding;
pub mod container;
pub mod error;
pub mod value;

pub use binding::{BindingScope, StateBinding};
pub use container::{NotifyFn, NotifyPolicy, StateContainer, Subscription, create_container};
pub use error::StateError;
pub use value::{Semantics, StateValue, Update};
