#![forbid(unsafe_code)]

//! Presentation helper for rendering bound state as text.
//!
//! [`StateRenderer`] is a thin convenience on top of `statebus`: it pairs a
//! zero-argument state-producing closure (typically a
//! [`StateBinding::get`] call) with an optional custom renderer. With no
//! custom renderer, composite state renders as its JSON serialization and
//! scalar state renders directly as text (JSON string values unquoted).
//!
//! ```
//! use statebus::{StateBinding, StateContainer};
//! use statebus_render::StateRenderer;
//! use serde_json::json;
//!
//! let container = StateContainer::new(json!({"count": 0}));
//! let binding = StateBinding::new(&container);
//! let renderer = StateRenderer::new(move || binding.get());
//!
//! assert_eq!(renderer.render(), r#"{"count":0}"#);
//! container.patch(json!({"count": 3})).unwrap();
//! assert_eq!(renderer.render(), r#"{"count":3}"#);
//! ```
//!
//! [`StateBinding::get`]: statebus::StateBinding::get

use serde::Serialize;
use statebus::{Semantics, StateValue};
use tracing::debug;

/// Renders produced state to a `String`, via a custom renderer when one is
/// supplied and a shape-appropriate default otherwise.
pub struct StateRenderer<T, P>
where
    P: Fn() -> T,
{
    producer: P,
    renderer: Option<Box<dyn Fn(&T) -> String>>,
}

impl<T, P> StateRenderer<T, P>
where
    T: StateValue + Serialize,
    P: Fn() -> T,
{
    /// Create a renderer around a state-producing closure, using the
    /// default rendering.
    #[must_use]
    pub fn new(producer: P) -> Self {
        Self {
            producer,
            renderer: None,
        }
    }

    /// Replace the default rendering with a custom renderer.
    #[must_use]
    pub fn with_renderer(mut self, renderer: impl Fn(&T) -> String + 'static) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    /// Produce the current state and render it.
    ///
    /// A custom renderer always wins. Otherwise composite state renders as
    /// JSON and scalar state as plain text.
    #[must_use]
    pub fn render(&self) -> String {
        let state = (self.producer)();
        if let Some(renderer) = &self.renderer {
            return renderer(&state);
        }
        match state.classify() {
            Semantics::Composite => match serde_json::to_string(&state) {
                Ok(text) => text,
                Err(error) => {
                    debug!(%error, "state serialization failed, rendering empty");
                    String::new()
                }
            },
            Semantics::Scalar => scalar_text(&state),
        }
    }
}

impl<T, P> std::fmt::Debug for StateRenderer<T, P>
where
    P: Fn() -> T,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateRenderer")
            .field("custom_renderer", &self.renderer.is_some())
            .finish()
    }
}

/// Scalar default: plain text, not a JSON literal (strings unquoted).
fn scalar_text<T: Serialize>(state: &T) -> String {
    match serde_json::to_value(state) {
        Ok(serde_json::Value::String(text)) => text,
        Ok(value) => value.to_string(),
        Err(error) => {
            debug!(%error, "state serialization failed, rendering empty");
            String::new()
        }
    }
}
