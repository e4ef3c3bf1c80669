//! Conditional tracing macros (zero-cost when feature disabled).
//!
//! With the `tracing` feature, registration and blending emit spans and
//! events through the `tracing` crate; without it the macros expand to
//! nothing.

/// Create an info-level span around a registration or blend stage.
#[cfg(feature = "tracing")]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        tracing::info_span!($name $(, $($field)*)?)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        $crate::trace::NoopSpan
    };
}

/// Emit an info-level event for key measurements.
///
/// Without the `tracing` feature the field values go through
/// `discard_fields!`.
#[cfg(feature = "tracing")]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::info!(name: $name, $($key = $value),+)
    };
    ($name:expr) => {
        tracing::info!(name: $name)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        $crate::trace::discard_fields!($($value),+)
    };
    ($name:expr) => {};
}

/// Emit a warn-level event for results that fell back or did not converge.
///
/// Disabled the same way as `trace_event!`.
#[cfg(feature = "tracing")]
macro_rules! trace_warn {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::warn!(name: $name, $($key = $value),+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_warn {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        $crate::trace::discard_fields!($($value),+)
    };
}

/// Evaluates event field values and drops them, so disabled events leave no
/// unused bindings behind.
#[cfg(not(feature = "tracing"))]
macro_rules! discard_fields {
    ($($value:expr),+) => {
        let _ = ($($value,)+);
    };
}

#[cfg(not(feature = "tracing"))]
pub(crate) use discard_fields;
pub(crate) use trace_event;
pub(crate) use trace_span;
pub(crate) use trace_warn;

/// A no-op span guard used when tracing is disabled.
///
/// Lets `let _guard = trace_span!(...).entered();` compile unchanged in both
/// configurations.
#[cfg(not(feature = "tracing"))]
pub struct NoopSpan;

#[cfg(not(feature = "tracing"))]
impl NoopSpan {
    /// Returns self, mimicking `Span::entered()`.
    #[inline]
    pub fn entered(self) -> Self {
        self
    }
}
