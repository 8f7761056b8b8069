//! Tracing shims for the streaming loops.
//!
//! Every span and event is emitted under the `streamfilter` target so a single
//! `streamfilter=info` directive covers the filter, separable, batch and
//! pipeline loops alike. Without the `tracing` feature spans collapse to
//! [`DisabledSpan`] and event fields are evaluated and dropped.

/// Info-level span around one stream run.
#[cfg(feature = "tracing")]
macro_rules! trace_span {
    ($name:literal $(, $($field:tt)*)?) => {
        tracing::info_span!(target: "streamfilter", $name $(, $($field)*)?)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_span {
    ($name:literal $(, $($field:tt)*)?) => {
        $crate::trace::DisabledSpan
    };
}

/// Info-level completion event; `$name` becomes the message.
#[cfg(feature = "tracing")]
macro_rules! trace_event {
    ($name:literal, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::info!(target: "streamfilter", $($key = $value,)+ $name)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_event {
    ($name:literal, $($key:ident = $value:expr),+ $(,)?) => {
        let _ = ($($value,)+);
    };
}

/// Warn-level event for a stage that ended with an error.
#[cfg(feature = "tracing")]
macro_rules! trace_failure {
    ($stage:expr, $err:expr) => {
        tracing::warn!(target: "streamfilter", stage = $stage, error = %$err, "stage failed")
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_failure {
    ($stage:expr, $err:expr) => {
        let _ = (&$stage, &$err);
    };
}

pub(crate) use trace_event;
pub(crate) use trace_failure;
pub(crate) use trace_span;

/// Guard standing in for an entered span when tracing is compiled out.
#[cfg(not(feature = "tracing"))]
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct DisabledSpan;

#[cfg(not(feature = "tracing"))]
impl DisabledSpan {
    #[inline]
    pub(crate) fn entered(self) -> Self {
        self
    }
}
