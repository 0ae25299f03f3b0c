//! Standard diagnostic sinks.
//!
//! - [`TracingSink`]: forwards to `tracing` (requires the `tracing` feature)
//! - [`NullSink`]: discards everything

use herald_core::{Diagnostic, DiagnosticSink};
use std::{error::Error, sync::Arc};

/// A sink that drops every diagnostic.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&self, _diagnostic: &Diagnostic) {}
}

/// A sink that logs diagnostics through `tracing`.
///
/// Severities map to `warn!`, `error!` and `debug!`. Listener failures carry
/// the full source chain in the `error` field.
#[cfg(feature = "tracing")]
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

#[cfg(feature = "tracing")]
impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: &Diagnostic) {
        match diagnostic {
            Diagnostic::MissingHub { operation, key } => {
                tracing::warn!(%operation, %key, "no dispatch hub found");
            }
            Diagnostic::RegisterMismatch(mismatch) => {
                tracing::error!(
                    key = %mismatch.key,
                    bound = %mismatch.bound,
                    attempted = %mismatch.attempted,
                    "register rejected: payload type mismatch"
                );
            }
            Diagnostic::InvokeMismatch(mismatch) => {
                tracing::error!(
                    key = %mismatch.key,
                    bound = %mismatch.bound,
                    attempted = %mismatch.attempted,
                    "invoke aborted: payload type mismatch"
                );
            }
            Diagnostic::ListenerFailed { key, error } => {
                tracing::error!(%key, error = %error_chain(error), "listener failed");
            }
            Diagnostic::InvokeTrace { key, payload } => {
                tracing::debug!(%key, payload = ?payload, "event invoked");
            }
        }
    }
}

/// The sink a hub uses when none is configured.
///
/// `TracingSink` with the `tracing` feature, `NullSink` without it.
pub fn default_sink() -> Arc<dyn DiagnosticSink> {
    #[cfg(feature = "tracing")]
    {
        Arc::new(TracingSink)
    }

    #[cfg(not(feature = "tracing"))]
    {
        Arc::new(NullSink)
    }
}

/// Render an error and all of its sources as `outer: inner: root`.
pub fn error_chain(error: &(dyn Error + 'static)) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}
