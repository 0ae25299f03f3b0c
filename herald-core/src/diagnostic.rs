//! Diagnostics: the only channel through which hub failures are observed.
//!
//! Hub operations never fail the caller's control flow. Everything that goes
//! wrong (or, with tracing on, everything that happens) is described by a
//! [`Diagnostic`] and handed to a [`DiagnosticSink`].

use crate::error::{ChannelMismatch, ListenerError};
use std::fmt;
use thiserror::Error;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Verbose tracing output.
    Debug,
    /// Something was skipped but nothing is broken.
    Warn,
    /// A programming error or a failing listener.
    Error,
}

/// The hub operation a diagnostic refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Registering a listener.
    Register,
    /// Unregistering a listener.
    Unregister,
    /// Invoking a key.
    Invoke,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Register => "register",
            Operation::Unregister => "unregister",
            Operation::Invoke => "invoke",
        })
    }
}

/// A structured, non-fatal report from the dispatch layer.
#[derive(Error, Debug)]
pub enum Diagnostic {
    /// No hub was discoverable when an operation was attempted.
    #[error("no dispatch hub found to {operation} `{key}`")]
    MissingHub {
        /// The attempted operation.
        operation: Operation,
        /// Label of the key involved.
        key: String,
    },

    /// A registration was dropped because its payload type does not match the key.
    #[error("register rejected")]
    RegisterMismatch(#[source] ChannelMismatch),

    /// An invocation was aborted because its payload type does not match the key.
    #[error("invoke aborted")]
    InvokeMismatch(#[source] ChannelMismatch),

    /// A listener failed during an invoke pass. Delivery continued.
    #[error("listener for `{key}` failed")]
    ListenerFailed {
        /// Label of the invoked key.
        key: String,
        /// What went wrong.
        #[source]
        error: ListenerError,
    },

    /// Trace of one invocation, emitted when tracing is enabled for the key.
    #[error("event `{key}` invoked{}", trace_suffix(.payload))]
    InvokeTrace {
        /// Label of the invoked key.
        key: String,
        /// `Debug` rendering of the payload, for typed channels.
        payload: Option<String>,
    },
}

fn trace_suffix(payload: &Option<String>) -> String {
    payload
        .as_ref()
        .map(|p| format!(" with {p}"))
        .unwrap_or_default()
}

impl Diagnostic {
    /// The severity of this diagnostic.
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::MissingHub { .. } => Severity::Warn,
            Diagnostic::RegisterMismatch(_)
            | Diagnostic::InvokeMismatch(_)
            | Diagnostic::ListenerFailed { .. } => Severity::Error,
            Diagnostic::InvokeTrace { .. } => Severity::Debug,
        }
    }

    /// Label of the key this diagnostic is about.
    pub fn key(&self) -> &str {
        match self {
            Diagnostic::MissingHub { key, .. }
            | Diagnostic::ListenerFailed { key, .. }
            | Diagnostic::InvokeTrace { key, .. } => key,
            Diagnostic::RegisterMismatch(m) | Diagnostic::InvokeMismatch(m) => &m.key,
        }
    }
}

/// Receiver of hub diagnostics.
///
/// Any `Fn(&Diagnostic) + Send + Sync` closure is a sink.
pub trait DiagnosticSink: Send + Sync + 'static {
    /// Receive one diagnostic.
    fn report(&self, diagnostic: &Diagnostic);
}

impl<F> DiagnosticSink for F
where
    F: Fn(&Diagnostic) + Send + Sync + 'static,
{
    fn report(&self, diagnostic: &Diagnostic) {
        self(diagnostic)
    }
}
