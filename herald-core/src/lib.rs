//! # herald-core
//!
//! Leaf types for the Herald event dispatch hub.
//!
//! This crate has minimal dependencies and is designed to be imported by
//! code that produces keys or listeners without depending on the hub itself.
//!
//! # Building Blocks
//!
//! ## Keys ([`DispatchKey`], [`TypedKey`])
//!
//! Identity tokens for event channels. Equality is by identity, never by
//! label. A typed key fixes its payload type at construction and may carry a
//! default payload.
//!
//! ## Listeners ([`Listener`], [`TypedListener`])
//!
//! Handles that give closures a registration identity. Clones share the
//! identity, so the same handle can be passed to `register` and later to
//! `unregister`.
//!
//! ## Diagnostics ([`Diagnostic`], [`DiagnosticSink`])
//!
//! Every failure in the dispatch layer is reported, never raised.
//!
//! # Error Types
//!
//! - [`ListenerError`] - A listener call failed or panicked
//! - [`ChannelMismatch`] - A key was used with the wrong payload type
//! - [`LocatorError`] - The process-wide hub slot rejected an install

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod diagnostic;
mod error;
mod key;
mod listener;
mod payload;

// Re-exports
pub use diagnostic::{Diagnostic, DiagnosticSink, Operation, Severity};
pub use error::{BoxError, ChannelMismatch, ListenerError, LocatorError};
pub use key::{DispatchKey, KeyFlags, KeyId, TypedKey};
pub use listener::{Listener, ListenerHandle, ListenerOutcome, TypedListener};
pub use payload::{AnyPayload, Channel, Payload, PayloadTag};
