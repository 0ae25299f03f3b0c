//! # herald-std
//!
//! Standard implementation of the Herald dispatch hub.
//!
//! This crate provides:
//! - **Hub**: [`DispatchHub`], [`HubBuilder`], [`HubConfig`]
//! - **RAII registrations**: [`Subscription`]
//! - **Process-wide slot**: [`locator`]
//! - **Diagnostic sinks**: [`NullSink`], `TracingSink` (feature `tracing`)
//! - **Testing**: [`testing::RecordingSink`], [`testing::CallLog`]

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core types
pub use herald_core;

// Modules
pub mod config;
pub mod hub;
pub mod locator;
pub mod sinks;
pub mod subscription;
pub mod testing;

pub use config::HubConfig;
pub use hub::{DispatchHub, DispatchReport, HubBuilder, RegisterOutcome};
pub use locator::LocatorGuard;
#[cfg(feature = "tracing")]
pub use sinks::TracingSink;
pub use sinks::{NullSink, default_sink};
pub use subscription::Subscription;
