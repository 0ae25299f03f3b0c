//! # herald - Keyed Event Dispatch Hub
//!
//! `herald` decouples the code that announces an event from the code that
//! reacts to it. Producers invoke a [`DispatchKey`]; every listener registered
//! under that key runs, in registration order, with the payload handed to it.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use herald::prelude::*;
//!
//! let hub = DispatchHub::new();
//! let health = TypedKey::with_default("Health", 100_i32);
//!
//! let on_health = TypedListener::new(|hp: &i32| println!("hp = {hp}"));
//! hub.register_to(&health, &on_health);
//!
//! hub.invoke_with(&health, 5);  // hp = 5
//! hub.invoke_default(&health);  // hp = 100
//! ```
//!
//! Untyped channels carry no payload:
//!
//! ```rust,ignore
//! let score = DispatchKey::new("Score");
//! hub.register(&score, &Listener::new(|| println!("scored")));
//! hub.invoke(&score);
//! ```
//!
//! A key's first registration binds its channel. Registering or invoking it
//! with another payload type is rejected with a diagnostic and never panics.

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use herald_core::{
    // Errors
    BoxError,
    // Payload channels
    Channel,
    ChannelMismatch,
    // Diagnostics
    Diagnostic,
    DiagnosticSink,
    // Keys
    DispatchKey,
    KeyFlags,
    KeyId,
    // Listeners
    Listener,
    ListenerError,
    ListenerHandle,
    ListenerOutcome,
    LocatorError,
    Operation,
    Payload,
    PayloadTag,
    Severity,
    TypedKey,
    TypedListener,
};

// Hub
pub use herald_std::{
    DispatchHub, DispatchReport, HubBuilder, HubConfig, LocatorGuard, RegisterOutcome,
    Subscription,
};

/// Process-wide hub slot.
pub mod locator {
    #![allow(clippy::wildcard_imports)]
    pub use herald_std::locator::*;
}

/// Diagnostic sinks.
pub mod sinks {
    #![allow(clippy::wildcard_imports)]
    pub use herald_std::sinks::*;
}

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use herald_std::testing::*;
}

/// Prelude module - common imports for Herald.
///
/// # Usage
///
/// ```rust,ignore
/// use herald::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Hub
        DispatchHub,
        DispatchKey,
        DispatchReport,
        Listener,
        Payload,
        RegisterOutcome,
        Subscription,
        TypedKey,
        TypedListener,
        // Errors
        BoxError,
    };
}
