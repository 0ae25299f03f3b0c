//! Error types for Herald.
//!
//! None of these ever reach the caller of a hub operation as an `Err`. They
//! travel inside [`Diagnostic`](crate::Diagnostic) values to the sink.
//!
//! - [`ListenerError`] - A listener failed during an invoke pass
//! - [`ChannelMismatch`] - A key was used with the wrong payload type
//! - [`LocatorError`] - The process-wide hub slot rejected an operation

use crate::payload::Channel;
use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by a single listener call.
#[derive(Error, Debug)]
pub enum ListenerError {
    /// The listener returned an error.
    #[error("listener returned an error")]
    Failed(#[source] BoxError),

    /// The listener panicked.
    #[error("listener panicked: {0}")]
    Panicked(String),
}

impl ListenerError {
    /// Build a `Panicked` error from a caught panic payload.
    pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_owned()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_owned()
        };
        ListenerError::Panicked(message)
    }
}

impl From<BoxError> for ListenerError {
    fn from(err: BoxError) -> Self {
        ListenerError::Failed(err)
    }
}

/// A key was registered or invoked as a channel other than the one it is bound to.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("channel `{key}` is bound as {bound}, not {attempted}")]
pub struct ChannelMismatch {
    /// Label of the offending key.
    pub key: String,
    /// The channel the key is already bound (or declared) as.
    pub bound: Channel,
    /// The channel the caller tried to use.
    pub attempted: Channel,
}

/// Errors from the process-wide hub slot.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocatorError {
    /// A live hub already occupies the slot.
    #[error("a dispatch hub is already installed")]
    AlreadyInstalled,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::PayloadTag;

    #[test]
    fn test_panic_message_extraction() {
        let err = ListenerError::from_panic(&"boom");
        assert!(matches!(err, ListenerError::Panicked(ref m) if m == "boom"));

        let owned: Box<dyn std::any::Any + Send> = Box::new(String::from("owned boom"));
        let err = ListenerError::from_panic(owned.as_ref());
        assert_eq!(err.to_string(), "listener panicked: owned boom");

        let err = ListenerError::from_panic(&42u8);
        assert_eq!(err.to_string(), "listener panicked: non-string panic payload");
    }

    #[test]
    fn test_mismatch_display() {
        let err = ChannelMismatch {
            key: "Health".into(),
            bound: Channel::Typed(PayloadTag::of::<i32>()),
            attempted: Channel::Typed(PayloadTag::of::<u64>()),
        };
        assert_eq!(
            err.to_string(),
            "channel `Health` is bound as typed<i32>, not typed<u64>"
        );
    }
}
