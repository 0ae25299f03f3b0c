use super::DispatchHub;
use crate::{config::HubConfig, sinks::default_sink};
use herald_core::DiagnosticSink;
use std::sync::Arc;

/// Builder for constructing a [`DispatchHub`].
///
/// # Example
/// ```ignore
/// let hub = DispatchHub::builder()
///     .config(HubConfig::new().with_trace_all(true))
///     .sink(|d: &Diagnostic| eprintln!("{d}"))
///     .build_shared();
/// ```
pub struct HubBuilder {
    config: HubConfig,
    sink: Option<Arc<dyn DiagnosticSink>>,
}

impl HubBuilder {
    /// Create a builder with the default config and sink.
    pub fn new() -> Self {
        Self {
            config: HubConfig::new(),
            sink: None,
        }
    }

    /// Replace the configuration.
    pub fn config(mut self, config: HubConfig) -> Self {
        self.config = config;
        self
    }

    /// Route diagnostics to `sink`.
    pub fn sink<S: DiagnosticSink>(mut self, sink: S) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    /// Route diagnostics to an already shared sink.
    pub fn shared_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Build the hub.
    pub fn build(self) -> DispatchHub {
        let sink = self.sink.unwrap_or_else(default_sink);
        DispatchHub::from_parts(self.config, sink)
    }

    /// Build the hub behind an `Arc`, ready for subscriptions and the locator.
    pub fn build_shared(self) -> Arc<DispatchHub> {
        Arc::new(self.build())
    }
}

impl Default for HubBuilder {
    fn default() -> Self {
        Self::new()
    }
}
