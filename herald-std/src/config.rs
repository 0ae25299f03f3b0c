//! Hub configuration.

/// Tuning and behavior switches for a [`DispatchHub`](crate::DispatchHub).
///
/// # Example
/// ```ignore
/// let config = HubConfig::new()
///     .with_initial_capacity(128)
///     .with_trace_all(true);
/// let hub = DispatchHub::builder().config(config).build();
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubConfig {
    /// Initial capacity of each registration table.
    pub initial_capacity: usize,
    /// Initial capacity of each key's listener sequence.
    pub sequence_capacity: usize,
    /// Emit an invoke trace for every key, not only keys flagged for tracing.
    pub trace_all: bool,
    /// Capture listener panics and report them instead of unwinding into the
    /// invoker.
    pub catch_panics: bool,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl HubConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self {
            initial_capacity: 64,
            sequence_capacity: 4,
            trace_all: false,
            catch_panics: true,
        }
    }

    /// Set the table capacity.
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Set the per-key sequence capacity.
    pub fn with_sequence_capacity(mut self, capacity: usize) -> Self {
        self.sequence_capacity = capacity;
        self
    }

    /// Trace every invocation.
    pub fn with_trace_all(mut self, enabled: bool) -> Self {
        self.trace_all = enabled;
        self
    }

    /// Set whether listener panics are captured.
    pub fn with_catch_panics(mut self, enabled: bool) -> Self {
        self.catch_panics = enabled;
        self
    }
}
