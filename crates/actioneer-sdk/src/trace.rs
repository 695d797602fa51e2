/// Diagnostic output abstraction used by every engine layer.
///
/// Lower layers never log through a global; they are handed an
/// `Arc<dyn TraceWriter>` so callers decide whether messages reach `tracing`,
/// get masked first, or are captured for assertions.
pub trait TraceWriter: Send + Sync {
    /// Log an informational message.
    fn info(&self, message: &str);

    /// Log a verbose / debug message.
    fn verbose(&self, message: &str);

    /// Log a warning message.
    fn warning(&self, message: &str) {
        self.info(&format!("[warning] {message}"));
    }

    /// Log an error message.
    fn error(&self, message: &str) {
        self.info(&format!("[error] {message}"));
    }
}

/// Discards all messages.
#[derive(Debug, Clone)]
pub struct NullTraceWriter;

impl TraceWriter for NullTraceWriter {
    fn info(&self, _message: &str) {}
    fn verbose(&self, _message: &str) {}
    fn warning(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
}

/// Level of a message captured by [`CollectingTraceWriter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceLevel {
    Info,
    Verbose,
    Warning,
    Error,
}

/// Captures messages in memory so tests can assert on what was traced.
#[derive(Debug, Default)]
pub struct CollectingTraceWriter {
    messages: parking_lot::Mutex<Vec<(TraceLevel, String)>>,
}

impl CollectingTraceWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every captured message, oldest first.
    pub fn messages(&self) -> Vec<(TraceLevel, String)> {
        self.messages.lock().clone()
    }

    /// True when any captured message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.messages.lock().iter().any(|(_, m)| m.contains(needle))
    }

    pub fn clear(&self) {
        self.messages.lock().clear();
    }

    fn push(&self, level: TraceLevel, message: &str) {
        self.messages.lock().push((level, message.to_string()));
    }
}

impl TraceWriter for CollectingTraceWriter {
    fn info(&self, message: &str) {
        self.push(TraceLevel::Info, message);
    }

    fn verbose(&self, message: &str) {
        self.push(TraceLevel::Verbose, message);
    }

    fn warning(&self, message: &str) {
        self.push(TraceLevel::Warning, message);
    }

    fn error(&self, message: &str) {
        self.push(TraceLevel::Error, message);
    }
}
