use std::{fmt, sync::Arc};

use parking_lot::Mutex;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Trace,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Trace => write!(f, "trace"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Receiver of diagnostic messages emitted by layout components.
pub trait DiagnosticSink: Send + Sync + 'static {
    fn emit(&self, severity: Severity, component: &'static str, message: fmt::Arguments<'_>);
}

/// Forwards diagnostics to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, severity: Severity, component: &'static str, message: fmt::Arguments<'_>) {
        match severity {
            Severity::Trace => {
                tracing::event!(target: "vedx", tracing::Level::TRACE, component, "{message}")
            }
            Severity::Warning => {
                tracing::event!(target: "vedx", tracing::Level::WARN, component, "{message}")
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl DiagnosticSink for NoopSink {
    #[inline(always)]
    fn emit(&self, _severity: Severity, _component: &'static str, _message: fmt::Arguments<'_>) {}
}

/// Single recorded diagnostic message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    pub severity: Severity,
    pub component: &'static str,
    pub message: String,
}

/// Keeps every message it receives.
#[derive(Debug, Default)]
pub struct RecordingSink {
    records: Mutex<Vec<Record>>,
}

impl RecordingSink {
    pub fn records(&self) -> Vec<Record> {
        self.records.lock().clone()
    }

    pub fn warnings(&self) -> Vec<Record> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.severity == Severity::Warning)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl DiagnosticSink for RecordingSink {
    fn emit(&self, severity: Severity, component: &'static str, message: fmt::Arguments<'_>) {
        self.records.lock().push(Record {
            severity,
            component,
            message: message.to_string(),
        });
    }
}

/// Diagnostics context injected into component constructors.
///
/// The default context forwards to `tracing`, which stays silent unless
/// a subscriber is installed.
#[derive(Clone)]
pub struct Diagnostics {
    sink: Arc<dyn DiagnosticSink>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Diagnostics::tracing()
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics").finish_non_exhaustive()
    }
}

impl Diagnostics {
    pub fn new(sink: Arc<dyn DiagnosticSink>) -> Self {
        Diagnostics { sink }
    }

    pub fn tracing() -> Self {
        Diagnostics::new(Arc::new(TracingSink))
    }

    pub fn noop() -> Self {
        Diagnostics::new(Arc::new(NoopSink))
    }

    /// Returns context that records messages into returned sink.
    pub fn recording() -> (Self, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        (Diagnostics::new(sink.clone()), sink)
    }

    #[inline]
    pub fn trace(&self, component: &'static str, message: fmt::Arguments<'_>) {
        self.sink.emit(Severity::Trace, component, message);
    }

    #[inline]
    pub fn warn(&self, component: &'static str, message: fmt::Arguments<'_>) {
        self.sink.emit(Severity::Warning, component, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_keeps_order_and_severity() {
        let (diagnostics, sink) = Diagnostics::recording();
        diagnostics.trace("test", format_args!("first {}", 1));
        diagnostics.warn("test", format_args!("second"));

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].message, "first 1");
        assert_eq!(records[0].severity, Severity::Trace);
        assert_eq!(sink.warnings().len(), 1);
        assert_eq!(sink.warnings()[0].message, "second");

        sink.clear();
        assert!(sink.records().is_empty());
    }

    #[test]
    fn noop_and_tracing_accept_messages() {
        Diagnostics::noop().warn("test", format_args!("dropped"));
        Diagnostics::default().trace("test", format_args!("no subscriber"));
    }
}
