//! Destination for `print` and `log.*` output from description files.
//!
//! - Tracing: forwards to `tracing` events (default)
//! - Buffer: captures lines for assertions in tests
//! - Silent: discards everything
//!
//! Uses enum dispatch; the sink is shared by every execution context.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

/// Severity of a diagnostic raised from a description file.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Debug,
    Info,
    Notice,
    Warning,
    Error,
    Fatal,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Notice => "notice",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        }
    }

    pub fn from_name(name: &str) -> Option<Severity> {
        match name {
            "debug" => Some(Severity::Debug),
            "info" => Some(Severity::Info),
            "notice" => Some(Severity::Notice),
            "warning" => Some(Severity::Warning),
            "error" => Some(Severity::Error),
            "fatal" => Some(Severity::Fatal),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One captured line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogRecord {
    pub severity: Severity,
    pub message: String,
}

/// Sink that captures records.
#[derive(Default)]
pub struct BufferLogSink {
    records: Mutex<Vec<LogRecord>>,
}

impl BufferLogSink {
    pub fn new() -> Self {
        BufferLogSink::default()
    }

    pub fn log(&self, severity: Severity, message: &str) {
        self.records.lock().push(LogRecord {
            severity,
            message: message.to_string(),
        });
    }

    /// Captured records, oldest first.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

pub enum LogSinkImpl {
    Tracing,
    Buffer(BufferLogSink),
    Silent,
}

impl LogSinkImpl {
    pub fn log(&self, severity: Severity, message: &str) {
        match self {
            Self::Tracing => emit(severity, message),
            Self::Buffer(b) => b.log(severity, message),
            Self::Silent => {}
        }
    }

    /// Captured records; empty unless this is a buffer sink.
    pub fn records(&self) -> Vec<LogRecord> {
        match self {
            Self::Buffer(b) => b.records(),
            Self::Tracing | Self::Silent => Vec::new(),
        }
    }
}

fn emit(severity: Severity, message: &str) {
    match severity {
        Severity::Debug => tracing::debug!(target: "sky::build_file", "{message}"),
        Severity::Info => tracing::info!(target: "sky::build_file", "{message}"),
        Severity::Notice => tracing::info!(target: "sky::build_file", notice = true, "{message}"),
        Severity::Warning => tracing::warn!(target: "sky::build_file", "{message}"),
        Severity::Error | Severity::Fatal => {
            tracing::error!(target: "sky::build_file", severity = %severity, "{message}");
        }
    }
}

pub type SharedLogSink = Arc<LogSinkImpl>;

pub fn tracing_sink() -> SharedLogSink {
    Arc::new(LogSinkImpl::Tracing)
}

pub fn buffer_sink() -> SharedLogSink {
    Arc::new(LogSinkImpl::Buffer(BufferLogSink::new()))
}

pub fn silent_sink() -> SharedLogSink {
    Arc::new(LogSinkImpl::Silent)
}
