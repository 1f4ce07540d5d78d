use std::sync::Mutex;

/// Sink for the one-line-per-invocation pass/fail record.
pub trait RunLog: Send + Sync {
    fn log_pass(&self, msg: &str);
    fn log_fail(&self, msg: &str);
    fn log_warn(&self, msg: &str);
}

/// Routes run records into `tracing`: passes at debug (file-oriented
/// progress), failures at error, degraded parses at warn.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingRunLog;

impl RunLog for TracingRunLog {
    fn log_pass(&self, msg: &str) {
        tracing::debug!(target: "autolocal::wp", "{msg}");
    }

    fn log_fail(&self, msg: &str) {
        tracing::error!(target: "autolocal::wp", "{msg}");
    }

    fn log_warn(&self, msg: &str) {
        tracing::warn!(target: "autolocal::wp", "{msg}");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Pass,
    Fail,
    Warn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub level: LogLevel,
    pub message: String,
}

/// In-memory sink, mostly for tests and for callers that want to surface
/// the records themselves.
#[derive(Debug, Default)]
pub struct MemoryRunLog {
    lines: Mutex<Vec<LogLine>>,
}

impl MemoryRunLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, level: LogLevel, msg: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(LogLine {
                level,
                message: msg.to_string(),
            });
        }
    }

    pub fn lines(&self) -> Vec<LogLine> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn count(&self, level: LogLevel) -> usize {
        self.lines().iter().filter(|l| l.level == level).count()
    }
}

impl RunLog for MemoryRunLog {
    fn log_pass(&self, msg: &str) {
        self.push(LogLevel::Pass, msg);
    }

    fn log_fail(&self, msg: &str) {
        self.push(LogLevel::Fail, msg);
    }

    fn log_warn(&self, msg: &str) {
        self.push(LogLevel::Warn, msg);
    }
}
