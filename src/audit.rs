//! Audit channel for deep-mode analysis.
//!
//! Deep mode requires every run to leave an audit trail. The engine reports
//! `AuditEvent`s to a caller-supplied `AuditSink`; what the sink does with
//! them (and how it fails) is up to the caller.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use serde_json::Value;

/// Receives audit notifications.
pub trait AuditSink: Send + Sync {
    fn notify(&self, event_type: &str, payload: &Value);
}

impl<F> AuditSink for F
where
    F: Fn(&str, &Value) + Send + Sync,
{
    fn notify(&self, event_type: &str, payload: &Value) {
        self(event_type, payload)
    }
}

/// Events emitted while deep mode is active.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    /// Analysis started for a file or project
    AnalysisStarted {
        source: String,
        file_count: usize,
        timestamp: u64,
    },
    /// Deep analysis feature used on a file
    DeepModeAccessed {
        feature: String,
        file: String,
        timestamp: u64,
    },
    /// A file was analyzed successfully
    FileAnalyzed {
        file: String,
        symbols_found: usize,
        timestamp: u64,
    },
    /// A file could not be analyzed
    FileFailed {
        file: String,
        error: String,
        timestamp: u64,
    },
    /// Analysis completed
    AnalysisCompleted {
        source: String,
        file_count: usize,
        symbols_found: usize,
        error_count: usize,
        timestamp: u64,
    },
}

impl AuditEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            AuditEvent::AnalysisStarted { .. } => "analysis_started",
            AuditEvent::DeepModeAccessed { .. } => "deep_mode_accessed",
            AuditEvent::FileAnalyzed { .. } => "file_analyzed",
            AuditEvent::FileFailed { .. } => "file_failed",
            AuditEvent::AnalysisCompleted { .. } => "analysis_completed",
        }
    }

    /// Event fields as a JSON object, without the type tag.
    pub fn payload(&self) -> Value {
        let mut value = serde_json::to_value(self).unwrap_or(Value::Null);
        if let Value::Object(ref mut map) = value {
            map.remove("event");
        }
        value
    }

    /// Deliver this event to a sink.
    pub fn send(&self, sink: &dyn AuditSink) {
        sink.notify(self.event_type(), &self.payload());
    }
}

/// Current Unix timestamp in seconds.
pub fn timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Sink appending one JSON object per event to a file.
pub struct JsonLinesAuditSink {
    writer: Mutex<BufWriter<File>>,
}

impl JsonLinesAuditSink {
    /// Open (or create) the log file in append mode.
    pub fn open<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }
}

impl AuditSink for JsonLinesAuditSink {
    fn notify(&self, event_type: &str, payload: &Value) {
        let line = serde_json::json!({ "event": event_type, "payload": payload });
        // a panic elsewhere while holding the lock must not silence the trail
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
            tracing::warn!("failed to write audit event {}: {}", event_type, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_event_payload_drops_tag() {
        let event = AuditEvent::FileFailed {
            file: "bad.py".to_string(),
            error: "syntax error".to_string(),
            timestamp: 1234567890,
        };
        assert_eq!(event.event_type(), "file_failed");

        let payload = event.payload();
        assert_eq!(payload["file"], "bad.py");
        assert_eq!(payload["timestamp"], 1234567890);
        assert!(payload.get("event").is_none());
    }

    #[test]
    fn test_closure_sink() {
        let seen = Mutex::new(Vec::new());
        let sink = |event_type: &str, _payload: &Value| {
            seen.lock().unwrap().push(event_type.to_string());
        };

        AuditEvent::AnalysisStarted {
            source: ".".to_string(),
            file_count: 2,
            timestamp: 0,
        }
        .send(&sink);

        assert_eq!(*seen.lock().unwrap(), vec!["analysis_started"]);
    }

    #[test]
    fn test_json_lines_sink() {
        let temp = TempDir::new().unwrap();
        let log = temp.path().join("audit.jsonl");

        let sink = JsonLinesAuditSink::open(&log).unwrap();
        sink.notify("analysis_started", &serde_json::json!({ "file_count": 1 }));
        sink.notify("analysis_completed", &serde_json::json!({ "file_count": 1 }));

        let content = std::fs::read_to_string(&log).unwrap();
        let lines: Vec<Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "analysis_started");
        assert_eq!(lines[1]["payload"]["file_count"], 1);
    }

    #[test]
    fn test_json_lines_sink_survives_poisoned_lock() {
        let temp = TempDir::new().unwrap();
        let log = temp.path().join("audit.jsonl");
        let sink = std::sync::Arc::new(JsonLinesAuditSink::open(&log).unwrap());

        let holder = std::sync::Arc::clone(&sink);
        let _ = std::thread::spawn(move || {
            let _guard = holder.writer.lock().unwrap();
            panic!("writer panicked mid-event");
        })
        .join();
        assert!(sink.writer.is_poisoned());

        sink.notify("file_analyzed", &serde_json::json!({ "file": "a.py" }));

        let content = std::fs::read_to_string(&log).unwrap();
        let line: Value = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(line["event"], "file_analyzed");
        assert_eq!(line["payload"]["file"], "a.py");
    }
}
