use crate::errors::PortalError;
use serde::Serialize;
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 4096;

static RUN_LOGGER: OnceLock<JsonlLogger> = OnceLock::new();

#[derive(Debug, Clone)]
pub struct JsonlLogger {
    pub path: PathBuf,
    pub max_payload_bytes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEvent<'a> {
    pub ts_unix_ms: u128,
    pub level: &'a str,
    pub event_type: &'a str,
    pub payload: Value,
}

impl JsonlLogger {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }

    pub fn append(&self, event: &LogEvent<'_>) -> Result<(), PortalError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| PortalError::Io(e.to_string()))?;
            }
        }
        let line = serde_json::to_string(&LogEvent {
            ts_unix_ms: event.ts_unix_ms,
            level: event.level,
            event_type: event.event_type,
            payload: truncate_json(event.payload.clone(), self.max_payload_bytes),
        })
        .map_err(|e| PortalError::Io(e.to_string()))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| PortalError::Io(e.to_string()))?;
        file.write_all(line.as_bytes())
            .map_err(|e| PortalError::Io(e.to_string()))?;
        file.write_all(b"\n")
            .map_err(|e| PortalError::Io(e.to_string()))
    }
}

/// Installs the process-wide run log. Only the first call wins; returns
/// whether this call installed the logger.
pub fn init_run_logger(logger: JsonlLogger) -> bool {
    RUN_LOGGER.set(logger).is_ok()
}

/// Appends one event to the run log. A no-op until `init_run_logger` ran.
/// Write failures are dropped.
pub fn append_run_log(level: &str, event_type: &str, payload: Value) {
    let Some(logger) = RUN_LOGGER.get() else {
        return;
    };
    let _ = logger.append(&LogEvent {
        ts_unix_ms: now_unix_ms(),
        level,
        event_type,
        payload,
    });
}

fn now_unix_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

fn truncate_json(value: Value, max_bytes: usize) -> Value {
    let rendered = serde_json::to_string(&value).unwrap_or_default();
    if rendered.len() <= max_bytes {
        return value;
    }
    let mut cut = max_bytes.saturating_sub(3);
    while cut > 0 && !rendered.is_char_boundary(cut) {
        cut -= 1;
    }
    Value::String(format!("{}...", &rendered[..cut]))
}
