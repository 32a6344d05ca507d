use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// One local queue and its reported message depth. `depth` is `None` when the
/// server did not report a numeric CURDEPTH for the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueDepthEntry {
    pub name: String,
    pub depth: Option<u64>,
}

impl QueueDepthEntry {
    pub fn new(name: impl Into<String>, depth: Option<u64>) -> Self {
        Self {
            name: name.into(),
            depth,
        }
    }
}

/// Outcome of one admin REST call. `status == 0` means the request never got
/// an HTTP answer and `body` carries the transport error text.
#[derive(Debug, Clone, PartialEq)]
pub struct RawAdminResponse {
    pub status: u16,
    pub body: String,
    pub json: Option<Value>,
}

impl RawAdminResponse {
    pub fn from_body(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let json = serde_json::from_str(&body).ok();
        Self { status, body, json }
    }

    pub fn transport_failure(message: impl Into<String>) -> Self {
        Self {
            status: 0,
            body: message.into(),
            json: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListStatus {
    Ok,
    MissingQueueManager,
    InvalidEnvironment,
    HttpError(u16),
    NoQueues,
}

impl ListStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for ListStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => f.write_str("OK"),
            Self::MissingQueueManager => f.write_str("Select a queue manager."),
            Self::InvalidEnvironment => f.write_str("Invalid environment."),
            Self::HttpError(code) => write!(f, "Error listing (HTTP {code})."),
            Self::NoQueues => f.write_str("No queues returned (check permissions)."),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListResult {
    pub status: ListStatus,
    pub entries: Vec<QueueDepthEntry>,
    pub error_snippet: String,
}

impl ListResult {
    pub fn failed(status: ListStatus) -> Self {
        Self {
            status,
            entries: Vec::new(),
            error_snippet: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepthStatus {
    Ok,
    MissingQueueName,
    MissingQueueManager,
    InvalidEnvironment,
    HttpError(u16),
    NoDepth,
    NotFound,
}

impl DepthStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for DepthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => f.write_str("OK"),
            Self::MissingQueueName => f.write_str("Provide a queue name."),
            Self::MissingQueueManager => f.write_str("Select a queue manager."),
            Self::InvalidEnvironment => f.write_str("Invalid environment."),
            Self::HttpError(code) => write!(f, "Error (HTTP {code})"),
            Self::NoDepth => f.write_str("No CURDEPTH (perhaps not a local queue?)."),
            Self::NotFound => f.write_str("Queue not found."),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepthResult {
    pub status: DepthStatus,
    pub depth: Option<u64>,
}

impl DepthResult {
    pub fn failed(status: DepthStatus) -> Self {
        Self {
            status,
            depth: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DepthStatus, ListStatus, RawAdminResponse};

    #[test]
    fn status_messages_are_stable() {
        assert_eq!(ListStatus::HttpError(500).to_string(), "Error listing (HTTP 500).");
        assert_eq!(ListStatus::MissingQueueManager.to_string(), "Select a queue manager.");
        assert_eq!(DepthStatus::HttpError(401).to_string(), "Error (HTTP 401)");
        assert_eq!(
            DepthStatus::NoDepth.to_string(),
            "No CURDEPTH (perhaps not a local queue?)."
        );
        assert!(ListStatus::Ok.is_ok());
        assert!(!DepthStatus::NotFound.is_ok());
    }

    #[test]
    fn raw_response_parses_json_bodies_and_keeps_text() {
        let ok = RawAdminResponse::from_body(200, "{\"qmgr\":[]}");
        assert!(ok.is_ok());
        assert!(ok.json.is_some());

        let html = RawAdminResponse::from_body(502, "<html>bad gateway</html>");
        assert_eq!(html.json, None);
        assert_eq!(html.body, "<html>bad gateway</html>");

        let failed = RawAdminResponse::transport_failure("connection refused");
        assert_eq!(failed.status, 0);
        assert!(!failed.is_ok());
    }
}
