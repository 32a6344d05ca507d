use crate::logging::append_run_log;
use crate::normalizer::{detect_shape, Normalizer};
use crate::registry::EnvironmentRegistry;
use crate::types::{DepthResult, DepthStatus, ListResult, ListStatus, RawAdminResponse};
use serde_json::{json, Value};
use std::collections::BTreeSet;

pub const SNIPPET_CHARS: usize = 400;
pub const ALL_QUEUES_PATTERN: &str = "*";

/// The three portal operations over a fixed set of environments. Every
/// failure comes back as a status value; nothing here returns `Err`.
pub struct QueryService {
    registry: EnvironmentRegistry,
    normalizer: Normalizer,
}

impl QueryService {
    pub fn new(registry: EnvironmentRegistry, normalizer: Normalizer) -> Self {
        Self {
            registry,
            normalizer,
        }
    }

    pub fn registry(&self) -> &EnvironmentRegistry {
        &self.registry
    }

    /// Queue manager names for an environment, sorted and deduplicated. Any
    /// failure yields an empty list.
    pub fn list_queue_managers(&self, env_id: &str) -> Vec<String> {
        let Some(client) = self.registry.client(env_id) else {
            append_run_log(
                "warn",
                "query.list_qmgrs.invalid_env",
                json!({ "env": env_id }),
            );
            return Vec::new();
        };
        let response = client.list_queue_managers();
        if !response.is_ok() {
            append_run_log(
                "warn",
                "query.list_qmgrs.failed",
                json!({
                    "env": env_id,
                    "status": response.status,
                    "snippet": snippet(&response.body)
                }),
            );
            return Vec::new();
        }
        let names = queue_manager_names(response.json.as_ref());
        append_run_log(
            "info",
            "query.list_qmgrs.ok",
            json!({ "env": env_id, "count": names.len() }),
        );
        names
    }

    pub fn list_queues(&self, env_id: &str, qmgr: &str) -> ListResult {
        if qmgr.is_empty() {
            return ListResult::failed(ListStatus::MissingQueueManager);
        }
        let Some(client) = self.registry.client(env_id) else {
            append_run_log(
                "warn",
                "query.list_queues.invalid_env",
                json!({ "env": env_id }),
            );
            return ListResult::failed(ListStatus::InvalidEnvironment);
        };

        let response = client.run_display_command(qmgr, ALL_QUEUES_PATTERN);
        if !response.is_ok() {
            append_run_log(
                "warn",
                "query.list_queues.http_error",
                json!({
                    "env": env_id,
                    "qmgr": qmgr,
                    "status": response.status
                }),
            );
            return ListResult {
                status: ListStatus::HttpError(response.status),
                entries: Vec::new(),
                error_snippet: snippet(&response.body),
            };
        }

        let entries = self.normalizer.normalize(response.json.as_ref());
        if entries.is_empty() {
            append_run_log(
                "warn",
                "query.list_queues.empty",
                json!({
                    "env": env_id,
                    "qmgr": qmgr,
                    "shape": response.json.as_ref().and_then(detect_shape)
                }),
            );
            return ListResult {
                status: ListStatus::NoQueues,
                entries: Vec::new(),
                error_snippet: diagnostic_snippet(&response),
            };
        }

        append_run_log(
            "info",
            "query.list_queues.ok",
            json!({
                "env": env_id,
                "qmgr": qmgr,
                "count": entries.len(),
                "shape": response.json.as_ref().and_then(detect_shape)
            }),
        );
        ListResult {
            status: ListStatus::Ok,
            entries,
            error_snippet: String::new(),
        }
    }

    pub fn query_depth(&self, env_id: &str, qmgr: &str, queue: &str) -> DepthResult {
        let queue = queue.trim();
        if queue.is_empty() {
            return DepthResult::failed(DepthStatus::MissingQueueName);
        }
        if qmgr.is_empty() {
            return DepthResult::failed(DepthStatus::MissingQueueManager);
        }
        let Some(client) = self.registry.client(env_id) else {
            append_run_log(
                "warn",
                "query.depth.invalid_env",
                json!({ "env": env_id }),
            );
            return DepthResult::failed(DepthStatus::InvalidEnvironment);
        };

        let response = client.run_display_command(qmgr, queue);
        if !response.is_ok() {
            append_run_log(
                "warn",
                "query.depth.http_error",
                json!({
                    "env": env_id,
                    "qmgr": qmgr,
                    "queue": queue,
                    "status": response.status
                }),
            );
            return DepthResult::failed(DepthStatus::HttpError(response.status));
        }

        let wanted = queue.to_uppercase();
        let found = self
            .normalizer
            .normalize(response.json.as_ref())
            .into_iter()
            .find(|entry| entry.name.to_uppercase() == wanted);
        let result = match found {
            Some(entry) => match entry.depth {
                Some(depth) => DepthResult {
                    status: DepthStatus::Ok,
                    depth: Some(depth),
                },
                None => DepthResult::failed(DepthStatus::NoDepth),
            },
            None => DepthResult::failed(DepthStatus::NotFound),
        };
        append_run_log(
            "info",
            "query.depth.completed",
            json!({
                "env": env_id,
                "qmgr": qmgr,
                "queue": queue,
                "status": result.status.to_string(),
                "depth": result.depth
            }),
        );
        result
    }
}

/// `name` of every element of the `qmgr` array, non-empty strings only.
pub fn queue_manager_names(data: Option<&Value>) -> Vec<String> {
    let Some(items) = data
        .and_then(|d| d.get("qmgr"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| item.get("name").and_then(Value::as_str))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// First `SNIPPET_CHARS` characters of `text`.
pub fn snippet(text: &str) -> String {
    text.chars().take(SNIPPET_CHARS).collect()
}

/// What to show when a 200 response produced no queues: the parsed document
/// pretty-printed when it is a mapping or sequence, otherwise the raw body.
fn diagnostic_snippet(response: &RawAdminResponse) -> String {
    match &response.json {
        Some(value @ (Value::Object(_) | Value::Array(_))) => {
            let pretty = serde_json::to_string_pretty(value).unwrap_or_default();
            snippet(&pretty)
        }
        _ => snippet(&response.body),
    }
}
