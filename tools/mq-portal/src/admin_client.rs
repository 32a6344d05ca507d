use crate::config::EnvironmentConfig;
use crate::errors::PortalError;
use crate::logging::append_run_log;
use crate::types::RawAdminResponse;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::Serialize;
use serde_json::json;
use std::time::Duration;

pub const QMGR_LIST_PATH: &str = "/ibmmq/rest/v1/admin/qmgr";
pub const CSRF_HEADER: &str = "ibm-mq-rest-csrf-token";

/// The two admin REST operations the portal needs. Implementations never
/// return transport errors; they fold them into a status-0 response.
pub trait AdminClient: Send + Sync {
    fn list_queue_managers(&self) -> RawAdminResponse;
    fn run_display_command(&self, qmgr: &str, name_pattern: &str) -> RawAdminResponse;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayCommand {
    #[serde(rename = "type")]
    pub kind: String,
    pub command: String,
    pub qualifier: String,
    pub name: String,
    pub response_parameters: Vec<String>,
}

impl DisplayCommand {
    pub fn qlocal_depth(name_pattern: &str) -> Self {
        Self {
            kind: "runCommandJSON".to_string(),
            command: "display".to_string(),
            qualifier: "qlocal".to_string(),
            name: name_pattern.to_string(),
            response_parameters: vec!["CURDEPTH".to_string()],
        }
    }
}

pub fn mqsc_action_path(qmgr: &str) -> String {
    format!(
        "/ibmmq/rest/v2/admin/action/qmgr/{}/mqsc",
        urlencoding::encode(qmgr)
    )
}

/// Blocking client for one environment's mqweb endpoint. Holds a pooled
/// session with basic auth, TLS policy and timeout fixed at construction.
pub struct RestAdminClient {
    base_url: String,
    user: String,
    password: String,
    http: Client,
}

impl RestAdminClient {
    pub fn new(env: &EnvironmentConfig) -> Result<Self, PortalError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let http = Client::builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(!env.verify_tls)
            .timeout(Duration::from_secs(env.timeout_seconds))
            .build()
            .map_err(|e| PortalError::Http(e.to_string()))?;
        Ok(Self {
            base_url: env.url.trim_end_matches('/').to_string(),
            user: env.user.clone(),
            password: env.password.clone(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn execute(&self, operation: &str, request: RequestBuilder) -> RawAdminResponse {
        let request = request.basic_auth(&self.user, Some(&self.password));
        match request.send().and_then(|resp| {
            let status = resp.status().as_u16();
            resp.text().map(|body| (status, body))
        }) {
            Ok((status, body)) => {
                append_run_log(
                    if status == 200 { "info" } else { "warn" },
                    "admin.request.completed",
                    json!({
                        "operation": operation,
                        "base_url": self.base_url,
                        "status": status,
                        "body_bytes": body.len()
                    }),
                );
                RawAdminResponse::from_body(status, body)
            }
            Err(error) => {
                append_run_log(
                    "error",
                    "admin.request.transport_failed",
                    json!({
                        "operation": operation,
                        "base_url": self.base_url,
                        "timeout": error.is_timeout(),
                        "connect": error.is_connect(),
                        "error": error.to_string()
                    }),
                );
                RawAdminResponse::transport_failure(error.to_string())
            }
        }
    }
}

impl AdminClient for RestAdminClient {
    fn list_queue_managers(&self) -> RawAdminResponse {
        let url = format!("{}{}", self.base_url, QMGR_LIST_PATH);
        self.execute("list_queue_managers", self.http.get(url))
    }

    fn run_display_command(&self, qmgr: &str, name_pattern: &str) -> RawAdminResponse {
        let url = format!("{}{}", self.base_url, mqsc_action_path(qmgr));
        let request = self
            .http
            .post(url)
            .header(CSRF_HEADER, "value")
            .json(&DisplayCommand::qlocal_depth(name_pattern));
        self.execute("run_display_command", request)
    }
}

#[cfg(test)]
mod tests {
    use super::{mqsc_action_path, DisplayCommand};
    use serde_json::json;

    #[test]
    fn display_payload_matches_run_command_json_contract() {
        let payload = serde_json::to_value(DisplayCommand::qlocal_depth("DEV.*")).expect("json");
        assert_eq!(
            payload,
            json!({
                "type": "runCommandJSON",
                "command": "display",
                "qualifier": "qlocal",
                "name": "DEV.*",
                "responseParameters": ["CURDEPTH"]
            })
        );
    }

    #[test]
    fn queue_manager_names_are_fully_escaped() {
        assert_eq!(
            mqsc_action_path("QM1"),
            "/ibmmq/rest/v2/admin/action/qmgr/QM1/mqsc"
        );
        assert_eq!(
            mqsc_action_path("QM/A B%"),
            "/ibmmq/rest/v2/admin/action/qmgr/QM%2FA%20B%25/mqsc"
        );
        assert_eq!(
            mqsc_action_path("QM_1.x-y~z"),
            "/ibmmq/rest/v2/admin/action/qmgr/QM_1.x-y~z/mqsc"
        );
    }
}
