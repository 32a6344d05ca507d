use crate::admin_client::AdminClient;
use crate::config::{AppConfig, EnvironmentConfig};
use crate::errors::PortalError;
use crate::logging::append_run_log;
use crate::runtime::AdminClientFactory;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

pub struct RegisteredEnvironment {
    pub id: String,
    pub config: EnvironmentConfig,
    client: Arc<dyn AdminClient>,
}

impl RegisteredEnvironment {
    pub fn new(id: impl Into<String>, config: EnvironmentConfig, client: Arc<dyn AdminClient>) -> Self {
        Self {
            id: id.into(),
            config,
            client,
        }
    }

    pub fn client(&self) -> &dyn AdminClient {
        self.client.as_ref()
    }

    /// One-line summary of where this environment points.
    pub fn describe(&self) -> String {
        format!(
            "Base: {} · TLS verified: {}",
            self.config.url, self.config.verify_tls
        )
    }
}

/// Immutable lookup table of environments built once at startup.
pub struct EnvironmentRegistry {
    environments: BTreeMap<String, RegisteredEnvironment>,
    default_env: String,
}

impl EnvironmentRegistry {
    pub fn from_config(
        cfg: &AppConfig,
        factory: &dyn AdminClientFactory,
    ) -> Result<Self, PortalError> {
        let mut entries = Vec::with_capacity(cfg.environments.len());
        for (id, env_cfg) in &cfg.environments {
            let client = factory.build(id, env_cfg)?;
            append_run_log(
                "debug",
                "registry.environment.registered",
                json!({
                    "env": id,
                    "base_url": env_cfg.url,
                    "verify_tls": env_cfg.verify_tls,
                    "timeout_seconds": env_cfg.timeout_seconds
                }),
            );
            entries.push(RegisteredEnvironment::new(id.clone(), env_cfg.clone(), client));
        }
        Ok(Self::from_entries(entries, cfg.default_env.clone()))
    }

    pub fn from_entries(
        entries: impl IntoIterator<Item = RegisteredEnvironment>,
        default_env: impl Into<String>,
    ) -> Self {
        Self {
            environments: entries
                .into_iter()
                .map(|entry| (entry.id.clone(), entry))
                .collect(),
            default_env: default_env.into(),
        }
    }

    pub fn resolve(&self, env_id: &str) -> Option<&RegisteredEnvironment> {
        self.environments.get(env_id)
    }

    pub fn client(&self, env_id: &str) -> Option<&dyn AdminClient> {
        self.resolve(env_id).map(RegisteredEnvironment::client)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.environments.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredEnvironment> {
        self.environments.values()
    }

    pub fn default_env(&self) -> &str {
        &self.default_env
    }

    pub fn len(&self) -> usize {
        self.environments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.environments.is_empty()
    }
}
