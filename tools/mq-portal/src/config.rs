use crate::errors::PortalError;
use crate::normalizer::DEFAULT_IGNORE_PREFIXES;
use crate::runtime::FileSystem;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

pub type EnvMap = BTreeMap<String, String>;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 20;
pub const DEFAULT_LOG_PATH: &str = ".cache/mq-portal/run.jsonl";
const TRUTHY: [&str; 6] = ["1", "true", "yes", "y", "on", "t"];

#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    pub default_env: String,
    pub ignore_prefixes: Vec<String>,
    pub environments: BTreeMap<String, EnvironmentConfig>,
    pub logging: LoggingConfig,
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnvironmentConfig {
    pub url: String,
    pub user: String,
    pub password: String,
    pub verify_tls: bool,
    pub timeout_seconds: u64,
}

impl fmt::Debug for EnvironmentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvironmentConfig")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("verify_tls", &self.verify_tls)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    pub enabled: bool,
    pub path: PathBuf,
}

impl EnvironmentConfig {
    fn new(url: &str, user: &str, password: &str, verify_tls: bool) -> Self {
        Self {
            url: url.to_string(),
            user: user.to_string(),
            password: password.to_string(),
            verify_tls,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let mut environments = BTreeMap::new();
        environments.insert(
            "DEV".to_string(),
            EnvironmentConfig::new("https://localhost:9443", "mqadmin", "mqadmin", false),
        );
        environments.insert(
            "HML".to_string(),
            EnvironmentConfig::new("https://mq-hml.example.com:9443", "hmluser", "hmlpass", true),
        );
        environments.insert(
            "PRD".to_string(),
            EnvironmentConfig::new("https://mq-prd.example.com:9443", "mqprod", "mqprod", true),
        );
        Self {
            default_env: "DEV".to_string(),
            ignore_prefixes: DEFAULT_IGNORE_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            environments,
            logging: LoggingConfig {
                enabled: true,
                path: PathBuf::from(DEFAULT_LOG_PATH),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialAppConfig {
    default_env: Option<String>,
    ignore_prefixes: Option<Vec<String>>,
    environments: Option<BTreeMap<String, PartialEnvironmentConfig>>,
    logging: Option<PartialLoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialEnvironmentConfig {
    url: Option<String>,
    user: Option<String>,
    password: Option<String>,
    verify_tls: Option<bool>,
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialLoggingConfig {
    enabled: Option<bool>,
    path: Option<PathBuf>,
}

/// Builds the effective configuration: defaults, then the optional TOML file,
/// then environment variables, then CLI flags.
pub fn load_config(
    overrides: &CliOverrides,
    env: &EnvMap,
    fs: &dyn FileSystem,
) -> Result<AppConfig, PortalError> {
    let mut cfg = AppConfig::default();
    let mut default_env = None;

    if let Some(path) = &overrides.config_path {
        let file_contents = fs.read_to_string(path)?;
        let partial: PartialAppConfig = toml::from_str(&file_contents)
            .map_err(|e| PortalError::ConfigParse(e.to_string()))?;
        default_env = partial.default_env.clone();
        merge_partial_config(&mut cfg, partial);
    }

    apply_env_overrides(&mut cfg, env)?;
    if let Some(value) = env.get("MQ_DEFAULT_ENV").filter(|v| !v.trim().is_empty()) {
        default_env = Some(value.trim().to_string());
    }
    cfg.default_env = resolve_default_env(&cfg, default_env);

    if let Some(path) = &overrides.log_file {
        cfg.logging.path = path.clone();
        cfg.logging.enabled = true;
    }

    for env_cfg in cfg.environments.values_mut() {
        env_cfg.url = env_cfg.url.trim().trim_end_matches('/').to_string();
    }

    validate_config(&cfg)?;
    Ok(cfg)
}

fn merge_partial_config(cfg: &mut AppConfig, partial: PartialAppConfig) {
    if let Some(prefixes) = partial.ignore_prefixes {
        cfg.ignore_prefixes = clean_prefixes(prefixes);
    }

    if let Some(environments) = partial.environments {
        for (id, partial_env) in environments {
            let target = cfg
                .environments
                .entry(id)
                .or_insert_with(|| EnvironmentConfig::new("", "", "", true));
            if let Some(value) = partial_env.url {
                target.url = value;
            }
            if let Some(value) = partial_env.user {
                target.user = value;
            }
            if let Some(value) = partial_env.password {
                target.password = value;
            }
            if let Some(value) = partial_env.verify_tls {
                target.verify_tls = value;
            }
            if let Some(value) = partial_env.timeout_seconds {
                target.timeout_seconds = value;
            }
        }
    }

    if let Some(logging) = partial.logging {
        if let Some(value) = logging.enabled {
            cfg.logging.enabled = value;
        }
        if let Some(value) = logging.path {
            cfg.logging.path = value;
        }
    }
}

fn apply_env_overrides(cfg: &mut AppConfig, env: &EnvMap) -> Result<(), PortalError> {
    for (id, target) in cfg.environments.iter_mut() {
        let prefix = env_var_prefix(id);
        if let Some(value) = env.get(&format!("{prefix}_URL")) {
            target.url = value.clone();
        }
        if let Some(value) = env.get(&format!("{prefix}_USER")) {
            target.user = value.clone();
        }
        if let Some(value) = env.get(&format!("{prefix}_PASS")) {
            target.password = value.clone();
        }
        if let Some(value) = env.get(&format!("{prefix}_VERIFY_SSL")) {
            target.verify_tls = parse_bool(Some(value.as_str()), target.verify_tls);
        }
        let timeout_key = format!("{prefix}_TIMEOUT");
        if let Some(value) = env.get(&timeout_key) {
            target.timeout_seconds = value.trim().parse().map_err(|_| {
                PortalError::ConfigParse(format!("{timeout_key} must be a whole number of seconds"))
            })?;
        }
    }

    if let Some(value) = env.get("MQ_IGNORE_PREFIXES") {
        cfg.ignore_prefixes = parse_prefix_list(value);
    }
    Ok(())
}

/// Environment variable prefix for an environment id: `dev-east` -> `DEV_EAST`.
pub fn env_var_prefix(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// `None` keeps the default; any provided value is true only when it is one
/// of the usual affirmative spellings.
pub fn parse_bool(value: Option<&str>, default: bool) -> bool {
    match value {
        None => default,
        Some(raw) => TRUTHY.contains(&raw.trim().to_lowercase().as_str()),
    }
}

pub fn parse_prefix_list(raw: &str) -> Vec<String> {
    clean_prefixes(raw.split(',').map(str::to_string))
}

fn clean_prefixes(prefixes: impl IntoIterator<Item = String>) -> Vec<String> {
    prefixes
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

fn resolve_default_env(cfg: &AppConfig, configured: Option<String>) -> String {
    if let Some(value) = configured {
        return value;
    }
    if cfg.environments.contains_key("DEV") {
        return "DEV".to_string();
    }
    cfg.environments.keys().next().cloned().unwrap_or_default()
}

fn validate_config(cfg: &AppConfig) -> Result<(), PortalError> {
    if cfg.environments.is_empty() {
        return Err(PortalError::InvalidConfig(
            "at least one environment must be configured".to_string(),
        ));
    }

    for (id, env_cfg) in &cfg.environments {
        if !(env_cfg.url.starts_with("http://") || env_cfg.url.starts_with("https://")) {
            return Err(PortalError::InvalidConfig(format!(
                "environments.{id}.url must be an http(s) URL"
            )));
        }
        if env_cfg.timeout_seconds == 0 {
            return Err(PortalError::InvalidConfig(format!(
                "environments.{id}.timeout_seconds must be greater than zero"
            )));
        }
    }

    if !cfg.environments.contains_key(&cfg.default_env) {
        return Err(PortalError::InvalidConfig(format!(
            "default_env `{}` is not a configured environment",
            cfg.default_env
        )));
    }

    Ok(())
}
