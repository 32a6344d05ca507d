pub mod admin_client;
pub mod config;
pub mod errors;
pub mod listing;
pub mod logging;
pub mod natural_order;
pub mod normalizer;
pub mod query;
pub mod registry;
pub mod runtime;
pub mod types;

use clap::{error::ErrorKind, CommandFactory, Parser};
use config::{load_config, CliOverrides, EnvMap};
use errors::PortalError;
use listing::{format_entries, ListingFilter};
use logging::{append_run_log, init_run_logger, JsonlLogger};
use normalizer::Normalizer;
use query::QueryService;
use registry::EnvironmentRegistry;
use runtime::{ProductionRuntime, Terminal};
use serde_json::json;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "mq-portal")]
#[command(about = "List IBM MQ queue managers and local queue depths across environments")]
pub struct Cli {
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Environment id (defaults to the configured default environment)
    #[arg(long)]
    pub env: Option<String>,
    #[arg(long)]
    pub qmgr: Option<String>,
    #[arg(long, default_value_t = false)]
    pub list_envs: bool,
    #[arg(long, default_value_t = false)]
    pub list_qmgrs: bool,
    #[arg(long, default_value_t = false)]
    pub list_queues: bool,
    /// Query the depth of a single queue
    #[arg(long)]
    pub queue: Option<String>,
    /// Keep only queues whose name contains this text (case-insensitive)
    #[arg(long)]
    pub contains: Option<String>,
    /// Keep only queues with a depth greater than zero
    #[arg(long, default_value_t = false)]
    pub only_positive: bool,
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    ListEnvironments,
    ListQueueManagers,
    ListQueues,
    QueryDepth,
}

impl Cli {
    fn action(&self) -> Action {
        if self.list_envs {
            Action::ListEnvironments
        } else if self.queue.is_some() {
            Action::QueryDepth
        } else if self.list_queues {
            Action::ListQueues
        } else {
            Action::ListQueueManagers
        }
    }
}

pub fn run() -> Result<i32, PortalError> {
    let args = std::env::args_os().collect::<Vec<_>>();
    let env = std::env::vars_os().collect::<Vec<_>>();
    let runtime = ProductionRuntime::new();
    run_with_runtime(&args, &env, &runtime)
}

pub fn run_with_runtime(
    args: &[std::ffi::OsString],
    env: &[(std::ffi::OsString, std::ffi::OsString)],
    runtime: &ProductionRuntime,
) -> Result<i32, PortalError> {
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => match error.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{error}");
                return Ok(0);
            }
            _ => return Err(PortalError::Cli(error.to_string())),
        },
    };

    let env_map = env_to_map(env);
    let overrides = CliOverrides {
        config_path: cli.config.clone(),
        log_file: cli.log_file.clone(),
    };
    let cfg = load_config(&overrides, &env_map, runtime.file_system.as_ref())?;

    if cfg.logging.enabled {
        init_run_logger(JsonlLogger::new(&cfg.logging.path));
    }

    let registry = EnvironmentRegistry::from_config(&cfg, runtime.client_factory.as_ref())?;
    let service = QueryService::new(registry, Normalizer::new(cfg.ignore_prefixes.clone()));
    let env_id = cli.env.clone().unwrap_or_else(|| cfg.default_env.clone());
    let action = cli.action();
    append_run_log(
        "info",
        "portal.run.started",
        json!({
            "action": format!("{action:?}"),
            "env": env_id,
            "qmgr": cli.qmgr.as_deref(),
            "environments": service.registry().len()
        }),
    );

    let terminal = runtime.terminal.as_ref();
    let code = match action {
        Action::ListEnvironments => print_environments(&service, terminal)?,
        Action::ListQueueManagers => print_queue_managers(&service, terminal, &env_id)?,
        Action::ListQueues => {
            let filter = ListingFilter {
                contains: cli.contains.clone(),
                only_positive: cli.only_positive,
            };
            let qmgr = cli.qmgr.as_deref().unwrap_or_default();
            print_queues(&service, terminal, &env_id, qmgr, &filter)?
        }
        Action::QueryDepth => {
            let qmgr = cli.qmgr.as_deref().unwrap_or_default();
            let queue = cli.queue.as_deref().unwrap_or_default();
            print_depth(&service, terminal, &env_id, qmgr, queue)?
        }
    };

    append_run_log(
        "info",
        "portal.run.finished",
        json!({ "action": format!("{action:?}"), "exit_code": code }),
    );
    Ok(code)
}

fn print_environments(service: &QueryService, terminal: &dyn Terminal) -> Result<i32, PortalError> {
    let registry = service.registry();
    for env in registry.iter() {
        let marker = if env.id == registry.default_env() { "*" } else { " " };
        terminal.write_line(&format!("{marker} {}  {}", env.id, env.describe()))?;
    }
    Ok(0)
}

fn print_queue_managers(
    service: &QueryService,
    terminal: &dyn Terminal,
    env_id: &str,
) -> Result<i32, PortalError> {
    let names = service.list_queue_managers(env_id);
    if names.is_empty() {
        terminal.write_line("Failed to list queue managers (check URL/credentials).")?;
        return Ok(1);
    }
    for name in names {
        terminal.write_line(&name)?;
    }
    Ok(0)
}

fn print_queues(
    service: &QueryService,
    terminal: &dyn Terminal,
    env_id: &str,
    qmgr: &str,
    filter: &ListingFilter,
) -> Result<i32, PortalError> {
    let result = service.list_queues(env_id, qmgr);
    terminal.write_line(&format!("Status: {}", result.status))?;
    if result.entries.is_empty() {
        if result.error_snippet.is_empty() {
            terminal.write_line("(no queues)")?;
        } else {
            terminal.write_line(&result.error_snippet)?;
        }
        return Ok(if result.status.is_ok() { 0 } else { 1 });
    }

    let lines = format_entries(filter.apply(&result.entries));
    if lines.is_empty() && filter.is_active() {
        terminal.write_line("(no results)")?;
    }
    for line in lines {
        terminal.write_line(&line)?;
    }
    Ok(0)
}

fn print_depth(
    service: &QueryService,
    terminal: &dyn Terminal,
    env_id: &str,
    qmgr: &str,
    queue: &str,
) -> Result<i32, PortalError> {
    let result = service.query_depth(env_id, qmgr, queue);
    terminal.write_line(&format!("Status: {}", result.status))?;
    match result.depth {
        Some(depth) => terminal.write_line(&format!("Depth: {depth}"))?,
        None => terminal.write_line("Depth: -")?,
    }
    Ok(if result.status.is_ok() { 0 } else { 1 })
}

pub fn render_help() -> String {
    let mut cmd = Cli::command();
    cmd.render_long_help().to_string()
}

fn env_to_map(env: &[(std::ffi::OsString, std::ffi::OsString)]) -> EnvMap {
    let mut map = EnvMap::new();
    for (key, value) in env {
        if let (Some(key), Some(value)) = (key.to_str(), value.to_str()) {
            map.insert(key.to_string(), value.to_string());
        }
    }
    map
}
