use crate::admin_client::{AdminClient, RestAdminClient};
use crate::config::EnvironmentConfig;
use crate::errors::PortalError;
use crate::types::RawAdminResponse;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub trait FileSystem: Send + Sync {
    fn read_to_string(&self, path: &Path) -> Result<String, PortalError>;
}

pub trait Terminal: Send + Sync {
    fn write_line(&self, line: &str) -> Result<(), PortalError>;
}

/// Builds the admin client for one configured environment.
pub trait AdminClientFactory: Send + Sync {
    fn build(
        &self,
        env_id: &str,
        env: &EnvironmentConfig,
    ) -> Result<Arc<dyn AdminClient>, PortalError>;
}

pub struct ProductionFileSystem;

impl FileSystem for ProductionFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String, PortalError> {
        std::fs::read_to_string(path)
            .map_err(|e| PortalError::Io(format!("{}: {e}", path.display())))
    }
}

pub struct ProductionTerminal;

impl Terminal for ProductionTerminal {
    fn write_line(&self, line: &str) -> Result<(), PortalError> {
        use std::io::Write;
        let mut out = std::io::stdout();
        writeln!(out, "{line}").map_err(|e| PortalError::Io(e.to_string()))
    }
}

pub struct RestClientFactory;

impl AdminClientFactory for RestClientFactory {
    fn build(
        &self,
        _env_id: &str,
        env: &EnvironmentConfig,
    ) -> Result<Arc<dyn AdminClient>, PortalError> {
        Ok(Arc::new(RestAdminClient::new(env)?))
    }
}

pub struct ProductionRuntime {
    pub file_system: Arc<dyn FileSystem>,
    pub terminal: Arc<dyn Terminal>,
    pub client_factory: Arc<dyn AdminClientFactory>,
}

impl ProductionRuntime {
    pub fn new() -> Self {
        Self {
            file_system: Arc::new(ProductionFileSystem),
            terminal: Arc::new(ProductionTerminal),
            client_factory: Arc::new(RestClientFactory),
        }
    }
}

impl Default for ProductionRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default, Clone)]
pub struct FakeFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, String>>>,
}

impl FakeFileSystem {
    pub fn with_file(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        let fs = Self::default();
        fs.insert(path, contents);
        fs
    }

    pub fn insert(&self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        self.files
            .lock()
            .expect("files lock")
            .insert(path.into(), contents.into());
    }
}

impl FileSystem for FakeFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String, PortalError> {
        self.files
            .lock()
            .expect("files lock")
            .get(path)
            .cloned()
            .ok_or_else(|| PortalError::Io(format!("missing file {}", path.display())))
    }
}

#[derive(Default, Clone)]
pub struct FakeTerminal {
    writes: Arc<Mutex<Vec<String>>>,
}

impl FakeTerminal {
    pub fn written_lines(&self) -> Vec<String> {
        self.writes.lock().expect("writes lock").clone()
    }
}

impl Terminal for FakeTerminal {
    fn write_line(&self, line: &str) -> Result<(), PortalError> {
        self.writes
            .lock()
            .expect("writes lock")
            .push(line.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCall {
    ListQueueManagers,
    Display { qmgr: String, pattern: String },
}

/// Scripted admin client: replays queued responses per operation and records
/// every call it receives.
#[derive(Default, Clone)]
pub struct FakeAdminClient {
    qmgr_responses: Arc<Mutex<VecDeque<RawAdminResponse>>>,
    display_responses: Arc<Mutex<VecDeque<RawAdminResponse>>>,
    calls: Arc<Mutex<Vec<AdminCall>>>,
}

impl FakeAdminClient {
    pub fn push_qmgr_response(&self, response: RawAdminResponse) {
        self.qmgr_responses
            .lock()
            .expect("qmgr lock")
            .push_back(response);
    }

    pub fn push_display_response(&self, response: RawAdminResponse) {
        self.display_responses
            .lock()
            .expect("display lock")
            .push_back(response);
    }

    pub fn calls(&self) -> Vec<AdminCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("calls lock").len()
    }

    fn next(queue: &Mutex<VecDeque<RawAdminResponse>>) -> RawAdminResponse {
        queue
            .lock()
            .expect("response lock")
            .pop_front()
            .unwrap_or_else(|| RawAdminResponse::transport_failure("no fake response queued"))
    }
}

impl AdminClient for FakeAdminClient {
    fn list_queue_managers(&self) -> RawAdminResponse {
        self.calls
            .lock()
            .expect("calls lock")
            .push(AdminCall::ListQueueManagers);
        Self::next(&self.qmgr_responses)
    }

    fn run_display_command(&self, qmgr: &str, name_pattern: &str) -> RawAdminResponse {
        self.calls.lock().expect("calls lock").push(AdminCall::Display {
            qmgr: qmgr.to_string(),
            pattern: name_pattern.to_string(),
        });
        Self::next(&self.display_responses)
    }
}

/// Hands out pre-registered fakes by environment id; unknown ids get a fresh
/// fake with nothing queued.
#[derive(Default, Clone)]
pub struct FakeClientFactory {
    clients: Arc<Mutex<HashMap<String, FakeAdminClient>>>,
}

impl FakeClientFactory {
    pub fn register(&self, env_id: &str, client: FakeAdminClient) {
        self.clients
            .lock()
            .expect("clients lock")
            .insert(env_id.to_string(), client);
    }
}

impl AdminClientFactory for FakeClientFactory {
    fn build(
        &self,
        env_id: &str,
        _env: &EnvironmentConfig,
    ) -> Result<Arc<dyn AdminClient>, PortalError> {
        let client = self
            .clients
            .lock()
            .expect("clients lock")
            .entry(env_id.to_string())
            .or_default()
            .clone();
        Ok(Arc::new(client))
    }
}
